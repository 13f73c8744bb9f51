//! VM 라이프사이클 추상화 및 외부 명령 위임 구현

use std::future::Future;
use std::process::Stdio;
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::process::Command;
use tracing::{debug, info};

use guestlab_core::config::DeployConfig;
use guestlab_core::error::DeployError;
use guestlab_core::metrics::{
    DEPLOY_OPERATIONS_TOTAL, DEPLOY_OPERATION_DURATION_SECONDS, LABEL_OPERATION, LABEL_RESULT,
};

/// 라이프사이클 작업 후의 게스트 접속 지점
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reachability {
    /// 게스트 호스트 주소
    pub host: String,
    /// SSH 포트
    pub port: u16,
}

/// VM 라이프사이클 트레이트
///
/// 프로비저닝과 재시작은 게스트가 바뀔 수 있으므로 새 접속 지점을
/// 반환합니다. 해체는 반환값이 없습니다.
pub trait VmLifecycle: Send + Sync + 'static {
    /// 새 게스트 VM을 프로비저닝하고 접속 지점을 반환합니다.
    fn provision(&self) -> impl Future<Output = Result<Reachability, DeployError>> + Send;

    /// 게스트 VM을 해체합니다.
    fn teardown(&self) -> impl Future<Output = Result<(), DeployError>> + Send;

    /// 게스트 VM을 재시작하고 접속 지점을 반환합니다.
    fn restart(&self) -> impl Future<Output = Result<Reachability, DeployError>> + Send;
}

/// 설정된 외부 명령에 위임하는 라이프사이클 구현
///
/// 각 작업은 `sh -c`로 해당 명령을 실행합니다. 명령이 0이 아닌 종료
/// 코드로 끝나면 작업 실패이며, 프로비저닝/재시작 명령의 표준 출력
/// 마지막 비어 있지 않은 줄이 `host[:port]`로 해석됩니다 (포트 생략
/// 시 22).
#[derive(Debug)]
pub struct CommandLifecycle {
    config: DeployConfig,
}

impl CommandLifecycle {
    /// 설정의 `[deploy]` 섹션에서 라이프사이클을 생성합니다.
    ///
    /// # Errors
    ///
    /// 라이프사이클 기능이 비활성화되어 있으면 `DeployError::Disabled`.
    pub fn from_config(config: &DeployConfig) -> Result<Self, DeployError> {
        if !config.enabled {
            return Err(DeployError::Disabled);
        }
        Ok(Self {
            config: config.clone(),
        })
    }

    async fn run_command(&self, command: &str) -> Result<String, String> {
        debug!(command, "running lifecycle command");
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to spawn '{command}': {e}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "'{command}' exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// 명령 출력의 마지막 비어 있지 않은 줄을 `host[:port]`로 해석합니다.
fn parse_reachability(output: &str) -> Result<Reachability, DeployError> {
    let last_line = output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| DeployError::AddressUnparseable {
            output: output.trim().to_owned(),
        })?;

    // IPv6 리터럴에는 콜론이 포함되므로 마지막 콜론 뒤가 숫자인 경우에만
    // 포트로 취급합니다.
    if let Some((host, port)) = last_line.rsplit_once(':')
        && let Ok(port) = port.parse::<u16>()
        && port > 0
        && !host.is_empty()
    {
        return Ok(Reachability {
            host: host.to_owned(),
            port,
        });
    }

    if last_line.contains(char::is_whitespace) {
        return Err(DeployError::AddressUnparseable {
            output: last_line.to_owned(),
        });
    }

    Ok(Reachability {
        host: last_line.to_owned(),
        port: 22,
    })
}

impl VmLifecycle for CommandLifecycle {
    async fn provision(&self) -> Result<Reachability, DeployError> {
        let start = Instant::now();
        let result = self.run_command(&self.config.provision_cmd).await;
        histogram!(DEPLOY_OPERATION_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        match result {
            Ok(stdout) => {
                let reachability = parse_reachability(&stdout)?;
                info!(host = reachability.host.as_str(), port = reachability.port, "guest provisioned");
                counter!(DEPLOY_OPERATIONS_TOTAL, LABEL_OPERATION => "provision", LABEL_RESULT => "success")
                    .increment(1);
                Ok(reachability)
            }
            Err(reason) => {
                counter!(DEPLOY_OPERATIONS_TOTAL, LABEL_OPERATION => "provision", LABEL_RESULT => "failure")
                    .increment(1);
                Err(DeployError::ProvisionFailed(reason))
            }
        }
    }

    async fn teardown(&self) -> Result<(), DeployError> {
        let start = Instant::now();
        let result = self.run_command(&self.config.teardown_cmd).await;
        histogram!(DEPLOY_OPERATION_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        match result {
            Ok(_) => {
                info!("guest torn down");
                counter!(DEPLOY_OPERATIONS_TOTAL, LABEL_OPERATION => "teardown", LABEL_RESULT => "success")
                    .increment(1);
                Ok(())
            }
            Err(reason) => {
                counter!(DEPLOY_OPERATIONS_TOTAL, LABEL_OPERATION => "teardown", LABEL_RESULT => "failure")
                    .increment(1);
                Err(DeployError::TeardownFailed(reason))
            }
        }
    }

    async fn restart(&self) -> Result<Reachability, DeployError> {
        let start = Instant::now();
        let result = self.run_command(&self.config.restart_cmd).await;
        histogram!(DEPLOY_OPERATION_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        match result {
            Ok(stdout) => {
                let reachability = parse_reachability(&stdout)?;
                info!(host = reachability.host.as_str(), port = reachability.port, "guest restarted");
                counter!(DEPLOY_OPERATIONS_TOTAL, LABEL_OPERATION => "restart", LABEL_RESULT => "success")
                    .increment(1);
                Ok(reachability)
            }
            Err(reason) => {
                counter!(DEPLOY_OPERATIONS_TOTAL, LABEL_OPERATION => "restart", LABEL_RESULT => "failure")
                    .increment(1);
                Err(DeployError::RestartFailed(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_config(provision: &str, teardown: &str, restart: &str) -> DeployConfig {
        let mut config = DeployConfig::default();
        config.enabled = true;
        config.provision_cmd = provision.to_owned();
        config.teardown_cmd = teardown.to_owned();
        config.restart_cmd = restart.to_owned();
        config
    }

    #[test]
    fn disabled_config_rejected() {
        let config = DeployConfig::default();
        assert!(matches!(
            CommandLifecycle::from_config(&config).unwrap_err(),
            DeployError::Disabled
        ));
    }

    #[test]
    fn parse_reachability_host_only() {
        let r = parse_reachability("192.0.2.10\n").unwrap();
        assert_eq!(r.host, "192.0.2.10");
        assert_eq!(r.port, 22);
    }

    #[test]
    fn parse_reachability_host_and_port() {
        let r = parse_reachability("192.0.2.10:2200\n").unwrap();
        assert_eq!(r.host, "192.0.2.10");
        assert_eq!(r.port, 2200);
    }

    #[test]
    fn parse_reachability_uses_last_nonempty_line() {
        let output = "creating vm...\nwaiting for boot...\n198.51.100.4:2222\n\n";
        let r = parse_reachability(output).unwrap();
        assert_eq!(r.host, "198.51.100.4");
        assert_eq!(r.port, 2222);
    }

    #[test]
    fn parse_reachability_hostname() {
        let r = parse_reachability("guest-vm.example.com\n").unwrap();
        assert_eq!(r.host, "guest-vm.example.com");
        assert_eq!(r.port, 22);
    }

    #[test]
    fn parse_reachability_ipv6_without_port() {
        // 마지막 콜론 뒤가 포트 숫자가 아니므로 전체가 호스트
        let r = parse_reachability("2001:db8::a\n").unwrap();
        assert_eq!(r.host, "2001:db8::a");
        assert_eq!(r.port, 22);
    }

    #[test]
    fn parse_reachability_empty_output_rejected() {
        assert!(matches!(
            parse_reachability("\n  \n").unwrap_err(),
            DeployError::AddressUnparseable { .. }
        ));
    }

    #[test]
    fn parse_reachability_prose_line_rejected() {
        assert!(matches!(
            parse_reachability("deployment finished successfully\n").unwrap_err(),
            DeployError::AddressUnparseable { .. }
        ));
    }

    #[tokio::test]
    async fn provision_parses_command_output() {
        let config = enabled_config("echo 192.0.2.10:2200", "true", "true");
        let lifecycle = CommandLifecycle::from_config(&config).unwrap();

        let r = lifecycle.provision().await.unwrap();
        assert_eq!(r.host, "192.0.2.10");
        assert_eq!(r.port, 2200);
    }

    #[tokio::test]
    async fn provision_failure_propagates_stderr() {
        let config = enabled_config("echo boom >&2; exit 3", "true", "true");
        let lifecycle = CommandLifecycle::from_config(&config).unwrap();

        let err = lifecycle.provision().await.unwrap_err();
        match err {
            DeployError::ProvisionFailed(reason) => {
                assert!(reason.contains("boom"));
                assert!(reason.contains('3'));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn provision_unparseable_output_is_error() {
        let config = enabled_config("echo deployment done", "true", "true");
        let lifecycle = CommandLifecycle::from_config(&config).unwrap();

        assert!(matches!(
            lifecycle.provision().await.unwrap_err(),
            DeployError::AddressUnparseable { .. }
        ));
    }

    #[tokio::test]
    async fn teardown_succeeds_without_output() {
        let config = enabled_config("true", "true", "true");
        let lifecycle = CommandLifecycle::from_config(&config).unwrap();
        lifecycle.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn teardown_failure_is_error() {
        let config = enabled_config("true", "exit 1", "true");
        let lifecycle = CommandLifecycle::from_config(&config).unwrap();
        assert!(matches!(
            lifecycle.teardown().await.unwrap_err(),
            DeployError::TeardownFailed(_)
        ));
    }

    #[tokio::test]
    async fn restart_parses_new_address() {
        let config = enabled_config("true", "true", "printf 'rebooting...\\n203.0.113.7\\n'");
        let lifecycle = CommandLifecycle::from_config(&config).unwrap();

        let r = lifecycle.restart().await.unwrap();
        assert_eq!(r.host, "203.0.113.7");
        assert_eq!(r.port, 22);
    }

    #[test]
    fn lifecycle_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<CommandLifecycle>();
    }
}
