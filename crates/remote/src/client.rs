//! 원격 실행/전송 추상화 및 OpenSSH 서브프로세스 구현
//!
//! [`RemoteClient`] 트레이트가 게스트와의 모든 상호작용을 추상화합니다.
//! 프로덕션 구현 [`OpenSshClient`]는 시스템의 `ssh`/`scp` 바이너리를
//! `tokio::process`로 호출하고, 테스트는 트레이트를 직접 구현한 mock을
//! 사용합니다.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ CompletionPoller │
//! └────────┬─────────┘
//!          │
//!          ▼
//!   ┌──────────────┐
//!   │ RemoteClient │ (trait)
//!   └──────────────┘
//!        │      │
//!        ▼      ▼
//!   ┌───────┐ ┌──────┐
//!   │OpenSsh│ │ Mock │
//!   └───┬───┘ └──────┘
//!       │
//!       ▼
//!   ssh / scp 서브프로세스
//! ```

use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::process::Command;
use tracing::debug;

use guestlab_core::error::RemoteError;
use guestlab_core::metrics::{
    LABEL_DIRECTION, LABEL_RESULT, REMOTE_COMMANDS_TOTAL, REMOTE_COMMAND_DURATION_SECONDS,
    REMOTE_TRANSFERS_TOTAL,
};

use crate::target::SshTarget;

/// 원격 명령의 캡처된 출력
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// 종료 코드 (시그널로 종료된 경우 None)
    pub exit_code: Option<i32>,
    /// 표준 출력
    pub stdout: String,
    /// 표준 에러
    pub stderr: String,
}

impl CommandOutput {
    /// 명령이 종료 코드 0으로 성공했는지 여부
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// 게스트 원격 상호작용 트레이트
///
/// 명령 실행, 백그라운드 실행, 파일 전송, 연결 확인을 추상화합니다.
/// 트레이트는 `Send + Sync + 'static`이므로 async 컨텍스트 간 안전하게
/// 공유할 수 있습니다.
///
/// # Implementations
///
/// - [`OpenSshClient`]: 시스템 `ssh`/`scp`를 사용하는 프로덕션 구현
/// - 테스트 구현: 소비자 크레이트의 테스트가 트레이트를 직접 구현
pub trait RemoteClient: Send + Sync + 'static {
    /// 원격 명령을 실행하고 출력을 캡처합니다.
    ///
    /// 원격 명령의 0이 아닌 종료 코드는 에러가 아니라 [`CommandOutput`]으로
    /// 반환됩니다. 호출자가 종료 코드를 해석합니다.
    ///
    /// # Errors
    ///
    /// - `RemoteError::Unreachable`: 접속 자체가 실패한 경우
    fn run(&self, command: &str)
    -> impl Future<Output = Result<CommandOutput, RemoteError>> + Send;

    /// 원격 명령을 백그라운드에서 시작하고 즉시 반환합니다.
    ///
    /// 명령은 세션 종료 후에도 계속 실행됩니다. 게스트 측 테스트
    /// 스크립트를 시작할 때 사용합니다.
    ///
    /// # Errors
    ///
    /// - `RemoteError::LaunchFailed`: 시작 명령이 실패한 경우
    fn run_detached(&self, command: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// 로컬 파일을 게스트로 업로드합니다.
    ///
    /// # Errors
    ///
    /// - `RemoteError::TransferFailed`: 전송 실패 (파일 없음 포함)
    fn upload(
        &self,
        local: &Path,
        remote: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// 게스트 파일을 로컬로 다운로드합니다.
    ///
    /// 원격 파일이 존재하지 않는 경우도 `TransferFailed`로 보고됩니다.
    /// 폴러는 이를 일시적 실패로 취급하고 재시도합니다.
    ///
    /// # Errors
    ///
    /// - `RemoteError::TransferFailed`: 전송 실패 (파일 없음 포함)
    fn download(
        &self,
        remote: &str,
        local: &Path,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// 게스트 연결 가능 여부를 확인합니다.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Unreachable` if the guest cannot be reached.
    fn ping(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// 시스템 OpenSSH 클라이언트를 사용하는 프로덕션 구현
///
/// 모든 호출은 `ssh`/`scp` 서브프로세스를 생성합니다. 비대화식 실행을
/// 위해 `BatchMode=yes`를 강제하므로 키 기반 인증이 준비되어 있어야
/// 합니다. 테스트 VM은 일회성이므로 호스트 키 검증은 생략합니다.
#[derive(Debug)]
pub struct OpenSshClient {
    target: SshTarget,
    connect_timeout: Duration,
}

impl OpenSshClient {
    /// 검증된 접속 대상으로 클라이언트를 생성합니다.
    pub fn new(target: SshTarget, connect_timeout: Duration) -> Self {
        Self {
            target,
            connect_timeout,
        }
    }

    /// 접속 대상
    pub fn target(&self) -> &SshTarget {
        &self.target
    }

    /// ssh/scp 공통 옵션
    fn common_options(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_owned(),
            "BatchMode=yes".to_owned(),
            "-o".to_owned(),
            "StrictHostKeyChecking=no".to_owned(),
            "-o".to_owned(),
            "UserKnownHostsFile=/dev/null".to_owned(),
            "-o".to_owned(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs()),
        ];
        if let Some(key) = &self.target.private_key_path {
            args.push("-i".to_owned());
            args.push(key.display().to_string());
        }
        args
    }

    /// ssh 호출 인자: 옵션 + 포트 + 목적지 + 원격 명령
    fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = self.common_options();
        args.push("-p".to_owned());
        args.push(self.target.port.to_string());
        args.push(format!("{}@{}", self.target.user, self.target.host));
        args.push(command.to_owned());
        args
    }

    /// scp 호출 인자: 옵션 + 포트 + 출발지 + 목적지
    fn scp_args(&self, source: &str, dest: &str) -> Vec<String> {
        let mut args = self.common_options();
        // scp는 포트 옵션이 대문자 -P
        args.push("-P".to_owned());
        args.push(self.target.port.to_string());
        args.push(source.to_owned());
        args.push(dest.to_owned());
        args
    }

    /// 원격 경로를 `user@host:path` 형식으로 변환합니다.
    fn remote_path(&self, path: &str) -> String {
        format!("{}@{}:{}", self.target.user, self.target.host, path)
    }

    async fn spawn_and_wait(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput, RemoteError> {
        debug!(program, ?args, "spawning remote subprocess");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RemoteError::Unreachable {
                target: self.target.to_string(),
                reason: format!("failed to spawn {program}: {e}"),
            })?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ssh(1)는 접속 실패 시 255를 반환하므로 원격 명령의 종료 코드와
// 구분할 수 있습니다.
const SSH_CONNECTION_FAILURE: i32 = 255;

impl RemoteClient for OpenSshClient {
    async fn run(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        let start = Instant::now();
        let output = self.spawn_and_wait("ssh", &self.ssh_args(command)).await?;
        histogram!(REMOTE_COMMAND_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        if output.exit_code == Some(SSH_CONNECTION_FAILURE) {
            counter!(REMOTE_COMMANDS_TOTAL, LABEL_RESULT => "failure").increment(1);
            return Err(RemoteError::Unreachable {
                target: self.target.to_string(),
                reason: output.stderr.trim().to_owned(),
            });
        }

        let result = if output.success() { "success" } else { "failure" };
        counter!(REMOTE_COMMANDS_TOTAL, LABEL_RESULT => result).increment(1);
        Ok(output)
    }

    async fn run_detached(&self, command: &str) -> Result<(), RemoteError> {
        // nohup + 리다이렉션으로 ssh 세션 종료 후에도 명령이 살아남도록 합니다.
        let detached = format!("nohup {command} > /dev/null 2>&1 < /dev/null &");
        let output = self.spawn_and_wait("ssh", &self.ssh_args(&detached)).await?;

        if !output.success() {
            counter!(REMOTE_COMMANDS_TOTAL, LABEL_RESULT => "failure").increment(1);
            return Err(RemoteError::LaunchFailed {
                command: command.to_owned(),
                reason: output.stderr.trim().to_owned(),
            });
        }
        counter!(REMOTE_COMMANDS_TOTAL, LABEL_RESULT => "success").increment(1);
        Ok(())
    }

    async fn upload(&self, local: &Path, remote: &str) -> Result<(), RemoteError> {
        let source = local.display().to_string();
        let dest = self.remote_path(remote);
        let output = self
            .spawn_and_wait("scp", &self.scp_args(&source, &dest))
            .await?;

        if !output.success() {
            counter!(REMOTE_TRANSFERS_TOTAL, LABEL_DIRECTION => "upload", LABEL_RESULT => "failure")
                .increment(1);
            return Err(RemoteError::TransferFailed {
                path: source,
                reason: output.stderr.trim().to_owned(),
            });
        }
        counter!(REMOTE_TRANSFERS_TOTAL, LABEL_DIRECTION => "upload", LABEL_RESULT => "success")
            .increment(1);
        Ok(())
    }

    async fn download(&self, remote: &str, local: &Path) -> Result<(), RemoteError> {
        let source = self.remote_path(remote);
        let dest = local.display().to_string();
        let output = self
            .spawn_and_wait("scp", &self.scp_args(&source, &dest))
            .await?;

        if !output.success() {
            counter!(REMOTE_TRANSFERS_TOTAL, LABEL_DIRECTION => "download", LABEL_RESULT => "failure")
                .increment(1);
            return Err(RemoteError::TransferFailed {
                path: remote.to_owned(),
                reason: output.stderr.trim().to_owned(),
            });
        }
        counter!(REMOTE_TRANSFERS_TOTAL, LABEL_DIRECTION => "download", LABEL_RESULT => "success")
            .increment(1);
        Ok(())
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        let output = self.run("true").await?;
        if !output.success() {
            return Err(RemoteError::Unreachable {
                target: self.target.to_string(),
                reason: format!("ping command exited with {:?}", output.exit_code),
            });
        }
        Ok(())
    }
}
