//! 설정 관리 — guestlab.toml 파싱 및 런타임 설정
//!
//! [`GuestlabConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`GUESTLAB_REMOTE_HOST=10.0.0.5` 형식)
//! 3. 설정 파일 (`guestlab.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), guestlab_core::error::GuestlabError> {
//! use guestlab_core::config::GuestlabConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = GuestlabConfig::load("guestlab.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = GuestlabConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, GuestlabError};

/// Guestlab 통합 설정
///
/// `guestlab.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 구성 요소는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestlabConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 원격 접속 설정
    #[serde(default)]
    pub remote: RemoteConfig,
    /// 완료 폴링 설정
    #[serde(default)]
    pub poll: PollConfig,
    /// VM 라이프사이클 설정
    #[serde(default)]
    pub deploy: DeployConfig,
}

impl GuestlabConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, GuestlabError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, GuestlabError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GuestlabError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                GuestlabError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, GuestlabError> {
        toml::from_str(toml_str).map_err(|e| {
            GuestlabError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `GUESTLAB_{SECTION}_{FIELD}`
    /// 예: `GUESTLAB_REMOTE_HOST=10.0.0.5`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "GUESTLAB_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "GUESTLAB_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.work_dir, "GUESTLAB_GENERAL_WORK_DIR");

        // Remote
        override_string(&mut self.remote.host, "GUESTLAB_REMOTE_HOST");
        override_u16(&mut self.remote.port, "GUESTLAB_REMOTE_PORT");
        override_string(&mut self.remote.user, "GUESTLAB_REMOTE_USER");
        override_opt_string(
            &mut self.remote.private_key_path,
            "GUESTLAB_REMOTE_PRIVATE_KEY_PATH",
        );
        override_u64(
            &mut self.remote.connect_timeout_secs,
            "GUESTLAB_REMOTE_CONNECT_TIMEOUT_SECS",
        );

        // Poll
        override_u64(&mut self.poll.interval_secs, "GUESTLAB_POLL_INTERVAL_SECS");
        override_string(&mut self.poll.budget_mode, "GUESTLAB_POLL_BUDGET_MODE");
        override_u32(&mut self.poll.max_attempts, "GUESTLAB_POLL_MAX_ATTEMPTS");
        override_u64(&mut self.poll.timeout_secs, "GUESTLAB_POLL_TIMEOUT_SECS");
        override_string(&mut self.poll.state_path, "GUESTLAB_POLL_STATE_PATH");
        override_string(
            &mut self.poll.report_skipped_as,
            "GUESTLAB_POLL_REPORT_SKIPPED_AS",
        );

        // Deploy
        override_bool(&mut self.deploy.enabled, "GUESTLAB_DEPLOY_ENABLED");
        override_string(&mut self.deploy.provision_cmd, "GUESTLAB_DEPLOY_PROVISION_CMD");
        override_string(&mut self.deploy.teardown_cmd, "GUESTLAB_DEPLOY_TEARDOWN_CMD");
        override_string(&mut self.deploy.restart_cmd, "GUESTLAB_DEPLOY_RESTART_CMD");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), GuestlabError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // remote.port 검증
        if self.remote.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "remote.port".to_owned(),
                reason: "port must not be 0".to_owned(),
            }
            .into());
        }

        // budget_mode 검증 및 모드별 예산값 검증
        match self.poll.budget_mode.as_str() {
            "attempts" => {
                if self.poll.max_attempts == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "poll.max_attempts".to_owned(),
                        reason: "must be greater than 0 when budget_mode is 'attempts'"
                            .to_owned(),
                    }
                    .into());
                }
            }
            "timeout" => {
                if self.poll.timeout_secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "poll.timeout_secs".to_owned(),
                        reason: "must be greater than 0 when budget_mode is 'timeout'".to_owned(),
                    }
                    .into());
                }
            }
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "poll.budget_mode".to_owned(),
                    reason: format!("must be 'attempts' or 'timeout', got '{other}'"),
                }
                .into());
            }
        }

        // report_skipped_as 검증
        if crate::types::SkippedPolicy::from_str_loose(&self.poll.report_skipped_as).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "poll.report_skipped_as".to_owned(),
                reason: "must be 'skipped' or 'pass'".to_owned(),
            }
            .into());
        }

        // state_path 검증
        if self.poll.state_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "poll.state_path".to_owned(),
                reason: "state file path must not be empty".to_owned(),
            }
            .into());
        }

        // deploy가 활성화된 경우에만 명령 검증
        if self.deploy.enabled {
            if self.deploy.provision_cmd.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "deploy.provision_cmd".to_owned(),
                    reason: "provision_cmd must not be empty when deploy is enabled".to_owned(),
                }
                .into());
            }
            if self.deploy.teardown_cmd.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "deploy.teardown_cmd".to_owned(),
                    reason: "teardown_cmd must not be empty when deploy is enabled".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

// Default는 derive 매크로로 자동 생성 (각 필드가 Default를 구현하므로)

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 가져온 상태 파일/로그의 로컬 작업 디렉토리
    pub work_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            work_dir: "/tmp/guestlab".to_owned(),
        }
    }
}

/// 원격 접속 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// 게스트 호스트 주소
    pub host: String,
    /// SSH 포트
    pub port: u16,
    /// SSH 사용자
    pub user: String,
    /// SSH 개인키 경로 (없으면 ssh-agent/기본키 사용)
    pub private_key_path: Option<String>,
    /// 접속 타임아웃 (초)
    pub connect_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            user: "root".to_owned(),
            private_key_path: None,
            connect_timeout_secs: 10,
        }
    }
}

/// 완료 폴링 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// 폴링 주기 (초)
    pub interval_secs: u64,
    /// 예산 방식 ("attempts" 또는 "timeout")
    pub budget_mode: String,
    /// 최대 fetch 시도 횟수 (budget_mode = "attempts")
    pub max_attempts: u32,
    /// 전체 타임아웃 (초, budget_mode = "timeout")
    pub timeout_secs: u64,
    /// 게스트 측 상태 파일 경로
    pub state_path: String,
    /// TestSkipped 보고 방식 ("skipped" 또는 "pass")
    pub report_skipped_as: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            budget_mode: "attempts".to_owned(),
            max_attempts: 20,
            timeout_secs: 600,
            state_path: "state.txt".to_owned(),
            report_skipped_as: "skipped".to_owned(),
        }
    }
}

/// VM 라이프사이클 설정
///
/// 프로비저닝/해체/재시작은 외부 명령으로 위임됩니다. 각 명령의
/// 표준 출력 마지막 줄이 새 접속 주소(`host[:port]`)로 해석됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// 라이프사이클 기능 활성화 여부
    pub enabled: bool,
    /// 프로비저닝 명령
    pub provision_cmd: String,
    /// 해체 명령
    pub teardown_cmd: String,
    /// 재시작 명령
    pub restart_cmd: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provision_cmd: String::new(),
            teardown_cmd: String::new(),
            restart_cmd: String::new(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = Some(val);
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = GuestlabConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.remote.port, 22);
        assert_eq!(config.remote.user, "root");
        assert_eq!(config.poll.interval_secs, 5);
        assert_eq!(config.poll.budget_mode, "attempts");
        assert_eq!(config.poll.state_path, "state.txt");
        assert!(!config.deploy.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        let config = GuestlabConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = GuestlabConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.poll.max_attempts, 20);
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[remote]
host = "192.0.2.10"
user = "azureuser"

[poll]
interval_secs = 10
"#;
        let config = GuestlabConfig::parse(toml).unwrap();
        assert_eq!(config.remote.host, "192.0.2.10");
        assert_eq!(config.remote.user, "azureuser");
        assert_eq!(config.poll.interval_secs, 10);
        // port는 기본값 유지
        assert_eq!(config.remote.port, 22);
    }

    #[test]
    fn from_str_full_toml() {
        let toml = r#"
[general]
log_level = "debug"
log_format = "json"
work_dir = "/var/lib/guestlab"

[remote]
host = "203.0.113.7"
port = 2222
user = "lisuser"
private_key_path = "/home/lab/.ssh/id_rsa"
connect_timeout_secs = 30

[poll]
interval_secs = 3
budget_mode = "timeout"
max_attempts = 50
timeout_secs = 1800
state_path = "/home/lisuser/state.txt"
report_skipped_as = "pass"

[deploy]
enabled = true
provision_cmd = "./scripts/deploy-vm.sh focal"
teardown_cmd = "./scripts/destroy-vm.sh"
restart_cmd = "./scripts/restart-vm.sh"
"#;
        let config = GuestlabConfig::parse(toml).unwrap();
        assert_eq!(config.general.work_dir, "/var/lib/guestlab");
        assert_eq!(config.remote.port, 2222);
        assert_eq!(
            config.remote.private_key_path.as_deref(),
            Some("/home/lab/.ssh/id_rsa")
        );
        assert_eq!(config.poll.budget_mode, "timeout");
        assert_eq!(config.poll.timeout_secs, 1800);
        assert_eq!(config.poll.report_skipped_as, "pass");
        assert!(config.deploy.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = GuestlabConfig::parse("invalid = [[[toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            GuestlabError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = GuestlabConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = GuestlabConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_port() {
        let mut config = GuestlabConfig::default();
        config.remote.port = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn validate_rejects_unknown_budget_mode() {
        let mut config = GuestlabConfig::default();
        config.poll.budget_mode = "forever".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("budget_mode"));
    }

    #[test]
    fn validate_rejects_zero_attempts_in_attempts_mode() {
        let mut config = GuestlabConfig::default();
        config.poll.budget_mode = "attempts".to_owned();
        config.poll.max_attempts = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn validate_rejects_zero_timeout_in_timeout_mode() {
        let mut config = GuestlabConfig::default();
        config.poll.budget_mode = "timeout".to_owned();
        config.poll.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn validate_accepts_zero_attempts_in_timeout_mode() {
        // timeout 모드에서는 max_attempts가 사용되지 않으므로 검증 생략
        let mut config = GuestlabConfig::default();
        config.poll.budget_mode = "timeout".to_owned();
        config.poll.max_attempts = 0;
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_invalid_skipped_policy() {
        let mut config = GuestlabConfig::default();
        config.poll.report_skipped_as = "ignore".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("report_skipped_as"));
    }

    #[test]
    fn validate_rejects_empty_state_path() {
        let mut config = GuestlabConfig::default();
        config.poll.state_path = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("state_path"));
    }

    #[test]
    fn validate_rejects_empty_provision_cmd_when_deploy_enabled() {
        let mut config = GuestlabConfig::default();
        config.deploy.enabled = true;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("provision_cmd"));
    }

    #[test]
    fn validate_accepts_empty_commands_when_deploy_disabled() {
        let mut config = GuestlabConfig::default();
        config.deploy.enabled = false;
        config.deploy.provision_cmd = String::new();
        config.validate().unwrap();
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: #[serial] 테스트에서만 환경변수를 조작하므로 안전합니다.
        unsafe { std::env::set_var("TEST_GUESTLAB_STR", "overridden") };
        override_string(&mut val, "TEST_GUESTLAB_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_GUESTLAB_STR") };
    }

    #[test]
    #[serial]
    fn env_override_u16_valid() {
        let mut val = 22u16;
        // SAFETY: #[serial] 테스트에서만 환경변수를 조작하므로 안전합니다.
        unsafe { std::env::set_var("TEST_GUESTLAB_PORT", "2222") };
        override_u16(&mut val, "TEST_GUESTLAB_PORT");
        assert_eq!(val, 2222);
        unsafe { std::env::remove_var("TEST_GUESTLAB_PORT") };
    }

    #[test]
    #[serial]
    fn env_override_u16_invalid_keeps_original() {
        let mut val = 22u16;
        // SAFETY: #[serial] 테스트에서만 환경변수를 조작하므로 안전합니다.
        unsafe { std::env::set_var("TEST_GUESTLAB_PORT_BAD", "not-a-port") };
        override_u16(&mut val, "TEST_GUESTLAB_PORT_BAD");
        assert_eq!(val, 22); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_GUESTLAB_PORT_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: #[serial] 테스트에서만 환경변수를 조작하므로 안전합니다.
        unsafe { std::env::set_var("TEST_GUESTLAB_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_GUESTLAB_BOOL_BAD");
        assert!(!val);
        unsafe { std::env::remove_var("TEST_GUESTLAB_BOOL_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_opt_string_sets_some() {
        let mut val: Option<String> = None;
        // SAFETY: #[serial] 테스트에서만 환경변수를 조작하므로 안전합니다.
        unsafe { std::env::set_var("TEST_GUESTLAB_KEY_PATH", "/tmp/key") };
        override_opt_string(&mut val, "TEST_GUESTLAB_KEY_PATH");
        assert_eq!(val.as_deref(), Some("/tmp/key"));
        unsafe { std::env::remove_var("TEST_GUESTLAB_KEY_PATH") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_GUESTLAB_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = GuestlabConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = GuestlabConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.remote.port, parsed.remote.port);
        assert_eq!(config.poll.max_attempts, parsed.poll.max_attempts);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = GuestlabConfig::from_file("/nonexistent/path/guestlab.toml").await;
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            GuestlabError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
