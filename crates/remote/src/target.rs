//! SSH 접속 대상 정의 및 검증

use std::fmt;
use std::path::PathBuf;

use guestlab_core::config::RemoteConfig;
use guestlab_core::error::RemoteError;

/// SSH 접속 대상
///
/// 호스트, 포트, 사용자, 개인키 경로를 담습니다. 생성 시점에
/// [`validate`](Self::validate)로 검증되므로 이후 코드는 필드가
/// 서브프로세스 인자로 안전하다고 가정할 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    /// 호스트 주소 (IP 또는 호스트명)
    pub host: String,
    /// SSH 포트
    pub port: u16,
    /// SSH 사용자
    pub user: String,
    /// 개인키 경로 (없으면 ssh-agent/기본키 사용)
    pub private_key_path: Option<PathBuf>,
}

impl SshTarget {
    /// 검증된 접속 대상을 생성합니다.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        let target = Self {
            host: host.into(),
            port,
            user: user.into(),
            private_key_path: None,
        };
        target.validate()?;
        Ok(target)
    }

    /// 개인키 경로를 설정합니다.
    #[must_use]
    pub fn with_private_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key_path = Some(path.into());
        self
    }

    /// 설정의 `[remote]` 섹션에서 접속 대상을 생성합니다.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let mut target = Self::new(config.host.clone(), config.port, config.user.clone())?;
        if let Some(key) = &config.private_key_path {
            target = target.with_private_key(key);
        }
        Ok(target)
    }

    /// 필드를 검증합니다.
    ///
    /// 호스트/사용자는 비어 있지 않아야 하고 셸 메타문자를 포함할 수
    /// 없습니다. 서브프로세스 인자로 전달되기 전의 유일한 방어선입니다.
    pub fn validate(&self) -> Result<(), RemoteError> {
        if self.host.is_empty() {
            return Err(RemoteError::InvalidTarget {
                field: "host".to_owned(),
                reason: "host must not be empty".to_owned(),
            });
        }
        if !self.host.chars().all(is_safe_host_char) {
            return Err(RemoteError::InvalidTarget {
                field: "host".to_owned(),
                reason: "host contains invalid characters".to_owned(),
            });
        }
        if self.port == 0 {
            return Err(RemoteError::InvalidTarget {
                field: "port".to_owned(),
                reason: "port must not be 0".to_owned(),
            });
        }
        if self.user.is_empty() {
            return Err(RemoteError::InvalidTarget {
                field: "user".to_owned(),
                reason: "user must not be empty".to_owned(),
            });
        }
        if !self.user.chars().all(is_safe_user_char) {
            return Err(RemoteError::InvalidTarget {
                field: "user".to_owned(),
                reason: "user contains invalid characters".to_owned(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for SshTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

/// 호스트명에 허용되는 문자 (RFC 1123 호스트명 + IPv6 리터럴의 콜론)
fn is_safe_host_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':')
}

/// 사용자명에 허용되는 문자
fn is_safe_user_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}
