//! 폴링 예산 — 폴링이 무한히 반복되지 않도록 하는 상한

use std::time::Duration;

use guestlab_core::config::PollConfig;
use guestlab_core::error::ConfigError;

/// 폴링 예산
///
/// 두 가지 방식 중 하나로 폴링 루프의 상한을 정합니다:
/// 최대 fetch 시도 횟수 또는 전체 경과 시간. 예산 소진은 게스트 측
/// 실패 보고와 구분되는 별도의 타임아웃 결과로 처리됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollBudget {
    /// 최대 fetch 시도 횟수
    Attempts(u32),
    /// 전체 경과 시간 상한
    Timeout(Duration),
}

impl PollBudget {
    /// 현재 시도 횟수와 경과 시간으로 예산 소진 여부를 판단합니다.
    pub fn is_exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        match self {
            Self::Attempts(max) => attempts >= *max,
            Self::Timeout(limit) => elapsed >= *limit,
        }
    }

    /// 설정의 `[poll]` 섹션에서 예산을 생성합니다.
    pub fn from_config(config: &PollConfig) -> Result<Self, ConfigError> {
        match config.budget_mode.as_str() {
            "attempts" => Ok(Self::Attempts(config.max_attempts)),
            "timeout" => Ok(Self::Timeout(Duration::from_secs(config.timeout_secs))),
            other => Err(ConfigError::InvalidValue {
                field: "poll.budget_mode".to_owned(),
                reason: format!("must be 'attempts' or 'timeout', got '{other}'"),
            }),
        }
    }
}
