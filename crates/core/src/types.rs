//! 도메인 타입 — 게스트 테스트 상태와 결과 모델
//!
//! 게스트는 테스트 진행 상황을 작은 상태 파일(`state.txt`)에 기록하고,
//! 호스트 측 폴러는 그 내용을 [`TestState`]로 파싱합니다.
//! 터미널 상태는 [`SkippedPolicy`]에 따라 최종 [`Verdict`]로 매핑됩니다.

use std::fmt;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 게스트가 상태 파일에 기록하는 테스트 상태 마커
///
/// `Running`만 비터미널이며, 나머지 네 개는 폴링을 종료시키는
/// 터미널 마커입니다. `Completed`/`Skipped`는 성공 계열,
/// `Aborted`/`Failed`는 실패 계열입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestState {
    /// 테스트가 아직 실행 중 (비터미널)
    Running,
    /// 테스트 정상 완료
    Completed,
    /// 테스트가 스스로 건너뜀 (성공 계열 터미널)
    Skipped,
    /// 테스트 중단 (실패 계열 터미널)
    Aborted,
    /// 테스트 실패 (실패 계열 터미널)
    Failed,
}

impl TestState {
    /// 상태 파일 내용에서 마커를 파싱합니다.
    ///
    /// 인식할 수 없는 텍스트는 `None`을 반환하며, 호출자는 이를
    /// "아직 준비되지 않음"으로 취급해야 합니다 (에러가 아님).
    /// 구형 스크립트가 기록하는 `Aborted` 철자도 `TestAborted`의
    /// 별칭으로 허용합니다.
    pub fn parse_marker(s: &str) -> Option<Self> {
        match s.trim() {
            "TestRunning" => Some(Self::Running),
            "TestCompleted" => Some(Self::Completed),
            "TestSkipped" => Some(Self::Skipped),
            "TestAborted" | "Aborted" => Some(Self::Aborted),
            "TestFailed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// 정식 마커 문자열을 반환합니다.
    pub fn as_marker(&self) -> &'static str {
        match self {
            Self::Running => "TestRunning",
            Self::Completed => "TestCompleted",
            Self::Skipped => "TestSkipped",
            Self::Aborted => "TestAborted",
            Self::Failed => "TestFailed",
        }
    }

    /// 이 마커가 폴링을 종료시키는지 여부
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// 성공 계열 터미널 마커인지 여부 (`Completed`, `Skipped`)
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }
}

impl fmt::Display for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_marker())
    }
}

/// `TestSkipped` 터미널 상태를 최종 결과로 어떻게 보고할지 결정하는 정책
///
/// 원본 스크립트들은 SKIPPED을 별도 결과로 보고하는 곳과 PASS로 접어
/// 보고하는 곳이 혼재했으므로, 두 동작 모두 설정으로 보존합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkippedPolicy {
    /// SKIPPED을 별도 결과 범주로 보고 (기본값)
    #[default]
    Distinct,
    /// SKIPPED을 PASS로 접어 보고
    FoldIntoPass,
}

impl SkippedPolicy {
    /// 설정 문자열에서 정책을 파싱합니다. 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "skipped" | "distinct" => Some(Self::Distinct),
            "pass" | "fold_into_pass" => Some(Self::FoldIntoPass),
            _ => None,
        }
    }
}

/// 테스트 최종 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// 테스트 통과
    Pass,
    /// 테스트 실패
    Fail,
    /// 테스트 중단 (타임아웃 또는 게스트 보고)
    Aborted,
    /// 테스트 건너뜀
    Skipped,
}

impl Verdict {
    /// 터미널 상태를 판정으로 매핑합니다.
    ///
    /// `Running`은 터미널이 아니므로 매핑이 정의되지 않으며 `None`을
    /// 반환합니다. 폴링 타임아웃의 매핑(ABORTED)은 호출자 몫입니다.
    pub fn from_state(state: TestState, policy: SkippedPolicy) -> Option<Self> {
        match state {
            TestState::Running => None,
            TestState::Completed => Some(Self::Pass),
            TestState::Skipped => match policy {
                SkippedPolicy::Distinct => Some(Self::Skipped),
                SkippedPolicy::FoldIntoPass => Some(Self::Pass),
            },
            TestState::Aborted => Some(Self::Aborted),
            TestState::Failed => Some(Self::Fail),
        }
    }

    /// 성공으로 취급되는 판정인지 여부 (PASS, SKIPPED)
    pub fn is_passing(&self) -> bool {
        matches!(self, Self::Pass | Self::Skipped)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::Aborted => write!(f, "ABORTED"),
            Self::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// 원격 테스트 실행 한 건
///
/// 게스트에서 실행할 명령과, 완료 신호로 사용할 상태 파일 경로,
/// 수집할 게스트 로그 경로를 담습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    /// 실행 식별자
    pub id: Uuid,
    /// 테스트 이름 (보고용)
    pub name: String,
    /// 게스트에서 실행할 명령
    pub command: String,
    /// 게스트 측 상태 파일 경로
    pub state_path: String,
    /// 게스트 측 요약 로그 경로 (없으면 수집 생략)
    pub log_path: Option<String>,
}

impl TestRun {
    /// 기본 상태 파일/로그 경로로 새 실행을 생성합니다.
    ///
    /// 게스트 스크립트 규약을 따릅니다: 상태는 `state.txt`에,
    /// 요약은 `summary.log`에 기록됩니다.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            command: command.into(),
            state_path: "state.txt".to_owned(),
            log_path: Some("summary.log".to_owned()),
        }
    }

    /// 상태 파일 경로를 변경합니다.
    pub fn with_state_path(mut self, path: impl Into<String>) -> Self {
        self.state_path = path.into();
        self
    }

    /// 요약 로그 경로를 변경합니다. `None`이면 수집하지 않습니다.
    pub fn with_log_path(mut self, path: Option<String>) -> Self {
        self.log_path = path;
        self
    }
}

impl fmt::Display for TestRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.command)
    }
}

/// 폴링 성공 결과
///
/// 성공 계열 터미널 마커가 관찰된 시점의 스냅샷입니다.
/// 실패 계열 결과는 [`crate::error::PollError`]로 표현됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResult {
    /// 관찰된 터미널 상태 (`Completed` 또는 `Skipped`)
    pub state: TestState,
    /// 수행한 fetch 시도 횟수
    pub attempts: u32,
}

/// 테스트 실행 보고서
///
/// CLI 출력과 JSON 직렬화에 사용됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    /// 테스트 이름
    pub name: String,
    /// 최종 판정
    pub verdict: Verdict,
    /// 관찰된 터미널 상태 (타임아웃이면 None)
    pub state: Option<TestState>,
    /// 수행한 fetch 시도 횟수
    pub attempts: u32,
    /// 전체 소요 시간
    pub duration: Duration,
    /// 완료 시각
    pub finished_at: SystemTime,
    /// 게스트 요약 로그 (수집에 성공한 경우)
    pub guest_log: Option<String>,
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (attempts: {}, {:.1}s)",
            self.name,
            self.verdict,
            self.attempts,
            self.duration.as_secs_f64(),
        )
    }
}
