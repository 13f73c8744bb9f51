//! 에러 타입 — 도메인별 에러 정의

use crate::types::TestState;

/// Guestlab 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum GuestlabError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 원격 실행/전송 에러
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// 완료 폴링 에러
    #[error("poll error: {0}")]
    Poll(#[from] PollError),

    /// VM 라이프사이클 에러
    #[error("deploy error: {0}")]
    Deploy(#[from] DeployError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 원격 실행/파일 전송 에러
///
/// SSH/SCP 서브프로세스 호출에서 발생하는 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// 대상 호스트에 도달할 수 없음
    #[error("host unreachable: {target}: {reason}")]
    Unreachable { target: String, reason: String },

    /// 원격 명령이 0이 아닌 종료 코드로 실패
    #[error("remote command '{command}' failed (exit: {exit_code:?}): {stderr}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// 백그라운드 명령 시작 실패
    #[error("failed to launch detached command '{command}': {reason}")]
    LaunchFailed { command: String, reason: String },

    /// 파일 업로드/다운로드 실패
    #[error("file transfer failed for '{path}': {reason}")]
    TransferFailed { path: String, reason: String },

    /// 유효하지 않은 접속 대상 (호스트/포트/사용자)
    #[error("invalid ssh target: {field}: {reason}")]
    InvalidTarget { field: String, reason: String },
}

/// 완료 폴링 에러
///
/// 두 실패 종류를 구분합니다: 게스트가 명시적으로 실패 마커를 보고한 경우와
/// 터미널 마커 없이 예산이 소진된 경우(타임아웃).
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// 게스트가 터미널 실패 마커를 보고함 — 재시도 없이 즉시 종료
    #[error("guest reported terminal failure '{state}' after {attempts} fetch attempts")]
    ObservedFailure { state: TestState, attempts: u32 },

    /// 터미널 마커 없이 폴링 예산 소진 (타임아웃)
    #[error("poll budget exhausted after {attempts} fetch attempts ({elapsed_secs}s) without a terminal state")]
    BudgetExhausted { attempts: u32, elapsed_secs: u64 },
}

/// VM 라이프사이클 에러
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// 프로비저닝 명령 실패
    #[error("provision failed: {0}")]
    ProvisionFailed(String),

    /// 해체 명령 실패
    #[error("teardown failed: {0}")]
    TeardownFailed(String),

    /// 재시작 명령 실패
    #[error("restart failed: {0}")]
    RestartFailed(String),

    /// 명령 출력에서 접속 주소를 파싱할 수 없음
    #[error("cannot parse reachability address from command output: {output}")]
    AddressUnparseable { output: String },

    /// 라이프사이클 기능이 설정에서 비활성화됨
    #[error("vm lifecycle is disabled in configuration")]
    Disabled,
}
