//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `guestlab_`
//! - 모듈명: `poller_`, `remote_`, `deploy_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use guestlab_core::metrics;
//! use metrics::counter;
//!
//! counter!(guestlab_core::metrics::POLLER_FETCH_ATTEMPTS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (completed, skipped, aborted, failed, timeout)
pub const LABEL_RESULT: &str = "result";

/// 작업 종류 레이블 키 (provision, teardown, restart)
pub const LABEL_OPERATION: &str = "operation";

/// 전송 방향 레이블 키 (upload, download)
pub const LABEL_DIRECTION: &str = "direction";

// ─── Poller 메트릭 ──────────────────────────────────────────────────

/// Poller: 상태 파일 fetch 시도 횟수 (counter)
pub const POLLER_FETCH_ATTEMPTS_TOTAL: &str = "guestlab_poller_fetch_attempts_total";

/// Poller: 상태 파일 fetch 실패 횟수 (counter)
pub const POLLER_FETCH_FAILURES_TOTAL: &str = "guestlab_poller_fetch_failures_total";

/// Poller: 완료된 폴링 세션 수 (counter, label: result)
pub const POLLER_POLLS_COMPLETED_TOTAL: &str = "guestlab_poller_polls_completed_total";

/// Poller: 폴링 세션 소요 시간 (histogram, 초)
pub const POLLER_POLL_DURATION_SECONDS: &str = "guestlab_poller_poll_duration_seconds";

/// Poller: 인식되지 않은 상태 마커 수 (counter)
pub const POLLER_UNRECOGNIZED_MARKERS_TOTAL: &str = "guestlab_poller_unrecognized_markers_total";

// ─── Remote 메트릭 ──────────────────────────────────────────────────

/// Remote: 실행된 원격 명령 수 (counter, label: result)
pub const REMOTE_COMMANDS_TOTAL: &str = "guestlab_remote_commands_total";

/// Remote: 파일 전송 수 (counter, labels: direction, result)
pub const REMOTE_TRANSFERS_TOTAL: &str = "guestlab_remote_transfers_total";

/// Remote: 원격 명령 실행 시간 (histogram, 초)
pub const REMOTE_COMMAND_DURATION_SECONDS: &str = "guestlab_remote_command_duration_seconds";

// ─── Deploy 메트릭 ──────────────────────────────────────────────────

/// Deploy: VM 라이프사이클 작업 수 (counter, labels: operation, result)
pub const DEPLOY_OPERATIONS_TOTAL: &str = "guestlab_deploy_operations_total";

/// Deploy: 라이프사이클 작업 소요 시간 (histogram, 초)
pub const DEPLOY_OPERATION_DURATION_SECONDS: &str = "guestlab_deploy_operation_duration_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 폴링 세션 소요 시간 히스토그램 버킷 (초)
///
/// 1s ~ 30분 범위 (게스트 테스트는 수 분 단위로 실행됨)
pub const POLL_DURATION_BUCKETS: [f64; 9] =
    [1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0];

/// 원격 명령 실행 시간 히스토그램 버킷 (초)
///
/// 10ms ~ 60s 범위 (SSH 왕복 + 명령 실행)
pub const COMMAND_DURATION_BUCKETS: [f64; 8] = [0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 60.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 CLI 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    // Poller
    describe_counter!(
        POLLER_FETCH_ATTEMPTS_TOTAL,
        "Total number of state file fetch attempts"
    );
    describe_counter!(
        POLLER_FETCH_FAILURES_TOTAL,
        "Total number of failed state file fetches"
    );
    describe_counter!(
        POLLER_POLLS_COMPLETED_TOTAL,
        "Total number of completed poll sessions by result"
    );
    describe_histogram!(
        POLLER_POLL_DURATION_SECONDS,
        "Duration of a full poll session in seconds"
    );
    describe_counter!(
        POLLER_UNRECOGNIZED_MARKERS_TOTAL,
        "Total number of unrecognized state markers observed"
    );

    // Remote
    describe_counter!(
        REMOTE_COMMANDS_TOTAL,
        "Total number of remote commands executed"
    );
    describe_counter!(
        REMOTE_TRANSFERS_TOTAL,
        "Total number of file transfers by direction"
    );
    describe_histogram!(
        REMOTE_COMMAND_DURATION_SECONDS,
        "Remote command execution time in seconds"
    );

    // Deploy
    describe_counter!(
        DEPLOY_OPERATIONS_TOTAL,
        "Total number of VM lifecycle operations by kind"
    );
    describe_histogram!(
        DEPLOY_OPERATION_DURATION_SECONDS,
        "VM lifecycle operation duration in seconds"
    );
}
