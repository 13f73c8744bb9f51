//! 완료 폴링 루프
//!
//! 게스트 상태 파일을 주기적으로 가져와 터미널 마커를 감지합니다.
//!
//! # 루프 동작
//!
//! 매 주기마다:
//! 1. 폴링 주기만큼 대기
//! 2. 상태 파일을 로컬 작업 디렉토리로 다운로드
//!    (실패는 일시적인 것으로 간주하고 다음 주기로 — 파일이 아직
//!    없거나 게스트가 부팅 중일 수 있음)
//! 3. 내용을 읽고 로컬 복사본 삭제 (다음 주기의 오래된 읽기 방지)
//! 4. 마커 파싱:
//!    - 빈 내용/인식 불가 → 경고 후 계속
//!    - `TestRunning` → 계속
//!    - 성공 계열 터미널 → `Ok(PollResult)`
//!    - 실패 계열 터미널 → `Err(PollError::ObservedFailure)`
//!
//! 터미널 마커 없이 예산이 소진되면 `Err(PollError::BudgetExhausted)`
//! 로 종료합니다. 이 타임아웃은 게스트가 보고한 실패와 구분됩니다.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use guestlab_core::error::PollError;
use guestlab_core::metrics::{
    LABEL_RESULT, POLLER_FETCH_ATTEMPTS_TOTAL, POLLER_FETCH_FAILURES_TOTAL,
    POLLER_POLLS_COMPLETED_TOTAL, POLLER_POLL_DURATION_SECONDS,
    POLLER_UNRECOGNIZED_MARKERS_TOTAL,
};
use guestlab_core::types::{PollResult, TestRun, TestState};
use guestlab_remote::RemoteClient;

/// 게스트 완료 폴러
///
/// [`RemoteClient`]를 통해 상태 파일을 반복적으로 가져오고 터미널
/// 마커를 감지합니다. 클라이언트는 `Arc`로 공유되므로 여러 폴러가
/// 같은 연결 설정을 재사용할 수 있습니다.
pub struct CompletionPoller<C: RemoteClient> {
    client: Arc<C>,
    interval: Duration,
    budget: crate::budget::PollBudget,
    work_dir: PathBuf,
}

impl<C: RemoteClient> CompletionPoller<C> {
    /// 새 폴러를 생성합니다.
    pub fn new(
        client: Arc<C>,
        interval: Duration,
        budget: crate::budget::PollBudget,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            interval,
            budget,
            work_dir: work_dir.into(),
        }
    }

    /// 폴링 예산
    pub fn budget(&self) -> crate::budget::PollBudget {
        self.budget
    }

    /// 터미널 마커가 관찰되거나 예산이 소진될 때까지 폴링합니다.
    ///
    /// # Errors
    ///
    /// - [`PollError::ObservedFailure`]: 게스트가 실패 계열 마커를 보고
    /// - [`PollError::BudgetExhausted`]: 터미널 마커 없이 예산 소진
    pub async fn poll(&self, run: &TestRun) -> Result<PollResult, PollError> {
        let start = Instant::now();
        let local_copy = self.work_dir.join(format!("{}-state.txt", run.id));

        if let Err(e) = tokio::fs::create_dir_all(&self.work_dir).await {
            warn!(work_dir = %self.work_dir.display(), error = %e, "failed to create work dir");
        }

        info!(
            test = run.name.as_str(),
            state_path = run.state_path.as_str(),
            budget = ?self.budget,
            interval_secs = self.interval.as_secs(),
            "polling guest for completion"
        );

        let mut attempts: u32 = 0;
        while !self.budget.is_exhausted(attempts, start.elapsed()) {
            tokio::time::sleep(self.interval).await;
            attempts += 1;
            counter!(POLLER_FETCH_ATTEMPTS_TOTAL).increment(1);

            if let Err(e) = self.client.download(&run.state_path, &local_copy).await {
                // 파일이 아직 없거나 게스트가 일시적으로 응답하지 않는 경우.
                // 터미널 마커가 아니므로 다음 주기에 재시도합니다.
                debug!(
                    test = run.name.as_str(),
                    attempt = attempts,
                    error = %e,
                    "state file fetch failed, retrying"
                );
                counter!(POLLER_FETCH_FAILURES_TOTAL).increment(1);
                continue;
            }

            let content = tokio::fs::read_to_string(&local_copy).await;
            // 읽기 성공 여부와 무관하게 즉시 삭제 — 다음 주기의 오래된
            // 읽기를 막고, 반환 후 로컬 복사본이 남지 않도록 보장
            let _ = tokio::fs::remove_file(&local_copy).await;
            let content = match content {
                Ok(content) => content,
                Err(e) => {
                    warn!(
                        test = run.name.as_str(),
                        attempt = attempts,
                        error = %e,
                        "failed to read fetched state file"
                    );
                    counter!(POLLER_FETCH_FAILURES_TOTAL).increment(1);
                    continue;
                }
            };

            if content.trim().is_empty() {
                warn!(
                    test = run.name.as_str(),
                    attempt = attempts,
                    "state file is empty, guest may still be starting"
                );
                continue;
            }

            match TestState::parse_marker(&content) {
                None => {
                    warn!(
                        test = run.name.as_str(),
                        attempt = attempts,
                        content = content.trim(),
                        "unrecognized state marker"
                    );
                    counter!(POLLER_UNRECOGNIZED_MARKERS_TOTAL).increment(1);
                }
                Some(TestState::Running) => {
                    debug!(
                        test = run.name.as_str(),
                        attempt = attempts,
                        "guest test still running"
                    );
                }
                Some(state) if state.is_success() => {
                    info!(
                        test = run.name.as_str(),
                        state = %state,
                        attempts,
                        elapsed_secs = start.elapsed().as_secs(),
                        "guest reported terminal state"
                    );
                    histogram!(POLLER_POLL_DURATION_SECONDS)
                        .record(start.elapsed().as_secs_f64());
                    counter!(POLLER_POLLS_COMPLETED_TOTAL, LABEL_RESULT => result_label(state))
                        .increment(1);
                    return Ok(PollResult { state, attempts });
                }
                Some(state) => {
                    error!(
                        test = run.name.as_str(),
                        state = %state,
                        attempts,
                        "guest reported terminal failure"
                    );
                    histogram!(POLLER_POLL_DURATION_SECONDS)
                        .record(start.elapsed().as_secs_f64());
                    counter!(POLLER_POLLS_COMPLETED_TOTAL, LABEL_RESULT => result_label(state))
                        .increment(1);
                    return Err(PollError::ObservedFailure { state, attempts });
                }
            }
        }

        let elapsed_secs = start.elapsed().as_secs();
        // 타임아웃은 게스트가 보고한 실패와 다른 로그 메시지로 구분합니다.
        error!(
            test = run.name.as_str(),
            attempts,
            elapsed_secs,
            "poll budget exhausted without a terminal state"
        );
        histogram!(POLLER_POLL_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
        counter!(POLLER_POLLS_COMPLETED_TOTAL, LABEL_RESULT => "timeout").increment(1);
        Err(PollError::BudgetExhausted {
            attempts,
            elapsed_secs,
        })
    }
}

fn result_label(state: TestState) -> &'static str {
    match state {
        TestState::Running => "running",
        TestState::Completed => "completed",
        TestState::Skipped => "skipped",
        TestState::Aborted => "aborted",
        TestState::Failed => "failed",
    }
}
