//! 테스트 실행 오케스트레이션
//!
//! 스크립트 업로드 → 백그라운드 실행 → 완료 폴링 → 로그 수집 →
//! 판정 매핑까지를 한 번의 호출로 수행합니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tokio::time::Instant;
use tracing::{info, warn};

use guestlab_core::error::{PollError, RemoteError};
use guestlab_core::types::{SkippedPolicy, TestReport, TestRun, Verdict};
use guestlab_remote::RemoteClient;

use crate::poller::CompletionPoller;

/// 테스트 실행기
///
/// [`CompletionPoller`]의 상위 계층입니다. 폴링 결과와 타임아웃을
/// 최종 [`Verdict`]로 매핑합니다. 예산 소진(타임아웃)은 게스트가
/// 중단을 보고한 경우와 동일하게 `ABORTED`로 판정되지만, 로그에는
/// 서로 다른 메시지로 남습니다.
pub struct TestRunner<C: RemoteClient> {
    client: Arc<C>,
    poller: CompletionPoller<C>,
    policy: SkippedPolicy,
    work_dir: PathBuf,
}

impl<C: RemoteClient> TestRunner<C> {
    /// 새 실행기를 생성합니다.
    pub fn new(
        client: Arc<C>,
        poller: CompletionPoller<C>,
        policy: SkippedPolicy,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            poller,
            policy,
            work_dir: work_dir.into(),
        }
    }

    /// 테스트 한 건을 끝까지 실행하고 보고서를 반환합니다.
    ///
    /// `script`가 주어지면 실행 전에 게스트의 홈 디렉토리로
    /// 업로드합니다. 게스트 로그 수집 실패는 보고서의 `guest_log`를
    /// 비울 뿐 실행 결과에는 영향을 주지 않습니다.
    ///
    /// # Errors
    ///
    /// 업로드 또는 백그라운드 실행 시작이 실패하면 `RemoteError`를
    /// 반환합니다. 폴링 결과는 에러가 아니라 보고서의 판정으로
    /// 표현됩니다.
    pub async fn execute(
        &self,
        run: &TestRun,
        script: Option<&Path>,
    ) -> Result<TestReport, RemoteError> {
        let start = Instant::now();

        if let Some(script) = script {
            let dest = script
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| RemoteError::TransferFailed {
                    path: script.display().to_string(),
                    reason: "script path has no file name".to_owned(),
                })?;
            info!(test = run.name.as_str(), script = %script.display(), "uploading test script");
            self.client.upload(script, &dest).await?;
        }

        info!(test = run.name.as_str(), command = run.command.as_str(), "launching guest test");
        self.client.run_detached(&run.command).await?;

        let (verdict, state, attempts) = match self.poller.poll(run).await {
            Ok(result) => {
                let verdict =
                    Verdict::from_state(result.state, self.policy).unwrap_or(Verdict::Aborted);
                (verdict, Some(result.state), result.attempts)
            }
            Err(PollError::ObservedFailure { state, attempts }) => {
                let verdict = Verdict::from_state(state, self.policy).unwrap_or(Verdict::Aborted);
                (verdict, Some(state), attempts)
            }
            Err(PollError::BudgetExhausted { attempts, .. }) => {
                // 타임아웃은 중단으로 판정됩니다.
                (Verdict::Aborted, None, attempts)
            }
        };

        let guest_log = self.collect_guest_log(run).await;

        Ok(TestReport {
            name: run.name.clone(),
            verdict,
            state,
            attempts,
            duration: start.elapsed(),
            finished_at: SystemTime::now(),
            guest_log,
        })
    }

    /// 게스트 요약 로그를 best-effort로 수집합니다.
    async fn collect_guest_log(&self, run: &TestRun) -> Option<String> {
        let log_path = run.log_path.as_ref()?;
        let local_copy = self.work_dir.join(format!("{}-summary.log", run.id));

        if let Err(e) = self.client.download(log_path, &local_copy).await {
            warn!(
                test = run.name.as_str(),
                log_path = log_path.as_str(),
                error = %e,
                "failed to collect guest log"
            );
            return None;
        }

        match tokio::fs::read_to_string(&local_copy).await {
            Ok(content) => {
                let _ = tokio::fs::remove_file(&local_copy).await;
                Some(content)
            }
            Err(e) => {
                warn!(test = run.name.as_str(), error = %e, "failed to read collected guest log");
                None
            }
        }
    }
}
