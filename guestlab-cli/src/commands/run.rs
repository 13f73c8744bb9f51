//! `guestlab run` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tracing::{info, warn};

use guestlab_core::config::GuestlabConfig;
use guestlab_core::error::RemoteError;
use guestlab_core::types::{SkippedPolicy, TestReport, TestRun, Verdict};
use guestlab_poller::{CompletionPoller, PollBudget, TestRunner};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Any fault before or during the run -- unreachable guest, failed
/// upload, failed launch -- is reported as a single `ABORTED` verdict
/// rather than a raw error, so a run always produces exactly one
/// report.
pub async fn execute(
    args: RunArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = GuestlabConfig::load(config_path).await?;
    super::apply_remote_overrides(&mut config, args.host, args.port, args.user);

    let client = super::build_client(&config)?;
    let budget =
        PollBudget::from_config(&config.poll).map_err(|e| CliError::Config(e.to_string()))?;
    let policy =
        SkippedPolicy::from_str_loose(&config.poll.report_skipped_as).unwrap_or_default();

    let poller = CompletionPoller::new(
        Arc::clone(&client),
        Duration::from_secs(config.poll.interval_secs),
        budget,
        &config.general.work_dir,
    );
    let runner = TestRunner::new(
        Arc::clone(&client),
        poller,
        policy,
        &config.general.work_dir,
    );

    let mut run = TestRun::new(&args.name, &args.command)
        .with_state_path(args.state_path.unwrap_or_else(|| config.poll.state_path.clone()));
    if args.no_log {
        run = run.with_log_path(None);
    } else if let Some(log_path) = args.log_path {
        run = run.with_log_path(Some(log_path));
    }

    info!(test = run.name.as_str(), "starting guest test run");

    let mut unreachable = None;
    let report = match runner.execute(&run, args.script.as_deref()).await {
        Ok(report) => report,
        Err(e) => {
            warn!(test = run.name.as_str(), error = %e, "run aborted before polling completed");
            if let RemoteError::Unreachable { .. } = &e {
                unreachable = Some(e.to_string());
            }
            TestReport {
                name: run.name.clone(),
                verdict: Verdict::Aborted,
                state: None,
                attempts: 0,
                duration: Duration::ZERO,
                finished_at: SystemTime::now(),
                guest_log: None,
            }
        }
    };

    let payload = RunReport::from_report(&report);
    writer.render(&payload)?;

    if let Some(reason) = unreachable {
        return Err(CliError::GuestUnreachable(reason));
    }
    super::verdict_outcome(&report.name, report.verdict)
}

/// CLI payload for a completed run.
#[derive(Serialize)]
pub struct RunReport {
    pub name: String,
    pub verdict: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub attempts: u32,
    pub duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_log: Option<String>,
}

impl RunReport {
    fn from_report(report: &TestReport) -> Self {
        Self {
            name: report.name.clone(),
            verdict: report.verdict.to_string(),
            state: report.state.map(|s| s.as_marker().to_owned()),
            attempts: report.attempts,
            duration_secs: report.duration.as_secs_f64(),
            guest_log: report.guest_log.clone(),
        }
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let verdict_colored = match self.verdict.as_str() {
            "PASS" => self.verdict.green().bold(),
            "FAIL" => self.verdict.red().bold(),
            "ABORTED" => self.verdict.red(),
            "SKIPPED" => self.verdict.yellow(),
            _ => self.verdict.normal(),
        };

        writeln!(w, "Test: {}", self.name.bold())?;
        writeln!(w, "Verdict: {}", verdict_colored)?;
        if let Some(state) = &self.state {
            writeln!(w, "Guest state: {}", state)?;
        } else {
            writeln!(w, "Guest state: (none observed)")?;
        }
        writeln!(w, "Fetch attempts: {}", self.attempts)?;
        writeln!(w, "Duration: {:.1}s", self.duration_secs)?;

        if let Some(log) = &self.guest_log {
            writeln!(w)?;
            writeln!(w, "Guest log:")?;
            writeln!(w, "{}", "-".repeat(60))?;
            write!(w, "{}", log)?;
            if !log.ends_with('\n') {
                writeln!(w)?;
            }
        }

        Ok(())
    }
}
