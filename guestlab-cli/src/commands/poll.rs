//! `guestlab poll` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use guestlab_core::config::GuestlabConfig;
use guestlab_core::error::PollError;
use guestlab_core::types::{SkippedPolicy, TestRun, Verdict};
use guestlab_poller::{CompletionPoller, PollBudget};

use crate::cli::PollArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `poll` command.
///
/// Watches an already-running guest test: nothing is uploaded or
/// launched, the poller just fetches the state file until a terminal
/// marker appears or the budget runs out.
pub async fn execute(
    args: PollArgs,
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

    let run = TestRun::new(&args.name, "")
        .with_state_path(&args.state_path)
        .with_log_path(None);

    info!(
        test = run.name.as_str(),
        state_path = args.state_path.as_str(),
        "polling guest state file"
    );

    let (state, verdict, attempts, timed_out) = match poller.poll(&run).await {
        Ok(result) => (
            Some(result.state),
            Verdict::from_state(result.state, policy).unwrap_or(Verdict::Aborted),
            result.attempts,
            false,
        ),
        Err(PollError::ObservedFailure { state, attempts }) => (
            Some(state),
            Verdict::from_state(state, policy).unwrap_or(Verdict::Aborted),
            attempts,
            false,
        ),
        Err(PollError::BudgetExhausted { attempts, .. }) => {
            (None, Verdict::Aborted, attempts, true)
        }
    };

    let payload = PollReport {
        name: run.name.clone(),
        state: state.map(|s| s.as_marker().to_owned()),
        verdict: verdict.to_string(),
        attempts,
        timed_out,
    };

    writer.render(&payload)?;

    super::verdict_outcome(&payload.name, verdict)
}

/// CLI payload for a finished poll.
#[derive(Serialize)]
pub struct PollReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub verdict: String,
    pub attempts: u32,
    pub timed_out: bool,
}

impl Render for PollReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let verdict_colored = match self.verdict.as_str() {
            "PASS" => self.verdict.green().bold(),
            "FAIL" => self.verdict.red().bold(),
            "SKIPPED" => self.verdict.yellow(),
            _ => self.verdict.red(),
        };

        writeln!(w, "Test: {}", self.name.bold())?;
        writeln!(w, "Verdict: {}", verdict_colored)?;
        match &self.state {
            Some(state) => writeln!(w, "Guest state: {}", state)?,
            None if self.timed_out => writeln!(w, "Guest state: (budget exhausted)")?,
            None => writeln!(w, "Guest state: (none observed)")?,
        }
        writeln!(w, "Fetch attempts: {}", self.attempts)?;
        Ok(())
    }
}
