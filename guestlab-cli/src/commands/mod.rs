//! Command handlers -- one module per subcommand

pub mod config;
pub mod poll;
pub mod run;
pub mod vm;

use std::sync::Arc;
use std::time::Duration;

use guestlab_core::config::GuestlabConfig;
use guestlab_core::types::Verdict;
use guestlab_remote::{OpenSshClient, SshTarget};

use crate::error::CliError;

/// Apply `--host` / `--port` / `--user` overrides onto the loaded config.
fn apply_remote_overrides(
    config: &mut GuestlabConfig,
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
) {
    if let Some(host) = host {
        config.remote.host = host;
    }
    if let Some(port) = port {
        config.remote.port = port;
    }
    if let Some(user) = user {
        config.remote.user = user;
    }
}

/// Build the production SSH client from the effective `[remote]` section.
fn build_client(config: &GuestlabConfig) -> Result<Arc<OpenSshClient>, CliError> {
    let target = SshTarget::from_config(&config.remote)
        .map_err(|e| CliError::Config(e.to_string()))?;
    Ok(Arc::new(OpenSshClient::new(
        target,
        Duration::from_secs(config.remote.connect_timeout_secs),
    )))
}

/// Map a final verdict to the command outcome.
///
/// Shared by `run` and `poll` so both subcommands agree on which
/// verdicts are passing exits: PASS and SKIPPED succeed, FAIL and
/// ABORTED become [`CliError::TestNotPassed`] (exit code 4).
fn verdict_outcome(name: &str, verdict: Verdict) -> Result<(), CliError> {
    if verdict.is_passing() {
        Ok(())
    } else {
        Err(CliError::TestNotPassed(format!("{name}: {verdict}")))
    }
}
