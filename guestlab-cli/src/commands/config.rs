//! `guestlab config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use guestlab_core::config::GuestlabConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => validate(config_path, writer).await,
        ConfigAction::Show { section } => show(config_path, section.as_deref(), writer).await,
    }
}

async fn validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    debug!(path = %config_path.display(), "validating configuration");

    let report = match GuestlabConfig::load(config_path).await {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config(format!(
            "configuration file {} is invalid",
            report.source
        )));
    }
    Ok(())
}

async fn show(
    config_path: &Path,
    section: Option<&str>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = GuestlabConfig::load(config_path).await?;

    let payload = match section {
        None => ConfigShowReport {
            section: None,
            toml: toml::to_string_pretty(&config)
                .map_err(|e| CliError::Command(format!("failed to serialise config: {e}")))?,
        },
        Some("general") => ConfigShowReport {
            section: Some("general".to_owned()),
            toml: toml::to_string_pretty(&config.general)
                .map_err(|e| CliError::Command(format!("failed to serialise config: {e}")))?,
        },
        Some("remote") => ConfigShowReport {
            section: Some("remote".to_owned()),
            toml: toml::to_string_pretty(&config.remote)
                .map_err(|e| CliError::Command(format!("failed to serialise config: {e}")))?,
        },
        Some("poll") => ConfigShowReport {
            section: Some("poll".to_owned()),
            toml: toml::to_string_pretty(&config.poll)
                .map_err(|e| CliError::Command(format!("failed to serialise config: {e}")))?,
        },
        Some("deploy") => ConfigShowReport {
            section: Some("deploy".to_owned()),
            toml: toml::to_string_pretty(&config.deploy)
                .map_err(|e| CliError::Command(format!("failed to serialise config: {e}")))?,
        },
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown config section '{other}', expected one of: general, remote, poll, deploy"
            )));
        }
    };

    writer.render(&payload)?;
    Ok(())
}

/// CLI payload for `config validate`.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Configuration: {}", self.source)?;
        if self.valid {
            writeln!(w, "Status: {}", "valid".green().bold())?;
        } else {
            writeln!(w, "Status: {}", "invalid".red().bold())?;
            for error in &self.errors {
                writeln!(w, "  - {}", error)?;
            }
        }
        Ok(())
    }
}

/// CLI payload for `config show`.
#[derive(Serialize)]
pub struct ConfigShowReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub toml: String,
}

impl Render for ConfigShowReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if let Some(section) = &self.section {
            writeln!(w, "[{}]", section)?;
        }
        write!(w, "{}", self.toml)?;
        if !self.toml.ends_with('\n') {
            writeln!(w)?;
        }
        Ok(())
    }
}
