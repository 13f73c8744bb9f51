//! `guestlab vm` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use guestlab_core::config::GuestlabConfig;
use guestlab_core::error::DeployError;
use guestlab_deploy::{CommandLifecycle, VmLifecycle};

use crate::cli::{VmAction, VmArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `vm` command.
pub async fn execute(
    args: VmArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = GuestlabConfig::load(config_path).await?;

    let lifecycle = match CommandLifecycle::from_config(&config.deploy) {
        Ok(lifecycle) => lifecycle,
        Err(DeployError::Disabled) => {
            return Err(CliError::Config(
                "vm lifecycle is disabled; set [deploy] enabled = true".to_owned(),
            ));
        }
        Err(e) => return Err(CliError::Command(e.to_string())),
    };

    let payload = match args.action {
        VmAction::Provision => {
            info!("provisioning guest");
            let reachability = lifecycle
                .provision()
                .await
                .map_err(|e| CliError::Command(e.to_string()))?;
            VmReport {
                operation: "provision".to_owned(),
                host: Some(reachability.host),
                port: Some(reachability.port),
            }
        }
        VmAction::Restart => {
            info!("restarting guest");
            let reachability = lifecycle
                .restart()
                .await
                .map_err(|e| CliError::Command(e.to_string()))?;
            VmReport {
                operation: "restart".to_owned(),
                host: Some(reachability.host),
                port: Some(reachability.port),
            }
        }
        VmAction::Teardown => {
            info!("tearing down guest");
            lifecycle
                .teardown()
                .await
                .map_err(|e| CliError::Command(e.to_string()))?;
            VmReport {
                operation: "teardown".to_owned(),
                host: None,
                port: None,
            }
        }
    };

    writer.render(&payload)?;
    Ok(())
}

/// CLI payload for a lifecycle operation.
#[derive(Serialize)]
pub struct VmReport {
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl Render for VmReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Operation: {}", self.operation.bold())?;
        match (&self.host, self.port) {
            (Some(host), Some(port)) => {
                writeln!(w, "Guest reachable at {}:{}", host, port)?;
            }
            _ => {
                writeln!(w, "{}", "Done.".green())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vm_report_text_with_address() {
        let payload = VmReport {
            operation: "provision".to_owned(),
            host: Some("192.0.2.7".to_owned()),
            port: Some(2222),
        };

        let mut buffer = Vec::new();
        payload.render_text(&mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert!(output.contains("provision"));
        assert!(output.contains("192.0.2.7:2222"));
    }

    #[test]
    fn vm_report_text_without_address() {
        let payload = VmReport {
            operation: "teardown".to_owned(),
            host: None,
            port: None,
        };

        let mut buffer = Vec::new();
        payload.render_text(&mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert!(output.contains("teardown"));
        assert!(output.contains("Done."));
    }

    #[test]
    fn vm_report_json_omits_missing_address() {
        let payload = VmReport {
            operation: "teardown".to_owned(),
            host: None,
            port: None,
        };

        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("\"host\""));
        assert!(!json.contains("\"port\""));
    }
}
