//! CLI-specific error types and exit code mapping

use guestlab_core::error::GuestlabError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to stable exit codes so
/// calling scripts can distinguish failure classes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The guest cannot be reached at all.
    #[error("guest not reachable: {0}")]
    GuestUnreachable(String),

    /// The test ran to a verdict that is not passing.
    #[error("test did not pass: {0}")]
    TestNotPassed(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from guestlab-core.
    #[error("{0}")]
    Core(#[from] GuestlabError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                               |
    /// |------|---------------------------------------|
    /// | 0    | Success                               |
    /// | 1    | General / command error               |
    /// | 2    | Configuration error                   |
    /// | 3    | Guest unreachable                     |
    /// | 4    | Test completed with non-pass verdict  |
    /// | 10   | IO error                              |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(GuestlabError::Config(_)) => 2,
            Self::GuestUnreachable(_) => 3,
            Self::TestNotPassed(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2, "config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_core_config_error() {
        use guestlab_core::error::ConfigError;
        // a broken guestlab.toml surfaces as Core(Config) from the
        // command handlers and must honor the config exit code
        let err = CliError::Core(GuestlabError::Config(ConfigError::ParseFailed {
            reason: "unexpected end of table".to_owned(),
        }));
        assert_eq!(
            err.exit_code(),
            2,
            "wrapped config error should return exit code 2"
        );
    }

    #[test]
    fn test_exit_code_core_non_config_error() {
        use guestlab_core::error::PollError;
        let err = CliError::Core(GuestlabError::Poll(PollError::BudgetExhausted {
            attempts: 3,
            elapsed_secs: 15,
        }));
        assert_eq!(
            err.exit_code(),
            1,
            "non-config core error should return exit code 1"
        );
    }

    #[test]
    fn test_exit_code_guest_unreachable() {
        let err = CliError::GuestUnreachable("connection refused".to_owned());
        assert_eq!(
            err.exit_code(),
            3,
            "unreachable guest should return exit code 3"
        );
    }

    #[test]
    fn test_exit_code_test_not_passed() {
        let err = CliError::TestNotPassed("verdict: FAIL".to_owned());
        assert_eq!(
            err.exit_code(),
            4,
            "non-pass verdict should return exit code 4"
        );
    }

    #[test]
    fn test_exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10, "io error should return exit code 10");
    }

    #[test]
    fn test_exit_code_command_error() {
        let err = CliError::Command("test error".to_owned());
        assert_eq!(
            err.exit_code(),
            1,
            "command error should return exit code 1"
        );
    }

    #[test]
    fn test_exit_code_json_serialize_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid json")
            .expect_err("should fail parsing");
        let err = CliError::JsonSerialize(json_err);
        assert_eq!(
            err.exit_code(),
            1,
            "json serialize error should return exit code 1"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = CliError::Config("invalid TOML syntax".to_owned());
        let display_str = format!("{}", err);
        assert!(
            display_str.contains("configuration error"),
            "should include error context"
        );
        assert!(
            display_str.contains("invalid TOML syntax"),
            "should include error message"
        );
    }

    #[test]
    fn test_error_display_command() {
        let err = CliError::Command("execution failed".to_owned());
        let display_str = format!("{}", err);
        assert_eq!(display_str, "execution failed");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let cli_err: CliError = io_err.into();
        match cli_err {
            CliError::Io(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::PermissionDenied);
            }
            _ => panic!("expected Io error variant"),
        }
    }

    #[test]
    fn test_from_core_error() {
        use guestlab_core::error::ConfigError;
        let config_err = ConfigError::FileNotFound {
            path: "test.toml".to_owned(),
        };
        let core_err = GuestlabError::Config(config_err);
        let cli_err: CliError = core_err.into();
        match cli_err {
            CliError::Core(_) => {}
            _ => panic!("expected Core error variant"),
        }
    }

    #[test]
    fn test_error_debug_format() {
        let err = CliError::Config("test".to_owned());
        let debug_str = format!("{:?}", err);
        assert!(
            debug_str.contains("Config"),
            "debug format should show variant name"
        );
    }
}
