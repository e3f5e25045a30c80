use std::path::Path;
use std::time::Duration;

use super::DiagConfig;
use crate::error::{DiagError, DiagResult, ErrorCode};

pub struct ConfigValidator;

impl ConfigValidator {
    /// Reject settings the supervisor cannot run with
    pub fn validate(config: &DiagConfig, source: Option<&Path>) -> DiagResult<()> {
        let invalid = |message: String| {
            DiagError::config(
                ErrorCode::CONFIG_INVALID_VALUE,
                message,
                source.map(Path::to_path_buf),
            )
        };

        if config.cargo.trim().is_empty() {
            return Err(invalid("cargo must name a program".to_string()));
        }

        let watch = &config.watch;
        for (name, value) in [
            ("heartbeat_interval", watch.heartbeat_interval),
            ("stall_timeout", watch.stall_timeout),
            ("overall_timeout", watch.overall_timeout),
        ] {
            if value == Duration::ZERO {
                return Err(invalid(format!("watch.{} must be greater than 0", name)));
            }
        }

        // the heartbeat doubles as the poll interval, so it bounds stall detection
        if watch.heartbeat_interval > watch.stall_timeout {
            return Err(invalid(format!(
                "watch.heartbeat_interval ({}s) must not exceed watch.stall_timeout ({}s)",
                watch.heartbeat_interval.as_secs_f64(),
                watch.stall_timeout.as_secs_f64()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigValidator::validate(&DiagConfig::default(), None).is_ok());
    }

    #[test]
    fn test_zero_heartbeat_rejected() {
        let mut config = DiagConfig::default();
        config.watch.heartbeat_interval = Duration::ZERO;

        let err = ConfigValidator::validate(&config, Some(Path::new("/ws/.cargo-diag.toml")))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_VALUE);
        assert!(err.to_string().contains("watch.heartbeat_interval must be greater than 0"));
        assert!(err.user_message().contains("/ws/.cargo-diag.toml"));
    }

    #[test]
    fn test_heartbeat_longer_than_stall_rejected() {
        let mut config = DiagConfig::default();
        config.watch.heartbeat_interval = Duration::from_secs(300);

        let err = ConfigValidator::validate(&config, None).unwrap_err();
        assert!(err.to_string().contains("must not exceed watch.stall_timeout"));
    }

    #[test]
    fn test_blank_cargo_rejected() {
        let config = DiagConfig {
            cargo: "  ".to_string(),
            ..DiagConfig::default()
        };
        assert!(ConfigValidator::validate(&config, None).is_err());
    }
}
