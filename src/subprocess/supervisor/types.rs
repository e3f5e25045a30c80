//! Core types for supervised execution

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Stream source identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

/// Timing thresholds for a supervised run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Poll interval, and the silence after which a heartbeat is printed
    #[serde(with = "humantime_serde", default = "default_heartbeat_interval")]
    pub heartbeat_interval: Duration,

    /// Silence after which a one-shot stall warning is printed
    #[serde(with = "humantime_serde", default = "default_stall_timeout")]
    pub stall_timeout: Duration,

    /// Hard ceiling on total run time; the child is killed when it is reached
    #[serde(with = "humantime_serde", default = "default_overall_timeout")]
    pub overall_timeout: Duration,
}

fn default_heartbeat_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_stall_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_overall_timeout() -> Duration {
    Duration::from_secs(600)
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: default_heartbeat_interval(),
            stall_timeout: default_stall_timeout(),
            overall_timeout: default_overall_timeout(),
        }
    }
}

/// Side-channel notification raised while a child is being supervised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The child is silent but artifacts have been produced
    Heartbeat {
        elapsed: Duration,
        artifacts: usize,
        last_artifact: String,
    },
    /// No output for at least the stall timeout
    Stall { silent: Duration, pid: Option<u32> },
    /// The overall timeout expired; the child is about to be killed
    Timeout { limit: Duration },
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchEvent::Heartbeat {
                elapsed,
                artifacts,
                last_artifact,
            } => write!(
                f,
                "{}s elapsed, {} crates compiled (last: {})",
                elapsed.as_secs(),
                artifacts,
                last_artifact
            ),
            WatchEvent::Stall { silent, pid } => {
                let pid = pid.map_or_else(|| "unknown".to_string(), |p| p.to_string());
                write!(
                    f,
                    "WARNING: no output for {}s - cargo may be stuck (pid {})",
                    silent.as_secs(),
                    pid
                )
            }
            WatchEvent::Timeout { limit } => {
                write!(f, "TIMEOUT: {}s exceeded, killing cargo", limit.as_secs())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let settings = WatchSettings::default();
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(settings.stall_timeout, Duration::from_secs(120));
        assert_eq!(settings.overall_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_settings_from_humantime_toml() {
        let settings: WatchSettings =
            toml::from_str("stall_timeout = \"45s\"\noverall_timeout = \"15m\"").unwrap();
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(settings.stall_timeout, Duration::from_secs(45));
        assert_eq!(settings.overall_timeout, Duration::from_secs(900));
    }

    #[test]
    fn test_event_messages() {
        let heartbeat = WatchEvent::Heartbeat {
            elapsed: Duration::from_millis(61_400),
            artifacts: 12,
            last_artifact: "serde".to_string(),
        };
        assert_eq!(
            heartbeat.to_string(),
            "61s elapsed, 12 crates compiled (last: serde)"
        );

        let stall = WatchEvent::Stall {
            silent: Duration::from_secs(120),
            pid: Some(4242),
        };
        assert_eq!(
            stall.to_string(),
            "WARNING: no output for 120s - cargo may be stuck (pid 4242)"
        );

        let timeout = WatchEvent::Timeout {
            limit: Duration::from_secs(600),
        };
        assert_eq!(timeout.to_string(), "TIMEOUT: 600s exceeded, killing cargo");
    }
}
