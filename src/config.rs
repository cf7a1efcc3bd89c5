use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Timing knobs of the purchase workflow and its simulated backend.
///
/// Durations are read from JSON as milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkflowConfig {
    #[serde(with = "millis")]
    pub purchase_delay: Duration,
    #[serde(with = "millis")]
    pub activation_delay: Duration,
    /// Upper bound for each gateway call.
    #[serde(with = "millis")]
    pub phase_timeout: Duration,
    #[serde(with = "millis")]
    pub success_duration: Duration,
    #[serde(with = "millis")]
    pub error_duration: Duration,
    /// Delay between commit and the refresh signal for derived views.
    #[serde(with = "millis")]
    pub reload_delay: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            purchase_delay: Duration::from_millis(1500),
            activation_delay: Duration::from_millis(1500),
            phase_timeout: Duration::from_secs(10),
            success_duration: Duration::from_millis(3000),
            error_duration: Duration::from_millis(4000),
            reload_delay: Duration::from_millis(2000),
        }
    }
}

impl WorkflowConfig {
    /// No artificial waits. Used by tests and the CLI's `--instant` flag.
    pub fn instant() -> Self {
        Self {
            purchase_delay: Duration::ZERO,
            activation_delay: Duration::ZERO,
            reload_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
