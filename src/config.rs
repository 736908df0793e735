use serde::Deserialize;
use std::time::Duration;

/// Per-request timeout in seconds. There is no retry.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings for the HTTP side of an [`UpdateChecker`](crate::UpdateChecker).
///
/// Deserializes from a partial object, filling the rest with defaults, so it
/// can be embedded in a host application's own configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CheckerConfig {
    /// Timeout applied to every request, in seconds
    pub timeout_secs: u64,
    /// `User-Agent` header sent with every request
    pub user_agent: String,
}

impl CheckerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("repo-updates/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
