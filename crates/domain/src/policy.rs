//! Publish failure policy.

use std::str::FromStr;

use thiserror::Error;

/// Decides what a failed publish means for a write that already committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishPolicy {
    /// Log the failure and report the write as successful. The projection
    /// misses this change until the user is written again.
    #[default]
    BestEffort,

    /// Report the failure to the caller. The row stays committed.
    Required,
}

impl PublishPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BestEffort => "best_effort",
            Self::Required => "required",
        }
    }
}

impl std::fmt::Display for PublishPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized policy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown publish policy {0:?} (expected best_effort or required)")]
pub struct UnknownPublishPolicy(pub String);

impl FromStr for PublishPolicy {
    type Err = UnknownPublishPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            "required" => Ok(Self::Required),
            _ => Err(UnknownPublishPolicy(s.to_string())),
        }
    }
}
