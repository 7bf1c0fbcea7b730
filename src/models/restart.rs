//! Container restart policy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Restart policy of a service. Stored and transferred as its Compose text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RestartPolicy {
    /// Never restart (Compose default)
    #[default]
    #[serde(rename = "no")]
    No,
    #[serde(rename = "always")]
    Always,
    #[serde(rename = "on-failure")]
    OnFailure,
}

impl RestartPolicy {
    /// All policies in display order
    pub fn all() -> &'static [RestartPolicy] {
        &[Self::No, Self::Always, Self::OnFailure]
    }

    /// The text used in Compose files and both stores
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Always => "always",
            Self::OnFailure => "on-failure",
        }
    }

    /// Parse a policy case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "no" => Some(Self::No),
            "always" => Some(Self::Always),
            "on-failure" | "on_failure" | "onfailure" => Some(Self::OnFailure),
            _ => None,
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::No
    }
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestartPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "Invalid restart policy: '{}'. Valid policies: no, always, on-failure",
                s
            )
        })
    }
}
