//! Strongly-typed local identifier for templates
//!
//! Local ids are auto-assigned integers. The remote store uses its own 64-bit
//! ids, so the two are never compared; records are matched across stores by
//! name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Locally-assigned template id. `0` means "not yet assigned".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TemplateId(i32);

impl TemplateId {
    /// The placeholder id for records not yet inserted
    pub const UNASSIGNED: TemplateId = TemplateId(0);

    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    /// Whether the store still has to assign an id
    pub fn is_unassigned(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for TemplateId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl FromStr for TemplateId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        Ok(Self(s.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassigned() {
        assert!(TemplateId::default().is_unassigned());
        assert!(!TemplateId::new(3).is_unassigned());
    }

    #[test]
    fn test_parse() {
        assert_eq!("12".parse::<TemplateId>().unwrap(), TemplateId::new(12));
        assert_eq!("#7".parse::<TemplateId>().unwrap(), TemplateId::new(7));
        assert!("nginx".parse::<TemplateId>().is_err());
    }

    #[test]
    fn test_serialization_is_transparent() {
        let json = serde_json::to_string(&TemplateId::new(5)).unwrap();
        assert_eq!(json, "5");
        let back: TemplateId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TemplateId::new(5));
    }
}
