//! Severity labels attached to error records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Severity label a record is classified under when it is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Debug,
    #[default]
    Error,
    Warning,
    /// Records are still stored but never forwarded to a log
    Disabled,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Debug => "debug",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Disabled => "disabled",
        }
    }

    /// Whether records with this label should reach the log at all
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Severity::Disabled)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "debug" => Ok(Severity::Debug),
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "disabled" | "off" => Ok(Severity::Disabled),
            other => Err(RegistryError::InvalidArgument(format!(
                "unknown severity label: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_serialization() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");

        let parsed: Severity = serde_json::from_str("\"disabled\"").unwrap();
        assert_eq!(parsed, Severity::Disabled);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("INFO".parse::<Severity>().unwrap(), Severity::Info);
        assert_eq!(" warn ".parse::<Severity>().unwrap(), Severity::Warning);
        assert!(matches!(
            "loud".parse::<Severity>(),
            Err(RegistryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_disabled_is_not_enabled() {
        assert!(!Severity::Disabled.is_enabled());
        assert!(Severity::Debug.is_enabled());
    }
}
