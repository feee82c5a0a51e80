//! Severity of a finding.

use serde::{Deserialize, Serialize};

/// Severity class of a finding.
///
/// The leading letter of a rule id is the single source of truth for a
/// rule's severity: `E` is [`Severity::Error`], `W` is [`Severity::Warning`]
/// and `I` is [`Severity::Informational`]. Variants are declared from least
/// to most severe so that `Ord` can be used for `min_severity` filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Style or best-practice suggestion
    Informational,
    /// Likely bug or anti-pattern
    Warning,
    /// Structural or schema violation
    Error,
}

impl Severity {
    /// Derive the severity from a rule id such as `E3001` or `W2001`.
    ///
    /// Returns `None` when the id does not start with `E`, `W` or `I`.
    #[must_use]
    pub fn from_rule_id(rule_id: &str) -> Option<Self> {
        match rule_id.chars().next()? {
            'E' => Some(Self::Error),
            'W' => Some(Self::Warning),
            'I' => Some(Self::Informational),
            _ => None,
        }
    }

    /// The single letter used as the rule id prefix for this severity.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Error => 'E',
            Self::Warning => 'W',
            Self::Informational => 'I',
        }
    }

    /// Returns true if this severity indicates an error.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Informational => write!(f, "informational"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" | "e" => Ok(Self::Error),
            "warning" | "warn" | "w" => Ok(Self::Warning),
            "informational" | "info" | "i" => Ok(Self::Informational),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rule_id() {
        assert_eq!(Severity::from_rule_id("E3001"), Some(Severity::Error));
        assert_eq!(Severity::from_rule_id("W2001"), Some(Severity::Warning));
        assert_eq!(Severity::from_rule_id("I3011"), Some(Severity::Informational));
        assert_eq!(Severity::from_rule_id("X1000"), None);
        assert_eq!(Severity::from_rule_id(""), None);
    }

    #[test]
    fn test_ordering() {
        assert!(Severity::Informational < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_letter_round_trips_through_rule_id() {
        for severity in [Severity::Error, Severity::Warning, Severity::Informational] {
            let id = format!("{}1234", severity.letter());
            assert_eq!(Severity::from_rule_id(&id), Some(severity));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Severity::Error), "error");
        assert_eq!(format!("{}", Severity::Warning), "warning");
        assert_eq!(format!("{}", Severity::Informational), "informational");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("Informational".parse::<Severity>(), Ok(Severity::Informational));
        assert!("fatal".parse::<Severity>().is_err());
    }
}
