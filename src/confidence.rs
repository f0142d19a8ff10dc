use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical trust signal attached to every translation result.
///
/// Variants are ordered from most to least trusted, so `High < Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    Unknown,
}

impl ConfidenceLevel {
    /// Derive a confidence level from the share of words a dictionary pass matched.
    pub fn from_coverage(coverage: f64) -> Self {
        if coverage > 0.8 {
            Self::High
        } else if coverage > 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "HIGH" => Self::High,
            "MEDIUM" => Self::Medium,
            "LOW" => Self::Low,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_coverage_thresholds() {
        assert_eq!(ConfidenceLevel::from_coverage(1.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_coverage(0.81), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_coverage(0.8), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_coverage(0.5), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_coverage(0.4), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_coverage(1.0 / 3.0), ConfidenceLevel::Low);
    }

    #[test]
    fn test_ordering_most_trusted_first() {
        assert!(ConfidenceLevel::High < ConfidenceLevel::Medium);
        assert!(ConfidenceLevel::Low < ConfidenceLevel::Unknown);
    }

    #[test]
    fn test_parse_and_serde_use_uppercase_names() {
        assert_eq!(ConfidenceLevel::parse("medium"), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::parse("bogus"), ConfidenceLevel::Unknown);
        let json = serde_json::to_string(&ConfidenceLevel::High).unwrap();
        assert_eq!(json, "\"HIGH\"");
    }
}
