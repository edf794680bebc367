use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl From<String> for Severity {
    /// Unknown labels degrade to `Low` so one odd row cannot drop the list.
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic finding produced by the backend's analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: serde_json::Value,
    #[serde(rename = "type", default)]
    pub issue_type: String,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default, deserialize_with = "crate::timestamp::deserialize_optional")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuesResponse {
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// Per-severity counts shown in the issue panel header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeveritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeveritySummary {
    pub fn of(issues: &[Issue]) -> Self {
        issues.iter().fold(Self::default(), |mut acc, issue| {
            match issue.severity {
                Severity::Critical => acc.critical += 1,
                Severity::High => acc.high += 1,
                Severity::Medium => acc.medium += 1,
                Severity::Low => acc.low += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}
