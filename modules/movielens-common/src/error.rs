use std::fmt;

use thiserror::Error;

/// A single failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A record failed construction. Lists every violated constraint, not only the first.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid {record}: {}", join(.violations))]
pub struct ValidationError {
    pub record: &'static str,
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// True if any violation concerns `field`.
    pub fn touches(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}
