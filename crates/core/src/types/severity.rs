//! Toast severity levels.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown severity name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid severity: {0}")]
pub struct SeverityError(pub String);

/// Severity of a toast notification.
///
/// Every severity maps to exactly one style class; showing a toast applies
/// that class and clears the classes of every other severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational message (e.g. "please login").
    #[default]
    Normal,
    /// The requested cart action succeeded.
    Success,
    /// Transport, parse, or business-logic failure.
    Error,
}

impl Severity {
    /// Every severity, in display order.
    pub const ALL: [Self; 3] = [Self::Normal, Self::Success, Self::Error];

    /// CSS class applied to the toast body for this severity.
    #[must_use]
    pub const fn style_class(self) -> &'static str {
        match self {
            Self::Normal => "toast-normal",
            Self::Success => "toast-success",
            Self::Error => "toast-error",
        }
    }

    /// Default toast title for this severity.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Normal => "Notice",
            Self::Success => "Success",
            Self::Error => "Error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = SeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            _ => Err(SeverityError(s.to_string())),
        }
    }
}
