//! Transient Notices
//!
//! Short-lived user-facing messages (the toast layer). Every failure in the
//! client ends up here rather than aborting the page.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a notice, drives its color in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Warning,
    Info,
}

impl NoticeLevel {
    /// Parse the free-form `type` field sent by the backend
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("success") => Self::Success,
            Some("error") => Self::Error,
            Some("warning") => Self::Warning,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// A transient notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level.as_str(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_wire() {
        assert_eq!(NoticeLevel::from_wire(Some("success")), NoticeLevel::Success);
        assert_eq!(NoticeLevel::from_wire(Some("WARNING")), NoticeLevel::Warning);
        assert_eq!(NoticeLevel::from_wire(Some("bogus")), NoticeLevel::Info);
        assert_eq!(NoticeLevel::from_wire(None), NoticeLevel::Info);
    }

    #[test]
    fn test_notice_display() {
        let notice = Notice::error("Network error. Please try again.");
        assert_eq!(notice.to_string(), "[error] Network error. Please try again.");
    }
}
