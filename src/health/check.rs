//! Check trait and result types

use std::time::Duration;

use colored::Colorize;

use crate::config::AppConfig;

/// Outcome of a check, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    /// Pass or Warn
    pub fn is_ok(self) -> bool {
        self != CheckStatus::Fail
    }

    pub fn label(self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
        }
    }

    pub fn colored_label(self) -> String {
        match self {
            CheckStatus::Pass => self.label().green().to_string(),
            CheckStatus::Warn => self.label().yellow().to_string(),
            CheckStatus::Fail => self.label().red().to_string(),
        }
    }

    /// 0 pass, 1 fail, 2 warn
    pub fn exit_code(self) -> i32 {
        match self {
            CheckStatus::Pass => 0,
            CheckStatus::Fail => 1,
            CheckStatus::Warn => 2,
        }
    }
}

/// Result of one check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub summary: String,
    /// One entry per line of the details section
    pub details: Vec<String>,
    pub duration: Duration,
}

impl CheckResult {
    fn with_status(status: CheckStatus, summary: impl Into<String>) -> Self {
        Self {
            status,
            summary: summary.into(),
            details: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn pass(summary: impl Into<String>) -> Self {
        Self::with_status(CheckStatus::Pass, summary)
    }

    pub fn warn(summary: impl Into<String>) -> Self {
        Self::with_status(CheckStatus::Warn, summary)
    }

    pub fn fail(summary: impl Into<String>) -> Self {
        Self::with_status(CheckStatus::Fail, summary)
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// A startup diagnostic run against the active configuration
pub trait SystemCheck {
    fn name(&self) -> &'static str;

    fn check(&self, config: &AppConfig) -> CheckResult;
}
