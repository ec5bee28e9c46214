//! Runs checks and collects their results

use std::time::Instant;

use tracing::debug;

use super::check::{CheckResult, CheckStatus, SystemCheck};
use crate::config::AppConfig;

/// Results of a check suite, in the order the checks ran
#[derive(Debug, Default)]
pub struct HealthCheckReport {
    pub results: Vec<(&'static str, CheckResult)>,
}

impl HealthCheckReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.results
            .iter()
            .filter(|(_, result)| result.status == status)
            .count()
    }

    /// Worst status of any check; Pass for an empty report
    pub fn status(&self) -> CheckStatus {
        self.results
            .iter()
            .map(|(_, result)| result.status)
            .max()
            .unwrap_or(CheckStatus::Pass)
    }

    /// No check failed
    pub fn is_healthy(&self) -> bool {
        self.status().is_ok()
    }

    pub fn exit_code(&self) -> i32 {
        self.status().exit_code()
    }
}

/// Collects checks and runs them against one configuration
#[derive(Default)]
pub struct HealthCheckRunner {
    checks: Vec<Box<dyn SystemCheck>>,
}

impl HealthCheckRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_check<C: SystemCheck + 'static>(mut self, check: C) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    pub fn run(self, config: &AppConfig) -> HealthCheckReport {
        let results = self
            .checks
            .into_iter()
            .map(|check| {
                let start = Instant::now();
                let result = check.check(config).with_duration(start.elapsed());
                debug!(check = check.name(), status = result.status.label(), "Health check done");
                (check.name(), result)
            })
            .collect();

        HealthCheckReport { results }
    }
}
