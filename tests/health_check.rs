//! Integration tests for the health check system

use std::fs;

use bridge_shell::config::AppConfig;
use bridge_shell::health::{
    self, CheckResult, CheckStatus, HealthCheckRunner, SystemCheck, checks::*,
};

struct Fixed(CheckStatus);

impl SystemCheck for Fixed {
    fn name(&self) -> &'static str {
        "Fixed"
    }

    fn check(&self, _config: &AppConfig) -> CheckResult {
        match self.0 {
            CheckStatus::Pass => CheckResult::pass("fine"),
            CheckStatus::Warn => CheckResult::warn("hmm"),
            CheckStatus::Fail => CheckResult::fail("broken"),
        }
    }
}

fn config_with_scripts(dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.scripts.root = dir.to_path_buf();
    config
}

#[test]
fn test_all_checks_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("project.lua"), "print('hi')").expect("write");

    let report = health::run_all_checks(&config_with_scripts(dir.path()));
    let formatted = health::format_report(&report);

    assert_eq!(report.total(), 4);
    for name in ["Configuration", "Scripts", "Build Info", "Graphics Backend"] {
        assert!(formatted.contains(name), "missing {name} in report");
    }
}

#[test]
fn test_config_check() {
    let result = ConfigCheck::new().check(&AppConfig::default());
    assert!(result.status.is_ok(), "Config check failed: {}", result.summary);
}

#[test]
fn test_build_info_check() {
    let result = BuildInfoCheck.check(&AppConfig::default());
    assert!(result.status.is_ok(), "Build info check failed: {}", result.summary);
    assert!(!result.details.is_empty());
}

#[test]
fn test_scripts_check_follows_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_with_scripts(dir.path());
    assert_eq!(ScriptsCheck.check(&config).status, CheckStatus::Fail);

    fs::write(dir.path().join("project.lua"), "x = 1").expect("write");
    assert_eq!(ScriptsCheck.check(&config).status, CheckStatus::Pass);
}

#[test]
fn test_exit_codes() {
    let config = AppConfig::default();
    let run = |statuses: &[CheckStatus]| {
        statuses
            .iter()
            .fold(HealthCheckRunner::new(), |runner, status| {
                runner.add_check(Fixed(*status))
            })
            .run(&config)
    };

    assert_eq!(run(&[]).exit_code(), 0);
    assert_eq!(run(&[CheckStatus::Pass, CheckStatus::Pass]).exit_code(), 0);
    assert_eq!(run(&[CheckStatus::Pass, CheckStatus::Warn]).exit_code(), 2);
    assert_eq!(run(&[CheckStatus::Warn, CheckStatus::Fail]).exit_code(), 1);

    let report = run(&[CheckStatus::Pass, CheckStatus::Warn, CheckStatus::Fail]);
    assert!(!report.is_healthy());
    assert_eq!(report.count(CheckStatus::Pass), 1);
    assert_eq!(report.count(CheckStatus::Warn), 1);
    assert_eq!(report.count(CheckStatus::Fail), 1);
}
