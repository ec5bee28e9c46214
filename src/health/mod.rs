//! Startup diagnostics
//!
//! Run with `bridge-shell --health`.
//!
//! ```no_run
//! use bridge_shell::config::AppConfig;
//! use bridge_shell::health::{HealthCheckRunner, checks::*};
//!
//! let config = AppConfig::default();
//! let report = HealthCheckRunner::new()
//!     .add_check(ConfigCheck::new())
//!     .add_check(ScriptsCheck)
//!     .run(&config);
//!
//! std::process::exit(report.exit_code());
//! ```

pub mod check;
pub mod checks;
pub mod reporter;
pub mod runner;

pub use check::{CheckResult, CheckStatus, SystemCheck};
pub use reporter::{format_report, print_report};
pub use runner::{HealthCheckReport, HealthCheckRunner};

use crate::config::AppConfig;

/// Runs every built-in check against `config`
pub fn run_all_checks(config: &AppConfig) -> HealthCheckReport {
    HealthCheckRunner::new()
        .add_check(checks::ConfigCheck::new())
        .add_check(checks::ScriptsCheck)
        .add_check(checks::BuildInfoCheck)
        .add_check(checks::GraphicsBackendCheck)
        .run(config)
}
