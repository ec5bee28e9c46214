//! Build metadata check

use crate::build_info;
use crate::config::AppConfig;
use crate::health::check::{CheckResult, SystemCheck};

/// Reports the build metadata baked in by `build.rs`
pub struct BuildInfoCheck;

impl SystemCheck for BuildInfoCheck {
    fn name(&self) -> &'static str {
        "Build Info"
    }

    fn check(&self, _config: &AppConfig) -> CheckResult {
        let details = build_info::detailed_info()
            .lines()
            .map(str::to_string)
            .collect();

        if build_info::GIT_SHA.is_none() {
            CheckResult::warn(format!("{} (no git metadata)", build_info::version_string()))
                .with_details(details)
        } else {
            CheckResult::pass(build_info::version_string()).with_details(details)
        }
    }
}
