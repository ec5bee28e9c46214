//! Configuration profile check

use crate::config::AppConfig;
use crate::health::check::{CheckResult, SystemCheck};

/// Loads every known profile and reports the active window settings
pub struct ConfigCheck {
    profiles: Vec<&'static str>,
}

impl ConfigCheck {
    pub fn new() -> Self {
        Self {
            profiles: vec!["debug", "release"],
        }
    }

    pub fn with_profiles(profiles: Vec<&'static str>) -> Self {
        Self { profiles }
    }
}

impl Default for ConfigCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCheck for ConfigCheck {
    fn name(&self) -> &'static str {
        "Configuration"
    }

    fn check(&self, config: &AppConfig) -> CheckResult {
        let mut details = Vec::new();
        let mut failures = 0;

        for profile in &self.profiles {
            match AppConfig::load(profile) {
                Ok(loaded) => details.push(format!(
                    "✓ profile '{profile}': {} window, {} driver, scripts in {}",
                    loaded.window.screen_size,
                    loaded.window.driver,
                    loaded.scripts.root.display()
                )),
                Err(e) => {
                    failures += 1;
                    details.push(format!("✗ profile '{profile}': {e}"));
                }
            }
        }

        details.push(format!(
            "active profile '{}': {} window, {} driver, pause when inactive: {}",
            config.profile,
            config.window.screen_size,
            config.window.driver,
            config.window.pause_when_inactive
        ));

        if failures > 0 {
            CheckResult::fail(format!("{failures} profile(s) failed to load")).with_details(details)
        } else if config.window.screen_size.width == 0 || config.window.screen_size.height == 0 {
            CheckResult::warn("Active screen size has a zero dimension").with_details(details)
        } else {
            CheckResult::pass(format!("{} profiles validated", self.profiles.len()))
                .with_details(details)
        }
    }
}
