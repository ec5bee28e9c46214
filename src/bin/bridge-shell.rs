//! Bridge Shell launcher
//!
//! Loads the configuration, applies command-line flags and runs the startup
//! script in a window.

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bridge_shell::app::{Shell, ShellHooks, WindowDevice};
use bridge_shell::build_info;
use bridge_shell::config::AppConfig;
use bridge_shell::health;

const HEALTH_FLAG: &str = "--health";
const VERSION_FLAG: &str = "--version";

/// What the launcher does instead of opening a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaunchAction {
    Health,
    Version,
}

/// Claims the launcher-only flags
#[derive(Debug, Default)]
struct LauncherHooks {
    action: Option<LaunchAction>,
}

impl ShellHooks for LauncherHooks {
    fn parse_command_arg(&mut self, arg: &str, _config: &mut AppConfig) -> bool {
        self.action = match arg {
            HEALTH_FLAG => Some(LaunchAction::Health),
            VERSION_FLAG => Some(LaunchAction::Version),
            _ => return true,
        };
        false
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("failed to install tracing subscriber")
}

fn main() -> Result<()> {
    init_tracing()?;

    let config = AppConfig::load_from_env().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load configuration, using defaults");
        AppConfig::default()
    });

    let mut shell = Shell::new(config, LauncherHooks::default());
    shell.parse_args(std::env::args().skip(1));

    let code = match shell.hooks().action {
        Some(LaunchAction::Version) => {
            println!("bridge-shell {}", build_info::version_string());
            0
        }
        Some(LaunchAction::Health) => {
            let report = health::run_all_checks(shell.config());
            health::print_report(&report);
            report.exit_code()
        }
        None => {
            info!(version = %build_info::version_string(), "Launching");
            shell.run(WindowDevice::new)
        }
    };

    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_shell::cli::CommandLine;

    fn parse(args: &[&str]) -> (LauncherHooks, AppConfig) {
        let mut hooks = LauncherHooks::default();
        let mut config = AppConfig::default();
        CommandLine::new().parse_args(args.iter(), &mut config, &mut hooks);
        (hooks, config)
    }

    #[test]
    fn launcher_flags_stop_parsing() {
        let (hooks, config) = parse(&["--health", "--inactive-pause"]);
        assert_eq!(hooks.action, Some(LaunchAction::Health));
        assert!(!config.window.pause_when_inactive);

        let (hooks, _) = parse(&["--driver", "burnings", "--version"]);
        assert_eq!(hooks.action, Some(LaunchAction::Version));
    }

    #[test]
    fn other_tokens_are_ignored() {
        let (hooks, config) = parse(&["--verbose", "--inactive-pause"]);
        assert_eq!(hooks.action, None);
        assert!(config.window.pause_when_inactive);
    }
}
