//! Command-line parsing
//!
//! A two-state machine: either no flag is waiting for a value, or the previous
//! token was a flag and the next token is its value. Tokens that are neither
//! known flags nor awaited values go to [`ShellHooks::parse_command_arg`].

use tracing::debug;

use crate::app::ShellHooks;
use crate::config::{AppConfig, DriverType, ScreenSize};

pub const SCREEN_SIZE_FLAG: &str = "--screen-size";
pub const DRIVER_FLAG: &str = "--driver";
pub const INACTIVE_PAUSE_FLAG: &str = "--inactive-pause";

/// Flag whose value is awaited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    ScreenSize,
    DriverType,
}

/// Parser state between tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgState {
    #[default]
    None,
    AwaitingValue(ValueKind),
}

/// Applies command-line tokens to an [`AppConfig`]
#[derive(Debug, Default)]
pub struct CommandLine {
    state: ArgState,
}

impl CommandLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ArgState {
        self.state
    }

    /// Feeds every token until one of them asks to stop
    pub fn parse_args<I, S, H>(&mut self, args: I, config: &mut AppConfig, hooks: &mut H)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        H: ShellHooks + ?Sized,
    {
        for arg in args {
            if !self.parse_arg(arg.as_ref(), config, hooks) {
                debug!(arg = arg.as_ref(), "Argument parsing stopped");
                break;
            }
        }
    }

    /// Feeds one token. Returns false to stop parsing.
    pub fn parse_arg<H>(&mut self, arg: &str, config: &mut AppConfig, hooks: &mut H) -> bool
    where
        H: ShellHooks + ?Sized,
    {
        if let ArgState::AwaitingValue(kind) = self.state {
            self.state = ArgState::None;
            match kind {
                ValueKind::ScreenSize => {
                    config.window.screen_size =
                        ScreenSize::preset(arg).unwrap_or_else(|| hooks.initial_screen_size());
                }
                ValueKind::DriverType => {
                    config.window.driver = DriverType::from_token(arg);
                }
            }
            return true;
        }

        match arg {
            SCREEN_SIZE_FLAG => self.state = ArgState::AwaitingValue(ValueKind::ScreenSize),
            DRIVER_FLAG => self.state = ArgState::AwaitingValue(ValueKind::DriverType),
            INACTIVE_PAUSE_FLAG => config.window.pause_when_inactive = true,
            other => return hooks.parse_command_arg(other, config),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::DefaultHooks;

    struct FixedSize;

    impl ShellHooks for FixedSize {
        fn initial_screen_size(&self) -> ScreenSize {
            ScreenSize::new(640, 480)
        }
    }

    struct StopAt(&'static str);

    impl ShellHooks for StopAt {
        fn parse_command_arg(&mut self, arg: &str, _config: &mut AppConfig) -> bool {
            arg != self.0
        }
    }

    fn parse(args: &[&str], hooks: &mut impl ShellHooks) -> AppConfig {
        let mut config = AppConfig::default();
        CommandLine::new().parse_args(args.iter(), &mut config, hooks);
        config
    }

    #[test]
    fn named_screen_sizes_use_presets() {
        for (token, expected) in [
            ("small", ScreenSize::new(300, 200)),
            ("medium", ScreenSize::new(800, 600)),
            ("large", ScreenSize::new(1024, 768)),
            ("xlarge", ScreenSize::new(1200, 900)),
        ] {
            let config = parse(&["--screen-size", token], &mut DefaultHooks);
            assert_eq!(config.window.screen_size, expected, "token {token}");
        }
    }

    #[test]
    fn unknown_screen_size_uses_hook() {
        let config = parse(&["--screen-size", "gigantic"], &mut FixedSize);
        assert_eq!(config.window.screen_size, ScreenSize::new(640, 480));

        let config = parse(&["--screen-size", "gigantic"], &mut DefaultHooks);
        assert_eq!(config.window.screen_size, ScreenSize::new(1024, 768));
    }

    #[test]
    fn driver_tokens() {
        let config = parse(&["--driver", "burnings"], &mut DefaultHooks);
        assert_eq!(config.window.driver, DriverType::Software);

        for token in ["opengl", "", "Burnings", "software"] {
            let config = parse(&["--driver", token], &mut DefaultHooks);
            assert_eq!(config.window.driver, DriverType::Hardware, "token {token:?}");
        }
    }

    #[test]
    fn returns_to_none_after_one_value() {
        let mut config = AppConfig::default();
        let mut cli = CommandLine::new();
        let mut hooks = DefaultHooks;

        assert!(cli.parse_arg("--driver", &mut config, &mut hooks));
        assert_eq!(cli.state(), ArgState::AwaitingValue(ValueKind::DriverType));

        assert!(cli.parse_arg("burnings", &mut config, &mut hooks));
        assert_eq!(cli.state(), ArgState::None);

        // The following token is not treated as another driver value
        assert!(cli.parse_arg("opengl", &mut config, &mut hooks));
        assert_eq!(cli.state(), ArgState::None);
        assert_eq!(config.window.driver, DriverType::Software);
    }

    #[test]
    fn awaited_value_is_consumed_even_if_it_looks_like_a_flag() {
        let config = parse(&["--screen-size", "--inactive-pause"], &mut DefaultHooks);
        assert!(!config.window.pause_when_inactive);
        assert_eq!(config.window.screen_size, ScreenSize::new(1024, 768));
    }

    #[test]
    fn inactive_pause_and_unknown_tokens() {
        let config = parse(
            &["bridge-shell", "--verbose", "--inactive-pause", "extra"],
            &mut DefaultHooks,
        );
        assert!(config.window.pause_when_inactive);
        assert_eq!(config.window.screen_size, ScreenSize::new(1000, 600));
    }

    #[test]
    fn hook_can_stop_parsing() {
        let config = parse(&["stop", "--inactive-pause"], &mut StopAt("stop"));
        assert!(!config.window.pause_when_inactive);
    }
}
