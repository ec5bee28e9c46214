//! Application configuration
//!
//! Supports multiple profiles (debug, release) with different settings.
//! Command-line flags are applied on top of the loaded configuration by
//! [`crate::cli::CommandLine`].

use std::fmt;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Window size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Looks up one of the named `--screen-size` presets
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "small" => Some(Self::new(300, 200)),
            "medium" => Some(Self::new(800, 600)),
            "large" => Some(Self::new(1024, 768)),
            "xlarge" => Some(Self::new(1200, 900)),
            _ => None,
        }
    }
}

impl fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rendering backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DriverType {
    /// Default GPU adapter
    #[default]
    Hardware,
    /// Software rasteriser (the fallback adapter)
    Software,
}

impl DriverType {
    /// Token selecting the software renderer
    pub const SOFTWARE_TOKEN: &'static str = "burnings";

    /// Maps a `--driver` token to a driver; anything but `burnings` is the default
    pub fn from_token(token: &str) -> Self {
        if token == Self::SOFTWARE_TOKEN {
            Self::Software
        } else {
            Self::Hardware
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Hardware => "hardware",
            Self::Software => Self::SOFTWARE_TOKEN,
        }
    }
}

impl From<String> for DriverType {
    fn from(token: String) -> Self {
        Self::from_token(&token)
    }
}

impl From<DriverType> for String {
    fn from(driver: DriverType) -> Self {
        driver.token().to_string()
    }
}

impl fmt::Display for DriverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial window size
    pub screen_size: ScreenSize,
    /// Rendering backend
    pub driver: DriverType,
    /// Stop rendering while the window does not have focus
    pub pause_when_inactive: bool,
    /// Whether the window should be resizable
    pub resizable: bool,
    /// Whether to enable vsync
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Bridge Shell".to_string(),
            screen_size: ScreenSize::new(1000, 600),
            driver: DriverType::Hardware,
            pause_when_inactive: false,
            resizable: true,
            vsync: true,
        }
    }
}

/// Script logger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Master switch for the script logger
    pub enabled: bool,
    /// Flush every sink after each message
    pub always_flush: bool,
    /// Write to stdout/stderr
    pub console: bool,
    /// Write to the log file
    pub file: bool,
    /// Directory the log file is created in
    pub directory: PathBuf,
    /// Forward messages into the tracing pipeline
    pub tracing: bool,
    pub show_info: bool,
    pub show_warnings: bool,
    pub show_errors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            always_flush: true,
            console: false,
            file: true,
            directory: PathBuf::from("."),
            tracing: false,
            show_info: true,
            show_warnings: true,
            show_errors: true,
        }
    }
}

/// Script location and engine policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Directory scripts are resolved against
    pub root: PathBuf,
    /// Script run once the device is up
    pub startup: String,
    /// Skip reporting foreign calls made with bad arguments
    pub ignore_bad_foreign_calls: bool,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./scripts"),
            startup: "project.lua".to_string(),
            ignore_bad_foreign_calls: false,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// The active profile (debug, release, etc.)
    pub profile: String,
    /// Window configuration
    pub window: WindowConfig,
    /// Script logger configuration
    pub logging: LoggingConfig,
    /// Script location
    pub scripts: ScriptsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: "release".to_string(),
            window: WindowConfig::default(),
            logging: LoggingConfig::default(),
            scripts: ScriptsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration based on the specified profile
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. built-in defaults
    /// 2. config/{profile}.toml
    /// 3. Environment variables with prefix APP_ (e.g., APP_WINDOW__PAUSE_WHEN_INACTIVE=true)
    ///
    /// Config files are searched for in:
    /// 1. Next to the executable (target/debug/config or target/release/config)
    /// 2. In the current directory (./config)
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        builder = match Self::find_config_dir() {
            Some(dir) => {
                builder.add_source(File::from(dir.join(profile).as_path()).required(false))
            }
            None => {
                builder.add_source(File::with_name(&format!("config/{}", profile)).required(false))
            }
        };

        // Use __ as separator for nested fields (e.g., APP_WINDOW__DRIVER)
        builder = builder.add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.set_override("profile", profile)?.build()?;

        config.try_deserialize()
    }

    /// Finds the config directory by searching in multiple locations
    fn find_config_dir() -> Option<PathBuf> {
        if let Ok(exe_path) = std::env::current_exe()
            && let Some(exe_dir) = exe_path.parent()
        {
            let config_dir = exe_dir.join("config");
            if config_dir.exists() {
                return Some(config_dir);
            }
        }

        let cwd_config = PathBuf::from("config");
        if cwd_config.exists() {
            return Some(cwd_config);
        }

        None
    }

    /// Loads configuration using the APP_PROFILE environment variable,
    /// defaulting to "release"
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let profile = std::env::var("APP_PROFILE").unwrap_or_else(|_| "release".to_string());
        Self::load(&profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_fixed_table() {
        assert_eq!(ScreenSize::preset("small"), Some(ScreenSize::new(300, 200)));
        assert_eq!(ScreenSize::preset("medium"), Some(ScreenSize::new(800, 600)));
        assert_eq!(ScreenSize::preset("large"), Some(ScreenSize::new(1024, 768)));
        assert_eq!(ScreenSize::preset("xlarge"), Some(ScreenSize::new(1200, 900)));
        assert_eq!(ScreenSize::preset("huge"), None);
    }

    #[test]
    fn driver_tokens() {
        assert_eq!(DriverType::from_token("burnings"), DriverType::Software);
        assert_eq!(DriverType::from_token("opengl"), DriverType::Hardware);
        assert_eq!(DriverType::from_token(""), DriverType::Hardware);
        assert_eq!(DriverType::from(String::from("burnings")).token(), "burnings");
    }

    #[test]
    fn defaults_match_startup_values() {
        let config = AppConfig::default();
        assert_eq!(config.window.screen_size, ScreenSize::new(1000, 600));
        assert_eq!(config.window.driver, DriverType::Hardware);
        assert!(!config.window.pause_when_inactive);
        assert_eq!(config.scripts.startup, "project.lua");
        assert!(!config.logging.enabled);
        assert!(config.logging.file);
    }

    #[test]
    fn missing_profile_falls_back_to_defaults() {
        let config = AppConfig::load("no-such-profile").expect("defaults should deserialize");
        assert_eq!(config.profile, "no-such-profile");
        assert_eq!(config.scripts, ScriptsConfig::default());
    }
}
