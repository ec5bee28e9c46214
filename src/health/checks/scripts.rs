//! Startup script check

use std::fs;

use mlua::Lua;

use crate::config::AppConfig;
use crate::health::check::{CheckResult, SystemCheck};
use crate::script::resolve_script;

/// Verifies the startup script exists and compiles, without running it
pub struct ScriptsCheck;

impl SystemCheck for ScriptsCheck {
    fn name(&self) -> &'static str {
        "Scripts"
    }

    fn check(&self, config: &AppConfig) -> CheckResult {
        let root = &config.scripts.root;
        let mut details = vec![format!("root: {}", root.display())];

        if !root.is_dir() {
            return CheckResult::fail(format!("Script root {} not found", root.display()))
                .with_details(details);
        }

        let Some(path) = resolve_script(root, &config.scripts.startup) else {
            return CheckResult::fail(format!(
                "Startup path {:?} is not inside the script root",
                config.scripts.startup
            ))
            .with_details(details);
        };

        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                details.push(format!("✗ {}: {e}", path.display()));
                return CheckResult::fail(format!("Startup script {} unreadable", config.scripts.startup))
                    .with_details(details);
            }
        };
        details.push(format!("✓ {} ({} bytes)", path.display(), source.len()));

        // Compiling without executing catches syntax errors only
        let lua = Lua::new();
        match lua.load(source.as_str()).set_name(config.scripts.startup.as_str()).into_function() {
            Ok(_) => CheckResult::pass(format!("{} compiles", config.scripts.startup))
                .with_details(details),
            Err(e) => {
                details.push(format!("✗ {e}"));
                CheckResult::fail(format!("{} has syntax errors", config.scripts.startup))
                    .with_details(details)
            }
        }
    }
}
