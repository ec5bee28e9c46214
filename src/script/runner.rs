//! Multi-file script runner
//!
//! Runs a startup file from a script root and lets scripts pull in other
//! files with `import(path)` (runs every time) and `require(path)` (runs once
//! per pass). Paths are relative to the root and may omit `.lua`.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use mlua::{Lua, MultiValue};
use tracing::{debug, info, warn};

use super::engine::{ExitRequest, ReportedError, Reporter, ScriptEngine, ScriptError, execute_chunk};
use crate::logger::{LogLevel, LogMessage};

/// Outcome of the last [`MultifileRunner::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorFlags {
    #[default]
    None,
    FileNonexistent,
    EngineError,
    ImportFailed,
    RequireFailed,
}

impl ErrorFlags {
    pub fn is_error(self) -> bool {
        self != Self::None
    }
}

/// Custom log codes raised by the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerMessageCode {
    FileNonExistent,
    ImportUsageInWrongContext,
    RequireUsageInWrongContext,
    InvalidPathArg,
}

impl RunnerMessageCode {
    const BASE: u32 = 0x200;
    const ALL: [Self; 4] = [
        Self::FileNonExistent,
        Self::ImportUsageInWrongContext,
        Self::RequireUsageInWrongContext,
        Self::InvalidPathArg,
    ];

    pub fn code(self) -> u32 {
        Self::BASE + self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FileNonExistent => "Multifile Runner: File does not exist",
            Self::ImportUsageInWrongContext => "Multifile Runner: import() used in the wrong context",
            Self::RequireUsageInWrongContext => {
                "Multifile Runner: require() used in the wrong context"
            }
            Self::InvalidPathArg => "Multifile Runner: Invalid path argument",
        }
    }
}

/// Resolves `path` under `root`
///
/// Absolute paths and paths leaving the root are rejected. A missing `.lua`
/// extension is added when only the extended file exists.
pub fn resolve_script(root: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path);
    if path.is_empty()
        || relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let full = root.join(relative);
    if relative.extension().is_none() && !full.is_file() {
        let with_ext = full.with_extension("lua");
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }
    Some(full)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inclusion {
    Import,
    Require,
}

impl Inclusion {
    fn failure(self) -> ErrorFlags {
        match self {
            Self::Import => ErrorFlags::ImportFailed,
            Self::Require => ErrorFlags::RequireFailed,
        }
    }

    fn wrong_context(self) -> RunnerMessageCode {
        match self {
            Self::Import => RunnerMessageCode::ImportUsageInWrongContext,
            Self::Require => RunnerMessageCode::RequireUsageInWrongContext,
        }
    }
}

#[derive(Debug)]
struct RunnerState {
    root: PathBuf,
    active: bool,
    required: HashSet<PathBuf>,
    error: ErrorFlags,
}

impl RunnerState {
    /// Keeps the first failure of a pass
    fn flag(&mut self, error: ErrorFlags) {
        if !self.error.is_error() {
            self.error = error;
        }
    }
}

/// Runs script files from a root directory
pub struct MultifileRunner {
    engine: ScriptEngine,
    state: Rc<RefCell<RunnerState>>,
}

impl MultifileRunner {
    /// Creates a runner and registers `import`/`require` on `engine`
    pub fn new(engine: &ScriptEngine, root: impl Into<PathBuf>) -> Result<Self, ScriptError> {
        let state = Rc::new(RefCell::new(RunnerState {
            root: root.into(),
            active: false,
            required: HashSet::new(),
            error: ErrorFlags::None,
        }));

        for (name, kind) in [("import", Inclusion::Import), ("require", Inclusion::Require)] {
            let state = state.clone();
            let reporter = engine.reporter().clone();
            engine.register_function(name, move |lua, path: String| {
                include(lua, &reporter, &state, kind, &path)
            })?;
        }

        Ok(Self {
            engine: engine.clone(),
            state,
        })
    }

    pub fn root(&self) -> PathBuf {
        self.state.borrow().root.clone()
    }

    pub fn error_flags(&self) -> ErrorFlags {
        self.state.borrow().error
    }

    /// Runs `path` from the root. Returns true on success.
    ///
    /// An exit request from the script counts as success.
    pub fn run(&self, path: &str) -> bool {
        let root = {
            let mut state = self.state.borrow_mut();
            state.error = ErrorFlags::None;
            state.required.clear();
            state.root.clone()
        };

        let reporter = self.engine.reporter();
        let Some(file) = resolve_script(&root, path).filter(|f| f.is_file()) else {
            warn!(path, root = %root.display(), "Startup script not found");
            reporter.message(LogMessage::custom(
                LogLevel::Error,
                RunnerMessageCode::FileNonExistent.code(),
            ));
            self.state.borrow_mut().error = ErrorFlags::FileNonexistent;
            return false;
        };

        let source = match std::fs::read_to_string(&file) {
            Ok(source) => source,
            Err(e) => {
                warn!(error = %e, file = %file.display(), "Failed to read script");
                reporter.print(LogLevel::Error, &format!("{}: {e}", file.display()));
                self.state.borrow_mut().error = ErrorFlags::FileNonexistent;
                return false;
            }
        };

        info!(file = %file.display(), "Running script");
        self.state.borrow_mut().active = true;
        let result = self.engine.execute(path, &source);
        let mut state = self.state.borrow_mut();
        state.active = false;

        match result {
            Ok(_) => !state.error.is_error(),
            Err(ScriptError::ExitRequested) => {
                debug!("Script requested exit");
                true
            }
            Err(e) => {
                debug!(error = %e, "Script failed");
                state.flag(ErrorFlags::EngineError);
                false
            }
        }
    }
}

/// Body of `import` and `require`
fn include(
    lua: &Lua,
    reporter: &Reporter,
    state: &RefCell<RunnerState>,
    kind: Inclusion,
    path: &str,
) -> mlua::Result<MultiValue> {
    let fail = |code: RunnerMessageCode| {
        reporter.message(LogMessage::custom(LogLevel::Error, code.code()));
        state.borrow_mut().flag(kind.failure());
        Err(mlua::Error::external(ReportedError(format!(
            "{}: {path}",
            code.as_str()
        ))))
    };

    let file = {
        let state = state.borrow();
        if !state.active {
            reporter.message(LogMessage::custom(
                LogLevel::Warning,
                kind.wrong_context().code(),
            ));
            return Ok(MultiValue::new());
        }
        resolve_script(&state.root, path)
    };

    let Some(file) = file else {
        return fail(RunnerMessageCode::InvalidPathArg);
    };
    if !file.is_file() {
        return fail(RunnerMessageCode::FileNonExistent);
    }

    if kind == Inclusion::Require && !state.borrow_mut().required.insert(file.clone()) {
        return Ok(MultiValue::new());
    }

    let Ok(source) = std::fs::read_to_string(&file) else {
        return fail(RunnerMessageCode::FileNonExistent);
    };

    match execute_chunk(lua, reporter, path, &source) {
        Ok(values) => Ok(values),
        Err(ScriptError::ExitRequested) => Err(mlua::Error::external(ExitRequest)),
        Err(e) => {
            state.borrow_mut().flag(kind.failure());
            Err(e.into_lua_error())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::logger::{AppLogger, MemoryWriter};

    struct Fixture {
        dir: tempfile::TempDir,
        runner: MultifileRunner,
        engine: ScriptEngine,
        memory: MemoryWriter,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("tempdir");
            let memory = MemoryWriter::default();
            let mut logger = AppLogger::new();
            logger.enabled = true;
            logger.write_to_file = false;
            logger.write_to_interface = true;
            logger.set_write_interface(Box::new(memory.clone()));

            let engine = ScriptEngine::new(logger.into_handle(), false).expect("engine");
            let runner = MultifileRunner::new(&engine, dir.path()).expect("runner");
            Self {
                dir,
                runner,
                engine,
                memory,
            }
        }

        fn write(&self, name: &str, source: &str) {
            let path = self.dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("mkdir");
            }
            fs::write(path, source).expect("write script");
        }

        fn global(&self, name: &str) -> i64 {
            self.engine.lua().globals().get(name).expect("global")
        }
    }

    #[test]
    fn message_codes_round_trip() {
        for code in RunnerMessageCode::ALL {
            assert_eq!(RunnerMessageCode::from_code(code.code()), Some(code));
        }
        assert_eq!(RunnerMessageCode::from_code(0x100), None);
    }

    #[test]
    fn missing_file_sets_flag() {
        let fx = Fixture::new();
        assert!(!fx.runner.run("project.lua"));
        assert_eq!(fx.runner.error_flags(), ErrorFlags::FileNonexistent);
        assert!(fx.memory.contains("ERROR: Multifile Runner: File does not exist"));
    }

    #[test]
    fn successful_run_clears_flag() {
        let fx = Fixture::new();
        assert!(!fx.runner.run("project.lua"));

        fx.write("project.lua", "ran = 1");
        assert!(fx.runner.run("project.lua"));
        assert_eq!(fx.runner.error_flags(), ErrorFlags::None);
        assert_eq!(fx.global("ran"), 1);
    }

    #[test]
    fn script_error_is_engine_error() {
        let fx = Fixture::new();
        fx.write("project.lua", "error('bad')");
        assert!(!fx.runner.run("project.lua"));
        assert_eq!(fx.runner.error_flags(), ErrorFlags::EngineError);
    }

    #[test]
    fn import_runs_every_time_require_once() {
        let fx = Fixture::new();
        fx.write("lib/counter.lua", "count = (count or 0) + 1 return count");
        fx.write("once.lua", "loaded = (loaded or 0) + 1");
        fx.write(
            "project.lua",
            r#"
            first = import("lib/counter.lua")
            second = import("lib/counter")
            require("once.lua")
            require("once")
            "#,
        );

        assert!(fx.runner.run("project.lua"));
        assert_eq!(fx.global("first"), 1);
        assert_eq!(fx.global("second"), 2);
        assert_eq!(fx.global("loaded"), 1);
    }

    #[test]
    fn failed_import_sets_flag() {
        let fx = Fixture::new();
        fx.write("project.lua", "import('missing.lua') after = 1");
        assert!(!fx.runner.run("project.lua"));
        assert_eq!(fx.runner.error_flags(), ErrorFlags::ImportFailed);
        assert!(fx.memory.contains("Multifile Runner: File does not exist"));
        assert!(fx.engine.lua().globals().get::<Option<i64>>("after").expect("get").is_none());
    }

    #[test]
    fn failing_required_file_sets_flag_and_reports_once() {
        let fx = Fixture::new();
        fx.write("bad.lua", "error('inner')");
        fx.write("project.lua", "require('bad.lua')");
        assert!(!fx.runner.run("project.lua"));
        assert_eq!(fx.runner.error_flags(), ErrorFlags::RequireFailed);

        let runtime_reports = fx
            .memory
            .lines()
            .iter()
            .filter(|line| line.as_str() == "ERROR: Script runtime error")
            .count();
        assert_eq!(runtime_reports, 1);
    }

    #[test]
    fn escaping_paths_are_invalid() {
        let fx = Fixture::new();
        fx.write("project.lua", "import('../outside.lua')");
        assert!(!fx.runner.run("project.lua"));
        assert_eq!(fx.runner.error_flags(), ErrorFlags::ImportFailed);
        assert!(fx.memory.contains("Multifile Runner: Invalid path argument"));
    }

    #[test]
    fn import_outside_a_pass_is_wrong_context() {
        let fx = Fixture::new();
        fx.write("lib.lua", "return 1");
        fx.engine.execute("console", "import('lib.lua')").expect("run");
        fx.engine.execute("console", "require('lib.lua')").expect("run");
        assert!(fx
            .memory
            .contains("WARNING: Multifile Runner: import() used in the wrong context"));
        assert!(fx
            .memory
            .contains("WARNING: Multifile Runner: require() used in the wrong context"));
    }

    #[test]
    fn exit_from_imported_file_is_success() {
        let fx = Fixture::new();
        fx.engine
            .register_function("leave", |_, ()| -> mlua::Result<()> {
                Err(mlua::Error::external(ExitRequest))
            })
            .expect("register");
        fx.write("quit.lua", "leave()");
        fx.write("project.lua", "import('quit.lua') after = 1");

        assert!(fx.runner.run("project.lua"));
        assert_eq!(fx.runner.error_flags(), ErrorFlags::None);
        assert!(fx.engine.lua().globals().get::<Option<i64>>("after").expect("get").is_none());
    }
}
