//! Lua runtime wrapper
//!
//! Owns the Lua state, installs the logger-backed `print`, `log_warning` and
//! `log_error` functions, and turns Lua failures into structured log messages.

use mlua::{FromLuaMulti, Function, IntoLuaMulti, Lua, MultiValue, Value, Variadic};
use thiserror::Error;
use tracing::debug;

use crate::logger::{EngineMessage, LogLevel, LogMessage, LoggerHandle, ObjectType, TaskType};

use super::GUI_ELEMENT_TYPE;

/// Raised by `close_application` to end the running chunk
#[derive(Debug, Error)]
#[error("application exit requested")]
pub struct ExitRequest;

/// Marks a failure that was already written to the logger
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ReportedError(pub String);

/// Failure of a script chunk
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script requested application exit")]
    ExitRequested,

    #[error("syntax error in {chunk}: {message}")]
    Syntax { chunk: String, message: String },

    #[error("error in {chunk}: {source}")]
    Lua {
        chunk: String,
        #[source]
        source: mlua::Error,
    },
}

impl ScriptError {
    pub fn is_exit_request(&self) -> bool {
        matches!(self, Self::ExitRequested)
    }

    /// Converts back into a Lua error so a foreign function can abort its caller
    pub fn into_lua_error(self) -> mlua::Error {
        match self {
            Self::ExitRequested => mlua::Error::external(ExitRequest),
            other => mlua::Error::external(ReportedError(other.to_string())),
        }
    }
}

/// Visits `error` and every error it wraps
fn error_chain<'a>(error: &'a mlua::Error) -> impl Iterator<Item = &'a mlua::Error> {
    std::iter::successors(Some(error), |e| match *e {
        mlua::Error::CallbackError { cause, .. } => Some(cause.as_ref()),
        mlua::Error::WithContext { cause, .. } => Some(cause.as_ref()),
        mlua::Error::BadArgument { cause, .. } => Some(cause.as_ref()),
        _ => None,
    })
}

fn external_is<T: std::error::Error + 'static>(error: &mlua::Error) -> bool {
    error_chain(error).any(|e| match e {
        mlua::Error::ExternalError(inner) => inner.downcast_ref::<T>().is_some(),
        _ => false,
    })
}

/// Whether `error` carries an [`ExitRequest`] anywhere in its chain
pub fn is_exit_request(error: &mlua::Error) -> bool {
    external_is::<ExitRequest>(error)
}

fn is_already_reported(error: &mlua::Error) -> bool {
    external_is::<ReportedError>(error)
}

/// Whether `error` is a foreign call rejecting its arguments
fn is_bad_argument(error: &mlua::Error) -> bool {
    !is_exit_request(error)
        && !is_already_reported(error)
        && error_chain(error).any(|e| matches!(e, mlua::Error::BadArgument { .. }))
}

/// Maps a Lua type name to the logger's object type
pub fn object_type_from_lua(name: &str) -> Option<ObjectType> {
    match name {
        "nil" => Some(ObjectType::Nil),
        "boolean" => Some(ObjectType::Bool),
        "integer" => Some(ObjectType::Integer),
        "number" => Some(ObjectType::Numeric),
        "string" => Some(ObjectType::String),
        "table" => Some(ObjectType::List),
        "function" => Some(ObjectType::Function),
        "userdata" => Some(ObjectType::Custom(GUI_ELEMENT_TYPE)),
        _ => None,
    }
}

/// Maps the Rust target type of a failed conversion to an object type
fn object_type_from_rust(name: &str) -> Option<ObjectType> {
    let name = name.rsplit("::").next().unwrap_or(name);
    match name {
        "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize"
        | "Integer" | "integer" => Some(ObjectType::Integer),
        "f32" | "f64" | "Number" | "number" => Some(ObjectType::Numeric),
        "String" | "string" | "BString" | "str" => Some(ObjectType::String),
        "bool" | "boolean" => Some(ObjectType::Bool),
        "Table" | "table" => Some(ObjectType::List),
        "Function" | "function" => Some(ObjectType::Function),
        "userdata" | "GuiHandle" => Some(ObjectType::Custom(GUI_ELEMENT_TYPE)),
        _ => object_type_from_lua(name),
    }
}

/// Splits mlua's `"message\nstack traceback:\n..."` text
fn split_traceback(text: &str) -> (&str, Vec<&str>) {
    match text.split_once("stack traceback:") {
        Some((message, trace)) => (
            message.trim_end(),
            trace
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect(),
        ),
        None => (text, Vec::new()),
    }
}

/// Writes Lua failures to the logger
#[derive(Clone)]
pub struct Reporter {
    logger: LoggerHandle,
    ignore_bad_foreign_calls: bool,
}

impl Reporter {
    pub fn new(logger: LoggerHandle, ignore_bad_foreign_calls: bool) -> Self {
        Self {
            logger,
            ignore_bad_foreign_calls,
        }
    }

    pub fn logger(&self) -> &LoggerHandle {
        &self.logger
    }

    pub fn ignores_bad_foreign_calls(&self) -> bool {
        self.ignore_bad_foreign_calls
    }

    pub fn print(&self, level: LogLevel, text: &str) {
        self.logger.borrow_mut().print(level, text);
    }

    pub fn message(&self, message: LogMessage) {
        self.logger.borrow_mut().print_message(message);
    }

    /// Reports a foreign function called with an argument of the wrong type
    pub fn bad_argument(
        &self,
        function: &str,
        index: u32,
        count: u32,
        expected: ObjectType,
        given: Option<ObjectType>,
    ) {
        if self.ignore_bad_foreign_calls {
            return;
        }

        let id = match given {
            None | Some(ObjectType::Nil) => EngineMessage::MissingArg,
            Some(_) => EngineMessage::WrongArgType,
        };
        self.message(
            LogMessage::new(LogLevel::Warning, id)
                .with_function(function)
                .with_arg(index, count)
                .with_types(Some(expected), given),
        );
    }

    /// Reports a failure raised while running `chunk`
    ///
    /// Exit requests and failures that were already reported are skipped.
    pub fn report(&self, chunk: &str, error: &mlua::Error) {
        if is_exit_request(error) || is_already_reported(error) {
            return;
        }

        let traceback = error_chain(error).find_map(|e| match e {
            mlua::Error::CallbackError { traceback, .. } => Some(traceback.as_str()),
            _ => None,
        });
        let root = error_chain(error).last().unwrap_or(error);

        if let Some(bad) = error_chain(error).find(|e| matches!(e, mlua::Error::BadArgument { .. })) {
            self.report_bad_argument(bad);
        } else {
            match root {
                mlua::Error::SyntaxError { message, .. } => {
                    self.message(LogMessage::new(LogLevel::Error, EngineMessage::SyntaxError));
                    self.print(LogLevel::Error, message);
                    self.logger
                        .borrow_mut()
                        .print_task_trace(TaskType::FuncBuild, chunk, 1);
                    return;
                }
                mlua::Error::MemoryError(message) => {
                    self.message(LogMessage::new(LogLevel::Error, EngineMessage::MemoryError));
                    self.print(LogLevel::Error, message);
                }
                mlua::Error::RuntimeError(text) => {
                    let (message, frames) = split_traceback(text);
                    self.message(LogMessage::new(LogLevel::Error, EngineMessage::RuntimeError));
                    self.print(LogLevel::Error, message);
                    if traceback.is_none() {
                        self.stack_trace(&frames);
                    }
                }
                mlua::Error::ExternalError(inner) => {
                    self.message(LogMessage::new(
                        LogLevel::Error,
                        EngineMessage::ForeignFunctionFailed,
                    ));
                    self.print(LogLevel::Error, &inner.to_string());
                }
                other => {
                    self.message(LogMessage::new(LogLevel::Error, EngineMessage::RuntimeError));
                    self.print(LogLevel::Error, &other.to_string());
                }
            }
        }

        if let Some(traceback) = traceback {
            let (_, frames) = split_traceback(traceback);
            self.stack_trace(&frames);
        }
    }

    fn report_bad_argument(&self, error: &mlua::Error) {
        let mlua::Error::BadArgument { to, pos, cause, .. } = error else {
            return;
        };

        let (expected, given) = match cause.as_ref() {
            mlua::Error::FromLuaConversionError { from, to, .. } => {
                (object_type_from_rust(&to.to_string()), object_type_from_lua(from))
            }
            mlua::Error::UserDataTypeMismatch => (Some(ObjectType::Custom(GUI_ELEMENT_TYPE)), None),
            _ => (None, None),
        };

        let id = match given {
            Some(ObjectType::Nil) => EngineMessage::MissingArg,
            _ => EngineMessage::WrongArgType,
        };
        let index = u32::try_from(*pos).unwrap_or(u32::MAX);
        let mut message = LogMessage::new(LogLevel::Error, id)
            .with_arg(index, index)
            .with_types(expected, given);
        if let Some(function) = to {
            message = message.with_function(function.as_str());
        }
        self.message(message);
    }

    fn stack_trace(&self, frames: &[&str]) {
        let mut logger = self.logger.borrow_mut();
        for (number, frame) in frames.iter().enumerate() {
            logger.print_stack_trace(frame, number as u32);
        }
    }
}

/// Lua state plus the logger its failures are reported to
#[derive(Clone)]
pub struct ScriptEngine {
    lua: Lua,
    reporter: Reporter,
}

impl ScriptEngine {
    /// Creates a Lua state whose `print` goes to `logger`
    pub fn new(logger: LoggerHandle, ignore_bad_foreign_calls: bool) -> Result<Self, ScriptError> {
        let engine = Self {
            lua: Lua::new(),
            reporter: Reporter::new(logger, ignore_bad_foreign_calls),
        };
        engine
            .install_logging()
            .map_err(|source| ScriptError::Lua {
                chunk: "engine setup".to_string(),
                source,
            })?;
        Ok(engine)
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    fn install_logging(&self) -> mlua::Result<()> {
        let globals = self.lua.globals();

        let reporter = self.reporter.clone();
        globals.set(
            "print",
            self.lua.create_function(move |lua, args: Variadic<Value>| {
                let text = args
                    .iter()
                    .map(|value| display_value(lua, value))
                    .collect::<mlua::Result<Vec<_>>>()?
                    .join("\t");
                reporter.print(LogLevel::Info, &text);
                Ok(())
            })?,
        )?;

        for (name, level) in [("log_warning", LogLevel::Warning), ("log_error", LogLevel::Error)] {
            let reporter = self.reporter.clone();
            globals.set(
                name,
                self.lua.create_function(move |lua, value: Value| {
                    reporter.print(level, &display_value(lua, &value)?);
                    Ok(())
                })?,
            )?;
        }

        Ok(())
    }

    /// Installs a global foreign function
    pub fn register_function<A, R, F>(&self, name: &str, function: F) -> Result<(), ScriptError>
    where
        A: FromLuaMulti,
        R: IntoLuaMulti,
        F: Fn(&Lua, A) -> mlua::Result<R> + 'static,
    {
        debug!(name, "Registering foreign function");
        let wrap = |source| ScriptError::Lua {
            chunk: name.to_string(),
            source,
        };
        let function = create_foreign_function(&self.lua, &self.reporter, function).map_err(wrap)?;
        self.lua.globals().set(name, function).map_err(wrap)
    }

    /// Runs a chunk, reporting failures to the logger
    pub fn execute(&self, chunk: &str, source: &str) -> Result<MultiValue, ScriptError> {
        execute_chunk(&self.lua, &self.reporter, chunk, source)
    }
}

/// Creates a function scripts can call
///
/// When `reporter` ignores bad foreign calls, a call whose arguments fail to
/// convert returns nothing instead of raising an error.
pub fn create_foreign_function<A, R, F>(
    lua: &Lua,
    reporter: &Reporter,
    function: F,
) -> mlua::Result<Function>
where
    A: FromLuaMulti,
    R: IntoLuaMulti,
    F: Fn(&Lua, A) -> mlua::Result<R> + 'static,
{
    let inner = lua.create_function(function)?;
    if !reporter.ignores_bad_foreign_calls() {
        return Ok(inner);
    }

    lua.create_function(move |_, args: MultiValue| match inner.call::<MultiValue>(args) {
        Ok(values) => Ok(values),
        Err(e) if is_bad_argument(&e) => {
            debug!(error = %e, "Ignoring bad foreign call");
            Ok(MultiValue::new())
        }
        Err(e) => Err(e),
    })
}

/// Runs `source` on `lua`, reporting failures through `reporter`
///
/// Usable from inside foreign functions, which only get a `&Lua`.
pub fn execute_chunk(
    lua: &Lua,
    reporter: &Reporter,
    chunk: &str,
    source: &str,
) -> Result<MultiValue, ScriptError> {
    debug!(chunk, "Executing chunk");

    lua.load(source)
        .set_name(format!("@{chunk}"))
        .eval::<MultiValue>()
        .map_err(|error| {
            if is_exit_request(&error) {
                return ScriptError::ExitRequested;
            }

            reporter.report(chunk, &error);
            match error {
                mlua::Error::SyntaxError { message, .. } => ScriptError::Syntax {
                    chunk: chunk.to_string(),
                    message,
                },
                source => ScriptError::Lua {
                    chunk: chunk.to_string(),
                    source,
                },
            }
        })
}

/// Text shown for a value by `print`
pub fn display_value(lua: &Lua, value: &Value) -> mlua::Result<String> {
    match value {
        Value::Nil => Ok("nil".to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::String(s) => Ok(s.to_string_lossy().to_string()),
        _ => {
            let tostring: Function = lua.globals().get("tostring")?;
            tostring.call::<String>(value.clone())
        }
    }
}

/// Lua type name of `value`, as an object type
pub fn object_type_of(value: &Value) -> Option<ObjectType> {
    object_type_from_lua(value.type_name())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::logger::{AppLogger, MemoryWriter};

    fn engine() -> (ScriptEngine, MemoryWriter) {
        engine_with_policy(false)
    }

    fn engine_with_policy(ignore_bad_foreign_calls: bool) -> (ScriptEngine, MemoryWriter) {
        let memory = MemoryWriter::default();
        let mut logger = AppLogger::new();
        logger.enabled = true;
        logger.write_to_file = false;
        logger.write_to_interface = true;
        logger.set_write_interface(Box::new(memory.clone()));
        let engine =
            ScriptEngine::new(logger.into_handle(), ignore_bad_foreign_calls).expect("engine");
        (engine, memory)
    }

    #[test]
    fn print_goes_to_logger() {
        let (engine, memory) = engine();
        engine
            .execute("test", r#"print("hello", 1, 2.5, true, nil)"#)
            .expect("run");
        assert_eq!(memory.lines(), vec!["hello\t1\t2.5\ttrue\tnil"]);
    }

    #[test]
    fn log_levels_from_scripts() {
        let (engine, memory) = engine();
        engine
            .execute("test", r#"log_warning("low fuel") log_error("engine fire")"#)
            .expect("run");
        assert_eq!(memory.lines(), vec!["WARNING: low fuel", "ERROR: engine fire"]);
    }

    #[test]
    fn registered_function_is_callable() {
        let (engine, _memory) = engine();
        engine
            .register_function("double", |_, n: i64| Ok(n * 2))
            .expect("register");
        let result = engine.execute("test", "return double(21)").expect("run");
        let value: i64 = engine
            .lua()
            .unpack_multi(result)
            .expect("integer result");
        assert_eq!(value, 42);
    }

    #[test]
    fn syntax_error_is_reported_with_task_trace() {
        let (engine, memory) = engine();
        let err = engine.execute("broken.lua", "local = 1").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { .. }));
        assert!(memory.contains("ERROR: Syntax error"));
        assert!(memory.contains("TASK TRACE: 1: Function Build broken.lua"));
    }

    #[test]
    fn runtime_error_is_reported() {
        let (engine, memory) = engine();
        let err = engine.execute("boom.lua", r#"error("boom")"#).unwrap_err();
        assert!(matches!(err, ScriptError::Lua { .. }));
        assert!(memory.contains("ERROR: Script runtime error"));
        assert!(memory.contains("boom"));
    }

    #[test]
    fn exit_request_is_not_an_error_report() {
        let (engine, memory) = engine();
        engine
            .register_function("leave", |_, ()| -> mlua::Result<()> {
                Err(mlua::Error::external(ExitRequest))
            })
            .expect("register");

        let err = engine
            .execute("exit.lua", "leave() print('unreachable')")
            .unwrap_err();
        assert!(err.is_exit_request());
        assert!(memory.lines().is_empty());
    }

    #[test]
    fn bad_argument_uses_verbose_format() {
        let (engine, memory) = engine();
        let error = mlua::Error::CallbackError {
            traceback: String::new(),
            cause: Arc::new(mlua::Error::BadArgument {
                to: Some("gui.set_text".to_string()),
                pos: 2,
                name: None,
                cause: Arc::new(mlua::Error::FromLuaConversionError {
                    from: "boolean",
                    to: "String".into(),
                    message: None,
                }),
            }),
        };

        engine.reporter().report("test", &error);
        assert_eq!(
            memory.lines(),
            vec![
                "ERROR: Function gui.set_text, arg 2 of 2: Wrong argument type\nExpected: string, Given: bool"
            ]
        );
    }

    #[test]
    fn ignored_bad_calls_stay_quiet() {
        let memory = MemoryWriter::default();
        let mut logger = AppLogger::new();
        logger.enabled = true;
        logger.write_to_file = false;
        logger.write_to_interface = true;
        logger.set_write_interface(Box::new(memory.clone()));
        let reporter = Reporter::new(logger.into_handle(), true);

        reporter.bad_argument("close_application", 1, 1, ObjectType::Integer, Some(ObjectType::String));
        assert!(memory.lines().is_empty());
    }

    #[test]
    fn ignored_bad_calls_return_nil_and_continue() {
        let (engine, memory) = engine_with_policy(true);
        engine
            .register_function("double", |_, x: i64| Ok(x * 2))
            .expect("register");

        engine
            .execute(
                "test",
                r#"
                print(double({}) == nil)
                print(double(4))
                print("after")
                "#,
            )
            .expect("chunk keeps running");

        assert_eq!(memory.lines(), vec!["true", "8", "after"]);
    }

    #[test]
    fn bad_calls_abort_with_a_message_by_default() {
        let (engine, memory) = engine();
        engine
            .register_function("double", |_, x: i64| Ok(x * 2))
            .expect("register");

        assert!(engine.execute("test", "double({}) print('after')").is_err());
        assert!(memory.contains("Wrong argument type"));
        assert!(!memory.contains("after"));
    }

    #[test]
    fn wrapped_functions_still_raise_their_own_errors() {
        let (engine, _memory) = engine_with_policy(true);
        engine
            .register_function("fail", |_, ()| Err::<(), _>(mlua::Error::runtime("nope")))
            .expect("register");

        assert!(engine.execute("test", "fail()").is_err());
    }

    #[test]
    fn traceback_split() {
        let (message, frames) =
            split_traceback("boom.lua:1: boom\nstack traceback:\n\t[C]: in ?\n\tboom.lua:1: in main chunk");
        assert_eq!(message, "boom.lua:1: boom");
        assert_eq!(frames, vec!["[C]: in ?", "boom.lua:1: in main chunk"]);
    }
}
