//! Script-facing logger
//!
//! Formats engine messages, custom message codes and plain text, then routes
//! the result to the enabled sinks: console, `app.log`, or a custom
//! [`WriteInterface`]. Write failures are ignored.

mod message;
mod writers;

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

use crate::config::LoggingConfig;
use crate::script::{BridgeMessageCode, GUI_ELEMENT_TYPE, RunnerMessageCode};

pub use message::{EngineMessage, LogMessage, ObjectType, TaskType};
pub use writers::{MemoryWriter, TracingWriter};

/// Name of the log file created by [`AppLogger::create_logging_file`]
pub const LOG_FILE_NAME: &str = "app.log";

/// Text printed for custom codes nobody could resolve
pub const UNKNOWN_MESSAGE: &str = "unknown";

/// Severity of a script log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// Receives formatted log lines. Implementations add their own line endings.
pub trait WriteInterface {
    /// Writes one line, returning whether it was accepted
    fn write(&mut self, text: &str) -> bool;

    /// Drains any buffered text
    fn flush(&mut self);
}

/// Logger interface the script engine reports through
pub trait Logger {
    fn print(&mut self, level: LogLevel, message: &str);

    fn print_message(&mut self, message: LogMessage);

    fn print_task_trace(&mut self, task: TaskType, name: &str, number: u32);

    fn print_stack_trace(&mut self, frame: &str, number: u32);
}

/// Shared, single-threaded logger handle
pub type LoggerHandle = Rc<RefCell<dyn Logger>>;

/// Resolves custom message codes the logger does not know
pub type MessageProvider = Box<dyn Fn(u32) -> Option<String>>;

/// Resolves names of custom object types the logger does not know
pub type TypeNameProvider = Box<dyn Fn(u32) -> Option<String>>;

/// Logger routing script messages to console, file and custom sinks
pub struct AppLogger {
    log_file: Option<BufWriter<File>>,
    message_provider: Option<MessageProvider>,
    type_name_provider: Option<TypeNameProvider>,
    write_interface: Option<Box<dyn WriteInterface>>,

    pub enabled: bool,
    pub always_flush: bool,
    pub write_to_console: bool,
    pub write_to_file: bool,
    pub write_to_interface: bool,
    pub show_info: bool,
    pub show_warnings: bool,
    pub show_errors: bool,
}

impl Default for AppLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl AppLogger {
    pub fn new() -> Self {
        Self {
            log_file: None,
            message_provider: None,
            type_name_provider: None,
            write_interface: None,
            enabled: false,
            always_flush: true,
            write_to_console: false,
            write_to_file: true,
            write_to_interface: false,
            show_info: true,
            show_warnings: true,
            show_errors: true,
        }
    }

    /// Builds a logger from the `[logging]` section
    ///
    /// A log file that cannot be created leaves the file sink without a target.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut logger = Self {
            enabled: config.enabled,
            always_flush: config.always_flush,
            write_to_console: config.console,
            write_to_file: config.file,
            show_info: config.show_info,
            show_warnings: config.show_warnings,
            show_errors: config.show_errors,
            ..Self::new()
        };

        if config.enabled
            && config.file
            && let Err(e) = logger.create_logging_file(&config.directory)
        {
            tracing::warn!(error = %e, dir = %config.directory.display(), "Could not create log file");
        }

        if config.tracing {
            logger.set_write_interface(Box::new(TracingWriter));
            logger.write_to_interface = true;
        }

        logger
    }

    /// Wraps the logger into a shared handle
    pub fn into_handle(self) -> Rc<RefCell<AppLogger>> {
        Rc::new(RefCell::new(self))
    }

    /// Checks the enabled flag and that at least the first active sink has a target
    pub fn is_ready(&self) -> bool {
        if !self.enabled {
            return false;
        }

        if self.write_to_console {
            return true;
        }

        if self.write_to_file {
            return self.log_file.is_some();
        }

        if self.write_to_interface {
            return self.write_interface.is_some();
        }

        false
    }

    pub fn will_show(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Info => self.show_info,
            LogLevel::Warning => self.show_warnings,
            LogLevel::Error => self.show_errors,
        }
    }

    /// Creates (or truncates) `app.log` inside `dir`
    pub fn create_logging_file(&mut self, dir: &Path) -> io::Result<()> {
        let file = File::create(dir.join(LOG_FILE_NAME))?;
        self.log_file = Some(BufWriter::new(file));
        Ok(())
    }

    pub fn set_message_provider(&mut self, provider: impl Fn(u32) -> Option<String> + 'static) {
        self.message_provider = Some(Box::new(provider));
    }

    pub fn set_type_name_provider(&mut self, provider: impl Fn(u32) -> Option<String> + 'static) {
        self.type_name_provider = Some(Box::new(provider));
    }

    pub fn set_write_interface(&mut self, writer: Box<dyn WriteInterface>) {
        self.write_interface = Some(writer);
    }

    /// Writes a line to every enabled sink
    pub fn write(&mut self, message: &str, is_error: bool) {
        if !self.enabled {
            return;
        }

        if self.write_to_console {
            if is_error {
                let _ = writeln!(io::stderr(), "{message}");
            } else {
                let _ = writeln!(io::stdout().lock(), "{message}");
            }
        }

        if self.write_to_interface
            && let Some(writer) = self.write_interface.as_mut()
            && writer.write(message)
            && self.always_flush
        {
            writer.flush();
        }

        if self.write_to_file
            && let Some(file) = self.log_file.as_mut()
            && writeln!(file, "{message}").is_ok()
            && self.always_flush
        {
            let _ = file.flush();
        }
    }

    /// Drains buffered sinks. Unnecessary when `always_flush` is set.
    pub fn flush(&mut self) {
        if self.write_to_console {
            let _ = io::stdout().flush();
        }

        if self.write_to_file
            && let Some(file) = self.log_file.as_mut()
        {
            let _ = file.flush();
        }

        if self.write_to_interface
            && let Some(writer) = self.write_interface.as_mut()
        {
            writer.flush();
        }
    }

    /// Prints the fixed text of an engine message
    pub fn print_engine_message(&mut self, level: LogLevel, message: EngineMessage) {
        self.print(level, message.as_str());
    }

    /// Name shown for `ty` in argument messages
    pub fn object_type_name(&self, ty: ObjectType) -> String {
        if let Some(name) = ty.builtin_name() {
            return name.to_string();
        }

        let ObjectType::Custom(id) = ty else {
            return UNKNOWN_MESSAGE.to_string();
        };

        if id == GUI_ELEMENT_TYPE {
            return "GUI element".to_string();
        }

        self.type_name_provider
            .as_ref()
            .and_then(|provider| provider(id))
            .unwrap_or_else(|| UNKNOWN_MESSAGE.to_string())
    }

    /// Text for a custom message code
    ///
    /// Lookup order: bridge codes, runner codes, the message provider.
    pub fn custom_message_text(&self, code: u32) -> String {
        if let Some(bridge) = BridgeMessageCode::from_code(code) {
            return bridge.as_str().to_string();
        }

        if let Some(runner) = RunnerMessageCode::from_code(code) {
            return runner.as_str().to_string();
        }

        self.message_provider
            .as_ref()
            .and_then(|provider| provider(code))
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| UNKNOWN_MESSAGE.to_string())
    }

    fn print_verbose_message(&mut self, message: &LogMessage, header: &str) {
        let function = message.function_name.as_deref().unwrap_or("global");
        let mut text = format!(
            "Function {}, arg {} of {}: {}",
            function, message.arg_index, message.arg_count, header
        );

        if let Some(expected) = message.expected_type
            && message.given_type != Some(expected)
        {
            let expected_name = self.object_type_name(expected);
            match message.given_type {
                Some(given) => {
                    let given_name = self.object_type_name(given);
                    text.push_str(&format!("\nExpected: {expected_name}, Given: {given_name}"));
                }
                None => text.push_str(&format!("\nExpected: {expected_name}")),
            }
        }

        self.print(message.level, &text);
    }

    fn print_custom_message(&mut self, message: &LogMessage) {
        let text = match message.custom_code {
            Some(code) => self.custom_message_text(code),
            None => UNKNOWN_MESSAGE.to_string(),
        };
        self.print(message.level, &text);
    }
}

impl Logger for AppLogger {
    fn print(&mut self, level: LogLevel, message: &str) {
        if !self.will_show(level) {
            return;
        }

        match level {
            LogLevel::Warning => self.write(&format!("WARNING: {message}"), true),
            LogLevel::Error => self.write(&format!("ERROR: {message}"), true),
            LogLevel::Info => self.write(message, false),
        }
    }

    fn print_message(&mut self, message: LogMessage) {
        if !self.enabled {
            return;
        }

        match message.message_id {
            EngineMessage::CustomMessage => self.print_custom_message(&message),
            id if id.is_argument_message() => self.print_verbose_message(&message, id.as_str()),
            id => self.print_engine_message(message.level, id),
        }
    }

    fn print_task_trace(&mut self, task: TaskType, name: &str, number: u32) {
        if !self.show_errors {
            return;
        }

        self.write(
            &format!("TASK TRACE: {}: {} {}", number, task.as_str(), name),
            false,
        );
    }

    fn print_stack_trace(&mut self, frame: &str, number: u32) {
        if !self.show_errors {
            return;
        }

        self.write(&format!("STACK TRACE: Frame: {frame}, # {number}"), false);
    }
}
