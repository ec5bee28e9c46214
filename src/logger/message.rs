//! Structured messages reported by the script engine

use super::LogLevel;

/// Message identifiers raised by the script engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineMessage {
    SyntaxError,
    RuntimeError,
    MemoryError,
    ForeignFunctionFailed,
    HandlerFailed,
    WrongArgCount,
    WrongArgType,
    DestroyedFuncAsArg,
    MissingArg,
    IndexOutOfBounds,
    BadArgIndexInForeignFunc,
    SystemFunctionBadArg,
    /// Text comes from a custom code (see [`LogMessage::custom_code`])
    CustomMessage,
}

impl EngineMessage {
    /// Fixed text for the message
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SyntaxError => "Syntax error",
            Self::RuntimeError => "Script runtime error",
            Self::MemoryError => "Script engine out of memory",
            Self::ForeignFunctionFailed => "Foreign function failed",
            Self::HandlerFailed => "Event handler failed",
            Self::WrongArgCount => "Wrong argument count",
            Self::WrongArgType => "Wrong argument type",
            Self::DestroyedFuncAsArg => "Destroyed function given as argument",
            Self::MissingArg => "Missing argument",
            Self::IndexOutOfBounds => "Index out of bounds",
            Self::BadArgIndexInForeignFunc => "Invalid argument-index access in foreign function",
            Self::SystemFunctionBadArg => "Invalid argument given to system function",
            Self::CustomMessage => "Custom message",
        }
    }

    /// Messages printed with function and argument context
    pub fn is_argument_message(self) -> bool {
        matches!(
            self,
            Self::WrongArgCount
                | Self::WrongArgType
                | Self::DestroyedFuncAsArg
                | Self::MissingArg
                | Self::IndexOutOfBounds
                | Self::BadArgIndexInForeignFunc
                | Self::SystemFunctionBadArg
        )
    }
}

/// Type of a script value, as far as log messages care
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Nil,
    Bool,
    Integer,
    Numeric,
    String,
    List,
    Function,
    /// Host-defined object type, named by the bridge or the type-name provider
    Custom(u32),
}

impl ObjectType {
    /// Name of a builtin type; `None` for custom types
    pub fn builtin_name(self) -> Option<&'static str> {
        match self {
            Self::Nil => Some("nil"),
            Self::Bool => Some("bool"),
            Self::Integer => Some("integer"),
            Self::Numeric => Some("number"),
            Self::String => Some("string"),
            Self::List => Some("list"),
            Self::Function => Some("function"),
            Self::Custom(_) => None,
        }
    }
}

/// Engine activity named in task traces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    /// Compiling a chunk
    FuncBuild,
    /// Calling a function that was looked up
    FuncFound,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FuncBuild => "Function Build",
            Self::FuncFound => "Function Found",
        }
    }
}

/// A message from the script engine, consumed once by the logger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub level: LogLevel,
    pub message_id: EngineMessage,
    pub custom_code: Option<u32>,
    pub function_name: Option<String>,
    /// 1-based index of the offending argument
    pub arg_index: u32,
    pub arg_count: u32,
    pub given_type: Option<ObjectType>,
    pub expected_type: Option<ObjectType>,
}

impl LogMessage {
    pub fn new(level: LogLevel, message_id: EngineMessage) -> Self {
        Self {
            level,
            message_id,
            custom_code: None,
            function_name: None,
            arg_index: 0,
            arg_count: 0,
            given_type: None,
            expected_type: None,
        }
    }

    /// A message whose text is looked up from `code`
    pub fn custom(level: LogLevel, code: u32) -> Self {
        Self {
            custom_code: Some(code),
            ..Self::new(level, EngineMessage::CustomMessage)
        }
    }

    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    pub fn with_arg(mut self, index: u32, count: u32) -> Self {
        self.arg_index = index;
        self.arg_count = count;
        self
    }

    pub fn with_types(mut self, expected: Option<ObjectType>, given: Option<ObjectType>) -> Self {
        self.expected_type = expected;
        self.given_type = given;
        self
    }
}
