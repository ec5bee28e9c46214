//! Embedded Lua scripting
//!
//! - `engine`: Lua state, foreign functions, failure reporting
//! - `runner`: startup file, `import`/`require`, error flags
//! - `bridge`: device events to script handlers, the `gui` table

mod bridge;
mod engine;
mod runner;

pub use bridge::{BridgeMessageCode, EventBridge, GuiHandle, argument_type, event_table};
pub use engine::{
    ExitRequest, ReportedError, Reporter, ScriptEngine, ScriptError, display_value,
    create_foreign_function, execute_chunk, is_exit_request, object_type_from_lua, object_type_of,
};
pub use runner::{ErrorFlags, MultifileRunner, RunnerMessageCode, resolve_script};

/// Custom object type id of GUI element handles
pub const GUI_ELEMENT_TYPE: u32 = 1;
