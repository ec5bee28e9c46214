//! Bridge Shell
//!
//! An application shell that binds a window, a wgpu/egui renderer and an
//! embedded Lua engine. Scripts build GUI elements, subscribe to input events
//! and decide when the application closes.

/// Windowing, rendering, GUI and the shell run loop
pub mod app;

/// Build-time information (git SHA, branch, timestamp, etc.)
pub mod build_info;

/// Command-line state machine
pub mod cli;

/// Profile-based configuration
pub mod config;

/// Startup diagnostics
pub mod health;

/// Script-facing logger
pub mod logger;

/// Lua engine, multi-file runner and event bridge
pub mod script;
