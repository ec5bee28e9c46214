//! Input handling
//!
//! ```text
//! Raw Input (winit) → InputCollector → AppEvent → EventReceiver
//!                                                  (the shell)
//! ```

mod collector;
mod events;
mod handler;

pub use collector::InputCollector;
pub use events::{AppEvent, EventKind, GuiEventKind, KeyCode, Modifiers, MouseButton};
pub use handler::EventReceiver;
