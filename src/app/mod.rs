//! Application shell, device and GUI
//!
//! Handles windowing, rendering, user input and the frame loop.

pub mod device;
pub mod gui;
mod hooks;
pub mod input;
mod shell;

pub use device::{Device, DeviceError, Frame, HeadlessDevice, HeadlessProbe, WindowDevice};
pub use gui::{ElementId, ElementKind, GuiElement, GuiEnvironment};
pub use hooks::{DefaultHooks, InitContext, ShellHooks};
pub use input::{AppEvent, EventKind, EventReceiver, GuiEventKind};
pub use shell::{Shell, ShellError, ShellSignals, exit_code_for};
