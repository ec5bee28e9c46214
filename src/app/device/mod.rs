//! Rendering/windowing device
//!
//! The shell only talks to a [`Device`]: pump events, ask whether the window
//! is active, render a frame, close. [`WindowDevice`] does this with winit,
//! wgpu and egui; [`HeadlessDevice`] replays scripted event batches without a
//! window.

mod headless;
mod renderer;
mod window;

use std::time::Duration;

use thiserror::Error;

use super::input::{AppEvent, EventReceiver};
use crate::config::{DriverType, ScreenSize};

pub use headless::{HeadlessDevice, HeadlessProbe};
pub use window::WindowDevice;

/// How long an inactive window sleeps per loop iteration
pub const YIELD_INTERVAL: Duration = Duration::from_millis(16);

/// Errors raised while creating or driving a device
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop exited before a window was created")]
    NoWindow,

    #[error("failed to create async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no graphics adapter for the {driver} driver: {source}")]
    Adapter {
        driver: DriverType,
        #[source]
        source: wgpu::RequestAdapterError,
    },

    #[error("failed to request graphics device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("graphics device out of memory")]
    OutOfMemory,

    #[error("device is closed")]
    Closed,
}

/// A frame being drawn
///
/// GUI code draws into [`Frame::ctx`] and reports interactions with
/// [`Frame::push_event`]. The device hands those events back from
/// [`Device::render`].
pub struct Frame<'a> {
    pub ctx: &'a egui::Context,
    pub size: ScreenSize,
    events: Vec<AppEvent>,
}

impl<'a> Frame<'a> {
    pub fn new(ctx: &'a egui::Context, size: ScreenSize) -> Self {
        Self {
            ctx,
            size,
            events: Vec::new(),
        }
    }

    pub fn push_event(&mut self, event: AppEvent) {
        self.events.push(event);
    }

    pub fn into_events(self) -> Vec<AppEvent> {
        self.events
    }
}

/// Windowing and rendering engine driven by the shell
pub trait Device {
    /// Delivers pending events to `receiver`
    ///
    /// Returns false once the device has no more events to deliver, either
    /// because the window closed or [`Device::close_device`] was called.
    fn run(&mut self, receiver: &mut dyn EventReceiver) -> bool;

    /// Whether the window is focused and visible
    fn is_window_active(&self) -> bool;

    /// Gives up the CPU for a moment
    fn yield_device(&mut self) {
        std::thread::sleep(YIELD_INTERVAL);
    }

    /// Begins a frame, runs `draw`, presents, and returns the GUI events
    /// produced while drawing
    fn render(&mut self, draw: &mut dyn FnMut(&mut Frame<'_>))
    -> Result<Vec<AppEvent>, DeviceError>;

    /// Requests the device to stop; the next [`Device::run`] returns false
    fn close_device(&mut self);

    fn screen_size(&self) -> ScreenSize;

    fn driver(&self) -> DriverType;
}
