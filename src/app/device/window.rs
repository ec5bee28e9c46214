//! Desktop device built on winit, wgpu and egui
//!
//! The shell owns the loop, so the winit event loop is pumped once per
//! iteration with [`EventLoopExtPumpEvents`] instead of being handed control.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowAttributes, WindowId};

use super::renderer::Renderer;
use super::{Device, DeviceError, Frame};
use crate::app::input::{AppEvent, EventReceiver, InputCollector};
use crate::config::{DriverType, ScreenSize, WindowConfig};

/// How long device creation waits for the platform to hand out a window
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates window attributes from configuration
fn window_attributes_from_config(config: &WindowConfig) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(
            config.screen_size.width,
            config.screen_size.height,
        ))
        .with_resizable(config.resizable)
}

/// A native window rendered with wgpu
pub struct WindowDevice {
    event_loop: EventLoop<()>,
    state: WindowState,
}

impl WindowDevice {
    /// Opens the window and initializes the renderer
    pub fn new(config: &WindowConfig) -> Result<Self, DeviceError> {
        info!(?config, "Creating window device");

        let mut event_loop = EventLoop::new()?;
        let mut state = WindowState::new(config.clone());

        let started = Instant::now();
        while state.renderer.is_none() && state.init_error.is_none() {
            let status = event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut state);
            if matches!(status, PumpStatus::Exit(_)) || started.elapsed() > STARTUP_TIMEOUT {
                break;
            }
        }

        if let Some(e) = state.init_error.take() {
            return Err(e);
        }

        if state.renderer.is_none() {
            return Err(DeviceError::NoWindow);
        }

        Ok(Self { event_loop, state })
    }
}

impl Device for WindowDevice {
    fn run(&mut self, receiver: &mut dyn EventReceiver) -> bool {
        if self.state.closed {
            return false;
        }

        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state);

        for event in self.state.pending.drain(..) {
            receiver.on_event(&event);
        }

        if let PumpStatus::Exit(code) = status {
            debug!(code, "Event loop exited");
            self.state.closed = true;
        }

        !self.state.closed
    }

    fn is_window_active(&self) -> bool {
        self.state.focused && !self.state.occluded
    }

    fn render(
        &mut self,
        draw: &mut dyn FnMut(&mut Frame<'_>),
    ) -> Result<Vec<AppEvent>, DeviceError> {
        let size = self.screen_size();
        let (Some(renderer), Some(window)) = (&mut self.state.renderer, &self.state.window) else {
            return Err(DeviceError::Closed);
        };

        let mut events = Vec::new();
        let result = renderer.draw(window, |ctx| {
            let mut frame = Frame::new(ctx, size);
            draw(&mut frame);
            events = frame.into_events();
        });

        match result {
            Ok(()) => Ok(events),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost, reconfiguring");
                let size = window.inner_size();
                renderer.resize(size);
                Ok(events)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("Out of memory, closing device");
                self.close_device();
                Err(DeviceError::OutOfMemory)
            }
            Err(e) => {
                warn!(error = %e, "Frame skipped");
                Ok(events)
            }
        }
    }

    fn close_device(&mut self) {
        if !self.state.closed {
            info!("Closing window device");
        }
        self.state.closed = true;
        self.state.renderer = None;
        self.state.window = None;
    }

    fn screen_size(&self) -> ScreenSize {
        match &self.state.renderer {
            Some(renderer) => ScreenSize::new(renderer.config().width, renderer.config().height),
            None => self.state.config.screen_size,
        }
    }

    fn driver(&self) -> DriverType {
        self.state.config.driver
    }
}

/// State the winit event loop calls back into
struct WindowState {
    config: WindowConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    collector: InputCollector,
    pending: Vec<AppEvent>,
    init_error: Option<DeviceError>,
    focused: bool,
    occluded: bool,
    closed: bool,
}

impl WindowState {
    fn new(config: WindowConfig) -> Self {
        Self {
            config,
            window: None,
            renderer: None,
            collector: InputCollector::new(),
            pending: Vec::new(),
            init_error: None,
            focused: true,
            occluded: false,
            closed: false,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), DeviceError> {
        let attributes = window_attributes_from_config(&self.config);
        let window = Arc::new(event_loop.create_window(attributes)?);

        let size = window.inner_size();
        info!(
            window.width = size.width,
            window.height = size.height,
            "Window created successfully"
        );

        // winit's loop is synchronous; wgpu setup is async
        let renderer = tokio::runtime::Runtime::new()?.block_on(Renderer::new(
            window.clone(),
            self.config.driver,
            self.config.vsync,
        ))?;

        info!("Renderer initialized successfully");
        self.collector.set_scale_factor(window.scale_factor() as f32);
        self.renderer = Some(renderer);
        self.window = Some(window);
        Ok(())
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.init_error.is_some() {
            return;
        }

        if let Err(e) = self.create_window(event_loop) {
            error!(error = %e, "Failed to create window device");
            self.init_error = Some(e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        self.collector.handle_window_event(&event, &mut self.pending);

        if let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) {
            let _ = renderer.handle_event(window, &event);
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, exiting");
                self.closed = true;
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(new_size);
                }
            }
            WindowEvent::Focused(focused) => self.focused = focused,
            WindowEvent::Occluded(occluded) => self.occluded = occluded,
            _ => {}
        }
    }
}
