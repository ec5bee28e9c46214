//! Application shell
//!
//! Owns the device, the script engine and the event bridge for the length of
//! [`Shell::run`]: creates the device, runs the startup script, then loops
//! polling events and rendering frames until the device closes or a script
//! calls `close_application`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mlua::{Value, Variadic};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::device::{Device, DeviceError, Frame};
use super::gui::GuiEnvironment;
use super::hooks::{InitContext, ShellHooks};
use super::input::AppEvent;
use crate::cli::CommandLine;
use crate::config::{AppConfig, WindowConfig};
use crate::logger::{AppLogger, LoggerHandle, ObjectType};
use crate::script::{
    ErrorFlags, EventBridge, ExitRequest, MultifileRunner, ScriptEngine, ScriptError,
    argument_type,
};

/// Errors that end a shell run before the loop starts
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("script setup error: {0}")]
    Script(#[from] ScriptError),
}

/// State scripts change through foreign functions
#[derive(Debug, Clone, Default)]
pub struct ShellSignals {
    close_requested: Rc<Cell<bool>>,
    exit_code: Rc<Cell<i32>>,
    pause_rendering: Rc<Cell<bool>>,
}

impl ShellSignals {
    pub fn close_requested(&self) -> bool {
        self.close_requested.get()
    }

    pub fn request_close(&self) {
        self.close_requested.set(true);
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code.get()
    }

    pub fn set_exit_code(&self, code: i32) {
        self.exit_code.set(code);
    }

    pub fn rendering_paused(&self) -> bool {
        self.pause_rendering.get()
    }

    pub fn set_rendering_paused(&self, paused: bool) {
        self.pause_rendering.set(paused);
    }

    /// Clears the close and pause requests of a previous run. The exit code
    /// is kept.
    pub fn begin_session(&self) {
        self.close_requested.set(false);
        self.pause_rendering.set(false);
    }
}

/// Exit code for the runner's error flags, or `None` to keep the current one
pub fn exit_code_for(flags: ErrorFlags) -> Option<i32> {
    match flags {
        ErrorFlags::None => None,
        ErrorFlags::FileNonexistent
        | ErrorFlags::EngineError
        | ErrorFlags::ImportFailed
        | ErrorFlags::RequireFailed => Some(1),
    }
}

/// Script machinery alive during one run
struct Session {
    engine: ScriptEngine,
    bridge: EventBridge,
    runner: MultifileRunner,
}

/// Application shell
pub struct Shell<H: ShellHooks> {
    config: AppConfig,
    hooks: H,
    logger: Rc<RefCell<AppLogger>>,
    signals: ShellSignals,
    gui: Rc<RefCell<GuiEnvironment>>,
}

impl<H: ShellHooks> Shell<H> {
    /// Creates a shell whose script logger follows `config.logging`
    pub fn new(config: AppConfig, hooks: H) -> Self {
        let logger = AppLogger::from_config(&config.logging).into_handle();
        Self {
            config,
            hooks,
            logger,
            signals: ShellSignals::default(),
            gui: Rc::new(RefCell::new(GuiEnvironment::new())),
        }
    }

    /// Replaces the script logger
    pub fn with_logger(mut self, logger: Rc<RefCell<AppLogger>>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn logger(&self) -> &Rc<RefCell<AppLogger>> {
        &self.logger
    }

    pub fn signals(&self) -> &ShellSignals {
        &self.signals
    }

    pub fn gui(&self) -> &Rc<RefCell<GuiEnvironment>> {
        &self.gui
    }

    pub fn exit_code(&self) -> i32 {
        self.signals.exit_code()
    }

    /// Applies command-line tokens to the configuration
    pub fn parse_args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        CommandLine::new().parse_args(args, &mut self.config, &mut self.hooks);
    }

    /// Runs the application and returns its exit code
    ///
    /// `create_device` builds the device from the window configuration; a
    /// failure there returns 1 immediately.
    pub fn run<D, F>(&mut self, create_device: F) -> i32
    where
        D: Device,
        F: FnOnce(&WindowConfig) -> Result<D, DeviceError>,
    {
        info!(profile = %self.config.profile, "Starting shell");
        self.signals.begin_session();

        let mut device = match create_device(&self.config.window) {
            Ok(device) => device,
            Err(e) => {
                error!(error = %e, "Failed to create device");
                return 1;
            }
        };
        info!(size = %device.screen_size(), driver = %device.driver(), "Device ready");

        let session = match self.start_session() {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "Failed to set up scripting");
                device.close_device();
                return 1;
            }
        };

        self.hooks.init(&mut InitContext {
            engine: &session.engine,
            config: &self.config,
            gui: &self.gui,
            screen_size: device.screen_size(),
        });

        let startup = self.config.scripts.startup.clone();
        if session.runner.run(&startup) {
            self.main_loop(&mut device, &session.bridge);
        } else {
            self.check_file_runner_error_flags(session.runner.error_flags());
        }

        device.close_device();
        drop(session);
        self.logger.borrow_mut().flush();

        let code = self.signals.exit_code();
        info!(code, "Shell finished");
        code
    }

    fn start_session(&self) -> Result<Session, ShellError> {
        let handle: LoggerHandle = self.logger.clone();
        let engine = ScriptEngine::new(handle, self.config.scripts.ignore_bad_foreign_calls)?;
        let bridge = EventBridge::new(&engine, self.gui.clone())?;
        let runner = MultifileRunner::new(&engine, &self.config.scripts.root)?;
        self.register_shell_functions(&engine)?;
        Ok(Session {
            engine,
            bridge,
            runner,
        })
    }

    fn register_shell_functions(&self, engine: &ScriptEngine) -> Result<(), ScriptError> {
        let signals = self.signals.clone();
        let reporter = engine.reporter().clone();
        engine.register_function("close_application", move |_, args: Variadic<Value>| {
            signals.request_close();
            if let [value] = args.as_slice() {
                match value {
                    Value::Integer(code) => {
                        let code = (*code).clamp(i32::MIN.into(), i32::MAX.into()) as i32;
                        signals.set_exit_code(code);
                    }
                    other => reporter.bad_argument(
                        "close_application",
                        1,
                        1,
                        ObjectType::Integer,
                        argument_type(other),
                    ),
                }
            }
            Err::<(), _>(mlua::Error::external(ExitRequest))
        })?;

        let signals = self.signals.clone();
        engine.register_function("pause_rendering", move |_, paused: Option<bool>| {
            let paused = paused.unwrap_or(true);
            debug!(paused, "Rendering pause changed");
            signals.set_rendering_paused(paused);
            Ok(())
        })?;

        Ok(())
    }

    fn main_loop<D: Device>(&mut self, device: &mut D, bridge: &EventBridge) {
        let signals = self.signals.clone();
        let gui = self.gui.clone();
        let pause_when_inactive = self.config.window.pause_when_inactive;
        let hooks = &mut self.hooks;

        while !signals.close_requested()
            && device.run(&mut |event: &AppEvent| route(bridge, hooks, event))
        {
            if signals.close_requested() {
                break;
            }

            if !device.is_window_active() && pause_when_inactive {
                device.yield_device();
                continue;
            }

            if signals.rendering_paused() {
                hooks.on_render_pause();
                continue;
            }

            let events = match device.render(&mut |frame: &mut Frame<'_>| {
                hooks.draw_all(frame, &mut gui.borrow_mut());
            }) {
                Ok(events) => events,
                Err(e) => {
                    error!(error = %e, "Render failed, stopping");
                    break;
                }
            };

            for event in &events {
                route(bridge, hooks, event);
            }
        }

        if signals.close_requested() {
            info!(code = signals.exit_code(), "Close requested by script");
        }
    }

    /// Sets exit code 1 when the startup pass failed
    fn check_file_runner_error_flags(&self, flags: ErrorFlags) {
        if let Some(code) = exit_code_for(flags) {
            warn!(?flags, "Startup script failed");
            self.signals.set_exit_code(code);
        }
    }
}

/// Offers an event to script handlers, then to the hooks
fn route<H: ShellHooks + ?Sized>(bridge: &EventBridge, hooks: &mut H, event: &AppEvent) -> bool {
    bridge.dispatch(event) || hooks.on_extra_event(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_flags_map_to_exit_codes() {
        assert_eq!(exit_code_for(ErrorFlags::None), None);
        for flags in [
            ErrorFlags::FileNonexistent,
            ErrorFlags::EngineError,
            ErrorFlags::ImportFailed,
            ErrorFlags::RequireFailed,
        ] {
            assert_eq!(exit_code_for(flags), Some(1), "{flags:?}");
        }
    }

    #[test]
    fn signals_are_shared_between_clones() {
        let signals = ShellSignals::default();
        let other = signals.clone();
        other.request_close();
        other.set_exit_code(4);
        other.set_rendering_paused(true);

        assert!(signals.close_requested());
        assert_eq!(signals.exit_code(), 4);
        assert!(signals.rendering_paused());
    }

    #[test]
    fn new_session_clears_requests_but_keeps_code() {
        let signals = ShellSignals::default();
        signals.request_close();
        signals.set_rendering_paused(true);
        signals.set_exit_code(2);

        signals.clone().begin_session();

        assert!(!signals.close_requested());
        assert!(!signals.rendering_paused());
        assert_eq!(signals.exit_code(), 2);
    }
}
