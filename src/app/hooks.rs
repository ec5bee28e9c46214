//! Customization points of the shell

use std::cell::RefCell;
use std::rc::Rc;

use super::device::Frame;
use super::gui::GuiEnvironment;
use super::input::AppEvent;
use crate::config::{AppConfig, ScreenSize};
use crate::script::ScriptEngine;

/// Everything [`ShellHooks::init`] may set up before the startup script runs
pub struct InitContext<'a> {
    pub engine: &'a ScriptEngine,
    pub config: &'a AppConfig,
    pub gui: &'a Rc<RefCell<GuiEnvironment>>,
    pub screen_size: ScreenSize,
}

/// Strategy object the shell calls into. Every method has a default.
pub trait ShellHooks {
    /// Called for command-line tokens the shell does not know.
    /// Return false to stop parsing.
    fn parse_command_arg(&mut self, _arg: &str, _config: &mut AppConfig) -> bool {
        true
    }

    /// Screen size used when `--screen-size` gets an unknown name
    fn initial_screen_size(&self) -> ScreenSize {
        ScreenSize::new(1024, 768)
    }

    /// Called once the device and script engine exist, before the startup script
    fn init(&mut self, _ctx: &mut InitContext<'_>) {}

    /// Called each loop iteration while scripts keep rendering paused
    fn on_render_pause(&mut self) {}

    /// Draws one frame
    fn draw_all(&mut self, frame: &mut Frame<'_>, gui: &mut GuiEnvironment) {
        gui.draw(frame);
    }

    /// Receives events no script handler consumed. Return true if handled.
    fn on_extra_event(&mut self, _event: &AppEvent) -> bool {
        false
    }
}

/// Hooks with every default behaviour
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHooks;

impl ShellHooks for DefaultHooks {}
