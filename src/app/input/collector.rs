//! Translation of winit window events into [`AppEvent`]s

use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::PhysicalKey;

use super::events::{AppEvent, KeyCode, Modifiers};

/// Pixels per wheel line
const LINE_HEIGHT: f32 = 20.0;

/// Turns raw winit events into [`AppEvent`]s, tracking the state
/// winit reports separately (cursor position, modifiers, DPI scale)
pub struct InputCollector {
    cursor: [f32; 2],
    modifiers: Modifiers,
    scale_factor: f32,
}

impl InputCollector {
    pub fn new() -> Self {
        Self {
            cursor: [0.0, 0.0],
            modifiers: Modifiers::default(),
            scale_factor: 1.0,
        }
    }

    /// Update scale factor (DPI scaling)
    pub fn set_scale_factor(&mut self, scale_factor: f32) {
        self.scale_factor = scale_factor;
    }

    /// Last cursor position in logical pixels
    pub fn cursor(&self) -> [f32; 2] {
        self.cursor
    }

    /// Translates one window event, appending the results to `out`
    pub fn handle_window_event(&mut self, event: &WindowEvent, out: &mut Vec<AppEvent>) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = [
                    position.x as f32 / self.scale_factor,
                    position.y as f32 / self.scale_factor,
                ];
                out.push(AppEvent::MouseMoved {
                    x: self.cursor[0],
                    y: self.cursor[1],
                });
            }

            WindowEvent::MouseInput { state, button, .. } => {
                out.push(AppEvent::MouseButton {
                    button: (*button).into(),
                    pressed: *state == ElementState::Pressed,
                    x: self.cursor[0],
                    y: self.cursor[1],
                });
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (*x * LINE_HEIGHT, *y * LINE_HEIGHT),
                    MouseScrollDelta::PixelDelta(pos) => (pos.x as f32, pos.y as f32),
                };
                out.push(AppEvent::Wheel { dx, dy });
            }

            WindowEvent::ModifiersChanged(modifiers_state) => {
                self.modifiers = Modifiers {
                    shift: modifiers_state.state().shift_key(),
                    ctrl: modifiers_state.state().control_key(),
                    alt: modifiers_state.state().alt_key(),
                    meta: modifiers_state.state().super_key(),
                };
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let key = match event.physical_key {
                    PhysicalKey::Code(code) => KeyCode::from(code),
                    PhysicalKey::Unidentified(_) => KeyCode::Other,
                };
                let pressed = event.state == ElementState::Pressed;

                out.push(AppEvent::Key {
                    key,
                    pressed,
                    repeat: event.repeat,
                    modifiers: self.modifiers,
                });

                if pressed
                    && let Some(text) = event.text.as_ref()
                    && !text.chars().all(char::is_control)
                {
                    out.push(AppEvent::Text {
                        text: text.to_string(),
                    });
                }
            }

            WindowEvent::Resized(size) => {
                out.push(AppEvent::Resized {
                    width: size.width,
                    height: size.height,
                });
            }

            WindowEvent::Focused(focused) => {
                out.push(AppEvent::Focus { focused: *focused });
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.set_scale_factor(*scale_factor as f32);
            }

            _ => {}
        }
    }
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::new()
    }
}
