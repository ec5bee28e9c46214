//! Events delivered to the shell and forwarded to scripts

use crate::app::gui::ElementId;

/// Input, window and GUI events produced by a device
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Physical key pressed or released
    Key {
        key: KeyCode,
        pressed: bool,
        /// Generated by key repeat
        repeat: bool,
        modifiers: Modifiers,
    },

    /// Text produced by a key press
    Text { text: String },

    /// Cursor moved, in logical pixels
    MouseMoved { x: f32, y: f32 },

    /// Mouse button pressed or released at the cursor position
    MouseButton {
        button: MouseButton,
        pressed: bool,
        x: f32,
        y: f32,
    },

    /// Wheel scrolled, in pixels
    Wheel { dx: f32, dy: f32 },

    /// Window resized, in physical pixels
    Resized { width: u32, height: u32 },

    /// Window gained or lost focus
    Focus { focused: bool },

    /// A GUI element reported an interaction
    Gui { element: ElementId, kind: GuiEventKind },
}

impl AppEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Key { .. } => EventKind::Key,
            Self::Text { .. } => EventKind::Text,
            Self::MouseMoved { .. } => EventKind::MouseMove,
            Self::MouseButton { .. } => EventKind::MouseButton,
            Self::Wheel { .. } => EventKind::Wheel,
            Self::Resized { .. } => EventKind::Resize,
            Self::Focus { .. } => EventKind::Focus,
            Self::Gui { .. } => EventKind::Gui,
        }
    }

    /// Element a GUI event belongs to
    pub fn element(&self) -> Option<ElementId> {
        match self {
            Self::Gui { element, .. } => Some(*element),
            _ => None,
        }
    }
}

/// GUI interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuiEventKind {
    Clicked,
    TextChanged(String),
}

impl GuiEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clicked => "clicked",
            Self::TextChanged(_) => "text_changed",
        }
    }
}

/// Event category, as named by scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Key,
    Text,
    MouseMove,
    MouseButton,
    Wheel,
    Resize,
    Focus,
    Gui,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        Self::Key,
        Self::Text,
        Self::MouseMove,
        Self::MouseButton,
        Self::Wheel,
        Self::Resize,
        Self::Focus,
        Self::Gui,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Text => "text",
            Self::MouseMove => "mouse_move",
            Self::MouseButton => "mouse_button",
            Self::Wheel => "wheel",
            Self::Resize => "resize",
            Self::Focus => "focus",
            Self::Gui => "gui",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Keyboard modifiers held during a key event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Mouse button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

impl MouseButton {
    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
            Self::Other => "other",
        }
    }
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Left => Self::Left,
            winit::event::MouseButton::Right => Self::Right,
            winit::event::MouseButton::Middle => Self::Middle,
            _ => Self::Other,
        }
    }
}

/// Key code handed to scripts by its `Debug` name (`"A"`, `"Escape"`, `"Num1"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Space,
    Enter,
    Escape,
    Backspace,
    Tab,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Shift,
    Control,
    Alt,

    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,

    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    Left,
    Right,
    Up,
    Down,

    Other,
}

impl KeyCode {
    pub fn name(self) -> String {
        format!("{self:?}")
    }
}

impl From<winit::keyboard::KeyCode> for KeyCode {
    fn from(key: winit::keyboard::KeyCode) -> Self {
        use winit::keyboard::KeyCode as WK;
        match key {
            WK::Space => Self::Space,
            WK::Enter | WK::NumpadEnter => Self::Enter,
            WK::Escape => Self::Escape,
            WK::Backspace => Self::Backspace,
            WK::Tab => Self::Tab,
            WK::Delete => Self::Delete,
            WK::Insert => Self::Insert,
            WK::Home => Self::Home,
            WK::End => Self::End,
            WK::PageUp => Self::PageUp,
            WK::PageDown => Self::PageDown,
            WK::ShiftLeft | WK::ShiftRight => Self::Shift,
            WK::ControlLeft | WK::ControlRight => Self::Control,
            WK::AltLeft | WK::AltRight => Self::Alt,

            WK::KeyA => Self::A,
            WK::KeyB => Self::B,
            WK::KeyC => Self::C,
            WK::KeyD => Self::D,
            WK::KeyE => Self::E,
            WK::KeyF => Self::F,
            WK::KeyG => Self::G,
            WK::KeyH => Self::H,
            WK::KeyI => Self::I,
            WK::KeyJ => Self::J,
            WK::KeyK => Self::K,
            WK::KeyL => Self::L,
            WK::KeyM => Self::M,
            WK::KeyN => Self::N,
            WK::KeyO => Self::O,
            WK::KeyP => Self::P,
            WK::KeyQ => Self::Q,
            WK::KeyR => Self::R,
            WK::KeyS => Self::S,
            WK::KeyT => Self::T,
            WK::KeyU => Self::U,
            WK::KeyV => Self::V,
            WK::KeyW => Self::W,
            WK::KeyX => Self::X,
            WK::KeyY => Self::Y,
            WK::KeyZ => Self::Z,

            WK::Digit0 | WK::Numpad0 => Self::Num0,
            WK::Digit1 | WK::Numpad1 => Self::Num1,
            WK::Digit2 | WK::Numpad2 => Self::Num2,
            WK::Digit3 | WK::Numpad3 => Self::Num3,
            WK::Digit4 | WK::Numpad4 => Self::Num4,
            WK::Digit5 | WK::Numpad5 => Self::Num5,
            WK::Digit6 | WK::Numpad6 => Self::Num6,
            WK::Digit7 | WK::Numpad7 => Self::Num7,
            WK::Digit8 | WK::Numpad8 => Self::Num8,
            WK::Digit9 | WK::Numpad9 => Self::Num9,

            WK::F1 => Self::F1,
            WK::F2 => Self::F2,
            WK::F3 => Self::F3,
            WK::F4 => Self::F4,
            WK::F5 => Self::F5,
            WK::F6 => Self::F6,
            WK::F7 => Self::F7,
            WK::F8 => Self::F8,
            WK::F9 => Self::F9,
            WK::F10 => Self::F10,
            WK::F11 => Self::F11,
            WK::F12 => Self::F12,

            WK::ArrowLeft => Self::Left,
            WK::ArrowRight => Self::Right,
            WK::ArrowUp => Self::Up,
            WK::ArrowDown => Self::Down,

            _ => Self::Other,
        }
    }
}
