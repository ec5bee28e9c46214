//! Event bridge between the device and Lua
//!
//! Scripts register handlers with `on_event(kind, fn)` or
//! `gui.watch(element, fn)`. The shell hands every device event to
//! [`EventBridge::dispatch`], which converts it to a table and calls the
//! matching handlers in registration order until one returns `true`.
//!
//! The bridge also exposes the GUI environment as the global `gui` table.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::{Function, Lua, MetaMethod, Table, UserData, UserDataMethods, UserDataRef, Value};
use tracing::{debug, trace};

use super::engine::{
    Reporter, ScriptEngine, ScriptError, create_foreign_function, is_exit_request, object_type_of,
};
use crate::app::gui::{ElementId, ElementKind, GuiEnvironment};
use crate::app::input::{AppEvent, EventKind, GuiEventKind};
use crate::logger::{EngineMessage, LogLevel, LogMessage, ObjectType};

use super::GUI_ELEMENT_TYPE;

/// Custom log codes raised by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMessageCode {
    ChildNotFound,
    ElementIsEmpty,
    ElementCannotBeCreated,
    WatcherWrongConstructionArgs,
    ElementLacksParent,
}

impl BridgeMessageCode {
    const BASE: u32 = 0x100;
    const ALL: [Self; 5] = [
        Self::ChildNotFound,
        Self::ElementIsEmpty,
        Self::ElementCannotBeCreated,
        Self::WatcherWrongConstructionArgs,
        Self::ElementLacksParent,
    ];

    pub fn code(self) -> u32 {
        Self::BASE + self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChildNotFound => "Bridge: GUI element child not found",
            Self::ElementIsEmpty => "Bridge: GUI element is empty",
            Self::ElementCannotBeCreated => "Bridge: GUI element cannot be created",
            Self::WatcherWrongConstructionArgs => "Bridge: GUI watcher wrong construction arguments",
            Self::ElementLacksParent => "Bridge: GUI element lacks parent",
        }
    }
}

/// Script-side reference to a GUI element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuiHandle(pub ElementId);

impl UserData for GuiHandle {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("id", |_, this, ()| Ok(this.0.0));
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("GUI element {}", this.0))
        });
        methods.add_meta_method(MetaMethod::Eq, |_, this, other: UserDataRef<GuiHandle>| {
            Ok(this.0 == other.0)
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerFilter {
    Kind(EventKind),
    Any,
    Element(ElementId),
}

impl HandlerFilter {
    fn matches(self, event: &AppEvent) -> bool {
        match self {
            Self::Kind(kind) => event.kind() == kind,
            Self::Any => true,
            Self::Element(id) => event.element() == Some(id),
        }
    }
}

struct Handler {
    id: i64,
    filter: HandlerFilter,
    function: Function,
}

/// Handler table, kept in the Lua state's app data
#[derive(Default)]
struct HandlerRegistry {
    handlers: Vec<Handler>,
    next_id: i64,
}

impl HandlerRegistry {
    fn add(&mut self, filter: HandlerFilter, function: Function) -> i64 {
        self.next_id += 1;
        self.handlers.push(Handler {
            id: self.next_id,
            filter,
            function,
        });
        self.next_id
    }

    fn remove(&mut self, id: i64) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|h| h.id != id);
        self.handlers.len() != before
    }

    /// Drops the watchers of removed elements
    fn remove_watchers(&mut self, elements: &[ElementId]) -> usize {
        let before = self.handlers.len();
        self.handlers.retain(|h| match h.filter {
            HandlerFilter::Element(id) => !elements.contains(&id),
            _ => true,
        });
        before - self.handlers.len()
    }
}

fn add_handler(lua: &Lua, filter: HandlerFilter, function: Function) -> mlua::Result<i64> {
    let mut registry = lua
        .app_data_mut::<HandlerRegistry>()
        .ok_or_else(|| mlua::Error::runtime("event bridge is not installed"))?;
    Ok(registry.add(filter, function))
}

/// Forwards device events to script handlers and exposes the GUI to scripts
pub struct EventBridge {
    lua: Lua,
    reporter: Reporter,
    gui: Rc<RefCell<GuiEnvironment>>,
}

impl EventBridge {
    /// Installs `on_event`, `remove_handler` and the `gui` table on `engine`
    pub fn new(engine: &ScriptEngine, gui: Rc<RefCell<GuiEnvironment>>) -> Result<Self, ScriptError> {
        let bridge = Self {
            lua: engine.lua().clone(),
            reporter: engine.reporter().clone(),
            gui,
        };
        bridge.lua.set_app_data(HandlerRegistry::default());
        bridge.install().map_err(|source| ScriptError::Lua {
            chunk: "event bridge".to_string(),
            source,
        })?;
        Ok(bridge)
    }

    pub fn gui(&self) -> &Rc<RefCell<GuiEnvironment>> {
        &self.gui
    }

    pub fn handler_count(&self) -> usize {
        self.lua
            .app_data_ref::<HandlerRegistry>()
            .map_or(0, |registry| registry.handlers.len())
    }

    fn install(&self) -> mlua::Result<()> {
        let lua = &self.lua;
        let globals = lua.globals();

        let reporter = self.reporter.clone();
        globals.set(
            "on_event",
            create_foreign_function(lua, &self.reporter, move |lua, (kind, function): (String, Function)| {
                let filter = match kind.as_str() {
                    "any" => HandlerFilter::Any,
                    name => match EventKind::from_name(name) {
                        Some(kind) => HandlerFilter::Kind(kind),
                        None => {
                            warn_code(&reporter, BridgeMessageCode::WatcherWrongConstructionArgs);
                            return Ok(None);
                        }
                    },
                };
                add_handler(lua, filter, function).map(Some)
            })?,
        )?;

        globals.set(
            "remove_handler",
            create_foreign_function(lua, &self.reporter, |lua, id: i64| {
                Ok(lua
                    .app_data_mut::<HandlerRegistry>()
                    .is_some_and(|mut registry| registry.remove(id)))
            })?,
        )?;

        globals.set("gui", self.gui_table()?)?;
        Ok(())
    }

    fn gui_table(&self) -> mlua::Result<Table> {
        let lua = &self.lua;
        let table = lua.create_table()?;

        for kind in [
            ElementKind::Window,
            ElementKind::Label,
            ElementKind::Button,
            ElementKind::EditBox,
        ] {
            let gui = self.gui.clone();
            let reporter = self.reporter.clone();
            table.set(
                kind.name(),
                create_foreign_function(lua, &self.reporter,
                    move |_, (text, parent): (Option<String>, Option<UserDataRef<GuiHandle>>)| {
                        let parent = parent.map(|p| p.0);
                        Ok(create_element(&gui, &reporter, kind, text, parent))
                    },
                )?,
            )?;
        }

        let gui = self.gui.clone();
        let reporter = self.reporter.clone();
        table.set(
            "create",
            create_foreign_function(lua, &self.reporter,
                move |_,
                      (kind, text, parent): (
                    String,
                    Option<String>,
                    Option<UserDataRef<GuiHandle>>,
                )| {
                    let Some(kind) = ElementKind::from_name(&kind) else {
                        warn_code(&reporter, BridgeMessageCode::ElementCannotBeCreated);
                        return Ok(None);
                    };
                    let parent = parent.map(|p| p.0);
                    Ok(create_element(&gui, &reporter, kind, text, parent))
                },
            )?,
        )?;

        let gui = self.gui.clone();
        let reporter = self.reporter.clone();
        table.set(
            "set_text",
            create_foreign_function(lua, &self.reporter,
                move |_, (element, text): (UserDataRef<GuiHandle>, String)| {
                    let done = gui.borrow_mut().set_text(element.0, text);
                    if !done {
                        warn_code(&reporter, BridgeMessageCode::ElementIsEmpty);
                    }
                    Ok(done)
                },
            )?,
        )?;

        let gui = self.gui.clone();
        let reporter = self.reporter.clone();
        table.set(
            "get_text",
            create_foreign_function(lua, &self.reporter, move |_, element: UserDataRef<GuiHandle>| {
                let text = gui.borrow().text(element.0).map(str::to_string);
                if text.is_none() {
                    warn_code(&reporter, BridgeMessageCode::ElementIsEmpty);
                }
                Ok(text)
            })?,
        )?;

        let gui = self.gui.clone();
        let reporter = self.reporter.clone();
        table.set(
            "set_visible",
            create_foreign_function(lua, &self.reporter,
                move |_, (element, visible): (UserDataRef<GuiHandle>, bool)| {
                    let done = gui.borrow_mut().set_visible(element.0, visible);
                    if !done {
                        warn_code(&reporter, BridgeMessageCode::ElementIsEmpty);
                    }
                    Ok(done)
                },
            )?,
        )?;

        let gui = self.gui.clone();
        let reporter = self.reporter.clone();
        table.set(
            "remove",
            create_foreign_function(lua, &self.reporter, move |lua, element: UserDataRef<GuiHandle>| {
                let removed = gui.borrow_mut().remove(element.0);
                if removed.is_empty() {
                    warn_code(&reporter, BridgeMessageCode::ElementIsEmpty);
                    return Ok(false);
                }
                if let Some(mut registry) = lua.app_data_mut::<HandlerRegistry>() {
                    let dropped = registry.remove_watchers(&removed);
                    trace!(elements = removed.len(), watchers = dropped, "Removed GUI elements");
                }
                Ok(true)
            })?,
        )?;

        let gui = self.gui.clone();
        let reporter = self.reporter.clone();
        table.set(
            "child",
            create_foreign_function(lua, &self.reporter,
                move |_, (element, index): (UserDataRef<GuiHandle>, usize)| {
                    let gui = gui.borrow();
                    if !gui.contains(element.0) {
                        warn_code(&reporter, BridgeMessageCode::ElementIsEmpty);
                        return Ok(None);
                    }
                    let child = gui.child(element.0, index).map(GuiHandle);
                    if child.is_none() {
                        warn_code(&reporter, BridgeMessageCode::ChildNotFound);
                    }
                    Ok(child)
                },
            )?,
        )?;

        let gui = self.gui.clone();
        let reporter = self.reporter.clone();
        table.set(
            "parent",
            create_foreign_function(lua, &self.reporter, move |_, element: UserDataRef<GuiHandle>| {
                let gui = gui.borrow();
                if !gui.contains(element.0) {
                    warn_code(&reporter, BridgeMessageCode::ElementIsEmpty);
                    return Ok(None);
                }
                let parent = gui.parent(element.0).map(GuiHandle);
                if parent.is_none() {
                    warn_code(&reporter, BridgeMessageCode::ElementLacksParent);
                }
                Ok(parent)
            })?,
        )?;

        table.set(
            "same",
            create_foreign_function(lua, &self.reporter,
                |_, (a, b): (Option<UserDataRef<GuiHandle>>, Option<UserDataRef<GuiHandle>>)| {
                    Ok(matches!((a, b), (Some(a), Some(b)) if a.0 == b.0))
                },
            )?,
        )?;

        let gui = self.gui.clone();
        let reporter = self.reporter.clone();
        table.set(
            "watch",
            create_foreign_function(lua, &self.reporter, move |lua, (element, function): (Value, Value)| {
                let element = match &element {
                    Value::UserData(ud) => ud.borrow::<GuiHandle>().ok().map(|h| h.0),
                    _ => None,
                };
                let (Some(element), Value::Function(function)) = (element, function) else {
                    warn_code(&reporter, BridgeMessageCode::WatcherWrongConstructionArgs);
                    return Ok(None);
                };
                if !gui.borrow().contains(element) {
                    warn_code(&reporter, BridgeMessageCode::ElementIsEmpty);
                    return Ok(None);
                }
                add_handler(lua, HandlerFilter::Element(element), function).map(Some)
            })?,
        )?;

        Ok(table)
    }

    /// Offers `event` to the script handlers. Returns true if one consumed it.
    ///
    /// Handler failures are reported and do not stop the dispatch. An exit
    /// request from a handler consumes the event.
    pub fn dispatch(&self, event: &AppEvent) -> bool {
        let handlers: Vec<Function> = match self.lua.app_data_ref::<HandlerRegistry>() {
            Some(registry) => registry
                .handlers
                .iter()
                .filter(|h| h.filter.matches(event))
                .map(|h| h.function.clone())
                .collect(),
            None => return false,
        };

        if handlers.is_empty() {
            return false;
        }

        let table = match event_table(&self.lua, event) {
            Ok(table) => table,
            Err(e) => {
                self.reporter.report("event bridge", &e);
                return false;
            }
        };

        trace!(kind = event.kind().name(), handlers = handlers.len(), "Dispatching event");
        for handler in handlers {
            match handler.call::<Value>(table.clone()) {
                Ok(Value::Boolean(true)) => return true,
                Ok(_) => {}
                Err(e) if is_exit_request(&e) => {
                    debug!("Event handler requested exit");
                    return true;
                }
                Err(e) => {
                    self.reporter
                        .message(LogMessage::new(LogLevel::Error, EngineMessage::HandlerFailed));
                    self.reporter.report("event handler", &e);
                }
            }
        }
        false
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        self.lua.remove_app_data::<HandlerRegistry>();
    }
}

fn warn_code(reporter: &Reporter, code: BridgeMessageCode) {
    reporter.message(LogMessage::custom(LogLevel::Warning, code.code()));
}

fn create_element(
    gui: &RefCell<GuiEnvironment>,
    reporter: &Reporter,
    kind: ElementKind,
    text: Option<String>,
    parent: Option<ElementId>,
) -> Option<GuiHandle> {
    let created = gui
        .borrow_mut()
        .add(kind, text.unwrap_or_default(), parent)
        .map(GuiHandle);
    if created.is_none() {
        warn_code(reporter, BridgeMessageCode::ElementIsEmpty);
    }
    created
}

/// Lua table describing `event`
pub fn event_table(lua: &Lua, event: &AppEvent) -> mlua::Result<Table> {
    let table = lua.create_table()?;
    table.set("type", event.kind().name())?;

    match event {
        AppEvent::Key {
            key,
            pressed,
            repeat,
            modifiers,
        } => {
            table.set("key", key.name())?;
            table.set("pressed", *pressed)?;
            table.set("repeat", *repeat)?;
            table.set("shift", modifiers.shift)?;
            table.set("ctrl", modifiers.ctrl)?;
            table.set("alt", modifiers.alt)?;
            table.set("meta", modifiers.meta)?;
        }
        AppEvent::Text { text } => table.set("text", text.as_str())?,
        AppEvent::MouseMoved { x, y } => {
            table.set("x", *x)?;
            table.set("y", *y)?;
        }
        AppEvent::MouseButton {
            button,
            pressed,
            x,
            y,
        } => {
            table.set("button", button.name())?;
            table.set("pressed", *pressed)?;
            table.set("x", *x)?;
            table.set("y", *y)?;
        }
        AppEvent::Wheel { dx, dy } => {
            table.set("dx", *dx)?;
            table.set("dy", *dy)?;
        }
        AppEvent::Resized { width, height } => {
            table.set("width", *width)?;
            table.set("height", *height)?;
        }
        AppEvent::Focus { focused } => table.set("focused", *focused)?,
        AppEvent::Gui { element, kind } => {
            table.set("element", GuiHandle(*element))?;
            table.set("action", kind.name())?;
            if let GuiEventKind::TextChanged(text) = kind {
                table.set("text", text.as_str())?;
            }
        }
    }

    Ok(table)
}

/// Object type of a value handed to a foreign function
pub fn argument_type(value: &Value) -> Option<ObjectType> {
    match value {
        Value::UserData(ud) if ud.is::<GuiHandle>() => Some(ObjectType::Custom(GUI_ELEMENT_TYPE)),
        other => object_type_of(other),
    }
}
