//! Retained GUI elements created by scripts and drawn with egui each frame

use std::collections::BTreeMap;
use std::fmt;

use egui::Ui;

use super::device::Frame;
use super::input::{AppEvent, GuiEventKind};

/// Identifier of a GUI element. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Window,
    Label,
    Button,
    EditBox,
}

impl ElementKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Label => "label",
            Self::Button => "button",
            Self::EditBox => "edit_box",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Window, Self::Label, Self::Button, Self::EditBox]
            .into_iter()
            .find(|kind| kind.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuiElement {
    pub id: ElementId,
    pub kind: ElementKind,
    pub text: String,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub visible: bool,
}

/// Element tree owned by the shell
#[derive(Debug, Default)]
pub struct GuiEnvironment {
    elements: BTreeMap<ElementId, GuiElement>,
    next_id: u32,
}

impl GuiEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Adds an element, returning `None` if `parent` does not exist
    pub fn add(
        &mut self,
        kind: ElementKind,
        text: impl Into<String>,
        parent: Option<ElementId>,
    ) -> Option<ElementId> {
        if let Some(parent) = parent
            && !self.elements.contains_key(&parent)
        {
            return None;
        }

        self.next_id += 1;
        let id = ElementId(self.next_id);

        if let Some(parent) = parent.and_then(|p| self.elements.get_mut(&p)) {
            parent.children.push(id);
        }

        self.elements.insert(
            id,
            GuiElement {
                id,
                kind,
                text: text.into(),
                parent,
                children: Vec::new(),
                visible: true,
            },
        );
        Some(id)
    }

    pub fn get(&self, id: ElementId) -> Option<&GuiElement> {
        self.elements.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Removes an element and its descendants, returning every removed id.
    /// The result is empty if `id` did not exist.
    pub fn remove(&mut self, id: ElementId) -> Vec<ElementId> {
        let Some(element) = self.elements.remove(&id) else {
            return Vec::new();
        };

        if let Some(parent) = element.parent.and_then(|p| self.elements.get_mut(&p)) {
            parent.children.retain(|child| *child != id);
        }

        let mut removed = vec![id];
        let mut pending = element.children;
        while let Some(child) = pending.pop() {
            if let Some(element) = self.elements.remove(&child) {
                removed.push(child);
                pending.extend(element.children);
            }
        }
        removed
    }

    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.elements.get(&id).map(|e| e.text.as_str())
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) -> bool {
        match self.elements.get_mut(&id) {
            Some(element) => {
                element.text = text.into();
                true
            }
            None => false,
        }
    }

    pub fn set_visible(&mut self, id: ElementId, visible: bool) -> bool {
        match self.elements.get_mut(&id) {
            Some(element) => {
                element.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Child at 1-based `index`
    pub fn child(&self, id: ElementId, index: usize) -> Option<ElementId> {
        let element = self.elements.get(&id)?;
        index
            .checked_sub(1)
            .and_then(|i| element.children.get(i))
            .copied()
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(&id)?.parent
    }

    pub fn roots(&self) -> Vec<ElementId> {
        self.elements
            .values()
            .filter(|e| e.parent.is_none())
            .map(|e| e.id)
            .collect()
    }

    /// Draws every visible element. Top-level windows float; other top-level
    /// elements stack in the central panel.
    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        let ctx = frame.ctx;
        let mut events = Vec::new();
        let (windows, loose): (Vec<_>, Vec<_>) = self
            .roots()
            .into_iter()
            .partition(|id| self.elements.get(id).map(|e| e.kind) == Some(ElementKind::Window));

        if !loose.is_empty() {
            egui::CentralPanel::default()
                .frame(egui::Frame::NONE)
                .show(ctx, |ui| {
                    for id in &loose {
                        self.draw_element(ui, *id, &mut events);
                    }
                });
        }

        for id in windows {
            let Some(window) = self.elements.get(&id) else {
                continue;
            };
            if !window.visible {
                continue;
            }

            let title = window.text.clone();
            let children = window.children.clone();
            egui::Window::new(title)
                .id(egui::Id::new(("gui-window", id.0)))
                .show(ctx, |ui| {
                    for child in children {
                        self.draw_element(ui, child, &mut events);
                    }
                });
        }

        for event in events {
            frame.push_event(event);
        }
    }

    fn draw_element(&mut self, ui: &mut Ui, id: ElementId, events: &mut Vec<AppEvent>) {
        let Some(element) = self.elements.get_mut(&id) else {
            return;
        };
        if !element.visible {
            return;
        }

        match element.kind {
            ElementKind::Label => {
                ui.label(element.text.as_str());
            }
            ElementKind::Button => {
                if ui.button(element.text.as_str()).clicked() {
                    events.push(AppEvent::Gui {
                        element: id,
                        kind: GuiEventKind::Clicked,
                    });
                }
            }
            ElementKind::EditBox => {
                if ui.text_edit_singleline(&mut element.text).changed() {
                    events.push(AppEvent::Gui {
                        element: id,
                        kind: GuiEventKind::TextChanged(element.text.clone()),
                    });
                }
            }
            ElementKind::Window => {
                ui.strong(element.text.as_str());
            }
        }

        let children = element.children.clone();
        if children.is_empty() {
            return;
        }

        ui.group(|ui| {
            for child in children {
                self.draw_element(ui, child, events);
            }
        });
    }
}
