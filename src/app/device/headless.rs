//! Windowless device replaying prepared event batches

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{Device, DeviceError, Frame};
use crate::app::input::{AppEvent, EventReceiver};
use crate::config::{DriverType, ScreenSize, WindowConfig};

/// Counters shared between a [`HeadlessDevice`] and its observer
#[derive(Debug, Clone, Default)]
pub struct HeadlessProbe {
    polls: Rc<Cell<u32>>,
    frames: Rc<Cell<u32>>,
    yields: Rc<Cell<u32>>,
    closed: Rc<Cell<bool>>,
}

impl HeadlessProbe {
    /// Calls to [`Device::run`] that delivered a batch
    pub fn polls(&self) -> u32 {
        self.polls.get()
    }

    pub fn frames(&self) -> u32 {
        self.frames.get()
    }

    pub fn yields(&self) -> u32 {
        self.yields.get()
    }

    pub fn closed(&self) -> bool {
        self.closed.get()
    }
}

fn bump(counter: &Cell<u32>) {
    counter.set(counter.get() + 1);
}

/// Device without a window
///
/// Each [`Device::run`] delivers the next queued batch of events and reports
/// no more events once the queue is empty. Focus events in a batch toggle
/// [`Device::is_window_active`]. Frames run egui without painting.
pub struct HeadlessDevice {
    config: WindowConfig,
    batches: VecDeque<Vec<AppEvent>>,
    ctx: egui::Context,
    active: bool,
    closed: bool,
    probe: HeadlessProbe,
}

impl HeadlessDevice {
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            config: config.clone(),
            batches: VecDeque::new(),
            ctx: egui::Context::default(),
            active: true,
            closed: false,
            probe: HeadlessProbe::default(),
        }
    }

    /// Queues `count` empty batches, i.e. `count` loop iterations
    pub fn with_frames(mut self, count: usize) -> Self {
        self.batches
            .extend(std::iter::repeat_with(Vec::new).take(count));
        self
    }

    /// Queues one batch of events
    pub fn with_batch(mut self, batch: Vec<AppEvent>) -> Self {
        self.batches.push_back(batch);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn probe(&self) -> HeadlessProbe {
        self.probe.clone()
    }
}

impl Device for HeadlessDevice {
    fn run(&mut self, receiver: &mut dyn EventReceiver) -> bool {
        if self.closed {
            return false;
        }

        let Some(batch) = self.batches.pop_front() else {
            return false;
        };
        bump(&self.probe.polls);

        for event in &batch {
            if let AppEvent::Focus { focused } = event {
                self.active = *focused;
            }
            receiver.on_event(event);
        }

        !self.closed
    }

    fn is_window_active(&self) -> bool {
        self.active
    }

    fn yield_device(&mut self) {
        bump(&self.probe.yields);
    }

    fn render(
        &mut self,
        draw: &mut dyn FnMut(&mut Frame<'_>),
    ) -> Result<Vec<AppEvent>, DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }

        let size = self.screen_size();
        let input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(size.width as f32, size.height as f32),
            )),
            ..Default::default()
        };

        let mut events = Vec::new();
        let _ = self.ctx.run(input, |ctx| {
            let mut frame = Frame::new(ctx, size);
            draw(&mut frame);
            events = frame.into_events();
        });

        bump(&self.probe.frames);
        Ok(events)
    }

    fn close_device(&mut self) {
        self.closed = true;
        self.probe.closed.set(true);
    }

    fn screen_size(&self) -> ScreenSize {
        self.config.screen_size
    }

    fn driver(&self) -> DriverType {
        self.config.driver
    }
}
