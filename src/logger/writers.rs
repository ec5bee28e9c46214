//! Ready-made [`WriteInterface`] sinks

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::WriteInterface;

/// Forwards logger lines into the tracing pipeline under the `script` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWriter;

impl WriteInterface for TracingWriter {
    fn write(&mut self, text: &str) -> bool {
        if let Some(rest) = text.strip_prefix("ERROR: ") {
            tracing::error!(target: "script", "{rest}");
        } else if let Some(rest) = text.strip_prefix("WARNING: ") {
            tracing::warn!(target: "script", "{rest}");
        } else {
            tracing::info!(target: "script", "{text}");
        }
        true
    }

    fn flush(&mut self) {}
}

/// Keeps logger lines in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryWriter {
    lines: Rc<RefCell<Vec<String>>>,
    flushes: Rc<Cell<usize>>,
}

impl MemoryWriter {
    /// Snapshot of every line written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.get()
    }

    /// Returns true if any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|line| line.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl WriteInterface for MemoryWriter {
    fn write(&mut self, text: &str) -> bool {
        self.lines.borrow_mut().push(text.to_string());
        true
    }

    fn flush(&mut self) {
        self.flushes.set(self.flushes.get() + 1);
    }
}
