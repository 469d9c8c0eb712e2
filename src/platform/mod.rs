//! Platform abstraction layer
//!
//! The session only talks to the outside world through these seams:
//! - Rendering positions
//! - Querying the current bounded area
//! - Scheduling (and cancelling) the next tick
//! - Storage (LocalStorage on web, see [`web`])

#[cfg(target_arch = "wasm32")]
pub mod web;

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::sim::{Body, Bounds};

/// Draws both squares. Called once per completed tick; must not block.
pub trait Renderer {
    fn render(&mut self, primary: &Body, secondary: &Body);
}

/// Reports the current size of the bounded area (may change between calls).
pub trait BoundsProvider {
    fn current_bounds(&self) -> Bounds;
}

/// Identifies one scheduled tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

/// One-shot delayed tick primitive (timer / animation-frame equivalent)
pub trait Scheduler {
    /// Request a tick `delay_ms` from now
    fn schedule(&mut self, delay_ms: u32) -> TickHandle;
    /// Drop a pending tick; unknown handles are ignored
    fn cancel(&mut self, handle: TickHandle);
}

/// A scheduled tick waiting for its driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTick {
    pub handle: TickHandle,
    pub delay_ms: u32,
}

/// Scheduler that queues ticks for an external driver loop.
///
/// The driver pops the next tick, waits `delay_ms` (or not, in tests) and
/// hands the handle back to the session.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    queue: VecDeque<PendingTick>,
    next_id: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&mut self) -> Option<PendingTick> {
        self.queue.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay_ms: u32) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.queue.push_back(PendingTick { handle, delay_ms });
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.queue.retain(|t| t.handle != handle);
    }
}

/// Bounds that never change
#[derive(Debug, Clone, Copy)]
pub struct FixedBounds(pub Bounds);

impl BoundsProvider for FixedBounds {
    fn current_bounds(&self) -> Bounds {
        self.0
    }
}

/// Bounds a test or host can resize through a shared handle
#[derive(Debug, Clone)]
pub struct SharedBounds {
    width: Rc<Cell<f32>>,
    height: Rc<Cell<f32>>,
}

impl SharedBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: Rc::new(Cell::new(width)),
            height: Rc::new(Cell::new(height)),
        }
    }

    pub fn resize(&self, width: f32, height: f32) {
        self.width.set(width);
        self.height.set(height);
    }
}

impl BoundsProvider for SharedBounds {
    fn current_bounds(&self) -> Bounds {
        Bounds::new(self.width.get(), self.height.get())
    }
}

/// Renderer that draws nothing
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _primary: &Body, _secondary: &Body) {}
}

/// Renderer that writes positions to the debug log
#[derive(Debug, Default)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&mut self, primary: &Body, secondary: &Body) {
        log::debug!(
            "blue=({:.1}, {:.1}) orange=({:.1}, {:.1})",
            primary.position.x,
            primary.position.y,
            secondary.position.x,
            secondary.position.y
        );
    }
}
