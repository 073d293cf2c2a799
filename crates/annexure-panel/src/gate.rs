//! Pending-work gate shared by all panels.
//!
//! A non-negative count of outstanding uploads. While it is above zero the
//! hosting form's save affordance is published as disabled with a busy
//! label; when it drops back to zero the control that was showing before the
//! first upload started is restored verbatim.
//!
//! ```text
//!   count 0 ──acquire──▶ 1  snapshot idle control, publish busy
//!   count n ──acquire──▶ n+1
//!   count 1 ──release──▶ 0  publish snapshot
//!   count 0 ──release──▶ 0  (floored)
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::constants::{BUSY_LABEL, DEFAULT_SAVE_LABEL};

/// State of the hosting form's save affordance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveControl {
    pub enabled: bool,
    pub label: String,
}

impl SaveControl {
    pub fn enabled(label: impl Into<String>) -> Self {
        Self { enabled: true, label: label.into() }
    }

    fn busy() -> Self {
        Self { enabled: false, label: BUSY_LABEL.to_string() }
    }
}

impl Default for SaveControl {
    fn default() -> Self {
        Self::enabled(DEFAULT_SAVE_LABEL)
    }
}

#[derive(Debug)]
struct GateState {
    count: usize,
    /// The control to show when idle; captured on 0 → 1.
    idle: SaveControl,
}

#[derive(Debug)]
struct GateInner {
    state: Mutex<GateState>,
    control: watch::Sender<SaveControl>,
}

/// Shared pending-upload counter. Clone to hand to another panel.
#[derive(Debug, Clone)]
pub struct PendingWork {
    inner: Arc<GateInner>,
}

impl Default for PendingWork {
    fn default() -> Self {
        Self::new(SaveControl::default())
    }
}

impl PendingWork {
    pub fn new(idle: SaveControl) -> Self {
        let (control, _) = watch::channel(idle.clone());
        Self {
            inner: Arc::new(GateInner {
                state: Mutex::new(GateState { count: 0, idle }),
                control,
            }),
        }
    }

    /// Count one upload as started; released when the guard drops.
    pub fn acquire(&self) -> PendingGuard {
        self.increment();
        PendingGuard { gate: self.clone() }
    }

    pub fn increment(&self) {
        let mut state = self.inner.state.lock();
        state.count += 1;
        if state.count == 1 {
            state.idle = self.inner.control.borrow().clone();
            self.inner.control.send_replace(SaveControl::busy());
            tracing::debug!("pending work: save disabled");
        }
    }

    /// Count one upload as finished. Never goes below zero.
    pub fn decrement(&self) {
        let mut state = self.inner.state.lock();
        match state.count {
            0 => {}
            1 => {
                state.count = 0;
                self.inner.control.send_replace(state.idle.clone());
                tracing::debug!("pending work: save restored");
            }
            _ => state.count -= 1,
        }
    }

    pub fn count(&self) -> usize {
        self.inner.state.lock().count
    }

    pub fn is_busy(&self) -> bool {
        self.count() > 0
    }

    /// The save affordance as it should currently be shown.
    pub fn save_control(&self) -> SaveControl {
        self.inner.control.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveControl> {
        self.inner.control.subscribe()
    }

    /// Change the idle control (e.g. the host relabels or disables its save
    /// button). Shown immediately when idle, otherwise on restore.
    pub fn set_idle_control(&self, idle: SaveControl) {
        let mut state = self.inner.state.lock();
        if state.count == 0 {
            self.inner.control.send_replace(idle.clone());
        }
        state.idle = idle;
    }
}

/// Releases one unit of pending work when dropped.
#[derive(Debug)]
#[must_use = "pending work is released as soon as the guard is dropped"]
pub struct PendingGuard {
    gate: PendingWork,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.gate.decrement();
    }
}
