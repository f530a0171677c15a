//! Developer-level ("level 6") operation traces.
//!
//! Every submitted operation emits one JSON event through [`dev6!`](crate::dev6).
//! Events go to the `nexusdriver::dev6` log target at TRACE and, when a capture
//! sink is enabled on the current thread, into that sink so tests can assert on
//! exactly what was submitted without racing a global logger.

use std::cell::RefCell;

pub use serde_json::{Value, json};

/// Pseudo-level for developer traces.
pub const DEV_LEVEL: u32 = 6;

pub const TARGET: &str = "nexusdriver::dev6";

thread_local! {
    static CAPTURE: RefCell<Option<Vec<Value>>> = const { RefCell::new(None) };
}

/// Disables capture on the owning thread when dropped.
#[must_use = "capture stops as soon as the guard is dropped"]
pub struct CaptureGuard;

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        CAPTURE.with(|c| *c.borrow_mut() = None);
    }
}

/// Starts capturing events emitted on this thread.
pub fn capture() -> CaptureGuard {
    CAPTURE.with(|c| *c.borrow_mut() = Some(Vec::new()));
    CaptureGuard
}

pub fn emit(event: Value) {
    CAPTURE.with(|c| {
        if let Some(events) = c.borrow_mut().as_mut() {
            events.push(event.clone());
        }
    });
    log::trace!(target: TARGET, "{event}");
}

/// Removes and returns the events captured so far on this thread.
pub fn take() -> Vec<Value> {
    CAPTURE.with(|c| c.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
}

/// Captured events with `"op" == op`, left in place.
pub fn events_for(op: &str) -> Vec<Value> {
    CAPTURE.with(|c| {
        c.borrow()
            .iter()
            .flatten()
            .filter(|e| e.get("op").and_then(Value::as_str) == Some(op))
            .cloned()
            .collect()
    })
}

/// Emits a developer trace event built with `serde_json::json!` syntax.
#[macro_export]
macro_rules! dev6 {
    ($($event:tt)+) => {
        $crate::utils::devlog::emit($crate::utils::devlog::json!($($event)+))
    };
}
