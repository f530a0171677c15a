//! Single-assignment asynchronous result container.
//!
//! A [`Completion`] is shared between the producer (an executor) and any number of
//! consumers. The first call to [`Completion::complete`] wins; later calls are
//! ignored. Continuations registered with [`Completion::register`] run exactly
//! once each, in registration order, on whichever thread completes the
//! primitive (or on the registering thread if the result is already there).

use crate::errors::DriverError;
use parking_lot::Mutex;
use std::future::{Future, IntoFuture};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::Arc;

/// Value XOR error, as seen by every continuation.
pub type Outcome<V> = Result<V, DriverError>;

type Continuation<V> = Box<dyn FnOnce(Outcome<V>) + Send + 'static>;

struct State<V> {
    outcome: Option<Outcome<V>>,
    pending: Vec<Continuation<V>>,
    // Set while the completing thread drains `pending`. Registrations arriving
    // in that window are queued behind the ones already waiting.
    dispatching: bool,
}

pub struct Completion<V> {
    state: Arc<Mutex<State<V>>>,
}

impl<V> Clone for Completion<V> {
    fn clone(&self) -> Self {
        Self { state: Arc::clone(&self.state) }
    }
}

impl<V> std::fmt::Debug for Completion<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Completion")
            .field("done", &state.outcome.is_some())
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl<V: Clone + Send + 'static> Default for Completion<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + 'static> Completion<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State { outcome: None, pending: Vec::new(), dispatching: false })),
        }
    }

    /// An already-succeeded primitive.
    #[must_use]
    pub fn ready(value: V) -> Self {
        let c = Self::new();
        c.complete(Ok(value));
        c
    }

    /// An already-failed primitive.
    #[must_use]
    pub fn failed(err: DriverError) -> Self {
        let c = Self::new();
        c.complete(Err(err));
        c
    }

    /// Sets the outcome if none is set yet. Returns `false` (and does nothing) otherwise.
    pub fn complete(&self, outcome: Outcome<V>) -> bool {
        {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(outcome.clone());
            state.dispatching = true;
        }
        self.dispatch(&outcome);
        true
    }

    pub fn succeed(&self, value: V) -> bool {
        self.complete(Ok(value))
    }

    pub fn fail(&self, err: DriverError) -> bool {
        self.complete(Err(err))
    }

    fn dispatch(&self, outcome: &Outcome<V>) {
        loop {
            let batch = {
                let mut state = self.state.lock();
                if state.pending.is_empty() {
                    state.dispatching = false;
                    return;
                }
                std::mem::take(&mut state.pending)
            };
            for continuation in batch {
                run_continuation(continuation, outcome.clone());
            }
        }
    }

    /// Registers a continuation to receive the outcome.
    pub fn register<F>(&self, continuation: F)
    where
        F: FnOnce(Outcome<V>) + Send + 'static,
    {
        let mut state = self.state.lock();
        let ready = if state.dispatching { None } else { state.outcome.clone() };
        match ready {
            Some(outcome) => {
                drop(state);
                run_continuation(Box::new(continuation), outcome);
            }
            None => state.pending.push(Box::new(continuation)),
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state.lock().outcome.is_some()
    }

    /// A copy of the outcome, if already completed.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome<V>> {
        self.state.lock().outcome.clone()
    }

    /// Maps a successful value; errors pass through untouched.
    pub fn then_apply<U, F>(&self, f: F) -> Completion<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(V) -> U + Send + 'static,
    {
        self.and_then(move |v| Ok(f(v)))
    }

    /// Like [`then_apply`](Self::then_apply) but the mapping may fail.
    pub fn and_then<U, F>(&self, f: F) -> Completion<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(V) -> Outcome<U> + Send + 'static,
    {
        let next = Completion::new();
        let target = next.clone();
        self.register(move |outcome| {
            target.complete(outcome.and_then(|v| guarded(move || f(v)).and_then(|r| r)));
        });
        next
    }

    /// Chains a further asynchronous step on success.
    pub fn then_compose<U, F>(&self, f: F) -> Completion<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(V) -> Completion<U> + Send + 'static,
    {
        let next = Completion::new();
        let target = next.clone();
        self.register(move |outcome| match outcome.and_then(|v| guarded(move || f(v))) {
            Ok(step) => step.register(move |inner| {
                target.complete(inner);
            }),
            Err(e) => {
                target.complete(Err(e));
            }
        });
        next
    }

    pub fn map_err<F>(&self, f: F) -> Completion<V>
    where
        F: FnOnce(DriverError) -> DriverError + Send + 'static,
    {
        let next = Completion::new();
        let target = next.clone();
        self.register(move |outcome| {
            target.complete(outcome.map_err(|e| guarded(move || f(e)).unwrap_or_else(|panicked| panicked)));
        });
        next
    }

    /// Waits for the outcome from async code.
    ///
    /// Never resolves for a primitive that is never completed; wrap it in
    /// `tokio::time::timeout` when the producer may give up silently.
    pub async fn wait(&self) -> Outcome<V> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.register(move |outcome| {
            let _ = tx.send(outcome);
        });
        // `self` keeps the queued sender alive, so the channel only closes after a send.
        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => std::future::pending().await,
        }
    }
}

impl<V: Clone + Send + 'static> IntoFuture for Completion<V> {
    type Output = Outcome<V>;
    type IntoFuture = Pin<Box<dyn Future<Output = Outcome<V>> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.wait().await })
    }
}

fn run_continuation<V>(continuation: Continuation<V>, outcome: Outcome<V>) {
    // A panicking continuation must not starve the ones queued behind it.
    if let Err(panic) = catch_unwind(AssertUnwindSafe(move || continuation(outcome))) {
        log::error!("completion continuation panicked: {}", panic_message(panic.as_ref()));
    }
}

// Runs a user closure; a panic becomes an iteration error on the target primitive.
fn guarded<R>(f: impl FnOnce() -> R) -> Outcome<R> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|panic| DriverError::Iteration(panic_message(panic.as_ref())))
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
