//! Asynchronous result cursor and the engine that drains it.

use crate::completion::{Completion, Outcome, panic_message};
use crate::errors::{DriverError, Result};
use crate::iterable::AsyncIterable;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Identifies a cursor held open on a server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerCursor {
    pub id: i64,
    pub address: String,
}

impl ServerCursor {
    #[must_use]
    pub fn new(id: i64, address: impl Into<String>) -> Self {
        Self { id, address: address.into() }
    }
}

/// Producer of result batches, supplied by the read executor.
///
/// Each call to `next_batch` advances server state. `Ok(None)` signals exhaustion.
pub trait BatchSource<T>: Send {
    fn next_batch(&mut self) -> Completion<Option<Vec<T>>>;
}

type SharedSource<T> = Arc<Mutex<Box<dyn BatchSource<T>>>>;

/// Lazy, finite, non-restartable sequence of documents bound to one server resource.
///
/// Clones share the same underlying position.
pub struct Cursor<T> {
    source: SharedSource<T>,
    server_cursor: Option<ServerCursor>,
}

impl<T> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        Self { source: Arc::clone(&self.source), server_cursor: self.server_cursor.clone() }
    }
}

impl<T> std::fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor").field("server_cursor", &self.server_cursor).finish_non_exhaustive()
    }
}

impl<T: Clone + Send + 'static> Cursor<T> {
    pub fn new<S>(source: S) -> Self
    where
        S: BatchSource<T> + 'static,
    {
        Self { source: Arc::new(Mutex::new(Box::new(source))), server_cursor: None }
    }

    #[must_use]
    pub fn with_server_cursor(mut self, server_cursor: ServerCursor) -> Self {
        self.server_cursor = Some(server_cursor);
        self
    }

    /// The server-side handle, for an owner that wants to release it early.
    #[must_use]
    pub const fn server_cursor(&self) -> Option<&ServerCursor> {
        self.server_cursor.as_ref()
    }
}

impl<T: Clone + Send + 'static> AsyncIterable<T> for Cursor<T> {
    /// Delivers every document to `action` in cursor order.
    ///
    /// Completes with `Ok(())` on exhaustion, or with the first failure raised by
    /// advancing the cursor or by `action` (panics included). Nothing is delivered
    /// after a failure.
    fn for_each<F>(&self, action: F) -> Completion<()>
    where
        F: FnMut(T) -> Result<()> + Send + 'static,
    {
        let done = Completion::new();
        drive(Arc::clone(&self.source), action, done.clone());
        done
    }
}

enum Step {
    Continue,
    Finished(Outcome<()>),
}

fn drive<T, F>(source: SharedSource<T>, mut action: F, done: Completion<()>)
where
    T: Clone + Send + 'static,
    F: FnMut(T) -> Result<()> + Send + 'static,
{
    loop {
        let pending = match catch_unwind(AssertUnwindSafe(|| source.lock().next_batch())) {
            Ok(pending) => pending,
            Err(panic) => {
                done.fail(DriverError::Iteration(panic_message(panic.as_ref())));
                return;
            }
        };
        // Batches that are already available are consumed inline so a long run of
        // synchronous batches does not grow the stack.
        if let Some(outcome) = pending.outcome() {
            match deliver(outcome, &mut action) {
                Step::Continue => continue,
                Step::Finished(result) => {
                    finish(&done, result);
                    return;
                }
            }
        }
        pending.register(move |outcome| match deliver(outcome, &mut action) {
            Step::Continue => drive(source, action, done),
            Step::Finished(result) => finish(&done, result),
        });
        return;
    }
}

fn deliver<T, F>(outcome: Outcome<Option<Vec<T>>>, action: &mut F) -> Step
where
    F: FnMut(T) -> Result<()>,
{
    let batch = match outcome {
        Ok(Some(batch)) => batch,
        Ok(None) => return Step::Finished(Ok(())),
        Err(e) => return Step::Finished(Err(e)),
    };
    for doc in batch {
        match catch_unwind(AssertUnwindSafe(|| action(doc))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Step::Finished(Err(e)),
            Err(panic) => {
                return Step::Finished(Err(DriverError::Iteration(panic_message(panic.as_ref()))));
            }
        }
    }
    Step::Continue
}

fn finish(done: &Completion<()>, result: Outcome<()>) {
    if let Err(e) = &result {
        log::warn!("cursor iteration aborted: {e}");
    }
    done.complete(result);
}

/// In-memory batch source. Yields its batches in order, then either exhaustion
/// or a scripted failure.
pub struct VecBatchSource<T> {
    batches: VecDeque<Vec<T>>,
    failure: Option<DriverError>,
}

impl<T: Clone + Send + 'static> VecBatchSource<T> {
    #[must_use]
    pub fn new(batches: Vec<Vec<T>>) -> Self {
        Self { batches: batches.into(), failure: None }
    }

    /// Splits `docs` into batches of at most `batch_size` (a size of 0 means one batch).
    #[must_use]
    pub fn chunked(docs: Vec<T>, batch_size: usize) -> Self {
        if batch_size == 0 || docs.is_empty() {
            return Self::new(if docs.is_empty() { Vec::new() } else { vec![docs] });
        }
        Self::new(docs.chunks(batch_size).map(<[T]>::to_vec).collect())
    }

    /// Fails with `err` once the scripted batches run out.
    #[must_use]
    pub fn failing_with(mut self, err: DriverError) -> Self {
        self.failure = Some(err);
        self
    }
}

impl<T: Clone + Send + 'static> BatchSource<T> for VecBatchSource<T> {
    fn next_batch(&mut self) -> Completion<Option<Vec<T>>> {
        match self.batches.pop_front() {
            Some(batch) => Completion::ready(Some(batch)),
            None => match self.failure.take() {
                Some(err) => Completion::failed(err),
                None => Completion::ready(None),
            },
        }
    }
}
