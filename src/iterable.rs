//! Aggregate consumers built on top of a cursor-backed sequence.

use crate::completion::Completion;
use crate::errors::{DriverError, Result};
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::Arc;

/// Boxed per-document action, for call sites that cannot stay generic.
pub type DocumentAction<T> = Box<dyn FnMut(T) -> Result<()> + Send + 'static>;

/// A sequence of documents that can only be consumed asynchronously.
pub trait AsyncIterable<T: Clone + Send + 'static> {
    /// Runs `action` on every document; resolves once iteration ends.
    fn for_each<F>(&self, action: F) -> Completion<()>
    where
        F: FnMut(T) -> Result<()> + Send + 'static;

    /// First document, or `None` when nothing matched.
    fn one(&self) -> Completion<Option<T>> {
        first_document(|action| self.for_each(action))
    }

    /// Appends every document to `container` in encounter order and resolves to it.
    ///
    /// The container itself is handed back, not a copy. `C: Clone` is only what
    /// [`Completion`] needs to fan the value out to several continuations.
    /// On failure the error is surfaced and whatever was appended so far is dropped.
    fn collect_into<C>(&self, container: C) -> Completion<C>
    where
        C: Extend<T> + Clone + Send + 'static,
    {
        let shared = Arc::new(Mutex::new(Some(container)));
        let sink = Arc::clone(&shared);
        self.for_each(move |doc| {
            if let Some(container) = sink.lock().as_mut() {
                container.extend(std::iter::once(doc));
            }
            Ok(())
        })
        .and_then(move |()| {
            shared
                .lock()
                .take()
                .ok_or_else(|| DriverError::Iteration("container already handed out".into()))
        })
    }

    /// Lazily transforms each document at consumption time.
    fn map<U, F>(self, transform: F) -> Mapped<Self, T, F>
    where
        Self: Sized,
        U: Clone + Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        Mapped { inner: self, transform: Arc::new(transform), _marker: PhantomData }
    }
}

/// Resolves to the first document handed to the action built by `run`.
///
/// Later documents hit an already-completed primitive and are absorbed.
pub(crate) fn first_document<T, R>(run: R) -> Completion<Option<T>>
where
    T: Clone + Send + 'static,
    R: FnOnce(DocumentAction<T>) -> Completion<()>,
{
    let result = Completion::new();
    let first = result.clone();
    let finished = result.clone();
    run(Box::new(move |doc| {
        first.succeed(Some(doc));
        Ok(())
    }))
    .register(move |outcome| {
        finished.complete(outcome.map(|()| None));
    });
    result
}

/// Output of [`AsyncIterable::map`].
pub struct Mapped<I, T, F> {
    inner: I,
    transform: Arc<F>,
    _marker: PhantomData<fn(T)>,
}

impl<I: Clone, T, F> Clone for Mapped<I, T, F> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), transform: Arc::clone(&self.transform), _marker: PhantomData }
    }
}

impl<I, T, U, F> AsyncIterable<U> for Mapped<I, T, F>
where
    I: AsyncIterable<T>,
    T: Clone + Send + 'static,
    U: Clone + Send + 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    fn for_each<A>(&self, mut action: A) -> Completion<()>
    where
        A: FnMut(U) -> Result<()> + Send + 'static,
    {
        let transform = Arc::clone(&self.transform);
        self.inner.for_each(move |doc| action(transform(doc)))
    }

    // Delegating keeps the inner sequence's own notion of "first" (e.g. single-batch reads).
    fn one(&self) -> Completion<Option<U>> {
        let transform = Arc::clone(&self.transform);
        self.inner.one().then_apply(move |doc| doc.map(|d| transform(d)))
    }
}
