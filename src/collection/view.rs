use super::Collection;
use crate::completion::Completion;
use crate::errors::{DriverError, Result};
use crate::iterable::{AsyncIterable, first_document};
use crate::operation::{CountOperation, FindOperation, Namespace, UpdateKind, WriteKind, WriteRequest, WriteResult};
use bson::Document;
use std::sync::Arc;
use std::time::Duration;

/// Everything a view has accumulated so far.
///
/// Terminal operations read it once, at call time, into an owned descriptor, so
/// later builder calls never leak into an operation already submitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub filter: Option<Document>,
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub modifiers: Option<Document>,
    pub skip: u32,
    pub limit: i32,
    pub batch_size: i32,
    pub max_time: Option<Duration>,
    pub upsert: bool,
}

impl ViewState {
    #[must_use]
    pub fn find_operation(&self, namespace: &Namespace) -> FindOperation {
        FindOperation::new(namespace.clone())
            .filter(self.filter.clone())
            .sort(self.sort.clone())
            .projection(self.projection.clone())
            .modifiers(self.modifiers.clone())
            .skip(self.skip)
            .limit(self.limit)
            .batch_size(self.batch_size)
            .max_time(self.max_time)
    }

    #[must_use]
    pub fn count_operation(&self, namespace: &Namespace) -> CountOperation {
        CountOperation {
            namespace: namespace.clone(),
            filter: self.filter.clone(),
            skip: self.skip,
            limit: self.limit,
            max_time: self.max_time,
        }
    }

    // Writes treat a missing filter as "match everything".
    fn write_filter(&self) -> Document {
        self.filter.clone().unwrap_or_default()
    }
}

/// Chainable query/update builder over one collection.
///
/// Builder calls consume and return the view; terminal operations borrow it.
pub struct View<T> {
    collection: Collection<T>,
    state: ViewState,
}

impl<T> Clone for View<T> {
    fn clone(&self) -> Self {
        Self { collection: self.collection.clone(), state: self.state.clone() }
    }
}

impl<T> std::fmt::Debug for View<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View").field("namespace", &self.collection.shared.namespace).field("state", &self.state).finish()
    }
}

impl<T: Clone + Send + 'static> View<T> {
    pub(crate) fn new(collection: Collection<T>) -> Self {
        let batch_size = collection.options().batch_size;
        Self { collection, state: ViewState { batch_size, ..ViewState::default() } }
    }

    pub fn find(mut self, filter: &T) -> Result<Self> {
        self.state.filter = Some(self.collection.codec().encode(filter)?);
        Ok(self)
    }

    #[must_use]
    pub fn find_document(mut self, filter: Document) -> Self {
        self.state.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Document) -> Self {
        self.state.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn skip(mut self, skip: u32) -> Self {
        self.state.skip = skip;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i32) -> Self {
        self.state.limit = limit;
        self
    }

    #[must_use]
    pub fn fields(mut self, projection: Document) -> Self {
        self.state.projection = Some(projection);
        self
    }

    #[must_use]
    pub fn upsert(mut self) -> Self {
        self.state.upsert = true;
        self
    }

    #[must_use]
    pub fn batch_size(mut self, batch_size: i32) -> Self {
        self.state.batch_size = batch_size;
        self
    }

    /// Server-side time limit, forwarded as-is.
    #[must_use]
    pub fn max_time(mut self, max_time: Duration) -> Self {
        self.state.max_time = Some(max_time);
        self
    }

    /// Query modifiers such as `$hint` or `$comment`.
    #[must_use]
    pub fn modifiers(mut self, modifiers: Document) -> Self {
        self.state.modifiers = Some(modifiers);
        self
    }

    #[must_use]
    pub const fn state(&self) -> &ViewState {
        &self.state
    }

    #[must_use]
    pub fn count(&self) -> Completion<u64> {
        self.collection.count_with(self.state.count_operation(self.collection.namespace()))
    }

    /// Replaces the first match with `replacement` (inserting it when `upsert` is set).
    pub fn replace(&self, replacement: &T) -> Result<Completion<WriteResult>> {
        let replacement = self.collection.codec().encode(replacement)?;
        if replacement.is_empty() {
            return Err(DriverError::argument("replacement", "document must not be empty"));
        }
        Ok(self.submit_update(replacement, UpdateKind::Replace, false))
    }

    /// Applies `update` to every match.
    pub fn update(&self, update: Document) -> Result<Completion<WriteResult>> {
        Self::check_update(&update)?;
        Ok(self.submit_update(update, UpdateKind::Update, true))
    }

    /// Applies `update` to the first match only.
    pub fn update_one(&self, update: Document) -> Result<Completion<WriteResult>> {
        Self::check_update(&update)?;
        Ok(self.submit_update(update, UpdateKind::Update, false))
    }

    #[must_use]
    pub fn remove(&self) -> Completion<WriteResult> {
        self.submit_delete(true)
    }

    #[must_use]
    pub fn remove_one(&self) -> Completion<WriteResult> {
        self.submit_delete(false)
    }

    fn check_update(update: &Document) -> Result<()> {
        if update.is_empty() {
            return Err(DriverError::argument("update", "document must not be empty"));
        }
        Ok(())
    }

    fn submit_update(&self, update: Document, kind: UpdateKind, multi: bool) -> Completion<WriteResult> {
        let request = WriteRequest::Update {
            filter: self.state.write_filter(),
            update,
            kind,
            upsert: self.state.upsert,
            multi,
        };
        self.collection.submit(WriteKind::Update, vec![request])
    }

    fn submit_delete(&self, multi: bool) -> Completion<WriteResult> {
        let request = WriteRequest::Delete { filter: self.state.write_filter(), multi };
        self.collection.submit(WriteKind::Delete, vec![request])
    }

    fn iterate<F>(&self, operation: FindOperation, mut action: F) -> Completion<()>
    where
        F: FnMut(T) -> Result<()> + Send + 'static,
    {
        let codec = Arc::clone(self.collection.codec());
        self.collection.read(operation).then_compose(move |cursor| {
            cursor.for_each(move |raw| {
                let doc = codec.decode(raw)?;
                action(doc)
            })
        })
    }
}

impl<T: Clone + Send + 'static> AsyncIterable<T> for View<T> {
    fn for_each<F>(&self, action: F) -> Completion<()>
    where
        F: FnMut(T) -> Result<()> + Send + 'static,
    {
        self.iterate(self.state.find_operation(self.collection.namespace()), action)
    }

    fn one(&self) -> Completion<Option<T>> {
        let operation = self.state.find_operation(self.collection.namespace()).single_result();
        first_document(|action| self.iterate(operation, action))
    }
}
