//! Collection facade: entry point for queries (through [`View`]) and inserts/saves.

mod dispatch;
mod view;

pub use view::{View, ViewState};

use crate::codec::{Codec, IdentityCapability};
use crate::completion::Completion;
use crate::config::CollectionOptions;
use crate::cursor::Cursor;
use crate::errors::Result;
use crate::executor::Executor;
use crate::operation::{CountOperation, FindOperation, Namespace};
use bson::Document;
use std::sync::Arc;

struct Shared<T> {
    namespace: Namespace,
    options: CollectionOptions,
    codec: Arc<dyn Codec<T>>,
    // Resolved once here; `save` checks this rather than probing the codec per call.
    identity: Option<Arc<dyn IdentityCapability<T>>>,
    executor: Arc<dyn Executor>,
}

/// Handle to one collection. Cheap to clone; clones share codec and executor.
pub struct Collection<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("namespace", &self.shared.namespace)
            .field("options", &self.shared.options)
            .field("identity", &self.shared.identity.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + 'static> Collection<T> {
    pub fn new(
        namespace: Namespace,
        codec: Arc<dyn Codec<T>>,
        options: CollectionOptions,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let identity = codec.identity();
        Self { shared: Arc::new(Shared { namespace, options, codec, identity, executor }) }
    }

    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.shared.namespace
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.namespace.collection
    }

    #[must_use]
    pub fn options(&self) -> &CollectionOptions {
        &self.shared.options
    }

    #[must_use]
    pub fn codec(&self) -> &Arc<dyn Codec<T>> {
        &self.shared.codec
    }

    /// Whether the codec can read/generate document keys (required by `save`).
    #[must_use]
    pub fn has_identity(&self) -> bool {
        self.shared.identity.is_some()
    }

    /// A fresh view filtered by `filter`, encoded with the collection codec.
    pub fn find(&self, filter: &T) -> Result<View<T>> {
        self.find_all().find(filter)
    }

    /// A fresh view filtered by a raw document.
    #[must_use]
    pub fn find_document(&self, filter: Document) -> View<T> {
        self.find_all().find_document(filter)
    }

    /// A fresh, unfiltered view.
    #[must_use]
    pub fn find_all(&self) -> View<T> {
        View::new(self.clone())
    }

    pub(crate) fn read(&self, operation: FindOperation) -> Completion<Cursor<Document>> {
        let read_preference = self.shared.options.read_preference;
        log::debug!(
            "find on {} (skip={}, limit={}, single={})",
            self.shared.namespace,
            operation.skip,
            operation.limit,
            operation.single_result
        );
        crate::dev6!({
            "op": "find",
            "ns": self.shared.namespace.full_name(),
            "skip": operation.skip,
            "limit": operation.limit,
            "batch_size": operation.batch_size,
            "single_result": operation.single_result,
            "read_preference": read_preference.name(),
        });
        self.shared.executor.find(operation, read_preference)
    }

    pub(crate) fn count_with(&self, operation: CountOperation) -> Completion<u64> {
        let read_preference = self.shared.options.read_preference;
        log::debug!("count on {}", self.shared.namespace);
        crate::dev6!({
            "op": "count",
            "ns": self.shared.namespace.full_name(),
            "skip": operation.skip,
            "limit": operation.limit,
            "read_preference": read_preference.name(),
        });
        self.shared.executor.count(operation, read_preference)
    }
}
