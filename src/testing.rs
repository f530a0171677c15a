//! In-memory executor that records what it is asked to run.
//!
//! It serves a fixed document set for every query and never evaluates filters;
//! it exists to observe the descriptors the core builds and to script outcomes.

use crate::completion::Completion;
use crate::cursor::{BatchSource, Cursor, ServerCursor, VecBatchSource};
use crate::errors::DriverError;
use crate::executor::{ReadExecutor, WriteExecutor};
use crate::operation::{CountOperation, FindOperation, ReadPreference, WriteKind, WriteOperation, WriteResult};
use bson::Document;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::thread;
use std::time::Duration;

const DEFAULT_BATCH: usize = 2;
const ADDRESS: &str = "memory:27017";

#[derive(Default)]
struct Script {
    documents: Vec<Document>,
    find_failure: Option<DriverError>,
    cursor_failure: Option<DriverError>,
    write_failure: Option<DriverError>,
    write_result: Option<WriteResult>,
    count: Option<u64>,
    deferred: bool,
}

#[derive(Default)]
struct Log {
    finds: Vec<(FindOperation, ReadPreference)>,
    counts: Vec<(CountOperation, ReadPreference)>,
    writes: Vec<WriteOperation>,
}

#[derive(Default)]
pub struct MemoryExecutor {
    script: Mutex<Script>,
    log: Mutex<Log>,
    next_cursor: AtomicI64,
}

impl MemoryExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents served (in this order) by every query.
    #[must_use]
    pub fn with_documents(self, documents: Vec<Document>) -> Self {
        self.script.lock().documents = documents;
        self
    }

    /// Fails every `find` before a cursor exists.
    #[must_use]
    pub fn failing_find(self, err: DriverError) -> Self {
        self.script.lock().find_failure = Some(err);
        self
    }

    /// Cursors fail with `err` after delivering every document.
    #[must_use]
    pub fn failing_cursor(self, err: DriverError) -> Self {
        self.script.lock().cursor_failure = Some(err);
        self
    }

    #[must_use]
    pub fn failing_writes(self, err: DriverError) -> Self {
        self.script.lock().write_failure = Some(err);
        self
    }

    #[must_use]
    pub fn with_write_result(self, result: WriteResult) -> Self {
        self.script.lock().write_result = Some(result);
        self
    }

    #[must_use]
    pub fn with_count(self, count: u64) -> Self {
        self.script.lock().count = Some(count);
        self
    }

    /// Completes every result from a separate thread instead of inline.
    #[must_use]
    pub fn deferred(self) -> Self {
        self.script.lock().deferred = true;
        self
    }

    #[must_use]
    pub fn finds(&self) -> Vec<(FindOperation, ReadPreference)> {
        self.log.lock().finds.clone()
    }

    #[must_use]
    pub fn counts(&self) -> Vec<(CountOperation, ReadPreference)> {
        self.log.lock().counts.clone()
    }

    #[must_use]
    pub fn writes(&self) -> Vec<WriteOperation> {
        self.log.lock().writes.clone()
    }

    fn deliver<V: Clone + Send + 'static>(&self, value: Result<V, DriverError>) -> Completion<V> {
        if self.script.lock().deferred {
            return defer(value);
        }
        let completion = Completion::new();
        completion.complete(value);
        completion
    }

    fn window(documents: &[Document], skip: u32, limit: i32) -> Vec<Document> {
        let skipped = documents.iter().skip(skip as usize);
        match limit.unsigned_abs() {
            0 => skipped.cloned().collect(),
            n => skipped.take(n as usize).cloned().collect(),
        }
    }
}

fn defer<V: Clone + Send + 'static>(value: Result<V, DriverError>) -> Completion<V> {
    let completion = Completion::new();
    let producer = completion.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(1));
        producer.complete(value);
    });
    completion
}

impl ReadExecutor for MemoryExecutor {
    fn find(&self, operation: FindOperation, read_preference: ReadPreference) -> Completion<Cursor<Document>> {
        let script = self.script.lock();
        let docs = Self::window(&script.documents, operation.skip, operation.limit);
        let find_failure = script.find_failure.clone();
        let cursor_failure = script.cursor_failure.clone();
        let deferred = script.deferred;
        drop(script);
        self.log.lock().finds.push((operation.clone(), read_preference));

        if let Some(err) = find_failure {
            return self.deliver(Err(err));
        }
        let batch_size = match usize::try_from(operation.batch_size.unsigned_abs()) {
            Ok(0) | Err(_) => DEFAULT_BATCH,
            Ok(n) => n,
        };
        let mut source = if operation.single_result {
            VecBatchSource::chunked(docs, 0)
        } else {
            VecBatchSource::chunked(docs, batch_size)
        };
        if let Some(err) = cursor_failure {
            source = source.failing_with(err);
        }
        let id = self.next_cursor.fetch_add(1, Ordering::Relaxed) + 1;
        let cursor = if deferred { Cursor::new(DeferredSource(source)) } else { Cursor::new(source) };
        self.deliver(Ok(cursor.with_server_cursor(ServerCursor::new(id, ADDRESS))))
    }

    fn count(&self, operation: CountOperation, read_preference: ReadPreference) -> Completion<u64> {
        let script = self.script.lock();
        let count = script.count.unwrap_or_else(|| {
            Self::window(&script.documents, operation.skip, operation.limit).len() as u64
        });
        drop(script);
        self.log.lock().counts.push((operation, read_preference));
        self.deliver(Ok(count))
    }
}

impl WriteExecutor for MemoryExecutor {
    fn write(&self, operation: WriteOperation) -> Completion<WriteResult> {
        let script = self.script.lock();
        let outcome = match (&script.write_failure, &script.write_result) {
            (Some(err), _) => Err(err.clone()),
            (None, Some(result)) => Ok(result.clone()),
            (None, None) if !operation.write_concern.acknowledged() => Ok(WriteResult::unacknowledged()),
            (None, None) => {
                let count = match operation.kind {
                    WriteKind::Insert => operation.requests.len() as u64,
                    WriteKind::Update | WriteKind::Delete => 0,
                };
                Ok(WriteResult::acknowledged(count))
            }
        };
        drop(script);
        self.log.lock().writes.push(operation);
        self.deliver(outcome)
    }
}

/// Completes each batch from another thread.
struct DeferredSource(VecBatchSource<Document>);

impl BatchSource<Document> for DeferredSource {
    fn next_batch(&mut self) -> Completion<Option<Vec<Document>>> {
        let inner = self.0.next_batch();
        match inner.outcome() {
            Some(outcome) => defer(outcome),
            None => inner,
        }
    }
}
