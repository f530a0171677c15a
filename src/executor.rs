//! Contracts of the lower layers that actually talk to a server.
//!
//! Implementations own transport, server selection and the operation bodies.
//! They must never fail synchronously: every failure goes through the returned
//! [`Completion`].

use crate::completion::Completion;
use crate::cursor::Cursor;
use crate::operation::{CountOperation, FindOperation, ReadPreference, WriteOperation, WriteResult};
use bson::Document;

pub trait ReadExecutor: Send + Sync {
    fn find(&self, operation: FindOperation, read_preference: ReadPreference) -> Completion<Cursor<Document>>;

    fn count(&self, operation: CountOperation, read_preference: ReadPreference) -> Completion<u64>;
}

pub trait WriteExecutor: Send + Sync {
    fn write(&self, operation: WriteOperation) -> Completion<WriteResult>;
}

/// Anything that can run both reads and writes.
pub trait Executor: ReadExecutor + WriteExecutor {}

impl<E: ReadExecutor + WriteExecutor> Executor for E {}
