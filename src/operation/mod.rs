//! Operation descriptors handed to the executors.
//!
//! Descriptors are plain immutable data. Building them never touches the network.

mod namespace;
mod read;
mod write;

pub use namespace::Namespace;
pub use read::{CountOperation, FindOperation, ReadPreference};
pub use write::{UpdateKind, WriteConcern, WriteKind, WriteOperation, WriteRequest, WriteResult};
