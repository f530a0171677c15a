pub mod codec;
pub mod collection;
pub mod completion;
pub mod config;
pub mod cursor;
pub mod errors;
pub mod executor;
pub mod iterable;
pub mod logger;
pub mod operation;
pub mod protocol;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod utils;

pub use crate::codec::{Codec, DocumentCodec, FieldIdentity, IdentityCapability, SerdeCodec};
pub use crate::collection::{Collection, View};
pub use crate::completion::{Completion, Outcome};
pub use crate::config::{CollectionOptions, DriverConfig};
pub use crate::cursor::{BatchSource, Cursor, ServerCursor};
pub use crate::errors::{DriverError, Result};
pub use crate::executor::{Executor, ReadExecutor, WriteExecutor};
pub use crate::iterable::AsyncIterable;
pub use crate::operation::{Namespace, ReadPreference, WriteConcern, WriteResult};

use std::sync::Arc;

/// Initializes the driver.
/// It sets up the logger from `log4rs.yaml`.
pub fn init() -> std::result::Result<(), Box<dyn std::error::Error>> {
    logger::init()?;
    log::info!("nexusdriver initialized");
    Ok(())
}

/// Opens a raw-document collection named `name` in the configured database.
pub fn open_collection(
    config: &DriverConfig,
    name: &str,
    executor: Arc<dyn Executor>,
) -> Result<Collection<bson::Document>> {
    let namespace = Namespace::new(config.database.clone(), name)?;
    Ok(Collection::new(namespace, Arc::new(DocumentCodec), config.collection_options(), executor))
}
