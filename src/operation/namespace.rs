use crate::errors::{DriverError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `database.collection` pair an operation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Result<Self> {
        let database = database.into();
        let collection = collection.into();
        if database.is_empty() || database.contains(['.', ' ', '$']) {
            return Err(DriverError::argument("database", &format!("invalid name {database:?}")));
        }
        if collection.is_empty() {
            return Err(DriverError::argument("collection", "name must not be empty"));
        }
        Ok(Self { database, collection })
    }

    /// Parses `db.coll` (the collection part may itself contain dots).
    pub fn parse(full_name: &str) -> Result<Self> {
        match full_name.split_once('.') {
            Some((db, coll)) => Self::new(db, coll),
            None => Err(DriverError::argument("namespace", &format!("{full_name:?} has no collection part"))),
        }
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}
