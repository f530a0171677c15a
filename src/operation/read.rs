use super::Namespace;
use crate::errors::DriverError;
use bson::Document;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Which members of a replica set may serve a read. Forwarded untouched to the executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadPreference {
    #[default]
    Primary,
    PrimaryPreferred,
    Secondary,
    SecondaryPreferred,
    Nearest,
}

impl ReadPreference {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::PrimaryPreferred => "primaryPreferred",
            Self::Secondary => "secondary",
            Self::SecondaryPreferred => "secondaryPreferred",
            Self::Nearest => "nearest",
        }
    }

    /// Whether a secondary may serve the read.
    #[must_use]
    pub const fn is_slave_ok(self) -> bool {
        !matches!(self, Self::Primary)
    }
}

impl FromStr for ReadPreference {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "primarypreferred" => Ok(Self::PrimaryPreferred),
            "secondary" => Ok(Self::Secondary),
            "secondarypreferred" => Ok(Self::SecondaryPreferred),
            "nearest" => Ok(Self::Nearest),
            other => Err(DriverError::Config(format!("unknown read preference: {other}"))),
        }
    }
}

/// A query against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOperation {
    pub namespace: Namespace,
    pub filter: Option<Document>,
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub modifiers: Option<Document>,
    pub skip: u32,
    /// 0 means no limit. Negative values are passed through for servers that treat them as "single batch".
    pub limit: i32,
    pub batch_size: i32,
    pub max_time: Option<Duration>,
    /// Ask for exactly one batch and close the server cursor right after it.
    pub single_result: bool,
}

impl FindOperation {
    #[must_use]
    pub const fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            filter: None,
            sort: None,
            projection: None,
            modifiers: None,
            skip: 0,
            limit: 0,
            batch_size: 0,
            max_time: None,
            single_result: false,
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: Option<Document>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Option<Document>) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn projection(mut self, projection: Option<Document>) -> Self {
        self.projection = projection;
        self
    }

    #[must_use]
    pub fn modifiers(mut self, modifiers: Option<Document>) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn batch_size(mut self, batch_size: i32) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn max_time(mut self, max_time: Option<Duration>) -> Self {
        self.max_time = max_time;
        self
    }

    #[must_use]
    pub fn single_result(mut self) -> Self {
        self.single_result = true;
        self
    }
}

/// Counts the documents a filter matches, honoring skip/limit.
#[derive(Debug, Clone, PartialEq)]
pub struct CountOperation {
    pub namespace: Namespace,
    pub filter: Option<Document>,
    pub skip: u32,
    pub limit: i32,
    pub max_time: Option<Duration>,
}

impl CountOperation {
    #[must_use]
    pub const fn new(namespace: Namespace) -> Self {
        Self { namespace, filter: None, skip: 0, limit: 0, max_time: None }
    }
}
