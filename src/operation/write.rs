use super::Namespace;
use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// How an update request treats its update document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// Operator document (`$set`, `$inc`, ...).
    Update,
    /// Whole-document replacement.
    Replace,
}

/// One insert/update/delete intent. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Insert {
        document: Document,
    },
    Update {
        filter: Document,
        update: Document,
        kind: UpdateKind,
        upsert: bool,
        multi: bool,
    },
    Delete {
        filter: Document,
        multi: bool,
    },
}

impl WriteRequest {
    #[must_use]
    pub const fn kind(&self) -> WriteKind {
        match self {
            Self::Insert { .. } => WriteKind::Insert,
            Self::Update { .. } => WriteKind::Update,
            Self::Delete { .. } => WriteKind::Delete,
        }
    }

    /// `multi` for update/delete; inserts always target exactly one document.
    #[must_use]
    pub const fn is_multi(&self) -> bool {
        match self {
            Self::Insert { .. } => false,
            Self::Update { multi, .. } | Self::Delete { multi, .. } => *multi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

impl WriteKind {
    #[must_use]
    pub const fn command_name(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Acknowledgement level requested for writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConcern {
    /// Number of members that must acknowledge; 0 means fire-and-forget.
    pub w: i32,
    pub journal: bool,
    pub wtimeout_ms: u64,
}

impl WriteConcern {
    pub const UNACKNOWLEDGED: Self = Self { w: 0, journal: false, wtimeout_ms: 0 };
    pub const ACKNOWLEDGED: Self = Self { w: 1, journal: false, wtimeout_ms: 0 };
    pub const JOURNALED: Self = Self { w: 1, journal: true, wtimeout_ms: 0 };

    #[must_use]
    pub const fn acknowledged(&self) -> bool {
        self.w > 0 || self.journal
    }

    /// `getLastError`-style command document, `None` for unacknowledged writes.
    #[must_use]
    pub fn as_document(&self) -> Option<Document> {
        if !self.acknowledged() {
            return None;
        }
        let mut doc = bson::doc! { "w": self.w };
        if self.journal {
            doc.insert("j", true);
        }
        if self.wtimeout_ms > 0 {
            doc.insert("wtimeout", Bson::Int64(i64::try_from(self.wtimeout_ms).unwrap_or(i64::MAX)));
        }
        Some(doc)
    }
}

impl Default for WriteConcern {
    fn default() -> Self {
        Self::ACKNOWLEDGED
    }
}

/// A batch of same-kind requests submitted as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOperation {
    pub kind: WriteKind,
    pub namespace: Namespace,
    pub ordered: bool,
    pub write_concern: WriteConcern,
    pub requests: Vec<WriteRequest>,
}

impl WriteOperation {
    #[must_use]
    pub const fn new(
        kind: WriteKind,
        namespace: Namespace,
        write_concern: WriteConcern,
        requests: Vec<WriteRequest>,
    ) -> Self {
        Self { kind, namespace, ordered: true, write_concern, requests }
    }
}

/// What the server reported for a write batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteResult {
    pub acknowledged: bool,
    /// Documents inserted, matched, or removed, depending on the operation.
    pub count: u64,
    pub updated_existing: bool,
    pub upserted_id: Option<Bson>,
}

impl WriteResult {
    #[must_use]
    pub fn unacknowledged() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn acknowledged(count: u64) -> Self {
        Self { acknowledged: true, count, updated_existing: false, upserted_id: None }
    }
}
