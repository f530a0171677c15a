//! Conversion between caller types and BSON documents.
//!
//! A codec may expose an [`IdentityCapability`]; collections resolve it once at
//! construction and `save` is only available when it is present.

use crate::errors::{DriverError, Result};
use bson::oid::ObjectId;
use bson::{Bson, Document};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

pub const ID_FIELD: &str = "_id";

pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<Document>;

    fn decode(&self, document: Document) -> Result<T>;

    fn identity(&self) -> Option<Arc<dyn IdentityCapability<T>>> {
        None
    }
}

/// Optional ability to read and generate a document's unique key.
pub trait IdentityCapability<T>: Send + Sync {
    fn has_id(&self, value: &T) -> bool;

    fn generate_id_if_absent(&self, value: &mut T);

    fn document_id(&self, value: &T) -> Option<Bson>;
}

/// Pass-through codec for raw documents, keyed on `_id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCodec;

impl Codec<Document> for DocumentCodec {
    fn encode(&self, value: &Document) -> Result<Document> {
        Ok(value.clone())
    }

    fn decode(&self, document: Document) -> Result<Document> {
        Ok(document)
    }

    fn identity(&self) -> Option<Arc<dyn IdentityCapability<Document>>> {
        Some(Arc::new(ObjectIdIdentity))
    }
}

/// Generates an `ObjectId` for documents lacking `_id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdIdentity;

impl IdentityCapability<Document> for ObjectIdIdentity {
    fn has_id(&self, value: &Document) -> bool {
        value.contains_key(ID_FIELD)
    }

    fn generate_id_if_absent(&self, value: &mut Document) {
        if !self.has_id(value) {
            value.insert(ID_FIELD, ObjectId::new());
        }
    }

    fn document_id(&self, value: &Document) -> Option<Bson> {
        value.get(ID_FIELD).cloned()
    }
}

/// Codec for any serde type. Values whose serialized form is not a document
/// (numbers, strings, sequences) are rejected with an encoding error.
pub struct SerdeCodec<T> {
    identity: Option<Arc<dyn IdentityCapability<T>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for SerdeCodec<T> {
    fn default() -> Self {
        Self { identity: None, _marker: PhantomData }
    }
}

impl<T> SerdeCodec<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_identity(identity: Arc<dyn IdentityCapability<T>>) -> Self {
        Self { identity: Some(identity), _marker: PhantomData }
    }
}

impl<T> Codec<T> for SerdeCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Document> {
        bson::serialize_to_document(value).map_err(|e| DriverError::Encoding(e.to_string()))
    }

    fn decode(&self, document: Document) -> Result<T> {
        bson::deserialize_from_document(document).map_err(|e| DriverError::Decoding(e.to_string()))
    }

    fn identity(&self) -> Option<Arc<dyn IdentityCapability<T>>> {
        self.identity.clone()
    }
}

/// Identity capability from a pair of accessors on a typed id field.
pub struct FieldIdentity<T> {
    get: fn(&T) -> Option<Bson>,
    generate: fn(&mut T),
}

impl<T> FieldIdentity<T> {
    #[must_use]
    pub const fn new(get: fn(&T) -> Option<Bson>, generate: fn(&mut T)) -> Self {
        Self { get, generate }
    }
}

impl<T> IdentityCapability<T> for FieldIdentity<T> {
    fn has_id(&self, value: &T) -> bool {
        (self.get)(value).is_some()
    }

    fn generate_id_if_absent(&self, value: &mut T) {
        if !self.has_id(value) {
            (self.generate)(value);
        }
    }

    fn document_id(&self, value: &T) -> Option<Bson> {
        (self.get)(value)
    }
}
