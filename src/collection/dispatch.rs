use super::Collection;
use crate::codec::ID_FIELD;
use crate::completion::Completion;
use crate::errors::{DriverError, Result};
use crate::operation::{WriteKind, WriteOperation, WriteRequest, WriteResult};

impl<T: Clone + Send + 'static> Collection<T> {
    /// Inserts one document, generating its key first when the codec can.
    pub fn insert(&self, document: &mut T) -> Result<Completion<WriteResult>> {
        self.insert_many(std::slice::from_mut(document))
    }

    /// Inserts `documents` as a single batch, one insert request per document.
    pub fn insert_many(&self, documents: &mut [T]) -> Result<Completion<WriteResult>> {
        if documents.is_empty() {
            return Err(DriverError::argument("documents", "at least one document is required"));
        }
        let mut requests = Vec::with_capacity(documents.len());
        for document in documents.iter_mut() {
            if let Some(identity) = &self.shared.identity {
                identity.generate_id_if_absent(document);
            }
            requests.push(WriteRequest::Insert { document: self.shared.codec.encode(document)? });
        }
        Ok(self.submit(WriteKind::Insert, requests))
    }

    /// Inserts a document without a key, otherwise upsert-replaces the one with its key.
    pub fn save(&self, document: &mut T) -> Result<Completion<WriteResult>> {
        let Some(identity) = self.shared.identity.clone() else {
            return Err(DriverError::Unsupported(format!(
                "save on {} requires a codec with identity support",
                self.shared.namespace
            )));
        };
        match identity.document_id(document) {
            None => self.insert(document),
            Some(id) => {
                let mut filter = bson::Document::new();
                filter.insert(ID_FIELD, id);
                self.find_document(filter).upsert().replace(document)
            }
        }
    }

    pub(crate) fn submit(&self, kind: WriteKind, requests: Vec<WriteRequest>) -> Completion<WriteResult> {
        let count = requests.len();
        let multi = requests.iter().any(WriteRequest::is_multi);
        let write_concern = self.shared.options.write_concern;
        let operation = WriteOperation::new(kind, self.shared.namespace.clone(), write_concern, requests);
        log::debug!("{} x{count} on {}", kind.command_name(), self.shared.namespace);
        crate::dev6!({
            "op": kind.command_name(),
            "ns": self.shared.namespace.full_name(),
            "requests": count,
            "multi": multi,
            "acknowledged": write_concern.acknowledged(),
        });
        self.shared.executor.write(operation)
    }
}
