use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;

struct UniqueIndex {
    collection: CollectionId,
    fields: Vec<String>,
}

/// In-process document store. Documents live only as long as the value;
/// used by the `memory` backend and by tests.
pub struct MemoryDocumentStore {
    collections: DashMap<CollectionId, Vec<Document>>,
    unique_indexes: Vec<UniqueIndex>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
            unique_indexes: Vec::new(),
        }
    }

    /// Reject inserts whose values for `fields` equal an existing document's.
    pub fn with_unique_index(mut self, collection: CollectionId, fields: &[&str]) -> Self {
        self.unique_indexes.push(UniqueIndex {
            collection,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self
    }

    fn violated_index<'a>(
        &'a self,
        collection: &CollectionId,
        existing: &[Document],
        fields: &Fields,
    ) -> Option<&'a UniqueIndex> {
        self.unique_indexes
            .iter()
            .filter(|index| &index.collection == collection)
            .find(|index| {
                existing.iter().any(|doc| {
                    index
                        .fields
                        .iter()
                        .all(|f| doc.fields.get(f).is_some() && doc.fields.get(f) == fields.get(f))
                })
            })
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(
        &self,
        collection: &CollectionId,
        query: &DocumentQuery,
    ) -> Result<DocumentList, DocumentStoreError> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(DocumentList::default());
        };

        let mut total = 0u64;
        let mut documents = Vec::new();
        for doc in docs.iter().filter(|d| d.matches(&query.filters)) {
            total += 1;
            if documents.len() < query.limit as usize {
                documents.push(doc.clone());
            }
        }

        Ok(DocumentList { total, documents })
    }

    async fn insert(
        &self,
        collection: &CollectionId,
        fields: Fields,
    ) -> Result<Document, DocumentStoreError> {
        let mut docs = self.collections.entry(collection.clone()).or_default();

        if let Some(index) = self.violated_index(collection, &docs, &fields) {
            return Err(DocumentStoreError::Conflict(format!(
                "{collection} unique on [{}]",
                index.fields.join(", ")
            )));
        }

        let doc = Document {
            id: DocumentId::generate(),
            collection: collection.clone(),
            fields,
            created_at: Utc::now(),
        };
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn delete(
        &self,
        collection: &CollectionId,
        document_id: &DocumentId,
    ) -> Result<(), DocumentStoreError> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Err(DocumentStoreError::NotFound(format!("{collection}/{document_id}")));
        };

        let before = docs.len();
        docs.retain(|d| &d.id != document_id);
        if docs.len() == before {
            return Err(DocumentStoreError::NotFound(format!("{collection}/{document_id}")));
        }
        Ok(())
    }
}
