use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Page size used when a caller needs the matching documents themselves,
/// not only the total.
pub const DEFAULT_QUERY_LIMIT: u32 = 100;

#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub String);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn generate() -> Self {
        DocumentId(nanoid::nanoid!(20))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub collection: CollectionId,
    pub fields: Fields,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn matches(&self, filters: &[Filter]) -> bool {
        filters.iter().all(|f| f.matches(&self.fields))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equal { field: String, value: Value },
}

impl Filter {
    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equal {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            Filter::Equal { field, value } => fields.get(field) == Some(value),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Equal { field, value } => write!(f, "{field}={value}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentQuery {
    pub filters: Vec<Filter>,
    /// Maximum documents returned. `0` asks for the total only.
    pub limit: u32,
}

impl DocumentQuery {
    pub fn count_only(filters: Vec<Filter>) -> Self {
        Self { filters, limit: 0 }
    }

    pub fn page(filters: Vec<Filter>) -> Self {
        Self {
            filters,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

/// Result of a query: `total` counts every match even when `documents`
/// is truncated by the query limit.
#[derive(Debug, Clone, Default)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Document>,
}
