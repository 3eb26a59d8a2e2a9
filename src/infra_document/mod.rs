mod relationship_store_document;

pub use relationship_store_document::*;
