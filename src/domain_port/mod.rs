// store

mod document_store;
mod relationship_store;

pub use document_store::*;
pub use relationship_store::*;

// session

mod identity_provider;

pub use identity_provider::*;
