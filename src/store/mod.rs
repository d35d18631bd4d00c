//! Content persistence boundary.
//!
//! The auditor never touches storage itself: it reads a corpus from a
//! [`ContentStore`] and hands changed bodies back to it.

mod dir;

pub use dir::DirStore;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// A stored content document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentDocument {
    pub id: String,
    pub title: String,
    pub body: String,
}

impl ContentDocument {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("content directory `{0}` does not exist")]
    MissingRoot(std::path::PathBuf),

    #[error("unknown document `{0}`")]
    UnknownDocument(String),

    #[error("IO error on `{0}`")]
    Io(std::path::PathBuf, #[source] std::io::Error),
}

/// Source and sink of published documents.
pub trait ContentStore: Send + Sync {
    /// All published documents.
    fn list_published(&self) -> Result<Vec<ContentDocument>, StoreError>;

    /// Replace the body of document `id`.
    fn update_body(&self, id: &str, body: &str) -> Result<(), StoreError>;
}

impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    fn list_published(&self) -> Result<Vec<ContentDocument>, StoreError> {
        (**self).list_published()
    }

    fn update_body(&self, id: &str, body: &str) -> Result<(), StoreError> {
        (**self).update_body(id, body)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory store for tests.

    use parking_lot::RwLock;
    use rustc_hash::FxHashSet;

    use super::{ContentDocument, ContentStore, StoreError};

    #[derive(Default)]
    pub struct MemoryStore {
        pub docs: RwLock<Vec<ContentDocument>>,
        /// Ids whose writes fail.
        pub failing: FxHashSet<String>,
        pub writes: RwLock<Vec<String>>,
    }

    impl MemoryStore {
        pub fn new(docs: Vec<ContentDocument>) -> Self {
            Self {
                docs: RwLock::new(docs),
                ..Self::default()
            }
        }

        pub fn failing_on(mut self, id: &str) -> Self {
            self.failing.insert(id.to_string());
            self
        }

        pub fn body(&self, id: &str) -> Option<String> {
            self.docs
                .read()
                .iter()
                .find(|d| d.id == id)
                .map(|d| d.body.clone())
        }
    }

    impl ContentStore for MemoryStore {
        fn list_published(&self) -> Result<Vec<ContentDocument>, StoreError> {
            Ok(self.docs.read().clone())
        }

        fn update_body(&self, id: &str, body: &str) -> Result<(), StoreError> {
            if self.failing.contains(id) {
                return Err(StoreError::Io(
                    id.into(),
                    std::io::Error::other("disk full"),
                ));
            }
            let mut docs = self.docs.write();
            let doc = docs
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| StoreError::UnknownDocument(id.to_string()))?;
            doc.body = body.to_string();
            self.writes.write().push(id.to_string());
            Ok(())
        }
    }
}
