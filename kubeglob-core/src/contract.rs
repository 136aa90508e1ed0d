//! # contract: the remote store seam
//!
//! The pipeline never talks to a cluster directly. It is handed something that
//! implements [`ResourceCreator`] and calls `create` once per document. The CLI
//! crate provides the real Kubernetes client; tests use the generated
//! `MockResourceCreator` to record what would have been sent.
//!
//! Implementations own their connection, credentials and deadlines. The pipeline
//! only borrows the handle for the length of a run.

use async_trait::async_trait;

use crate::document::ResourceDocument;

/// Error type returned by store implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Something that can create a resource server-side.
///
/// A single call is a single attempt: implementations must not retry on the
/// caller's behalf, and a returned error (conflict, validation rejection,
/// transport failure) is final for that document.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait ResourceCreator: Send + Sync {
    /// Create `document` in the remote store.
    async fn create(&self, document: &ResourceDocument) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_creator_passes_errors_through() {
        let doc = ResourceDocument::decode(b"apiVersion: v1\nkind: ConfigMap\n").unwrap();
        let mut creator = MockResourceCreator::new();
        creator
            .expect_create()
            .times(1)
            .returning(|_| Err("forbidden".into()));

        let err = creator.create(&doc).await.unwrap_err();
        assert_eq!(err.to_string(), "forbidden");
    }
}
