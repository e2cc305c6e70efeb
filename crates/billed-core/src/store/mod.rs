//! Bill store contract
//!
//! The store is the remote persistence collaborator. Every operation may fail
//! with a human-readable message, surfaced as [`CoreError::Store`].

mod memory;

pub use memory::{MemoryStore, StoredFile};

use crate::error::CoreResult;
use crate::models::{Bill, SelectedFile, UploadResult};
use async_trait::async_trait;

/// Headers attached to an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadHeaders {
    /// Let the transport pick the multipart content type
    pub no_content_type: bool,
}

/// Multipart payload sent when a proof is selected
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub file: SelectedFile,
    pub email: String,
    pub headers: UploadHeaders,
}

/// Serialized bill and the key of the upload it completes
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    /// JSON of the bill
    pub data: String,
    /// Key returned by the upload, if any
    pub selector: Option<String>,
}

/// Bill collection of the remote store
#[async_trait]
pub trait BillStore: Send + Sync {
    /// All bills visible to the caller, in store order
    async fn list(&self) -> CoreResult<Vec<Bill>>;

    /// Upload a proof file
    async fn create(&self, request: UploadRequest) -> CoreResult<UploadResult>;

    /// Persist a bill
    async fn update(&self, request: UpdateRequest) -> CoreResult<()>;
}
