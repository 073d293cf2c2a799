//! Remote asset store seam.
//!
//! The panel never talks to the network directly; everything goes through
//! [`AssetStore`]. Create returns the canonical asset (with its assigned id
//! and order index), update is partial, delete is idempotent from the
//! caller's point of view.

use async_trait::async_trait;

use annexure_types::{Asset, AssetId, AssetPatch, CandidateFile, Category};

pub mod memory;

pub use memory::{MemoryStore, StoreCall};

/// Errors from the remote store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Non-success response; `message` is human-readable.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// The request never got a response.
    #[error("network error: {0}")]
    Transport(String),
    #[error("asset {0} not found")]
    NotFound(AssetId),
}

impl StoreError {
    /// Build an error from a non-success response.
    ///
    /// Uses the body's `error` (or `detail`) string when the body is JSON and
    /// carries one; otherwise falls back to a generic message with the status.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["error", "detail"].iter().find_map(|key| {
                    value
                        .get(*key)
                        .and_then(|v| v.as_str())
                        .filter(|s| !s.trim().is_empty())
                        .map(str::to_string)
                })
            })
            .unwrap_or_else(|| format!("request failed ({status})"));
        Self::Rejected { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Rejected { status, .. } => Some(*status),
            StoreError::NotFound(_) => Some(404),
            StoreError::Transport(_) => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Remote asset store operations consumed by panels.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload one file into `category`. The response is the canonical asset.
    async fn create_asset(&self, category: &Category, file: CandidateFile) -> StoreResult<Asset>;

    /// Partially update an asset; only the patch's `Some` fields change.
    async fn update_asset(&self, id: AssetId, patch: AssetPatch) -> StoreResult<Asset>;

    /// Delete an asset.
    async fn delete_asset(&self, id: AssetId) -> StoreResult<()>;
}
