//! In-memory asset store.
//!
//! Used by the CLI and by tests. Behaves like the remote store: ids are
//! assigned on upload, new assets are appended after the category's last
//! order index, captions are normalised server-side (trimmed). Every call is
//! recorded so tests can assert on network traffic, and failures can be
//! injected per file name, per asset, or for all updates.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use annexure_types::{Asset, AssetId, AssetPatch, Bootstrap, CandidateFile, Category};

use super::{AssetStore, StoreError, StoreResult};

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create { category: Category, name: String },
    Update { id: AssetId, patch: AssetPatch },
    Delete { id: AssetId },
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    assets: HashMap<AssetId, (Category, Asset)>,
    calls: Vec<StoreCall>,
    fail_uploads: HashSet<String>,
    fail_updates: bool,
    fail_deletes: HashSet<AssetId>,
}

/// In-memory [`AssetStore`].
///
/// Thread-safe via an internal mutex. All data is lost when dropped.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    latency: Option<Duration>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState { next_id: 1, ..Default::default() }),
            latency: None,
        }
    }

    /// Delay every call by `latency` (simulated round trip).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Load existing assets, as if they had been uploaded earlier.
    pub fn seed(&self, bootstrap: &Bootstrap) {
        let mut state = self.state.lock();
        for (category, assets) in bootstrap {
            for asset in assets {
                state.next_id = state.next_id.max(asset.id.get() + 1);
                state.assets.insert(asset.id, (category.clone(), asset.clone()));
            }
        }
    }

    /// Make uploads of files with this name fail.
    pub fn fail_upload(&self, name: impl Into<String>) {
        self.state.lock().fail_uploads.insert(name.into());
    }

    /// Make every partial update fail (or succeed again).
    pub fn fail_updates(&self, fail: bool) {
        self.state.lock().fail_updates = fail;
    }

    /// Make deletes of this asset fail.
    pub fn fail_delete(&self, id: AssetId) {
        self.state.lock().fail_deletes.insert(id);
    }

    /// All calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().calls.clone()
    }

    /// Only the update calls received so far.
    pub fn updates(&self) -> Vec<(AssetId, AssetPatch)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::Update { id, patch } => Some((*id, patch.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// The stored asset, if it exists.
    pub fn get(&self, id: AssetId) -> Option<Asset> {
        self.state.lock().assets.get(&id).map(|(_, asset)| asset.clone())
    }

    /// Stored assets of a category sorted by `(order_index, id)`.
    pub fn assets_in(&self, category: &Category) -> Vec<Asset> {
        let state = self.state.lock();
        let mut assets: Vec<Asset> = state
            .assets
            .values()
            .filter(|(c, _)| c == category)
            .map(|(_, asset)| asset.clone())
            .collect();
        annexure_types::sort_assets(&mut assets);
        assets
    }

    async fn round_trip(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn create_asset(&self, category: &Category, file: CandidateFile) -> StoreResult<Asset> {
        let fail = {
            let mut state = self.state.lock();
            state.calls.push(StoreCall::Create {
                category: category.clone(),
                name: file.name.clone(),
            });
            state.fail_uploads.contains(&file.name)
        };
        self.round_trip().await;
        if fail {
            let body = serde_json::json!({ "error": format!("could not store {}", file.name) });
            return Err(StoreError::from_response(500, body.to_string().as_bytes()));
        }

        let mut state = self.state.lock();
        let id = AssetId::new(state.next_id);
        state.next_id += 1;
        let order_index = state
            .assets
            .values()
            .filter(|(c, _)| c == category)
            .map(|(_, asset)| asset.order_index + 1)
            .max()
            .unwrap_or(0);

        let mut metadata = Map::new();
        metadata.insert("name".into(), Value::from(file.name.clone()));
        metadata.insert("size".into(), Value::from(file.size));
        if let Some(content_type) = &file.content_type {
            metadata.insert("content_type".into(), Value::from(content_type.clone()));
        }

        let asset = Asset {
            id,
            src: format!("/media/{category}/{id}/{}", file.name),
            caption: String::new(),
            order_index,
            metadata: Some(metadata),
        };
        state.assets.insert(id, (category.clone(), asset.clone()));
        tracing::debug!(%category, %id, order_index, "memory store: created asset");
        Ok(asset)
    }

    async fn update_asset(&self, id: AssetId, patch: AssetPatch) -> StoreResult<Asset> {
        let fail = {
            let mut state = self.state.lock();
            state.calls.push(StoreCall::Update { id, patch: patch.clone() });
            state.fail_updates
        };
        self.round_trip().await;
        if fail {
            return Err(StoreError::Transport(format!("update of asset {id} dropped")));
        }

        let mut state = self.state.lock();
        let (_, asset) = state.assets.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let normalized = AssetPatch {
            caption: patch.caption.map(|c| c.trim().to_string()),
            order_index: patch.order_index,
        };
        normalized.apply(asset);
        Ok(asset.clone())
    }

    async fn delete_asset(&self, id: AssetId) -> StoreResult<()> {
        let fail = {
            let mut state = self.state.lock();
            state.calls.push(StoreCall::Delete { id });
            state.fail_deletes.contains(&id)
        };
        self.round_trip().await;
        if fail {
            return Err(StoreError::from_response(409, br#"{"error": "asset is locked"}"#));
        }
        self.state.lock().assets.remove(&id);
        Ok(())
    }
}
