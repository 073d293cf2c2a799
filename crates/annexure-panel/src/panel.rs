//! One category's asset panel.
//!
//! [`AssetPanel`] is a cheap, clonable handle over the panel's shared state.
//! Every user action maps to one async operation:
//!
//! ```text
//!   files dropped   ──▶ accept_files ──▶ screen ──▶ upload_one (one at a time)
//!   drag finished   ──▶ reorder      ──▶ local order ──▶ changed indices (settle-all)
//!   caption typed   ──▶ schedule_caption_update ──▶ CaptionCoalescer ──▶ store
//!   delete clicked  ──▶ delete_asset ──▶ store ──▶ local remove ──▶ reindex (settle-all)
//!                                   │
//!                   every mutation ─┴─▶ project ──▶ Annexures
//! ```
//!
//! Local order is authoritative: order-index writes are a best-effort mirror
//! and their failures never roll the model back. Deletes are the exception,
//! the asset only leaves the collection once the store confirms.
//!
//! Failures never escape an operation. They are shown as panel notices and
//! returned in the operation's report.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;

use annexure_types::{
    Asset, AssetId, AssetPatch, CandidateFile, Category, CategoryPreview, PanelConfig,
    PanelConfigError,
};

use crate::caption::{CaptionCoalescer, CaptionSink, FlushReport};
use crate::collection::{AssetCollection, IndexChange};
use crate::constants::{CAPTION_DEBOUNCE, MAX_FILE_BYTES, NOTICE_TTL};
use crate::error::PanelError;
use crate::gate::PendingWork;
use crate::host::PanelHost;
use crate::intake::{Rejection, screen};
use crate::notice::Notices;
use crate::preview::{Annexures, project};
use crate::store::AssetStore;

/// Tunables shared by all panels of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSettings {
    pub caption_debounce: Duration,
    pub notice_ttl: Duration,
    pub max_file_bytes: u64,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            caption_debounce: CAPTION_DEBOUNCE,
            notice_ttl: NOTICE_TTL,
            max_file_bytes: MAX_FILE_BYTES,
        }
    }
}

/// Collaborators shared by every panel of one form.
#[derive(Clone)]
pub struct PanelContext {
    pub store: Arc<dyn AssetStore>,
    pub host: Arc<dyn PanelHost>,
    pub gate: PendingWork,
    pub annexures: Annexures,
}

impl PanelContext {
    pub fn new(store: Arc<dyn AssetStore>, host: Arc<dyn PanelHost>) -> Self {
        Self {
            store,
            host,
            gate: PendingWork::default(),
            annexures: Annexures::new(),
        }
    }

    pub fn with_gate(mut self, gate: PendingWork) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_annexures(mut self, annexures: Annexures) -> Self {
        self.annexures = annexures;
        self
    }
}

/// Whether a delete asks the user first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    Confirm,
    /// No prompt; used when replacing a singleton's asset.
    Silent,
}

/// Why an intake stopped before screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeAbort {
    ReplaceDeclined,
    ReplaceFailed,
    PanelFull,
}

/// What an [`AssetPanel::accept_files`] call did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntakeReport {
    /// Assets created, in upload order.
    pub uploaded: Vec<AssetId>,
    pub rejected: Vec<Rejection>,
    /// Valid files left out for capacity.
    pub skipped: usize,
    /// The singleton asset deleted to make room.
    pub replaced: Option<AssetId>,
    /// The failure that stopped the batch, if any.
    pub failure: Option<PanelError>,
    pub aborted: Option<IntakeAbort>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderReport {
    Unchanged,
    Reordered { changed: usize, failed: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { reindexed: usize, failed: usize },
    Declined,
    Failed(PanelError),
}

struct PanelShared {
    config: PanelConfig,
    settings: PanelSettings,
    ctx: PanelContext,
    collection: Mutex<AssetCollection>,
    captions: CaptionCoalescer,
    notices: Notices,
    /// Held for a whole intake batch so uploads in one panel never overlap.
    intake: tokio::sync::Mutex<()>,
}

#[derive(Clone)]
pub struct AssetPanel {
    shared: Arc<PanelShared>,
}

impl std::fmt::Debug for AssetPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetPanel")
            .field("category", &self.shared.config.category)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl AssetPanel {
    /// Build a panel seeded with assets from the hosting page.
    pub fn new(
        config: PanelConfig,
        seed: Vec<Asset>,
        ctx: PanelContext,
        settings: PanelSettings,
    ) -> Result<Self, PanelConfigError> {
        let config = config.normalized()?;
        let mut collection = AssetCollection::new(seed);
        if config.singleton {
            let dropped = collection.truncate(1);
            if !dropped.is_empty() {
                tracing::warn!(
                    category = %config.category,
                    dropped = dropped.len(),
                    "singleton panel seeded with more than one asset; keeping the first"
                );
            }
        } else if let Some(max) = config.max_items {
            if collection.len() > max {
                tracing::warn!(
                    category = %config.category,
                    len = collection.len(),
                    max,
                    "panel seeded above its capacity"
                );
            }
        }

        let shared = Arc::new(PanelShared {
            captions: CaptionCoalescer::new(settings.caption_debounce),
            notices: Notices::new(settings.notice_ttl),
            collection: Mutex::new(collection),
            intake: tokio::sync::Mutex::new(()),
            config,
            settings,
            ctx,
        });
        shared.publish_preview();
        Ok(Self { shared })
    }

    pub fn config(&self) -> &PanelConfig {
        &self.shared.config
    }

    pub fn category(&self) -> &Category {
        &self.shared.config.category
    }

    pub fn notices(&self) -> &Notices {
        &self.shared.notices
    }

    /// Current assets in display order.
    pub fn assets(&self) -> Vec<Asset> {
        self.shared.collection.lock().as_slice().to_vec()
    }

    pub fn ids(&self) -> Vec<AssetId> {
        self.shared.collection.lock().ids()
    }

    pub fn len(&self) -> usize {
        self.shared.collection.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// This panel's preview, freshly projected.
    pub fn preview(&self) -> CategoryPreview {
        let collection = self.shared.collection.lock();
        project(&self.shared.config, collection.as_slice())
    }

    // ── Intake ───────────────────────────────────────────────────────────

    /// Screen a batch of offered files and upload the accepted ones in the
    /// order given, one at a time. Stops at the first failed upload; assets
    /// uploaded before it stay.
    ///
    /// A singleton's current asset is only replaced once a file has passed
    /// screening.
    pub async fn accept_files(&self, files: Vec<CandidateFile>) -> IntakeReport {
        let mut report = IntakeReport::default();
        if files.is_empty() {
            return report;
        }
        let shared = &self.shared;
        let category = &shared.config.category;
        let _batch = shared.intake.lock().await;

        // A singleton always has room for one file: it replaces the current one.
        let available = if shared.config.singleton {
            Some(1)
        } else {
            let len = shared.collection.lock().len();
            shared.config.max_items.map(|max| max.saturating_sub(len))
        };
        if available == Some(0) {
            let max = shared.config.max_items.unwrap_or_default();
            shared.notices.error(format!("{category} already holds the maximum of {max} file(s)"));
            report.aborted = Some(IntakeAbort::PanelFull);
            return report;
        }

        let screening = screen(&shared.config, shared.settings.max_file_bytes, available, files);
        let skipped_line = (screening.skipped > 0)
            .then(|| format!("{} file(s) skipped: panel limit reached", screening.skipped));
        match (screening.rejection_message(&shared.config), skipped_line) {
            (Some(rejected), Some(skipped)) => shared.notices.error(format!("{rejected}\n{skipped}")),
            (Some(rejected), None) => shared.notices.error(rejected),
            (None, Some(skipped)) => shared.notices.info(skipped),
            (None, None) => {}
        }
        report.rejected = screening.rejections;
        report.skipped = screening.skipped;
        if screening.accepted.is_empty() {
            return report;
        }

        if shared.config.singleton {
            let existing = shared.collection.lock().first().map(|a| a.id);
            if let Some(existing) = existing {
                let prompt = format!("Replace the current {category} file?");
                if !shared.ctx.host.confirm(&prompt).await {
                    report.aborted = Some(IntakeAbort::ReplaceDeclined);
                    return report;
                }
                match self.delete_asset(existing, DeleteMode::Silent).await {
                    DeleteOutcome::Deleted { .. } => report.replaced = Some(existing),
                    DeleteOutcome::Failed(e) => {
                        report.failure = Some(e);
                        report.aborted = Some(IntakeAbort::ReplaceFailed);
                        return report;
                    }
                    DeleteOutcome::Declined => {
                        report.aborted = Some(IntakeAbort::ReplaceDeclined);
                        return report;
                    }
                }
            }
        }

        for file in screening.accepted {
            match self.upload_one(file).await {
                Ok(asset) => report.uploaded.push(asset.id),
                Err(e) => {
                    tracing::warn!(%category, "stopping batch: {e}");
                    shared.notices.error(e.to_string());
                    report.failure = Some(e);
                    break;
                }
            }
        }
        report
    }

    // ── Upload sequencer ─────────────────────────────────────────────────

    /// Upload a single file and add the confirmed asset to the collection.
    ///
    /// Counts as pending work for exactly the duration of the store call.
    /// Does not screen the file; [`accept_files`](Self::accept_files) does.
    pub async fn upload_one(&self, file: CandidateFile) -> Result<Asset, PanelError> {
        let shared = &self.shared;
        let name = file.name.clone();
        let result = {
            let _pending = shared.ctx.gate.acquire();
            shared.ctx.store.create_asset(&shared.config.category, file).await
        };
        let asset = result.map_err(|source| PanelError::Upload { file: name, source })?;

        shared.collection.lock().insert(asset.clone());
        shared.publish_preview();
        tracing::info!(category = %shared.config.category, id = %asset.id, "uploaded asset");
        Ok(asset)
    }

    // ── Reorder ──────────────────────────────────────────────────────────

    /// Reconcile the order shown after a drag with the model.
    ///
    /// The model is updated and re-projected before any write; then one
    /// order-index update per changed asset is sent, all at once.
    pub async fn reorder(&self, visual: &[AssetId]) -> ReorderReport {
        let changed = self.shared.collection.lock().apply_visual_order(visual);
        let Some(changed) = changed else {
            return ReorderReport::Unchanged;
        };
        self.shared.publish_preview();

        let failed = self.shared.push_order_indices(&changed).await;
        if failed > 0 {
            self.shared.notices.error(format!("{failed} order update(s) could not be saved"));
        }
        ReorderReport::Reordered { changed: changed.len(), failed }
    }

    // ── Captions ─────────────────────────────────────────────────────────

    /// Record a caption keystroke; persisted once typing pauses.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule_caption_update(&self, id: AssetId, text: impl Into<String>) {
        if !self.shared.collection.lock().contains(id) {
            tracing::warn!(category = %self.shared.config.category, %id, "caption for unknown asset ignored");
            return;
        }
        self.shared.captions.schedule(Arc::downgrade(&self.shared), id, text.into());
    }

    /// The caption typed for `id` that has not been persisted yet.
    pub fn pending_caption(&self, id: AssetId) -> Option<String> {
        self.shared.captions.pending(id)
    }

    /// Persist every pending caption now.
    pub async fn flush_captions(&self) -> FlushReport {
        self.shared.captions.flush(self.shared.as_ref()).await
    }

    // ── Delete ───────────────────────────────────────────────────────────

    /// Delete an asset, then close the gap it leaves in the order.
    pub async fn delete_asset(&self, id: AssetId, mode: DeleteMode) -> DeleteOutcome {
        let shared = &self.shared;
        let exists = shared.collection.lock().contains(id);
        if !exists {
            let err = PanelError::UnknownAsset(id);
            shared.notices.error(err.to_string());
            return DeleteOutcome::Failed(err);
        }
        if mode == DeleteMode::Confirm && !shared.ctx.host.confirm("Delete this file?").await {
            return DeleteOutcome::Declined;
        }

        if let Err(source) = shared.ctx.store.delete_asset(id).await {
            let err = PanelError::Delete { id, source };
            tracing::warn!(category = %shared.config.category, "{err}");
            shared.notices.error(err.to_string());
            return DeleteOutcome::Failed(err);
        }

        shared.captions.cancel(id);
        let changed = {
            let mut collection = shared.collection.lock();
            collection.remove(id);
            collection.reindex()
        };
        shared.publish_preview();
        tracing::info!(category = %shared.config.category, %id, "deleted asset");

        let failed = shared.push_order_indices(&changed).await;
        if failed > 0 {
            shared.notices.error(format!("{failed} order update(s) could not be saved"));
        }
        DeleteOutcome::Deleted { reindexed: changed.len(), failed }
    }
}

impl PanelShared {
    fn publish_preview(&self) {
        let preview = {
            let collection = self.collection.lock();
            project(&self.config, collection.as_slice())
        };
        self.ctx.annexures.publish(&self.config.category, preview);
    }

    /// Send one order-index update per change, concurrently. Returns how
    /// many failed; the local model is left as is either way.
    async fn push_order_indices(&self, changes: &[IndexChange]) -> usize {
        if changes.is_empty() {
            return 0;
        }
        let store = &self.ctx.store;
        let results = join_all(
            changes
                .iter()
                .map(|&(id, index)| store.update_asset(id, AssetPatch::order_index(index))),
        )
        .await;

        let mut failed = 0;
        for (&(id, index), result) in changes.iter().zip(results) {
            if let Err(e) = result {
                failed += 1;
                tracing::warn!(category = %self.config.category, %id, index, "order update failed: {e}");
            }
        }
        failed
    }
}

#[async_trait]
impl CaptionSink for PanelShared {
    async fn persist_caption(&self, id: AssetId, caption: String) -> Result<(), PanelError> {
        match self.ctx.store.update_asset(id, AssetPatch::caption(caption)).await {
            Ok(asset) => {
                // The store's caption wins over what was typed.
                let applied = self.collection.lock().set_caption(id, asset.caption);
                if applied {
                    self.publish_preview();
                }
                Ok(())
            }
            Err(source) => {
                let err = PanelError::Update { id, source };
                self.notices.error(err.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AlwaysConfirm, NeverConfirm};
    use crate::store::{MemoryStore, StoreCall};

    fn panel_with(config: PanelConfig, host: Arc<dyn PanelHost>) -> (AssetPanel, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let ctx = PanelContext::new(store.clone(), host);
        let panel = AssetPanel::new(config, Vec::new(), ctx, PanelSettings::default()).unwrap();
        (panel, store)
    }

    fn jpg(name: &str) -> CandidateFile {
        CandidateFile::new(name, vec![0xff, 0xd8])
    }

    #[tokio::test]
    async fn test_upload_appends_in_supplied_order() {
        let (panel, store) = panel_with(PanelConfig::multiple("photos", None), Arc::new(AlwaysConfirm));
        let report = panel.accept_files(vec![jpg("c.jpg"), jpg("a.jpg"), jpg("b.jpg")]).await;
        assert_eq!(report.uploaded.len(), 3);

        let created: Vec<String> = store
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Create { name, .. } => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(created, vec!["c.jpg", "a.jpg", "b.jpg"]);
        assert_eq!(panel.ids(), report.uploaded);
    }

    #[tokio::test]
    async fn test_full_panel_aborts_without_calls() {
        let (panel, store) = panel_with(PanelConfig::multiple("photos", Some(1)), Arc::new(AlwaysConfirm));
        panel.accept_files(vec![jpg("a.jpg")]).await;
        store.clear_calls();

        let report = panel.accept_files(vec![jpg("b.jpg")]).await;
        assert_eq!(report.aborted, Some(IntakeAbort::PanelFull));
        assert!(store.calls().is_empty());
        assert!(panel.notices().current().unwrap().text.contains("maximum of 1"));
    }

    #[tokio::test]
    async fn test_declined_delete_is_noop() {
        let (panel, store) = panel_with(PanelConfig::multiple("photos", None), Arc::new(NeverConfirm));
        let report = panel.accept_files(vec![jpg("a.jpg")]).await;
        store.clear_calls();

        let outcome = panel.delete_asset(report.uploaded[0], DeleteMode::Confirm).await;
        assert_eq!(outcome, DeleteOutcome::Declined);
        assert!(store.calls().is_empty());
        assert_eq!(panel.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_asset_fails() {
        let (panel, _store) = panel_with(PanelConfig::multiple("photos", None), Arc::new(AlwaysConfirm));
        let outcome = panel.delete_asset(AssetId::new(77), DeleteMode::Confirm).await;
        assert_eq!(outcome, DeleteOutcome::Failed(PanelError::UnknownAsset(AssetId::new(77))));
    }

    #[tokio::test]
    async fn test_preview_published_on_construction() {
        let store = Arc::new(MemoryStore::new());
        let ctx = PanelContext::new(store, Arc::new(AlwaysConfirm));
        let annexures = ctx.annexures.clone();
        AssetPanel::new(PanelConfig::singleton("evaluation"), Vec::new(), ctx, PanelSettings::default())
            .unwrap();
        assert_eq!(
            annexures.to_json(),
            serde_json::json!({"evaluation": {"src": "", "caption": "—"}})
        );
    }
}
