//! All panels of one report form.
//!
//! Owns one [`AssetPanel`] per configured category plus the collaborators
//! they share: the store, the pending-work gate and the `annexures` sink.

use std::collections::BTreeMap;
use std::sync::Arc;

use annexure_types::{Bootstrap, Category, CategoryPreview};
use tokio::sync::watch;

use crate::caption::FlushReport;
use crate::config::{ConfigError, ManagerConfig};
use crate::gate::{PendingWork, SaveControl};
use crate::host::PanelHost;
use crate::panel::{AssetPanel, PanelContext};
use crate::preview::Annexures;
use crate::store::AssetStore;

/// What the form should do with its save affordance after [`AnnexureManager::prepare_save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReadiness {
    pub captions: FlushReport,
    pub control: SaveControl,
}

impl SaveReadiness {
    /// Saving is safe: no uploads outstanding and the control is enabled.
    pub fn ready(&self) -> bool {
        self.control.enabled
    }
}

pub struct AnnexureManager {
    panels: BTreeMap<Category, AssetPanel>,
    ctx: PanelContext,
}

impl AnnexureManager {
    /// Build every configured panel, seeding each from `bootstrap`.
    ///
    /// Bootstrap categories without a configured panel are ignored.
    pub fn new(
        config: ManagerConfig,
        store: Arc<dyn AssetStore>,
        host: Arc<dyn PanelHost>,
        mut bootstrap: Bootstrap,
    ) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        let settings = config.settings();
        let ctx = PanelContext::new(store, host)
            .with_gate(PendingWork::new(SaveControl::enabled(config.save_label.clone())))
            .with_annexures(Annexures::new());

        let mut panels = BTreeMap::new();
        for panel_config in config.panels {
            let seed = bootstrap.remove(&panel_config.category).unwrap_or_default();
            let category = panel_config.category.clone();
            let panel = AssetPanel::new(panel_config, seed, ctx.clone(), settings)?;
            tracing::debug!(%category, len = panel.len(), "panel ready");
            panels.insert(category, panel);
        }
        for (category, assets) in &bootstrap {
            tracing::warn!(%category, count = assets.len(), "bootstrap category has no panel; ignored");
        }

        Ok(Self { panels, ctx })
    }

    pub fn panel(&self, category: &Category) -> Option<&AssetPanel> {
        self.panels.get(category)
    }

    pub fn panels(&self) -> impl Iterator<Item = &AssetPanel> {
        self.panels.values()
    }

    pub fn gate(&self) -> &PendingWork {
        &self.ctx.gate
    }

    pub fn save_control(&self) -> SaveControl {
        self.ctx.gate.save_control()
    }

    pub fn subscribe_save(&self) -> watch::Receiver<SaveControl> {
        self.ctx.gate.subscribe()
    }

    /// The shared `annexures` structure.
    pub fn annexures(&self) -> &Annexures {
        &self.ctx.annexures
    }

    pub fn snapshot(&self) -> BTreeMap<Category, CategoryPreview> {
        self.ctx.annexures.snapshot()
    }

    /// Flush every panel's pending captions before the form saves.
    pub async fn prepare_save(&self) -> SaveReadiness {
        let reports =
            futures::future::join_all(self.panels.values().map(|panel| panel.flush_captions())).await;
        let mut captions = FlushReport::default();
        for report in reports {
            captions.merge(report);
        }
        if captions.failed > 0 {
            tracing::warn!(failed = captions.failed, "some captions could not be saved");
        }
        SaveReadiness { captions, control: self.ctx.gate.save_control() }
    }
}

#[cfg(test)]
mod tests {
    use annexure_types::{Asset, AssetId};

    use super::*;
    use crate::host::AlwaysConfirm;
    use crate::store::MemoryStore;

    fn asset(id: u64, order_index: i64) -> Asset {
        Asset {
            id: AssetId::new(id),
            src: format!("/m/{id}.pdf"),
            caption: format!("sheet {id}"),
            order_index,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_panels() {
        let mut bootstrap = Bootstrap::new();
        bootstrap.insert(Category::new("worksheets"), vec![asset(2, 1), asset(1, 0)]);
        bootstrap.insert(Category::new("evaluation"), vec![asset(5, 0), asset(6, 1)]);
        bootstrap.insert(Category::new("unknown"), vec![asset(9, 0)]);

        let manager = AnnexureManager::new(
            ManagerConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(AlwaysConfirm),
            bootstrap,
        )
        .unwrap();

        let worksheets = manager.panel(&Category::new("worksheets")).unwrap();
        assert_eq!(worksheets.ids(), vec![AssetId::new(1), AssetId::new(2)]);
        let evaluation = manager.panel(&Category::new("evaluation")).unwrap();
        assert_eq!(evaluation.len(), 1);
        assert!(manager.panel(&Category::new("unknown")).is_none());

        let snapshot = manager.snapshot();
        assert_eq!(snapshot.len(), 6);
        assert_eq!(snapshot[&Category::new("worksheets")].len(), 2);
        assert!(snapshot[&Category::new("feedback")].is_empty());
    }

    #[tokio::test]
    async fn test_prepare_save_with_nothing_pending() {
        let manager = AnnexureManager::new(
            ManagerConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(AlwaysConfirm),
            Bootstrap::new(),
        )
        .unwrap();
        let readiness = manager.prepare_save().await;
        assert!(readiness.ready());
        assert_eq!(readiness.captions, FlushReport::default());
        assert_eq!(readiness.control, SaveControl::enabled("Save"));
    }
}
