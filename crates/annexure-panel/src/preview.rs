//! Preview projection and the page-global `annexures` structure.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use annexure_types::{Asset, CategoryPreview, Category, EMPTY_CAPTION, PanelConfig, PreviewItem};

/// Project a panel's assets into its preview record.
///
/// Pure: the same input always yields the same output.
pub fn project(config: &PanelConfig, assets: &[Asset]) -> CategoryPreview {
    if config.singleton {
        return CategoryPreview::One(
            assets.first().map(preview_item).unwrap_or_else(PreviewItem::placeholder),
        );
    }
    CategoryPreview::Many(assets.iter().map(preview_item).collect())
}

fn preview_item(asset: &Asset) -> PreviewItem {
    let caption = asset.caption.trim();
    PreviewItem {
        src: asset.src.clone(),
        caption: if caption.is_empty() { EMPTY_CAPTION.to_string() } else { caption.to_string() },
        metadata: asset.metadata.clone(),
    }
}

/// Shared per-category previews read by the rendering layer on submit.
#[derive(Debug, Clone, Default)]
pub struct Annexures {
    inner: Arc<RwLock<BTreeMap<Category, CategoryPreview>>>,
}

impl Annexures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one category's preview.
    pub fn publish(&self, category: &Category, preview: CategoryPreview) {
        self.inner.write().insert(category.clone(), preview);
    }

    pub fn get(&self, category: &Category) -> Option<CategoryPreview> {
        self.inner.read().get(category).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<Category, CategoryPreview> {
        self.inner.read().clone()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&*self.inner.read()).unwrap_or(serde_json::Value::Null)
    }
}
