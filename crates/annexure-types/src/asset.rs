//! Asset records and partial-update payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::AssetId;
use crate::panel::Category;

/// One uploaded file's canonical record.
///
/// Only ever constructed from a store response or from bootstrap data; the
/// panel never fabricates an id locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    /// Where the uploaded file can be fetched from.
    #[serde(alias = "url")]
    pub src: String,
    #[serde(default)]
    pub caption: String,
    /// Display position within the panel. Ties are broken by `id`.
    #[serde(default)]
    pub order_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Asset {
    /// Sort key defining display order.
    pub fn order_key(&self) -> (i64, AssetId) {
        (self.order_index, self.id)
    }
}

/// Sort assets by `(order_index, id)` ascending.
pub fn sort_assets(assets: &mut [Asset]) {
    assets.sort_by_key(Asset::order_key);
}

/// Partial update: only `Some` fields are sent and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
}

impl AssetPatch {
    pub fn caption(text: impl Into<String>) -> Self {
        Self { caption: Some(text.into()), order_index: None }
    }

    pub fn order_index(index: i64) -> Self {
        Self { caption: None, order_index: Some(index) }
    }

    pub fn is_empty(&self) -> bool {
        self.caption.is_none() && self.order_index.is_none()
    }

    /// Apply this patch to an asset in place.
    pub fn apply(&self, asset: &mut Asset) {
        if let Some(caption) = &self.caption {
            asset.caption = caption.clone();
        }
        if let Some(index) = self.order_index {
            asset.order_index = index;
        }
    }
}

/// Initial assets per category, as embedded by the hosting page.
pub type Bootstrap = BTreeMap<Category, Vec<Asset>>;

/// Parse a bootstrap JSON document (`{"photos": [{...}], ...}`).
pub fn parse_bootstrap(json: &str) -> Result<Bootstrap, serde_json::Error> {
    serde_json::from_str(json)
}
