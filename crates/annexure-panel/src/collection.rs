//! A panel's ordered asset list.
//!
//! The list is kept sorted by `(order_index, id)` after every mutation.
//! Order changes are computed here as plain diffs; the panel decides which
//! of them to push to the store.

use std::collections::{HashMap, HashSet};

use annexure_types::{Asset, AssetId, sort_assets};

/// An order index that changed: `(asset, new index)`.
pub type IndexChange = (AssetId, i64);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetCollection {
    assets: Vec<Asset>,
}

impl AssetCollection {
    pub fn new(mut assets: Vec<Asset>) -> Self {
        sort_assets(&mut assets);
        Self { assets }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn as_slice(&self) -> &[Asset] {
        &self.assets
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    pub fn first(&self) -> Option<&Asset> {
        self.assets.first()
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.get(id).is_some()
    }

    /// Current display order as ids.
    pub fn ids(&self) -> Vec<AssetId> {
        self.assets.iter().map(|a| a.id).collect()
    }

    /// Append a confirmed asset and restore the sort order.
    ///
    /// An asset with the same id replaces the existing entry.
    pub fn insert(&mut self, asset: Asset) {
        self.assets.retain(|a| a.id != asset.id);
        self.assets.push(asset);
        sort_assets(&mut self.assets);
    }

    pub fn remove(&mut self, id: AssetId) -> Option<Asset> {
        let pos = self.assets.iter().position(|a| a.id == id)?;
        Some(self.assets.remove(pos))
    }

    /// Keep only the first `len` assets in display order.
    pub fn truncate(&mut self, len: usize) -> Vec<Asset> {
        if self.assets.len() <= len {
            return Vec::new();
        }
        self.assets.split_off(len)
    }

    /// Set a caption from a store response. Returns false if the asset is gone.
    pub fn set_caption(&mut self, id: AssetId, caption: String) -> bool {
        match self.assets.iter_mut().find(|a| a.id == id) {
            Some(asset) => {
                asset.caption = caption;
                true
            }
            None => false,
        }
    }

    /// Assign `order_index = position` to every asset in current order.
    ///
    /// Idempotent; returns only the assets whose index actually changed.
    pub fn reindex(&mut self) -> Vec<IndexChange> {
        let mut changed = Vec::new();
        for (position, asset) in self.assets.iter_mut().enumerate() {
            let position = position as i64;
            if asset.order_index != position {
                asset.order_index = position;
                changed.push((asset.id, position));
            }
        }
        changed
    }

    /// Rebuild the list in the order shown after a drag.
    ///
    /// Returns `None` when `visual` already matches the model. Unknown ids and
    /// repeated ids in `visual` are dropped; model assets missing from
    /// `visual` keep their relative order after the visible ones. Every
    /// asset then gets `order_index = position`, and the assets whose index
    /// changed are returned.
    pub fn apply_visual_order(&mut self, visual: &[AssetId]) -> Option<Vec<IndexChange>> {
        if visual == self.ids().as_slice() {
            return None;
        }

        let previous: HashMap<AssetId, i64> =
            self.assets.iter().map(|a| (a.id, a.order_index)).collect();
        let mut by_id: HashMap<AssetId, Asset> =
            self.assets.drain(..).map(|a| (a.id, a)).collect();
        let leftovers_order: Vec<AssetId> = previous_order(&previous);

        let mut seen = HashSet::new();
        let mut rebuilt: Vec<Asset> = visual
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| by_id.remove(id))
            .collect();
        rebuilt.extend(leftovers_order.iter().filter_map(|id| by_id.remove(id)));

        let mut changed = Vec::new();
        for (position, asset) in rebuilt.iter_mut().enumerate() {
            let position = position as i64;
            asset.order_index = position;
            if previous.get(&asset.id) != Some(&position) {
                changed.push((asset.id, position));
            }
        }
        self.assets = rebuilt;
        Some(changed)
    }
}

/// Ids sorted by their previous `(order_index, id)`.
fn previous_order(previous: &HashMap<AssetId, i64>) -> Vec<AssetId> {
    let mut ids: Vec<(i64, AssetId)> = previous.iter().map(|(id, idx)| (*idx, *id)).collect();
    ids.sort();
    ids.into_iter().map(|(_, id)| id).collect()
}
