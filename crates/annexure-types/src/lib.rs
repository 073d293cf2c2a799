//! Shared types for annexure panels.
//!
//! This crate is the leaf of the workspace: asset records as the remote store
//! returns them, per-category panel configuration, candidate files offered for
//! upload, and the denormalized preview records handed to the rendering layer.
//! It has **no internal annexure dependencies**.
//!
//! # Overview
//!
//! ```text
//! Report record
//!     └── Panel (Category + PanelConfig)
//!         └── AssetCollection (ordered by order_index, then AssetId)
//!             └── Asset (AssetId, src, caption, order_index, metadata)
//!
//! Annexures (page-global)
//!     └── Category → CategoryPreview (Many(Vec<PreviewItem>) | One(PreviewItem))
//! ```
//!
//! # Key Types
//!
//! |---------------------|--------------------------------------------------|
//! | Type                | Purpose                                          |
//! |---------------------|--------------------------------------------------|
//! | [`AssetId`]         | Opaque server-assigned asset identifier          |
//! | [`Asset`]           | Canonical asset record                           |
//! | [`AssetPatch`]      | Partial update payload (caption, order index)    |
//! | [`Category`]        | Panel category name                              |
//! | [`PanelConfig`]     | Static per-category panel parameters             |
//! | [`CandidateFile`]   | A file offered to a panel's intake               |
//! | [`CategoryPreview`] | Preview projection of one panel                  |
//! | [`Bootstrap`]       | Initial assets seeded from the hosting page      |
//! |---------------------|--------------------------------------------------|

pub mod asset;
pub mod file;
pub mod ids;
pub mod panel;
pub mod preview;

pub use asset::{Asset, AssetPatch, Bootstrap, parse_bootstrap, sort_assets};
pub use file::CandidateFile;
pub use ids::AssetId;
pub use panel::{Category, DEFAULT_ACCEPT, PanelConfig, PanelConfigError};
pub use preview::{CategoryPreview, EMPTY_CAPTION, PreviewItem};
