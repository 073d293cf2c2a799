//! Asset panels for report attachments.
//!
//! Each category of a report (photos, brochure pages, a thread's files,
//! worksheets, an evaluation sheet, a feedback form) gets an [`AssetPanel`]
//! that keeps an ordered list of uploaded assets consistent with a remote
//! [`AssetStore`]:
//!
//! - intake screens offered files and uploads them strictly one at a time;
//! - reorders update the local model first, then push only changed indices;
//! - caption keystrokes are coalesced per asset into one write;
//! - deletes remove locally only after the store confirms, then reindex;
//! - a shared [`PendingWork`] gate disables the form's save while uploads run.
//!
//! After every mutation the panel re-projects its preview into the shared
//! [`Annexures`] structure read by the rendering layer.
//!
//! All panels of one form are normally built through [`AnnexureManager`].

pub mod caption;
pub mod collection;
pub mod config;
pub mod constants;
pub mod error;
pub mod gate;
pub mod host;
pub mod intake;
pub mod manager;
pub mod notice;
pub mod panel;
pub mod preview;
pub mod store;

pub use caption::FlushReport;
pub use collection::AssetCollection;
pub use config::{ConfigError, ManagerConfig, stock_panels};
pub use error::PanelError;
pub use gate::{PendingGuard, PendingWork, SaveControl};
pub use host::{AlwaysConfirm, NeverConfirm, PanelHost, ScriptedHost};
pub use intake::{RejectReason, Rejection};
pub use manager::{AnnexureManager, SaveReadiness};
pub use notice::{Notice, NoticeKind, Notices};
pub use panel::{
    AssetPanel, DeleteMode, DeleteOutcome, IntakeAbort, IntakeReport, PanelContext,
    PanelSettings, ReorderReport,
};
pub use preview::{Annexures, project};
pub use store::{AssetStore, MemoryStore, StoreCall, StoreError};

pub use annexure_types::{
    Asset, AssetId, AssetPatch, Bootstrap, CandidateFile, Category, CategoryPreview, PanelConfig,
    PanelConfigError, PreviewItem, parse_bootstrap,
};
