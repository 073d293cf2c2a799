//! Panel defaults.
//!
//! Centralizes hardcoded values; all of them can be overridden through
//! [`ManagerConfig`](crate::ManagerConfig).

use std::time::Duration;

/// Quiet period after the last caption keystroke before it is persisted.
pub const CAPTION_DEBOUNCE: Duration = Duration::from_millis(500);

/// Largest file accepted by intake (10 MiB).
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// How long a panel notice stays visible before it is cleared.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Save affordance label while uploads are outstanding.
pub const BUSY_LABEL: &str = "Uploading…";

/// Save affordance label when idle.
pub const DEFAULT_SAVE_LABEL: &str = "Save";

/// Notices kept per panel for inspection.
pub const NOTICE_HISTORY: usize = 32;
