//! Form-level panel configuration.
//!
//! Loaded from RON:
//!
//! ```ron
//! (
//!     panels: [
//!         (category: "photos", max_items: Some(20)),
//!         (category: "evaluation", singleton: true),
//!     ],
//!     caption_debounce_ms: 500,
//! )
//! ```
//!
//! Every field has a default; an empty `()` yields the stock categories.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use annexure_types::{Category, PanelConfig, PanelConfigError};

use crate::constants::{CAPTION_DEBOUNCE, DEFAULT_SAVE_LABEL, MAX_FILE_BYTES, NOTICE_TTL};
use crate::panel::PanelSettings;

/// Errors loading or validating a [`ManagerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid panel: {0}")]
    Panel(#[from] PanelConfigError),
    #[error("category {0} is configured twice")]
    DuplicateCategory(Category),
    #[error("max_file_bytes must be greater than zero")]
    ZeroFileLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub panels: Vec<PanelConfig>,
    pub caption_debounce_ms: u64,
    pub notice_ttl_ms: u64,
    pub max_file_bytes: u64,
    /// Label of the hosting form's save affordance when idle.
    pub save_label: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            panels: stock_panels(),
            caption_debounce_ms: CAPTION_DEBOUNCE.as_millis() as u64,
            notice_ttl_ms: NOTICE_TTL.as_millis() as u64,
            max_file_bytes: MAX_FILE_BYTES,
            save_label: DEFAULT_SAVE_LABEL.to_string(),
        }
    }
}

/// The categories a report form ships with.
pub fn stock_panels() -> Vec<PanelConfig> {
    vec![
        PanelConfig::multiple("photos", Some(20)),
        PanelConfig::multiple("brochure", Some(10)),
        PanelConfig::multiple("thread", None),
        PanelConfig::multiple("worksheets", Some(10)),
        PanelConfig::singleton("evaluation"),
        PanelConfig::singleton("feedback"),
    ]
}

impl ManagerConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: ManagerConfig = ron::from_str(text)?;
        config.validated()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Normalise every panel and reject duplicates.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.max_file_bytes == 0 {
            return Err(ConfigError::ZeroFileLimit);
        }
        let mut seen = HashSet::new();
        let mut panels = Vec::with_capacity(self.panels.len());
        for panel in self.panels {
            let panel = panel.normalized()?;
            if !seen.insert(panel.category.clone()) {
                return Err(ConfigError::DuplicateCategory(panel.category));
            }
            panels.push(panel);
        }
        self.panels = panels;
        Ok(self)
    }

    pub fn settings(&self) -> PanelSettings {
        PanelSettings {
            caption_debounce: Duration::from_millis(self.caption_debounce_ms),
            notice_ttl: Duration::from_millis(self.notice_ttl_ms),
            max_file_bytes: self.max_file_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_empty_ron_gives_stock_panels() {
        let config = ManagerConfig::from_ron("()").unwrap();
        assert_eq!(config.panels.len(), 6);
        assert_eq!(config.settings(), PanelSettings::default());
    }

    #[test]
    fn test_parse_panels() {
        let config = ManagerConfig::from_ron(
            r#"(
                panels: [
                    (category: "photos", max_items: Some(3), accept: ["jpg", "PNG"]),
                    (category: "evaluation", singleton: true, max_items: Some(9)),
                ],
                caption_debounce_ms: 250,
                save_label: "Submit",
            )"#,
        )
        .unwrap();
        assert_eq!(config.panels[0].accept, vec!["jpg", "png"]);
        assert_eq!(config.panels[1].max_items, Some(1));
        assert_eq!(config.settings().caption_debounce, Duration::from_millis(250));
        assert_eq!(config.save_label, "Submit");
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let err = ManagerConfig::from_ron(
            r#"(panels: [(category: "photos"), (category: "photos")])"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCategory(c) if c.as_str() == "photos"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ManagerConfig::from_ron(r#"(panels: [(category: "photos", max_items: Some(0))])"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Panel(PanelConfigError::ZeroCapacity(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"(panels: [(category: "thread")], notice_ttl_ms: 1000)"#).unwrap();
        let config = ManagerConfig::load(file.path()).unwrap();
        assert_eq!(config.panels.len(), 1);
        assert_eq!(config.settings().notice_ttl, Duration::from_millis(1000));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = ManagerConfig::from_ron("(panels: [").unwrap_err();
        assert!(matches!(err, ConfigError::Ron(_)));
    }
}
