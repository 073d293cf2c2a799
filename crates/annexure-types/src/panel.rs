//! Per-category panel configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Extensions accepted when a panel does not list its own.
pub const DEFAULT_ACCEPT: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "pdf", "doc", "docx", "xls", "xlsx",
];

/// Panel category name (e.g. `photos`, `brochure`, `evaluation`).
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Category({})", self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Why a panel configuration was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelConfigError {
    #[error("panel category must not be empty")]
    EmptyCategory,
    #[error("panel {0}: max_items must be at least 1")]
    ZeroCapacity(Category),
}

/// Static parameters of one category panel. Immutable once a panel is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    pub category: Category,
    /// Whether more than one file may be picked at once.
    #[serde(default = "default_multiple")]
    pub multiple: bool,
    /// Upper bound on the collection length, if any.
    #[serde(default)]
    pub max_items: Option<usize>,
    /// At most one asset; uploading again asks to replace it.
    #[serde(default)]
    pub singleton: bool,
    /// Allowed extensions, lowercase without the dot. Empty means [`DEFAULT_ACCEPT`].
    #[serde(default)]
    pub accept: Vec<String>,
}

fn default_multiple() -> bool {
    true
}

impl PanelConfig {
    /// A multi-item panel with an optional capacity.
    pub fn multiple(category: impl Into<Category>, max_items: Option<usize>) -> Self {
        Self {
            category: category.into(),
            multiple: true,
            max_items,
            singleton: false,
            accept: Vec::new(),
        }
    }

    /// A singleton panel: one asset, replaced on re-upload.
    pub fn singleton(category: impl Into<Category>) -> Self {
        Self {
            category: category.into(),
            multiple: false,
            max_items: Some(1),
            singleton: true,
            accept: Vec::new(),
        }
    }

    pub fn with_accept<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accept = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and normalise: singletons always have `max_items = 1` and
    /// are single-select, extensions are lowercased without a leading dot.
    pub fn normalized(mut self) -> Result<Self, PanelConfigError> {
        if self.category.as_str().trim().is_empty() {
            return Err(PanelConfigError::EmptyCategory);
        }
        if self.max_items == Some(0) {
            return Err(PanelConfigError::ZeroCapacity(self.category));
        }
        if self.singleton {
            self.multiple = false;
            self.max_items = Some(1);
        }
        self.accept = self
            .accept
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Ok(self)
    }

    /// Whether `extension` (any case, no dot) is allowed in this panel.
    pub fn accepts(&self, extension: &str) -> bool {
        let extension = extension.to_ascii_lowercase();
        if self.accept.is_empty() {
            DEFAULT_ACCEPT.contains(&extension.as_str())
        } else {
            self.accept.iter().any(|e| *e == extension)
        }
    }

    /// Human-readable list of allowed extensions for messages.
    pub fn accept_list(&self) -> String {
        if self.accept.is_empty() {
            DEFAULT_ACCEPT.join(", ")
        } else {
            self.accept.join(", ")
        }
    }
}
