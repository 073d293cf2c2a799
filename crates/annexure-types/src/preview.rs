//! Preview records read by the rendering layer.
//!
//! Multi-item categories serialize as a JSON array, singletons as a single
//! object; an empty singleton renders as `{"src": "", "caption": "—"}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caption shown for an empty singleton and for assets without a caption.
pub const EMPTY_CAPTION: &str = "—";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewItem {
    pub src: String,
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl PreviewItem {
    /// The explicit placeholder for an empty singleton.
    pub fn placeholder() -> Self {
        Self {
            src: String::new(),
            caption: EMPTY_CAPTION.to_string(),
            metadata: None,
        }
    }
}

/// One category's projected preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryPreview {
    Many(Vec<PreviewItem>),
    One(PreviewItem),
}

impl CategoryPreview {
    pub fn len(&self) -> usize {
        match self {
            CategoryPreview::Many(items) => items.len(),
            CategoryPreview::One(item) if item.src.is_empty() => 0,
            CategoryPreview::One(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_shape() {
        let json = serde_json::to_value(CategoryPreview::One(PreviewItem::placeholder())).unwrap();
        assert_eq!(json, serde_json::json!({"src": "", "caption": "—"}));
        assert!(CategoryPreview::One(PreviewItem::placeholder()).is_empty());
    }

    #[test]
    fn test_many_is_array() {
        let preview = CategoryPreview::Many(vec![PreviewItem {
            src: "/m/1.jpg".into(),
            caption: "porch".into(),
            metadata: None,
        }]);
        let json = serde_json::to_value(&preview).unwrap();
        assert!(json.is_array());
        assert_eq!(preview.len(), 1);
    }
}
