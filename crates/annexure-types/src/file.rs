//! Files offered to a panel for upload.

/// A file picked or dropped by the user, not yet uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    /// Size in bytes as reported by the picker.
    pub size: u64,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    /// Build a candidate from in-memory content; `size` is the content length.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content_type: None,
            bytes,
        }
    }

    /// A candidate whose reported size differs from any content held.
    pub fn with_size(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            content_type: None,
            bytes: Vec::new(),
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Lowercased extension after the last dot, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

impl std::fmt::Debug for CandidateFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(CandidateFile::with_size("Front.JPG", 1).extension().as_deref(), Some("jpg"));
        assert_eq!(CandidateFile::with_size("a.tar.gz", 1).extension().as_deref(), Some("gz"));
        assert_eq!(CandidateFile::with_size("README", 1).extension(), None);
        assert_eq!(CandidateFile::with_size(".hidden", 1).extension(), None);
        assert_eq!(CandidateFile::with_size("trailing.", 1).extension(), None);
    }

    #[test]
    fn test_new_takes_size_from_content() {
        let f = CandidateFile::new("a.png", vec![0; 12]);
        assert_eq!(f.size, 12);
    }
}
