//! Intake screening: which offered files may be uploaded.
//!
//! Screening is local and never touches the network. Files are checked in
//! the order they were offered; of the files that pass, only as many as the
//! panel has room for are accepted.

use std::fmt;

use annexure_types::{CandidateFile, PanelConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Extension(Option<String>),
    TooLarge { size: u64, limit: u64 },
}

/// A file refused by screening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub file: String,
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            RejectReason::Extension(Some(ext)) => {
                write!(f, "{}: .{ext} files are not allowed", self.file)
            }
            RejectReason::Extension(None) => write!(f, "{}: file has no extension", self.file),
            RejectReason::TooLarge { size, limit } => write!(
                f,
                "{}: {} exceeds the {} limit",
                self.file,
                human_size(*size),
                human_size(*limit)
            ),
        }
    }
}

/// Result of screening one batch.
#[derive(Debug, Default)]
pub struct Screening {
    /// Files to upload, in offered order.
    pub accepted: Vec<CandidateFile>,
    pub rejections: Vec<Rejection>,
    /// Valid files left out because the panel is full.
    pub skipped: usize,
}

impl Screening {
    /// All rejection reasons joined into one message, if there are any.
    pub fn rejection_message(&self, config: &PanelConfig) -> Option<String> {
        if self.rejections.is_empty() {
            return None;
        }
        let mut lines: Vec<String> = self.rejections.iter().map(ToString::to_string).collect();
        if self
            .rejections
            .iter()
            .any(|r| matches!(r.reason, RejectReason::Extension(_)))
        {
            lines.push(format!("Allowed types: {}", config.accept_list()));
        }
        Some(lines.join("\n"))
    }
}

/// Screen `files` for a panel with `available` free slots (`None` = unbounded).
///
/// A single-select panel takes at most one file per batch.
pub fn screen(
    config: &PanelConfig,
    max_file_bytes: u64,
    available: Option<usize>,
    files: Vec<CandidateFile>,
) -> Screening {
    let available = if config.multiple {
        available
    } else {
        Some(available.map_or(1, |room| room.min(1)))
    };
    let mut screening = Screening::default();
    for file in files {
        let extension = file.extension();
        let allowed = extension.as_deref().is_some_and(|ext| config.accepts(ext));
        if !allowed {
            screening.rejections.push(Rejection {
                file: file.name,
                reason: RejectReason::Extension(extension),
            });
            continue;
        }
        if file.size > max_file_bytes {
            screening.rejections.push(Rejection {
                file: file.name,
                reason: RejectReason::TooLarge { size: file.size, limit: max_file_bytes },
            });
            continue;
        }
        if available.is_some_and(|room| screening.accepted.len() >= room) {
            screening.skipped += 1;
            continue;
        }
        screening.accepted.push(file);
    }
    screening
}

fn human_size(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / MIB)
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_FILE_BYTES;

    fn names(files: &[CandidateFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_rejects_type_and_size_together() {
        let cfg = PanelConfig::multiple("photos", None);
        let files = vec![
            CandidateFile::with_size("ok.jpg", 10),
            CandidateFile::with_size("virus.exe", 10),
            CandidateFile::with_size("huge.png", MAX_FILE_BYTES + 1),
            CandidateFile::with_size("noext", 10),
        ];
        let s = screen(&cfg, MAX_FILE_BYTES, None, files);
        assert_eq!(names(&s.accepted), vec!["ok.jpg"]);
        assert_eq!(s.rejections.len(), 3);

        let msg = s.rejection_message(&cfg).unwrap();
        assert!(msg.contains("virus.exe: .exe files are not allowed"));
        assert!(msg.contains("huge.png: 10.0 MiB exceeds the 10.0 MiB limit"));
        assert!(msg.contains("noext: file has no extension"));
        assert!(msg.contains("Allowed types:"));
    }

    #[test]
    fn test_exact_limit_is_allowed() {
        let cfg = PanelConfig::multiple("photos", None);
        let s = screen(&cfg, MAX_FILE_BYTES, None, vec![CandidateFile::with_size("a.jpg", MAX_FILE_BYTES)]);
        assert_eq!(s.accepted.len(), 1);
    }

    #[test]
    fn test_capacity_counts_only_valid_files() {
        let cfg = PanelConfig::multiple("photos", Some(5));
        let files = vec![
            CandidateFile::with_size("bad.exe", 1),
            CandidateFile::with_size("1.jpg", 1),
            CandidateFile::with_size("2.jpg", 1),
            CandidateFile::with_size("3.jpg", 1),
        ];
        let s = screen(&cfg, MAX_FILE_BYTES, Some(2), files);
        assert_eq!(names(&s.accepted), vec!["1.jpg", "2.jpg"]);
        assert_eq!(s.skipped, 1);
        assert_eq!(s.rejections.len(), 1);
    }

    #[test]
    fn test_no_message_without_rejections() {
        let cfg = PanelConfig::multiple("photos", None);
        let s = screen(&cfg, MAX_FILE_BYTES, None, vec![CandidateFile::with_size("a.pdf", 1)]);
        assert!(s.rejection_message(&cfg).is_none());
    }

    #[test]
    fn test_single_select_takes_first_valid_file() {
        let cfg = PanelConfig { multiple: false, ..PanelConfig::multiple("thread", Some(5)) };
        let files = vec![
            CandidateFile::with_size("bad.exe", 1),
            CandidateFile::with_size("first.pdf", 1),
            CandidateFile::with_size("second.pdf", 1),
        ];
        let s = screen(&cfg, MAX_FILE_BYTES, Some(4), files);
        assert_eq!(names(&s.accepted), vec!["first.pdf"]);
        assert_eq!(s.skipped, 1);
        assert_eq!(s.rejections.len(), 1);

        let unbounded = PanelConfig { multiple: false, ..PanelConfig::multiple("thread", None) };
        let s = screen(&unbounded, MAX_FILE_BYTES, None, vec![
            CandidateFile::with_size("a.pdf", 1),
            CandidateFile::with_size("b.pdf", 1),
        ]);
        assert_eq!(names(&s.accepted), vec!["a.pdf"]);
    }
}
