//! Scripted panel sessions.
//!
//! A script is a RON list of steps run in order against an
//! [`AnnexureManager`]:
//!
//! ```ron
//! [
//!     Upload("photos", ["porch.jpg", "kitchen.jpg"]),
//!     Caption("photos", 1, "Front porch"),
//!     Reorder("photos", [2, 1]),
//!     Delete("photos", 2),
//!     Wait(600),
//!     Flush,
//! ]
//! ```
//!
//! Upload paths are resolved relative to the script's directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use annexure_panel::{
    AnnexureManager, AssetId, AssetPanel, CandidateFile, Category, DeleteMode, DeleteOutcome,
    ReorderReport,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum Step {
    /// Offer files to a panel, as if dropped together.
    Upload(String, Vec<PathBuf>),
    /// Visual order after a drag, as asset ids.
    Reorder(String, Vec<u64>),
    /// One caption keystroke.
    Caption(String, u64, String),
    /// Delete after the host confirms.
    Delete(String, u64),
    /// Let time pass (e.g. for caption timers), in milliseconds.
    Wait(u64),
    /// Flush pending captions as the form would before saving.
    Flush,
}

pub fn parse_script(text: &str) -> Result<Vec<Step>, ron::error::SpannedError> {
    ron::from_str(text)
}

fn panel<'a>(manager: &'a AnnexureManager, category: &str) -> Result<&'a AssetPanel> {
    manager
        .panel(&Category::new(category))
        .ok_or_else(|| anyhow!("no panel for category {category:?}"))
}

fn read_candidate(base: &Path, path: &Path) -> Result<CandidateFile> {
    let full = base.join(path);
    let bytes = std::fs::read(&full).with_context(|| format!("reading {}", full.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;
    Ok(CandidateFile::new(name, bytes))
}

/// Run one step. Panel-level failures are reported as notices, not errors;
/// only script problems (unknown category, unreadable file) fail the step.
pub async fn run_step(manager: &AnnexureManager, step: Step, base: &Path) -> Result<()> {
    match step {
        Step::Upload(category, paths) => {
            let panel = panel(manager, &category)?;
            let files = paths
                .iter()
                .map(|p| read_candidate(base, p))
                .collect::<Result<Vec<_>>>()?;
            let report = panel.accept_files(files).await;
            tracing::info!(
                %category,
                uploaded = report.uploaded.len(),
                rejected = report.rejected.len(),
                skipped = report.skipped,
                "upload step done"
            );
            log_notice(panel);
        }
        Step::Reorder(category, ids) => {
            let panel = panel(manager, &category)?;
            let ids: Vec<AssetId> = ids.into_iter().map(AssetId::new).collect();
            match panel.reorder(&ids).await {
                ReorderReport::Unchanged => tracing::info!(%category, "order unchanged"),
                ReorderReport::Reordered { changed, failed } => {
                    tracing::info!(%category, changed, failed, "reordered")
                }
            }
        }
        Step::Caption(category, id, text) => {
            panel(manager, &category)?.schedule_caption_update(AssetId::new(id), text);
        }
        Step::Delete(category, id) => {
            let panel = panel(manager, &category)?;
            match panel.delete_asset(AssetId::new(id), DeleteMode::Confirm).await {
                DeleteOutcome::Deleted { reindexed, .. } => {
                    tracing::info!(%category, id, reindexed, "deleted")
                }
                DeleteOutcome::Declined => tracing::info!(%category, id, "delete declined"),
                DeleteOutcome::Failed(e) => tracing::warn!(%category, id, "delete failed: {e}"),
            }
        }
        Step::Wait(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        Step::Flush => {
            let readiness = manager.prepare_save().await;
            tracing::info!(
                persisted = readiness.captions.persisted,
                failed = readiness.captions.failed,
                ready = readiness.ready(),
                "flushed captions"
            );
        }
    }
    Ok(())
}

fn log_notice(panel: &AssetPanel) {
    if let Some(notice) = panel.notices().current() {
        tracing::info!(category = %panel.category(), kind = %notice.kind, "{}", notice.text);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use annexure_panel::{AlwaysConfirm, Bootstrap, ManagerConfig, MemoryStore};

    use super::*;

    #[test]
    fn test_parse_script() {
        let steps = parse_script(
            r#"[
                Upload("photos", ["a.jpg"]),
                Caption("photos", 1, "Porch"),
                Reorder("photos", [2, 1]),
                Delete("photos", 2),
                Wait(600),
                Flush,
            ]"#,
        )
        .unwrap();
        assert_eq!(steps.len(), 6);
        assert_eq!(steps[0], Step::Upload("photos".into(), vec![PathBuf::from("a.jpg")]));
        assert_eq!(steps[5], Step::Flush);
    }

    #[tokio::test]
    async fn test_run_script_against_memory_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"jpeg").unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"jpeg").unwrap();

        let manager = AnnexureManager::new(
            ManagerConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(AlwaysConfirm),
            Bootstrap::new(),
        )
        .unwrap();

        let steps = parse_script(
            r#"[
                Upload("photos", ["a.jpg", "b.jpg"]),
                Reorder("photos", [2, 1]),
                Caption("photos", 1, "second"),
                Flush,
            ]"#,
        )
        .unwrap();
        for step in steps {
            run_step(&manager, step, dir.path()).await.unwrap();
        }

        let json = manager.annexures().to_json();
        assert_eq!(json["photos"][0]["src"], "/media/photos/2/b.jpg");
        assert_eq!(json["photos"][1]["caption"], "second");
    }

    #[tokio::test]
    async fn test_unknown_category_fails_step() {
        let manager = AnnexureManager::new(
            ManagerConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(AlwaysConfirm),
            Bootstrap::new(),
        )
        .unwrap();
        let err = run_step(&manager, Step::Delete("posters".into(), 1), Path::new("."))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("posters"));
    }
}
