//! The outbound seam to the persistence collaborator and the recent-captures
//! list it hands the editor.

mod recent;

use std::path::Path;

use thiserror::Error;

use crate::sync::EditCommit;

pub use recent::{RecentCaptures, RecentEntry};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("recent entry {index} does not exist")]
    MissingEntry { index: usize },
    #[error("store rejected the request: {0}")]
    Rejected(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Commands the editor forwards untouched to the persistence side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThroughCommand {
    Copy,
    SaveAs,
    SaveAll,
    DeleteAll,
    OpenFolder,
}

impl PassThroughCommand {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::SaveAs => "save-as",
            Self::SaveAll => "save-all",
            Self::DeleteAll => "delete-all",
            Self::OpenFolder => "open-folder",
        }
    }
}

/// Persistence collaborator that owns the recent captures on disk.
pub trait CaptureStore {
    /// Receives the debounced state of the selected entry.
    fn commit_edit(&self, commit: &EditCommit) -> StoreResult<()>;
    /// Asked to reload entry `index`; answers later through `load_image`.
    fn select_entry(&self, index: usize) -> StoreResult<()>;
    fn run_command(&self, command: PassThroughCommand) -> StoreResult<()>;
}

/// Store for sessions without persistence: edits go nowhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedStore;

impl CaptureStore for DetachedStore {
    fn commit_edit(&self, commit: &EditCommit) -> StoreResult<()> {
        tracing::debug!(
            index = commit.selected_index,
            width = commit.width,
            height = commit.height,
            "detached store dropped edit"
        );
        Ok(())
    }

    fn select_entry(&self, index: usize) -> StoreResult<()> {
        Err(StoreError::MissingEntry { index })
    }

    fn run_command(&self, command: PassThroughCommand) -> StoreResult<()> {
        Err(StoreError::Rejected(format!(
            "{} needs a persistence backend",
            command.label()
        )))
    }
}

/// Path display for an entry that may not be on disk yet.
pub fn saved_path_label(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string())
        .unwrap_or_else(|| "unsaved".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_store_accepts_edits_and_rejects_commands() {
        let store = DetachedStore;
        let commit = EditCommit {
            data_url: "data:image/png;base64,".to_string(),
            width: 1,
            height: 1,
            selected_index: 0,
        };
        assert!(store.commit_edit(&commit).is_ok());
        assert!(matches!(
            store.select_entry(3),
            Err(StoreError::MissingEntry { index: 3 })
        ));
        let err = store
            .run_command(PassThroughCommand::OpenFolder)
            .expect_err("no backend to open a folder");
        assert_eq!(
            err.to_string(),
            "store rejected the request: open-folder needs a persistence backend"
        );
    }

    #[test]
    fn saved_path_label_marks_unsaved_entries() {
        assert_eq!(saved_path_label(None), "unsaved");
        assert_eq!(
            saved_path_label(Some(Path::new("/tmp/shot.png"))),
            "/tmp/shot.png"
        );
    }
}
