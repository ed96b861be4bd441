use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One prior capture as the persistence side describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEntry {
    pub data_url: String,
    #[serde(default)]
    pub thumb_data_url: Option<String>,
    #[serde(default)]
    pub saved_path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: u64,
}

/// Local display copy of the recent list with one selected entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentCaptures {
    entries: Vec<RecentEntry>,
    selected: usize,
}

impl RecentCaptures {
    pub fn new(entries: Vec<RecentEntry>, selected: usize) -> Self {
        let mut recent = Self::default();
        recent.replace(entries, selected);
        recent
    }

    /// Takes a new list; `selected` is clamped into range.
    pub fn replace(&mut self, entries: Vec<RecentEntry>, selected: usize) {
        self.entries = entries;
        self.selected = clamp_index(selected, self.entries.len());
    }

    pub fn entries(&self) -> &[RecentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&RecentEntry> {
        self.entries.get(self.selected)
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.entries.len()
    }

    /// `"n/m"` with a one-based position, or `"0/0"` when empty.
    pub fn counter_label(&self) -> String {
        if self.entries.is_empty() {
            return "0/0".to_string();
        }
        format!("{}/{}", self.selected + 1, self.entries.len())
    }

    /// Mirrors a committed edit into the selected entry.
    pub fn apply_edit(
        &mut self,
        data_url: String,
        thumb_data_url: Option<String>,
        width: u32,
        height: u32,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(self.selected) else {
            return false;
        };
        entry.data_url = data_url;
        entry.thumb_data_url = thumb_data_url;
        entry.width = width;
        entry.height = height;
        true
    }

    pub fn set_saved_path(&mut self, path: PathBuf) -> bool {
        let Some(entry) = self.entries.get_mut(self.selected) else {
            return false;
        };
        entry.saved_path = Some(path);
        true
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}
