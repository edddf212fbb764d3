use crate::logging::{LogCategory, LogContext};
use crate::log_info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// How many entries a bare `history` prints
pub const RECENT_LISTING: usize = 10;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file {} is not a JSON array of strings: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not access history file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Bounded list of past user inputs, mirrored to a JSON file on every change.
///
/// Insertion order is recency order. Once `max_entries` is reached the oldest
/// entry is evicted. The file always holds a full snapshot of `entries`.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: Vec<String>,
    max_entries: usize,
    path: PathBuf,
}

impl HistoryStore {
    /// Load the history at `path`. A missing file is an empty history; a file
    /// that is not a JSON array of strings is an error.
    pub fn load(path: impl Into<PathBuf>, max_entries: usize) -> Result<Self, HistoryError> {
        let path = path.into();
        let max_entries = max_entries.max(1);

        let mut entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<Vec<String>>(&content).map_err(|source| {
                HistoryError::Malformed {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };

        if entries.len() > max_entries {
            entries.drain(..entries.len() - max_entries);
        }

        log_info!(
            LogCategory::History,
            format!("Loaded {} history entries", entries.len()),
            LogContext::new().with_component("history").with_operation("load")
        );

        Ok(Self {
            entries,
            max_entries,
            path,
        })
    }

    /// `~/.heycli_history`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".heycli_history"))
    }

    /// Append an entry, evicting the oldest past the limit, then persist.
    ///
    /// The in-memory list is updated even when the write fails.
    pub fn add(&mut self, entry: &str) -> Result<(), HistoryError> {
        self.entries.push(entry.to_string());
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
        self.save()
    }

    pub fn get(&self, index: i64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .map(String::as_str)
    }

    /// Case-insensitive substring search, in history order
    pub fn search(&self, term: &str) -> Vec<&str> {
        self.search_indexed(term).into_iter().map(|(_, entry)| entry).collect()
    }

    /// Like [`search`](Self::search), keeping each match's absolute index
    pub fn search_indexed(&self, term: &str) -> Vec<(usize, &str)> {
        let needle = term.to_lowercase();
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.to_lowercase().contains(&needle))
            .map(|(i, entry)| (i, entry.as_str()))
            .collect()
    }

    /// The last `n` entries with their absolute indices
    pub fn recent(&self, n: usize) -> Vec<(usize, &str)> {
        let start = self.entries.len().saturating_sub(n);
        self.entries[start..]
            .iter()
            .enumerate()
            .map(|(offset, entry)| (start + offset, entry.as_str()))
            .collect()
    }

    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.entries.clear();
        self.save()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Write to a sibling file and rename so the target is never half-written.
    fn save(&self) -> Result<(), HistoryError> {
        let io_err = |source: io::Error| HistoryError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string(&self.entries).map_err(|e| io_err(e.into()))?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, content).map_err(io_err)?;
        if let Err(source) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_err(source));
        }
        Ok(())
    }
}
