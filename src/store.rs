//! Per-book highlight persistence
//!
//! The external note store's contract is "list in, list out" keyed by book
//! identifier: highlight records go in as an opaque list and come back as
//! one. One YAML file per book, keyed by a hash of the book's filename.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::error;

use crate::record::{HighlightRecord, sort_records};

const STORE_DIR_ENV: &str = "MARGINALIA_HIGHLIGHTS_DIR";

/// Highlight records for one book, backed by a YAML file
pub struct HighlightStore {
    pub file_path: PathBuf,
    records: Vec<HighlightRecord>,
}

impl HighlightStore {
    /// Open (or create empty) the store for a book.
    ///
    /// `store_dir` overrides the resolved default directory; the
    /// `MARGINALIA_HIGHLIGHTS_DIR` environment variable overrides it too.
    pub fn open(book_path: &Path, store_dir: Option<&Path>) -> Result<Self> {
        let book_hash = compute_book_hash(book_path);
        let resolved_dir = match store_dir {
            Some(dir) => {
                if !dir.exists() {
                    fs::create_dir_all(dir)?;
                }
                dir.to_path_buf()
            }
            None => default_store_dir()?,
        };
        let file_path = resolved_dir.join(format!("book_{book_hash}.yaml"));
        Self::open_at(file_path)
    }

    /// Open the store at an exact file path, falling back to empty on a
    /// corrupt file (a broken store must never block note-taking)
    pub fn open_at(file_path: PathBuf) -> Result<Self> {
        let records = if file_path.exists() {
            match load_from_file(&file_path) {
                Ok(records) => records,
                Err(e) => {
                    error!("failed to load highlights from {file_path:?}: {e}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self { file_path, records })
    }

    /// Everything stored for this book, in reading order
    #[must_use]
    pub fn records(&self) -> &[HighlightRecord] {
        &self.records
    }

    /// Persist one freshly created record
    pub fn add(&mut self, record: HighlightRecord) -> Result<()> {
        self.records.push(record);
        sort_records(&mut self.records);
        self.save_to_disk()
    }

    /// Remove one record by id. Returns false when it was not stored.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let Some(idx) = self.records.iter().position(|r| r.id == id) else {
            return Ok(false);
        };
        self.records.remove(idx);
        self.save_to_disk()?;
        Ok(true)
    }

    /// Replace the whole list ("list in")
    pub fn replace_all(&mut self, mut records: Vec<HighlightRecord>) -> Result<()> {
        sort_records(&mut records);
        self.records = records;
        self.save_to_disk()
    }

    fn save_to_disk(&self) -> Result<()> {
        let yaml =
            serde_yaml::to_string(&self.records).context("failed to serialize highlights")?;
        fs::write(&self.file_path, yaml).context("failed to write highlights file")?;
        Ok(())
    }
}

fn load_from_file(file_path: &Path) -> Result<Vec<HighlightRecord>> {
    let content = fs::read_to_string(file_path).context("failed to read highlights file")?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(&content).context("failed to parse highlights YAML")
}

fn compute_book_hash(book_path: &Path) -> String {
    let filename = book_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_else(|| book_path.to_str().unwrap_or("unknown"));

    let digest = md5::compute(filename.as_bytes());
    format!("{digest:x}")
}

fn default_store_dir() -> Result<PathBuf> {
    let dir = if let Ok(custom_dir) = std::env::var(STORE_DIR_ENV) {
        PathBuf::from(custom_dir)
    } else {
        dirs::data_dir()
            .context("could not determine data directory")?
            .join("marginalia")
            .join("highlights")
    };

    if !dir.exists() {
        fs::create_dir_all(&dir).context("failed to create highlights directory")?;
    }

    Ok(dir)
}
