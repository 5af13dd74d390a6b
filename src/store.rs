use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;

/// Upload directory holding the audio files the playlist refers to.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    extensions: Vec<String>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.uploads_dir, config.allowed_extensions.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the upload directory if it is missing.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create upload dir {}", self.root.display()))
    }

    /// Extension check on the text after the last dot, case-insensitive.
    pub fn is_allowed(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }

    /// Allowed files directly under the upload dir, sorted by name.
    pub fn scan(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry
                .with_context(|| format!("Failed to list {}", self.root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if self.is_allowed(name) {
                    files.push(name.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    pub async fn save(&self, filename: &str, data: &[u8]) -> io::Result<()> {
        tokio::fs::write(self.path_of(filename), data).await
    }

    /// Deletes a stored file, `false` when there was nothing to delete.
    pub async fn remove(&self, filename: &str) -> io::Result<bool> {
        match tokio::fs::remove_file(self.path_of(filename)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn path_of(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}

/// Reduces a client-supplied name to a safe flat filename.
///
/// Non-ASCII characters are dropped, separators become spaces, runs of
/// whitespace become `_`, anything outside `[A-Za-z0-9_.-]` goes, and
/// leading/trailing dots and underscores are trimmed. The result can be
/// empty.
pub fn sanitize(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c: char| c == '.' || c == '_')
        .to_string()
}
