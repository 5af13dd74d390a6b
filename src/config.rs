use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp3"];
pub const DEFAULT_MAX_UPLOAD_MB: usize = 200;

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub uploads_dir: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn new(
        addr: &str,
        uploads_dir: Option<PathBuf>,
        extensions: &[String],
        max_upload_mb: usize,
    ) -> Result<Self> {
        let addr = addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", addr))?;

        let uploads_dir = match uploads_dir {
            Some(dir) => dir,
            None => default_uploads_dir(),
        };

        let allowed_extensions = if extensions.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
        } else {
            extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect()
        };

        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .with_context(|| format!("Upload limit too large: {} MiB", max_upload_mb))?;

        Ok(Self {
            addr,
            uploads_dir,
            allowed_extensions,
            max_upload_bytes,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            uploads_dir: default_uploads_dir(),
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

fn default_uploads_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "songlist")
        .map(|dirs| dirs.data_dir().join("uploads"))
        .unwrap_or_else(|| PathBuf::from("uploads"))
}
