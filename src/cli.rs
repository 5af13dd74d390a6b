use anyhow::{anyhow, bail, Context, Result};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::api::{
    CurrentResponse, DeleteRequest, MoveRequest, MoveResponse, NextResponse, PrevResponse,
    SongsResponse, UploadResponse,
};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Thin client for a running server.
pub struct ApiClient {
    base: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("Failed to reach server at {}", self.base))?;
        decode(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach server at {}", self.base))?;
        decode(response).await
    }

    pub async fn songs(&self) -> Result<Vec<String>> {
        let playlist: SongsResponse = self.get("/playlist").await?;
        Ok(playlist.songs)
    }

    pub async fn current(&self) -> Result<Option<String>> {
        let response: CurrentResponse = self.get("/current").await?;
        Ok(response.current)
    }

    pub async fn next(&self) -> Result<Option<String>> {
        let response: NextResponse = self.get("/next").await?;
        Ok(response.next)
    }

    pub async fn prev(&self) -> Result<Option<String>> {
        let response: PrevResponse = self.get("/prev").await?;
        Ok(response.prev)
    }

    pub async fn upload(&self, path: &Path) -> Result<String> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .context("Upload path has no usable file name")?
            .to_string();
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let form = Form::new().part("file", Part::bytes(data).file_name(filename));
        let response = self
            .http
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to reach server at {}", self.base))?;
        let uploaded: UploadResponse = decode(response).await?;
        Ok(uploaded.filename)
    }

    pub async fn remove(&self, filename: &str) -> Result<()> {
        let request = DeleteRequest {
            filename: Some(filename.to_string()),
        };
        let _: serde_json::Value = self.post("/delete", &request).await?;
        Ok(())
    }

    pub async fn move_song(&self, filename: &str, position: usize) -> Result<Vec<String>> {
        let request = MoveRequest {
            filename: Some(filename.to_string()),
            position: Some(position.into()),
        };
        let response: MoveResponse = self.post("/move", &request).await?;
        Ok(response.songs)
    }
}

/// Turns an `{"error": ...}` body into an error, otherwise parses `T`.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .context("Failed to parse server response")?;

    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("unknown error");
        bail!("Server returned {}: {}", status, message);
    }

    serde_json::from_value(body).map_err(|e| anyhow!("Unexpected response: {}", e))
}

pub async fn show_playlist(client: &ApiClient) -> Result<()> {
    let songs = client.songs().await?;
    if songs.is_empty() {
        println!("Playlist is empty");
        println!("Add songs with: songlist add <file>");
        return Ok(());
    }

    let current = client.current().await?;
    for (i, song) in songs.iter().enumerate() {
        let marker = if current.as_deref() == Some(song.as_str()) {
            ">"
        } else {
            " "
        };
        println!("{} {}. {}", marker, i, song);
    }

    println!();
    println!("Total: {} songs", songs.len());
    Ok(())
}

pub async fn show_current(client: &ApiClient) -> Result<()> {
    print_song("Current", client.current().await?);
    Ok(())
}

pub async fn next(client: &ApiClient) -> Result<()> {
    print_song("Next", client.next().await?);
    Ok(())
}

pub async fn prev(client: &ApiClient) -> Result<()> {
    print_song("Previous", client.prev().await?);
    Ok(())
}

pub async fn add(client: &ApiClient, paths: &[std::path::PathBuf]) -> Result<()> {
    for path in paths {
        let stored = client.upload(path).await?;
        println!("Uploaded {} as {}", path.display(), stored);
    }
    Ok(())
}

pub async fn remove(client: &ApiClient, filename: &str) -> Result<()> {
    client.remove(filename).await?;
    println!("Removed {}", filename);
    Ok(())
}

pub async fn move_song(client: &ApiClient, filename: &str, position: usize) -> Result<()> {
    let songs = client.move_song(filename, position).await?;
    println!("Moved {} to position {}", filename, position);
    for (i, song) in songs.iter().enumerate() {
        println!("  {}. {}", i, song);
    }
    Ok(())
}

fn print_song(label: &str, song: Option<String>) {
    match song {
        Some(song) => println!("{}: {}", label, song),
        None => println!("{}: none", label),
    }
}
