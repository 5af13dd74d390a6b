//! HTTP routes over the shared playlist and upload directory.

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::daemon::AppState;
use crate::error::{Error, Result};
use crate::store::sanitize;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SongsResponse {
    pub songs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UploadResponse {
    pub ok: bool,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MoveResponse {
    pub ok: bool,
    pub songs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentResponse {
    pub current: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NextResponse {
    pub next: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PrevResponse {
    pub prev: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DeleteRequest {
    pub filename: Option<String>,
}

/// `position` stays loose so that both `3` and `"3"` are accepted.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MoveRequest {
    pub filename: Option<String>,
    pub position: Option<Value>,
}

/// `Json` whose rejections answer with the usual `{"error": ...}` body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(Error))]
struct JsonBody<T>(T);

pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let uploads = ServeDir::new(state.store.root());

    Router::new()
        .route("/", get(root))
        .route("/list", get(list_songs))
        .route("/playlist", get(get_playlist))
        .route("/upload", post(upload_song))
        .route("/delete", post(delete_song))
        .route("/current", get(current_song))
        .route("/next", get(next_song))
        .route("/prev", get(prev_song))
        .route("/move", post(move_song))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "songlist API v0.1.0"
}

/// GET /list
async fn list_songs(State(state): State<AppState>) -> Json<Vec<String>> {
    let songs = state.playlist.lock().await.all_keys();
    debug!("Songs in order: {:?}", songs);
    Json(songs)
}

/// GET /playlist
async fn get_playlist(State(state): State<AppState>) -> Json<SongsResponse> {
    let songs = state.playlist.lock().await.all_keys();
    debug!("Playlist has {} songs", songs.len());
    Json(SongsResponse { songs })
}

/// POST /upload, multipart field `file`
///
/// Re-uploading a name already in the playlist replaces the stored file and
/// leaves the order untouched.
async fn upload_song(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        // a `file` field without a filename is a plain form value, not an upload
        if let Some(original) = field.file_name().map(str::to_owned) {
            let data = field.bytes().await?;
            upload = Some((original, data));
            break;
        }
    }

    let (original, data) = upload.ok_or_else(|| Error::bad_request("no file part"))?;
    if original.is_empty() {
        return Err(Error::bad_request("no selected file"));
    }
    if !state.store.is_allowed(&original) {
        return Err(Error::NotAllowed);
    }
    let filename = sanitize(&original);
    if filename.is_empty() || !state.store.is_allowed(&filename) {
        return Err(Error::NotAllowed);
    }

    let mut playlist = state.playlist.lock().await;
    state.store.save(&filename, &data).await?;
    if playlist.append(filename.as_str()) {
        info!("Uploaded {} ({} bytes)", filename, data.len());
    } else {
        info!("Replaced {} ({} bytes)", filename, data.len());
    }

    Ok(Json(UploadResponse { ok: true, filename }))
}

/// POST /delete `{"filename": ...}`
async fn delete_song(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<DeleteRequest>,
) -> Result<Json<OkResponse>> {
    let filename = request
        .filename
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::bad_request("missing filename"))?;
    let safe = sanitize(&filename);

    // Disk and list change under the same lock.
    let mut playlist = state.playlist.lock().await;
    if safe.is_empty() || !state.store.remove(&safe).await? {
        return Err(Error::not_found("file not found"));
    }
    playlist.delete(&safe);
    info!("Deleted {}", safe);

    Ok(Json(OkResponse { ok: true }))
}

/// GET /current
async fn current_song(State(state): State<AppState>) -> Json<CurrentResponse> {
    let current = state.playlist.lock().await.current();
    debug!("Current song: {:?}", current);
    Json(CurrentResponse { current })
}

/// GET /next
async fn next_song(State(state): State<AppState>) -> Json<NextResponse> {
    let next = state.playlist.lock().await.next();
    debug!("Next song: {:?}", next);
    Json(NextResponse { next })
}

/// GET /prev
async fn prev_song(State(state): State<AppState>) -> Json<PrevResponse> {
    let prev = state.playlist.lock().await.prev();
    debug!("Previous song: {:?}", prev);
    Json(PrevResponse { prev })
}

/// POST /move `{"filename": ..., "position": ...}`
async fn move_song(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<MoveRequest>,
) -> Result<Json<MoveResponse>> {
    let (filename, position) = match (request.filename, request.position) {
        (Some(filename), Some(position)) if !filename.is_empty() => (filename, position),
        _ => return Err(Error::bad_request("missing filename or position")),
    };
    let position = parse_position(&position)
        .ok_or_else(|| Error::invalid_argument("position must be a number"))?;

    let mut playlist = state.playlist.lock().await;
    if !playlist.move_to_position(&filename, position) {
        return Err(Error::not_found("song not found in playlist"));
    }
    let songs = playlist.all_keys();
    info!(
        "Moved {} to position {:?}, new order: {:?}",
        filename,
        playlist.position_of(&filename),
        songs
    );

    Ok(Json(MoveResponse { ok: true, songs }))
}

/// Target index from a JSON integer, an integral float or an integer string.
///
/// A negative index lands right after the head, i.e. behaves as 1.
fn parse_position(value: &Value) -> Option<usize> {
    let position: i128 = match value {
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i128::from(i),
            (None, Some(u), _) => i128::from(u),
            (None, None, Some(f)) if f.fract() == 0.0 => f as i128,
            _ => return None,
        },
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };

    if position < 0 {
        Some(1)
    } else {
        Some(usize::try_from(position).unwrap_or(usize::MAX))
    }
}
