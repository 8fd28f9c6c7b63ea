//! Embedded static file server
//!
//! Exposes the served directory verbatim over HTTP so an external HLS player
//! can fetch the manifest and segments. The manifest gets an explicit route
//! with the HLS content type and no-store caching (players re-poll it);
//! everything else, including segments and the bundled demo page, falls back
//! to `ServeDir`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tower_http::services::ServeDir;

use crate::config::ServerConfig;
use crate::errors::CamcastError;

/// Demo player page, written into the served root at startup.
pub const INDEX_HTML: &str = include_str!("../assets/index.html");
/// Player script referenced by the demo page.
pub const HLS_DEMO_JS: &str = include_str!("../assets/hls-demo.js");

/// Error surfaced by the manifest route.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Manifest not found: {0}")]
    ManifestNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServeError::ManifestNotFound(_) => StatusCode::NOT_FOUND,
            ServeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Clone)]
struct ServeState {
    playlist_path: PathBuf,
}

/// Handle to the running server. Dropping it without calling [`stop`]
/// leaves the serve task running until the runtime shuts down.
///
/// [`stop`]: StaticServer::stop
pub struct StaticServer {
    base_url: String,
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl StaticServer {
    /// Bind the listener and start serving `served_root`.
    pub async fn start(
        config: &ServerConfig,
        served_root: impl AsRef<Path>,
        playlist_name: &str,
    ) -> Result<Self, CamcastError> {
        let served_root = served_root.as_ref().to_path_buf();
        let state = ServeState {
            playlist_path: served_root.join(playlist_name),
        };

        let app = Router::new()
            .route(&format!("/{}", playlist_name), get(playlist_handler))
            .fallback_service(ServeDir::new(&served_root))
            .with_state(state);

        let listener = TcpListener::bind((config.bind_addr.as_str(), config.port))
            .await
            .map_err(|e| {
                CamcastError::ServerError(format!(
                    "Failed to bind {}:{}: {}",
                    config.bind_addr, config.port, e
                ))
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| CamcastError::ServerError(format!("Failed to read local addr: {}", e)))?;

        // A wildcard bind is not a reachable host; advertise loopback and let
        // the operator substitute the device address for remote players.
        let host = if config.bind_addr == "0.0.0.0" || config.bind_addr == "::" {
            "127.0.0.1".to_string()
        } else {
            config.bind_addr.clone()
        };
        let base_url = format!("http://{}:{}", host, local_addr.port());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                log::error!("Static server exited with error: {}", e);
            }
        });

        log::info!("Web server started, visit {} to verify", base_url);

        Ok(Self {
            base_url,
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Base URL the server is reachable at, e.g. `http://127.0.0.1:8080`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signal shutdown and wait for the serve task to finish.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Static server task failed to join: {}", e);
            }
        }
        log::info!("Web server stopped");
    }
}

/// Serve the manifest with the HLS content type, streamed from disk.
async fn playlist_handler(State(state): State<ServeState>) -> Result<Response, ServeError> {
    let file = match tokio::fs::File::open(&state.playlist_path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServeError::ManifestNotFound(
                state.playlist_path.display().to_string(),
            ));
        }
        Err(e) => return Err(ServeError::Io(e)),
    };

    let stream = ReaderStream::new(file);
    let response = (
        [
            (header::CONTENT_TYPE, "application/vnd.apple.mpegurl"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        Body::from_stream(stream),
    )
        .into_response();
    Ok(response)
}

/// Write the bundled demo assets into the served root, replacing stale
/// copies from a previous run.
pub async fn write_static_assets(served_root: impl AsRef<Path>) -> Result<(), CamcastError> {
    let root = served_root.as_ref();
    tokio::fs::create_dir_all(root).await?;

    for (name, contents) in [("index.html", INDEX_HTML), ("hls-demo.js", HLS_DEMO_JS)] {
        let path = root.join(name);
        if tokio::fs::try_exists(&path).await? {
            tokio::fs::remove_file(&path).await?;
        }
        tokio::fs::write(&path, contents).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config() -> ServerConfig {
        ServerConfig {
            // Port 0 lets the OS pick a free port for the test.
            port: 0,
            bind_addr: "127.0.0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_static_assets() {
        let dir = tempdir().unwrap();
        write_static_assets(dir.path()).await.unwrap();

        let index = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(index.contains("camcast"));
        assert!(dir.path().join("hls-demo.js").exists());

        // Overwrites on a second run.
        write_static_assets(dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_serves_playlist_with_hls_content_type() {
        let dir = tempdir().unwrap();
        tokio::fs::write(dir.path().join("playlist.m3u8"), "#EXTM3U")
            .await
            .unwrap();

        let mut server = StaticServer::start(&test_config(), dir.path(), "playlist.m3u8")
            .await
            .unwrap();

        let url = format!("{}/playlist.m3u8", server.base_url());
        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(response.text().await.unwrap(), "#EXTM3U");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_missing_playlist_is_404() {
        let dir = tempdir().unwrap();
        let mut server = StaticServer::start(&test_config(), dir.path(), "playlist.m3u8")
            .await
            .unwrap();

        let url = format!("{}/playlist.m3u8", server.base_url());
        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status(), 404);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_serves_segments_from_root() {
        let dir = tempdir().unwrap();
        tokio::fs::write(dir.path().join("seg1.ts"), b"segment-bytes")
            .await
            .unwrap();

        let mut server = StaticServer::start(&test_config(), dir.path(), "playlist.m3u8")
            .await
            .unwrap();

        let url = format!("{}/seg1.ts", server.base_url());
        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"segment-bytes");

        server.stop().await;
    }
}
