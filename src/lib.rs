//! camcast: live camera to HLS streaming demo
//!
//! This crate wires a segmented-recording camera collaborator to an embedded
//! static HTTP server. Each time the camera finishes a segment, the segment
//! and its updated manifest are republished into the served directory under
//! stable names, so an HLS player pointed at
//! `http://<host>:8080/playlist.m3u8` follows the live stream.
//!
//! # Components
//! - [`publisher::SegmentPublisher`]: serializes segment/manifest
//!   publication into the served root
//! - [`server::StaticServer`]: exposes the served root over HTTP
//! - [`camera::CameraController`]: the collaborator boundary; a synthetic
//!   implementation ships in [`testing`]
//! - [`service::StreamService`]: explicit init/shutdown lifecycle plus the
//!   demo's UI state (flash mode, camera facing, recording flag)
//!
//! # Usage
//! ```rust,no_run
//! use camcast::config::CamcastConfig;
//! use camcast::service::StreamService;
//! use camcast::testing::SyntheticCamera;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), camcast::CamcastError> {
//! let config = CamcastConfig::load_or_default();
//! let camera = Arc::new(SyntheticCamera::new("./capture", Duration::from_secs(2)));
//! let service = StreamService::init(&config, camera).await?;
//! service.start_recording().await;
//! // ... later
//! service.stop_recording().await;
//! service.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod camera;
pub mod config;
pub mod errors;
pub mod publisher;
pub mod server;
pub mod service;
pub mod testing;
pub mod types;

// Re-exports for convenience
pub use camera::CameraController;
pub use errors::CamcastError;
pub use publisher::SegmentPublisher;
pub use service::StreamService;
pub use types::{CameraEvent, CameraFacing, FlashMode, PictureInfo, SegmentNotification};

/// Initialize logging for the demo
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "camcast=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
