//! Stream service
//!
//! Owns the camera collaborator, the segment publisher, and the embedded
//! server, with an explicit init/shutdown lifecycle in place of UI framework
//! mount/unmount hooks. Also holds the small pieces of UI state the demo
//! toggles: flash mode, camera facing, and the recording flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::camera::CameraController;
use crate::config::CamcastConfig;
use crate::errors::CamcastError;
use crate::publisher::SegmentPublisher;
use crate::server::{write_static_assets, StaticServer};
use crate::types::{CameraFacing, FlashMode, PictureInfo};

pub struct StreamService {
    camera: Arc<dyn CameraController>,
    publisher: Arc<SegmentPublisher>,
    server: StaticServer,
    /// Recording flag, shared with the publisher as its gate.
    recording: Arc<AtomicBool>,
    flash: Mutex<FlashMode>,
    facing: Mutex<CameraFacing>,
    pump: Option<JoinHandle<()>>,
}

impl StreamService {
    /// Bring the whole demo up: served directory, static assets, HTTP
    /// server, publisher, and the event pump feeding it.
    pub async fn init(
        config: &CamcastConfig,
        camera: Arc<dyn CameraController>,
    ) -> Result<Self, CamcastError> {
        config.validate().map_err(CamcastError::InitializationError)?;

        let events = camera.take_events().ok_or_else(|| {
            CamcastError::InitializationError(
                "camera event receiver was already taken".to_string(),
            )
        })?;

        let served_dir = &config.storage.served_dir;
        write_static_assets(served_dir).await?;

        // A playlist from a previous run must be gone before the listener
        // binds, or a player could briefly follow the old stream.
        let recording = Arc::new(AtomicBool::new(false));
        let publisher = Arc::new(SegmentPublisher::new(
            served_dir,
            &config.storage.playlist_name,
            recording.clone(),
        ));
        publisher.clear_stale_playlist().await?;

        let server =
            StaticServer::start(&config.server, served_dir, &config.storage.playlist_name).await?;
        publisher.set_base_url(server.base_url());

        let pump_publisher = publisher.clone();
        let pump = tokio::spawn(async move {
            let mut events = events;
            while let Some(event) = events.recv().await {
                pump_publisher.handle_event(event).await;
            }
            log::debug!("Camera event channel closed, pump exiting");
        });

        log::info!("Stream service ready at {}", server.base_url());

        Ok(Self {
            camera,
            publisher,
            server,
            recording,
            flash: Mutex::new(config.camera.default_flash),
            facing: Mutex::new(config.camera.default_facing),
            pump: Some(pump),
        })
    }

    /// Cycle flash mode auto -> on -> off -> auto. Returns the new mode.
    pub fn toggle_flash(&self) -> FlashMode {
        let mut flash = self.flash.lock().expect("lock poisoned");
        *flash = flash.cycle();
        log::info!("Flash mode: {}", flash.as_str());
        *flash
    }

    /// Switch between back and front camera. Returns the new facing.
    pub fn toggle_facing(&self) -> CameraFacing {
        let mut facing = self.facing.lock().expect("lock poisoned");
        *facing = facing.toggle();
        log::info!("Camera facing: {}", facing.as_str());
        *facing
    }

    pub fn flash_mode(&self) -> FlashMode {
        *self.flash.lock().expect("lock poisoned")
    }

    pub fn facing(&self) -> CameraFacing {
        *self.facing.lock().expect("lock poisoned")
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    pub fn base_url(&self) -> &str {
        self.server.base_url()
    }

    pub fn publisher(&self) -> &SegmentPublisher {
        &self.publisher
    }

    /// Capture a still. Failures are logged, never raised; the demo has no
    /// user-visible error surface.
    pub async fn take_picture(&self) -> Option<PictureInfo> {
        match self.camera.take_picture().await {
            Ok(info) => {
                log::info!("Picture saved to {:?}", info.path);
                Some(info)
            }
            Err(e) => {
                log::error!("Failed to take picture: {}", e);
                None
            }
        }
    }

    /// Start recording. The flag is set optimistically before the camera is
    /// asked, and is not rolled back on failure (matching the source: the UI
    /// flips to the recording state immediately).
    pub async fn start_recording(&self) {
        if self.recording.swap(true, Ordering::SeqCst) {
            log::warn!("Recording already in progress");
            return;
        }

        if let Err(e) = self.camera.start_recording().await {
            log::error!("Failed to start recording: {}", e);
            return;
        }
        log::info!("Recording started");
    }

    /// Stop recording. The flag clears first so segment notifications that
    /// race with the stop are discarded by the publisher's gate.
    pub async fn stop_recording(&self) {
        if !self.recording.swap(false, Ordering::SeqCst) {
            log::warn!("Not recording");
            return;
        }

        if let Err(e) = self.camera.stop_recording().await {
            log::error!("Failed to stop recording: {}", e);
            return;
        }
        log::info!("Recording stopped");
    }

    /// Tear everything down: active recording, event pump, HTTP server.
    /// Published files stay on disk.
    pub async fn shutdown(mut self) {
        if self.is_recording() {
            self.stop_recording().await;
        }

        if let Some(pump) = self.pump.take() {
            pump.abort();
            let _ = pump.await;
        }

        self.server.stop().await;
        log::info!("Stream service shut down");
    }
}
