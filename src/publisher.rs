//! Segment publisher
//!
//! Republishes camera-produced segments and manifests into the served
//! directory under stable names, so a URL handed out once keeps resolving to
//! the latest manifest. Publishes are fully serialized: a lock replaces the
//! original's module-level busy flag, and waiters wake as soon as the
//! previous publish releases it instead of polling.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::errors::CamcastError;
use crate::types::{CameraEvent, SegmentNotification};

/// What a single publish observed. Returned by the fallible inner routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOutcome {
    /// True exactly once per publisher lifetime, on the first publish that
    /// completed successfully.
    pub first_publish: bool,
}

/// State mutated only while the publish lock is held.
struct PublisherInner {
    /// Whether the one-time serving notice has been emitted.
    announced: bool,
}

/// Serializes publication of segments and manifests into the served root.
pub struct SegmentPublisher {
    served_root: PathBuf,
    playlist_path: PathBuf,
    /// Filled in once the server has bound and knows its address. The
    /// publisher is built before the server so stale files can be cleared
    /// before any bytes are handed out.
    base_url: std::sync::Mutex<Option<String>>,
    /// Recording gate shared with the owning service. Notifications arriving
    /// while this is false are discarded without touching the filesystem.
    recording: Arc<AtomicBool>,
    inner: Mutex<PublisherInner>,
}

impl SegmentPublisher {
    pub fn new(
        served_root: impl AsRef<Path>,
        playlist_name: &str,
        recording: Arc<AtomicBool>,
    ) -> Self {
        let served_root = served_root.as_ref().to_path_buf();
        let playlist_path = served_root.join(playlist_name);
        Self {
            served_root,
            playlist_path,
            base_url: std::sync::Mutex::new(None),
            recording,
            inner: Mutex::new(PublisherInner { announced: false }),
        }
    }

    /// Record the server's base URL so the one-time notice can name it.
    pub fn set_base_url(&self, base_url: impl Into<String>) {
        *self.base_url.lock().expect("lock poisoned") = Some(base_url.into());
    }

    /// Externally reachable manifest URL, if the server's base URL is known.
    pub fn manifest_url(&self) -> Option<String> {
        let name = self.playlist_path.file_name()?.to_string_lossy();
        self.base_url
            .lock()
            .expect("lock poisoned")
            .as_ref()
            .map(|base| format!("{}/{}", base, name))
    }

    /// Remove a manifest left over from a previous run.
    ///
    /// Called once at startup, before the server starts handing out bytes.
    pub async fn clear_stale_playlist(&self) -> Result<(), CamcastError> {
        remove_if_exists(&self.playlist_path).await
    }

    /// Dispatch one camera event.
    pub async fn handle_event(&self, event: CameraEvent) {
        match event {
            CameraEvent::Segment(notification) => self.handle_segment(&notification).await,
            CameraEvent::StreamStarted { stream_id } => {
                // Extension point only; the reference behavior carries no state.
                log::info!("New stream started: {}", stream_id);
            }
        }
    }

    /// Handle one segment notification.
    ///
    /// Silently discards the notification if recording already stopped. Any
    /// publish failure is logged and swallowed so the next notification is
    /// still attempted; no error reaches the caller.
    pub async fn handle_segment(&self, notification: &SegmentNotification) {
        if !self.recording.load(Ordering::SeqCst) {
            log::debug!(
                "Dropping segment {} (recording stopped)",
                notification.filename
            );
            return;
        }

        if let Err(e) = self.publish(notification).await {
            log::error!("Failed to publish segment {}: {}", notification.filename, e);
        }
    }

    /// Publish one segment and its manifest into the served root.
    ///
    /// Holds the publish lock for the whole copy sequence: at most one
    /// publish is inside this critical section at any instant, and later
    /// notifications always see earlier ones fully flushed.
    pub async fn publish(
        &self,
        notification: &SegmentNotification,
    ) -> Result<PublishOutcome, CamcastError> {
        let mut inner = self.inner.lock().await;

        remove_if_exists(&self.playlist_path).await?;
        tokio::fs::copy(&notification.manifest_path, &self.playlist_path)
            .await
            .map_err(|e| {
                CamcastError::PublishError(format!(
                    "Failed to copy manifest {:?}: {}",
                    notification.manifest_path, e
                ))
            })?;

        let segment_dest = self.served_root.join(&notification.filename);
        remove_if_exists(&segment_dest).await?;
        tokio::fs::copy(&notification.segment_path, &segment_dest)
            .await
            .map_err(|e| {
                CamcastError::PublishError(format!(
                    "Failed to copy segment {:?}: {}",
                    notification.segment_path, e
                ))
            })?;

        let first_publish = !inner.announced;
        if first_publish {
            inner.announced = true;
            match self.manifest_url() {
                Some(url) => log::info!("Serving at URL {}", url),
                None => log::info!("Serving manifest at {:?}", self.playlist_path),
            }
        }

        log::debug!(
            "Published segment {} ({:?} -> {:?})",
            notification.filename,
            notification.segment_path,
            segment_dest
        );

        Ok(PublishOutcome { first_publish })
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), CamcastError> {
    if tokio::fs::try_exists(path).await? {
        tokio::fs::remove_file(path).await?;
    }
    Ok(())
}
