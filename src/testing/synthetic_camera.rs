//! Synthetic camera collaborator
//!
//! Emits segment and stream-start events backed by real files in its own
//! working directory: a growing m3u8 manifest plus numbered MPEG-TS-shaped
//! segment files with deterministic contents.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::camera::CameraController;
use crate::errors::CamcastError;
use crate::types::{CameraEvent, PictureInfo, SegmentNotification};

const EVENT_CHANNEL_CAPACITY: usize = 32;
const TS_PACKET_SIZE: usize = 188;

/// Deterministic segment payload: MPEG-TS-shaped packets (0x47 sync byte,
/// gradient filler varying by sequence number).
pub fn synthetic_segment_bytes(sequence: u64, packet_count: usize) -> Vec<u8> {
    let mut data = vec![0u8; packet_count * TS_PACKET_SIZE];
    let base = (sequence % 256) as u8;
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = if i % TS_PACKET_SIZE == 0 {
            0x47
        } else {
            base.wrapping_add((i % 251) as u8)
        };
    }
    data
}

/// Hardware-free camera collaborator.
pub struct SyntheticCamera {
    work_dir: PathBuf,
    segment_duration: Duration,
    events_tx: mpsc::Sender<CameraEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<CameraEvent>>>,
    recording: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SyntheticCamera {
    /// `work_dir` is the collaborator's private output directory, distinct
    /// from the served root the publisher copies into.
    pub fn new(work_dir: impl AsRef<Path>, segment_duration: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            work_dir: work_dir.as_ref().to_path_buf(),
            segment_duration,
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            recording: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    /// Inject an event directly, bypassing the recording loop. Test hook.
    pub async fn inject(&self, event: CameraEvent) -> Result<(), CamcastError> {
        self.events_tx
            .send(event)
            .await
            .map_err(|_| CamcastError::CameraError("event channel closed".to_string()))
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    async fn recording_loop(
        work_dir: PathBuf,
        segment_duration: Duration,
        recording: Arc<AtomicBool>,
        events_tx: mpsc::Sender<CameraEvent>,
    ) {
        let manifest_path = work_dir.join("live.m3u8");
        let mut published: Vec<String> = Vec::new();
        let mut sequence: u64 = 0;

        loop {
            tokio::time::sleep(segment_duration).await;
            if !recording.load(Ordering::SeqCst) {
                break;
            }

            let filename = format!("seg{}.ts", sequence);
            let segment_path = work_dir.join(&filename);
            let payload = synthetic_segment_bytes(sequence, 16);

            if let Err(e) = tokio::fs::write(&segment_path, &payload).await {
                log::error!("Synthetic camera failed to write segment: {}", e);
                break;
            }

            published.push(filename.clone());
            let manifest = render_manifest(&published, segment_duration);
            if let Err(e) = tokio::fs::write(&manifest_path, manifest).await {
                log::error!("Synthetic camera failed to write manifest: {}", e);
                break;
            }

            let notification =
                match SegmentNotification::new(&manifest_path, &segment_path, filename) {
                    Ok(n) => n,
                    Err(e) => {
                        log::error!("Synthetic camera produced a bad notification: {}", e);
                        break;
                    }
                };
            if events_tx
                .send(CameraEvent::Segment(notification))
                .await
                .is_err()
            {
                break;
            }
            sequence += 1;
        }
    }
}

fn render_manifest(segments: &[String], segment_duration: Duration) -> String {
    let target = segment_duration.as_secs().max(1);
    let mut manifest = format!(
        "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:{}\n#EXT-X-MEDIA-SEQUENCE:0\n",
        target
    );
    for name in segments {
        manifest.push_str(&format!(
            "#EXTINF:{:.1},\n{}\n",
            segment_duration.as_secs_f64(),
            name
        ));
    }
    manifest
}

#[async_trait]
impl CameraController for SyntheticCamera {
    async fn start_recording(&self) -> Result<(), CamcastError> {
        if self.recording.swap(true, Ordering::SeqCst) {
            return Err(CamcastError::CameraError(
                "recording already in progress".to_string(),
            ));
        }

        tokio::fs::create_dir_all(&self.work_dir).await?;

        let stream_id = Uuid::new_v4();
        self.events_tx
            .send(CameraEvent::StreamStarted { stream_id })
            .await
            .map_err(|_| CamcastError::CameraError("event channel closed".to_string()))?;

        let handle = tokio::spawn(Self::recording_loop(
            self.work_dir.clone(),
            self.segment_duration,
            self.recording.clone(),
            self.events_tx.clone(),
        ));
        *self.task.lock().expect("lock poisoned") = Some(handle);

        log::info!("Synthetic camera recording started ({})", stream_id);
        Ok(())
    }

    async fn stop_recording(&self) -> Result<(), CamcastError> {
        if !self.recording.swap(false, Ordering::SeqCst) {
            return Err(CamcastError::CameraError("not recording".to_string()));
        }

        let handle = self.task.lock().expect("lock poisoned").take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::warn!("Synthetic camera loop failed to join: {}", e);
            }
        }

        log::info!("Synthetic camera recording stopped");
        Ok(())
    }

    async fn take_picture(&self) -> Result<PictureInfo, CamcastError> {
        tokio::fs::create_dir_all(&self.work_dir).await?;

        let filename = format!("photo_{}.jpg", chrono::Utc::now().timestamp_millis());
        let path = self.work_dir.join(filename);
        // JPEG SOI/EOI markers around filler bytes; enough for a player or
        // file manager to identify the type.
        let mut payload = vec![0xFF, 0xD8, 0xFF, 0xE0];
        payload.extend(std::iter::repeat(0x10).take(64));
        payload.extend([0xFF, 0xD9]);
        tokio::fs::write(&path, payload).await?;

        Ok(PictureInfo::new(path))
    }

    fn take_events(&self) -> Option<mpsc::Receiver<CameraEvent>> {
        self.events_rx.lock().expect("lock poisoned").take()
    }
}
