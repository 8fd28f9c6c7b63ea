//! Camera collaborator boundary
//!
//! The recording component is an external collaborator: it owns capture,
//! encoding, and segmenting, and reports back through an event channel.
//! This trait is the seam the service drives it through, so the demo runs
//! against the synthetic implementation in [`crate::testing`] without
//! hardware.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::CamcastError;
use crate::types::{CameraEvent, PictureInfo};

#[async_trait]
pub trait CameraController: Send + Sync {
    /// Begin segmented recording. Segment and stream-start events flow
    /// through the channel returned by [`take_events`](Self::take_events).
    async fn start_recording(&self) -> Result<(), CamcastError>;

    /// Stop recording. Segments already in flight may still be reported.
    async fn stop_recording(&self) -> Result<(), CamcastError>;

    /// Capture a still picture.
    async fn take_picture(&self) -> Result<PictureInfo, CamcastError>;

    /// Hand out the event receiver. Yields `Some` exactly once; the service
    /// takes it when the pump starts.
    fn take_events(&self) -> Option<mpsc::Receiver<CameraEvent>>;
}
