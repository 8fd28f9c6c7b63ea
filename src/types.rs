//! Core types shared across the crate
//!
//! Event payloads fired by the camera collaborator plus the small pieces of
//! UI state the demo cycles through (flash mode, camera facing).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::CamcastError;

/// Flash mode, cycled auto -> on -> off -> auto by the flash button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    Auto,
    On,
    Off,
}

impl FlashMode {
    /// Next mode in the fixed cycle order.
    pub fn cycle(self) -> Self {
        match self {
            FlashMode::Auto => FlashMode::On,
            FlashMode::On => FlashMode::Off,
            FlashMode::Off => FlashMode::Auto,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlashMode::Auto => "auto",
            FlashMode::On => "on",
            FlashMode::Off => "off",
        }
    }
}

/// Which camera the preview uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    Back,
    Front,
}

impl CameraFacing {
    pub fn toggle(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraFacing::Back => "back",
            CameraFacing::Front => "front",
        }
    }
}

/// Payload of a finished-segment event from the camera collaborator.
///
/// All three fields are required; the constructor rejects empty values so a
/// malformed event is caught at the boundary instead of surfacing later as a
/// confusing copy failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentNotification {
    /// Path of the updated manifest written by the collaborator.
    pub manifest_path: PathBuf,
    /// Path of the newly finished segment file.
    pub segment_path: PathBuf,
    /// Filename the segment should be published under.
    pub filename: String,
}

impl SegmentNotification {
    pub fn new(
        manifest_path: impl Into<PathBuf>,
        segment_path: impl Into<PathBuf>,
        filename: impl Into<String>,
    ) -> Result<Self, CamcastError> {
        let manifest_path = manifest_path.into();
        let segment_path = segment_path.into();
        let filename = filename.into();

        if manifest_path.as_os_str().is_empty() {
            return Err(CamcastError::CameraError(
                "segment notification missing manifest path".to_string(),
            ));
        }
        if segment_path.as_os_str().is_empty() {
            return Err(CamcastError::CameraError(
                "segment notification missing segment path".to_string(),
            ));
        }
        if filename.is_empty() {
            return Err(CamcastError::CameraError(
                "segment notification missing filename".to_string(),
            ));
        }

        Ok(Self {
            manifest_path,
            segment_path,
            filename,
        })
    }
}

/// Event fired by the camera collaborator into the service's event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEvent {
    /// A segment and an updated manifest finished writing.
    Segment(SegmentNotification),
    /// A new stream started. Carries the collaborator's stream ID;
    /// the reference behavior is an informational log only.
    StreamStarted { stream_id: Uuid },
}

/// Result of a still capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureInfo {
    pub path: PathBuf,
    pub taken_at: DateTime<Utc>,
}

impl PictureInfo {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            taken_at: Utc::now(),
        }
    }
}
