//! Testing utilities for camcast
//!
//! Provides a synthetic camera collaborator that produces real manifest and
//! segment files on disk, enabling the demo and the test suite to run
//! without camera hardware.

pub mod synthetic_camera;

pub use synthetic_camera::{synthetic_segment_bytes, SyntheticCamera};
