//! Configuration management for camcast
//!
//! Provides configuration loading, saving, and validation for the embedded
//! server, the served storage directory, and camera defaults.

use crate::errors::CamcastError;
use crate::types::{CameraFacing, FlashMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CamcastConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub camera: CameraConfig,
}

/// Embedded HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port for the static file server
    pub port: u16,
    /// Bind address (use "127.0.0.1" to keep the stream local)
    pub bind_addr: String,
}

/// Served directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory exposed verbatim over HTTP
    pub served_dir: String,
    /// Well-known manifest name inside the served directory
    pub playlist_name: String,
}

/// Camera defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Flash mode at startup
    pub default_flash: FlashMode,
    /// Camera facing at startup
    pub default_facing: CameraFacing,
    /// Target duration of each recorded segment in seconds
    pub segment_duration_secs: u64,
}

impl Default for CamcastConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8080,
                bind_addr: "0.0.0.0".to_string(),
            },
            storage: StorageConfig {
                served_dir: "./stream".to_string(),
                playlist_name: "playlist.m3u8".to_string(),
            },
            camera: CameraConfig {
                default_flash: FlashMode::Auto,
                default_facing: CameraFacing::Back,
                segment_duration_secs: 2,
            },
        }
    }
}

impl CamcastConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CamcastError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            CamcastError::InitializationError(format!("Failed to read config file: {}", e))
        })?;

        let config: CamcastConfig = toml::from_str(&contents).map_err(|e| {
            CamcastError::InitializationError(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CamcastError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CamcastError::InitializationError(format!(
                    "Failed to create config directory: {}",
                    e
                ))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            CamcastError::InitializationError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            CamcastError::InitializationError(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("camcast.toml")
    }

    /// Load from default location or create with defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be non-zero".to_string());
        }
        if self.server.bind_addr.is_empty() {
            return Err("Bind address must not be empty".to_string());
        }

        if self.storage.served_dir.is_empty() {
            return Err("Served directory must not be empty".to_string());
        }
        if self.storage.playlist_name.is_empty() {
            return Err("Playlist name must not be empty".to_string());
        }
        if self.storage.playlist_name.contains('/') {
            return Err("Playlist name must be a bare filename".to_string());
        }

        if self.camera.segment_duration_secs == 0 {
            return Err("Segment duration must be at least 1 second".to_string());
        }

        Ok(())
    }

    /// Filesystem path of the served manifest.
    pub fn playlist_path(&self) -> PathBuf {
        Path::new(&self.storage.served_dir).join(&self.storage.playlist_name)
    }
}
