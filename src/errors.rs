use std::fmt;

#[derive(Debug)]
pub enum CamcastError {
    InitializationError(String),
    CameraError(String),
    PublishError(String),
    ServerError(String),
    IoError(String),
}

impl fmt::Display for CamcastError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CamcastError::InitializationError(msg) => write!(f, "Initialization error: {}", msg),
            CamcastError::CameraError(msg) => write!(f, "Camera error: {}", msg),
            CamcastError::PublishError(msg) => write!(f, "Publish error: {}", msg),
            CamcastError::ServerError(msg) => write!(f, "Server error: {}", msg),
            CamcastError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for CamcastError {}

impl From<std::io::Error> for CamcastError {
    fn from(e: std::io::Error) -> Self {
        CamcastError::IoError(e.to_string())
    }
}
