use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotepadError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported image format: {0}")]
    UnsupportedImage(String),

    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("print failed: {0}")]
    Print(String),
}

impl NotepadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, NotepadError>;
