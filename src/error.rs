use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Debug, Error)]
pub enum PlayerError {
    /// The bundled resource could not be located in any bundle directory.
    #[error("{name} not found")]
    ResourceNotFound { name: String },

    #[error("media backend error: {0}")]
    Backend(String),

    #[error("invalid controller state: {0}")]
    InvalidState(&'static str),

    #[error("failed to parse config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<gstreamer::glib::Error> for PlayerError {
    fn from(err: gstreamer::glib::Error) -> Self {
        PlayerError::Backend(err.to_string())
    }
}

impl From<gstreamer::glib::BoolError> for PlayerError {
    fn from(err: gstreamer::glib::BoolError) -> Self {
        PlayerError::Backend(err.to_string())
    }
}

impl From<gstreamer::StateChangeError> for PlayerError {
    fn from(err: gstreamer::StateChangeError) -> Self {
        PlayerError::Backend(err.to_string())
    }
}
