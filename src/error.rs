use crate::config::ConfigKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Loading or saving one of the configuration documents failed.
    #[error("{kind} config: {message}")]
    ConfigIo { kind: ConfigKind, message: String },

    #[error("album not found: {0}")]
    AlbumNotFound(String),

    #[error("image not found in album {album}: {path}")]
    ImageNotFound { album: String, path: String },

    #[error("image not found in queue: {0}")]
    QueueItemNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The desktop refused the wallpaper. The queue head stays consumed.
    #[error("failed to set wallpaper {path}: {message}")]
    ExternalActionFailure { path: String, message: String },

    #[error("queue is empty")]
    EmptyQueue,

    #[error("no active images in the selected albums")]
    EmptyPool,

    #[error("daemon is not running")]
    DaemonUnavailable,

    #[error("ipc: {0}")]
    Ipc(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn config_io(kind: ConfigKind, err: impl std::fmt::Display) -> Self {
        Error::ConfigIo {
            kind,
            message: err.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
