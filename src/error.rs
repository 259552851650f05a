use thiserror::Error;

use crate::model::DeliveryStep;

#[derive(Debug, Error)]
pub enum PasteError {
    /// Never returned from a paste; only logged, since it just disables restoration.
    #[error("failed to read clipboard: {0}")]
    ClipboardReadFailed(String),

    #[error("failed to copy to clipboard: {0}")]
    ClipboardWriteFailed(String),

    #[error("failed to paste text, try pasting manually (control+v)")]
    PasteDeliveryFailed {
        attempts: Vec<DeliveryStep>,
        restore_scheduled: bool,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no block named '{0}'")]
    NotFound(String),

    #[error("a block named '{0}' already exists")]
    AlreadyExists(String),

    #[error("block name must not be empty")]
    EmptyName,

    #[error("failed accessing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed parsing {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
