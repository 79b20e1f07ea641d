use std::path::PathBuf;

use thiserror::Error;

use crate::format::LabelError;

/// Errors from the label store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unknown image id: {id}")]
    UnknownImage { id: String },

    #[error("Labels for image {id} are read-only")]
    ReadOnly { id: String },

    /// Submitted labels failed to decode or validate
    #[error(transparent)]
    Label(#[from] LabelError),

    /// A label file on disk could not be decoded
    #[error("Corrupt label file {path:?}: {source}")]
    CorruptLabelFile {
        path: PathBuf,
        #[source]
        source: LabelError,
    },

    /// Two images map to the same label file
    #[error("Label file {path:?} would be shared by more than one image")]
    LabelPathCollision { path: PathBuf },

    #[error("Failed to open image {path:?}: {source}")]
    ImageOpen {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
