use thiserror::Error;

use crate::format::LabelError;
use crate::session::AssistError;
use crate::store::StoreError;

/// Errors from handling a client request.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The request payload did not have the expected shape
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// An assist command of unrecognised shape
    #[error("Unknown command: {message}")]
    UnknownCommand { message: String },

    /// The segmenter failed or returned an unusable mask
    #[error("Assisted segmentation failed: {0}")]
    AssistFailure(AssistError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::InvalidRequest { .. } | Self::UnknownCommand { .. } => true,
            Self::AssistFailure(_) => false,
            Self::Store(err) => matches!(
                err,
                StoreError::UnknownImage { .. }
                    | StoreError::ReadOnly { .. }
                    | StoreError::Label(LabelError::Malformed { .. })
                    | StoreError::Label(LabelError::DanglingReference { .. })
                    | StoreError::Label(LabelError::DuplicateId { .. })
                    | StoreError::Label(LabelError::CyclicGroup { .. })
            ),
        }
    }

    /// Short machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::UnknownCommand { .. } => "unknown_command",
            Self::AssistFailure(_) => "assist_failure",
            Self::Store(StoreError::UnknownImage { .. }) => "unknown_image",
            Self::Store(StoreError::ReadOnly { .. }) => "read_only",
            Self::Store(StoreError::Label(LabelError::DanglingReference { .. })) => {
                "dangling_reference"
            }
            Self::Store(StoreError::Label(_)) => "malformed_label",
            Self::Store(_) => "internal",
        }
    }
}

impl From<AssistError> for SessionError {
    fn from(err: AssistError) -> Self {
        Self::AssistFailure(err)
    }
}
