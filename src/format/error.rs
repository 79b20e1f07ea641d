//! Error types for label decoding and validation.

use thiserror::Error;

use crate::model::ObjectId;

/// Errors that can occur while decoding or validating labels.
#[derive(Error, Debug)]
pub enum LabelError {
    /// Bad JSON, a missing required field or an unrecognized `label_type`.
    #[error("Malformed label data: {message}")]
    Malformed {
        /// Description of what was wrong
        message: String,
    },

    /// Two objects in one document share an id
    #[error("Duplicate object id: {id}")]
    DuplicateId {
        /// The repeated id
        id: ObjectId,
    },

    /// A group contains an object with the same id as one of its ancestors
    #[error("Group nesting cycle at object id: {id}")]
    CyclicGroup {
        /// The id that appears again below itself
        id: ObjectId,
    },

    /// A composite refers to ids that exist nowhere in the document
    #[error("Composite '{composite}' references missing objects: {missing:?}")]
    DanglingReference {
        /// Id of the composite holding the references
        composite: ObjectId,
        /// The member ids that did not resolve
        missing: Vec<ObjectId>,
    },
}

impl LabelError {
    /// Create a malformed-label error with a message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for LabelError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}
