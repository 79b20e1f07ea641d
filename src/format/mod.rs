//! Label file encoding and decoding.
//!
//! This module owns the JSON contract shared with the browser client and
//! with existing corpora of label files:
//!
//! - **Label objects**: tagged by `label_type` (`point`, `box`,
//!   `oriented_ellipse`, `polygon`, `composite`, `group`)
//! - **Label files**: one `<stem>__labels.json` per image holding the
//!   labels and the set of completed tasks
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fastlabel::format::{decode_document, encode_document};
//!
//! let document = decode_document(&std::fs::read(path)?)?;
//! let bytes = encode_document(&document)?;
//! ```

mod error;
mod label_file;

#[cfg(test)]
mod tests;

pub use error::LabelError;
pub use label_file::{
    LABEL_FILE_SUFFIX, decode_document, decode_document_value, decode_label, decode_labels,
    encode_document, encode_label,
};
