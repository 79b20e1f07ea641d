//! The label-session protocol.
//!
//! Three request kinds are served, each independent of the others:
//!
//! - **get labels**: the stored document for an image, wrapped in a
//!   [`LabelHeader`] with a fresh session token
//! - **set labels**: replace an image's document wholesale
//! - **assist**: run the configured [`Segmenter`] on clicked points and
//!   return the resulting polygon regions
//!
//! The transport layer decides how payloads travel; everything here works
//! on `serde_json::Value` and plain Rust types.

mod assist;
mod error;
mod handler;
mod protocol;

pub use assist::{AssistError, Segmenter};
pub use error::SessionError;
pub use handler::SessionHandler;
pub use protocol::{
    AssistCommand, AssistLabels, AssistReply, AssistRequest, EDITABLE_STATE, GetLabelsRequest,
    LabelHeader, SetLabelsRequest, SubmittedLabels,
};
