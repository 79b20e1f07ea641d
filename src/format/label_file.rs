//! JSON encoding of label objects and per-image label files.
//!
//! A label file looks like:
//!
//! ```json
//! {
//!   "labels": [ {"id": "...", "label_type": "polygon", "regions": [...]} ],
//!   "completed_tasks": ["finished"]
//! }
//! ```
//!
//! Files written by older versions of the tool hold only the bare `labels`
//! array; those decode as a document with no completed tasks.

use serde::Deserialize;
use serde_json::Value;

use crate::format::error::LabelError;
use crate::model::{LabelDocument, LabelObject};

/// Suffix appended to an image's file stem to name its label file.
pub const LABEL_FILE_SUFFIX: &str = "__labels.json";

/// Decode a single label object from JSON.
pub fn decode_label(value: &Value) -> Result<LabelObject, LabelError> {
    Ok(LabelObject::deserialize(value)?)
}

/// Encode a single label object to JSON.
pub fn encode_label(label: &LabelObject) -> Result<Value, LabelError> {
    Ok(serde_json::to_value(label)?)
}

/// Decode a JSON array of label objects.
pub fn decode_labels(value: &Value) -> Result<Vec<LabelObject>, LabelError> {
    let Value::Array(items) = value else {
        return Err(LabelError::malformed(format!(
            "expected an array of labels, found {}",
            json_kind(value)
        )));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            decode_label(item).map_err(|err| match err {
                LabelError::Malformed { message } => {
                    LabelError::malformed(format!("label {index}: {message}"))
                }
                other => other,
            })
        })
        .collect()
}

/// Decode a label file's contents.
pub fn decode_document(bytes: &[u8]) -> Result<LabelDocument, LabelError> {
    let value: Value = serde_json::from_slice(bytes)?;
    decode_document_value(&value)
}

/// Decode a label document from parsed JSON, accepting the legacy bare-array form.
pub fn decode_document_value(value: &Value) -> Result<LabelDocument, LabelError> {
    match value {
        Value::Array(_) => {
            log::debug!("Decoding legacy label file without completed tasks");
            Ok(LabelDocument::with_labels(decode_labels(value)?, Vec::new()))
        }
        Value::Object(map) => {
            let labels = match map.get("labels") {
                Some(labels) => decode_labels(labels)?,
                None => Vec::new(),
            };
            let completed_tasks = match map.get("completed_tasks") {
                Some(Value::Null) | None => Vec::new(),
                Some(tasks) => Vec::<String>::deserialize(tasks)?,
            };
            Ok(LabelDocument::with_labels(labels, completed_tasks))
        }
        other => Err(LabelError::malformed(format!(
            "expected a label document object, found {}",
            json_kind(other)
        ))),
    }
}

/// Encode a label document as pretty-printed JSON bytes.
pub fn encode_document(document: &LabelDocument) -> Result<Vec<u8>, LabelError> {
    Ok(serde_json::to_vec_pretty(document)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
