//! Request and reply payloads exchanged with the labelling client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{LabelDocument, LabelObject, Point2, Ring};
use crate::session::SessionError;

/// Value of [`LabelHeader::state`] for images the client may edit.
pub const EDITABLE_STATE: &str = "editable";

/// Labels for one image as sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelHeader {
    pub image_id: String,
    pub labels: Vec<LabelObject>,
    pub completed_tasks: Vec<String>,
    #[serde(rename = "timeElapsed")]
    pub time_elapsed: f64,
    pub state: String,
    /// Fresh token per request.
    pub session_id: String,
}

impl LabelHeader {
    /// Build a header from a stored document.
    pub fn new(image_id: impl Into<String>, document: LabelDocument, session_id: String) -> Self {
        Self {
            image_id: image_id.into(),
            labels: document.labels,
            completed_tasks: document.completed_tasks.into_iter().collect(),
            time_elapsed: 0.0,
            state: EDITABLE_STATE.to_string(),
            session_id,
        }
    }
}

/// A `get labels` request: `{"image_id": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetLabelsRequest {
    pub image_id: String,
}

impl GetLabelsRequest {
    pub fn from_json(value: Value) -> Result<Self, SessionError> {
        serde_json::from_value(value).map_err(|err| SessionError::InvalidRequest {
            message: err.to_string(),
        })
    }
}

/// A `set labels` request: `{"label_header": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetLabelsRequest {
    pub label_header: SubmittedLabels,
}

/// Labels submitted by the client. `labels` stays raw JSON until the store
/// decodes it, so decode errors surface as label errors.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedLabels {
    pub image_id: String,
    pub labels: Value,
    #[serde(default)]
    pub completed_tasks: Vec<String>,
}

impl SetLabelsRequest {
    pub fn from_json(value: Value) -> Result<Self, SessionError> {
        serde_json::from_value(value).map_err(|err| SessionError::InvalidRequest {
            message: err.to_string(),
        })
    }
}

/// Points clicked for assisted segmentation of one image.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistRequest {
    pub image_id: String,
    /// Opaque client token, echoed back.
    #[serde(default)]
    pub dextr_id: Value,
    pub dextr_points: Vec<Point2>,
}

/// An assist command: `{"request": {...}}` or `{"poll": ...}`.
#[derive(Debug, Clone)]
pub enum AssistCommand {
    Request(AssistRequest),
    Poll,
}

impl AssistCommand {
    /// Recognise the command shape. A `request` key takes precedence over
    /// `poll`. Anything else is an unknown command.
    pub fn parse(value: &Value) -> Result<Self, SessionError> {
        if let Some(request) = value.get("request") {
            let request = AssistRequest::deserialize(request).map_err(|err| {
                SessionError::UnknownCommand {
                    message: format!("invalid assist request: {err}"),
                }
            })?;
            return Ok(Self::Request(request));
        }
        if value.get("poll").is_some() {
            return Ok(Self::Poll);
        }
        Err(SessionError::UnknownCommand {
            message: format!("unrecognised assist command {value}"),
        })
    }
}

/// Regions found for one assist request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistLabels {
    pub image_id: String,
    pub dextr_id: Value,
    pub regions: Vec<Ring>,
}

/// Reply to an assist command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AssistReply {
    Labels {
        labels: Vec<AssistLabels>,
    },
    Error {
        error: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl AssistReply {
    /// Empty reply, used for polls.
    pub fn empty() -> Self {
        Self::Labels { labels: Vec::new() }
    }

    pub fn unknown_command() -> Self {
        Self::Error {
            error: "unknown_command",
            message: None,
        }
    }

    pub fn assist_failure(message: impl Into<String>) -> Self {
        Self::Error {
            error: "assist_failure",
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_wire_names() {
        let header = LabelHeader::new("3", LabelDocument::new(), "tok".to_string());
        let value = serde_json::to_value(&header).unwrap();

        assert_eq!(
            value,
            json!({
                "image_id": "3",
                "labels": [],
                "completed_tasks": [],
                "timeElapsed": 0.0,
                "state": "editable",
                "session_id": "tok"
            })
        );
    }

    #[test]
    fn test_set_labels_request() {
        let request = SetLabelsRequest::from_json(json!({
            "label_header": {"image_id": "2", "labels": [], "completed_tasks": ["a"]}
        }))
        .unwrap();
        assert_eq!(request.label_header.image_id, "2");
        assert_eq!(request.label_header.completed_tasks, vec!["a".to_string()]);

        assert!(matches!(
            SetLabelsRequest::from_json(json!({"image_id": "2"})),
            Err(SessionError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_parse_assist_commands() {
        let request = AssistCommand::parse(&json!({
            "request": {
                "image_id": "0",
                "dextr_id": 17,
                "dextr_points": [{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0}]
            }
        }))
        .unwrap();
        match request {
            AssistCommand::Request(req) => {
                assert_eq!(req.dextr_id, json!(17));
                assert_eq!(req.dextr_points.len(), 2);
            }
            AssistCommand::Poll => panic!("expected request"),
        }

        assert!(matches!(
            AssistCommand::parse(&json!({"poll": true})),
            Ok(AssistCommand::Poll)
        ));
        assert!(matches!(
            AssistCommand::parse(&json!({"ping": 1})),
            Err(SessionError::UnknownCommand { .. })
        ));
        assert!(matches!(
            AssistCommand::parse(&json!({"request": {"image_id": "0"}})),
            Err(SessionError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_assist_reply_shapes() {
        assert_eq!(
            serde_json::to_value(AssistReply::empty()).unwrap(),
            json!({"labels": []})
        );
        assert_eq!(
            serde_json::to_value(AssistReply::unknown_command()).unwrap(),
            json!({"error": "unknown_command"})
        );
        assert_eq!(
            serde_json::to_value(AssistReply::assist_failure("model crashed")).unwrap(),
            json!({"error": "assist_failure", "message": "model crashed"})
        );
    }
}
