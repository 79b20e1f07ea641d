//! HTTP request handlers.

use axum::{
    Form, Json,
    extract::{Path as AxumPath, State, rejection::FormRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::data::ImageDescriptor;
use crate::session::{AssistReply, LabelHeader, SessionError, SetLabelsRequest, SubmittedLabels};
use crate::store::StoreError;

use super::AppState;

/// Error response for an HTTP request.
#[derive(Debug)]
pub enum ApiError {
    Session(SessionError),
    /// Missing form field, or a field that is not valid JSON
    BadPayload(String),
    Internal(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Session(SessionError::Store(StoreError::UnknownImage { .. })) => {
                StatusCode::NOT_FOUND
            }
            Self::Session(SessionError::Store(StoreError::ReadOnly { .. })) => {
                StatusCode::FORBIDDEN
            }
            Self::Session(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::BadPayload(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Session(err) => err.code(),
            Self::BadPayload(_) => "invalid_request",
            Self::Internal(_) => "internal",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Session(err) => err.to_string(),
            Self::BadPayload(message) | Self::Internal(message) => message.clone(),
        }
    }

    /// `{error, message}` body sent to the client.
    pub(crate) fn to_json(&self) -> Value {
        json!({"error": self.code(), "message": self.message()})
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self.message());
        } else {
            log::warn!("Request rejected: {}", self.message());
        }
        (status, Json(self.to_json())).into_response()
    }
}

/// `labels` form field of a set-labels post.
#[derive(Debug, Deserialize)]
pub struct LabelsForm {
    labels: String,
}

/// `dextr` form field of an assist post.
#[derive(Debug, Deserialize)]
pub struct DextrForm {
    dextr: String,
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self::BadPayload(rejection.body_text())
    }
}

fn parse_form_json(field: &str, raw: &str) -> Result<Value, ApiError> {
    serde_json::from_str(raw)
        .map_err(|err| ApiError::BadPayload(format!("form field '{field}' is not JSON: {err}")))
}

/// Get the labels for an image
pub async fn get_labels(
    State(state): State<AppState>,
    AxumPath(image_id): AxumPath<String>,
) -> Result<Json<LabelHeader>, ApiError> {
    let header = state
        .run_blocking(move |handler| handler.get_labels(&image_id))
        .await?;
    Ok(Json(header))
}

/// Replace the labels for an image
pub async fn set_labels(
    State(state): State<AppState>,
    form: Result<Form<LabelsForm>, FormRejection>,
) -> Result<StatusCode, ApiError> {
    let Form(form) = form?;
    let label_header: SubmittedLabels =
        serde_json::from_value(parse_form_json("labels", &form.labels)?).map_err(|err| {
            ApiError::Session(SessionError::InvalidRequest {
                message: err.to_string(),
            })
        })?;
    state
        .run_blocking(move |handler| handler.set_labels(SetLabelsRequest { label_header }))
        .await?;
    Ok(StatusCode::OK)
}

/// Run an assist command
pub async fn dextr(
    State(state): State<AppState>,
    form: Result<Form<DextrForm>, FormRejection>,
) -> Result<Json<AssistReply>, ApiError> {
    let Form(form) = form?;
    let command = parse_form_json("dextr", &form.dextr)?;
    let reply = state
        .run_blocking(move |handler| handler.assist(&command))
        .await?;
    Ok(Json(reply))
}

/// Raw image bytes
pub async fn get_image(
    State(state): State<AppState>,
    AxumPath(image_id): AxumPath<String>,
) -> Result<Response, ApiError> {
    let (data, mime_type) = state
        .run_blocking(move |handler| Ok(handler.store().data_and_mime_type(&image_id)?))
        .await?;
    Ok(([(header::CONTENT_TYPE, mime_type)], data).into_response())
}

/// Descriptors for all images
pub async fn get_images(State(state): State<AppState>) -> Json<Vec<ImageDescriptor>> {
    Json(state.handler.store().image_descriptors())
}

/// Interface settings for the client
pub async fn get_settings(State(state): State<AppState>) -> Json<Value> {
    Json(state.settings.as_ref().clone())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::server::{AppState, router};
    use crate::session::SessionHandler;
    use crate::store::StoreOptions;
    use crate::store::tests::write_store;

    fn test_router(settings: Option<Value>) -> (tempfile::TempDir, Router) {
        let (dir, store) = write_store(2, StoreOptions::new("http"));
        let state = AppState::new(SessionHandler::new(Arc::new(store)), settings);
        (dir, router(state))
    }

    fn form_post(uri: &str, field: &str, value: &Value) -> Request<Body> {
        let body = format!("{}={}", field, urlencoding::encode(&value.to_string()));
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_get_set_roundtrip() {
        let (_dir, app) = test_router(None);

        let response = app
            .clone()
            .oneshot(get("/labelling/get_labels/1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let header = body_json(response).await;
        assert_eq!(header["image_id"], "1");
        assert_eq!(header["state"], "editable");
        assert_eq!(header["labels"], json!([]));

        let submission = json!({
            "image_id": "1",
            "labels": [{"label_type": "point", "position": {"x": 2.0, "y": 3.0}}],
            "completed_tasks": ["points"]
        });
        let response = app
            .clone()
            .oneshot(form_post("/labelling/set_labels", "labels", &submission))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let header = body_json(
            app.oneshot(get("/labelling/get_labels/1")).await.unwrap(),
        )
        .await;
        assert_eq!(header["labels"].as_array().unwrap().len(), 1);
        assert!(header["labels"][0]["id"].as_str().unwrap().starts_with("http:"));
        assert_eq!(header["completed_tasks"], json!(["points"]));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (_dir, app) = test_router(None);

        let response = app
            .clone()
            .oneshot(get("/labelling/get_labels/99"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "unknown_image");

        let bad = json!({"image_id": "0", "labels": [{"label_type": "blob"}]});
        let response = app
            .clone()
            .oneshot(form_post("/labelling/set_labels", "labels", &bad))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(get("/image/99"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_form_field_is_json_error() {
        let (_dir, app) = test_router(None);

        let wrong_field = form_post("/labelling/set_labels", "dextr", &json!({"poll": true}));
        let response = app.clone().oneshot(wrong_field).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid_request");
        assert!(body["message"].is_string());

        let not_a_form = Request::builder()
            .method("POST")
            .uri("/labelling/dextr")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"dextr": "{}"}"#))
            .unwrap();
        let response = app.oneshot(not_a_form).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_dextr_poll_and_unknown() {
        let (_dir, app) = test_router(None);

        let response = app
            .clone()
            .oneshot(form_post("/labelling/dextr", "dextr", &json!({"poll": true})))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!({"labels": []}));

        let response = app
            .oneshot(form_post("/labelling/dextr", "dextr", &json!({"what": 1})))
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await,
            json!({"error": "unknown_command"})
        );
    }

    #[tokio::test]
    async fn test_image_and_listing() {
        let (_dir, app) = test_router(Some(json!({"tasks": ["a"]})));

        let response = app.clone().oneshot(get("/image/0")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");

        let images = body_json(app.clone().oneshot(get("/api/images")).await.unwrap()).await;
        assert_eq!(images.as_array().unwrap().len(), 2);
        assert_eq!(images[1]["url"], "/image/1");

        let settings = body_json(app.oneshot(get("/api/settings")).await.unwrap()).await;
        assert_eq!(settings, json!({"tasks": ["a"]}));
    }
}
