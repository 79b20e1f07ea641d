use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::data::{MASK_THRESHOLD, mask_to_regions, threshold_mask};
use crate::session::assist::check_mask_shape;
use crate::session::{
    AssistCommand, AssistLabels, AssistReply, AssistRequest, LabelHeader, Segmenter, SessionError,
    SetLabelsRequest,
};
use crate::store::LabelStore;

/// Handles client requests against a label store.
///
/// Requests are independent: the handler keeps no per-client state, and
/// everything it knows about an image comes from the store.
#[derive(Clone)]
pub struct SessionHandler {
    store: Arc<LabelStore>,
    segmenter: Option<Arc<dyn Segmenter>>,
}

impl std::fmt::Debug for SessionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandler")
            .field("images", &self.store.images().len())
            .field("segmenter", &self.segmenter.as_ref().map(|s| s.name()))
            .finish()
    }
}

impl SessionHandler {
    pub fn new(store: Arc<LabelStore>) -> Self {
        Self {
            store,
            segmenter: None,
        }
    }

    /// Enable assisted segmentation.
    pub fn with_segmenter(mut self, segmenter: Arc<dyn Segmenter>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    pub fn store(&self) -> &LabelStore {
        &self.store
    }

    pub fn has_segmenter(&self) -> bool {
        self.segmenter.is_some()
    }

    /// Current labels for an image, with a fresh session token.
    pub fn get_labels(&self, image_id: &str) -> Result<LabelHeader, SessionError> {
        let document = self.store.get_label_data_for_tool(image_id)?;
        log::debug!(
            "Sending {} labels for image {}",
            document.labels.len(),
            image_id
        );
        Ok(LabelHeader::new(
            image_id,
            document,
            Uuid::new_v4().to_string(),
        ))
    }

    /// Replace an image's labels with a client submission.
    pub fn set_labels(&self, request: SetLabelsRequest) -> Result<(), SessionError> {
        let submitted = request.label_header;
        self.store.set_label_data_from_tool(
            &submitted.image_id,
            &submitted.labels,
            submitted.completed_tasks,
        )?;
        Ok(())
    }

    /// Parse a raw `set labels` payload and apply it.
    pub fn set_labels_json(&self, payload: Value) -> Result<(), SessionError> {
        self.set_labels(SetLabelsRequest::from_json(payload)?)
    }

    /// Answer an assist command.
    ///
    /// Unknown commands and segmenter failures become error replies. Only
    /// store errors, such as an unknown image, are returned as `Err`.
    pub fn assist(&self, command: &Value) -> Result<AssistReply, SessionError> {
        let request = match AssistCommand::parse(command) {
            Ok(AssistCommand::Request(request)) => request,
            Ok(AssistCommand::Poll) => return Ok(AssistReply::empty()),
            Err(err) => {
                log::warn!("{}", err);
                return Ok(AssistReply::unknown_command());
            }
        };

        match self.segment(&request) {
            Ok(labels) => Ok(AssistReply::Labels {
                labels: vec![labels],
            }),
            Err(SessionError::AssistFailure(err)) => {
                log::error!("Assisted segmentation of image {} failed: {}", request.image_id, err);
                Ok(AssistReply::assist_failure(err.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    /// Run the segmenter for one request and vectorise its mask.
    pub fn segment(&self, request: &AssistRequest) -> Result<AssistLabels, SessionError> {
        let image = self.store.image(&request.image_id)?;
        let regions = match &self.segmenter {
            Some(segmenter) => {
                let pixels = self.store.read_pixels(image.id())?;
                let probabilities = segmenter
                    .predict(&pixels, &request.dextr_points)
                    .map_err(|err| err.with_segmenter(segmenter.name()))?;
                check_mask_shape(&probabilities, &pixels)?;
                mask_to_regions(&threshold_mask(&probabilities, MASK_THRESHOLD), true)
            }
            None => {
                log::debug!("No segmenter configured; returning no regions");
                Vec::new()
            }
        };

        log::info!(
            "Assisted segmentation of image {} from {} points gave {} regions",
            request.image_id,
            request.dextr_points.len(),
            regions.len()
        );
        Ok(AssistLabels {
            image_id: request.image_id.clone(),
            dextr_id: request.dextr_id.clone(),
            regions,
        })
    }
}
