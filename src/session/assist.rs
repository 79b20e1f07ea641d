//! Assisted segmentation capability.
//!
//! A segmenter turns a few boundary points clicked by the user into a
//! per-pixel foreground probability map. The model behind it lives outside
//! this crate; the server only depends on the [`Segmenter`] trait.

use image::RgbImage;
use ndarray::Array2;

use crate::model::Point2;

/// Error raised by a segmenter, or for a mask it returned.
#[derive(Debug, Clone)]
pub struct AssistError {
    /// Human-readable error message.
    pub message: String,
    /// Name of the segmenter that failed (if known).
    pub segmenter: Option<&'static str>,
}

impl AssistError {
    /// Create a new assist error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            segmenter: None,
        }
    }

    /// Attach the name of the segmenter that failed.
    pub fn with_segmenter(mut self, segmenter: &'static str) -> Self {
        self.segmenter = Some(segmenter);
        self
    }
}

impl std::fmt::Display for AssistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(segmenter) = self.segmenter {
            write!(f, "[{}] {}", segmenter, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for AssistError {}

impl From<String> for AssistError {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AssistError {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Point-to-mask segmentation model.
///
/// `predict` receives the image pixels and the clicked points in pixel
/// coordinates, and returns a `height x width` map of foreground
/// probabilities in `[0, 1]`. It may be slow; callers run it without
/// holding any label lock.
pub trait Segmenter: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str {
        "segmenter"
    }

    fn predict(&self, pixels: &RgbImage, points: &[Point2]) -> Result<Array2<f32>, AssistError>;
}

impl<F> Segmenter for F
where
    F: Fn(&RgbImage, &[Point2]) -> Result<Array2<f32>, AssistError> + Send + Sync,
{
    fn predict(&self, pixels: &RgbImage, points: &[Point2]) -> Result<Array2<f32>, AssistError> {
        self(pixels, points)
    }
}

/// Check that a predicted mask matches the image it was computed for.
pub(crate) fn check_mask_shape(
    mask: &Array2<f32>,
    pixels: &RgbImage,
) -> Result<(), AssistError> {
    let expected = (pixels.height() as usize, pixels.width() as usize);
    if mask.dim() != expected {
        return Err(AssistError::new(format!(
            "mask shape {:?} does not match image shape {:?}",
            mask.dim(),
            expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_segmenter() {
        let segmenter = |pixels: &RgbImage, _points: &[Point2]| {
            Ok::<_, AssistError>(Array2::<f32>::zeros((
                pixels.height() as usize,
                pixels.width() as usize,
            )))
        };
        let pixels = RgbImage::new(5, 3);
        let mask = segmenter.predict(&pixels, &[]).unwrap();

        assert_eq!(mask.dim(), (3, 5));
        assert_eq!(Segmenter::name(&segmenter), "segmenter");
    }

    #[test]
    fn test_mask_shape_check() {
        let pixels = RgbImage::new(4, 2);
        assert!(check_mask_shape(&Array2::zeros((2, 4)), &pixels).is_ok());

        let err = check_mask_shape(&Array2::zeros((4, 2)), &pixels).unwrap_err();
        assert!(err.message.contains("does not match"));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(AssistError::new("boom").to_string(), "boom");
        assert_eq!(
            AssistError::from("boom").with_segmenter("dextr").to_string(),
            "[dextr] boom"
        );
    }
}
