//! Image resources and raster helpers.
//!
//! This module provides:
//! - `ImageResource` / `ImageTable`: the images being labelled, their
//!   dimensions, pixels and raw bytes
//! - `mask_to_regions`: vectorisation of segmentation masks into polygon rings

mod mask;
mod resource;

pub use mask::{MASK_THRESHOLD, mask_to_regions, ring_area, threshold_mask};
pub use resource::{
    FALLBACK_MIME_TYPE, ImageDescriptor, ImageResource, ImageSize, ImageTable, sniff_mime_type,
};
