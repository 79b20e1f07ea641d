//! Image resources served to the labelling client.
//!
//! The image table is built once at startup and never changes afterwards,
//! so it is shared between connections without locking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use serde::Serialize;

/// MIME type used when the image format cannot be recognised.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// One image available for labelling.
#[derive(Debug, Clone)]
pub struct ImageResource {
    id: String,
    path: PathBuf,
    label_path: PathBuf,
    size: ImageSize,
}

impl ImageResource {
    /// Open an image, reading its dimensions from the file header.
    pub fn open(
        id: impl Into<String>,
        path: impl Into<PathBuf>,
        label_path: impl Into<PathBuf>,
    ) -> Result<Self, image::ImageError> {
        let path = path.into();
        let (width, height) = image::image_dimensions(&path)?;
        Ok(Self {
            id: id.into(),
            path,
            label_path: label_path.into(),
            size: ImageSize { width, height },
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the JSON file holding this image's labels.
    pub fn label_path(&self) -> &Path {
        &self.label_path
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Decode the image as 8-bit RGB.
    pub fn read_pixels(&self) -> Result<RgbImage, image::ImageError> {
        let pixels = image::open(&self.path)?.to_rgb8();
        log::trace!(
            "Decoded {:?} as {}x{} RGB",
            self.path,
            pixels.width(),
            pixels.height()
        );
        Ok(pixels)
    }

    /// Raw file bytes and their MIME type.
    pub fn data_and_mime_type(&self) -> std::io::Result<(Vec<u8>, &'static str)> {
        let data = std::fs::read(&self.path)?;
        let mime_type = sniff_mime_type(&data, &self.path);
        Ok((data, mime_type))
    }

    /// Descriptor handed to the client's image selector.
    pub fn descriptor(&self) -> ImageDescriptor {
        ImageDescriptor {
            image_id: self.id.clone(),
            url: format!("/image/{}", self.id),
            width: self.size.width,
            height: self.size.height,
        }
    }
}

/// Guess a MIME type from magic bytes, falling back to the file extension.
pub fn sniff_mime_type(data: &[u8], path: &Path) -> &'static str {
    image::guess_format(data)
        .or_else(|_| ImageFormat::from_path(path))
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME_TYPE)
}

/// Summary of an image for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDescriptor {
    pub image_id: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Immutable table of images keyed by id.
#[derive(Debug, Default)]
pub struct ImageTable {
    images: Vec<ImageResource>,
    by_id: HashMap<String, usize>,
}

impl ImageTable {
    /// Build the table. Ids must be unique.
    pub fn new(images: Vec<ImageResource>) -> Self {
        let by_id = images
            .iter()
            .enumerate()
            .map(|(index, image)| (image.id.clone(), index))
            .collect();
        Self { images, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&ImageResource> {
        self.by_id.get(id).map(|&index| &self.images[index])
    }

    /// Position of an image in the table.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageResource> {
        self.images.iter()
    }
}
