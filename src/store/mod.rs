//! Persistent per-image label storage.
//!
//! Each image has one label file, `<stem>__labels.json`, either next to the
//! image or in a dedicated labels directory. Reads never touch the disk
//! beyond loading the file. Writes replace the whole document through a
//! temporary file and a rename, so a failed write leaves the previous file
//! intact. A mutex per image serialises loads and saves of that image's file.

mod error;
mod migrate;

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use image::RgbImage;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::data::{ImageDescriptor, ImageResource, ImageTable};
use crate::format::{LABEL_FILE_SUFFIX, decode_document, decode_labels, encode_document};
use crate::model::LabelDocument;
use crate::reconcile::assign_missing_ids;

pub use error::StoreError;
pub use migrate::{MigrationReport, migrate_object_ids};

/// Options for opening a [`LabelStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Directory for label files. `None` keeps them next to the images.
    pub labels_dir: Option<PathBuf>,

    /// Refuse all writes.
    pub readonly: bool,

    /// Prefix for ids the server assigns to new objects.
    pub id_prefix: String,
}

impl StoreOptions {
    /// Create writable options with the given id prefix.
    pub fn new(id_prefix: impl Into<String>) -> Self {
        Self {
            labels_dir: None,
            readonly: false,
            id_prefix: id_prefix.into(),
        }
    }

    /// Keep label files in a separate directory.
    pub fn labels_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.labels_dir = Some(dir.into());
        self
    }

    /// Set read-only mode.
    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }
}

/// Label file path for an image.
pub fn label_path_for(image_path: &Path, labels_dir: Option<&Path>) -> PathBuf {
    let dir = labels_dir
        .or_else(|| image_path.parent())
        .unwrap_or_else(|| Path::new(""));
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!("{stem}{LABEL_FILE_SUFFIX}"))
}

/// The images being labelled and their label documents on disk.
#[derive(Debug)]
pub struct LabelStore {
    images: ImageTable,
    locks: Vec<Mutex<()>>,
    readonly: bool,
    id_prefix: String,
}

impl LabelStore {
    /// Open a store for a list of image files.
    ///
    /// Images get ids `"0"`, `"1"`, ... in sorted path order. Fails if an
    /// image cannot be read or two images would share a label file.
    pub fn for_files(
        image_paths: impl IntoIterator<Item = PathBuf>,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let mut image_paths: Vec<PathBuf> = image_paths.into_iter().collect();
        image_paths.sort();

        let mut label_paths = HashSet::new();
        let mut images = Vec::with_capacity(image_paths.len());

        for (index, path) in image_paths.into_iter().enumerate() {
            let label_path = label_path_for(&path, options.labels_dir.as_deref());
            if !label_paths.insert(label_path.clone()) {
                return Err(StoreError::LabelPathCollision { path: label_path });
            }
            let image = ImageResource::open(index.to_string(), &path, label_path)
                .map_err(|source| StoreError::ImageOpen {
                    path: path.clone(),
                    source,
                })?;
            images.push(image);
        }

        log::info!(
            "Opened label store with {} images ({})",
            images.len(),
            if options.readonly {
                "read-only"
            } else {
                "read-write"
            }
        );

        let locks = images.iter().map(|_| Mutex::new(())).collect();
        Ok(Self {
            images: ImageTable::new(images),
            locks,
            readonly: options.readonly,
            id_prefix: options.id_prefix,
        })
    }

    pub fn images(&self) -> &ImageTable {
        &self.images
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Prefix given to ids the server assigns.
    pub fn id_prefix(&self) -> &str {
        &self.id_prefix
    }

    /// Look up an image by id.
    pub fn image(&self, image_id: &str) -> Result<&ImageResource, StoreError> {
        self.images
            .get(image_id)
            .ok_or_else(|| StoreError::UnknownImage {
                id: image_id.to_string(),
            })
    }

    /// Descriptors for every image, in id order.
    pub fn image_descriptors(&self) -> Vec<ImageDescriptor> {
        self.images.iter().map(ImageResource::descriptor).collect()
    }

    /// Load the label document for an image, or an empty one if none is saved.
    pub fn get_label_data_for_tool(&self, image_id: &str) -> Result<LabelDocument, StoreError> {
        let image = self.image(image_id)?;
        let _guard = self.lock(image_id)?;
        Ok(load_document(image)?.unwrap_or_default())
    }

    /// Replace an image's label document with labels submitted by the client.
    ///
    /// Objects without ids are given ids under the store's prefix. Nothing
    /// is written unless the whole submission decodes and validates.
    /// Returns the document as stored.
    pub fn set_label_data_from_tool(
        &self,
        image_id: &str,
        labels: &Value,
        completed_tasks: impl IntoIterator<Item = String>,
    ) -> Result<LabelDocument, StoreError> {
        let image = self.image(image_id)?;
        if self.readonly {
            return Err(StoreError::ReadOnly {
                id: image_id.to_string(),
            });
        }

        let mut document = LabelDocument::with_labels(decode_labels(labels)?, completed_tasks);
        if assign_missing_ids(&mut document, &self.id_prefix)? {
            log::debug!("Assigned server ids to new objects on image {}", image_id);
        }
        let bytes = encode_document(&document)?;

        let _guard = self.lock(image_id)?;
        write_atomically(image.label_path(), &bytes)?;
        log::info!(
            "Saved {} labels for image {} to {:?}",
            document.total_labels(),
            image_id,
            image.label_path()
        );
        Ok(document)
    }

    /// Decode an image's pixels as RGB.
    pub fn read_pixels(&self, image_id: &str) -> Result<RgbImage, StoreError> {
        let image = self.image(image_id)?;
        image.read_pixels().map_err(|source| StoreError::ImageOpen {
            path: image.path().to_path_buf(),
            source,
        })
    }

    /// Raw image bytes and MIME type.
    pub fn data_and_mime_type(&self, image_id: &str) -> Result<(Vec<u8>, &'static str), StoreError> {
        Ok(self.image(image_id)?.data_and_mime_type()?)
    }

    /// Hold the per-image lock for the duration of the guard.
    pub(crate) fn lock(&self, image_id: &str) -> Result<MutexGuard<'_, ()>, StoreError> {
        let index = self
            .images
            .index_of(image_id)
            .ok_or_else(|| StoreError::UnknownImage {
                id: image_id.to_string(),
            })?;
        // A panic while holding the lock cannot leave a torn file behind,
        // since writes go through a rename.
        Ok(self.locks[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner))
    }
}

/// Read and decode an image's label file, if it exists.
pub(crate) fn load_document(image: &ImageResource) -> Result<Option<LabelDocument>, StoreError> {
    let path = image.label_path();
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    decode_document(&bytes)
        .map(Some)
        .map_err(|source| StoreError::CorruptLabelFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Write bytes to `path` via a temporary file in the same directory.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
