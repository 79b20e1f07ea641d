//! Batch migration of legacy label files to prefixed object ids.

use std::path::PathBuf;

use crate::format::encode_document;
use crate::reconcile::{ensure_ids_have_prefix, new_id_prefix};
use crate::store::{LabelStore, StoreError, load_document, write_atomically};

/// Outcome of [`migrate_object_ids`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Files rewritten with new ids.
    pub updated: usize,
    /// Files whose ids were already prefixed.
    pub unchanged: usize,
    /// Files left alone because they could not be migrated.
    pub skipped: Vec<PathBuf>,
}

/// Rewrite every saved label file so all object ids carry a prefix.
///
/// Each file gets its own fresh prefix for its bare legacy ids. Ids that
/// already carry a prefix are kept, so a second run finds nothing to do.
/// Files that fail to decode, or whose composites refer to objects that do
/// not exist, are skipped and left untouched on disk. Images without a label file are ignored.
pub fn migrate_object_ids(store: &LabelStore) -> Result<MigrationReport, StoreError> {
    if store.is_readonly() {
        return Err(StoreError::ReadOnly {
            id: "*".to_string(),
        });
    }

    let mut report = MigrationReport::default();
    for image in store.images().iter() {
        let _guard = store.lock(image.id())?;
        let path = image.label_path();

        let mut document = match load_document(image) {
            Ok(Some(document)) => document,
            Ok(None) => continue,
            Err(StoreError::CorruptLabelFile { source, .. }) => {
                log::warn!("Skipping {:?}: {}", path, source);
                report.skipped.push(path.to_path_buf());
                continue;
            }
            Err(err) => return Err(err),
        };

        let prefix = new_id_prefix();
        match ensure_ids_have_prefix(&mut document, &prefix) {
            Ok(true) => {
                write_atomically(path, &encode_document(&document)?)?;
                log::info!("Migrated object ids in {:?} (prefix {})", path, prefix);
                report.updated += 1;
            }
            Ok(false) => report.unchanged += 1,
            Err(err) => {
                log::warn!("Skipping {:?}: {}", path, err);
                report.skipped.push(path.to_path_buf());
            }
        }
    }

    log::info!(
        "Object id migration: {} updated, {} unchanged, {} skipped",
        report.updated,
        report.unchanged,
        report.skipped.len()
    );
    Ok(report)
}
