//! Object id reconciliation.
//!
//! Every label object in a document must carry a unique id. Ids minted on
//! the server take the form `<prefix>:<local>`, where the prefix is unique
//! per session or per migrated file, so label files authored independently
//! can be merged without collisions.
//!
//! Two passes share the same machinery:
//!
//! - [`ensure_ids_have_prefix`] rewrites every id that has no prefix at all.
//!   It is the batch migration pass for legacy corpora.
//! - [`assign_missing_ids`] only fills in missing ids and breaks collisions,
//!   keeping ids the client minted itself. It runs on every submission.
//!
//! Both rewrite composite member references to follow renamed objects, then
//! validate the result through [`LabelArena`].

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::format::LabelError;
use crate::model::{ID_PREFIX_SEPARATOR, LabelArena, LabelDocument, LabelShape, ObjectId};

/// Which ids a reconciliation pass rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RewritePolicy {
    /// Rewrite ids that are not of the form `<prefix>:<local>`.
    RequirePrefix,
    /// Rewrite only missing ids.
    MissingOnly,
}

/// Generate a fresh id prefix.
pub fn new_id_prefix() -> String {
    Uuid::new_v4().to_string()
}

/// Whether an id is already namespaced by `prefix`.
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with(ID_PREFIX_SEPARATOR))
}

/// Whether an id already has the `<prefix>:<local>` form, whatever the prefix.
pub fn is_namespaced(id: &str) -> bool {
    id.split_once(ID_PREFIX_SEPARATOR)
        .is_some_and(|(prefix, local)| !prefix.is_empty() && !local.is_empty())
}

/// Join a prefix and a local id.
pub fn prefixed_id(prefix: &str, local: &str) -> ObjectId {
    format!("{prefix}{ID_PREFIX_SEPARATOR}{local}")
}

/// Make every object id in the document carry a prefix.
///
/// Objects without an id, and objects whose id repeats one seen earlier in
/// document order, get `<prefix>:<uuid>`. Bare legacy ids become
/// `<prefix>:<old id>`. Ids that already carry some prefix are kept, so
/// running it again with any prefix changes nothing. Composite members
/// follow the rename.
///
/// Returns whether anything changed. On `DanglingReference` the rewrite has still been
/// applied; the caller decides whether to keep it.
pub fn ensure_ids_have_prefix(
    document: &mut LabelDocument,
    prefix: &str,
) -> Result<bool, LabelError> {
    reconcile(document, prefix, RewritePolicy::RequirePrefix)
}

/// Give an id to every object that lacks one and break id collisions.
///
/// Existing unique ids are kept whatever their prefix.
pub fn assign_missing_ids(document: &mut LabelDocument, prefix: &str) -> Result<bool, LabelError> {
    reconcile(document, prefix, RewritePolicy::MissingOnly)
}

fn reconcile(
    document: &mut LabelDocument,
    prefix: &str,
    policy: RewritePolicy,
) -> Result<bool, LabelError> {
    let mut modified = false;
    let mut seen: HashSet<ObjectId> = HashSet::new();
    // Old id -> new id, for the first object that carried each old id.
    let mut remap: HashMap<ObjectId, ObjectId> = HashMap::new();

    document.walk_mut(&mut |label| {
        let old = std::mem::take(&mut label.id);

        let mut new = if old.is_empty() {
            prefixed_id(prefix, &Uuid::new_v4().to_string())
        } else if policy == RewritePolicy::RequirePrefix && !is_namespaced(&old) {
            prefixed_id(prefix, &old)
        } else {
            old.clone()
        };
        if seen.contains(&new) {
            new = prefixed_id(prefix, &Uuid::new_v4().to_string());
        }

        if new != old {
            log::trace!("Rewriting object id '{}' -> '{}'", old, new);
            modified = true;
        }
        if !old.is_empty() {
            remap.entry(old).or_insert_with(|| new.clone());
        }
        seen.insert(new.clone());
        label.id = new;
    });

    document.walk_mut(&mut |label| {
        if let LabelShape::Composite { components } = &mut label.shape {
            for member in components.iter_mut() {
                if let Some(new) = remap.get(member.as_str()) {
                    if *new != *member {
                        *member = new.clone();
                        modified = true;
                    }
                }
            }
        }
    });

    LabelArena::build(document)?;
    Ok(modified)
}
