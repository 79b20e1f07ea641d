//! The per-image label document.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::label::LabelObject;

/// All label state for one image.
///
/// A document is replaced wholesale by a client submission; there is no
/// patch or merge operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelDocument {
    /// Top-level labels in drawing order.
    #[serde(default)]
    pub labels: Vec<LabelObject>,

    /// Names of the annotation tasks marked complete for this image.
    #[serde(default)]
    pub completed_tasks: BTreeSet<String>,
}

impl LabelDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from labels and completed task names.
    pub fn with_labels(
        labels: Vec<LabelObject>,
        completed_tasks: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            labels,
            completed_tasks: completed_tasks.into_iter().collect(),
        }
    }

    /// Whether there are no labels and no completed tasks.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.completed_tasks.is_empty()
    }

    /// Number of label objects including nested group children.
    pub fn total_labels(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_, _| count += 1);
        count
    }

    /// Visit every label depth-first, parents before children.
    ///
    /// The callback receives the label and its nesting depth (0 for top-level).
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a LabelObject, usize)) {
        fn walk_inner<'a>(
            labels: &'a [LabelObject],
            depth: usize,
            visit: &mut impl FnMut(&'a LabelObject, usize),
        ) {
            for label in labels {
                visit(label, depth);
                walk_inner(label.children(), depth + 1, visit);
            }
        }
        walk_inner(&self.labels, 0, visit);
    }

    /// Visit every label mutably in the same order as [`LabelDocument::walk`].
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut LabelObject)) {
        fn walk_inner(labels: &mut [LabelObject], visit: &mut impl FnMut(&mut LabelObject)) {
            for label in labels {
                visit(label);
                if let Some(children) = label.children_mut() {
                    walk_inner(children, visit);
                }
            }
        }
        walk_inner(&mut self.labels, visit);
    }
}
