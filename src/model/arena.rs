//! Flat, id-keyed index over a label document.
//!
//! Groups own their children in the document tree, but every check that
//! needs to look objects up by id (uniqueness, composite resolution, nesting
//! validation) goes through this arena instead of chasing the tree. Composite
//! members are stored as ids and never followed recursively.

use std::collections::HashMap;

use crate::format::LabelError;
use crate::model::document::LabelDocument;
use crate::model::label::{LabelObject, ObjectId};

/// Deepest group nesting accepted in a document.
pub const MAX_GROUP_DEPTH: usize = 64;

/// Index of a node within a [`LabelArena`].
pub type NodeIndex = usize;

/// One label object, flattened.
#[derive(Debug, Clone)]
pub struct ArenaNode {
    pub id: ObjectId,
    pub type_name: &'static str,
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
    /// Composite member ids (weak references).
    pub members: Vec<ObjectId>,
}

/// All label objects of a document, addressable by id.
#[derive(Debug, Clone, Default)]
pub struct LabelArena {
    nodes: Vec<ArenaNode>,
    by_id: HashMap<ObjectId, NodeIndex>,
}

impl LabelArena {
    /// Build and validate the arena for a document.
    ///
    /// Fails on missing or duplicate ids, on a group containing an object
    /// with the same id as one of its ancestors, on nesting deeper than
    /// [`MAX_GROUP_DEPTH`] and on composite members that match no object.
    pub fn build(document: &LabelDocument) -> Result<Self, LabelError> {
        let mut arena = Self::default();
        let mut ancestors = Vec::new();
        for label in &document.labels {
            arena.insert(label, None, &mut ancestors)?;
        }
        arena.check_references()?;
        Ok(arena)
    }

    fn insert(
        &mut self,
        label: &LabelObject,
        parent: Option<NodeIndex>,
        ancestors: &mut Vec<ObjectId>,
    ) -> Result<NodeIndex, LabelError> {
        if !label.has_id() {
            return Err(LabelError::malformed(format!(
                "{} label has no id",
                label.shape.type_name()
            )));
        }
        if ancestors.len() >= MAX_GROUP_DEPTH {
            return Err(LabelError::malformed(format!(
                "group nesting deeper than {MAX_GROUP_DEPTH} levels at '{}'",
                label.id
            )));
        }
        if ancestors.contains(&label.id) {
            return Err(LabelError::CyclicGroup {
                id: label.id.clone(),
            });
        }
        if self.by_id.contains_key(&label.id) {
            return Err(LabelError::DuplicateId {
                id: label.id.clone(),
            });
        }

        let index = self.nodes.len();
        self.nodes.push(ArenaNode {
            id: label.id.clone(),
            type_name: label.shape.type_name(),
            parent,
            children: Vec::new(),
            members: label.components().to_vec(),
        });
        self.by_id.insert(label.id.clone(), index);

        ancestors.push(label.id.clone());
        for child in label.children() {
            let child_index = self.insert(child, Some(index), ancestors)?;
            self.nodes[index].children.push(child_index);
        }
        ancestors.pop();

        Ok(index)
    }

    fn check_references(&self) -> Result<(), LabelError> {
        for node in &self.nodes {
            let missing: Vec<ObjectId> = node
                .members
                .iter()
                .filter(|member| !self.by_id.contains_key(*member))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(LabelError::DanglingReference {
                    composite: node.id.clone(),
                    missing,
                });
            }
        }
        Ok(())
    }

    /// Number of objects in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has no objects.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by object id.
    pub fn get(&self, id: &str) -> Option<&ArenaNode> {
        self.by_id.get(id).map(|&index| &self.nodes[index])
    }

    /// Node at an index.
    pub fn node(&self, index: NodeIndex) -> &ArenaNode {
        &self.nodes[index]
    }

    /// Ids of all top-level objects.
    pub fn roots(&self) -> impl Iterator<Item = &ArenaNode> {
        self.nodes.iter().filter(|node| node.parent.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::label::{LabelShape, Point2};

    fn point(id: &str) -> LabelObject {
        LabelObject::new(
            id,
            LabelShape::Point {
                position: Point2::new(1.0, 1.0),
            },
        )
    }

    fn group(id: &str, children: Vec<LabelObject>) -> LabelObject {
        LabelObject::new(
            id,
            LabelShape::Group {
                component_models: children,
            },
        )
    }

    fn composite(id: &str, members: &[&str]) -> LabelObject {
        LabelObject::new(
            id,
            LabelShape::Composite {
                components: members.iter().map(|m| m.to_string()).collect(),
            },
        )
    }

    fn doc(labels: Vec<LabelObject>) -> LabelDocument {
        LabelDocument::with_labels(labels, Vec::new())
    }

    #[test]
    fn test_build_links_parents_and_children() {
        let arena = LabelArena::build(&doc(vec![
            group("g", vec![point("a"), point("b")]),
            composite("c", &["a", "b"]),
        ]))
        .unwrap();

        assert_eq!(arena.len(), 4);
        let g = arena.get("g").unwrap();
        assert_eq!(g.children.len(), 2);
        assert_eq!(arena.node(g.children[1]).id, "b");
        assert_eq!(arena.get("a").unwrap().parent, Some(0));
        assert_eq!(arena.roots().count(), 2);
        assert_eq!(arena.get("c").unwrap().type_name, "composite");
    }

    #[test]
    fn test_composite_may_reference_later_objects() {
        let arena = LabelArena::build(&doc(vec![composite("c", &["z"]), point("z")]));
        assert!(arena.is_ok());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = LabelArena::build(&doc(vec![point("a"), group("g", vec![point("a")])]))
            .unwrap_err();
        assert!(matches!(err, LabelError::DuplicateId { id } if id == "a"));
    }

    #[test]
    fn test_child_repeating_ancestor_id_is_cyclic() {
        let err = LabelArena::build(&doc(vec![group("g", vec![group("h", vec![point("g")])])]))
            .unwrap_err();
        assert!(matches!(err, LabelError::CyclicGroup { id } if id == "g"));
    }

    #[test]
    fn test_dangling_reference_reported() {
        let err = LabelArena::build(&doc(vec![point("a"), composite("c", &["a", "gone"])]))
            .unwrap_err();
        match err {
            LabelError::DanglingReference { composite, missing } => {
                assert_eq!(composite, "c");
                assert_eq!(missing, vec!["gone".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_id_rejected() {
        let err = LabelArena::build(&doc(vec![point("")])).unwrap_err();
        assert!(matches!(err, LabelError::Malformed { .. }));
    }

    #[test]
    fn test_excessive_nesting_rejected() {
        let mut label = point("leaf");
        for depth in 0..=MAX_GROUP_DEPTH {
            label = group(&format!("g{depth}"), vec![label]);
        }
        let err = LabelArena::build(&doc(vec![label])).unwrap_err();
        assert!(matches!(err, LabelError::Malformed { .. }));
    }
}
