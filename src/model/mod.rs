//! Label data model: objects, shapes, documents and the id index.

mod arena;
mod document;
mod label;

pub use arena::{ArenaNode, LabelArena, MAX_GROUP_DEPTH, NodeIndex};
pub use document::LabelDocument;
pub use label::{
    ID_PREFIX_SEPARATOR, LabelObject, LabelShape, ObjectId, Point2, PolygonShape, Ring,
};
