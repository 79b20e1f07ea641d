//! Label object types and their shape data.
//!
//! The JSON representation of these types is the on-disk label format, so
//! field names here are part of the file format. See `format` for the
//! document-level encoding.

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a label object, optionally of the form `<prefix>:<local>`.
pub type ObjectId = String;

/// Separator between an id prefix and the local part of an object id.
pub const ID_PREFIX_SEPARATOR: char = ':';

/// A 2D point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One closed ring of a polygon, in drawing order.
pub type Ring = Vec<Point2>;

/// Polygon geometry made of one or more rings.
///
/// Multiple rings describe disjoint parts or holes (even-odd fill).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPolygon")]
pub struct PolygonShape {
    pub regions: Vec<Ring>,
}

impl PolygonShape {
    pub fn new(regions: Vec<Ring>) -> Self {
        Self { regions }
    }

    /// Total number of vertices across all rings.
    pub fn vertex_count(&self) -> usize {
        self.regions.iter().map(Vec::len).sum()
    }
}

/// Accepts both the multi-region form and the older single-ring `vertices` form.
#[derive(Deserialize)]
struct RawPolygon {
    #[serde(default)]
    regions: Option<Vec<Ring>>,
    #[serde(default)]
    vertices: Option<Ring>,
}

impl TryFrom<RawPolygon> for PolygonShape {
    type Error = String;

    fn try_from(raw: RawPolygon) -> Result<Self, Self::Error> {
        match (raw.regions, raw.vertices) {
            (Some(regions), _) => Ok(Self { regions }),
            (None, Some(vertices)) => Ok(Self {
                regions: vec![vertices],
            }),
            (None, None) => Err("polygon label requires `regions`".to_string()),
        }
    }
}

/// Shape data for a label object, tagged by `label_type` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "label_type", rename_all = "snake_case")]
pub enum LabelShape {
    /// Single point marker.
    Point { position: Point2 },
    /// Box given by its centre and full extent, rotated about the centre.
    Box {
        centre: Point2,
        size: Point2,
        #[serde(default)]
        rotation: f64,
    },
    /// Ellipse with two radii and an orientation.
    OrientedEllipse {
        centre: Point2,
        radius1: f64,
        radius2: f64,
        orientation_radians: f64,
    },
    /// Polygon with any number of rings.
    Polygon(PolygonShape),
    /// Logical label made of other labels, referenced by id and not owned.
    Composite { components: Vec<ObjectId> },
    /// Label that owns child labels.
    Group { component_models: Vec<LabelObject> },
}

impl LabelShape {
    /// The `label_type` tag used in JSON.
    pub fn type_name(&self) -> &'static str {
        match self {
            LabelShape::Point { .. } => "point",
            LabelShape::Box { .. } => "box",
            LabelShape::OrientedEllipse { .. } => "oriented_ellipse",
            LabelShape::Polygon(_) => "polygon",
            LabelShape::Composite { .. } => "composite",
            LabelShape::Group { .. } => "group",
        }
    }
}

/// An annotated object on an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelObject {
    /// Object id. Empty means the object has not been assigned one yet.
    #[serde(alias = "object_id", default, deserialize_with = "lenient_id")]
    pub id: ObjectId,

    /// Label class this object belongs to.
    #[serde(default)]
    pub label_class: Option<String>,

    /// Where the label came from (tool name, model, import).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Annotation control values attached by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anno_data: Option<serde_json::Value>,

    #[serde(flatten)]
    pub shape: LabelShape,
}

impl LabelObject {
    /// Create a label with the given id and shape and no class.
    pub fn new(id: impl Into<ObjectId>, shape: LabelShape) -> Self {
        Self {
            id: id.into(),
            label_class: None,
            source: None,
            anno_data: None,
            shape,
        }
    }

    /// Set the label class.
    pub fn with_class(mut self, label_class: impl Into<String>) -> Self {
        self.label_class = Some(label_class.into());
        self
    }

    /// Whether the object still needs an id.
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Children owned by this object (empty unless it is a group).
    pub fn children(&self) -> &[LabelObject] {
        match &self.shape {
            LabelShape::Group { component_models } => component_models,
            _ => &[],
        }
    }

    /// Mutable access to owned children.
    pub fn children_mut(&mut self) -> Option<&mut Vec<LabelObject>> {
        match &mut self.shape {
            LabelShape::Group { component_models } => Some(component_models),
            _ => None,
        }
    }

    /// Ids referenced by this object if it is a composite.
    pub fn components(&self) -> &[ObjectId] {
        match &self.shape {
            LabelShape::Composite { components } => components,
            _ => &[],
        }
    }
}

/// Older label files stored ids as integers, and new client objects send `null`.
fn lenient_id<'de, D>(deserializer: D) -> Result<ObjectId, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "object id must be a string or number, found {other}"
        ))),
    }
}
