//! Tests for decoding label files and client label payloads.

use serde_json::json;

use crate::format::{LabelError, decode_document, decode_label, decode_labels, encode_document};
use crate::model::{LabelDocument, LabelObject, LabelShape, Point2};

#[test]
fn test_decode_every_variant() {
    let labels = decode_labels(&json!([
        {"id": "s:1", "label_class": "car", "label_type": "point",
         "position": {"x": 5.0, "y": 6.0}},
        {"id": "s:2", "label_class": null, "label_type": "box",
         "centre": {"x": 20.0, "y": 30.0}, "size": {"x": 8.0, "y": 4.0}, "rotation": 0.25},
        {"id": "s:3", "label_type": "oriented_ellipse",
         "centre": {"x": 1.0, "y": 2.0}, "radius1": 3.0, "radius2": 1.5,
         "orientation_radians": 0.5},
        {"id": "s:4", "label_type": "polygon",
         "regions": [[{"x": 0.0, "y": 0.0}, {"x": 1.0, "y": 0.0}, {"x": 1.0, "y": 1.0}]]},
        {"id": "s:5", "label_type": "composite", "components": ["s:1", "s:2"]},
        {"id": "s:6", "label_type": "group", "component_models": [
            {"id": "s:7", "label_type": "point", "position": {"x": 0.0, "y": 0.0}}
        ]}
    ]))
    .unwrap();

    let names: Vec<&str> = labels.iter().map(|l| l.shape.type_name()).collect();
    assert_eq!(
        names,
        vec!["point", "box", "oriented_ellipse", "polygon", "composite", "group"]
    );
    assert_eq!(labels[0].label_class.as_deref(), Some("car"));
    assert_eq!(labels[4].components(), ["s:1".to_string(), "s:2".to_string()]);
    assert_eq!(labels[5].children().len(), 1);
    assert!(matches!(
        labels[1].shape,
        LabelShape::Box { rotation, .. } if (rotation - 0.25).abs() < f64::EPSILON
    ));
}

#[test]
fn test_composite_members_are_not_resolved_on_decode() {
    let label = decode_label(&json!({
        "id": "c", "label_type": "composite", "components": ["nowhere"]
    }))
    .unwrap();
    assert_eq!(label.components(), ["nowhere".to_string()]);
}

#[test]
fn test_missing_required_field_is_malformed() {
    let err = decode_label(&json!({"id": "p", "label_type": "point"})).unwrap_err();
    assert!(matches!(err, LabelError::Malformed { .. }));
}

#[test]
fn test_missing_label_type_is_malformed() {
    let err = decode_label(&json!({"id": "p", "position": {"x": 0.0, "y": 0.0}})).unwrap_err();
    assert!(matches!(err, LabelError::Malformed { .. }));
}

#[test]
fn test_unrecognized_tag_is_malformed() {
    let err = decode_label(&json!({"id": "p", "label_type": "bezier"})).unwrap_err();
    assert!(matches!(err, LabelError::Malformed { .. }));
}

#[test]
fn test_error_names_failing_label_index() {
    let err = decode_labels(&json!([
        {"id": "ok", "label_type": "point", "position": {"x": 0.0, "y": 0.0}},
        {"id": "bad", "label_type": "box"}
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("label 1"), "{err}");
}

#[test]
fn test_labels_must_be_an_array() {
    let err = decode_labels(&json!({"labels": []})).unwrap_err();
    assert!(matches!(err, LabelError::Malformed { .. }));
}

#[test]
fn test_decode_document_with_tasks() {
    let bytes = br#"{
        "labels": [{"id": "a", "label_type": "point", "position": {"x": 1, "y": 2}}],
        "completed_tasks": ["finished", "reviewed"]
    }"#;
    let doc = decode_document(bytes).unwrap();

    assert_eq!(doc.labels.len(), 1);
    assert_eq!(
        doc.labels[0].shape,
        LabelShape::Point {
            position: Point2::new(1.0, 2.0)
        }
    );
    assert!(doc.completed_tasks.contains("finished"));
    assert!(doc.completed_tasks.contains("reviewed"));
}

#[test]
fn test_decode_legacy_bare_array() {
    let bytes = br#"[{"object_id": 3, "label_type": "point", "position": {"x": 0, "y": 0}}]"#;
    let doc = decode_document(bytes).unwrap();

    assert_eq!(doc.labels.len(), 1);
    assert_eq!(doc.labels[0].id, "3");
    assert!(doc.completed_tasks.is_empty());
}

#[test]
fn test_decode_document_missing_sections() {
    let doc = decode_document(br#"{"completed_tasks": null}"#).unwrap();
    assert!(doc.is_empty());
}

#[test]
fn test_decode_truncated_file_is_malformed() {
    let err = decode_document(br#"{"labels": [{"id": "a""#).unwrap_err();
    assert!(matches!(err, LabelError::Malformed { .. }));
}

#[test]
fn test_decode_scalar_document_is_malformed() {
    let err = decode_document(b"42").unwrap_err();
    assert!(err.to_string().contains("a number"), "{err}");
}

#[test]
fn test_encoded_document_uses_file_field_names() {
    let doc = LabelDocument::with_labels(
        vec![
            LabelObject::new(
                "x:1",
                LabelShape::Point {
                    position: Point2::new(2.0, 3.0),
                },
            )
            .with_class("tree"),
        ],
        vec!["done".to_string()],
    );
    let value: serde_json::Value = serde_json::from_slice(&encode_document(&doc).unwrap()).unwrap();

    assert_eq!(value["completed_tasks"], json!(["done"]));
    let label = &value["labels"][0];
    assert_eq!(label["id"], "x:1");
    assert_eq!(label["label_type"], "point");
    assert_eq!(label["label_class"], "tree");
    assert_eq!(label["position"], json!({"x": 2.0, "y": 3.0}));
    assert!(label.get("source").is_none());
}
