#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

fn raw(kind: &str) -> ComponentRecord {
    ComponentRecord {
        id: Uuid::new_v4(),
        dashboard_id: Some(Uuid::new_v4()),
        kind: json!(kind),
        content: Some("hello".into()),
        position_x: json!(10),
        position_y: json!(20.5),
        width: json!(300),
        height: json!(180),
        style: Some(json!({ "zIndex": "4", "backgroundColor": "#FEF7CD" })),
    }
}

// =============================================================
// into_widget
// =============================================================

#[test]
fn well_formed_record_maps_every_field() {
    let rec = raw("sticky-note");
    let id = rec.id;
    let w = rec.into_widget().unwrap();
    assert_eq!(w.id, id);
    assert_eq!(w.kind, WidgetKind::StickyNote);
    assert_eq!(w.content, "hello");
    assert_eq!(w.position, Point::new(10.0, 20.5));
    assert_eq!(w.size, Size::new(300.0, 180.0));
    assert_eq!(w.z_index(), 4);
    assert_eq!(w.style.background_color(), Some("#FEF7CD"));
    assert!(w.expanded);
}

#[test]
fn unknown_kind_is_rejected() {
    let err = raw("kanban").into_widget().unwrap_err();
    assert_eq!(err, UnknownKind("kanban".into()));
}

#[test]
fn missing_or_non_string_kind_is_rejected() {
    let mut rec = raw("text");
    rec.kind = Value::Null;
    assert_eq!(rec.clone().into_widget().unwrap_err(), UnknownKind(String::new()));
    rec.kind = json!(7);
    assert!(rec.into_widget().is_err());
}

#[test]
fn non_numeric_coordinates_become_zero() {
    let mut rec = raw("text");
    rec.position_x = Value::Null;
    rec.position_y = json!("12");
    let w = rec.into_widget().unwrap();
    assert_eq!(w.position, Point::new(0.0, 0.0));
}

#[test]
fn missing_style_and_content_read_as_empty() {
    let mut rec = raw("image");
    rec.style = None;
    rec.content = None;
    let w = rec.into_widget().unwrap();
    assert!(w.style.is_empty());
    assert_eq!(w.z_index(), 0);
    assert_eq!(w.content, "");
}

#[test]
fn non_object_style_reads_as_empty() {
    let mut rec = raw("text");
    rec.style = Some(json!("red"));
    assert!(rec.into_widget().unwrap().style.is_empty());
}

// =============================================================
// coord / stored_size
// =============================================================

#[test]
fn coord_accepts_only_numbers() {
    assert_eq!(coord(&json!(3)), 3.0);
    assert_eq!(coord(&json!(-7.25)), -7.25);
    assert_eq!(coord(&json!(true)), 0.0);
    assert_eq!(coord(&json!([1])), 0.0);
    assert_eq!(coord(&Value::Null), 0.0);
}

#[test]
fn stored_size_falls_back_per_axis() {
    assert_eq!(stored_size(&Value::Null, &Value::Null), Size::new(256.0, 256.0));
    assert_eq!(stored_size(&json!(400), &json!(0)), Size::new(400.0, 256.0));
    assert_eq!(stored_size(&json!(-1), &json!(220)), Size::new(256.0, 220.0));
}

// =============================================================
// wire shapes
// =============================================================

#[test]
fn record_deserializes_with_missing_columns() {
    let id = Uuid::new_v4();
    let rec: ComponentRecord = serde_json::from_value(json!({ "id": id, "type": "document" })).unwrap();
    assert_eq!(rec.kind, "document");
    assert_eq!(rec.content, None);
    assert_eq!(rec.position_x, Value::Null);
    let w = rec.into_widget().unwrap();
    assert_eq!(w.position, Point::default());
    assert_eq!(w.size, default_size());
}

#[test]
fn batch_with_untyped_row_still_decodes() {
    let good = Uuid::new_v4();
    let text = json!([
        { "id": good, "type": "sticky-note", "position_x": 5, "position_y": 6 },
        { "id": Uuid::new_v4(), "type": null, "content": "legacy" },
        { "id": Uuid::new_v4(), "content": "older" },
    ])
    .to_string();

    let rows: Vec<ComponentRecord> = serde_json::from_str(&text).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].kind, Value::Null);

    let widgets: Vec<Widget> = rows.into_iter().filter_map(|r| r.into_widget().ok()).collect();
    assert_eq!(widgets.len(), 1);
    assert_eq!(widgets[0].id, good);
}

#[test]
fn new_component_serializes_type_tag() {
    let mut style = WidgetStyle::new();
    style.set_z_index(3);
    let dashboard = Uuid::new_v4();
    let new = NewComponent::new(
        dashboard,
        WidgetKind::TodoList,
        String::new(),
        Point::new(1.0, 2.0),
        Size::new(256.0, 256.0),
        &style,
    );
    let value = serde_json::to_value(&new).unwrap();
    assert_eq!(value["type"], "todo-list");
    assert_eq!(value["dashboard_id"], json!(dashboard));
    assert_eq!(value["position_x"], 1.0);
    assert_eq!(value["style"], json!({ "zIndex": "3" }));
}

#[test]
fn image_file_extension() {
    let file = |name: &str| ImageFile { name: name.into(), content_type: None, bytes: Vec::new() };
    assert_eq!(file("photo.JPEG").extension(), "jpeg");
    assert_eq!(file("archive.tar.gz").extension(), "gz");
    assert_eq!(file("noext").extension(), "png");
    assert_eq!(file(".bashrc").extension(), "png");
}

#[test]
fn store_error_codes() {
    assert_eq!(StoreError::NotAuthenticated.error_code(), "E_NOT_AUTHENTICATED");
    assert_eq!(StoreError::EmptyResponse.error_code(), "E_STORE_EMPTY");
    assert_eq!(StoreError::Status { status: 500, body: String::new() }.error_code(), "E_STORE_STATUS");
}
