use photomark::watermark::{
    Anchor, Position, TemplateError, TemplateStore, WatermarkKind, WatermarkSpec,
};

#[test]
fn test_templates_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let spec = WatermarkSpec::text("© Studio")
        .with_position(Anchor::TopRight)
        .with_opacity(80)
        .with_tiling(30);

    let stored = TemplateStore::open(dir.path())
        .unwrap()
        .save("studio", &spec, "default studio mark")
        .unwrap();
    assert_eq!(stored, "studio");

    let reopened = TemplateStore::open(dir.path()).unwrap();
    let template = reopened.load("studio.json").unwrap();
    assert_eq!(template.watermark, spec);
    assert_eq!(template.description, "default studio mark");
}

#[test]
fn test_template_file_is_plain_json() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::open(dir.path()).unwrap();
    store
        .save("logo", &WatermarkSpec::image("/srv/logo.png"), "")
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("logo.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["name"], "logo");
    assert_eq!(value["watermark"]["type"], "image");
    assert_eq!(value["watermark"]["source_path"], "/srv/logo.png");
    assert!(value["created_at"].is_string());
}

#[test]
fn test_hand_written_template_loads_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("minimal.json"),
        r#"{
            "name": "minimal",
            "created_at": "2024-01-01T00:00:00Z",
            "watermark": { "type": "text", "text": "hi" }
        }"#,
    )
    .unwrap();

    let template = TemplateStore::open(dir.path()).unwrap().load("minimal").unwrap();
    let spec = template.watermark;
    assert_eq!(spec.position, Position::Anchor(Anchor::BottomRight));
    assert_eq!(spec.opacity, 50);
    match spec.kind {
        WatermarkKind::Text(text) => assert_eq!(text.font_size, 24),
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn test_missing_template() {
    let dir = tempfile::tempdir().unwrap();
    let err = TemplateStore::open(dir.path())
        .unwrap()
        .load("nope")
        .unwrap_err();
    assert!(matches!(err, TemplateError::NotFound(_)));
}
