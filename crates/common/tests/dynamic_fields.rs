//! Dynamic fields engine behavior tests
//!
//! Exercises the engine end to end through its public API: extraction,
//! global fan-out, idempotent writes, expression preservation, and the
//! import/export document.

use std::collections::BTreeSet;

use casebook_common::{
    common_fields, extract_fields, DynamicFields, EditMode, Entity, FakerRegistry,
};
use serde_json::json;

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn scenario_entities() -> Vec<Entity> {
    vec![
        Entity::new("T1", json!("Hello <name>, your code is <code>")).with_name("Greeting"),
        Entity::new("T2", json!("<name> only")).with_name("Name only"),
    ]
}

fn engine() -> DynamicFields {
    DynamicFields::new(FakerRegistry::seeded(11))
}

#[test]
fn extraction_finds_every_convention_and_filters_reserved_names() {
    let payload = json!({
        "steps": ["<a>", "${b}", "{{c}}"],
        "script": "<varX> ${$y} {{myfunction}}"
    });
    assert_eq!(extract_fields(&payload), set(&["a", "b", "c"]));
}

#[test]
fn common_fields_is_the_intersection() {
    let payloads = vec![json!("<a> <b>"), json!("<b> <c>")];
    assert_eq!(common_fields(&payloads), set(&["b"]));
}

#[test]
fn global_write_skips_entities_without_the_field() {
    let entities = vec![
        Entity::new("E1", json!({"x": "<x>"})),
        Entity::new("E2", json!({"y": "static"})),
    ];
    let mut engine = engine();

    assert!(engine.set_value(&entities, "*", "x", "v", None).unwrap());
    assert_eq!(engine.get_value("E1", "x"), "v");
    assert!(engine.store().get("E2").is_none());
}

#[test]
fn identical_writes_do_not_bump_the_version() {
    let entities = scenario_entities();
    let mut engine = engine();
    engine.set_mode(EditMode::Individual);

    engine
        .set_value(&entities, "T1", "code", "42", Some("faker.number.int()"))
        .unwrap();
    let version = engine.version();

    let changed = engine
        .set_value(&entities, "T1", "code", "42", Some("faker.number.int()"))
        .unwrap();
    assert!(!changed);
    assert_eq!(engine.version(), version);
}

#[test]
fn export_clear_import_round_trip() {
    let entities = scenario_entities();
    let mut engine = engine();
    engine.set_value(&entities, "*", "name", "Alice", None).unwrap();
    engine.set_mode(EditMode::Individual);
    engine
        .apply_input(&entities, "T1", "code", "faker.string.numeric(4)")
        .unwrap();

    let before = engine.export();
    let text = engine.export_json().unwrap();

    engine.clear();
    assert!(engine.store().is_empty());

    engine.import_text(&text, &entities).unwrap();
    let after = engine.export();

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.id, a.id);
        assert_eq!(b.input, a.input);
        assert_eq!(b.order, a.order);
    }
    assert_eq!(after[0].input["code"], "faker.string.numeric(4)");
}

#[test]
fn exported_document_keeps_the_expression() {
    let entities = scenario_entities();
    let mut engine = engine();
    engine.set_mode(EditMode::Individual);

    engine
        .set_value(
            &entities,
            "T1",
            "name",
            "Evaluated Value",
            Some("faker.person.fullName()"),
        )
        .unwrap();

    assert_eq!(engine.get_value("T1", "name"), "Evaluated Value");
    let doc: serde_json::Value = serde_json::from_str(&engine.export_json().unwrap()).unwrap();
    assert_eq!(doc[0]["input"]["name"], "faker.person.fullName()");
}

#[test]
fn stale_references_are_dropped_without_error() {
    let entities = scenario_entities();
    let mut engine = engine();

    let outcome = engine
        .import_text(r#"[{"id": "ghost", "input": {"x": "1"}}]"#, &entities)
        .unwrap();
    assert_eq!(outcome.dropped_stale, 1);
    assert_eq!(engine.store().len(), 0);
}

#[test]
fn malformed_import_leaves_state_unchanged() {
    let entities = scenario_entities();
    let mut engine = engine();
    engine.set_value(&entities, "*", "name", "Alice", None).unwrap();
    let snapshot = engine.snapshot();

    let err = engine.import_text("{not valid json", &entities).unwrap_err();
    assert!(err.is_parse());
    assert_eq!(engine.snapshot(), snapshot);

    let err = engine.import_text(r#"{"id": "T1"}"#, &entities).unwrap_err();
    assert!(err.to_string().contains("must be an array"));
    assert_eq!(engine.snapshot(), snapshot);
}

#[test]
fn greeting_scenario() {
    let entities = scenario_entities();
    let mut engine = engine();

    assert_eq!(engine.common_fields(&entities), set(&["name"]));

    engine.set_value(&entities, "*", "name", "Alice", None).unwrap();
    assert_eq!(engine.get_value("T1", "name"), "Alice");
    assert_eq!(engine.get_value("T2", "name"), "Alice");

    engine.toggle_mode();
    engine.set_value(&entities, "T1", "code", "42", None).unwrap();
    assert_eq!(engine.get_value("T2", "code"), "");

    let doc = serde_json::to_value(engine.export()).unwrap();
    assert_eq!(
        doc,
        json!([
            {
                "id": "T1",
                "input": {"name": "Alice", "code": "42"},
                "order": 0,
                "entityName": "Greeting",
                "creatorName": ""
            },
            {
                "id": "T2",
                "input": {"name": "Alice"},
                "order": 1,
                "entityName": "Name only",
                "creatorName": ""
            }
        ])
    );
}

#[test]
fn import_reorders_entities_and_keeps_unreferenced_ones_in_place() {
    let entities = vec![
        Entity::new("A", json!("<f>")),
        Entity::new("B", json!("<f>")),
        Entity::new("C", json!("<f>")),
        Entity::new("D", json!("<f>")),
    ];
    let mut engine = engine();

    let outcome = engine
        .import_text(
            r#"[
                {"id": "D", "input": {"f": "4"}, "order": 0},
                {"id": "B", "input": {"f": "2"}, "order": 1}
            ]"#,
            &entities,
        )
        .unwrap();

    let ids: Vec<_> = outcome.reordered.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["D", "B", "A", "C"]);
    assert_eq!(engine.mode(), EditMode::Individual);
}
