//! Form engine integration tests
//!
//! Exercises the read path (render) and write path (compile, validate,
//! reconcile, merge) against real member records:
//! - Merge idempotence and null preservation
//! - Prefill and fail-soft rendering
//! - Fuzzy yes/no parsing and dotted-key regrouping
//! - Closed choices and NID patterns
//! - A complete render then submit round for one step

use onboard::kennelish::{compile, merge, normalize, reconcile, render};
use onboard::member::{EthicsForm, MemberRecord};
use serde_json::{json, Map, Value};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

fn member() -> MemberRecord {
    let mut record = MemberRecord::new("90210");
    record.first_name = "Ada".into();
    record.major = "Computer Science".into();
    record
}

// =============================================================================
// Merge
// =============================================================================

#[test]
fn test_merge_is_idempotent() {
    let record = member();
    let patch = reconcile(object(json!({
        "surname": "Lovelace",
        "is_returning": "Yes",
        "ethics_form.pirate": "No",
        "ethics_form.signtime": "1700000000",
    })));

    let once = merge(&record, &patch).unwrap();
    let twice = merge(&once, &patch).unwrap();

    assert_eq!(once, twice);
    assert_eq!(once.surname, "Lovelace");
    assert!(once.is_returning);
    assert_eq!(once.ethics_form.as_ref().map(|f| f.signtime), Some(1700000000));
}

#[test]
fn test_merge_preserves_omitted_and_null_fields() {
    let mut record = member();
    record.ethics_form = Some(EthicsForm {
        cloud_aup: true,
        signtime: 42,
        ..Default::default()
    });

    let patch = reconcile(object(json!({
        "first_name": null,
        "github": "ada-l",
        "ethics_form.signtime": null,
        "ethics_form.pirate": "Yes",
    })));
    let merged = merge(&record, &patch).unwrap();

    assert_eq!(merged.first_name, "Ada");
    assert_eq!(merged.major, "Computer Science");
    assert_eq!(merged.github, "ada-l");

    let ethics = merged.ethics_form.unwrap();
    assert!(ethics.cloud_aup);
    assert!(ethics.pirate);
    assert_eq!(ethics.signtime, 42);
}

#[test]
fn test_merge_creates_ethics_form_on_first_submit() {
    let record = member();
    assert!(record.ethics_form.is_none());

    let patch = reconcile(object(json!({"ethics_form.hack_ucf": "yes"})));
    let merged = merge(&record, &patch).unwrap();

    let ethics = merged.ethics_form.unwrap();
    assert!(ethics.hack_ucf);
    assert!(!ethics.hack_others);
    assert_eq!(ethics.signtime, 0);
}

#[test]
fn test_merge_skips_unknown_relation() {
    let record = member();
    let patch = reconcile(object(json!({"mentee.name": "Grace", "github": "ada-l"})));
    let merged = merge(&record, &patch).unwrap();

    assert_eq!(merged.github, "ada-l");
    assert_eq!(merged.first_name, record.first_name);
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_text_prefill() {
    let schema = [json!({"input": "text", "key": "first_name", "label": "First Name"})];

    let html = render(&schema, &member().to_form_value().unwrap());
    assert!(html.contains(r#"value="Ada""#));

    let html = render(&schema, &json!({"first_name": null}));
    assert!(html.contains(r#"value="""#));
    assert!(html.contains(r#"name="first_name""#));
}

#[test]
fn test_bad_node_does_not_break_siblings() {
    let schema = [
        json!({"input": "bogus"}),
        json!({"input": "text", "key": "first_name", "label": "Name"}),
    ];
    let html = render(&schema, &json!({}));

    assert!(html.contains("Invalid Input: bogus"));
    assert!(html.contains(r#"name="first_name""#));
    assert!(html.find("Invalid Input").unwrap() < html.find("first_name").unwrap());
}

#[test]
fn test_nested_prefill_from_discord() {
    let schema = [json!({"input": "text", "key": "discord.username", "label": "Discord"})];
    let html = render(&schema, &json!({"discord": {"username": "ada#0001"}}));
    assert!(html.contains(r#"value="ada#0001""#));
}

// =============================================================================
// Fuzzy parsing and reconciliation
// =============================================================================

#[test]
fn test_fuzzy_normalization() {
    assert_eq!(normalize(&json!("Yes")), json!(true));
    assert_eq!(normalize(&json!("no")), json!(false));
    assert_eq!(normalize(&json!("I promise not to break rules")), json!(true));
    assert_eq!(normalize(&json!("banana")), json!("banana"));
}

#[test]
fn test_dotted_reconciliation() {
    let nested = reconcile(object(json!({
        "ethics_form.signtime": 123,
        "ethics_form.pirate": "Yes",
    })));
    assert_eq!(
        Value::Object(nested),
        json!({"ethics_form": {"signtime": 123, "pirate": "Yes"}})
    );

    let flat = reconcile(object(json!({"first_name": "Ada"})));
    assert_eq!(Value::Object(flat), json!({"first_name": "Ada"}));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_closed_choice() {
    let spec = compile(&[json!({"input": "radio", "key": "attending", "options": ["Yes", "No"]})]);

    assert!(spec.validate(&object(json!({"attending": "Yes"}))).is_ok());
    assert!(spec.validate(&object(json!({"attending": "No"}))).is_ok());
    assert!(spec.validate(&object(json!({"attending": "Maybe"}))).is_err());
}

#[test]
fn test_nid_pattern() {
    let spec = compile(&[json!({"input": "nid", "key": "nid"})]);

    assert!(spec.validate(&object(json!({"nid": "ab123456"}))).is_ok());
    for bad in ["AB123456", "ab12345", "ab1234567"] {
        assert!(
            spec.validate(&object(json!({"nid": bad}))).is_err(),
            "{} should be rejected",
            bad
        );
    }
}

// =============================================================================
// End to end
// =============================================================================

fn step_two() -> Vec<Value> {
    vec![
        json!({
            "input": "h1",
            "label": "Attendance",
            "elements": [
                {"input": "radio", "key": "attending", "label": "Attending?", "options": ["Yes", "No"]}
            ]
        }),
        json!({"input": "navigation", "next": "/join/3"}),
    ]
}

#[test]
fn test_render_then_submit_keeps_literal_choice() {
    let schema = step_two();

    let html = render(&schema, &json!({"attending": null}));
    assert!(!html.contains("checked"));
    assert!(html.contains("/join/3"));
    assert!(!html.contains("Back"));

    let validated = compile(&schema)
        .validate(&object(json!({"attending": "Yes"})))
        .unwrap();
    let patch = reconcile(validated);
    assert_eq!(Value::Object(patch.clone()), json!({"attending": "Yes"}));

    // attending is a text field, so the chosen literal is stored as is
    let merged = merge(&member(), &patch).unwrap();
    assert_eq!(merged.attending, "Yes");

    let html = render(&schema, &merged.to_form_value().unwrap());
    assert!(html.contains(r#"value="Yes" checked"#));
}

#[test]
fn test_yes_no_lands_as_boolean_on_flag_fields() {
    let schema = [json!({
        "input": "radio",
        "key": "ethics_form.pirate",
        "options": ["Yes", "No"]
    })];

    let validated = compile(&schema)
        .validate(&object(json!({"ethics_form.pirate": "Yes"})))
        .unwrap();
    let merged = merge(&member(), &reconcile(validated)).unwrap();
    assert_eq!(merged.ethics_form.map(|f| f.pirate), Some(true));

    // and renders back as the Yes option
    let mut record = member();
    record.ethics_form = Some(EthicsForm {
        pirate: true,
        ..Default::default()
    });
    let html = render(&schema, &record.to_form_value().unwrap());
    assert!(html.contains(r#"value="Yes" checked"#));
}

#[test]
fn test_shipped_forms_parse() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("forms");
    let record = member().to_form_value().unwrap();

    for step in 2..=6 {
        let raw = std::fs::read_to_string(dir.join(format!("{}.json", step))).unwrap();
        let schema: Vec<Value> = serde_json::from_str(&raw).unwrap();

        let html = render(&schema, &record);
        assert!(!html.contains("Invalid Input"), "step {} has a bad node", step);
        assert!(!compile(&schema).is_empty(), "step {} declares no fields", step);
    }
}
