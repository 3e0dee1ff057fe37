use oaspatch_core::{
    apply, load, run, save, Document, PatchError, PatchOperation, PatchOptions, PatchPlan,
    RunRequest, SaveOptions, Tag, TagPolicy,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

const FIXTURE: &str = include_str!("fixtures/spec.json");

fn fixture() -> Document {
    Document::from_json_str(FIXTURE, "fixtures/spec.json").unwrap()
}

fn fixture_on_disk(dir: &Path) -> PathBuf {
    let path = dir.join("spec.json");
    fs::write(&path, FIXTURE).unwrap();
    path
}

fn set(path: &str, value: Value) -> PatchOperation {
    PatchOperation::SetScalarField {
        path: path.into(),
        value,
    }
}

fn tag_names(doc: &Document) -> Vec<String> {
    doc.get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(|t| t["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_version_bump_changes_only_version() {
    let original = fixture();
    let applied = apply(
        &original,
        &[set("info.version", json!("1.5.0"))],
        &PatchOptions::default(),
    )
    .unwrap();

    let mut expected = original.clone().into_value();
    expected["info"]["version"] = json!("1.5.0");
    assert_eq!(applied.document.into_value(), expected);
}

#[test]
fn test_set_scalar_field_is_idempotent() {
    let ops = [set("info.title", json!("Mining Development Kit API"))];
    let once = apply(&fixture(), &ops, &PatchOptions::default())
        .unwrap()
        .document;
    let twice = apply(&once, &ops, &PatchOptions::default())
        .unwrap()
        .document;
    assert_eq!(once, twice);
}

#[test]
fn test_paths_and_components_are_preserved() {
    let original = fixture();
    let ops = vec![
        set("info.version", json!("1.7.2")),
        set("info.title", json!("Mining Development Kit API")),
        PatchOperation::UpsertTags {
            tags: vec![
                Tag::new("Fans", "The fans endpoint group."),
                Tag::new("Hardware", "Physical components."),
            ],
            replace: false,
            policy: None,
        },
        PatchOperation::RewriteServerUrl {
            matcher: "1.4.1".into(),
            value: "https://virtserver.swaggerhub.com/mining_development_kit_api/1.7.2".into(),
            regex: false,
            all: None,
            description: None,
        },
        PatchOperation::ConvertVersionMarker {
            from: None,
            to: "3.0.3".into(),
        },
    ];
    let patched = apply(&original, &ops, &PatchOptions::default())
        .unwrap()
        .document;

    assert_eq!(patched.get("paths"), original.get("paths"));
    assert_eq!(patched.get("components"), original.get("components"));
    assert_eq!(patched.get("info.contact"), original.get("info.contact"));
}

#[test]
fn test_default_upsert_is_append_only() {
    let original = fixture();
    let before = tag_names(&original);
    let patched = apply(
        &original,
        &[PatchOperation::UpsertTags {
            tags: vec![Tag::new("Telemetry", "Live values."), Tag::new("Mining", "m")],
            replace: false,
            policy: None,
        }],
        &PatchOptions::default(),
    )
    .unwrap()
    .document;

    let after = tag_names(&patched);
    assert!(after.len() >= before.len());
    assert!(before.iter().all(|name| after.contains(name)));
    assert_eq!(after, vec!["Mining", "Hardware", "Telemetry"]);
}

#[test]
fn test_tags_created_when_absent() {
    let doc = Document::from_value(json!({ "openapi": "3.0.3", "paths": {} }), "inline").unwrap();
    let patched = apply(
        &doc,
        &[PatchOperation::UpsertTags {
            tags: vec![Tag::new("Fans", "...")],
            replace: false,
            policy: None,
        }],
        &PatchOptions::default(),
    )
    .unwrap()
    .document;

    assert_eq!(
        patched.get("tags"),
        Some(&json!([{ "name": "Fans", "description": "..." }]))
    );
}

#[test]
fn test_replace_on_match_keeps_length() {
    let original = fixture();
    let options = PatchOptions {
        tag_policy: TagPolicy::Replace,
        ..PatchOptions::default()
    };
    let patched = apply(
        &original,
        &[PatchOperation::UpsertTags {
            tags: vec![Tag::new("Hardware", "new text")],
            replace: false,
            policy: None,
        }],
        &options,
    )
    .unwrap()
    .document;

    assert_eq!(tag_names(&patched).len(), tag_names(&original).len());
    assert_eq!(patched.get("tags.1.description"), Some(&json!("new text")));
}

#[test]
fn test_empty_patch_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixture_on_disk(dir.path());
    let output = dir.path().join("copy.json");

    let doc = load(&input).unwrap();
    let applied = apply(&doc, &[], &PatchOptions::default()).unwrap();
    save(&applied.document, &output, &SaveOptions::default()).unwrap();

    assert_eq!(load(&output).unwrap(), load(&input).unwrap());
    assert_eq!(fs::read_to_string(&output).unwrap(), FIXTURE);
}

#[test]
fn test_failed_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixture_on_disk(dir.path());
    let output = dir.path().join("out.json");

    let request = RunRequest {
        input: input.clone(),
        output: output.clone(),
        plan: PatchPlan {
            operations: vec![
                set("info.version", json!("1.5.0")),
                set("nonexistent.nested.field", json!("x")),
            ],
            ..PatchPlan::default()
        },
        dry_run: false,
    };

    let mut completed = 0;
    let err = run(&request, |_| completed += 1).unwrap_err();

    assert!(matches!(err, PatchError::Path { ref segment, .. } if segment == "nonexistent"));
    assert_eq!(completed, 1);
    assert!(!output.exists());
    assert_eq!(fs::read_to_string(&input).unwrap(), FIXTURE);
}

#[test]
fn test_in_place_run_with_backup() {
    let dir = tempfile::tempdir().unwrap();
    let spec = fixture_on_disk(dir.path());

    let plan = PatchPlan::from_yaml_str(
        r#"
backup:
  enabled: true
  label: pre-v1.7.2
operations:
  - op: set_scalar_field
    path: info.version
    value: "1.7.2"
  - op: add_operation_tag
    route: /api/v1/hardware
    method: get
    tag: Fans
"#,
        "plan.yaml",
    )
    .unwrap();

    let report = run(
        &RunRequest {
            input: spec.clone(),
            output: spec.clone(),
            plan,
            dry_run: false,
        },
        |_| {},
    )
    .unwrap();

    assert_eq!(report.outcomes.len(), 2);
    let backup = dir.path().join("spec.json.backup.pre-v1.7.2");
    assert_eq!(fs::read_to_string(&backup).unwrap(), FIXTURE);

    let saved = load(&spec).unwrap();
    assert_eq!(saved.get("info.version"), Some(&json!("1.7.2")));
    assert_eq!(
        saved.get("paths./api/v1/hardware.get.tags"),
        Some(&json!(["Hardware", "Fans"]))
    );
}

#[test]
fn test_dry_run_leaves_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let spec = fixture_on_disk(dir.path());

    let report = run(
        &RunRequest {
            input: spec.clone(),
            output: spec.clone(),
            plan: PatchPlan {
                operations: vec![set("info.version", json!("2.0.0"))],
                ..PatchPlan::default()
            },
            dry_run: true,
        },
        |_| {},
    )
    .unwrap();

    assert!(report.saved.is_none());
    assert_eq!(fs::read_to_string(&spec).unwrap(), FIXTURE);
}
