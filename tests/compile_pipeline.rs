//! End-to-end compilation tests
//!
//! Each test builds a theme tree in a temp directory and runs the full
//! pipeline against it.

mod fixtures;

use std::fs;

use fixtures::ThemeFixture;
use serde_json::json;
use themecfg::loader::LoadError;
use themecfg::output::pretty_ascii_bytes;
use themecfg::{CompileError, CompileOptions, Compiler, OrderingError, StoreError, ThemeLayout};

fn compile(fixture: &ThemeFixture) -> Result<themecfg::CompileReport, CompileError> {
    Compiler::new(fixture.layout().clone()).run()
}

fn two_groups() -> ThemeFixture {
    ThemeFixture::new()
        .with_main(json!({"a": 1}))
        .with_fragment(
            "all.json",
            json!([{"group": "x", "k": 1}, {"group": "y", "k": 2}]),
        )
}

#[test]
fn test_order_moves_group_before_other() {
    let theme = two_groups().with_order(&["y", "x"]);

    let report = compile(&theme).unwrap();

    let expected = json!({
        "a": 1,
        "customConfig": [{"group": "y", "k": 2}, {"group": "x", "k": 1}]
    });
    assert_eq!(theme.read_output(), expected);

    // Exact bytes: 4-space indent, key order kept, trailing newline
    let mut expected_bytes = pretty_ascii_bytes(&expected).unwrap();
    expected_bytes.push(b'\n');
    assert_eq!(fs::read(theme.layout().output_file()).unwrap(), expected_bytes);

    assert_eq!(theme.read_order(), vec!["y", "x"]);
    assert_eq!(theme.group_files(), vec!["x.json", "y.json"]);
    assert_eq!(theme.read_group("y"), json!([{"group": "y", "k": 2}]));

    let ordering = report.ordering.unwrap();
    assert_eq!(ordering.sorted_groups, vec!["y", "x"]);
    assert!(ordering.missing_groups.is_empty());

    let rewrite = report.rewrite.unwrap();
    assert!(rewrite.removed_groups.is_empty());
    assert!(rewrite.new_groups.is_empty());
    assert_eq!(report.output_sha256.unwrap().len(), 64);
}

#[test]
fn test_missing_group_is_reported_not_fatal() {
    let theme = two_groups().with_order(&["x", "z"]);

    let report = compile(&theme).unwrap();

    assert_eq!(
        theme.read_output()["customConfig"],
        json!([{"group": "x", "k": 1}, {"group": "y", "k": 2}])
    );
    let ordering = report.ordering.unwrap();
    assert_eq!(ordering.missing_groups, vec!["z"]);
    assert_eq!(ordering.sorted_groups, vec!["x"]);

    // The manifest now reflects the data, and z is reported as removed
    assert_eq!(theme.read_order(), vec!["x", "y"]);
    let rewrite = report.rewrite.unwrap();
    assert_eq!(rewrite.removed_groups, vec!["z"]);
    assert_eq!(rewrite.new_groups, vec!["y"]);
}

#[test]
fn test_without_order_file() {
    let theme = two_groups();

    let report = compile(&theme).unwrap();

    assert!(report.ordering.is_none());
    assert_eq!(theme.read_order(), vec!["x", "y"]);
    assert_eq!(report.rewrite.unwrap().new_groups, vec!["x", "y"]);
    assert_eq!(
        theme.read_output()["customConfig"],
        json!([{"group": "x", "k": 1}, {"group": "y", "k": 2}])
    );
}

#[test]
fn test_empty_order_is_noop() {
    let theme = two_groups().with_order(&[]);

    let report = compile(&theme).unwrap();

    assert!(report.ordering.is_none());
    assert_eq!(
        theme.read_output()["customConfig"],
        json!([{"group": "x", "k": 1}, {"group": "y", "k": 2}])
    );
}

#[test]
fn test_single_name_order_fails_before_writing() {
    let theme = two_groups().with_order(&["x"]);
    let before = theme.snapshot();

    let err = compile(&theme).unwrap_err();

    assert!(matches!(
        err,
        CompileError::Load(LoadError::Ordering {
            source: OrderingError::InvalidSpec(1),
            ..
        })
    ));
    assert_eq!(theme.snapshot(), before);
    assert!(!theme.layout().output_file().exists());
}

#[test]
fn test_record_without_group_fails_before_writing() {
    let theme = ThemeFixture::new()
        .with_main(json!({"a": 1}))
        .with_fragment("a.json", json!([{"group": "a"}]))
        .with_fragment("b.json", json!([{"title": "no group"}]))
        .with_order(&["b", "a"]);
    let before = theme.snapshot();

    let err = compile(&theme).unwrap_err();

    assert!(matches!(
        err,
        CompileError::Load(LoadError::Ordering {
            source: OrderingError::MalformedRecord { .. },
            ..
        })
    ));
    assert!(err.to_string().contains("\"title\": \"no group\""));
    assert_eq!(theme.snapshot(), before);
}

#[test]
fn test_unusable_group_name_fails_before_writing() {
    let theme = ThemeFixture::new()
        .with_main(json!({}))
        .with_fragment("a.json", json!([{"group": "../escape"}]));
    let before = theme.snapshot();

    let err = compile(&theme).unwrap_err();

    assert!(matches!(
        err,
        CompileError::Store(StoreError::InvalidGroupName { .. })
    ));
    assert_eq!(theme.snapshot(), before);
}

#[test]
fn test_case_only_group_names_fail_before_writing() {
    let theme = ThemeFixture::new()
        .with_main(json!({}))
        .with_fragment("a.json", json!([{"group": "Header"}]))
        .with_fragment("b.json", json!([{"group": "header"}]));
    let before = theme.snapshot();

    let err = compile(&theme).unwrap_err();

    assert!(matches!(
        err,
        CompileError::Store(StoreError::GroupNameCollision { .. })
    ));
    assert_eq!(theme.snapshot(), before);
}

#[test]
fn test_missing_main_config() {
    let theme = ThemeFixture::new().with_fragment("a.json", json!([{"group": "a"}]));

    let err = compile(&theme).unwrap_err();
    assert!(matches!(err, CompileError::Load(LoadError::MissingMainConfig(_))));
}

#[test]
fn test_main_config_not_object() {
    let theme = ThemeFixture::new().with_main(json!([1]));

    let err = compile(&theme).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Load(LoadError::NotAnObject { found: "array", .. })
    ));
}

#[test]
fn test_fragment_not_array() {
    let theme = ThemeFixture::new()
        .with_main(json!({}))
        .with_raw_fragment("a.json", r#"{"group": "a"}"#);

    let err = compile(&theme).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Load(LoadError::NotAnArray { found: "object", .. })
    ));
}

#[test]
fn test_no_fragments_at_all() {
    let theme = ThemeFixture::new().with_main(json!({"name": "theme"}));

    let report = compile(&theme).unwrap();

    assert_eq!(report.record_count, 0);
    assert_eq!(theme.read_output(), json!({"name": "theme", "customConfig": []}));
    assert!(theme.read_order().is_empty());
    assert!(theme.group_files().is_empty());
}

#[test]
fn test_fragments_concatenated_in_file_name_order() {
    let theme = ThemeFixture::new()
        .with_main(json!({}))
        .with_fragment("20-footer.json", json!([{"group": "footer"}]))
        .with_fragment("10-header.json", json!([{"group": "header"}, {"group": "nav"}]));

    compile(&theme).unwrap();

    assert_eq!(theme.read_order(), vec!["header", "nav", "footer"]);
    assert_eq!(
        theme.group_files(),
        vec!["footer.json", "header.json", "nav.json"]
    );
}

#[test]
fn test_main_key_order_preserved() {
    let theme = ThemeFixture::new().with_raw_fragment("a.json", "[]");
    fs::write(
        theme.layout().main_config_file(),
        r#"{"zeta": 1, "alpha": {"y": 2, "b": 3}}"#,
    )
    .unwrap();

    compile(&theme).unwrap();

    let text = fs::read_to_string(theme.layout().output_file()).unwrap();
    let zeta = text.find("\"zeta\"").unwrap();
    let alpha = text.find("\"alpha\"").unwrap();
    let custom = text.find("\"customConfig\"").unwrap();
    assert!(zeta < alpha && alpha < custom);
    assert!(text.find("\"y\"").unwrap() < text.find("\"b\"").unwrap());
}

#[test]
fn test_non_ascii_escaped_in_output_only() {
    let theme = ThemeFixture::new()
        .with_main(json!({"title": "Café"}))
        .with_fragment("a.json", json!([{"group": "menü", "label": "Ünïcode"}]));

    compile(&theme).unwrap();

    let output = fs::read_to_string(theme.layout().output_file()).unwrap();
    assert!(output.is_ascii());
    assert!(output.contains("Caf\\u00e9"));
    assert!(output.ends_with("}\n"));

    let group_file = fs::read_to_string(theme.layout().groups_dir().join("menü.json")).unwrap();
    assert!(group_file.contains("Ünïcode"));
}

#[test]
fn test_second_run_is_stable() {
    let theme = two_groups().with_order(&["y", "x"]);

    let first = compile(&theme).unwrap();
    let after_first = theme.snapshot();
    let second = compile(&theme).unwrap();

    assert_eq!(theme.snapshot(), after_first);
    assert_eq!(first.output_sha256, second.output_sha256);
}

#[test]
fn test_dry_run_writes_nothing() {
    let theme = two_groups().with_order(&["y", "x"]);
    let before = theme.snapshot();

    let report = Compiler::new(theme.layout().clone())
        .with_options(CompileOptions {
            dry_run: true,
            ..Default::default()
        })
        .run()
        .unwrap();

    assert!(report.dry_run);
    assert!(report.rewrite.is_none());
    assert!(report.output_path.is_none());
    assert_eq!(report.ordering.unwrap().sorted_groups, vec!["y", "x"]);
    assert_eq!(theme.snapshot(), before);
}

#[test]
fn test_discover_from_nested_directory() {
    let theme = two_groups();
    let nested = theme.root().join("tools/bin");
    fs::create_dir_all(&nested).unwrap();

    let layout = ThemeLayout::discover(&nested).unwrap();
    assert_eq!(layout.root(), fs::canonicalize(theme.root()).unwrap());

    Compiler::new(layout).run().unwrap();
    assert!(theme.layout().output_file().is_file());
}

#[test]
fn test_report_serializes() {
    let theme = two_groups().with_order(&["y", "x"]);
    let report = compile(&theme).unwrap();

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["record_count"], 2);
    assert_eq!(value["ordering"]["sorted_groups"], json!(["y", "x"]));
    assert!(value["ordering"].get("records").is_none());
    assert_eq!(value["rewrite"]["groups"], json!(["y", "x"]));
    assert_eq!(value["dry_run"], false);
}

#[test]
fn test_large_integers_kept_exactly() {
    let theme = ThemeFixture::new()
        .with_raw_fragment(
            "a.json",
            r#"[{"group": "a", "id": 123456789012345678901234567890}]"#,
        );
    fs::write(
        theme.layout().main_config_file(),
        r#"{"big": 98765432109876543210, "ratio": 0.1000000000000000055511151231257827}"#,
    )
    .unwrap();

    compile(&theme).unwrap();

    let output = fs::read_to_string(theme.layout().output_file()).unwrap();
    assert!(output.contains("\"big\": 98765432109876543210"), "{output}");
    assert!(output.contains("\"ratio\": 0.1000000000000000055511151231257827"), "{output}");
    assert!(output.contains("\"id\": 123456789012345678901234567890"), "{output}");

    let group_file = fs::read_to_string(theme.layout().groups_dir().join("a.json")).unwrap();
    assert!(group_file.contains("\"id\": 123456789012345678901234567890"), "{group_file}");
}
