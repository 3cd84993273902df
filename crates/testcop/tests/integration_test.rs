use std::path::Path;
use std::process::{Command, Output};

fn fixture_path() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    format!("{manifest_dir}/tests/fixtures/sample-java-project/")
}

fn testcop_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_testcop"))
}

fn check(args: &[&str]) -> Output {
    testcop_cmd()
        .arg("check")
        .args(args)
        .arg("--no-color")
        .output()
        .expect("failed to run testcop check")
}

fn check_json(args: &[&str]) -> (Option<i32>, serde_json::Value) {
    let mut all = args.to_vec();
    all.extend(["--format", "json"]);
    let output = check(&all);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed = serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("output should be valid JSON ({e}): {stdout}"));
    (output.status.code(), parsed)
}

fn rules_in(report: &serde_json::Value) -> Vec<String> {
    fn walk(value: &serde_json::Value, out: &mut Vec<String>) {
        if let Some(rule) = value.get("rule").and_then(|r| r.as_str()) {
            out.push(rule.to_string());
        }
        for key in ["complaints", "complaint"] {
            match value.get(key) {
                Some(serde_json::Value::Array(items)) => items.iter().for_each(|i| walk(i, out)),
                Some(item) => walk(item, out),
                None => {}
            }
        }
    }
    let mut out = Vec::new();
    walk(report, &mut out);
    out.sort();
    out
}

fn write_project(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

#[test]
fn test_check_sample_project_reports_complaints() {
    let output = check(&[&fixture_path()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(
        output.status.code(),
        Some(1),
        "expected exit code 1 for complaints: {stdout}"
    );
    assert!(stdout.contains("com.example.MilkTest"), "{stdout}");
    assert!(stdout.contains("com.example.OrphanTest"), "{stdout}");
    assert!(!stdout.contains("com.example.CheeseTest"), "{stdout}");
    assert!(
        stdout.contains("10 complaint(s) in 2 test class(es)"),
        "{stdout}"
    );
}

#[test]
fn test_check_json_lists_every_rule() {
    let (code, report) = check_json(&[&fixture_path()]);
    assert_eq!(code, Some(1));
    assert_eq!(report["passed"], false);
    assert_eq!(report["count"], 10);
    assert_eq!(report["complaints"].as_array().unwrap().len(), 2);
    assert_eq!(
        rules_in(&report),
        vec![
            "RuleAssertionMessage",
            "RuleEveryTestHasProductionClass",
            "RuleLineHitter",
            "RuleNotCamelCase",
            "RuleNotContainsTestWord",
            "RuleOnlyTestMethods",
            "RulePresentTense",
            "RulePresentTense",
            "RuleProhibitStaticFields",
            "RuleTestCaseContainsMockery",
        ]
    );
}

#[test]
fn test_exclude_flag_silences_rule() {
    let (_, report) = check_json(&[&fixture_path(), "--exclude", "TESTCOP.RulePresentTense"]);
    assert_eq!(report["count"], 8);
    assert!(!rules_in(&report).contains(&"RulePresentTense".to_string()));
}

#[test]
fn test_param_flag_overrides_mock_limit() {
    let (_, report) = check_json(&[&fixture_path(), "--param", "maxNumberOfMocks", "3"]);
    assert_eq!(report["count"], 9);
    assert!(!rules_in(&report).contains(&"RuleTestCaseContainsMockery".to_string()));
}

#[test]
fn test_invalid_param_value_is_an_error() {
    let output = check(&[&fixture_path(), "--param", "maxNumberOfMocks", "many"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_config_file_suppressions_and_parameters() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = dir.path().join("testcop.toml");
    std::fs::write(
        &config,
        r#"
[suppressions]
exclusions = ["RuleEveryTestHasProductionClass", "RuleProhibitStaticFields"]

[rules.parameters]
maxNumberOfMocks = 5
"#,
    )
    .unwrap();

    let (code, report) = check_json(&[&fixture_path(), "--config", config.to_str().unwrap()]);
    assert_eq!(code, Some(1));
    assert_eq!(report["count"], 7);
    assert_eq!(report["complaints"].as_array().unwrap().len(), 1);
}

#[test]
fn test_clean_project_passes() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_project(
        dir.path(),
        &[
            (
                "src/main/java/com/example/Bread.java",
                "package com.example; class Bread {}",
            ),
            (
                "src/test/java/com/example/BreadTest.java",
                r#"
package com.example;
import org.junit.jupiter.api.Test;
class BreadTest {
    @Test
    void risesInTheOven() {
        assertTrue(new Bread() != null, "bread exists");
    }
}
"#,
            ),
        ],
    );

    let output = check(&[dir.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "clean project should pass: {stdout}");
    assert!(stdout.contains("No complaints found!"), "{stdout}");
}

#[test]
fn test_broken_source_does_not_hide_other_units() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_project(
        dir.path(),
        &[
            ("src/test/java/ATest.java", "class ATest { @Test void Bad_Name() {} }"),
            ("src/test/java/BrokenTest.java", "class BrokenTest { void m( }"),
        ],
    );

    let output = check(&[dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("Test ATest"), "{stdout}");
    assert!(stdout.contains("RuleNotCamelCase"), "{stdout}");
    assert!(stdout.contains("RuleNotUsesSpecialCharacters"), "{stdout}");
    assert!(!stdout.contains("BrokenTest"), "{stdout}");
    assert!(stderr.contains("Skipped 1 test unit(s)"), "{stderr}");
    assert!(stderr.contains("BrokenTest.java"), "{stderr}");
    assert!(stderr.contains("failed to parse"), "{stderr}");
}

#[test]
fn test_broken_source_keeps_json_report() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_project(
        dir.path(),
        &[
            ("src/test/java/ATest.java", "class ATest { @Test void Bad_Name() {} }"),
            ("src/test/java/BrokenTest.java", "class BrokenTest {"),
        ],
    );

    let (code, report) = check_json(&[dir.path().to_str().unwrap()]);
    assert_eq!(code, Some(2));
    assert_eq!(report["passed"], false);
    assert!(rules_in(&report).contains(&"RuleNotCamelCase".to_string()));
}

#[test]
fn test_discovered_invalid_config_is_an_error() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_project(
        dir.path(),
        &[
            (
                ".testcop.toml",
                "[suppressions]\nexclusions = [\"RuleNotSpam\"]\n\n[rules.parameters]\nmaxNumberOfMocks = \"three\"\n",
            ),
            ("src/test/java/ATest.java", "class ATest { @Test void Bad_Name() {} }"),
        ],
    );

    let output = check(&[dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty(), "no report for an invalid config");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(".testcop.toml"), "{stderr}");
    assert!(stderr.contains("maxNumberOfMocks"), "{stderr}");
}

#[test]
fn test_bytecode_backend_without_classes_passes() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let output = check(&[dir.path().to_str().unwrap(), "--backend", "bytecode"]);
    assert!(output.status.success());
}

#[test]
fn test_unknown_backend_is_rejected() {
    let output = check(&[&fixture_path(), "--backend", "bitcode"]);
    assert!(!output.status.success());
}

#[test]
fn test_check_nonexistent_path() {
    let output = check(&["/nonexistent/path/that/does/not/exist"]);
    assert_eq!(output.status.code(), Some(2), "should exit 2 for error");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("does not exist"),
        "should show helpful error message: {stderr}"
    );
}

#[test]
fn test_init_creates_config() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let output = testcop_cmd()
        .args(["init"])
        .current_dir(dir.path())
        .output()
        .expect("failed to run testcop init");

    assert!(output.status.success(), "init should succeed");

    let content = std::fs::read_to_string(dir.path().join(".testcop.toml")).unwrap();
    assert!(content.contains("[project]"), "should contain [project] section");
    assert!(content.contains("maxNumberOfMocks"), "should contain rule parameters");
}

#[test]
fn test_init_refuses_overwrite() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(dir.path().join(".testcop.toml"), "existing").unwrap();

    let output = testcop_cmd()
        .args(["init"])
        .current_dir(dir.path())
        .output()
        .expect("failed to run testcop init");

    assert!(!output.status.success(), "init should fail when file exists");
}
