//! CLI integration tests
//!
//! These run the built binary with a cleared environment, so only the variables each
//! test sets are visible to it.

mod support;

use serde_json::Value;
use std::process::{Command, Output};

fn imageprobe(args: &[&str], env: &[(&str, &str)]) -> Output {
    Command::new(support::imageprobe_bin())
        .env_clear()
        .envs(env.iter().copied())
        .args(args)
        .output()
        .expect("Failed to execute imageprobe")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "imageprobe failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn templates(matrix: &Value) -> Vec<String> {
    matrix
        .as_array()
        .expect("matrix is an array")
        .iter()
        .map(|case| case["template"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_cli_help() {
    let output = imageprobe(&["--help"], &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("imageprobe"));
    assert!(stdout.contains("matrix"));
    assert!(stdout.contains("image-matrix"));
    assert!(stdout.contains("probe"));
}

#[test]
fn test_cli_version() {
    let output = imageprobe(&["--version"], &[]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("imageprobe"));
}

#[test]
fn test_matrix_json_for_single_sdk() {
    let output = imageprobe(
        &["matrix", "--format", "json"],
        &[("SDKS_TO_TEST", "go"), ("GCP_PROJECT_NAME", "proj-1")],
    );
    let matrix = stdout_json(&output);

    assert_eq!(templates(&matrix), vec!["go", "gcp-go", "azure-go", "aws-go"]);
    assert_eq!(matrix[1]["config"]["gcp:project"], "proj-1");
    assert_eq!(matrix[2]["config"]["azure-native:location"], "EastUS");
}

#[test]
fn test_matrix_honours_exclusions() {
    let output = imageprobe(
        &["matrix", "--format", "json"],
        &[
            ("SDKS_TO_TEST", "java,python"),
            ("MATRIX_EXCLUSIONS", "java:aws"),
        ],
    );
    let names = templates(&stdout_json(&output));

    assert!(!names.contains(&"aws-java".to_string()));
    assert!(names.contains(&"aws-python".to_string()));
    assert_eq!(names.len(), 7);
}

#[test]
fn test_matrix_drops_csharp_on_dotnet_six() {
    let output = imageprobe(
        &["matrix", "--format", "json"],
        &[("LANGUAGE_VERSION", "6.0")],
    );
    let names = templates(&stdout_json(&output));

    assert!(!names.is_empty());
    assert!(names.iter().all(|name| !name.ends_with("csharp")));
}

#[test]
fn test_image_matrix_with_arch() {
    let matrix = stdout_json(&imageprobe(&["image-matrix"], &[]));
    let include = matrix["include"].as_array().unwrap();

    assert_eq!(include.len(), 20);
    assert!(include.iter().all(|entry| entry["arch"].is_string()));
}

#[test]
fn test_image_matrix_without_arch() {
    let matrix = stdout_json(&imageprobe(&["image-matrix", "--no-arch"], &[]));
    let include = matrix["include"].as_array().unwrap();

    assert_eq!(include.len(), 10);
    assert!(include.iter().all(|entry| entry.get("arch").is_none()));
}

#[test]
fn test_image_matrix_sync() {
    let matrix = stdout_json(&imageprobe(&["image-matrix", "--sync"], &[]));
    let images = matrix["image"].as_array().unwrap();

    assert_eq!(images.len(), 13);
    assert_eq!(images[0], "pulumi-base");
}

#[test]
fn test_variant_json() {
    let output = imageprobe(&["variant", "pulumi-ubi-python", "-f", "json"], &[]);
    let summary = stdout_json(&output);

    assert_eq!(summary["variant"], "pulumi-ubi-python");
    assert_eq!(summary["base"], "ubi");
    assert_eq!(summary["kitchen_sink"], false);
    assert_eq!(summary["runtimes"], serde_json::json!(["python"]));
    assert_eq!(summary["home"], "/root");
}

#[test]
fn test_variant_from_environment() {
    let output = imageprobe(
        &["variant", "-f", "json"],
        &[("IMAGE_VARIANT", "pulumi-nonroot")],
    );
    let summary = stdout_json(&output);

    assert_eq!(summary["kitchen_sink"], true);
    assert_eq!(summary["non_root"], true);
    assert_eq!(summary["user"], "pulumi");
}

#[test]
fn test_unknown_variant_fails() {
    let output = imageprobe(&["variant", "pulumi-alpine-rust"], &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_variant_missing_everywhere_fails() {
    let output = imageprobe(&["variant"], &[]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_invalid_flag_value_fails_config() {
    let output = imageprobe(&["config"], &[("RUN_CONTAINER_TESTS", "maybe")]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_config_redacts_secrets() {
    let output = imageprobe(
        &["config"],
        &[
            ("PULUMI_ACCESS_TOKEN", "pul-very-secret"),
            ("PULUMI_ORG", "acme"),
            ("IMAGE_VARIANT", "pulumi-debian-go"),
        ],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("pul-very-secret"));
    assert!(stdout.contains("PULUMI_ACCESS_TOKEN: <set>"));
    assert!(stdout.contains("PULUMI_ORG: acme"));
    assert!(stdout.contains("Image Variant: pulumi-debian-go"));
}

#[test]
fn test_conflicting_image_matrix_flags() {
    let output = imageprobe(&["image-matrix", "--no-arch", "--sync"], &[]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot be used with"));
}
