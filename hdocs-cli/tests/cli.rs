//! Tests of the `hdocs` binary: exit codes, discovery and a mocked end-to-end run

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Nothing listens on the discard port, so any request fails fast
const UNREACHABLE: &str = "http://127.0.0.1:9/v1";

fn hdocs() -> Command {
    let mut cmd = Command::cargo_bin("hdocs").unwrap();
    cmd.env_remove("OPENAI_API_KEY")
        .env_remove("HDOCS_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn source(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn missing_api_key_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let file = source(&dir, "add.c", "int add(int a, int b);\n");

    hdocs()
        .arg(&file)
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn missing_api_key_wins_over_parse_errors() {
    let dir = TempDir::new().unwrap();
    let file = source(&dir, "bad.c", "int broken( {\n");

    hdocs().arg(&file).assert().code(2);
}

#[test]
fn custom_key_variable_from_config_file() {
    let dir = TempDir::new().unwrap();
    let file = source(&dir, "add.c", "int add(int a, int b);\n");
    let config = source(&dir, "hdocs.toml", "[api]\napi_key_env = \"MY_DOCS_KEY\"\n");

    hdocs()
        .env("OPENAI_API_KEY", "sk-ignored")
        .arg("--config")
        .arg(&config)
        .arg(&file)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("MY_DOCS_KEY"));
}

#[test]
fn discover_lists_declarations_without_credentials() {
    let dir = TempDir::new().unwrap();
    let file = source(
        &dir,
        "stack.h",
        "#define STACK_MAX 8\n\n/** Push a value. */\nint stack_push(int v);\n",
    );

    hdocs()
        .arg("--discover")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("STACK_MAX\tmacro\t"))
        .stdout(predicate::str::contains("stack_push\tfunction\t"))
        .stdout(predicate::str::contains("\tundocumented\n"))
        .stdout(predicate::str::contains("\tdocumented\n"));
}

#[test]
fn syntax_error_exits_with_parse_code_before_network() {
    let dir = TempDir::new().unwrap();
    let file = source(&dir, "bad.c", "int ok(void);\nvoid broken( {\n");

    hdocs()
        .env("OPENAI_API_KEY", "sk-test")
        .args(["--endpoint", UNREACHABLE])
        .arg(&file)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Parse error"))
        .stderr(predicate::str::contains("bad.c"));
}

#[test]
fn lenient_mode_accepts_recovered_trees() {
    let dir = TempDir::new().unwrap();
    let file = source(&dir, "bad.c", "int ok(void);\nvoid broken( {\n");

    hdocs().arg("--discover").arg("--lenient").arg(&file).assert().success();
}

#[test]
fn unreachable_service_is_a_remote_error() {
    let dir = TempDir::new().unwrap();
    let file = source(&dir, "add.c", "int add(int a, int b);\n");

    hdocs()
        .env("OPENAI_API_KEY", "sk-test")
        .args(["--endpoint", UNREACHABLE])
        .arg(&file)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn documented_sources_need_no_requests() {
    let dir = TempDir::new().unwrap();
    let file = source(&dir, "done.c", "// Adds two integers.\nint add(int a, int b);\n");

    hdocs()
        .env("OPENAI_API_KEY", "sk-test")
        .args(["--endpoint", UNREACHABLE])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn missing_input_is_an_io_error() {
    let dir = TempDir::new().unwrap();

    hdocs()
        .env("OPENAI_API_KEY", "sk-test")
        .arg(dir.path().join("nope.c"))
        .assert()
        .code(1);
}

#[test]
fn in_place_requires_insert_mode() {
    let dir = TempDir::new().unwrap();
    let file = source(&dir, "add.c", "int add(int a, int b);\n");

    hdocs()
        .env("OPENAI_API_KEY", "sk-test")
        .args(["--in-place", "--mode", "json"])
        .arg(&file)
        .assert()
        .code(2);
}

#[tokio::test(flavor = "multi_thread")]
async fn prints_generated_documentation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "```\nAdds two integers.\n```" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = source(&dir, "add.c", "int add(int a, int b) {\n    return a + b;\n}\n");
    let endpoint = format!("{}/v1", server.uri());

    // The multi-threaded runtime keeps serving the mock while the binary runs.
    let assert = hdocs()
        .env("OPENAI_API_KEY", "sk-test")
        .args(["--endpoint", endpoint.as_str()])
        .arg(&file)
        .assert();

    assert
        .success()
        .stdout(predicate::str::contains("== add (function) at "))
        .stdout(predicate::str::contains("Adds two integers.\n"));
}
