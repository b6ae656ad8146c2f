use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CREDENTIAL_VARS: [&str; 4] = [
    "CANVAS_ACCESS_TOKEN",
    "CANVAS_DOMAIN",
    "GRADESCOPE_EMAIL",
    "GRADESCOPE_PASSWORD",
];

/// Binary isolated from the user's home, credentials and launch settings
fn school_mcp(home: &TempDir) -> Command {
    let credentials = home.path().join("credentials.json");
    std::fs::write(&credentials, "{}").unwrap();

    let mut cmd = Command::cargo_bin("school-mcp").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("SCHOOL_MCP_LAUNCH_CONFIG")
        .env_remove("SCHOOL_MCP_ENV_FILE")
        .env_remove("SCHOOL_MCP_USE_SETUP_HELPER")
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("APPDATA")
        .arg("--credentials")
        .arg(&credentials);
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn tools_lists_the_advertised_tools() {
    let home = TempDir::new().unwrap();
    let mut assert = school_mcp(&home).arg("tools").assert().success();

    for name in [
        "get_deadlines",
        "add_to_reminders",
        "list_courses",
        "download_course_files",
        "set_download_path",
        "get_download_path_info",
    ] {
        assert = assert.stdout(predicate::str::contains(name));
    }
}

#[test]
fn serve_answers_on_stdout() {
    let home = TempDir::new().unwrap();
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","#,
        r#""params":{"protocolVersion":"2024-11-05"}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "\n",
    );

    let output = school_mcp(&home)
        .arg("serve")
        .write_stdin(input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let frames: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["result"]["serverInfo"]["name"], "School Tools");
    assert_eq!(frames[1]["result"]["tools"].as_array().unwrap().len(), 6);
}

#[test]
fn serve_reports_missing_credentials_as_tool_errors() {
    let home = TempDir::new().unwrap();
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","#,
        r#""params":{"name":"list_courses","arguments":{}}}"#,
        "\n",
    );

    let output = school_mcp(&home)
        .arg("serve")
        .write_stdin(input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let frame: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(frame["result"]["isError"], true);
    let text = frame["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Error listing courses:"));
    assert!(text.contains("CANVAS_ACCESS_TOKEN"));
}

#[test]
fn launch_without_setup_helper_serves_directly() {
    let home = TempDir::new().unwrap();

    school_mcp(&home)
        .arg("--launch-config")
        .arg(r#"{"envFilePath": "missing.env"}"#)
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Setup helper").not());
}

#[test]
fn setup_helper_env_accepts_numeric_flags() {
    let home = TempDir::new().unwrap();

    school_mcp(&home)
        .env("SCHOOL_MCP_USE_SETUP_HELPER", "1")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Running setup helper"));

    school_mcp(&home)
        .env("SCHOOL_MCP_USE_SETUP_HELPER", "0")
        .write_stdin("")
        .assert()
        .success()
        .stderr(predicate::str::contains("Running setup helper").not());
}

#[test]
fn serve_survives_a_line_that_is_not_utf8() {
    let home = TempDir::new().unwrap();
    let mut input = Vec::new();
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n");
    input.extend_from_slice(b"\xff\xfe garbage\n");
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");

    let output = school_mcp(&home)
        .arg("serve")
        .write_stdin(input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let frames: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(frames.len(), 3);
    assert!(frames.iter().any(|f| f["error"]["code"] == -32700));
    assert!(frames.iter().any(|f| f["id"] == 2 && f["result"].is_object()));
}

#[test]
fn serve_rejects_unknown_transports() {
    let home = TempDir::new().unwrap();

    school_mcp(&home)
        .args(["serve", "--transport", "websocket"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'websocket'"));
}

#[test]
fn invalid_launch_config_fails() {
    let home = TempDir::new().unwrap();

    school_mcp(&home)
        .arg("--launch-config")
        .arg(r#"{"useSetupHelper": "yes"}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid launch configuration"));
}

#[test]
fn missing_credentials_file_fails() {
    let home = TempDir::new().unwrap();

    Command::cargo_bin("school-mcp")
        .unwrap()
        .current_dir(home.path())
        .env("HOME", home.path())
        .arg("--credentials")
        .arg(home.path().join("nope.json"))
        .arg("serve")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Credentials file not found"));
}
