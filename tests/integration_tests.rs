//! Integration tests: CLI smoke tests driving the `psn` binary against
//! capture fixtures.

mod common;

use serde_json::Value;

fn json_line(stdout: &str) -> Value {
    let line = stdout.lines().next().unwrap_or_default();
    serde_json::from_str(line).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
}

#[test]
fn help_command_prints_usage() {
    let result = common::run_cli_case("help_command_prints_usage", &["--help"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: psn [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn version_command_prints_version() {
    let result = common::run_cli_case("version_command_prints_version", &["--version"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn timestamps_lists_pidstat_samples() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_fixture(dir.path(), "pidstat.txt", common::PIDSTAT_CAPTURE);
    let result = common::run_cli_case("timestamps_lists_pidstat_samples", &["--json", "timestamps", &file]);
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let payload = json_line(&result.stdout);
    assert_eq!(payload["tool"], "pidstat");
    assert_eq!(payload["timestamps"], serde_json::json!(["13:36:32", "13:36:37"]));
}

#[test]
fn timestamps_human_output_is_one_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_fixture(dir.path(), "top.txt", common::TOP_CAPTURE);
    let result = common::run_cli_case_with_env(
        "timestamps_human_output_is_one_per_line",
        &["timestamps", &file],
        &[("PSN_OUTPUT_FORMAT", "human")],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert_eq!(result.stdout.lines().collect::<Vec<_>>(), vec!["13:36:32", "13:36:35"]);
}

#[test]
fn show_renders_sorted_highlighted_view() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_fixture(dir.path(), "top.txt", common::TOP_CAPTURE);
    let result = common::run_cli_case(
        "show_renders_sorted_highlighted_view",
        &["--json", "show", &file, "--at", "13:36:32"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let payload = json_line(&result.stdout);
    assert_eq!(payload["tool"], "top");
    assert_eq!(payload["parse"]["rows"], 3);
    assert_eq!(payload["parse"]["header_found"], true);
    let view = &payload["view"];
    assert_eq!(view["columns"][8]["name"], "%CPU");
    assert_eq!(view["metric_index"], 8);
    let rows = view["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["cells"][11]["text"], "java");
    assert_eq!(rows[0]["level"], "crit");
    assert_eq!(rows[1]["level"], "none");
}

#[test]
fn show_applies_search_top_and_sort() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_fixture(dir.path(), "pidstat.txt", common::PIDSTAT_CAPTURE);
    let result = common::run_cli_case(
        "show_applies_search_top_and_sort",
        &[
            "--json", "show", &file, "--at", "13:36:32", "--search", "JAVA", "--top", "5", "--sort",
            "PID",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let view = &json_line(&result.stdout)["view"];
    assert_eq!(view["total_rows"], 3);
    assert_eq!(view["matched_rows"], 1);
    assert_eq!(view["sort"]["column"], 2);
    assert_eq!(view["sort"]["direction"], "ascending");
    assert_eq!(view["rows"][0]["cells"][9]["text"], "java -jar app.jar");
}

#[test]
fn show_human_output_has_summary_and_table() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_fixture(dir.path(), "pidstat.txt", common::PIDSTAT_CAPTURE);
    let result = common::run_cli_case_with_env(
        "show_human_output_has_summary_and_table",
        &["--no-color", "show", &file, "--at", "13:36:32", "--metric", "%usr"],
        &[("PSN_OUTPUT_FORMAT", "human")],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let mut lines = result.stdout.lines();
    assert_eq!(
        lines.next(),
        Some("pidstat @ 13:36:32: 3 of 3 rows, sorted by %usr▼")
    );
    let header = lines.next().unwrap_or_default();
    assert!(header.starts_with("Timestamp"));
    assert!(header.contains("%usr▼"));
    assert!(lines.next().unwrap_or_default().ends_with("java -jar app.jar"));
}

#[test]
fn show_unknown_timestamp_is_user_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_fixture(dir.path(), "top.txt", common::TOP_CAPTURE);
    let result = common::run_cli_case(
        "show_unknown_timestamp_is_user_error",
        &["show", &file, "--at", "23:59:59"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PSN-2002"));
}

#[test]
fn show_unknown_sort_column_is_user_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_fixture(dir.path(), "top.txt", common::TOP_CAPTURE);
    let result = common::run_cli_case(
        "show_unknown_sort_column_is_user_error",
        &["show", &file, "--at", "13:36:32", "--sort", "NOPE"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
}

#[test]
fn top_ranks_pidstat_commands_across_samples() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_fixture(dir.path(), "pidstat.txt", common::PIDSTAT_CAPTURE);
    let result = common::run_cli_case(
        "top_ranks_pidstat_commands_across_samples",
        &["--json", "top", &file, "--top", "2"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let payload = json_line(&result.stdout);
    assert_eq!(payload["command"], "top");
    let report = &payload["report"];
    assert_eq!(report["profile"], "cpu");
    assert_eq!(report["timestamps"], serde_json::json!(["13:36:32", "13:36:37"]));

    let usr = &report["rankings"][0];
    assert_eq!(usr["metric"], "%usr");
    let consumers = usr["consumers"].as_array().unwrap();
    assert_eq!(consumers.len(), 2);
    // python3 ran in one sample only, so its average beats java's.
    assert_eq!(consumers[0]["command"], "python3 worker.py");
    assert_eq!(consumers[0]["average"], 55.0);
    assert_eq!(consumers[1]["command"], "java -jar app.jar");
    assert_eq!(consumers[1]["average"], 41.0);
    assert_eq!(consumers[1]["values"], serde_json::json!([72.0, 10.0]));
    assert_eq!(consumers[1]["pids"], serde_json::json!(["2211"]));
}

#[test]
fn top_rejects_non_pidstat_capture() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_fixture(dir.path(), "top.txt", common::TOP_CAPTURE);
    let result = common::run_cli_case("top_rejects_non_pidstat_capture", &["--json", "top", &file]);
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
}

#[test]
fn top_rejects_unknown_profile() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_fixture(dir.path(), "pidstat.txt", common::PIDSTAT_CAPTURE);
    let result = common::run_cli_case(
        "top_rejects_unknown_profile",
        &["top", &file, "--profile", "gpu"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PSN-1001"));
}

#[test]
fn unrecognized_capture_is_user_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_fixture(dir.path(), "notes.txt", "just some notes\nnothing tabular\n");
    let result = common::run_cli_case("unrecognized_capture_is_user_error", &["timestamps", &file]);
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PSN-2001"));
}

#[test]
fn missing_capture_file_is_runtime_error() {
    let result = common::run_cli_case(
        "missing_capture_file_is_runtime_error",
        &["timestamps", "/nonexistent/procsnap/capture.txt"],
    );
    assert_eq!(result.status.code(), Some(2), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PSN-3002"));
}

#[test]
fn config_validate_reports_invalid_thresholds() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = common::write_fixture(
        dir.path(),
        "config.toml",
        "[render.thresholds]\nwarn = 95.0\ncrit = 10.0\n",
    );
    let result = common::run_cli_case(
        "config_validate_reports_invalid_thresholds",
        &["--json", "--config", &cfg, "config", "validate"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["valid"], false);
    assert_eq!(payload["code"], "PSN-1001");
}

#[test]
fn config_show_includes_env_overrides() {
    let result = common::run_cli_case_with_env(
        "config_show_includes_env_overrides",
        &["--json", "config", "show"],
        &[("PSN_METRIC", "%MEM"), ("PSN_TOP_N", "7")],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["config"]["render"]["metric"], "%MEM");
    assert_eq!(payload["config"]["render"]["top_n"], 7);
}

#[test]
fn activity_log_records_parse_events() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_fixture(dir.path(), "top.txt", common::TOP_CAPTURE);
    let log_path = dir.path().join("activity.jsonl");
    let log = log_path.to_string_lossy().into_owned();
    let result = common::run_cli_case_with_env(
        "activity_log_records_parse_events",
        &["--json", "show", &file, "--at", "13:36:35"],
        &[("PSN_LOG_ENABLED", "true"), ("PSN_LOG_PATH", &log)],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let text = std::fs::read_to_string(&log_path).unwrap();
    let events: Vec<String> = text
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).unwrap()["event"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        events,
        vec!["config_loaded", "capture_loaded", "chunk_parsed", "section_rendered"]
    );
}

#[test]
fn completions_generate_for_bash() {
    let result = common::run_cli_case("completions_generate_for_bash", &["completions", "bash"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("psn"));
}
