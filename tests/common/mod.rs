#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_psn") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "psn.exe" } else { "psn" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve psn binary path for integration test"),
    }
}

/// Run `psn` with `args`, isolated from the caller's home directory.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_with_env(case_name, args, &[])
}

pub fn run_cli_case_with_env(case_name: &str, args: &[&str], env: &[(&str, &str)]) -> CmdResult {
    let root = std::env::temp_dir().join("psn-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");
    let home = tempfile::tempdir().expect("create isolated home");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .env("HOME", home.path())
        .env_remove("PSN_OUTPUT_FORMAT")
        .env_remove("PSN_METRIC")
        .env_remove("PSN_TOP_N")
        .env("RUST_BACKTRACE", "1");
    for (name, value) in env {
        command.env(name, value);
    }
    let output = command.output().expect("execute psn command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Write `contents` to `name` inside `dir` and return the path as a string.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path.to_string_lossy().into_owned()
}

pub const PIDSTAT_CAPTURE: &str = "\
Linux 6.1.0-18-amd64 (build-01) \t03/14/2024 \t_x86_64_\t(8 CPU)

13:36:32      UID       PID    %usr %system  %guest   %wait    %CPU   CPU  Command
13:36:32        0         1    0.00    0.00    0.00    0.00    0.00     3  systemd
13:36:32     1000      2211   72.00    9.00    0.00    0.00   81.00     1  java -jar app.jar
13:36:32     1000      2305   55.00    6.00    0.00    0.00   61.00     4  python3 worker.py

13:36:37      UID       PID    %usr %system  %guest   %wait    %CPU   CPU  Command
13:36:37     1000      2211   10.00    1.00    0.00    0.00   11.00     1  java -jar app.jar

Average:      UID       PID    %usr %system  %guest   %wait    %CPU   CPU  Command
Average:     1000      2211   41.00    5.00    0.00    0.00   46.00     -  java -jar app.jar
";

pub const TOP_CAPTURE: &str = "\
top - 13:36:32 up 10 days,  2:03,  1 user,  load average: 0.52, 0.58, 0.59
Tasks: 312 total,   1 running, 311 sleeping,   0 stopped,   0 zombie
%Cpu(s):  3.1 us,  1.0 sy,  0.0 ni, 95.7 id,  0.0 wa,  0.0 hi,  0.2 si,  0.0 st
MiB Mem :  15890.1 total,   1021.3 free,   8123.4 used,   6745.4 buff/cache
MiB Swap:   2048.0 total,   2048.0 free,      0.0 used.   7120.2 avail Mem

    PID USER      PR  NI    VIRT    RES    SHR S  %CPU  %MEM     TIME+ COMMAND
   2211 alice     20   0 8123456 912340  23456 S  93.8   5.6  12:03.11 java
   1834 root      20   0  456789  45678  12345 S  12.5   0.3   1:02.03 Xorg
    912 bob       20   0  123456  12345   1234 S   0.0   0.1   0:00.12 sshd

top - 13:36:35 up 10 days,  2:03,  1 user,  load average: 0.49, 0.57, 0.59
Tasks: 311 total,   1 running, 310 sleeping,   0 stopped,   0 zombie

    PID USER      PR  NI    VIRT    RES    SHR S  %CPU  %MEM     TIME+ COMMAND
   1834 root      20   0  456789  45678  12345 S  66.0   0.3   1:02.50 Xorg
";
