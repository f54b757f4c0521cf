use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_config,
            xdg_state,
        }
    }

    fn write_config(&self, contents: &str) {
        let dir = self.xdg_config.join("inboxview");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }

    fn log_dir(&self) -> PathBuf {
        self.xdg_state.join("inboxview")
    }
}

fn fixture_archive() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../inboxview-core/tests/fixtures/archive")
}

fn run_bin(env: &CliTestEnv, archive: &Path, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("inboxview"));

    Command::new(bin_path)
        .arg("--archive")
        .arg(archive)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute inboxview: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "inboxview {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn list_shows_conversations_and_warns_about_broken_ones() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &fixture_archive(), &["list"]);
    assert_success(&["list"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Alice Café"), "stdout:\n{stdout}");
    assert!(stdout.contains("bob_2"));
    assert!(stdout.contains("3 conversation(s)"));

    // Most recent first
    let bob = stdout.find("bob_2").expect("bob listed");
    let alice = stdout.find("alice_1").expect("alice listed");
    assert!(bob < alice);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("skipped broken_3"), "stderr:\n{stderr}");

    assert!(
        env.log_dir().exists(),
        "log directory should exist at {}",
        env.log_dir().display()
    );
}

#[test]
fn list_search_filters_and_emits_json() {
    let env = CliTestEnv::new();
    let args = ["list", "--search", "Gap", "--json"];

    let output = run_bin(&env, &fixture_archive(), &args);
    assert_success(&args, &output);

    let listed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let listed = listed.as_array().expect("array of summaries");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["dir_name"], "gappy_4");
}

#[test]
fn show_groups_messages_and_marks_owner() {
    let env = CliTestEnv::new();
    let args = ["show", "alice_1"];

    let output = run_bin(&env, &fixture_archive(), &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Participants: Alice Café, Zoë Owner"));
    assert!(stdout.contains("Zoë Owner (you)"), "stdout:\n{stdout}");
    assert!(stdout.contains("[photo: cat.jpg]"));
    assert!(stdout.contains("[link] https://example.com/menu"));
    assert!(stdout.contains("Alice started a call."));
    assert!(stdout.contains("❤ 1"));
}

#[test]
fn stats_reports_counts() {
    let env = CliTestEnv::new();
    let args = ["stats", "alice_1", "--json"];

    let output = run_bin(&env, &fixture_archive(), &args);
    assert_success(&args, &output);

    let stats: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(stats["total_count"], 5);
    assert_eq!(stats["count_info"]["Alice Café"], 4);
    assert_eq!(stats["created_at"], 1_700_000_100_000_i64);
}

#[test]
fn attachments_resolve_against_archive() {
    let env = CliTestEnv::new();
    let args = ["attachments", "alice_1"];

    let output = run_bin(&env, &fixture_archive(), &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("messages/inbox/alice_1/photos/cat.jpg"));
    assert!(stdout.contains("image/jpeg"));
    assert!(!stdout.contains("(missing)"));
}

#[test]
fn attachments_resolve_when_inbox_is_granted() {
    let env = CliTestEnv::new();
    let inbox = fixture_archive().join("export/messages/inbox");
    let args = ["attachments", "alice_1"];

    let output = run_bin(&env, &inbox, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("image/jpeg"), "stdout:\n{stdout}");
    assert!(!stdout.contains("(missing)"));
}

#[test]
fn unknown_conversation_fails() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &fixture_archive(), &["show", "nobody_9"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("conversation not found"), "stderr:\n{stderr}");
}

#[test]
fn folder_without_inbox_is_rejected() {
    let env = CliTestEnv::new();
    let empty = TempDir::new().expect("failed to create temp dir");

    let output = run_bin(&env, empty.path(), &["list"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a valid archive"), "stderr:\n{stderr}");
}

#[test]
fn config_label_is_honored() {
    let env = CliTestEnv::new();
    env.write_config("[archive]\nconversations_label = \"threads\"\n");

    let archive = TempDir::new().expect("failed to create temp dir");
    let folder = archive.path().join("Threads/carol_5");
    fs::create_dir_all(&folder).expect("failed to create conversation folder");
    fs::write(
        folder.join("message_1.json"),
        r#"{"title": "Carol", "participants": [{"name": "Carol"}],
            "messages": [{"sender_name": "Carol", "timestamp_ms": 1, "content": "hey"}]}"#,
    )
    .expect("failed to write part");

    let output = run_bin(&env, archive.path(), &["list"]);
    assert_success(&["list"], &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("carol_5"));
}
