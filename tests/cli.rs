mod common;

use std::fs;
use std::process::Output;
use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use common::{FakeDav, PASSWORD, USERNAME};
use predicates::prelude::*;
use tempfile::tempdir;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

fn publish_cmd() -> Command {
    let mut cmd = Command::cargo_bin("dav-publish").expect("Binary exists");
    cmd.env_clear().arg("publish");
    cmd
}

#[test]
fn malformed_override_flag_fails_before_touching_the_file() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("report.txt");
    fs::write(&source, "body").unwrap();

    publish_cmd()
        .arg("--file-path")
        .arg(&source)
        .args(["--url", "http://127.0.0.1:9/dav"])
        .args(["--username", USERNAME, "--password", PASSWORD])
        .args(["--override", "yes", "--zip", "true", "--rename", "renamed.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("override").and(predicate::str::contains("yes")));

    assert!(source.exists(), "rename must not have run");
    assert!(!tmp.path().join("renamed.txt").exists());
    assert!(!tmp.path().join("report.txt.zip").exists(), "compression must not have run");
}

#[test]
fn malformed_flag_from_environment_is_rejected() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("report.txt");
    fs::write(&source, "body").unwrap();

    publish_cmd()
        .env("INPUT_FILE_PATH", &source)
        .env("INPUT_NEXTCLOUD_URL", "http://127.0.0.1:9/dav")
        .env("INPUT_USERNAME", USERNAME)
        .env("INPUT_PASSWORD", PASSWORD)
        .env("INPUT_DATE", "maybe")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("date"));
}

#[test]
fn missing_required_inputs_exit_with_configuration_code() {
    publish_cmd()
        .args(["--file-path", "whatever.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing inputs"));
}

async fn run_blocking(cmd: Command) -> Output {
    let mut cmd = cmd;
    tokio::task::spawn_blocking(move || cmd.output().expect("binary runs"))
        .await
        .expect("blocking task")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn publishes_zipped_file_configured_through_environment() {
    let server = FakeDav::spawn().await;
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("report.txt");
    fs::write(&source, "release notes").unwrap();

    let mut cmd = publish_cmd();
    cmd.env("INPUT_FILE_PATH", &source)
        .env("INPUT_NEXTCLOUD_URL", server.base_url())
        .env("INPUT_USERNAME", USERNAME)
        .env("INPUT_PASSWORD", PASSWORD)
        .env("INPUT_OVERRIDE", "false")
        .env("INPUT_ZIP", "true")
        .env("INPUT_DATE", "false")
        .env("INPUT_TIME", "false")
        .env("INPUT_RENAME", "false");
    let output = run_blocking(cmd).await;

    assert!(
        output.status.success(),
        "expected success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("report.txt.zip"), "stdout: {stdout}");
    assert!(server.object("report.txt.zip").is_some(), "archive must be on the server");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn existing_remote_object_exits_with_failure() {
    let server = FakeDav::spawn().await;
    server.insert_object("report.txt", b"already published");
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("report.txt");
    fs::write(&source, "second attempt").unwrap();

    let mut cmd = publish_cmd();
    cmd.arg("--file-path")
        .arg(&source)
        .arg("--url")
        .arg(server.base_url())
        .args(["--username", USERNAME, "--password", PASSWORD]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already exists"), "stderr: {stderr}");
    assert_eq!(server.object("report.txt").unwrap(), b"already published");
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use dav_publish::cli::{run, Cli, Commands, PublishArgs};

    let cli = Cli {
        command: Commands::Publish(PublishArgs::default()),
    };
    let result = run(cli).await;
    assert!(result.is_err(), "no inputs means a configuration error");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
