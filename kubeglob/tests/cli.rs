use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Kubeconfig pointing at an address nothing listens on; dry runs never connect.
fn write_kubeconfig(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("kubeconfig");
    fs::write(
        &path,
        "apiVersion: v1\nkind: Config\ncurrent-context: test\nclusters:\n  - name: test\n    cluster:\n      server: http://127.0.0.1:9\ncontexts:\n  - name: test\n    context:\n      cluster: test\n      user: test\nusers:\n  - name: test\n    user:\n      token: dummy\n",
    )
    .expect("Writing temp kubeconfig failed");
    path
}

fn manifest_tree() -> TempDir {
    let dir = tempdir().expect("temp dir");
    let root = dir.path();
    fs::create_dir_all(root.join("a/b")).unwrap();
    fs::write(root.join("a/x.yaml"), "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\n").unwrap();
    fs::write(
        root.join("a/b/y.yaml"),
        "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: y\n  namespace: team1\n",
    )
    .unwrap();
    fs::write(root.join("a/readme.txt"), "docs\n").unwrap();
    dir
}

#[test]
fn help_lists_all_flags() {
    let mut cmd = Command::cargo_bin("kubeglob").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert().success().stdout(
        predicate::str::contains("--base")
            .and(predicate::str::contains("--glob"))
            .and(predicate::str::contains("--kubeconfig"))
            .and(predicate::str::contains("--dry-run")),
    );
}

#[test]
fn dry_run_prints_matching_paths_without_contacting_cluster() {
    let tree = manifest_tree();
    let kubeconfig = write_kubeconfig(tree.path());

    let mut cmd = Command::cargo_bin("kubeglob").expect("Binary exists");
    cmd.arg("--base")
        .arg(tree.path().join("a"))
        .arg("--glob")
        .arg("*.yaml")
        .arg("--kubeconfig")
        .arg(&kubeconfig)
        .arg("--dry-run")
        .env_remove("KUBECONFIG");

    cmd.assert().success().stdout(
        predicate::str::contains("x.yaml")
            .and(predicate::str::contains("y.yaml"))
            .and(predicate::str::contains("readme.txt").not()),
    );
}

#[test]
fn malformed_glob_fails_before_reading_kubeconfig() {
    let tree = manifest_tree();
    let mut cmd = Command::cargo_bin("kubeglob").expect("Binary exists");
    cmd.arg("-b")
        .arg(tree.path())
        .arg("-g")
        .arg("*.{yaml")
        .arg("-c")
        .arg(tree.path().join("does-not-exist"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("error parsing glob"));
}

#[test]
fn missing_kubeconfig_is_reported() {
    let tree = manifest_tree();
    let mut cmd = Command::cargo_bin("kubeglob").expect("Binary exists");
    cmd.arg("-b")
        .arg(tree.path())
        .arg("-c")
        .arg(tree.path().join("does-not-exist"))
        .arg("-n");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("error reading kubeconfig"));
}

#[test]
fn dry_run_still_fails_on_malformed_manifest() {
    let tree = manifest_tree();
    fs::write(tree.path().join("a/bad.yaml"), "kind: [oops\n").unwrap();
    let kubeconfig = write_kubeconfig(tree.path());

    let mut cmd = Command::cargo_bin("kubeglob").expect("Binary exists");
    cmd.arg("-b")
        .arg(tree.path().join("a"))
        .arg("-g")
        .arg("*.yaml")
        .arg("-c")
        .arg(&kubeconfig)
        .arg("-n");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("bad.yaml"));
}

#[test]
fn fail_fast_prints_no_report_for_files_before_the_failure() {
    let tree = manifest_tree();
    fs::write(tree.path().join("a/b/z-bad.yaml"), "kind: [oops\n").unwrap();
    let kubeconfig = write_kubeconfig(tree.path());

    let mut cmd = Command::cargo_bin("kubeglob").expect("Binary exists");
    cmd.arg("-b")
        .arg(tree.path().join("a"))
        .arg("-g")
        .arg("*.yaml")
        .arg("-c")
        .arg(&kubeconfig)
        .arg("-n");

    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("z-bad.yaml"));
}

#[test]
fn keep_going_lists_the_rest_but_exits_non_zero() {
    let tree = manifest_tree();
    fs::write(tree.path().join("a/bad.yaml"), "kind: [oops\n").unwrap();
    let kubeconfig = write_kubeconfig(tree.path());

    let mut cmd = Command::cargo_bin("kubeglob").expect("Binary exists");
    cmd.arg("-b")
        .arg(tree.path().join("a"))
        .arg("-g")
        .arg("*.yaml")
        .arg("-c")
        .arg(&kubeconfig)
        .arg("-n")
        .arg("--keep-going");

    cmd.assert()
        .failure()
        .stdout(
            predicate::str::contains("x.yaml")
                .and(predicate::str::contains("y.yaml"))
                .and(predicate::str::contains("failed")),
        )
        .stderr(predicate::str::contains("1 of 3 files failed"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let msg = format!("{:?}", event);
        self.events.lock().unwrap().push(msg);
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

    use clap::Parser;
    use kubeglob::cli::{run, Cli};

    // A malformed glob ends the run early, after the first event.
    let cli = Cli::try_parse_from(["kubeglob", "--glob", "[unclosed"]).unwrap();
    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
