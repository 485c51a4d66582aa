//! Tests that run the built `prep` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn prep_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_prep"))
}

fn setup_test_env(config_body: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let docs = root.join("data");
    fs::create_dir_all(docs.join("projects")).unwrap();
    fs::write(
        docs.join("resume.md"),
        "# Resume\n\nIntern at MicroStrategy. Built distributed systems.",
    )
    .unwrap();
    fs::write(
        docs.join("projects/segmentation.py"),
        "# image segmentation training loop\nimport torch\n",
    )
    .unwrap();
    fs::write(docs.join("cover.docx"), "ignored").unwrap();
    let long: String = "x".repeat(2500);
    fs::write(docs.join("long.txt"), long).unwrap();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("prep.toml");
    let content = format!(
        "[documents]\nroot = \"{}\"\n\n{}",
        docs.display().to_string().replace('\\', "/"),
        config_body
    );
    fs::write(&config_path, content).unwrap();

    (tmp, config_path)
}

fn run_prep(config_path: &Path, args: &[&str], env: &[(&str, &str)]) -> (String, String, bool) {
    let binary = prep_binary();
    let mut cmd = Command::new(&binary);
    cmd.arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .env_remove("PINECONE_API_KEY")
        .env("RUST_LOG", "off");
    for (k, v) in env {
        cmd.env(k, v);
    }
    let output = cmd
        .output()
        .unwrap_or_else(|e| panic!("Failed to run prep binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn dry_run_ingest_needs_no_credentials() {
    let (_tmp, config) = setup_test_env("");
    let (stdout, stderr, ok) = run_prep(&config, &["ingest", "--dry-run"], &[]);

    assert!(ok, "dry run failed: {}", stderr);
    assert!(stdout.contains("ingest (dry-run)"));
    assert!(stdout.contains("files found: 4"));
    assert!(stdout.contains("files readable: 3"));
    assert!(stdout.contains("files skipped: 1"));
    // resume.md + segmentation.py + 4 windows of long.txt
    assert!(stdout.contains("chunks: 6"), "stdout: {}", stdout);
    assert!(stdout.contains("upsert batches: 1"));
}

#[test]
fn dry_run_respects_dir_override() {
    let (tmp, config) = setup_test_env("");
    let other = tmp.path().join("other");
    fs::create_dir_all(&other).unwrap();
    fs::write(other.join("only.json"), "{\"skills\": [\"rust\"]}").unwrap();

    let (stdout, _, ok) = run_prep(
        &config,
        &["ingest", "--dry-run", "--dir", other.to_str().unwrap()],
        &[],
    );
    assert!(ok);
    assert!(stdout.contains("files found: 1"));
    assert!(stdout.contains("chunks: 1"));
}

#[test]
fn ask_without_openai_key_names_the_variable() {
    let (_tmp, config) = setup_test_env("");
    let (_, stderr, ok) = run_prep(&config, &["ask", "What about AWS?"], &[]);

    assert!(!ok);
    assert!(stderr.contains("OPENAI_API_KEY"), "stderr: {}", stderr);
}

#[test]
fn ingest_without_pinecone_key_names_the_variable() {
    let (_tmp, config) = setup_test_env("");
    let (_, stderr, ok) = run_prep(&config, &["ingest"], &[("OPENAI_API_KEY", "sk-test")]);

    assert!(!ok);
    assert!(stderr.contains("PINECONE_API_KEY"), "stderr: {}", stderr);
}

#[test]
fn invalid_config_is_rejected() {
    let (_tmp, config) = setup_test_env("[chunking]\nchunk_size = 100\noverlap = 100\n");
    let (_, stderr, ok) = run_prep(&config, &["ingest", "--dry-run"], &[]);

    assert!(!ok);
    assert!(stderr.contains("chunking.overlap"), "stderr: {}", stderr);
}

#[test]
fn missing_config_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, ok) = run_prep(&tmp.path().join("nope.toml"), &["stats"], &[]);

    assert!(!ok);
    assert!(stderr.contains("Failed to read config file"), "stderr: {}", stderr);
}
