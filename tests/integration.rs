use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn lctx_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lctx"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let laws_dir = root.join("laws");
    fs::create_dir_all(&laws_dir).unwrap();
    fs::write(
        laws_dir.join("civil_code.txt"),
        "Article 1. Contracts require mutual consent of the parties.\n\
         Article 2. A contract may be terminated for material breach.",
    )
    .unwrap();
    fs::write(
        laws_dir.join("labour_code.txt"),
        "Article 10. The employer shall pay wages at least once a month.\n\
         Article 11. Annual paid leave is not less than twenty one days.",
    )
    .unwrap();
    fs::write(
        laws_dir.join("housing_code.txt"),
        "Article 20. The tenant pays rent monthly to the landlord.\n\
         Article 21. The landlord shall keep the dwelling in repair.",
    )
    .unwrap();
    fs::write(laws_dir.join("README.md"), "Not part of the corpus.").unwrap();

    let config_content = format!(
        r#"[corpus]
root = "{root}/laws"
include_globs = ["*.txt"]

[chunking]
fragment_size = 120

[index]
index_path = "{root}/data/law_index.bin"
fragments_path = "{root}/data/law_fragments.json"

[retrieval]
top_k = 2

[server]
bind = "127.0.0.1:7341"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("lctx.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_lctx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = lctx_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run lctx binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_build_creates_both_artifacts() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_lctx(&config_path, &["build"]);
    assert!(success, "build failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("build (built)"));
    assert!(stdout.contains("documents: 3"));
    assert!(stdout.contains("ok"));

    assert!(tmp.path().join("data/law_index.bin").exists());
    assert!(tmp.path().join("data/law_fragments.json").exists());
}

#[test]
fn test_second_build_loads_existing_index() {
    let (_tmp, config_path) = setup_test_env();

    run_lctx(&config_path, &["build"]);
    let (stdout, _, success) = run_lctx(&config_path, &["build"]);
    assert!(success);
    assert!(stdout.contains("build (loaded)"), "stdout={}", stdout);
}

#[test]
fn test_force_rebuild() {
    let (_tmp, config_path) = setup_test_env();

    run_lctx(&config_path, &["build"]);
    let (stdout, _, success) = run_lctx(&config_path, &["build", "--force"]);
    assert!(success);
    assert!(stdout.contains("build (built)"));
}

#[test]
fn test_failed_force_rebuild_keeps_existing_index() {
    let (tmp, config_path) = setup_test_env();

    let (_, _, success) = run_lctx(&config_path, &["build"]);
    assert!(success);
    fs::remove_dir_all(tmp.path().join("laws")).unwrap();

    let (_, stderr, success) = run_lctx(&config_path, &["build", "--force"]);
    assert!(!success);
    assert!(stderr.contains("Corpus directory does not exist"), "stderr={}", stderr);
    assert!(tmp.path().join("data/law_index.bin").exists());
    assert!(tmp.path().join("data/law_fragments.json").exists());

    let (stdout, stderr, success) = run_lctx(&config_path, &["retrieve", "rent landlord"]);
    assert!(success, "stderr={}", stderr);
    assert!(stdout.contains("landlord"));
}

#[test]
fn test_retrieve_ranks_relevant_article_first() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) =
        run_lctx(&config_path, &["retrieve", "How often must wages be paid?", "-k", "1"]);
    assert!(success, "retrieve failed: stderr={}", stderr);
    assert!(stdout.starts_with("1. [score:"), "stdout={}", stdout);
    assert!(stdout.contains("wages"), "stdout={}", stdout);
    assert!(!stdout.contains("2. [score:"));
}

#[test]
fn test_retrieve_json_output() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_lctx(
        &config_path,
        &["retrieve", "tenant rent landlord", "--json"],
    );
    assert!(success);
    let body: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let fragments = body["fragments"].as_array().unwrap();
    assert_eq!(body["k"], 2);
    assert_eq!(fragments.len(), 2);
    assert!(fragments[0]["text"].as_str().unwrap().contains("rent"));
    assert!(fragments[0]["score"].as_f64().unwrap() >= fragments[1]["score"].as_f64().unwrap());
}

#[test]
fn test_retrieve_context_output() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_lctx(&config_path, &["retrieve", "contract breach", "--context"]);
    assert!(success);
    assert!(stdout.contains("breach"));
    assert!(!stdout.contains("[score:"));
}

#[test]
fn test_retrieve_k_larger_than_corpus() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_lctx(&config_path, &["retrieve", "article", "-k", "1000", "--json"]);
    assert!(success);
    let body: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let returned = body["fragments"].as_array().unwrap().len();

    let fragments_json =
        fs::read_to_string(config_path.parent().unwrap().parent().unwrap().join("data/law_fragments.json"))
            .unwrap();
    let artifact: serde_json::Value = serde_json::from_str(&fragments_json).unwrap();
    assert_eq!(returned, artifact["fragments"].as_array().unwrap().len());
}

#[test]
fn test_retrieve_rejects_empty_query() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_lctx(&config_path, &["retrieve", "   "]);
    assert!(!success);
    assert!(stderr.contains("must not be empty"));
}

#[test]
fn test_retrieve_rejects_zero_k() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_lctx(&config_path, &["retrieve", "rent", "-k", "0"]);
    assert!(!success);
    assert!(stderr.contains("k must be >= 1"), "stderr={}", stderr);
}

#[test]
fn test_empty_corpus_returns_no_results() {
    let (tmp, config_path) = setup_test_env();
    for entry in fs::read_dir(tmp.path().join("laws")).unwrap() {
        fs::remove_file(entry.unwrap().path()).unwrap();
    }

    let (stdout, stderr, success) = run_lctx(&config_path, &["retrieve", "rent"]);
    assert!(success, "stderr={}", stderr);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_missing_corpus_fails() {
    let (tmp, config_path) = setup_test_env();
    fs::remove_dir_all(tmp.path().join("laws")).unwrap();

    let (_, stderr, success) = run_lctx(&config_path, &["build"]);
    assert!(!success);
    assert!(stderr.contains("Corpus directory does not exist"), "stderr={}", stderr);
}

#[test]
fn test_missing_corpus_is_fine_once_indexed() {
    let (tmp, config_path) = setup_test_env();
    run_lctx(&config_path, &["build"]);
    fs::remove_dir_all(tmp.path().join("laws")).unwrap();

    let (stdout, _, success) = run_lctx(&config_path, &["retrieve", "rent landlord"]);
    assert!(success);
    assert!(stdout.contains("landlord"));
}

#[test]
fn test_undecodable_file_fails_build() {
    let (tmp, config_path) = setup_test_env();
    fs::write(tmp.path().join("laws/broken.txt"), [0xc3, 0x28, 0xa0, 0xa1]).unwrap();

    let (_, stderr, success) = run_lctx(&config_path, &["build"]);
    assert!(!success);
    assert!(stderr.contains("not valid UTF-8"), "stderr={}", stderr);
}

#[test]
fn test_deleted_fragment_artifact_triggers_rebuild() {
    let (tmp, config_path) = setup_test_env();
    run_lctx(&config_path, &["build"]);
    fs::remove_file(tmp.path().join("data/law_fragments.json")).unwrap();

    let (stdout, _, success) = run_lctx(&config_path, &["build"]);
    assert!(success);
    assert!(stdout.contains("build (built)"));
}

#[test]
fn test_similar_lists_neighbours() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_lctx(&config_path, &["similar", "0", "-k", "2"]);
    assert!(success, "stderr={}", stderr);
    assert!(stdout.contains("1. [distance:"));
    assert!(!stdout.contains("fragment #0\n"));
}

#[test]
fn test_similar_out_of_range() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_lctx(&config_path, &["similar", "9999"]);
    assert!(!success);
    assert!(stderr.contains("out of range"));
}

#[test]
fn test_stats_before_and_after_build() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_lctx(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("not built"));

    run_lctx(&config_path, &["build"]);
    let (stdout, _, success) = run_lctx(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Status:      ok"));
    assert!(stdout.contains("Documents:   3"));
}

#[test]
fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("lctx.toml");
    fs::write(&config_path, "[corpus]\nroot = \"x\"\n[chunking]\nfragment_size = 0\n").unwrap();

    let (_, stderr, success) = run_lctx(&config_path, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("fragment_size"));
}
