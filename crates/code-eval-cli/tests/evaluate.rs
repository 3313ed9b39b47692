use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn command() -> Command {
    let mut cmd = Command::cargo_bin("code-eval-cli").unwrap();
    for var in [
        "GITHUB_WORKSPACE",
        "GITHUB_OUTPUT",
        "RUBRIC_FILE",
        "OPENAI_API_KEY",
        "CODE_EVAL_LLM__PROVIDER",
        "CODE_EVAL_LLM__API_KEY",
        "CODE_EVAL_LLM__MODEL",
        "CODE_EVAL_LLM__ENDPOINT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn fixture_repo() -> tempfile::TempDir {
    let temp = tempfile::tempdir().unwrap();
    fs::create_dir_all(temp.path().join("src")).unwrap();
    fs::write(temp.path().join("src/main.py"), "print('hello')\n").unwrap();
    temp
}

fn root_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn noop_provider_reports_zero_score() {
    let repo = fixture_repo();
    command()
        .args(["--root", root_arg(repo.path()), "--provider", "noop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("score=0\n"))
        .stdout(predicate::str::contains(
            "explanation=# Code Structure Evaluation Report\\n",
        ))
        .stdout(predicate::str::contains("Score: 0/30"));

    let report = fs::read_to_string(repo.path().join("Result.md")).unwrap();
    assert!(report.starts_with("# Code Structure Evaluation Report"));
}

#[test]
fn outputs_are_appended_to_github_output_file() {
    let repo = fixture_repo();
    let outputs = tempfile::NamedTempFile::new().unwrap();
    command()
        .args(["--root", root_arg(repo.path()), "--provider", "noop"])
        .env("GITHUB_OUTPUT", outputs.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("score=").not());

    let written = fs::read_to_string(outputs.path()).unwrap();
    assert!(written.starts_with("score=0\nexplanation="));
    assert_eq!(written.lines().count(), 2);
}

#[test]
fn missing_api_key_fails_without_writing_report() {
    let repo = fixture_repo();
    command()
        .args(["--root", root_arg(repo.path())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
    assert!(!repo.path().join("Result.md").exists());
}

#[test]
fn config_file_selects_provider_and_rubric() {
    let repo = fixture_repo();
    let rubric = repo.path().join("rubric.yaml");
    fs::write(
        &rubric,
        "testing:\n  max_score: 4\n  description: Tests\n  criteria: [Unit tests]\n",
    )
    .unwrap();
    let config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    fs::write(
        config.path(),
        format!(
            "rubric = {:?}\n\n[llm]\nprovider = \"noop\"\n",
            rubric.to_str().unwrap()
        ),
    )
    .unwrap();

    command()
        .args([
            "--root",
            root_arg(repo.path()),
            "--config",
            config.path().to_str().unwrap(),
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_score\": 4"))
        .stdout(predicate::str::contains("\"score_source\": \"default\""));
}

#[test]
fn fail_on_missing_score_exits_non_zero() {
    let repo = fixture_repo();
    command()
        .args([
            "--root",
            root_arg(repo.path()),
            "--provider",
            "noop",
            "--fail-on-missing-score",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not extract a score"));
    assert!(!repo.path().join("Result.md").exists());
}

#[test]
fn missing_root_is_reported() {
    let repo = fixture_repo();
    let missing = repo.path().join("nope");
    command()
        .args(["--root", missing.to_str().unwrap(), "--provider", "noop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a directory"));
}
