use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("notescribe")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("transcribe"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("backends"));
}

#[test]
fn backends_lists_engines_and_sources() {
    Command::cargo_bin("notescribe")
        .unwrap()
        .arg("backends")
        .assert()
        .success()
        .stdout(predicate::str::contains("Whisper"))
        .stdout(predicate::str::contains("Google Speech"))
        .stdout(predicate::str::contains("webm"));
}

#[test]
fn transcribe_requires_an_input() {
    Command::cargo_bin("notescribe")
        .unwrap()
        .arg("transcribe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("URL_OR_FILE"));
}

#[test]
fn unknown_method_is_rejected() {
    Command::cargo_bin("notescribe")
        .unwrap()
        .args(["transcribe", "dQw4w9WgXcQ", "--method", "azure"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("possible values"));
}
