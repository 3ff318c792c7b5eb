//! Integration tests for the classify command

use assert_cmd::Command;
use predicates::prelude::*;

fn tripledger_cmd() -> Command {
    Command::cargo_bin("tripledger").unwrap()
}

#[test]
fn test_classify_japanese_beverage() {
    let mut cmd = tripledger_cmd();
    cmd.arg("classify").arg("コーヒー");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("beverage / coffee"));
}

#[test]
fn test_classify_transport_with_subcategory() {
    let mut cmd = tripledger_cmd();
    cmd.arg("classify").arg("新幹線切符");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("transport / train"));
}

#[test]
fn test_classify_unknown_is_other() {
    let mut cmd = tripledger_cmd();
    cmd.arg("classify").arg("xyzzy");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("other"));
}

#[test]
fn test_classify_joins_multiple_words() {
    let mut cmd = tripledger_cmd();
    cmd.arg("classify").arg("grande").arg("latte");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("beverage / coffee"));
}

#[test]
fn test_classify_requires_a_name() {
    let mut cmd = tripledger_cmd();
    cmd.arg("classify");

    cmd.assert().failure();
}
