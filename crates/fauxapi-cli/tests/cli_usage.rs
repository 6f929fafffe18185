//! Argument and credential handling of the command-line programs.

use assert_cmd::Command;
use predicates::prelude::*;

const BINARIES: [&str; 2] = ["function-iterate", "update-aws-aliases"];

fn command(binary: &str) -> Command {
    let mut cmd = Command::cargo_bin(binary).unwrap();
    cmd.env_remove("FAUXAPI_APIKEY")
        .env_remove("FAUXAPI_APISECRET")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn missing_host_prints_usage_and_fails() {
    for binary in BINARIES {
        command(binary)
            .assert()
            .code(1)
            .stdout(predicate::str::contains(format!("usage: {binary} <host>")))
            .stdout(predicate::str::contains("FAUXAPI_APIKEY"));
    }
}

#[test]
fn missing_credentials_prints_usage_and_fails() {
    for binary in BINARIES {
        command(binary)
            .arg("192.168.1.200")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("MUST be set before use"));
    }
}

#[test]
fn missing_secret_alone_is_rejected() {
    command("function-iterate")
        .env("FAUXAPI_APIKEY", "PFFAyourkeyvalue")
        .arg("192.168.1.200")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAUXAPI_APISECRET"));
}

#[test]
fn unknown_flag_prints_usage() {
    command("update-aws-aliases")
        .args(["192.168.1.200", "--bogus"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("usage: update-aws-aliases <host>"));
}

#[test]
fn help_still_works() {
    command("update-aws-aliases")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--regions"))
        .stdout(predicate::str::contains("--no-ipv6"));
}

#[test]
fn extra_positional_argument_prints_usage() {
    command("function-iterate")
        .args(["192.168.1.200", "192.168.1.201"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("usage: function-iterate <host>"));
}
