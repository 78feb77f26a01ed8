use std::{
    path::PathBuf,
    process::{Command, Output},
};

use ethers::{
    types::Address,
    utils::{hex, Anvil},
};
use pretty_assertions::assert_eq;

fn fixture_artifacts() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../deployer/tests/fixtures/artifacts")
}

fn deployer(rpc_url: &str, artifacts: PathBuf) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_project-deployer"));

    cmd.current_dir(env!("CARGO_TARGET_TMPDIR"))
        .env_remove("DEPLOYER_PRIVATE_KEY")
        .env_remove("DEPLOYER_CONFIRMATIONS")
        .env_remove("MISC_LOG_FORMAT")
        .env_remove("MISC_SENTRY_URL")
        .env("DEPLOYER_RPC_URL", rpc_url)
        .env("DEPLOYER_ARTIFACTS_DIR", artifacts)
        .env("DEPLOYER_POLLING_INTERVAL_MS", "50");

    cmd
}

fn deployed_address(output: &Output) -> Address {
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    let lines: Vec<_> = stdout.lines().collect();

    assert_eq!(lines.len(), 2, "unexpected stdout {stdout}");
    assert_eq!(lines[0], "Deploying Project contract...");

    lines[1]
        .strip_prefix("Project contract deployed to: ")
        .and_then(|l| l.strip_suffix(" with platform fee: 5%"))
        .unwrap_or_else(|| panic!("unexpected report line {}", lines[1]))
        .parse()
        .unwrap()
}

#[test]
fn successful_runs_exit_zero_with_distinct_addresses() {
    let anvil = Anvil::new().spawn();

    let first = deployer(&anvil.endpoint(), fixture_artifacts())
        .output()
        .unwrap();
    let second = deployer(&anvil.endpoint(), fixture_artifacts())
        .output()
        .unwrap();

    assert_eq!(first.status.code(), Some(0));
    assert_eq!(second.status.code(), Some(0));

    let first = deployed_address(&first);
    let second = deployed_address(&second);

    assert_ne!(first, Address::zero());
    assert_ne!(first, second);
}

#[test]
fn deploys_with_private_key() {
    let anvil = Anvil::new().spawn();
    let key = hex::encode(anvil.keys()[2].to_bytes());

    let output = deployer(&anvil.endpoint(), fixture_artifacts())
        .env("DEPLOYER_PRIVATE_KEY", key)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    deployed_address(&output);
}

#[test]
fn missing_blueprint_exits_one() {
    let anvil = Anvil::new().spawn();
    let artifacts = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("no-such-artifacts");

    let output = deployer(&anvil.endpoint(), artifacts).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "Deploying Project contract...\n"
    );

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("resolving the blueprint"), "{stderr}");
    assert!(stderr.contains("no-such-artifacts"), "{stderr}");
}

#[test]
fn unreachable_node_exits_one() {
    let output = deployer("http://127.0.0.1:1", fixture_artifacts())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "Deploying Project contract...\n"
    );

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("connecting to the node"), "{stderr}");
}

#[test]
fn rejects_arguments() {
    let output = deployer("http://127.0.0.1:1", fixture_artifacts())
        .arg("--fee")
        .arg("7")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(!output.stderr.is_empty());
}

#[test]
fn rejects_positional_arguments() {
    let output = deployer("http://127.0.0.1:1", fixture_artifacts())
        .arg("extra")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(!output.stderr.is_empty());
}

#[test]
fn help_exits_zero() {
    let output = deployer("http://127.0.0.1:1", fixture_artifacts())
        .arg("--help")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(!output.stdout.is_empty());
}
