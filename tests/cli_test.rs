mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn stockhold() -> Command {
    let mut cmd = Command::new(cargo_bin!("stockhold"));
    cmd.env_remove("RUST_LOG")
        .args(["--payment-latency-ms", "0"]);
    cmd
}

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let products = common::write_products(
        dir.path(),
        &[["1", "widget", "100", "3"], ["2", "gadget", "2.50", "10"]],
    )?;
    let commands = common::write_commands(
        dir.path(),
        &[
            ["add", "alice", "1", "2"],
            ["add", "alice", "2", "4"],
            ["checkout", "alice", "", ""],
            ["add", "bob", "2", "1"],
            ["checkout", "bob", "", ""],
        ],
    )?;

    stockhold()
        .arg(&products)
        .arg(&commands)
        // alice and bob both buy product 2 concurrently
        .args(["--payment-failure-rate", "0", "--serialize-reservations"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id,name,price,stock\n"))
        .stdout(predicate::str::contains("1,widget,100,1"))
        .stdout(predicate::str::contains("2,gadget,2.5,5"));

    Ok(())
}

#[test]
fn test_cli_declined_payments_keep_stock() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let products = common::write_products(dir.path(), &[["1", "widget", "100", "3"]])?;
    let commands = common::write_commands(
        dir.path(),
        &[["add", "alice", "1", "3"], ["checkout", "alice", "", ""]],
    )?;

    stockhold()
        .arg(&products)
        .arg(&commands)
        .args(["--payment-failure-rate", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Error processing command"))
        .stderr(predicate::str::contains("payment failed"))
        .stdout(predicate::str::contains("1,widget,100,3"));

    Ok(())
}

#[test]
fn test_cli_add_beyond_stock_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let products = common::write_products(dir.path(), &[["1", "widget", "100", "3"]])?;
    let commands = common::write_commands(
        dir.path(),
        &[
            ["add", "alice", "1", "2"],
            ["add", "alice", "1", "2"],
            ["checkout", "alice", "", ""],
        ],
    )?;

    stockhold()
        .arg(&products)
        .arg(&commands)
        .args(["--payment-failure-rate", "0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("insufficient stock of product 1"))
        .stdout(predicate::str::contains("1,widget,100,1"));

    Ok(())
}

#[test]
fn test_cli_json_seed() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let products = dir.path().join("products.json");
    std::fs::write(
        &products,
        r#"[{"id": 7, "name": "lamp", "price": "12.75", "stock": 2}]"#,
    )?;
    let commands = common::write_commands(
        dir.path(),
        &[["add", "carol", "7", "2"], ["checkout", "carol", "", ""]],
    )?;

    stockhold()
        .arg(&products)
        .arg(&commands)
        .args(["--payment-failure-rate", "0", "--log-json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("\"message\":\"checkout completed\""))
        .stdout(predicate::str::contains("7,lamp,12.75,0"));

    Ok(())
}

#[test]
fn test_cli_serialized_reservations_refuse_oversubscription() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let products = common::write_products(dir.path(), &[["1", "widget", "100", "3"]])?;
    let commands = common::write_commands(
        dir.path(),
        &[
            ["add", "alice", "1", "2"],
            ["add", "bob", "1", "2"],
            ["checkout", "alice", "", ""],
            ["checkout", "bob", "", ""],
        ],
    )?;

    Command::new(cargo_bin!("stockhold"))
        .env_remove("RUST_LOG")
        .arg(&products)
        .arg(&commands)
        .args([
            "--payment-failure-rate",
            "0",
            "--payment-latency-ms",
            "50",
            "--serialize-reservations",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("insufficient stock of product 1"))
        .stdout(predicate::str::contains("1,widget,100,1"));

    Ok(())
}

#[test]
fn test_cli_missing_seed_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let commands = common::write_commands(dir.path(), &[["checkout", "alice", "", ""]])?;

    stockhold()
        .arg(dir.path().join("missing.csv"))
        .arg(&commands)
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not open seed file"));

    Ok(())
}

#[test]
fn test_cli_rejects_bad_failure_rate() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let products = common::write_products(dir.path(), &[["1", "widget", "100", "3"]])?;
    let commands = common::write_commands(dir.path(), &[])?;

    stockhold()
        .arg(&products)
        .arg(&commands)
        .args(["--payment-failure-rate", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("payment failure rate"));

    Ok(())
}
