use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const QRIS_PAYLOAD: &str = "00020101021126710024ID.CO.MANDIRISYARIAH.WWW0118936004510000003986021000000039860303URE51440014ID.CO.QRIS.WWW0215ID10200567891230303URE5204599953033605802ID5919MASJID JABAL ARAFAH6005BATAM62070703A0163047AC1";

#[test]
fn test_inspect_prints_merchant_record() {
    let mut cmd = Command::new(cargo_bin!("qriskit"));
    cmd.args(["inspect", QRIS_PAYLOAD]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("MASJID JABAL ARAFAH"))
        .stdout(predicate::str::contains("BATAM"))
        .stdout(predicate::str::contains("936004510000003986"));
}

#[test]
fn test_validate_reports_domestic_and_checksum() {
    let mut cmd = Command::new(cargo_bin!("qriskit"));
    cmd.args(["validate", QRIS_PAYLOAD]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("qris-domestic"))
        .stdout(predicate::str::contains("\"checksumValid\": true"));
}

#[test]
fn test_validate_rejects_malformed_payload() {
    let mut cmd = Command::new(cargo_bin!("qriskit"));
    cmd.args(["validate", "definitely not a payload"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("malformed payload"));
}

#[test]
fn test_pay_injects_amount_and_revalidates() {
    let mut cmd = Command::new(cargo_bin!("qriskit"));
    cmd.args([
        "pay",
        QRIS_PAYLOAD,
        "--amount",
        "50000",
        "--fee",
        "1000",
        "--fee-type",
        "flat",
    ]);

    let output = cmd.assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["amount"], "51000");
    let payload = json["payload"].as_str().unwrap();
    assert!(payload.contains("540551000"));
    assert!(qriskit::checksum::verify(payload));
}

#[test]
fn test_pay_percentage_fee() {
    let mut cmd = Command::new(cargo_bin!("qriskit"));
    cmd.args([
        "pay",
        QRIS_PAYLOAD,
        "--amount",
        "50000",
        "--fee",
        "1",
        "--fee-type",
        "percentage",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"amount\": \"50500\""));
}

#[test]
fn test_pay_rejects_zero_amount() {
    let mut cmd = Command::new(cargo_bin!("qriskit"));
    cmd.args(["pay", QRIS_PAYLOAD, "--amount", "0"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid amount"));
}

#[test]
fn test_pay_rejects_non_emv_payload() {
    // decodable, but the first field is not the payload format indicator
    let mut cmd = Command::new(cargo_bin!("qriskit"));
    cmd.args(["pay", "010211000201630454F2", "--amount", "50000"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unsupported format"));
}

#[test]
fn test_pay_rejects_unknown_fee_type() {
    let mut cmd = Command::new(cargo_bin!("qriskit"));
    cmd.args([
        "pay",
        QRIS_PAYLOAD,
        "--amount",
        "50000",
        "--fee-type",
        "tiered",
    ]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown fee type"));
}
