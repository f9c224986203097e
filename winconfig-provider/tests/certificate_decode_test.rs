//! 证书解码集成测试（基于 testdata/certs 夹具）

mod common;

use common::stored;
use winconfig_provider::{Certificate, StoreDescriptor, StoreLocation, thumbprint};

#[test]
fn decodes_every_fixture() {
    let store = StoreDescriptor {
        name: "WebHosting".to_string(),
        location: StoreLocation::LocalMachine,
    };
    for (name, expected_thumbprint) in [
        ("issuing_ca.der", "0A2E930F7D5B0818E6C0E9AB2B2B87982802CFE7"),
        ("web_zollo.der", "01E636B617081FD64AF079D71D5A2DFDB3615001"),
        ("web_zollo_older.der", "DBA4DA114FECEB83558741285D41129AC9E6F882"),
        ("web_zollo_www.der", "8008AEE01F94BCE576EA8DA1A1D1316AD6F1FE5A"),
    ] {
        let cert = require_ok!(
            Certificate::from_stored(&stored(name, true), &store),
            "decoding {name}"
        );
        assert_eq!(cert.thumbprint, expected_thumbprint, "{name}");
        assert_eq!(cert.store_name, "WebHosting");
    }
}

#[test]
fn same_request_different_issuance_dates() {
    let store = StoreDescriptor::default();
    let older = require_ok!(Certificate::from_stored(
        &stored("web_zollo_older.der", true),
        &store
    ));
    let newer = require_ok!(Certificate::from_stored(
        &stored("web_zollo.der", true),
        &store
    ));

    assert_eq!(older.dns_name_set(), newer.dns_name_set());
    assert_eq!(older.issued_to, newer.issued_to);
    assert_eq!(older.template, newer.template);
    assert!(older.valid_from < newer.valid_from);
    assert_ne!(older.thumbprint, newer.thumbprint);
    assert_eq!(older.serial_number, "1000");
    assert_eq!(newer.serial_number, "1001");
}

#[test]
fn usability_depends_on_key_and_expiry() {
    let store = StoreDescriptor::default();
    let with_key = require_ok!(Certificate::from_stored(
        &stored("web_zollo.der", true),
        &store
    ));
    let without_key = require_ok!(Certificate::from_stored(
        &stored("web_zollo.der", false),
        &store
    ));

    let now = require_some!(chrono::DateTime::from_timestamp(1_767_225_600, 0)); // 2026-01-01
    let after_expiry = require_some!(chrono::DateTime::from_timestamp(2_082_758_400, 0)); // 2036-01-01

    assert!(with_key.is_usable(now));
    assert!(!without_key.is_usable(now));
    assert!(with_key.is_expired(after_expiry));
    assert!(!with_key.is_usable(after_expiry));
}

#[test]
fn snapshot_serializes_rfc3339_validity() {
    let cert = require_ok!(Certificate::from_stored(
        &stored("web_zollo.der", true),
        &StoreDescriptor::default()
    ));
    let json = require_ok!(serde_json::to_value(&cert));
    assert_eq!(json["valid_from"], "2025-01-01T00:00:00Z");
    assert_eq!(json["store_location"], "LocalMachine");
    assert_eq!(json["thumbprint"], thumbprint(&common::fixture("web_zollo.der")));
}
