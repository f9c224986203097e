use serde::{Deserialize, Serialize};
use winconfig_provider::{DnsRecord, RecordType};

use super::operation::Operation;
use super::zone::ResourceState;

/// Default record TTL in seconds.
pub const DEFAULT_TTL: u32 = 3600;

/// A record inside a zone declaration.
///
/// `value` is untyped: a string for most types, or for MX either
/// `{"mail_exchange": ..., "priority": ...}` or `"10 mail.example.com"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordEntry {
    /// Relative label, `@` for the apex.
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

/// Standalone declaration managing every record of one (zone, name, type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordDeclaration {
    pub zone: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub state: ResourceState,
}

/// Validated record set declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredRecordSet {
    pub zone: String,
    pub name: String,
    pub record_type: RecordType,
    /// Declared records, normalized, with the effective TTL.
    pub records: Vec<DnsRecord>,
    pub state: ResourceState,
}

/// Result of a record set reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    pub changed: bool,
    pub operations: Vec<Operation>,
    /// Confirmed records for (zone, name, type), sorted by (fqdn, type, data).
    pub records: Vec<DnsRecord>,
}
