use serde::{Deserialize, Serialize};
use winconfig_provider::{DnsRecord, RecordType, Zone, ZoneType};

/// What a DNS info query returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoKind {
    /// Zones with their records, plus the flat record list.
    #[default]
    All,
    /// Zones only.
    Zone,
    /// Flat record list.
    Record,
}

const fn default_filter_ad() -> bool {
    true
}

/// Read-only DNS query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DnsInfoQuery {
    #[serde(rename = "type", default)]
    pub kind: InfoKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_type: Option<ZoneType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<RecordType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_name: Option<String>,
    /// Hide Active Directory infrastructure records.
    #[serde(default = "default_filter_ad")]
    pub filter_ad: bool,
}

impl Default for DnsInfoQuery {
    fn default() -> Self {
        Self {
            kind: InfoKind::All,
            zone_name: None,
            zone_type: None,
            record_type: None,
            record_name: None,
            filter_ad: true,
        }
    }
}

/// Zone entry of an info report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneInfo {
    #[serde(flatten)]
    pub zone: Zone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_records: Option<Vec<DnsRecord>>,
}

/// Result of a DNS info query. `changed` is always false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsInfoReport {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<ZoneInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<DnsRecord>>,
}
