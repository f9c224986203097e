use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use winconfig_provider::{DnsRecord, DynamicUpdate, ReplicationScope, Zone, ZoneType};

use super::operation::Operation;
use super::record::RecordEntry;

/// Declared presence of a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    #[default]
    Present,
    Absent,
}

/// Zone declaration as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneDeclaration {
    /// Fully qualified zone name.
    pub name: String,
    #[serde(rename = "type", default)]
    pub zone_type: ZoneType,
    #[serde(default)]
    pub dynamic_update: DynamicUpdate,
    #[serde(default)]
    pub state: ResourceState,
    #[serde(default)]
    pub replication: ReplicationScope,
    /// Master servers. Required for stub and forwarder zones, ignored otherwise.
    #[serde(default)]
    pub dns_servers: Vec<IpAddr>,
    /// Records owned by the zone. `None` leaves records unmanaged.
    #[serde(default)]
    pub records: Option<Vec<RecordEntry>>,
    /// Remove current records that are not declared.
    #[serde(default)]
    pub purge_records: bool,
}

impl ZoneDeclaration {
    /// Declaration with every option at its default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zone_type: ZoneType::default(),
            dynamic_update: DynamicUpdate::default(),
            state: ResourceState::default(),
            replication: ReplicationScope::default(),
            dns_servers: Vec::new(),
            records: None,
            purge_records: false,
        }
    }
}

/// Validated, normalized zone declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredZone {
    pub zone: Zone,
    pub state: ResourceState,
    pub records: Option<Vec<DnsRecord>>,
    pub purge_records: bool,
}

/// Confirmed zone state after apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneSnapshot {
    #[serde(flatten)]
    pub zone: Zone,
    pub state: ResourceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<DnsRecord>>,
}

/// Result of a zone reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneReport {
    pub changed: bool,
    /// A delete or delete-then-recreate was (or, in check mode, would be) applied.
    pub destructive: bool,
    pub operations: Vec<Operation>,
    /// `None` when the zone is absent.
    pub zone: Option<ZoneSnapshot>,
}
