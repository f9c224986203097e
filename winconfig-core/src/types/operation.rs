//! Corrective operations produced by the diff engine.

use serde::Serialize;
use winconfig_provider::{DnsRecord, EnrollmentRequest, Zone};

/// Why a zone has to be deleted and created again instead of modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecreateReason {
    /// Zone type differs.
    TypeChange,
    /// Replication moves between file-backed and AD-integrated storage.
    StorageChange,
}

impl std::fmt::Display for RecreateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeChange => f.write_str("type_change"),
            Self::StorageChange => f.write_str("storage_change"),
        }
    }
}

/// Apply phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    ZoneUpsert,
    RecordRemove,
    RecordUpsert,
    ZoneDelete,
    CertificateIssue,
}

/// A single corrective operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateZone {
        zone: Zone,
    },
    ModifyZone {
        from: Zone,
        to: Zone,
    },
    /// Delete then create. Loses every record in the zone.
    RecreateZone {
        from: Zone,
        to: Zone,
        reason: RecreateReason,
    },
    DeleteZone {
        zone: Zone,
    },
    AddRecord {
        record: DnsRecord,
    },
    /// TTL change on an otherwise identical record.
    UpdateRecord {
        from: DnsRecord,
        to: DnsRecord,
    },
    RemoveRecord {
        record: DnsRecord,
    },
    /// An existing certificate already satisfies the request. Not a mutation.
    ReuseCertificate {
        thumbprint: String,
    },
    IssueCertificate {
        request: EnrollmentRequest,
    },
}

impl Operation {
    pub fn phase(&self) -> Phase {
        match self {
            Self::CreateZone { .. } | Self::ModifyZone { .. } | Self::RecreateZone { .. } => {
                Phase::ZoneUpsert
            }
            Self::RemoveRecord { .. } => Phase::RecordRemove,
            Self::AddRecord { .. } | Self::UpdateRecord { .. } => Phase::RecordUpsert,
            Self::DeleteZone { .. } => Phase::ZoneDelete,
            Self::ReuseCertificate { .. } | Self::IssueCertificate { .. } => {
                Phase::CertificateIssue
            }
        }
    }

    /// Delete-then-recreate and delete lose data.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::RecreateZone { .. } | Self::DeleteZone { .. })
    }

    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::ReuseCertificate { .. })
    }

    /// Zone the operation targets, if any.
    pub fn zone_name(&self) -> Option<&str> {
        match self {
            Self::CreateZone { zone } | Self::DeleteZone { zone } => Some(&zone.name),
            Self::ModifyZone { to, .. } | Self::RecreateZone { to, .. } => Some(&to.name),
            Self::AddRecord { record } | Self::RemoveRecord { record } => Some(&record.zone),
            Self::UpdateRecord { to, .. } => Some(&to.zone),
            Self::ReuseCertificate { .. } | Self::IssueCertificate { .. } => None,
        }
    }
}

fn describe_record(record: &DnsRecord) -> String {
    format!(
        "{} {} {}",
        record.fqdn,
        record.record_type(),
        record.data.display_value()
    )
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateZone { zone } => write!(f, "create zone {} ({})", zone.name, zone.zone_type),
            Self::ModifyZone { to, .. } => write!(f, "modify zone {}", to.name),
            Self::RecreateZone { to, reason, .. } => {
                write!(f, "recreate zone {} ({reason})", to.name)
            }
            Self::DeleteZone { zone } => write!(f, "delete zone {}", zone.name),
            Self::AddRecord { record } => write!(f, "add record {}", describe_record(record)),
            Self::UpdateRecord { from, to } => write!(
                f,
                "update record {} ttl {} -> {}",
                describe_record(to),
                from.ttl,
                to.ttl
            ),
            Self::RemoveRecord { record } => {
                write!(f, "remove record {}", describe_record(record))
            }
            Self::ReuseCertificate { thumbprint } => write!(f, "reuse certificate {thumbprint}"),
            Self::IssueCertificate { request } => write!(
                f,
                "issue certificate for {} [{}]",
                request.subject_name,
                request.dns_names.join(", ")
            ),
        }
    }
}

/// Ordered list of operations computed by the diff engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    pub operations: Vec<Operation>,
}

impl ReconcilePlan {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn extend(&mut self, ops: impl IntoIterator<Item = Operation>) {
        self.operations.extend(ops);
    }

    /// At least one operation would change remote state.
    pub fn is_change(&self) -> bool {
        self.operations.iter().any(Operation::is_mutating)
    }

    pub fn is_destructive(&self) -> bool {
        self.operations.iter().any(Operation::is_destructive)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations in execution order; the order within a phase is preserved.
    pub fn ordered(&self) -> Vec<&Operation> {
        let mut ops: Vec<&Operation> = self.operations.iter().collect();
        ops.sort_by_key(|op| op.phase());
        ops
    }
}
