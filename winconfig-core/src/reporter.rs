//! 结果报告
//!
//! Builds the caller-facing reports from confirmed state. Nothing here reads
//! declared input back into a report.

use winconfig_provider::{Certificate, DnsRecord, Zone};

use crate::reader::filter_ad_records;
use crate::types::{
    CertificateListReport, CertificateReport, CertificateView, DnsInfoReport, Operation,
    RecordReport, ResourceState, ZoneInfo, ZoneReport, ZoneSnapshot,
};

/// Sorts records by (fqdn, type, data).
pub fn sort_records(records: &mut [DnsRecord]) {
    records.sort_by(|a, b| {
        a.fqdn
            .cmp(&b.fqdn)
            .then_with(|| a.record_type().cmp(&b.record_type()))
            .then_with(|| a.data.cmp(&b.data))
    });
}

fn is_change(operations: &[Operation]) -> bool {
    operations.iter().any(Operation::is_mutating)
}

/// Snapshot of a present zone. Records are reported only when managed, without
/// Active Directory infrastructure nodes.
pub fn zone_snapshot(zone: Option<Zone>, records: Option<Vec<DnsRecord>>) -> Option<ZoneSnapshot> {
    zone.map(|zone| ZoneSnapshot {
        zone,
        state: ResourceState::Present,
        records: records.map(|records| {
            let mut records = filter_ad_records(records);
            sort_records(&mut records);
            records
        }),
    })
}

pub fn zone_report(operations: Vec<Operation>, snapshot: Option<ZoneSnapshot>) -> ZoneReport {
    ZoneReport {
        changed: is_change(&operations),
        destructive: operations.iter().any(Operation::is_destructive),
        operations,
        zone: snapshot,
    }
}

pub fn record_report(operations: Vec<Operation>, mut records: Vec<DnsRecord>) -> RecordReport {
    sort_records(&mut records);
    RecordReport {
        changed: is_change(&operations),
        operations,
        records,
    }
}

pub fn certificate_report(
    operations: Vec<Operation>,
    orphans: &[Certificate],
    certificate: Option<&Certificate>,
) -> CertificateReport {
    CertificateReport {
        changed: is_change(&operations),
        operations,
        orphans: orphans.iter().map(|c| c.thumbprint.clone()).collect(),
        certificate: certificate.map(CertificateView::from),
    }
}

pub fn certificate_list_report(mut certificates: Vec<Certificate>) -> CertificateListReport {
    certificates.sort_by(|a, b| a.thumbprint.cmp(&b.thumbprint));
    CertificateListReport {
        changed: false,
        certificates: certificates.iter().map(CertificateView::from).collect(),
    }
}

/// Read-only info report. Zones sorted by name.
pub fn info_report(
    zones: Option<Vec<ZoneInfo>>,
    records: Option<Vec<DnsRecord>>,
) -> DnsInfoReport {
    DnsInfoReport {
        changed: false,
        zones: zones.map(|mut zones| {
            zones.sort_by(|a, b| a.zone.name.cmp(&b.zone.name));
            for info in &mut zones {
                if let Some(records) = info.dns_records.as_mut() {
                    sort_records(records);
                }
            }
            zones
        }),
        records: records.map(|mut records| {
            sort_records(&mut records);
            records
        }),
    }
}
