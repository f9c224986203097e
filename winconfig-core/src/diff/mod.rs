//! 差异计算引擎
//!
//! Pure functions from (declared, current) state to a [`ReconcilePlan`].
//! Nothing here touches the remote host.

mod certificate;
mod records;
mod zone;

pub use certificate::{CertificateMatch, matches_request, select_certificate};
pub use records::{diff_record_set, diff_records};
pub use zone::{ZoneDrift, classify, plan_zone};

use winconfig_provider::{DnsRecord, Zone};

use crate::types::{DesiredZone, Operation, ReconcilePlan, ResourceState};

/// Full plan for a zone declaration.
///
/// `current_records` is ignored when the zone is created or recreated, since
/// the new zone starts empty. Deleting a zone plans no record operations.
pub fn plan_zone_reconcile(
    desired: &DesiredZone,
    current: Option<&Zone>,
    current_records: &[DnsRecord],
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();
    let zone_op = plan_zone(&desired.zone, desired.state, current);

    if desired.state == ResourceState::Absent {
        plan.extend(zone_op);
        return plan;
    }

    let starts_empty = matches!(
        zone_op,
        Some(Operation::CreateZone { .. } | Operation::RecreateZone { .. })
    );
    plan.extend(zone_op);

    if let Some(records) = &desired.records {
        let base: &[DnsRecord] = if starts_empty { &[] } else { current_records };
        plan.extend(diff_records(records, base, desired.purge_records));
    }
    plan
}
