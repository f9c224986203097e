//! Zone state machine.

use winconfig_provider::Zone;

use crate::types::{Operation, RecreateReason, ResourceState};

/// Classification of a present zone against its declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneDrift {
    Matching,
    /// Attributes differ but can be changed in place.
    Modifiable,
    /// Only a delete-then-recreate reaches the declared state.
    RequiresRecreate(RecreateReason),
}

/// Compares a present zone with the declared one.
///
/// Master servers are compared, in order, only for zone types that use them.
/// The dynamic update setting is compared only for primary and secondary zones.
pub fn classify(desired: &Zone, current: &Zone) -> ZoneDrift {
    if desired.zone_type != current.zone_type {
        return ZoneDrift::RequiresRecreate(RecreateReason::TypeChange);
    }
    if desired.replication.is_ad_integrated() != current.replication.is_ad_integrated() {
        return ZoneDrift::RequiresRecreate(RecreateReason::StorageChange);
    }

    let servers_differ =
        desired.zone_type.requires_master_servers() && desired.dns_servers != current.dns_servers;
    let updates_differ = desired.zone_type.accepts_dynamic_update()
        && desired.dynamic_update != current.dynamic_update;
    if desired.replication != current.replication || updates_differ || servers_differ
    {
        ZoneDrift::Modifiable
    } else {
        ZoneDrift::Matching
    }
}

/// The zone-level operation, if any, that moves `current` to the declaration.
pub fn plan_zone(desired: &Zone, state: ResourceState, current: Option<&Zone>) -> Option<Operation> {
    match (state, current) {
        (ResourceState::Absent, None) => None,
        (ResourceState::Absent, Some(current)) => Some(Operation::DeleteZone {
            zone: current.clone(),
        }),
        (ResourceState::Present, None) => Some(Operation::CreateZone {
            zone: desired.clone(),
        }),
        (ResourceState::Present, Some(current)) => match classify(desired, current) {
            ZoneDrift::Matching => None,
            ZoneDrift::Modifiable => Some(Operation::ModifyZone {
                from: current.clone(),
                to: desired.clone(),
            }),
            ZoneDrift::RequiresRecreate(reason) => Some(Operation::RecreateZone {
                from: current.clone(),
                to: desired.clone(),
                reason,
            }),
        },
    }
}
