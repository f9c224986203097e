//! Record set diff.

use winconfig_provider::DnsRecord;

use crate::reader::is_ad_infrastructure_node;
use crate::types::{DesiredRecordSet, Operation, ResourceState};

/// Operations that bring `current` in line with `desired`.
///
/// Records are matched on (zone, name, type, data). A TTL difference becomes an
/// update. With `purge`, current records that are not declared are removed,
/// except Active Directory infrastructure records.
pub fn diff_records(desired: &[DnsRecord], current: &[DnsRecord], purge: bool) -> Vec<Operation> {
    let mut ops = Vec::new();

    for want in desired {
        match current.iter().find(|have| have.same_identity(want)) {
            None => ops.push(Operation::AddRecord {
                record: want.clone(),
            }),
            Some(have) if have.ttl != want.ttl => ops.push(Operation::UpdateRecord {
                from: have.clone(),
                to: want.clone(),
            }),
            Some(_) => {}
        }
    }

    if purge {
        ops.extend(
            current
                .iter()
                .filter(|have| !desired.iter().any(|want| want.same_identity(have)))
                .filter(|have| !is_ad_infrastructure_node(have))
                .map(|have| Operation::RemoveRecord {
                    record: have.clone(),
                }),
        );
    }

    ops
}

/// Diff for a standalone (zone, name, type) declaration.
///
/// `current` must already be restricted to that owner and type. A present set
/// is authoritative for its owner and type. An absent set removes the listed
/// values, or every record when none are listed.
pub fn diff_record_set(desired: &DesiredRecordSet, current: &[DnsRecord]) -> Vec<Operation> {
    match desired.state {
        ResourceState::Present => diff_records(&desired.records, current, true),
        ResourceState::Absent => current
            .iter()
            .filter(|have| {
                desired.records.is_empty()
                    || desired.records.iter().any(|want| want.same_identity(have))
            })
            .map(|have| Operation::RemoveRecord {
                record: have.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use winconfig_provider::{RecordData, RecordType};

    use super::*;
    use crate::test_utils::a_record;

    fn set(state: ResourceState, records: Vec<DnsRecord>) -> DesiredRecordSet {
        DesiredRecordSet {
            zone: "example.com".to_string(),
            name: "www".to_string(),
            record_type: RecordType::A,
            records,
            state,
        }
    }

    #[test]
    fn identical_sets_produce_nothing() {
        let records = vec![
            a_record("example.com", "www", "192.0.2.10", 3600),
            a_record("example.com", "www", "192.0.2.11", 3600),
        ];
        assert!(diff_records(&records, &records, true).is_empty());
    }

    #[test]
    fn missing_record_is_added() {
        let desired = vec![a_record("example.com", "www", "192.0.2.10", 3600)];
        let ops = diff_records(&desired, &[], false);
        assert_eq!(
            ops,
            vec![Operation::AddRecord {
                record: desired[0].clone()
            }]
        );
    }

    #[test]
    fn ttl_change_is_an_update_not_a_replace() {
        let current = vec![a_record("example.com", "www", "192.0.2.10", 600)];
        let desired = vec![a_record("example.com", "www", "192.0.2.10", 3600)];
        let ops = diff_records(&desired, &current, true);
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            Operation::UpdateRecord { from, to } => {
                assert_eq!(from.ttl, 600);
                assert_eq!(to.ttl, 3600);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn value_change_adds_and_purges() {
        let current = vec![a_record("example.com", "www", "192.0.2.10", 3600)];
        let desired = vec![a_record("example.com", "www", "192.0.2.20", 3600)];

        let ops = diff_records(&desired, &current, true);
        assert!(matches!(ops[0], Operation::AddRecord { .. }));
        assert!(matches!(ops[1], Operation::RemoveRecord { .. }));

        let ops = diff_records(&desired, &current, false);
        assert_eq!(ops.len(), 1);
    }

    #[test]
    fn purge_keeps_ad_records() {
        let srv_node = DnsRecord::new(
            "example.com",
            "_ldap._tcp",
            600,
            RecordData::TXT {
                text: "dc01".to_string(),
            },
        );
        let stale = a_record("example.com", "old", "192.0.2.99", 3600);
        let ops = diff_records(&[], &[srv_node, stale.clone()], true);
        assert_eq!(ops, vec![Operation::RemoveRecord { record: stale }]);
    }

    #[test]
    fn matching_is_case_insensitive_on_hostnames() {
        let current = vec![DnsRecord::new(
            "example.com",
            "alias",
            3600,
            RecordData::CNAME {
                target: "Web.Example.com.".to_string(),
            },
        )];
        let desired = vec![DnsRecord::new(
            "EXAMPLE.COM",
            "ALIAS",
            3600,
            RecordData::CNAME {
                target: "web.example.com".to_string(),
            },
        )];
        assert!(diff_records(&desired, &current, true).is_empty());
    }

    #[test]
    fn absent_set_removes_everything_or_listed_values() {
        let current = vec![
            a_record("example.com", "www", "192.0.2.10", 3600),
            a_record("example.com", "www", "192.0.2.11", 3600),
        ];

        let ops = diff_record_set(&set(ResourceState::Absent, vec![]), &current);
        assert_eq!(ops.len(), 2);

        let listed = vec![a_record("example.com", "www", "192.0.2.11", 60)];
        let ops = diff_record_set(&set(ResourceState::Absent, listed), &current);
        assert_eq!(
            ops,
            vec![Operation::RemoveRecord {
                record: current[1].clone()
            }]
        );
    }

    #[test]
    fn present_set_is_authoritative_for_its_owner() {
        let current = vec![a_record("example.com", "www", "192.0.2.10", 3600)];
        let desired = set(
            ResourceState::Present,
            vec![a_record("example.com", "www", "192.0.2.20", 3600)],
        );
        let ops = diff_record_set(&desired, &current);
        assert_eq!(ops.len(), 2);
        assert!(ops.iter().any(|op| matches!(op, Operation::RemoveRecord { .. })));
    }
}
