//! Zone 协调服务

use std::sync::Arc;

use winconfig_provider::RecordFilter;

use crate::applier::Applier;
use crate::diff::plan_zone_reconcile;
use crate::error::CoreResult;
use crate::reader::RemoteStateReader;
use crate::reporter::{zone_report, zone_snapshot};
use crate::session::Session;
use crate::types::{ZoneDeclaration, ZoneReport};
use crate::validation::validate_zone;

/// Zone 协调服务
pub struct ZoneService {
    session: Arc<Session>,
}

impl ZoneService {
    #[must_use]
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Brings a zone, and its records when declared, to the declared state.
    pub async fn reconcile(&self, decl: &ZoneDeclaration) -> CoreResult<ZoneReport> {
        let desired = validate_zone(decl)?;
        self.session.ensure_open()?;
        let reader = RemoteStateReader::new(&self.session);
        let name = desired.zone.name.as_str();

        let current = reader.zone(name).await?;
        let current_records = match (&current, &desired.records) {
            (Some(_), Some(_)) => Some(reader.records(name, &RecordFilter::default()).await?),
            (None, Some(_)) => Some(Vec::new()),
            _ => None,
        };
        let plan = plan_zone_reconcile(
            &desired,
            current.as_ref(),
            current_records.as_deref().unwrap_or_default(),
        );

        if plan.is_empty() {
            log::debug!("[{}] zone {name} is up to date", self.session.host());
            return Ok(zone_report(Vec::new(), zone_snapshot(current, current_records)));
        }
        if self.session.check_mode() {
            log::info!(
                "[{}] check mode: {} operation(s) planned for zone {name}",
                self.session.host(),
                plan.operations.len()
            );
            let planned = plan.ordered().into_iter().cloned().collect();
            return Ok(zone_report(planned, zone_snapshot(current, current_records)));
        }

        let outcome = Applier::new(&self.session).apply(&plan).await?;

        let zone = reader.zone(name).await?;
        let records = match (&zone, &desired.records) {
            (Some(_), Some(_)) => Some(reader.records(name, &RecordFilter::default()).await?),
            _ => None,
        };
        Ok(zone_report(outcome.applied, zone_snapshot(zone, records)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use serde_json::json;
    use winconfig_provider::{DnsRecord, DynamicUpdate, RecordData, ReplicationScope, ZoneType};

    use super::*;
    use crate::config::SessionConfig;
    use crate::error::CoreError;
    use crate::test_utils::{a_record, create_test_session, create_test_session_with, primary_zone};
    use crate::types::{Operation, RecreateReason, ResourceState};
    use crate::validation::from_json;

    #[tokio::test]
    async fn pinner_zone_is_created_once() {
        let (session, dns, _store, _ca) = create_test_session();
        let service = ZoneService::new(session);
        let decl: ZoneDeclaration = from_json(json!({
            "name": "pinner.euc.vmware.com",
            "type": "primary",
            "replication": "domain",
            "state": "present"
        }))
        .unwrap();

        let first = service.reconcile(&decl).await.unwrap();
        assert!(first.changed);
        assert!(!first.destructive);
        assert_eq!(first.operations.len(), 1);
        assert!(matches!(first.operations[0], Operation::CreateZone { .. }));
        let snapshot = first.zone.clone().unwrap();
        assert_eq!(snapshot.zone.name, "pinner.euc.vmware.com");
        assert_eq!(snapshot.zone.zone_type, ZoneType::Primary);
        assert_eq!(snapshot.zone.replication, ReplicationScope::Domain);
        assert_eq!(snapshot.zone.dynamic_update, DynamicUpdate::Secure);
        assert_eq!(snapshot.state, ResourceState::Present);

        let second = service.reconcile(&decl).await.unwrap();
        assert!(!second.changed);
        assert!(second.operations.is_empty());
        assert_eq!(second.zone, first.zone);
        assert_eq!(dns.mutation_count().await, 1);
    }

    #[tokio::test]
    async fn dynamic_update_change_is_modified_in_place() {
        let (session, dns, _store, _ca) = create_test_session();
        dns.insert_zone(primary_zone("example.com")).await;
        let mut decl = ZoneDeclaration::new("example.com");
        decl.dynamic_update = DynamicUpdate::NonsecureAndSecure;

        let report = ZoneService::new(session).reconcile(&decl).await.unwrap();
        assert!(report.changed);
        assert!(!report.destructive);
        assert!(matches!(report.operations[..], [Operation::ModifyZone { .. }]));
        assert_eq!(
            dns.zone("example.com").await.unwrap().dynamic_update,
            DynamicUpdate::NonsecureAndSecure
        );
    }

    #[tokio::test]
    async fn forwarder_servers_change_is_modified_in_place() {
        let (session, dns, _store, _ca) = create_test_session();
        let mut current = primary_zone("partner.example");
        current.zone_type = ZoneType::Forwarder;
        current.dns_servers = vec!["10.230.50.21".parse().unwrap()];
        dns.insert_zone(current).await;

        let decl: ZoneDeclaration = from_json(json!({
            "name": "partner.example",
            "type": "forwarder",
            "dns_servers": ["10.230.50.21", "10.230.50.22"]
        }))
        .unwrap();
        let report = ZoneService::new(session).reconcile(&decl).await.unwrap();
        assert!(matches!(report.operations[..], [Operation::ModifyZone { .. }]));
        assert_eq!(report.zone.unwrap().zone.dns_servers.len(), 2);
        assert!(dns.calls().await.iter().all(|c| !c.starts_with("delete_zone")));
    }

    #[tokio::test]
    async fn forwarder_with_default_dynamic_update_is_stable() {
        let (session, dns, _store, _ca) = create_test_session();
        let mut current = primary_zone("partner.example");
        current.zone_type = ZoneType::Forwarder;
        current.dynamic_update = DynamicUpdate::None;
        current.dns_servers = vec!["10.230.50.21".parse().unwrap()];
        dns.insert_zone(current).await;

        let decl: ZoneDeclaration = from_json(json!({
            "name": "partner.example",
            "type": "forwarder",
            "dns_servers": ["10.230.50.21"]
        }))
        .unwrap();
        let report = ZoneService::new(session).reconcile(&decl).await.unwrap();
        assert!(!report.changed);
        assert!(report.operations.is_empty());
        assert_eq!(dns.mutation_count().await, 0);
    }

    #[tokio::test]
    async fn type_change_recreates_the_zone() {
        let (session, dns, _store, _ca) = create_test_session();
        dns.insert_zone(primary_zone("example.com")).await;
        dns.insert_record(a_record("example.com", "www", "192.0.2.10", 3600))
            .await;

        let decl: ZoneDeclaration = from_json(json!({
            "name": "example.com",
            "type": "stub",
            "dns_servers": ["192.0.2.53"]
        }))
        .unwrap();
        let report = ZoneService::new(session).reconcile(&decl).await.unwrap();
        assert!(report.changed);
        assert!(report.destructive);
        assert!(matches!(
            report.operations[..],
            [Operation::RecreateZone {
                reason: RecreateReason::TypeChange,
                ..
            }]
        ));
        assert_eq!(report.zone.unwrap().zone.zone_type, ZoneType::Stub);
        assert!(dns.records().await.is_empty());
    }

    #[tokio::test]
    async fn declared_records_are_converged_and_reported() {
        let (session, dns, _store, _ca) = create_test_session();
        dns.insert_zone(primary_zone("example.com")).await;
        dns.insert_record(a_record("example.com", "old", "192.0.2.99", 3600))
            .await;
        dns.insert_record(DnsRecord::new(
            "example.com",
            "_ldap._tcp",
            600,
            RecordData::TXT {
                text: "dc01".to_string(),
            },
        ))
        .await;

        let decl: ZoneDeclaration = from_json(json!({
            "name": "example.com",
            "records": [
                {"name": "www", "type": "A", "value": "192.0.2.10"},
                {"name": "@", "type": "MX", "value": "10 mail.example.com", "ttl": 600}
            ],
            "purge_records": true
        }))
        .unwrap();
        let service = ZoneService::new(session);
        let report = service.reconcile(&decl).await.unwrap();
        assert!(report.changed);
        assert_eq!(report.operations.len(), 3);
        assert!(matches!(report.operations[0], Operation::RemoveRecord { .. }));

        let records = report.zone.unwrap().records.unwrap();
        let fqdns: Vec<_> = records.iter().map(|r| r.fqdn.as_str()).collect();
        assert_eq!(fqdns, vec!["example.com", "www.example.com"]);

        // AD node survives the purge but is not reported
        assert_eq!(dns.records().await.len(), 3);

        let again = service.reconcile(&decl).await.unwrap();
        assert!(!again.changed);
    }

    #[tokio::test]
    async fn absent_zone_is_deleted() {
        let (session, dns, _store, _ca) = create_test_session();
        dns.insert_zone(primary_zone("example.com")).await;
        let mut decl = ZoneDeclaration::new("example.com");
        decl.state = ResourceState::Absent;

        let service = ZoneService::new(session);
        let report = service.reconcile(&decl).await.unwrap();
        assert!(report.changed && report.destructive);
        assert!(report.zone.is_none());

        let again = service.reconcile(&decl).await.unwrap();
        assert!(!again.changed);
    }

    #[tokio::test]
    async fn check_mode_never_mutates() {
        let (session, dns, _store, _ca) =
            create_test_session_with(SessionConfig::new("dc01").with_check_mode(true));
        dns.insert_zone(primary_zone("example.com")).await;
        let mut decl = ZoneDeclaration::new("example.com");
        decl.zone_type = ZoneType::Secondary;
        decl.dns_servers = vec!["192.0.2.53".parse().unwrap()];

        let report = ZoneService::new(session).reconcile(&decl).await.unwrap();
        assert!(report.changed);
        assert!(report.destructive);
        assert_eq!(report.zone.unwrap().zone.zone_type, ZoneType::Primary);
        assert_eq!(dns.mutation_count().await, 0);
    }

    #[tokio::test]
    async fn invalid_declaration_makes_no_remote_calls() {
        let (session, dns, _store, _ca) = create_test_session();
        let decl: ZoneDeclaration = from_json(json!({
            "name": "example.com",
            "records": [{"name": "sip", "type": "SRV", "value": "0 5 5060 sip.example.com"}]
        }))
        .unwrap();
        let err = ZoneService::new(session).reconcile(&decl).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(dns.calls().await.is_empty());
    }
}
