//! Remote state reader
//!
//! Selector-based reads over the session backends. A selector that matches
//! nothing yields an empty result, never an error.

use winconfig_provider::{
    Certificate, DnsRecord, RecordFilter, StoreDescriptor, Zone, ZoneFilter, normalize_hostname,
};

use crate::error::CoreResult;
use crate::session::Session;

/// Label prefixes of Active Directory service locator nodes.
const AD_LABEL_PREFIXES: [&str; 4] = ["_msdcs", "_sites", "_tcp", "_udp"];
/// Application partition nodes created by AD-integrated DNS.
const AD_PARTITION_LABELS: [&str; 2] = ["domaindnszones", "forestdnszones"];

/// Whether the record lives on an Active Directory infrastructure node.
///
/// Only labels below the zone apex count, so records in a zone such as
/// `_msdcs.example.com` are not all treated as infrastructure.
pub fn is_ad_infrastructure_node(record: &DnsRecord) -> bool {
    if record.fqdn == record.zone {
        return false;
    }
    let apex = format!(".{}", record.zone);
    let relative = record
        .fqdn
        .strip_suffix(apex.as_str())
        .unwrap_or(record.name.as_str());
    relative.split('.').any(|label| {
        let label = label.to_ascii_lowercase();
        AD_LABEL_PREFIXES.iter().any(|p| label.starts_with(p))
            || AD_PARTITION_LABELS.contains(&label.as_str())
    })
}

/// Drops Active Directory infrastructure records.
pub fn filter_ad_records(records: Vec<DnsRecord>) -> Vec<DnsRecord> {
    records
        .into_iter()
        .filter(|r| !is_ad_infrastructure_node(r))
        .collect()
}

fn normalize_zone(mut zone: Zone) -> Zone {
    zone.name = normalize_hostname(&zone.name);
    zone
}

fn normalize_record(record: DnsRecord) -> DnsRecord {
    DnsRecord::new(&record.zone, &record.name, record.ttl, record.data)
}

/// 远端状态读取器
pub struct RemoteStateReader<'a> {
    session: &'a Session,
}

impl<'a> RemoteStateReader<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn zones(&self, filter: &ZoneFilter) -> CoreResult<Vec<Zone>> {
        let server = self.session.dns_server()?;
        let zones = self
            .session
            .call("list zones", server.list_zones(filter))
            .await?;
        log::debug!("[{}] read {} zone(s)", self.session.host(), zones.len());
        Ok(zones.into_iter().map(normalize_zone).collect())
    }

    /// Current state of one zone, `None` when absent.
    pub async fn zone(&self, name: &str) -> CoreResult<Option<Zone>> {
        let name = normalize_hostname(name);
        let zones = self.zones(&ZoneFilter::by_name(&name)).await?;
        Ok(zones.into_iter().find(|z| z.name == name))
    }

    pub async fn records(&self, zone: &str, filter: &RecordFilter) -> CoreResult<Vec<DnsRecord>> {
        let server = self.session.dns_server()?;
        let records = self
            .session
            .call(
                &format!("list records in {zone}"),
                server.list_records(zone, filter),
            )
            .await?;
        log::debug!(
            "[{}] read {} record(s) from {zone}",
            self.session.host(),
            records.len()
        );
        Ok(records
            .into_iter()
            .map(normalize_record)
            .filter(|r| filter.matches(r))
            .collect())
    }

    /// `all` mode: zones and their records in one pass.
    pub async fn zones_with_records(
        &self,
        zone_filter: &ZoneFilter,
        record_filter: &RecordFilter,
    ) -> CoreResult<Vec<(Zone, Vec<DnsRecord>)>> {
        let server = self.session.dns_server()?;
        let all = self
            .session
            .call(
                "list zones with records",
                server.list_zones_with_records(zone_filter, record_filter),
            )
            .await?;
        log::debug!(
            "[{}] read {} zone(s) with records",
            self.session.host(),
            all.len()
        );
        Ok(all
            .into_iter()
            .map(|(zone, records)| {
                let records = records
                    .into_iter()
                    .map(normalize_record)
                    .filter(|r| record_filter.matches(r))
                    .collect();
                (normalize_zone(zone), records)
            })
            .collect())
    }

    /// Decoded certificates of a store. Undecodable entries are skipped.
    pub async fn certificates(&self, store: &StoreDescriptor) -> CoreResult<Vec<Certificate>> {
        let backend = self.session.certificate_store()?;
        let stored = self
            .session
            .call(
                &format!("list certificates in {store}"),
                backend.list_certificates(store),
            )
            .await?;

        let mut certificates = Vec::with_capacity(stored.len());
        for entry in &stored {
            match Certificate::from_stored(entry, store) {
                Ok(cert) => certificates.push(cert),
                Err(e) => log::warn!("[{}] skipping certificate in {store}: {e}", self.session.host()),
            }
        }
        log::debug!(
            "[{}] read {} certificate(s) from {store}",
            self.session.host(),
            certificates.len()
        );
        Ok(certificates)
    }
}
