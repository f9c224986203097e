//! DNS 信息查询服务（只读）

use std::sync::Arc;

use winconfig_provider::DnsRecord;

use crate::error::CoreResult;
use crate::reader::{RemoteStateReader, filter_ad_records};
use crate::reporter::info_report;
use crate::session::Session;
use crate::types::{DnsInfoQuery, DnsInfoReport, InfoKind, ZoneInfo};
use crate::validation::validate_info_query;

/// DNS 信息查询服务
pub struct DnsInfoService {
    session: Arc<Session>,
}

impl DnsInfoService {
    #[must_use]
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Reads zones and/or records. Never mutates and always reports `changed=false`.
    pub async fn query(&self, query: &DnsInfoQuery) -> CoreResult<DnsInfoReport> {
        let (zone_filter, record_filter) = validate_info_query(query)?;
        self.session.ensure_open()?;
        let reader = RemoteStateReader::new(&self.session);

        let keep = |records: Vec<DnsRecord>| {
            if query.filter_ad {
                filter_ad_records(records)
            } else {
                records
            }
        };

        match query.kind {
            InfoKind::Zone => {
                let zones = reader
                    .zones(&zone_filter)
                    .await?
                    .into_iter()
                    .map(|zone| ZoneInfo {
                        zone,
                        dns_records: None,
                    })
                    .collect();
                Ok(info_report(Some(zones), None))
            }
            InfoKind::Record => {
                let records = reader
                    .zones_with_records(&zone_filter, &record_filter)
                    .await?
                    .into_iter()
                    .flat_map(|(_, records)| keep(records))
                    .collect();
                Ok(info_report(None, Some(records)))
            }
            InfoKind::All => {
                let mut flat = Vec::new();
                let zones = reader
                    .zones_with_records(&zone_filter, &record_filter)
                    .await?
                    .into_iter()
                    .map(|(zone, records)| {
                        let records = keep(records);
                        flat.extend(records.iter().cloned());
                        ZoneInfo {
                            zone,
                            dns_records: Some(records),
                        }
                    })
                    .collect();
                Ok(info_report(Some(zones), Some(flat)))
            }
        }
    }
}
