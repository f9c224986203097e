//! DNS 记录协调服务

use std::sync::Arc;

use winconfig_provider::RecordFilter;

use crate::applier::Applier;
use crate::diff::diff_record_set;
use crate::error::{CoreError, CoreResult};
use crate::reader::RemoteStateReader;
use crate::reporter::record_report;
use crate::session::Session;
use crate::types::{RecordDeclaration, RecordReport, ReconcilePlan};
use crate::validation::validate_record_declaration;

/// DNS 记录协调服务
///
/// Manages every record of one (zone, name, type) in an existing zone.
pub struct RecordService {
    session: Arc<Session>,
}

impl RecordService {
    #[must_use]
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub async fn reconcile(&self, decl: &RecordDeclaration) -> CoreResult<RecordReport> {
        let desired = validate_record_declaration(decl)?;
        self.session.ensure_open()?;
        let reader = RemoteStateReader::new(&self.session);

        if reader.zone(&desired.zone).await?.is_none() {
            return Err(CoreError::NotFound {
                kind: "zone",
                name: desired.zone,
            });
        }

        let filter = RecordFilter {
            record_type: Some(desired.record_type),
            name: Some(desired.name.clone()),
        };
        let current = reader.records(&desired.zone, &filter).await?;
        let plan = ReconcilePlan::new(diff_record_set(&desired, &current));

        if plan.is_empty() {
            return Ok(record_report(Vec::new(), current));
        }
        if self.session.check_mode() {
            log::info!(
                "[{}] check mode: {} operation(s) planned for {} {} records",
                self.session.host(),
                plan.operations.len(),
                desired.name,
                desired.record_type
            );
            return Ok(record_report(plan.operations, current));
        }

        let outcome = Applier::new(&self.session).apply(&plan).await?;
        let records = reader.records(&desired.zone, &filter).await?;
        Ok(record_report(outcome.applied, records))
    }
}
