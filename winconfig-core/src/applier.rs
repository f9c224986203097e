//! 计划执行器
//!
//! Executes a [`ReconcilePlan`] in phase order. Every zone operation is guarded
//! by a fresh read of the zone; any failure stops the apply and reports what
//! was already done.

use winconfig_provider::{StoreDescriptor, Zone, thumbprint};

use crate::error::{CoreError, CoreResult};
use crate::reader::RemoteStateReader;
use crate::session::Session;
use crate::types::{Operation, ReconcilePlan};

/// What an apply actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Operations confirmed by the host, in execution order.
    pub applied: Vec<Operation>,
    /// Thumbprint of a certificate issued during this apply.
    pub issued_thumbprint: Option<String>,
}

impl ApplyOutcome {
    /// At least one applied operation mutated remote state.
    pub fn changed(&self) -> bool {
        self.applied.iter().any(Operation::is_mutating)
    }
}

/// Failure of a single operation. `partial` lists side effects that were
/// confirmed before it failed (the delete half of a recreate).
struct StepError {
    partial: Vec<Operation>,
    source: CoreError,
}

impl From<CoreError> for StepError {
    fn from(source: CoreError) -> Self {
        Self {
            partial: Vec::new(),
            source,
        }
    }
}

/// 计划执行器
pub struct Applier<'a> {
    session: &'a Session,
}

impl<'a> Applier<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn apply(&self, plan: &ReconcilePlan) -> CoreResult<ApplyOutcome> {
        self.session.ensure_open()?;
        let mut outcome = ApplyOutcome::default();

        for op in plan.ordered() {
            if !op.is_mutating() {
                outcome.applied.push(op.clone());
                continue;
            }

            match self.execute(op).await {
                Ok(issued) => {
                    log::info!("[{}] {op}", self.session.host());
                    if issued.is_some() {
                        outcome.issued_thumbprint = issued;
                    }
                    outcome.applied.push(op.clone());
                }
                Err(StepError { partial, source }) => {
                    log::error!(
                        "[{}] {op} failed after {} completed operation(s): {source}",
                        self.session.host(),
                        outcome.applied.len() + partial.len()
                    );
                    let mut completed = outcome.applied;
                    completed.extend(partial);
                    return Err(CoreError::ApplyFailed {
                        completed,
                        failed: Box::new(op.clone()),
                        source: Box::new(source),
                    });
                }
            }
        }

        Ok(outcome)
    }

    /// Runs one operation. Returns the new thumbprint for an issuance.
    async fn execute(&self, op: &Operation) -> Result<Option<String>, StepError> {
        match op {
            Operation::CreateZone { zone } => {
                self.expect_zone(&zone.name, None).await?;
                self.create_zone(zone).await?;
            }
            Operation::ModifyZone { from, to } => {
                self.expect_zone(&from.name, Some(from)).await?;
                let server = self.session.dns_server()?;
                self.session
                    .call(&format!("modify zone {}", to.name), server.modify_zone(to))
                    .await?;
            }
            Operation::RecreateZone { from, to, .. } => {
                self.expect_zone(&from.name, Some(from)).await?;
                self.delete_zone(&from.name).await?;
                if let Err(source) = self.create_zone(to).await {
                    log::error!(
                        "[{}] zone {} was deleted but could not be created again",
                        self.session.host(),
                        to.name
                    );
                    return Err(StepError {
                        partial: vec![Operation::DeleteZone { zone: from.clone() }],
                        source,
                    });
                }
            }
            Operation::DeleteZone { zone } => {
                self.expect_zone(&zone.name, Some(zone)).await?;
                self.delete_zone(&zone.name).await?;
            }
            Operation::AddRecord { record } => {
                let server = self.session.dns_server()?;
                self.session
                    .call(&format!("add record {}", record.fqdn), server.add_record(record))
                    .await?;
            }
            Operation::UpdateRecord { to, .. } => {
                let server = self.session.dns_server()?;
                self.session
                    .call(&format!("update record {}", to.fqdn), server.update_record(to))
                    .await?;
            }
            Operation::RemoveRecord { record } => {
                let server = self.session.dns_server()?;
                self.session
                    .call(
                        &format!("remove record {}", record.fqdn),
                        server.remove_record(record),
                    )
                    .await?;
            }
            Operation::ReuseCertificate { .. } => {}
            Operation::IssueCertificate { request } => {
                let authority = self.session.certificate_authority()?;
                let store = self.session.certificate_store()?;
                let issued = self
                    .session
                    .call(
                        &format!("certificate request for {}", request.subject_name),
                        authority.submit(request),
                    )
                    .await
                    .map_err(|e| with_template(e, request.template.as_ref()))?;
                let descriptor: &StoreDescriptor = &request.store;
                self.session
                    .call(
                        &format!("import certificate into {descriptor}"),
                        store.import_certificate(descriptor, &issued),
                    )
                    .await?;
                return Ok(Some(thumbprint(&issued.der)));
            }
        }
        Ok(None)
    }

    /// Conflict guard: the zone must still be in the state the plan was computed against.
    async fn expect_zone(&self, name: &str, expected: Option<&Zone>) -> CoreResult<()> {
        let current = RemoteStateReader::new(self.session).zone(name).await?;
        if current.as_ref() == expected {
            return Ok(());
        }
        let detail = match (expected, current) {
            (None, Some(_)) => format!("zone '{name}' was created by someone else"),
            (Some(_), None) => format!("zone '{name}' disappeared"),
            _ => format!("zone '{name}' changed"),
        };
        Err(CoreError::Conflict(format!("{detail} since the plan was computed")))
    }

    async fn create_zone(&self, zone: &Zone) -> CoreResult<()> {
        let server = self.session.dns_server()?;
        self.session
            .call(&format!("create zone {}", zone.name), server.create_zone(zone))
            .await
    }

    async fn delete_zone(&self, name: &str) -> CoreResult<()> {
        let server = self.session.dns_server()?;
        self.session
            .call(&format!("delete zone {name}"), server.delete_zone(name))
            .await
    }
}

/// Fills in the requested template when the authority did not name one.
fn with_template(err: CoreError, requested: Option<&String>) -> CoreError {
    match err {
        CoreError::Issuance {
            template: None,
            detail,
        } => CoreError::Issuance {
            template: requested.cloned(),
            detail,
        },
        other => other,
    }
}
