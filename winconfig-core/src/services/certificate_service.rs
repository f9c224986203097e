//! 证书协调服务

use std::sync::Arc;

use winconfig_provider::{StoreDescriptor, StoreLocation};

use crate::applier::Applier;
use crate::diff::select_certificate;
use crate::error::{CoreError, CoreResult};
use crate::reader::RemoteStateReader;
use crate::reporter::{certificate_list_report, certificate_report};
use crate::session::Session;
use crate::types::{
    CertificateDeclaration, CertificateListReport, CertificateReport, Operation, ReconcilePlan,
};
use crate::validation::validate_certificate;

/// 证书协调服务
pub struct CertificateService {
    session: Arc<Session>,
}

impl CertificateService {
    #[must_use]
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Reuses a matching certificate or requests a new one.
    ///
    /// Matching certificates that are not selected are reported as orphans and
    /// left in the store.
    pub async fn reconcile(&self, decl: &CertificateDeclaration) -> CoreResult<CertificateReport> {
        let request = validate_certificate(decl)?;
        self.session.ensure_open()?;
        let reader = RemoteStateReader::new(&self.session);

        let existing = reader.certificates(&request.store).await?;
        let found = select_certificate(&existing, &request, self.session.now());
        for orphan in &found.orphans {
            log::warn!(
                "[{}] orphaned certificate {} in {} matches {}",
                self.session.host(),
                orphan.thumbprint,
                request.store,
                request.subject_name
            );
        }

        if let Some(selected) = &found.selected {
            log::debug!(
                "[{}] reusing certificate {} for {}",
                self.session.host(),
                selected.thumbprint,
                request.subject_name
            );
            let reuse = Operation::ReuseCertificate {
                thumbprint: selected.thumbprint.clone(),
            };
            return Ok(certificate_report(vec![reuse], &found.orphans, Some(selected)));
        }

        self.session.certificate_authority()?;
        let store = request.store.clone();
        let plan = ReconcilePlan::new(vec![Operation::IssueCertificate { request }]);

        if self.session.check_mode() {
            log::info!(
                "[{}] check mode: a new certificate would be issued into {store}",
                self.session.host()
            );
            return Ok(certificate_report(plan.operations, &found.orphans, None));
        }

        let outcome = Applier::new(&self.session).apply(&plan).await?;
        let Some(thumbprint) = outcome.issued_thumbprint.as_deref() else {
            return Err(CoreError::Conflict(
                "certificate authority returned no certificate".to_string(),
            ));
        };
        let issued = reader
            .certificates(&store)
            .await?
            .into_iter()
            .find(|c| c.thumbprint == thumbprint)
            .ok_or_else(|| {
                CoreError::Conflict(format!(
                    "issued certificate {thumbprint} not found in {store} after import"
                ))
            })?;
        Ok(certificate_report(
            outcome.applied,
            &found.orphans,
            Some(&issued),
        ))
    }

    /// Every certificate of a store, sorted by thumbprint.
    pub async fn list(
        &self,
        store_name: &str,
        store_location: StoreLocation,
    ) -> CoreResult<CertificateListReport> {
        let name = store_name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("store_name must not be empty"));
        }
        self.session.ensure_open()?;
        let store = StoreDescriptor {
            name: name.to_string(),
            location: store_location,
        };
        let certificates = RemoteStateReader::new(&self.session)
            .certificates(&store)
            .await?;
        Ok(certificate_list_report(certificates))
    }
}
