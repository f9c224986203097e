//! Certificate matching and reuse selection.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use winconfig_provider::{Certificate, EnrollmentRequest, normalize_hostname};

/// Outcome of matching a request against a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateMatch {
    /// Usable certificate to reuse. `None` means a new one must be issued.
    pub selected: Option<Certificate>,
    /// Matching certificates that were not selected, newest first.
    pub orphans: Vec<Certificate>,
}

fn looks_like_oid(value: &str) -> bool {
    value.contains('.') && value.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Templates are comparable only when both sides carry the same kind of
/// identifier. A v2 certificate records the template OID, not its name.
fn template_agrees(requested: Option<&str>, actual: Option<&str>) -> bool {
    match (requested, actual) {
        (Some(req), Some(act)) if looks_like_oid(req) == looks_like_oid(act) => {
            req.eq_ignore_ascii_case(act)
        }
        _ => true,
    }
}

/// Whether `cert` satisfies `request`: subject CN, exact dns-name set and
/// template (when tracked on both sides).
pub fn matches_request(cert: &Certificate, request: &EnrollmentRequest) -> bool {
    if !cert.issued_to.eq_ignore_ascii_case(&request.subject_name) {
        return false;
    }
    let requested: BTreeSet<String> = request
        .dns_names
        .iter()
        .map(|n| normalize_hostname(n))
        .collect();
    if cert.dns_name_set() != requested {
        return false;
    }
    template_agrees(request.template.as_deref(), cert.template.as_deref())
}

/// Picks the newest usable match; every other match is an orphan.
pub fn select_certificate(
    candidates: &[Certificate],
    request: &EnrollmentRequest,
    now: DateTime<Utc>,
) -> CertificateMatch {
    let mut matches: Vec<&Certificate> = candidates
        .iter()
        .filter(|c| matches_request(c, request))
        .collect();
    matches.sort_by(|a, b| b.valid_from.cmp(&a.valid_from));

    let mut result = CertificateMatch::default();
    for cert in matches {
        if result.selected.is_none() && cert.is_usable(now) {
            result.selected = Some(cert.clone());
        } else {
            result.orphans.push(cert.clone());
        }
    }
    result
}
