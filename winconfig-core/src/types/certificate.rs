use chrono::SecondsFormat;
use serde::{Deserialize, Deserializer, Serialize};
use winconfig_provider::{Certificate, CertificateExtension, StoreLocation};

use super::operation::Operation;

fn default_store_name() -> String {
    "My".to_string()
}

/// Accepts either a single string or a list of strings.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
    })
}

/// Certificate declaration as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertificateDeclaration {
    #[serde(default = "default_store_name")]
    pub store_name: String,
    #[serde(default)]
    pub store_location: StoreLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Subject common name. Defaults to the first dns name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    /// SAN DNS names. `dns_name` is accepted as an alias, as a string or a list.
    #[serde(default, alias = "dns_name", deserialize_with = "string_or_list")]
    pub dns_names: Vec<String>,
}

impl Default for CertificateDeclaration {
    fn default() -> Self {
        Self {
            store_name: default_store_name(),
            store_location: StoreLocation::default(),
            template: None,
            subject_name: None,
            dns_names: Vec::new(),
        }
    }
}

/// Certificate as reported: every derived field, validity in epoch seconds and ISO-8601.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateView {
    pub thumbprint: String,
    pub subject: String,
    pub issuer: String,
    pub issued_to: String,
    pub issued_by: String,
    pub friendly_name: String,
    pub dns_names: Vec<String>,
    pub valid_from: i64,
    pub valid_from_iso8601: String,
    pub valid_to: i64,
    pub valid_to_iso8601: String,
    pub is_ca: bool,
    pub has_private_key: bool,
    pub key_usages: Vec<String>,
    pub intended_purposes: Vec<String>,
    pub path_length_constraint: Option<u32>,
    pub ski: Option<String>,
    pub serial_number: String,
    pub signature_algorithm: String,
    pub version: u32,
    pub public_key: String,
    pub cert_data: String,
    pub extensions: Vec<CertificateExtension>,
    pub archived: bool,
    pub template: Option<String>,
    pub store_name: String,
    pub store_location: StoreLocation,
}

impl From<&Certificate> for CertificateView {
    fn from(cert: &Certificate) -> Self {
        Self {
            thumbprint: cert.thumbprint.clone(),
            subject: cert.subject.clone(),
            issuer: cert.issuer.clone(),
            issued_to: cert.issued_to.clone(),
            issued_by: cert.issued_by.clone(),
            friendly_name: cert.friendly_name.clone(),
            dns_names: cert.dns_names.clone(),
            valid_from: cert.valid_from.timestamp(),
            valid_from_iso8601: cert.valid_from.to_rfc3339_opts(SecondsFormat::Secs, true),
            valid_to: cert.valid_to.timestamp(),
            valid_to_iso8601: cert.valid_to.to_rfc3339_opts(SecondsFormat::Secs, true),
            is_ca: cert.is_ca,
            has_private_key: cert.has_private_key,
            key_usages: cert.key_usages.clone(),
            intended_purposes: cert.intended_purposes.clone(),
            path_length_constraint: cert.path_length_constraint,
            ski: cert.ski.clone(),
            serial_number: cert.serial_number.clone(),
            signature_algorithm: cert.signature_algorithm.clone(),
            version: cert.version,
            public_key: cert.public_key.clone(),
            cert_data: cert.cert_data.clone(),
            extensions: cert.extensions.clone(),
            archived: cert.archived,
            template: cert.template.clone(),
            store_name: cert.store_name.clone(),
            store_location: cert.store_location,
        }
    }
}

/// Result of a certificate reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateReport {
    pub changed: bool,
    pub operations: Vec<Operation>,
    /// Thumbprints of matching certificates that were not selected. Never removed.
    pub orphans: Vec<String>,
    /// `None` only in check mode when a certificate would be issued.
    pub certificate: Option<CertificateView>,
}

/// Result of listing a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateListReport {
    pub changed: bool,
    pub certificates: Vec<CertificateView>,
}
