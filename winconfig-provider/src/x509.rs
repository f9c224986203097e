//! X.509 decoding for certificates read out of a Windows certificate store.
//!
//! Field names and rendered values follow what `certutil` / the certificate MMC
//! snap-in display, so reports read the same as the host's own tooling.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use sha1::{Digest, Sha1};
use x509_parser::certificate::X509Certificate;
use x509_parser::der_parser::asn1_rs::{
    BmpString, Error as DerError, FromDer, ParseResult, Sequence,
};
use x509_parser::extensions::{
    ExtendedKeyUsage, GeneralName, KeyUsage, ParsedExtension, X509Extension,
};
use x509_parser::nom::Err as NomErr;
use x509_parser::oid_registry::Oid;
use x509_parser::parse_x509_certificate;
use x509_parser::x509::X509Name;

use crate::types::{Certificate, CertificateExtension, StoreDescriptor, StoredCertificate};

/// Microsoft "Certificate Template Name" (v1 templates), a BMPString.
const OID_MS_TEMPLATE_NAME: &str = "1.3.6.1.4.1.311.20.2";
/// Microsoft "Certificate Template Information" (v2+ templates).
const OID_MS_TEMPLATE_INFO: &str = "1.3.6.1.4.1.311.21.7";

/// Error raised when a stored blob is not a decodable certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateDecodeError {
    /// SHA-1 of the offending blob, so the entry can still be identified.
    pub thumbprint: String,
    pub detail: String,
}

impl std::fmt::Display for CertificateDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Certificate {} could not be decoded: {}",
            self.thumbprint, self.detail
        )
    }
}

impl std::error::Error for CertificateDecodeError {}

/// SHA-1 of the DER encoding, upper-case hex.
pub fn thumbprint(der: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(der))
}

impl Certificate {
    /// Decodes a stored certificate into a full snapshot.
    pub fn from_stored(
        stored: &StoredCertificate,
        store: &StoreDescriptor,
    ) -> Result<Self, CertificateDecodeError> {
        let thumbprint = thumbprint(&stored.der);
        let decode_error = |detail: String| CertificateDecodeError {
            thumbprint: thumbprint.clone(),
            detail,
        };

        let (_, cert) =
            parse_x509_certificate(&stored.der).map_err(|e| decode_error(e.to_string()))?;

        let valid_from = to_utc(cert.validity().not_before.timestamp())
            .ok_or_else(|| decode_error("notBefore out of range".to_string()))?;
        let valid_to = to_utc(cert.validity().not_after.timestamp())
            .ok_or_else(|| decode_error("notAfter out of range".to_string()))?;

        let dns_names = san_dns_names(&cert);
        let issued_to = first_common_name(cert.subject())
            .or_else(|| dns_names.first().cloned())
            .unwrap_or_default();
        let issued_by = first_common_name(cert.issuer()).unwrap_or_default();

        let mut is_ca = false;
        let mut path_length_constraint = None;
        let mut key_usages = Vec::new();
        let mut intended_purposes = Vec::new();
        let mut ski = None;
        let mut template_name = None;
        let mut template_oid = None;
        let mut extensions = Vec::with_capacity(cert.extensions().len());

        for ext in cert.extensions() {
            match ext.parsed_extension() {
                ParsedExtension::BasicConstraints(bc) => {
                    is_ca = bc.ca;
                    path_length_constraint = bc.path_len_constraint;
                }
                ParsedExtension::KeyUsage(ku) => {
                    key_usages = key_usage_flags(ku)
                        .into_iter()
                        .map(|(flag, _)| flag.to_string())
                        .collect();
                }
                ParsedExtension::ExtendedKeyUsage(eku) => {
                    intended_purposes = eku_purposes(eku)
                        .into_iter()
                        .map(|(name, _)| name)
                        .collect();
                }
                ParsedExtension::SubjectKeyIdentifier(kid) => {
                    ski = Some(hex::encode_upper(kid.0));
                }
                _ => match ext.oid.to_id_string().as_str() {
                    OID_MS_TEMPLATE_NAME => {
                        template_name = decode_template_name(ext.value)
                            .inspect_err(|e| log::debug!("Unreadable template name: {e}"))
                            .ok();
                    }
                    OID_MS_TEMPLATE_INFO => {
                        template_oid = decode_template_info(ext.value)
                            .inspect_err(|e| log::debug!("Unreadable template information: {e}"))
                            .ok()
                            .map(|info| info.oid);
                    }
                    _ => {}
                },
            }
            extensions.push(render_extension(ext));
        }

        Ok(Self {
            store_name: store.name.clone(),
            store_location: store.location,
            thumbprint,
            subject: windows_dn(cert.subject()),
            issuer: windows_dn(cert.issuer()),
            issued_to,
            issued_by,
            friendly_name: stored.friendly_name.clone(),
            dns_names,
            valid_from,
            valid_to,
            is_ca,
            has_private_key: stored.has_private_key,
            key_usages,
            intended_purposes,
            path_length_constraint,
            ski,
            serial_number: hex::encode_upper(cert.raw_serial()),
            signature_algorithm: signature_algorithm_name(&cert.signature_algorithm.algorithm),
            version: cert.version().0 + 1,
            public_key: BASE64.encode(cert.public_key().raw),
            cert_data: BASE64.encode(&stored.der),
            extensions,
            archived: stored.archived,
            template: template_name.or(template_oid),
        })
    }
}

fn to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn san_dns_names(cert: &X509Certificate<'_>) -> Vec<String> {
    cert.subject_alternative_name()
        .ok()
        .flatten()
        .map(|ext| {
            ext.value
                .general_names
                .iter()
                .filter_map(|name| match name {
                    GeneralName::DNSName(dns) => Some((*dns).to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn first_common_name(name: &X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(String::from)
}

fn attribute_short_name(oid: &Oid<'_>) -> String {
    match oid.to_id_string().as_str() {
        "2.5.4.3" => "CN".to_string(),
        "2.5.4.6" => "C".to_string(),
        "2.5.4.7" => "L".to_string(),
        "2.5.4.8" => "S".to_string(),
        "2.5.4.10" => "O".to_string(),
        "2.5.4.11" => "OU".to_string(),
        "1.2.840.113549.1.9.1" => "E".to_string(),
        "0.9.2342.19200300.100.1.25" => "DC".to_string(),
        other => format!("OID.{other}"),
    }
}

/// Distinguished name with the most specific RDN first, as Windows prints it.
fn windows_dn(name: &X509Name<'_>) -> String {
    let mut parts: Vec<String> = name
        .iter_rdn()
        .flat_map(|rdn| {
            rdn.iter().map(|attr| {
                format!(
                    "{}={}",
                    attribute_short_name(attr.attr_type()),
                    attr.as_str().unwrap_or_default()
                )
            })
        })
        .collect();
    parts.reverse();
    parts.join(", ")
}

fn signature_algorithm_name(oid: &Oid<'_>) -> String {
    let id = oid.to_id_string();
    let name = match id.as_str() {
        "1.2.840.113549.1.1.4" => "md5RSA",
        "1.2.840.113549.1.1.5" => "sha1RSA",
        "1.2.840.113549.1.1.10" => "RSASSA-PSS",
        "1.2.840.113549.1.1.11" => "sha256RSA",
        "1.2.840.113549.1.1.12" => "sha384RSA",
        "1.2.840.113549.1.1.13" => "sha512RSA",
        "1.2.840.10045.4.1" => "sha1ECDSA",
        "1.2.840.10045.4.3.2" => "sha256ECDSA",
        "1.2.840.10045.4.3.3" => "sha384ECDSA",
        "1.2.840.10045.4.3.4" => "sha512ECDSA",
        _ => return id,
    };
    name.to_string()
}

/// `(flag name, display name)` pairs in bit order.
fn key_usage_flags(ku: &KeyUsage) -> Vec<(&'static str, &'static str)> {
    [
        (ku.digital_signature(), "DigitalSignature", "Digital Signature"),
        (ku.non_repudiation(), "NonRepudiation", "Non-Repudiation"),
        (ku.key_encipherment(), "KeyEncipherment", "Key Encipherment"),
        (ku.data_encipherment(), "DataEncipherment", "Data Encipherment"),
        (ku.key_agreement(), "KeyAgreement", "Key Agreement"),
        (ku.key_cert_sign(), "KeyCertSign", "Certificate Signing"),
        (ku.crl_sign(), "CrlSign", "CRL Signing"),
        (ku.encipher_only(), "EncipherOnly", "Encipher Only"),
        (ku.decipher_only(), "DecipherOnly", "Decipher Only"),
    ]
    .into_iter()
    .filter(|(set, _, _)| *set)
    .map(|(_, flag, display)| (flag, display))
    .collect()
}

fn known_purpose(oid: &str) -> Option<&'static str> {
    Some(match oid {
        "2.5.29.37.0" => "Any Purpose",
        "1.3.6.1.5.5.7.3.1" => "Server Authentication",
        "1.3.6.1.5.5.7.3.2" => "Client Authentication",
        "1.3.6.1.5.5.7.3.3" => "Code Signing",
        "1.3.6.1.5.5.7.3.4" => "Secure Email",
        "1.3.6.1.5.5.7.3.8" => "Time Stamping",
        "1.3.6.1.5.5.7.3.9" => "OCSP Signing",
        "1.3.6.1.4.1.311.10.3.4" => "Encrypting File System",
        "1.3.6.1.4.1.311.20.2.2" => "Smart Card Logon",
        "1.3.6.1.5.5.8.2.2" => "IP security IKE intermediate",
        _ => return None,
    })
}

/// `(friendly name, oid)` pairs.
fn eku_purposes(eku: &ExtendedKeyUsage<'_>) -> Vec<(String, String)> {
    let flagged = [
        (eku.any, "2.5.29.37.0"),
        (eku.server_auth, "1.3.6.1.5.5.7.3.1"),
        (eku.client_auth, "1.3.6.1.5.5.7.3.2"),
        (eku.code_signing, "1.3.6.1.5.5.7.3.3"),
        (eku.email_protection, "1.3.6.1.5.5.7.3.4"),
        (eku.time_stamping, "1.3.6.1.5.5.7.3.8"),
        (eku.ocsp_signing, "1.3.6.1.5.5.7.3.9"),
    ]
    .into_iter()
    .filter(|(set, _)| *set)
    .map(|(_, oid)| oid.to_string());

    flagged
        .chain(eku.other.iter().map(Oid::to_id_string))
        .map(|oid| {
            let name = known_purpose(&oid).map_or_else(|| oid.clone(), str::to_string);
            (name, oid)
        })
        .collect()
}

fn extension_field_name(oid: &str) -> Option<&'static str> {
    Some(match oid {
        "2.5.29.14" => "Subject Key Identifier",
        "2.5.29.15" => "Key Usage",
        "2.5.29.17" => "Subject Alternative Name",
        "2.5.29.19" => "Basic Constraints",
        "2.5.29.31" => "CRL Distribution Points",
        "2.5.29.32" => "Certificate Policies",
        "2.5.29.35" => "Authority Key Identifier",
        "2.5.29.37" => "Enhanced Key Usage",
        "1.3.6.1.5.5.7.1.1" => "Authority Information Access",
        "1.3.6.1.4.1.311.20.2" => "Certificate Template Name",
        "1.3.6.1.4.1.311.21.7" => "Certificate Template Information",
        "1.3.6.1.4.1.311.21.10" => "Application Policies",
        _ => return None,
    })
}

fn render_general_name(name: &GeneralName<'_>) -> String {
    match name {
        GeneralName::DNSName(dns) => format!("DNS Name={dns}"),
        GeneralName::RFC822Name(mail) => format!("RFC822 Name={mail}"),
        GeneralName::URI(uri) => format!("URL={uri}"),
        GeneralName::IPAddress(bytes) => format!("IP Address={}", render_ip(bytes)),
        other => format!("Other Name={other:?}"),
    }
}

fn render_ip(bytes: &[u8]) -> String {
    if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
        std::net::Ipv4Addr::from(v4).to_string()
    } else if let Ok(v6) = <[u8; 16]>::try_from(bytes) {
        std::net::Ipv6Addr::from(v6).to_string()
    } else {
        hex::encode(bytes)
    }
}

fn render_extension(ext: &X509Extension<'_>) -> CertificateExtension {
    let oid = ext.oid.to_id_string();
    let value = match ext.parsed_extension() {
        ParsedExtension::SubjectKeyIdentifier(kid) => hex::encode(kid.0),
        ParsedExtension::AuthorityKeyIdentifier(aki) => aki
            .key_identifier
            .as_ref()
            .map(|kid| format!("KeyID={}", hex::encode(kid.0)))
            .unwrap_or_default(),
        ParsedExtension::KeyUsage(ku) => {
            let names: Vec<_> = key_usage_flags(ku)
                .into_iter()
                .map(|(_, display)| display)
                .collect();
            // 首字节按 DER BIT STRING 顺序显示
            let first_byte = u8::try_from(ku.flags & 0xff).unwrap_or_default().reverse_bits();
            format!("{} ({first_byte:02x})", names.join(", "))
        }
        ParsedExtension::ExtendedKeyUsage(eku) => eku_purposes(eku)
            .into_iter()
            .map(|(name, oid)| format!("{name} ({oid})"))
            .collect::<Vec<_>>()
            .join(", "),
        ParsedExtension::BasicConstraints(bc) => format!(
            "Subject Type={}, Path Length Constraint={}",
            if bc.ca { "CA" } else { "End Entity" },
            bc.path_len_constraint
                .map_or_else(|| "None".to_string(), |n| n.to_string())
        ),
        ParsedExtension::SubjectAlternativeName(san) => san
            .general_names
            .iter()
            .map(render_general_name)
            .collect::<Vec<_>>()
            .join(", "),
        _ => match oid.as_str() {
            OID_MS_TEMPLATE_NAME => {
                decode_template_name(ext.value).unwrap_or_else(|_| hex::encode(ext.value))
            }
            OID_MS_TEMPLATE_INFO => decode_template_info(ext.value).map_or_else(
                |_| hex::encode(ext.value),
                |info| {
                    let mut out = format!(
                        "Template={}, Major Version Number={}",
                        info.oid, info.major
                    );
                    if let Some(minor) = info.minor {
                        out.push_str(&format!(", Minor Version Number={minor}"));
                    }
                    out
                },
            ),
            _ => hex::encode(ext.value),
        },
    };

    CertificateExtension {
        field: extension_field_name(&oid).map(str::to_string),
        value,
        critical: ext.critical,
    }
}

// ============ Microsoft template extensions ============

type DerResult<T> = Result<T, NomErr<DerError>>;

/// Certificate Template Name: a single BMPString.
fn decode_template_name(value: &[u8]) -> DerResult<String> {
    let (_, name) = BmpString::from_der(value)?;
    Ok(name.string())
}

#[derive(Debug)]
struct TemplateInfo {
    oid: String,
    major: u32,
    minor: Option<u32>,
}

/// Certificate Template Information:
/// `SEQUENCE { templateID OID, majorVersion INTEGER, minorVersion INTEGER OPTIONAL }`.
fn decode_template_info(value: &[u8]) -> DerResult<TemplateInfo> {
    let (_, info) = Sequence::from_der_and_then(value, template_info_fields)?;
    Ok(info)
}

fn template_info_fields(i: &[u8]) -> ParseResult<'_, TemplateInfo> {
    let (i, oid) = Oid::from_der(i)?;
    let (i, major) = u32::from_der(i)?;
    let (i, minor) = match u32::from_der(i) {
        Ok((rest, minor)) => (rest, Some(minor)),
        Err(_) => (i, None),
    };
    let info = TemplateInfo {
        oid: oid.to_id_string(),
        major,
        minor,
    };
    Ok((i, info))
}
