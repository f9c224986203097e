use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============ Parsing ============

/// Error returned when a string does not name a known enum member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    /// Which enum was being parsed (e.g. `"zone type"`).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl std::fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

/// Normalizes a DNS name: trimmed, lower-case, without trailing dot.
pub fn normalize_hostname(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

// ============ Zone Types ============

/// Kind of DNS zone hosted by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    /// Authoritative, writable copy.
    #[default]
    Primary,
    /// Read-only copy transferred from a master.
    Secondary,
    /// Holds only the NS/SOA/glue of a delegated zone.
    Stub,
    /// Conditional forwarder.
    Forwarder,
}

impl ZoneType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Stub => "stub",
            Self::Forwarder => "forwarder",
        }
    }

    /// Stub zones and forwarders are useless without master servers.
    pub fn requires_master_servers(self) -> bool {
        matches!(self, Self::Stub | Self::Forwarder)
    }

    /// Whether the zone's dynamic update setting means anything.
    /// Stub zones and forwarders hold no records of their own to update.
    pub fn accepts_dynamic_update(self) -> bool {
        matches!(self, Self::Primary | Self::Secondary)
    }
}

impl std::fmt::Display for ZoneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            "stub" => Ok(Self::Stub),
            "forwarder" => Ok(Self::Forwarder),
            _ => Err(ParseEnumError {
                kind: "zone type",
                value: s.to_string(),
            }),
        }
    }
}

/// Which clients may register records dynamically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicUpdate {
    /// Only authenticated (Kerberos) updates.
    #[default]
    Secure,
    /// Dynamic updates disabled.
    None,
    /// Any client may update.
    NonsecureAndSecure,
}

impl DynamicUpdate {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Secure => "secure",
            Self::None => "none",
            Self::NonsecureAndSecure => "nonsecureandsecure",
        }
    }
}

impl std::fmt::Display for DynamicUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DynamicUpdate {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "secure" => Ok(Self::Secure),
            "none" => Ok(Self::None),
            "nonsecureandsecure" => Ok(Self::NonsecureAndSecure),
            _ => Err(ParseEnumError {
                kind: "dynamic update mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Where the zone data lives.
///
/// `None` means a file-backed zone; the other scopes store the zone in an
/// Active Directory partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicationScope {
    /// All DNS servers in the forest.
    #[default]
    Forest,
    /// All DNS servers in the domain.
    Domain,
    /// All domain controllers in the domain (Windows 2000 compatible).
    Legacy,
    /// Not AD-integrated.
    None,
}

impl ReplicationScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forest => "forest",
            Self::Domain => "domain",
            Self::Legacy => "legacy",
            Self::None => "none",
        }
    }

    pub fn is_ad_integrated(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for ReplicationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplicationScope {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forest" => Ok(Self::Forest),
            "domain" => Ok(Self::Domain),
            "legacy" => Ok(Self::Legacy),
            "none" => Ok(Self::None),
            _ => Err(ParseEnumError {
                kind: "replication scope",
                value: s.to_string(),
            }),
        }
    }
}

/// A DNS zone as reported by the server.
///
/// Records are read separately, see [`DnsServer::list_records`](crate::DnsServer::list_records).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Fully qualified zone name, lower-case, no trailing dot.
    pub name: String,
    /// Zone kind.
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub dynamic_update: DynamicUpdate,
    pub replication: ReplicationScope,
    /// Master servers, in order. Only meaningful for stub and forwarder zones.
    #[serde(default)]
    pub dns_servers: Vec<IpAddr>,
}

/// Selector for zone reads. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_type: Option<ZoneType>,
}

impl ZoneFilter {
    /// Selects exactly one zone by name.
    pub fn by_name(name: &str) -> Self {
        Self {
            name: Some(normalize_hostname(name)),
            zone_type: None,
        }
    }

    pub fn matches(&self, zone: &Zone) -> bool {
        let name_ok = self
            .name
            .as_deref()
            .is_none_or(|n| normalize_hostname(n) == zone.name);
        let type_ok = self.zone_type.is_none_or(|t| t == zone.zone_type);
        name_ok && type_ok
    }
}

// ============ DNS Record Types ============

/// DNS record type identifier.
///
/// Serialized as uppercase strings (`"A"`, `"AAAA"`, `"CNAME"`, etc.).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address record.
    A,
    /// IPv6 address record.
    Aaaa,
    /// Mail exchange record.
    Mx,
    /// Canonical name (alias) record.
    Cname,
    /// Reverse lookup pointer.
    Ptr,
    /// Name server record.
    Ns,
    /// Text record.
    Txt,
}

impl RecordType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Mx => "MX",
            Self::Cname => "CNAME",
            Self::Ptr => "PTR",
            Self::Ns => "NS",
            Self::Txt => "TXT",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "AAAA" => Ok(Self::Aaaa),
            "MX" => Ok(Self::Mx),
            "CNAME" => Ok(Self::Cname),
            "PTR" => Ok(Self::Ptr),
            "NS" => Ok(Self::Ns),
            "TXT" => Ok(Self::Txt),
            _ => Err(ParseEnumError {
                kind: "record type",
                value: s.to_string(),
            }),
        }
    }
}

/// Type-safe representation of DNS record data.
///
/// Each variant carries the fields specific to that record type.
/// Use [`record_type()`](Self::record_type) to get the [`RecordType`] discriminant,
/// or [`display_value()`](Self::display_value) to get the primary value for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RecordData {
    /// A record: maps a hostname to an IPv4 address.
    A {
        /// IPv4 address (e.g., `"192.0.2.10"`).
        address: Ipv4Addr,
    },

    /// AAAA record: maps a hostname to an IPv6 address.
    AAAA {
        /// IPv6 address (e.g., `"2001:db8::1"`).
        address: Ipv6Addr,
    },

    /// MX record: mail exchange server.
    MX {
        /// Mail server hostname.
        mail_exchange: String,
        /// Preference (lower = preferred).
        priority: u16,
    },

    /// CNAME record: alias from one name to another.
    CNAME {
        /// Target hostname.
        target: String,
    },

    /// PTR record: address to name.
    PTR {
        /// Target hostname.
        target: String,
    },

    /// NS record: authoritative name server.
    NS {
        /// Name server hostname.
        nameserver: String,
    },

    /// TXT record: arbitrary text data.
    TXT {
        /// Text content.
        text: String,
    },
}

impl RecordData {
    /// Returns the [`RecordType`] discriminant for this record data.
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::A { .. } => RecordType::A,
            Self::AAAA { .. } => RecordType::Aaaa,
            Self::MX { .. } => RecordType::Mx,
            Self::CNAME { .. } => RecordType::Cname,
            Self::PTR { .. } => RecordType::Ptr,
            Self::NS { .. } => RecordType::Ns,
            Self::TXT { .. } => RecordType::Txt,
        }
    }

    /// Returns the primary value for display (the address, target host or text).
    pub fn display_value(&self) -> String {
        match self {
            Self::A { address } => address.to_string(),
            Self::AAAA { address } => address.to_string(),
            Self::MX {
                mail_exchange,
                priority,
            } => format!("{priority} {mail_exchange}"),
            Self::CNAME { target } | Self::PTR { target } => target.clone(),
            Self::NS { nameserver } => nameserver.clone(),
            Self::TXT { text } => text.clone(),
        }
    }

    /// Hostname payloads lower-cased without trailing dot. TXT is left untouched.
    #[must_use]
    pub fn normalized(&self) -> Self {
        match self {
            Self::A { .. } | Self::AAAA { .. } | Self::TXT { .. } => self.clone(),
            Self::MX {
                mail_exchange,
                priority,
            } => Self::MX {
                mail_exchange: normalize_hostname(mail_exchange),
                priority: *priority,
            },
            Self::CNAME { target } => Self::CNAME {
                target: normalize_hostname(target),
            },
            Self::PTR { target } => Self::PTR {
                target: normalize_hostname(target),
            },
            Self::NS { nameserver } => Self::NS {
                nameserver: normalize_hostname(nameserver),
            },
        }
    }
}

/// A DNS resource record.
///
/// Identity is `(zone, name, type, data)`; `ttl` is a mutable attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Owning zone.
    pub zone: String,
    /// Relative label, `"@"` for the zone apex.
    pub name: String,
    /// Fully qualified owner name.
    pub fqdn: String,
    /// Time to live in seconds.
    pub ttl: u32,
    /// Type-specific record data.
    #[serde(flatten)]
    pub data: RecordData,
}

impl DnsRecord {
    /// Builds a normalized record, deriving the fqdn from zone and name.
    pub fn new(zone: &str, name: &str, ttl: u32, data: RecordData) -> Self {
        let zone = normalize_hostname(zone);
        let name = match normalize_hostname(name) {
            n if n.is_empty() || n == "@" || n == zone => "@".to_string(),
            n => n
                .strip_suffix(&format!(".{zone}"))
                .map_or_else(|| n.clone(), str::to_string),
        };
        let fqdn = if name == "@" {
            zone.clone()
        } else {
            format!("{name}.{zone}")
        };
        Self {
            zone,
            name,
            fqdn,
            ttl,
            data: data.normalized(),
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.data.record_type()
    }

    /// Same owner, type and data, regardless of TTL.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.zone == other.zone && self.name == other.name && self.data == other.data
    }
}

/// Selector for record reads. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<RecordType>,
    /// Relative label or fqdn, compared case-insensitively.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &DnsRecord) -> bool {
        let type_ok = self
            .record_type
            .is_none_or(|t| t == record.record_type());
        let name_ok = self.name.as_deref().is_none_or(|n| {
            let n = normalize_hostname(n);
            n == record.name || n == record.fqdn
        });
        type_ok && name_ok
    }
}

// ============ Certificate Types ============

/// Certificate store hive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreLocation {
    CurrentUser,
    #[default]
    LocalMachine,
}

impl StoreLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CurrentUser => "CurrentUser",
            Self::LocalMachine => "LocalMachine",
        }
    }
}

impl std::fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreLocation {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "currentuser" => Ok(Self::CurrentUser),
            "localmachine" => Ok(Self::LocalMachine),
            _ => Err(ParseEnumError {
                kind: "store location",
                value: s.to_string(),
            }),
        }
    }
}

/// Identifies a certificate store, e.g. `LocalMachine\My`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreDescriptor {
    pub name: String,
    pub location: StoreLocation,
}

impl Default for StoreDescriptor {
    fn default() -> Self {
        Self {
            name: "My".to_string(),
            location: StoreLocation::LocalMachine,
        }
    }
}

impl std::fmt::Display for StoreDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\\{}", self.location, self.name)
    }
}

/// Raw certificate entry as held by a store: the DER blob plus store metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCertificate {
    pub der: Vec<u8>,
    pub has_private_key: bool,
    pub archived: bool,
    pub friendly_name: String,
}

/// Enrollment request sent to a certificate authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    /// Certificate template name, if the authority is template-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Subject common name.
    pub subject_name: String,
    /// SAN DNS names.
    pub dns_names: Vec<String>,
    /// Store the issued certificate will be imported into.
    pub store: StoreDescriptor,
}

/// Certificate returned by the authority, before import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    /// Authority-side request id, if reported.
    pub request_id: Option<u64>,
    pub der: Vec<u8>,
}

/// A single X.509 extension rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateExtension {
    /// Friendly name of the extension, `None` when unknown.
    pub field: Option<String>,
    /// Rendered value.
    pub value: String,
    pub critical: bool,
}

/// Snapshot of a certificate held in a store, with every derived field decoded.
///
/// Built by [`Certificate::from_stored`](crate::Certificate::from_stored).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub store_name: String,
    pub store_location: StoreLocation,
    /// SHA-1 of the DER encoding, upper-case hex.
    pub thumbprint: String,
    /// Subject distinguished name.
    pub subject: String,
    /// Issuer distinguished name.
    pub issuer: String,
    /// Subject common name.
    pub issued_to: String,
    /// Issuer common name.
    pub issued_by: String,
    pub friendly_name: String,
    /// SAN DNS entries, in certificate order.
    pub dns_names: Vec<String>,
    #[serde(with = "crate::utils::datetime")]
    pub valid_from: DateTime<Utc>,
    #[serde(with = "crate::utils::datetime")]
    pub valid_to: DateTime<Utc>,
    pub is_ca: bool,
    pub has_private_key: bool,
    pub key_usages: Vec<String>,
    pub intended_purposes: Vec<String>,
    pub path_length_constraint: Option<u32>,
    /// Subject key identifier, upper-case hex.
    pub ski: Option<String>,
    pub serial_number: String,
    pub signature_algorithm: String,
    pub version: u32,
    /// Subject public key info, base64.
    pub public_key: String,
    /// Full DER, base64.
    pub cert_data: String,
    pub extensions: Vec<CertificateExtension>,
    pub archived: bool,
    /// Template name or OID from the Microsoft template extensions.
    pub template: Option<String>,
}

impl Certificate {
    /// Lower-cased SAN DNS names as a set.
    pub fn dns_name_set(&self) -> BTreeSet<String> {
        self.dns_names.iter().map(|n| normalize_hostname(n)).collect()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_to <= now
    }

    /// Unexpired and backed by a private key.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.has_private_key
    }
}
