//! Desired state validation
//!
//! Every declaration is normalized and checked here before the first remote
//! call. Nothing in this module touches a backend.

use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::de::DeserializeOwned;
use serde_json::Value;
use winconfig_provider::{
    DnsRecord, EnrollmentRequest, RecordData, RecordFilter, RecordType, StoreDescriptor, Zone,
    ZoneFilter, normalize_hostname,
};

use crate::error::{CoreError, CoreResult};
use crate::types::{
    CertificateDeclaration, DEFAULT_TTL, DesiredRecordSet, DesiredZone, DnsInfoQuery,
    RecordDeclaration, RecordEntry, ResourceState, ZoneDeclaration,
};

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Deserializes a JSON declaration, reporting schema problems as validation errors.
pub fn from_json<T: DeserializeOwned>(value: Value) -> CoreResult<T> {
    serde_json::from_value(value).map_err(|e| CoreError::validation(e.to_string()))
}

fn check_labels(kind: &str, name: &str, allow_wildcard: bool) -> CoreResult<()> {
    if name.len() > MAX_NAME_LEN {
        return Err(CoreError::validation(format!(
            "{kind} '{name}' is longer than {MAX_NAME_LEN} characters"
        )));
    }
    for (i, label) in name.split('.').enumerate() {
        if allow_wildcard && i == 0 && label == "*" {
            continue;
        }
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(CoreError::validation(format!(
                "{kind} '{name}' has an empty or over-long label"
            )));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(CoreError::validation(format!(
                "{kind} '{name}' has a label starting or ending with '-'"
            )));
        }
        if let Some(c) = label
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(CoreError::validation(format!(
                "{kind} '{name}' contains invalid character '{c}'"
            )));
        }
    }
    Ok(())
}

/// Normalizes and checks a fully qualified zone name.
pub fn validate_zone_name(name: &str) -> CoreResult<String> {
    let normalized = normalize_hostname(name);
    if normalized.is_empty() {
        return Err(CoreError::validation("zone name must not be empty"));
    }
    check_labels("zone name", &normalized, false)?;
    Ok(normalized)
}

/// Normalizes a hostname used as record data.
fn validate_target(kind: &str, name: &str) -> CoreResult<String> {
    let normalized = normalize_hostname(name);
    if normalized.is_empty() {
        return Err(CoreError::validation(format!("{kind} must not be empty")));
    }
    check_labels(kind, &normalized, false)?;
    Ok(normalized)
}

/// Normalizes a relative record name. `@`, empty and the zone itself mean the apex.
pub fn validate_record_name(name: &str, zone: &str) -> CoreResult<String> {
    let normalized = normalize_hostname(name);
    if normalized.is_empty() || normalized == "@" || normalized == zone {
        return Ok("@".to_string());
    }
    let relative = normalized
        .strip_suffix(&format!(".{zone}"))
        .unwrap_or(&normalized)
        .to_string();
    check_labels("record name", &relative, true)?;
    Ok(relative)
}

pub fn parse_record_type(value: &str) -> CoreResult<RecordType> {
    value
        .parse::<RecordType>()
        .map_err(|e| CoreError::validation(e.to_string()))
}

fn expect_str<'a>(record_type: RecordType, value: &'a Value) -> CoreResult<&'a str> {
    value.as_str().ok_or_else(|| {
        CoreError::validation(format!(
            "{record_type} record value must be a string, got {value}"
        ))
    })
}

fn parse_mx(value: &Value) -> CoreResult<RecordData> {
    let (exchange, priority) = match value {
        Value::Object(map) => {
            let exchange = map
                .get("mail_exchange")
                .and_then(Value::as_str)
                .ok_or_else(|| CoreError::validation("MX value requires 'mail_exchange'"))?;
            let priority = map
                .get("priority")
                .and_then(Value::as_u64)
                .ok_or_else(|| CoreError::validation("MX value requires numeric 'priority'"))?;
            if let Some(extra) = map
                .keys()
                .find(|k| *k != "mail_exchange" && *k != "priority")
            {
                return Err(CoreError::validation(format!(
                    "unknown MX value field '{extra}'"
                )));
            }
            (exchange.to_string(), priority)
        }
        Value::String(s) => {
            let mut parts = s.split_whitespace();
            let (Some(priority), Some(exchange), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(CoreError::validation(format!(
                    "MX value '{s}' must look like '<priority> <mail exchange>'"
                )));
            };
            let priority = priority.parse::<u64>().map_err(|_| {
                CoreError::validation(format!("MX priority '{priority}' is not a number"))
            })?;
            (exchange.to_string(), priority)
        }
        other => {
            return Err(CoreError::validation(format!(
                "MX record value must be an object or string, got {other}"
            )));
        }
    };
    let priority = u16::try_from(priority)
        .map_err(|_| CoreError::validation(format!("MX priority {priority} is out of range")))?;
    Ok(RecordData::MX {
        mail_exchange: validate_target("MX mail exchange", &exchange)?,
        priority,
    })
}

/// Converts an untyped declared value into typed record data.
pub fn record_data_from_value(record_type: RecordType, value: &Value) -> CoreResult<RecordData> {
    match record_type {
        RecordType::A => {
            let s = expect_str(record_type, value)?;
            let address = s.trim().parse::<Ipv4Addr>().map_err(|_| {
                CoreError::validation(format!("'{s}' is not a valid IPv4 address"))
            })?;
            Ok(RecordData::A { address })
        }
        RecordType::Aaaa => {
            let s = expect_str(record_type, value)?;
            let address = s.trim().parse::<Ipv6Addr>().map_err(|_| {
                CoreError::validation(format!("'{s}' is not a valid IPv6 address"))
            })?;
            Ok(RecordData::AAAA { address })
        }
        RecordType::Mx => parse_mx(value),
        RecordType::Cname => Ok(RecordData::CNAME {
            target: validate_target("CNAME target", expect_str(record_type, value)?)?,
        }),
        RecordType::Ptr => Ok(RecordData::PTR {
            target: validate_target("PTR target", expect_str(record_type, value)?)?,
        }),
        RecordType::Ns => Ok(RecordData::NS {
            nameserver: validate_target("NS name server", expect_str(record_type, value)?)?,
        }),
        RecordType::Txt => Ok(RecordData::TXT {
            text: expect_str(record_type, value)?.to_string(),
        }),
    }
}

fn build_record(zone: &str, entry: &RecordEntry) -> CoreResult<DnsRecord> {
    let record_type = parse_record_type(&entry.record_type)?;
    let name = validate_record_name(&entry.name, zone)?;
    let data = record_data_from_value(record_type, &entry.value)?;
    Ok(DnsRecord::new(
        zone,
        &name,
        entry.ttl.unwrap_or(DEFAULT_TTL),
        data,
    ))
}

fn reject_duplicates(records: &[DnsRecord]) -> CoreResult<()> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert((&record.name, &record.data)) {
            return Err(CoreError::validation(format!(
                "duplicate record {} {} {}",
                record.fqdn,
                record.record_type(),
                record.data.display_value()
            )));
        }
    }
    Ok(())
}

fn validate_zone_records(zone: &str, entries: &[RecordEntry]) -> CoreResult<Vec<DnsRecord>> {
    let records = entries
        .iter()
        .map(|entry| build_record(zone, entry))
        .collect::<CoreResult<Vec<_>>>()?;
    reject_duplicates(&records)?;
    reject_cname_conflicts(&records)?;
    Ok(records)
}

/// A CNAME owner carries no other data.
fn reject_cname_conflicts(records: &[DnsRecord]) -> CoreResult<()> {
    for cname in records
        .iter()
        .filter(|r| r.record_type() == RecordType::Cname)
    {
        if records
            .iter()
            .any(|r| r.name == cname.name && !r.same_identity(cname))
        {
            return Err(CoreError::validation(format!(
                "CNAME owner {} cannot carry other records",
                cname.fqdn
            )));
        }
    }
    Ok(())
}

/// Validates a zone declaration.
pub fn validate_zone(decl: &ZoneDeclaration) -> CoreResult<DesiredZone> {
    let name = validate_zone_name(&decl.name)?;

    if decl.state == ResourceState::Absent {
        if decl.records.as_ref().is_some_and(|r| !r.is_empty()) {
            return Err(CoreError::validation(format!(
                "records cannot be declared for absent zone '{name}'"
            )));
        }
        return Ok(DesiredZone {
            zone: Zone {
                name,
                zone_type: decl.zone_type,
                dynamic_update: decl.dynamic_update,
                replication: decl.replication,
                dns_servers: Vec::new(),
            },
            state: ResourceState::Absent,
            records: None,
            purge_records: false,
        });
    }

    let dns_servers = if decl.zone_type.requires_master_servers() {
        if decl.dns_servers.is_empty() {
            return Err(CoreError::validation(format!(
                "zone type '{}' requires at least one entry in dns_servers",
                decl.zone_type
            )));
        }
        decl.dns_servers.clone()
    } else {
        if !decl.dns_servers.is_empty() {
            log::warn!(
                "dns_servers is ignored for {} zone '{name}'",
                decl.zone_type
            );
        }
        Vec::new()
    };

    let records = decl
        .records
        .as_deref()
        .map(|entries| validate_zone_records(&name, entries))
        .transpose()?;

    if decl.purge_records && records.is_none() {
        return Err(CoreError::validation(
            "purge_records requires a records list (use an empty list to purge everything)",
        ));
    }

    Ok(DesiredZone {
        zone: Zone {
            name,
            zone_type: decl.zone_type,
            dynamic_update: decl.dynamic_update,
            replication: decl.replication,
            dns_servers,
        },
        state: ResourceState::Present,
        records,
        purge_records: decl.purge_records,
    })
}

/// Validates a standalone record set declaration.
pub fn validate_record_declaration(decl: &RecordDeclaration) -> CoreResult<DesiredRecordSet> {
    let zone = validate_zone_name(&decl.zone)?;
    let record_type = parse_record_type(&decl.record_type)?;
    let name = validate_record_name(&decl.name, &zone)?;

    if decl.state == ResourceState::Present && decl.values.is_empty() {
        return Err(CoreError::validation(format!(
            "at least one value is required for present {record_type} record '{name}'"
        )));
    }
    if record_type == RecordType::Cname && decl.values.len() > 1 {
        return Err(CoreError::validation(format!(
            "CNAME record '{name}' takes exactly one value"
        )));
    }

    let records = decl
        .values
        .iter()
        .map(|value| {
            let data = record_data_from_value(record_type, value)?;
            Ok(DnsRecord::new(
                &zone,
                &name,
                decl.ttl.unwrap_or(DEFAULT_TTL),
                data,
            ))
        })
        .collect::<CoreResult<Vec<_>>>()?;
    reject_duplicates(&records)?;

    Ok(DesiredRecordSet {
        zone,
        name,
        record_type,
        records,
        state: decl.state,
    })
}

/// Validates a certificate declaration into an enrollment request.
pub fn validate_certificate(decl: &CertificateDeclaration) -> CoreResult<EnrollmentRequest> {
    let store_name = decl.store_name.trim();
    if store_name.is_empty() {
        return Err(CoreError::validation("store_name must not be empty"));
    }

    let mut dns_names: Vec<String> = Vec::with_capacity(decl.dns_names.len());
    for raw in &decl.dns_names {
        let name = normalize_hostname(raw);
        if name.is_empty() {
            return Err(CoreError::validation("dns_names must not contain empty names"));
        }
        check_labels("dns name", &name, true)?;
        if !dns_names.contains(&name) {
            dns_names.push(name);
        }
    }
    if dns_names.is_empty() {
        return Err(CoreError::validation(
            "at least one dns name is required (dns_names or dns_name)",
        ));
    }

    let subject_name = match decl.subject_name.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => dns_names[0].clone(),
    };
    let template = decl
        .template
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok(EnrollmentRequest {
        template,
        subject_name,
        dns_names,
        store: StoreDescriptor {
            name: store_name.to_string(),
            location: decl.store_location,
        },
    })
}

/// Turns an info query into reader selectors.
pub fn validate_info_query(query: &DnsInfoQuery) -> CoreResult<(ZoneFilter, RecordFilter)> {
    let zone_name = query
        .zone_name
        .as_deref()
        .map(validate_zone_name)
        .transpose()?;
    let record_name = query
        .record_name
        .as_deref()
        .map(normalize_hostname)
        .filter(|n| !n.is_empty());
    Ok((
        ZoneFilter {
            name: zone_name,
            zone_type: query.zone_type,
        },
        RecordFilter {
            record_type: query.record_type,
            name: record_name,
        },
    ))
}
