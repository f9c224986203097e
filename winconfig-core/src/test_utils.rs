//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::RwLock;
use winconfig_provider::{
    CertificateAuthority, CertificateStore, DnsRecord, DnsServer, DynamicUpdate,
    EnrollmentRequest, IssuedCertificate, ProviderError, RecordData, RecordFilter,
    ReplicationScope, Result, StoreDescriptor, StoredCertificate, Zone, ZoneFilter, ZoneType,
    normalize_hostname,
};

use crate::clock::FixedClock;
use crate::config::SessionConfig;
use crate::session::Session;

const HOST: &str = "dc01";

// ===== 证书夹具 =====

/// `zollo.net`, issued 2025-01-01.
pub const WEB_ZOLLO: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../testdata/certs/web_zollo.der"
));
/// `zollo.net`, issued 2024-03-01.
pub const WEB_ZOLLO_OLDER: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../testdata/certs/web_zollo_older.der"
));
/// `zollo.net` + `www.zollo.net`, issued 2025-06-01.
pub const WEB_ZOLLO_WWW: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../testdata/certs/web_zollo_www.der"
));
pub const ISSUING_CA: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../testdata/certs/issuing_ca.der"
));

// ===== MockDnsServer =====

pub struct MockDnsServer {
    zones: RwLock<HashMap<String, Zone>>,
    records: RwLock<Vec<DnsRecord>>,
    calls: RwLock<Vec<String>>,
    /// 下一次调用该方法时返回的错误
    failures: RwLock<HashMap<String, ProviderError>>,
    delay: RwLock<Option<Duration>>,
}

impl MockDnsServer {
    pub fn new() -> Self {
        Self {
            zones: RwLock::new(HashMap::new()),
            records: RwLock::new(Vec::new()),
            calls: RwLock::new(Vec::new()),
            failures: RwLock::new(HashMap::new()),
            delay: RwLock::new(None),
        }
    }

    pub async fn insert_zone(&self, zone: Zone) {
        self.zones.write().await.insert(zone.name.clone(), zone);
    }

    pub async fn insert_record(&self, record: DnsRecord) {
        self.records.write().await.push(record);
    }

    pub async fn zone(&self, name: &str) -> Option<Zone> {
        self.zones.read().await.get(name).cloned()
    }

    pub async fn records(&self) -> Vec<DnsRecord> {
        self.records.read().await.clone()
    }

    /// Every call in order, e.g. `"create_zone example.com"`.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    /// Calls that would change server state.
    pub async fn mutation_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| !c.starts_with("list_"))
            .count()
    }

    pub async fn fail_next(&self, method: &str, err: ProviderError) {
        self.failures.write().await.insert(method.to_string(), err);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    async fn enter(&self, method: &str, target: Option<&str>) -> Result<()> {
        let entry = match target {
            Some(t) => format!("{method} {t}"),
            None => method.to_string(),
        };
        self.calls.write().await.push(entry);
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.write().await.remove(method) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn require_zone(&self, name: &str) -> Result<()> {
        if self.zones.read().await.contains_key(name) {
            Ok(())
        } else {
            Err(zone_not_found(name))
        }
    }
}

fn zone_not_found(name: &str) -> ProviderError {
    ProviderError::ZoneNotFound {
        host: HOST.to_string(),
        zone: name.to_string(),
        raw_message: Some(format!("The zone {name} was not found on server {HOST}.")),
    }
}

fn record_error(record: &DnsRecord, exists: bool) -> ProviderError {
    let raw_message = Some(format!("Failed to process record {}.", record.fqdn));
    if exists {
        ProviderError::RecordExists {
            host: HOST.to_string(),
            record: record.fqdn.clone(),
            raw_message,
        }
    } else {
        ProviderError::RecordNotFound {
            host: HOST.to_string(),
            record: record.fqdn.clone(),
            raw_message,
        }
    }
}

#[async_trait]
impl DnsServer for MockDnsServer {
    fn id(&self) -> &str {
        HOST
    }

    async fn list_zones(&self, filter: &ZoneFilter) -> Result<Vec<Zone>> {
        self.enter("list_zones", None).await?;
        let mut zones: Vec<Zone> = self
            .zones
            .read()
            .await
            .values()
            .filter(|z| filter.matches(z))
            .cloned()
            .collect();
        zones.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(zones)
    }

    async fn list_records(&self, zone: &str, filter: &RecordFilter) -> Result<Vec<DnsRecord>> {
        self.enter("list_records", Some(zone)).await?;
        self.require_zone(zone).await?;
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.zone == zone && filter.matches(r))
            .cloned()
            .collect())
    }

    async fn create_zone(&self, zone: &Zone) -> Result<()> {
        self.enter("create_zone", Some(&zone.name)).await?;
        let mut zones = self.zones.write().await;
        if zones.contains_key(&zone.name) {
            return Err(ProviderError::ZoneExists {
                host: HOST.to_string(),
                zone: zone.name.clone(),
                raw_message: None,
            });
        }
        zones.insert(zone.name.clone(), zone.clone());
        Ok(())
    }

    async fn modify_zone(&self, zone: &Zone) -> Result<()> {
        self.enter("modify_zone", Some(&zone.name)).await?;
        self.require_zone(&zone.name).await?;
        self.zones
            .write()
            .await
            .insert(zone.name.clone(), zone.clone());
        Ok(())
    }

    async fn delete_zone(&self, name: &str) -> Result<()> {
        self.enter("delete_zone", Some(name)).await?;
        if self.zones.write().await.remove(name).is_none() {
            return Err(zone_not_found(name));
        }
        self.records.write().await.retain(|r| r.zone != name);
        Ok(())
    }

    async fn add_record(&self, record: &DnsRecord) -> Result<()> {
        self.enter("add_record", Some(&record.fqdn)).await?;
        self.require_zone(&record.zone).await?;
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.same_identity(record)) {
            return Err(record_error(record, true));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn update_record(&self, record: &DnsRecord) -> Result<()> {
        self.enter("update_record", Some(&record.fqdn)).await?;
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.same_identity(record)) {
            Some(existing) => {
                existing.ttl = record.ttl;
                Ok(())
            }
            None => Err(record_error(record, false)),
        }
    }

    async fn remove_record(&self, record: &DnsRecord) -> Result<()> {
        self.enter("remove_record", Some(&record.fqdn)).await?;
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !r.same_identity(record));
        if records.len() == before {
            return Err(record_error(record, false));
        }
        Ok(())
    }
}

// ===== MockCertificateStore =====

pub struct MockCertificateStore {
    stores: RwLock<HashMap<String, Vec<StoredCertificate>>>,
}

impl MockCertificateStore {
    pub fn new() -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, store: &StoreDescriptor, cert: StoredCertificate) {
        self.stores
            .write()
            .await
            .entry(store.to_string())
            .or_default()
            .push(cert);
    }

    pub async fn insert_der(&self, store: &StoreDescriptor, der: &[u8], has_private_key: bool) {
        self.insert(
            store,
            StoredCertificate {
                der: der.to_vec(),
                has_private_key,
                archived: false,
                friendly_name: String::new(),
            },
        )
        .await;
    }

    pub async fn count(&self, store: &StoreDescriptor) -> usize {
        self.stores
            .read()
            .await
            .get(&store.to_string())
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl CertificateStore for MockCertificateStore {
    fn id(&self) -> &str {
        HOST
    }

    async fn list_certificates(&self, store: &StoreDescriptor) -> Result<Vec<StoredCertificate>> {
        Ok(self
            .stores
            .read()
            .await
            .get(&store.to_string())
            .cloned()
            .unwrap_or_default())
    }

    async fn import_certificate(
        &self,
        store: &StoreDescriptor,
        issued: &IssuedCertificate,
    ) -> Result<()> {
        self.insert_der(store, &issued.der, true).await;
        Ok(())
    }
}

// ===== MockCertificateAuthority =====

/// Issues fixture certificates keyed by the requested dns-name set.
pub struct MockCertificateAuthority {
    fixtures: RwLock<HashMap<BTreeSet<String>, &'static [u8]>>,
    rejection: RwLock<Option<String>>,
    submitted: RwLock<Vec<EnrollmentRequest>>,
}

impl MockCertificateAuthority {
    pub fn new() -> Self {
        let mut fixtures: HashMap<BTreeSet<String>, &'static [u8]> = HashMap::new();
        fixtures.insert(name_set(&["zollo.net"]), WEB_ZOLLO);
        fixtures.insert(name_set(&["zollo.net", "www.zollo.net"]), WEB_ZOLLO_WWW);
        Self {
            fixtures: RwLock::new(fixtures),
            rejection: RwLock::new(None),
            submitted: RwLock::new(Vec::new()),
        }
    }

    /// 设置后所有请求都会被拒绝
    pub async fn set_rejection(&self, message: Option<String>) {
        *self.rejection.write().await = message;
    }

    pub async fn submitted(&self) -> Vec<EnrollmentRequest> {
        self.submitted.read().await.clone()
    }
}

fn name_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| normalize_hostname(n)).collect()
}

#[async_trait]
impl CertificateAuthority for MockCertificateAuthority {
    fn id(&self) -> &str {
        "ca01"
    }

    async fn submit(&self, request: &EnrollmentRequest) -> Result<IssuedCertificate> {
        self.submitted.write().await.push(request.clone());

        let rejected = |raw_message: String| ProviderError::EnrollmentRejected {
            host: "ca01".to_string(),
            template: request.template.clone(),
            raw_message,
        };
        if let Some(message) = self.rejection.read().await.clone() {
            return Err(rejected(message));
        }

        let key: BTreeSet<String> = request
            .dns_names
            .iter()
            .map(|n| normalize_hostname(n))
            .collect();
        let fixtures = self.fixtures.read().await;
        let der = fixtures
            .get(&key)
            .ok_or_else(|| rejected(format!("no fixture for {key:?}")))?;
        Ok(IssuedCertificate {
            request_id: Some(u64::try_from(self.submitted.read().await.len()).unwrap_or(0)),
            der: der.to_vec(),
        })
    }
}

// ===== 工厂方法 =====

/// 创建测试用 `Session`（已打开，时钟固定在 2026-01-01）
pub fn create_test_session() -> (
    Arc<Session>,
    Arc<MockDnsServer>,
    Arc<MockCertificateStore>,
    Arc<MockCertificateAuthority>,
) {
    create_test_session_with(SessionConfig::new(HOST))
}

pub fn create_test_session_with(
    config: SessionConfig,
) -> (
    Arc<Session>,
    Arc<MockDnsServer>,
    Arc<MockCertificateStore>,
    Arc<MockCertificateAuthority>,
) {
    let dns = Arc::new(MockDnsServer::new());
    let store = Arc::new(MockCertificateStore::new());
    let ca = Arc::new(MockCertificateAuthority::new());
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

    let session = Session::builder(config)
        .dns_server(dns.clone())
        .certificate_store(store.clone())
        .certificate_authority(ca.clone())
        .clock(Arc::new(FixedClock(now)))
        .build()
        .unwrap();
    session.open();

    (Arc::new(session), dns, store, ca)
}

/// AD-integrated primary zone with default options.
pub fn primary_zone(name: &str) -> Zone {
    Zone {
        name: name.to_string(),
        zone_type: ZoneType::Primary,
        dynamic_update: DynamicUpdate::Secure,
        replication: ReplicationScope::Forest,
        dns_servers: Vec::new(),
    }
}

pub fn a_record(zone: &str, name: &str, ip: &str, ttl: u32) -> DnsRecord {
    DnsRecord::new(
        zone,
        name,
        ttl,
        RecordData::A {
            address: ip.parse().unwrap(),
        },
    )
}
