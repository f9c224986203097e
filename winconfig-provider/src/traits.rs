use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    DnsRecord, EnrollmentRequest, IssuedCertificate, RecordFilter, StoreDescriptor,
    StoredCertificate, Zone, ZoneFilter,
};

/// Windows DNS 服务器 Trait
///
/// Read and write access to the zones and records hosted by one DNS server.
/// Implementations wrap whatever remote channel reaches the host; they must not
/// retry on their own.
#[async_trait]
pub trait DnsServer: Send + Sync {
    /// 目标主机标识符
    fn id(&self) -> &str;

    /// 获取 Zone 列表（按过滤条件）
    ///
    /// Returns an empty list when nothing matches; never fails for that reason alone.
    async fn list_zones(&self, filter: &ZoneFilter) -> Result<Vec<Zone>>;

    /// 获取 Zone 内的记录列表（按过滤条件）
    async fn list_records(&self, zone: &str, filter: &RecordFilter) -> Result<Vec<DnsRecord>>;

    /// 一次性获取 Zone 及其记录
    ///
    /// 默认实现先调用 `list_zones()`，再并发调用 `list_records()`。
    /// 后端可覆写以使用原生单次往返查询。
    async fn list_zones_with_records(
        &self,
        zone_filter: &ZoneFilter,
        record_filter: &RecordFilter,
    ) -> Result<Vec<(Zone, Vec<DnsRecord>)>> {
        let zones = self.list_zones(zone_filter).await?;
        log::debug!("[{}] listing records of {} zone(s)", self.id(), zones.len());
        let futures: Vec<_> = zones
            .iter()
            .map(|zone| self.list_records(&zone.name, record_filter))
            .collect();
        let results = futures::future::join_all(futures).await;

        let mut out = Vec::with_capacity(zones.len());
        for (zone, records) in zones.into_iter().zip(results) {
            out.push((zone, records?));
        }
        Ok(out)
    }

    /// 创建 Zone
    async fn create_zone(&self, zone: &Zone) -> Result<()>;

    /// 原地修改 Zone 属性（复制范围、动态更新、主服务器）
    async fn modify_zone(&self, zone: &Zone) -> Result<()>;

    /// 删除 Zone（连同其所有记录）
    async fn delete_zone(&self, name: &str) -> Result<()>;

    /// 添加记录
    async fn add_record(&self, record: &DnsRecord) -> Result<()>;

    /// 更新记录 TTL（记录身份不变）
    async fn update_record(&self, record: &DnsRecord) -> Result<()>;

    /// 删除记录
    async fn remove_record(&self, record: &DnsRecord) -> Result<()>;
}

/// 证书存储 Trait
#[async_trait]
pub trait CertificateStore: Send + Sync {
    fn id(&self) -> &str;

    /// 获取存储中的全部证书（原始 DER + 元数据）
    async fn list_certificates(&self, store: &StoreDescriptor) -> Result<Vec<StoredCertificate>>;

    /// 导入 CA 签发的证书，与本机私钥配对
    async fn import_certificate(
        &self,
        store: &StoreDescriptor,
        issued: &IssuedCertificate,
    ) -> Result<()>;
}

/// 证书颁发机构 Trait
#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    fn id(&self) -> &str;

    /// 提交注册请求并等待签发
    ///
    /// A refusal surfaces as [`ProviderError::EnrollmentRejected`](crate::ProviderError::EnrollmentRejected)
    /// carrying the authority's own message.
    async fn submit(&self, request: &EnrollmentRequest) -> Result<IssuedCertificate>;
}
