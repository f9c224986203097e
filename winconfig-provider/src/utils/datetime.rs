//! 日期时间序列化/反序列化工具
//!
//! 提供自定义 Serde 序列化/反序列化支持：
//! - 序列化: `DateTime`<Utc> -> RFC3339 字符串（秒精度，`Z` 后缀）
//! - 反序列化: RFC3339 字符串、Unix 时间戳 或 `/Date(ms)/` -> `DateTime`<Utc>
//!
//! `/Date(1735689600000)/` is how `ConvertTo-Json` renders `[datetime]` values
//! on Windows PowerShell 5.1, so remote backends can hand the raw JSON through.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// 序列化 `DateTime`<Utc> 为 RFC3339 字符串
pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// 反序列化：支持 RFC3339 字符串、`/Date(ms)/` 或 Unix 时间戳（秒/毫秒自动识别）
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Timestamp {
        String(String),
        I64(i64),
    }

    match Timestamp::deserialize(deserializer)? {
        Timestamp::String(s) => parse_timestamp_str(&s)
            .ok_or_else(|| Error::custom(format!("Invalid timestamp: {s}"))),
        Timestamp::I64(ts) => {
            parse_unix_timestamp(ts).ok_or_else(|| Error::custom("Invalid Unix timestamp"))
        }
    }
}

/// 解析字符串形式的时间戳
pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Some(inner) = s.strip_prefix("/Date(").and_then(|r| r.strip_suffix(")/")) {
        // 可能带时区偏移后缀，例如 /Date(1735689600000+0000)/
        let millis = inner
            .split(['+', '-'])
            .find(|part| !part.is_empty())
            .and_then(|part| part.parse::<i64>().ok())?;
        let millis = if inner.starts_with('-') { -millis } else { millis };
        return DateTime::from_timestamp_millis(millis);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// 解析 Unix 时间戳（自动判断秒/毫秒）
fn parse_unix_timestamp(ts: i64) -> Option<DateTime<Utc>> {
    // 如果时间戳 > 10^11，认为是毫秒
    if ts > 100_000_000_000 {
        DateTime::from_timestamp_millis(ts)
    } else {
        // 否则认为是秒
        DateTime::from_timestamp(ts, 0)
    }
}
