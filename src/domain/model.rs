use crate::utils::clock::format_millis;
use crate::utils::error::HarvestError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 支援的平台（封閉集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Zhihu,
    Weibo,
    Github,
    Baidu,
    Bilibili,
    V2ex,
    Hackernews,
    Toutiao,
    Csdn,
}

impl Platform {
    pub const ALL: [Platform; 9] = [
        Platform::Zhihu,
        Platform::Weibo,
        Platform::Github,
        Platform::Baidu,
        Platform::Bilibili,
        Platform::V2ex,
        Platform::Hackernews,
        Platform::Toutiao,
        Platform::Csdn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Zhihu => "zhihu",
            Platform::Weibo => "weibo",
            Platform::Github => "github",
            Platform::Baidu => "baidu",
            Platform::Bilibili => "bilibili",
            Platform::V2ex => "v2ex",
            Platform::Hackernews => "hackernews",
            Platform::Toutiao => "toutiao",
            Platform::Csdn => "csdn",
        }
    }

    /// API 樹中對外使用的 provider id
    pub fn provider_id(&self) -> &'static str {
        match self {
            Platform::Zhihu => "zhihu-hot-questions",
            Platform::Weibo => "weibo-top-search",
            Platform::Github => "github-trending",
            Platform::Baidu => "baidu-hot-search",
            Platform::Bilibili => "bilibili-hot",
            Platform::V2ex => "v2ex-hot",
            Platform::Hackernews => "hackernews-top",
            Platform::Toutiao => "toutiao-hot",
            Platform::Csdn => "csdn-hot",
        }
    }

    /// provider.json 的排序提示，越大越前面
    pub fn priority(&self) -> u32 {
        match self {
            Platform::Zhihu => 1000,
            Platform::Weibo => 999,
            Platform::Github => 998,
            Platform::Baidu => 997,
            Platform::Bilibili => 995,
            Platform::V2ex => 994,
            Platform::Hackernews => 993,
            Platform::Toutiao => 992,
            Platform::Csdn => 991,
        }
    }

    pub fn from_provider_id(provider_id: &str) -> Option<Platform> {
        Self::ALL
            .into_iter()
            .find(|p| p.provider_id() == provider_id)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == tag)
            .ok_or_else(|| HarvestError::InvalidConfigValueError {
                field: "platform".to_string(),
                value: s.to_string(),
                reason: format!(
                    "Unknown platform. Supported: {}",
                    Self::ALL.map(|p| p.as_str()).join(", ")
                ),
            })
    }
}

/// 單一來源的一筆熱門項目（正規化後）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_score: Option<u64>,
    /// 來源原始的熱度文字，例如 "125万热"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub fetched_at: i64,
    pub source_platform: Platform,
}

/// 一次 Scheduler -> Adapter 呼叫的結果；建立後不可變
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformFetchOutcome {
    platform: Platform,
    records: Vec<TrendingRecord>,
    fetched_at: i64,
    succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl PlatformFetchOutcome {
    pub fn success(platform: Platform, records: Vec<TrendingRecord>, fetched_at: i64) -> Self {
        Self {
            platform,
            records,
            fetched_at,
            succeeded: true,
            error_message: None,
        }
    }

    /// 失敗的結果一定沒有記錄
    pub fn failure(platform: Platform, error_message: impl Into<String>, fetched_at: i64) -> Self {
        Self {
            platform,
            records: Vec::new(),
            fetched_at,
            succeeded: false,
            error_message: Some(error_message.into()),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn records(&self) -> &[TrendingRecord] {
        &self.records
    }

    pub fn fetched_at(&self) -> i64 {
        self.fetched_at
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// 以平台為鍵、只包含成功平台的記錄
pub type KeyedRecords = BTreeMap<Platform, Vec<TrendingRecord>>;

/// 一次抓取週期的彙總
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchReport {
    outcomes: Vec<PlatformFetchOutcome>,
    total_records: usize,
    succeeded_platforms: usize,
    failed_platforms: usize,
    duration_millis: u64,
}

impl FetchReport {
    pub fn from_outcomes(outcomes: Vec<PlatformFetchOutcome>, duration: Duration) -> Self {
        let total_records = outcomes
            .iter()
            .filter(|o| o.succeeded)
            .map(|o| o.records.len())
            .sum();
        let succeeded_platforms = outcomes.iter().filter(|o| o.succeeded).count();
        let failed_platforms = outcomes.len() - succeeded_platforms;

        Self {
            outcomes,
            total_records,
            succeeded_platforms,
            failed_platforms,
            duration_millis: duration.as_millis() as u64,
        }
    }

    pub fn outcomes(&self) -> &[PlatformFetchOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, platform: Platform) -> Option<&PlatformFetchOutcome> {
        self.outcomes.iter().find(|o| o.platform == platform)
    }

    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn succeeded_platforms(&self) -> usize {
        self.succeeded_platforms
    }

    pub fn failed_platforms(&self) -> usize {
        self.failed_platforms
    }

    pub fn duration_millis(&self) -> u64 {
        self.duration_millis
    }

    pub fn has_failures(&self) -> bool {
        self.failed_platforms > 0
    }

    pub fn keyed_view(&self) -> KeyedRecords {
        self.outcomes
            .iter()
            .filter(|o| o.succeeded)
            .map(|o| (o.platform, o.records.clone()))
            .collect()
    }

    pub fn into_keyed_view(self) -> KeyedRecords {
        self.outcomes
            .into_iter()
            .filter(|o| o.succeeded)
            .map(|o| (o.platform, o.records))
            .collect()
    }
}

/// 一個平台的靜態設定（名稱、URL、逾時、是否啟用）
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformSettings {
    pub platform: Platform,
    pub display_name: String,
    pub base_url: String,
    pub endpoint: String,
    pub enabled: bool,
    pub timeout: Duration,
}

impl PlatformSettings {
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.endpoint)
    }
}

/// `<data-root>/<date>/<platform>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    pub platform: Platform,
    pub items: Vec<TrendingRecord>,
    pub fetched_at: i64,
    pub fetched_at_formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDataItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot: Option<u64>,
}

impl From<&TrendingRecord> for ApiDataItem {
    fn from(record: &TrendingRecord) -> Self {
        Self {
            title: record.title.clone(),
            summary: record.description.clone(),
            url: record.url.clone(),
            image_url: record.cover_image.clone(),
            created_at: format_millis(record.fetched_at),
            tags: if record.tags.is_empty() {
                None
            } else {
                Some(record.tags.clone())
            },
            hot: record.hot_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEntry {
    pub id: String,
    pub last_update_at: String,
    pub priority: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderList {
    pub provider: Vec<ProviderEntry>,
}

/// `<provider-id>/now.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowDocument {
    pub id: String,
    pub last_updated_at: String,
    pub data: Vec<ApiDataItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryLink {
    pub date: String,
    pub uri: String,
}

/// `<provider-id>/history.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryIndex {
    pub id: String,
    pub history: Vec<HistoryLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryBatch {
    pub id: String,
    pub last_updated_at: String,
    pub data: Vec<ApiDataItem>,
}

/// `<provider-id>/history/<date>.json`，只會追加批次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDay {
    pub id: String,
    pub created_at: String,
    pub data: Vec<HistoryBatch>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(platform: Platform, title: &str) -> TrendingRecord {
        TrendingRecord {
            id: format!("{}_{}", platform, title),
            title: title.to_string(),
            url: None,
            hot_score: Some(10),
            hot_text: None,
            category: None,
            tags: Vec::new(),
            description: None,
            cover_image: None,
            author: None,
            fetched_at: 1_700_000_000_000,
            source_platform: platform,
        }
    }

    #[test]
    fn test_platform_tags_round_trip_through_from_str() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
            assert_eq!(Platform::from_provider_id(platform.provider_id()), Some(platform));
        }
        assert!("douyin".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_serializes_as_lowercase_tag() {
        let json = serde_json::to_string(&Platform::Hackernews).unwrap();
        assert_eq!(json, "\"hackernews\"");
    }

    #[test]
    fn test_failed_outcome_has_no_records() {
        let outcome = PlatformFetchOutcome::failure(Platform::Weibo, "boom", 1);
        assert!(!outcome.succeeded());
        assert!(outcome.records().is_empty());
        assert_eq!(outcome.error_message(), Some("boom"));
    }

    #[test]
    fn test_report_totals_count_only_succeeded_outcomes() {
        let outcomes = vec![
            PlatformFetchOutcome::success(
                Platform::Weibo,
                vec![record(Platform::Weibo, "a"), record(Platform::Weibo, "b")],
                1,
            ),
            PlatformFetchOutcome::failure(Platform::Csdn, "down", 1),
            PlatformFetchOutcome::success(Platform::Toutiao, vec![], 1),
        ];
        let report = FetchReport::from_outcomes(outcomes, Duration::from_millis(42));

        assert_eq!(report.total_records(), 2);
        assert_eq!(report.succeeded_platforms(), 2);
        assert_eq!(report.failed_platforms(), 1);
        assert_eq!(report.duration_millis(), 42);

        let view = report.keyed_view();
        assert_eq!(view.len(), 2);
        assert!(!view.contains_key(&Platform::Csdn));
        assert_eq!(view.values().map(Vec::len).sum::<usize>(), report.total_records());
    }

    #[test]
    fn test_record_serializes_camel_case_and_omits_missing_fields() {
        let value = serde_json::to_value(record(Platform::Weibo, "a")).unwrap();
        assert_eq!(value["hotScore"], 10);
        assert_eq!(value["sourcePlatform"], "weibo");
        assert!(value.get("url").is_none());
        assert!(value.get("tags").is_none());
    }

    #[test]
    fn test_api_item_maps_record_fields() {
        let mut r = record(Platform::Bilibili, "video");
        r.description = Some("desc".into());
        r.cover_image = Some("http://img".into());
        let item = ApiDataItem::from(&r);
        assert_eq!(item.summary.as_deref(), Some("desc"));
        assert_eq!(item.image_url.as_deref(), Some("http://img"));
        assert_eq!(item.hot, Some(10));
        assert!(item.tags.is_none());
        assert_eq!(item.created_at.len(), 19);
    }

    #[test]
    fn test_settings_url_joins_base_and_endpoint() {
        let settings = PlatformSettings {
            platform: Platform::Weibo,
            display_name: "微博".into(),
            base_url: "https://weibo.com/".into(),
            endpoint: "/ajax/side/hotSearch".into(),
            enabled: true,
            timeout: Duration::from_secs(10),
        };
        assert_eq!(settings.url(), "https://weibo.com/ajax/side/hotSearch");
    }
}
