use crate::domain::model::{Platform, TrendingRecord};
use crate::utils::error::{HarvestError, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::OnceLock;

/// `<platform>_<sha256(platform|position|title|url) 前 16 碼>`
pub fn record_id(platform: Platform, position: usize, title: &str, url: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(platform.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(position.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(url.unwrap_or_default().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}_{}", platform, &digest[..16])
}

fn hot_value_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(万|亿)?").ok())
        .as_ref()
}

/// "100万+热" -> 1_000_000，"1.2亿" -> 120_000_000，"3,456" -> 3456
pub fn parse_hot_value(text: &str) -> Option<u64> {
    let cleaned = text.replace(',', "");
    let caps = hot_value_pattern()?.captures(&cleaned)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("万") => 10_000.0,
        Some("亿") => 100_000_000.0,
        _ => 1.0,
    };
    score_from_f64(value * multiplier)
}

/// 非有限值或非正數視為沒有熱度
pub fn score_from_f64(value: f64) -> Option<u64> {
    if value.is_finite() && value > 0.0 {
        Some(value.floor() as u64)
    } else {
        None
    }
}

/// 以相同單位顯示熱度
pub fn format_hot_score(score: u64) -> String {
    if score >= 100_000_000 {
        format!("{:.1}亿", score as f64 / 100_000_000.0)
    } else if score >= 10_000 {
        format!("{:.1}万", score as f64 / 10_000.0)
    } else {
        score.to_string()
    }
}

/// 站內相對連結補上網域
pub fn absolute_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), href)
    }
}

pub fn selector(context: &str, css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| HarvestError::parse(context, format!("selector {}: {:?}", css, e)))
}

/// 整頁找不到列容器代表版面已改，回傳 Parse 錯誤
pub fn require_rows(document: &Html, rows: &Selector, context: &str, css: &str) -> Result<()> {
    if document.select(rows).next().is_none() {
        return Err(HarvestError::parse(
            context,
            format!("no `{}` in page; markup may have changed", css),
        ));
    }
    Ok(())
}

/// 元素內所有文字節點，已清理空白
pub fn element_text(element: ElementRef<'_>) -> Option<String> {
    clean_text(&element.text().collect::<String>())
}

/// 在 `scope` 中第一個符合 `selector` 的元素
pub fn first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// 去除前後空白並合併連續空白；空字串回傳 None
pub fn clean_text(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn clean_opt(value: Option<String>) -> Option<String> {
    value.and_then(|v| clean_text(&v))
}

/// adapter 解析出來、尚未正規化的項目
#[derive(Debug, Clone, Default)]
pub struct RecordDraft {
    pub title: String,
    pub url: Option<String>,
    pub hot_score: Option<u64>,
    pub hot_text: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
}

impl RecordDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// 正規化：丟掉沒有標題的項目、清掉空的選填欄位、依序配發 id，
/// 同一批次中 id 不重複。
pub fn finalize_records<I>(platform: Platform, fetched_at: i64, drafts: I) -> Vec<TrendingRecord>
where
    I: IntoIterator<Item = RecordDraft>,
{
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for draft in drafts {
        let Some(title) = clean_text(&draft.title) else {
            continue;
        };
        let url = clean_opt(draft.url);
        let id = record_id(platform, records.len() + 1, &title, url.as_deref());
        if !seen.insert(id.clone()) {
            continue;
        }

        records.push(TrendingRecord {
            id,
            title,
            url,
            hot_score: draft.hot_score,
            hot_text: clean_opt(draft.hot_text),
            category: clean_opt(draft.category),
            tags: draft
                .tags
                .iter()
                .filter_map(|t| clean_text(t))
                .collect(),
            description: clean_opt(draft.description),
            cover_image: clean_opt(draft.cover_image),
            author: clean_opt(draft.author),
            fetched_at,
            source_platform: platform,
        });
    }

    records
}

/// 依熱度由高到低排序，沒有熱度的排最後（穩定排序）
pub fn sort_by_hot_desc(drafts: &mut [RecordDraft]) {
    drafts.sort_by(|a, b| b.hot_score.unwrap_or(0).cmp(&a.hot_score.unwrap_or(0)));
}
