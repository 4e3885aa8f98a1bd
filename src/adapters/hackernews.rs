use crate::adapters::support::{finalize_records, RecordDraft};
use crate::adapters::AdapterBase;
use crate::domain::model::{Platform, TrendingRecord};
use crate::domain::ports::SourceAdapter;
use crate::utils::error::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;

/// 只取前 30 則
pub const MAX_STORIES: usize = 30;
/// 同時抓取的明細數
pub const DETAIL_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct HnItem {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<u64>,
    #[serde(default)]
    pub descendants: Option<u64>,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl HnItem {
    fn into_draft(self) -> Option<RecordDraft> {
        if self.dead || self.deleted {
            return None;
        }
        let title = self.title?;
        Some(RecordDraft {
            url: Some(
                self.url
                    .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", self.id)),
            ),
            hot_score: self.score,
            hot_text: self.score.map(|s| format!("{} points", s)),
            description: Some(format!("{} comments", self.descendants.unwrap_or(0))),
            author: self.by,
            ..RecordDraft::new(title)
        })
    }
}

pub struct HackernewsAdapter {
    base: AdapterBase,
}

impl HackernewsAdapter {
    pub fn new(base: AdapterBase) -> Self {
        Self { base }
    }

    fn item_url(&self, id: u64) -> String {
        format!(
            "{}/v0/item/{}.json",
            self.base.settings.base_url.trim_end_matches('/'),
            id
        )
    }

    /// 單則失敗只記錄並略過
    async fn fetch_item(&self, id: u64) -> Option<HnItem> {
        let options = self.base.request();
        let context = format!("hackernews item {}", id);
        match self
            .base
            .ctx
            .http
            .get_json::<Option<HnItem>>(&self.item_url(id), &options, &context)
            .await
        {
            Ok(item) => item,
            Err(e) => {
                self.base
                    .ctx
                    .log
                    .warn(&format!("Skipping item {}: {}", id, e));
                None
            }
        }
    }
}

pub fn build_records(items: Vec<HnItem>, fetched_at: i64) -> Vec<TrendingRecord> {
    finalize_records(
        Platform::Hackernews,
        fetched_at,
        items.into_iter().filter_map(HnItem::into_draft),
    )
}

#[async_trait]
impl SourceAdapter for HackernewsAdapter {
    fn platform(&self) -> Platform {
        Platform::Hackernews
    }

    async fn fetch_trending(&self) -> Result<Vec<TrendingRecord>> {
        let fetched_at = self.base.now_millis();
        let ids: Vec<u64> = self
            .base
            .ctx
            .http
            .get_json(&self.base.url(), &self.base.request(), "hackernews top stories")
            .await?;

        let items: Vec<HnItem> = stream::iter(ids.into_iter().take(MAX_STORIES))
            .map(|id| self.fetch_item(id))
            .buffered(DETAIL_CONCURRENCY)
            .filter_map(|item| async move { item })
            .collect()
            .await;

        Ok(build_records(items, fetched_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_map_to_records() {
        let items: Vec<HnItem> = serde_json::from_str(
            r#"[
                {"id": 1, "title": "Show HN: a thing", "url": "https://example.com", "score": 321, "descendants": 45, "by": "pg", "time": 1700000000},
                {"id": 2, "title": "Ask HN: no link", "score": 10, "by": "dang"},
                {"id": 3, "deleted": true},
                {"id": 4, "title": "flagged", "dead": true}
            ]"#,
        )
        .unwrap();

        let records = build_records(items, 11);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hot_score, Some(321));
        assert_eq!(records[0].hot_text.as_deref(), Some("321 points"));
        assert_eq!(records[0].description.as_deref(), Some("45 comments"));
        assert_eq!(records[0].author.as_deref(), Some("pg"));
        assert_eq!(
            records[1].url.as_deref(),
            Some("https://news.ycombinator.com/item?id=2")
        );
        assert_eq!(records[1].description.as_deref(), Some("0 comments"));
    }
}
