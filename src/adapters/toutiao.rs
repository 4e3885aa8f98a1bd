use crate::adapters::support::{
    finalize_records, format_hot_score, parse_hot_value, sort_by_hot_desc, RecordDraft,
};
use crate::adapters::AdapterBase;
use crate::domain::model::{Platform, TrendingRecord};
use crate::domain::ports::SourceAdapter;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ToutiaoResponse {
    pub data: Vec<ToutiaoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ToutiaoItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    /// 字串形式的數字，例如 "12345678"
    #[serde(default)]
    pub hot_value: Option<String>,
    #[serde(default)]
    pub label_desc: Option<String>,
    #[serde(default)]
    pub image: Option<ToutiaoImage>,
}

#[derive(Debug, Deserialize)]
pub struct ToutiaoImage {
    #[serde(default)]
    pub url: Option<String>,
}

pub struct ToutiaoAdapter {
    base: AdapterBase,
}

impl ToutiaoAdapter {
    pub fn new(base: AdapterBase) -> Self {
        Self { base }
    }
}

pub fn parse_response(payload: ToutiaoResponse, fetched_at: i64) -> Vec<TrendingRecord> {
    let mut drafts: Vec<RecordDraft> = payload
        .data
        .into_iter()
        .map(|item| {
            let hot_score = item.hot_value.as_deref().and_then(parse_hot_value);
            RecordDraft {
                url: item.url,
                hot_score,
                hot_text: hot_score.map(format_hot_score),
                category: item.label_desc,
                cover_image: item.image.and_then(|i| i.url),
                ..RecordDraft::new(item.title)
            }
        })
        .collect();

    sort_by_hot_desc(&mut drafts);
    finalize_records(Platform::Toutiao, fetched_at, drafts)
}

#[async_trait]
impl SourceAdapter for ToutiaoAdapter {
    fn platform(&self) -> Platform {
        Platform::Toutiao
    }

    async fn fetch_trending(&self) -> Result<Vec<TrendingRecord>> {
        let options = self
            .base
            .request()
            .header("Referer", "https://www.toutiao.com")
            .header("Accept", "application/json");

        let payload: ToutiaoResponse = self
            .base
            .ctx
            .http
            .get_json(&self.base.url(), &options, "toutiao")
            .await?;

        Ok(parse_response(payload, self.base.now_millis()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hot_board() {
        let json = r#"{
            "data": [
                {"ClusterId": 1, "Title": "第二", "Url": "https://www.toutiao.com/trending/1/", "HotValue": "350000", "LabelDesc": "热"},
                {"ClusterId": 2, "Title": "第一", "Url": "https://www.toutiao.com/trending/2/", "HotValue": "28000000",
                 "Image": {"url": "https://p3.toutiaoimg.com/x.jpeg"}},
                {"ClusterId": 3, "Title": "  "}
            ],
            "fixed_top_data": []
        }"#;
        let payload: ToutiaoResponse = serde_json::from_str(json).unwrap();

        let records = parse_response(payload, 5);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "第一");
        assert_eq!(records[0].hot_score, Some(28_000_000));
        assert_eq!(records[0].hot_text.as_deref(), Some("2800.0万"));
        assert_eq!(records[0].cover_image.as_deref(), Some("https://p3.toutiaoimg.com/x.jpeg"));
        assert_eq!(records[1].category.as_deref(), Some("热"));
        assert!(records.iter().all(|r| r.source_platform == Platform::Toutiao));
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        assert!(serde_json::from_str::<ToutiaoResponse>(r#"{"data": {"list": []}}"#).is_err());
    }
}
