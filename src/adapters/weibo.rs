use crate::adapters::support::{
    finalize_records, format_hot_score, parse_hot_value, score_from_f64, sort_by_hot_desc,
    RecordDraft,
};
use crate::adapters::AdapterBase;
use crate::domain::model::{Platform, TrendingRecord};
use crate::domain::ports::SourceAdapter;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

const SEARCH_URL: &str = "https://s.weibo.com/weibo";

#[derive(Debug, Deserialize)]
pub struct WeiboResponse {
    pub data: WeiboData,
}

#[derive(Debug, Deserialize)]
pub struct WeiboData {
    pub realtime: Vec<WeiboItem>,
}

#[derive(Debug, Deserialize)]
pub struct WeiboItem {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub word_cut: Option<String>,
    #[serde(default)]
    pub raw_hot: Option<String>,
    #[serde(default)]
    pub hot_score: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub icon_desc: Option<String>,
}

pub struct WeiboAdapter {
    base: AdapterBase,
}

impl WeiboAdapter {
    pub fn new(base: AdapterBase) -> Self {
        Self { base }
    }
}

/// 話題搜尋頁；話題文字含空白、`#`、`&` 時需要編碼
pub fn search_url(topic: &str) -> Option<String> {
    let q = format!("#{}#", topic.trim());
    Url::parse_with_params(SEARCH_URL, &[("q", q.as_str())])
        .ok()
        .map(String::from)
}

pub fn parse_response(payload: WeiboResponse, fetched_at: i64) -> Vec<TrendingRecord> {
    let mut drafts: Vec<RecordDraft> = payload
        .data
        .realtime
        .into_iter()
        .map(|item| {
            let hot_score = item
                .hot_score
                .and_then(score_from_f64)
                .or_else(|| item.raw_hot.as_deref().and_then(parse_hot_value));
            let url = search_url(item.word_cut.as_deref().unwrap_or(&item.word));

            RecordDraft {
                url,
                hot_text: item.raw_hot.clone().or_else(|| hot_score.map(format_hot_score)),
                hot_score,
                category: item.category.clone().or_else(|| item.icon_desc.clone()),
                ..RecordDraft::new(item.word)
            }
        })
        .collect();

    sort_by_hot_desc(&mut drafts);
    finalize_records(Platform::Weibo, fetched_at, drafts)
}

#[async_trait]
impl SourceAdapter for WeiboAdapter {
    fn platform(&self) -> Platform {
        Platform::Weibo
    }

    async fn fetch_trending(&self) -> Result<Vec<TrendingRecord>> {
        let options = self
            .base
            .request()
            .header("Referer", "https://weibo.com")
            .header("X-Requested-With", "XMLHttpRequest");

        let payload: WeiboResponse = self
            .base
            .ctx
            .http
            .get_json(&self.base.url(), &options, "weibo")
            .await?;

        let records = parse_response(payload, self.base.now_millis());
        self.base
            .ctx
            .log
            .debug(&format!("Parsed {} hot searches", records.len()));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_realtime_list() {
        let json = r#"{
            "ok": 1,
            "data": {
                "realtime": [
                    {"word": "低热度", "word_cut": "低热度", "raw_hot": "12万"},
                    {"word": "高热度", "word_cut": "高热度", "hot_score": 2500000, "category": "社会"},
                    {"word": "", "raw_hot": "99万"},
                    {"word": "无热度", "icon_desc": "新"}
                ]
            }
        }"#;
        let payload: WeiboResponse = serde_json::from_str(json).unwrap();

        let records = parse_response(payload, 1_000);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].title, "高热度");
        assert_eq!(records[0].hot_score, Some(2_500_000));
        assert_eq!(records[0].hot_text.as_deref(), Some("250.0万"));
        assert_eq!(records[0].category.as_deref(), Some("社会"));
        assert_eq!(records[1].hot_score, Some(120_000));
        assert_eq!(records[1].hot_text.as_deref(), Some("12万"));
        assert_eq!(records[2].hot_score, None);
        assert_eq!(records[2].category.as_deref(), Some("新"));
        assert!(records[0].url.as_deref().unwrap().starts_with("https://s.weibo.com/"));
    }

    #[test]
    fn test_search_url_encodes_topic() {
        let payload: WeiboResponse = serde_json::from_str(
            r#"{"data": {"realtime": [{"word": "A & B #1", "word_cut": "A & B #1", "raw_hot": "10"}]}}"#,
        )
        .unwrap();

        let records = parse_response(payload, 0);
        let url = Url::parse(records[0].url.as_deref().unwrap()).unwrap();

        assert_eq!(url.host_str(), Some("s.weibo.com"));
        assert_eq!(url.path(), "/weibo");
        assert!(url.fragment().is_none());
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("q".to_string(), "#A & B #1#".to_string())]);
    }

    #[test]
    fn test_missing_realtime_is_parse_error() {
        let result = serde_json::from_str::<WeiboResponse>(r#"{"data": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_list_is_success() {
        let payload: WeiboResponse =
            serde_json::from_str(r#"{"data": {"realtime": []}}"#).unwrap();
        assert!(parse_response(payload, 0).is_empty());
    }
}
