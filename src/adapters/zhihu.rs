use crate::adapters::support::{finalize_records, parse_hot_value, score_from_f64, sort_by_hot_desc, RecordDraft};
use crate::adapters::AdapterBase;
use crate::domain::model::{Platform, TrendingRecord};
use crate::domain::ports::SourceAdapter;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ZhihuResponse {
    pub data: Vec<ZhihuItem>,
}

#[derive(Debug, Deserialize)]
pub struct ZhihuItem {
    pub target: ZhihuTarget,
    #[serde(default)]
    pub detail_text: Option<String>,
    #[serde(default)]
    pub hot_value: Option<f64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ZhihuTarget {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub cover: Option<ZhihuCover>,
}

#[derive(Debug, Deserialize)]
pub struct ZhihuCover {
    #[serde(default)]
    pub url: Option<String>,
}

fn category(kind: &str) -> Option<String> {
    let label = match kind {
        "hot_list" => "热搜",
        "hot_topic" => "话题",
        "hot_question" => "问答",
        _ => return None,
    };
    Some(label.to_string())
}

/// API 回傳的是 api.zhihu.com 的連結，轉成網頁版
fn web_url(url: &str) -> String {
    url.replace("https://api.zhihu.com/questions/", "https://www.zhihu.com/question/")
}

pub struct ZhihuAdapter {
    base: AdapterBase,
}

impl ZhihuAdapter {
    pub fn new(base: AdapterBase) -> Self {
        Self { base }
    }
}

pub fn parse_response(payload: ZhihuResponse, fetched_at: i64) -> Vec<TrendingRecord> {
    let mut drafts: Vec<RecordDraft> = payload
        .data
        .into_iter()
        .map(|item| {
            let hot_score = item
                .hot_value
                .and_then(score_from_f64)
                .or_else(|| item.detail_text.as_deref().and_then(parse_hot_value));
            RecordDraft {
                url: item.target.url.as_deref().map(web_url),
                hot_score,
                hot_text: item.detail_text,
                category: item.kind.as_deref().and_then(category),
                description: item.target.excerpt,
                cover_image: item.target.cover.and_then(|c| c.url),
                ..RecordDraft::new(item.target.title)
            }
        })
        .collect();

    sort_by_hot_desc(&mut drafts);
    finalize_records(Platform::Zhihu, fetched_at, drafts)
}

#[async_trait]
impl SourceAdapter for ZhihuAdapter {
    fn platform(&self) -> Platform {
        Platform::Zhihu
    }

    async fn fetch_trending(&self) -> Result<Vec<TrendingRecord>> {
        let options = self
            .base
            .request()
            .header("Referer", "https://www.zhihu.com/hot");

        let payload: ZhihuResponse = self
            .base
            .ctx
            .http
            .get_json(&self.base.url(), &options, "zhihu")
            .await?;

        Ok(parse_response(payload, self.base.now_millis()))
    }
}
