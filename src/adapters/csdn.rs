use crate::adapters::support::{finalize_records, parse_hot_value, sort_by_hot_desc, RecordDraft};
use crate::adapters::AdapterBase;
use crate::domain::model::{Platform, TrendingRecord};
use crate::domain::ports::SourceAdapter;
use crate::utils::error::{HarvestError, Result};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CsdnResponse {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Vec<CsdnItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdnItem {
    #[serde(default)]
    pub article_title: String,
    #[serde(default)]
    pub article_detail_url: Option<String>,
    #[serde(default)]
    pub hot_rank_score: Option<String>,
    #[serde(default)]
    pub nick_name: Option<String>,
    #[serde(default)]
    pub view_count: Option<String>,
    #[serde(default)]
    pub comment_count: Option<String>,
    #[serde(default)]
    pub favor_count: Option<String>,
}

pub struct CsdnAdapter {
    base: AdapterBase,
}

impl CsdnAdapter {
    pub fn new(base: AdapterBase) -> Self {
        Self { base }
    }
}

/// `code != 200` 代表 API 回報錯誤
pub fn parse_response(payload: CsdnResponse, fetched_at: i64) -> Result<Vec<TrendingRecord>> {
    if payload.code != 200 {
        return Err(HarvestError::validation(
            "csdn",
            format!(
                "API returned code={} ({})",
                payload.code,
                payload.message.unwrap_or_default()
            ),
        ));
    }

    let mut drafts: Vec<RecordDraft> = payload
        .data
        .into_iter()
        .map(|item| {
            let counts: Vec<String> = [
                ("浏览", &item.view_count),
                ("评论", &item.comment_count),
                ("收藏", &item.favor_count),
            ]
            .into_iter()
            .filter_map(|(label, count)| count.as_ref().map(|c| format!("{} {}", label, c)))
            .collect();

            RecordDraft {
                url: item.article_detail_url,
                hot_score: item.hot_rank_score.as_deref().and_then(parse_hot_value),
                hot_text: item.hot_rank_score.clone(),
                description: if counts.is_empty() {
                    None
                } else {
                    Some(counts.join(" · "))
                },
                author: item.nick_name,
                ..RecordDraft::new(item.article_title)
            }
        })
        .collect();

    sort_by_hot_desc(&mut drafts);
    Ok(finalize_records(Platform::Csdn, fetched_at, drafts))
}

#[async_trait]
impl SourceAdapter for CsdnAdapter {
    fn platform(&self) -> Platform {
        Platform::Csdn
    }

    async fn fetch_trending(&self) -> Result<Vec<TrendingRecord>> {
        let options = self
            .base
            .request()
            .header("Referer", "https://www.csdn.net")
            .header("Accept", "application/json");

        let payload: CsdnResponse = self
            .base
            .ctx
            .http
            .get_json(&self.base.url(), &options, "csdn")
            .await?;

        parse_response(payload, self.base.now_millis())
    }
}
