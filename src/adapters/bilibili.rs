use crate::adapters::support::{finalize_records, format_hot_score, sort_by_hot_desc, RecordDraft};
use crate::adapters::AdapterBase;
use crate::domain::model::{Platform, TrendingRecord};
use crate::domain::ports::SourceAdapter;
use crate::utils::error::{HarvestError, Result};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BilibiliResponse {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<BilibiliData>,
}

#[derive(Debug, Deserialize)]
pub struct BilibiliData {
    #[serde(default)]
    pub list: Vec<BilibiliVideo>,
}

#[derive(Debug, Deserialize)]
pub struct BilibiliVideo {
    #[serde(default)]
    pub bvid: Option<String>,
    #[serde(default)]
    pub aid: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "desc")]
    pub description: Option<String>,
    #[serde(default)]
    pub pic: Option<String>,
    #[serde(default)]
    pub tname: Option<String>,
    #[serde(default)]
    pub owner: Option<BilibiliOwner>,
    #[serde(default)]
    pub stat: Option<BilibiliStat>,
}

#[derive(Debug, Deserialize)]
pub struct BilibiliOwner {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BilibiliStat {
    #[serde(default)]
    pub view: Option<u64>,
}

impl BilibiliVideo {
    fn video_url(&self) -> Option<String> {
        match (&self.bvid, self.aid) {
            (Some(bvid), _) if !bvid.is_empty() => {
                Some(format!("https://www.bilibili.com/video/{}", bvid))
            }
            (_, Some(aid)) => Some(format!("https://www.bilibili.com/video/av{}", aid)),
            _ => None,
        }
    }
}

pub struct BilibiliAdapter {
    base: AdapterBase,
}

impl BilibiliAdapter {
    pub fn new(base: AdapterBase) -> Self {
        Self { base }
    }
}

/// `code != 0` 代表 API 回報錯誤
pub fn parse_response(payload: BilibiliResponse, fetched_at: i64) -> Result<Vec<TrendingRecord>> {
    if payload.code != 0 {
        return Err(HarvestError::validation(
            "bilibili",
            format!("API returned code={} ({})", payload.code, payload.message),
        ));
    }

    let list = payload.data.map(|d| d.list).unwrap_or_default();
    let mut drafts: Vec<RecordDraft> = list
        .into_iter()
        .map(|video| {
            let hot_score = video.stat.as_ref().and_then(|s| s.view).filter(|v| *v > 0);
            RecordDraft {
                url: video.video_url(),
                hot_score,
                hot_text: hot_score.map(format_hot_score),
                category: video.tname,
                description: video.description,
                cover_image: video.pic,
                author: video.owner.and_then(|o| o.name),
                ..RecordDraft::new(video.title)
            }
        })
        .collect();

    sort_by_hot_desc(&mut drafts);
    Ok(finalize_records(Platform::Bilibili, fetched_at, drafts))
}

#[async_trait]
impl SourceAdapter for BilibiliAdapter {
    fn platform(&self) -> Platform {
        Platform::Bilibili
    }

    async fn fetch_trending(&self) -> Result<Vec<TrendingRecord>> {
        let options = self
            .base
            .request()
            .header("Referer", "https://www.bilibili.com")
            .header("Origin", "https://www.bilibili.com")
            .header("Sec-Fetch-Site", "same-site");

        let payload: BilibiliResponse = self
            .base
            .ctx
            .http
            .get_json(&self.base.url(), &options, "bilibili")
            .await?;

        parse_response(payload, self.base.now_millis())
    }
}
