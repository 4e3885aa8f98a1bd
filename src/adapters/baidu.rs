use crate::adapters::support::{
    absolute_url, element_text, finalize_records, first, parse_hot_value, require_rows, selector,
    RecordDraft,
};
use crate::adapters::AdapterBase;
use crate::domain::model::{Platform, TrendingRecord};
use crate::domain::ports::SourceAdapter;
use crate::utils::error::Result;
use async_trait::async_trait;
use scraper::Html;

const SITE: &str = "https://top.baidu.com";
const ROW_CSS: &str = ".category-wrap_iQLoo";

pub struct BaiduAdapter {
    base: AdapterBase,
}

impl BaiduAdapter {
    pub fn new(base: AdapterBase) -> Self {
        Self { base }
    }
}

/// 熱搜榜的每一列是 `.category-wrap_iQLoo`；沒有標題或連結的列會被略過
pub fn parse_html(html: &str, fetched_at: i64) -> Result<Vec<TrendingRecord>> {
    let document = Html::parse_document(html);
    let rows = selector("baidu", ROW_CSS)?;
    require_rows(&document, &rows, "baidu", ROW_CSS)?;
    let title_text = selector("baidu", ".c-single-text-ellipsis")?;
    let link = selector("baidu", "a.title_dIF3B")?;
    let hot = selector("baidu", ".hot-index_1Bl1a")?;
    let desc = selector("baidu", ".hot-desc_1m_jR.large_nSuFU")?;
    let image = selector("baidu", ".img-wrapper_29V76 img")?;

    let drafts: Vec<RecordDraft> = document
        .select(&rows)
        .filter_map(|row| {
            let title = first(row, &title_text).and_then(element_text)?;
            let href = first(row, &link)?.value().attr("href")?;
            let hot_text = first(row, &hot).and_then(element_text);

            Some(RecordDraft {
                url: Some(absolute_url(SITE, href)),
                hot_score: hot_text.as_deref().and_then(parse_hot_value),
                hot_text,
                description: first(row, &desc)
                    .and_then(element_text)
                    .map(|d| d.replace("查看更多>", "")),
                cover_image: first(row, &image)
                    .and_then(|img| img.value().attr("src"))
                    .map(str::to_string),
                ..RecordDraft::new(title)
            })
        })
        .collect();

    Ok(finalize_records(Platform::Baidu, fetched_at, drafts))
}

#[async_trait]
impl SourceAdapter for BaiduAdapter {
    fn platform(&self) -> Platform {
        Platform::Baidu
    }

    async fn fetch_trending(&self) -> Result<Vec<TrendingRecord>> {
        let html = self
            .base
            .ctx
            .http
            .get_text(&self.base.url(), &self.base.request())
            .await?;

        let records = parse_html(&html, self.base.now_millis())?;
        if records.is_empty() {
            self.base
                .ctx
                .log
                .warn("Board rows found but none had a title and link");
        }
        Ok(records)
    }
}
