use crate::adapters::support::{
    absolute_url, element_text, finalize_records, require_rows, selector, RecordDraft,
};
use crate::adapters::AdapterBase;
use crate::domain::model::{Platform, TrendingRecord};
use crate::domain::ports::SourceAdapter;
use crate::utils::error::Result;
use async_trait::async_trait;
use scraper::Html;

pub const MAX_TOPICS: usize = 30;
const SITE: &str = "https://www.v2ex.com";
const TOPIC_CSS: &str = "span.item_hot_topic_title";

pub struct V2exAdapter {
    base: AdapterBase,
}

impl V2exAdapter {
    pub fn new(base: AdapterBase) -> Self {
        Self { base }
    }
}

/// 熱議主題：`span.item_hot_topic_title a`
pub fn parse_html(html: &str, fetched_at: i64) -> Result<Vec<TrendingRecord>> {
    let document = Html::parse_document(html);
    let containers = selector("v2ex", TOPIC_CSS)?;
    require_rows(&document, &containers, "v2ex", TOPIC_CSS)?;
    let links = selector("v2ex", "span.item_hot_topic_title a[href]")?;

    let drafts = document
        .select(&links)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            Some(RecordDraft {
                url: Some(absolute_url(SITE, href.trim())),
                ..RecordDraft::new(element_text(a)?)
            })
        })
        .take(MAX_TOPICS);

    Ok(finalize_records(Platform::V2ex, fetched_at, drafts))
}

#[async_trait]
impl SourceAdapter for V2exAdapter {
    fn platform(&self) -> Platform {
        Platform::V2ex
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
                .warn("Hot topic entries found but none had a title and link");
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;

    #[test]
    fn test_parse_hot_topics() {
        let html = r#"
            <div id="TopicsHot">
              <table><tr><td>
                <span class="item_hot_topic_title"><a href="/t/1001">第一个话题</a></span>
              </td></tr></table>
              <table><tr><td>
                <span class="item_hot_topic_title"><a href="https://www.v2ex.com/t/1002">  第二个
                  话题 </a></span>
              </td></tr></table>
              <span class="item_hot_topic_title"><a href="/t/1003"></a></span>
              <span class="other"><a href="/t/9">not hot</a></span>
            </div>
        "#;

        let records = parse_html(html, 2).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "第一个话题");
        assert_eq!(records[0].url.as_deref(), Some("https://www.v2ex.com/t/1001"));
        assert_eq!(records[1].title, "第二个 话题");
        assert!(records[0].hot_score.is_none());
    }

    #[test]
    fn test_caps_at_thirty_topics() {
        let html: String = (0..40)
            .map(|i| {
                format!(
                    r#"<span class="item_hot_topic_title"><a href="/t/{i}">topic {i}</a></span>"#
                )
            })
            .collect();
        assert_eq!(parse_html(&html, 0).unwrap().len(), MAX_TOPICS);
    }

    #[test]
    fn test_page_without_topic_list_is_parse_error() {
        let err = parse_html("<html><body>维护中</body></html>", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_topics_without_links_are_empty() {
        let html = r#"<span class="item_hot_topic_title">没有链接</span>"#;
        assert!(parse_html(html, 0).unwrap().is_empty());
    }
}
