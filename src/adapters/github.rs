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

const SITE: &str = "https://github.com";
const ROW_CSS: &str = "article.Box-row";

pub struct GithubAdapter {
    base: AdapterBase,
}

impl GithubAdapter {
    pub fn new(base: AdapterBase) -> Self {
        Self { base }
    }
}

/// 每個 `article.Box-row` 是一個 repo；標題取 `owner/repo`
pub fn parse_html(html: &str, fetched_at: i64) -> Result<Vec<TrendingRecord>> {
    let document = Html::parse_document(html);
    let rows = selector("github", ROW_CSS)?;
    require_rows(&document, &rows, "github", ROW_CSS)?;
    let link = selector("github", "h2 a[href]")?;
    let description = selector("github", "p.col-9.color-fg-muted")?;
    let language = selector("github", r#"[itemprop="programmingLanguage"]"#)?;
    let stars_today = selector("github", "span.d-inline-block.float-sm-right")?;

    let drafts: Vec<RecordDraft> = document
        .select(&rows)
        .filter_map(|row| {
            let href = first(row, &link)?.value().attr("href")?;
            let path = href.trim().trim_matches('/');
            if path.is_empty() {
                return None;
            }
            let stars = first(row, &stars_today).and_then(element_text);

            Some(RecordDraft {
                url: Some(absolute_url(SITE, path)),
                hot_score: stars.as_deref().and_then(parse_hot_value),
                hot_text: stars,
                category: first(row, &language).and_then(element_text),
                description: first(row, &description).and_then(element_text),
                ..RecordDraft::new(path.replace(' ', ""))
            })
        })
        .collect();

    Ok(finalize_records(Platform::Github, fetched_at, drafts))
}

#[async_trait]
impl SourceAdapter for GithubAdapter {
    fn platform(&self) -> Platform {
        Platform::Github
    }

    async fn fetch_trending(&self) -> Result<Vec<TrendingRecord>> {
        let options = self.base.request().header("Referer", SITE);
        let html = self
            .base
            .ctx
            .http
            .get_text(&self.base.url(), &options)
            .await?;

        let records = parse_html(&html, self.base.now_millis())?;
        if records.is_empty() {
            self.base
                .ctx
                .log
                .warn("Trending rows found but none had a repository link");
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;

    const PAGE: &str = r#"
        <main>
          <article class="Box-row">
            <h2 class="h3 lh-condensed">
              <a href="/tokio-rs/tokio" class="Link">
                <span class="text-normal">tokio-rs /</span> tokio
              </a>
            </h2>
            <p class="col-9 color-fg-muted my-1 pr-4">
              A runtime for writing reliable asynchronous applications
              with Rust.
            </p>
            <div class="f6 color-fg-muted mt-2">
              <span itemprop="programmingLanguage">Rust</span>
              <span class="d-inline-block float-sm-right">1,234 stars today</span>
            </div>
          </article>
          <article class="Box-row">
            <h2 class="h3 lh-condensed"><a href="/serde-rs/serde">serde</a></h2>
          </article>
          <article class="Box-row"><h2>no link</h2></article>
        </main>
    "#;

    #[test]
    fn test_parse_trending_rows() {
        let records = parse_html(PAGE, 4).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "tokio-rs/tokio");
        assert_eq!(records[0].url.as_deref(), Some("https://github.com/tokio-rs/tokio"));
        assert_eq!(
            records[0].description.as_deref(),
            Some("A runtime for writing reliable asynchronous applications with Rust.")
        );
        assert_eq!(records[0].category.as_deref(), Some("Rust"));
        assert_eq!(records[0].hot_score, Some(1234));
        assert_eq!(records[0].hot_text.as_deref(), Some("1,234 stars today"));

        assert_eq!(records[1].title, "serde-rs/serde");
        assert!(records[1].description.is_none());
        assert!(records[1].hot_score.is_none());
    }

    #[test]
    fn test_missing_rows_is_parse_error() {
        let err = parse_html(r#"<div class="Box"><p>Trending is loading</p></div>"#, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
