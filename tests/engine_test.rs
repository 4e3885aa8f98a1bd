use httpmock::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use trend_harvest::core::aggregator::Artifact;
use trend_harvest::utils::clock::FixedClock;
use trend_harvest::utils::logger::Logger;
use trend_harvest::{HarvestConfig, Platform, TrendingEngine};

fn config_for(server: &MockServer, temp_dir: &TempDir) -> HarvestConfig {
    let root = temp_dir.path().display();
    HarvestConfig::from_toml_str(&format!(
        r#"
[http]
max_retries = 2
retry_delay_ms = 5

[storage]
data_root = "{root}/data"
api_root = "{root}/api"
api_base_uri = "https://example.com/api"
retention_days = 30

[platforms.weibo]
base_url = "{base}"

[platforms.csdn]
base_url = "{base}"

[platforms.toutiao]
base_url = "{base}"
enabled = false
"#,
        root = root,
        base = server.base_url()
    ))
    .unwrap()
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at_local(2024, 5, 20, 10, 30, 0).unwrap())
}

fn weibo_payload() -> Value {
    json!({
        "ok": 1,
        "data": {
            "realtime": [
                {"word": "话题甲", "raw_hot": "1234567", "category": "社会"},
                {"word": "话题乙", "raw_hot": "2345678"}
            ]
        }
    })
}

fn read_json(path: impl AsRef<Path>) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_cycle_isolates_failed_platform() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let weibo = server
        .mock_async(|when, then| {
            when.method(GET).path("/ajax/side/hotSearch");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(weibo_payload());
        })
        .await;
    let csdn = server
        .mock_async(|when, then| {
            when.method(GET).path("/phoenix/web/blog/hotRank");
            then.status(503);
        })
        .await;

    let temp_dir = TempDir::new()?;
    let config = config_for(&server, &temp_dir);
    let engine = TrendingEngine::from_config(&config, clock(), Logger::new("engine-test"))?;

    let report = engine
        .fetch(Some(&[Platform::Weibo, Platform::Csdn]))
        .await;

    assert_eq!(report.total_records(), 2);
    assert_eq!(report.succeeded_platforms(), 1);
    assert_eq!(report.failed_platforms(), 1);
    assert!(report.has_failures());

    let view = report.keyed_view();
    assert_eq!(view.len(), 1);
    let records = &view[&Platform::Weibo];
    assert_eq!(records[0].title, "话题乙");
    assert_eq!(records[1].title, "话题甲");
    assert!(records.iter().all(|r| r.source_platform == Platform::Weibo));

    let failed = report.outcome(Platform::Csdn).unwrap();
    assert!(!failed.succeeded());
    assert!(failed.records().is_empty());
    assert!(failed.error_message().unwrap().contains("503"));

    weibo.assert_hits_async(1).await;
    csdn.assert_hits_async(2).await;
    Ok(())
}

#[tokio::test]
async fn test_default_selection_skips_disabled_platforms() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let toutiao = server
        .mock_async(|when, then| {
            when.method(GET).path("/hot-event/hot-board/");
            then.status(200).json_body(json!({"data": []}));
        })
        .await;

    let temp_dir = TempDir::new()?;
    let config = config_for(&server, &temp_dir);
    let engine = TrendingEngine::from_config(&config, clock(), Logger::new("engine-test"))?;

    let selected = engine.scheduler().selection(None);
    assert!(selected.contains(&Platform::Weibo));
    assert!(selected.contains(&Platform::Csdn));
    assert!(!selected.contains(&Platform::Toutiao));
    assert!(!selected.contains(&Platform::Zhihu));

    // 明確指定時即使停用也會抓取
    let report = engine.fetch(Some(&[Platform::Toutiao])).await;
    let outcome = report.outcome(Platform::Toutiao).unwrap();
    assert!(outcome.succeeded());
    assert!(outcome.records().is_empty());
    toutiao.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_run_writes_raw_and_api_trees() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/ajax/side/hotSearch");
            then.status(200).json_body(weibo_payload());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/phoenix/web/blog/hotRank");
            then.status(200)
                .json_body(json!({"code": 400, "message": "bad request", "data": []}));
        })
        .await;

    let temp_dir = TempDir::new()?;
    let config = config_for(&server, &temp_dir);
    let engine = TrendingEngine::from_config(&config, clock(), Logger::new("engine-test"))?;

    let summary = engine
        .run(Some(&[Platform::Weibo, Platform::Csdn]))
        .await;

    assert!(summary.has_failures());
    assert!(summary.persist.is_clean());
    assert_eq!(summary.report.failed_platforms(), 1);

    let data = temp_dir.path().join("data");
    let api = temp_dir.path().join("api");

    let raw = read_json(data.join("2024-05-20/weibo.json"));
    assert_eq!(raw["platform"], "weibo");
    assert_eq!(raw["items"].as_array().unwrap().len(), 2);
    assert!(!data.join("2024-05-20/csdn.json").exists());

    let now = read_json(api.join("weibo-top-search/now.json"));
    assert_eq!(now["id"], "weibo-top-search");
    assert_eq!(now["data"][0]["title"], "话题乙");
    assert!(!api.join("csdn-hot").exists());

    let index = read_json(api.join("weibo-top-search/history.json"));
    assert_eq!(index["history"][0]["date"], "2024-05-20");
    assert_eq!(
        index["history"][0]["uri"],
        "https://example.com/api/weibo-top-search/history/2024-05-20.json"
    );

    let providers = read_json(api.join("provider.json"));
    let ids: Vec<&str> = providers["provider"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["weibo-top-search"]);
    Ok(())
}

#[tokio::test]
async fn test_run_twice_appends_history_batches() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/ajax/side/hotSearch");
            then.status(200).json_body(weibo_payload());
        })
        .await;

    let temp_dir = TempDir::new()?;
    let config = config_for(&server, &temp_dir);
    let engine = TrendingEngine::from_config(&config, clock(), Logger::new("engine-test"))?;

    let first = engine.run(Some(&[Platform::Weibo])).await;
    let now_path = temp_dir.path().join("api/weibo-top-search/now.json");
    let now_after_first = std::fs::read(&now_path)?;

    let second = engine.run(Some(&[Platform::Weibo])).await;
    let now_after_second = std::fs::read(&now_path)?;

    assert!(!first.has_failures());
    assert!(!second.has_failures());
    assert_eq!(now_after_first, now_after_second);

    let day = read_json(
        temp_dir
            .path()
            .join("api/weibo-top-search/history/2024-05-20.json"),
    );
    assert_eq!(day["id"], "weibo-top-search.history.2024-05-20");
    assert_eq!(day["data"].as_array().unwrap().len(), 2);

    let index = read_json(temp_dir.path().join("api/weibo-top-search/history.json"));
    assert_eq!(index["history"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_run_sweeps_expired_snapshot_days() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/ajax/side/hotSearch");
            then.status(200).json_body(weibo_payload());
        })
        .await;

    let temp_dir = TempDir::new()?;
    let data = temp_dir.path().join("data");
    for day in ["2024-01-02", "2024-04-25"] {
        std::fs::create_dir_all(data.join(day))?;
        std::fs::write(data.join(day).join("weibo.json"), b"{}")?;
    }

    let config = config_for(&server, &temp_dir);
    let engine = TrendingEngine::from_config(&config, clock(), Logger::new("engine-test"))?;
    let summary = engine.run(Some(&[Platform::Weibo])).await;

    assert_eq!(summary.removed_dates.len(), 1);
    assert!(!data.join("2024-01-02").exists());
    assert!(data.join("2024-04-25").exists());
    assert!(data.join("2024-05-20").exists());
    assert!(!summary
        .persist
        .failures
        .iter()
        .any(|f| f.artifact == Artifact::RawSnapshot));
    Ok(())
}
