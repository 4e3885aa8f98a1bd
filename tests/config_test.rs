use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use trend_harvest::domain::ports::ConfigProvider;
use trend_harvest::utils::clock::SystemClock;
use trend_harvest::utils::logger::Logger;
use trend_harvest::{ErrorKind, HarvestConfig, Platform, TrendingEngine};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_config_file_with_env_substitution() {
    std::env::set_var("TREND_HARVEST_IT_API_ROOT", "/srv/trending/api");

    let file = write_config(
        r#"
[http]
default_timeout_ms = 8000

[storage]
api_root = "${TREND_HARVEST_IT_API_ROOT}"
api_base_uri = "https://cdn.example.com/api/"

[platforms.hackernews]
enabled = true
timeout_ms = 45000
"#,
    );

    let config = HarvestConfig::from_file(file.path()).unwrap();

    assert_eq!(config.api_root(), "/srv/trending/api");
    assert_eq!(config.api_base_uri(), "https://cdn.example.com/api/");

    let settings = config.platform_settings();
    let hn = settings
        .iter()
        .find(|s| s.platform == Platform::Hackernews)
        .unwrap();
    assert!(hn.enabled);
    assert_eq!(hn.timeout.as_millis(), 45_000);

    let weibo = settings
        .iter()
        .find(|s| s.platform == Platform::Weibo)
        .unwrap();
    assert_eq!(weibo.timeout.as_millis(), 8_000);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let file = write_config(
        r#"
[http]
max_retries = 0
"#,
    );
    let err = HarvestConfig::from_file(file.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);

    let file = write_config(
        r#"
[platforms.myspace]
enabled = true
"#,
    );
    let err = HarvestConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("myspace"));

    let file = write_config("[storage\n");
    assert!(HarvestConfig::from_file(file.path()).is_err());
}

#[test]
fn test_engine_registers_every_builtin_platform() {
    let config = HarvestConfig::from_toml_str(
        r#"
[platforms.zhihu]
enabled = true
"#,
    )
    .unwrap();

    let engine =
        TrendingEngine::from_config(&config, Arc::new(SystemClock), Logger::new("config-test"))
            .unwrap();

    assert_eq!(
        engine.scheduler().registered_platforms().len(),
        Platform::ALL.len()
    );

    let selected = engine.scheduler().selection(None);
    assert_eq!(
        selected,
        vec![
            Platform::Zhihu,
            Platform::Weibo,
            Platform::Toutiao,
            Platform::Csdn
        ]
    );
}

#[test]
fn test_mixed_case_platform_key_disables_platform() {
    let file = write_config(
        r#"
[platforms.Weibo]
enabled = false
"#,
    );
    let config = HarvestConfig::from_file(file.path()).unwrap();

    let engine =
        TrendingEngine::from_config(&config, Arc::new(SystemClock), Logger::new("config-test"))
            .unwrap();

    let selected = engine.scheduler().selection(None);
    assert!(!selected.contains(&Platform::Weibo));
    assert_eq!(selected, vec![Platform::Toutiao, Platform::Csdn]);
}
