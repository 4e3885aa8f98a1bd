use crate::config::platforms::builtin_platforms;
use crate::domain::model::{Platform, PlatformSettings};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{HarvestError, Result};
use crate::utils::validation::{
    validate_base_uri, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DATA_ROOT: &str = "./data";
pub const DEFAULT_API_ROOT: &str = "./api";
pub const DEFAULT_API_BASE_URI: &str = "/api";
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

/// 設定檔內容；所有欄位皆可省略，省略時使用內建預設
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub http: HttpConfig,
    pub storage: StorageConfig,
    /// 以平台標籤為鍵，例如 `[platforms.weibo]`
    pub platforms: BTreeMap<String, PlatformOverride>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    /// 套用到沒有個別設定 timeout_ms 的平台
    pub default_timeout_ms: Option<u64>,
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_root: Option<String>,
    pub api_root: Option<String>,
    pub api_base_uri: Option<String>,
    /// 0 表示不清理
    pub retention_days: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformOverride {
    pub display_name: Option<String>,
    pub base_url: Option<String>,
    pub endpoint: Option<String>,
    pub enabled: Option<bool>,
    pub timeout_ms: Option<u64>,
}

impl HarvestConfig {
    /// 從 TOML 檔案載入並驗證
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 只解析，不驗證
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| HarvestError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換 `${VAR_NAME}`；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| HarvestError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 鍵與 `Platform::from_str` 同樣不分大小寫，`[platforms.Weibo]` 也算 weibo
    pub fn platform_override(&self, platform: Platform) -> Option<&PlatformOverride> {
        self.platforms
            .iter()
            .find(|(tag, _)| tag.parse::<Platform>().ok() == Some(platform))
            .map(|(_, o)| o)
    }

    /// 內建平台表加上設定檔覆寫
    pub fn resolved_platforms(&self) -> Vec<PlatformSettings> {
        builtin_platforms()
            .into_iter()
            .map(|mut settings| {
                if let Some(ms) = self.http.default_timeout_ms {
                    settings.timeout = Duration::from_millis(ms);
                }
                if let Some(o) = self.platform_override(settings.platform) {
                    if let Some(name) = &o.display_name {
                        settings.display_name = name.clone();
                    }
                    if let Some(base_url) = &o.base_url {
                        settings.base_url = base_url.clone();
                    }
                    if let Some(endpoint) = &o.endpoint {
                        settings.endpoint = endpoint.clone();
                    }
                    if let Some(enabled) = o.enabled {
                        settings.enabled = enabled;
                    }
                    if let Some(ms) = o.timeout_ms {
                        settings.timeout = Duration::from_millis(ms);
                    }
                }
                settings
            })
            .collect()
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(retries) = self.http.max_retries {
            validate_range("http.max_retries", retries, 1, 10)?;
        }
        if let Some(ms) = self.http.default_timeout_ms {
            validate_positive_number("http.default_timeout_ms", ms, 1)?;
        }
        if let Some(limit) = self.http.max_concurrency {
            validate_positive_number("http.max_concurrency", limit, 1)?;
        }

        if let Some(root) = &self.storage.data_root {
            validate_path("storage.data_root", root)?;
        }
        if let Some(root) = &self.storage.api_root {
            validate_path("storage.api_root", root)?;
        }
        if let Some(uri) = &self.storage.api_base_uri {
            validate_base_uri("storage.api_base_uri", uri)?;
        }

        let mut seen = std::collections::BTreeSet::new();
        for (tag, o) in &self.platforms {
            let platform: Platform = tag.parse()?;
            if !seen.insert(platform) {
                return Err(HarvestError::InvalidConfigValueError {
                    field: "platforms".to_string(),
                    value: tag.clone(),
                    reason: format!("{} is configured more than once", platform),
                });
            }
            let field = |name: &str| format!("platforms.{}.{}", platform, name);

            if let Some(name) = &o.display_name {
                validate_non_empty_string(&field("display_name"), name)?;
            }
            if let Some(base_url) = &o.base_url {
                validate_url(&field("base_url"), base_url)?;
            }
            if let Some(ms) = o.timeout_ms {
                validate_positive_number(&field("timeout_ms"), ms, 1)?;
            }
        }

        for settings in self.resolved_platforms() {
            validate_url(&format!("platforms.{}", settings.platform), &settings.url())?;
        }

        Ok(())
    }
}

impl Validate for HarvestConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

impl ConfigProvider for HarvestConfig {
    fn platform_settings(&self) -> Vec<PlatformSettings> {
        self.resolved_platforms()
    }

    fn max_retries(&self) -> u32 {
        self.http
            .max_retries
            .unwrap_or(crate::core::http_client::DEFAULT_MAX_RETRIES)
    }

    fn retry_delay(&self) -> Duration {
        self.http
            .retry_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(crate::core::http_client::DEFAULT_RETRY_DELAY)
    }

    fn max_concurrency(&self) -> Option<usize> {
        self.http.max_concurrency
    }

    fn data_root(&self) -> &str {
        self.storage.data_root.as_deref().unwrap_or(DEFAULT_DATA_ROOT)
    }

    fn api_root(&self) -> &str {
        self.storage.api_root.as_deref().unwrap_or(DEFAULT_API_ROOT)
    }

    fn api_base_uri(&self) -> &str {
        self.storage
            .api_base_uri
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URI)
    }

    fn retention_days(&self) -> Option<u32> {
        match self.storage.retention_days {
            Some(0) => None,
            Some(days) => Some(days),
            None => Some(DEFAULT_RETENTION_DAYS),
        }
    }
}
