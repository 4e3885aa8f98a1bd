pub mod cli;
pub mod platforms;
pub mod toml_config;

pub use toml_config::HarvestConfig;

#[cfg(feature = "cli")]
use crate::domain::model::Platform;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "trend-harvest")]
#[command(about = "Fetch trending topics from multiple platforms and publish a static API tree")]
pub struct CliConfig {
    /// TOML 設定檔
    #[arg(long)]
    pub config: Option<String>,

    /// 只抓取這些平台（逗號分隔）；省略時抓取所有啟用的平台
    #[arg(long, value_delimiter = ',')]
    pub platforms: Vec<Platform>,

    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(long)]
    pub api_dir: Option<String>,

    #[arg(long)]
    pub retention_days: Option<u32>,

    #[arg(long)]
    pub max_concurrency: Option<usize>,

    #[arg(long, help = "Fetch and print without writing any files")]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU and memory around the cycle")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 設定檔（若有）加上命令列覆寫，並驗證結果
    pub fn load_settings(&self) -> Result<HarvestConfig> {
        let mut settings = match &self.config {
            Some(path) => HarvestConfig::from_file(path)?,
            None => HarvestConfig::default(),
        };

        if let Some(dir) = &self.data_dir {
            settings.storage.data_root = Some(dir.clone());
        }
        if let Some(dir) = &self.api_dir {
            settings.storage.api_root = Some(dir.clone());
        }
        if let Some(days) = self.retention_days {
            settings.storage.retention_days = Some(days);
        }
        if let Some(limit) = self.max_concurrency {
            settings.http.max_concurrency = Some(limit);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// 空列表代表「全部啟用的平台」
    pub fn requested_platforms(&self) -> Option<&[Platform]> {
        if self.platforms.is_empty() {
            None
        } else {
            Some(&self.platforms)
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::domain::ports::ConfigProvider;

    #[test]
    fn test_parse_platform_list() {
        let cli = CliConfig::parse_from(["trend-harvest", "--platforms", "weibo,csdn", "--dry-run"]);
        assert_eq!(cli.requested_platforms(), Some(&[Platform::Weibo, Platform::Csdn][..]));
        assert!(cli.dry_run);
    }

    #[test]
    fn test_unknown_platform_rejected_by_parser() {
        let result = CliConfig::try_parse_from(["trend-harvest", "--platforms", "weibo,douyin"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = CliConfig::parse_from([
            "trend-harvest",
            "--data-dir",
            "/tmp/d",
            "--retention-days",
            "7",
            "--max-concurrency",
            "4",
        ]);
        let settings = cli.load_settings().unwrap();
        assert_eq!(settings.data_root(), "/tmp/d");
        assert_eq!(settings.retention_days(), Some(7));
        assert_eq!(settings.max_concurrency(), Some(4));
        assert!(cli.requested_platforms().is_none());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let cli = CliConfig::parse_from(["trend-harvest", "--max-concurrency", "0"]);
        assert!(cli.load_settings().is_err());
    }
}
