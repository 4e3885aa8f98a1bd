use crate::adapters::{build_adapter, AdapterContext};
use crate::config::cli::LocalStorage;
use crate::core::aggregator::{Aggregator, PersistSummary};
use crate::core::api_tree::ApiTree;
use crate::core::http_client::{RetryPolicy, RetryingHttpClient};
use crate::core::raw_store::RawStore;
use crate::core::scheduler::{PlatformRegistration, Scheduler};
use crate::domain::model::{FetchReport, Platform};
use crate::domain::ports::{Clock, ConfigProvider, HttpTransport, Storage};
use crate::utils::error::Result;
use crate::utils::logger::Logger;
use chrono::NaiveDate;
use std::sync::Arc;

/// 一次週期的完整結果
#[derive(Debug)]
pub struct CycleSummary {
    pub date: NaiveDate,
    pub report: FetchReport,
    pub persist: PersistSummary,
    pub removed_dates: Vec<NaiveDate>,
}

impl CycleSummary {
    /// 任一平台失敗或有檔案寫入失敗
    pub fn has_failures(&self) -> bool {
        self.report.has_failures() || !self.persist.is_clean()
    }
}

/// 抓取 -> 寫入 -> 清理過期快照
pub struct TrendingEngine<S: Storage> {
    scheduler: Scheduler,
    aggregator: Aggregator<S>,
    clock: Arc<dyn Clock>,
    retention_days: Option<u32>,
    log: Logger,
}

impl<S: Storage> TrendingEngine<S> {
    pub fn new(
        scheduler: Scheduler,
        aggregator: Aggregator<S>,
        clock: Arc<dyn Clock>,
        log: Logger,
    ) -> Self {
        Self {
            scheduler,
            aggregator,
            clock,
            retention_days: None,
            log,
        }
    }

    pub fn with_retention(mut self, retention_days: Option<u32>) -> Self {
        self.retention_days = retention_days;
        self
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// 週期之間調整註冊表
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn aggregator(&self) -> &Aggregator<S> {
        &self.aggregator
    }

    /// 只抓取不寫入
    pub async fn fetch(&self, requested: Option<&[Platform]>) -> FetchReport {
        self.scheduler.run_cycle(requested).await
    }

    pub async fn run(&self, requested: Option<&[Platform]>) -> CycleSummary {
        let date = self.clock.today();
        let report = self.scheduler.run_cycle(requested).await;
        let persist = self.aggregator.persist(&report.keyed_view(), date).await;

        let removed_dates = match self.retention_days {
            Some(days) => match self
                .aggregator
                .raw_store()
                .cleanup_older_than(date, days)
                .await
            {
                Ok(removed) => removed,
                Err(e) => {
                    self.log.warn(&format!("Retention sweep failed: {}", e));
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        CycleSummary {
            date,
            report,
            persist,
            removed_dates,
        }
    }
}

impl TrendingEngine<LocalStorage> {
    /// 依設定組出整個引擎：HTTP 用戶端、adapter、Scheduler 與本機儲存
    pub fn from_config(
        config: &dyn ConfigProvider,
        clock: Arc<dyn Clock>,
        log: Logger,
    ) -> Result<Self> {
        let policy = RetryPolicy {
            max_retries: config.max_retries(),
            base_delay: config.retry_delay(),
        };
        let http = RetryingHttpClient::with_reqwest(policy, log.child("http"))?;
        Ok(Self::with_http(config, http, clock, log))
    }

    /// 使用指定的傳輸層（測試或自訂用戶端）
    pub fn from_config_with_transport(
        config: &dyn ConfigProvider,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        log: Logger,
    ) -> Self {
        let policy = RetryPolicy {
            max_retries: config.max_retries(),
            base_delay: config.retry_delay(),
        };
        let http = RetryingHttpClient::new(transport, policy, log.child("http"));
        Self::with_http(config, http, clock, log)
    }

    fn with_http(
        config: &dyn ConfigProvider,
        http: RetryingHttpClient,
        clock: Arc<dyn Clock>,
        log: Logger,
    ) -> Self {
        let ctx = AdapterContext::new(Arc::new(http), Arc::clone(&clock), log.child("Adapter"));

        let mut scheduler = Scheduler::new(Arc::clone(&clock), log.child("Scheduler"))
            .with_max_concurrency(config.max_concurrency());
        for settings in config.platform_settings() {
            let adapter = build_adapter(&settings, &ctx);
            scheduler.register(PlatformRegistration::new(settings, adapter));
        }

        let aggregator_log = log.child("Aggregator");
        let aggregator = Aggregator::new(
            RawStore::new(
                LocalStorage::new(config.data_root()),
                Arc::clone(&clock),
                aggregator_log.child("raw"),
            ),
            ApiTree::new(
                LocalStorage::new(config.api_root()),
                config.api_base_uri(),
                Arc::clone(&clock),
                aggregator_log.child("api"),
            ),
            aggregator_log,
        );

        Self::new(scheduler, aggregator, clock, log).with_retention(config.retention_days())
    }
}
