use crate::domain::model::{FetchReport, Platform, PlatformFetchOutcome, PlatformSettings};
use crate::domain::ports::{Clock, SourceAdapter};
use crate::utils::logger::Logger;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// 平台設定與其 adapter 的綁定；註冊後不可變
#[derive(Clone)]
pub struct PlatformRegistration {
    settings: PlatformSettings,
    adapter: Arc<dyn SourceAdapter>,
}

impl PlatformRegistration {
    pub fn new(settings: PlatformSettings, adapter: Arc<dyn SourceAdapter>) -> Self {
        Self { settings, adapter }
    }

    pub fn platform(&self) -> Platform {
        self.settings.platform
    }

    pub fn settings(&self) -> &PlatformSettings {
        &self.settings
    }

    pub fn adapter(&self) -> &Arc<dyn SourceAdapter> {
        &self.adapter
    }
}

impl std::fmt::Debug for PlatformRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformRegistration")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// 對多個平台並行抓取，每個平台的失敗彼此隔離。
///
/// 註冊表只能透過 `&mut self` 修改，而一次抓取週期借用 `&self`，
/// 所以週期進行中不可能修改註冊表。
pub struct Scheduler {
    registry: BTreeMap<Platform, PlatformRegistration>,
    clock: Arc<dyn Clock>,
    max_concurrency: Option<usize>,
    log: Logger,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>, log: Logger) -> Self {
        Self {
            registry: BTreeMap::new(),
            clock,
            max_concurrency: None,
            log,
        }
    }

    /// None 表示不限制同時進行的平台數
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit.filter(|n| *n > 0);
        self
    }

    /// 回傳被取代的舊註冊（若有）
    pub fn register(&mut self, registration: PlatformRegistration) -> Option<PlatformRegistration> {
        let platform = registration.platform();
        self.log.debug(&format!("Registered {}", platform));
        self.registry.insert(platform, registration)
    }

    pub fn unregister(&mut self, platform: Platform) -> Option<PlatformRegistration> {
        let removed = self.registry.remove(&platform);
        if removed.is_some() {
            self.log.debug(&format!("Unregistered {}", platform));
        }
        removed
    }

    pub fn is_registered(&self, platform: Platform) -> bool {
        self.registry.contains_key(&platform)
    }

    pub fn registration(&self, platform: Platform) -> Option<&PlatformRegistration> {
        self.registry.get(&platform)
    }

    pub fn registered_platforms(&self) -> Vec<Platform> {
        self.registry.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// 決定本次週期要抓取的平台。
    ///
    /// 未指定時為所有已註冊且啟用的平台；明確指定時可包含停用的平台，
    /// 未註冊的平台會被略過。
    pub fn selection(&self, requested: Option<&[Platform]>) -> Vec<Platform> {
        match requested {
            None => self
                .registry
                .values()
                .filter(|r| r.settings.enabled)
                .map(|r| r.platform())
                .collect(),
            Some(list) => {
                let mut selected: Vec<Platform> = Vec::with_capacity(list.len());
                for platform in list {
                    if selected.contains(platform) {
                        continue;
                    }
                    if self.is_registered(*platform) {
                        selected.push(*platform);
                    } else {
                        self.log
                            .warn(&format!("{} is not registered, skipping", platform));
                    }
                }
                selected
            }
        }
    }

    /// 跑一次完整週期；等待所有平台結束（成功或失敗）才回傳
    pub async fn run_cycle(&self, requested: Option<&[Platform]>) -> FetchReport {
        let started = Instant::now();
        let selected = self.selection(requested);
        self.log.info(&format!(
            "🚀 Fetching {} platform(s): {}",
            selected.len(),
            selected
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        let semaphore = self.max_concurrency.map(|n| Arc::new(Semaphore::new(n)));

        let handles: Vec<_> = selected
            .iter()
            .filter_map(|platform| self.registry.get(platform))
            .map(|registration| {
                let adapter = Arc::clone(&registration.adapter);
                let clock = Arc::clone(&self.clock);
                let log = self.log.child(registration.platform().as_str());
                let semaphore = semaphore.clone();

                tokio::spawn(async move {
                    let _permit = match semaphore {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };
                    fetch_platform(adapter, clock, log).await
                })
            })
            .collect();

        let joined = futures::future::join_all(handles).await;

        let outcomes: Vec<PlatformFetchOutcome> = selected
            .iter()
            .zip(joined)
            .map(|(platform, result)| match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.log
                        .error(&format!("{} task aborted: {}", platform, e));
                    PlatformFetchOutcome::failure(
                        *platform,
                        format!("adapter task aborted: {}", e),
                        self.clock.now_millis(),
                    )
                }
            })
            .collect();

        let report = FetchReport::from_outcomes(outcomes, started.elapsed());
        self.log.info(&format!(
            "📊 Cycle finished: {} succeeded, {} failed, {} records in {}ms",
            report.succeeded_platforms(),
            report.failed_platforms(),
            report.total_records(),
            report.duration_millis()
        ));
        report
    }
}

/// 單一平台的邊界：adapter 的錯誤在這裡轉成失敗的結果，不會再往外傳
async fn fetch_platform(
    adapter: Arc<dyn SourceAdapter>,
    clock: Arc<dyn Clock>,
    log: Logger,
) -> PlatformFetchOutcome {
    let platform = adapter.platform();
    let fetched_at = clock.now_millis();
    log.debug("Fetching trending items");

    match adapter.fetch_trending().await {
        Ok(records) => {
            log.success(&format!("Fetched {} records", records.len()));
            PlatformFetchOutcome::success(platform, records, fetched_at)
        }
        Err(e) => {
            log.error(&format!("Fetch failed: {} ({})", e, e.recovery_suggestion()));
            PlatformFetchOutcome::failure(platform, e.to_string(), fetched_at)
        }
    }
}
