use crate::core::api_tree::ApiTree;
use crate::core::raw_store::RawStore;
use crate::domain::model::{KeyedRecords, Platform};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use crate::utils::logger::Logger;
use chrono::NaiveDate;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    RawSnapshot,
    Now,
    HistoryDay,
    HistoryIndex,
    ProviderList,
}

#[derive(Debug, Clone)]
pub struct ArtifactFailure {
    /// ProviderList 不屬於單一平台
    pub platform: Option<Platform>,
    pub artifact: Artifact,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct PersistSummary {
    pub written: usize,
    pub failures: Vec<ArtifactFailure>,
}

impl PersistSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 把一次週期的結果寫成原始快照與 API 樹。
///
/// 失敗以「平台 x 檔案」為單位隔離。共用同一個 Aggregator 的呼叫
/// 會被 mutex 串行化，避免歷史檔的讀-改-寫互相覆蓋。
pub struct Aggregator<S: Storage> {
    raw: RawStore<S>,
    api: ApiTree<S>,
    lock: Mutex<()>,
    log: Logger,
}

impl<S: Storage> Aggregator<S> {
    pub fn new(raw: RawStore<S>, api: ApiTree<S>, log: Logger) -> Self {
        Self {
            raw,
            api,
            lock: Mutex::new(()),
            log,
        }
    }

    pub fn raw_store(&self) -> &RawStore<S> {
        &self.raw
    }

    pub fn api_tree(&self) -> &ApiTree<S> {
        &self.api
    }

    fn track<T>(
        &self,
        summary: &mut PersistSummary,
        platform: Option<Platform>,
        artifact: Artifact,
        result: Result<T>,
    ) -> bool {
        match result {
            Ok(_) => {
                summary.written += 1;
                true
            }
            Err(e) => {
                let label = platform.map(|p| p.as_str()).unwrap_or("*");
                self.log
                    .error(&format!("Failed to write {:?} for {}: {}", artifact, label, e));
                summary.failures.push(ArtifactFailure {
                    platform,
                    artifact,
                    message: e.to_string(),
                });
                false
            }
        }
    }

    /// 只會寫入 keyed view 中的平台（也就是成功的平台）
    pub async fn persist(&self, view: &KeyedRecords, date: NaiveDate) -> PersistSummary {
        let _guard = self.lock.lock().await;
        let mut summary = PersistSummary::default();

        for (&platform, records) in view {
            let result = self.raw.write_snapshot(date, platform, records).await;
            self.track(&mut summary, Some(platform), Artifact::RawSnapshot, result);

            let result = self.api.write_now(platform, records).await;
            self.track(&mut summary, Some(platform), Artifact::Now, result);

            let result = self.api.append_history(platform, date, records).await;
            self.track(&mut summary, Some(platform), Artifact::HistoryDay, result);

            let result = self.api.rebuild_history_index(platform, date).await;
            self.track(&mut summary, Some(platform), Artifact::HistoryIndex, result);
        }

        if !view.is_empty() {
            let platforms: Vec<Platform> = view.keys().copied().collect();
            let result = self.api.update_provider_list(&platforms).await;
            self.track(&mut summary, None, Artifact::ProviderList, result);
        }

        if summary.is_clean() {
            self.log.success(&format!(
                "Persisted {} platform(s), {} artifact(s)",
                view.len(),
                summary.written
            ));
        } else {
            self.log.warn(&format!(
                "Persisted with {} failed artifact(s), {} written",
                summary.failures.len(),
                summary.written
            ));
        }

        summary
    }
}
