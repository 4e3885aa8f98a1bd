use crate::domain::model::{KeyedRecords, Platform, RawSnapshot, TrendingRecord};
use crate::domain::ports::{Clock, Storage};
use crate::utils::clock::{format_date, format_millis, parse_date};
use crate::utils::error::{HarvestError, Result};
use crate::utils::logger::Logger;
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;

/// 依日期分區的原始快照：`<date>/<platform>.json`
pub struct RawStore<S: Storage> {
    storage: S,
    clock: Arc<dyn Clock>,
    log: Logger,
}

pub fn snapshot_path(date: NaiveDate, platform: Platform) -> String {
    format!("{}/{}.json", format_date(date), platform)
}

impl<S: Storage> RawStore<S> {
    pub fn new(storage: S, clock: Arc<dyn Clock>, log: Logger) -> Self {
        Self {
            storage,
            clock,
            log,
        }
    }

    /// 整檔覆寫；同一天最後一次抓取為準
    pub async fn write_snapshot(
        &self,
        date: NaiveDate,
        platform: Platform,
        records: &[TrendingRecord],
    ) -> Result<String> {
        let fetched_at = self.clock.now_millis();
        let snapshot = RawSnapshot {
            platform,
            items: records.to_vec(),
            fetched_at,
            fetched_at_formatted: format_millis(fetched_at),
        };

        let path = snapshot_path(date, platform);
        let data = serde_json::to_vec_pretty(&snapshot)?;
        self.storage.write_file(&path, &data).await?;
        self.log
            .debug(&format!("💾 Wrote {} ({} items)", path, records.len()));
        Ok(path)
    }

    /// 檔案不存在時回傳 None
    pub async fn load_platform(
        &self,
        date: NaiveDate,
        platform: Platform,
    ) -> Result<Option<RawSnapshot>> {
        let file_name = format!("{}.json", platform);
        let entries = self.storage.list_dir(&format_date(date)).await?;
        if !entries.contains(&file_name) {
            return Ok(None);
        }

        let path = snapshot_path(date, platform);
        let data = self.storage.read_file(&path).await?;
        let snapshot = serde_json::from_slice(&data)
            .map_err(|e| HarvestError::parse(path.as_str(), e.to_string()))?;
        Ok(Some(snapshot))
    }

    /// 讀取某天所有平台；無法辨識或無法解析的檔案會被略過
    pub async fn load_day(&self, date: NaiveDate) -> Result<KeyedRecords> {
        let mut day = BTreeMap::new();

        for name in self.storage.list_dir(&format_date(date)).await? {
            let Some(tag) = name.strip_suffix(".json") else {
                continue;
            };
            let Ok(platform) = tag.parse::<Platform>() else {
                continue;
            };

            match self.load_platform(date, platform).await {
                Ok(Some(snapshot)) => {
                    day.insert(platform, snapshot.items);
                }
                Ok(None) => {}
                Err(e) => self
                    .log
                    .warn(&format!("Skipping unreadable snapshot {}: {}", name, e)),
            }
        }

        Ok(day)
    }

    /// 新的在前
    pub async fn available_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self
            .storage
            .list_dir("")
            .await?
            .iter()
            .filter_map(|name| parse_date(name))
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    pub async fn latest_available_date(&self) -> Result<Option<NaiveDate>> {
        Ok(self.available_dates().await?.into_iter().next())
    }

    /// 刪除早於 `today - retention_days` 的日期目錄，回傳被刪除的日期
    pub async fn cleanup_older_than(
        &self,
        today: NaiveDate,
        retention_days: u32,
    ) -> Result<Vec<NaiveDate>> {
        let Some(cutoff) = today.checked_sub_days(Days::new(u64::from(retention_days))) else {
            return Ok(Vec::new());
        };

        let mut removed = Vec::new();
        for date in self.available_dates().await? {
            if date < cutoff {
                self.storage.remove_dir(&format_date(date)).await?;
                removed.push(date);
            }
        }

        if !removed.is_empty() {
            self.log.info(&format!(
                "🧹 Removed {} snapshot day(s) older than {}",
                removed.len(),
                format_date(cutoff)
            ));
        }
        Ok(removed)
    }
}
