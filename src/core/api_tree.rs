use crate::domain::model::{
    ApiDataItem, HistoryBatch, HistoryDay, HistoryIndex, HistoryLink, NowDocument, Platform,
    ProviderEntry, ProviderList, TrendingRecord,
};
use crate::domain::ports::{Clock, Storage};
use crate::utils::clock::{format_date, format_datetime, parse_date};
use crate::utils::error::{HarvestError, Result};
use crate::utils::logger::Logger;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

pub const PROVIDER_LIST_PATH: &str = "provider.json";

pub fn now_path(platform: Platform) -> String {
    format!("{}/now.json", platform.provider_id())
}

pub fn history_index_path(platform: Platform) -> String {
    format!("{}/history.json", platform.provider_id())
}

pub fn history_dir(platform: Platform) -> String {
    format!("{}/history", platform.provider_id())
}

pub fn history_day_path(platform: Platform, date: NaiveDate) -> String {
    format!("{}/{}.json", history_dir(platform), format_date(date))
}

/// 對外 API 樹：provider 清單、即時資料與每日歷史
pub struct ApiTree<S: Storage> {
    storage: S,
    base_uri: String,
    clock: Arc<dyn Clock>,
    log: Logger,
}

impl<S: Storage> ApiTree<S> {
    pub fn new(storage: S, base_uri: &str, clock: Arc<dyn Clock>, log: Logger) -> Self {
        Self {
            storage,
            base_uri: base_uri.trim_end_matches('/').to_string(),
            clock,
            log,
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let (dir, name) = path.rsplit_once('/').unwrap_or(("", path));
        Ok(self.storage.list_dir(dir).await?.iter().any(|n| n == name))
    }

    /// 不存在回傳 None；存在但無法解析是錯誤
    async fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        if !self.exists(path).await? {
            return Ok(None);
        }
        let data = self.storage.read_file(path).await?;
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| HarvestError::parse(path, e.to_string()))
    }

    async fn write_json<T: Serialize>(&self, path: &str, value: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(value)?;
        self.storage.write_file(path, &data).await
    }

    /// `<provider>/now.json`，每次整檔覆寫
    pub async fn write_now(&self, platform: Platform, records: &[TrendingRecord]) -> Result<()> {
        let now = self.clock.now();
        let document = NowDocument {
            id: format!("{}.{}", platform.provider_id(), now.timestamp_millis()),
            last_updated_at: format_datetime(&now),
            data: records.iter().map(ApiDataItem::from).collect(),
        };
        self.write_json(&now_path(platform), &document).await
    }

    /// 把本次批次追加到 `<provider>/history/<date>.json`，回傳追加後的批次數。
    ///
    /// 既有檔案無法解析時直接失敗，不覆寫。
    pub async fn append_history(
        &self,
        platform: Platform,
        date: NaiveDate,
        records: &[TrendingRecord],
    ) -> Result<usize> {
        let path = history_day_path(platform, date);
        let now = self.clock.now();
        let stamp = format_datetime(&now);

        let batch = HistoryBatch {
            id: format!("{}.{}", platform.provider_id(), now.timestamp_millis()),
            last_updated_at: stamp.clone(),
            data: records.iter().map(ApiDataItem::from).collect(),
        };

        let mut day = match self.read_json::<HistoryDay>(&path).await? {
            Some(day) => day,
            None => HistoryDay {
                id: format!("{}.history.{}", platform.provider_id(), format_date(date)),
                created_at: stamp,
                data: Vec::new(),
            },
        };
        day.data.push(batch);

        self.write_json(&path, &day).await?;
        Ok(day.data.len())
    }

    /// 以既有索引、磁碟上的歷史檔與 `date` 的聯集重建 `history.json`（新的在前）
    pub async fn rebuild_history_index(
        &self,
        platform: Platform,
        date: NaiveDate,
    ) -> Result<HistoryIndex> {
        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        dates.insert(date);

        match self
            .read_json::<HistoryIndex>(&history_index_path(platform))
            .await
        {
            Ok(Some(existing)) => {
                dates.extend(existing.history.iter().filter_map(|h| parse_date(&h.date)));
            }
            Ok(None) => {}
            Err(e) => self
                .log
                .warn(&format!("Rebuilding unreadable history index: {}", e)),
        }

        for name in self.storage.list_dir(&history_dir(platform)).await? {
            if let Some(d) = name.strip_suffix(".json").and_then(parse_date) {
                dates.insert(d);
            }
        }

        let index = HistoryIndex {
            id: format!("{}.history", platform.provider_id()),
            history: dates
                .into_iter()
                .rev()
                .map(|d| {
                    let date = format_date(d);
                    HistoryLink {
                        uri: format!(
                            "{}/{}/history/{}.json",
                            self.base_uri,
                            platform.provider_id(),
                            date
                        ),
                        date,
                    }
                })
                .collect(),
        };

        self.write_json(&history_index_path(platform), &index).await?;
        Ok(index)
    }

    /// 把本次寫入的平台合併進 `provider.json`；其他項目保留原本的 lastUpdateAt
    pub async fn update_provider_list(&self, platforms: &[Platform]) -> Result<ProviderList> {
        let mut list = match self.read_json::<ProviderList>(PROVIDER_LIST_PATH).await {
            Ok(existing) => existing.unwrap_or_default(),
            Err(e) => {
                self.log
                    .warn(&format!("Replacing unreadable provider list: {}", e));
                ProviderList::default()
            }
        };

        let stamp = format_datetime(&self.clock.now());
        for platform in platforms {
            let entry = ProviderEntry {
                id: platform.provider_id().to_string(),
                last_update_at: stamp.clone(),
                priority: platform.priority(),
            };
            match list.provider.iter_mut().find(|p| p.id == entry.id) {
                Some(existing) => *existing = entry,
                None => list.provider.push(entry),
            }
        }
        list.provider
            .sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

        self.write_json(PROVIDER_LIST_PATH, &list).await?;
        Ok(list)
    }

    pub async fn read_now(&self, platform: Platform) -> Result<Option<NowDocument>> {
        self.read_json(&now_path(platform)).await
    }

    pub async fn read_provider_list(&self) -> Result<Option<ProviderList>> {
        self.read_json(PROVIDER_LIST_PATH).await
    }

    pub async fn read_history_index(&self, platform: Platform) -> Result<Option<HistoryIndex>> {
        self.read_json(&history_index_path(platform)).await
    }

    pub async fn read_history_day(
        &self,
        platform: Platform,
        date: NaiveDate,
    ) -> Result<Option<HistoryDay>> {
        self.read_json(&history_day_path(platform, date)).await
    }
}
