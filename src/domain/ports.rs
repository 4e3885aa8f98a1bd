use crate::domain::model::{Platform, PlatformSettings, TrendingRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};
use std::time::Duration;

/// 檔案樹儲存；路徑皆為相對於儲存根目錄
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 列出目錄下的項目名稱；目錄不存在時回傳空列表
    fn list_dir(&self, path: &str)
        -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn remove_dir(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// 單次 HTTP 呼叫，不含逾時與重試
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse>;
}

/// 「現在抓取平台 P 的熱門項目」
///
/// 空列表是成功的結果；只有結構性失敗（重試耗盡、回應無法解析、
/// 回應內含錯誤代碼）才回傳錯誤。
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn platform(&self) -> Platform;
    async fn fetch_trending(&self) -> Result<Vec<TrendingRecord>>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub trait ConfigProvider: Send + Sync {
    fn platform_settings(&self) -> Vec<PlatformSettings>;
    fn max_retries(&self) -> u32;
    fn retry_delay(&self) -> Duration;
    fn max_concurrency(&self) -> Option<usize>;
    fn data_root(&self) -> &str;
    fn api_root(&self) -> &str;
    fn api_base_uri(&self) -> &str;
    fn retention_days(&self) -> Option<u32>;
}
