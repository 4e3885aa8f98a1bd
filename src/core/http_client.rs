use crate::domain::ports::{HttpResponse, HttpTransport};
use crate::utils::error::{HarvestError, Result};
use crate::utils::logger::Logger;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// 模擬常見桌面瀏覽器的預設標頭
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("Accept", "application/json, text/plain, */*"),
    ("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8"),
    ("Cache-Control", "no-cache"),
    ("Pragma", "no-cache"),
    ("Sec-Ch-Ua", "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\""),
    ("Sec-Ch-Ua-Mobile", "?0"),
    ("Sec-Ch-Ua-Platform", "\"Windows\""),
    ("Sec-Fetch-Dest", "empty"),
    ("Sec-Fetch-Mode", "cors"),
    ("Sec-Fetch-Site", "same-origin"),
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 總嘗試次數（含第一次）
    pub max_retries: u32,
    /// 第 n 次失敗後等待 base_delay * n
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub max_retries: Option<u32>,
}

impl RequestOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            headers: Vec::new(),
            timeout,
            max_retries: None,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// 以 reqwest 實作的傳輸層
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| HarvestError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| HarvestError::network(url, e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| HarvestError::network(url, format!("reading body: {}", e)))?;

        Ok(HttpResponse { status, body })
    }
}

/// 帶逾時、標頭合併與退避重試的 HTTP 用戶端，所有 adapter 共用。
///
/// 重試一定是循序的：同一次呼叫任何時刻最多只有一個請求在進行。
pub struct RetryingHttpClient {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    log: Logger,
}

impl RetryingHttpClient {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy, log: Logger) -> Self {
        Self {
            transport,
            policy,
            log,
        }
    }

    pub fn with_reqwest(policy: RetryPolicy, log: Logger) -> Result<Self> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?), policy, log))
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// 預設標頭加上覆寫（名稱不分大小寫）
    pub fn merge_headers(overrides: &[(String, String)]) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = DEFAULT_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        for (name, value) in overrides {
            match merged
                .iter_mut()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            {
                Some(slot) => slot.1 = value.clone(),
                None => merged.push((name.clone(), value.clone())),
            }
        }

        merged
    }

    pub async fn fetch(&self, url: &str, options: &RequestOptions) -> Result<HttpResponse> {
        let headers = Self::merge_headers(&options.headers);
        let max_attempts = options.max_retries.unwrap_or(self.policy.max_retries).max(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.log
                .debug(&format!("📡 GET {} (attempt {}/{})", url, attempt, max_attempts));

            match self.attempt(url, &headers, options.timeout).await {
                Ok(response) => return Ok(response),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    self.log.error(&format!(
                        "GET {} failed after {} attempts: {}",
                        url, attempt, e
                    ));
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.policy.base_delay * attempt;
                    self.log.warn(&format!(
                        "GET {} attempt {}/{} failed: {}; retrying in {:?}",
                        url, attempt, max_attempts, e, delay
                    ));
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// 單次嘗試；逾時會丟棄進行中的 future，也就中止了請求
    async fn attempt(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse> {
        let response = match tokio::time::timeout(timeout, self.transport.get(url, headers)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(HarvestError::Timeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        };

        match response.status {
            429 => Err(HarvestError::RateLimited {
                url: url.to_string(),
            }),
            200..=299 => Ok(response),
            status => Err(HarvestError::http_status(url, status)),
        }
    }

    pub async fn get_text(&self, url: &str, options: &RequestOptions) -> Result<String> {
        Ok(self.fetch(url, options).await?.body)
    }

    /// 取得並解析成指定結構；結構不符是 Parse 錯誤，不重試
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
        context: &str,
    ) -> Result<T> {
        let body = self.get_text(url, options).await?;
        serde_json::from_str(&body).map_err(|e| HarvestError::parse(context, e.to_string()))
    }
}
