// 每個平台一個 adapter；全部透過 SourceAdapter 交給 Scheduler

pub mod baidu;
pub mod bilibili;
pub mod csdn;
pub mod github;
pub mod hackernews;
pub mod support;
pub mod toutiao;
pub mod v2ex;
pub mod weibo;
pub mod zhihu;

use crate::core::http_client::{RequestOptions, RetryingHttpClient};
use crate::domain::model::{Platform, PlatformSettings};
use crate::domain::ports::{Clock, SourceAdapter};
use crate::utils::logger::Logger;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// adapter 共用的協作者
#[derive(Clone)]
pub struct AdapterContext {
    pub http: Arc<RetryingHttpClient>,
    pub clock: Arc<dyn Clock>,
    pub log: Logger,
}

impl AdapterContext {
    pub fn new(http: Arc<RetryingHttpClient>, clock: Arc<dyn Clock>, log: Logger) -> Self {
        Self { http, clock, log }
    }

    fn for_platform(&self, platform: Platform) -> Self {
        Self {
            http: Arc::clone(&self.http),
            clock: Arc::clone(&self.clock),
            log: self.log.child(platform.as_str()),
        }
    }
}

/// 平台設定加上共用協作者，每個 adapter 都持有一份
#[derive(Clone)]
pub struct AdapterBase {
    pub settings: PlatformSettings,
    pub ctx: AdapterContext,
    last_fetched_at: Arc<AtomicI64>,
}

impl AdapterBase {
    pub fn new(settings: PlatformSettings, ctx: AdapterContext) -> Self {
        Self {
            settings,
            ctx,
            last_fetched_at: Arc::new(AtomicI64::new(i64::MIN)),
        }
    }

    pub fn url(&self) -> String {
        self.settings.url()
    }

    /// 只帶平台逾時的請求選項
    pub fn request(&self) -> RequestOptions {
        RequestOptions::new(self.settings.timeout)
    }

    /// 同一個 adapter 的 fetchedAt 不會倒退，即使系統時鐘被往回調
    pub fn now_millis(&self) -> i64 {
        let now = self.ctx.clock.now_millis();
        self.last_fetched_at.fetch_max(now, Ordering::SeqCst).max(now)
    }
}

/// 平台 -> adapter 的靜態對應表
pub fn build_adapter(settings: &PlatformSettings, ctx: &AdapterContext) -> Arc<dyn SourceAdapter> {
    let base = AdapterBase::new(settings.clone(), ctx.for_platform(settings.platform));

    match settings.platform {
        Platform::Zhihu => Arc::new(zhihu::ZhihuAdapter::new(base)),
        Platform::Weibo => Arc::new(weibo::WeiboAdapter::new(base)),
        Platform::Github => Arc::new(github::GithubAdapter::new(base)),
        Platform::Baidu => Arc::new(baidu::BaiduAdapter::new(base)),
        Platform::Bilibili => Arc::new(bilibili::BilibiliAdapter::new(base)),
        Platform::V2ex => Arc::new(v2ex::V2exAdapter::new(base)),
        Platform::Hackernews => Arc::new(hackernews::HackernewsAdapter::new(base)),
        Platform::Toutiao => Arc::new(toutiao::ToutiaoAdapter::new(base)),
        Platform::Csdn => Arc::new(csdn::CsdnAdapter::new(base)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::platforms::builtin_platforms;
    use crate::core::http_client::RetryPolicy;
    use crate::config::platforms::builtin_settings;
    use crate::utils::clock::SystemClock;
    use chrono::{DateTime, Duration, Local};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct SteppingClock {
        times: Mutex<VecDeque<DateTime<Local>>>,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Local> {
            let mut times = self.times.lock().unwrap();
            if times.len() > 1 {
                times.pop_front().unwrap()
            } else {
                times[0]
            }
        }
    }

    #[test]
    fn test_every_platform_builds_matching_adapter() {
        let http = RetryingHttpClient::with_reqwest(RetryPolicy::default(), Logger::new("http"))
            .unwrap();
        let ctx = AdapterContext::new(Arc::new(http), Arc::new(SystemClock), Logger::new("Adapter"));

        for settings in builtin_platforms() {
            let adapter = build_adapter(&settings, &ctx);
            assert_eq!(adapter.platform(), settings.platform);
        }
    }

    #[test]
    fn test_fetched_at_never_goes_backwards() {
        let start = Local::now();
        let clock = SteppingClock {
            times: Mutex::new(VecDeque::from(vec![
                start,
                start - Duration::seconds(30),
                start + Duration::seconds(5),
            ])),
        };
        let http = RetryingHttpClient::with_reqwest(RetryPolicy::default(), Logger::new("http"))
            .unwrap();
        let ctx = AdapterContext::new(Arc::new(http), Arc::new(clock), Logger::new("Adapter"));
        let base = AdapterBase::new(builtin_settings(Platform::Weibo), ctx);

        let first = base.now_millis();
        let after_step_back = base.now_millis();
        let later = base.now_millis();

        assert_eq!(first, start.timestamp_millis());
        assert_eq!(after_step_back, first);
        assert_eq!(later, (start + Duration::seconds(5)).timestamp_millis());

        // 複製出來的 base 共用同一個下限
        assert!(base.clone().now_millis() >= later);
    }
}
