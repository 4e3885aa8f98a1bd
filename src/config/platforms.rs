use crate::domain::model::{Platform, PlatformSettings};
use std::time::Duration;

/// 內建平台表；TOML 設定檔只會覆寫其中的欄位
pub fn builtin_platforms() -> Vec<PlatformSettings> {
    Platform::ALL.into_iter().map(builtin_settings).collect()
}

pub fn builtin_settings(platform: Platform) -> PlatformSettings {
    let (display_name, base_url, endpoint, enabled, timeout_ms) = match platform {
        Platform::Zhihu => (
            "知乎热榜",
            "https://www.zhihu.com",
            "/api/v3/feed/topstory/hot-lists/total",
            false,
            15_000,
        ),
        Platform::Weibo => (
            "微博热搜",
            "https://weibo.com",
            "/ajax/side/hotSearch",
            true,
            10_000,
        ),
        Platform::Github => ("GitHub Trending", "https://github.com", "/trending", false, 15_000),
        Platform::Baidu => (
            "百度热搜",
            "https://top.baidu.com",
            "/board?tab=realtime",
            false,
            10_000,
        ),
        Platform::Bilibili => (
            "哔哩哔哩热门",
            "https://api.bilibili.com",
            "/x/web-interface/hot",
            false,
            15_000,
        ),
        Platform::V2ex => ("V2EX 热议", "https://www.v2ex.com", "/?tab=hot", false, 15_000),
        Platform::Hackernews => (
            "Hacker News",
            "https://hacker-news.firebaseio.com",
            "/v0/topstories.json",
            false,
            30_000,
        ),
        Platform::Toutiao => (
            "今日头条",
            "https://www.toutiao.com",
            "/hot-event/hot-board/?origin=toutiao_pc",
            true,
            15_000,
        ),
        Platform::Csdn => (
            "CSDN 热榜",
            "https://blog.csdn.net",
            "/phoenix/web/blog/hotRank?&pageSize=100",
            true,
            15_000,
        ),
    };

    PlatformSettings {
        platform,
        display_name: display_name.to_string(),
        base_url: base_url.to_string(),
        endpoint: endpoint.to_string(),
        enabled,
        timeout: Duration::from_millis(timeout_ms),
    }
}
