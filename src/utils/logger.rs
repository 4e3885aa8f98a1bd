use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("trend_harvest=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("trend_harvest=info"))
    }
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// 給排程環境（cron / CI）用的 JSON 輸出
pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}

/// 帶有元件標籤的日誌器。
///
/// 由呼叫端明確建立並傳入 Scheduler / Adapter / Aggregator，
/// 每個事件都會帶上 `component` 欄位；輸出目的地由 subscriber 決定，
/// 寫入失敗不會影響呼叫端。
#[derive(Debug, Clone)]
pub struct Logger {
    component: Arc<str>,
}

impl Logger {
    pub fn new(component: &str) -> Self {
        Self {
            component: Arc::from(component),
        }
    }

    /// `Scheduler` -> `Scheduler:weibo`
    pub fn child(&self, label: &str) -> Self {
        if self.component.is_empty() {
            Self::new(label)
        } else {
            Self::new(&format!("{}:{}", self.component, label))
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(component = %self.component, "{}", message);
    }

    pub fn info(&self, message: &str) {
        tracing::info!(component = %self.component, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(component = %self.component, "⚠️ {}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(component = %self.component, "❌ {}", message);
    }

    pub fn success(&self, message: &str) {
        tracing::info!(component = %self.component, outcome = "success", "✅ {}", message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("trend-harvest")
    }
}
