pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, HarvestConfig};

pub use core::aggregator::{Aggregator, PersistSummary};
pub use core::engine::{CycleSummary, TrendingEngine};
pub use core::http_client::{RequestOptions, RetryPolicy, RetryingHttpClient};
pub use core::scheduler::{PlatformRegistration, Scheduler};
pub use domain::model::{FetchReport, Platform, PlatformFetchOutcome, TrendingRecord};
pub use utils::error::{ErrorKind, HarvestError, Result};
