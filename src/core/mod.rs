pub mod aggregator;
pub mod api_tree;
pub mod engine;
pub mod http_client;
pub mod raw_store;
pub mod scheduler;

pub use crate::domain::ports::{Clock, ConfigProvider, HttpTransport, SourceAdapter, Storage};
pub use crate::utils::error::Result;
