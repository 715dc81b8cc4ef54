//! Client side of PDF Master
//!
//! - [`ApiClient`]: one async method per server operation, with every
//!   returned URL made absolute against the API origin
//! - [`AppStore`]: recent files, favorites and preferences persisted
//!   through a [`KeyValueStore`]

pub mod api;
pub mod config;
pub mod error;
pub mod normalize;
pub mod store;

pub use api::{image_mime_type, ApiClient};
pub use config::{ApiConfig, DEFAULT_API_URL, REQUEST_TIMEOUT};
pub use error::ClientError;
pub use normalize::{absolute_url, normalize_result};
pub use store::{AppStore, FileStore, KeyValueStore, MemoryStore, RecentFile, MAX_RECENT_FILES};
