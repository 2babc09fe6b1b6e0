//! Collector - Obtains raw outbreak source text
//!
//! Responsibilities:
//! - Fetch time-series, daily snapshot and revision listings
//! - Decide whether stored payloads are still current
//! - Store fetched payloads keyed by source so later runs can skip the network
//! - Degrade every transport failure to empty text

pub mod config;
pub mod error;
pub mod gate;
pub mod revision;
pub mod source;
pub mod store;

pub use config::{daily_cache_key, Config};
pub use error::{FetchError, Result};
pub use gate::{should_load_from_cache, SourceCache};
pub use revision::latest_revision;
pub use source::{HttpSource, RemoteSource, StaticSource};
pub use store::{content_hash, CacheStore, FsStore, MemoryStore, LAST_STORED_KEY};
