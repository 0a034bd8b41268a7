pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::RelayConfig;

pub use adapters::{
    schedule_refresh, CachedLocation, ConfiguredLocation, IpLocation, JsonLinesBridge,
    JsonLinesInbox, StaticLocation,
};
pub use crate::core::{
    dispatcher::{relay_dispatcher, EventDispatcher},
    engine::RelayEngine,
    pipeline::{poem_url, PoemPipeline},
};
pub use utils::error::{LocationError, RelayError, Result, SendError};
