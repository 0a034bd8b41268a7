// Adapters layer: concrete implementations of the domain ports.

pub mod bridge;
pub mod location;

pub use bridge::{schedule_refresh, JsonLinesBridge, JsonLinesInbox};
pub use location::{CachedLocation, ConfiguredLocation, IpLocation, StaticLocation};
