pub mod dispatcher;
pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{
    AppMessage, CycleOutcome, Fix, LocationOptions, PoemResponse, Position, RawResponse,
    SendReceipt, Trigger, TriggerKind,
};
pub use crate::domain::ports::{ConfigProvider, DeviceBridge, LocationProvider, Pipeline};
pub use crate::utils::error::Result;
