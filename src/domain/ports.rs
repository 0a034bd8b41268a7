use crate::domain::model::{AppMessage, Fix, LocationOptions, RawResponse, SendReceipt};
use crate::utils::error::{LocationError, Result, SendError};
use async_trait::async_trait;

/// Source of the device's current position.
///
/// Implementations do not enforce `options.timeout` themselves; the pipeline
/// bounds every call with it.
pub trait LocationProvider: Send + Sync {
    fn current_position(
        &self,
        options: &LocationOptions,
    ) -> impl std::future::Future<Output = std::result::Result<Fix, LocationError>> + Send;
}

/// Outbound half of the application-message channel to the watch.
pub trait DeviceBridge: Send + Sync {
    fn send_app_message(
        &self,
        message: &AppMessage,
    ) -> impl std::future::Future<Output = std::result::Result<SendReceipt, SendError>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn location_options(&self) -> LocationOptions;
}

/// The three stages of one relay cycle.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Acquire a position and fetch the poem document for it.
    async fn extract(&self) -> Result<RawResponse>;
    /// Parse the document and pick out the two message fields.
    async fn transform(&self, response: RawResponse) -> Result<AppMessage>;
    /// Hand the message to the device bridge.
    async fn load(&self, message: AppMessage) -> Result<SendReceipt>;
}
