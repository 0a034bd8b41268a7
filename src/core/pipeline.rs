use crate::core::{
    AppMessage, ConfigProvider, DeviceBridge, LocationProvider, Pipeline, PoemResponse, Position,
    RawResponse, SendReceipt,
};
use crate::utils::error::{LocationError, Result};
use reqwest::Client;

/// Builds `<base>/pebble/poem/<lat>,<lon>` with the coordinates as given.
pub fn poem_url(base_url: &str, position: &Position) -> String {
    format!(
        "{}/pebble/poem/{},{}",
        base_url.trim_end_matches('/'),
        position.latitude,
        position.longitude
    )
}

pub struct PoemPipeline<L: LocationProvider, B: DeviceBridge, C: ConfigProvider> {
    location: L,
    bridge: B,
    config: C,
    client: Client,
}

impl<L: LocationProvider, B: DeviceBridge, C: ConfigProvider> PoemPipeline<L, B, C> {
    pub fn new(location: L, bridge: B, config: C) -> Self {
        // No request timeout: a request that never completes leaves its cycle pending.
        Self {
            location,
            bridge,
            config,
            client: Client::new(),
        }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    async fn acquire_position(&self) -> Result<Position> {
        let options = self.config.location_options();
        match tokio::time::timeout(options.timeout, self.location.current_position(&options)).await
        {
            Ok(fix) => Ok(fix?.position),
            Err(_) => Err(LocationError::Timeout.into()),
        }
    }
}

#[async_trait::async_trait]
impl<L: LocationProvider, B: DeviceBridge, C: ConfigProvider> Pipeline for PoemPipeline<L, B, C> {
    async fn extract(&self) -> Result<RawResponse> {
        let position = self.acquire_position().await?;
        tracing::info!(
            "Lat, long: {}, {}",
            position.latitude,
            position.longitude
        );

        let url = poem_url(self.config.base_url(), &position);
        tracing::debug!("Making API request to: {}", url);
        let response = self.client.get(&url).send().await?;

        let status = response.status().as_u16();
        tracing::debug!("API response status: {}", status);
        let body = response.text().await?;

        Ok(RawResponse {
            position,
            url,
            status,
            body,
        })
    }

    async fn transform(&self, response: RawResponse) -> Result<AppMessage> {
        let poem = PoemResponse::from_body(&response.body)?;
        let message = AppMessage::from(&poem);
        tracing::debug!(
            "Extracted message (title present: {}, poem present: {})",
            message.title.is_some(),
            message.poem.is_some()
        );
        Ok(message)
    }

    async fn load(&self, message: AppMessage) -> Result<SendReceipt> {
        let receipt = self.bridge.send_app_message(&message).await?;
        Ok(receipt)
    }
}
