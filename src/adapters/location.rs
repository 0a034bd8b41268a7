use crate::core::{Fix, LocationOptions, LocationProvider, Position};
use crate::utils::error::LocationError;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;

/// Always reports the same coordinates.
#[derive(Debug, Clone, Copy)]
pub struct StaticLocation {
    position: Position,
}

impl StaticLocation {
    pub fn new(position: Position) -> Self {
        Self { position }
    }
}

impl LocationProvider for StaticLocation {
    async fn current_position(&self, _options: &LocationOptions) -> Result<Fix, LocationError> {
        Ok(Fix::now(self.position))
    }
}

// Accepts both the `lat`/`lon` and the `latitude`/`longitude` spellings.
#[derive(Debug, Deserialize)]
struct IpLocationResponse {
    status: Option<String>,
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lon: Option<f64>,
}

/// Looks up the position of the host's public IP address.
#[derive(Debug, Clone)]
pub struct IpLocation {
    client: Client,
    endpoint: String,
}

impl IpLocation {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl LocationProvider for IpLocation {
    async fn current_position(&self, _options: &LocationOptions) -> Result<Fix, LocationError> {
        tracing::debug!("Requesting IP location from: {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| LocationError::Other(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(LocationError::PermissionDenied)
            }
            status if !status.is_success() => {
                tracing::debug!("IP location service answered {}", status);
                return Err(LocationError::ServiceUnavailable);
            }
            _ => {}
        }

        let body: IpLocationResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Other(format!("Unreadable location response: {}", e)))?;

        if body.status.as_deref() == Some("fail") {
            return Err(LocationError::ServiceUnavailable);
        }

        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => Ok(Fix::now(Position::new(latitude, longitude))),
            _ => Err(LocationError::Other(
                "Location response has no coordinates".to_string(),
            )),
        }
    }
}

/// Reuses the previous fix while it is younger than `options.maximum_age`.
pub struct CachedLocation<L: LocationProvider> {
    inner: L,
    last_fix: Mutex<Option<Fix>>,
}

impl<L: LocationProvider> CachedLocation<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            last_fix: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L: LocationProvider> LocationProvider for CachedLocation<L> {
    async fn current_position(&self, options: &LocationOptions) -> Result<Fix, LocationError> {
        if let Some(fix) = *self.last_fix.lock().await {
            if fix.is_fresh(options.maximum_age, Utc::now()) {
                tracing::debug!("Reusing location fix from {}", fix.acquired_at);
                return Ok(fix);
            }
        }

        let fix = self.inner.current_position(options).await?;
        *self.last_fix.lock().await = Some(fix);
        Ok(fix)
    }
}

/// The location source selected by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredLocation {
    Static(StaticLocation),
    Ip(IpLocation),
}

impl LocationProvider for ConfiguredLocation {
    async fn current_position(&self, options: &LocationOptions) -> Result<Fix, LocationError> {
        match self {
            ConfiguredLocation::Static(location) => location.current_position(options).await,
            ConfiguredLocation::Ip(location) => location.current_position(options).await,
        }
    }
}
