use crate::core::{CycleOutcome, Pipeline};
use crate::utils::error::RelayError;

/// Drives one relay cycle through the pipeline stages.
///
/// Every failure stays inside its cycle: it is logged and reported as a
/// [`CycleOutcome`], never returned to the caller.
pub struct RelayEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> RelayEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> CycleOutcome {
        tracing::debug!("Starting relay cycle");

        let response = match self.pipeline.extract().await {
            Ok(response) => response,
            Err(RelayError::Location(e)) => {
                tracing::error!("Error requesting location: {}", e);
                return CycleOutcome::LocationFailed;
            }
            Err(e) => {
                tracing::debug!("Poem request did not complete: {}", e);
                return CycleOutcome::Incomplete;
            }
        };
        tracing::debug!(
            "Received {} bytes (status {}) from {}",
            response.body.len(),
            response.status,
            response.url
        );

        let message = match self.pipeline.transform(response).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!("Error parsing poem response: {}", e);
                return CycleOutcome::ParseFailed;
            }
        };

        match self.pipeline.load(message.clone()).await {
            Ok(receipt) => {
                tracing::info!("Poem sent to watch successfully! ({} bytes)", receipt.bytes);
                CycleOutcome::Delivered(message)
            }
            Err(e) => {
                tracing::error!("Error sending poem to watch: {}", e);
                CycleOutcome::SendFailed(message)
            }
        }
    }
}
