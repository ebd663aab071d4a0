//! Forwarding mode

use cast_core::ForwardingMode;
use serde::{Deserialize, Serialize};

use crate::client::ControlPlaneClient;
use crate::error::ControlError;

/// `{"mode": "..."}`, the body of both mode endpoints
#[derive(Debug, Serialize, Deserialize)]
struct ModeBody {
    mode: String,
}

/// Reads and changes the control plane's forwarding mode
#[derive(Debug, Clone)]
pub struct ModeCoordinator {
    client: ControlPlaneClient,
}

impl ModeCoordinator {
    pub fn new(client: ControlPlaneClient) -> Self {
        Self { client }
    }

    /// Fetch the current mode, reporting failures
    pub async fn fetch_mode(&self) -> Result<ForwardingMode, ControlError> {
        let response = self
            .client
            .http()
            .get(self.client.endpoint("mode"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ControlError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let ModeBody { mode } =
            serde_json::from_slice(&body).map_err(|e| ControlError::Malformed(e.to_string()))?;
        mode.parse::<ForwardingMode>()
            .map_err(|e| ControlError::Malformed(e.to_string()))
    }

    /// Current mode, or [`ForwardingMode::Unknown`] if it cannot be read
    pub async fn get_mode(&self) -> ForwardingMode {
        match self.fetch_mode().await {
            Ok(mode) => mode,
            Err(e) => {
                tracing::warn!("Failed to read forwarding mode: {}", e);
                ForwardingMode::Unknown
            }
        }
    }

    /// Switch the control plane to `mode`
    ///
    /// `Unknown` is refused without contacting the control plane.
    pub async fn set_mode(&self, mode: ForwardingMode) -> Result<(), ControlError> {
        if !mode.is_writable() {
            return Err(ControlError::InvalidMode(mode));
        }

        let response = self
            .client
            .http()
            .post(self.client.endpoint("mode"))
            .json(&ModeBody {
                mode: mode.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Forwarding mode set to {}", mode);
            Ok(())
        } else {
            tracing::warn!("Control plane refused mode {} (HTTP {})", mode, status.as_u16());
            Err(ControlError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
