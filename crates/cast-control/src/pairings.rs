//! Pairing registration

use cast_core::Pairing;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::client::ControlPlaneClient;
use crate::error::ControlError;

/// Registers and removes client/device pairings on the control plane
#[derive(Debug, Clone)]
pub struct PairingCoordinator {
    client: ControlPlaneClient,
}

impl PairingCoordinator {
    pub fn new(client: ControlPlaneClient) -> Self {
        Self { client }
    }

    /// Register a pairing
    ///
    /// Succeeds when the pairing already exists, however the control plane
    /// chooses to report the duplicate.
    pub async fn add(&self, pairing: &Pairing) -> Result<(), ControlError> {
        let response = self
            .client
            .http()
            .post(self.client.endpoint("pairings"))
            .json(pairing)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Registered pairing {}", pairing);
            return Ok(());
        }

        if status == StatusCode::CONFLICT {
            tracing::debug!("Pairing {} already registered", pairing);
            return Ok(());
        }

        // Other 4xx may still mean "duplicate"; the current set decides
        if status.is_client_error() {
            match self.fetch().await {
                Ok(existing) if existing.contains(pairing) => {
                    tracing::debug!(
                        "Pairing {} already registered (HTTP {})",
                        pairing,
                        status.as_u16()
                    );
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Could not confirm pairing {}: {}", pairing, e),
            }
        }

        tracing::warn!("Control plane rejected pairing {} (HTTP {})", pairing, status.as_u16());
        Err(ControlError::Rejected {
            status: status.as_u16(),
        })
    }

    /// Remove a pairing; removing one that does not exist succeeds
    pub async fn remove(&self, pairing: &Pairing) -> Result<(), ControlError> {
        let response = self
            .client
            .http()
            .delete(self.client.endpoint("pairings"))
            .json(pairing)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            tracing::info!("Removed pairing {}", pairing);
            Ok(())
        } else {
            tracing::warn!("Control plane refused to remove {} (HTTP {})", pairing, status.as_u16());
            Err(ControlError::Rejected {
                status: status.as_u16(),
            })
        }
    }

    /// Fetch the current pairing set, reporting failures
    pub async fn fetch(&self) -> Result<Vec<Pairing>, ControlError> {
        let response = self
            .client
            .http()
            .get(self.client.endpoint("pairings"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ControlError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let entries: Vec<serde_json::Value> =
            serde_json::from_slice(&body).map_err(|e| ControlError::Malformed(e.to_string()))?;

        // Entries written by other tools may not hold valid MACs; they must
        // not hide the rest of the set.
        Ok(entries
            .iter()
            .filter_map(|entry| match Pairing::deserialize(entry) {
                Ok(pairing) => Some(pairing),
                Err(e) => {
                    tracing::warn!("Skipping invalid pairing entry {}: {}", entry, e);
                    None
                }
            })
            .collect())
    }

    /// Fetch the current pairing set; any failure yields an empty list
    pub async fn list(&self) -> Vec<Pairing> {
        match self.fetch().await {
            Ok(pairings) => pairings,
            Err(e) => {
                tracing::warn!("Failed to list pairings: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{DuplicatePolicy, MockControlPlane};
    use std::time::Duration;

    fn pairing(client: &str, device: &str) -> Pairing {
        Pairing::new(client.parse().unwrap(), device.parse().unwrap())
    }

    fn coordinator(base_url: &str) -> PairingCoordinator {
        PairingCoordinator::new(ControlPlaneClient::new(base_url, Duration::from_secs(2)).unwrap())
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let mock = MockControlPlane::start().await;
        let pairings = coordinator(&mock.base_url());
        let p = pairing("11:22:33:44:55:66", "AA:BB:CC:DD:EE:FF");

        pairings.add(&p).await.unwrap();

        assert_eq!(pairings.list().await, vec![p]);
    }

    #[tokio::test]
    async fn test_add_remove_list_cleans_up() {
        let mock = MockControlPlane::start().await;
        let pairings = coordinator(&mock.base_url());
        let keep = pairing("01:01:01:01:01:01", "AA:BB:CC:DD:EE:FF");
        let temp = pairing("11:22:33:44:55:66", "AA:BB:CC:DD:EE:FF");

        pairings.add(&keep).await.unwrap();
        pairings.add(&temp).await.unwrap();
        pairings.remove(&temp).await.unwrap();

        let listed = pairings.list().await;
        assert!(!listed.contains(&temp));
        assert!(listed.contains(&keep));
    }

    #[tokio::test]
    async fn test_remove_missing_is_ok() {
        let mock = MockControlPlane::start().await;
        let pairings = coordinator(&mock.base_url());
        pairings
            .remove(&pairing("11:22:33:44:55:66", "AA:BB:CC:DD:EE:FF"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_add_is_idempotent_for_every_policy() {
        for policy in [
            DuplicatePolicy::Accept,
            DuplicatePolicy::Conflict,
            DuplicatePolicy::BadRequest,
        ] {
            let mock = MockControlPlane::start().await;
            mock.set_duplicate_policy(policy);
            let pairings = coordinator(&mock.base_url());
            let p = pairing("11:22:33:44:55:66", "AA:BB:CC:DD:EE:FF");

            pairings.add(&p).await.unwrap();
            assert!(pairings.add(&p).await.is_ok(), "policy {:?}", policy);
            assert_eq!(mock.pairings().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_add_rejected_surfaces_status() {
        let mock = MockControlPlane::start().await;
        mock.set_reject_writes(true);
        let pairings = coordinator(&mock.base_url());

        let err = pairings
            .add(&pairing("11:22:33:44:55:66", "AA:BB:CC:DD:EE:FF"))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Rejected { status: 503 }));
    }

    #[tokio::test]
    async fn test_add_times_out() {
        let mock = MockControlPlane::start().await;
        mock.set_delay(Duration::from_secs(5));
        let pairings = PairingCoordinator::new(
            ControlPlaneClient::new(&mock.base_url(), Duration::from_millis(200)).unwrap(),
        );

        let err = pairings
            .add(&pairing("11:22:33:44:55:66", "AA:BB:CC:DD:EE:FF"))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Timeout));
    }

    #[tokio::test]
    async fn test_list_degrades_when_unreachable() {
        let mock = MockControlPlane::start().await;
        let base_url = mock.base_url();
        mock.shutdown().await;

        let pairings = coordinator(&base_url);
        assert!(pairings.list().await.is_empty());
        assert!(matches!(
            pairings.fetch().await,
            Err(ControlError::Unreachable(_))
        ));
    }

    #[tokio::test]
    async fn test_list_skips_invalid_entries() {
        let mock = MockControlPlane::start().await;
        mock.push_raw_pairing(serde_json::json!({
            "client_mac": "aabbccddeeff",
            "device_mac": "AA:BB:CC:DD:EE:FF"
        }));
        mock.push_raw_pairing(serde_json::json!({ "client_mac": "11:22:33:44:55:66" }));
        mock.push_raw_pairing(serde_json::json!("not an object"));
        let pairings = coordinator(&mock.base_url());
        let valid = pairing("11:22:33:44:55:66", "AA:BB:CC:DD:EE:FF");
        pairings.add(&valid).await.unwrap();

        assert_eq!(pairings.list().await, vec![valid.clone()]);
        assert_eq!(pairings.fetch().await.unwrap(), vec![valid]);
    }

    #[tokio::test]
    async fn test_list_degrades_on_malformed_body() {
        let mock = MockControlPlane::start().await;
        mock.set_malformed_reads(true);
        let pairings = coordinator(&mock.base_url());

        assert!(pairings.list().await.is_empty());
        assert!(matches!(
            pairings.fetch().await,
            Err(ControlError::Malformed(_))
        ));
    }
}
