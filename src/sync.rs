//! Cloud sync sink adapter.
//!
//! Settlements commit locally first; notifications to the external sink drain
//! through a bounded channel in a background task and are acknowledged back
//! over oneshot handles. A failed or timed-out push is logged and reported as
//! `false` — local state is authoritative and never rolled back.

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::config::{HTTP_TIMEOUT_SECS, SYNC_CHANNEL_CAPACITY, SYNC_TIMEOUT_SECS};
use crate::types::{EntityId, PlayerStatus};

/// Wire payload for one finalized player, POSTed to the configured sink.
/// Price travels in crores; team and price are absent for UNSOLD.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleNotification {
    pub id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<EntityId>,
    pub status: PlayerStatus,
}

/// HTTP client for the sync sink. Any 2xx response counts as delivered.
pub struct SyncClient {
    http: reqwest::Client,
    endpoint: Option<String>,
    pub dry_run: bool,
}

impl SyncClient {
    pub fn new(endpoint: Option<String>, dry_run: bool) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint,
            dry_run,
        }
    }

    pub async fn push(&self, sale: &SaleNotification) -> Result<()> {
        if self.dry_run {
            info!("[SYNC] DRY RUN - would push {:?}", sale);
            return Ok(());
        }
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| anyhow!("sync endpoint not configured"))?;

        let resp = self.http.post(endpoint).json(sale).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("sync push failed: {} - {}", status, body));
        }
        Ok(())
    }
}

/// One queued notification with its acknowledgement handle
pub struct SyncMessage {
    pub sale: SaleNotification,
    pub ack: oneshot::Sender<bool>,
}

/// Clonable handle for queueing notifications to the sink loop
#[derive(Clone)]
pub struct SyncChannel {
    tx: mpsc::Sender<SyncMessage>,
}

impl SyncChannel {
    /// Queue a notification and wait for the sink's acknowledgement.
    /// Returns false when the push failed, timed out, or the loop is gone.
    pub async fn notify(&self, sale: SaleNotification) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SyncMessage { sale, ack: ack_tx }).await.is_err() {
            warn!("[SYNC] Sink loop is not running, notification dropped");
            return false;
        }
        match tokio::time::timeout(Duration::from_secs(SYNC_TIMEOUT_SECS), ack_rx).await {
            Ok(Ok(delivered)) => delivered,
            Ok(Err(_)) => {
                warn!("[SYNC] Sink loop dropped the acknowledgement");
                false
            }
            Err(_) => {
                warn!("[SYNC] Timed out waiting for sink acknowledgement");
                false
            }
        }
    }
}

/// Create the settlement-to-sink notification channel with bounded capacity
pub fn create_sync_channel() -> (SyncChannel, mpsc::Receiver<SyncMessage>) {
    let (tx, rx) = mpsc::channel(SYNC_CHANNEL_CAPACITY);
    (SyncChannel { tx }, rx)
}

/// Background drain loop - pushes notifications as they arrive
pub async fn run_sync_loop(mut rx: mpsc::Receiver<SyncMessage>, client: SyncClient) {
    info!("[SYNC] Sink loop started (dry_run={})", client.dry_run);

    while let Some(msg) = rx.recv().await {
        let delivered = match client.push(&msg.sale).await {
            Ok(()) => {
                info!(
                    "[SYNC] ✅ Pushed settlement for player {} ({})",
                    msg.sale.id, msg.sale.status
                );
                true
            }
            Err(e) => {
                warn!("[SYNC] ⚠️ Push failed for player {}: {}", msg.sale.id, e);
                false
            }
        };
        let _ = msg.ack.send(delivered);
    }

    info!("[SYNC] Sink loop stopped");
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_wire_shape() {
        let sale = SaleNotification {
            id: 42,
            price: Some(2.05),
            team_id: Some(7),
            status: PlayerStatus::Sold,
        };
        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["id"], 42);
        assert_eq!(json["price"], 2.05);
        assert_eq!(json["teamId"], 7);
        assert_eq!(json["status"], "SOLD");
    }

    #[test]
    fn test_unsold_notification_omits_sale_fields() {
        let sale = SaleNotification {
            id: 42,
            price: None,
            team_id: None,
            status: PlayerStatus::Unsold,
        };
        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["status"], "UNSOLD");
        assert!(json.get("price").is_none());
        assert!(json.get("teamId").is_none());
    }

    #[tokio::test]
    async fn test_dry_run_push_succeeds_without_network() {
        let client = SyncClient::new(None, true);
        let sale = SaleNotification {
            id: 1,
            price: Some(0.5),
            team_id: Some(2),
            status: PlayerStatus::Sold,
        };
        assert!(client.push(&sale).await.is_ok());
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint_fails_as_value() {
        let client = SyncClient::new(None, false);
        let sale = SaleNotification {
            id: 1,
            price: None,
            team_id: None,
            status: PlayerStatus::Unsold,
        };
        assert!(client.push(&sale).await.is_err());
    }

    #[tokio::test]
    async fn test_channel_acks_through_loop() {
        let (channel, rx) = create_sync_channel();
        tokio::spawn(run_sync_loop(rx, SyncClient::new(None, true)));

        let delivered = channel
            .notify(SaleNotification {
                id: 9,
                price: Some(1.0),
                team_id: Some(3),
                status: PlayerStatus::Sold,
            })
            .await;
        assert!(delivered);
    }

    #[tokio::test]
    async fn test_notify_without_loop_reports_false() {
        let (channel, rx) = create_sync_channel();
        drop(rx);

        let delivered = channel
            .notify(SaleNotification {
                id: 9,
                price: None,
                team_id: None,
                status: PlayerStatus::Unsold,
            })
            .await;
        assert!(!delivered);
    }
}
