//! Settlement engine.
//!
//! Finalizes a player's auction outcome and applies the purse and roster
//! effects as one unit: player status, sale fields, and the winning team's
//! `remaining_purse` / `players_count` become visible together or not at all.
//! The external sink is notified after the local commit; its failure only
//! shows up in the returned `synced` flag.

use anyhow::Result;
use tracing::{info, warn};

use crate::store::AuctionStore;
use crate::sync::{SaleNotification, SyncChannel};
use crate::types::{crores_from_lakhs, fmt_crores, EntityId, MoneyLakhs, PlayerStatus};

/// A finalization order from the auction desk
#[derive(Debug, Clone, Copy)]
pub struct FinalizeRequest {
    pub player_id: EntityId,
    pub status: PlayerStatus,
    /// Winning team, required together with `amount` for a purse debit
    pub team_id: Option<EntityId>,
    pub amount: Option<MoneyLakhs>,
}

impl FinalizeRequest {
    pub fn sold(player_id: EntityId, team_id: EntityId, amount: MoneyLakhs) -> Self {
        Self {
            player_id,
            status: PlayerStatus::Sold,
            team_id: Some(team_id),
            amount: Some(amount),
        }
    }

    pub fn unsold(player_id: EntityId) -> Self {
        Self {
            player_id,
            status: PlayerStatus::Unsold,
            team_id: None,
            amount: None,
        }
    }
}

/// Why a settlement was refused without touching any state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleReason {
    PlayerNotFound,
    UnknownTeam,
    NotAnOutcome,
}

impl std::fmt::Display for SettleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettleReason::PlayerNotFound => write!(f, "player not found"),
            SettleReason::UnknownTeam => write!(f, "sold to unknown team"),
            SettleReason::NotAnOutcome => write!(f, "AVAILABLE is not a settlement outcome"),
        }
    }
}

/// Result of a finalization attempt
#[derive(Debug, Clone)]
pub struct SettlementResult {
    pub player_id: EntityId,
    pub status: PlayerStatus,
    /// Winning team and price when the player sold with full terms
    pub sale: Option<(EntityId, MoneyLakhs)>,
    /// Whether the local settlement was applied
    pub success: bool,
    /// Whether the external sink acknowledged the notification
    pub synced: bool,
    pub error: Option<SettleReason>,
}

/// Applies finalization orders against the store and notifies the sink
pub struct SettlementEngine {
    sync: SyncChannel,
}

impl SettlementEngine {
    pub fn new(sync: SyncChannel) -> Self {
        Self { sync }
    }

    /// Finalize one player. Local state commits before the sink is involved;
    /// every refusal is a value on the result, never an early error.
    pub async fn finalize(
        &self,
        store: &mut AuctionStore,
        req: FinalizeRequest,
    ) -> Result<SettlementResult> {
        if req.status == PlayerStatus::Available {
            return Ok(refused(&req, SettleReason::NotAnOutcome));
        }

        let Some(player_idx) = store.player_index(req.player_id) else {
            warn!("[SETTLE] Player {} not found, nothing settled", req.player_id);
            return Ok(refused(&req, SettleReason::PlayerNotFound));
        };

        // A purse debit needs both halves of the sale terms; a SOLD call
        // without them only moves the player's status.
        let sale = match (req.status, req.team_id, req.amount) {
            (PlayerStatus::Sold, Some(team_id), Some(amount)) => {
                if store.team(team_id).is_none() {
                    warn!(
                        "[SETTLE] Refusing sale of player {} to unknown team {}",
                        req.player_id, team_id
                    );
                    return Ok(refused(&req, SettleReason::UnknownTeam));
                }
                Some((team_id, amount))
            }
            _ => None,
        };

        store.apply_settlement(player_idx, req.status, sale)?;
        match sale {
            Some((team_id, amount)) => info!(
                "[SETTLE] Player {} SOLD to team {} for {}",
                req.player_id,
                team_id,
                fmt_crores(amount)
            ),
            None => info!("[SETTLE] Player {} finalized as {}", req.player_id, req.status),
        }

        let synced = self
            .sync
            .notify(SaleNotification {
                id: req.player_id,
                price: sale.map(|(_, amount)| crores_from_lakhs(amount)),
                team_id: sale.map(|(team_id, _)| team_id),
                status: req.status,
            })
            .await;

        Ok(SettlementResult {
            player_id: req.player_id,
            status: req.status,
            sale,
            success: true,
            synced,
            error: None,
        })
    }
}

fn refused(req: &FinalizeRequest, reason: SettleReason) -> SettlementResult {
    SettlementResult {
        player_id: req.player_id,
        status: req.status,
        sale: None,
        success: false,
        synced: false,
        error: Some(reason),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{create_sync_channel, run_sync_loop, SyncClient};
    use crate::types::{
        NewCategory, NewPlayer, NewTeam, NewTournament, PlayerProfile,
    };

    fn engine_with_dry_run_sink() -> SettlementEngine {
        let (channel, rx) = create_sync_channel();
        tokio::spawn(run_sync_loop(rx, SyncClient::new(None, true)));
        SettlementEngine::new(channel)
    }

    fn seeded() -> (AuctionStore, EntityId, EntityId) {
        let mut store = AuctionStore::open_in_memory().unwrap();
        let t = store
            .add_tournament(NewTournament {
                name: "Cup".into(),
                venue: "Ground".into(),
                auction_date: "2026-06-01".into(),
                number_of_teams: 2,
                players_per_team: 2,
            })
            .unwrap();
        let team = store
            .add_team(NewTeam {
                tournament_id: t.id,
                name: "Falcons".into(),
                owner: "owner".into(),
                purse: 10_000,
            })
            .unwrap();
        let c = store
            .add_category(NewCategory {
                tournament_id: t.id,
                name: "Gold".into(),
                base_price: 100,
            })
            .unwrap();
        let p = store
            .add_player(NewPlayer {
                tournament_id: t.id,
                name: "Opener".into(),
                mobile_number: String::new(),
                category_id: c.id,
                profile: PlayerProfile::Batsman,
                image_url: String::new(),
                sheet_key: None,
            })
            .unwrap();
        (store, team.id, p.id)
    }

    #[tokio::test]
    async fn test_sold_debits_team_and_marks_player() {
        let (mut store, team_id, player_id) = seeded();
        let engine = engine_with_dry_run_sink();

        let result = engine
            .finalize(&mut store, FinalizeRequest::sold(player_id, team_id, 250))
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.synced);
        assert_eq!(result.sale, Some((team_id, 250)));

        let player = store.player(player_id).unwrap();
        assert_eq!(player.status, PlayerStatus::Sold);
        assert_eq!(player.sold_to_team_id, Some(team_id));
        assert_eq!(player.sold_price, Some(250));

        let team = store.team(team_id).unwrap();
        assert_eq!(team.remaining_purse, 9_750);
        assert_eq!(team.players_count, 1);
    }

    #[tokio::test]
    async fn test_unsold_leaves_team_untouched() {
        let (mut store, team_id, player_id) = seeded();
        let engine = engine_with_dry_run_sink();

        let result = engine
            .finalize(&mut store, FinalizeRequest::unsold(player_id))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.sale, None);

        let player = store.player(player_id).unwrap();
        assert_eq!(player.status, PlayerStatus::Unsold);
        assert_eq!(player.sold_to_team_id, None);
        assert_eq!(player.sold_price, None);

        let team = store.team(team_id).unwrap();
        assert_eq!(team.remaining_purse, 10_000);
        assert_eq!(team.players_count, 0);
    }

    #[tokio::test]
    async fn test_missing_player_is_a_reported_no_op() {
        let (mut store, team_id, _) = seeded();
        let engine = engine_with_dry_run_sink();

        let result = engine
            .finalize(&mut store, FinalizeRequest::sold(404_404, team_id, 250))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.error, Some(SettleReason::PlayerNotFound));
        assert_eq!(store.team(team_id).unwrap().remaining_purse, 10_000);
    }

    #[tokio::test]
    async fn test_unknown_team_refuses_whole_settlement() {
        let (mut store, _, player_id) = seeded();
        let engine = engine_with_dry_run_sink();

        let result = engine
            .finalize(&mut store, FinalizeRequest::sold(player_id, 505_505, 250))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.error, Some(SettleReason::UnknownTeam));
        // Player must not be left pointing at a team that does not exist
        let player = store.player(player_id).unwrap();
        assert_eq!(player.status, PlayerStatus::Available);
        assert_eq!(player.sold_to_team_id, None);
    }

    #[tokio::test]
    async fn test_sold_without_terms_moves_status_only() {
        let (mut store, team_id, player_id) = seeded();
        let engine = engine_with_dry_run_sink();

        let result = engine
            .finalize(
                &mut store,
                FinalizeRequest {
                    player_id,
                    status: PlayerStatus::Sold,
                    team_id: None,
                    amount: None,
                },
            )
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.sale, None);
        assert_eq!(store.player(player_id).unwrap().status, PlayerStatus::Sold);
        assert_eq!(store.team(team_id).unwrap().players_count, 0);
    }

    #[tokio::test]
    async fn test_available_is_not_an_outcome() {
        let (mut store, _, player_id) = seeded();
        let engine = engine_with_dry_run_sink();

        let result = engine
            .finalize(
                &mut store,
                FinalizeRequest {
                    player_id,
                    status: PlayerStatus::Available,
                    team_id: None,
                    amount: None,
                },
            )
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.error, Some(SettleReason::NotAnOutcome));
    }

    #[tokio::test]
    async fn test_local_commit_stands_when_sink_is_down() {
        let (mut store, team_id, player_id) = seeded();
        // No loop running behind this channel
        let (channel, rx) = create_sync_channel();
        drop(rx);
        let engine = SettlementEngine::new(channel);

        let result = engine
            .finalize(&mut store, FinalizeRequest::sold(player_id, team_id, 300))
            .await
            .unwrap();

        assert!(result.success, "local settlement is authoritative");
        assert!(!result.synced);
        assert_eq!(store.team(team_id).unwrap().remaining_purse, 9_700);
        assert_eq!(store.player(player_id).unwrap().status, PlayerStatus::Sold);
    }
}
