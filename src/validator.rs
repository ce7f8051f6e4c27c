//! Bid validation gate.
//!
//! Pure read-only checks applied before a bid may enter the log. Checks run
//! in a fixed order and stop at the first failure; the store is untouched
//! either way.

use crate::store::AuctionStore;
use crate::types::{BidRejection, BidRequest};

/// Validate a proposed bid against purse, squad capacity, and the current
/// top bid for the player.
pub fn validate(store: &AuctionStore, req: &BidRequest) -> Result<(), BidRejection> {
    let team = store
        .team(req.team_id)
        .ok_or(BidRejection::TeamNotFound { team_id: req.team_id })?;

    let tournament = store
        .tournament(req.tournament_id)
        .ok_or(BidRejection::TournamentNotFound {
            tournament_id: req.tournament_id,
        })?;

    if req.amount > team.remaining_purse {
        return Err(BidRejection::InsufficientPurse {
            amount: req.amount,
            remaining: team.remaining_purse,
        });
    }

    if team.players_count >= tournament.players_per_team {
        return Err(BidRejection::SquadFull {
            players_count: team.players_count,
            cap: tournament.players_per_team,
        });
    }

    // Strictly greater than the current top. Opening bids pass regardless of
    // the category base price, which only seeds the suggested amount.
    if let Some(top) = store.top_bid(req.player_id) {
        if req.amount <= top.amount {
            return Err(BidRejection::BidTooLow {
                amount: req.amount,
                top: top.amount,
            });
        }
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
