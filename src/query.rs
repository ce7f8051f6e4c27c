//! Read views over the flat collections.
//!
//! Plain O(n) filters per call; at tens to low hundreds of records there is
//! nothing worth caching, and recomputing keeps the views trivially
//! consistent with the store.

use crate::store::AuctionStore;
use crate::types::{Category, EntityId, MoneyLakhs, Player, PlayerStatus, Team, Tournament};

/// Everything one tournament's pages need, filtered from the flat collections
#[derive(Debug, Clone, PartialEq)]
pub struct TournamentData {
    pub tournament: Option<Tournament>,
    pub teams: Vec<Team>,
    pub categories: Vec<Category>,
    pub players: Vec<Player>,
}

pub fn tournament_data(store: &AuctionStore, tournament_id: EntityId) -> TournamentData {
    TournamentData {
        tournament: store.tournament(tournament_id).cloned(),
        teams: store
            .teams()
            .iter()
            .filter(|t| t.tournament_id == tournament_id)
            .cloned()
            .collect(),
        categories: store
            .categories()
            .iter()
            .filter(|c| c.tournament_id == tournament_id)
            .cloned()
            .collect(),
        players: store
            .players()
            .iter()
            .filter(|p| p.tournament_id == tournament_id)
            .cloned()
            .collect(),
    }
}

/// Players bought by one team
pub fn team_roster<'a>(store: &'a AuctionStore, team_id: EntityId) -> Vec<&'a Player> {
    store
        .players()
        .iter()
        .filter(|p| p.status == PlayerStatus::Sold && p.sold_to_team_id == Some(team_id))
        .collect()
}

/// Tournament-wide settlement totals for the summary page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuctionSummary {
    pub available: usize,
    pub sold: usize,
    pub unsold: usize,
    /// Sum of all completed purchase prices
    pub total_spent: MoneyLakhs,
}

pub fn auction_summary(store: &AuctionStore, tournament_id: EntityId) -> AuctionSummary {
    let mut summary = AuctionSummary::default();
    for player in store
        .players()
        .iter()
        .filter(|p| p.tournament_id == tournament_id)
    {
        match player.status {
            PlayerStatus::Available => summary.available += 1,
            PlayerStatus::Sold => {
                summary.sold += 1;
                summary.total_spent += player.sold_price.unwrap_or(0);
            }
            PlayerStatus::Unsold => summary.unsold += 1,
        }
    }
    summary
}
