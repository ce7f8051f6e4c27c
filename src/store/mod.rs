//! Owned entity store for the auction ledger.
//!
//! All five collections live behind [`AuctionStore`]; every mutation funnels
//! through its methods and persists the full record set before returning.
//! Nothing hands out shared mutable state — callers that need the store are
//! given a reference to this one object.

pub mod snapshot;

pub use snapshot::SnapshotStore;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::types::{
    Bid, BidOutcome, BidRequest, Category, DeleteBlocked, DeleteOutcome, EntityId, MoneyLakhs,
    NewCategory, NewPlayer, NewTeam, NewTournament, Player, PlayerStatus, Team, Tournament,
};
use crate::validator;
use snapshot::{
    REC_BIDS, REC_CATEGORIES, REC_NEXT_ID, REC_PLAYERS, REC_SHEET_URL, REC_SYNC_ENDPOINT,
    REC_TEAMS, REC_TOURNAMENTS,
};

/// Counts reported back from a bulk player import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkAddSummary {
    /// Fresh players appended as AVAILABLE
    pub added: usize,
    /// Existing players refreshed in place (auction outcome untouched)
    pub updated: usize,
}

pub struct AuctionStore {
    tournaments: Vec<Tournament>,
    teams: Vec<Team>,
    categories: Vec<Category>,
    players: Vec<Player>,
    bids: Vec<Bid>,
    next_id: EntityId,
    sync_endpoint: Option<String>,
    sheet_url: Option<String>,
    snapshot: SnapshotStore,
}

impl AuctionStore {
    /// Open the durable store and hydrate all collections
    pub fn open(path: &str) -> Result<Self> {
        Self::hydrate(SnapshotStore::open(path)?)
    }

    /// Ephemeral store for tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        Self::hydrate(SnapshotStore::open_in_memory()?)
    }

    fn hydrate(snapshot: SnapshotStore) -> Result<Self> {
        // Each named record is read independently; a missing or unreadable
        // record hydrates as empty rather than failing startup.
        let tournaments: Vec<Tournament> = snapshot.load_record(REC_TOURNAMENTS)?;
        let teams: Vec<Team> = snapshot.load_record(REC_TEAMS)?;
        let categories: Vec<Category> = snapshot.load_record(REC_CATEGORIES)?;
        let players: Vec<Player> = snapshot.load_record(REC_PLAYERS)?;
        let bids: Vec<Bid> = snapshot.load_record(REC_BIDS)?;

        let stored_next: EntityId = snapshot
            .load(REC_NEXT_ID)?
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        // The counter must never lag behind an id already on disk
        let max_seen = tournaments
            .iter()
            .map(|t| t.id)
            .chain(teams.iter().map(|t| t.id))
            .chain(categories.iter().map(|c| c.id))
            .chain(players.iter().map(|p| p.id))
            .chain(bids.iter().map(|b| b.id))
            .max()
            .unwrap_or(0);
        let next_id = stored_next.max(max_seen + 1);

        let sync_endpoint = snapshot.load(REC_SYNC_ENDPOINT)?.filter(|s| !s.is_empty());
        let sheet_url = snapshot.load(REC_SHEET_URL)?.filter(|s| !s.is_empty());

        info!(
            "[STORE] Loaded {} tournaments, {} teams, {} categories, {} players, {} bids",
            tournaments.len(),
            teams.len(),
            categories.len(),
            players.len(),
            bids.len()
        );

        Ok(Self {
            tournaments,
            teams,
            categories,
            players,
            bids,
            next_id,
            sync_endpoint,
            sheet_url,
            snapshot,
        })
    }

    /// Write the full collection set in one transaction
    fn persist(&self) -> Result<()> {
        self.snapshot.save_batch(&[
            (REC_TOURNAMENTS, serde_json::to_string(&self.tournaments)?),
            (REC_TEAMS, serde_json::to_string(&self.teams)?),
            (REC_CATEGORIES, serde_json::to_string(&self.categories)?),
            (REC_PLAYERS, serde_json::to_string(&self.players)?),
            (REC_BIDS, serde_json::to_string(&self.bids)?),
            (REC_NEXT_ID, self.next_id.to_string()),
        ])
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // === Read access ===

    pub fn tournaments(&self) -> &[Tournament] {
        &self.tournaments
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn bids(&self) -> &[Bid] {
        &self.bids
    }

    pub fn tournament(&self, id: EntityId) -> Option<&Tournament> {
        self.tournaments.iter().find(|t| t.id == id)
    }

    pub fn team(&self, id: EntityId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn category(&self, id: EntityId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn player(&self, id: EntityId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn player_index(&self, id: EntityId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Live bids for one player, newest first
    pub fn bids_for_player(&self, player_id: EntityId) -> Vec<&Bid> {
        let mut bids: Vec<&Bid> = self
            .bids
            .iter()
            .filter(|b| b.player_id == player_id)
            .collect();
        bids.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        bids
    }

    /// Current top bid, recomputed as max-by-amount over the log on every call
    pub fn top_bid(&self, player_id: EntityId) -> Option<&Bid> {
        self.bids
            .iter()
            .filter(|b| b.player_id == player_id)
            .max_by_key(|b| b.amount)
    }

    // === Tournament ===

    pub fn add_tournament(&mut self, new: NewTournament) -> Result<Tournament> {
        let tournament = Tournament {
            id: self.alloc_id(),
            name: new.name,
            venue: new.venue,
            auction_date: new.auction_date,
            number_of_teams: new.number_of_teams,
            players_per_team: new.players_per_team,
        };
        info!("[STORE] Created tournament '{}' ({})", tournament.name, tournament.id);
        self.tournaments.push(tournament.clone());
        self.persist()?;
        Ok(tournament)
    }

    /// Replace a tournament record in full. Returns false when the id is unknown.
    pub fn update_tournament(&mut self, tournament: Tournament) -> Result<bool> {
        match self.tournaments.iter_mut().find(|t| t.id == tournament.id) {
            Some(slot) => {
                *slot = tournament;
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // === Team ===

    pub fn add_team(&mut self, new: NewTeam) -> Result<Team> {
        let team = Team {
            id: self.alloc_id(),
            tournament_id: new.tournament_id,
            name: new.name,
            owner: new.owner,
            purse: new.purse,
            remaining_purse: new.purse,
            players_count: 0,
        };
        info!(
            "[STORE] Registered team '{}' with purse {}",
            team.name,
            crate::types::fmt_crores(team.purse)
        );
        self.teams.push(team.clone());
        self.persist()?;
        Ok(team)
    }

    /// Remove a team. Refused while sold players or live bids still reference
    /// it, so purse history stays reconstructible.
    pub fn delete_team(&mut self, id: EntityId) -> Result<DeleteOutcome> {
        if !self.teams.iter().any(|t| t.id == id) {
            return Ok(DeleteOutcome::NotFound);
        }
        let sold = self
            .players
            .iter()
            .filter(|p| p.sold_to_team_id == Some(id))
            .count();
        if sold > 0 {
            return Ok(DeleteOutcome::Blocked(DeleteBlocked::TeamHasSoldPlayers {
                players: sold,
            }));
        }
        let live = self.bids.iter().filter(|b| b.team_id == id).count();
        if live > 0 {
            return Ok(DeleteOutcome::Blocked(DeleteBlocked::TeamHasLiveBids {
                bids: live,
            }));
        }
        self.teams.retain(|t| t.id != id);
        self.persist()?;
        Ok(DeleteOutcome::Removed)
    }

    // === Category ===

    pub fn add_category(&mut self, new: NewCategory) -> Result<Category> {
        let category = Category {
            id: self.alloc_id(),
            tournament_id: new.tournament_id,
            name: new.name,
            base_price: new.base_price,
        };
        self.categories.push(category.clone());
        self.persist()?;
        Ok(category)
    }

    /// Remove a category. Refused while any player still references it.
    pub fn delete_category(&mut self, id: EntityId) -> Result<DeleteOutcome> {
        if !self.categories.iter().any(|c| c.id == id) {
            return Ok(DeleteOutcome::NotFound);
        }
        let referenced = self
            .players
            .iter()
            .filter(|p| p.category_id == id)
            .count();
        if referenced > 0 {
            return Ok(DeleteOutcome::Blocked(DeleteBlocked::CategoryInUse {
                players: referenced,
            }));
        }
        self.categories.retain(|c| c.id != id);
        self.persist()?;
        Ok(DeleteOutcome::Removed)
    }

    // === Player ===

    pub fn add_player(&mut self, new: NewPlayer) -> Result<Player> {
        let player = Player {
            id: self.alloc_id(),
            tournament_id: new.tournament_id,
            name: new.name,
            mobile_number: new.mobile_number,
            category_id: new.category_id,
            profile: new.profile,
            image_url: new.image_url,
            status: PlayerStatus::Available,
            sold_to_team_id: None,
            sold_price: None,
            sheet_key: new.sheet_key,
        };
        self.players.push(player.clone());
        self.persist()?;
        Ok(player)
    }

    /// Merge a batch of imported players into the tournament.
    ///
    /// Rows carrying a sheet key that is already present refresh the roster
    /// fields in place; status and sale fields are never touched here, so a
    /// re-import cannot reset a SOLD player. Everything else appends as a
    /// fresh AVAILABLE player.
    pub fn bulk_add_players(&mut self, incoming: Vec<NewPlayer>) -> Result<BulkAddSummary> {
        let mut summary = BulkAddSummary::default();
        for new in incoming {
            let existing = new.sheet_key.as_deref().and_then(|key| {
                self.players.iter().position(|p| {
                    p.tournament_id == new.tournament_id && p.sheet_key.as_deref() == Some(key)
                })
            });
            match existing {
                Some(i) => {
                    let player = &mut self.players[i];
                    player.name = new.name;
                    player.mobile_number = new.mobile_number;
                    player.category_id = new.category_id;
                    player.profile = new.profile;
                    player.image_url = new.image_url;
                    summary.updated += 1;
                }
                None => {
                    let id = self.alloc_id();
                    self.players.push(Player {
                        id,
                        tournament_id: new.tournament_id,
                        name: new.name,
                        mobile_number: new.mobile_number,
                        category_id: new.category_id,
                        profile: new.profile,
                        image_url: new.image_url,
                        status: PlayerStatus::Available,
                        sold_to_team_id: None,
                        sold_price: None,
                        sheet_key: new.sheet_key,
                    });
                    summary.added += 1;
                }
            }
        }
        self.persist()?;
        Ok(summary)
    }

    /// Remove a player and any live bids on them. Returns false when unknown.
    pub fn delete_player(&mut self, id: EntityId) -> Result<bool> {
        let before = self.players.len();
        self.players.retain(|p| p.id != id);
        if self.players.len() == before {
            return Ok(false);
        }
        self.bids.retain(|b| b.player_id != id);
        self.persist()?;
        Ok(true)
    }

    // === Bidding ===

    /// Reset the live bid log when the auction moves to a new player
    pub fn clear_bids(&mut self) -> Result<usize> {
        let cleared = self.bids.len();
        self.bids.clear();
        self.persist()?;
        Ok(cleared)
    }

    /// Validate and record a bid. On rejection nothing changes, not even on disk.
    pub fn place_bid(&mut self, req: &BidRequest) -> Result<BidOutcome> {
        if let Err(rejection) = validator::validate(self, req) {
            info!(
                "[STORE] Bid of {} by team {} on player {} rejected: {}",
                crate::types::fmt_crores(req.amount),
                req.team_id,
                req.player_id,
                rejection
            );
            return Ok(BidOutcome::Rejected(rejection));
        }
        let bid = Bid {
            id: self.alloc_id(),
            tournament_id: req.tournament_id,
            player_id: req.player_id,
            team_id: req.team_id,
            amount: req.amount,
            timestamp: Utc::now(),
        };
        self.bids.push(bid.clone());
        self.persist()?;
        Ok(BidOutcome::Accepted(bid))
    }

    // === Settlement hook ===

    /// Apply a finalized outcome: player fields and, for a full sale, the
    /// winning team's purse and roster count, persisted as one unit.
    pub(crate) fn apply_settlement(
        &mut self,
        player_idx: usize,
        status: PlayerStatus,
        sale: Option<(EntityId, MoneyLakhs)>,
    ) -> Result<()> {
        {
            let player = &mut self.players[player_idx];
            player.status = status;
            match sale {
                Some((team_id, amount)) => {
                    player.sold_to_team_id = Some(team_id);
                    player.sold_price = Some(amount);
                }
                None => {
                    player.sold_to_team_id = None;
                    player.sold_price = None;
                }
            }
        }
        if let Some((team_id, amount)) = sale {
            match self.teams.iter_mut().find(|t| t.id == team_id) {
                Some(team) => {
                    team.remaining_purse -= amount;
                    team.players_count += 1;
                }
                // Settlement checks the team before calling in; reaching this
                // arm means the store was mutated mid-settlement.
                None => warn!("[STORE] Settlement against vanished team {}", team_id),
            }
        }
        self.persist()
    }

    // === Persisted configuration strings ===

    pub fn sync_endpoint(&self) -> Option<&str> {
        self.sync_endpoint.as_deref()
    }

    pub fn set_sync_endpoint(&mut self, url: &str) -> Result<()> {
        self.snapshot.save(REC_SYNC_ENDPOINT, url)?;
        self.sync_endpoint = Some(url.to_string()).filter(|s| !s.is_empty());
        Ok(())
    }

    pub fn sheet_url(&self) -> Option<&str> {
        self.sheet_url.as_deref()
    }

    pub fn set_sheet_url(&mut self, url: &str) -> Result<()> {
        self.snapshot.save(REC_SHEET_URL, url)?;
        self.sheet_url = Some(url.to_string()).filter(|s| !s.is_empty());
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
