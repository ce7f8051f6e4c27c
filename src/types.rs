//! Core domain records for the auction ledger.
//!
//! Money is held in integer lakhs (1 crore = 100 lakh) so that purse
//! arithmetic stays exact at two-decimal-crore granularity; conversion to
//! display crores happens only at the edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-issued identifier, unique across all entity kinds
pub type EntityId = u64;

/// Money in lakhs (1 crore = 100 lakh), exact at 0.01-crore steps
pub type MoneyLakhs = i64;

/// Convert a crore amount to lakhs, rounding to two decimal places
#[inline]
pub fn lakhs_from_crores(crores: f64) -> MoneyLakhs {
    (crores * 100.0).round() as MoneyLakhs
}

/// Convert lakhs back to a crore amount for display and wire payloads
#[inline]
pub fn crores_from_lakhs(lakhs: MoneyLakhs) -> f64 {
    lakhs as f64 / 100.0
}

/// Parse a crore amount from a loosely formatted cell ("2.05", " 3 ", "₹2.5 Cr").
/// Returns 0 if nothing numeric is present.
pub fn parse_crores(s: &str) -> MoneyLakhs {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().map(lakhs_from_crores).unwrap_or(0)
}

/// Format lakhs the way the operator reads them: "₹2.05 Cr"
pub fn fmt_crores(lakhs: MoneyLakhs) -> String {
    format!("₹{:.2} Cr", crores_from_lakhs(lakhs))
}

// === Status & profile ===

/// Auction lifecycle state of a player. Created AVAILABLE, finalized once
/// per round to SOLD or UNSOLD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlayerStatus {
    Available,
    Sold,
    Unsold,
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerStatus::Available => write!(f, "AVAILABLE"),
            PlayerStatus::Sold => write!(f, "SOLD"),
            PlayerStatus::Unsold => write!(f, "UNSOLD"),
        }
    }
}

/// Playing role tag carried over from the registration sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerProfile {
    #[serde(rename = "Batsman")]
    Batsman,
    #[serde(rename = "Bowler")]
    Bowler,
    #[serde(rename = "All-rounder")]
    AllRounder,
    #[serde(rename = "Wicket-keeper Batsman")]
    WicketKeeperBatsman,
    #[serde(rename = "Wicket-keeper Bowler")]
    WicketKeeperBowler,
}

impl PlayerProfile {
    pub const ALL: [PlayerProfile; 5] = [
        PlayerProfile::Batsman,
        PlayerProfile::Bowler,
        PlayerProfile::AllRounder,
        PlayerProfile::WicketKeeperBatsman,
        PlayerProfile::WicketKeeperBowler,
    ];

    /// Exact (case-insensitive, trimmed) match against the canonical labels
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.to_string().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for PlayerProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerProfile::Batsman => write!(f, "Batsman"),
            PlayerProfile::Bowler => write!(f, "Bowler"),
            PlayerProfile::AllRounder => write!(f, "All-rounder"),
            PlayerProfile::WicketKeeperBatsman => write!(f, "Wicket-keeper Batsman"),
            PlayerProfile::WicketKeeperBowler => write!(f, "Wicket-keeper Bowler"),
        }
    }
}

// === Entity records ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: EntityId,
    pub name: String,
    pub venue: String,
    /// Auction date as entered by the organizer (ISO "YYYY-MM-DD")
    pub auction_date: String,
    pub number_of_teams: u32,
    pub players_per_team: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: EntityId,
    pub tournament_id: EntityId,
    pub name: String,
    pub owner: String,
    /// Total bidding budget for the tournament
    pub purse: MoneyLakhs,
    /// Purse minus all completed purchases. Mutated only by settlement.
    pub remaining_purse: MoneyLakhs,
    /// Count of SOLD players assigned. Mutated only by settlement.
    pub players_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    pub tournament_id: EntityId,
    pub name: String,
    /// Minimum opening bid for players in this tier
    pub base_price: MoneyLakhs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub tournament_id: EntityId,
    pub name: String,
    pub mobile_number: String,
    pub category_id: EntityId,
    pub profile: PlayerProfile,
    pub image_url: String,
    pub status: PlayerStatus,
    pub sold_to_team_id: Option<EntityId>,
    pub sold_price: Option<MoneyLakhs>,
    /// External row identity from the registration sheet, used to de-duplicate
    /// re-imports without disturbing auction outcomes
    pub sheet_key: Option<String>,
}

/// One entry in the append-only live bid log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: EntityId,
    pub tournament_id: EntityId,
    pub player_id: EntityId,
    pub team_id: EntityId,
    pub amount: MoneyLakhs,
    pub timestamp: DateTime<Utc>,
}

// === Creation payloads (ids and derived fields are store-issued) ===

#[derive(Debug, Clone)]
pub struct NewTournament {
    pub name: String,
    pub venue: String,
    pub auction_date: String,
    pub number_of_teams: u32,
    pub players_per_team: u32,
}

#[derive(Debug, Clone)]
pub struct NewTeam {
    pub tournament_id: EntityId,
    pub name: String,
    pub owner: String,
    pub purse: MoneyLakhs,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub tournament_id: EntityId,
    pub name: String,
    pub base_price: MoneyLakhs,
}

#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub tournament_id: EntityId,
    pub name: String,
    pub mobile_number: String,
    pub category_id: EntityId,
    pub profile: PlayerProfile,
    pub image_url: String,
    pub sheet_key: Option<String>,
}

/// A proposed bid, before validation
#[derive(Debug, Clone, Copy)]
pub struct BidRequest {
    pub tournament_id: EntityId,
    pub player_id: EntityId,
    pub team_id: EntityId,
    pub amount: MoneyLakhs,
}

// === Failure values ===

/// Reason a proposed bid was refused. Checks run in a fixed order and stop
/// at the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidRejection {
    TeamNotFound { team_id: EntityId },
    TournamentNotFound { tournament_id: EntityId },
    InsufficientPurse { amount: MoneyLakhs, remaining: MoneyLakhs },
    SquadFull { players_count: u32, cap: u32 },
    BidTooLow { amount: MoneyLakhs, top: MoneyLakhs },
}

impl std::fmt::Display for BidRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BidRejection::TeamNotFound { team_id } => {
                write!(f, "Team {} not found", team_id)
            }
            BidRejection::TournamentNotFound { tournament_id } => {
                write!(f, "Tournament {} not found", tournament_id)
            }
            BidRejection::InsufficientPurse { amount, remaining } => {
                write!(
                    f,
                    "Insufficient purse: bid {} exceeds remaining {}",
                    fmt_crores(*amount),
                    fmt_crores(*remaining)
                )
            }
            BidRejection::SquadFull { players_count, cap } => {
                write!(f, "Team squad full ({}/{})", players_count, cap)
            }
            BidRejection::BidTooLow { amount, top } => {
                write!(
                    f,
                    "Bid must be higher than current bid: {} <= {}",
                    fmt_crores(*amount),
                    fmt_crores(*top)
                )
            }
        }
    }
}

/// Outcome of placing a bid. Rejection is a value, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum BidOutcome {
    Accepted(Bid),
    Rejected(BidRejection),
}

impl BidOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, BidOutcome::Accepted(_))
    }
}

/// Why a delete was refused while dependents still reference the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteBlocked {
    TeamHasSoldPlayers { players: usize },
    TeamHasLiveBids { bids: usize },
    CategoryInUse { players: usize },
}

impl std::fmt::Display for DeleteBlocked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteBlocked::TeamHasSoldPlayers { players } => {
                write!(f, "{} sold player(s) still assigned to this team", players)
            }
            DeleteBlocked::TeamHasLiveBids { bids } => {
                write!(f, "{} live bid(s) still reference this team", bids)
            }
            DeleteBlocked::CategoryInUse { players } => {
                write!(f, "{} player(s) still reference this category", players)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    Blocked(DeleteBlocked),
    NotFound,
}

// =============================================================================
// TESTS
// =============================================================================
