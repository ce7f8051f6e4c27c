//! Sheet import boundary.
//!
//! Registration sheets arrive as loosely typed rows with operator-invented
//! column headings. All column-name guessing lives here, in one translation
//! layer: each field has an explicit table of accepted synonyms, matched
//! case-insensitively, and rows come out as strongly typed records before
//! anything touches the store.

use anyhow::{anyhow, Context, Result};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::HTTP_TIMEOUT_SECS;
use crate::store::AuctionStore;
use crate::types::{
    lakhs_from_crores, parse_crores, EntityId, MoneyLakhs, NewCategory, NewPlayer, NewTeam,
    PlayerProfile,
};

// Accepted column synonyms, per field
pub const NAME_COLUMNS: &[&str] = &["Full Name", "Name", "Player Name", "PlayerName"];
pub const PROFILE_COLUMNS: &[&str] = &["Profile", "Role", "Type", "Player Profile"];
pub const CATEGORY_COLUMNS: &[&str] = &["Category", "Cat", "Player Category"];
pub const MOBILE_COLUMNS: &[&str] = &["Mobile", "Phone", "Mobile Number", "Contact"];
pub const IMAGE_COLUMNS: &[&str] = &["Image", "Photo", "Image Url"];
pub const SHEET_KEY_COLUMNS: &[&str] = &["Id", "Sheet Id", "Sl No", "S No"];
pub const TEAM_NAME_COLUMNS: &[&str] = &["Team", "Team Name", "Name"];
pub const OWNER_COLUMNS: &[&str] = &["Owner", "Team Owner", "Captain"];
pub const PURSE_COLUMNS: &[&str] = &["Purse", "Budget", "Total Purse"];
pub const BASE_PRICE_COLUMNS: &[&str] = &["Base Price", "BasePrice", "Min Bid"];

/// Category assigned when a row names none
pub const DEFAULT_CATEGORY_NAME: &str = "General";

/// One spreadsheet row as it comes off the wire
pub type RawRow = serde_json::Map<String, Value>;

/// First cell whose heading matches one of the accepted synonyms
fn cell<'a>(row: &'a RawRow, columns: &[&str]) -> Option<&'a Value> {
    row.iter()
        .find_map(|(heading, value)| {
            let heading = heading.trim();
            columns
                .iter()
                .any(|c| c.eq_ignore_ascii_case(heading))
                .then_some(value)
        })
        .filter(|v| !v.is_null())
}

/// Cell as trimmed non-empty text; numbers stringify
fn cell_string(row: &RawRow, columns: &[&str]) -> Option<String> {
    match cell(row, columns)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Cell as a crore amount in lakhs; anything unparseable is zero
fn cell_amount(row: &RawRow, columns: &[&str]) -> MoneyLakhs {
    match cell(row, columns) {
        Some(Value::Number(n)) => n.as_f64().map(lakhs_from_crores).unwrap_or(0),
        Some(Value::String(s)) => parse_crores(s),
        _ => 0,
    }
}

/// Map a profile cell, tolerating loose spellings
pub fn parse_profile(s: &str) -> PlayerProfile {
    if let Some(exact) = PlayerProfile::parse(s) {
        return exact;
    }
    let s = s.to_lowercase();
    if s.contains("bat") {
        PlayerProfile::Batsman
    } else if s.contains("bowl") {
        PlayerProfile::Bowler
    } else if s.contains("all") || s.contains("ar") {
        PlayerProfile::AllRounder
    } else if s.contains("wk") || s.contains("keep") {
        PlayerProfile::WicketKeeperBatsman
    } else {
        PlayerProfile::Batsman
    }
}

// === Typed row records ===

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRow {
    pub name: String,
    pub mobile_number: String,
    pub category_name: String,
    pub profile: PlayerProfile,
    pub image_url: String,
    pub sheet_key: Option<String>,
}

/// Translate one raw row into a typed player record.
/// Rows with no resolvable name are skipped.
pub fn map_player_row(row: &RawRow) -> Option<PlayerRow> {
    let name = cell_string(row, NAME_COLUMNS)?;
    let profile = cell_string(row, PROFILE_COLUMNS)
        .map(|s| parse_profile(&s))
        .unwrap_or(PlayerProfile::Batsman);
    Some(PlayerRow {
        name,
        mobile_number: cell_string(row, MOBILE_COLUMNS).unwrap_or_default(),
        category_name: cell_string(row, CATEGORY_COLUMNS)
            .unwrap_or_else(|| DEFAULT_CATEGORY_NAME.to_string()),
        profile,
        image_url: cell_string(row, IMAGE_COLUMNS).unwrap_or_default(),
        sheet_key: cell_string(row, SHEET_KEY_COLUMNS),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamRow {
    pub name: String,
    pub owner: String,
    pub purse: MoneyLakhs,
}

pub fn map_team_row(row: &RawRow) -> Option<TeamRow> {
    let name = cell_string(row, TEAM_NAME_COLUMNS)?;
    Some(TeamRow {
        name,
        owner: cell_string(row, OWNER_COLUMNS).unwrap_or_default(),
        purse: cell_amount(row, PURSE_COLUMNS),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub name: String,
    pub base_price: MoneyLakhs,
}

pub fn map_category_row(row: &RawRow) -> Option<CategoryRow> {
    let name = cell_string(row, CATEGORY_COLUMNS).or_else(|| cell_string(row, NAME_COLUMNS))?;
    Some(CategoryRow {
        name,
        base_price: cell_amount(row, BASE_PRICE_COLUMNS),
    })
}

// === Import into the store ===

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
    /// Rows with no resolvable name
    pub skipped: usize,
    /// Category names on the sheet that the tournament does not define
    pub missing_categories: Vec<String>,
}

/// Outcome of a player import. Refusal is a value, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Imported(ImportSummary),
    /// The tournament defines no categories to place players into
    NoCategories,
}

/// Bulk-import player rows into a tournament.
///
/// Category names resolve case-insensitively against the tournament's
/// categories; unknown names fall back to the first category and are reported
/// in the summary. Merging happens in the store, so re-imports never reset a
/// SOLD player.
pub fn import_players(
    store: &mut AuctionStore,
    tournament_id: EntityId,
    rows: &[RawRow],
) -> Result<ImportOutcome> {
    let categories: Vec<_> = store
        .categories()
        .iter()
        .filter(|c| c.tournament_id == tournament_id)
        .collect();
    let Some(fallback_category) = categories.first().map(|c| c.id) else {
        warn!("[IMPORT] No categories defined for tournament {}, refusing player import", tournament_id);
        return Ok(ImportOutcome::NoCategories);
    };
    let by_name: FxHashMap<String, EntityId> = categories
        .iter()
        .map(|c| (c.name.trim().to_lowercase(), c.id))
        .collect();

    let mut skipped = 0usize;
    let mut missing: Vec<String> = Vec::new();
    let mut incoming = Vec::new();
    for row in rows {
        let Some(player) = map_player_row(row) else {
            skipped += 1;
            continue;
        };
        let category_id = match by_name.get(&player.category_name.trim().to_lowercase()) {
            Some(id) => *id,
            None => {
                if !missing.contains(&player.category_name) {
                    missing.push(player.category_name.clone());
                }
                fallback_category
            }
        };
        incoming.push(NewPlayer {
            tournament_id,
            name: player.name,
            mobile_number: player.mobile_number,
            category_id,
            profile: player.profile,
            image_url: player.image_url,
            sheet_key: player.sheet_key,
        });
    }

    let bulk = store.bulk_add_players(incoming)?;
    info!(
        "[IMPORT] Synced players: {} new, {} refreshed, {} skipped",
        bulk.added, bulk.updated, skipped
    );
    if !missing.is_empty() {
        warn!(
            "[IMPORT] Sheet categories not found in the tournament, mapped to defaults: {:?}",
            missing
        );
    }

    Ok(ImportOutcome::Imported(ImportSummary {
        added: bulk.added,
        updated: bulk.updated,
        skipped,
        missing_categories: missing,
    }))
}

/// Import team rows, skipping names the tournament already has.
/// Returns the number of teams added.
pub fn import_teams(
    store: &mut AuctionStore,
    tournament_id: EntityId,
    rows: &[RawRow],
) -> Result<usize> {
    let mut added = 0usize;
    for row in rows {
        let Some(team) = map_team_row(row) else { continue };
        let exists = store.teams().iter().any(|t| {
            t.tournament_id == tournament_id && t.name.eq_ignore_ascii_case(&team.name)
        });
        if exists {
            continue;
        }
        store.add_team(NewTeam {
            tournament_id,
            name: team.name,
            owner: team.owner,
            purse: team.purse,
        })?;
        added += 1;
    }
    info!("[IMPORT] Synced {} new teams", added);
    Ok(added)
}

/// Import category rows, skipping names the tournament already has.
/// Returns the number of categories added.
pub fn import_categories(
    store: &mut AuctionStore,
    tournament_id: EntityId,
    rows: &[RawRow],
) -> Result<usize> {
    let mut added = 0usize;
    for row in rows {
        let Some(category) = map_category_row(row) else { continue };
        let exists = store.categories().iter().any(|c| {
            c.tournament_id == tournament_id && c.name.eq_ignore_ascii_case(&category.name)
        });
        if exists {
            continue;
        }
        store.add_category(NewCategory {
            tournament_id,
            name: category.name,
            base_price: category.base_price,
        })?;
        added += 1;
    }
    info!("[IMPORT] Synced {} new categories", added);
    Ok(added)
}

// === Sheet fetch ===

/// HTTP client for the sheet export endpoint
pub struct SheetClient {
    http: reqwest::Client,
}

impl SheetClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Fetch the shared sheet's export rows. The endpoint is expected to
    /// answer with a JSON array of row objects; anything else is an error the
    /// operator sees, never a partial import.
    pub async fn fetch_rows(&self, url: &str) -> Result<Vec<RawRow>> {
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("sheet fetch failed: {} - {}", status, body));
        }
        let rows: Vec<RawRow> = resp
            .json()
            .await
            .context("sheet response was not a JSON array of row objects")?;
        info!("[IMPORT] Fetched {} sheet rows", rows.len());
        Ok(rows)
    }
}

impl Default for SheetClient {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewTournament;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_map_player_row_canonical_headings() {
        let r = row(&[
            ("Full Name", json!("MS Dhoni")),
            ("Profile", json!("Wicket-keeper Batsman")),
            ("Category", json!("Platinum")),
            ("Mobile", json!("9876543210")),
            ("Image", json!("dhoni.png")),
            ("Id", json!(7)),
        ]);
        let mapped = map_player_row(&r).unwrap();
        assert_eq!(mapped.name, "MS Dhoni");
        assert_eq!(mapped.profile, PlayerProfile::WicketKeeperBatsman);
        assert_eq!(mapped.category_name, "Platinum");
        assert_eq!(mapped.mobile_number, "9876543210");
        assert_eq!(mapped.sheet_key.as_deref(), Some("7"));
    }

    #[test]
    fn test_map_player_row_synonyms_and_case() {
        let r = row(&[
            ("player name", json!("  Ruturaj  ")),
            ("ROLE", json!("batter")),
            ("cat", json!("Gold")),
        ]);
        let mapped = map_player_row(&r).unwrap();
        assert_eq!(mapped.name, "Ruturaj");
        assert_eq!(mapped.profile, PlayerProfile::Batsman);
        assert_eq!(mapped.category_name, "Gold");
    }

    #[test]
    fn test_map_player_row_defaults() {
        let r = row(&[("Name", json!("Unknown Kid"))]);
        let mapped = map_player_row(&r).unwrap();
        assert_eq!(mapped.profile, PlayerProfile::Batsman);
        assert_eq!(mapped.category_name, DEFAULT_CATEGORY_NAME);
        assert_eq!(mapped.mobile_number, "");
        assert_eq!(mapped.sheet_key, None);
    }

    #[test]
    fn test_map_player_row_without_name_is_skipped() {
        let r = row(&[("Profile", json!("Bowler")), ("Category", json!("Gold"))]);
        assert_eq!(map_player_row(&r), None);

        let blank = row(&[("Name", json!("   "))]);
        assert_eq!(map_player_row(&blank), None);
    }

    #[test]
    fn test_parse_profile_fuzzy() {
        assert_eq!(parse_profile("fast bowler"), PlayerProfile::Bowler);
        assert_eq!(parse_profile("AR"), PlayerProfile::AllRounder);
        assert_eq!(parse_profile("keeper"), PlayerProfile::WicketKeeperBatsman);
        assert_eq!(parse_profile("mystery spin"), PlayerProfile::Batsman);
    }

    #[test]
    fn test_map_team_and_category_rows() {
        let t = row(&[
            ("Team Name", json!("Falcons")),
            ("Owner", json!("R. Iyer")),
            ("Purse", json!(100.0)),
        ]);
        assert_eq!(
            map_team_row(&t).unwrap(),
            TeamRow {
                name: "Falcons".into(),
                owner: "R. Iyer".into(),
                purse: 10_000,
            }
        );

        let c = row(&[
            ("Category", json!("Platinum")),
            ("Base Price", json!("2.05")),
        ]);
        assert_eq!(
            map_category_row(&c).unwrap(),
            CategoryRow {
                name: "Platinum".into(),
                base_price: 205,
            }
        );
    }

    fn tournament_store() -> (AuctionStore, EntityId) {
        let mut store = AuctionStore::open_in_memory().unwrap();
        let t = store
            .add_tournament(NewTournament {
                name: "Cup".into(),
                venue: "Ground".into(),
                auction_date: "2026-07-01".into(),
                number_of_teams: 2,
                players_per_team: 4,
            })
            .unwrap();
        (store, t.id)
    }

    #[test]
    fn test_import_players_requires_a_category() {
        let (mut store, t) = tournament_store();
        let rows = vec![row(&[("Name", json!("Orphan"))])];
        assert_eq!(
            import_players(&mut store, t, &rows).unwrap(),
            ImportOutcome::NoCategories
        );
        assert!(store.players().is_empty());
    }

    #[test]
    fn test_import_players_resolves_and_reports_missing_categories() {
        let (mut store, t) = tournament_store();
        store
            .add_category(NewCategory {
                tournament_id: t,
                name: "Gold".into(),
                base_price: 100,
            })
            .unwrap();
        let gold = store.categories()[0].id;

        let rows = vec![
            row(&[("Name", json!("A")), ("Category", json!("gold"))]),
            row(&[("Name", json!("B")), ("Category", json!("Silver"))]),
            row(&[("Profile", json!("Bowler"))]), // nameless, skipped
        ];
        let outcome = import_players(&mut store, t, &rows).unwrap();
        let ImportOutcome::Imported(summary) = outcome else {
            panic!("expected an import");
        };
        assert_eq!(summary.added, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.missing_categories, vec!["Silver".to_string()]);

        // Both land in the only defined category
        assert!(store.players().iter().all(|p| p.category_id == gold));
    }

    #[test]
    fn test_import_teams_skips_existing_names() {
        let (mut store, t) = tournament_store();
        let rows = vec![
            row(&[("Team", json!("Falcons")), ("Purse", json!(80))]),
            row(&[("Team", json!("falcons")), ("Purse", json!(90))]),
            row(&[("Team", json!("Tigers")), ("Purse", json!(80))]),
        ];
        assert_eq!(import_teams(&mut store, t, &rows).unwrap(), 2);
        assert_eq!(store.teams().len(), 2);
    }
}
