//! Auction Smoke Script
//!
//! Drives a full auction round against a scratch store:
//! 1. Seed a tournament with teams, categories, and players
//! 2. Run a scripted bid war with deliberate rule violations
//! 3. Settle one SOLD and one UNSOLD outcome through the dry-run sink
//!
//! Usage:
//!   cargo run --bin test_auction
//!
//! Environment variables:
//!   AUCTION_DB   - snapshot path (defaults to a scratch file)
//!   SYNC_DRY_RUN - forced on here; no network traffic leaves this script

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use auction_desk::query::{auction_summary, team_roster, tournament_data};
use auction_desk::settlement::{FinalizeRequest, SettlementEngine};
use auction_desk::store::AuctionStore;
use auction_desk::sync::{create_sync_channel, run_sync_loop, SyncClient};
use auction_desk::types::{
    fmt_crores, lakhs_from_crores, BidOutcome, BidRequest, NewCategory, NewPlayer, NewTeam,
    NewTournament, PlayerProfile,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging to stdout and a rolling file, same layout as a live desk
    let file_appender = tracing_appender::rolling::never(".", "test_auction.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("auction_desk=info".parse().unwrap());

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    dotenvy::dotenv().ok();

    println!("═══════════════════════════════════════════════════════════════");
    println!("           🏏 Auction Desk Smoke Script");
    println!("═══════════════════════════════════════════════════════════════");

    let db_path = std::env::var("AUCTION_DB").unwrap_or_else(|_| "test_auction.db".to_string());
    let mut store = AuctionStore::open(&db_path)?;
    info!("Store ready at {}", db_path);

    // --- Seed ---
    let tournament = store.add_tournament(NewTournament {
        name: "Smoke Premier League".into(),
        venue: "Chinnaswamy".into(),
        auction_date: "2026-08-05".into(),
        number_of_teams: 2,
        players_per_team: 2,
    })?;
    let falcons = store.add_team(NewTeam {
        tournament_id: tournament.id,
        name: "Falcons".into(),
        owner: "R. Iyer".into(),
        purse: lakhs_from_crores(10.0),
    })?;
    let tigers = store.add_team(NewTeam {
        tournament_id: tournament.id,
        name: "Tigers".into(),
        owner: "S. Rao".into(),
        purse: lakhs_from_crores(10.0),
    })?;
    let platinum = store.add_category(NewCategory {
        tournament_id: tournament.id,
        name: "Platinum".into(),
        base_price: lakhs_from_crores(2.0),
    })?;
    let opener = store.add_player(NewPlayer {
        tournament_id: tournament.id,
        name: "A. Sharma".into(),
        mobile_number: String::new(),
        category_id: platinum.id,
        profile: PlayerProfile::Batsman,
        image_url: String::new(),
        sheet_key: None,
    })?;
    let spinner = store.add_player(NewPlayer {
        tournament_id: tournament.id,
        name: "K. Nair".into(),
        mobile_number: String::new(),
        category_id: platinum.id,
        profile: PlayerProfile::Bowler,
        image_url: String::new(),
        sheet_key: None,
    })?;

    // --- Bid war on the opener ---
    println!("\n📣 Bidding for {} (base {})", opener.name, fmt_crores(platinum.base_price));
    store.clear_bids()?;

    let script: &[(u64, f64)] = &[
        (falcons.id, 2.0),
        (tigers.id, 2.1),
        (falcons.id, 2.05), // too low, must bounce
        (falcons.id, 2.5),
        (tigers.id, 12.0), // over the purse, must bounce
    ];
    for &(team_id, crores) in script {
        let outcome = store.place_bid(&BidRequest {
            tournament_id: tournament.id,
            player_id: opener.id,
            team_id,
            amount: lakhs_from_crores(crores),
        })?;
        match outcome {
            BidOutcome::Accepted(bid) => {
                println!("   ✅ team {} bid {}", team_id, fmt_crores(bid.amount))
            }
            BidOutcome::Rejected(reason) => println!("   ❌ team {} refused: {}", team_id, reason),
        }
    }

    let top = store.top_bid(opener.id).expect("bids were placed");
    println!(
        "   🔨 Hammer at {} by team {}",
        fmt_crores(top.amount),
        top.team_id
    );

    // --- Settle through the dry-run sink ---
    let (channel, rx) = create_sync_channel();
    tokio::spawn(run_sync_loop(rx, SyncClient::new(None, true)));
    let engine = SettlementEngine::new(channel);

    let (winner, hammer) = (top.team_id, top.amount);
    let sold = engine
        .finalize(&mut store, FinalizeRequest::sold(opener.id, winner, hammer))
        .await?;
    println!(
        "\n🟢 {} SOLD for {} (synced={})",
        opener.name,
        fmt_crores(hammer),
        sold.synced
    );

    store.clear_bids()?;
    let unsold = engine
        .finalize(&mut store, FinalizeRequest::unsold(spinner.id))
        .await?;
    println!("🔴 {} UNSOLD (synced={})", spinner.name, unsold.synced);

    // --- Review ---
    let data = tournament_data(&store, tournament.id);
    println!("\n📊 {} teams:", data.tournament.map(|t| t.name).unwrap_or_default());
    for team in &data.teams {
        println!(
            "   {} - {} left, {}/{} players",
            team.name,
            fmt_crores(team.remaining_purse),
            team.players_count,
            tournament.players_per_team
        );
        for player in team_roster(&store, team.id) {
            println!(
                "      • {} @ {}",
                player.name,
                fmt_crores(player.sold_price.unwrap_or(0))
            );
        }
    }
    let summary = auction_summary(&store, tournament.id);
    println!(
        "   Totals: {} sold / {} unsold / {} available, spend {}",
        summary.sold,
        summary.unsold,
        summary.available,
        fmt_crores(summary.total_spent)
    );

    println!("\n🎉 Smoke run complete");
    Ok(())
}
