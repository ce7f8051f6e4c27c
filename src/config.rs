//! Configuration constants and environment toggles for the auction desk.

/// Default SQLite snapshot database path
pub const SNAPSHOT_DB_PATH: &str = "auction.db";

/// Seconds to wait for the sync sink's acknowledgement before reporting
/// the settlement as unsynced
pub const SYNC_TIMEOUT_SECS: u64 = 5;

/// Bounded capacity of the settlement-to-sink notification channel
pub const SYNC_CHANNEL_CAPACITY: usize = 64;

/// Outbound HTTP timeout in seconds (sheet fetches and sink pushes)
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Snapshot database path (AUCTION_DB overrides the default)
pub fn snapshot_db_path() -> String {
    std::env::var("AUCTION_DB").unwrap_or_else(|_| SNAPSHOT_DB_PATH.to_string())
}

/// Sync dry-run enabled (set SYNC_DRY_RUN=1 to enable)
/// When enabled, settlements log the outgoing notification instead of
/// POSTing it to the configured sink.
pub fn sync_dry_run_enabled() -> bool {
    static CACHED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
    *CACHED.get_or_init(|| {
        std::env::var("SYNC_DRY_RUN")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false)
    })
}
