//! Auction Desk - cricket league player-auction core
//!
//! Tournament setup, live player-by-player bidding, and settlement for a
//! single-operator auction desk.
//!
//! ## Architecture
//!
//! - **Owned entity store** holding the flat collections, persisting every
//!   mutation to a SQLite snapshot before returning
//! - **Bid validation gate** checking purse, squad capacity, and the current
//!   top bid before anything enters the append-only log
//! - **Settlement engine** applying player status and team purse/roster
//!   effects as one unit, local-first
//! - **Cloud sync sink** notified per finalization through a bounded channel,
//!   best-effort with logged failure
//! - **Sheet import boundary** translating loosely typed spreadsheet rows
//!   into typed records via explicit column-synonym tables

pub mod config;
pub mod import;
pub mod query;
pub mod settlement;
pub mod store;
pub mod sync;
pub mod types;
pub mod validator;
