//! Database collaborator contract.
//!
//! The persistent store of bot scripts and statistics lives outside the
//! core. The host consults it on the orchestrator thread on a fixed
//! interval; the core only defines the interface.

use thiserror::Error;

use crate::game::bot::BotStats;

/// A bot registration as stored by the host.
#[derive(Debug, Clone)]
pub struct BotScript {
    pub database_id: i64,
    pub name: String,
    pub color: u32,
    pub viewer_key: u64,
}

#[derive(Debug, Error)]
#[error("database unavailable: {0}")]
pub struct DatabaseError(pub String);

pub trait Database: Send {
    /// Bots that should be (re)spawned onto the field.
    fn list_bots_to_spawn(&mut self) -> Result<Vec<BotScript>, DatabaseError>;

    /// Persist one bot's statistics.
    fn persist_stats(&mut self, database_id: i64, stats: &BotStats) -> Result<(), DatabaseError>;
}
