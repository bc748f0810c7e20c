//! Serpent Arena simulation core
//!
//! The authoritative simulation of a multi-agent snake game on a toroidal
//! continuous plane. Long-lived bots steer snakes that eat scattered food,
//! grow, may boost at a mass cost, and kill each other on head-to-body
//! contact.
//!
//! The crate covers the simulation core only: geometry and spatial indexing,
//! snake dynamics, the per-frame pipeline with its worker pool, and the
//! event tracker that batches frame deltas. Transport, bot-script storage
//! and the scripting runtime are external collaborators reached through the
//! capability traits in [`game::bot`], [`net::tracker`] and [`db`].

pub mod config;
pub mod db;
pub mod game;
pub mod net;
pub mod util;
