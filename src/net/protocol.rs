//! Typed event records and their MsgPack encoding.
//!
//! Every observable change leaves the core as one of these messages. Field
//! names are wire-stable: messages encode as MsgPack maps keyed by the
//! names below, so independently written consumers can reconstruct the
//! world from the stream.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::game::bot::Bot;
use crate::game::food::{Food, FoodId};
use crate::util::vec2::Vec2;

/// A segment position on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SegmentPos {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for SegmentPos {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<SegmentPos> for Vec2 {
    fn from(p: SegmentPos) -> Self {
        Vec2::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodSpawnItem {
    pub id: FoodId,
    pub x: f32,
    pub y: f32,
    pub value: f32,
    pub is_dynamic: bool,
}

impl FoodSpawnItem {
    pub fn from_food(food: &Food) -> Self {
        let pos = food.position();
        Self {
            id: food.id(),
            x: pos.x,
            y: pos.y,
            value: food.value(),
            is_dynamic: food.is_dynamic(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FoodConsumeItem {
    pub bot_id: Uuid,
    pub food_id: FoodId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotMoveItem {
    pub bot_id: Uuid,
    /// Segment positions copied from the head, `steps` many
    pub new_segments: Vec<SegmentPos>,
    pub current_segment_radius: f32,
    pub current_length: u32,
}

impl BotMoveItem {
    pub fn from_bot(bot: &Bot, steps: usize) -> Self {
        let segments = bot.snake().segments();
        Self {
            bot_id: bot.guid(),
            new_segments: segments
                .iter()
                .take(steps)
                .map(|s| SegmentPos::from(s.position))
                .collect(),
            current_segment_radius: bot.snake().segment_radius(),
            current_length: segments.len() as u32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotSpawnData {
    pub id: Uuid,
    pub name: String,
    pub segments: Vec<SegmentPos>,
    pub mass: f32,
    pub heading: f32,
    pub color: u32,
}

impl BotSpawnData {
    pub fn from_bot(bot: &Bot) -> Self {
        Self {
            id: bot.guid(),
            name: bot.name().to_string(),
            segments: bot
                .snake()
                .segments()
                .iter()
                .map(|s| SegmentPos::from(s.position))
                .collect(),
            mass: bot.snake().mass(),
            heading: bot.snake().heading(),
            color: bot.color(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotStatsItem {
    pub bot_id: Uuid,
    pub score: f32,
    pub mass: f32,
    pub natural_food_consumed: f32,
    pub hunted_food_consumed: f32,
    pub kills: u32,
}

impl BotStatsItem {
    pub fn from_bot(bot: &Bot) -> Self {
        let stats = bot.stats();
        Self {
            bot_id: bot.guid(),
            score: bot.snake().mass(),
            mass: bot.snake().mass(),
            natural_food_consumed: stats.natural_food_consumed,
            hunted_food_consumed: stats.hunted_food_consumed,
            kills: stats.kills,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GameInfo {
    pub world_size_x: f32,
    pub world_size_y: f32,
    pub food_decay_per_frame: f32,
}

/// Complete snapshot, sent when a new viewer connects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldState {
    pub bots: Vec<BotSpawnData>,
    pub food: Vec<FoodSpawnItem>,
}

/// The closed set of event records leaving the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GameMessage {
    GameInfo(GameInfo),
    WorldState(WorldState),
    Tick { frame_id: u64 },
    BotSpawn(BotSpawnData),
    BotKill { killer_id: Uuid, victim_id: Uuid },
    BotMove(Vec<BotMoveItem>),
    BotStats(BotStatsItem),
    BotLog { viewer_key: u64, text: String },
    FoodSpawn(Vec<FoodSpawnItem>),
    FoodDecay(Vec<FoodId>),
    FoodConsume(Vec<FoodConsumeItem>),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Encode a message as MsgPack with named fields.
pub fn encode(message: &GameMessage) -> Result<Vec<u8>, ProtocolError> {
    Ok(rmp_serde::to_vec_named(message)?)
}

/// Decode a message from MsgPack.
pub fn decode(data: &[u8]) -> Result<GameMessage, ProtocolError> {
    Ok(rmp_serde::from_slice(data)?)
}
