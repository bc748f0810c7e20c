//! Event tracker capability and its MsgPack realization.
//!
//! The field reports every observable change to an [`UpdateTracker`]. The
//! tracker accumulates the high-volume kinds (food decay/spawn/consume, bot
//! moves) into per-frame batches and emits everything else immediately.
//! `serialize` drains one frame's worth of events as a framed byte stream:
//! the four batches in phase order, then the immediate events in call order.

use crate::game::bot::{Bot, BotId};
use crate::game::food::{Food, FoodId};
use crate::net::framing::write_frame;
use crate::net::protocol::{
    self, BotMoveItem, BotSpawnData, BotStatsItem, FoodConsumeItem, FoodSpawnItem, GameInfo,
    GameMessage, WorldState,
};

/// Where the field reports frame deltas. One method per event kind; the
/// MsgPack implementation below is just one realization.
pub trait UpdateTracker: Send {
    fn food_spawned(&mut self, food: &Food);
    fn food_decayed(&mut self, food: &Food);
    fn food_consumed(&mut self, food: &Food, by_bot: &Bot);
    fn bot_spawned(&mut self, bot: &Bot);
    fn bot_killed(&mut self, killer_id: BotId, victim: &Bot);
    fn bot_moved(&mut self, bot: &Bot, steps: usize);
    fn bot_log_message(&mut self, viewer_key: u64, message: &str);
    fn bot_stats(&mut self, bot: &Bot);
    fn game_info(&mut self, info: GameInfo);
    fn world_state(&mut self, state: WorldState);
    fn tick(&mut self, frame_id: u64);

    /// Drain the frame's events as a length-framed byte stream.
    fn serialize(&mut self) -> Vec<u8>;

    /// Discard all batched events and staged output.
    fn reset(&mut self);
}

/// [`UpdateTracker`] that encodes events as MsgPack messages.
#[derive(Default)]
pub struct MsgPackUpdateTracker {
    food_decay: Vec<FoodId>,
    food_spawn: Vec<FoodSpawnItem>,
    food_consume: Vec<FoodConsumeItem>,
    bot_moves: Vec<BotMoveItem>,
    /// Framed messages of the single-event kinds, in call order
    immediate: Vec<u8>,
}

impl MsgPackUpdateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode and frame a message right away. Sink failures are dropped at
    /// this layer; the transport owns recovery.
    fn append_immediate(&mut self, message: &GameMessage) {
        append_message(&mut self.immediate, message);
    }
}

fn append_message(out: &mut Vec<u8>, message: &GameMessage) {
    let payload = match protocol::encode(message) {
        Ok(payload) => payload,
        Err(error) => {
            tracing::warn!("dropping unencodable event: {error}");
            return;
        }
    };
    if let Err(error) = write_frame(out, &payload) {
        tracing::warn!("dropping oversize event: {error}");
    }
}

impl UpdateTracker for MsgPackUpdateTracker {
    fn food_spawned(&mut self, food: &Food) {
        self.food_spawn.push(FoodSpawnItem::from_food(food));
    }

    fn food_decayed(&mut self, food: &Food) {
        self.food_decay.push(food.id());
    }

    fn food_consumed(&mut self, food: &Food, by_bot: &Bot) {
        self.food_consume.push(FoodConsumeItem {
            bot_id: by_bot.guid(),
            food_id: food.id(),
        });
    }

    fn bot_spawned(&mut self, bot: &Bot) {
        self.append_immediate(&GameMessage::BotSpawn(BotSpawnData::from_bot(bot)));
    }

    fn bot_killed(&mut self, killer_id: BotId, victim: &Bot) {
        self.append_immediate(&GameMessage::BotKill {
            killer_id,
            victim_id: victim.guid(),
        });
    }

    fn bot_moved(&mut self, bot: &Bot, steps: usize) {
        self.bot_moves.push(BotMoveItem::from_bot(bot, steps));
    }

    fn bot_log_message(&mut self, viewer_key: u64, message: &str) {
        self.append_immediate(&GameMessage::BotLog {
            viewer_key,
            text: message.to_string(),
        });
    }

    fn bot_stats(&mut self, bot: &Bot) {
        self.append_immediate(&GameMessage::BotStats(BotStatsItem::from_bot(bot)));
    }

    fn game_info(&mut self, info: GameInfo) {
        self.append_immediate(&GameMessage::GameInfo(info));
    }

    fn world_state(&mut self, state: WorldState) {
        self.append_immediate(&GameMessage::WorldState(state));
    }

    fn tick(&mut self, frame_id: u64) {
        self.append_immediate(&GameMessage::Tick { frame_id });
    }

    fn serialize(&mut self) -> Vec<u8> {
        let mut out = Vec::new();

        if !self.food_decay.is_empty() {
            let ids = std::mem::take(&mut self.food_decay);
            append_message(&mut out, &GameMessage::FoodDecay(ids));
        }
        if !self.food_spawn.is_empty() {
            let items = std::mem::take(&mut self.food_spawn);
            append_message(&mut out, &GameMessage::FoodSpawn(items));
        }
        if !self.food_consume.is_empty() {
            let items = std::mem::take(&mut self.food_consume);
            append_message(&mut out, &GameMessage::FoodConsume(items));
        }
        if !self.bot_moves.is_empty() {
            let items = std::mem::take(&mut self.bot_moves);
            append_message(&mut out, &GameMessage::BotMove(items));
        }

        out.append(&mut self.immediate);
        self.reset();
        out
    }

    fn reset(&mut self) {
        self.food_decay.clear();
        self.food_spawn.clear();
        self.food_consume.clear();
        self.bot_moves.clear();
        self.immediate.clear();
    }
}

/// Tracker that discards every event. For headless and benchmark runs.
#[derive(Default)]
pub struct NullTracker;

impl UpdateTracker for NullTracker {
    fn food_spawned(&mut self, _food: &Food) {}
    fn food_decayed(&mut self, _food: &Food) {}
    fn food_consumed(&mut self, _food: &Food, _by_bot: &Bot) {}
    fn bot_spawned(&mut self, _bot: &Bot) {}
    fn bot_killed(&mut self, _killer_id: BotId, _victim: &Bot) {}
    fn bot_moved(&mut self, _bot: &Bot, _steps: usize) {}
    fn bot_log_message(&mut self, _viewer_key: u64, _message: &str) {}
    fn bot_stats(&mut self, _bot: &Bot) {}
    fn game_info(&mut self, _info: GameInfo) {}
    fn world_state(&mut self, _state: WorldState) {}
    fn tick(&mut self, _frame_id: u64) {}

    fn serialize(&mut self) -> Vec<u8> {
        Vec::new()
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::framing::read_frames;
    use crate::util::vec2::Vec2;

    fn decode_stream(stream: &[u8]) -> Vec<GameMessage> {
        read_frames(stream)
            .unwrap()
            .into_iter()
            .map(|frame| protocol::decode(frame).unwrap())
            .collect()
    }

    fn food(id: FoodId) -> Food {
        Food::new_static(id, Vec2::new(1.0, 2.0), 3.0)
    }

    #[test]
    fn test_batches_drain_in_phase_order() {
        let mut tracker = MsgPackUpdateTracker::new();

        // emission order deliberately scrambled
        tracker.tick(1);
        tracker.food_spawned(&food(10));
        tracker.food_decayed(&food(11));

        let messages = decode_stream(&tracker.serialize());
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], GameMessage::FoodDecay(_)));
        assert!(matches!(messages[1], GameMessage::FoodSpawn(_)));
        assert!(matches!(messages[2], GameMessage::Tick { frame_id: 1 }));
    }

    #[test]
    fn test_empty_batches_are_omitted() {
        let mut tracker = MsgPackUpdateTracker::new();
        tracker.tick(5);
        let messages = decode_stream(&tracker.serialize());
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], GameMessage::Tick { frame_id: 5 }));
    }

    #[test]
    fn test_serialize_drains() {
        let mut tracker = MsgPackUpdateTracker::new();
        tracker.food_decayed(&food(1));
        tracker.tick(1);
        assert!(!tracker.serialize().is_empty());
        assert!(tracker.serialize().is_empty(), "second drain must be empty");
    }

    #[test]
    fn test_immediate_events_keep_call_order() {
        let mut tracker = MsgPackUpdateTracker::new();
        tracker.bot_log_message(7, "first");
        tracker.tick(3);
        tracker.bot_log_message(7, "second");

        let messages = decode_stream(&tracker.serialize());
        assert!(matches!(&messages[0], GameMessage::BotLog { text, .. } if text == "first"));
        assert!(matches!(messages[1], GameMessage::Tick { frame_id: 3 }));
        assert!(matches!(&messages[2], GameMessage::BotLog { text, .. } if text == "second"));
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut tracker = MsgPackUpdateTracker::new();
        tracker.food_decayed(&food(1));
        tracker.food_spawned(&food(2));
        tracker.tick(9);
        tracker.reset();
        assert!(tracker.serialize().is_empty());
    }

    #[test]
    fn test_decay_batch_collects_ids() {
        let mut tracker = MsgPackUpdateTracker::new();
        tracker.food_decayed(&food(4));
        tracker.food_decayed(&food(5));
        let messages = decode_stream(&tracker.serialize());
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            GameMessage::FoodDecay(ids) => assert_eq!(ids, &vec![4, 5]),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_null_tracker_emits_nothing() {
        let mut tracker = NullTracker;
        tracker.food_decayed(&food(1));
        tracker.tick(1);
        assert!(tracker.serialize().is_empty());
    }
}
