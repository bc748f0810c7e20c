//! Bots: identity, controller capability and per-frame job handlers.
//!
//! A bot couples a snake to an externally provided controller. The core
//! calls the controller exactly once per bot per frame during the move
//! phase, from a worker thread, handing it a read-only view of the world
//! and a credit-limited log buffer. Controllers that are not thread-safe
//! must provide their own serialization; the core only requires that
//! `step` is safe to call once per frame from one worker.

use std::sync::Arc;

use smallvec::SmallVec;
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::game::food::Food;
use crate::game::snake::Snake;
use crate::game::spatial::{SpatialEntry, SpatialMap};
use crate::game::torus::TorusGeometry;
use crate::util::vec2::Vec2;

/// Unique bot identifier, stable for the lifetime of the process.
pub type BotId = Uuid;

/// One steering decision per frame.
#[derive(Debug, Clone, Copy)]
pub struct Steering {
    /// Desired heading in degrees
    pub target_heading_deg: f32,
    /// Request the faster, mass-burning step
    pub boost: bool,
}

/// Startup information handed to a controller's `init`.
#[derive(Debug, Clone)]
pub struct BotHandle {
    pub guid: BotId,
    pub name: String,
    pub start_position: Vec2,
    pub start_heading: f32,
    pub start_mass: f32,
    pub field_size: Vec2,
}

/// The capability through which a bot is driven.
pub trait BotController: Send {
    /// Called once before the bot is admitted to the field. An error
    /// rejects the bot; the message surfaces as a bot-log event.
    fn init(&mut self, bot: &BotHandle) -> Result<(), String>;

    /// Called once per frame from a worker thread. An error is treated as
    /// "keep heading, no boost" and logged; it never aborts the frame.
    fn step(&mut self, view: &ControllerView<'_>, log: &mut LogBuffer) -> Result<Steering, String>;

    /// Called after the bot has been killed.
    fn on_killed(&mut self, _killer: Option<BotId>) {}
}

/// One snake segment as stored in the segment index, with its owner.
#[derive(Debug, Clone, Copy)]
pub struct SegmentInfo {
    pub position: Vec2,
    pub bot_id: BotId,
}

impl SpatialEntry for SegmentInfo {
    fn position(&self) -> Vec2 {
        self.position
    }
}

/// Immutable prior-frame snapshot shared by all jobs of one phase.
///
/// The orchestrator hands out clones for the duration of the move and
/// collision phases and reclaims exclusive access in between; workers never
/// mutate the maps.
pub struct FrameContext {
    pub food: Arc<SpatialMap<Food>>,
    pub segments: Arc<SpatialMap<SegmentInfo>>,
    pub torus: TorusGeometry,
    pub config: Arc<SimulationConfig>,
}

/// Read-only facade over the world, as seen by one bot's controller.
pub struct ControllerView<'a> {
    food: &'a SpatialMap<Food>,
    segments: &'a SpatialMap<SegmentInfo>,
    torus: &'a TorusGeometry,
    own_id: BotId,
    snake: &'a Snake,
}

impl<'a> ControllerView<'a> {
    pub fn field_size(&self) -> Vec2 {
        self.torus.size()
    }

    pub fn head_position(&self) -> Vec2 {
        self.snake.head_position()
    }

    pub fn heading(&self) -> f32 {
        self.snake.heading()
    }

    pub fn mass(&self) -> f32 {
        self.snake.mass()
    }

    pub fn segment_radius(&self) -> f32 {
        self.snake.segment_radius()
    }

    /// Food within `radius` of the head, as (offset from head, item) pairs.
    /// Offsets are unwrapped, so a piece just across a field edge shows up
    /// with a small offset.
    pub fn food_within(&self, radius: f32) -> impl Iterator<Item = (Vec2, &'a Food)> + '_ {
        let head = self.snake.head_position();
        let torus = *self.torus;
        self.food.region(head, radius).filter_map(move |item| {
            let offset = torus.unwrap_relative(item.position() - head);
            (offset.length() <= radius).then_some((offset, item))
        })
    }

    /// Foreign snake segments within `radius` of the head, as
    /// (offset from head, segment) pairs. The bot's own segments are
    /// filtered out.
    pub fn segments_within(&self, radius: f32) -> impl Iterator<Item = (Vec2, &'a SegmentInfo)> + '_ {
        let head = self.snake.head_position();
        let torus = *self.torus;
        let own_id = self.own_id;
        self.segments.region(head, radius).filter_map(move |info| {
            if info.bot_id == own_id {
                return None;
            }
            let offset = torus.unwrap_relative(info.position - head);
            (offset.length() <= radius).then_some((offset, info))
        })
    }
}

/// Bounded log channel from a controller to the event stream. Messages are
/// dropped once the frame's credit is spent; credit is refilled each frame
/// up to a cap.
#[derive(Debug)]
pub struct LogBuffer {
    messages: SmallVec<[String; 4]>,
    credit: u32,
}

impl LogBuffer {
    pub fn new(credit: u32) -> Self {
        Self {
            messages: SmallVec::new(),
            credit,
        }
    }

    /// Append a message if credit remains. Returns whether it was accepted.
    pub fn push(&mut self, message: String) -> bool {
        if self.credit == 0 {
            return false;
        }
        self.credit -= 1;
        self.messages.push(message);
        true
    }

    pub fn credit(&self) -> u32 {
        self.credit
    }

    pub(crate) fn take_messages(&mut self) -> SmallVec<[String; 4]> {
        std::mem::take(&mut self.messages)
    }

    pub(crate) fn refill(&mut self, amount: u32, cap: u32) {
        self.credit = (self.credit + amount).min(cap);
    }
}

/// Per-bot consumption and kill statistics, persisted by the stats
/// collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct BotStats {
    /// Value consumed from static food
    pub natural_food_consumed: f32,
    /// Value consumed from food another bot dropped or became
    pub hunted_food_consumed: f32,
    pub kills: u32,
}

/// An agent on the field: identity, an owned snake, an owned controller and
/// the per-frame log state.
pub struct Bot {
    guid: BotId,
    database_id: i64,
    viewer_key: u64,
    name: String,
    color: u32,
    snake: Snake,
    controller: Box<dyn BotController>,
    log: LogBuffer,
    stats: BotStats,
}

impl Bot {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        guid: BotId,
        database_id: i64,
        viewer_key: u64,
        name: String,
        color: u32,
        snake: Snake,
        controller: Box<dyn BotController>,
        initial_log_credit: u32,
    ) -> Self {
        Self {
            guid,
            database_id,
            viewer_key,
            name,
            color,
            snake,
            controller,
            log: LogBuffer::new(initial_log_credit),
            stats: BotStats::default(),
        }
    }

    #[inline]
    pub fn guid(&self) -> BotId {
        self.guid
    }

    #[inline]
    pub fn database_id(&self) -> i64 {
        self.database_id
    }

    #[inline]
    pub fn viewer_key(&self) -> u64 {
        self.viewer_key
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn color(&self) -> u32 {
        self.color
    }

    #[inline]
    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    #[inline]
    pub fn stats(&self) -> &BotStats {
        &self.stats
    }

    pub(crate) fn snake_mut(&mut self) -> &mut Snake {
        &mut self.snake
    }

    pub(crate) fn log_mut(&mut self) -> &mut LogBuffer {
        &mut self.log
    }

    pub(crate) fn update_consume_stats(&mut self, food: &Food) {
        if food.hunter().is_some() {
            self.stats.hunted_food_consumed += food.value();
        } else {
            self.stats.natural_food_consumed += food.value();
        }
    }

    pub(crate) fn record_kill(&mut self) {
        self.stats.kills += 1;
    }

    pub(crate) fn notify_killed(&mut self, killer: Option<BotId>) {
        self.controller.on_killed(killer);
    }

    /// Move-phase handler: run the controller, then step the snake.
    /// Returns the number of segments the move event carries.
    pub(crate) fn perform_move(&mut self, ctx: &FrameContext) -> usize {
        let steering = {
            let view = ControllerView {
                food: &ctx.food,
                segments: &ctx.segments,
                torus: &ctx.torus,
                own_id: self.guid,
                snake: &self.snake,
            };
            self.controller.step(&view, &mut self.log)
        };

        let (target, boost) = match steering {
            Ok(steering) => (steering.target_heading_deg, steering.boost),
            Err(message) => {
                tracing::warn!(bot = %self.guid, "controller step failed: {message}");
                self.log.push(format!("controller error: {message}"));
                (self.snake.heading(), false)
            }
        };

        self.snake.step(target, boost, &ctx.torus, &ctx.config)
    }

    /// Collision-phase handler: find the first foreign segment the head
    /// touches and return its owner as the prospective killer.
    pub(crate) fn check_collision(&self, ctx: &FrameContext) -> Option<BotId> {
        let head = self.snake.head_position();
        let radius = self.snake.segment_radius();
        let query_radius = radius * ctx.config.snake_consume_range;

        for info in ctx.segments.region(head, query_radius) {
            if info.bot_id == self.guid {
                continue;
            }
            if ctx.torus.distance(head, info.position) < radius {
                return Some(info.bot_id);
            }
        }
        None
    }
}
