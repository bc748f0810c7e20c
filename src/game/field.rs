//! The playing field and its per-frame pipeline.
//!
//! The field owns all live bots, the food, the two spatial indices, the
//! PRNG, the event tracker and the worker pool. One frame is a fixed
//! sequence: move all bots (parallel), check collisions (parallel), resolve
//! outcomes (serial), rebuild the segment index, decay food, consume food,
//! remove food, drain logs, tick. The spatial maps are read-only while
//! worker jobs are in flight; every mutation happens on the orchestrator
//! thread between phases, and only the orchestrator touches the PRNG.

use std::f32::consts::PI;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use rand_distr::{Distribution, Normal};
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::db::BotScript;
use crate::game::bot::{Bot, BotController, BotHandle, BotId, FrameContext, SegmentInfo};
use crate::game::food::{Food, FoodId};
use crate::game::pool::{BotJob, BotThreadPool};
use crate::game::snake::Snake;
use crate::game::spatial::SpatialMap;
use crate::game::torus::TorusGeometry;
use crate::net::protocol::{BotSpawnData, FoodSpawnItem, GameInfo, WorldState};
use crate::net::tracker::UpdateTracker;
use crate::util::vec2::Vec2;

/// Smallest parcel carved off a dynamic food cloud. Keeps the split loop
/// finite when the size distribution samples non-positive.
const MIN_DYNAMIC_FOOD_VALUE: f32 = 0.1;

/// Information handed to killed-bot callbacks.
#[derive(Debug, Clone)]
pub struct BotDeath {
    pub victim_id: BotId,
    pub victim_database_id: i64,
    /// Equal to the victim for self-kills
    pub killer_id: BotId,
}

pub type BotKilledCallback = Box<dyn FnMut(&BotDeath) + Send>;

pub struct Field {
    config: Arc<SimulationConfig>,
    torus: TorusGeometry,
    /// Live bots in admission order; resolution iterates this order
    bots: Vec<Bot>,
    food_map: Arc<SpatialMap<Food>>,
    segment_map: Arc<SpatialMap<SegmentInfo>>,
    rng: ChaCha12Rng,
    food_size_dist: Normal<f32>,
    tracker: Box<dyn UpdateTracker>,
    pool: BotThreadPool,
    current_frame: u64,
    max_segment_radius: f32,
    next_food_id: FoodId,
    killed_callbacks: Vec<BotKilledCallback>,
}

impl Field {
    /// Create a field, validate the config, and scatter the initial static
    /// food (emitting food-spawned events through the tracker).
    pub fn new(config: SimulationConfig, tracker: Box<dyn UpdateTracker>) -> Result<Self, String> {
        config.validate()?;

        let food_size_dist = Normal::new(config.food_size_mean, config.food_size_stddev)
            .map_err(|e| format!("food size distribution: {e}"))?;
        let rng = match config.rng_seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::from_entropy(),
        };
        let torus = TorusGeometry::new(config.field_size_x, config.field_size_y);
        let food_map = SpatialMap::new(
            config.field_size_x,
            config.field_size_y,
            config.spatial_map_tiles_x,
            config.spatial_map_tiles_y,
            config.spatial_map_reserve_count,
        );
        let segment_map = SpatialMap::new(
            config.field_size_x,
            config.field_size_y,
            config.spatial_map_tiles_x,
            config.spatial_map_tiles_y,
            config.spatial_map_reserve_count,
        );
        let pool = BotThreadPool::new(config.worker_threads);
        let static_food = config.field_static_food;

        let mut field = Self {
            config: Arc::new(config),
            torus,
            bots: Vec::new(),
            food_map: Arc::new(food_map),
            segment_map: Arc::new(segment_map),
            rng,
            food_size_dist,
            tracker,
            pool,
            current_frame: 0,
            max_segment_radius: 0.0,
            next_food_id: 0,
            killed_callbacks: Vec::new(),
        };
        field.create_static_food(static_food);
        Ok(field)
    }

    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.torus.size()
    }

    #[inline]
    pub fn torus(&self) -> &TorusGeometry {
        &self.torus
    }

    #[inline]
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    #[inline]
    pub fn max_segment_radius(&self) -> f32 {
        self.max_segment_radius
    }

    #[inline]
    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    pub fn bot_by_database_id(&self, database_id: i64) -> Option<&Bot> {
        self.bots.iter().find(|b| b.database_id() == database_id)
    }

    pub fn food(&self) -> impl Iterator<Item = &Food> {
        self.food_map.iter()
    }

    pub fn food_count(&self) -> usize {
        self.food_map.len()
    }

    pub fn update_tracker(&mut self) -> &mut dyn UpdateTracker {
        &mut *self.tracker
    }

    pub fn add_bot_killed_callback(&mut self, callback: BotKilledCallback) {
        self.killed_callbacks.push(callback);
    }

    /// Admit a bot at a random position and heading with the configured
    /// start mass.
    pub fn new_bot(
        &mut self,
        script: BotScript,
        controller: Box<dyn BotController>,
    ) -> Result<BotId, String> {
        let position = self.random_position();
        let heading = self.rng.gen_range(-180.0..180.0);
        let start_mass = self.config.snake_start_mass;
        self.spawn_bot_at(script, controller, position, heading, start_mass)
    }

    /// Admit a bot at a fixed position, heading and mass. Placement hook
    /// for scripted matches and tests; the admission flow is identical to
    /// [`Self::new_bot`].
    pub fn spawn_bot_at(
        &mut self,
        script: BotScript,
        mut controller: Box<dyn BotController>,
        position: Vec2,
        heading: f32,
        start_mass: f32,
    ) -> Result<BotId, String> {
        let guid = Uuid::from_u128(self.rng.gen());
        let handle = BotHandle {
            guid,
            name: script.name.clone(),
            start_position: position,
            start_heading: heading,
            start_mass,
            field_size: self.torus.size(),
        };

        if let Err(message) = controller.init(&handle) {
            tracing::warn!(name = %script.name, "cannot start bot: {message}");
            self.tracker
                .bot_log_message(script.viewer_key, &format!("cannot start bot: {message}"));
            return Err(message);
        }

        let snake = Snake::new(position, heading, start_mass, &self.config);
        let bot = Bot::new(
            guid,
            script.database_id,
            script.viewer_key,
            script.name,
            script.color,
            snake,
            controller,
            self.config.log_credit_cap,
        );
        tracing::info!(bot = %guid, name = %bot.name(), "created bot");
        self.tracker.bot_log_message(bot.viewer_key(), "starting bot");
        self.tracker.bot_spawned(&bot);
        self.bots.push(bot);
        Ok(guid)
    }

    /// Run one complete frame.
    pub fn frame(&mut self) {
        self.move_all_bots();
        self.decay_food();
        self.consume_food();
        self.remove_food();
        self.process_log();
        self.tick();
    }

    /// Move phase, collision phase, serial resolution, segment-map rebuild.
    pub fn move_all_bots(&mut self) {
        let ctx = Arc::new(FrameContext {
            food: Arc::clone(&self.food_map),
            segments: Arc::clone(&self.segment_map),
            torus: self.torus,
            config: Arc::clone(&self.config),
        });
        let count = self.bots.len();

        // move jobs, one per bot, against the prior-frame maps
        for (index, bot) in self.bots.drain(..).enumerate() {
            self.pool.submit(BotJob::new_move(index, bot, Arc::clone(&ctx)));
        }
        self.pool.wait_for_completion();

        let mut moved: Vec<Option<(Bot, usize)>> = (0..count).map(|_| None).collect();
        while let Some(job) = self.pool.next_completed() {
            moved[job.index] = Some((job.bot, job.steps));
        }

        // collision jobs against the same snapshot
        for (index, slot) in moved.iter_mut().enumerate() {
            let (bot, steps) = slot.take().expect("every move job completes");
            let mut job = BotJob::new_collision_check(index, bot, Arc::clone(&ctx));
            job.steps = steps;
            self.pool.submit(job);
        }
        self.pool.wait_for_completion();

        let mut outcomes: Vec<Option<(Bot, usize, Option<BotId>)>> =
            (0..count).map(|_| None).collect();
        while let Some(job) = self.pool.next_completed() {
            outcomes[job.index] = Some((job.bot, job.steps, job.killer));
        }

        // all jobs drained; the maps are exclusively ours again
        drop(ctx);

        self.resolve_outcomes(outcomes);
        self.rebuild_segment_map();
    }

    fn resolve_outcomes(&mut self, outcomes: Vec<Option<(Bot, usize, Option<BotId>)>>) {
        // mass snapshot for the killer ratio test; a killer may itself die
        // this frame, after which it is no longer addressable
        let masses: Vec<(BotId, f32)> = outcomes
            .iter()
            .map(|slot| {
                let (bot, _, _) = slot.as_ref().expect("every collision job completes");
                (bot.guid(), bot.snake().mass())
            })
            .collect();
        let mass_of =
            |id: BotId| masses.iter().find(|(guid, _)| *guid == id).map(|(_, mass)| *mass);

        let mut kill_credits: Vec<BotId> = Vec::new();

        for slot in outcomes {
            let (mut bot, steps, killer) = slot.expect("every collision job completes");

            if !bot.snake().head_position().is_finite() {
                tracing::error!(bot = %bot.guid(), "non-finite head position, removing bot");
                let guid = bot.guid();
                self.kill_bot(bot, guid);
                continue;
            }

            if let Some(killer_id) = killer {
                let killer_mass = mass_of(killer_id).unwrap_or(0.0);
                if killer_mass > bot.snake().mass() * self.config.killer_min_mass_ratio {
                    kill_credits.push(killer_id);
                    self.kill_bot(bot, killer_id);
                    continue;
                }
            }

            self.tracker.bot_moved(&bot, steps);

            if bot.snake().boosted_last_move() {
                let loss = self.config.snake_boost_loss_factor * bot.snake().mass();
                let tail = bot.snake().tail_position();
                let scatter_radius = bot.snake().segment_radius();
                bot.snake_mut().reduce_mass(loss, self.config.snake_length_exponent);
                self.create_dynamic_food(loss, tail, scatter_radius, None);

                if bot.snake().mass() < self.config.snake_self_kill_mass_threshold {
                    let guid = bot.guid();
                    self.kill_bot(bot, guid);
                    continue;
                }
            }

            self.bots.push(bot);
        }

        for killer_id in kill_credits {
            if let Some(killer) = self.bots.iter_mut().find(|b| b.guid() == killer_id) {
                killer.record_kill();
            }
        }
    }

    /// Convert the victim's snake to a dynamic food cloud, emit the kill and
    /// run the killed-bot callbacks. The victim never rejoins the live set.
    fn kill_bot(&mut self, mut victim: Bot, killer_id: BotId) {
        let segment_count = victim.snake().segments().len();
        let value_per_segment = victim.snake().mass() / segment_count as f32;
        let hunter = (killer_id != victim.guid()).then_some(killer_id);
        let positions: Vec<Vec2> = victim
            .snake()
            .segments()
            .iter()
            .map(|s| s.position)
            .collect();

        for position in positions {
            if !position.is_finite() || !value_per_segment.is_finite() {
                continue;
            }
            let food =
                Food::new_dynamic(self.allocate_food_id(), position, value_per_segment, hunter);
            self.tracker.food_spawned(&food);
            self.food_map_mut().insert(food);
        }

        tracing::info!(victim = %victim.guid(), killer = %killer_id, "bot killed");
        self.tracker.bot_killed(killer_id, &victim);
        victim.notify_killed(hunter);

        let death = BotDeath {
            victim_id: victim.guid(),
            victim_database_id: victim.database_id(),
            killer_id,
        };
        for callback in &mut self.killed_callbacks {
            callback(&death);
        }
    }

    fn rebuild_segment_map(&mut self) {
        let map = Arc::get_mut(&mut self.segment_map)
            .expect("segment map is uniquely owned between phases");
        map.clear();
        for bot in &self.bots {
            for segment in bot.snake().segments() {
                map.insert(SegmentInfo {
                    position: segment.position,
                    bot_id: bot.guid(),
                });
            }
        }
    }

    /// Decay all food; decayed static food schedules one replacement each.
    pub fn decay_food(&mut self) {
        let step = self.config.food_decay_step;
        let mut respawn = 0;
        {
            let food_map = Arc::get_mut(&mut self.food_map)
                .expect("food map is uniquely owned between phases");
            let tracker = &mut *self.tracker;
            for item in food_map.iter_mut() {
                if item.decay(step) {
                    tracker.food_decayed(item);
                    if item.shall_regenerate() {
                        respawn += 1;
                    }
                }
            }
        }
        if respawn > 0 {
            self.create_static_food(respawn);
        }
    }

    /// Let every snake eat the food in range of its head. Consumed static
    /// food is replaced after the bot loop; then the max segment radius is
    /// recomputed.
    pub fn consume_food(&mut self) {
        let mut respawn = 0;
        {
            let config = Arc::clone(&self.config);
            let torus = self.torus;
            let food_map = Arc::get_mut(&mut self.food_map)
                .expect("food map is uniquely owned between phases");
            let tracker = &mut *self.tracker;

            for bot in &mut self.bots {
                let head = bot.snake().head_position();
                let range = bot.snake().segment_radius() * config.snake_consume_range;
                food_map.for_each_region_mut(head, range, |item| {
                    if item.shall_be_removed() {
                        return;
                    }
                    if !bot.snake().can_consume(item, &torus, config.snake_consume_range) {
                        return;
                    }
                    bot.snake_mut().consume(item.value(), config.snake_length_exponent);
                    bot.update_consume_stats(item);
                    tracker.food_consumed(item, bot);
                    item.mark_for_removal();
                    if item.shall_regenerate() {
                        respawn += 1;
                    }
                });
            }
        }
        if respawn > 0 {
            self.create_static_food(respawn);
        }
        self.update_max_segment_radius();
    }

    /// Sweep out everything marked during decay and consumption.
    pub fn remove_food(&mut self) {
        Arc::get_mut(&mut self.food_map)
            .expect("food map is uniquely owned between phases")
            .erase_if(|item| item.shall_be_removed());
    }

    /// Drain every bot's log buffer into the event stream and refill the
    /// log credit.
    pub fn process_log(&mut self) {
        let tracker = &mut *self.tracker;
        for bot in &mut self.bots {
            let viewer_key = bot.viewer_key();
            for message in bot.log_mut().take_messages() {
                tracker.bot_log_message(viewer_key, &message);
            }
            bot.log_mut()
                .refill(self.config.log_credit_per_frame, self.config.log_credit_cap);
        }
    }

    /// Advance the frame counter and emit the tick event.
    pub fn tick(&mut self) {
        self.current_frame += 1;
        self.tracker.tick(self.current_frame);
    }

    /// Emit a bot-stats event for every live bot.
    pub fn send_stats_to_stream(&mut self) {
        for bot in &self.bots {
            self.tracker.bot_stats(bot);
        }
    }

    /// Emit the static game parameters a viewer needs up front.
    pub fn emit_game_info(&mut self) {
        self.tracker.game_info(GameInfo {
            world_size_x: self.config.field_size_x,
            world_size_y: self.config.field_size_y,
            food_decay_per_frame: self.config.food_decay_step,
        });
    }

    /// Emit a complete snapshot for a newly connected viewer.
    pub fn emit_world_state(&mut self) {
        let state = WorldState {
            bots: self.bots.iter().map(BotSpawnData::from_bot).collect(),
            food: self.food_map.iter().map(FoodSpawnItem::from_food).collect(),
        };
        self.tracker.world_state(state);
    }

    /// Scatter dynamic food worth `total_value` in a circle around
    /// `center`. Parcels follow the configured size distribution; the last
    /// parcel takes the remainder.
    pub fn create_dynamic_food(
        &mut self,
        total_value: f32,
        center: Vec2,
        radius: f32,
        hunter: Option<BotId>,
    ) {
        let mut remaining = total_value;
        while remaining > 0.0 {
            let value = if remaining > self.config.food_size_mean {
                self.food_size_dist
                    .sample(&mut self.rng)
                    .max(MIN_DYNAMIC_FOOD_VALUE)
            } else {
                remaining
            };

            let parcel_radius = radius * self.rng.gen::<f32>();
            let angle = self.rng.gen_range(-PI..PI);
            let position = self.torus.wrap(center + Vec2::from_polar(parcel_radius, angle));

            if position.is_finite() {
                let food = Food::new_dynamic(self.allocate_food_id(), position, value, hunter);
                self.tracker.food_spawned(&food);
                self.food_map_mut().insert(food);
            }

            remaining -= value;
        }
    }

    fn create_static_food(&mut self, count: usize) {
        for _ in 0..count {
            let value = self.food_size_dist.sample(&mut self.rng).max(0.0);
            let position = self.random_position();
            let food = Food::new_static(self.allocate_food_id(), position, value);
            self.tracker.food_spawned(&food);
            self.food_map_mut().insert(food);
        }
    }

    fn update_max_segment_radius(&mut self) {
        self.max_segment_radius = self
            .bots
            .iter()
            .map(|b| b.snake().segment_radius())
            .fold(0.0, f32::max);
    }

    fn random_position(&mut self) -> Vec2 {
        let width = self.config.field_size_x;
        let height = self.config.field_size_y;
        Vec2::new(
            self.rng.gen_range(0.0..width),
            self.rng.gen_range(0.0..height),
        )
    }

    fn allocate_food_id(&mut self) -> FoodId {
        let id = self.next_food_id;
        self.next_food_id += 1;
        id
    }

    fn food_map_mut(&mut self) -> &mut SpatialMap<Food> {
        Arc::get_mut(&mut self.food_map).expect("food map is uniquely owned between phases")
    }
}
