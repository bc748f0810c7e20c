//! Simulation configuration.
//!
//! A single injected record instead of process-wide constants, so hosts and
//! tests can vary parameters per field. Defaults come from
//! [`crate::game::constants`].

use crate::game::constants;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Field width in world units
    pub field_size_x: f32,
    /// Field height in world units
    pub field_size_y: f32,
    /// Items of static food kept on the field
    pub field_static_food: usize,

    /// Distance per normal movement step
    pub snake_distance_per_step: f32,
    /// Factor by which a snake's speed increases while boosting
    pub snake_boost_speedup: f32,
    /// Factor applied to every segment velocity each frame
    pub snake_friction_factor: f32,
    /// Spring constant of the springs between segments
    pub snake_spring_constant: f32,
    /// Rest length of the springs between segments
    pub snake_base_distance: f32,
    /// Chain length = max(2, round(mass^exponent))
    pub snake_length_exponent: f32,
    /// Consume range as a multiple of the segment radius
    pub snake_consume_range: f32,
    /// Mass given to a newly admitted bot
    pub snake_start_mass: f32,
    /// Fraction of mass dropped as food per boosted frame
    pub snake_boost_loss_factor: f32,
    /// A bot below this mass dies on its own
    pub snake_self_kill_mass_threshold: f32,
    /// A killer must out-mass the victim by this ratio for a kill to count
    pub killer_min_mass_ratio: f32,

    /// Food particle size distribution mean
    pub food_size_mean: f32,
    /// Food particle size distribution standard deviation
    pub food_size_stddev: f32,
    /// Food value lost per frame
    pub food_decay_step: f32,

    /// Tile columns of the spatial index
    pub spatial_map_tiles_x: usize,
    /// Tile rows of the spatial index
    pub spatial_map_tiles_y: usize,
    /// Capacity reserved per bucket
    pub spatial_map_reserve_count: usize,

    /// Log credit granted to each bot per frame
    pub log_credit_per_frame: u32,
    /// Upper bound on accumulated log credit
    pub log_credit_cap: u32,

    /// Size of the fixed worker pool
    pub worker_threads: usize,
    /// Fixed seed for reproducible runs; entropy-seeded when absent
    pub rng_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            field_size_x: constants::field::SIZE_X,
            field_size_y: constants::field::SIZE_Y,
            field_static_food: constants::field::STATIC_FOOD,
            snake_distance_per_step: constants::snake::DISTANCE_PER_STEP,
            snake_boost_speedup: constants::snake::BOOST_SPEEDUP,
            snake_friction_factor: constants::snake::FRICTION_FACTOR,
            snake_spring_constant: constants::snake::SPRING_CONSTANT,
            snake_base_distance: constants::snake::BASE_DISTANCE,
            snake_length_exponent: constants::snake::LENGTH_EXPONENT,
            snake_consume_range: constants::snake::CONSUME_RANGE,
            snake_start_mass: constants::snake::START_MASS,
            snake_boost_loss_factor: constants::snake::BOOST_LOSS_FACTOR,
            snake_self_kill_mass_threshold: constants::snake::SELF_KILL_MASS_THRESHOLD,
            killer_min_mass_ratio: constants::snake::KILLER_MIN_MASS_RATIO,
            food_size_mean: constants::food::SIZE_MEAN,
            food_size_stddev: constants::food::SIZE_STDDEV,
            food_decay_step: constants::food::DECAY_STEP,
            spatial_map_tiles_x: constants::spatial::MAP_TILES_X,
            spatial_map_tiles_y: constants::spatial::MAP_TILES_Y,
            spatial_map_reserve_count: constants::spatial::MAP_RESERVE_COUNT,
            log_credit_per_frame: constants::log::CREDIT_PER_FRAME,
            log_credit_cap: constants::log::CREDIT_CAP,
            worker_threads: constants::pool::WORKER_THREADS,
            rng_seed: None,
        }
    }
}

impl SimulationConfig {
    /// Validate configuration after construction
    pub fn validate(&self) -> Result<(), String> {
        if self.field_size_x <= 0.0 || self.field_size_y <= 0.0 {
            return Err("field size must be positive".to_string());
        }
        if self.spatial_map_tiles_x == 0 || self.spatial_map_tiles_y == 0 {
            return Err("spatial map needs at least one tile per axis".to_string());
        }
        if self.worker_threads == 0 {
            return Err("worker_threads must be at least 1".to_string());
        }
        if !(self.snake_friction_factor > 0.0 && self.snake_friction_factor <= 1.0) {
            return Err("snake_friction_factor must be in (0, 1]".to_string());
        }
        if self.snake_distance_per_step <= 0.0 {
            return Err("snake_distance_per_step must be positive".to_string());
        }
        if self.snake_start_mass <= 0.0 {
            return Err("snake_start_mass must be positive".to_string());
        }
        if self.snake_boost_loss_factor < 0.0 || self.snake_boost_loss_factor >= 1.0 {
            return Err("snake_boost_loss_factor must be in [0, 1)".to_string());
        }
        Ok(())
    }
}
