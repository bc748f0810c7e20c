//! Default simulation constants.
//!
//! These back [`crate::config::SimulationConfig::default`]; running code
//! reads the injected config record, not these values.

/// Field geometry defaults
pub mod field {
    /// Field width in world units
    pub const SIZE_X: f32 = 1024.0;
    /// Field height in world units
    pub const SIZE_Y: f32 = 1024.0;
    /// Items of static food kept on the field
    pub const STATIC_FOOD: usize = 5000;
}

/// Snake dynamics defaults
pub mod snake {
    /// Distance per normal movement step
    pub const DISTANCE_PER_STEP: f32 = 1.0;
    /// Factor by which the snake's speed increases while boosting
    pub const BOOST_SPEEDUP: f32 = 3.0;
    /// Factor applied to every segment velocity each frame
    pub const FRICTION_FACTOR: f32 = 0.95;
    /// Spring constant of the springs between segments
    pub const SPRING_CONSTANT: f32 = 0.5;
    /// Rest length of the springs between segments
    pub const BASE_DISTANCE: f32 = 0.0;
    /// Chain length = max(2, round(mass^LENGTH_EXPONENT))
    pub const LENGTH_EXPONENT: f32 = 0.8;
    /// Consume range as a multiple of the segment radius
    pub const CONSUME_RANGE: f32 = 1.0;
    /// Mass given to a newly admitted bot
    pub const START_MASS: f32 = 10.0;
    /// Fraction of mass dropped as food per boosted frame
    pub const BOOST_LOSS_FACTOR: f32 = 0.01;
    /// A bot below this mass dies on its own
    pub const SELF_KILL_MASS_THRESHOLD: f32 = 1.0;
    /// A killer must out-mass the victim by this ratio for the kill to count
    pub const KILLER_MIN_MASS_RATIO: f32 = 1.25;
}

/// Food defaults
pub mod food {
    /// Food particle size distribution mean
    pub const SIZE_MEAN: f32 = 3.5;
    /// Food particle size distribution standard deviation
    pub const SIZE_STDDEV: f32 = 2.0;
    /// Value lost per frame
    pub const DECAY_STEP: f32 = 0.01;
}

/// Spatial index defaults
pub mod spatial {
    /// Tile columns of the bucket grid
    pub const MAP_TILES_X: usize = 64;
    /// Tile rows of the bucket grid
    pub const MAP_TILES_Y: usize = 64;
    /// Capacity reserved per bucket
    pub const MAP_RESERVE_COUNT: usize = 16;
}

/// Bot housekeeping defaults
pub mod log {
    /// Log credit granted each frame
    pub const CREDIT_PER_FRAME: u32 = 1;
    /// Upper bound on accumulated log credit
    pub const CREDIT_CAP: u32 = 10;
}

/// Worker pool defaults
pub mod pool {
    /// Worker threads when the host does not choose a count
    pub const WORKER_THREADS: usize = 4;
}
