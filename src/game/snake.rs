//! Snake dynamics.
//!
//! A snake is an ordered chain of segments behaving as a damped spring-mass
//! network with a steered head. The head is advanced along the commanded
//! heading; the tail follows through per-segment velocity, friction and
//! spring forces toward each neighbour. All positions live in the field's
//! canonical rectangle between steps; a step unwraps the chain first so the
//! physics never sees a field edge.

use crate::config::SimulationConfig;
use crate::game::food::Food;
use crate::game::torus::TorusGeometry;
use crate::util::vec2::Vec2;

/// One position + velocity node of a snake.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone)]
pub struct Snake {
    segments: Vec<Segment>,
    mass: f32,
    /// Heading in degrees, kept in (-180, 180]
    heading: f32,
    segment_radius: f32,
    boosted_last_move: bool,
}

impl Snake {
    /// Create a snake at a start position with the given heading (degrees)
    /// and mass. The chain is grown to match the mass immediately.
    pub fn new(start_position: Vec2, heading: f32, mass: f32, config: &SimulationConfig) -> Self {
        let velocity = Vec2::from_polar(0.1, heading.to_radians());
        let mut snake = Self {
            segments: vec![Segment {
                position: start_position,
                velocity,
            }],
            mass,
            heading,
            segment_radius: 0.0,
            boosted_last_move: false,
        };
        snake.ensure_size_matches_mass(config.snake_length_exponent);
        snake
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn heading(&self) -> f32 {
        self.heading
    }

    #[inline]
    pub fn segment_radius(&self) -> f32 {
        self.segment_radius
    }

    #[inline]
    pub fn boosted_last_move(&self) -> bool {
        self.boosted_last_move
    }

    #[inline]
    pub fn head_position(&self) -> Vec2 {
        self.segments[0].position
    }

    #[inline]
    pub fn tail_position(&self) -> Vec2 {
        self.segments[self.segments.len() - 1].position
    }

    /// Chain length dictated by the current mass.
    pub fn target_length(&self, length_exponent: f32) -> usize {
        let target = (self.mass.powf(length_exponent) + 0.5) as usize;
        target.max(2)
    }

    /// Grow or shrink the chain to match the mass and recompute the segment
    /// radius. New segments repeat the last one, offset backwards by its
    /// velocity.
    pub fn ensure_size_matches_mass(&mut self, length_exponent: f32) {
        let target_len = self.target_length(length_exponent);
        let current_len = self.segments.len();

        if current_len < target_len {
            let mut reference = self.segments[current_len - 1];
            for _ in 0..target_len - current_len {
                let segment = Segment {
                    position: reference.position - reference.velocity,
                    velocity: reference.velocity,
                };
                self.segments.push(segment);
                reference = segment;
            }
        } else if current_len > target_len {
            self.segments.truncate(target_len);
        }

        self.segment_radius = self.mass.sqrt() / 2.0;
    }

    /// Maximum heading change per step, in degrees. Larger snakes turn
    /// slower.
    pub fn max_rotation_per_step(&self) -> f32 {
        10.0 / (self.segment_radius / 10.0 + 1.0)
    }

    /// Advance the snake by one step toward `target_angle` (degrees),
    /// optionally boosting.
    ///
    /// Returns the number of segments the frame's move event carries,
    /// counted from the head.
    pub fn step(
        &mut self,
        target_angle: f32,
        boost: bool,
        torus: &TorusGeometry,
        config: &SimulationConfig,
    ) -> usize {
        let speed_scale = if boost { config.snake_boost_speedup } else { 1.0 };

        // unwrap the chain against each predecessor so it is locally
        // contiguous even across a field edge
        let mut reference = self.segments[0].position;
        for segment in &mut self.segments {
            segment.position = torus.unwrap(segment.position, reference);
            reference = segment.position;
        }

        // advect the tail
        for segment in &mut self.segments[1..] {
            segment.position += segment.velocity;
        }

        // steer the head, rate-limited by size
        let mut delta_angle = target_angle - self.heading;
        if delta_angle > 180.0 {
            delta_angle -= 360.0;
        } else if delta_angle < -180.0 {
            delta_angle += 360.0;
        }
        let max_delta = self.max_rotation_per_step();
        if delta_angle > max_delta {
            delta_angle = max_delta;
        } else if delta_angle < -max_delta {
            delta_angle = -max_delta;
        }
        self.heading += delta_angle;

        // advance the head
        let movement =
            Vec2::from_polar(config.snake_distance_per_step * speed_scale, self.heading.to_radians());
        self.segments[0].position += movement;
        self.segments[0].velocity = movement;

        // friction
        for segment in &mut self.segments {
            segment.velocity *= config.snake_friction_factor;
        }

        // springs pull every non-head segment toward its neighbours
        for i in 1..self.segments.len() {
            let mut delta_v = spring_pull(
                self.segments[i].position,
                self.segments[i - 1].position,
                config,
            );
            if i + 1 < self.segments.len() {
                delta_v += spring_pull(
                    self.segments[i].position,
                    self.segments[i + 1].position,
                    config,
                );
            }
            self.segments[i].velocity += delta_v;
        }

        // back into the canonical rectangle
        for segment in &mut self.segments {
            segment.position = torus.wrap(segment.position);
        }

        if self.heading > 180.0 {
            self.heading -= 360.0;
        } else if self.heading < -180.0 {
            self.heading += 360.0;
        }

        self.boosted_last_move = boost;
        self.segments.len()
    }

    /// Quick axis-aligned reject, then the precise unwrapped distance test
    /// against the head's consume range.
    pub fn can_consume(&self, food: &Food, torus: &TorusGeometry, consume_range: f32) -> bool {
        let head = self.head_position();
        let max_range = self.segment_radius * consume_range;
        let food_pos = torus.unwrap(food.position(), head);

        if (food_pos.x - head.x).abs() > max_range || (food_pos.y - head.y).abs() > max_range {
            return false;
        }

        head.distance_to(food_pos) < max_range
    }

    /// Absorb a food value into the mass and reshape the chain.
    pub fn consume(&mut self, value: f32, length_exponent: f32) {
        self.mass += value;
        self.ensure_size_matches_mass(length_exponent);
    }

    /// Give up mass (boost loss) and reshape the chain. The mass never goes
    /// below zero.
    pub fn reduce_mass(&mut self, value: f32, length_exponent: f32) {
        self.mass = (self.mass - value).max(0.0);
        self.ensure_size_matches_mass(length_exponent);
    }
}

/// Spring force contribution pulling a segment at `from` toward `toward`.
/// Coincident segments contribute nothing.
fn spring_pull(from: Vec2, toward: Vec2, config: &SimulationConfig) -> Vec2 {
    let dist = from.distance_to(toward);
    if dist == 0.0 {
        return Vec2::ZERO;
    }
    let dist_err = dist - config.snake_base_distance;
    (toward - from).normalize_to_length(dist_err) * config.snake_spring_constant
}
