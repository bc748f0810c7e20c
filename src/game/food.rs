//! Food particles.
//!
//! Static food is placed by the field and replaced whenever a piece is
//! consumed or decays, keeping the static population constant. Dynamic food
//! is emitted by boost loss and kill conversion and is not replaced. Dynamic
//! food remembers the hunter that produced it so the stats collaborator can
//! credit kills.

use serde::{Deserialize, Serialize};

use crate::game::bot::BotId;
use crate::game::spatial::SpatialEntry;
use crate::util::vec2::Vec2;

/// Unique food identifier, assigned by the field.
pub type FoodId = u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    id: FoodId,
    position: Vec2,
    value: f32,
    is_dynamic: bool,
    marked_for_removal: bool,
    hunter: Option<BotId>,
}

impl Food {
    pub fn new_static(id: FoodId, position: Vec2, value: f32) -> Self {
        Self {
            id,
            position,
            value,
            is_dynamic: false,
            marked_for_removal: false,
            hunter: None,
        }
    }

    pub fn new_dynamic(id: FoodId, position: Vec2, value: f32, hunter: Option<BotId>) -> Self {
        Self {
            id,
            position,
            value,
            is_dynamic: true,
            marked_for_removal: false,
            hunter,
        }
    }

    #[inline]
    pub fn id(&self) -> FoodId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    #[inline]
    pub fn hunter(&self) -> Option<BotId> {
        self.hunter
    }

    /// Reduce the value by one decay step. Returns true when the particle
    /// has decayed away; it is then marked for the removal sweep.
    pub fn decay(&mut self, step: f32) -> bool {
        self.value -= step;
        if self.value <= 0.0 {
            self.marked_for_removal = true;
            true
        } else {
            false
        }
    }

    /// Static food is replaced elsewhere on the field when it disappears.
    #[inline]
    pub fn shall_regenerate(&self) -> bool {
        !self.is_dynamic
    }

    #[inline]
    pub fn mark_for_removal(&mut self) {
        self.marked_for_removal = true;
    }

    #[inline]
    pub fn shall_be_removed(&self) -> bool {
        self.marked_for_removal
    }
}

impl SpatialEntry for Food {
    fn position(&self) -> Vec2 {
        Food::position(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_reduces_value() {
        let mut food = Food::new_static(1, Vec2::new(1.0, 2.0), 1.0);
        assert!(!food.decay(0.25));
        assert!((food.value() - 0.75).abs() < 1e-6);
        assert!(!food.shall_be_removed());
    }

    #[test]
    fn test_decay_to_zero_marks_for_removal() {
        let mut food = Food::new_static(1, Vec2::ZERO, 0.05);
        assert!(food.decay(0.1));
        assert!(food.shall_be_removed());
    }

    #[test]
    fn test_static_food_regenerates() {
        let food = Food::new_static(1, Vec2::ZERO, 1.0);
        assert!(food.shall_regenerate());
        assert!(!food.is_dynamic());
    }

    #[test]
    fn test_dynamic_food_does_not_regenerate() {
        let food = Food::new_dynamic(2, Vec2::ZERO, 1.0, None);
        assert!(!food.shall_regenerate());
        assert!(food.is_dynamic());
    }

    #[test]
    fn test_mark_for_removal() {
        let mut food = Food::new_static(1, Vec2::ZERO, 1.0);
        food.mark_for_removal();
        assert!(food.shall_be_removed());
        assert!(food.value() > 0.0);
    }

    #[test]
    fn test_hunter_attribution() {
        let hunter = uuid::Uuid::from_u128(42);
        let food = Food::new_dynamic(3, Vec2::ZERO, 2.0, Some(hunter));
        assert_eq!(food.hunter(), Some(hunter));
    }
}
