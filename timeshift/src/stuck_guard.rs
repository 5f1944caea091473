//! Pre-switch safety check for timeline toggles.

use crate::collision_layer::CollisionLayer;
use crate::geometry::WorldRect;

/// Decides whether the player would end up embedded in the candidate
/// timeline's geometry.
///
/// Missing inputs fail open: with no player bounds or no candidate layer the
/// switch is allowed. Refusing to ever switch is the worse failure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StuckGuard {
    forgiveness: f32,
}

impl Default for StuckGuard {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl StuckGuard {
    /// `forgiveness` is the fraction of the player's width/height shaved off
    /// each side before testing, so grazing contact is tolerated.
    pub fn new(forgiveness: f32) -> Self {
        let forgiveness = if forgiveness.is_finite() {
            forgiveness.clamp(0.0, 0.5)
        } else {
            0.0
        };
        Self { forgiveness }
    }

    pub fn forgiveness(&self) -> f32 {
        self.forgiveness
    }

    /// The player rect actually tested against geometry.
    pub fn effective_bounds(&self, player: &WorldRect) -> WorldRect {
        player.shrink_by_ratio(self.forgiveness)
    }

    pub fn would_be_stuck(
        &self,
        player: Option<&WorldRect>,
        candidate: Option<&CollisionLayer>,
    ) -> bool {
        let (Some(player), Some(candidate)) = (player, candidate) else {
            return false;
        };

        let shrunk = self.effective_bounds(player);
        candidate.any_intersects(&shrunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision_layer::{CollisionLayerBuilder, TimelineState};
    use crate::geometry::map_to_tile;
    use crate::level_data::LevelData;
    use crate::math::Vec2;
    use crate::physics::PhysicsWorld;

    const MAP: f32 = 1000.0;

    /// Build a one-body layer whose body lands on the given world corners.
    fn layer_with(min: (f32, f32), max: (f32, f32)) -> (CollisionLayer, PhysicsWorld) {
        let world = WorldRect::from_corners(min.into(), max.into());
        let tile = map_to_tile(&world, MAP, MAP);
        let data = LevelData::new(100, 100, 10.0, 10.0).with_group("Col", vec![tile]);
        let mut physics = PhysicsWorld::new();
        let layer = CollisionLayerBuilder::new(&data).build("Col", TimelineState::Future, &mut physics);
        (layer, physics)
    }

    fn player() -> WorldRect {
        WorldRect::from_corners(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0))
    }

    #[test]
    fn overlapping_body_blocks_switch() {
        let guard = StuckGuard::new(0.0);
        let (layer, _physics) = layer_with((5.0, 5.0), (15.0, 15.0));
        assert!(guard.would_be_stuck(Some(&player()), Some(&layer)));
    }

    #[test]
    fn distant_body_allows_switch() {
        let guard = StuckGuard::new(0.0);
        let (layer, _physics) = layer_with((20.0, 20.0), (30.0, 30.0));
        assert!(!guard.would_be_stuck(Some(&player()), Some(&layer)));
    }

    #[test]
    fn fails_open_without_inputs() {
        let guard = StuckGuard::new(0.0);
        let (layer, _physics) = layer_with((5.0, 5.0), (15.0, 15.0));
        assert!(!guard.would_be_stuck(None, Some(&layer)));
        assert!(!guard.would_be_stuck(Some(&player()), None));
        assert!(!guard.would_be_stuck(None, None));
    }

    #[test]
    fn forgiveness_tolerates_grazing_contact() {
        // Body overlaps the player's right edge by 1 unit.
        let (layer, _physics) = layer_with((9.0, 0.0), (20.0, 10.0));
        assert!(StuckGuard::new(0.0).would_be_stuck(Some(&player()), Some(&layer)));
        assert!(!StuckGuard::new(0.2).would_be_stuck(Some(&player()), Some(&layer)));
    }

    #[test]
    fn edge_contact_is_not_stuck() {
        let (layer, _physics) = layer_with((10.0, 0.0), (20.0, 10.0));
        assert!(!StuckGuard::new(0.0).would_be_stuck(Some(&player()), Some(&layer)));
    }

    #[test]
    fn empty_layer_never_blocks() {
        let layer = CollisionLayer::empty(TimelineState::Future);
        assert!(!StuckGuard::new(0.0).would_be_stuck(Some(&player()), Some(&layer)));
    }

    #[test]
    fn forgiveness_is_clamped() {
        assert_eq!(StuckGuard::new(3.0).forgiveness(), 0.5);
        assert_eq!(StuckGuard::new(-1.0).forgiveness(), 0.0);
        assert_eq!(StuckGuard::new(f32::NAN).forgiveness(), 0.0);
        let collapsed = StuckGuard::new(0.5).effective_bounds(&player());
        assert_eq!(collapsed.half_extents, Vec2::ZERO);
    }
}
