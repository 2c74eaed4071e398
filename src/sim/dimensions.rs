//! Viewport-derived physical constants
//!
//! Every size and rate the simulation uses is a pure function of the current
//! viewport, so the game plays the same on a phone and on a desktop monitor.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Current viewport size in abstract units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Height above the ground strip
    #[inline]
    pub fn playable_height(&self) -> f32 {
        self.height - GROUND_HEIGHT
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(MAX_FIELD_WIDTH, MAX_FIELD_HEIGHT)
    }
}

/// Responsive set of physical constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub field_width: f32,
    pub field_height: f32,
    /// Side of the actor's square bounding box
    pub actor_size: f32,
    pub obstacle_width: f32,
    /// Vertical opening between upper and lower barrier
    pub gap_height: f32,
    /// Added to actor velocity every tick
    pub gravity: f32,
    /// Velocity set on jump (negative = upward)
    pub jump_impulse: f32,
    /// Obstacle x decrement per tick
    pub scroll_speed: f32,
}

impl Dimensions {
    /// Resolve the dimension set for a viewport.
    ///
    /// Negative sizes are treated as zero; a 0×0 viewport yields all-zero
    /// dimensions.
    pub fn resolve(viewport: Viewport) -> Self {
        let vw = viewport.width.max(0.0);
        let vh = viewport.height.max(0.0);
        let physics_scale = vw.min(vh) / PHYSICS_REFERENCE;

        Self {
            field_width: vw.min(MAX_FIELD_WIDTH),
            field_height: vh.min(MAX_FIELD_HEIGHT),
            actor_size: (vw * ACTOR_SIZE_RATIO).min(MAX_ACTOR_SIZE),
            obstacle_width: (vw * OBSTACLE_WIDTH_RATIO).min(MAX_OBSTACLE_WIDTH),
            gap_height: (vh * GAP_HEIGHT_RATIO).min(MAX_GAP_HEIGHT),
            gravity: BASE_GRAVITY * physics_scale,
            jump_impulse: BASE_JUMP_IMPULSE * physics_scale,
            scroll_speed: BASE_SCROLL_SPEED * (vw / SCROLL_REFERENCE),
        }
    }

    /// Largest y the actor may occupy before touching the ground
    #[inline]
    pub fn floor_limit(&self) -> f32 {
        self.field_height - self.actor_size - GROUND_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_reference_viewport() {
        let dims = Dimensions::resolve(Viewport::new(800.0, 600.0));
        assert!(approx(dims.field_width, 800.0));
        assert!(approx(dims.field_height, 600.0));
        assert!(approx(dims.actor_size, 40.0));
        assert!(approx(dims.obstacle_width, 80.0));
        assert!(approx(dims.gap_height, 180.0));
        assert!(approx(dims.gravity, 0.12));
        assert!(approx(dims.jump_impulse, -3.0));
        assert!(approx(dims.scroll_speed, 1.0));
        assert!(approx(dims.floor_limit(), 496.0));
    }

    #[test]
    fn test_large_viewport_hits_caps() {
        let dims = Dimensions::resolve(Viewport::new(2560.0, 1440.0));
        assert_eq!(dims.field_width, MAX_FIELD_WIDTH);
        assert_eq!(dims.field_height, MAX_FIELD_HEIGHT);
        assert_eq!(dims.actor_size, MAX_ACTOR_SIZE);
        assert_eq!(dims.obstacle_width, MAX_OBSTACLE_WIDTH);
        assert_eq!(dims.gap_height, MAX_GAP_HEIGHT);
        // Physics keeps scaling with the smaller side
        assert!(approx(dims.gravity, 0.12 * 1440.0 / 600.0));
        assert!(approx(dims.scroll_speed, 3.2));
    }

    #[test]
    fn test_phone_viewport() {
        let dims = Dimensions::resolve(Viewport::new(390.0, 844.0));
        assert!(approx(dims.actor_size, 19.5));
        assert!(approx(dims.obstacle_width, 39.0));
        assert!(approx(dims.gap_height, 253.2));
        assert!(approx(dims.gravity, 0.12 * 390.0 / 600.0));
        assert!(approx(dims.jump_impulse, -3.0 * 390.0 / 600.0));
    }

    #[test]
    fn test_zero_viewport_is_degenerate() {
        let dims = Dimensions::resolve(Viewport::new(0.0, 0.0));
        assert_eq!(dims.field_width, 0.0);
        assert_eq!(dims.actor_size, 0.0);
        assert_eq!(dims.gap_height, 0.0);
        assert_eq!(dims.gravity, 0.0);
        assert_eq!(dims.jump_impulse, 0.0);
        assert_eq!(dims.scroll_speed, 0.0);
    }

    proptest! {
        #[test]
        fn prop_dimensions_respect_caps(vw in 0.1f32..10_000.0, vh in 0.1f32..10_000.0) {
            let dims = Dimensions::resolve(Viewport::new(vw, vh));
            prop_assert!(dims.field_width >= 0.0 && dims.field_width <= MAX_FIELD_WIDTH);
            prop_assert!(dims.field_height >= 0.0 && dims.field_height <= MAX_FIELD_HEIGHT);
            prop_assert!(dims.actor_size >= 0.0 && dims.actor_size <= MAX_ACTOR_SIZE);
            prop_assert!(dims.obstacle_width >= 0.0 && dims.obstacle_width <= MAX_OBSTACLE_WIDTH);
            prop_assert!(dims.gap_height >= 0.0 && dims.gap_height <= MAX_GAP_HEIGHT);
            prop_assert!(dims.gravity >= 0.0);
            prop_assert!(dims.scroll_speed >= 0.0);
            // Jump points up with the same scale as gravity
            prop_assert!(dims.jump_impulse <= 0.0);
            prop_assert!((dims.jump_impulse.abs() - dims.gravity * 25.0).abs() < 1e-3 * dims.gravity.max(1.0));
        }
    }
}
