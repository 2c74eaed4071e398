//! Obstacles and the streams that spawn them
//!
//! An obstacle is a pair of barriers with a vertical gap. Two streams exist:
//! a decorative one scrolling behind the menu (spawned by spacing) and the
//! live gameplay one (spawned on a wall clock interval).

use std::ops::Range;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::dimensions::{Dimensions, Viewport};
use crate::consts::*;

/// A paired upper/lower barrier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Left edge, decreases as the field scrolls
    pub x: f32,
    /// Height of the upper barrier measured from the field top
    pub top_height: f32,
    /// Top of the lower barrier (`top_height + gap`)
    pub bottom_y: f32,
    /// Set once the actor has passed the right edge
    pub scored: bool,
}

impl Obstacle {
    pub fn new(x: f32, top_height: f32, gap: f32) -> Self {
        Self {
            x,
            top_height,
            bottom_y: top_height + gap,
            scored: false,
        }
    }

    #[inline]
    pub fn gap(&self) -> f32 {
        self.bottom_y - self.top_height
    }

    #[inline]
    pub fn right_edge(&self, width: f32) -> f32 {
        self.x + width
    }
}

/// Sampling range for an obstacle's top height.
///
/// Nominally `[100, H - G - 100)`. When the viewport is too short for the gap
/// the upper bound is raised so the range is never narrower than 50 units.
pub fn top_height_range(playable_height: f32, gap: f32) -> Range<f32> {
    let min = EDGE_CLEARANCE;
    let max = playable_height - gap - EDGE_CLEARANCE;
    if max - min < MIN_SAMPLE_RANGE || max.is_nan() {
        min..min + MIN_SAMPLE_RANGE
    } else {
        min..max
    }
}

/// Seeded source of randomized obstacles
#[derive(Debug, Clone)]
pub struct ObstacleGenerator {
    rng: Pcg32,
}

impl ObstacleGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Produce a fresh obstacle at `x` with a uniformly placed gap
    pub fn generate(&mut self, viewport: Viewport, gap: f32, x: f32) -> Obstacle {
        let range = top_height_range(viewport.playable_height(), gap);
        let top_height = self.rng.random_range(range);
        Obstacle::new(x, top_height, gap)
    }
}

/// Which spawn policy a stream follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    /// Menu background: spawn by spacing, no interaction
    Decorative,
    /// Live session: spawn every `SPAWN_INTERVAL_MS`
    Gameplay,
}

impl StreamKind {
    /// x at which new obstacles enter
    pub fn spawn_x(self, viewport: Viewport) -> f32 {
        match self {
            StreamKind::Decorative => viewport.width + MENU_EDGE_MARGIN,
            StreamKind::Gameplay => viewport.width,
        }
    }

    /// Obstacles at or left of this x are dropped
    pub fn exit_x(self, obstacle_width: f32) -> f32 {
        match self {
            StreamKind::Decorative => -obstacle_width - MENU_EDGE_MARGIN,
            StreamKind::Gameplay => -obstacle_width,
        }
    }
}

/// An ordered set of active obstacles plus its spawn bookkeeping
#[derive(Debug, Clone)]
pub struct ObstacleStream {
    kind: StreamKind,
    obstacles: Vec<Obstacle>,
    generator: ObstacleGenerator,
    /// Wall clock of the last spawn; `None` spawns on the next check
    last_spawn_ms: Option<f64>,
}

impl ObstacleStream {
    pub fn new(kind: StreamKind, seed: u64) -> Self {
        Self {
            kind,
            obstacles: Vec::new(),
            generator: ObstacleGenerator::new(seed),
            last_spawn_ms: None,
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut [Obstacle] {
        &mut self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn last_spawn_ms(&self) -> Option<f64> {
        self.last_spawn_ms
    }

    /// Drop all obstacles and restart the generator from `seed`
    pub fn reset(&mut self, seed: u64) {
        self.obstacles.clear();
        self.generator = ObstacleGenerator::new(seed);
        self.last_spawn_ms = None;
    }

    /// Populate the menu background so the screen is not empty on entry
    pub fn seed_decorative(&mut self, viewport: Viewport, now_ms: f64) {
        let gap = Dimensions::resolve(viewport).gap_height;
        for i in 0..MENU_SEED_COUNT {
            let x = i as f32 * viewport.width * MENU_SEED_SPACING - MENU_SEED_OFFSET;
            let obstacle = self.generator.generate(viewport, gap, x);
            self.obstacles.push(obstacle);
        }
        self.last_spawn_ms = Some(now_ms);
    }

    /// Scroll every obstacle left and drop those that left the screen
    pub fn advance(&mut self, scroll_speed: f32, obstacle_width: f32) {
        let exit_x = self.kind.exit_x(obstacle_width);
        for obstacle in &mut self.obstacles {
            obstacle.x -= scroll_speed;
        }
        self.obstacles.retain(|o| o.x > exit_x);
    }

    pub fn rightmost_x(&self) -> Option<f32> {
        self.obstacles.iter().map(|o| o.x).reduce(f32::max)
    }

    /// Whether the stream's trigger fires at this instant
    pub fn should_spawn(&self, viewport: Viewport, now_ms: f64) -> bool {
        match self.kind {
            StreamKind::Decorative => {
                let threshold = viewport.width * MENU_SPAWN_THRESHOLD;
                self.rightmost_x().is_none_or(|x| x < threshold)
            }
            StreamKind::Gameplay => self
                .last_spawn_ms
                .is_none_or(|last| now_ms - last > SPAWN_INTERVAL_MS),
        }
    }

    /// Spawn one obstacle if the trigger fires. Returns the new obstacle.
    pub fn maybe_spawn(&mut self, viewport: Viewport, gap: f32, now_ms: f64) -> Option<Obstacle> {
        if !self.should_spawn(viewport, now_ms) {
            return None;
        }
        let obstacle = self
            .generator
            .generate(viewport, gap, self.kind.spawn_x(viewport));
        self.obstacles.push(obstacle);
        self.last_spawn_ms = Some(now_ms);
        log::trace!(
            "{:?} spawn at x={:.1} top={:.1}",
            self.kind,
            obstacle.x,
            obstacle.top_height
        );
        Some(obstacle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const VIEW: Viewport = Viewport::new(800.0, 600.0);

    #[test]
    fn test_top_height_range_nominal() {
        // 600 - 64 = 536 playable, gap 180
        let range = top_height_range(VIEW.playable_height(), 180.0);
        assert_eq!(range.start, 100.0);
        assert!((range.end - 256.0).abs() < 1e-4);
    }

    #[test]
    fn test_top_height_range_clamps_inverted_interval() {
        // Short landscape phone: 320 - 64 = 256 playable, gap 96 => max 60 < min
        let range = top_height_range(256.0, 96.0);
        assert_eq!(range.start, 100.0);
        assert_eq!(range.end, 150.0);

        // Barely narrower than the minimum range is also widened
        let range = top_height_range(100.0 + 140.0 + 100.0 + 40.0, 140.0);
        assert_eq!(range.end - range.start, MIN_SAMPLE_RANGE);
    }

    #[test]
    fn test_generator_is_deterministic() {
        let mut a = ObstacleGenerator::new(42);
        let mut b = ObstacleGenerator::new(42);
        for _ in 0..20 {
            assert_eq!(a.generate(VIEW, 180.0, 800.0), b.generate(VIEW, 180.0, 800.0));
        }
    }

    #[test]
    fn test_gameplay_spawn_interval() {
        let mut stream = ObstacleStream::new(StreamKind::Gameplay, 7);

        // Unset timestamp spawns on the first check
        assert!(stream.maybe_spawn(VIEW, 180.0, 5_000.0).is_some());
        assert_eq!(stream.len(), 1);
        assert_eq!(stream.obstacles()[0].x, 800.0);

        // Exactly 2000 ms later is not enough
        assert!(stream.maybe_spawn(VIEW, 180.0, 7_000.0).is_none());
        assert!(stream.maybe_spawn(VIEW, 180.0, 7_000.5).is_some());
        assert_eq!(stream.len(), 2);
    }

    #[test]
    fn test_decorative_spawn_by_spacing() {
        let mut stream = ObstacleStream::new(StreamKind::Decorative, 7);
        // Empty stream spawns immediately, just off the right edge
        let first = stream.maybe_spawn(VIEW, 180.0, 0.0).unwrap();
        assert_eq!(first.x, 850.0);

        // Rightmost at 850 is beyond 75% of 800
        assert!(!stream.should_spawn(VIEW, 0.0));
        for _ in 0..251 {
            stream.advance(1.0, 80.0);
        }
        // 850 - 251 = 599 < 600
        assert!(stream.should_spawn(VIEW, 0.0));
    }

    #[test]
    fn test_seed_decorative_layout() {
        let mut stream = ObstacleStream::new(StreamKind::Decorative, 3);
        stream.seed_decorative(VIEW, 0.0);
        let xs: Vec<f32> = stream.obstacles().iter().map(|o| o.x).collect();
        assert_eq!(xs, vec![-100.0, 200.0, 500.0, 800.0, 1100.0]);
        assert!(!stream.should_spawn(VIEW, 0.0));
    }

    #[test]
    fn test_advance_drops_offscreen() {
        let mut stream = ObstacleStream::new(StreamKind::Gameplay, 1);
        stream.maybe_spawn(VIEW, 180.0, 0.0);
        stream.obstacles_mut()[0].x = -79.0;
        stream.advance(0.5, 80.0);
        assert_eq!(stream.len(), 1);
        stream.advance(0.5, 80.0);
        assert!(stream.is_empty(), "x <= -width must be dropped");

        // Decorative keeps an extra margin
        let mut menu = ObstacleStream::new(StreamKind::Decorative, 1);
        menu.maybe_spawn(VIEW, 180.0, 0.0);
        menu.obstacles_mut()[0].x = -100.0;
        menu.advance(1.0, 80.0);
        assert_eq!(menu.len(), 1);
        menu.advance(30.0, 80.0);
        assert!(menu.is_empty());
    }

    #[test]
    fn test_reset_clears_timer() {
        let mut stream = ObstacleStream::new(StreamKind::Gameplay, 1);
        stream.maybe_spawn(VIEW, 180.0, 100.0);
        stream.reset(2);
        assert!(stream.is_empty());
        assert_eq!(stream.last_spawn_ms(), None);
        assert!(stream.should_spawn(VIEW, 100.0));
    }

    proptest! {
        #[test]
        fn prop_generated_gap_within_band(
            seed in any::<u64>(),
            vw in 1.0f32..4000.0,
            vh in 1.0f32..4000.0,
        ) {
            let viewport = Viewport::new(vw, vh);
            let gap = Dimensions::resolve(viewport).gap_height;
            let range = top_height_range(viewport.playable_height(), gap);
            let mut generator = ObstacleGenerator::new(seed);
            for _ in 0..8 {
                let obstacle = generator.generate(viewport, gap, vw);
                prop_assert!(obstacle.top_height >= range.start && obstacle.top_height <= range.end);
                prop_assert!((obstacle.gap() - gap).abs() < 1e-3);
                prop_assert!(!obstacle.scored);
            }
        }
    }
}
