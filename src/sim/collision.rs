//! Axis-aligned collision detection
//!
//! The actor is a square; each obstacle contributes two rectangles (upper
//! and lower barrier). Screen coordinates: y grows downward, origin at the
//! field top-left.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::obstacle::Obstacle;
use crate::consts::GROUND_HEIGHT;

/// Axis-aligned rectangle given by its top-left corner and size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Square box anchored at `pos`
    pub fn square(pos: Vec2, side: f32) -> Self {
        Self {
            min: pos,
            size: Vec2::splat(side),
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Strict overlap on both axes; rectangles that only touch do not overlap
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x && a_max.x > other.min.x && self.min.y < b_max.y && a_max.y > other.min.y
    }
}

/// Upper and lower barrier of an obstacle.
///
/// The lower barrier runs from `bottom_y` down to the top of the ground strip.
pub fn obstacle_rects(obstacle: &Obstacle, width: f32, viewport_height: f32) -> [Rect; 2] {
    [
        Rect::new(obstacle.x, 0.0, width, obstacle.top_height),
        Rect::new(
            obstacle.x,
            obstacle.bottom_y,
            width,
            viewport_height - obstacle.bottom_y - GROUND_HEIGHT,
        ),
    ]
}

/// True if the actor box overlaps any barrier of any obstacle
pub fn check_collision(
    actor: &Rect,
    obstacles: &[Obstacle],
    obstacle_width: f32,
    viewport_height: f32,
) -> bool {
    obstacles.iter().any(|obstacle| {
        obstacle_rects(obstacle, obstacle_width, viewport_height)
            .iter()
            .any(|barrier| actor.overlaps(barrier))
    })
}
