//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One fixed step per tick, no sub-stepping
//! - Seeded RNG only
//! - Viewport and clock are explicit inputs
//! - No rendering or platform dependencies

pub mod collision;
pub mod dimensions;
pub mod obstacle;
pub mod state;
pub mod tick;

pub use collision::{Rect, check_collision, obstacle_rects};
pub use dimensions::{Dimensions, Viewport};
pub use obstacle::{Obstacle, ObstacleGenerator, ObstacleStream, StreamKind, top_height_range};
pub use state::{
    Actor, ClaimStatus, CommandError, CrashCause, GameEvent, GamePhase, GameState, Session,
    Snapshot,
};
pub use tick::{TickInput, tick};
