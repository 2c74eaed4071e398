//! Sui Flap - a flappy arcade game with on-ledger score rewards
//!
//! Core modules:
//! - `sim`: Deterministic simulation (dimensions, obstacles, collisions, game state)
//! - `game`: Session owner driving the simulation from commands and timers
//! - `platform`: Scheduler and input abstraction (browser/native)
//! - `audio`: Audio feedback sink
//! - `reward` / `ledger`: Contracts with the external ledger integration
//! - `settings`: User preferences and ledger configuration

pub mod audio;
pub mod game;
pub mod ledger;
pub mod platform;
pub mod reward;
pub mod settings;
pub mod sim;

pub use game::{Command, Game};
pub use settings::{Character, Settings};

/// Game configuration constants
pub mod consts {
    /// Nominal simulation rate (ticks per second)
    pub const TICK_RATE: u32 = 60;
    /// Nominal tick period in milliseconds
    pub const TICK_MS: f64 = 1000.0 / TICK_RATE as f64;

    /// Height of the ground strip at the bottom of the viewport
    pub const GROUND_HEIGHT: f32 = 64.0;

    /// Field caps
    pub const MAX_FIELD_WIDTH: f32 = 800.0;
    pub const MAX_FIELD_HEIGHT: f32 = 600.0;

    /// Actor defaults
    pub const MAX_ACTOR_SIZE: f32 = 40.0;
    pub const ACTOR_SIZE_RATIO: f32 = 0.05;
    /// Actor x as a fraction of viewport width
    pub const ACTOR_X_RATIO: f32 = 0.125;

    /// Obstacle defaults
    pub const MAX_OBSTACLE_WIDTH: f32 = 80.0;
    pub const OBSTACLE_WIDTH_RATIO: f32 = 0.1;
    pub const MAX_GAP_HEIGHT: f32 = 300.0;
    pub const GAP_HEIGHT_RATIO: f32 = 0.3;

    /// Physics, normalized against a 600 unit reference
    pub const BASE_GRAVITY: f32 = 0.12;
    pub const BASE_JUMP_IMPULSE: f32 = -3.0;
    pub const PHYSICS_REFERENCE: f32 = 600.0;
    /// Scroll speed, normalized against an 800 unit reference width
    pub const BASE_SCROLL_SPEED: f32 = 1.0;
    pub const SCROLL_REFERENCE: f32 = 800.0;

    /// Minimum distance of the gap from the top and bottom of the playable band
    pub const EDGE_CLEARANCE: f32 = 100.0;
    /// Smallest sampling range for the top barrier height
    pub const MIN_SAMPLE_RANGE: f32 = 50.0;

    /// Gameplay stream: spawn period (wall clock)
    pub const SPAWN_INTERVAL_MS: f64 = 2000.0;
    /// Decorative stream: spawn once the rightmost obstacle is left of this fraction of vw
    pub const MENU_SPAWN_THRESHOLD: f32 = 0.75;
    /// Decorative stream: extra spawn/despawn margin beyond the screen edges
    pub const MENU_EDGE_MARGIN: f32 = 50.0;
    /// Decorative stream: initial population
    pub const MENU_SEED_COUNT: usize = 5;
    pub const MENU_SEED_SPACING: f32 = 0.375;
    pub const MENU_SEED_OFFSET: f32 = 100.0;

    /// Reward tokens per point scored
    pub const REWARD_PER_POINT: u64 = 100;
    /// Fixed-point precision of the ledger token
    pub const LEDGER_DECIMALS: u32 = 8;
}
