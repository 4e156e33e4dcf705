//! Wormhole Warp - a snake-path race board game
//!
//! Core modules:
//! - `sim`: Deterministic game logic (board geometry, state store, turn FSM, wormhole model)
//! - `settings`: Player preferences persisted to LocalStorage
//! - `save`: Saved-game subset persistence for Continue
//! - `records`: Match record leaderboard

pub mod records;
pub mod save;
pub mod settings;
pub mod sim;

pub use records::MatchRecords;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Board dimensions
    pub const BOARD_TILES: u8 = 100;
    pub const GRID_WIDTH: u8 = 10;
    /// Tile pitch in world units (token positions, camera targets)
    pub const TILE_SIZE: f32 = 64.0;
    /// Constant vertical offset applied to every tile coordinate
    pub const BOARD_Y_OFFSET: f32 = 32.0;

    /// Dice
    pub const DICE_MIN: u8 = 1;
    pub const DICE_MAX: u8 = 6;

    /// Phase durations in ticks (1000ms roll, 500ms settle, 800ms teleport settle)
    pub const ROLL_TICKS: u32 = 120;
    pub const MOVE_SETTLE_TICKS: u32 = 60;
    pub const TELEPORT_SETTLE_TICKS: u32 = 96;

    /// Math challenge: countdown starts at 10 and drops once per 200ms
    pub const CHALLENGE_COUNTS: u8 = 10;
    pub const CHALLENGE_TICK_INTERVAL: u32 = 24;

    /// Wormhole safe zone: no events at or below/above these tiles
    pub const SAFE_ZONE_LOW: u8 = 1;
    pub const SAFE_ZONE_HIGH: u8 = 99;
    /// Wormhole destinations are clamped to this band
    pub const DEST_MIN: u8 = 2;
    pub const DEST_MAX: u8 = 98;

    /// Player counts
    pub const MIN_PLAYERS: u8 = 2;
    pub const MAX_PLAYERS: u8 = 4;
}
