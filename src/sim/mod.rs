//! Deterministic game logic module
//!
//! All gameplay rules live here. This module must be pure and deterministic:
//! - Fixed timestep only (timers are tick counters, never wall clocks)
//! - Seeded RNG only
//! - No rendering or platform dependencies
//!
//! The presentation layer feeds inputs in (`TickInput`) and reads state out;
//! it never mutates `GameState` directly.

pub mod board;
pub mod state;
pub mod tick;
pub mod wormhole;

pub use board::{tile_to_grid, tile_to_world};
pub use state::{
    CameraHints, CollisionEvent, EventRecord, GameState, GameStatus, MatchRng, MathChallenge,
    PendingEvent, Player, PlayerColor, TurnPhase, WormholeEvent, WormholeKind,
};
pub use tick::{TickInput, tick};
pub use wormhole::{WormholeParams, check_wormhole, compute_params};
