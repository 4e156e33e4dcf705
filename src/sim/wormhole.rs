//! Rubber-banding wormhole model
//!
//! Pure functions of the current standings and event history. Three signals
//! drive everything:
//! - lead gap: how far a player sits from the field average (normalized)
//! - pack spread: how stretched the field is (max - min, normalized)
//! - momentum: net direction of the player's last few wormhole outcomes
//!
//! Leaders get pulled back, trailers get pushed forward, bunched packs get
//! rare gentle events, stretched packs get frequent strong ones. Side-effect
//! free: the caller supplies the RNG.

use crate::consts::*;

use super::state::{EventRecord, MatchRng, Player, WormholeEvent, WormholeKind};

/// Base trigger probability before standings adjustments
const BASE_TRIGGER: f32 = 0.28;
/// Trigger bounds after all adjustments
const TRIGGER_MIN: f32 = 0.15;
const TRIGGER_MAX: f32 = 0.55;
/// Forward-bias bounds
const BIAS_MIN: f32 = 0.20;
const BIAS_MAX: f32 = 0.82;
/// How many recent events feed the momentum signal
const MOMENTUM_WINDOW: usize = 4;
/// Late-game thresholds (tile numbers)
const LATE_GAME_TILE: u8 = 65;
const END_GAME_TILE: u8 = 85;
/// Minimum pack spread for the special one-shot events
const SPECIAL_SPREAD_GATE: f32 = 0.30;
/// Drastic jumps multiply the drawn magnitude by this
const DRASTIC_FACTOR: f32 = 1.6;

/// Derived probabilities and magnitude ranges for one player's post-move check
#[derive(Debug, Clone, PartialEq)]
pub struct WormholeParams {
    pub trigger_chance: f32,
    /// Probability that a triggered standard event jumps forward
    pub forward_bias: f32,
    /// Inclusive forward jump magnitude range, in tiles
    pub forward_range: (u8, u8),
    /// Inclusive backward jump magnitude range, in tiles
    pub backward_range: (u8, u8),
    pub drastic_chance: f32,
    pub slingshot_chance: f32,
    pub gravity_well_chance: f32,
}

/// (player tile - field mean) / board length, in [-1, 1]
pub fn lead_gap(player_idx: usize, players: &[Player]) -> f32 {
    if players.is_empty() {
        return 0.0;
    }
    let mean = players.iter().map(|p| p.tile as f32).sum::<f32>() / players.len() as f32;
    (players[player_idx].tile as f32 - mean) / BOARD_TILES as f32
}

/// (max tile - min tile) / board length, in [0, 1]
pub fn pack_spread(players: &[Player]) -> f32 {
    let max = players.iter().map(|p| p.tile).max().unwrap_or(1);
    let min = players.iter().map(|p| p.tile).min().unwrap_or(1);
    (max - min) as f32 / BOARD_TILES as f32
}

/// Sign-sum of the player's last few event deltas, normalized to [-1, 1].
/// A hot streak (all boosts) reads +1, a cold streak -1.
pub fn momentum(player_id: u8, history: &[EventRecord]) -> f32 {
    let sum: i32 = history
        .iter()
        .rev()
        .filter(|r| r.player_id == player_id)
        .take(MOMENTUM_WINDOW)
        .map(|r| r.delta.signum() as i32)
        .sum();
    sum as f32 / MOMENTUM_WINDOW as f32
}

fn pack_median(players: &[Player]) -> u8 {
    let mut tiles: Vec<u8> = players.iter().map(|p| p.tile).collect();
    tiles.sort_unstable();
    tiles[tiles.len() / 2]
}

fn leader_tile(players: &[Player]) -> u8 {
    players.iter().map(|p| p.tile).max().unwrap_or(1)
}

/// Compute all event probabilities and ranges for one player
pub fn compute_params(
    player_idx: usize,
    players: &[Player],
    history: &[EventRecord],
) -> WormholeParams {
    let tile = players[player_idx].tile;
    let gap = lead_gap(player_idx, players);
    let spread = pack_spread(players);
    let mom = momentum(players[player_idx].id, history);

    // Displaced players in a stretched pack get corrected more often;
    // a bunched pack stays near the base rate.
    let mut trigger = BASE_TRIGGER + 0.20 * gap.abs() * spread;
    if tile > LATE_GAME_TILE {
        trigger += 0.08;
    }
    if tile > END_GAME_TILE {
        trigger += 0.07;
    }
    let trigger_chance = trigger.clamp(TRIGGER_MIN, TRIGGER_MAX);

    // Direction: leaders and hot streaks shift backward, trailers in a
    // stretched pack shift forward.
    let mut bias = 0.50 - 0.35 * gap - 0.18 * mom;
    if gap < 0.0 {
        bias += 0.20 * spread;
    }
    let forward_bias = bias.clamp(BIAS_MIN, BIAS_MAX);

    let mut forward_range = (4u8, 14u8);
    let mut backward_range = (3u8, 10u8);
    if gap < 0.0 {
        forward_range.1 = forward_range.1.saturating_add((6.0 * spread).round() as u8);
    }
    if gap > 0.0 {
        backward_range.1 = backward_range.1.saturating_add((5.0 * spread).round() as u8);
    }
    if tile > LATE_GAME_TILE {
        forward_range.1 = forward_range.1.saturating_add(2);
        backward_range.1 = backward_range.1.saturating_add(2);
    }

    let clearly_displaced = gap.abs() > 0.15;
    let mut drastic = 0.10;
    if clearly_displaced {
        drastic += 0.08;
    }
    if tile > LATE_GAME_TILE {
        drastic += 0.05;
    }

    let slingshot_chance = if gap < -0.05 && spread >= SPECIAL_SPREAD_GATE {
        (0.04 + 0.10 * spread).min(0.12)
    } else {
        0.0
    };
    let gravity_well_chance = if gap > 0.05 && spread >= SPECIAL_SPREAD_GATE {
        (0.04 + 0.10 * spread).min(0.12)
    } else {
        0.0
    };

    WormholeParams {
        trigger_chance,
        forward_bias,
        forward_range,
        backward_range,
        drastic_chance: drastic,
        slingshot_chance,
        gravity_well_chance,
    }
}

/// Post-move wormhole check for the player at `player_idx`.
///
/// Returns a fully resolved event (destination already clamped to
/// [2, 98], label matching the actual direction) or `None` when nothing
/// triggers. Tiles 1 and 99-100 are insulated from randomness entirely.
pub fn check_wormhole(
    player_idx: usize,
    players: &[Player],
    history: &[EventRecord],
    rng: &mut MatchRng,
) -> Option<WormholeEvent> {
    let player = players.get(player_idx)?;
    let tile = player.tile;
    if tile <= SAFE_ZONE_LOW || tile >= SAFE_ZONE_HIGH {
        return None;
    }

    let params = compute_params(player_idx, players, history);
    if !rng.chance(params.trigger_chance) {
        return None;
    }

    let (raw_dest, kind) = if rng.chance(params.slingshot_chance) {
        let behind = rng.range_u8(3, 8);
        (
            leader_tile(players) as i16 - behind as i16,
            WormholeKind::Slingshot,
        )
    } else if rng.chance(params.gravity_well_chance) {
        let median = pack_median(players) as i16;
        let mid = (tile as i16 + median) / 2;
        (mid + rng.jitter(3), WormholeKind::GravityWell)
    } else {
        let forward = rng.chance(params.forward_bias);
        let (lo, hi) = if forward {
            params.forward_range
        } else {
            params.backward_range
        };
        let mut magnitude = rng.range_u8(lo, hi) as f32;
        if rng.chance(params.drastic_chance) {
            magnitude = (magnitude * DRASTIC_FACTOR).round();
        }
        let kind = if forward {
            WormholeKind::Boost
        } else {
            WormholeKind::Glitch
        };
        let signed = if forward {
            magnitude as i16
        } else {
            -(magnitude as i16)
        };
        (tile as i16 + signed, kind)
    };

    let dest = raw_dest.clamp(DEST_MIN as i16, DEST_MAX as i16) as u8;
    if dest == tile {
        return None;
    }

    // Clamping can flip a jump's direction; the label follows the movement
    // actually observed, never the roll that produced it.
    let kind = match kind {
        WormholeKind::Boost if dest < tile => WormholeKind::Glitch,
        WormholeKind::Glitch if dest > tile => WormholeKind::Boost,
        other => other,
    };

    Some(WormholeEvent {
        player_id: player.id,
        from_tile: tile,
        dest_tile: dest,
        kind,
    })
}
