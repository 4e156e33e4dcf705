//! Saved-game persistence
//!
//! Only a subset of the match survives a reload: seats, positions, cursor,
//! status, and the wormhole log (the momentum signal needs it). Transient
//! state (a mid-flight roll, a staged dialog, camera hints) is
//! reconstructed at Idle defaults on restore. Saves are written between
//! turns, so nothing meaningful is lost.

use serde::{Deserialize, Serialize};

use crate::sim::{EventRecord, GameState, GameStatus, MatchRng, Player, PlayerColor};

/// Persisted slice of one player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPlayer {
    pub id: u8,
    pub color: PlayerColor,
    pub initials: String,
    pub tile: u8,
}

/// Persisted slice of a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedGame {
    pub seed: u64,
    pub status: GameStatus,
    pub players: Vec<SavedPlayer>,
    pub turn_index: usize,
    pub winner: Option<u8>,
    pub history: Vec<EventRecord>,
    pub turns_played: u32,
    pub wormholes_triggered: u32,
}

impl SavedGame {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            seed: state.seed,
            status: state.status,
            players: state
                .players
                .iter()
                .map(|p| SavedPlayer {
                    id: p.id,
                    color: p.color,
                    initials: p.initials.clone(),
                    tile: p.tile,
                })
                .collect(),
            turn_index: state.turn_index,
            winner: state.winner,
            history: state.history.clone(),
            turns_played: state.turns_played,
            wormholes_triggered: state.wormholes_triggered,
        }
    }

    /// Rebuild a playable state. The RNG is re-seeded; stream position is
    /// not preserved across reloads, which only changes future draws.
    pub fn restore(&self) -> GameState {
        let mut state = GameState::new(self.seed);
        state.rng = MatchRng::new(self.seed ^ self.turns_played as u64);
        state.status = self.status;
        state.players = self
            .players
            .iter()
            .map(|p| {
                let mut player = Player::new(p.id);
                player.color = p.color;
                player.initials = p.initials.clone();
                player.tile = p.tile.clamp(1, 100);
                player
            })
            .collect();
        state.turn_index = self.turn_index.min(self.players.len().saturating_sub(1));
        state.winner = self.winner;
        state.history = self.history.clone();
        state.turns_played = self.turns_played;
        state.wormholes_triggered = self.wormholes_triggered;
        state
    }
}

/// LocalStorage key (used only in wasm32)
#[allow(dead_code)]
const STORAGE_KEY: &'static str = "wormhole_warp_save";

/// Save the persisted subset to LocalStorage; failures are ignored
#[cfg(target_arch = "wasm32")]
pub fn save(state: &GameState) {
    if let Ok(json) = serde_json::to_string(&SavedGame::from_state(state)) {
        if let Some(storage) = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
        {
            let _ = storage.set_item(STORAGE_KEY, &json);
            log::info!("Game saved (turn {})", state.turns_played);
        }
    }
}

/// Load a saved game from LocalStorage
#[cfg(target_arch = "wasm32")]
pub fn load() -> Option<SavedGame> {
    let storage = web_sys::window()?.local_storage().ok()??;
    let json = storage.get_item(STORAGE_KEY).ok()??;
    serde_json::from_str(&json).ok()
}

/// Clear the saved game
#[cfg(target_arch = "wasm32")]
pub fn clear() {
    if let Some(storage) = web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
    {
        let _ = storage.remove_item(STORAGE_KEY);
        log::info!("Saved game cleared");
    }
}

/// Native stubs
#[cfg(not(target_arch = "wasm32"))]
pub fn save(_state: &GameState) {}

#[cfg(not(target_arch = "wasm32"))]
pub fn load() -> Option<SavedGame> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
pub fn clear() {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::TurnPhase;

    #[test]
    fn test_round_trip_keeps_match_and_drops_transients() {
        let mut state = GameState::new(31337);
        state.setup_game(3);
        state.set_initials(0, "zoe");
        state.begin_play();
        state.players[0].tile = 42;
        state.players[2].tile = 17;
        state.turn_index = 2;
        state.turns_played = 12;
        state.history.push(EventRecord {
            player_id: 0,
            from_tile: 30,
            to_tile: 42,
            delta: 12,
        });
        // Transients that must NOT survive
        state.dice = Some(4);
        state.is_turn_processing = true;
        state.phase = TurnPhase::Moving;
        state.players[0].is_moving = true;

        let saved = SavedGame::from_state(&state);
        let json = serde_json::to_string(&saved).unwrap();
        let restored: SavedGame = serde_json::from_str(&json).unwrap();
        let state2 = restored.restore();

        assert_eq!(state2.status, GameStatus::Playing);
        assert_eq!(state2.players.len(), 3);
        assert_eq!(state2.players[0].tile, 42);
        assert_eq!(state2.players[0].initials, "ZOE");
        assert_eq!(state2.turn_index, 2);
        assert_eq!(state2.turns_played, 12);
        assert_eq!(state2.history.len(), 1);

        assert_eq!(state2.dice, None);
        assert_eq!(state2.phase, TurnPhase::Idle);
        assert!(!state2.is_turn_processing);
        assert!(!state2.players[0].is_moving);
    }

    #[test]
    fn test_restore_clamps_corrupt_fields() {
        let saved = SavedGame {
            seed: 1,
            status: GameStatus::Playing,
            players: vec![SavedPlayer {
                id: 0,
                color: PlayerColor::Azure,
                initials: "AB".to_string(),
                tile: 240,
            }],
            turn_index: 99,
            winner: None,
            history: Vec::new(),
            turns_played: 1,
            wormholes_triggered: 0,
        };
        let state = saved.restore();
        assert_eq!(state.players[0].tile, 100);
        assert_eq!(state.turn_index, 0);
    }
}
