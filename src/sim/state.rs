//! Game state and core store types
//!
//! All state that must be persisted for Continue/determinism lives here.
//! Mutators are defensive: a call made outside its expected phase is a
//! silent no-op, never a panic.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Token colors, one per seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerColor {
    Crimson,
    Azure,
    Emerald,
    Amber,
}

impl PlayerColor {
    /// Color for a seat index (0-3)
    pub fn from_seat(seat: u8) -> Self {
        match seat % 4 {
            0 => PlayerColor::Crimson,
            1 => PlayerColor::Azure,
            2 => PlayerColor::Emerald,
            _ => PlayerColor::Amber,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerColor::Crimson => "crimson",
            PlayerColor::Azure => "azure",
            PlayerColor::Emerald => "emerald",
            PlayerColor::Amber => "amber",
        }
    }
}

/// A player token on the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: u8,
    pub color: PlayerColor,
    /// 1-3 characters shown on the HUD and the leaderboard
    pub initials: String,
    /// Board position, always in [1, 100]
    pub tile: u8,
    /// True only between move initiation and the animation-completion signal
    #[serde(skip)]
    pub is_moving: bool,
}

impl Player {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            color: PlayerColor::from_seat(id),
            initials: format!("P{}", id + 1),
            tile: 1,
            is_moving: false,
        }
    }
}

/// Match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameStatus {
    /// No match configured yet
    #[default]
    Setup,
    /// Players chosen, gathering initials before the first roll
    CollectingInitials,
    /// Active match
    Playing,
    /// Someone reached tile 100
    Finished,
}

/// Turn state machine
///
/// Replaces the timer-chain sequencing of the reference design with named
/// states; all waits are tick counters so tests can drive the machine
/// synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    /// Waiting for the active player to roll
    #[default]
    Idle,
    /// Dice animation running; the value is already decided
    Rolling { ticks_left: u32, value: u8 },
    /// Token animating; waiting for the movement-completion signal
    Moving,
    /// A pending event dialog is up, waiting for confirmation
    AwaitingEvent,
    /// Teleport applied, settle pause before the turn ends
    Teleporting { ticks_left: u32 },
    /// Post-move pause before the cursor advances
    TurnEnding { ticks_left: u32 },
}

/// Wormhole event subtype; the label always matches the observed direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WormholeKind {
    /// Forward jump
    Boost,
    /// Backward jump
    Glitch,
    /// Trailing player flung to just behind the leader
    Slingshot,
    /// Leader dragged back toward the pack median
    GravityWell,
}

impl WormholeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WormholeKind::Boost => "boost",
            WormholeKind::Glitch => "glitch",
            WormholeKind::Slingshot => "slingshot",
            WormholeKind::GravityWell => "gravity well",
        }
    }
}

/// A staged teleport, applied when the player confirms the dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WormholeEvent {
    pub player_id: u8,
    pub from_tile: u8,
    pub dest_tile: u8,
    pub kind: WormholeKind,
}

/// Two tokens on the same tile; confirmed into a math challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub incoming_id: u8,
    pub occupant_id: u8,
    pub tile: u8,
    /// Where the incoming player started this move (bounce target on a loss)
    pub incoming_from_tile: u8,
    /// Steps the incoming player just moved (occupant's bounce on a win)
    pub bounce_steps: u8,
}

/// Timed duel deciding a contested tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathChallenge {
    pub player_id: u8,
    pub occupant_id: u8,
    pub tile: u8,
    pub origin_tile: u8,
    pub bounce_steps: u8,
    /// Two-operand sum shown in the dialog
    pub a: u8,
    pub b: u8,
    /// Countdown shown in the dialog; drops once per interval, 0 = timeout
    pub counts_left: u8,
    #[serde(skip)]
    pub interval_ticks: u32,
}

impl MathChallenge {
    pub fn answer(&self) -> i32 {
        self.a as i32 + self.b as i32
    }
}

/// The single event slot; at most one of these exists at a time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PendingEvent {
    Wormhole(WormholeEvent),
    Collision(CollisionEvent),
    MathChallenge(MathChallenge),
}

/// One executed wormhole, kept for the momentum signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventRecord {
    pub player_id: u8,
    pub from_tile: u8,
    pub to_tile: u8,
    pub delta: i16,
}

/// Advisory view-state flags; consumed by the presentation layer only
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CameraHints {
    pub at_default_view: bool,
    pub follow_active: bool,
    pub reset_requested: bool,
}

impl Default for CameraHints {
    fn default() -> Self {
        Self {
            at_default_view: true,
            follow_active: false,
            reset_requested: false,
        }
    }
}

/// Seeded match RNG; only the seed is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRng {
    pub seed: u64,
    #[serde(skip)]
    rng: Option<Pcg32>,
}

impl MatchRng {
    pub fn new(seed: u64) -> Self {
        Self { seed, rng: None }
    }

    fn rng(&mut self) -> &mut Pcg32 {
        let seed = self.seed;
        self.rng.get_or_insert_with(|| Pcg32::seed_from_u64(seed))
    }

    /// Uniform die roll in [1, 6]
    pub fn roll_die(&mut self) -> u8 {
        self.rng().random_range(DICE_MIN..=DICE_MAX)
    }

    /// True with probability `p`
    pub fn chance(&mut self, p: f32) -> bool {
        self.rng().random::<f32>() < p
    }

    /// Uniform integer in [lo, hi]
    pub fn range_u8(&mut self, lo: u8, hi: u8) -> u8 {
        if lo >= hi {
            return lo;
        }
        self.rng().random_range(lo..=hi)
    }

    /// Uniform integer in [-span, span]
    pub fn jitter(&mut self, span: i16) -> i16 {
        if span <= 0 {
            return 0;
        }
        self.rng().random_range(-span..=span)
    }
}

/// Complete match state (deterministic; persisted subset via `save`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Match seed for reproducibility
    pub seed: u64,
    pub rng: MatchRng,
    pub status: GameStatus,
    pub players: Vec<Player>,
    /// Whose turn it is; index into `players`
    pub turn_index: usize,
    pub winner: Option<u8>,
    /// Executed wormholes, oldest first
    pub history: Vec<EventRecord>,
    pub turns_played: u32,
    pub wormholes_triggered: u32,
    /// Last revealed roll; cleared when the cursor advances
    #[serde(skip)]
    pub dice: Option<u8>,
    #[serde(skip)]
    pub phase: TurnPhase,
    #[serde(skip)]
    pub pending: Option<PendingEvent>,
    /// Admits one roll-to-next-turn cycle at a time
    #[serde(skip)]
    pub is_turn_processing: bool,
    #[serde(skip)]
    pub camera: CameraHints,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: MatchRng::new(seed),
            status: GameStatus::Setup,
            players: Vec::new(),
            turn_index: 0,
            winner: None,
            history: Vec::new(),
            turns_played: 0,
            wormholes_triggered: 0,
            dice: None,
            phase: TurnPhase::Idle,
            pending: None,
            is_turn_processing: false,
            camera: CameraHints::default(),
        }
    }

    /// Create players at tile 1 and enter the initials phase
    pub fn setup_game(&mut self, player_count: u8) {
        let count = player_count.clamp(MIN_PLAYERS, MAX_PLAYERS);
        self.players = (0..count).map(Player::new).collect();
        self.turn_index = 0;
        self.winner = None;
        self.history.clear();
        self.turns_played = 0;
        self.wormholes_triggered = 0;
        self.dice = None;
        self.phase = TurnPhase::Idle;
        self.pending = None;
        self.is_turn_processing = false;
        self.camera = CameraHints::default();
        self.status = GameStatus::CollectingInitials;
        log::info!("Match set up for {} players", count);
    }

    /// Record a player's initials (1-3 chars, uppercased)
    pub fn set_initials(&mut self, player_id: u8, initials: &str) {
        if self.status != GameStatus::CollectingInitials {
            return;
        }
        let cleaned: String = initials
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .take(3)
            .collect::<String>()
            .to_uppercase();
        if let Some(player) = self.player_mut(player_id) {
            if !cleaned.is_empty() {
                player.initials = cleaned;
            }
        }
    }

    /// Leave the initials phase and start play
    pub fn begin_play(&mut self) {
        if self.status == GameStatus::CollectingInitials {
            self.status = GameStatus::Playing;
            log::info!("Match started");
        }
    }

    pub fn player(&self, id: u8) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: u8) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn active_player(&self) -> Option<&Player> {
        self.players.get(self.turn_index)
    }

    /// Begin a roll: decide the value up front, run the dice animation.
    /// No-op while a cycle is already in flight (the reentrancy latch).
    pub fn roll_dice(&mut self, forced: Option<u8>) {
        if self.status != GameStatus::Playing
            || self.is_turn_processing
            || self.phase != TurnPhase::Idle
        {
            return;
        }
        let value = forced
            .filter(|v| (DICE_MIN..=DICE_MAX).contains(v))
            .unwrap_or_else(|| self.rng.roll_die());
        self.is_turn_processing = true;
        self.phase = TurnPhase::Rolling {
            ticks_left: ROLL_TICKS,
            value,
        };
    }

    /// Apply a move. Overshoot rule: a target past tile 100 rejects the
    /// whole move and the turn passes with the token untouched.
    /// Returns whether the token actually moved.
    pub fn move_player(&mut self, player_id: u8, steps: u8) -> bool {
        let Some(player) = self.player_mut(player_id) else {
            return false;
        };
        let target = player.tile as u16 + steps as u16;
        if target > BOARD_TILES as u16 {
            log::info!(
                "Player {} overshoots ({} + {}), turn forfeited",
                player_id,
                player.tile,
                steps
            );
            return false;
        }
        player.tile = target as u8;
        player.is_moving = true;
        self.camera.follow_active = true;
        self.camera.at_default_view = false;
        true
    }

    /// Flip the movement flag; redundant calls are dropped
    pub fn set_moving(&mut self, player_id: u8, moving: bool) {
        if let Some(player) = self.player_mut(player_id) {
            if player.is_moving != moving {
                player.is_moving = moving;
            }
        }
    }

    /// Stage a wormhole for the confirmation dialog
    pub fn set_pending_wormhole(&mut self, event: WormholeEvent) {
        if self.pending.is_none() {
            self.pending = Some(PendingEvent::Wormhole(event));
            self.phase = TurnPhase::AwaitingEvent;
        }
    }

    /// Apply the staged teleport, record it, and start the settle pause.
    /// A no-op unless a wormhole is what's actually staged.
    pub fn execute_teleport(&mut self) {
        let event = match &self.pending {
            Some(PendingEvent::Wormhole(event)) => *event,
            _ => return,
        };
        self.pending = None;
        if let Some(player) = self.player_mut(event.player_id) {
            player.tile = event.dest_tile;
        }
        self.history.push(EventRecord {
            player_id: event.player_id,
            from_tile: event.from_tile,
            to_tile: event.dest_tile,
            delta: event.dest_tile as i16 - event.from_tile as i16,
        });
        self.wormholes_triggered += 1;
        self.phase = TurnPhase::Teleporting {
            ticks_left: TELEPORT_SETTLE_TICKS,
        };
        log::info!(
            "Player {} {} {} -> {}",
            event.player_id,
            event.kind.as_str(),
            event.from_tile,
            event.dest_tile
        );
    }

    /// End the turn: finish the match on tile 100, otherwise advance the
    /// cursor and clear transient per-turn state.
    pub fn next_turn(&mut self) {
        if self.status != GameStatus::Playing || self.players.is_empty() {
            return;
        }
        if self.pending.is_some() {
            // An unresolved event blocks the cursor
            return;
        }
        if let Some((id, tile)) = self.active_player().map(|p| (p.id, p.tile)) {
            if tile == BOARD_TILES {
                self.winner = Some(id);
                self.status = GameStatus::Finished;
                self.phase = TurnPhase::Idle;
                self.is_turn_processing = false;
                log::info!("Player {} wins after {} turns", id, self.turns_played);
                return;
            }
        }
        self.turn_index = (self.turn_index + 1) % self.players.len();
        self.turns_played += 1;
        self.dice = None;
        self.phase = TurnPhase::Idle;
        self.is_turn_processing = false;
        self.camera.follow_active = false;
        self.camera.reset_requested = true;
        self.camera.at_default_view = true;
    }

    /// Discard the match and return to setup
    pub fn reset_game(&mut self) {
        let seed = self.seed;
        *self = Self::new(seed);
        log::info!("Match reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_resets_everything() {
        let mut state = GameState::new(7);
        state.setup_game(3);
        assert_eq!(state.status, GameStatus::CollectingInitials);
        assert_eq!(state.players.len(), 3);
        assert!(state.players.iter().all(|p| p.tile == 1));

        state.begin_play();
        state.players[1].tile = 42;
        state.history.push(EventRecord {
            player_id: 1,
            from_tile: 10,
            to_tile: 42,
            delta: 32,
        });

        state.setup_game(2);
        assert_eq!(state.players.len(), 2);
        assert!(state.history.is_empty());
        assert_eq!(state.winner, None);
    }

    #[test]
    fn test_player_count_clamped() {
        let mut state = GameState::new(7);
        state.setup_game(9);
        assert_eq!(state.players.len(), 4);
        state.setup_game(0);
        assert_eq!(state.players.len(), 2);
    }

    #[test]
    fn test_overshoot_rejects_move() {
        let mut state = GameState::new(7);
        state.setup_game(2);
        state.begin_play();
        state.players[0].tile = 98;

        assert!(!state.move_player(0, 5));
        assert_eq!(state.players[0].tile, 98);
        assert!(!state.players[0].is_moving);

        assert!(state.move_player(0, 2));
        assert_eq!(state.players[0].tile, 100);
    }

    #[test]
    fn test_roll_latch_drops_reentrant_rolls() {
        let mut state = GameState::new(7);
        state.setup_game(2);
        state.begin_play();

        state.roll_dice(Some(4));
        let first = state.phase;
        assert!(state.is_turn_processing);

        // Second roll while the first is in flight must change nothing
        state.roll_dice(Some(6));
        assert_eq!(state.phase, first);
    }

    #[test]
    fn test_next_turn_win_freezes_cursor() {
        let mut state = GameState::new(7);
        state.setup_game(2);
        state.begin_play();
        state.players[0].tile = 100;

        state.next_turn();
        assert_eq!(state.status, GameStatus::Finished);
        assert_eq!(state.winner, Some(0));
        assert_eq!(state.turn_index, 0);

        // Further calls are no-ops once finished
        state.next_turn();
        assert_eq!(state.turn_index, 0);
    }

    #[test]
    fn test_next_turn_blocked_by_pending_event() {
        let mut state = GameState::new(7);
        state.setup_game(2);
        state.begin_play();
        state.set_pending_wormhole(WormholeEvent {
            player_id: 0,
            from_tile: 10,
            dest_tile: 20,
            kind: WormholeKind::Boost,
        });

        state.next_turn();
        assert_eq!(state.turn_index, 0);
        assert!(state.pending.is_some());
    }

    #[test]
    fn test_execute_teleport_records_history() {
        let mut state = GameState::new(7);
        state.setup_game(2);
        state.begin_play();
        state.players[0].tile = 10;
        state.set_pending_wormhole(WormholeEvent {
            player_id: 0,
            from_tile: 10,
            dest_tile: 24,
            kind: WormholeKind::Boost,
        });

        state.execute_teleport();
        assert_eq!(state.players[0].tile, 24);
        assert!(state.pending.is_none());
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].delta, 14);
        assert_eq!(state.wormholes_triggered, 1);
        assert!(matches!(state.phase, TurnPhase::Teleporting { .. }));
    }

    #[test]
    fn test_initials_sanitized() {
        let mut state = GameState::new(7);
        state.setup_game(2);
        state.set_initials(0, "  ab!cd ");
        assert_eq!(state.players[0].initials, "ABC");
        // Empty input keeps the default
        state.set_initials(1, "   ");
        assert_eq!(state.players[1].initials, "P2");
    }

    #[test]
    fn test_dice_forced_value_validated() {
        let mut state = GameState::new(7);
        state.setup_game(2);
        state.begin_play();
        // Out-of-range forced value falls back to the RNG draw
        state.roll_dice(Some(9));
        let TurnPhase::Rolling { value, .. } = state.phase else {
            panic!("expected rolling phase");
        };
        assert!((1..=6).contains(&value));
    }
}
