//! Fixed timestep turn controller
//!
//! Advances the turn state machine one tick at a time. The presentation
//! layer only ever communicates through `TickInput`; in particular the
//! movement-completion signal may arrive late, early, or more than once,
//! and must never double-advance a turn.

use crate::consts::*;

use super::state::{
    CollisionEvent, GameState, GameStatus, MathChallenge, PendingEvent, TurnPhase,
};
use super::wormhole;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Roll request from the active player (button/tap/space)
    pub roll: bool,
    /// Override the next roll's value (debug/testing)
    pub forced_roll: Option<u8>,
    /// Movement animation finished for this player; may repeat
    pub movement_done: Option<u8>,
    /// The visible event dialog was confirmed
    pub confirm_event: bool,
    /// Submitted math-challenge answer
    pub challenge_answer: Option<i32>,
    /// Disable random events entirely (debug/testing)
    pub suppress_events: bool,
    /// Abandon the match and return to setup
    pub restart: bool,
}

/// Advance the game by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    if input.restart {
        state.reset_game();
        return;
    }
    if state.status != GameStatus::Playing {
        return;
    }

    if input.roll {
        state.roll_dice(input.forced_roll);
    }

    if let Some(player_id) = input.movement_done {
        handle_movement_done(state, player_id, input.suppress_events);
    }

    match state.phase {
        TurnPhase::Idle | TurnPhase::Moving => {}

        TurnPhase::Rolling { ticks_left, value } => {
            if ticks_left > 1 {
                state.phase = TurnPhase::Rolling {
                    ticks_left: ticks_left - 1,
                    value,
                };
            } else {
                reveal_roll(state, value);
            }
        }

        TurnPhase::AwaitingEvent => handle_awaiting_event(state, input),

        TurnPhase::Teleporting { ticks_left } => {
            if ticks_left > 1 {
                state.phase = TurnPhase::Teleporting {
                    ticks_left: ticks_left - 1,
                };
            } else {
                state.next_turn();
            }
        }

        TurnPhase::TurnEnding { ticks_left } => {
            if ticks_left > 1 {
                state.phase = TurnPhase::TurnEnding {
                    ticks_left: ticks_left - 1,
                };
            } else {
                state.next_turn();
            }
        }
    }
}

/// Dice animation finished: show the value and start the move
fn reveal_roll(state: &mut GameState, value: u8) {
    state.dice = Some(value);
    let Some(active) = state.active_player() else {
        return;
    };
    let player_id = active.id;
    if state.move_player(player_id, value) {
        state.phase = TurnPhase::Moving;
    } else {
        // Overshoot forfeits the turn outright, no animation
        state.next_turn();
    }
}

/// Movement-completion handler.
///
/// Re-reads authoritative state before acting: the signal is delivered by
/// the presentation layer and can arrive redundantly. Anything other than
/// "the active player, still mid-move" is dropped.
fn handle_movement_done(state: &mut GameState, player_id: u8, suppress_events: bool) {
    if state.phase != TurnPhase::Moving {
        return;
    }
    let Some(active) = state.active_player() else {
        return;
    };
    if active.id != player_id || !active.is_moving {
        return;
    }
    let tile = active.tile;
    state.set_moving(player_id, false);

    // Collision first; a contested tile suppresses the wormhole check for
    // this turn. The start tile is shared freely.
    let occupant = state
        .players
        .iter()
        .find(|p| p.id != player_id && p.tile == tile && tile > 1)
        .map(|p| p.id);
    if let Some(occupant_id) = occupant {
        let bounce_steps = state.dice.unwrap_or(1);
        state.pending = Some(PendingEvent::Collision(CollisionEvent {
            incoming_id: player_id,
            occupant_id,
            tile,
            incoming_from_tile: tile.saturating_sub(bounce_steps).max(1),
            bounce_steps,
        }));
        state.phase = TurnPhase::AwaitingEvent;
        log::info!(
            "Players {} and {} contest tile {}",
            player_id,
            occupant_id,
            tile
        );
        return;
    }

    if !suppress_events {
        if let Some(event) =
            wormhole::check_wormhole(state.turn_index, &state.players, &state.history, &mut state.rng)
        {
            state.set_pending_wormhole(event);
            return;
        }
    }

    state.phase = TurnPhase::TurnEnding {
        ticks_left: MOVE_SETTLE_TICKS,
    };
}

/// Drive whichever dialog is up: wormhole confirm, collision confirm, or
/// the ticking math challenge.
fn handle_awaiting_event(state: &mut GameState, input: &TickInput) {
    let Some(pending) = state.pending.clone() else {
        // Nothing staged; fall through to a normal turn end
        state.phase = TurnPhase::TurnEnding {
            ticks_left: MOVE_SETTLE_TICKS,
        };
        return;
    };

    match pending {
        PendingEvent::Wormhole(_) => {
            if input.confirm_event {
                state.execute_teleport();
            }
        }

        PendingEvent::Collision(collision) => {
            if input.confirm_event {
                let a = state.rng.range_u8(2, 12);
                let b = state.rng.range_u8(2, 12);
                state.pending = Some(PendingEvent::MathChallenge(MathChallenge {
                    player_id: collision.incoming_id,
                    occupant_id: collision.occupant_id,
                    tile: collision.tile,
                    origin_tile: collision.incoming_from_tile,
                    bounce_steps: collision.bounce_steps,
                    a,
                    b,
                    counts_left: CHALLENGE_COUNTS,
                    interval_ticks: 0,
                }));
            }
        }

        PendingEvent::MathChallenge(mut challenge) => {
            if let Some(answer) = input.challenge_answer {
                let correct = answer == challenge.answer();
                state.pending = None;
                resolve_challenge(state, &challenge, correct);
            } else {
                challenge.interval_ticks += 1;
                if challenge.interval_ticks >= CHALLENGE_TICK_INTERVAL {
                    challenge.interval_ticks = 0;
                    challenge.counts_left = challenge.counts_left.saturating_sub(1);
                    if challenge.counts_left == 0 {
                        // Timeout counts as a wrong answer
                        state.pending = None;
                        resolve_challenge(state, &challenge, false);
                        return;
                    }
                }
                state.pending = Some(PendingEvent::MathChallenge(challenge));
            }
        }
    }
}

/// Settle a contested tile: the winner holds it, the loser is bounced back
fn resolve_challenge(state: &mut GameState, challenge: &MathChallenge, correct: bool) {
    if correct {
        if let Some(occupant) = state.player_mut(challenge.occupant_id) {
            occupant.tile = occupant.tile.saturating_sub(challenge.bounce_steps).max(1);
            log::info!(
                "Player {} answered correctly, player {} bounced to {}",
                challenge.player_id,
                challenge.occupant_id,
                occupant.tile
            );
        }
    } else if let Some(incoming) = state.player_mut(challenge.player_id) {
        incoming.tile = challenge.origin_tile;
        log::info!(
            "Player {} failed the challenge, bounced back to {}",
            challenge.player_id,
            challenge.origin_tile
        );
    }
    state.phase = TurnPhase::TurnEnding {
        ticks_left: MOVE_SETTLE_TICKS,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{WormholeEvent, WormholeKind};

    fn quiet() -> TickInput {
        TickInput {
            suppress_events: true,
            ..Default::default()
        }
    }

    /// Tick until the machine goes idle (or the match ends)
    fn settle(state: &mut GameState, max_ticks: u32) {
        for _ in 0..max_ticks {
            if state.status != GameStatus::Playing || state.phase == TurnPhase::Idle {
                return;
            }
            tick(state, &quiet());
        }
        panic!("state machine did not settle within {} ticks", max_ticks);
    }

    fn new_match(players: u8, seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.setup_game(players);
        state.begin_play();
        state
    }

    /// Roll a forced value and run the whole turn without random events
    fn play_turn(state: &mut GameState, forced: u8) {
        let active = state.active_player().map(|p| p.id).expect("no active player");
        tick(
            state,
            &TickInput {
                roll: true,
                forced_roll: Some(forced),
                suppress_events: true,
                ..Default::default()
            },
        );
        // Dice animation
        while matches!(state.phase, TurnPhase::Rolling { .. }) {
            tick(state, &quiet());
        }
        if state.phase == TurnPhase::Moving {
            tick(
                state,
                &TickInput {
                    movement_done: Some(active),
                    suppress_events: true,
                    ..Default::default()
                },
            );
        }
        settle(state, 10_000);
    }

    #[test]
    fn test_roll_moves_and_advances_turn() {
        let mut state = new_match(2, 11);
        play_turn(&mut state, 4);
        assert_eq!(state.players[0].tile, 5);
        assert_eq!(state.turn_index, 1);
        assert_eq!(state.dice, None);
        assert_eq!(state.turns_played, 1);
    }

    #[test]
    fn test_movement_done_is_idempotent() {
        // Regression guard: a duplicated completion signal must not
        // advance the turn twice.
        let mut state = new_match(2, 11);
        tick(
            &mut state,
            &TickInput {
                roll: true,
                forced_roll: Some(3),
                suppress_events: true,
                ..Default::default()
            },
        );
        while matches!(state.phase, TurnPhase::Rolling { .. }) {
            tick(&mut state, &quiet());
        }
        assert_eq!(state.phase, TurnPhase::Moving);

        let done = TickInput {
            movement_done: Some(0),
            suppress_events: true,
            ..Default::default()
        };
        tick(&mut state, &done);
        tick(&mut state, &done);
        tick(&mut state, &done);
        settle(&mut state, 10_000);

        assert_eq!(state.turns_played, 1);
        assert_eq!(state.turn_index, 1);
    }

    #[test]
    fn test_movement_done_for_wrong_player_ignored() {
        let mut state = new_match(2, 11);
        tick(
            &mut state,
            &TickInput {
                roll: true,
                forced_roll: Some(3),
                suppress_events: true,
                ..Default::default()
            },
        );
        while matches!(state.phase, TurnPhase::Rolling { .. }) {
            tick(&mut state, &quiet());
        }

        tick(
            &mut state,
            &TickInput {
                movement_done: Some(1),
                suppress_events: true,
                ..Default::default()
            },
        );
        assert_eq!(state.phase, TurnPhase::Moving);
        assert!(state.players[0].is_moving);
    }

    #[test]
    fn test_overshoot_passes_turn_without_moving() {
        let mut state = new_match(2, 11);
        state.players[0].tile = 98;
        play_turn(&mut state, 6);
        assert_eq!(state.players[0].tile, 98);
        assert_eq!(state.turn_index, 1);
    }

    #[test]
    fn test_exact_landing_wins() {
        // Store-level walk: sixes up to 97, the overshoot wall holds, then
        // an exact 3 lands on 100 and the next turn check declares the win.
        let mut state = new_match(2, 11);
        while state.move_player(0, 6) {
            state.set_moving(0, false);
        }
        assert_eq!(state.players[0].tile, 97);
        assert!(state.move_player(0, 3));
        state.set_moving(0, false);
        assert_eq!(state.players[0].tile, 100);

        state.next_turn();
        assert_eq!(state.status, GameStatus::Finished);
        assert_eq!(state.winner, Some(0));
        assert_eq!(state.players[1].tile, 1);
    }

    #[test]
    fn test_full_match_reaches_finish() {
        // Alternating 6/3 rolls for player 0 walk 1 -> 91 in +9 strides,
        // then 97 and an exact 100. Player 1 crawls on 1s, far behind.
        let mut state = new_match(2, 5);
        let mut lead_rolls = [6u8, 3].iter().copied().cycle();
        for _ in 0..600 {
            if state.status != GameStatus::Playing {
                break;
            }
            let roll = if state.turn_index == 0 {
                lead_rolls.next().unwrap()
            } else {
                1
            };
            play_turn(&mut state, roll);
        }
        assert_eq!(state.status, GameStatus::Finished);
        assert_eq!(state.winner, Some(0));
        assert_eq!(state.players[0].tile, 100);
    }

    #[test]
    fn test_wormhole_confirm_teleports_and_ends_turn() {
        let mut state = new_match(2, 11);
        state.players[0].tile = 40;
        state.set_pending_wormhole(WormholeEvent {
            player_id: 0,
            from_tile: 40,
            dest_tile: 52,
            kind: WormholeKind::Boost,
        });
        state.is_turn_processing = true;

        // Unconfirmed dialog holds the machine
        for _ in 0..200 {
            tick(&mut state, &quiet());
        }
        assert_eq!(state.phase, TurnPhase::AwaitingEvent);
        assert_eq!(state.players[0].tile, 40);

        tick(
            &mut state,
            &TickInput {
                confirm_event: true,
                suppress_events: true,
                ..Default::default()
            },
        );
        assert_eq!(state.players[0].tile, 52);
        assert!(matches!(state.phase, TurnPhase::Teleporting { .. }));
        settle(&mut state, 10_000);
        assert_eq!(state.turn_index, 1);
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn test_collision_challenge_won_bounces_occupant() {
        let mut state = new_match(2, 11);
        state.players[1].tile = 8;
        play_collision_turn(&mut state, true);
        // Incoming player holds the tile, occupant bounced back by the roll
        assert_eq!(state.players[0].tile, 8);
        assert_eq!(state.players[1].tile, 2);
        assert_eq!(state.turn_index, 1);
    }

    #[test]
    fn test_collision_challenge_lost_bounces_incoming() {
        let mut state = new_match(2, 11);
        state.players[1].tile = 8;
        play_collision_turn(&mut state, false);
        // Incoming player is bounced back to the tile it moved from
        assert_eq!(state.players[0].tile, 2);
        assert_eq!(state.players[1].tile, 8);
        assert_eq!(state.turn_index, 1);
    }

    #[test]
    fn test_collision_challenge_timeout_counts_as_loss() {
        let mut state = new_match(2, 11);
        state.players[1].tile = 8;
        enter_challenge(&mut state);

        // Let the countdown run dry
        for _ in 0..(CHALLENGE_TICK_INTERVAL * CHALLENGE_COUNTS as u32 + 10) {
            tick(&mut state, &quiet());
            if state.pending.is_none() {
                break;
            }
        }
        settle(&mut state, 10_000);
        assert_eq!(state.players[0].tile, 2);
        assert_eq!(state.players[1].tile, 8);
    }

    #[test]
    fn test_random_match_preserves_invariants() {
        // Bot match with live wormholes: roll when idle, acknowledge every
        // dialog, answer every challenge. Positions must stay on the board
        // and every recorded event must respect the destination band.
        let mut state = new_match(4, 2024);
        for _ in 0..100_000 {
            if state.status != GameStatus::Playing {
                break;
            }
            let mut input = TickInput::default();
            match state.phase {
                TurnPhase::Idle => input.roll = true,
                TurnPhase::Moving => {
                    input.movement_done = state.active_player().map(|p| p.id);
                }
                TurnPhase::AwaitingEvent => match &state.pending {
                    Some(PendingEvent::MathChallenge(ch)) => {
                        input.challenge_answer = Some(ch.answer());
                    }
                    _ => input.confirm_event = true,
                },
                _ => {}
            }
            tick(&mut state, &input);
            for player in &state.players {
                assert!(
                    (1..=100).contains(&player.tile),
                    "player {} off the board at {}",
                    player.id,
                    player.tile
                );
            }
        }
        for record in &state.history {
            assert!((2..=98).contains(&record.from_tile));
            assert!((2..=98).contains(&record.to_tile));
            assert_ne!(record.delta, 0);
        }
    }

    #[test]
    fn test_determinism() {
        let script: Vec<u8> = vec![4, 2, 6, 5, 3, 1, 6, 6, 2, 4];
        let run = |seed: u64| {
            let mut state = new_match(3, seed);
            for &roll in &script {
                if state.status != GameStatus::Playing {
                    break;
                }
                play_turn(&mut state, roll);
            }
            state
        };
        let a = run(777);
        let b = run(777);
        let tiles_a: Vec<u8> = a.players.iter().map(|p| p.tile).collect();
        let tiles_b: Vec<u8> = b.players.iter().map(|p| p.tile).collect();
        assert_eq!(tiles_a, tiles_b);
        assert_eq!(a.turns_played, b.turns_played);
    }

    #[test]
    fn test_restart_returns_to_setup() {
        let mut state = new_match(2, 11);
        play_turn(&mut state, 5);
        tick(
            &mut state,
            &TickInput {
                restart: true,
                ..Default::default()
            },
        );
        assert_eq!(state.status, GameStatus::Setup);
        assert!(state.players.is_empty());
    }

    /// Put player 0 at tile 2 and roll a 6 onto player 1's tile 8, then
    /// confirm the collision dialog into the math challenge.
    fn enter_challenge(state: &mut GameState) {
        state.players[0].tile = 2;
        tick(
            state,
            &TickInput {
                roll: true,
                forced_roll: Some(6),
                suppress_events: true,
                ..Default::default()
            },
        );
        while matches!(state.phase, TurnPhase::Rolling { .. }) {
            tick(state, &quiet());
        }
        tick(
            state,
            &TickInput {
                movement_done: Some(0),
                suppress_events: true,
                ..Default::default()
            },
        );
        assert!(matches!(state.pending, Some(PendingEvent::Collision(_))));

        // Confirm the collision dialog into the math challenge
        tick(
            state,
            &TickInput {
                confirm_event: true,
                suppress_events: true,
                ..Default::default()
            },
        );
        assert!(matches!(state.pending, Some(PendingEvent::MathChallenge(_))));
    }

    fn play_collision_turn(state: &mut GameState, answer_correctly: bool) {
        enter_challenge(state);
        let answer = match &state.pending {
            Some(PendingEvent::MathChallenge(c)) => c.answer(),
            _ => unreachable!(),
        };
        let submitted = if answer_correctly { answer } else { answer + 1 };
        tick(
            state,
            &TickInput {
                challenge_answer: Some(submitted),
                suppress_events: true,
                ..Default::default()
            },
        );
        settle(state, 10_000);
    }
}
