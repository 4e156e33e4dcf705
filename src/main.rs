//! Wormhole Warp entry point
//!
//! Handles platform-specific initialization and runs the game loop.
//! The wasm build wires DOM events into `TickInput` and paints the board
//! from state; the native build runs a headless scripted match.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlInputElement};

    use wormhole_warp::consts::*;
    use wormhole_warp::records::{MatchRecord, MatchRecords, format_date};
    use wormhole_warp::save;
    use wormhole_warp::settings::Settings;
    use wormhole_warp::sim::{
        GameState, GameStatus, PendingEvent, TickInput, TurnPhase, tick, tile_to_world,
    };

    /// Movement watchdog: if the transitionend signal never arrives (hidden
    /// tab, disabled animation), force completion after this many ticks.
    const MOVE_WATCHDOG_TICKS: u32 = 360;

    /// Game instance holding all state
    struct App {
        state: GameState,
        settings: Settings,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        /// Ticks spent waiting on the current movement animation
        moving_ticks: u32,
        /// Last observed turn count, for auto-save on turn boundaries
        last_turns: u32,
        /// The finished match has been written to the record board
        finish_recorded: bool,
    }

    impl App {
        fn new(seed: u64) -> Self {
            Self {
                state: GameState::new(seed),
                settings: Settings::load(),
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                moving_ticks: 0,
                last_turns: 0,
                finish_recorded: false,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.watch_movement();
                let input = self.input.clone();
                tick(&mut self.state, &input);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.roll = false;
                self.input.forced_roll = None;
                self.input.movement_done = None;
                self.input.confirm_event = false;
                self.input.challenge_answer = None;
                self.input.restart = false;
            }

            // Camera reset hints are one-shot; acknowledged here once the
            // follow class has been dropped by the next paint
            if self.state.camera.reset_requested {
                self.state.camera.reset_requested = false;
            }

            // Auto-save at turn boundaries; drop the save once the match ends
            if self.state.turns_played != self.last_turns {
                self.last_turns = self.state.turns_played;
                if self.state.status == GameStatus::Playing {
                    save::save(&self.state);
                }
            }
            if self.state.status == GameStatus::Finished && !self.finish_recorded {
                self.finish_recorded = true;
                self.record_finish();
                save::clear();
            }
        }

        /// Deliver a synthetic completion signal when animations are off or
        /// the real one went missing.
        fn watch_movement(&mut self) {
            if self.state.phase == TurnPhase::Moving {
                self.moving_ticks += 1;
                let animations_off = !self.settings.token_animation || self.settings.reduced_motion;
                if animations_off || self.moving_ticks > MOVE_WATCHDOG_TICKS {
                    if let Some(active) = self.state.active_player() {
                        self.input.movement_done = Some(active.id);
                    }
                }
            } else {
                self.moving_ticks = 0;
            }
        }

        fn record_finish(&self) {
            let Some(winner_id) = self.state.winner else {
                return;
            };
            let Some(winner) = self.state.player(winner_id) else {
                return;
            };
            let mut records = MatchRecords::load();
            let rank = records.add_record(MatchRecord {
                initials: winner.initials.clone(),
                color: winner.color,
                player_count: self.state.players.len() as u8,
                turns_taken: self.state.turns_played,
                wormholes: self.state.wormholes_triggered,
                timestamp: js_sys::Date::now(),
            });
            if let Some(rank) = rank {
                log::info!("Match record rank {}", rank);
                records.save();
            }
        }
    }

    fn document() -> Document {
        web_sys::window().expect("no window").document().expect("no document")
    }

    fn set_text(doc: &Document, id: &str, text: &str) {
        if let Some(el) = doc.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(doc: &Document, id: &str, visible: bool) {
        if let Some(el) = doc.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn input_value(doc: &Document, id: &str) -> Option<String> {
        let el = doc.get_element_by_id(id)?;
        let input: HtmlInputElement = el.dyn_into().ok()?;
        Some(input.value())
    }

    /// Paint the board and HUD from the current state
    fn update_dom(app: &App) {
        let doc = document();
        let state = &app.state;

        // Token positions and motion class
        for player in &state.players {
            let id = format!("token-{}", player.id);
            if let Some(el) = doc.get_element_by_id(&id) {
                let pos = tile_to_world(player.tile);
                let class = if player.is_moving {
                    format!("token {} moving", player.color.as_str())
                } else {
                    format!("token {}", player.color.as_str())
                };
                let _ = el.set_attribute("class", &class);
                let _ = el.set_attribute(
                    "style",
                    &format!("transform: translate({}px, {}px)", pos.x, pos.y),
                );
            }
        }

        // Dice face: tumbling during the roll animation, value after
        match state.phase {
            TurnPhase::Rolling { .. } => set_text(&doc, "dice-value", "?"),
            _ => set_text(
                &doc,
                "dice-value",
                &state.dice.map(|d| d.to_string()).unwrap_or_default(),
            ),
        }

        // Active player
        if let Some(active) = state.active_player() {
            set_text(&doc, "active-initials", &active.initials);
            if let Some(el) = doc.get_element_by_id("active-swatch") {
                let _ = el.set_attribute("class", &format!("swatch {}", active.color.as_str()));
            }
        }

        // Roll button is live only while idle with no dialog up
        let can_roll = state.status == GameStatus::Playing
            && state.phase == TurnPhase::Idle
            && !state.is_turn_processing;
        if let Some(el) = doc.get_element_by_id("roll-btn") {
            if can_roll {
                let _ = el.remove_attribute("disabled");
            } else {
                let _ = el.set_attribute("disabled", "disabled");
            }
        }

        // Event dialogs
        let (wormhole, collision, challenge) = match &state.pending {
            Some(PendingEvent::Wormhole(ev)) => (Some(ev), None, None),
            Some(PendingEvent::Collision(ev)) => (None, Some(ev), None),
            Some(PendingEvent::MathChallenge(ch)) => (None, None, Some(ch)),
            None => (None, None, None),
        };

        set_visible(&doc, "wormhole-dialog", wormhole.is_some());
        if let Some(ev) = wormhole {
            set_text(&doc, "wormhole-kind", ev.kind.as_str());
            set_text(
                &doc,
                "wormhole-route",
                &format!("{} \u{2192} {}", ev.from_tile, ev.dest_tile),
            );
        }

        set_visible(&doc, "collision-dialog", collision.is_some());
        if let Some(ev) = collision {
            set_text(&doc, "collision-tile", &ev.tile.to_string());
        }

        set_visible(&doc, "challenge-dialog", challenge.is_some());
        if let Some(ch) = challenge {
            set_text(&doc, "challenge-prompt", &format!("{} + {} = ?", ch.a, ch.b));
            set_text(&doc, "challenge-countdown", &ch.counts_left.to_string());
        }

        // Phase panels
        set_visible(&doc, "setup-panel", state.status == GameStatus::Setup);
        set_visible(
            &doc,
            "initials-panel",
            state.status == GameStatus::CollectingInitials,
        );
        set_visible(&doc, "hud", state.status == GameStatus::Playing);

        // Winner overlay with the record board
        let finished = state.status == GameStatus::Finished;
        set_visible(&doc, "game-over", finished);
        if finished {
            if let Some(winner) = state.winner.and_then(|id| state.player(id)) {
                set_text(&doc, "final-winner", &winner.initials);
            }
            set_text(&doc, "final-turns", &state.turns_played.to_string());
            render_records(&doc);
        }

        // Camera hints are advisory; apply them as classes on the viewport
        if let Some(el) = doc.get_element_by_id("viewport") {
            let follow = state.camera.follow_active && app.settings.effective_camera_follow();
            let _ = el.set_attribute("class", if follow { "viewport follow" } else { "viewport" });
        }
    }

    fn render_records(doc: &Document) {
        let Some(el) = doc.get_element_by_id("records-list") else {
            return;
        };
        let records = MatchRecords::load();
        let mut html = String::new();
        for entry in &records.entries {
            html.push_str(&format!(
                "<li><span class=\"swatch {}\"></span>{} \u{2014} {} turns, {} wormholes ({})</li>",
                entry.color.as_str(),
                entry.initials,
                entry.turns_taken,
                entry.wormholes,
                format_date(entry.timestamp),
            ));
        }
        el.set_inner_html(&html);
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Wormhole Warp starting...");

        let seed = js_sys::Date::now() as u64;
        let app = Rc::new(RefCell::new(App::new(seed)));
        log::info!("Initialized with seed: {}", seed);

        let doc = document();

        // Hide loading indicator
        set_visible(&doc, "loading", false);

        // Offer Continue when a save exists
        let saved_game = save::load();
        if let Some(ref saved) = saved_game {
            set_visible(&doc, "continue-prompt", true);
            set_text(&doc, "continue-turn", &saved.turns_played.to_string());
            log::info!("Found saved game at turn {}", saved.turns_played);
        }

        setup_buttons(app.clone(), saved_game);
        setup_token_listeners(app.clone());
        setup_keyboard(app.clone());

        request_animation_frame(app);

        log::info!("Wormhole Warp running!");
    }

    fn on_click(doc: &Document, id: &str, handler: impl FnMut(web_sys::MouseEvent) + 'static) {
        if let Some(el) = doc.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(handler);
            let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(app: Rc<RefCell<App>>, saved_game: Option<save::SavedGame>) {
        let doc = document();

        // Seat-count buttons kick off setup
        for count in 2u8..=4 {
            let app = app.clone();
            on_click(&doc, &format!("players-{}", count), move |_| {
                app.borrow_mut().state.setup_game(count);
            });
        }

        // Initials form: read one input per seat, then start
        {
            let app = app.clone();
            on_click(&doc, "initials-start", move |_| {
                let doc = document();
                let mut a = app.borrow_mut();
                let ids: Vec<u8> = a.state.players.iter().map(|p| p.id).collect();
                for id in ids {
                    if let Some(value) = input_value(&doc, &format!("initials-{}", id)) {
                        a.state.set_initials(id, &value);
                    }
                }
                a.state.begin_play();
            });
        }

        {
            let app = app.clone();
            on_click(&doc, "roll-btn", move |_| {
                app.borrow_mut().input.roll = true;
            });
        }

        {
            let app = app.clone();
            on_click(&doc, "event-confirm-btn", move |_| {
                app.borrow_mut().input.confirm_event = true;
            });
        }

        {
            let app = app.clone();
            on_click(&doc, "challenge-submit", move |_| {
                let doc = document();
                let answer = input_value(&doc, "challenge-answer")
                    .and_then(|v| v.trim().parse::<i32>().ok());
                if let Some(answer) = answer {
                    app.borrow_mut().input.challenge_answer = Some(answer);
                }
            });
        }

        // Continue resumes the saved match
        {
            let app = app.clone();
            on_click(&doc, "continue-btn", move |_| {
                if let Some(ref saved) = saved_game {
                    let mut a = app.borrow_mut();
                    a.state = saved.restore();
                    a.last_turns = a.state.turns_played;
                    log::info!("Resumed saved game at turn {}", a.state.turns_played);
                }
                set_visible(&document(), "continue-prompt", false);
            });
        }

        // New game discards the save and returns to seat selection
        {
            let app = app.clone();
            on_click(&doc, "new-game-btn", move |_| {
                save::clear();
                let mut a = app.borrow_mut();
                a.input.restart = true;
                a.finish_recorded = false;
                set_visible(&document(), "continue-prompt", false);
            });
        }

        // Accessibility toggle, persisted immediately
        {
            let app = app.clone();
            on_click(&doc, "reduced-motion-toggle", move |_| {
                let mut a = app.borrow_mut();
                a.settings.reduced_motion = !a.settings.reduced_motion;
                a.settings.save();
            });
        }

        {
            on_click(&doc, "restart-btn", move |_| {
                save::clear();
                let mut a = app.borrow_mut();
                a.input.restart = true;
                a.finish_recorded = false;
            });
        }
    }

    /// Tokens animate with CSS transitions; transitionend is the
    /// movement-completion signal. It can fire more than once (one event
    /// per animated property) - the sim is idempotent against that.
    fn setup_token_listeners(app: Rc<RefCell<App>>) {
        let doc = document();
        for id in 0u8..4 {
            if let Some(el) = doc.get_element_by_id(&format!("token-{}", id)) {
                let app = app.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                    app.borrow_mut().input.movement_done = Some(id);
                });
                let _ = el.add_event_listener_with_callback(
                    "transitionend",
                    closure.as_ref().unchecked_ref(),
                );
                closure.forget();
            }
        }
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let mut a = app.borrow_mut();
            match event.key().as_str() {
                " " | "Enter" => {
                    // Roll when idle, confirm when a dialog is up
                    if a.state.pending.is_some() {
                        a.input.confirm_event = true;
                    } else {
                        a.input.roll = true;
                    }
                }
                "x" | "X" => {
                    // Debug: play without random events
                    a.input.suppress_events = !a.input.suppress_events;
                    log::info!("Events suppressed: {}", a.input.suppress_events);
                }
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();

            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            a.last_time = time;

            a.update(dt);
            update_dom(&a);
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Wormhole Warp (native) starting...");

    demo_match();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless scripted match: a simple bot rolls, acknowledges every dialog,
/// and answers every challenge correctly. Exercises the full turn machine
/// without a browser.
#[cfg(not(target_arch = "wasm32"))]
fn demo_match() {
    use std::time::{SystemTime, UNIX_EPOCH};
    use wormhole_warp::sim::{
        GameState, GameStatus, PendingEvent, TickInput, TurnPhase, tick,
    };

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(1);
    let mut state = GameState::new(seed);
    state.setup_game(4);
    state.begin_play();
    log::info!("Demo match, seed {}", seed);

    let mut safety = 2_000_000u32;
    while state.status == GameStatus::Playing && safety > 0 {
        safety -= 1;
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
    }

    match state.winner.and_then(|id| state.player(id)) {
        Some(winner) => log::info!(
            "{} wins in {} turns ({} wormholes)",
            winner.initials,
            state.turns_played,
            state.wormholes_triggered
        ),
        None => log::warn!("Demo match did not finish"),
    }
}
