//! Pearl Shell entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement, PointerEvent};

    use pearl_shell::audio::{AudioManager, SoundEffect};
    use pearl_shell::consts::*;
    use pearl_shell::sim::{
        GameEvent, GamePhase, GameState, LifelineKind, Outcome, TickInput, tick,
    };
    use pearl_shell::{HighScore, Settings, slot_left_pct};

    type ShellHandler = Closure<dyn FnMut(PointerEvent)>;

    /// Game instance holding all state
    struct Game {
        state: GameState,
        settings: Settings,
        high_score: HighScore,
        audio: AudioManager,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        /// Shell elements indexed by shell id
        shells: Vec<HtmlElement>,
        /// Pointer handlers for the current shells (dropped on rebuild)
        shell_handlers: Vec<ShellHandler>,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let settings = Settings::load();
            let high_score = HighScore::load();
            let mut audio = AudioManager::new();
            audio.set_volume(settings.effective_volume());
            Self {
                state: GameState::new(seed)
                    .with_pace(settings.pace.multiplier())
                    .with_best(high_score.best),
                settings,
                high_score,
                audio,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                shells: Vec::new(),
                shell_handlers: Vec::new(),
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.clone();
                tick(&mut self.state, &input);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input = TickInput::default();
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            let state = &self.state;

            if let Some(el) = document.get_element_by_id("msg") {
                let text = if state.phase == GamePhase::GameOver {
                    format!("Game over! Score {}. Tap to play again", state.last_score)
                } else {
                    state.status_text().to_string()
                };
                el.set_text_content(Some(&text));
            }

            if let Some(el) = document.get_element_by_id("scoreLine") {
                el.set_text_content(Some(&format!("Score: {}", state.progress.score)));
            }

            if let Some(el) = document.get_element_by_id("stageLine") {
                el.set_text_content(Some(&format!(
                    "Shells: {}  Tier: {}",
                    state.progress.stage,
                    state.progress.tier + 1
                )));
            }

            if let Some(el) = document.get_element_by_id("recordText") {
                el.set_text_content(Some(&format!("Best: {}", state.best)));
            }

            if let Some(el) = document.get_element_by_id("board") {
                let mut class = format!("board {}", state.theme().css_class());
                if self.settings.high_contrast {
                    class.push_str(" high-contrast");
                }
                if state.shield_armed {
                    class.push_str(" shielded");
                }
                let _ = el.set_attribute("class", &class);
            }

            // Pause menu toggles
            if let Some(el) = document.get_element_by_id("btn-pace") {
                el.set_text_content(Some(&format!("Pace: {}", self.settings.pace.as_str())));
            }
            if let Some(el) = document.get_element_by_id("btn-motion") {
                let label = if self.settings.reduced_motion {
                    "Reduced motion: On"
                } else {
                    "Reduced motion: Off"
                };
                el.set_text_content(Some(label));
            }

            // Lifeline buttons: charge count and availability
            for kind in LifelineKind::ALL {
                let id = format!("btn-{}", kind.as_str());
                if let Some(btn) = document.get_element_by_id(&id) {
                    let charges = state.lifelines.charges(kind);
                    let _ = btn.set_attribute("data-charges", &charges.to_string());
                    let usable = state.can_use_lifeline(kind).is_ok();
                    let _ = btn.class_list().toggle_with_force("disabled", !usable);
                }
            }
        }

        /// Position a shell element at its current slot
        fn place_shell(&self, shell: usize, duration_s: f32) {
            let count = self.state.shell_count();
            let (Some(el), Some(slot)) = (self.shells.get(shell), self.state.layout.slot_of(shell))
            else {
                return;
            };
            let style = el.style();
            let _ = style.set_property("transition-duration", &format!("{:.3}s", duration_s));
            let _ = style.set_property("left", &format!("{}%", slot_left_pct(slot, count)));
        }

        fn place_pearl(&self, document: &Document, shell: usize) {
            let (Some(pearl), Some(slot)) =
                (html_by_id(document, "pearl"), self.state.layout.slot_of(shell))
            else {
                return;
            };
            let left = slot_left_pct(slot, self.state.shell_count());
            let style = pearl.style();
            let _ = style.set_property("left", &format!("{}%", left));
            let _ = style.set_property("opacity", "1");
        }

        fn set_class(&self, shell: usize, class: &str, on: bool) {
            if let Some(el) = self.shells.get(shell) {
                let _ = el.class_list().toggle_with_force(class, on);
            }
        }
    }

    fn html_by_id(document: &Document, id: &str) -> Option<HtmlElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("show", visible);
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Pearl Shell starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        log::info!("Game initialized with seed: {}", seed);

        show(&document, "loadingScreen", true);
        show(&document, "titleScreen", false);

        setup_input_handlers(&document, game.clone());
        setup_lifeline_buttons(&document, game.clone());
        setup_reset_button(&document, game.clone());
        setup_pause_menu(&document, game.clone());
        setup_auto_pause(game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Pearl Shell running!");
    }

    /// Rebuild the shell row for a new count
    fn build_shells(game: &Rc<RefCell<Game>>, document: &Document, count: usize) {
        let Some(layer) = document.get_element_by_id("shellLayer") else {
            log::warn!("No #shellLayer element");
            return;
        };
        layer.set_inner_html("");

        let mut shells = Vec::with_capacity(count);
        let mut handlers = Vec::with_capacity(count);
        for i in 0..count {
            let Some(el) = document
                .create_element("div")
                .ok()
                .and_then(|e| e.dyn_into::<HtmlElement>().ok())
            else {
                continue;
            };
            el.set_class_name("shell");
            let _ = el.set_attribute("data-shell", &i.to_string());
            let _ = el
                .style()
                .set_property("left", &format!("{}%", slot_left_pct(i, count)));

            let game_ref = game.clone();
            let handler = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                // Outside Guessing the sim counts this as a tap-anywhere
                event.stop_propagation();
                game_ref.borrow_mut().input.guess = Some(i);
            });
            let _ = el.add_event_listener_with_callback("pointerdown", handler.as_ref().unchecked_ref());

            let _ = layer.append_child(&el);
            shells.push(el);
            handlers.push(handler);
        }

        let mut g = game.borrow_mut();
        g.shells = shells;
        g.shell_handlers = handlers;
        log::info!("Built {} shells", count);
    }

    /// Reflect simulation events in the DOM
    fn apply_events(game: &Rc<RefCell<Game>>, document: &Document, events: Vec<GameEvent>) {
        for event in events {
            {
                let g = game.borrow();
                if let Some(effect) = SoundEffect::for_event(&event) {
                    g.audio.play(effect);
                }
            }

            match event {
                GameEvent::LayoutRebuilt { count } => build_shells(game, document, count),
                GameEvent::TitleShown => {
                    show(document, "loadingScreen", false);
                    show(document, "titleScreen", true);
                }
                GameEvent::PhaseChanged(phase) => apply_phase(game, document, phase),
                GameEvent::PearlShown { shell } => game.borrow().place_pearl(document, shell),
                GameEvent::PearlHidden => {
                    if let Some(pearl) = html_by_id(document, "pearl") {
                        let _ = pearl.style().set_property("opacity", "0");
                    }
                }
                GameEvent::SwapStarted {
                    shell_a,
                    shell_b,
                    ticks,
                } => {
                    let g = game.borrow();
                    let secs = ticks as f32 / SIM_HZ as f32;
                    if g.settings.effective_lift() {
                        g.set_class(shell_a, "lift", true);
                        g.set_class(shell_b, "lift", true);
                    }
                    g.place_shell(shell_a, secs);
                    g.place_shell(shell_b, secs);
                }
                GameEvent::SwapFinished { shell_a, shell_b } => {
                    let g = game.borrow();
                    g.set_class(shell_a, "lift", false);
                    g.set_class(shell_b, "lift", false);
                }
                GameEvent::ShellsEliminated(gone) => {
                    let g = game.borrow();
                    for shell in gone {
                        g.set_class(shell, "gone", true);
                    }
                }
                GameEvent::GuessResolved {
                    guessed, outcome, ..
                } => {
                    let g = game.borrow();
                    match outcome {
                        Outcome::Correct => g.set_class(guessed, "win", true),
                        Outcome::Shielded => g.set_class(guessed, "blocked", true),
                        Outcome::Wrong => {
                            if g.settings.effective_flash() {
                                if let Some(overlay) = document.get_element_by_id("overlay") {
                                    let _ = overlay.class_list().add_1("flash");
                                }
                            }
                        }
                    }
                }
                GameEvent::NewBest(score) => {
                    let mut g = game.borrow_mut();
                    if g.high_score.submit(score) {
                        g.high_score.save();
                    }
                }
                GameEvent::LifelineRejected(err) => {
                    log::info!("{}", err);
                }
                _ => {}
            }
        }
    }

    fn apply_phase(game: &Rc<RefCell<Game>>, document: &Document, phase: GamePhase) {
        match phase {
            GamePhase::Loading => {
                show(document, "loadingScreen", true);
                show(document, "titleScreen", false);
                show(document, "gameOver", false);
            }
            GamePhase::Title => {
                show(document, "gameOver", false);
                show(document, "titleScreen", true);
            }
            GamePhase::Lockout => show(document, "titleScreen", false),
            GamePhase::Ready => {
                // Fresh round: clear per-round shell marks
                let g = game.borrow();
                for shell in 0..g.shells.len() {
                    for class in ["win", "blocked", "gone", "lift"] {
                        g.set_class(shell, class, false);
                    }
                }
            }
            GamePhase::GameOver => {
                if let Some(overlay) = document.get_element_by_id("overlay") {
                    let _ = overlay.class_list().remove_1("flash");
                }
                show(document, "gameOver", true);
            }
            GamePhase::Paused => show(document, "pauseMenu", true),
            _ => {}
        }
        if phase != GamePhase::Paused {
            show(document, "pauseMenu", false);
        }
    }

    fn setup_input_handlers(document: &Document, game: Rc<RefCell<Game>>) {
        // Tap anywhere
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                game.borrow_mut().input.tap = true;
            });
            let _ = document
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "Enter" => g.input.tap = true,
                    "Escape" | "p" | "P" => g.input.pause = true,
                    "1" => g.input.lifeline = Some(LifelineKind::SlowDown),
                    "2" => g.input.lifeline = Some(LifelineKind::Shield),
                    "3" => g.input.lifeline = Some(LifelineKind::FiftyFifty),
                    "4" => g.input.lifeline = Some(LifelineKind::Reveal),
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_lifeline_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for kind in LifelineKind::ALL {
            let id = format!("btn-{}", kind.as_str());
            let Some(btn) = document.get_element_by_id(&id) else {
                log::warn!("Missing lifeline button #{}", id);
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.stop_propagation();
                game.borrow_mut().input.lifeline = Some(kind);
            });
            let _ = btn.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_reset_button(document: &Document, game: Rc<RefCell<Game>>) {
        if let Some(btn) = document.get_element_by_id("btnReset") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.stop_propagation();
                game.borrow_mut().input.reset = true;
                log::info!("Reset requested");
            });
            let _ = btn.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_pause_menu(document: &Document, game: Rc<RefCell<Game>>) {
        // Resume button
        if let Some(btn) = document.get_element_by_id("btn-resume") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.stop_propagation();
                game.borrow_mut().input.pause = true; // Toggle back to playing
            });
            let _ = btn.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pace preset cycle
        if let Some(btn) = document.get_element_by_id("btn-pace") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.stop_propagation();
                let mut g = game.borrow_mut();
                g.settings.pace = g.settings.pace.next();
                g.state.pace = g.settings.pace.multiplier();
                g.settings.save();
                log::info!("Pace set to {}", g.settings.pace.as_str());
            });
            let _ = btn.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Reduced motion toggle
        if let Some(btn) = document.get_element_by_id("btn-motion") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.stop_propagation();
                let mut g = game.borrow_mut();
                g.settings.reduced_motion = !g.settings.reduced_motion;
                g.settings.save();
            });
            let _ = btn.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        let should_pause = |g: &Game| {
            g.settings.pause_on_blur
                && !matches!(
                    g.state.phase,
                    GamePhase::Paused | GamePhase::Loading | GamePhase::Title | GamePhase::GameOver
                )
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if should_pause(&g) {
                        g.input.pause = true;
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if should_pause(&g) {
                    g.input.pause = true;
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let document = web_sys::window().and_then(|w| w.document());

        let events = {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.state.drain_events()
        };

        if let Some(document) = document {
            apply_events(&game, &document, events);
            game.borrow().update_hud(&document);
        }

        request_animation_frame(game);
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
    log::info!("Pearl Shell (native) starting...");
    log::info!("Native mode is a headless autoplay demo - serve the wasm build to play");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        });
    // Optional pace preset: relaxed, normal or brisk
    let pace = std::env::args().nth(2).and_then(|s| pearl_shell::Pace::from_str(&s));

    autoplay::run(seed, pace);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless bot that plays one full lap of the ladder, then misses on purpose
#[cfg(not(target_arch = "wasm32"))]
mod autoplay {
    use pearl_shell::sim::{GameEvent, GamePhase, GameState, LifelineKind, TickInput, tick};
    use pearl_shell::{HighScore, Pace, Settings};

    /// Give up after this many ticks (about 20 minutes of game time)
    const MAX_TICKS: u64 = 120 * 60 * 20;

    pub fn run(seed: u64, pace: Option<Pace>) {
        let mut settings = Settings::load();
        if let Some(pace) = pace {
            settings.pace = pace;
        }
        let mut high_score = HighScore::load();
        let mut state = GameState::new(seed)
            .with_pace(settings.pace.multiplier())
            .with_best(high_score.best);
        log::info!("Autoplay seed {} ({} pace)", seed, settings.pace.as_str());

        let mut swaps = 0u32;
        let mut started = false;
        while state.time_ticks < MAX_TICKS {
            let input = next_input(&state);
            if input.tap && state.phase == GamePhase::Title {
                if started {
                    break;
                }
                started = true;
            }
            tick(&mut state, &input);

            for event in state.drain_events() {
                match event {
                    GameEvent::SwapStarted { .. } => swaps += 1,
                    GameEvent::StageUp { stage } => {
                        log::info!("Stage {} after {} swaps", stage, swaps)
                    }
                    GameEvent::LapComplete { tier } => {
                        log::info!("Lap complete, tier {} ({:?})", tier, state.theme())
                    }
                    GameEvent::LifelineGranted(kind) => log::info!("Earned {}", kind.as_str()),
                    GameEvent::GameOver { score } => {
                        log::info!("Game over with {} points", score);
                        if high_score.submit(score) {
                            high_score.save();
                        }
                    }
                    _ => {}
                }
            }
        }

        log::info!(
            "Autoplay finished: best {}, {} ticks, {} swaps",
            high_score.best,
            state.time_ticks,
            swaps
        );
    }

    /// Perfect play for a lap, using lifelines along the way, then a deliberate miss
    fn next_input(state: &GameState) -> TickInput {
        let mut input = TickInput::default();
        match state.phase {
            GamePhase::Title | GamePhase::Ready | GamePhase::GameOver => input.tap = true,
            GamePhase::Guessing if !state.revealing() => {
                for kind in [LifelineKind::FiftyFifty, LifelineKind::Reveal] {
                    if state.can_use_lifeline(kind).is_ok() {
                        input.lifeline = Some(kind);
                        return input;
                    }
                }
                let pearl = state.round.pearl;
                input.guess = if state.progress.tier == 0 {
                    Some(pearl)
                } else {
                    state.live_shells().into_iter().find(|&s| s != pearl)
                };
            }
            GamePhase::Shuffling if state.can_use_lifeline(LifelineKind::SlowDown).is_ok() => {
                input.lifeline = Some(LifelineKind::SlowDown);
            }
            _ => {}
        }
        input
    }
}
