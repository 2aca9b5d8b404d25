//! Fixed timestep simulation tick
//!
//! Drives the round lifecycle: loading → title → lockout → ready → watch →
//! shuffling → guessing → resolving, and back to ready or on to game over.
//! All waiting is a countdown in ticks; input arriving in a phase that does
//! not accept it is ignored.

use super::ladder::ShuffleParams;
use super::lifelines::LifelineKind;
use super::shuffle::{MoveStage, ShuffleScript, scaled_ticks};
use super::state::{GameEvent, GamePhase, GameState, Outcome, ShellId};
use crate::consts::*;
use crate::ms_to_ticks;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer down anywhere on the document
    pub tap: bool,
    /// Pointer down on a shell; counts as a tap outside `Guessing`
    pub guess: Option<ShellId>,
    /// Lifeline button pressed
    pub lifeline: Option<LifelineKind>,
    /// Reset button
    pub reset: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    if input.reset {
        reset(state);
        return;
    }

    // Shells cover most of the board, so a shell press is also a tap
    let tap = input.tap || (input.guess.is_some() && state.phase != GamePhase::Guessing);

    // Handle pause toggle; any tap resumes
    if input.pause || (tap && state.phase == GamePhase::Paused) {
        match state.phase {
            GamePhase::Paused => {
                let resume = state.resume_phase.take().unwrap_or(GamePhase::Ready);
                state.phase = resume;
                state.emit(GameEvent::PhaseChanged(resume));
                log::info!("Resumed ({:?})", resume);
                return;
            }
            GamePhase::Loading | GamePhase::Title | GamePhase::GameOver => {}
            other => {
                state.resume_phase = Some(other);
                state.phase = GamePhase::Paused;
                state.emit(GameEvent::PhaseChanged(GamePhase::Paused));
                log::info!("Paused ({:?})", other);
                return;
            }
        }
    }

    // Timers frozen while paused
    if state.phase == GamePhase::Paused {
        return;
    }

    state.time_ticks += 1;

    if let Some(kind) = input.lifeline {
        if let Err(err) = state.use_lifeline(kind) {
            log::warn!("Lifeline rejected: {}", err);
            state.emit(GameEvent::LifelineRejected(err));
        }
    }

    match state.phase {
        GamePhase::Loading => {
            if countdown(state) {
                state.enter(GamePhase::Title, None);
            } else if state.phase_ticks == ms_to_ticks(FADE_MS) {
                state.emit(GameEvent::TitleShown);
            }
        }

        GamePhase::Title => {
            if tap {
                state.enter(GamePhase::Lockout, Some(POST_TITLE_LOCK_MS));
            }
        }

        GamePhase::Lockout => {
            if countdown(state) {
                enter_ready(state);
            }
        }

        GamePhase::Ready => {
            if tap && !state.busy {
                start_round(state);
            }
        }

        GamePhase::Watch => {
            if countdown(state) {
                start_shuffle(state);
            }
        }

        GamePhase::Shuffling => advance_shuffle(state),

        GamePhase::Guessing => {
            if state.round.reveal_ticks > 0 {
                state.round.reveal_ticks -= 1;
                if state.round.reveal_ticks == 0 {
                    state.busy = false;
                    state.emit(GameEvent::PearlHidden);
                }
                return;
            }
            if let Some(shell) = input.guess {
                resolve_guess(state, shell);
            }
        }

        GamePhase::Resolving => {
            if countdown(state) {
                finish_resolve(state);
            }
        }

        GamePhase::GameOver => {
            if tap {
                state.enter(GamePhase::Title, None);
            }
        }

        GamePhase::Paused => {}
    }
}

/// Decrement the phase timer. Returns true when it expires.
fn countdown(state: &mut GameState) -> bool {
    state.phase_ticks = state.phase_ticks.saturating_sub(1);
    state.phase_ticks == 0
}

/// Start over from the logo screen with a fresh run
pub fn reset(state: &mut GameState) {
    state.new_run();
    state.resume_phase = None;
    state.enter(GamePhase::Loading, Some(LOADING_HOLD_MS + FADE_MS));
    log::info!("Game reset");
}

/// Prepare the next round (pearl placed) and wait for a tap
fn enter_ready(state: &mut GameState) {
    state.begin_round();
    state.enter(GamePhase::Ready, None);
}

fn start_round(state: &mut GameState) {
    let pearl = state.round.pearl;
    log::info!(
        "Round start: {} shells, pearl under shell {} (slot {:?})",
        state.shell_count(),
        pearl,
        state.layout.slot_of(pearl)
    );
    state.enter(GamePhase::Watch, Some(WATCH_MS));
    state.emit(GameEvent::PearlShown { shell: pearl });
}

fn start_shuffle(state: &mut GameState) {
    state.emit(GameEvent::PearlHidden);

    let shells = state.shell_count();
    let params = ShuffleParams::for_progress(state.progress.difficulty(), shells);
    let script = ShuffleScript::generate(state.rng(), shells, &params);
    log::debug!(
        "Shuffle: {} swaps, base {:.0}ms, pause chance {:.2}",
        script.moves.len(),
        params.swap_ms,
        params.pause_chance
    );
    state.shuffle = Some(script);
    state.enter(GamePhase::Shuffling, None);
}

/// Step the shuffle script by one tick
fn advance_shuffle(state: &mut GameState) {
    let Some(mut script) = state.shuffle.take() else {
        state.enter(GamePhase::Guessing, None);
        return;
    };

    let scale = if state.round.slowed {
        state.pace * SLOW_FACTOR
    } else {
        state.pace
    };

    match script.stage {
        MoveStage::Pending => {
            if let Some(m) = script.current().copied() {
                let ticks = scaled_ticks(m.swap_ms, scale);
                // The permutation changes as the swap starts; the view animates toward it
                if let Some((shell_a, shell_b)) = state.layout.swap_slots(m.slot_a, m.slot_b) {
                    state.emit(GameEvent::SwapStarted {
                        shell_a,
                        shell_b,
                        ticks,
                    });
                }
                script.stage = MoveStage::Swapping(ticks);
            }
        }
        MoveStage::Swapping(t) if t > 1 => script.stage = MoveStage::Swapping(t - 1),
        MoveStage::Swapping(_) => {
            if let Some(m) = script.current().copied() {
                // Shells have traded slots by now
                if let (Some(shell_a), Some(shell_b)) =
                    (state.layout.shell_at(m.slot_b), state.layout.shell_at(m.slot_a))
                {
                    state.emit(GameEvent::SwapFinished { shell_a, shell_b });
                }
                if m.pause_ms > 0 {
                    script.stage = MoveStage::Pausing(scaled_ticks(m.pause_ms, scale));
                } else {
                    script.cursor += 1;
                    script.stage = MoveStage::Pending;
                }
            }
        }
        MoveStage::Pausing(t) if t > 1 => script.stage = MoveStage::Pausing(t - 1),
        MoveStage::Pausing(_) => {
            script.cursor += 1;
            script.stage = MoveStage::Pending;
        }
    }

    if script.is_finished() {
        state.enter(GamePhase::Guessing, None);
    } else {
        state.shuffle = Some(script);
    }
}

fn resolve_guess(state: &mut GameState, shell: ShellId) {
    if shell >= state.shell_count() || state.round.eliminated.contains(&shell) {
        log::debug!("Ignoring guess on shell {}", shell);
        return;
    }

    let pearl = state.round.pearl;
    let outcome = if shell == pearl {
        Outcome::Correct
    } else if state.shield_armed {
        state.shield_armed = false;
        Outcome::Shielded
    } else {
        Outcome::Wrong
    };
    log::info!("Guess shell {} (pearl {}): {:?}", shell, pearl, outcome);

    state.round.outcome = Some(outcome);
    state.emit(GameEvent::PearlShown { shell: pearl });
    state.emit(GameEvent::GuessResolved {
        guessed: shell,
        pearl,
        outcome,
    });

    let hold_ms = match outcome {
        Outcome::Correct => {
            apply_win(state);
            CORRECT_HOLD_MS
        }
        Outcome::Shielded => SHIELD_HOLD_MS,
        Outcome::Wrong => WRONG_FLASH_MS,
    };
    state.enter(GamePhase::Resolving, Some(hold_ms));
}

/// Score the win and climb the ladder; layout changes wait until the pearl is hidden
fn apply_win(state: &mut GameState) {
    let advance = state.progress.record_win(POINTS_PER_WIN, LAP_BONUS);

    if let Some(tier) = advance.lap_complete {
        log::info!("Lap complete! Tier {} ({:?})", tier, state.theme());
        state.emit(GameEvent::LapComplete { tier });
    }
    if let Some(stage) = advance.stage_up {
        log::info!("Stage up: {} shells", stage);
        state.emit(GameEvent::StageUp { stage });
    }
    if let Some(kind) = advance.grant {
        if state.lifelines.grant(kind) {
            state.emit(GameEvent::LifelineGranted(kind));
        }
    }
}

fn finish_resolve(state: &mut GameState) {
    state.emit(GameEvent::PearlHidden);

    match state.round.outcome {
        Some(Outcome::Correct) | Some(Outcome::Shielded) => {
            if state.shell_count() != state.progress.stage {
                state.rebuild_layout(state.progress.stage);
            }
            enter_ready(state);
        }
        Some(Outcome::Wrong) | None => game_over(state),
    }
}

fn game_over(state: &mut GameState) {
    let score = state.progress.score;
    if score > state.best {
        state.best = score;
        log::info!("New best: {}", score);
        state.emit(GameEvent::NewBest(score));
    }
    log::info!("Game over: score {}", score);

    state.last_score = score;
    state.new_run();
    state.emit(GameEvent::GameOver { score });
    state.enter(GamePhase::GameOver, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ladder::{LAP_LEN, MAX_SHELLS, MIN_SHELLS, WINS_PER_STAGE};

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn tap() -> TickInput {
        TickInput {
            tap: true,
            ..Default::default()
        }
    }

    fn guess(shell: ShellId) -> TickInput {
        TickInput {
            guess: Some(shell),
            ..Default::default()
        }
    }

    fn lifeline(kind: LifelineKind) -> TickInput {
        TickInput {
            lifeline: Some(kind),
            ..Default::default()
        }
    }

    /// Idle-tick until `phase` is reached; returns ticks spent
    fn run_until(state: &mut GameState, phase: GamePhase) -> u32 {
        let mut ticks = 0;
        while state.phase != phase {
            tick(state, &idle());
            ticks += 1;
            assert!(ticks < 100_000, "stuck in {:?}", state.phase);
        }
        ticks
    }

    /// Boot through loading, title and lockout
    fn ready_state(seed: u64) -> GameState {
        boot(GameState::new(seed))
    }

    fn boot(mut state: GameState) -> GameState {
        run_until(&mut state, GamePhase::Title);
        tick(&mut state, &tap());
        run_until(&mut state, GamePhase::Ready);
        state
    }

    fn pause() -> TickInput {
        TickInput {
            pause: true,
            ..Default::default()
        }
    }

    /// Play one round through to Resolving with the given guess
    fn play_round(state: &mut GameState, pick: impl Fn(&GameState) -> ShellId) {
        assert_eq!(state.phase, GamePhase::Ready);
        tick(state, &tap());
        run_until(state, GamePhase::Guessing);
        let shell = pick(state);
        tick(state, &guess(shell));
        assert_eq!(state.phase, GamePhase::Resolving);
    }

    fn wrong_shell(state: &GameState) -> ShellId {
        (state.round.pearl + 1) % state.shell_count()
    }

    #[test]
    fn test_loading_to_title() {
        let mut state = GameState::new(1);
        let ticks = run_until(&mut state, GamePhase::Title);
        assert_eq!(ticks, ms_to_ticks(LOADING_HOLD_MS + FADE_MS));
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::TitleShown));
        assert!(events.contains(&GameEvent::PhaseChanged(GamePhase::Title)));
    }

    #[test]
    fn test_title_lockout_ready() {
        let mut state = GameState::new(1);
        run_until(&mut state, GamePhase::Title);

        // Idle ticks do not leave the title
        tick(&mut state, &idle());
        assert_eq!(state.phase, GamePhase::Title);

        tick(&mut state, &tap());
        assert_eq!(state.phase, GamePhase::Lockout);
        assert_eq!(state.status_text(), "Get ready…");

        // Taps during the lockout are ignored
        for _ in 0..10 {
            tick(&mut state, &tap());
        }
        assert_eq!(state.phase, GamePhase::Lockout);

        let ticks = run_until(&mut state, GamePhase::Ready);
        assert_eq!(ticks + 10, ms_to_ticks(POST_TITLE_LOCK_MS));
    }

    #[test]
    fn test_round_sequence() {
        let mut state = ready_state(7);
        state.drain_events();
        let pearl = state.round.pearl;

        tick(&mut state, &tap());
        assert_eq!(state.phase, GamePhase::Watch);
        assert!(state.busy);
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::PearlShown { shell: pearl })
        );

        run_until(&mut state, GamePhase::Shuffling);
        assert!(state.shuffle.is_some());
        assert!(state.busy);

        run_until(&mut state, GamePhase::Guessing);
        assert!(!state.busy);
        assert!(state.layout.is_permutation());
        // The pearl stays with its shell through the shuffle
        assert_eq!(state.round.pearl, pearl);

        let swaps = state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::SwapStarted { .. }))
            .count();
        assert!(swaps >= 5);
    }

    #[test]
    fn test_correct_guess_scores() {
        let mut state = ready_state(11);
        play_round(&mut state, |s| s.round.pearl);
        assert_eq!(state.progress.score, POINTS_PER_WIN);
        assert_eq!(state.status_text(), "Correct!");

        let ticks = run_until(&mut state, GamePhase::Ready);
        assert_eq!(ticks, ms_to_ticks(CORRECT_HOLD_MS));
        assert_eq!(state.status_text(), "Tap anywhere for next round");
    }

    #[test]
    fn test_taps_ignored_outside_guessing() {
        let mut state = ready_state(3);
        tick(&mut state, &tap());
        run_until(&mut state, GamePhase::Shuffling);

        let pearl = state.round.pearl;
        tick(&mut state, &guess(pearl));
        tick(&mut state, &tap());
        assert_eq!(state.phase, GamePhase::Shuffling);
        assert_eq!(state.progress.score, 0);
    }

    #[test]
    fn test_stage_up_after_wins() {
        let mut state = ready_state(21);
        for _ in 0..WINS_PER_STAGE {
            play_round(&mut state, |s| s.round.pearl);
            // Layout is kept while the pearl is on display
            assert_eq!(state.shell_count(), 3);
            run_until(&mut state, GamePhase::Ready);
        }
        assert_eq!(state.progress.stage, 4);
        assert_eq!(state.shell_count(), 4);
        assert_eq!(state.lifelines.charges(LifelineKind::SlowDown), 2);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::StageUp { stage: 4 }));
        assert!(events.contains(&GameEvent::LayoutRebuilt { count: 4 }));
        assert!(events.contains(&GameEvent::LifelineGranted(LifelineKind::SlowDown)));
        assert!(state.round.pearl < 4);
    }

    #[test]
    fn test_wrong_guess_ends_run() {
        let mut state = ready_state(5).with_best(5);
        play_round(&mut state, |s| s.round.pearl);
        run_until(&mut state, GamePhase::Ready);
        play_round(&mut state, wrong_shell);
        assert_eq!(state.status_text(), "Wrong! Game over");

        let ticks = run_until(&mut state, GamePhase::GameOver);
        assert_eq!(ticks, ms_to_ticks(WRONG_FLASH_MS));
        assert_eq!(state.progress.score, 0);
        assert_eq!(state.last_score, POINTS_PER_WIN);
        assert_eq!(state.best, POINTS_PER_WIN);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::NewBest(POINTS_PER_WIN)));
        assert!(events.contains(&GameEvent::GameOver {
            score: POINTS_PER_WIN
        }));

        tick(&mut state, &tap());
        assert_eq!(state.phase, GamePhase::Title);
    }

    #[test]
    fn test_shield_absorbs_wrong_guess() {
        let mut state = ready_state(9);
        tick(&mut state, &lifeline(LifelineKind::Shield));
        assert!(state.shield_armed);

        play_round(&mut state, |s| s.round.pearl);
        // Shield persists through a correct guess
        assert!(state.shield_armed);
        run_until(&mut state, GamePhase::Ready);

        play_round(&mut state, wrong_shell);
        assert!(!state.shield_armed);
        assert_eq!(state.round.outcome, Some(Outcome::Shielded));
        run_until(&mut state, GamePhase::Ready);
        assert_eq!(state.progress.score, POINTS_PER_WIN);
        assert_eq!(state.progress.total_wins, 1);
    }

    #[test]
    fn test_slow_down_stretches_shuffle() {
        let shuffle_ticks = |slow: bool| {
            let mut state = ready_state(1234);
            if slow {
                tick(&mut state, &lifeline(LifelineKind::SlowDown));
                assert!(state.round.slowed);
            }
            tick(&mut state, &tap());
            run_until(&mut state, GamePhase::Shuffling);
            run_until(&mut state, GamePhase::Guessing)
        };
        let normal = shuffle_ticks(false);
        let slowed = shuffle_ticks(true);
        assert!(slowed > normal, "slowed {} vs normal {}", slowed, normal);
    }

    #[test]
    fn test_pace_scales_shuffle() {
        let shuffle_ticks = |pace: f32| {
            let mut state = boot(GameState::new(1234).with_pace(pace));
            tick(&mut state, &tap());
            run_until(&mut state, GamePhase::Shuffling);
            run_until(&mut state, GamePhase::Guessing)
        };
        let brisk = shuffle_ticks(0.8);
        let normal = shuffle_ticks(1.0);
        let relaxed = shuffle_ticks(1.25);
        assert!(brisk < normal, "brisk {} vs normal {}", brisk, normal);
        assert!(relaxed > normal, "relaxed {} vs normal {}", relaxed, normal);
    }

    #[test]
    fn test_full_lap() {
        let mut state = ready_state(555);
        for _ in 0..LAP_LEN - 1 {
            play_round(&mut state, |s| s.round.pearl);
            run_until(&mut state, GamePhase::Ready);
        }
        assert_eq!(state.shell_count(), MAX_SHELLS);
        assert_eq!(state.lifelines.charges(LifelineKind::Shield), 2);
        state.drain_events();

        play_round(&mut state, |s| s.round.pearl);
        // Seven shells stay on the board while the pearl is shown
        assert_eq!(state.shell_count(), MAX_SHELLS);
        run_until(&mut state, GamePhase::Ready);

        let events = state.drain_events();
        assert!(events.contains(&GameEvent::LapComplete { tier: 1 }));
        assert!(events.contains(&GameEvent::LayoutRebuilt { count: MIN_SHELLS }));
        assert!(events.contains(&GameEvent::LifelineGranted(LifelineKind::Shield)));
        assert_eq!(state.shell_count(), MIN_SHELLS);
        assert_eq!(state.progress.tier, 1);
        assert_eq!(state.lifelines.charges(LifelineKind::Shield), 3);
        assert_eq!(
            state.progress.score,
            POINTS_PER_WIN * LAP_LEN as u64 + LAP_BONUS
        );
        assert!(state.round.pearl < MIN_SHELLS);
    }

    #[test]
    fn test_reveal_gates_guesses() {
        let mut state = ready_state(77);
        state.lifelines.grant(LifelineKind::Reveal);
        tick(&mut state, &tap());
        run_until(&mut state, GamePhase::Guessing);

        tick(&mut state, &lifeline(LifelineKind::Reveal));
        assert!(state.revealing());
        assert!(state.busy);

        let pearl = state.round.pearl;
        tick(&mut state, &guess(pearl));
        assert_eq!(state.phase, GamePhase::Guessing);

        run_until_idle_reveal(&mut state);
        assert!(!state.busy);
        tick(&mut state, &guess(pearl));
        assert_eq!(state.phase, GamePhase::Resolving);
    }

    fn run_until_idle_reveal(state: &mut GameState) {
        while state.revealing() {
            tick(state, &idle());
        }
    }

    #[test]
    fn test_eliminated_shell_cannot_be_guessed() {
        let mut state = ready_state(31);
        state.lifelines.grant(LifelineKind::FiftyFifty);
        tick(&mut state, &tap());
        run_until(&mut state, GamePhase::Guessing);
        tick(&mut state, &lifeline(LifelineKind::FiftyFifty));

        let gone = state.round.eliminated[0];
        tick(&mut state, &guess(gone));
        assert_eq!(state.phase, GamePhase::Guessing);
        // Out of range guesses are ignored too
        tick(&mut state, &guess(99));
        assert_eq!(state.phase, GamePhase::Guessing);
    }

    #[test]
    fn test_lifeline_rejected_event() {
        let mut state = ready_state(2);
        state.drain_events();
        tick(&mut state, &lifeline(LifelineKind::Reveal));
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::LifelineRejected(_))));
        assert_eq!(state.phase, GamePhase::Ready);
    }

    #[test]
    fn test_pause_freezes_timers() {
        let mut state = ready_state(4);
        tick(&mut state, &tap());
        let left = state.phase_ticks;

        tick(&mut state, &pause());
        assert_eq!(state.phase, GamePhase::Paused);
        for _ in 0..500 {
            tick(&mut state, &idle());
        }
        assert_eq!(state.phase_ticks, left);

        tick(&mut state, &pause());
        assert_eq!(state.phase, GamePhase::Watch);
    }

    #[test]
    fn test_tap_resumes_pause() {
        let mut state = ready_state(4);
        tick(&mut state, &pause());
        assert_eq!(state.phase, GamePhase::Paused);

        tick(&mut state, &tap());
        assert_eq!(state.phase, GamePhase::Ready);
        // The resuming tap does not also start the round
        assert!(!state.busy);

        tick(&mut state, &tap());
        assert_eq!(state.phase, GamePhase::Watch);

        // A press on a shell resumes too
        tick(&mut state, &pause());
        tick(&mut state, &guess(0));
        assert_eq!(state.phase, GamePhase::Watch);
    }

    #[test]
    fn test_shell_press_counts_as_tap() {
        let mut state = GameState::new(8);
        run_until(&mut state, GamePhase::Title);
        tick(&mut state, &guess(1));
        assert_eq!(state.phase, GamePhase::Lockout);

        run_until(&mut state, GamePhase::Ready);
        tick(&mut state, &guess(0));
        assert_eq!(state.phase, GamePhase::Watch);
        assert_eq!(state.progress.score, 0);
    }

    #[test]
    fn test_reset_returns_to_loading() {
        let mut state = ready_state(6);
        play_round(&mut state, |s| s.round.pearl);
        let reset_input = TickInput {
            reset: true,
            ..Default::default()
        };
        tick(&mut state, &reset_input);
        assert_eq!(state.phase, GamePhase::Loading);
        assert_eq!(state.progress.score, 0);
        assert_eq!(state.shell_count(), 3);
        run_until(&mut state, GamePhase::Title);
    }

    #[test]
    fn test_determinism() {
        let mut a = ready_state(99999);
        let mut b = ready_state(99999);
        for state in [&mut a, &mut b] {
            tick(state, &tap());
            run_until(state, GamePhase::Guessing);
        }
        assert_eq!(a.round.pearl, b.round.pearl);
        assert_eq!(a.layout, b.layout);
        assert_eq!(a.time_ticks, b.time_ticks);
    }
}
