//! Game state and core simulation types
//!
//! Everything the round state machine reads or writes lives here. The view
//! layer only reads `GameState` and drains `GameEvent`s.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ladder::{MIN_SHELLS, Progress, Theme};
use super::lifelines::{LifelineError, LifelineKind, Lifelines, UsedThisRound};
use super::shuffle::ShuffleScript;
use crate::consts::*;
use crate::ms_to_ticks;

/// Shell identity (stable across swaps)
pub type ShellId = usize;

/// Current phase of the round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Logo screen, then title fade-in
    Loading,
    /// Title screen, waiting for a tap
    Title,
    /// Short input lockout after the title
    Lockout,
    /// Waiting for a tap to start the next round
    Ready,
    /// Pearl visible under its shell
    Watch,
    /// Shuffle script playing
    Shuffling,
    /// Waiting for the player to pick a shell
    Guessing,
    /// Pearl revealed, outcome on display
    Resolving,
    /// Run ended, waiting for a tap
    GameOver,
    /// Timers frozen
    Paused,
}

/// How a guess turned out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Correct,
    /// Wrong, absorbed by the shield
    Shielded,
    Wrong,
}

/// Events for the presentation layer (drained each frame)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PhaseChanged(GamePhase),
    /// Loading hold elapsed, title screen fading in
    TitleShown,
    /// Shell row rebuilt with a new count (identity layout)
    LayoutRebuilt { count: usize },
    PearlShown { shell: ShellId },
    PearlHidden,
    SwapStarted { shell_a: ShellId, shell_b: ShellId, ticks: u32 },
    SwapFinished { shell_a: ShellId, shell_b: ShellId },
    ShellsEliminated(Vec<ShellId>),
    GuessResolved { guessed: ShellId, pearl: ShellId, outcome: Outcome },
    StageUp { stage: usize },
    LapComplete { tier: u32 },
    LifelineUsed(LifelineKind),
    LifelineGranted(LifelineKind),
    LifelineRejected(LifelineError),
    NewBest(u64),
    GameOver { score: u64 },
}

/// Permutation mapping shell identity to visual slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellLayout {
    slots: Vec<usize>,
}

impl ShellLayout {
    /// Identity layout: shell i sits in slot i
    pub fn new(count: usize) -> Self {
        Self {
            slots: (0..count).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot currently holding `shell`, or None for an unknown shell
    pub fn slot_of(&self, shell: ShellId) -> Option<usize> {
        self.slots.get(shell).copied()
    }

    pub fn shell_at(&self, slot: usize) -> Option<ShellId> {
        self.slots.iter().position(|&s| s == slot)
    }

    /// Exchange the shells occupying slots `a` and `b`.
    /// Returns the two shell ids, or None if a slot is out of range.
    pub fn swap_slots(&mut self, a: usize, b: usize) -> Option<(ShellId, ShellId)> {
        let shell_a = self.shell_at(a)?;
        let shell_b = self.shell_at(b)?;
        self.slots.swap(shell_a, shell_b);
        Some((shell_a, shell_b))
    }

    pub fn is_permutation(&self) -> bool {
        let mut seen = vec![false; self.slots.len()];
        for &s in &self.slots {
            if s >= seen.len() || seen[s] {
                return false;
            }
            seen[s] = true;
        }
        true
    }
}

/// Per-round flags, cleared when a new round starts
#[derive(Debug, Clone, Default)]
pub struct RoundState {
    pub pearl: ShellId,
    /// Slow-down active for moves not yet started
    pub slowed: bool,
    /// Shells removed by 50/50 (cannot be guessed)
    pub eliminated: Vec<ShellId>,
    /// Ticks left on an active reveal
    pub reveal_ticks: u32,
    pub used: UsedThisRound,
    /// Outcome pending display in Resolving
    pub outcome: Option<Outcome>,
}

/// Complete game state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    pub phase: GamePhase,
    /// Phase to return to when unpaused
    pub resume_phase: Option<GamePhase>,
    /// Ticks remaining in the current timed phase
    pub phase_ticks: u32,
    /// Reentrancy guard: no taps or guesses while set
    pub busy: bool,
    pub progress: Progress,
    /// Best score seen (loaded from storage by the frontend)
    pub best: u64,
    /// Final score of the last finished run
    pub last_score: u64,
    pub lifelines: Lifelines,
    /// Survives across rounds until it absorbs a wrong guess
    pub shield_armed: bool,
    pub layout: ShellLayout,
    pub round: RoundState,
    pub shuffle: Option<ShuffleScript>,
    /// Shuffle duration multiplier from settings
    pub pace: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game state with the given seed, starting on the logo screen
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Loading,
            resume_phase: None,
            phase_ticks: ms_to_ticks(LOADING_HOLD_MS + FADE_MS),
            busy: false,
            progress: Progress::default(),
            best: 0,
            last_score: 0,
            lifelines: Lifelines::default(),
            shield_armed: false,
            layout: ShellLayout::new(MIN_SHELLS),
            round: RoundState::default(),
            shuffle: None,
            pace: 1.0,
            time_ticks: 0,
            events: Vec::new(),
        };
        state.emit(GameEvent::LayoutRebuilt { count: MIN_SHELLS });
        state
    }

    /// Builder: set the pace multiplier
    pub fn with_pace(mut self, pace: f32) -> Self {
        self.pace = pace;
        self
    }

    /// Builder: set the stored best score
    pub fn with_best(mut self, best: u64) -> Self {
        self.best = best;
        self
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn shell_count(&self) -> usize {
        self.layout.len()
    }

    pub fn theme(&self) -> Theme {
        self.progress.theme()
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Enter a phase with an optional timer (ms)
    pub(crate) fn enter(&mut self, phase: GamePhase, ms: Option<u32>) {
        log::debug!("Phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.phase_ticks = ms.map(ms_to_ticks).unwrap_or(0);
        self.busy = matches!(
            phase,
            GamePhase::Watch | GamePhase::Shuffling | GamePhase::Resolving
        );
        self.emit(GameEvent::PhaseChanged(phase));
    }

    /// Start a fresh run: score 0, first stage, starting loadout
    pub fn new_run(&mut self) {
        self.progress = Progress::default();
        self.lifelines = Lifelines::default();
        self.shield_armed = false;
        self.round = RoundState::default();
        self.shuffle = None;
        self.rebuild_layout(MIN_SHELLS);
        log::info!("New run (best {})", self.best);
    }

    pub(crate) fn rebuild_layout(&mut self, count: usize) {
        self.layout = ShellLayout::new(count);
        self.emit(GameEvent::LayoutRebuilt { count });
    }

    /// Hide a fresh pearl under a random shell and clear round flags
    pub(crate) fn begin_round(&mut self) {
        let pearl = self.rng.random_range(0..self.layout.len());
        self.round = RoundState {
            pearl,
            ..RoundState::default()
        };
    }

    /// Shells that can still be guessed
    pub fn live_shells(&self) -> Vec<ShellId> {
        (0..self.layout.len())
            .filter(|s| !self.round.eliminated.contains(s))
            .collect()
    }

    /// True while a Reveal is showing the pearl
    pub fn revealing(&self) -> bool {
        self.phase == GamePhase::Guessing && self.round.reveal_ticks > 0
    }

    /// Check whether a lifeline may be used right now, without spending it
    pub fn can_use_lifeline(&self, kind: LifelineKind) -> Result<(), LifelineError> {
        let phase_ok = match kind {
            LifelineKind::SlowDown => matches!(
                self.phase,
                GamePhase::Ready | GamePhase::Watch | GamePhase::Shuffling
            ),
            LifelineKind::Shield => matches!(
                self.phase,
                GamePhase::Ready | GamePhase::Watch | GamePhase::Shuffling | GamePhase::Guessing
            ),
            LifelineKind::FiftyFifty | LifelineKind::Reveal => self.phase == GamePhase::Guessing,
        };
        if !phase_ok {
            return Err(LifelineError::WrongPhase(kind));
        }
        if self.revealing() {
            return Err(LifelineError::Busy);
        }
        if kind == LifelineKind::Shield && self.shield_armed {
            return Err(LifelineError::ShieldArmed);
        }
        if self.round.used.contains(kind) {
            return Err(LifelineError::AlreadyUsed(kind));
        }
        if self.lifelines.charges(kind) == 0 {
            return Err(LifelineError::NoCharges(kind));
        }
        Ok(())
    }

    /// Spend a charge and apply the lifeline's effect
    pub fn use_lifeline(&mut self, kind: LifelineKind) -> Result<(), LifelineError> {
        self.can_use_lifeline(kind)?;
        self.lifelines.spend(kind)?;
        self.round.used.insert(kind);

        match kind {
            LifelineKind::SlowDown => {
                self.round.slowed = true;
            }
            LifelineKind::Shield => {
                self.shield_armed = true;
            }
            LifelineKind::FiftyFifty => {
                let pearl = self.round.pearl;
                let wrong: Vec<ShellId> = self
                    .live_shells()
                    .into_iter()
                    .filter(|&s| s != pearl)
                    .collect();
                // Keep one wrong shell standing alongside the pearl
                let keep = wrong[self.rng.random_range(0..wrong.len())];
                let removed: Vec<ShellId> = wrong.into_iter().filter(|&s| s != keep).collect();
                self.round.eliminated.extend(removed.iter().copied());
                self.emit(GameEvent::ShellsEliminated(removed));
            }
            LifelineKind::Reveal => {
                self.round.reveal_ticks = ms_to_ticks(REVEAL_MS);
                self.busy = true;
                self.emit(GameEvent::PearlShown {
                    shell: self.round.pearl,
                });
            }
        }

        log::info!(
            "Lifeline {} used ({} left)",
            kind.as_str(),
            self.lifelines.charges(kind)
        );
        self.emit(GameEvent::LifelineUsed(kind));
        Ok(())
    }

    /// HUD message for the current phase
    pub fn status_text(&self) -> &'static str {
        match self.phase {
            GamePhase::Loading | GamePhase::Title => "",
            GamePhase::Lockout => "Get ready…",
            GamePhase::Ready if self.progress.total_wins == 0 => "Tap anywhere to start",
            GamePhase::Ready => "Tap anywhere for next round",
            GamePhase::Watch => "Watch the pearl…",
            GamePhase::Shuffling => "Shuffling…",
            GamePhase::Guessing if self.revealing() => "Look closely…",
            GamePhase::Guessing => "Pick a shell.",
            GamePhase::Resolving => match self.round.outcome {
                Some(Outcome::Correct) => "Correct!",
                Some(Outcome::Shielded) => "Shield saved you!",
                Some(Outcome::Wrong) | None => "Wrong! Game over",
            },
            GamePhase::GameOver => "Game over. Tap to play again",
            GamePhase::Paused => "Paused",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guessing_state(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.begin_round();
        state.enter(GamePhase::Guessing, None);
        state
    }

    #[test]
    fn test_layout_swap() {
        let mut layout = ShellLayout::new(3);
        assert_eq!(layout.swap_slots(0, 2), Some((0, 2)));
        assert_eq!(layout.slot_of(0), Some(2));
        assert_eq!(layout.slot_of(2), Some(0));
        assert_eq!(layout.shell_at(0), Some(2));
        // Shell 0 now sits in slot 2; swapping slots 2 and 1 moves it again
        assert_eq!(layout.swap_slots(2, 1), Some((0, 1)));
        assert_eq!(layout.slot_of(0), Some(1));
        assert!(layout.is_permutation());
        assert_eq!(layout.swap_slots(0, 9), None);
        // Unknown shells have no slot
        assert_eq!(layout.slot_of(3), None);
    }

    #[test]
    fn test_new_state() {
        let mut state = GameState::new(1);
        assert_eq!(state.phase, GamePhase::Loading);
        assert_eq!(state.shell_count(), MIN_SHELLS);
        assert!(!state.busy);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::LayoutRebuilt { count: MIN_SHELLS }]
        );
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_lifeline_wrong_phase() {
        let mut state = GameState::new(1);
        assert_eq!(
            state.use_lifeline(LifelineKind::SlowDown),
            Err(LifelineError::WrongPhase(LifelineKind::SlowDown))
        );
        // Rejection leaves charges alone
        assert_eq!(state.lifelines.charges(LifelineKind::SlowDown), 1);
    }

    #[test]
    fn test_fifty_fifty_leaves_two() {
        let mut state = guessing_state(42);
        state.rebuild_layout(7);
        state.begin_round();
        state.lifelines.grant(LifelineKind::FiftyFifty);
        state.use_lifeline(LifelineKind::FiftyFifty).unwrap();

        let live = state.live_shells();
        assert_eq!(live.len(), 2);
        assert!(live.contains(&state.round.pearl));
        assert_eq!(state.round.eliminated.len(), 5);
        assert_eq!(
            state.use_lifeline(LifelineKind::FiftyFifty),
            Err(LifelineError::AlreadyUsed(LifelineKind::FiftyFifty))
        );
    }

    #[test]
    fn test_fifty_fifty_on_three_shells() {
        let mut state = guessing_state(13);
        state.lifelines.grant(LifelineKind::FiftyFifty);
        assert_eq!(state.can_use_lifeline(LifelineKind::FiftyFifty), Ok(()));
        state.use_lifeline(LifelineKind::FiftyFifty).unwrap();
        assert_eq!(state.round.eliminated.len(), 1);
        assert_ne!(state.round.eliminated[0], state.round.pearl);
        assert_eq!(state.live_shells().len(), 2);
    }

    #[test]
    fn test_shield_cannot_double_arm() {
        let mut state = GameState::new(5);
        state.enter(GamePhase::Ready, None);
        state.lifelines.grant(LifelineKind::Shield);
        assert!(state.use_lifeline(LifelineKind::Shield).is_ok());
        assert!(state.shield_armed);
        assert_eq!(
            state.use_lifeline(LifelineKind::Shield),
            Err(LifelineError::ShieldArmed)
        );
        assert_eq!(state.lifelines.charges(LifelineKind::Shield), 1);
    }

    #[test]
    fn test_reveal_blocks_other_lifelines() {
        let mut state = guessing_state(8);
        state.lifelines.grant(LifelineKind::Reveal);
        state.use_lifeline(LifelineKind::Reveal).unwrap();
        assert!(state.revealing());
        assert_eq!(
            state.use_lifeline(LifelineKind::Shield),
            Err(LifelineError::Busy)
        );
        assert_eq!(state.status_text(), "Look closely…");
    }

    #[test]
    fn test_status_text() {
        let mut state = GameState::new(1);
        state.enter(GamePhase::Ready, None);
        assert_eq!(state.status_text(), "Tap anywhere to start");
        state.progress.total_wins = 1;
        assert_eq!(state.status_text(), "Tap anywhere for next round");
        state.enter(GamePhase::Lockout, Some(POST_TITLE_LOCK_MS));
        assert_eq!(state.status_text(), "Get ready…");
    }
}
