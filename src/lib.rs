//! Pearl Shell - find the pearl under the shell
//!
//! Core modules:
//! - `sim`: Deterministic round state machine, progression ladder and lifelines
//! - `platform`: Browser/native platform abstraction (LocalStorage)
//! - `highscores`: Best score record
//! - `settings`: Player preferences
//! - `audio`: Procedural Web Audio effects

pub mod audio;
pub mod highscores;
pub mod platform;
pub mod settings;
pub mod sim;

pub use highscores::HighScore;
pub use settings::{Pace, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate
    pub const SIM_HZ: u32 = 120;
    /// Fixed simulation timestep (seconds)
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Logo screen hold before the title fades in
    pub const LOADING_HOLD_MS: u32 = 2200;
    /// Screen cross-fade duration
    pub const FADE_MS: u32 = 450;
    /// Input lockout after leaving the title screen
    pub const POST_TITLE_LOCK_MS: u32 = 3000;
    /// Pearl visible before the shuffle starts
    pub const WATCH_MS: u32 = 700;
    /// Pearl shown after a correct guess
    pub const CORRECT_HOLD_MS: u32 = 900;
    /// Pearl shown after a wrong guess absorbed by the shield
    pub const SHIELD_HOLD_MS: u32 = 900;
    /// Red flash after a wrong guess
    pub const WRONG_FLASH_MS: u32 = 500;
    /// Pearl peek granted by the Reveal lifeline
    pub const REVEAL_MS: u32 = 600;

    /// Points for a correct guess
    pub const POINTS_PER_WIN: u64 = 10;
    /// Bonus for completing a full lap of the ladder
    pub const LAP_BONUS: u64 = 50;

    /// Slow-down lifeline duration multiplier
    pub const SLOW_FACTOR: f32 = 1.8;

    /// Horizontal margin of the shell row (percent of board width)
    pub const ROW_MARGIN_PCT: f32 = 25.0;
}

/// Convert milliseconds to whole simulation ticks (rounded up, at least 1)
#[inline]
pub fn ms_to_ticks(ms: u32) -> u32 {
    (ms * consts::SIM_HZ).div_ceil(1000).max(1)
}

/// Horizontal position of a slot, as a percentage of the board width.
///
/// Slots are spread evenly between the row margins; a single slot sits centered.
#[inline]
pub fn slot_left_pct(slot: usize, count: usize) -> f32 {
    use consts::ROW_MARGIN_PCT;
    if count <= 1 {
        return 50.0;
    }
    let span = 100.0 - ROW_MARGIN_PCT * 2.0;
    let step = span / (count - 1) as f32;
    ROW_MARGIN_PCT + step * slot as f32
}
