//! Progression ladder and difficulty curve
//!
//! The ladder climbs from 3 to 7 shells, `WINS_PER_STAGE` correct guesses per
//! stage. Finishing stage 7 completes a lap: back to 3 shells, one tier up.
//! Shuffle pacing is derived from a smoothstep of the overall ladder position.

use serde::{Deserialize, Serialize};

use super::lifelines::LifelineKind;

/// Fewest shells on the board
pub const MIN_SHELLS: usize = 3;
/// Most shells on the board
pub const MAX_SHELLS: usize = 7;
/// Correct guesses needed to advance a stage
pub const WINS_PER_STAGE: u32 = 3;
/// Rungs in one full lap of the ladder
pub const LAP_LEN: u32 = (MAX_SHELLS - MIN_SHELLS + 1) as u32 * WINS_PER_STAGE;
/// Rungs until the difficulty curve saturates
pub const RAMP_RUNGS: u32 = 2 * LAP_LEN;

/// Visual theme, selected by tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Lagoon,
    Reef,
    Twilight,
    Abyss,
}

impl Theme {
    const CYCLE: [Theme; 4] = [Theme::Lagoon, Theme::Reef, Theme::Twilight, Theme::Abyss];

    pub fn for_tier(tier: u32) -> Self {
        Self::CYCLE[tier as usize % Self::CYCLE.len()]
    }

    /// CSS class applied to the board
    pub fn css_class(&self) -> &'static str {
        match self {
            Theme::Lagoon => "theme-lagoon",
            Theme::Reef => "theme-reef",
            Theme::Twilight => "theme-twilight",
            Theme::Abyss => "theme-abyss",
        }
    }
}

/// What a correct guess did to the ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Advance {
    /// Stage changed (new shell count)
    pub stage_up: Option<usize>,
    /// Lap completed (new tier)
    pub lap_complete: Option<u32>,
    /// Lifeline charge earned by this step of the ladder
    pub grant: Option<LifelineKind>,
}

/// Score and ladder position for the current run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub score: u64,
    /// Current shell count (MIN_SHELLS..=MAX_SHELLS)
    pub stage: usize,
    /// Correct guesses within the current stage
    pub wins_in_stage: u32,
    /// Correct guesses this run
    pub total_wins: u32,
    /// Completed laps
    pub tier: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            score: 0,
            stage: MIN_SHELLS,
            wins_in_stage: 0,
            total_wins: 0,
            tier: 0,
        }
    }
}

impl Progress {
    /// Position on the ladder, counting every correct guess since the run began
    pub fn rung(&self) -> u32 {
        self.tier * LAP_LEN + (self.stage - MIN_SHELLS) as u32 * WINS_PER_STAGE + self.wins_in_stage
    }

    /// Difficulty progress in [0, 1]
    pub fn difficulty(&self) -> f32 {
        smoothstep(0.0, RAMP_RUNGS as f32, self.rung() as f32)
    }

    pub fn theme(&self) -> Theme {
        Theme::for_tier(self.tier)
    }

    /// Record a correct guess and climb the ladder
    pub fn record_win(&mut self, points: u64, lap_bonus: u64) -> Advance {
        self.score += points;
        self.total_wins += 1;
        self.wins_in_stage += 1;

        let mut advance = Advance::default();
        if self.wins_in_stage < WINS_PER_STAGE {
            return advance;
        }

        self.wins_in_stage = 0;
        if self.stage < MAX_SHELLS {
            self.stage += 1;
            advance.stage_up = Some(self.stage);
            advance.grant = stage_unlock(self.stage);
        } else {
            self.stage = MIN_SHELLS;
            self.tier += 1;
            self.score += lap_bonus;
            advance.stage_up = Some(self.stage);
            advance.lap_complete = Some(self.tier);
            advance.grant = Some(LifelineKind::Shield);
        }
        advance
    }
}

/// Lifeline earned on reaching a stage
pub fn stage_unlock(stage: usize) -> Option<LifelineKind> {
    match stage {
        4 => Some(LifelineKind::SlowDown),
        5 => Some(LifelineKind::Shield),
        6 => Some(LifelineKind::FiftyFifty),
        7 => Some(LifelineKind::Reveal),
        _ => None,
    }
}

/// Shuffle pacing for one round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShuffleParams {
    pub swaps: u32,
    /// Base swap duration before jitter (ms)
    pub swap_ms: f32,
    /// Chance of a pause after each swap
    pub pause_chance: f32,
    /// Base pause duration before jitter (ms)
    pub pause_ms: f32,
}

impl ShuffleParams {
    pub fn for_progress(p: f32, shells: usize) -> Self {
        let p = p.clamp(0.0, 1.0);
        Self {
            swaps: lerp(5.0, 14.0, p).round() as u32 + shells.saturating_sub(MIN_SHELLS) as u32,
            swap_ms: lerp(420.0, 160.0, p),
            pause_chance: lerp(0.35, 0.08, p),
            pause_ms: lerp(260.0, 110.0, p),
        }
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
