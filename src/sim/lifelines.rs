//! Lifelines - limited-use player aids
//!
//! Charges are small counters (0..=MAX_CHARGES) per kind. Usage rules
//! (phase gating, once per round) are enforced by `GameState::use_lifeline`.

use serde::{Deserialize, Serialize};

/// Maximum charges held per lifeline kind
pub const MAX_CHARGES: u8 = 3;

/// Lifeline types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifelineKind {
    /// Stretch the remaining swaps of the shuffle
    SlowDown,
    /// Absorb the next wrong guess
    Shield,
    /// Eliminate all wrong shells but one
    FiftyFifty,
    /// Briefly show the pearl during the guess
    Reveal,
}

impl LifelineKind {
    pub const ALL: [LifelineKind; 4] = [
        LifelineKind::SlowDown,
        LifelineKind::Shield,
        LifelineKind::FiftyFifty,
        LifelineKind::Reveal,
    ];

    fn index(self) -> usize {
        match self {
            LifelineKind::SlowDown => 0,
            LifelineKind::Shield => 1,
            LifelineKind::FiftyFifty => 2,
            LifelineKind::Reveal => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifelineKind::SlowDown => "slow",
            LifelineKind::Shield => "shield",
            LifelineKind::FiftyFifty => "fifty",
            LifelineKind::Reveal => "reveal",
        }
    }
}

/// Why a lifeline could not be used. Rejections never change game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifelineError {
    #[error("no {} charges left", .0.as_str())]
    NoCharges(LifelineKind),
    #[error("{} cannot be used right now", .0.as_str())]
    WrongPhase(LifelineKind),
    #[error("{} was already used this round", .0.as_str())]
    AlreadyUsed(LifelineKind),
    #[error("a shield is already armed")]
    ShieldArmed,
    #[error("busy, wait for the reveal to finish")]
    Busy,
}

/// Charges held for every lifeline kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifelines {
    charges: [u8; 4],
}

impl Default for Lifelines {
    /// Starting loadout: one slow-down and one shield
    fn default() -> Self {
        Self {
            charges: [1, 1, 0, 0],
        }
    }
}

impl Lifelines {
    pub fn charges(&self, kind: LifelineKind) -> u8 {
        self.charges[kind.index()]
    }

    /// Add one charge. Returns false if already at the cap.
    pub fn grant(&mut self, kind: LifelineKind) -> bool {
        let c = &mut self.charges[kind.index()];
        if *c >= MAX_CHARGES {
            return false;
        }
        *c += 1;
        true
    }

    /// Spend one charge
    pub fn spend(&mut self, kind: LifelineKind) -> Result<(), LifelineError> {
        let c = &mut self.charges[kind.index()];
        if *c == 0 {
            return Err(LifelineError::NoCharges(kind));
        }
        *c -= 1;
        Ok(())
    }
}

/// Set of lifeline kinds already used this round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedThisRound(u8);

impl UsedThisRound {
    pub fn contains(&self, kind: LifelineKind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    pub fn insert(&mut self, kind: LifelineKind) {
        self.0 |= 1 << kind.index();
    }
}
