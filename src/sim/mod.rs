//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No DOM, audio or storage dependencies

pub mod ladder;
pub mod lifelines;
pub mod shuffle;
pub mod state;
pub mod tick;

pub use ladder::{Progress, ShuffleParams, Theme, MAX_SHELLS, MIN_SHELLS, WINS_PER_STAGE};
pub use lifelines::{LifelineError, LifelineKind, Lifelines};
pub use shuffle::{ShuffleScript, SwapMove};
pub use state::{GameEvent, GamePhase, GameState, Outcome, ShellId, ShellLayout};
pub use tick::{TickInput, reset, tick};
