//! Shuffle script generation
//!
//! A shuffle is a sequence of random transpositions of two distinct slots.
//! Each move carries its own duration and an optional pause, jittered around
//! the round's `ShuffleParams`.

use rand::Rng;

use super::ladder::ShuffleParams;
use crate::ms_to_ticks;

/// Swap duration jitter (+/- fraction)
const SWAP_JITTER: f32 = 0.15;
/// Pause duration jitter (+/- fraction)
const PAUSE_JITTER: f32 = 0.25;

/// One transposition in the shuffle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapMove {
    pub slot_a: usize,
    pub slot_b: usize,
    /// Duration of the swap animation (ms, before pace/slow-down scaling)
    pub swap_ms: u32,
    /// Pause after the swap (ms, 0 = none)
    pub pause_ms: u32,
}

/// Where playback is within the current move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStage {
    /// Next move not yet started
    Pending,
    /// Shells travelling, ticks remaining
    Swapping(u32),
    /// Shells settled, ticks remaining before the next move
    Pausing(u32),
}

/// A generated shuffle and its playback cursor
#[derive(Debug, Clone)]
pub struct ShuffleScript {
    pub moves: Vec<SwapMove>,
    /// Index of the current move
    pub cursor: usize,
    pub stage: MoveStage,
}

impl ShuffleScript {
    /// Generate a script for `shells` slots
    pub fn generate<R: Rng>(rng: &mut R, shells: usize, params: &ShuffleParams) -> Self {
        let mut moves = Vec::with_capacity(params.swaps as usize);
        if shells >= 2 {
            for _ in 0..params.swaps {
                let (slot_a, slot_b) = distinct_pair(rng, shells);
                let swap_ms = jitter(rng, params.swap_ms, SWAP_JITTER);
                let pause_ms = if rng.random_bool(params.pause_chance as f64) {
                    jitter(rng, params.pause_ms, PAUSE_JITTER)
                } else {
                    0
                };
                moves.push(SwapMove {
                    slot_a,
                    slot_b,
                    swap_ms,
                    pause_ms,
                });
            }
        }
        Self {
            moves,
            cursor: 0,
            stage: MoveStage::Pending,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.moves.len()
    }

    pub fn current(&self) -> Option<&SwapMove> {
        self.moves.get(self.cursor)
    }
}

/// Pick two distinct slots uniformly
fn distinct_pair<R: Rng>(rng: &mut R, n: usize) -> (usize, usize) {
    let a = rng.random_range(0..n);
    // Draw from the other n-1 slots so a swap is never a no-op
    let mut b = rng.random_range(0..n - 1);
    if b >= a {
        b += 1;
    }
    (a, b)
}

fn jitter<R: Rng>(rng: &mut R, base: f32, spread: f32) -> u32 {
    let f = 1.0 + rng.random_range(-spread..=spread);
    (base * f).round().max(1.0) as u32
}

/// Ticks for a duration after pace and slow-down scaling
pub fn scaled_ticks(ms: u32, scale: f32) -> u32 {
    ms_to_ticks((ms as f32 * scale).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::ShellLayout;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_generate_counts() {
        let mut rng = Pcg32::seed_from_u64(7);
        let params = ShuffleParams::for_progress(0.0, 3);
        let script = ShuffleScript::generate(&mut rng, 3, &params);
        assert_eq!(script.moves.len(), params.swaps as usize);
        assert_eq!(script.stage, MoveStage::Pending);
        assert!(!script.is_finished());
    }

    #[test]
    fn test_determinism() {
        let params = ShuffleParams::for_progress(0.4, 5);
        let a = ShuffleScript::generate(&mut Pcg32::seed_from_u64(99), 5, &params);
        let b = ShuffleScript::generate(&mut Pcg32::seed_from_u64(99), 5, &params);
        assert_eq!(a.moves, b.moves);
    }

    #[test]
    fn test_durations_within_jitter() {
        let mut rng = Pcg32::seed_from_u64(3);
        let params = ShuffleParams::for_progress(0.0, 3);
        let script = ShuffleScript::generate(&mut rng, 3, &params);
        let lo = (params.swap_ms * (1.0 - SWAP_JITTER)).floor() as u32;
        let hi = (params.swap_ms * (1.0 + SWAP_JITTER)).ceil() as u32;
        for m in &script.moves {
            assert!(m.swap_ms >= lo && m.swap_ms <= hi, "swap {} out of range", m.swap_ms);
        }
    }

    #[test]
    fn test_scaled_ticks() {
        assert_eq!(scaled_ticks(500, 1.0), 60);
        assert_eq!(scaled_ticks(500, 2.0), 120);
    }

    proptest! {
        #[test]
        fn prop_swaps_distinct_and_layout_stays_permutation(
            seed in any::<u64>(),
            shells in 3usize..=7,
            p in 0.0f32..=1.0,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let params = ShuffleParams::for_progress(p, shells);
            let script = ShuffleScript::generate(&mut rng, shells, &params);
            let mut layout = ShellLayout::new(shells);
            for m in &script.moves {
                prop_assert_ne!(m.slot_a, m.slot_b);
                prop_assert!(m.slot_a < shells && m.slot_b < shells);
                layout.swap_slots(m.slot_a, m.slot_b);
                prop_assert!(layout.is_permutation());
            }
        }
    }
}
