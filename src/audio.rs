//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!

use crate::sim::{GameEvent, GamePhase, Outcome};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Tap accepted on the title / ready screen
    Tap,
    /// Pearl shown under its shell
    PearlShow,
    /// Two shells start trading places
    Swap,
    /// Correct guess
    Correct,
    /// Wrong guess absorbed by the shield
    ShieldBlock,
    /// Wrong guess
    Wrong,
    /// Stage up (one more shell)
    StageUp,
    /// Lifeline activated
    Lifeline,
    /// Lifeline rejected
    Denied,
    /// Run ended
    GameOver,
    /// New best score
    HighScore,
}

impl SoundEffect {
    /// Sound to play for a simulation event, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::PhaseChanged(GamePhase::Lockout) => Some(SoundEffect::Tap),
            GameEvent::PhaseChanged(GamePhase::Watch) => Some(SoundEffect::PearlShow),
            GameEvent::SwapStarted { .. } => Some(SoundEffect::Swap),
            GameEvent::GuessResolved { outcome, .. } => Some(match outcome {
                Outcome::Correct => SoundEffect::Correct,
                Outcome::Shielded => SoundEffect::ShieldBlock,
                Outcome::Wrong => SoundEffect::Wrong,
            }),
            GameEvent::StageUp { .. } => Some(SoundEffect::StageUp),
            GameEvent::LifelineUsed(_) => Some(SoundEffect::Lifeline),
            GameEvent::LifelineRejected(_) => Some(SoundEffect::Denied),
            GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            GameEvent::NewBest(_) => Some(SoundEffect::HighScore),
            _ => None,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::SoundEffect;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        volume: f32,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx, volume: 0.8 }
        }

        /// Set effective volume (0.0 - 1.0, already includes mute)
        pub fn set_volume(&mut self, vol: f32) {
            self.volume = vol.clamp(0.0, 1.0);
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            let vol = self.volume;
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Tap => self.blip(ctx, vol * 0.25, 520.0, 0.06, OscillatorType::Sine),
                SoundEffect::PearlShow => {
                    self.arpeggio(ctx, vol * 0.2, &[880.0, 1320.0], 0.06, OscillatorType::Sine)
                }
                SoundEffect::Swap => self.play_swap(ctx, vol),
                SoundEffect::Correct => {
                    self.arpeggio(ctx, vol * 0.3, &[600.0, 800.0, 1000.0], 0.08, OscillatorType::Sine)
                }
                SoundEffect::ShieldBlock => self.play_shield(ctx, vol),
                SoundEffect::Wrong => self.play_wrong(ctx, vol),
                SoundEffect::StageUp => self.arpeggio(
                    ctx,
                    vol * 0.3,
                    &[400.0, 500.0, 600.0, 800.0],
                    0.1,
                    OscillatorType::Triangle,
                ),
                SoundEffect::Lifeline => {
                    self.blip(ctx, vol * 0.3, 700.0, 0.12, OscillatorType::Triangle)
                }
                SoundEffect::Denied => self.blip(ctx, vol * 0.2, 140.0, 0.1, OscillatorType::Square),
                SoundEffect::GameOver => self.arpeggio(
                    ctx,
                    vol * 0.3,
                    &[400.0, 350.0, 300.0, 200.0],
                    0.2,
                    OscillatorType::Sine,
                ),
                SoundEffect::HighScore => self.arpeggio(
                    ctx,
                    vol * 0.25,
                    &[500.0, 600.0, 700.0, 800.0, 1000.0],
                    0.08,
                    OscillatorType::Triangle,
                ),
            }
        }

        // === Sound generators ===

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Single decaying tone
        fn blip(&self, ctx: &AudioContext, level: f32, freq: f32, len: f64, osc_type: OscillatorType) {
            let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + len)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + len + 0.02).ok();
        }

        /// Notes in sequence, `step` seconds apart
        fn arpeggio(
            &self,
            ctx: &AudioContext,
            level: f32,
            notes: &[f32],
            step: f64,
            osc_type: OscillatorType,
        ) {
            for (i, freq) in notes.iter().enumerate() {
                let delay = i as f64 * step;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, osc_type) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(level, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + step * 2.0)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + step * 2.5).ok();
                }
            }
        }

        /// Swap - soft scrape of shell on sand
        fn play_swap(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 180.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.15, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.12)
                .ok();
            osc.frequency().set_value_at_time(180.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(260.0, t + 0.1)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }

        /// Shield - metallic ring
        fn play_shield(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 400.0, OscillatorType::Square) {
                gain.gain().set_value_at_time(vol * 0.2, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                    .ok();
                osc.frequency().set_value_at_time(400.0, t).ok();
                osc.frequency().set_value_at_time(300.0, t + 0.05).ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.35).ok();
            }

            if let Some((osc, gain)) = self.create_osc(ctx, 1200.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.15, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.5)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.55).ok();
            }
        }

        /// Wrong - ominous descend
        fn play_wrong(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Sawtooth) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.3, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.45)
                .ok();
            osc.frequency().set_value_at_time(300.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(60.0, t + 0.45)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.5).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::LifelineKind;

    #[test]
    fn test_event_sounds() {
        assert_eq!(
            SoundEffect::for_event(&GameEvent::GuessResolved {
                guessed: 0,
                pearl: 1,
                outcome: Outcome::Shielded
            }),
            Some(SoundEffect::ShieldBlock)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::LifelineUsed(LifelineKind::Reveal)),
            Some(SoundEffect::Lifeline)
        );
        assert_eq!(SoundEffect::for_event(&GameEvent::PearlHidden), None);
        assert_eq!(
            SoundEffect::for_event(&GameEvent::PhaseChanged(GamePhase::Title)),
            None
        );
    }
}
