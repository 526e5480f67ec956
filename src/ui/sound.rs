/// Sound engine: procedural chiptune effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time and
/// played fire-and-forget through a detached rodio Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

/// Seconds left at which the countdown starts beeping.
pub const WARN_SECONDS: u32 = 5;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Claim,
    Reveal,
    Match,
    Mismatch,
    Hazard,
    Warn,
    Win,
    Lose,
}

impl Sfx {
    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    pub const ALL: [Sfx; 8] = [
        Sfx::Claim, Sfx::Reveal, Sfx::Match, Sfx::Mismatch,
        Sfx::Hazard, Sfx::Warn, Sfx::Win, Sfx::Lose,
    ];

    /// Which effect, if any, an event should trigger.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::ChestClaimed { .. } => Some(Sfx::Claim),
            GameEvent::ItemRevealed { kind, .. } if !kind.is_hazard() => Some(Sfx::Reveal),
            GameEvent::ItemRevealed { .. } => None,
            GameEvent::PairMatched { .. } => Some(Sfx::Match),
            GameEvent::PairMismatched { .. } => Some(Sfx::Mismatch),
            GameEvent::HazardTriggered { .. } => Some(Sfx::Hazard),
            GameEvent::TimeChanged { remaining } if (1..=WARN_SECONDS).contains(remaining) => {
                Some(Sfx::Warn)
            }
            GameEvent::RoundWon => Some(Sfx::Win),
            GameEvent::RoundLost => Some(Sfx::Lose),
            _ => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        /// One buffer per `Sfx`, in `Sfx::ALL` order.
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output: {e}");
                    return None;
                }
            };
            let buffers = Sfx::ALL.iter().map(|&s| Arc::new(make_wav(&generate(s)))).collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(idx) = Sfx::ALL.iter().position(|&s| s == sfx) else {
                return;
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(self.buffers[idx].as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn generate(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::Claim => notes(&[(880.0, 0.03)], 0.15, 0.0),
            Sfx::Reveal => notes(&[(659.0, 0.05), (988.0, 0.06)], 0.25, 0.3),
            // C6 E6 G6
            Sfx::Match => notes(&[(1047.0, 0.05), (1319.0, 0.05), (1568.0, 0.09)], 0.25, 0.3),
            Sfx::Mismatch => notes(&[(392.0, 0.08), (311.0, 0.12)], 0.25, 0.0),
            Sfx::Hazard => buzz(0.25),
            Sfx::Warn => notes(&[(1760.0, 0.025)], 0.2, 0.0),
            // C5 E5 G5 C6, last one held
            Sfx::Win => notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)], 0.3, 0.3),
            // A4 F#4 Eb4 C4
            Sfx::Lose => {
                notes(&[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (261.0, 0.3)], 0.3, 0.0)
            }
        }
    }

    /// A run of `(freq, seconds)` notes with a fading envelope.
    /// `octave` mixes in the second harmonic for a brighter tone.
    fn notes(seq: &[(f32, f32)], volume: f32, octave: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in seq {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.6);
                let wave = (t * freq * TAU).sin() * (1.0 - octave)
                    + (t * freq * 2.0 * TAU).sin() * octave;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Hazard: low square buzz mixed with LCG noise.
    fn buzz(duration: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 0x2545_f491;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let square = if (t * 110.0 * TAU).sin() >= 0.0 { 1.0 } else { -1.0 };
                rng = rng.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = 1.0 - i as f32 / n as f32;
                (square * 0.6 + noise * 0.4) * env * 0.2
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit mono PCM
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_sizes() {
            let wav = make_wav(&generate(Sfx::Warn));
            let data_len = wav.len() as u32 - 44;
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 36 + data_len);
            assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), data_len);
        }

        #[test]
        fn every_effect_is_audible() {
            for sfx in Sfx::ALL {
                let samples = generate(sfx);
                assert!(!samples.is_empty(), "{sfx:?}");
                assert!(samples.iter().all(|s| s.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to a no-op when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chest::ChestId;
    use crate::domain::item::ItemKind;

    #[test]
    fn warning_only_in_last_seconds() {
        assert_eq!(Sfx::for_event(&GameEvent::TimeChanged { remaining: 6 }), None);
        assert_eq!(Sfx::for_event(&GameEvent::TimeChanged { remaining: 5 }), Some(Sfx::Warn));
        assert_eq!(Sfx::for_event(&GameEvent::TimeChanged { remaining: 0 }), None);
    }

    #[test]
    fn hazard_reveal_uses_hazard_sound_only() {
        let chest = ChestId(5);
        let hazard = GameEvent::ItemRevealed { chest, kind: ItemKind::Hazard };
        assert_eq!(Sfx::for_event(&hazard), None);
        assert_eq!(Sfx::for_event(&GameEvent::HazardTriggered { chest }), Some(Sfx::Hazard));
        assert_eq!(
            Sfx::for_event(&GameEvent::ItemRevealed { chest, kind: ItemKind::Picture(2) }),
            Some(Sfx::Reveal),
        );
    }
}
