/// Sound effects: short procedural tones via rodio.
///
/// Buffers are generated once at startup; playback is fire-and-forget.
/// Without the "sound" feature the stub SoundEngine does nothing.

use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_gold: Arc<Vec<u8>>,
        sfx_bump: Arc<Vec<u8>>,
        sfx_refill: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_gold: Arc::new(make_wav(&gen_coin())),
                sfx_bump: Arc::new(make_wav(&gen_bump())),
                sfx_refill: Arc::new(make_wav(&gen_refill())),
            })
        }

        fn play_buf(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play(&self, sfx: Sfx) {
            match sfx {
                Sfx::Gold => self.play_buf(&self.sfx_gold),
                Sfx::Bump => self.play_buf(&self.sfx_bump),
                Sfx::Refill => self.play_buf(&self.sfx_refill),
            }
        }
    }

    fn tone(freq: f32, seconds: f32, volume: f32, harmonic: f32) -> impl Iterator<Item = f32> {
        let n = (SAMPLE_RATE as f32 * seconds) as usize;
        (0..n).map(move |i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(0.5);
            let wave = (t * freq * TAU).sin() * (1.0 - harmonic)
                + (t * freq * 3.0 * TAU).sin() * harmonic;
            wave * env * volume
        })
    }

    /// Coin: two quick rising notes, B5 then E6.
    fn gen_coin() -> Vec<f32> {
        tone(988.0, 0.05, 0.25, 0.3)
            .chain(tone(1319.0, 0.09, 0.25, 0.3))
            .collect()
    }

    /// Bump: short falling buzz.
    fn gen_bump() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.16) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 220.0 - t * 120.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let square = if (ti * freq * TAU).sin() >= 0.0 { 1.0 } else { -1.0 };
                square * (1.0 - t) * 0.18
            })
            .collect()
    }

    /// Refill: C5 E5 G5 arpeggio.
    fn gen_refill() -> Vec<f32> {
        [523.0_f32, 659.0, 784.0]
            .iter()
            .flat_map(|&f| tone(f, 0.07, 0.25, 0.2))
            .collect()
    }

    /// Wrap mono f32 samples into a 16-bit PCM WAV buffer.
    fn make_wav(samples: &[f32]) -> Vec<u8> {
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
        fn wav_header_matches_sample_count() {
            let wav = make_wav(&gen_coin());
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(wav.len(), 44 + data_size as usize);
        }

        #[test]
        fn effects_stay_in_range() {
            for s in gen_coin().iter().chain(&gen_bump()).chain(&gen_refill()) {
                assert!(s.abs() <= 1.0);
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sfx {
    Gold,
    Bump,
    Refill,
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

/// Which effect an event triggers. Plain moves are silent.
pub fn effect_for(event: &GameEvent) -> Option<Sfx> {
    match event {
        GameEvent::GoldPicked { .. } => Some(Sfx::Gold),
        GameEvent::EnemyBumped { .. } => Some(Sfx::Bump),
        GameEvent::ItemsRespawned { .. } => Some(Sfx::Refill),
        GameEvent::PlayerMoved { .. } => None,
    }
}

/// Effects for a batch of events, in event order.
pub fn effects(events: &[GameEvent]) -> impl Iterator<Item = Sfx> + '_ {
    events.iter().filter_map(effect_for)
}

/// Play the effect for each event, if audio is available.
pub fn play_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    if let Some(engine) = sound {
        effects(events).for_each(|sfx| engine.play(sfx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Position;

    fn step_events() -> Vec<GameEvent> {
        let a = Position::new(1, 1);
        let b = Position::new(1, 2);
        vec![
            GameEvent::PlayerMoved { from: a, to: b },
            GameEvent::GoldPicked { pos: b, total: 1 },
            GameEvent::ItemsRespawned { count: 5 },
            GameEvent::EnemyBumped { id: 0, from: b, to: Some(a), gold_lost: true },
        ]
    }

    #[test]
    fn each_event_maps_to_its_effect() {
        let events = step_events();
        assert_eq!(effect_for(&events[0]), None);
        assert_eq!(effect_for(&events[1]), Some(Sfx::Gold));
        assert_eq!(effect_for(&events[2]), Some(Sfx::Refill));
        assert_eq!(effect_for(&events[3]), Some(Sfx::Bump));
    }

    #[test]
    fn effects_keep_event_order_and_skip_moves() {
        let played: Vec<Sfx> = effects(&step_events()).collect();
        assert_eq!(played, vec![Sfx::Gold, Sfx::Refill, Sfx::Bump]);
        assert_eq!(effects(&[]).count(), 0);
    }

    #[test]
    fn no_engine_is_silent() {
        play_events(None, &step_events());
    }
}
