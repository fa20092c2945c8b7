//! Synthesized sound effects.
//!
//! Both effects are rendered once up front and replayed from memory. The jump
//! chirp is a pure sine kept well under the jump band so the game does not
//! hear itself jump.

use fundsp::prelude::*;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::warn;

const SAMPLE_RATE: u32 = 44_100;

fn render(unit: &mut dyn AudioUnit, seconds: f32) -> Vec<f32> {
    unit.set_sample_rate(SAMPLE_RATE as f64);
    let len = (seconds * SAMPLE_RATE as f32) as usize;
    (0..len).map(|_| unit.get_mono()).collect()
}

/// 400 Hz falling to 80 Hz over 0.4s through a saw, fading out over 0.5s.
fn death_sound() -> Vec<f32> {
    let freq = lfo(|t: f32| 400.0 + (80.0 - 400.0) * (t / 0.4).min(1.0));
    let gain = lfo(|t: f32| 0.15 * (1.0 - (t / 0.5).min(1.0)));
    let mut sound = (freq >> saw()) * gain;
    render(&mut sound, 0.5)
}

/// Short rising sine blip.
fn jump_sound() -> Vec<f32> {
    let freq = lfo(|t: f32| 520.0 + 380.0 * (t / 0.12).min(1.0));
    let gain = lfo(|t: f32| 0.12 * (1.0 - (t / 0.15).min(1.0)));
    let mut sound = (freq >> sine::<f32>()) * gain;
    render(&mut sound, 0.15)
}

pub struct Sfx {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    jump: Vec<f32>,
    death: Vec<f32>,
}

impl Sfx {
    pub fn new() -> Result<Self, rodio::StreamError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            jump: jump_sound(),
            death: death_sound(),
        })
    }

    pub fn play_jump(&self) {
        self.play(&self.jump);
    }

    pub fn play_death(&self) {
        self.play(&self.death);
    }

    fn play(&self, samples: &[f32]) {
        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(err) => {
                warn!(%err, "failed to open sound sink");
                return;
            }
        };
        sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples.to_vec()));
        sink.detach(); // Play in background
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sounds_have_expected_length() {
        assert_eq!(death_sound().len(), 22_050);
        assert_eq!(jump_sound().len(), (0.15f32 * 44_100.0) as usize);
    }

    #[test]
    fn test_sounds_are_quiet_and_fade_out() {
        for samples in [death_sound(), jump_sound()] {
            assert!(samples.iter().all(|s| s.is_finite() && s.abs() <= 0.2));
            let tail = &samples[samples.len() - 32..];
            assert!(tail.iter().all(|s| s.abs() < 0.01));
        }
    }
}
