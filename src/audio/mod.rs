//! Microphone energy readings.
//!
//! The game only ever asks one question of the audio side: how loud is the
//! input right now within a frequency band. [`EnergySource`] is that question;
//! [`Microphone`] answers it from a live capture stream and [`Silence`] answers
//! zero.

pub mod microphone;
pub mod spectrum;

use serde::Deserialize;

pub use microphone::{MicStatus, Microphone};
pub use spectrum::SpectrumAnalyzer;

/// A frequency range in Hz, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EnergyBand {
    pub low_hz: f32,
    pub high_hz: f32,
}

impl EnergyBand {
    pub const fn new(low_hz: f32, high_hz: f32) -> Self {
        Self { low_hz, high_hz }
    }
}

pub trait EnergySource {
    /// Current energy within `band`, always `>= 0`.
    fn energy(&self, band: EnergyBand) -> f32;
}

/// An input that never makes a sound.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silence;

impl EnergySource for Silence {
    fn energy(&self, _band: EnergyBand) -> f32 {
        0.0
    }
}

impl<T: EnergySource + ?Sized> EnergySource for &T {
    fn energy(&self, band: EnergyBand) -> f32 {
        (**self).energy(band)
    }
}
