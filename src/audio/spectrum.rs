//! FFT spectrum over the latest capture window.
//!
//! Levels follow the Web Audio analyser convention the control gains are tuned
//! for: Blackman window (alpha 0.16), magnitude over FFT size, exponential
//! smoothing across analyses, then decibels mapped linearly from
//! `[min_db, max_db]` to `[0, 1]`. Bands are read over the bins nearest to
//! their edges.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use tracing::{debug, trace};

use super::EnergyBand;
use crate::config::AudioTuning;

const BLACKMAN_ALPHA: f32 = 0.16;

/// Floor applied before taking the log so silence maps to level 0 instead of NaN.
const MIN_MAGNITUDE: f32 = 1e-12;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    sample_rate: u32,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Smoothed magnitudes, positive frequencies only.
    magnitudes: Vec<f32>,
    /// Normalized 0..=1 level per bin.
    levels: Vec<f32>,
    analyses: u64,
}

impl SpectrumAnalyzer {
    pub fn new(tuning: &AudioTuning, sample_rate: u32) -> Self {
        let fft_size = tuning.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        let (a0, a1, a2) = ((1.0 - BLACKMAN_ALPHA) / 2.0, 0.5, BLACKMAN_ALPHA / 2.0);
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let t = std::f32::consts::TAU * i as f32 / fft_size as f32;
                a0 - a1 * t.cos() + a2 * (2.0 * t).cos()
            })
            .collect();

        debug!(sample_rate, fft_size, smoothing = tuning.smoothing, "spectrum analyzer ready");

        let half = fft_size / 2;
        Self {
            fft,
            fft_size,
            sample_rate,
            smoothing: tuning.smoothing,
            min_db: tuning.min_db,
            max_db: tuning.max_db,
            window,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            magnitudes: vec![0.0; half],
            levels: vec![0.0; half],
            analyses: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Width of one FFT bin in Hz.
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.fft_size as f32
    }

    /// Analyze the most recent window of mono samples.
    ///
    /// Only the last `fft_size` samples are used; a shorter slice is treated as
    /// preceded by silence.
    pub fn analyze(&mut self, samples: &[f32]) {
        let n = self.fft_size;
        let recent = &samples[samples.len().saturating_sub(n)..];
        let pad = n - recent.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            let sample = if sample.is_finite() { sample } else { 0.0 };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let scale = 1.0 / n as f32;
        let db_range = self.max_db - self.min_db;
        for k in 0..self.magnitudes.len() {
            let magnitude = self.buffer[k].norm() * scale;
            let smoothed = self.magnitudes[k] * self.smoothing + magnitude * (1.0 - self.smoothing);
            self.magnitudes[k] = smoothed;

            let db = 20.0 * smoothed.max(MIN_MAGNITUDE).log10();
            self.levels[k] = ((db - self.min_db) / db_range).clamp(0.0, 1.0);
        }

        self.analyses += 1;
        if self.analyses % 600 == 0 {
            trace!(analyses = self.analyses, peak = self.levels.iter().copied().fold(0.0f32, f32::max), "spectrum");
        }
    }

    /// Average level from the bin nearest `band.low_hz` to the bin nearest
    /// `band.high_hz`, inclusive. Bands above the Nyquist frequency read zero.
    pub fn band_energy(&self, band: EnergyBand) -> f32 {
        if self.levels.is_empty() {
            return 0.0;
        }
        let bin_width = self.bin_width();
        let nyquist = bin_width * self.levels.len() as f32;
        if band.low_hz >= nyquist {
            return 0.0;
        }

        let last = ((band.high_hz / bin_width).round() as usize).min(self.levels.len() - 1);
        let first = ((band.low_hz / bin_width).round() as usize).min(last);
        let bins = &self.levels[first..=last];
        bins.iter().sum::<f32>() / bins.len() as f32
    }
}
