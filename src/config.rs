//! Game tuning: every constant the core and the arcade world read, loadable
//! from a TOML file. Missing keys fall back to the values the game ships with.

use std::path::Path;

use serde::Deserialize;

use crate::audio::EnergyBand;
use crate::error::ConfigError;
use crate::world::{EntityKind, EntitySpec, Span};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub audio: AudioTuning,
    pub control: ControlTuning,
    pub world: WorldTuning,
    pub score: ScoreTuning,
    pub entities: Vec<EntitySpec>,
}

/// Spectrum analysis settings for the microphone.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioTuning {
    /// FFT window length in samples (power of two).
    pub fft_size: usize,
    /// Temporal smoothing of bin magnitudes, 0 = none.
    pub smoothing: f32,
    /// Level mapped to 0.0.
    pub min_db: f32,
    /// Level mapped to 1.0.
    pub max_db: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlTuning {
    pub run_band: EnergyBand,
    pub jump_band: EnergyBand,
    pub run_gain: f32,
    pub jump_gain: f32,
    /// Lerp factor applied to run velocity every frame.
    pub smoothing: f32,
    pub jump_threshold: f32,
    /// Vertical velocity set on jump (negative is up).
    pub jump_velocity: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Viewport size in world units.
    pub width: f32,
    pub height: f32,
    pub gravity: f32,
    /// Runner spawn x as a fraction of the viewport width.
    pub runner_start: f32,
    /// How far the camera trails the runner, as a fraction of the viewport width.
    pub camera_lead: f32,
    pub runner_radius: f32,
    /// Obstacle hit circle diameter as a fraction of the obstacle width.
    pub hitbox_scale: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoreTuning {
    pub scale: f32,
    pub offset: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        let spawn = Span::new(900.0, 1500.0);
        let recycle = Span::new(100.0, 1000.0);
        Self {
            audio: AudioTuning::default(),
            control: ControlTuning::default(),
            world: WorldTuning::default(),
            score: ScoreTuning::default(),
            entities: vec![
                EntitySpec {
                    name: "bush".to_string(),
                    kind: EntityKind::Decoration,
                    width: 60.0,
                    spawn,
                    recycle,
                },
                EntitySpec {
                    name: "cop-car".to_string(),
                    kind: EntityKind::Obstacle,
                    width: 120.0,
                    spawn,
                    recycle,
                },
            ],
        }
    }
}

impl Default for AudioTuning {
    fn default() -> Self {
        Self {
            fft_size: 8192,
            smoothing: 0.5,
            min_db: -85.0,
            max_db: -25.0,
        }
    }
}

impl Default for ControlTuning {
    fn default() -> Self {
        Self {
            run_band: EnergyBand::new(0.0, 60.0),
            jump_band: EnergyBand::new(2000.0, 16000.0),
            run_gain: 5000.0,
            jump_gain: 1000.0,
            smoothing: 0.015,
            jump_threshold: 130.0,
            jump_velocity: -500.0,
        }
    }
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 450.0,
            gravity: 1000.0,
            runner_start: 0.5,
            camera_lead: 0.25,
            runner_radius: 28.0,
            hitbox_scale: 0.7,
        }
    }
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            scale: 0.25,
            offset: 40.0,
        }
    }
}

impl Tuning {
    /// Load tuning from a TOML file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let tuning = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.audio;
        if !a.fft_size.is_power_of_two() || a.fft_size < 64 {
            return invalid(format!("audio.fft_size must be a power of two >= 64, got {}", a.fft_size));
        }
        if !(0.0..1.0).contains(&a.smoothing) {
            return invalid(format!("audio.smoothing must be in [0, 1), got {}", a.smoothing));
        }
        if a.min_db >= a.max_db {
            return invalid("audio.min_db must be below audio.max_db".to_string());
        }

        let c = &self.control;
        for (name, band) in [("run_band", c.run_band), ("jump_band", c.jump_band)] {
            if band.low_hz < 0.0 || band.low_hz > band.high_hz {
                return invalid(format!(
                    "control.{name} must satisfy 0 <= low_hz <= high_hz, got {}..{}",
                    band.low_hz, band.high_hz
                ));
            }
        }
        if c.run_gain < 0.0 || c.jump_gain < 0.0 {
            return invalid("control gains must not be negative".to_string());
        }
        if !(c.smoothing > 0.0 && c.smoothing <= 1.0) {
            return invalid(format!("control.smoothing must be in (0, 1], got {}", c.smoothing));
        }

        let w = &self.world;
        if w.width <= 0.0 || w.height <= 0.0 {
            return invalid("world size must be positive".to_string());
        }
        if w.gravity < 0.0 || w.runner_radius <= 0.0 || w.hitbox_scale <= 0.0 {
            return invalid("world gravity, runner_radius and hitbox_scale must be positive".to_string());
        }

        if self.score.scale < 0.0 {
            return invalid("score.scale must not be negative".to_string());
        }

        for spec in &self.entities {
            if spec.width <= 0.0 {
                return invalid(format!("entity {:?} needs a positive width", spec.name));
            }
            if spec.spawn.start > spec.spawn.end || spec.recycle.start > spec.recycle.end {
                return invalid(format!("entity {:?} has a reversed spawn or recycle range", spec.name));
            }
        }
        Ok(())
    }
}

fn invalid(msg: String) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(msg))
}
