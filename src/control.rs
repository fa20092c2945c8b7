//! Mapping from band energy to runner controls.

use crate::audio::{EnergyBand, EnergySource};
use crate::config::ControlTuning;

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// One frame's worth of control output.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlSignal {
    /// Smoothed horizontal velocity; feed back as next frame's `prev_run`.
    pub run_velocity: f32,
    pub jump: bool,
    /// Raw band readings the signal was derived from.
    pub run_energy: f32,
    pub jump_energy: f32,
}

/// Turns the run band into a low-pass filtered speed and the jump band into a
/// grounded-only jump trigger. Holds configuration only; the previous run
/// velocity is passed in by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMapper {
    pub run_band: EnergyBand,
    pub jump_band: EnergyBand,
    pub run_gain: f32,
    pub jump_gain: f32,
    pub smoothing: f32,
    pub jump_threshold: f32,
}

impl ControlMapper {
    pub fn new(tuning: &ControlTuning) -> Self {
        Self {
            run_band: tuning.run_band,
            jump_band: tuning.jump_band,
            run_gain: tuning.run_gain,
            jump_gain: tuning.jump_gain,
            smoothing: tuning.smoothing,
            jump_threshold: tuning.jump_threshold,
        }
    }

    pub fn map(&self, source: &dyn EnergySource, prev_run: f32, grounded: bool) -> ControlSignal {
        let run_energy = source.energy(self.run_band).max(0.0);
        let jump_energy = source.energy(self.jump_band).max(0.0);
        ControlSignal {
            run_velocity: self.smooth_run(prev_run, run_energy),
            jump: self.should_jump(jump_energy, grounded),
            run_energy,
            jump_energy,
        }
    }

    pub fn smooth_run(&self, prev_run: f32, run_energy: f32) -> f32 {
        lerp(prev_run, run_energy * self.run_gain, self.smoothing)
    }

    pub fn should_jump(&self, jump_energy: f32, grounded: bool) -> bool {
        grounded && jump_energy * self.jump_gain > self.jump_threshold
    }

    /// Jump band energy (before gain) the jump threshold corresponds to.
    pub fn jump_energy_threshold(&self) -> f32 {
        if self.jump_gain > 0.0 {
            self.jump_threshold / self.jump_gain
        } else {
            f32::INFINITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Fixed {
        run: f32,
        jump: f32,
        mapper: ControlMapper,
    }

    impl EnergySource for Fixed {
        fn energy(&self, band: EnergyBand) -> f32 {
            if band == self.mapper.run_band { self.run } else { self.jump }
        }
    }

    fn mapper() -> ControlMapper {
        ControlMapper::new(&ControlTuning::default())
    }

    fn source(run: f32, jump: f32) -> Fixed {
        Fixed { run, jump, mapper: mapper() }
    }

    #[test]
    fn test_first_frame_from_rest_is_exact_lerp() {
        let m = mapper();
        let x = 0.4;
        let signal = m.map(&source(x, 0.0), 0.0, true);
        let expected = 0.015 * x * 5000.0;
        assert!((signal.run_velocity - expected).abs() < 1e-4, "{}", signal.run_velocity);
    }

    #[test]
    fn test_silence_keeps_runner_still() {
        let signal = mapper().map(&source(0.0, 0.0), 0.0, true);
        assert_eq!(signal.run_velocity, 0.0);
        assert!(!signal.jump);
    }

    #[test]
    fn test_jump_requires_threshold_and_ground() {
        let m = mapper();
        // 0.2 * 1000 = 200 > 130
        assert!(m.map(&source(0.0, 0.2), 0.0, true).jump);
        assert!(!m.map(&source(0.0, 0.2), 0.0, false).jump);
        // 0.13 * 1000 is not strictly above 130
        assert!(!m.should_jump(0.13, true));
        assert!(m.should_jump(0.131, true));
    }

    #[test]
    fn test_loud_jump_band_does_not_move_runner() {
        let signal = mapper().map(&source(0.0, 1.0), 25.0, true);
        assert!(signal.run_velocity < 25.0);
        assert!(signal.jump);
    }

    #[test]
    fn test_jump_energy_threshold() {
        assert!((mapper().jump_energy_threshold() - 0.13).abs() < 1e-6);
        let mut m = mapper();
        m.jump_gain = 0.0;
        assert!(m.jump_energy_threshold().is_infinite());
    }

    #[test]
    fn test_constant_input_converges() {
        let m = mapper();
        let target = 0.3 * m.run_gain;
        let mut run = 0.0;
        for _ in 0..600 {
            run = m.smooth_run(run, 0.3);
        }
        // (1 - 0.015)^600 ~ 1.1e-4
        assert!((target - run).abs() / target < 2e-4);
    }

    proptest! {
        #[test]
        fn prop_smoothed_run_stays_between_previous_and_target(
            prev in 0.0f32..10_000.0,
            energy in 0.0f32..2.0,
        ) {
            let m = mapper();
            let target = energy * m.run_gain;
            let next = m.smooth_run(prev, energy);
            let (lo, hi) = if prev <= target { (prev, target) } else { (target, prev) };
            prop_assert!(next >= lo - 1e-3 && next <= hi + 1e-3);
        }

        #[test]
        fn prop_error_shrinks_geometrically(
            prev in 0.0f32..5_000.0,
            energy in 0.0f32..1.0,
            frames in 1u32..200,
        ) {
            let m = mapper();
            let target = energy * m.run_gain;
            let mut run = prev;
            for _ in 0..frames {
                run = m.smooth_run(run, energy);
            }
            let bound = (prev - target).abs() * (1.0 - m.smoothing).powi(frames as i32);
            prop_assert!((run - target).abs() <= bound + 0.05);
        }

        #[test]
        fn prop_never_jumps_airborne(energy in 0.0f32..1_000.0, prev in 0.0f32..1_000.0) {
            let signal = mapper().map(&source(0.0, energy), prev, false);
            prop_assert!(!signal.jump);
        }
    }
}
