//! Per-frame orchestration of controls, scrolling, scoring and game over.
//!
//! The host (the arcade world in the binary, fakes in tests) owns physics,
//! collision detection and animation playback. It drives [`GameLoop::step`]
//! once per tick and exposes its runner body through [`CharacterActuator`]
//! and its hits through [`CollisionSource`].

use rand::Rng;
use tracing::{debug, info};

use crate::audio::EnergySource;
use crate::config::{ScoreTuning, Tuning};
use crate::control::{ControlMapper, ControlSignal};
use crate::run_state::RunState;
use crate::world::{EntitySpec, WorldScroller};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    Run,
    Jump,
    /// One-shot; the host follows it with [`Animation::Dead`].
    Death,
    Dead,
}

/// The runner's physics body as seen by the game core.
pub trait CharacterActuator {
    fn is_grounded(&self) -> bool;
    fn set_velocity_x(&mut self, vx: f32);
    fn set_velocity_y(&mut self, vy: f32);
    /// Zero the velocity and stop gravity from acting on the body.
    fn halt(&mut self);
    /// Start `animation` unless it is already playing. `Jump` always
    /// restarts.
    fn play(&mut self, animation: Animation);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    /// Name of the obstacle that was hit.
    pub obstacle: String,
}

pub trait CollisionSource {
    fn next_collision(&mut self) -> Option<Collision>;
}

/// Camera state for the frame being stepped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub scroll_offset: f32,
    pub viewport_width: f32,
}

/// What happened during one [`GameLoop::step`].
///
/// Empty while the run is over, apart from `game_over` on the frame the run
/// ended.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepReport {
    pub signal: Option<ControlSignal>,
    pub score: Option<i64>,
    pub recycled: usize,
    /// Set on the one step whose collision ended the run.
    pub game_over: bool,
}

impl StepReport {
    pub fn jumped(&self) -> bool {
        self.signal.is_some_and(|s| s.jump)
    }
}

/// `score = round(scroll * scale - offset)`, halves rounded up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRule {
    pub scale: f32,
    pub offset: f32,
}

impl ScoreRule {
    pub fn new(tuning: &ScoreTuning) -> Self {
        Self {
            scale: tuning.scale,
            offset: tuning.offset,
        }
    }

    pub fn score(&self, scroll_offset: f32) -> i64 {
        (scroll_offset * self.scale - self.offset + 0.5).floor() as i64
    }
}

/// Everything that belongs to a single run. Restarting resets every field.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub state: RunState,
    /// Smoothed run velocity carried between frames.
    pub run_velocity: f32,
    pub scroller: WorldScroller,
    /// Frames stepped while running.
    pub frames: u64,
}

impl RunContext {
    pub fn new<R: Rng + ?Sized>(entities: &[EntitySpec], rng: &mut R) -> Self {
        Self {
            state: RunState::Running,
            run_velocity: 0.0,
            scroller: WorldScroller::new(entities, rng),
            frames: 0,
        }
    }
}

pub struct GameLoop {
    mapper: ControlMapper,
    score_rule: ScoreRule,
    jump_velocity: f32,
    ctx: RunContext,
    runs: u32,
}

impl GameLoop {
    pub fn new<R: Rng + ?Sized>(tuning: &Tuning, rng: &mut R) -> Self {
        Self {
            mapper: ControlMapper::new(&tuning.control),
            score_rule: ScoreRule::new(&tuning.score),
            jump_velocity: tuning.control.jump_velocity,
            ctx: RunContext::new(&tuning.entities, rng),
            runs: 1,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn mapper(&self) -> &ControlMapper {
        &self.mapper
    }

    pub fn state(&self) -> RunState {
        self.ctx.state
    }

    /// Runs started this session, including the current one.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Advance one frame.
    ///
    /// Pending collisions are delivered first. While the run is over nothing
    /// else happens: no controls, no recycling, no score.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        frame: &FrameContext,
        source: &dyn EnergySource,
        body: &mut dyn CharacterActuator,
        collisions: &mut dyn CollisionSource,
        rng: &mut R,
    ) -> StepReport {
        let mut report = StepReport::default();

        while let Some(hit) = collisions.next_collision() {
            if self.on_collision(&hit, body) {
                report.game_over = true;
            }
        }
        if self.ctx.state.is_over() {
            return report;
        }

        let grounded = body.is_grounded();
        let signal = self.mapper.map(source, self.ctx.run_velocity, grounded);
        self.ctx.run_velocity = signal.run_velocity;

        body.set_velocity_x(signal.run_velocity);
        if grounded {
            body.play(Animation::Run);
        }
        if signal.jump {
            body.set_velocity_y(self.jump_velocity);
            body.play(Animation::Jump);
            debug!(energy = signal.jump_energy, "jump");
        }

        report.recycled = self
            .ctx
            .scroller
            .recycle(frame.scroll_offset, frame.viewport_width, rng);
        report.score = Some(self.score_rule.score(frame.scroll_offset));
        report.signal = Some(signal);
        self.ctx.frames += 1;
        report
    }

    /// Handle one hit between the runner and an obstacle.
    ///
    /// Returns `true` if this hit ended the run; hits after that are ignored.
    pub fn on_collision(&mut self, hit: &Collision, body: &mut dyn CharacterActuator) -> bool {
        if !self.ctx.state.end_run() {
            return false;
        }
        body.halt();
        body.play(Animation::Death);
        info!(obstacle = %hit.obstacle, frames = self.ctx.frames, run = self.runs, "run over");
        true
    }

    /// Start a fresh run after game over. Returns `false` while still running.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.ctx.state.restart() {
            return false;
        }
        self.ctx.run_velocity = 0.0;
        self.ctx.scroller.reset(rng);
        self.ctx.frames = 0;
        self.runs += 1;
        info!(run = self.runs, "restarted");
        true
    }
}
