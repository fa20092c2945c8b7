//! Minimal arcade physics for the terminal game.
//!
//! One runner body with gravity and a floor, a camera that trails it, and
//! circle hit tests against obstacles. Just enough engine to host the
//! [`GameLoop`](crate::game::GameLoop) outside a real game framework.

use std::collections::VecDeque;

use crate::config::WorldTuning;
use crate::game::{Animation, CharacterActuator, Collision, CollisionSource, FrameContext};
use crate::world::ScrollableEntity;

/// Seconds the death animation plays before the dead pose loops.
pub const DEATH_DURATION: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub r: f32,
}

impl Circle {
    pub fn overlaps(&self, other: &Circle) -> bool {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let reach = self.r + other.r;
        dx * dx + dy * dy < reach * reach
    }
}

/// The player character's body. `y` is the feet, growing downward.
#[derive(Debug, Clone, PartialEq)]
pub struct Runner {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub gravity_enabled: bool,
    pub grounded: bool,
    animation: Animation,
    animation_time: f32,
}

impl Runner {
    fn spawn(x: f32, floor: f32) -> Self {
        Self {
            x,
            y: floor,
            vx: 0.0,
            vy: 0.0,
            gravity_enabled: true,
            grounded: true,
            animation: Animation::Run,
            animation_time: 0.0,
        }
    }

    pub fn animation(&self) -> Animation {
        self.animation
    }

    /// Seconds since the current animation started.
    pub fn animation_time(&self) -> f32 {
        self.animation_time
    }
}

impl CharacterActuator for Runner {
    fn is_grounded(&self) -> bool {
        self.grounded
    }

    fn set_velocity_x(&mut self, vx: f32) {
        self.vx = vx;
    }

    fn set_velocity_y(&mut self, vy: f32) {
        self.vy = vy;
    }

    fn halt(&mut self) {
        self.vx = 0.0;
        self.vy = 0.0;
        self.gravity_enabled = false;
    }

    fn play(&mut self, animation: Animation) {
        // every jump starts its pose from the top
        if self.animation != animation || animation == Animation::Jump {
            self.animation = animation;
            self.animation_time = 0.0;
        }
    }
}

/// Hits detected by the last [`ArcadeWorld::integrate`], oldest first.
#[derive(Debug, Clone, Default)]
pub struct HitQueue {
    hits: VecDeque<Collision>,
}

impl HitQueue {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn clear(&mut self) {
        self.hits.clear();
    }
}

impl CollisionSource for HitQueue {
    fn next_collision(&mut self) -> Option<Collision> {
        self.hits.pop_front()
    }
}

#[derive(Debug, Clone)]
pub struct ArcadeWorld {
    width: f32,
    height: f32,
    gravity: f32,
    start_x: f32,
    camera_lead: f32,
    runner_radius: f32,
    hitbox_scale: f32,
    runner: Runner,
    hits: HitQueue,
}

impl ArcadeWorld {
    pub fn new(tuning: &WorldTuning) -> Self {
        let start_x = tuning.width * tuning.runner_start;
        Self {
            width: tuning.width,
            height: tuning.height,
            gravity: tuning.gravity,
            start_x,
            camera_lead: tuning.width * tuning.camera_lead,
            runner_radius: tuning.runner_radius,
            hitbox_scale: tuning.hitbox_scale,
            runner: Runner::spawn(start_x, tuning.height),
            hits: HitQueue::default(),
        }
    }

    /// Put the runner back at the start and drop pending hits.
    pub fn reset(&mut self) {
        self.runner = Runner::spawn(self.start_x, self.height);
        self.hits.clear();
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Borrow the runner and the hit queue at the same time, as
    /// [`GameLoop::step`](crate::game::GameLoop::step) wants both.
    pub fn parts(&mut self) -> (&mut Runner, &mut HitQueue) {
        (&mut self.runner, &mut self.hits)
    }

    /// Camera x: trails the runner, never left of the world origin.
    pub fn scroll_offset(&self) -> f32 {
        (self.runner.x - self.camera_lead).max(0.0)
    }

    pub fn frame_context(&self) -> FrameContext {
        FrameContext {
            scroll_offset: self.scroll_offset(),
            viewport_width: self.width,
        }
    }

    pub fn runner_hit_circle(&self) -> Circle {
        Circle {
            x: self.runner.x,
            y: self.runner.y - self.runner_radius,
            r: self.runner_radius,
        }
    }

    pub fn obstacle_hit_circle(&self, obstacle: &ScrollableEntity) -> Circle {
        let r = obstacle.width * self.hitbox_scale * 0.5;
        Circle {
            x: obstacle.x + obstacle.width * 0.5,
            y: self.height - r,
            r,
        }
    }

    /// Advance physics by `dt` seconds and queue a hit for every obstacle the
    /// runner overlaps afterwards. Overlaps are reported on every frame they
    /// last.
    pub fn integrate<'a, I>(&mut self, dt: f32, entities: I)
    where
        I: IntoIterator<Item = &'a ScrollableEntity>,
    {
        let runner = &mut self.runner;

        runner.animation_time += dt;
        if runner.animation == Animation::Death && runner.animation_time >= DEATH_DURATION {
            runner.play(Animation::Dead);
        }

        if runner.gravity_enabled {
            runner.vy += self.gravity * dt;
        }
        runner.x = (runner.x + runner.vx * dt).max(0.0);
        runner.y += runner.vy * dt;

        let ceiling = self.runner_radius * 2.0;
        if runner.y < ceiling {
            runner.y = ceiling;
            runner.vy = runner.vy.max(0.0);
        }
        if runner.y >= self.height {
            runner.y = self.height;
            runner.vy = runner.vy.min(0.0);
            runner.grounded = true;
        } else {
            runner.grounded = false;
        }

        let body = self.runner_hit_circle();
        for entity in entities.into_iter().filter(|e| e.is_obstacle()) {
            if body.overlaps(&self.obstacle_hit_circle(entity)) {
                self.hits.hits.push_back(Collision {
                    obstacle: entity.name.clone(),
                });
            }
        }
    }
}
