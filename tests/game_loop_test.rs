//! Integration test: per-frame game loop
//!
//! Drives `GameLoop::step` against deterministic fakes for the microphone, the
//! runner body and the collision feed, then against the arcade world.

use std::collections::VecDeque;

use dino_shout::arcade::{ArcadeWorld, DEATH_DURATION};
use dino_shout::audio::{EnergyBand, EnergySource, Silence};
use dino_shout::config::{ControlTuning, Tuning};
use dino_shout::game::{
    Animation, CharacterActuator, Collision, CollisionSource, FrameContext, GameLoop,
};
use dino_shout::world::{EntityKind, EntitySpec, Span};
use dino_shout::RunState;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const DT: f32 = 1.0 / 60.0;

/// Constant readings: `run` for the run band, `jump` for everything else.
struct FixedEnergy {
    run: f32,
    jump: f32,
}

impl EnergySource for FixedEnergy {
    fn energy(&self, band: EnergyBand) -> f32 {
        if band == ControlTuning::default().run_band {
            self.run
        } else {
            self.jump
        }
    }
}

#[derive(Debug)]
struct FakeBody {
    grounded: bool,
    vx: f32,
    vy: f32,
    halts: u32,
    played: Vec<Animation>,
}

impl FakeBody {
    fn grounded() -> Self {
        Self {
            grounded: true,
            vx: 0.0,
            vy: 0.0,
            halts: 0,
            played: Vec::new(),
        }
    }

    fn count(&self, animation: Animation) -> usize {
        self.played.iter().filter(|a| **a == animation).count()
    }
}

impl CharacterActuator for FakeBody {
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
        self.halts += 1;
    }

    fn play(&mut self, animation: Animation) {
        self.played.push(animation);
    }
}

#[derive(Default)]
struct FakeCollisions(VecDeque<Collision>);

impl FakeCollisions {
    fn push(&mut self, n: usize) {
        for _ in 0..n {
            self.0.push_back(Collision {
                obstacle: "cop-car".to_string(),
            });
        }
    }
}

impl CollisionSource for FakeCollisions {
    fn next_collision(&mut self) -> Option<Collision> {
        self.0.pop_front()
    }
}

fn start_frame() -> FrameContext {
    FrameContext {
        scroll_offset: 160.0,
        viewport_width: 640.0,
    }
}

fn new_game(rng: &mut ChaCha8Rng) -> GameLoop {
    GameLoop::new(&Tuning::default(), rng)
}

// =============================================================================
// Controls
// =============================================================================

#[test]
fn test_silent_input_never_moves_or_jumps() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut game = new_game(&mut rng);
    let mut body = FakeBody::grounded();
    let mut hits = FakeCollisions::default();

    for _ in 0..100 {
        let report = game.step(&start_frame(), &Silence, &mut body, &mut hits, &mut rng);
        assert!(!report.jumped());
        assert_eq!(report.score, Some(0));
    }

    assert_eq!(body.vx, 0.0);
    assert_eq!(body.vy, 0.0);
    assert_eq!(body.count(Animation::Jump), 0);
    assert_eq!(game.state(), RunState::Running);
    assert_eq!(game.context().frames, 100);
}

#[test]
fn test_first_frame_moves_a_smoothing_step_toward_target() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut game = new_game(&mut rng);
    let mut body = FakeBody::grounded();
    let source = FixedEnergy { run: 0.4, jump: 0.0 };

    let report = game.step(
        &start_frame(),
        &source,
        &mut body,
        &mut FakeCollisions::default(),
        &mut rng,
    );

    let expected = 0.015 * 0.4 * 5000.0;
    let signal = report.signal.expect("running step has a signal");
    assert!((signal.run_velocity - expected).abs() < 1e-3);
    assert!((body.vx - expected).abs() < 1e-3);
    assert!((game.context().run_velocity - expected).abs() < 1e-3);
}

#[test]
fn test_jump_only_fires_when_grounded() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut game = new_game(&mut rng);
    let loud = FixedEnergy { run: 0.0, jump: 0.5 };
    let mut hits = FakeCollisions::default();

    let mut body = FakeBody::grounded();
    body.grounded = false;
    let report = game.step(&start_frame(), &loud, &mut body, &mut hits, &mut rng);
    assert!(!report.jumped());
    assert_eq!(body.vy, 0.0);
    assert_eq!(body.count(Animation::Run), 0);

    body.grounded = true;
    let report = game.step(&start_frame(), &loud, &mut body, &mut hits, &mut rng);
    assert!(report.jumped());
    assert_eq!(body.vy, -500.0);
    assert_eq!(body.played.last(), Some(&Animation::Jump));
}

#[test]
fn test_jump_threshold_is_strict() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut game = new_game(&mut rng);
    let mut body = FakeBody::grounded();
    // 0.13 * 1000 == 130, not above the threshold
    let at_threshold = FixedEnergy { run: 0.0, jump: 0.13 };
    let report = game.step(
        &start_frame(),
        &at_threshold,
        &mut body,
        &mut FakeCollisions::default(),
        &mut rng,
    );
    assert!(!report.jumped());
}

// =============================================================================
// Game over and restart
// =============================================================================

#[test]
fn test_many_collisions_end_the_run_once() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut game = new_game(&mut rng);
    let mut body = FakeBody::grounded();
    let mut hits = FakeCollisions::default();

    hits.push(5);
    let report = game.step(&start_frame(), &Silence, &mut body, &mut hits, &mut rng);
    assert!(report.game_over);
    assert_eq!(game.state(), RunState::Over);
    assert_eq!(body.halts, 1);
    assert_eq!(body.count(Animation::Death), 1);

    hits.push(3);
    let report = game.step(&start_frame(), &Silence, &mut body, &mut hits, &mut rng);
    assert!(!report.game_over);
    assert_eq!(body.halts, 1);
    assert_eq!(body.count(Animation::Death), 1);
}

#[test]
fn test_world_is_frozen_while_over() {
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let mut game = new_game(&mut rng);
    let mut body = FakeBody::grounded();
    let mut hits = FakeCollisions::default();
    hits.push(1);
    game.step(&start_frame(), &Silence, &mut body, &mut hits, &mut rng);

    let before = game.context().clone();
    let played = body.played.len();
    let loud = FixedEnergy { run: 1.0, jump: 1.0 };
    let far = FrameContext {
        scroll_offset: 50_000.0,
        viewport_width: 640.0,
    };
    for _ in 0..30 {
        let report = game.step(&far, &loud, &mut body, &mut hits, &mut rng);
        assert_eq!(report.signal, None);
        assert_eq!(report.score, None);
        assert_eq!(report.recycled, 0);
    }

    assert_eq!(game.context(), &before);
    assert_eq!(body.vx, 0.0);
    assert_eq!(body.played.len(), played);
}

#[test]
fn test_restart_resets_the_run() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut game = new_game(&mut rng);
    let mut body = FakeBody::grounded();
    let mut hits = FakeCollisions::default();
    let loud = FixedEnergy { run: 0.8, jump: 0.0 };

    assert!(!game.restart(&mut rng), "restart while running is a no-op");

    for _ in 0..20 {
        game.step(&start_frame(), &loud, &mut body, &mut hits, &mut rng);
    }
    let far = FrameContext {
        scroll_offset: 4000.0,
        viewport_width: 640.0,
    };
    game.step(&far, &loud, &mut body, &mut hits, &mut rng);
    assert!(game.context().run_velocity > 0.0);
    hits.push(1);
    game.step(&start_frame(), &loud, &mut body, &mut hits, &mut rng);
    assert_eq!(game.state(), RunState::Over);

    assert!(game.restart(&mut rng));
    let ctx = game.context();
    assert_eq!(ctx.state, RunState::Running);
    assert_eq!(ctx.run_velocity, 0.0);
    assert_eq!(ctx.frames, 0);
    for entity in ctx.scroller.entities() {
        assert!(entity.spawn.contains(entity.x), "{} at {}", entity.name, entity.x);
    }
    assert_eq!(game.runs(), 2);
    assert!(!game.restart(&mut rng), "second restart while running is a no-op");
    assert_eq!(game.runs(), 2);

    // the new run can end again
    hits.push(1);
    let report = game.step(&start_frame(), &loud, &mut body, &mut hits, &mut rng);
    assert!(report.game_over);
    assert_eq!(game.state(), RunState::Over);
}

// =============================================================================
// Recycling
// =============================================================================

#[test]
fn test_recycles_entity_only_after_it_leaves_the_view() {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let tuning = Tuning {
        entities: vec![EntitySpec {
            name: "cone".to_string(),
            kind: EntityKind::Obstacle,
            width: 50.0,
            spawn: Span::new(1000.0, 1000.0),
            recycle: Span::new(100.0, 1000.0),
        }],
        ..Tuning::default()
    };
    let mut game = GameLoop::new(&tuning, &mut rng);
    let mut body = FakeBody::grounded();
    let mut hits = FakeCollisions::default();

    let frame = FrameContext {
        scroll_offset: 900.0,
        viewport_width: 640.0,
    };
    let report = game.step(&frame, &Silence, &mut body, &mut hits, &mut rng);
    assert_eq!(report.recycled, 0);
    assert_eq!(game.context().scroller.entities()[0].x, 1000.0);

    let frame = FrameContext {
        scroll_offset: 1051.0,
        viewport_width: 640.0,
    };
    let report = game.step(&frame, &Silence, &mut body, &mut hits, &mut rng);
    assert_eq!(report.recycled, 1);
    let x = game.context().scroller.entities()[0].x;
    assert!((1791.0..=2691.0).contains(&x), "x = {x}");
}

#[test]
fn test_score_follows_scroll() {
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let mut game = new_game(&mut rng);
    let mut body = FakeBody::grounded();
    let frame = FrameContext {
        scroll_offset: 560.0,
        viewport_width: 640.0,
    };
    let report = game.step(
        &frame,
        &Silence,
        &mut body,
        &mut FakeCollisions::default(),
        &mut rng,
    );
    assert_eq!(report.score, Some(100));
}

proptest! {
    #[test]
    fn prop_any_number_of_hits_ends_the_run_once(first in 1usize..40, later in 0usize..40) {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut game = new_game(&mut rng);
        let mut body = FakeBody::grounded();
        let mut hits = FakeCollisions::default();

        hits.push(first);
        let ended = game.step(&start_frame(), &Silence, &mut body, &mut hits, &mut rng).game_over;
        hits.push(later);
        let again = game.step(&start_frame(), &Silence, &mut body, &mut hits, &mut rng).game_over;

        prop_assert!(ended);
        prop_assert!(!again);
        prop_assert_eq!(body.halts, 1);
        prop_assert!(hits.0.is_empty());
    }
}

// =============================================================================
// Arcade world end to end
// =============================================================================

fn arcade_tuning() -> Tuning {
    Tuning {
        entities: vec![EntitySpec {
            name: "cop-car".to_string(),
            kind: EntityKind::Obstacle,
            width: 120.0,
            spawn: Span::new(900.0, 900.0),
            recycle: Span::new(100.0, 1000.0),
        }],
        ..Tuning::default()
    }
}

/// One frame in the order the binary runs it.
fn tick(
    game: &mut GameLoop,
    world: &mut ArcadeWorld,
    source: &dyn EnergySource,
    rng: &mut ChaCha8Rng,
) -> bool {
    let frame = world.frame_context();
    let (runner, hits) = world.parts();
    let report = game.step(&frame, source, runner, hits, rng);
    world.integrate(DT, game.context().scroller.entities());
    report.game_over
}

#[test]
fn test_silent_microphone_leaves_the_dino_standing() {
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let tuning = Tuning::default();
    let mut game = GameLoop::new(&tuning, &mut rng);
    let mut world = ArcadeWorld::new(&tuning.world);

    for _ in 0..100 {
        let frame = world.frame_context();
        let (runner, hits) = world.parts();
        let report = game.step(&frame, &Silence, runner, hits, &mut rng);
        world.integrate(DT, game.context().scroller.entities());
        assert!(!report.jumped());
        assert!(!report.game_over);
    }

    let runner = world.runner();
    assert_eq!(runner.x, 320.0);
    assert_eq!(runner.y, tuning.world.height);
    assert!(runner.grounded);
    assert_eq!(runner.animation(), Animation::Run);
    assert_eq!(world.scroll_offset(), 160.0);
    assert_eq!(game.state(), RunState::Running);
}

#[test]
fn test_running_into_a_car_ends_the_run_and_restart_recovers() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let tuning = arcade_tuning();
    let mut game = GameLoop::new(&tuning, &mut rng);
    let mut world = ArcadeWorld::new(&tuning.world);
    let shout = FixedEnergy { run: 0.5, jump: 0.0 };

    let mut game_overs = 0;
    for _ in 0..300 {
        if tick(&mut game, &mut world, &shout, &mut rng) {
            game_overs += 1;
        }
    }

    assert_eq!(game_overs, 1);
    assert_eq!(game.state(), RunState::Over);
    let runner = world.runner();
    assert_eq!(runner.vx, 0.0);
    assert!(!runner.gravity_enabled);
    assert!(runner.x > 800.0 && runner.x < 960.0, "stopped at {}", runner.x);
    assert_eq!(runner.animation(), Animation::Dead);

    assert!(game.restart(&mut rng));
    world.reset();
    assert_eq!(world.runner().x, 320.0);
    assert_eq!(world.scroll_offset(), 160.0);
    assert!(!tick(&mut game, &mut world, &Silence, &mut rng));
    assert_eq!(game.state(), RunState::Running);
}

#[test]
fn test_jumping_clears_a_car() {
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let tuning = arcade_tuning();
    let mut game = GameLoop::new(&tuning, &mut rng);
    let mut world = ArcadeWorld::new(&tuning.world);

    // build speed, then whistle while approaching the car
    let shout = FixedEnergy { run: 0.3, jump: 0.0 };
    while world.runner().x < 700.0 {
        assert!(!tick(&mut game, &mut world, &shout, &mut rng));
    }
    let whistle = FixedEnergy { run: 0.3, jump: 0.5 };
    let mut jumped = false;
    for _ in 0..600 {
        let frame = world.frame_context();
        let (runner, hits) = world.parts();
        let report = game.step(&frame, &whistle, runner, hits, &mut rng);
        jumped |= report.jumped();
        world.integrate(DT, game.context().scroller.entities());
        assert!(!report.game_over, "hit the car at x = {}", world.runner().x);
        if world.runner().x > 1100.0 {
            break;
        }
    }

    assert!(jumped);
    assert!(world.runner().x > 1100.0);
    assert_eq!(game.state(), RunState::Running);
}

#[test]
fn test_death_animation_settles_into_dead_pose() {
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let tuning = arcade_tuning();
    let mut game = GameLoop::new(&tuning, &mut rng);
    let mut world = ArcadeWorld::new(&tuning.world);
    let (runner, _) = world.parts();
    game.on_collision(
        &Collision {
            obstacle: "cop-car".to_string(),
        },
        runner,
    );
    assert_eq!(world.runner().animation(), Animation::Death);

    let frames = (DEATH_DURATION / DT).ceil() as usize + 1;
    for _ in 0..frames {
        world.integrate(DT, std::iter::empty());
    }
    assert_eq!(world.runner().animation(), Animation::Dead);
}
