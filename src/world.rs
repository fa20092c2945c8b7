//! Endless world made from a fixed pool of entities.
//!
//! Nothing is ever spawned or despawned while running: once an entity has
//! scrolled fully past the camera's trailing edge it is moved to a random spot
//! ahead of the viewport instead.

use rand::Rng;
use serde::Deserialize;

/// A closed range of world units.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Span {
    pub start: f32,
    pub end: f32,
}

impl Span {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Uniform pick in `[base + start, base + end]`.
    pub fn pick<R: Rng + ?Sized>(&self, base: f32, rng: &mut R) -> f32 {
        if self.end > self.start {
            base + rng.gen_range(self.start..=self.end)
        } else {
            base + self.start
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.start && value <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Scenery; never collides.
    Decoration,
    Obstacle,
}

/// How an entity is laid out, as read from configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntitySpec {
    pub name: String,
    pub kind: EntityKind,
    pub width: f32,
    /// Absolute x range used at the start of every run.
    pub spawn: Span,
    /// Offsets past the viewport's right edge used when recycling.
    pub recycle: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollableEntity {
    pub name: String,
    pub kind: EntityKind,
    /// Left edge in world units.
    pub x: f32,
    pub width: f32,
    pub recycle: Span,
    pub spawn: Span,
}

impl ScrollableEntity {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn is_obstacle(&self) -> bool {
        self.kind == EntityKind::Obstacle
    }

    /// True once the whole entity lies left of `scroll_offset`.
    pub fn has_scrolled_past(&self, scroll_offset: f32) -> bool {
        self.right() < scroll_offset
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldScroller {
    entities: Vec<ScrollableEntity>,
}

impl WorldScroller {
    pub fn new<R: Rng + ?Sized>(specs: &[EntitySpec], rng: &mut R) -> Self {
        let mut scroller = Self {
            entities: specs
                .iter()
                .map(|spec| ScrollableEntity {
                    name: spec.name.clone(),
                    kind: spec.kind,
                    x: spec.spawn.start,
                    width: spec.width,
                    recycle: spec.recycle,
                    spawn: spec.spawn,
                })
                .collect(),
        };
        scroller.reset(rng);
        scroller
    }

    pub fn entities(&self) -> &[ScrollableEntity] {
        &self.entities
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &ScrollableEntity> {
        self.entities.iter().filter(|e| e.is_obstacle())
    }

    /// Move every entity that has left the view to a fresh spot ahead of it.
    /// Returns how many entities moved.
    pub fn recycle<R: Rng + ?Sized>(
        &mut self,
        scroll_offset: f32,
        viewport_width: f32,
        rng: &mut R,
    ) -> usize {
        let right_edge = scroll_offset + viewport_width;
        let mut moved = 0;
        for entity in &mut self.entities {
            if entity.has_scrolled_past(scroll_offset) {
                entity.x = entity.recycle.pick(right_edge, rng);
                moved += 1;
            }
        }
        moved
    }

    /// Put every entity back inside its spawn range.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for entity in &mut self.entities {
            entity.x = entity.spawn.pick(0.0, rng);
        }
    }
}
