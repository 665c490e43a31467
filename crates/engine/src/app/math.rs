use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_heading(heading_radians: f32) -> Self {
        Self {
            x: heading_radians.cos(),
            y: heading_radians.sin(),
        }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub fn offset(self, delta: Vec2) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
        }
    }

    pub fn minus(self, other: Vec2) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.minus(b).length()
}

/// True when two circles strictly overlap; touching circles do not.
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    distance(a, b) < radius_a + radius_b
}

/// Like `f32::clamp` but tolerant of an inverted range, which happens when the
/// world is smaller than the viewport.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if max < min {
        return min;
    }
    value.clamp(min, max)
}

/// Seeded source for world generation. Same seed, same world.
#[derive(Debug, Clone)]
pub struct WorldRng(SmallRng);

impl WorldRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.0.gen_range(min..max)
    }

    pub fn range_inclusive_u32(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        self.0.gen_range(min..=max)
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.0.gen_range(0..items.len());
        items.get(index)
    }

    pub fn chance(&mut self, probability: f32) -> bool {
        self.0.gen::<f32>() < probability
    }
}
