//! Simulation state types
//!
//! Exactly two bodies exist per session; everything here is plain data that
//! the tick function mutates in place.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Which of the two squares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyId {
    Primary,
    Secondary,
}

impl BodyId {
    /// Display name used in log messages
    pub fn name(&self) -> &'static str {
        match self {
            BodyId::Primary => "Blue",
            BodyId::Secondary => "Orange",
        }
    }
}

/// Wall of the bounded area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Top => "top",
            Side::Bottom => "bottom",
        }
    }
}

/// Size of the bounded area. Origin is the top-left corner, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether a square of `size` can be placed inside
    pub fn fits(&self, size: f32) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.width > size
            && self.height > size
    }
}

/// A moving square
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner
    pub position: Vec2,
    pub velocity: Vec2,
    /// Edge length
    pub size: f32,
}

impl Body {
    pub fn new(position: Vec2, velocity: Vec2, size: f32) -> Self {
        Self {
            position,
            velocity,
            size,
        }
    }

    /// Bottom-right corner
    pub fn max(&self) -> Vec2 {
        self.position + Vec2::splat(self.size)
    }
}

/// The pair of squares plus the config needed to respawn them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub primary: Body,
    pub secondary: Body,
    /// False until a placement succeeded against valid bounds
    pub placed: bool,
    primary_velocity: Vec2,
    secondary_velocity: Vec2,
    size: f32,
}

impl World {
    pub fn new(size: f32, primary_velocity: Vec2, secondary_velocity: Vec2) -> Self {
        Self {
            primary: Body::new(Vec2::ZERO, primary_velocity, size),
            secondary: Body::new(Vec2::ZERO, secondary_velocity, size),
            placed: false,
            primary_velocity,
            secondary_velocity,
            size,
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn body(&self, id: BodyId) -> &Body {
        match id {
            BodyId::Primary => &self.primary,
            BodyId::Secondary => &self.secondary,
        }
    }

    /// Place both squares at fresh start positions.
    ///
    /// Primary sits against the right wall at a random height, secondary sits
    /// against the bottom wall at a random horizontal offset. Velocities reset to
    /// their configured initial values. Returns false (and leaves the bodies
    /// untouched) when the bounds cannot hold a square.
    pub fn place(&mut self, bounds: Bounds, rng: &mut Pcg32) -> bool {
        if !bounds.fits(self.size) {
            return false;
        }

        let free_x = bounds.width - self.size;
        let free_y = bounds.height - self.size;

        self.primary = Body::new(
            Vec2::new(free_x, rng.random_range(0.0..free_y)),
            self.primary_velocity,
            self.size,
        );
        self.secondary = Body::new(
            Vec2::new(rng.random_range(0.0..free_x), free_y),
            self.secondary_velocity,
            self.size,
        );
        self.placed = true;
        true
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(
            SQUARE_SIZE,
            Vec2::from(PRIMARY_VELOCITY),
            Vec2::from(SECONDARY_VELOCITY),
        )
    }
}
