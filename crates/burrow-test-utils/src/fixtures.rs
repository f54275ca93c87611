//! Fixture records.
//!
//! Components and resources are `Pod`; tags are plain marker types.

use bytemuck::{Pod, Zeroable};

/// 2D position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 2D velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

impl Velocity {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

/// Hit points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }
}

/// Relation payload: what the source entity dies from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct DiesBy {
    pub cause: u32,
}

/// Global simulation clock, used as a resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Tick {
    pub step: u64,
    pub dt: f32,
    pub _pad: u32,
}

/// Marks the player entity.
pub struct Player;

/// Marks hostile entities.
pub struct Enemy;

/// Relation target tag: things that burn.
pub struct Burning;
