//! Deterministic simulation module
//!
//! Square physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only (velocity is units per tick, never wall-clock scaled)
//! - Seeded RNG only (start placement)
//! - Stable event order (primary before secondary, x before y)
//! - No rendering, storage or platform dependencies

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{aabb_overlap, reflect_horizontal, reflect_vertical};
pub use state::{Body, BodyId, Bounds, Side, World};
pub use tick::{StepEvent, StepReport, StepResult, step};
