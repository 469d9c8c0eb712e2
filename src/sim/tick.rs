//! Fixed timestep simulation tick
//!
//! Advances both squares deterministically and reports every wall contact and
//! the collision (if any) as separate events.

use super::collision::{aabb_overlap, reflect_horizontal, reflect_vertical};
use super::state::{Body, BodyId, Bounds, Side};

/// One thing that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    WallHit { body: BodyId, side: Side },
    Collided,
}

impl StepEvent {
    /// Log message for this event
    pub fn message(&self) -> String {
        match self {
            StepEvent::WallHit { body, side } => {
                format!("{} square: hit {} wall", body.name(), side.as_str())
            }
            StepEvent::Collided => "Squares collided! Animation stopped".to_string(),
        }
    }
}

/// Summary of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Continued,
    WallHit(BodyId, Side),
    Collided,
}

/// Everything a tick produced, in deterministic order:
/// primary before secondary, horizontal before vertical, collision last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    pub events: Vec<StepEvent>,
}

impl StepReport {
    pub fn collided(&self) -> bool {
        self.events.last() == Some(&StepEvent::Collided)
    }

    pub fn wall_hits(&self) -> impl Iterator<Item = (BodyId, Side)> + '_ {
        self.events.iter().filter_map(|e| match *e {
            StepEvent::WallHit { body, side } => Some((body, side)),
            StepEvent::Collided => None,
        })
    }

    /// Collapse to a single result (collision wins, then the first wall hit)
    pub fn result(&self) -> StepResult {
        if self.collided() {
            return StepResult::Collided;
        }
        match self.wall_hits().next() {
            Some((body, side)) => StepResult::WallHit(body, side),
            None => StepResult::Continued,
        }
    }
}

/// Advance both bodies by one tick of `dt`.
pub fn step(primary: &mut Body, secondary: &mut Body, bounds: &Bounds, dt: f32) -> StepReport {
    let mut report = StepReport::default();

    primary.position += primary.velocity * dt;
    secondary.position += secondary.velocity * dt;

    for (id, body) in [(BodyId::Primary, &mut *primary), (BodyId::Secondary, &mut *secondary)] {
        if let Some(side) = reflect_horizontal(body, bounds) {
            report.events.push(StepEvent::WallHit { body: id, side });
        }
        if let Some(side) = reflect_vertical(body, bounds) {
            report.events.push(StepEvent::WallHit { body: id, side });
        }
    }

    if aabb_overlap(primary, secondary) {
        report.events.push(StepEvent::Collided);
    }

    report
}
