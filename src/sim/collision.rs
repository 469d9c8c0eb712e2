//! Wall contact and square-square overlap tests
//!
//! Everything is axis-aligned, so each axis is resolved independently.

use super::state::{Body, Bounds, Side};

/// Axis-aligned bounding-box overlap (touching edges do not count)
pub fn aabb_overlap(a: &Body, b: &Body) -> bool {
    let (a_min, a_max) = (a.position, a.max());
    let (b_min, b_max) = (b.position, b.max());
    a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
}

/// Resolve horizontal wall contact: clamp onto the wall and flip x velocity.
pub fn reflect_horizontal(body: &mut Body, bounds: &Bounds) -> Option<Side> {
    if body.position.x + body.size > bounds.width {
        body.position.x = bounds.width - body.size;
        body.velocity.x = -body.velocity.x;
        Some(Side::Right)
    } else if body.position.x < 0.0 {
        body.position.x = 0.0;
        body.velocity.x = -body.velocity.x;
        Some(Side::Left)
    } else {
        None
    }
}

/// Resolve vertical wall contact: clamp onto the wall and flip y velocity.
pub fn reflect_vertical(body: &mut Body, bounds: &Bounds) -> Option<Side> {
    if body.position.y + body.size > bounds.height {
        body.position.y = bounds.height - body.size;
        body.velocity.y = -body.velocity.y;
        Some(Side::Bottom)
    } else if body.position.y < 0.0 {
        body.position.y = 0.0;
        body.velocity.y = -body.velocity.y;
        Some(Side::Top)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn square(x: f32, y: f32) -> Body {
        Body::new(Vec2::new(x, y), Vec2::ZERO, 15.0)
    }

    #[test]
    fn test_overlap_detected() {
        assert!(aabb_overlap(&square(10.0, 10.0), &square(12.0, 12.0)));
    }

    #[test]
    fn test_far_apart_no_overlap() {
        assert!(!aabb_overlap(&square(0.0, 0.0), &square(100.0, 100.0)));
    }

    #[test]
    fn test_touching_edges_no_overlap() {
        assert!(!aabb_overlap(&square(0.0, 0.0), &square(15.0, 0.0)));
        assert!(!aabb_overlap(&square(0.0, 0.0), &square(0.0, 15.0)));
    }

    #[test]
    fn test_overlap_symmetric() {
        let a = square(3.0, 40.0);
        let b = square(10.0, 50.0);
        assert_eq!(aabb_overlap(&a, &b), aabb_overlap(&b, &a));
    }

    #[test]
    fn test_reflect_right_wall() {
        let bounds = Bounds::new(200.0, 200.0);
        let mut body = Body::new(Vec2::new(186.5, 50.0), Vec2::new(2.2, 1.6), 15.0);
        assert_eq!(reflect_horizontal(&mut body, &bounds), Some(Side::Right));
        assert_eq!(body.position.x, 185.0);
        assert_eq!(body.velocity.x, -2.2);
        assert_eq!(body.velocity.y, 1.6);
    }

    #[test]
    fn test_reflect_left_and_top() {
        let bounds = Bounds::new(200.0, 200.0);
        let mut body = Body::new(Vec2::new(-0.5, -1.0), Vec2::new(-1.8, -1.3), 15.0);
        assert_eq!(reflect_horizontal(&mut body, &bounds), Some(Side::Left));
        assert_eq!(reflect_vertical(&mut body, &bounds), Some(Side::Top));
        assert_eq!(body.position, Vec2::ZERO);
        assert_eq!(body.velocity, Vec2::new(1.8, 1.3));
    }

    #[test]
    fn test_flush_against_wall_is_not_a_hit() {
        let bounds = Bounds::new(200.0, 200.0);
        let mut body = Body::new(Vec2::new(185.0, 185.0), Vec2::new(1.0, 1.0), 15.0);
        assert_eq!(reflect_horizontal(&mut body, &bounds), None);
        assert_eq!(reflect_vertical(&mut body, &bounds), None);
    }
}
