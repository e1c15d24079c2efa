//! Collision and distance tests for the arena's flat geometry
//!
//! Entities and projectiles are circles, walls are axis-aligned rectangles.
//! Every test here is a pure function; callers decide what a hit means.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Parallel-edge tolerance for the segment clipping test
const PARALLEL_EPSILON: f32 = 0.0001;

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Closest point of the rectangle to `p`
    #[inline]
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }

    /// Overlap test where touching edges count as overlapping
    pub fn touches(&self, other: &Rect) -> bool {
        !(self.x + self.width < other.x
            || self.x > other.x + other.width
            || self.y + self.height < other.y
            || self.y > other.y + other.height)
    }
}

/// Euclidean distance
#[inline]
pub fn distance(p1: Vec2, p2: Vec2) -> f32 {
    p1.distance(p2)
}

/// Two circles overlap when their centres are strictly closer than the radii sum
#[inline]
pub fn circle_overlap(c1: Vec2, r1: f32, c2: Vec2, r2: f32) -> bool {
    distance(c1, c2) < r1 + r2
}

/// A point lies inside a circle (strict)
#[inline]
pub fn circle_contains(center: Vec2, radius: f32, p: Vec2) -> bool {
    distance(center, p) < radius
}

/// Circle vs rectangle: clamp the centre onto the rectangle and compare
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Rect) -> bool {
    distance(center, rect.clamp_point(center)) < radius
}

/// Segment vs rectangle, Liang-Barsky clipping
///
/// The parametric interval [0, 1] of `p0 -> p1` is clipped against the four
/// rectangle edges in turn. The segment hits when the interval is still
/// non-empty after the last clip. A segment parallel to an edge and outside
/// it never hits.
///
/// Boundary behaviour: a segment lying exactly on an edge line (q == 0)
/// survives that clip, so segments running along an edge count as hits.
pub fn segment_rect_intersect(p0: Vec2, p1: Vec2, rect: &Rect) -> bool {
    let d = p1 - p0;
    let left = rect.x;
    let right = rect.x + rect.width;
    let top = rect.y;
    let bottom = rect.y + rect.height;

    let clips = [
        (-d.x, p0.x - left),
        (d.x, right - p0.x),
        (-d.y, p0.y - top),
        (d.y, bottom - p0.y),
    ];

    let mut t_min = 0.0_f32;
    let mut t_max = 1.0_f32;

    for (p, q) in clips {
        if p.abs() < PARALLEL_EPSILON {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t_max {
                return false;
            }
            t_min = t_min.max(r);
        } else {
            if r < t_min {
                return false;
            }
            t_max = t_max.min(r);
        }
    }

    t_min <= t_max
}
