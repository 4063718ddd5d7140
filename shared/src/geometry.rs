use serde::{Deserialize, Serialize};

/// A 2D vector used for positions, velocities, and translations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Vector2 { x, y }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn normalize(&self) -> Vector2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vector2::ZERO
        } else {
            Vector2::new(self.x / mag, self.y / mag)
        }
    }

    pub fn scale(&self, scalar: f32) -> Vector2 {
        Vector2::new(self.x * scalar, self.y * scalar)
    }

    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(&self, other: &Vector2) -> Vector2 {
        Vector2::new(self.x - other.x, self.y - other.y)
    }

    pub fn dot(&self, other: &Vector2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Reflects this vector about the unit normal `n`: v - 2(v . n)n.
    pub fn reflect(&self, n: &Vector2) -> Vector2 {
        let d = 2.0 * self.dot(n);
        Vector2::new(self.x - d * n.x, self.y - d * n.y)
    }

    pub fn from_angle(angle: f32) -> Vector2 {
        Vector2::new(angle.cos(), angle.sin())
    }

    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }
}

/// Axis-aligned bounding box, closed-open on `[left, right) x [top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Aabb {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Aabb {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Closest point on the box to `(x, y)`, clamped to the box bounds.
    pub fn closest_point(&self, x: f32, y: f32) -> Vector2 {
        Vector2::new(
            x.max(self.left).min(self.right),
            y.max(self.top).min(self.bottom),
        )
    }

    /// Squared distance from `(x, y)` to the closest point on the box.
    pub fn distance_squared(&self, x: f32, y: f32) -> f32 {
        let closest = self.closest_point(x, y);
        let dx = x - closest.x;
        let dy = y - closest.y;
        dx * dx + dy * dy
    }
}

/// Outcome of resolving a circle against an AABB: the corrected center and
/// whether a correction was actually applied.
#[derive(Debug, Clone, Copy)]
pub struct CircleResolution {
    pub x: f32,
    pub y: f32,
    pub normal: Vector2,
    pub adjusted: bool,
}

/// Circle-vs-AABB penetration test and push-out.
///
/// If the circle center lies outside the box, the correction pushes along the
/// normal from the closest point on the box edge. If the center lies inside
/// the box, the correction pushes along whichever axis has the smallest
/// penetration depth.
pub fn resolve_circle_aabb(cx: f32, cy: f32, radius: f32, box_: &Aabb, margin: f32) -> CircleResolution {
    let inside = box_.contains_point(cx, cy);

    if !inside {
        let closest = box_.closest_point(cx, cy);
        let dx = cx - closest.x;
        let dy = cy - closest.y;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq > radius * radius {
            return CircleResolution {
                x: cx,
                y: cy,
                normal: Vector2::ZERO,
                adjusted: false,
            };
        }
        let dist = dist_sq.sqrt();
        let normal = if dist > 0.0001 {
            Vector2::new(dx / dist, dy / dist)
        } else {
            Vector2::new(1.0, 0.0)
        };
        let push = radius + margin;
        return CircleResolution {
            x: closest.x + normal.x * push,
            y: closest.y + normal.y * push,
            normal,
            adjusted: true,
        };
    }

    let left_d = cx - box_.left;
    let right_d = box_.right - cx;
    let top_d = cy - box_.top;
    let bottom_d = box_.bottom - cy;

    let min_d = left_d.min(right_d).min(top_d).min(bottom_d);

    let (nx, ny, x, y) = if min_d == left_d {
        (-1.0, 0.0, box_.left - radius - margin, cy)
    } else if min_d == right_d {
        (1.0, 0.0, box_.right + radius + margin, cy)
    } else if min_d == top_d {
        (0.0, -1.0, cx, box_.top - radius - margin)
    } else {
        (0.0, 1.0, cx, box_.bottom + radius + margin)
    };

    CircleResolution {
        x,
        y,
        normal: Vector2::new(nx, ny),
        adjusted: true,
    }
}

/// True if a circle of the given radius intersects the box at all.
pub fn circle_intersects_aabb(cx: f32, cy: f32, radius: f32, box_: &Aabb) -> bool {
    box_.distance_squared(cx, cy) <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn reflect_about_vertical_normal_flips_x() {
        let v = Vector2::new(3.0, 4.0);
        let n = Vector2::new(1.0, 0.0);
        let r = v.reflect(&n);
        assert_approx_eq!(r.x, -3.0);
        assert_approx_eq!(r.y, 4.0);
    }

    #[test]
    fn normalize_zero_vector_stays_zero() {
        let v = Vector2::ZERO;
        assert_eq!(v.normalize(), Vector2::ZERO);
    }

    #[test]
    fn resolve_circle_outside_box_pushes_along_normal() {
        let box_ = Aabb::new(0.0, 0.0, 100.0, 100.0);
        let res = resolve_circle_aabb(-2.0, 50.0, 5.0, &box_, 0.1);
        assert!(res.adjusted);
        assert!(res.x < 0.0);
        assert_approx_eq!(res.y, 50.0);
    }

    #[test]
    fn resolve_circle_far_outside_box_not_adjusted() {
        let box_ = Aabb::new(0.0, 0.0, 100.0, 100.0);
        let res = resolve_circle_aabb(-500.0, 50.0, 5.0, &box_, 0.1);
        assert!(!res.adjusted);
    }

    #[test]
    fn resolve_circle_inside_box_pushes_to_nearest_edge() {
        let box_ = Aabb::new(0.0, 0.0, 100.0, 40.0);
        let res = resolve_circle_aabb(50.0, 35.0, 5.0, &box_, 0.1);
        assert!(res.adjusted);
        assert!(res.y > 35.0);
    }
}
