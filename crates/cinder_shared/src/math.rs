//! World-space math types.
//!
//! Everything here is plain `Copy` data. Positions and radii in the spatial
//! grid are expressed with these types.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 2D Vector - positions, velocities, directions
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a vector with both components set to `v`
    #[must_use]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v)
    }

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 2]) -> Self {
        Self::new(arr[0], arr[1])
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross product)
    #[must_use]
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Distance squared (avoids sqrt)
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self * (1.0 / len)
        } else {
            Self::ZERO
        }
    }

    /// Component-wise minimum
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Clamps each component into `[lo, hi]`
    #[must_use]
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        Self::new(self.x.max(lo.x).min(hi.x), self.y.max(lo.y).min(hi.y))
    }

    /// Returns true if both components are finite
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::Div<f32> for Vec2 {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// How one rect relates to another, see [`Rect::classify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RectClass {
    /// Fully contained.
    Inside,
    /// No overlap at all.
    Outside,
    /// Partial overlap.
    Overlap,
}

/// Axis-aligned rectangle with inclusive corners `(x0, y0)`..`(x1, y1)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum x
    pub x0: f32,
    /// Minimum y
    pub y0: f32,
    /// Maximum x
    pub x1: f32,
    /// Maximum y
    pub y1: f32,
}

impl Rect {
    /// Creates a rect from absolute corners.
    #[must_use]
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Creates a rect from an origin and a size.
    #[must_use]
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self::new(origin.x, origin.y, origin.x + size.x, origin.y + size.y)
    }

    /// Smallest rect containing both points, in any order.
    #[must_use]
    pub fn bound(a: Vec2, b: Vec2) -> Self {
        let lo = a.min(b);
        let hi = a.max(b);
        Self::new(lo.x, lo.y, hi.x, hi.y)
    }

    /// Square bound of a circle.
    #[must_use]
    pub fn around(center: Vec2, radius: f32) -> Self {
        Self::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        )
    }

    /// Overlapping region of two rects (may be inverted if they are disjoint).
    #[must_use]
    pub fn intersect(a: Self, b: Self) -> Self {
        Self::new(a.x0.max(b.x0), a.y0.max(b.y0), a.x1.min(b.x1), a.y1.min(b.y1))
    }

    /// Smallest rect containing both rects.
    #[must_use]
    pub fn combine(a: Self, b: Self) -> Self {
        Self::new(a.x0.min(b.x0), a.y0.min(b.y0), a.x1.max(b.x1), a.y1.max(b.y1))
    }

    /// Classifies `other` relative to `self`.
    #[must_use]
    pub fn classify(&self, other: &Self) -> RectClass {
        if other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
        {
            RectClass::Inside
        } else if other.x0 > self.x1 || other.x1 < self.x0 || other.y0 > self.y1 || other.y1 < self.y0
        {
            RectClass::Outside
        } else {
            RectClass::Overlap
        }
    }

    /// Returns true if `p` lies inside or on the edge.
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1
    }

    /// Point of the rect nearest to `p`.
    #[must_use]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }

    /// Minimum corner
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        Vec2::new(self.x0, self.y0)
    }

    /// Maximum corner
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        Vec2::new(self.x1, self.y1)
    }

    /// Width
    #[must_use]
    pub fn dx(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Height
    #[must_use]
    pub fn dy(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Width and height as a vector
    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.dx(), self.dy())
    }
}
