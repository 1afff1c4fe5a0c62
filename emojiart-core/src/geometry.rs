//! Plane geometry shared by the artwork model and the view compositor.
//!
//! Canvas coordinates are offsets from the canvas centre with `y` growing
//! downwards, matching screen space.

use std::f64::consts::TAU;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A location in canvas or screen space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The displacement from the origin to this point.
    #[must_use]
    pub const fn to_offset(self) -> Offset {
        Offset::new(self.x, self.y)
    }
}

/// A displacement between two points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    /// Horizontal component.
    pub dx: f64,
    /// Vertical component.
    pub dy: f64,
}

impl Offset {
    /// No displacement.
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    /// Create an offset.
    #[must_use]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Rotate the offset about the origin.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn rotated(self, angle: Angle) -> Self {
        if angle.radians() == 0.0 {
            return self;
        }
        let (sin, cos) = angle.radians().sin_cos();
        Self {
            dx: self.dx * cos - self.dy * sin,
            dy: self.dx * sin + self.dy * cos,
        }
    }

    /// Whether both components are zero.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_zero(self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// Width and height of a viewport or image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The centre of a rectangle of this size anchored at the origin.
    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether both extents are strictly positive.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// A rotation, normalized into `[0, 2π)`.
///
/// Deserialization goes through [`Angle::from_radians`] in the schema layer,
/// so the range holds for loaded documents too.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Angle(f64);

impl Angle {
    /// No rotation.
    pub const ZERO: Self = Self(0.0);

    /// Create an angle from radians.
    #[must_use]
    pub fn from_radians(radians: f64) -> Self {
        Self(wrap_radians(radians))
    }

    /// Create an angle from degrees.
    #[must_use]
    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    /// The angle in radians, in `[0, 2π)`.
    #[must_use]
    pub const fn radians(self) -> f64 {
        self.0
    }

    /// The angle in degrees, in `[0, 360)`.
    #[must_use]
    pub fn degrees(self) -> f64 {
        self.0.to_degrees()
    }
}

fn wrap_radians(radians: f64) -> f64 {
    if !radians.is_finite() {
        return 0.0;
    }
    let wrapped = radians.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

impl Add for Angle {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_radians(self.0 + rhs.0)
    }
}

impl AddAssign for Angle {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_radians(-self.0)
    }
}

impl Add<Offset> for Point {
    type Output = Self;

    fn add(self, rhs: Offset) -> Self {
        Self::new(self.x + rhs.dx, self.y + rhs.dy)
    }
}

impl Sub<Offset> for Point {
    type Output = Self;

    fn sub(self, rhs: Offset) -> Self {
        Self::new(self.x - rhs.dx, self.y - rhs.dy)
    }
}

impl Sub for Point {
    type Output = Offset;

    fn sub(self, rhs: Self) -> Offset {
        Offset::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Add for Offset {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

impl AddAssign for Offset {
    fn add_assign(&mut self, rhs: Self) {
        self.dx += rhs.dx;
        self.dy += rhs.dy;
    }
}

impl Sub for Offset {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.dx - rhs.dx, self.dy - rhs.dy)
    }
}

impl Neg for Offset {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.dx, -self.dy)
    }
}

impl Mul<f64> for Offset {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.dx * rhs, self.dy * rhs)
    }
}

impl Div<f64> for Offset {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.dx / rhs, self.dy / rhs)
    }
}
