use std::ops::{Add, Sub};
use units::{mm, mm_, Length, Ratio, ratio_};
use crate::Vector;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: Length,
    pub y: Length,
    pub z: Length,
}

impl Point {
    pub fn new(x: Length, y: Length, z: Length) -> Self { Self { x, y, z } }

    pub fn zero() -> Self { Self::new(mm(0.0), mm(0.0), mm(0.0)) }

    /// Construct from `f32`s which are interpreted as lengths in `mm`
    pub fn from_mm(x: f32, y: f32, z: f32) -> Self { Self::new(mm(x), mm(y), mm(z)) }

    /// Components in `mm`, for use in inner loops
    pub fn to_mm(self) -> [f32; 3] { [mm_(self.x), mm_(self.y), mm_(self.z)] }

    /// The point a fraction `t` of the way from `self` to `other`.
    /// `t` outside `[0,1]` extrapolates along the same line.
    pub fn lerp(self, other: Self, t: Ratio) -> Self {
        let t = ratio_(t);
        self + (other - self) * t
    }

    /// Distance from the z-axis
    pub fn radius(&self) -> Length { (self.x * self.x + self.y * self.y).sqrt() }
}

impl Sub for Point {
    type Output = Vector;
    fn sub(self, rhs: Self) -> Self::Output {
        Vector {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Add<Vector> for Point {
    type Output = Self;
    fn add(self, rhs: Vector) -> Self::Output {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({:8.2} {:8.2} {:8.2}) mm", mm_(self.x), mm_(self.y), mm_(self.z))
    }
}
