//! Physical quantities used throughout the scanner geometry.
//!
//! Thin layer over `uom`: re-exports of the `f32` SI quantities we need,
//! plus pithily-named constructors and extractors, because making values
//! from float literals is otherwise very long-winded.

pub mod todo;

pub use uom;
pub use float_eq;

pub use uom::si::Quantity;
pub use uom::si::f32::{Angle, Area, Length, Ratio, Volume};

mod units {
  pub use uom::si::{length  ::{nanometer, millimeter, centimeter},
                    area    ::square_millimeter,
                    volume  ::cubic_millimeter,
                    ratio   ::ratio,
                    angle   ::{radian, degree},
  };
}

/// The full circle constant (τ) as an `Angle`.
pub fn twopi() -> Angle { radian(std::f32::consts::TAU) }

/// Half a turn: the range covered by the views of a cylindrical scanner.
pub fn pi() -> Angle { radian(std::f32::consts::PI) }

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f32) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(cm     Length         centimeter);
wrap!(mm     Length         millimeter);
wrap!(nm     Length          nanometer);
wrap!(ratio  Ratio               ratio);
wrap!(radian Angle              radian);
wrap!(degree Angle              degree);

// Reverse direction of the above.
pub fn mm_ (x: Length) -> f32 { x.get::<units::millimeter>() }
pub fn cm_ (x: Length) -> f32 { x.get::<units::centimeter>() }
pub fn mm2_(x: Area  ) -> f32 { x.get::<units::square_millimeter>() }
pub fn mm3_(x: Volume) -> f32 { x.get::<units::cubic_millimeter>() }

pub fn ratio_ (x: Ratio) -> f32 { x.get::<uom::si::ratio::ratio>() }
pub fn radian_(x: Angle) -> f32 { x.get::<uom::si::angle::radian>() }
pub fn degree_(x: Angle) -> f32 { x.get::<uom::si::angle::degree>() }


#[macro_export]
macro_rules! assert_uom_eq {
  ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
    $crate::float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
  };
}
