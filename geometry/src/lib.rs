mod point;
mod vector;

pub use point::Point;
pub use vector::Vector;

mod cylinder;

pub use cylinder::{line_cylinder_intersections, CylinderCrossing};
