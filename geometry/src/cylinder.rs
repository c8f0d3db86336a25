use units::{mm2_, ratio, Area, Length, Ratio};
use crate::Point;

/// Where a line crosses a cylinder whose axis coincides with the z-axis.
///
/// Both crossings are expressed as the parameter `t` of the line
/// `p1 + t (p2 - p1)`, so `t = 0` is at `p1` and `t = 1` at `p2`.
/// `entry <= exit` always holds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CylinderCrossing {
    pub entry: Ratio,
    pub exit : Ratio,
}

/// Find the two points at which the infinite line passing through `p1` and
/// `p2` crosses the surface of the cylinder of radius `r` around the z-axis.
///
/// Returns `None` if the line is parallel to the axis (or `p1 == p2` in the
/// transaxial plane), or if it passes outside the cylinder.
pub fn line_cylinder_intersections(p1: Point, p2: Point, r: Length) -> Option<CylinderCrossing> {
    let v = p2 - p1;
    // Viète coefficients of |w + t v|^2 = r^2 in the transaxial plane
    let a: Area =       v.x * v.x  + v.y * v.y;
    let b: Area = 2. * (v.x * p1.x + v.y * p1.y);
    let c: Area =      p1.x * p1.x + p1.y * p1.y - r * r;
    let (a, b, c) = (mm2_(a), mm2_(b), mm2_(c));
    if a <= 0.0 { return None }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 { return None }
    let root = discriminant.sqrt();
    Some(CylinderCrossing {
        entry: ratio((-b - root) / (2.0 * a)),
        exit : ratio((-b + root) / (2.0 * a)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use proptest::prelude::*;
    use units::{mm, mm_, ratio_};
    use units::float_eq::assert_float_eq;

    #[rstest(/**/   x1,    y1,    z1,     x2,   y2,    z2,     r, expected,
             case( 10.0, -10.0,  0.0,   10.0, 10.0,   0.0,   1.0, None), // miss completely on right
             case(-10.0,  10.0,  0.0,   10.0, 10.0,   0.0,   2.0, None), // miss completely above
             case(  0.0,   0.0, -5.0,    0.0,  0.0,   5.0,   2.0, None), // along the axis
             case(  0.0, -10.0,  0.0,    0.0, 10.0,   0.0,   5.0, Some((0.25, 0.75))), // along vertical diameter
             case(-10.0,   0.0,  0.0,   10.0,  0.0,   0.0,   4.0, Some((0.3 , 0.7 ))), // along horizontal diameter
             case( 10.0,   0.0,  3.0,  -10.0,  0.0,  -3.0,  20.0, Some((-0.5, 1.5 ))), // endpoints inside cylinder
    )]
    fn crossing_parameters(
        x1: f32, y1: f32, z1: f32,
        x2: f32, y2: f32, z2: f32,
        r: f32,
        expected: Option<(f32, f32)>,
    ) {
        let p1 = Point::from_mm(x1, y1, z1);
        let p2 = Point::from_mm(x2, y2, z2);
        let crossing = line_cylinder_intersections(p1, p2, mm(r))
            .map(|c| (ratio_(c.entry), ratio_(c.exit)));
        match (crossing, expected) {
            (None, None) => {},
            (Some(got), Some(want)) => assert_float_eq!(got, want, abs <= (1e-5, 1e-5)),
            (got, want) => panic!("expected {want:?}, got {got:?}"),
        }
    }

    proptest! {
        #[test]
        fn crossings_lie_on_the_cylinder(
            x1 in -300.0..(300.0 as f32),
            y1 in -300.0..(300.0 as f32),
            z1 in -100.0..(100.0 as f32),
            x2 in -300.0..(300.0 as f32),
            y2 in -300.0..(300.0 as f32),
            z2 in -100.0..(100.0 as f32),
            r  in  350.0..(450.0 as f32),
        ) {
            // Both endpoints inside the cylinder, so the line must cross it twice
            prop_assume!((x1 - x2).abs() + (y1 - y2).abs() > 1.0);
            let p1 = Point::from_mm(x1, y1, z1);
            let p2 = Point::from_mm(x2, y2, z2);
            let c = line_cylinder_intersections(p1, p2, mm(r)).unwrap();
            prop_assert!(c.entry <= c.exit);
            for t in [c.entry, c.exit] {
                let radius = mm_(p1.lerp(p2, t).radius());
                prop_assert!((radius - r).abs() < 1e-2 * r, "{radius} vs {r}");
            }
        }
    }
}
