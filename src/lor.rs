use std::f32::consts::{PI, TAU};

use geometry::{line_cylinder_intersections, Point};
use units::{mm, mm_, radian, radian_, Angle, Length};


/// Line Of Response.
///
/// The positions of the two coincident detections, in scanner coordinates:
/// `x` and `y` transaxial with the scanner axis at the origin, `z` along the
/// axis, measured from the centre of ring 0.
#[derive(Clone, Copy, Debug, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub struct LOR {
    pub p1: Point,
    pub p2: Point,
}

impl LOR {
    pub fn new(p1: Point, p2: Point) -> Self { Self { p1, p2 } }

    pub fn from_components((x1, y1, z1): (Length, Length, Length),
                           (x2, y2, z2): (Length, Length, Length),
                          ) -> Self
    {
        Self::new(Point::new(x1,y1,z1), Point::new(x2,y2,z2))
    }

    /// Find the sinogram parametrization of the points where this line
    /// crosses a cylinder of radius `ring_radius`.
    ///
    /// `None` when the line never crosses the cylinder: it is parallel to the
    /// scanner axis, or passes entirely outside the cylinder.
    pub fn change_representation(&self, ring_radius: Length) -> Option<LORInAxialAndSinogramCoordinates> {
        let crossing = line_cylinder_intersections(self.p1, self.p2, ring_radius)?;
        let first  = self.p1.lerp(self.p2, crossing.entry);
        let second = self.p1.lerp(self.p2, crossing.exit);
        let [x1, y1, z1] = first .to_mm();
        let [x2, y2, z2] = second.to_mm();
        // Direction from first to second detection is (-sin phi, cos phi)
        let phi = (-(x2 - x1)).atan2(y2 - y1);
        let s = x1 * phi.cos() + y1 * phi.sin();
        Some(LORInAxialAndSinogramCoordinates::normalized(phi, s, z1, z2))
    }
}

use core::fmt;
impl fmt::Display for LOR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (p, q) = (self.p1, self.p2);
        write!(f, "<LOR ({:8.2} {:8.2} {:8.2}) ({:8.2} {:8.2} {:8.2}) /{:7.2} >",
               mm_(p.x), mm_(p.y), mm_(p.z),
               mm_(q.x), mm_(q.y), mm_(q.z),
               mm_((q-p).magnitude())
        )
    }
}

// --------------------------------------------------------------------------------

/// A LOR described by the points where it crosses the detector cylinder.
///
/// + `phi`: azimuthal angle of the normal to the LOR, in `[0, π)`
/// + `s`  : signed distance of the LOR from the scanner axis
/// + `z1`, `z2`: axial positions of the first and second crossing
///
/// The direction from the first to the second crossing is `(-sin φ, cos φ)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LORInAxialAndSinogramCoordinates {
    pub phi: Angle,
    pub s  : Length,
    pub z1 : Length,
    pub z2 : Length,
}

impl LORInAxialAndSinogramCoordinates {

    /// Bring `phi` into `[0, π)`. Every half turn reverses the direction of
    /// the LOR, which flips the sign of `s` and swaps the crossings.
    fn normalized(mut phi: f32, mut s: f32, mut z1: f32, mut z2: f32) -> Self {
        phi = phi.rem_euclid(TAU);
        while phi >= PI {
            phi -= PI;
            s = -s;
            std::mem::swap(&mut z1, &mut z2);
        }
        Self { phi: radian(phi), s: mm(s), z1: mm(z1), z2: mm(z2) }
    }

    /// Build from arbitrary `phi`, normalizing it into `[0, π)`.
    pub fn new(phi: Angle, s: Length, z1: Length, z2: Length) -> Self {
        Self::normalized(radian_(phi), mm_(s), mm_(z1), mm_(z2))
    }

    /// The crossings with the cylinder of radius `ring_radius`, as a
    /// cartesian LOR. `None` if `|s|` exceeds the radius.
    pub fn to_cartesian(&self, ring_radius: Length) -> Option<LOR> {
        let (r, s) = (mm_(ring_radius), mm_(self.s));
        if s.abs() > r { return None }
        let half_chord = (r * r - s * s).sqrt();
        let (sin, cos) = radian_(self.phi).sin_cos();
        // Closest approach to the axis, and direction along the LOR
        let (cx, cy) = ( s * cos, s * sin);
        let (ux, uy) = (-sin    ,     cos);
        let p1 = Point::new(mm(cx - half_chord * ux), mm(cy - half_chord * uy), self.z1);
        let p2 = Point::new(mm(cx + half_chord * ux), mm(cy + half_chord * uy), self.z2);
        Some(LOR::new(p1, p2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use proptest::prelude::*;
    use float_eq::assert_float_eq;

    const R: f32 = 350.0;

    fn sino(lor: LOR) -> (f32, f32, f32, f32) {
        let c = lor.change_representation(mm(R)).unwrap();
        (radian_(c.phi), mm_(c.s), mm_(c.z1), mm_(c.z2))
    }

    fn lor((x1,y1,z1): (f32, f32, f32), (x2,y2,z2): (f32, f32, f32)) -> LOR {
        LOR::new(Point::from_mm(x1,y1,z1), Point::from_mm(x2,y2,z2))
    }

    const FRAC_PI_2: f32 = std::f32::consts::FRAC_PI_2;

    #[rstest(/**/       p1        ,         p2       ,  phi     ,    s ,  z1 ,  z2 ,
             // Travelling in +y: phi = 0, s = x
             case((  10.0, -1.0, 5.0), ( 10.0, 1.0, 7.0),  0.0      ,  10.0, 5.0, 7.0),
             // Travelling in -y: reversed, so z1 and z2 swap and s flips
             case((  10.0,  1.0, 7.0), ( 10.0,-1.0, 5.0),  0.0      ,  10.0, 5.0, 7.0),
             // Travelling in -x: phi = pi/2, s = y
             case((   1.0, 20.0, 3.0), ( -1.0,20.0, 3.0),  FRAC_PI_2,  20.0, 3.0, 3.0),
             // Travelling in +x: reversed
             case((  -1.0, 20.0, 2.0), (  1.0,20.0, 4.0),  FRAC_PI_2,  20.0, 4.0, 2.0),
    )]
    fn axis_aligned_lors(
        p1: (f32, f32, f32), p2: (f32, f32, f32),
        phi: f32, s: f32, z1: f32, z2: f32,
    ) {
        // z of the crossings are extrapolated along the line
        let (got_phi, got_s, got_z1, got_z2) = sino(lor(p1, p2));
        assert_float_eq!(got_phi, phi, abs <= 1e-6);
        assert_float_eq!(got_s  , s  , abs <= 1e-3);
        // Only check z when the LOR is transaxial
        if z1 == z2 {
            assert_float_eq!((got_z1, got_z2), (z1, z2), abs <= (1e-3, 1e-3));
        } else {
            // Reversing the LOR must exchange the ends
            assert!((got_z1 < got_z2) == (z1 < z2));
        }
    }

    #[test]
    fn lor_outside_cylinder_has_no_representation() {
        let far = lor((400.0, -10.0, 0.0), (400.0, 10.0, 0.0));
        assert!(far.change_representation(mm(R)).is_none());
        let axial = lor((10.0, 10.0, 0.0), (10.0, 10.0, 50.0));
        assert!(axial.change_representation(mm(R)).is_none());
    }

    #[test]
    fn phi_is_normalized_into_half_turn() {
        let c = LORInAxialAndSinogramCoordinates::new(radian(PI + 0.25), mm(3.0), mm(1.0), mm(2.0));
        assert_float_eq!(radian_(c.phi), 0.25, abs <= 1e-6);
        assert_float_eq!(mm_(c.s), -3.0, abs <= 1e-6);
        assert_float_eq!((mm_(c.z1), mm_(c.z2)), (2.0, 1.0), abs <= (1e-6, 1e-6));
    }

    #[test]
    fn s_beyond_radius_has_no_cartesian_form() {
        let c = LORInAxialAndSinogramCoordinates::new(radian(0.3), mm(R + 1.0), mm(0.0), mm(0.0));
        assert!(c.to_cartesian(mm(R)).is_none());
    }

    proptest! {
        #[test]
        fn sinogram_cartesian_roundtrip(
            phi in 0.0 .. PI,
            s   in -300.0 .. (300.0 as f32),
            z1  in    0.0 .. (100.0 as f32),
            z2  in    0.0 .. (100.0 as f32),
        ) {
            let original = LORInAxialAndSinogramCoordinates::new(radian(phi), mm(s), mm(z1), mm(z2));
            let lor = original.to_cartesian(mm(R)).unwrap();
            let back = lor.change_representation(mm(R)).unwrap();
            // phi close to 0 may come back close to pi, with everything reversed
            let (mut bphi, mut bs, mut bz1, mut bz2) = (radian_(back.phi), mm_(back.s), mm_(back.z1), mm_(back.z2));
            if (bphi - phi).abs() > PI / 2.0 {
                bphi -= PI * (bphi - phi).signum();
                bs = -bs;
                std::mem::swap(&mut bz1, &mut bz2);
            }
            prop_assert!((bphi - phi).abs() < 1e-3, "phi {phi} -> {bphi}");
            prop_assert!((bs   - s  ).abs() < 1e-1, "s {s} -> {bs}");
            prop_assert!((bz1  - z1 ).abs() < 1e-1, "z1 {z1} -> {bz1}");
            prop_assert!((bz2  - z2 ).abs() < 1e-1, "z2 {z2} -> {bz2}");
        }
    }
}
