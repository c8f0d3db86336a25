use geometry::{line_cylinder_intersections, Point};
use units::{mm, mm_, pi, radian_, twopi, Angle, Length};
use tracing::{debug, trace};

use crate::error::{ensure_config, Result};
use crate::{Bin, LOR};

use super::{ProjDataInfo, ProjDataInfoCylindrical};

/// The two crystals of a coincidence, identified by their position around
/// the ring and the ring they belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DetectionPair {
    pub det1 : i32,
    pub ring1: i32,
    pub det2 : i32,
    pub ring2: i32,
}

/// Cylindrical projection data sampled as the detectors see it: tangential
/// positions are uniformly spaced in angle, so `s = R sin(t α)`.
///
/// Detector `d` sits at azimuth `d · 2π / N`. Each pair of detectors maps to
/// exactly one bin, which requires one view per two detectors (no angular
/// mashing).
#[derive(Clone, Debug, PartialEq)]
pub struct ProjDataInfoCylindricalNoArcCorr {
    base: ProjDataInfoCylindrical,
    /// Effective radius used to convert tangential positions into `s`
    ring_radius: Length,
    angular_increment: Angle,
}

impl ProjDataInfoCylindricalNoArcCorr {

    pub fn new(base: ProjDataInfoCylindrical, ring_radius: Length) -> Result<Self> {
        let n = base.scanner().num_detectors_per_ring();
        ensure_config!(n % 2 == 0, "number of detectors per ring must be even, got {n}");
        ensure_config!(base.num_views() * 2 == n,
                       "non-arc-corrected data needs {} views for {n} detectors per ring, got {}",
                       n / 2, base.num_views());
        ensure_config!(base.num_tangential_poss() <= n,
                       "{} tangential positions exceed {n} detectors per ring", base.num_tangential_poss());
        ensure_config!(mm_(ring_radius) > 0.0, "ring radius must be positive, got {} mm", mm_(ring_radius));
        let angular_increment = pi() / n as f32;
        let info = Self { base, ring_radius, angular_increment };
        debug!("{}", info.parameter_info());
        Ok(info)
    }

    pub fn ring_radius      (&self) -> Length { self.ring_radius }
    pub fn angular_increment(&self) -> Angle  { self.angular_increment }

    fn num_detectors(&self) -> i32 { self.base.scanner().num_detectors_per_ring() as i32 }

    /// Centre of the front face of the crystal
    pub fn detector_position(&self, det: i32, ring: i32) -> Point {
        let r = mm_(self.base.ring_radius());
        let (sin, cos) = radian_(twopi() * (det as f32 / self.num_detectors() as f32)).sin_cos();
        Point::new(mm(r * cos), mm(r * sin), self.base.ring_spacing() * ring as f32)
    }

    /// The detector nearest to where a LOR hits the detector cylinder
    fn nearest_detector(&self, p: Point) -> (i32, i32) {
        let n = self.num_detectors();
        let [x, y, z] = p.to_mm();
        let det = (y.atan2(x) / radian_(twopi() / n as f32)).round() as i32;
        let ring = (z / mm_(self.base.ring_spacing())).round() as i32;
        (det.rem_euclid(n), ring)
    }

    /// The bin recording coincidences between `(det1, ring1)` and
    /// `(det2, ring2)`. The order of the two detections does not matter.
    pub fn get_bin_for_det_pair(&self, det1: i32, ring1: i32, det2: i32, ring2: i32) -> Option<Bin> {
        let bin = self.bin_for_det_pair(det1, ring1, det2, ring2);
        bin.is_valid().then_some(bin)
    }

    fn bin_for_det_pair(&self, det1: i32, ring1: i32, det2: i32, ring2: i32) -> Bin {
        let n = self.num_detectors();
        if !(0..n).contains(&det1) || !(0..n).contains(&det2) || det1 == det2 {
            trace!(det1, det2, "no bin for detector pair");
            return Bin::invalid()
        }
        // Twice the azimuth of the LOR normal, and the angular separation of
        // the detectors, both in units of half a detector pitch
        let mut k  = det1 + det2;
        let mut dd = det2 - det1;
        if dd < 0 {
            dd += n;
            k  += n;
        }
        k = k.rem_euclid(2 * n);
        let mut t = n / 2 - dd;
        let (mut ring1, mut ring2) = (ring1, ring2);
        if k >= n {
            k -= n;
            t = -t;
            std::mem::swap(&mut ring1, &mut ring2);
        }
        let base = &self.base;
        let mut bin = Bin::new(0, k / 2, 0, t).with_value(1.0);
        match base.get_segment_axial_pos_num_for_ring_pair(ring1, ring2) {
            Some((segment_num, axial_pos_num)) => {
                bin.segment_num   = segment_num;
                bin.axial_pos_num = axial_pos_num;
            },
            None => {
                trace!(ring1, ring2, "ring pair outside scanner or segments");
                return bin.with_value(Bin::INVALID_VALUE)
            },
        }
        if !(base.min_tangential_pos_num()..=base.max_tangential_pos_num()).contains(&t) {
            trace!(tangential_pos_num = t, "tangential position out of range");
            return bin.with_value(Bin::INVALID_VALUE)
        }
        bin
    }

    /// A detector pair recorded in `bin`, using the bin's most central ring
    /// pair. `None` for bins outside the configured ranges and for the
    /// tangential position `-N/2`, which no pair of distinct detectors
    /// produces.
    pub fn get_det_pair_for_bin(&self, bin: &Bin) -> Option<DetectionPair> {
        if !self.base.is_bin_in_range(bin) { return None }
        let n = self.num_detectors();
        let dd = n / 2 - bin.tangential_pos_num;
        if !(1..n).contains(&dd) { return None }
        let k = 2 * bin.view_num + dd.rem_euclid(2);
        let det1 = ((k - dd) / 2).rem_euclid(n);
        let det2 = ((k + dd) / 2).rem_euclid(n);
        let (ring1, ring2) = self.base.central_ring_pair(bin.segment_num, bin.axial_pos_num)?;
        Some(DetectionPair { det1, ring1, det2, ring2 })
    }
}

impl ProjDataInfo for ProjDataInfoCylindricalNoArcCorr {

    fn cylindrical    (&    self) -> &    ProjDataInfoCylindrical { &    self.base }
    fn cylindrical_mut(&mut self) -> &mut ProjDataInfoCylindrical { &mut self.base }

    fn get_bin_with_sentinel(&self, lor: &LOR) -> Bin {
        let Some(crossing) = line_cylinder_intersections(lor.p1, lor.p2, self.base.ring_radius()) else {
            trace!(%lor, "LOR does not cross the detector cylinder");
            return Bin::invalid()
        };
        let (det1, ring1) = self.nearest_detector(lor.p1.lerp(lor.p2, crossing.entry));
        let (det2, ring2) = self.nearest_detector(lor.p1.lerp(lor.p2, crossing.exit));
        self.bin_for_det_pair(det1, ring1, det2, ring2)
    }

    fn find_cartesian_coordinates_of_detection(&self, bin: &Bin) -> Option<LOR> {
        let DetectionPair { det1, ring1, det2, ring2 } = self.get_det_pair_for_bin(bin)?;
        Some(LOR::new(self.detector_position(det1, ring1),
                      self.detector_position(det2, ring2)))
    }

    fn s(&self, bin: &Bin) -> Length {
        self.ring_radius * (self.angular_increment * bin.tangential_pos_num as f32).value.sin()
    }

    fn tangential_sampling(&self) -> Length { self.ring_radius * self.angular_increment.value }

    fn parameter_info(&self) -> String {
        format!("ProjDataInfoCylindricalNoArcCorr := \n{}Ring radius := {}\nBin size (mm) := {}\nEnd :=\n",
                self.base.parameter_info(), mm_(self.ring_radius), mm_(self.tangential_sampling()))
    }

    fn clone_box(&self) -> Box<dyn ProjDataInfo> { Box::new(self.clone()) }
}
