use units::{mm_, radian_, Length};
use tracing::{debug, trace};

use crate::error::{ensure_config, Result};
use crate::{Bin, LOR};
use crate::lor::LORInAxialAndSinogramCoordinates;

use super::{ProjDataInfo, ProjDataInfoCylindrical};

/// Cylindrical projection data whose tangential positions are uniformly
/// spaced in `s`.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjDataInfoCylindricalArcCorr {
    base: ProjDataInfoCylindrical,
    tangential_sampling: Length,
}

impl ProjDataInfoCylindricalArcCorr {

    pub fn new(base: ProjDataInfoCylindrical, tangential_sampling: Length) -> Result<Self> {
        check_tangential_sampling(tangential_sampling)?;
        let info = Self { base, tangential_sampling };
        debug!("{}", info.parameter_info());
        Ok(info)
    }

    /// Change the arc-correction bin size of this instance only. A
    /// non-positive size is rejected and leaves the instance unchanged.
    pub fn set_tangential_sampling(&mut self, tangential_sampling: Length) -> Result<()> {
        check_tangential_sampling(tangential_sampling)?;
        self.tangential_sampling = tangential_sampling;
        Ok(())
    }
}

fn check_tangential_sampling(tangential_sampling: Length) -> Result<()> {
    ensure_config!(mm_(tangential_sampling) > 0.0,
                   "tangential sampling must be positive, got {} mm", mm_(tangential_sampling));
    Ok(())
}

impl ProjDataInfo for ProjDataInfoCylindricalArcCorr {

    fn cylindrical    (&    self) -> &    ProjDataInfoCylindrical { &    self.base }
    fn cylindrical_mut(&mut self) -> &mut ProjDataInfoCylindrical { &mut self.base }

    fn get_bin_with_sentinel(&self, lor: &LOR) -> Bin {
        let base = &self.base;
        let Some(coords) = lor.change_representation(base.ring_radius()) else {
            trace!(%lor, "LOR does not cross the detector cylinder");
            return Bin::invalid()
        };
        let LORInAxialAndSinogramCoordinates { phi, s, z1, z2 } = coords;
        let mut bin = Bin::new(0, 0, 0, 0).with_value(1.0);

        // phi lies in [0, pi), but rounding can map it onto the view at pi,
        // which is view 0 with the LOR running in the opposite direction.
        bin.view_num = (radian_(phi) / radian_(base.azimuthal_angle_sampling())).round() as i32;
        let swap_direction = bin.view_num > base.max_view_num();
        if swap_direction { bin.view_num -= base.num_views() as i32 }

        let spacing = mm_(base.ring_spacing());
        let ring_of = |z: Length| (mm_(z) / spacing).round() as i32;
        let (ring1, ring2) = if swap_direction { (ring_of(z2), ring_of(z1)) }
                             else              { (ring_of(z1), ring_of(z2)) };
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

        bin.tangential_pos_num = (mm_(s) / mm_(self.tangential_sampling)).round() as i32;
        if swap_direction { bin.tangential_pos_num *= -1 }
        if !(base.min_tangential_pos_num()..=base.max_tangential_pos_num()).contains(&bin.tangential_pos_num) {
            trace!(tangential_pos_num = bin.tangential_pos_num, "tangential position out of range");
            return bin.with_value(Bin::INVALID_VALUE)
        }
        bin
    }

    fn find_cartesian_coordinates_of_detection(&self, bin: &Bin) -> Option<LOR> {
        let base = &self.base;
        if !base.is_bin_in_range(bin) { return None }
        let (ring1, ring2) = base.central_ring_pair(bin.segment_num, bin.axial_pos_num)?;
        let spacing = base.ring_spacing();
        LORInAxialAndSinogramCoordinates::new(
            base.phi(bin),
            self.s(bin),
            spacing * ring1 as f32,
            spacing * ring2 as f32,
        ).to_cartesian(base.ring_radius())
    }

    fn s(&self, bin: &Bin) -> Length { self.tangential_sampling * bin.tangential_pos_num as f32 }

    fn tangential_sampling(&self) -> Length { self.tangential_sampling }

    fn parameter_info(&self) -> String {
        format!("ProjDataInfoCylindricalArcCorr := \n{}tangential sampling := {}\nEnd :=\n",
                self.base.parameter_info(), mm_(self.tangential_sampling))
    }

    fn clone_box(&self) -> Box<dyn ProjDataInfo> { Box::new(self.clone()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::f32::consts::PI;
    use rstest::rstest;
    use proptest::prelude::*;
    use units::{mm, radian};
    use geometry::Point;
    use crate::Scanner;
    use crate::proj_data_info::SegmentSpec;

    /// 24 rings of radius 350 mm, spaced 3.125 mm apart; a single segment
    /// containing ring differences -1..=1, 60 views, 2 mm tangential bins.
    fn single_segment() -> ProjDataInfoCylindricalArcCorr {
        let scanner = Arc::new(Scanner::new("test", 24, 384, mm(350.0), mm(3.125)).unwrap());
        let segments = vec![SegmentSpec::spanning(-1, 1, 24)];
        let base = ProjDataInfoCylindrical::new(scanner, 0, segments, 60, 100).unwrap();
        ProjDataInfoCylindricalArcCorr::new(base, mm(2.0)).unwrap()
    }

    fn span(span: usize, max_rd: usize) -> ProjDataInfoCylindricalArcCorr {
        let scanner = Arc::new(Scanner::new("test", 24, 384, mm(350.0), mm(3.125)).unwrap());
        let base = ProjDataInfoCylindrical::from_span(scanner, span, Some(max_rd), 96, 128).unwrap();
        ProjDataInfoCylindricalArcCorr::new(base, mm(2.0)).unwrap()
    }

    fn sino_lor(phi: f32, s: f32, z1: f32, z2: f32) -> LOR {
        LORInAxialAndSinogramCoordinates::new(radian(phi), mm(s), mm(z1), mm(z2))
            .to_cartesian(mm(350.0))
            .unwrap()
    }

    #[test]
    fn concrete_scenario() {
        let info = single_segment();
        let lor = sino_lor(0.05, 1.0, 50.0, 50.0);
        let bin = info.get_bin(&lor).unwrap();
        assert_eq!(bin.view_num, (0.05 / (PI / 60.0)).round() as i32);
        assert_eq!(bin.view_num, 1);
        // s / sampling is 0.5: halves round away from zero
        assert_eq!(bin.tangential_pos_num, 1);
        // rings 16 and 16: ring sum 32 in a segment sampled at half ring spacing
        assert_eq!((bin.segment_num, bin.axial_pos_num), (0, 32));
        assert!(bin.is_valid());
    }

    #[test]
    fn boundary_view_swaps_direction() {
        let info = single_segment();
        let dphi = PI / 60.0;
        // Rounds to view 60 == num_views
        let near_pi = PI - 0.2 * dphi;
        let swapped = info.get_bin(&sino_lor(near_pi, 5.6, 31.25, 34.375)).unwrap();
        let direct  = info.get_bin(&sino_lor(0.1 * dphi, 5.6, 31.25, 34.375)).unwrap();
        assert_eq!(swapped.view_num, 0);
        assert_eq!(direct .view_num, 0);
        assert_eq!(direct .tangential_pos_num,  3);
        assert_eq!(swapped.tangential_pos_num, -3);
        // rings 10 and 11 are assigned in the opposite order
        assert_eq!(info.cylindrical().get_segment_axial_pos_num_for_ring_pair(10, 11), Some((0, 21)));
        assert_eq!((direct .segment_num, direct .axial_pos_num), (0, 21));
        assert_eq!((swapped.segment_num, swapped.axial_pos_num), (0, 21));
    }

    #[test]
    fn boundary_view_swaps_rings() {
        // One ring difference per segment, so the ring order selects the segment
        let info = span(1, 5);
        let base = info.cylindrical();
        let dphi = PI / base.num_views() as f32;
        let swapped = info.get_bin(&sino_lor(PI - 0.2 * dphi, 5.6, 31.25, 34.375)).unwrap();
        let direct  = info.get_bin(&sino_lor(        0.1 * dphi, 5.6, 31.25, 34.375)).unwrap();
        assert_eq!((swapped.view_num, direct.view_num), (0, 0));
        assert_eq!((direct.tangential_pos_num, swapped.tangential_pos_num), (3, -3));
        assert_ne!(direct.segment_num, 0);
        assert_eq!(swapped.segment_num, -direct.segment_num);
        assert_eq!(Some((direct .segment_num, direct .axial_pos_num)), base.get_segment_axial_pos_num_for_ring_pair(10, 11));
        assert_eq!(Some((swapped.segment_num, swapped.axial_pos_num)), base.get_segment_axial_pos_num_for_ring_pair(11, 10));
    }

    #[rstest(/**/   z1  ,    z2  ,
             case(  -5.0,    0.0), // ring -2
             case(  75.0,   75.0), // ring 24
             case(   0.0,   10.0), // ring difference 3 not in segment
    )]
    fn out_of_range_rings(z1: f32, z2: f32) {
        let info = single_segment();
        let lor = sino_lor(0.3, 0.0, z1, z2);
        assert_eq!(info.get_bin(&lor), None);
        assert!(!info.get_bin_with_sentinel(&lor).is_valid());
    }

    #[test]
    fn out_of_range_tangential_keeps_axial_indices() {
        let info = single_segment();
        // 100 tangential positions: -50..=49; 120 mm is position 60
        let bin = info.get_bin_with_sentinel(&sino_lor(0.3, 120.0, 50.0, 50.0));
        assert_eq!(bin.value, Bin::INVALID_VALUE);
        assert_eq!((bin.segment_num, bin.axial_pos_num), (0, 32));
    }

    #[test]
    fn lor_missing_cylinder() {
        let info = single_segment();
        let outside = LOR::new(Point::from_mm(400.0, -10.0, 0.0), Point::from_mm(400.0, 10.0, 0.0));
        assert_eq!(info.get_bin(&outside), None);
        assert_eq!(info.get_bin_with_sentinel(&outside).value, -1.0);
    }

    #[test]
    fn set_tangential_sampling_affects_only_this_instance() {
        let mut a = single_segment();
        let b = a.clone();
        a.set_tangential_sampling(mm(4.0)).unwrap();
        let lor = sino_lor(0.3, 9.6, 50.0, 50.0);
        assert_eq!(a.get_bin(&lor).unwrap().tangential_pos_num, 2);
        assert_eq!(b.get_bin(&lor).unwrap().tangential_pos_num, 5);
    }

    #[rstest(/**/ sampling,
             case( 0.0),
             case(-2.0),
    )]
    fn non_positive_tangential_sampling_rejected(sampling: f32) {
        let mut info = single_segment();
        let err = info.set_tangential_sampling(mm(sampling)).unwrap_err();
        assert!(err.is_configuration());
        // The previous 2 mm sampling is still in force
        assert_eq!(mm_(info.tangential_sampling()), 2.0);
        let bin = info.get_bin(&sino_lor(0.3, 9.6, 50.0, 50.0)).unwrap();
        assert_eq!(bin.tangential_pos_num, 5);

        let base = info.cylindrical().clone();
        assert!(ProjDataInfoCylindricalArcCorr::new(base, mm(sampling)).unwrap_err().is_configuration());
    }

    #[test]
    fn parameter_info_includes_tangential_sampling() {
        let text = single_segment().parameter_info();
        assert!(text.starts_with("ProjDataInfoCylindricalArcCorr := \n"));
        assert!(text.contains("tangential sampling := "));
        assert!(text.contains("Number of views := 60"));
        assert!(text.ends_with("End :=\n"));
    }

    // Every in-range bin survives the trip through a cartesian LOR
    fn bin_in(info: ProjDataInfoCylindricalArcCorr) -> impl Strategy<Value = (ProjDataInfoCylindricalArcCorr, Bin)> {
        let base = info.cylindrical().clone();
        let segs = base.min_segment_num()..=base.max_segment_num();
        segs.prop_flat_map(move |seg| {
            let b = &base;
            (Just(seg),
             1..=b.max_view_num(),
             0..=b.max_axial_pos_num(seg),
             b.min_tangential_pos_num()..=b.max_tangential_pos_num())
        })
        .prop_map(move |(seg, view, ax, tang)| (info.clone(), Bin::new(seg, view, ax, tang)))
    }

    proptest! {
        #[test]
        fn bin_lor_roundtrip_span_1((info, bin) in bin_in(span(1, 5))) {
            let lor = info.find_cartesian_coordinates_of_detection(&bin).unwrap();
            let back = info.get_bin(&lor).unwrap();
            prop_assert_eq!(back.indices(), bin.indices());
        }

        #[test]
        fn bin_lor_roundtrip_span_3((info, bin) in bin_in(span(3, 7))) {
            let lor = info.find_cartesian_coordinates_of_detection(&bin).unwrap();
            let back = info.get_bin(&lor).unwrap();
            prop_assert_eq!(back.indices(), bin.indices());
        }
    }
}
