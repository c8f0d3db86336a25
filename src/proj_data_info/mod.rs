//! Conversion between continuous LORs and discrete bins.
//!
//! All concrete kinds of projection data describe the same cylindrical
//! scanner, and differ only in how the tangential coordinate is sampled.
//! Pipelines hold them as `Box<dyn ProjDataInfo>`, which can be cloned
//! without knowing the concrete type.

mod cylindrical;
mod arc_corr;
mod no_arc_corr;

pub use cylindrical::{ProjDataInfoCylindrical, SegmentSpec};
pub use arc_corr::ProjDataInfoCylindricalArcCorr;
pub use no_arc_corr::{DetectionPair, ProjDataInfoCylindricalNoArcCorr};

use std::fmt;
use std::sync::Arc;

use geometry::Point;
use units::Length;

use crate::{Bin, Result, Scanner, LOR};

pub trait ProjDataInfo: fmt::Debug {

    fn cylindrical    (&    self) -> &    ProjDataInfoCylindrical;
    fn cylindrical_mut(&mut self) -> &mut ProjDataInfoCylindrical;

    /// Find the bin containing `lor`, following the legacy convention: when
    /// there is no such bin, the returned bin's value is
    /// [`Bin::INVALID_VALUE`] and its indices are only partially meaningful.
    fn get_bin_with_sentinel(&self, lor: &LOR) -> Bin;

    /// Find the bin containing `lor`. `None` when the LOR misses the detector
    /// cylinder or falls outside the configured view, segment, axial or
    /// tangential ranges; callers are expected to skip such LORs.
    fn get_bin(&self, lor: &LOR) -> Option<Bin> {
        let bin = self.get_bin_with_sentinel(lor);
        bin.is_valid().then_some(bin)
    }

    fn find_bin_given_cartesian_coordinates_of_detection(&self, p1: Point, p2: Point) -> Option<Bin> {
        self.get_bin(&LOR::new(p1, p2))
    }

    /// A LOR through the centre of `bin`, with its ends on the detector
    /// cylinder. `get_bin` maps it back to `bin`.
    fn find_cartesian_coordinates_of_detection(&self, bin: &Bin) -> Option<LOR>;

    /// Signed distance from the scanner axis of the bin's LORs
    fn s(&self, bin: &Bin) -> Length;

    /// Tangential bin size at the centre of the field of view
    fn tangential_sampling(&self) -> Length;

    fn parameter_info(&self) -> String;

    fn clone_box(&self) -> Box<dyn ProjDataInfo>;

    fn reduce_segment_range(&mut self, min_segment_num: i32, max_segment_num: i32) -> Result<()> {
        self.cylindrical_mut().reduce_segment_range(min_segment_num, max_segment_num)
    }
}

impl Clone for Box<dyn ProjDataInfo> {
    fn clone(&self) -> Self { self.clone_box() }
}

/// Projection data as written by CTI-style scanners: ring differences up to
/// `max_ring_difference` compressed with `span`, either arc-corrected (with
/// `tangential_sampling`, defaulting to the scanner's default bin size) or
/// not.
pub fn proj_data_info_from_span(
    scanner            : Arc<Scanner>,
    span               : usize,
    max_ring_difference: Option<usize>,
    num_views          : usize,
    num_tangential_poss: usize,
    arc_corrected      : bool,
    tangential_sampling: Option<Length>,
) -> Result<Box<dyn ProjDataInfo>> {
    let ring_radius = scanner.ring_radius();
    let bin_size = tangential_sampling.unwrap_or_else(|| scanner.default_bin_size());
    let base = ProjDataInfoCylindrical::from_span(scanner, span, max_ring_difference, num_views, num_tangential_poss)?;
    Ok(if arc_corrected {
        Box::new(ProjDataInfoCylindricalArcCorr::new(base, bin_size)?)
    } else {
        Box::new(ProjDataInfoCylindricalNoArcCorr::new(base, ring_radius)?)
    })
}
