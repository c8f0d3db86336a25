//! Segment and axial addressing shared by all cylindrical projection data.

use std::fmt::Write;
use std::sync::Arc;

use itertools::Itertools;
use units::{degree_, mm_, pi, Angle, Length};

use crate::error::{ensure_config, Error, Result};
use crate::{Bin, Scanner};

/// The ring differences grouped into one segment, and how many axial
/// positions the segment has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentSpec {
    pub min_ring_difference: i32,
    pub max_ring_difference: i32,
    pub num_axial_poss     : usize,
}

impl SegmentSpec {

    /// Segment covering `min..=max` ring differences, with as many axial
    /// positions as the scanner's rings allow.
    pub fn spanning(min_ring_difference: i32, max_ring_difference: i32, num_rings: usize) -> Self {
        let mut spec = Self { min_ring_difference, max_ring_difference, num_axial_poss: 0 };
        spec.num_axial_poss = spec.geometric_num_axial_poss(num_rings);
        spec
    }

    fn is_compressed(&self) -> bool { self.min_ring_difference != self.max_ring_difference }

    /// Step between consecutive axial positions, measured in `ring1 + ring2`.
    /// Segments containing a single ring difference are sampled at the ring
    /// spacing, compressed ones at half the ring spacing.
    fn ring_sum_step(&self) -> i32 { if self.is_compressed() { 1 } else { 2 } }

    /// Smallest `ring1 + ring2` of any ring pair in this segment
    fn min_ring_sum(&self) -> i32 {
        let (lo, hi) = (self.min_ring_difference, self.max_ring_difference);
        if lo <= 0 && 0 <= hi { 0 } else { lo.abs().min(hi.abs()) }
    }

    fn geometric_num_axial_poss(&self, num_rings: usize) -> usize {
        let max_ring_sum = 2 * (num_rings as i32 - 1) - self.min_ring_sum();
        let n = (max_ring_sum - self.min_ring_sum()) / self.ring_sum_step() + 1;
        n.max(0) as usize
    }
}

/// Geometry common to arc-corrected and non-arc-corrected cylindrical data:
/// the scanner, the segment/ring-difference table, and the numbers of views
/// and tangential positions.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjDataInfoCylindrical {
    scanner            : Arc<Scanner>,
    min_segment_num    : i32,
    segments           : Vec<SegmentSpec>,
    num_views          : usize,
    num_tangential_poss: usize,
    /// Segment containing each ring difference, indexed by `ring_diff + num_rings - 1`
    segment_for_ring_difference: Vec<Option<i32>>,
}

impl ProjDataInfoCylindrical {

    /// `segments[i]` describes segment number `min_segment_num + i`.
    ///
    /// The ring-difference ranges must be ordered, contiguous and
    /// non-overlapping, so that every ring pair belongs to at most one
    /// segment, and the axial counts must match what the scanner's rings
    /// provide.
    pub fn new(
        scanner            : Arc<Scanner>,
        min_segment_num    : i32,
        segments           : Vec<SegmentSpec>,
        num_views          : usize,
        num_tangential_poss: usize,
    ) -> Result<Self> {
        let num_rings = scanner.num_rings() as i32;
        ensure_config!(!segments.is_empty(), "at least one segment is needed");
        ensure_config!(num_views >= 1, "at least one view is needed");
        ensure_config!(num_tangential_poss >= 1, "at least one tangential position is needed");
        for (i, s) in segments.iter().enumerate() {
            let seg = min_segment_num + i as i32;
            ensure_config!(s.min_ring_difference <= s.max_ring_difference,
                           "segment {seg}: min ring difference {} exceeds max {}",
                           s.min_ring_difference, s.max_ring_difference);
            ensure_config!(s.min_ring_difference > -num_rings && s.max_ring_difference < num_rings,
                           "segment {seg}: ring differences [{}, {}] impossible with {num_rings} rings",
                           s.min_ring_difference, s.max_ring_difference);
            let expected = s.geometric_num_axial_poss(num_rings as usize);
            ensure_config!(s.num_axial_poss == expected,
                           "segment {seg}: {} axial positions given, but ring differences [{}, {}] give {expected}",
                           s.num_axial_poss, s.min_ring_difference, s.max_ring_difference);
        }
        for ((i, a), (_, b)) in segments.iter().enumerate().tuple_windows() {
            let seg = min_segment_num + i as i32;
            ensure_config!(a.max_ring_difference + 1 == b.min_ring_difference,
                           "segments {seg} and {} do not partition the ring differences: [{}, {}] then [{}, {}]",
                           seg + 1, a.min_ring_difference, a.max_ring_difference,
                           b.min_ring_difference, b.max_ring_difference);
        }
        let segment_for_ring_difference = Self::ring_difference_table(num_rings, min_segment_num, &segments);
        Ok(Self {
            scanner, min_segment_num, segments,
            num_views, num_tangential_poss,
            segment_for_ring_difference,
        })
    }

    /// The standard ring-difference table for axial compression `span`.
    ///
    /// With `span == 1` every ring difference up to `max_ring_difference`
    /// gets its own segment. Otherwise segment 0 covers
    /// `[-(span-1)/2, (span-1)/2]` and each further segment the next `span`
    /// ring differences. `max_ring_difference` defaults to `num_rings - 1`.
    pub fn from_span(
        scanner            : Arc<Scanner>,
        span               : usize,
        max_ring_difference: Option<usize>,
        num_views          : usize,
        num_tangential_poss: usize,
    ) -> Result<Self> {
        let num_rings = scanner.num_rings();
        let max_rd = max_ring_difference.unwrap_or(num_rings - 1);
        ensure_config!(span % 2 == 1, "span must be odd, got {span}");
        ensure_config!(max_rd < num_rings,
                       "maximum ring difference {max_rd} impossible with {num_rings} rings");
        let half = (span - 1) / 2;
        ensure_config!(max_rd >= half && (max_rd - half) % span == 0,
                       "maximum ring difference {max_rd} is not compatible with span {span}");
        let max_segment_num = ((max_rd - half) / span) as i32;
        let (span, half) = (span as i32, half as i32);
        let segments = (-max_segment_num..=max_segment_num)
            .map(|seg| {
                let (lo, hi) = match seg.signum() {
                    0 => (-half, half),
                    1 => (half + 1 + (seg - 1) * span, half + seg * span),
                    _ => (-half - (-seg) * span, -half - 1 - (-seg - 1) * span),
                };
                SegmentSpec::spanning(lo, hi, num_rings)
            })
            .collect();
        Self::new(scanner, -max_segment_num, segments, num_views, num_tangential_poss)
    }

    fn ring_difference_table(num_rings: i32, min_segment_num: i32, segments: &[SegmentSpec]) -> Vec<Option<i32>> {
        let mut table = vec![None; (2 * num_rings - 1) as usize];
        for (i, s) in segments.iter().enumerate() {
            for rd in s.min_ring_difference..=s.max_ring_difference {
                table[(rd + num_rings - 1) as usize] = Some(min_segment_num + i as i32);
            }
        }
        table
    }

    // ----- Range accessors ---------------------------------------------------------
    pub fn scanner(&self) -> &Arc<Scanner> { &self.scanner }

    pub fn min_segment_num(&self) -> i32 { self.min_segment_num }
    pub fn max_segment_num(&self) -> i32 { self.min_segment_num + self.segments.len() as i32 - 1 }
    pub fn num_segments   (&self) -> usize { self.segments.len() }

    pub fn num_views    (&self) -> usize { self.num_views }
    pub fn min_view_num (&self) -> i32 { 0 }
    pub fn max_view_num (&self) -> i32 { self.num_views as i32 - 1 }

    pub fn num_tangential_poss   (&self) -> usize { self.num_tangential_poss }
    pub fn min_tangential_pos_num(&self) -> i32 { -(self.num_tangential_poss as i32 / 2) }
    pub fn max_tangential_pos_num(&self) -> i32 { self.min_tangential_pos_num() + self.num_tangential_poss as i32 - 1 }

    /// # Panics
    /// If `segment_num` is out of range
    fn segment(&self, segment_num: i32) -> &SegmentSpec {
        &self.segments[(segment_num - self.min_segment_num) as usize]
    }

    pub fn segment_spec(&self, segment_num: i32) -> Option<&SegmentSpec> {
        self.is_segment_in_range(segment_num).then(|| self.segment(segment_num))
    }

    /// # Panics
    /// If `segment_num` is out of range
    pub fn num_axial_poss(&self, segment_num: i32) -> usize { self.segment(segment_num).num_axial_poss }
    pub fn min_axial_pos_num(&self, _segment_num: i32) -> i32 { 0 }
    /// # Panics
    /// If `segment_num` is out of range
    pub fn max_axial_pos_num(&self, segment_num: i32) -> i32 { self.num_axial_poss(segment_num) as i32 - 1 }

    /// # Panics
    /// If `segment_num` is out of range
    pub fn min_ring_difference(&self, segment_num: i32) -> i32 { self.segment(segment_num).min_ring_difference }
    /// # Panics
    /// If `segment_num` is out of range
    pub fn max_ring_difference(&self, segment_num: i32) -> i32 { self.segment(segment_num).max_ring_difference }

    pub fn is_segment_in_range(&self, segment_num: i32) -> bool {
        (self.min_segment_num()..=self.max_segment_num()).contains(&segment_num)
    }

    /// Whether all four indices of `bin` lie in the configured ranges
    pub fn is_bin_in_range(&self, bin: &Bin) -> bool {
        self.is_segment_in_range(bin.segment_num) &&
            (self.min_view_num()..=self.max_view_num()).contains(&bin.view_num) &&
            (self.min_axial_pos_num(bin.segment_num)..=self.max_axial_pos_num(bin.segment_num)).contains(&bin.axial_pos_num) &&
            (self.min_tangential_pos_num()..=self.max_tangential_pos_num()).contains(&bin.tangential_pos_num)
    }

    // ----- Ring pair <-> (segment, axial position) ---------------------------------

    /// Segment and axial position of the sinogram containing LORs between
    /// `ring1` and `ring2`.
    ///
    /// `None` when either ring does not exist or the ring difference
    /// `ring2 - ring1` belongs to no configured segment. This is an expected
    /// outcome for oblique LORs, not an error.
    pub fn get_segment_axial_pos_num_for_ring_pair(&self, ring1: i32, ring2: i32) -> Option<(i32, i32)> {
        let num_rings = self.scanner.num_rings() as i32;
        if !(0..num_rings).contains(&ring1) || !(0..num_rings).contains(&ring2) { return None }
        let segment_num = self.segment_for_ring_difference[(ring2 - ring1 + num_rings - 1) as usize]?;
        let s = self.segment(segment_num);
        let axial_pos_num = (ring1 + ring2 - s.min_ring_sum()) / s.ring_sum_step();
        Some((segment_num, axial_pos_num))
    }

    /// All ring pairs `(ring1, ring2)` that contribute to the given sinogram,
    /// most central ring difference first.
    pub fn ring_pairs_for_segment_axial_pos(&self, segment_num: i32, axial_pos_num: i32) -> Vec<(i32, i32)> {
        let Some(s) = self.segment_spec(segment_num) else { return vec![] };
        if !(0..s.num_axial_poss as i32).contains(&axial_pos_num) { return vec![] }
        let max_ring_sum = 2 * (self.scanner.num_rings() as i32 - 1);
        let ring_sum = s.min_ring_sum() + axial_pos_num * s.ring_sum_step();
        let centre = s.min_ring_difference + s.max_ring_difference;
        (s.min_ring_difference..=s.max_ring_difference)
            .filter(|rd| (ring_sum - rd) % 2 == 0)
            .filter(|rd| rd.abs() <= ring_sum && ring_sum <= max_ring_sum - rd.abs())
            .sorted_by_key(|rd| ((2 * rd - centre).abs(), *rd))
            .map(|rd| ((ring_sum - rd) / 2, (ring_sum + rd) / 2))
            .collect()
    }

    pub fn num_ring_pairs_for_segment_axial_pos(&self, segment_num: i32, axial_pos_num: i32) -> usize {
        self.ring_pairs_for_segment_axial_pos(segment_num, axial_pos_num).len()
    }

    /// The ring pair which best represents the sinogram: the one whose ring
    /// difference is closest to the middle of the segment.
    pub fn central_ring_pair(&self, segment_num: i32, axial_pos_num: i32) -> Option<(i32, i32)> {
        self.ring_pairs_for_segment_axial_pos(segment_num, axial_pos_num).into_iter().next()
    }

    // ----- Continuous coordinates --------------------------------------------------

    pub fn ring_spacing(&self) -> Length { self.scanner.ring_spacing() }
    pub fn ring_radius (&self) -> Length { self.scanner.ring_radius() }

    /// Angle between consecutive views: the views cover half a turn.
    pub fn azimuthal_angle_sampling(&self) -> Angle {
        pi() / self.num_views as f32
    }

    /// Nominal azimuthal angle of the bin's view
    pub fn phi(&self, bin: &Bin) -> Angle { self.azimuthal_angle_sampling() * bin.view_num as f32 }

    /// Distance between the centres of consecutive axial positions
    ///
    /// # Panics
    /// If `segment_num` is out of range
    pub fn axial_sampling(&self, segment_num: i32) -> Length {
        self.ring_spacing() * (self.segment(segment_num).ring_sum_step() as f32 / 2.0)
    }

    /// Axial position (from the centre of ring 0) of the middle of the bin's LORs
    ///
    /// # Panics
    /// If the bin's segment is out of range
    pub fn m(&self, bin: &Bin) -> Length {
        let s = self.segment(bin.segment_num);
        let ring_sum = s.min_ring_sum() + bin.axial_pos_num * s.ring_sum_step();
        self.ring_spacing() * (ring_sum as f32 / 2.0)
    }

    /// # Panics
    /// If `segment_num` is out of range
    pub fn average_ring_difference(&self, segment_num: i32) -> f32 {
        let s = self.segment(segment_num);
        (s.min_ring_difference + s.max_ring_difference) as f32 / 2.0
    }

    // ----- Mutation ----------------------------------------------------------------

    /// Keep only segments `min_segment_num..=max_segment_num`, for example to
    /// write output data with fewer oblique segments.
    pub fn reduce_segment_range(&mut self, min_segment_num: i32, max_segment_num: i32) -> Result<()> {
        ensure_config!(min_segment_num <= max_segment_num,
                       "empty segment range [{min_segment_num}, {max_segment_num}]");
        if !self.is_segment_in_range(min_segment_num) || !self.is_segment_in_range(max_segment_num) {
            return Err(Error::config(format!(
                "cannot reduce segments [{}, {}] to [{min_segment_num}, {max_segment_num}]",
                self.min_segment_num(), self.max_segment_num())))
        }
        let first = (min_segment_num - self.min_segment_num) as usize;
        let last  = (max_segment_num - self.min_segment_num) as usize;
        self.segments = self.segments[first..=last].to_vec();
        self.min_segment_num = min_segment_num;
        self.segment_for_ring_difference =
            Self::ring_difference_table(self.scanner.num_rings() as i32, min_segment_num, &self.segments);
        Ok(())
    }

    /// Human-readable dump of the configuration; not meant to be parsed back.
    pub fn parameter_info(&self) -> String {
        let mut s = self.scanner.parameter_info();
        let dphi = degree_(self.azimuthal_angle_sampling());
        let segments = self.min_segment_num()..=self.max_segment_num();
        // Writing to a String cannot fail
        let _ = writeln!(s, "Min segment number := {}", self.min_segment_num());
        let _ = writeln!(s, "Max segment number := {}", self.max_segment_num());
        let _ = writeln!(s, "Number of views := {}", self.num_views);
        let _ = writeln!(s, "Number of tangential positions := {} [{}, {}]",
                         self.num_tangential_poss, self.min_tangential_pos_num(), self.max_tangential_pos_num());
        let _ = writeln!(s, "Azimuthal angle increment (deg) := {dphi}");
        let _ = writeln!(s, "Azimuthal angle extent (deg) := {}", dphi * self.num_views as f32);
        let _ = writeln!(s, "ring differences per segment := {{{}}}",
                         segments.clone().map(|seg| format!("({},{})", self.min_ring_difference(seg), self.max_ring_difference(seg))).join(","));
        let _ = writeln!(s, "Number of axial positions per segment := {{{}}}",
                         segments.map(|seg| self.num_axial_poss(seg)).join(","));
        let _ = writeln!(s, "Ring spacing (mm) := {}", mm_(self.ring_spacing()));
        s
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;
    use pretty_assertions::assert_eq;
    use crate::scanner::test_scanner;

    pub(crate) fn span(span: usize, max_rd: Option<usize>) -> ProjDataInfoCylindrical {
        ProjDataInfoCylindrical::from_span(Arc::new(test_scanner()), span, max_rd, 192, 128).unwrap()
    }

    #[test]
    fn segment_spec_checks_range() {
        let info = span(1, Some(3));
        assert!(info.segment_spec(3).is_some());
        assert_eq!(info.segment_spec(4), None);
    }

    #[test]
    #[should_panic]
    fn num_axial_poss_panics_outside_segment_range() {
        span(1, Some(3)).num_axial_poss(4);
    }

    #[test]
    fn span_1_tables() {
        let info = span(1, Some(3));
        assert_eq!((info.min_segment_num(), info.max_segment_num()), (-3, 3));
        for seg in -3..=3 {
            assert_eq!(info.min_ring_difference(seg), seg);
            assert_eq!(info.max_ring_difference(seg), seg);
            assert_eq!(info.num_axial_poss(seg), 24 - seg.unsigned_abs() as usize);
        }
    }

    #[test]
    fn span_3_tables() {
        let info = span(3, Some(7));
        let table: Vec<_> = (info.min_segment_num()..=info.max_segment_num())
            .map(|seg| (seg, info.min_ring_difference(seg), info.max_ring_difference(seg), info.num_axial_poss(seg)))
            .collect();
        assert_eq!(table, vec![
            (-2, -7, -5, 2*24 - 1 - 2*5),
            (-1, -4, -2, 2*24 - 1 - 2*2),
            ( 0, -1,  1, 2*24 - 1      ),
            ( 1,  2,  4, 2*24 - 1 - 2*2),
            ( 2,  5,  7, 2*24 - 1 - 2*5),
        ]);
    }

    #[rstest(/**/ span, max_rd,
             case(   2, None    ), // even span
             case(   3, Some(6) ), // 6 - 1 not a multiple of 3
             case(   1, Some(24)), // no such ring difference
    )]
    fn bad_spans_are_rejected(span: usize, max_rd: Option<usize>) {
        let result = ProjDataInfoCylindrical::from_span(Arc::new(test_scanner()), span, max_rd, 192, 128);
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn overlapping_segments_are_rejected() {
        let n = 24;
        let segments = vec![SegmentSpec::spanning(-1, 1, n), SegmentSpec::spanning(1, 3, n)];
        let result = ProjDataInfoCylindrical::new(Arc::new(test_scanner()), 0, segments, 192, 128);
        assert!(result.is_err());
    }

    #[test]
    fn inconsistent_axial_counts_are_rejected() {
        let segments = vec![SegmentSpec { min_ring_difference: 0, max_ring_difference: 0, num_axial_poss: 23 }];
        let result = ProjDataInfoCylindrical::new(Arc::new(test_scanner()), 0, segments, 192, 128);
        assert!(result.is_err());
    }

    #[rstest(/**/ ring1, ring2, expected,
             // span 1: axial position is the lower ring
             case(    0,     0, Some(( 0,  0))),
             case(    5,     7, Some(( 2,  5))),
             case(    7,     5, Some((-2,  5))),
             case(   23,    20, Some((-3, 20))),
             // ring difference beyond the table
             case(    0,     4, None),
             // rings that do not exist
             case(   -1,     0, None),
             case(   24,    23, None),
    )]
    fn ring_pair_lookup_span_1(ring1: i32, ring2: i32, expected: Option<(i32, i32)>) {
        assert_eq!(span(1, Some(3)).get_segment_axial_pos_num_for_ring_pair(ring1, ring2), expected);
    }

    #[rstest(/**/ ring1, ring2, expected,
             // span 3: axial position is ring1 + ring2 - smallest ring sum in segment
             case(    0,     0, Some(( 0,  0))),
             case(    0,     1, Some(( 0,  1))),
             case(   16,    16, Some(( 0, 32))),
             case(    0,     2, Some(( 1,  0))),
             case(    1,     4, Some(( 1,  3))),
             case(    4,     0, Some((-1,  2))),
             case(    0,     5, Some(( 2,  0))),
             case(    0,     8, None),
    )]
    fn ring_pair_lookup_span_3(ring1: i32, ring2: i32, expected: Option<(i32, i32)>) {
        assert_eq!(span(3, Some(7)).get_segment_axial_pos_num_for_ring_pair(ring1, ring2), expected);
    }

    #[test]
    fn ring_pairs_invert_the_lookup() {
        for info in [span(1, None), span(3, Some(7)), span(5, Some(12))] {
            for seg in info.min_segment_num()..=info.max_segment_num() {
                for ax in 0..info.num_axial_poss(seg) as i32 {
                    let pairs = info.ring_pairs_for_segment_axial_pos(seg, ax);
                    assert!(!pairs.is_empty(), "segment {seg} axial position {ax} has no rings");
                    for (r1, r2) in pairs {
                        assert_eq!(info.get_segment_axial_pos_num_for_ring_pair(r1, r2), Some((seg, ax)));
                    }
                }
            }
        }
    }

    #[test]
    fn every_ring_pair_has_exactly_one_sinogram() {
        // Ring differences of 23 (two ring pairs) are not covered by span 3
        let info = span(3, Some(22));
        let total: usize = (info.min_segment_num()..=info.max_segment_num())
            .flat_map(|seg| (0..info.num_axial_poss(seg) as i32).map(move |ax| (seg, ax)))
            .map(|(seg, ax)| info.num_ring_pairs_for_segment_axial_pos(seg, ax))
            .sum();
        assert_eq!(total, 24 * 24 - 2);
    }

    #[test]
    fn central_ring_pair_prefers_middle_of_segment() {
        let info = span(3, Some(7));
        // ring sum 33 in segment 0 can only be made with ring differences +-1
        assert_eq!(info.central_ring_pair(0, 33), Some((17, 16)));
        // ring sum 32: ring difference 0 is central
        assert_eq!(info.central_ring_pair(0, 32), Some((16, 16)));
        assert_eq!(info.ring_pairs_for_segment_axial_pos(0, 32), vec![(16, 16)]);
        // segment 1 covers ring differences 2..=4: ring sum 8 comes from 2 and 4
        assert_eq!(info.ring_pairs_for_segment_axial_pos(1, 6), vec![(3, 5), (2, 6)]);
        assert_eq!(info.central_ring_pair(0, 47), None);
    }

    #[test]
    fn tangential_range_is_centred() {
        let info = span(1, Some(0));
        assert_eq!((info.min_tangential_pos_num(), info.max_tangential_pos_num()), (-64, 63));
        let odd = ProjDataInfoCylindrical::from_span(Arc::new(test_scanner()), 1, Some(0), 192, 5).unwrap();
        assert_eq!((odd.min_tangential_pos_num(), odd.max_tangential_pos_num()), (-2, 2));
    }

    #[test]
    fn reduce_segment_range() {
        let mut info = span(1, Some(3));
        info.reduce_segment_range(-1, 2).unwrap();
        assert_eq!((info.min_segment_num(), info.max_segment_num()), (-1, 2));
        assert_eq!(info.num_axial_poss(2), 22);
        assert_eq!(info.get_segment_axial_pos_num_for_ring_pair(0, 3), None);
        assert_eq!(info.get_segment_axial_pos_num_for_ring_pair(0, 2), Some((2, 0)));
        assert!(info.reduce_segment_range(-2, 0).is_err());
    }

    #[test]
    fn axial_coordinates() {
        use float_eq::assert_float_eq;
        let info = span(3, Some(7));
        assert_float_eq!(mm_(info.axial_sampling(0)), 3.125 / 2.0, rmax <= 1e-6);
        assert_float_eq!(mm_(info.axial_sampling(1)), 3.125 / 2.0, rmax <= 1e-6);
        let bin = Bin::new(0, 0, 32, 0);
        assert_float_eq!(mm_(info.m(&bin)), 16.0 * 3.125, rmax <= 1e-6);
        assert_float_eq!(info.average_ring_difference(2), 6.0, ulps <= 1);
        let span1 = span(1, Some(3));
        assert_float_eq!(mm_(span1.axial_sampling(2)), 3.125, rmax <= 1e-6);
    }
}
