//! Containers of projection data, addressed by [`Bin`].

use std::fmt;

use ndarray::{s, Array2, Array3};
use tracing::debug;

use crate::error::{Error, Result};
use crate::proj_data_info::{ProjDataInfo, ProjDataInfoCylindrical};
use crate::{Bin, LOR};

/// All bins of one view in one segment, indexed `[axial, tangential]`
#[derive(Clone, Debug, PartialEq)]
pub struct Viewgram {
    pub segment_num: i32,
    pub view_num   : i32,
    pub min_tangential_pos_num: i32,
    pub data: Array2<f32>,
}

/// All bins at one axial position in one segment, indexed `[view, tangential]`
#[derive(Clone, Debug, PartialEq)]
pub struct Sinogram {
    pub segment_num  : i32,
    pub axial_pos_num: i32,
    pub min_tangential_pos_num: i32,
    pub data: Array2<f32>,
}

/// All bins of one segment, indexed `[view, axial, tangential]`
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentByView {
    pub segment_num: i32,
    pub min_tangential_pos_num: i32,
    pub data: Array3<f32>,
}

impl Viewgram {
    /// # Panics
    /// If either index is outside the viewgram
    pub fn at(&self, axial_pos_num: i32, tangential_pos_num: i32) -> f32 {
        self.data[[axial_pos_num as usize, (tangential_pos_num - self.min_tangential_pos_num) as usize]]
    }
}

impl Sinogram {
    /// # Panics
    /// If either index is outside the sinogram
    pub fn at(&self, view_num: i32, tangential_pos_num: i32) -> f32 {
        self.data[[view_num as usize, (tangential_pos_num - self.min_tangential_pos_num) as usize]]
    }
}

/// Read/write access to projection data, one bin or one slice at a time.
///
/// Slice getters return owned copies; the setters take the slice's own
/// indices from it.
pub trait ProjData {
    fn info(&self) -> &dyn ProjDataInfo;

    fn get_bin_value(&    self, bin: &Bin) -> Result<f32>;
    /// Store `bin.value` at the bin's indices
    fn set_bin_value(&mut self, bin: &Bin) -> Result<()>;

    fn get_viewgram(&    self, view_num: i32, segment_num: i32) -> Result<Viewgram>;
    fn set_viewgram(&mut self, viewgram: &Viewgram) -> Result<()>;

    fn get_sinogram(&    self, axial_pos_num: i32, segment_num: i32) -> Result<Sinogram>;
    fn set_sinogram(&mut self, sinogram: &Sinogram) -> Result<()>;

    fn get_segment_by_view(&    self, segment_num: i32) -> Result<SegmentByView>;
    fn set_segment_by_view(&mut self, segment: &SegmentByView) -> Result<()>;

    fn min_segment_num       (&self) -> i32 { self.info().cylindrical().min_segment_num() }
    fn max_segment_num       (&self) -> i32 { self.info().cylindrical().max_segment_num() }
    fn min_view_num          (&self) -> i32 { self.info().cylindrical().min_view_num() }
    fn max_view_num          (&self) -> i32 { self.info().cylindrical().max_view_num() }
    fn min_tangential_pos_num(&self) -> i32 { self.info().cylindrical().min_tangential_pos_num() }
    fn max_tangential_pos_num(&self) -> i32 { self.info().cylindrical().max_tangential_pos_num() }
    fn min_axial_pos_num(&self, segment_num: i32) -> i32 { self.info().cylindrical().min_axial_pos_num(segment_num) }
    /// # Panics
    /// If `segment_num` is out of range
    fn max_axial_pos_num(&self, segment_num: i32) -> i32 { self.info().cylindrical().max_axial_pos_num(segment_num) }
}

/// Projection data held in memory: one array per segment.
#[derive(Clone, Debug)]
pub struct ProjDataInMemory {
    info: Box<dyn ProjDataInfo>,
    segments: Vec<Array3<f32>>,
}

fn check(what: &'static str, index: i32, min: i32, max: i32) -> Result<usize> {
    if (min..=max).contains(&index) { Ok((index - min) as usize) }
    else { Err(Error::OutOfRange { what, index, min, max }) }
}

impl ProjDataInMemory {

    /// Zero-filled data with the ranges described by `info`
    pub fn new(info: Box<dyn ProjDataInfo>) -> Self {
        let c = info.cylindrical();
        let segments = (c.min_segment_num()..=c.max_segment_num())
            .map(|seg| Array3::zeros((c.num_views(), c.num_axial_poss(seg), c.num_tangential_poss())))
            .collect();
        Self { info, segments }
    }

    fn base(&self) -> &ProjDataInfoCylindrical { self.info.cylindrical() }

    fn segment_index(&self, segment_num: i32) -> Result<usize> {
        check("segment", segment_num, self.base().min_segment_num(), self.base().max_segment_num())
    }

    fn view_index(&self, view_num: i32) -> Result<usize> {
        check("view", view_num, self.base().min_view_num(), self.base().max_view_num())
    }

    fn axial_index(&self, segment_num: i32, axial_pos_num: i32) -> Result<usize> {
        let b = self.base();
        check("axial position", axial_pos_num, b.min_axial_pos_num(segment_num), b.max_axial_pos_num(segment_num))
    }

    fn tangential_index(&self, tangential_pos_num: i32) -> Result<usize> {
        let b = self.base();
        check("tangential position", tangential_pos_num, b.min_tangential_pos_num(), b.max_tangential_pos_num())
    }

    fn location(&self, bin: &Bin) -> Result<(usize, [usize; 3])> {
        let seg = self.segment_index(bin.segment_num)?;
        Ok((seg, [self.view_index(bin.view_num)?,
                  self.axial_index(bin.segment_num, bin.axial_pos_num)?,
                  self.tangential_index(bin.tangential_pos_num)?]))
    }

    fn expect_shape(&self, what: &'static str, actual: &[usize], expected: &[usize]) -> Result<()> {
        if actual == expected { Ok(()) }
        else { Err(Error::config(format!("{what} has shape {actual:?}, expected {expected:?}"))) }
    }

    /// Sum of all bins
    pub fn sum(&self) -> f32 { self.segments.iter().map(|s| s.sum()).sum() }
}

impl ProjData for ProjDataInMemory {

    fn info(&self) -> &dyn ProjDataInfo { self.info.as_ref() }

    fn get_bin_value(&self, bin: &Bin) -> Result<f32> {
        let (seg, index) = self.location(bin)?;
        Ok(self.segments[seg][index])
    }

    fn set_bin_value(&mut self, bin: &Bin) -> Result<()> {
        let (seg, index) = self.location(bin)?;
        self.segments[seg][index] = bin.value;
        Ok(())
    }

    fn get_viewgram(&self, view_num: i32, segment_num: i32) -> Result<Viewgram> {
        let seg  = self.segment_index(segment_num)?;
        let view = self.view_index(view_num)?;
        Ok(Viewgram {
            segment_num, view_num,
            min_tangential_pos_num: self.base().min_tangential_pos_num(),
            data: self.segments[seg].slice(s![view, .., ..]).to_owned(),
        })
    }

    fn set_viewgram(&mut self, viewgram: &Viewgram) -> Result<()> {
        let seg  = self.segment_index(viewgram.segment_num)?;
        let view = self.view_index(viewgram.view_num)?;
        let target = &self.segments[seg];
        self.expect_shape("viewgram", viewgram.data.shape(), &target.shape()[1..])?;
        self.segments[seg].slice_mut(s![view, .., ..]).assign(&viewgram.data);
        Ok(())
    }

    fn get_sinogram(&self, axial_pos_num: i32, segment_num: i32) -> Result<Sinogram> {
        let seg   = self.segment_index(segment_num)?;
        let axial = self.axial_index(segment_num, axial_pos_num)?;
        Ok(Sinogram {
            segment_num, axial_pos_num,
            min_tangential_pos_num: self.base().min_tangential_pos_num(),
            data: self.segments[seg].slice(s![.., axial, ..]).to_owned(),
        })
    }

    fn set_sinogram(&mut self, sinogram: &Sinogram) -> Result<()> {
        let seg   = self.segment_index(sinogram.segment_num)?;
        let axial = self.axial_index(sinogram.segment_num, sinogram.axial_pos_num)?;
        let shape = self.segments[seg].shape();
        self.expect_shape("sinogram", sinogram.data.shape(), &[shape[0], shape[2]])?;
        self.segments[seg].slice_mut(s![.., axial, ..]).assign(&sinogram.data);
        Ok(())
    }

    fn get_segment_by_view(&self, segment_num: i32) -> Result<SegmentByView> {
        let seg = self.segment_index(segment_num)?;
        Ok(SegmentByView {
            segment_num,
            min_tangential_pos_num: self.base().min_tangential_pos_num(),
            data: self.segments[seg].clone(),
        })
    }

    fn set_segment_by_view(&mut self, segment: &SegmentByView) -> Result<()> {
        let seg = self.segment_index(segment.segment_num)?;
        self.expect_shape("segment", segment.data.shape(), self.segments[seg].shape())?;
        self.segments[seg].assign(&segment.data);
        Ok(())
    }
}

/// Copy every segment present in both `src` and `dst`, for example into data
/// whose segment range has been reduced.
pub fn fill_from(dst: &mut dyn ProjData, src: &dyn ProjData) -> Result<()> {
    let (lo, hi) = (dst.min_segment_num().max(src.min_segment_num()),
                    dst.max_segment_num().min(src.max_segment_num()));
    for segment_num in lo..=hi {
        dst.set_segment_by_view(&src.get_segment_by_view(segment_num)?)?;
    }
    debug!(min_segment = lo, max_segment = hi, "copied projection data");
    Ok(())
}

/// Tally of what happened to LORs offered to [`bin_lors`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BinningReport {
    pub accepted: u64,
    /// LORs which never cross the detector cylinder
    pub missed_cylinder: u64,
    /// LORs which cross it, but outside the stored rings, segments or
    /// tangential positions
    pub out_of_range: u64,
}

impl BinningReport {
    pub fn total(&self) -> u64 { self.accepted + self.missed_cylinder + self.out_of_range }
}

impl std::ops::AddAssign<&BinningReport> for BinningReport {
    fn add_assign(&mut self, rhs: &Self) {
        self.accepted        += rhs.accepted;
        self.missed_cylinder += rhs.missed_cylinder;
        self.out_of_range    += rhs.out_of_range;
    }
}

impl fmt::Display for BinningReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} LORs: {} binned, {} missed the detectors, {} out of range",
               self.total(), self.accepted, self.missed_cylinder, self.out_of_range)
    }
}

/// Histogram `lors` into `proj_data`, adding 1 to the bin of every LOR that
/// has one. LORs without a bin are counted in `report` and skipped.
pub fn bin_lors<'l>(
    proj_data: &mut dyn ProjData,
    lors: impl IntoIterator<Item = &'l LOR>,
    report: &mut BinningReport,
) -> Result<()> {
    let mut this_call = BinningReport::default();
    for lor in lors {
        match proj_data.info().get_bin(lor) {
            Some(bin) => {
                let value = proj_data.get_bin_value(&bin)?;
                proj_data.set_bin_value(&bin.with_value(value + 1.0))?;
                this_call.accepted += 1;
            },
            None => {
                let radius = proj_data.info().cylindrical().ring_radius();
                if lor.change_representation(radius).is_none() { this_call.missed_cylinder += 1 }
                else                                           { this_call.out_of_range    += 1 }
            },
        }
    }
    debug!("{this_call}");
    *report += &this_call;
    Ok(())
}
