//! Statistics of image values inside a region of interest, per plane and in
//! total, and the contrast figures derived from them.

use std::fmt;
use std::ops::{Add, AddAssign};

use ndarray::Zip;
use tracing::debug;
use units::{mm3_, todo::{Intensityf32, Volumef32}};

use crate::error::{Error, Result};
use crate::image::DiscretisedDensity;
use crate::shape::Shape3D;

/// Sums accumulated over (part of) a region of interest.
///
/// `volume` is in mm³ and is weighted by the fraction of each voxel inside
/// the region; `integral` and `integral_square` are the correspondingly
/// weighted sums of the values and of their squares, times the voxel volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ROIValues {
    pub volume         : Volumef32,
    pub integral       : f32,
    pub integral_square: f32,
    pub min            : Intensityf32,
    pub max            : Intensityf32,
}

impl ROIValues {
    pub fn new(volume: Volumef32, integral: f32, integral_square: f32, min: Intensityf32, max: Intensityf32) -> Self {
        Self { volume, integral, integral_square, min, max }
    }

    pub fn mean(&self) -> Result<f32> {
        if self.volume == 0.0 { return Err(Error::DivisionByZero { what: "ROI mean (zero volume)" }) }
        Ok(self.integral / self.volume)
    }

    pub fn variance(&self) -> Result<f32> {
        let mean = self.mean()?;
        Ok(self.integral_square / self.volume - mean * mean)
    }

    /// Rounding can make tiny variances negative; those give 0.
    pub fn stddev(&self) -> Result<f32> { Ok(self.variance()?.max(0.0).sqrt()) }
}

/// The identity of `+`: nothing accumulated.
impl Default for ROIValues {
    fn default() -> Self { Self::new(0.0, 0.0, 0.0, f32::INFINITY, f32::NEG_INFINITY) }
}

/// Volumes and integrals add; extrema are reduced.
impl AddAssign for ROIValues {
    fn add_assign(&mut self, rhs: Self) {
        self.volume          += rhs.volume;
        self.integral        += rhs.integral;
        self.integral_square += rhs.integral_square;
        self.min = self.min.min(rhs.min);
        self.max = self.max.max(rhs.max);
    }
}

impl Add for ROIValues {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self { self += rhs; self }
}

impl std::iter::Sum for ROIValues {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self { iter.fold(Self::default(), Add::add) }
}

impl fmt::Display for ROIValues {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let show = |r: Result<f32>| r.map_or_else(|_| "undefined".to_string(), |v| v.to_string());
        writeln!(f, "ROI volume := {}", self.volume)?;
        writeln!(f, "ROI integral := {}", self.integral)?;
        writeln!(f, "ROI mean := {}", show(self.mean()))?;
        writeln!(f, "ROI standard deviation := {}", show(self.stddev()))?;
        writeln!(f, "ROI min := {}", self.min)?;
        writeln!(f, "ROI max := {}", self.max)
    }
}

/// Which voxels contribute to the ROI extrema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MinMaxPolicy {
    /// Image values of voxels at least partly inside the shape
    #[default]
    InsideShape,
    /// Every voxel of the plane after multiplying by the mask, so voxels
    /// outside the shape contribute 0. Reproduces results of older tools.
    IncludeBackground,
}

/// Values indexed by plane number, starting at `min_index`
#[derive(Clone, Debug, PartialEq)]
pub struct PerPlane<T> {
    pub min_index: i32,
    pub values: Vec<T>,
}

impl<T> PerPlane<T> {
    pub fn new(min_index: i32, values: Vec<T>) -> Self { Self { min_index, values } }

    pub fn max_index(&self) -> i32 { self.min_index + self.values.len() as i32 - 1 }

    pub fn get(&self, plane: i32) -> Option<&T> {
        usize::try_from(plane - self.min_index).ok().and_then(|i| self.values.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &T)> {
        (self.min_index..).zip(self.values.iter())
    }

    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    fn range(&self) -> (i32, i32) { (self.min_index, self.max_index()) }
}

impl<T> std::ops::Index<i32> for PerPlane<T> {
    type Output = T;
    fn index(&self, plane: i32) -> &T { &self.values[(plane - self.min_index) as usize] }
}

fn plane_values<D: DiscretisedDensity>(image: &D, mask: &D, z: i32, policy: MinMaxPolicy) -> ROIValues {
    let voxel_volume = mm3_(image.voxel_volume());
    let (Some(img), Some(msk)) = (image.plane(z), mask.plane(z)) else { return ROIValues::default() };
    let mut v = ROIValues::default();
    Zip::from(&img).and(&msk).for_each(|&value, &weight| {
        v.volume          += weight;
        v.integral        += weight * value;
        v.integral_square += weight * value * value;
        let extremum_candidate = match policy {
            MinMaxPolicy::InsideShape       => (weight > 0.0).then_some(value),
            MinMaxPolicy::IncludeBackground => Some(weight * value),
        };
        if let Some(x) = extremum_candidate {
            v.min = v.min.min(x);
            v.max = v.max.max(x);
        }
    });
    v.volume          *= voxel_volume;
    v.integral        *= voxel_volume;
    v.integral_square *= voxel_volume;
    v
}

fn roi_values_for_planes<D: DiscretisedDensity>(
    image: &D,
    first: i32,
    last: i32,
    shape: &dyn Shape3D,
    num_samples: [usize; 3],
    policy: MinMaxPolicy,
) -> PerPlane<ROIValues> {
    let mut mask = image.empty_clone();
    shape.construct_volume(&mut mask, num_samples);
    let values = (first..=last).map(|z| plane_values(image, &mask, z, policy)).collect();
    debug!(first, last, ?num_samples, ?policy, "ROI values per plane");
    PerPlane::new(first, values)
}

/// ROI statistics of every plane of `image`, with the shape rasterized at
/// `num_samples` points per voxel along `[z, y, x]`.
pub fn compute_roi_values_per_plane<D: DiscretisedDensity>(
    image: &D,
    shape: &dyn Shape3D,
    num_samples: [usize; 3],
    policy: MinMaxPolicy,
) -> PerPlane<ROIValues> {
    roi_values_for_planes(image, image.min_indices()[0], image.max_indices()[0], shape, num_samples, policy)
}

/// As [`compute_roi_values_per_plane`], ignoring `skip_first` planes at the
/// start and `skip_last` at the end of the image.
pub fn compute_plane_range_roi_values_per_plane<D: DiscretisedDensity>(
    image: &D,
    (skip_first, skip_last): (usize, usize),
    shape: &dyn Shape3D,
    num_samples: [usize; 3],
    policy: MinMaxPolicy,
) -> Result<PerPlane<ROIValues>> {
    let (lo, hi) = (image.min_indices()[0], image.max_indices()[0]);
    let (first, last) = (lo + skip_first as i32, hi - skip_last as i32);
    if first > last {
        return Err(Error::config(format!(
            "skipping {skip_first} + {skip_last} planes leaves none of [{lo}, {hi}]")))
    }
    Ok(roi_values_for_planes(image, first, last, shape, num_samples, policy))
}

pub fn compute_total_roi_values_from_planes(values: &PerPlane<ROIValues>) -> ROIValues {
    values.values.iter().copied().sum()
}

pub fn compute_total_roi_values<D: DiscretisedDensity>(
    image: &D,
    shape: &dyn Shape3D,
    num_samples: [usize; 3],
    policy: MinMaxPolicy,
) -> ROIValues {
    let total = compute_total_roi_values_from_planes(&compute_roi_values_per_plane(image, shape, num_samples, policy));
    debug!(volume = total.volume, integral = total.integral, "total ROI values");
    total
}

fn ratio_of_means(numerator: &ROIValues, denominator: &ROIValues) -> Result<f32> {
    let m2 = denominator.mean()?;
    if m2 == 0.0 { return Err(Error::DivisionByZero { what: "contrast (zero reference mean)" }) }
    Ok(numerator.mean()? / m2)
}

/// Hot contrast: `1 - mean1 / mean2`
pub fn compute_cr_hot(v1: &ROIValues, v2: &ROIValues) -> Result<f32> { Ok(1.0 - ratio_of_means(v1, v2)?) }

/// Cold contrast: `mean1 / mean2 - 1`
pub fn compute_cr_cold(v1: &ROIValues, v2: &ROIValues) -> Result<f32> { Ok(ratio_of_means(v1, v2)? - 1.0) }

/// Relative standard deviation: `stddev / mean`
pub fn compute_uniformity(v: &ROIValues) -> Result<f32> {
    let mean = v.mean()?;
    if mean == 0.0 { return Err(Error::DivisionByZero { what: "uniformity (zero mean)" }) }
    Ok(v.stddev()? / mean)
}

fn pairwise(
    what: &'static str,
    v1: &PerPlane<ROIValues>,
    v2: &PerPlane<ROIValues>,
    f: fn(&ROIValues, &ROIValues) -> Result<f32>,
) -> Result<PerPlane<Result<f32>>> {
    if v1.range() != v2.range() {
        return Err(Error::RangeMismatch { what, left: v1.range(), right: v2.range() })
    }
    let values = v1.values.iter().zip(&v2.values).map(|(a, b)| f(a, b)).collect();
    Ok(PerPlane::new(v1.min_index, values))
}

/// [`compute_cr_hot`] plane by plane. Only mismatched plane ranges fail as a
/// whole: planes where either ROI is empty hold their own error.
pub fn compute_cr_hot_per_plane(v1: &PerPlane<ROIValues>, v2: &PerPlane<ROIValues>) -> Result<PerPlane<Result<f32>>> {
    pairwise("hot contrast per plane", v1, v2, compute_cr_hot)
}

pub fn compute_cr_cold_per_plane(v1: &PerPlane<ROIValues>, v2: &PerPlane<ROIValues>) -> Result<PerPlane<Result<f32>>> {
    pairwise("cold contrast per plane", v1, v2, compute_cr_cold)
}

pub fn compute_uniformity_per_plane(v: &PerPlane<ROIValues>) -> PerPlane<Result<f32>> {
    PerPlane::new(v.min_index, v.values.iter().map(compute_uniformity).collect())
}
