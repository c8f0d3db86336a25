//! Voxelized images and their placement relative to the scanner.
//!
//! Indices are `[z, y, x]`. Planes are numbered from 0; `x` and `y` indices
//! are centred on 0, so voxel `[z, 0, 0]` lies on the scanner axis when the
//! origin does.

use ndarray::{s, Array3, ArrayView2, ArrayViewMut2};
use geometry::Point;
use units::{mm, mm_, Length, Volume};
use tracing::debug;

use crate::error::{ensure_config, Result};
use crate::proj_data_info::ProjDataInfo;

pub type Index3 = [i32; 3];

/// The view of an image that geometric consumers need: index ranges, voxel
/// geometry and element access.
pub trait DiscretisedDensity {
    fn min_indices(&self) -> Index3;
    fn max_indices(&self) -> Index3;

    /// Voxel size along `[z, y, x]`
    fn voxel_size(&self) -> [Length; 3];

    /// Physical position of voxel `[0, 0, 0]`
    fn origin(&self) -> Point;

    fn get    (&    self, index: Index3) -> Option<f32>;
    fn get_mut(&mut self, index: Index3) -> Option<&mut f32>;

    /// Same geometry, all voxels zero
    fn empty_clone(&self) -> Self where Self: Sized;

    /// Plane `z`, indexed `[y - min_y, x - min_x]`
    fn plane    (&    self, z: i32) -> Option<ArrayView2<'_, f32>>;
    fn plane_mut(&mut self, z: i32) -> Option<ArrayViewMut2<'_, f32>>;

    fn contains(&self, index: Index3) -> bool {
        let (lo, hi) = (self.min_indices(), self.max_indices());
        (0..3).all(|d| lo[d] <= index[d] && index[d] <= hi[d])
    }

    fn voxel_volume(&self) -> Volume {
        let [dz, dy, dx] = self.voxel_size();
        dz * dy * dx
    }

    fn physical_coordinates_for_indices(&self, [iz, iy, ix]: Index3) -> Point {
        let [dz, dy, dx] = self.voxel_size();
        let o = self.origin();
        Point::new(o.x + dx * ix as f32,
                   o.y + dy * iy as f32,
                   o.z + dz * iz as f32)
    }

    /// Indices of the voxel whose centre is nearest to `p`. The result lies
    /// outside the image when `p` does.
    fn indices_for_physical_coordinates(&self, p: Point) -> Index3 {
        let [dz, dy, dx] = self.voxel_size();
        let o = self.origin();
        let nearest = |c: Length, o: Length, d: Length| (mm_(c - o) / mm_(d)).round() as i32;
        [nearest(p.z, o.z, dz), nearest(p.y, o.y, dy), nearest(p.x, o.x, dx)]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VoxelsOnCartesianGrid {
    data: Array3<f32>,
    min_indices: Index3,
    voxel_size: [Length; 3],
    origin: Point,
}

impl VoxelsOnCartesianGrid {

    /// Zero-filled image with `[nz, ny, nx]` voxels
    pub fn new([nz, ny, nx]: [usize; 3], voxel_size: [Length; 3], origin: Point) -> Result<Self> {
        ensure_config!(nz > 0 && ny > 0 && nx > 0, "image dimensions must be non-zero, got {nz} x {ny} x {nx}");
        ensure_config!(voxel_size.iter().all(|&d| mm_(d) > 0.0),
                       "voxel sizes must be positive, got {:?} mm", voxel_size.map(mm_));
        let centred = |n: usize| -((n / 2) as i32);
        Ok(Self {
            data: Array3::zeros((nz, ny, nx)),
            min_indices: [0, centred(ny), centred(nx)],
            voxel_size,
            origin,
        })
    }

    /// An image matching the sampling of `info`: one plane per ring and one
    /// between each pair of neighbouring rings (so plane `2r` is centred on
    /// ring `r`), and transaxial voxels `zoom` times finer than the
    /// tangential sampling. The transaxial size defaults to covering all
    /// tangential positions, and is always odd.
    pub fn for_proj_data_info(info: &dyn ProjDataInfo, zoom: f32, xy_size: Option<usize>) -> Result<Self> {
        ensure_config!(zoom > 0.0, "zoom must be positive, got {zoom}");
        let base = info.cylindrical();
        let num_rings = base.scanner().num_rings();
        let dz  = base.ring_spacing() / 2.0;
        let dxy = info.tangential_sampling() / zoom;
        let n = xy_size.unwrap_or_else(|| (base.num_tangential_poss() as f32 * zoom).round() as usize);
        let n = if n % 2 == 0 { n + 1 } else { n };
        let image = Self::new([2 * num_rings - 1, n, n], [dz, dxy, dxy], Point::zero())?;
        debug!(planes = 2 * num_rings - 1, xy = n, voxel_xy_mm = mm_(dxy), voxel_z_mm = mm_(dz),
               "image geometry for projection data");
        Ok(image)
    }

    fn offset(&self, index: Index3) -> Option<[usize; 3]> {
        if !self.contains(index) { return None }
        let m = self.min_indices;
        Some([0, 1, 2].map(|d| (index[d] - m[d]) as usize))
    }

    pub fn data(&self) -> &Array3<f32> { &self.data }

    pub fn fill(&mut self, value: f32) { self.data.fill(value) }

    pub fn sum(&self) -> f32 { self.data.sum() }

    /// Number of voxels along `[z, y, x]`
    pub fn dimensions(&self) -> [usize; 3] {
        let (nz, ny, nx) = self.data.dim();
        [nz, ny, nx]
    }
}

impl DiscretisedDensity for VoxelsOnCartesianGrid {

    fn min_indices(&self) -> Index3 { self.min_indices }

    fn max_indices(&self) -> Index3 {
        let [nz, ny, nx] = self.dimensions();
        let m = self.min_indices;
        [m[0] + nz as i32 - 1, m[1] + ny as i32 - 1, m[2] + nx as i32 - 1]
    }

    fn voxel_size(&self) -> [Length; 3] { self.voxel_size }
    fn origin    (&self) -> Point       { self.origin }

    fn get(&self, index: Index3) -> Option<f32> {
        self.offset(index).map(|i| self.data[i])
    }

    fn get_mut(&mut self, index: Index3) -> Option<&mut f32> {
        let i = self.offset(index)?;
        self.data.get_mut(i)
    }

    fn empty_clone(&self) -> Self {
        Self {
            data: Array3::zeros(self.data.raw_dim()),
            min_indices: self.min_indices,
            voxel_size: self.voxel_size,
            origin: self.origin,
        }
    }

    fn plane(&self, z: i32) -> Option<ArrayView2<'_, f32>> {
        let iz = z.checked_sub(self.min_indices[0]).filter(|&i| i >= 0 && (i as usize) < self.data.dim().0)?;
        Some(self.data.slice(s![iz as usize, .., ..]))
    }

    fn plane_mut(&mut self, z: i32) -> Option<ArrayViewMut2<'_, f32>> {
        let iz = z.checked_sub(self.min_indices[0]).filter(|&i| i >= 0 && (i as usize) < self.data.dim().0)?;
        Some(self.data.slice_mut(s![iz as usize, .., ..]))
    }
}

/// Shorthand for a grid of cubic voxels of side `voxel_mm`, centred on the
/// scanner axis.
pub fn cubic_voxels(n: [usize; 3], voxel_mm: f32) -> Result<VoxelsOnCartesianGrid> {
    VoxelsOnCartesianGrid::new(n, [mm(voxel_mm); 3], Point::zero())
}
