//! Implicit 3D shapes, and their rasterization onto voxel grids.

use geometry::Point;
use units::{mm_, Length};

use crate::error::{ensure_config, Result};
use crate::image::DiscretisedDensity;

pub trait Shape3D {

    fn is_inside_shape(&self, p: Point) -> bool;

    /// Overwrite every voxel of `image` with the fraction of its volume that
    /// lies inside the shape, estimated from a regular grid of
    /// `num_samples = [nz, ny, nx]` points per voxel.
    fn construct_volume(&self, image: &mut dyn DiscretisedDensity, num_samples: [usize; 3]) {
        let [sz, sy, sx] = num_samples.map(|n| n.max(1));
        let [dz, dy, dx] = image.voxel_size().map(mm_);
        // Sub-sample offsets from the voxel centre, in mm
        let offsets = |n: usize, d: f32| -> Vec<f32> {
            (0..n).map(|k| ((k as f32 + 0.5) / n as f32 - 0.5) * d).collect()
        };
        let (oz, oy, ox) = (offsets(sz, dz), offsets(sy, dy), offsets(sx, dx));
        let total = (sz * sy * sx) as f32;
        let (lo, hi) = (image.min_indices(), image.max_indices());
        for iz in lo[0]..=hi[0] {
            for iy in lo[1]..=hi[1] {
                for ix in lo[2]..=hi[2] {
                    let [cx, cy, cz] = image.physical_coordinates_for_indices([iz, iy, ix]).to_mm();
                    let mut inside = 0_usize;
                    for z in &oz { for y in &oy { for x in &ox {
                        if self.is_inside_shape(Point::from_mm(cx + x, cy + y, cz + z)) { inside += 1 }
                    }}}
                    if let Some(voxel) = image.get_mut([iz, iy, ix]) {
                        *voxel = inside as f32 / total;
                    }
                }
            }
        }
    }
}

fn ensure_positive(what: &str, l: Length) -> Result<()> {
    ensure_config!(mm_(l) > 0.0, "{what} must be positive, got {} mm", mm_(l));
    Ok(())
}

/// Axis-aligned ellipsoid
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    pub centre: Point,
    pub radius_x: Length,
    pub radius_y: Length,
    pub radius_z: Length,
}

impl Ellipsoid {
    pub fn new(centre: Point, radius_x: Length, radius_y: Length, radius_z: Length) -> Result<Self> {
        ensure_positive("ellipsoid x radius", radius_x)?;
        ensure_positive("ellipsoid y radius", radius_y)?;
        ensure_positive("ellipsoid z radius", radius_z)?;
        Ok(Self { centre, radius_x, radius_y, radius_z })
    }

    pub fn sphere(centre: Point, radius: Length) -> Result<Self> { Self::new(centre, radius, radius, radius) }
}

impl Shape3D for Ellipsoid {
    fn is_inside_shape(&self, p: Point) -> bool {
        let [x, y, z] = p.to_mm();
        let [cx, cy, cz] = self.centre.to_mm();
        let (u, v, w) = ((x - cx) / mm_(self.radius_x),
                         (y - cy) / mm_(self.radius_y),
                         (z - cz) / mm_(self.radius_z));
        u*u + v*v + w*w <= 1.0
    }
}

/// Cylinder of elliptical cross-section with its axis parallel to `z`,
/// extending `length / 2` either side of `centre`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EllipsoidalCylinder {
    pub centre: Point,
    pub radius_x: Length,
    pub radius_y: Length,
    pub length: Length,
}

impl EllipsoidalCylinder {
    pub fn new(centre: Point, radius_x: Length, radius_y: Length, length: Length) -> Result<Self> {
        ensure_positive("cylinder x radius", radius_x)?;
        ensure_positive("cylinder y radius", radius_y)?;
        ensure_positive("cylinder length"  , length  )?;
        Ok(Self { centre, radius_x, radius_y, length })
    }

    pub fn circular(centre: Point, radius: Length, length: Length) -> Result<Self> {
        Self::new(centre, radius, radius, length)
    }
}

impl Shape3D for EllipsoidalCylinder {
    fn is_inside_shape(&self, p: Point) -> bool {
        let [x, y, z] = p.to_mm();
        let [cx, cy, cz] = self.centre.to_mm();
        if (z - cz).abs() > mm_(self.length) / 2.0 { return false }
        let (u, v) = ((x - cx) / mm_(self.radius_x),
                      (y - cy) / mm_(self.radius_y));
        u*u + v*v <= 1.0
    }
}
