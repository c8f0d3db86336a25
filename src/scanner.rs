//! Physical description of a cylindrical PET scanner.

use std::fmt::Write;

use units::{cm_, mm, mm_, Length};

use crate::error::{ensure_config, Result};

/// How the crystals of a ring are grouped into blocks, and blocks into
/// buckets (the units of the electronics).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockLayout {
    pub axial_crystals_per_block      : usize,
    pub transaxial_crystals_per_block : usize,
    pub axial_blocks_per_bucket       : usize,
    pub transaxial_blocks_per_bucket  : usize,
}

/// Immutable once constructed. Share it between many `ProjDataInfo`s with an
/// `Arc<Scanner>`.
#[derive(Clone, Debug, PartialEq)]
pub struct Scanner {
    name                  : String,
    num_rings             : usize,
    num_detectors_per_ring: usize,
    ring_radius           : Length,
    ring_spacing          : Length,
    blocks                : BlockLayout,
}

impl Scanner {

    /// A scanner with a single block covering all crystals. Use
    /// [`Scanner::with_blocks`] to describe the real block structure.
    pub fn new(
        name: impl Into<String>,
        num_rings: usize,
        num_detectors_per_ring: usize,
        ring_radius: Length,
        ring_spacing: Length,
    ) -> Result<Self> {
        ensure_config!(num_rings >= 1, "scanner needs at least one ring");
        ensure_config!(num_detectors_per_ring >= 1, "scanner needs at least one detector per ring");
        ensure_config!(mm_(ring_radius)  > 0.0, "ring radius must be positive, got {} mm", mm_(ring_radius));
        ensure_config!(mm_(ring_spacing) > 0.0, "ring spacing must be positive, got {} mm", mm_(ring_spacing));
        let blocks = BlockLayout {
            axial_crystals_per_block     : num_rings,
            transaxial_crystals_per_block: num_detectors_per_ring,
            axial_blocks_per_bucket      : 1,
            transaxial_blocks_per_bucket : 1,
        };
        Ok(Self {
            name: name.into(),
            num_rings, num_detectors_per_ring,
            ring_radius, ring_spacing,
            blocks,
        })
    }

    /// Replace the block/bucket layout. The crystals per block and blocks
    /// per bucket must tile the rings and the detectors of each ring exactly.
    pub fn with_blocks(self, blocks: BlockLayout) -> Result<Self> {
        let BlockLayout {
            axial_crystals_per_block     : ac, transaxial_crystals_per_block: tc,
            axial_blocks_per_bucket      : ab, transaxial_blocks_per_bucket : tb,
        } = blocks;
        ensure_config!(ac >= 1 && tc >= 1 && ab >= 1 && tb >= 1,
                       "block layout counts must be at least 1: {blocks:?}");
        ensure_config!(self.num_rings % (ac * ab) == 0,
                       "{} rings cannot be split into buckets of {ab} blocks of {ac} crystals",
                       self.num_rings);
        ensure_config!(self.num_detectors_per_ring % (tc * tb) == 0,
                       "{} detectors per ring cannot be split into buckets of {tb} blocks of {tc} crystals",
                       self.num_detectors_per_ring);
        Ok(Self { blocks, ..self })
    }

    pub fn name                  (&self) -> &str   { &self.name }
    pub fn num_rings             (&self) -> usize  { self.num_rings }
    pub fn num_detectors_per_ring(&self) -> usize  { self.num_detectors_per_ring }
    pub fn ring_radius           (&self) -> Length { self.ring_radius }
    pub fn ring_spacing          (&self) -> Length { self.ring_spacing }
    pub fn blocks                (&self) -> BlockLayout { self.blocks }

    pub fn num_axial_blocks     (&self) -> usize { self.num_rings              / self.blocks.axial_crystals_per_block }
    pub fn num_transaxial_blocks(&self) -> usize { self.num_detectors_per_ring / self.blocks.transaxial_crystals_per_block }
    pub fn num_axial_buckets     (&self) -> usize { self.num_axial_blocks()      / self.blocks.axial_blocks_per_bucket }
    pub fn num_transaxial_buckets(&self) -> usize { self.num_transaxial_blocks() / self.blocks.transaxial_blocks_per_bucket }

    /// Number of tangential positions in a non-arc-corrected sinogram which
    /// covers the whole ring.
    pub fn max_num_non_arccorrected_bins(&self) -> usize { self.num_detectors_per_ring }

    /// Tangential bin size at the centre of the field of view: half the
    /// distance between neighbouring detectors along the ring.
    pub fn default_bin_size(&self) -> Length {
        let n = self.num_detectors_per_ring as f32;
        mm(mm_(self.ring_radius) * std::f32::consts::PI / n)
    }

    /// Axial length covered by the centres of the first and last rings.
    pub fn axial_length(&self) -> Length { self.ring_spacing * (self.num_rings - 1) as f32 }

    /// Human-readable summary, for logs.
    pub fn parameter_info(&self) -> String {
        let mut s = String::new();
        let b = &self.blocks;
        // Writing to a String cannot fail
        let _ = writeln!(s, "Scanner parameters:= ");
        let _ = writeln!(s, "Scanner type := {}", self.name);
        let _ = writeln!(s, "Number of rings                          := {}", self.num_rings);
        let _ = writeln!(s, "Number of detectors per ring             := {}", self.num_detectors_per_ring);
        let _ = writeln!(s, "Inner ring diameter (cm)                 := {}", 2.0 * cm_(self.ring_radius));
        let _ = writeln!(s, "Distance between rings (cm)              := {}", cm_(self.ring_spacing));
        let _ = writeln!(s, "Default bin size (cm)                    := {}", cm_(self.default_bin_size()));
        let _ = writeln!(s, "Number of blocks per bucket in transaxial direction := {}", b.transaxial_blocks_per_bucket);
        let _ = writeln!(s, "Number of blocks per bucket in axial direction      := {}", b.axial_blocks_per_bucket);
        let _ = writeln!(s, "Number of crystals per block in axial direction     := {}", b.axial_crystals_per_block);
        let _ = writeln!(s, "Number of crystals per block in transaxial direction := {}", b.transaxial_crystals_per_block);
        let _ = writeln!(s, "End scanner parameters:=");
        s
    }
}

#[cfg(test)]
pub(crate) fn test_scanner() -> Scanner {
    Scanner::new("test", 24, 384, mm(350.0), mm(3.125)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use float_eq::assert_float_eq;

    #[rstest(/**/ rings, dets, radius, spacing,
             case(    0,  384,  350.0,   3.125), // no rings
             case(   24,    0,  350.0,   3.125), // no detectors
             case(   24,  384,    0.0,   3.125), // degenerate radius
             case(   24,  384, -350.0,   3.125), // negative radius
             case(   24,  384,  350.0,   0.0  ), // degenerate spacing
    )]
    fn invalid_scanners_are_rejected(rings: usize, dets: usize, radius: f32, spacing: f32) {
        let result = Scanner::new("bad", rings, dets, mm(radius), mm(spacing));
        assert!(matches!(result, Err(crate::Error::Configuration { .. })));
    }

    #[test]
    fn block_and_bucket_counts() {
        let scanner = test_scanner()
            .with_blocks(BlockLayout {
                axial_crystals_per_block     : 8,
                transaxial_crystals_per_block: 8,
                axial_blocks_per_bucket      : 3,
                transaxial_blocks_per_bucket : 4,
            }).unwrap();
        assert_eq!(scanner.num_axial_blocks(),        3);
        assert_eq!(scanner.num_transaxial_blocks(),  48);
        assert_eq!(scanner.num_axial_buckets(),       1);
        assert_eq!(scanner.num_transaxial_buckets(), 12);
    }

    #[test]
    fn blocks_must_tile_the_scanner() {
        let result = test_scanner()
            .with_blocks(BlockLayout {
                axial_crystals_per_block     : 5,
                transaxial_crystals_per_block: 8,
                axial_blocks_per_bucket      : 1,
                transaxial_blocks_per_bucket : 1,
            });
        assert!(result.is_err());
    }

    #[test]
    fn derived_sizes() {
        let s = test_scanner();
        assert_eq!(s.max_num_non_arccorrected_bins(), 384);
        assert_float_eq!(mm_(s.default_bin_size()), 350.0 * std::f32::consts::PI / 384.0, rmax <= 1e-5);
        assert_float_eq!(mm_(s.axial_length()), 23.0 * 3.125, rmax <= 1e-5);
    }

    #[test]
    fn parameter_info_mentions_geometry() {
        let info = test_scanner().parameter_info();
        assert!(info.contains("Number of rings                          := 24"));
        assert!(info.contains("Number of detectors per ring             := 384"));
    }
}
