//! TOML description of a scanner and of the projection data recorded by it.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, de};
use tracing::debug;

use units::Length;

use crate::error::{ensure_config, Result};
use crate::proj_data_info::{proj_data_info_from_span, ProjDataInfo};
use crate::scanner::{BlockLayout, Scanner};

// Quantities are written with their units, as strings: `ring_radius = "35 cm"`.
// TOML has no syntax for them, so parse the string with `uom`'s `FromStr`.
fn deserialize_uom<'d, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    String::deserialize(deserializer)?
        .parse::<T>()
        .map_err(de::Error::custom)
}

// Needs `#[serde(default)]` alongside, or a missing field is an error.
fn deserialize_uom_opt<'d, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| s.parse::<T>())
        .transpose()
        .map_err(de::Error::custom)
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub scanner: ScannerConfig,
    pub proj_data: ProjDataConfig,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ScannerConfig {
    pub name: String,
    pub num_rings: usize,
    pub num_detectors_per_ring: usize,

    #[serde(deserialize_with = "deserialize_uom")]
    pub ring_radius: Length,

    #[serde(deserialize_with = "deserialize_uom")]
    pub ring_spacing: Length,

    // Block layout. Defaults: a single block spanning the whole scanner.
    pub num_axial_crystals_per_block     : Option<usize>,
    pub num_transaxial_crystals_per_block: Option<usize>,
    pub num_axial_blocks_per_bucket      : Option<usize>,
    pub num_transaxial_blocks_per_bucket : Option<usize>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ProjDataConfig {
    #[serde(default = "default_span")]
    pub span: usize,

    /// Defaults to `num_rings - 1`
    pub max_ring_difference: Option<usize>,

    /// Defaults to half the number of detectors per ring
    pub num_views: Option<usize>,

    /// Defaults to the number of detectors per ring
    pub num_tangential_poss: Option<usize>,

    #[serde(default = "default_arc_corrected")]
    pub arc_corrected: bool,

    /// Arc-corrected data only. Defaults to the scanner's default bin size.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_opt")]
    pub tangential_sampling: Option<Length>,
}

fn default_span() -> usize { 1 }
fn default_arc_corrected() -> bool { true }

pub fn read_config_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    debug!(?path, "read configuration");
    Config::from_toml_str(&text)
}

impl Config {

    pub fn from_toml_str(text: &str) -> Result<Self> { Ok(toml::from_str(text)?) }

    pub fn scanner(&self) -> Result<Arc<Scanner>> {
        let s = &self.scanner;
        let scanner = Scanner::new(s.name.clone(), s.num_rings, s.num_detectors_per_ring, s.ring_radius, s.ring_spacing)?;
        let defaults = scanner.blocks();
        let blocks = BlockLayout {
            axial_crystals_per_block     : s.num_axial_crystals_per_block     .unwrap_or(defaults.axial_crystals_per_block),
            transaxial_crystals_per_block: s.num_transaxial_crystals_per_block.unwrap_or(defaults.transaxial_crystals_per_block),
            axial_blocks_per_bucket      : s.num_axial_blocks_per_bucket      .unwrap_or(defaults.axial_blocks_per_bucket),
            transaxial_blocks_per_bucket : s.num_transaxial_blocks_per_bucket .unwrap_or(defaults.transaxial_blocks_per_bucket),
        };
        Ok(Arc::new(scanner.with_blocks(blocks)?))
    }

    /// The projection data description, on a freshly built scanner
    pub fn proj_data_info(&self) -> Result<Box<dyn ProjDataInfo>> {
        self.proj_data_info_for(self.scanner()?)
    }

    /// The projection data description, sharing an existing scanner
    pub fn proj_data_info_for(&self, scanner: Arc<Scanner>) -> Result<Box<dyn ProjDataInfo>> {
        let p = &self.proj_data;
        ensure_config!(p.arc_corrected || p.tangential_sampling.is_none(),
                       "tangential_sampling only applies to arc-corrected data");
        let num_views = p.num_views.unwrap_or(scanner.num_detectors_per_ring() / 2);
        let num_tangential_poss = p.num_tangential_poss.unwrap_or(scanner.max_num_non_arccorrected_bins());
        proj_data_info_from_span(scanner, p.span, p.max_ring_difference, num_views, num_tangential_poss,
                                 p.arc_corrected, p.tangential_sampling)
    }
}
