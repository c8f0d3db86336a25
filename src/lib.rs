//! Geometry and bin addressing for projection data of cylindrical PET
//! scanners: conversion between lines of response and discrete sinogram
//! bins, the containers and images built on them, and region-of-interest
//! statistics.

pub mod error;
pub mod scanner;
pub mod bin;
pub mod lor;
pub mod proj_data_info;
pub mod proj_data;
pub mod image;
pub mod shape;
pub mod roi;
pub mod config;

pub use error::{Error, Result};
pub use scanner::{BlockLayout, Scanner};
pub use bin::Bin;
pub use lor::{LOR, LORInAxialAndSinogramCoordinates};
pub use proj_data_info::{
    proj_data_info_from_span,
    DetectionPair,
    ProjDataInfo,
    ProjDataInfoCylindrical,
    ProjDataInfoCylindricalArcCorr,
    ProjDataInfoCylindricalNoArcCorr,
    SegmentSpec,
};
pub use proj_data::{bin_lors, fill_from, BinningReport, ProjData, ProjDataInMemory};
pub use image::{DiscretisedDensity, VoxelsOnCartesianGrid};
pub use shape::{Ellipsoid, EllipsoidalCylinder, Shape3D};
pub use roi::{MinMaxPolicy, PerPlane, ROIValues};

pub use geometry::Point;
pub use units::{Angle, Length, Ratio};
