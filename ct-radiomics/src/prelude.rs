//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, Offset};

pub use crate::{extract, extract_batch, extract_with, FeatureVector};
pub use crate::{DegeneratePolicy, ExtractParams, FractalSlice};
pub use crate::{RadiomicsError, RadiomicsResult};

pub use crate::roi::{BoundingBox, ConnectivityMap};
pub use crate::DiscretizedGrid;

pub use crate::features::fractal::{prepare_slice, BoxCounts};
pub use crate::features::{
    feature_names, Category, FeatureFamily, FractalDimensions, Glzsm, Gtsdm, HistogramStats,
    Ngtdm,
};

pub use crate::consts::levels::{BATCH, INTERACTIVE};
