//! 盒计数分形维数.
//!
//! 分形估计不使用离散化网格, 而是作用于原始灰度的一个二维水平切片:
//!
//! 1. 按 [`FractalSlice`] 选定切片 `S = k`;
//! 2. 将三维掩码沿第三维投影, 以投影的行列包围盒裁剪该切片,
//!    该切片上 ROI 外的像素置为 `NaN`;
//! 3. 重采样为边长为 2 的幂的正方形;
//! 4. 在 `side / 2, side / 4, ..., 1` 各尺度上计数, 在对数坐标下拟合直线.
//!
//! # 注意
//!
//! 裁剪使用二维投影包围盒, 与其他特征族使用的三维包围盒不同.

use ndarray::{s, Array1, Array2, ArrayView2, ArrayView3, Axis, Zip};

use super::{Category, FeatureDescriptor, FeatureFamily};
use crate::consts::FRACTAL_MAX_SIDE;
use crate::fitting::fit_line;
use crate::params::FractalSlice;
use crate::roi::{plane_bounds, project_mask};
use crate::{RadiomicsError, RadiomicsResult};

mod boxes;
mod resample;

pub use boxes::BoxCounts;
pub use resample::{resample_square, square_side};

/// 三种分形维数估计.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FractalDimensions {
    /// 基本盒计数维数.
    pub basic: f64,

    /// 差分盒计数维数.
    pub differential: f64,

    /// 三角棱柱表面积维数.
    pub prism: f64,
}

impl FeatureFamily for FractalDimensions {
    const DESCRIPTORS: &'static [FeatureDescriptor] = &[
        FeatureDescriptor::new(Category::Fractal, "Box Counting Dimension"),
        FeatureDescriptor::new(Category::Fractal, "Differential Box Counting Dimension"),
        FeatureDescriptor::new(Category::Fractal, "Prism Surface Dimension"),
    ];
}

/// 选择分形切片的索引.
fn select_slice(mask: ArrayView3<bool>, slice: FractalSlice) -> RadiomicsResult<usize> {
    let len = mask.len_of(Axis(2));
    match slice {
        FractalSlice::At(index) if index < len => Ok(index),
        FractalSlice::At(index) => Err(RadiomicsError::SliceOutOfRange { index, len }),
        FractalSlice::MostRoi => {
            let (best, count) = mask
                .axis_iter(Axis(2))
                .map(|plane| plane.iter().filter(|v| **v).count())
                .enumerate()
                .fold((0, 0), |best, cur| if cur.1 > best.1 { cur } else { best });
            if count == 0 {
                return Err(RadiomicsError::EmptyRoi);
            }
            Ok(best)
        }
    }
}

/// 从扫描中取出用于分形估计的二维图像. ROI 外的像素为 `NaN`.
///
/// # 错误
///
/// 1. 形状不一致时返回 [`RadiomicsError::ShapeMismatch`];
/// 2. 掩码为空时返回 [`RadiomicsError::EmptyRoi`];
/// 3. 指定切片越界时返回 [`RadiomicsError::SliceOutOfRange`];
/// 4. 裁剪后任一边长超过 1024 时返回 [`RadiomicsError::FractalSliceTooLarge`].
pub fn prepare_slice<T>(
    volume: ArrayView3<T>,
    mask: ArrayView3<bool>,
    slice: FractalSlice,
) -> RadiomicsResult<Array2<f64>>
where
    T: Copy + Into<f64>,
{
    if volume.dim() != mask.dim() {
        return Err(RadiomicsError::ShapeMismatch {
            volume: volume.dim(),
            mask: mask.dim(),
        });
    }
    let projected = project_mask(mask.view());
    let (rows, cols) = plane_bounds(projected.view()).ok_or(RadiomicsError::EmptyRoi)?;
    let k = select_slice(mask.view(), slice)?;

    let values = volume.slice(s![rows.clone(), cols.clone(), k]);
    let inside = mask.slice(s![rows, cols, k]);
    let image = Zip::from(&values)
        .and(&inside)
        .map_collect(|&v, &m| if m { v.into() } else { f64::NAN });

    let (h, w) = image.dim();
    if h > FRACTAL_MAX_SIDE || w > FRACTAL_MAX_SIDE {
        return Err(RadiomicsError::FractalSliceTooLarge((h, w)));
    }
    log::debug!("分形切片: S = {k}, 裁剪为 {h}x{w}");
    Ok(image)
}

/// 在对数坐标下拟合 `ln(count)` 与 `ln(size)`, 返回斜率. 只使用正的计数.
fn log_log_slope(sizes: &[usize], counts: &[f64]) -> Option<f64> {
    let (x, y): (Vec<f64>, Vec<f64>) = sizes
        .iter()
        .zip(counts)
        .filter(|(_, c)| c.is_finite() && **c > 0.0)
        .map(|(s, c)| ((*s as f64).ln(), c.ln()))
        .unzip();
    fit_line(Array1::from(x).view(), Array1::from(y).view()).map(|line| line.slope)
}

impl FractalDimensions {
    /// 估计图像的三种分形维数. 图像会先被重采样为边长为 2 的幂的正方形.
    ///
    /// 可用的尺度少于两个 (如单像素图像), 或图像全部为空时, 对应维数为 `NaN`.
    pub fn estimate(image: ArrayView2<f64>) -> RadiomicsResult<Self> {
        let (h, w) = image.dim();
        if h > FRACTAL_MAX_SIDE || w > FRACTAL_MAX_SIDE {
            return Err(RadiomicsError::FractalSliceTooLarge((h, w)));
        }
        let side = square_side(image);
        let square = resample_square(image, side);
        let counts = BoxCounts::measure(square.view());
        log::debug!("分形盒子尺寸: {:?}", counts.sizes);

        let slope = |name: &str, series: &[f64]| {
            log_log_slope(&counts.sizes, series).unwrap_or_else(|| {
                log::warn!("{name} 回归退化, 维数记为 NaN");
                f64::NAN
            })
        };
        Ok(Self {
            basic: -slope("基本盒计数", &counts.basic),
            differential: -slope("差分盒计数", &counts.differential),
            prism: 2.0 - slope("三角棱柱", &counts.prism),
        })
    }

    /// 按描述符顺序输出.
    pub fn to_array(&self) -> [f64; 3] {
        [self.basic, self.differential, self.prism]
    }
}
