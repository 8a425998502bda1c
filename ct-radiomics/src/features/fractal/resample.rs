//! 带 `NaN` 掩码的图像重采样.
//!
//! `image` 的缩放只接受有限值, 这里用归一化卷积: 分别缩放取值图像和
//! 有效性权重图像, 再逐像素相除. 权重不足一半的像素视为 ROI 外, 仍为 `NaN`.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use itertools::{Itertools, MinMaxResult};
use ndarray::{Array2, ArrayView2};

type GrayF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

/// 权重低于此值的像素视为无效.
const MIN_WEIGHT: f32 = 0.5;

/// 大于等于 `image` 最长边的最小 2 的幂.
#[inline]
pub fn square_side(image: ArrayView2<f64>) -> usize {
    let (h, w) = image.dim();
    h.max(w).max(1).next_power_of_two()
}

fn to_buffer(image: ArrayView2<f64>, op: impl Fn(f64) -> f32) -> GrayF32 {
    let (h, w) = image.dim();
    ImageBuffer::from_fn(w as u32, h as u32, |x, y| {
        Luma([op(image[(y as usize, x as usize)])])
    })
}

/// 将 `image` 重采样为 `side x side`. 形状已符合时直接复制.
///
/// 有效值先线性映射到 `[0, 1]`, 缩放后再映射回原区间, 因此输出不会超出
/// 输入有效值的范围.
pub fn resample_square(image: ArrayView2<f64>, side: usize) -> Array2<f64> {
    if image.dim() == (side, side) {
        return image.to_owned();
    }

    let range = image
        .iter()
        .filter(|v| v.is_finite())
        .minmax_by(|a, b| a.total_cmp(b));
    let (lo, hi) = match range {
        MinMaxResult::NoElements => return Array2::from_elem((side, side), f64::NAN),
        MinMaxResult::OneElement(v) => (*v, *v),
        MinMaxResult::MinMax(lo, hi) => (*lo, *hi),
    };
    let span = hi - lo;

    let values = to_buffer(image, |v| {
        if v.is_finite() && span > 0.0 {
            ((v - lo) / span) as f32
        } else {
            0.0
        }
    });
    let weights = to_buffer(image, |v| if v.is_finite() { 1.0 } else { 0.0 });

    let n = side as u32;
    let values = imageops::resize(&values, n, n, FilterType::Triangle);
    let weights = imageops::resize(&weights, n, n, FilterType::Triangle);

    Array2::from_shape_fn((side, side), |(r, c)| {
        let (x, y) = (c as u32, r as u32);
        let w = weights.get_pixel(x, y)[0];
        if w < MIN_WEIGHT {
            return f64::NAN;
        }
        let t = (values.get_pixel(x, y)[0] / w).clamp(0.0, 1.0);
        lo + t as f64 * span
    })
}
