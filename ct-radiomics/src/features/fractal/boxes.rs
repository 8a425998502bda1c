//! 多尺度盒计数.

use ndarray::{s, ArrayView2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 各盒子尺寸下的三种计数.
///
/// `sizes[k] = side / 2^(k + 1)`, 从大到小排列.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxCounts {
    /// 盒子边长.
    pub sizes: Vec<usize>,

    /// 含有非零有限像素的盒子数.
    pub basic: Vec<f64>,

    /// 各盒子 `max - min + 1` 之和.
    pub differential: Vec<f64>,

    /// 三角棱柱法估计的表面积.
    pub prism: Vec<f64>,
}

/// 三维空间中两点的距离.
#[inline]
fn distance(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2) + (a.2 - b.2).powi(2)).sqrt()
}

/// 海伦公式.
#[inline]
fn heron(a: f64, b: f64, c: f64) -> f64 {
    let p = (a + b + c) / 2.0;
    (p * (p - a) * (p - b) * (p - c)).max(0.0).sqrt()
}

/// 以 4 个角点及其平均高度的中心点构成 4 个三角形, 求表面积之和.
///
/// 角点依次为左上, 右上, 右下, 左下, `s` 为盒子的几何边长.
fn prism_area(h: [f64; 4], s: f64) -> f64 {
    let corners = [
        (0.0, 0.0, h[0]),
        (0.0, s, h[1]),
        (s, s, h[2]),
        (s, 0.0, h[3]),
    ];
    let centre = (s / 2.0, s / 2.0, h.iter().sum::<f64>() / 4.0);
    (0..4)
        .map(|k| {
            let (a, b) = (corners[k], corners[(k + 1) % 4]);
            heron(distance(a, b), distance(b, centre), distance(centre, a))
        })
        .sum()
}

impl BoxCounts {
    /// 对边长为 2 的幂的正方形图像做盒计数. `NaN` 像素视为空.
    ///
    /// 三角棱柱法的角点取在 `(r0, c0)` 与 `(r0 + s, c0 + s)` 上. 最后一行 (列)
    /// 的盒子远端角点越出图像, 此时按边缘复制取第 `side - 1` 行 (列) 的高度,
    /// 几何边长仍为 `s`. 因此 `s = 1` 时这些盒子的远端角点与近端角点重合.
    ///
    /// # 注意
    ///
    /// 图像必须是正方形且边长为 2 的幂, 否则程序 panic.
    pub fn measure(image: ArrayView2<f64>) -> Self {
        let (h, w) = image.dim();
        assert!(
            h == w && h.is_power_of_two(),
            "盒计数要求边长为 2 的幂的正方形图像, 实际为 {h}x{w}"
        );
        let side = h;
        let height = |r: usize, c: usize| {
            let v = image[(r, c)];
            if v.is_finite() {
                v
            } else {
                0.0
            }
        };

        let sizes: Vec<usize> = (1..=side.trailing_zeros())
            .map(|k| side >> k)
            .collect();
        let mut ans = Self {
            sizes: sizes.clone(),
            ..Self::default()
        };

        for s in sizes {
            let (mut basic, mut differential, mut prism) = (0usize, 0.0, 0.0);
            for r0 in (0..side).step_by(s) {
                for c0 in (0..side).step_by(s) {
                    let cell = image.slice(s![r0..r0 + s, c0..c0 + s]);
                    let mut finite = cell.iter().copied().filter(|v| v.is_finite());
                    if let Some(first) = finite.next() {
                        let (lo, hi, any) = finite.fold(
                            (first, first, first != 0.0),
                            |(lo, hi, any), v| (lo.min(v), hi.max(v), any || v != 0.0),
                        );
                        basic += usize::from(any);
                        differential += hi - lo + 1.0;
                    }

                    // 越界的远端角点按边缘复制.
                    let (r1, c1) = ((r0 + s).min(side - 1), (c0 + s).min(side - 1));
                    prism += prism_area(
                        [height(r0, c0), height(r0, c1), height(r1, c1), height(r1, c0)],
                        s as f64,
                    );
                }
            }
            ans.basic.push(basic as f64);
            ans.differential.push(differential);
            ans.prism.push(prism);
        }
        ans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_heron() {
        assert!(f64_eq(heron(3.0, 4.0, 5.0), 6.0));
        assert_eq!(heron(1.0, 1.0, 2.0), 0.0);
    }

    #[test]
    fn test_prism_area_flat() {
        assert!(f64_eq(prism_area([2.0; 4], 4.0), 16.0));
        // 一个角抬高后表面积增大.
        assert!(prism_area([2.0, 2.0, 5.0, 2.0], 4.0) > 16.0);
    }

    #[test]
    fn test_box_counts_flat() {
        let image = Array2::from_elem((8, 8), 3.0);
        let counts = BoxCounts::measure(image.view());
        assert_eq!(counts.sizes, vec![4, 2, 1]);
        assert_eq!(counts.basic, vec![4.0, 16.0, 64.0]);
        assert_eq!(counts.differential, vec![4.0, 16.0, 64.0]);
        for area in counts.prism {
            assert!(f64_eq(area, 64.0));
        }
    }

    #[test]
    fn test_box_counts_nan_is_empty() {
        let mut image = Array2::from_elem((4, 4), f64::NAN);
        image[(0, 0)] = 1.0;
        image[(0, 1)] = 4.0;
        let counts = BoxCounts::measure(image.view());
        assert_eq!(counts.basic, vec![1.0, 2.0]);
        // 尺寸 2: 唯一非空盒子 max - min + 1 = 4.
        assert_eq!(counts.differential, vec![4.0, 2.0]);
    }

    #[test]
    fn test_box_counts_prism_edge_replicated() {
        // 只有最后一列抬高. 尺寸 1 时左列两个盒子的远端角点落在最后一列,
        // 右列两个盒子的四个角点都复制为同一高度, 表面积退化为 1.
        let image = Array2::from_shape_fn((2, 2), |(_, c)| 5.0 * c as f64);
        let counts = BoxCounts::measure(image.view());
        assert_eq!(counts.sizes, vec![1]);
        let slope = prism_area([0.0, 5.0, 5.0, 0.0], 1.0);
        assert!(slope > 1.0);
        assert!(f64_eq(counts.prism[0], 2.0 * slope + 2.0));
    }

    #[test]
    #[should_panic]
    fn test_box_counts_not_square() {
        let image = Array2::<f64>::zeros((4, 8));
        BoxCounts::measure(image.view());
    }
}
