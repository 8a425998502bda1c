//! 邻域灰度差矩阵 (neighborhood gray-tone difference matrix).
//!
//! 只统计 26-邻域完整位于 ROI 内的体素. 边缘体素不参与计算, 这不是错误.
//!
//! 参考: Amadasun & King (1989), 并按 Materka & Strzelecki (1998)
//! 对复杂度中的灰度差取绝对值.

use super::{level_f64, roi_levels, Category, FeatureDescriptor, FeatureFamily};
use crate::{ConnectivityMap, DiscretizedGrid};

/// NGTDM 累加器及其出现次数.
#[derive(Debug, Clone, PartialEq)]
pub struct Ngtdm {
    /// `s[g - 1] = Σ |g - 邻域均值|`.
    accumulator: Vec<f64>,

    /// 拥有完整邻域、灰度为 `g` 的体素个数.
    occurrences: Vec<usize>,
}

impl FeatureFamily for Ngtdm {
    const DESCRIPTORS: &'static [FeatureDescriptor] = &[
        FeatureDescriptor::new(Category::Ngtdm, "Coarseness"),
        FeatureDescriptor::new(Category::Ngtdm, "Contrast"),
        FeatureDescriptor::new(Category::Ngtdm, "Busyness"),
        FeatureDescriptor::new(Category::Ngtdm, "Complexity"),
        FeatureDescriptor::new(Category::Ngtdm, "Texture Strength"),
    ];
}

impl Ngtdm {
    /// 对每个拥有完整 26-邻域的 ROI 体素, 累加其灰度与邻域平均灰度之差的绝对值.
    pub fn build(grid: &DiscretizedGrid, conn: &ConnectivityMap) -> Self {
        let n = grid.levels();
        let levels = roi_levels(grid, conn);
        let mut accumulator = vec![0.0; n];
        let mut occurrences = vec![0usize; n];

        for (i, &g) in levels.iter().enumerate().filter(|(i, _)| conn.is_complete(*i)) {
            let sum: usize = conn.neighbours26(i).map(|j| levels[j]).sum();
            let mean = sum as f64 / 26.0;
            accumulator[g - 1] += (g as f64 - mean).abs();
            occurrences[g - 1] += 1;
        }
        log::debug!(
            "NGTDM: {} 个体素拥有完整邻域",
            occurrences.iter().sum::<usize>()
        );

        Self {
            accumulator,
            occurrences,
        }
    }

    /// 长度为 N 的差值累加器.
    #[inline]
    pub fn accumulator(&self) -> &[f64] {
        &self.accumulator
    }

    /// 长度为 N 的出现次数.
    #[inline]
    pub fn occurrences(&self) -> &[usize] {
        &self.occurrences
    }

    /// 参与统计的体素总数.
    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.occurrences.iter().sum()
    }

    /// 各灰度级的出现概率. 没有体素参与统计时全为 0.
    pub fn probabilities(&self) -> Vec<f64> {
        let total = self.voxel_count();
        if total == 0 {
            return vec![0.0; self.occurrences.len()];
        }
        self.occurrences
            .iter()
            .map(|c| *c as f64 / total as f64)
            .collect()
    }

    /// 5 个特征: 粗糙度, 对比度, 繁忙度, 复杂度, 纹理强度.
    ///
    /// # 哨兵值
    ///
    /// 1. 分母为 0 时, 粗糙度, 繁忙度, 复杂度, 纹理强度均为 `+inf`.
    /// 2. 出现的灰度级少于 2 个时, 对比度为 `-1`.
    pub fn features(&self) -> [f64; 5] {
        let p = self.probabilities();
        let s = &self.accumulator;
        let nv = self.voxel_count() as f64;

        // (下标, 概率) 只保留出现过的灰度级.
        let occupied: Vec<(usize, f64)> = p
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| *v > 0.0)
            .collect();
        let occupied = &occupied;
        let pairs = move || {
            occupied
                .iter()
                .flat_map(move |&a| occupied.iter().map(move |&b| (a, b)))
        };

        let weighted: f64 = p.iter().zip(s.iter()).map(|(p, s)| p * s).sum();
        let s_total: f64 = s.iter().sum();

        let coarseness = if weighted > 0.0 {
            1.0 / weighted
        } else {
            f64::INFINITY
        };

        let ng = occupied.len();
        let contrast = if ng < 2 || nv == 0.0 {
            -1.0
        } else {
            let dispersion: f64 = pairs()
                .map(|((i, pi), (j, pj))| pi * pj * (level_f64(i) - level_f64(j)).powi(2))
                .sum();
            dispersion / (ng * (ng - 1)) as f64 * (s_total / nv)
        };

        let busyness_den: f64 = pairs()
            .map(|((i, pi), (j, pj))| (level_f64(i) * pi - level_f64(j) * pj).abs())
            .sum();
        let busyness = if busyness_den > 0.0 {
            weighted / busyness_den
        } else {
            f64::INFINITY
        };

        let complexity = if nv > 0.0 {
            pairs()
                .map(|((i, pi), (j, pj))| {
                    (level_f64(i) - level_f64(j)).abs() / (nv * (pi + pj)) * (pi * s[i] + pj * s[j])
                })
                .sum()
        } else {
            f64::INFINITY
        };

        let strength = if s_total > 0.0 {
            pairs()
                .map(|((i, pi), (j, pj))| (pi + pj) * (level_f64(i) - level_f64(j)).powi(2))
                .sum::<f64>()
                / s_total
        } else {
            f64::INFINITY
        };

        [coarseness, contrast, busyness, complexity, strength]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DegeneratePolicy;
    use ndarray::Array3;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn build(volume: &Array3<f64>, mask: &Array3<bool>, levels: u16) -> Ngtdm {
        let conn = ConnectivityMap::analyze(mask.view()).unwrap();
        let bbox = *conn.bounding_box();
        let grid = DiscretizedGrid::new(
            bbox.crop(volume.view()),
            bbox.crop(mask.view()),
            levels,
            DegeneratePolicy::Collapse,
        )
        .unwrap();
        Ngtdm::build(&grid, &conn)
    }

    #[test]
    fn test_ngtdm_constant_cube() {
        let volume = Array3::from_elem((3, 3, 3), 5.0);
        let mask = Array3::from_elem((3, 3, 3), true);
        let m = build(&volume, &mask, 4);

        // 只有中心体素拥有完整邻域.
        assert_eq!(m.occurrences(), &[1, 0, 0, 0]);
        assert_eq!(m.accumulator(), &[0.0; 4]);

        let [coarseness, contrast, busyness, complexity, strength] = m.features();
        assert_eq!(coarseness, f64::INFINITY);
        assert_eq!(contrast, -1.0);
        assert_eq!(busyness, f64::INFINITY);
        assert_eq!(complexity, 0.0);
        assert_eq!(strength, f64::INFINITY);
    }

    #[test]
    fn test_ngtdm_no_complete_neighbourhood() {
        // 2x2x2 的 ROI 不存在完整邻域.
        let volume = Array3::from_shape_fn((2, 2, 2), |(r, c, s)| (r + c + s) as f64);
        let mask = Array3::from_elem((2, 2, 2), true);
        let m = build(&volume, &mask, 4);
        assert_eq!(m.voxel_count(), 0);

        let f = m.features();
        assert_eq!(f[0], f64::INFINITY);
        assert_eq!(f[1], -1.0);
        assert_eq!(f[2], f64::INFINITY);
        assert_eq!(f[3], f64::INFINITY);
        assert_eq!(f[4], f64::INFINITY);
    }

    /// 4x3x3 的 ROI, 前两层为第 1 级, 后两层为第 2 级.
    /// 只有 (1, 1, 1) 与 (2, 1, 1) 拥有完整邻域, 二者的差值都是 9 / 26.
    #[test]
    fn test_ngtdm_two_layers() {
        let volume = Array3::from_shape_fn((4, 3, 3), |(r, _, _)| if r < 2 { 0.0 } else { 1.0 });
        let mask = Array3::from_elem((4, 3, 3), true);
        let m = build(&volume, &mask, 2);

        assert_eq!(m.occurrences(), &[1, 1]);
        assert!(f64_eq(m.accumulator()[0], 9.0 / 26.0));
        assert!(f64_eq(m.accumulator()[1], 9.0 / 26.0));

        let [coarseness, contrast, busyness, complexity, strength] = m.features();
        assert!(f64_eq(coarseness, 26.0 / 9.0));
        assert!(f64_eq(contrast, 9.0 / 104.0));
        assert!(f64_eq(busyness, 9.0 / 26.0));
        assert!(f64_eq(complexity, 9.0 / 26.0));
        assert!(f64_eq(strength, 26.0 / 9.0));
    }

    #[test]
    fn test_ngtdm_excludes_roi_holes() {
        // 中心体素周围有一个体素不在 ROI 中, 因此不再拥有完整邻域.
        let volume = Array3::from_elem((3, 3, 3), 1.0);
        let mut mask = Array3::from_elem((3, 3, 3), true);
        mask[(0, 1, 1)] = false;
        let m = build(&volume, &mask, 4);
        assert_eq!(m.voxel_count(), 0);
    }
}
