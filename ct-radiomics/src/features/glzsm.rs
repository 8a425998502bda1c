//! 灰度区域大小矩阵 (gray-level zone-size matrix).
//!
//! 区域 (zone) 指 ROI 内灰度相同且 26-连通的极大体素集合.
//! `G[g, z]` 为灰度 `g` 下大小恰为 `z` 的区域个数.

use std::collections::{HashSet, VecDeque};

use ndarray::{Array2, ArrayView2, Axis};

use super::{level_f64, roi_levels, Category, FeatureDescriptor, FeatureFamily};
use crate::par::map_range;
use crate::{ConnectivityMap, DiscretizedGrid};

/// GLZSM 特征个数.
pub const GLZSM_FEATURES: usize = 11;

/// 灰度区域大小矩阵, 形状为 `N x Zmax`, 末尾全零的区域大小列已截去.
#[derive(Debug, Clone, PartialEq)]
pub struct Glzsm {
    data: Array2<usize>,
    roi_voxels: usize,
}

impl FeatureFamily for Glzsm {
    const DESCRIPTORS: &'static [FeatureDescriptor] = &[
        FeatureDescriptor::new(Category::Glzsm, "Small Zone Emphasis"),
        FeatureDescriptor::new(Category::Glzsm, "Large Zone Emphasis"),
        FeatureDescriptor::new(Category::Glzsm, "Low Gray-Level Zone Emphasis"),
        FeatureDescriptor::new(Category::Glzsm, "High Gray-Level Zone Emphasis"),
        FeatureDescriptor::new(Category::Glzsm, "Small Zone Low Gray-Level Emphasis"),
        FeatureDescriptor::new(Category::Glzsm, "Small Zone High Gray-Level Emphasis"),
        FeatureDescriptor::new(Category::Glzsm, "Large Zone Low Gray-Level Emphasis"),
        FeatureDescriptor::new(Category::Glzsm, "Large Zone High Gray-Level Emphasis"),
        FeatureDescriptor::new(Category::Glzsm, "Gray-Level Non-Uniformity"),
        FeatureDescriptor::new(Category::Glzsm, "Zone-Size Non-Uniformity"),
        FeatureDescriptor::new(Category::Glzsm, "Zone-Size Percentage"),
    ];
}

/// 在编号属于 `members` 的体素上做 26-连通广度优先搜索, 返回每个区域的大小.
fn zone_sizes(
    conn: &ConnectivityMap,
    levels: &[usize],
    g: usize,
    members: &[usize],
) -> Vec<usize> {
    let mut sizes = Vec::with_capacity(1);
    let mut bfs_q = VecDeque::with_capacity(26);
    let mut set = HashSet::with_capacity(members.len());

    for &seed in members {
        if set.contains(&seed) {
            continue;
        }
        bfs_q.push_back(seed);
        let mut size = 0;
        while let Some(cur) = bfs_q.pop_front() {
            if !set.insert(cur) {
                continue;
            }
            size += 1;
            bfs_q.extend(
                conn.neighbours26(cur)
                    .filter(|&j| levels[j] == g && !set.contains(&j)),
            );
        }
        sizes.push(size);
    }
    sizes
}

impl Glzsm {
    /// 对每个灰度级独立地做连通区域标记, 统计区域大小.
    pub fn build(grid: &DiscretizedGrid, conn: &ConnectivityMap) -> Self {
        let n = grid.levels();
        let levels = roi_levels(grid, conn);

        // 按灰度级分桶.
        let mut buckets = vec![Vec::new(); n];
        for (i, &g) in levels.iter().enumerate() {
            buckets[g - 1].push(i);
        }

        let sizes = map_range(0..n, |k| zone_sizes(conn, &levels, k + 1, &buckets[k]));
        let z_max = sizes.iter().flatten().copied().max().unwrap_or(0);

        let mut data = Array2::zeros((n, z_max));
        for (k, zones) in sizes.iter().enumerate() {
            for &z in zones {
                data[(k, z - 1)] += 1;
            }
        }
        log::debug!("GLZSM: {} 个区域, 最大区域 {} 个体素", data.sum(), z_max);

        Self {
            data,
            roi_voxels: levels.len(),
        }
    }

    /// 灰度级个数 N.
    #[inline]
    pub fn levels(&self) -> usize {
        self.data.nrows()
    }

    /// 最大区域大小 (截断后的列数).
    #[inline]
    pub fn max_zone_size(&self) -> usize {
        self.data.ncols()
    }

    /// 矩阵视图, `(g - 1, z - 1)` 处为 `G[g, z]`.
    #[inline]
    pub fn data(&self) -> ArrayView2<usize> {
        self.data.view()
    }

    /// `G[g, z]`, `g` 与 `z` 均从 1 开始. 越界时为 0.
    pub fn get(&self, g: usize, z: usize) -> usize {
        if g == 0 || z == 0 {
            return 0;
        }
        self.data.get((g - 1, z - 1)).copied().unwrap_or(0)
    }

    /// 区域总数.
    #[inline]
    pub fn zone_count(&self) -> usize {
        self.data.sum()
    }

    /// `Σ z * G[g, z]`, 必然等于 ROI 体素个数.
    pub fn voxel_count(&self) -> usize {
        self.data
            .indexed_iter()
            .map(|((_, z), &c)| (z + 1) * c)
            .sum()
    }

    /// 11 个特征. 除区域大小百分比外都除以区域总数.
    pub fn features(&self) -> [f64; GLZSM_FEATURES] {
        let nz = self.zone_count() as f64;
        if nz == 0.0 {
            return [0.0; GLZSM_FEATURES];
        }

        let mut acc = [0.0; 8];
        for ((gi, zi), &c) in self.data.indexed_iter().filter(|(_, c)| **c > 0) {
            let c = c as f64;
            let g2 = level_f64(gi).powi(2);
            let z2 = level_f64(zi).powi(2);
            acc[0] += c / z2;
            acc[1] += c * z2;
            acc[2] += c / g2;
            acc[3] += c * g2;
            acc[4] += c / (z2 * g2);
            acc[5] += c * g2 / z2;
            acc[6] += c * z2 / g2;
            acc[7] += c * z2 * g2;
        }

        let non_uniformity = |axis: Axis| -> f64 {
            self.data
                .sum_axis(axis)
                .iter()
                .map(|&s| (s as f64).powi(2))
                .sum::<f64>()
                / nz
        };
        let zone_percentage = if self.roi_voxels > 0 {
            self.voxel_count() as f64 / self.roi_voxels as f64
        } else {
            0.0
        };

        [
            acc[0] / nz,
            acc[1] / nz,
            acc[2] / nz,
            acc[3] / nz,
            acc[4] / nz,
            acc[5] / nz,
            acc[6] / nz,
            acc[7] / nz,
            non_uniformity(Axis(1)),
            non_uniformity(Axis(0)),
            zone_percentage,
        ]
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

    fn build(volume: &Array3<f64>, mask: &Array3<bool>, levels: u16) -> Glzsm {
        let conn = ConnectivityMap::analyze(mask.view()).unwrap();
        let bbox = *conn.bounding_box();
        let grid = DiscretizedGrid::new(
            bbox.crop(volume.view()),
            bbox.crop(mask.view()),
            levels,
            DegeneratePolicy::Collapse,
        )
        .unwrap();
        Glzsm::build(&grid, &conn)
    }

    #[test]
    fn test_glzsm_single_zone() {
        let volume = Array3::from_elem((3, 3, 3), 7.0);
        let mask = Array3::from_elem((3, 3, 3), true);
        let m = build(&volume, &mask, 4);

        assert_eq!(m.levels(), 4);
        assert_eq!(m.max_zone_size(), 27);
        assert_eq!(m.zone_count(), 1);
        assert_eq!(m.get(1, 27), 1);

        let f = m.features();
        assert!(f64_eq(f[0], 1.0 / 729.0));
        assert!(f64_eq(f[1], 729.0));
        assert!(f64_eq(f[2], 1.0));
        assert!(f64_eq(f[8], 1.0));
        assert!(f64_eq(f[9], 1.0));
        assert!(f64_eq(f[10], 1.0));
    }

    #[test]
    fn test_glzsm_checkerboard() {
        // 同奇偶的体素经由面对角线 26-连通, 每个灰度级恰好一个区域.
        let volume =
            Array3::from_shape_fn((3, 3, 3), |(r, c, s)| ((r + c + s) % 2) as f64);
        let mask = Array3::from_elem((3, 3, 3), true);
        let m = build(&volume, &mask, 2);

        assert_eq!(m.max_zone_size(), 14);
        assert_eq!(m.get(1, 14), 1);
        assert_eq!(m.get(2, 13), 1);
        assert_eq!(m.zone_count(), 2);

        let f = m.features();
        // 低灰度强调: (1 + 1/4) / 2.
        assert!(f64_eq(f[2], 0.625));
        // 高灰度强调: (1 + 4) / 2.
        assert!(f64_eq(f[3], 2.5));
        // 区域大小不均匀性: (1 + 1) / 2.
        assert!(f64_eq(f[9], 1.0));
    }

    #[test]
    fn test_glzsm_layers() {
        // 第 0 层和第 2 层同为第 1 级, 但被第 1 层隔开.
        let volume =
            Array3::from_shape_fn((3, 3, 3), |(r, _, _)| if r == 1 { 1.0 } else { 0.0 });
        let mask = Array3::from_elem((3, 3, 3), true);
        let m = build(&volume, &mask, 2);

        assert_eq!(m.data().dim(), (2, 9));
        assert_eq!(m.get(1, 9), 2);
        assert_eq!(m.get(2, 9), 1);
        assert_eq!(m.get(3, 9), 0);
        assert_eq!(m.get(1, 100), 0);

        // G[1, 9] = 2, G[2, 9] = 1, 共 3 个区域.
        let f = m.features();
        assert!(f64_eq(f[4], (2.0 / 81.0 + 1.0 / 324.0) / 3.0));
        assert!(f64_eq(f[5], (2.0 / 81.0 + 4.0 / 81.0) / 3.0));
        assert!(f64_eq(f[6], (2.0 * 81.0 + 81.0 / 4.0) / 3.0));
        assert!(f64_eq(f[7], 162.0));
        // 灰度不均匀性: (2^2 + 1^2) / 3.
        assert!(f64_eq(f[8], 5.0 / 3.0));
        // 区域大小不均匀性: 3^2 / 3.
        assert!(f64_eq(f[9], 3.0));
    }

    #[test]
    fn test_glzsm_voxel_conservation() {
        let volume =
            Array3::from_shape_fn((5, 4, 3), |(r, c, s)| ((r * 7 + c * 3 + s * 5) % 6) as f64);
        let mask = Array3::from_shape_fn((5, 4, 3), |(r, c, s)| (r + c + s) % 4 != 0);
        let m = build(&volume, &mask, 6);

        let roi = mask.iter().filter(|v| **v).count();
        assert_eq!(m.voxel_count(), roi);
        assert!(f64_eq(m.features()[10], 1.0));
    }
}
