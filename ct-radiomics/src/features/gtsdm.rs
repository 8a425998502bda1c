//! 灰度空间相关矩阵 (gray-tone spatial dependence matrix, 即共生矩阵).
//!
//! 对 13 个规范方向分别统计相邻体素的灰度对, 构建后对称化.
//! 每个方向计算 20 个 Haralick 风格的二阶统计量, 最终取 13 个方向的算术平均.
//!
//! ROI 内没有任何体素对的方向保留为全零矩阵, 仍参与平均. 例如单层 ROI
//! 只有 4 个层内方向非空, 其余 9 个方向的 ASM 等为 0, 相关性为 `+inf`,
//! 因此平均后的相关性也是 `+inf`.

use ndarray::{Array2, Array3, ArrayView2, Axis};
use ordered_float::OrderedFloat;

use super::{entropy_term, level_f64, roi_levels, Category, FeatureDescriptor, FeatureFamily};
use crate::consts::{DIRECTIONS, DIRECTION_COUNT};
use crate::par::map_range;
use crate::{ConnectivityMap, DiscretizedGrid};

/// 单方向特征个数.
pub const GTSDM_FEATURES: usize = 20;

/// 13 个方向的共生矩阵, 形状为 `N x N x 13`. 第三维为方向, 顺序同 [`DIRECTIONS`].
#[derive(Debug, Clone)]
pub struct Gtsdm {
    data: Array3<f64>,
}

impl FeatureFamily for Gtsdm {
    const DESCRIPTORS: &'static [FeatureDescriptor] = &[
        FeatureDescriptor::new(Category::Gtsdm, "Angular Second Moment"),
        FeatureDescriptor::new(Category::Gtsdm, "Contrast"),
        FeatureDescriptor::new(Category::Gtsdm, "Correlation"),
        FeatureDescriptor::new(Category::Gtsdm, "Sum of Squares Variance"),
        FeatureDescriptor::new(Category::Gtsdm, "Inverse Difference Moment"),
        FeatureDescriptor::new(Category::Gtsdm, "Sum Average"),
        FeatureDescriptor::new(Category::Gtsdm, "Sum Variance"),
        FeatureDescriptor::new(Category::Gtsdm, "Sum Entropy"),
        FeatureDescriptor::new(Category::Gtsdm, "Entropy"),
        FeatureDescriptor::new(Category::Gtsdm, "Difference Variance"),
        FeatureDescriptor::new(Category::Gtsdm, "Difference Entropy"),
        FeatureDescriptor::new(Category::Gtsdm, "Information Measure of Correlation 1"),
        FeatureDescriptor::new(Category::Gtsdm, "Information Measure of Correlation 2"),
        FeatureDescriptor::new(Category::Gtsdm, "Maximal Correlation Coefficient"),
        FeatureDescriptor::new(Category::Gtsdm, "Autocorrelation"),
        FeatureDescriptor::new(Category::Gtsdm, "Dissimilarity"),
        FeatureDescriptor::new(Category::Gtsdm, "Cluster Shade"),
        FeatureDescriptor::new(Category::Gtsdm, "Cluster Prominence"),
        FeatureDescriptor::new(Category::Gtsdm, "Maximum Probability"),
        FeatureDescriptor::new(Category::Gtsdm, "Inverse Difference"),
    ];
}

impl Gtsdm {
    /// 统计 ROI 内沿 13 个方向相邻的灰度对, 并将每个方向的矩阵与其转置相加.
    ///
    /// 启用 `rayon` 时 13 个方向并行构建.
    pub fn build(grid: &DiscretizedGrid, conn: &ConnectivityMap) -> Self {
        let n = grid.levels();
        let levels = roi_levels(grid, conn);

        let per_direction = map_range(0..DIRECTION_COUNT, |d| {
            let off = DIRECTIONS[d];
            let mut m = Array2::<f64>::zeros((n, n));
            for (i, &a) in levels.iter().enumerate() {
                if let Some(j) = conn.neighbour(i, off) {
                    m[(a - 1, levels[j] - 1)] += 1.0;
                }
            }
            &m + &m.t()
        });

        let mut data = Array3::<f64>::zeros((n, n, DIRECTION_COUNT));
        for (d, m) in per_direction.into_iter().enumerate() {
            data.index_axis_mut(Axis(2), d).assign(&m);
        }
        Self { data }
    }

    /// 灰度级数 N.
    #[inline]
    pub fn levels(&self) -> usize {
        self.data.dim().0
    }

    /// 原始 `N x N x 13` 计数数组.
    #[inline]
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// 第 `d` 个方向的计数矩阵 (已对称化).
    #[inline]
    pub fn direction(&self, d: usize) -> ArrayView2<f64> {
        self.data.index_axis(Axis(2), d)
    }

    /// 每个方向的矩阵是否都对称?
    pub fn is_symmetric(&self) -> bool {
        (0..DIRECTION_COUNT).all(|d| {
            let m = self.direction(d);
            m == m.t()
        })
    }

    /// 第 `d` 个方向的 20 个特征.
    pub fn direction_features(&self, d: usize) -> [f64; GTSDM_FEATURES] {
        let counts = self.direction(d);
        let total = counts.sum();
        let p = if total > 0.0 {
            counts.mapv(|c| c / total)
        } else {
            counts.to_owned()
        };
        CoMatrixStats::new(p.view()).features()
    }

    /// 20 个特征在 13 个方向上的算术平均. 空方向同样计入分母.
    pub fn features(&self) -> [f64; GTSDM_FEATURES] {
        let per_direction = map_range(0..DIRECTION_COUNT, |d| self.direction_features(d));

        let mut ans = [0.0; GTSDM_FEATURES];
        for f in per_direction.iter() {
            for (acc, v) in ans.iter_mut().zip(f.iter()) {
                *acc += v;
            }
        }
        ans.iter_mut().for_each(|v| *v /= DIRECTION_COUNT as f64);
        ans
    }
}

/// 单个归一化共生矩阵 `p` 的边缘分布与派生量.
struct CoMatrixStats<'a> {
    p: ArrayView2<'a, f64>,

    /// 行边缘分布.
    px: Vec<f64>,

    /// 列边缘分布.
    py: Vec<f64>,

    /// `p_{x+y}(k)`, 下标 `k - 2`, `k = 2..=2N`.
    p_sum: Vec<f64>,

    /// `p_{x-y}(k)`, `k = 0..N`.
    p_diff: Vec<f64>,
}

impl<'a> CoMatrixStats<'a> {
    fn new(p: ArrayView2<'a, f64>) -> Self {
        let n = p.nrows();
        let mut p_sum = vec![0.0; (2 * n).saturating_sub(1)];
        let mut p_diff = vec![0.0; n];
        for ((i, j), &v) in p.indexed_iter() {
            p_sum[i + j] += v;
            p_diff[i.abs_diff(j)] += v;
        }

        let px = p.sum_axis(Axis(1)).to_vec();
        let py = p.sum_axis(Axis(0)).to_vec();
        Self {
            p,
            px,
            py,
            p_sum,
            p_diff,
        }
    }

    fn features(&self) -> [f64; GTSDM_FEATURES] {
        let n = self.p.nrows();
        let mean_of = |m: &[f64]| -> f64 {
            m.iter()
                .enumerate()
                .map(|(i, v)| level_f64(i) * v)
                .sum()
        };
        let (mu_x, mu_y) = (mean_of(&self.px), mean_of(&self.py));
        let sd_of = |m: &[f64], mu: f64| -> f64 {
            m.iter()
                .enumerate()
                .map(|(i, v)| (level_f64(i) - mu).powi(2) * v)
                .sum::<f64>()
                .sqrt()
        };
        let (sd_x, sd_y) = (sd_of(&self.px, mu_x), sd_of(&self.py, mu_y));

        let hx: f64 = self.px.iter().map(|v| entropy_term(*v)).sum();
        let hy: f64 = self.py.iter().map(|v| entropy_term(*v)).sum();

        let mut asm = 0.0;
        let mut contrast = 0.0;
        let mut autocorrelation = 0.0;
        let mut sum_of_squares = 0.0;
        let mut idm = 0.0;
        let mut entropy = 0.0;
        let mut dissimilarity = 0.0;
        let mut shade = 0.0;
        let mut prominence = 0.0;
        let mut inverse_difference = 0.0;
        let mut hxy1 = 0.0;
        let mut hxy2 = 0.0;

        for ((i, j), &v) in self.p.indexed_iter() {
            let (a, b) = (level_f64(i), level_f64(j));
            let d = a - b;
            let cluster = a + b - mu_x - mu_y;
            let pxy = self.px[i] * self.py[j];

            asm += v * v;
            contrast += d * d * v;
            autocorrelation += a * b * v;
            sum_of_squares += (a - mu_x).powi(2) * v;
            idm += v / (1.0 + d * d);
            entropy += entropy_term(v);
            dissimilarity += d.abs() * v;
            shade += cluster.powi(3) * v;
            prominence += cluster.powi(4) * v;
            inverse_difference += v / (1.0 + d.abs() / n as f64);
            hxy1 -= v * (pxy + crate::consts::LOG_EPS).ln();
            hxy2 += entropy_term(pxy);
        }

        let sd_prod = sd_x * sd_y;
        let correlation = if sd_prod > 0.0 {
            (autocorrelation - mu_x * mu_y) / sd_prod
        } else {
            f64::INFINITY
        };

        // p_sum 的下标 k 对应 i + j = k + 2.
        let sum_average: f64 = self
            .p_sum
            .iter()
            .enumerate()
            .map(|(k, v)| (k + 2) as f64 * v)
            .sum();
        let sum_variance: f64 = self
            .p_sum
            .iter()
            .enumerate()
            .map(|(k, v)| ((k + 2) as f64 - sum_average).powi(2) * v)
            .sum();
        let sum_entropy: f64 = self.p_sum.iter().map(|v| entropy_term(*v)).sum();

        let diff_mean: f64 = self.p_diff.iter().enumerate().map(|(k, v)| k as f64 * v).sum();
        let diff_variance: f64 = self
            .p_diff
            .iter()
            .enumerate()
            .map(|(k, v)| (k as f64 - diff_mean).powi(2) * v)
            .sum();
        let diff_entropy: f64 = self.p_diff.iter().map(|v| entropy_term(*v)).sum();

        // 单一灰度时两个边缘熵都只剩 eps 级别的残差.
        let h_max = hx.max(hy);
        let imc1 = if h_max.abs() > 1e-12 {
            (entropy - hxy1) / h_max
        } else {
            0.0
        };
        let imc2 = (1.0 - (-2.0 * (hxy2 - entropy)).exp()).max(0.0).sqrt();

        let max_probability = self
            .p
            .iter()
            .copied()
            .map(OrderedFloat)
            .max()
            .map_or(0.0, |v| v.0);

        [
            asm,
            contrast,
            correlation,
            sum_of_squares,
            idm,
            sum_average,
            sum_variance,
            sum_entropy,
            entropy,
            diff_variance,
            diff_entropy,
            imc1,
            imc2,
            // 最大相关系数需要特征值分解, 此处不计算.
            0.0,
            autocorrelation,
            dissimilarity,
            shade,
            prominence,
            max_probability,
            inverse_difference,
        ]
    }
}
