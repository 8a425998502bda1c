//! 一阶直方图统计.

use super::{level_f64, Category, FeatureDescriptor, FeatureFamily};

/// 灰度概率分布的 6 个一阶统计量.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HistogramStats {
    /// 均值.
    pub mean: f64,

    /// 方差.
    pub variance: f64,

    /// 偏度. 方差为 0 时为 0.
    pub skewness: f64,

    /// 超额峰度. 方差为 0 时为 0.
    pub kurtosis: f64,

    /// 能量 `Σ p^2`.
    pub energy: f64,

    /// 熵 `-Σ p ln p`, 只对 `p > 0` 求和.
    pub entropy: f64,
}

impl FeatureFamily for HistogramStats {
    const DESCRIPTORS: &'static [FeatureDescriptor] = &[
        FeatureDescriptor::new(Category::Histogram, "Mean"),
        FeatureDescriptor::new(Category::Histogram, "Variance"),
        FeatureDescriptor::new(Category::Histogram, "Skewness"),
        FeatureDescriptor::new(Category::Histogram, "Kurtosis"),
        FeatureDescriptor::new(Category::Histogram, "Energy"),
        FeatureDescriptor::new(Category::Histogram, "Entropy"),
    ];
}

impl HistogramStats {
    /// 由概率分布 `p` 计算统计量. `p[i]` 为第 `i + 1` 级灰度的概率.
    pub fn from_probabilities(p: &[f64]) -> Self {
        let mean: f64 = p.iter().enumerate().map(|(i, p)| level_f64(i) * p).sum();
        let moment = |k: i32| -> f64 {
            p.iter()
                .enumerate()
                .map(|(i, p)| (level_f64(i) - mean).powi(k) * p)
                .sum()
        };

        let variance = moment(2);
        let (skewness, kurtosis) = if variance > 0.0 {
            (
                moment(3) / variance.powf(1.5),
                moment(4) / variance.powi(2) - 3.0,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            mean,
            variance,
            skewness,
            kurtosis,
            energy: p.iter().map(|p| p * p).sum(),
            entropy: -p.iter().filter(|p| **p > 0.0).map(|p| p * p.ln()).sum::<f64>(),
        }
    }

    /// 按描述符顺序输出.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.mean,
            self.variance,
            self.skewness,
            self.kurtosis,
            self.energy,
            self.entropy,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_histogram_constant() {
        let mut p = vec![0.0; 8];
        p[4] = 1.0;
        let s = HistogramStats::from_probabilities(&p);
        assert!(f64_eq(s.mean, 5.0));
        assert_eq!(s.variance, 0.0);
        assert_eq!(s.skewness, 0.0);
        assert_eq!(s.kurtosis, 0.0);
        assert_eq!(s.energy, 1.0);
        assert_eq!(s.entropy, 0.0);
    }

    #[test]
    fn test_histogram_uniform() {
        let p = vec![0.125; 8];
        let s = HistogramStats::from_probabilities(&p);
        assert!(f64_eq(s.mean, 4.5));
        // 离散均匀分布方差 (n^2 - 1) / 12.
        assert!(f64_eq(s.variance, 63.0 / 12.0));
        assert!(f64_eq(s.skewness, 0.0));
        // 离散均匀分布超额峰度 -6 (n^2 + 1) / (5 (n^2 - 1)).
        assert!(f64_eq(s.kurtosis, -6.0 * 65.0 / (5.0 * 63.0)));
        assert!(f64_eq(s.energy, 0.125));
        assert!(f64_eq(s.entropy, 8f64.ln()));
    }

    #[test]
    fn test_histogram_two_levels() {
        // 取值 1 (p = 0.25) 与 3 (p = 0.75).
        let s = HistogramStats::from_probabilities(&[0.25, 0.0, 0.75]);
        assert!(f64_eq(s.mean, 2.5));
        assert!(f64_eq(s.variance, 0.75));
        let third = 0.25 * (-1.5f64).powi(3) + 0.75 * 0.5f64.powi(3);
        assert!(f64_eq(s.skewness, third / 0.75f64.powf(1.5)));
        assert!(s.skewness < 0.0);
        assert!(f64_eq(s.energy, 0.625));
        assert_eq!(s.to_array()[1], s.variance);
    }
}
