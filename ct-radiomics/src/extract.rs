//! 特征提取流水线与特征向量.
//!
//! 流程: 连通性分析与裁剪 → 离散化 → 直方图, GTSDM, NGTDM, GLZSM
//! → 分形维数 (独立的二维裁剪) → 按固定顺序拼接为 45 维向量.

use ndarray::ArrayView3;

use crate::features::{
    feature_names, fractal, FractalDimensions, Glzsm, Gtsdm, HistogramStats, Ngtdm, UnitFormat,
    FEATURE_COUNT, FEATURE_UNIT_FORMAT,
};
use crate::par::map_range;
use crate::{
    ConnectivityMap, DiscretizedGrid, ExtractParams, RadiomicsError, RadiomicsResult,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 45 维特征向量, 与其名称一一对应.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureVector {
    values: Vec<f64>,
    names: Vec<String>,
    unit_format: UnitFormat,
}

impl FeatureVector {
    fn new(values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), FEATURE_COUNT);
        Self {
            values,
            names: feature_names().to_vec(),
            unit_format: FEATURE_UNIT_FORMAT,
        }
    }

    /// 特征值.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `"(k) Category - Metric"` 形式的特征名.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 特征个数, 恒为 45.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空. 正常提取出的向量永远不为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 按顺序迭代 `(名称, 值)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// 按名称查找特征值. 既可以用完整名称 `"(1) Histogram - Mean"`,
    /// 也可以省略序号写作 `"Histogram - Mean"`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.iter()
            .find(|(full, _)| {
                *full == name
                    || full
                        .split_once(") ")
                        .map_or(false, |(_, label)| label == name)
            })
            .map(|(_, v)| v)
    }

    /// 单位格式, 取自 [`FEATURE_UNIT_FORMAT`], 即 `"{unit}^2"`.
    #[inline]
    pub fn unit_format(&self) -> UnitFormat {
        self.unit_format
    }

    /// 用物理单位填充单位模板, 如 `"mm"` → `"mm^2"`.
    #[inline]
    pub fn unit(&self, physical: &str) -> String {
        self.unit_format.render(physical)
    }
}

/// 以 `levels` 个灰度级提取特征, 其余参数取默认值.
///
/// # 错误
///
/// 1. `levels` 为 0 或超过 [`levels::MAX`](crate::consts::levels::MAX) 时返回 [`RadiomicsError::InvalidGrayLevels`];
/// 2. 其余同 [`extract_with`].
pub fn extract<T>(
    volume: ArrayView3<T>,
    mask: ArrayView3<bool>,
    levels: usize,
) -> RadiomicsResult<FeatureVector>
where
    T: Copy + Into<f64>,
{
    extract_with(volume, mask, &ExtractParams::new(levels)?)
}

/// 以给定参数提取 45 维特征向量.
///
/// 数值退化 (如分母为 0) 不是错误, 以 `+inf`, `-1` 或 `NaN` 写入对应特征.
///
/// # 错误
///
/// 1. 扫描与掩码形状不一致: [`RadiomicsError::ShapeMismatch`];
/// 2. 掩码为空: [`RadiomicsError::EmptyRoi`];
/// 3. 严格模式下 ROI 灰度恒定: [`RadiomicsError::DegenerateIntensityRange`];
/// 4. 分形切片越界或过大: [`RadiomicsError::SliceOutOfRange`],
///   [`RadiomicsError::FractalSliceTooLarge`].
pub fn extract_with<T>(
    volume: ArrayView3<T>,
    mask: ArrayView3<bool>,
    params: &ExtractParams,
) -> RadiomicsResult<FeatureVector>
where
    T: Copy + Into<f64>,
{
    if volume.dim() != mask.dim() {
        return Err(RadiomicsError::ShapeMismatch {
            volume: volume.dim(),
            mask: mask.dim(),
        });
    }

    let conn = ConnectivityMap::analyze(mask.view())?;
    let bbox = *conn.bounding_box();
    let grid = DiscretizedGrid::new(
        bbox.crop(volume.view()),
        bbox.crop(mask.view()),
        params.levels(),
        params.degenerate(),
    )?;
    log::debug!(
        "离散化完成: N = {}, 灰度范围 {:?}",
        grid.levels(),
        grid.intensity_range()
    );

    let histogram = HistogramStats::from_probabilities(&grid.probabilities());
    let gtsdm = Gtsdm::build(&grid, &conn).features();
    let ngtdm = Ngtdm::build(&grid, &conn).features();
    let glzsm = Glzsm::build(&grid, &conn).features();

    let image = fractal::prepare_slice(volume, mask, params.fractal_slice())?;
    let fractal = FractalDimensions::estimate(image.view())?;

    let values: Vec<f64> = histogram
        .to_array()
        .into_iter()
        .chain(gtsdm)
        .chain(ngtdm)
        .chain(glzsm)
        .chain(fractal.to_array())
        .collect();
    log::debug!("特征提取完成: {} 个 ROI 体素", conn.len());
    Ok(FeatureVector::new(values))
}

/// 对一批互相独立的 `(扫描, 掩码)` 提取特征, 结果与输入一一对应.
///
/// 启用 `rayon` feature 时并行计算, 结果与顺序计算一致.
pub fn extract_batch<T>(
    items: &[(ArrayView3<T>, ArrayView3<bool>)],
    params: &ExtractParams,
) -> Vec<RadiomicsResult<FeatureVector>>
where
    T: Copy + Into<f64> + Sync,
{
    map_range(0..items.len(), |i| {
        let (volume, mask) = &items[i];
        extract_with(volume.view(), mask.view(), params)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{DegeneratePolicy, FractalSlice};
    use ndarray::Array3;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn init_logger() {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Debug)
            .init();
    }

    /// 半径 4 的球, 灰度沿第一维线性增长.
    fn sphere() -> (Array3<f64>, Array3<bool>) {
        let shape = (11, 11, 11);
        let volume = Array3::from_shape_fn(shape, |(r, c, s)| (r * 10 + (c + s) % 3) as f64);
        let mask = Array3::from_shape_fn(shape, |(r, c, s)| {
            let d = |x: usize| (x as f64 - 5.0).powi(2);
            d(r) + d(c) + d(s) <= 16.0
        });
        (volume, mask)
    }

    #[test]
    fn test_extract_cube_1_to_8() {
        init_logger();
        let volume =
            Array3::from_shape_fn((2, 2, 2), |(r, c, s)| (r * 4 + c * 2 + s + 1) as u8);
        let mask = Array3::from_elem((2, 2, 2), true);
        let fv = extract(volume.view(), mask.view(), 8).unwrap();

        assert_eq!(fv.len(), FEATURE_COUNT);
        assert_eq!(fv.names(), feature_names());
        assert!(f64_eq(fv.values()[0], 4.5));
        assert_eq!(fv.get("Histogram - Mean"), Some(fv.values()[0]));
        assert_eq!(fv.get("(5) Histogram - Energy"), Some(0.125));
        assert_eq!(fv.get("Histogram - Nothing"), None);

        // 每个体素自成一区.
        assert!(f64_eq(fv.get("GLZSM - Small Zone Emphasis").unwrap(), 1.0));
        assert!(f64_eq(fv.get("GLZSM - Zone-Size Percentage").unwrap(), 1.0));

        // 没有体素拥有完整 26-邻域.
        assert_eq!(fv.get("NGTDM - Coarseness"), Some(f64::INFINITY));
        assert_eq!(fv.get("NGTDM - Contrast"), Some(-1.0));

        // 2x2 的分形切片只有一个尺度, 回归退化.
        assert!(fv.get("Fractal - Box Counting Dimension").unwrap().is_nan());
    }

    #[test]
    fn test_extract_sphere() {
        let (volume, mask) = sphere();
        let fv = extract_with(volume.view(), mask.view(), &ExtractParams::batch()).unwrap();
        assert_eq!(fv.len(), FEATURE_COUNT);

        // 直方图, GTSDM (相关性除外), GLZSM 与分形维数都应为有限值.
        for (name, v) in fv.iter() {
            if name.contains("Correlation") || name.contains("NGTDM") {
                continue;
            }
            assert!(v.is_finite(), "{name} = {v}");
        }
        assert!(f64_eq(fv.get("GLZSM - Zone-Size Percentage").unwrap(), 1.0));
        assert!(fv.get("GTSDM - Angular Second Moment").unwrap() > 0.0);
        assert!(fv.get("NGTDM - Coarseness").unwrap() > 0.0);

        let d = fv.get("Fractal - Box Counting Dimension").unwrap();
        assert!(d > 0.0 && d <= 2.0 + 1e-9);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let (volume, mask) = sphere();
        let params = ExtractParams::new(16).unwrap();
        let a = extract_with(volume.view(), mask.view(), &params).unwrap();
        let b = extract_with(volume.view(), mask.view(), &params).unwrap();
        // NaN 不等于自身, 按位比较.
        let bits = |fv: &FeatureVector| -> Vec<u64> {
            fv.values().iter().map(|v| v.to_bits()).collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_extract_errors() {
        let volume = Array3::<f32>::zeros((3, 3, 3));
        let mask = Array3::from_elem((3, 3, 2), true);
        assert_eq!(
            extract(volume.view(), mask.view(), 8),
            Err(RadiomicsError::ShapeMismatch {
                volume: (3, 3, 3),
                mask: (3, 3, 2)
            })
        );

        let mask = Array3::from_elem((3, 3, 3), false);
        assert_eq!(
            extract(volume.view(), mask.view(), 8),
            Err(RadiomicsError::EmptyRoi)
        );

        let mask = Array3::from_elem((3, 3, 3), true);
        assert_eq!(
            extract(volume.view(), mask.view(), 0),
            Err(RadiomicsError::InvalidGrayLevels(0))
        );
        // 超过上界的灰度级数在分配共生矩阵之前就被拒绝.
        assert_eq!(
            extract(volume.view(), mask.view(), 65_535),
            Err(RadiomicsError::InvalidGrayLevels(65_535))
        );

        let strict = ExtractParams::new(8)
            .unwrap()
            .with_degenerate(DegeneratePolicy::Strict);
        assert_eq!(
            extract_with(volume.view(), mask.view(), &strict),
            Err(RadiomicsError::DegenerateIntensityRange(0.0))
        );

        let out_of_range = ExtractParams::batch().with_fractal_slice(FractalSlice::At(3));
        assert_eq!(
            extract_with(volume.view(), mask.view(), &out_of_range),
            Err(RadiomicsError::SliceOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_extract_batch() {
        let (volume, mask) = sphere();
        let empty = Array3::from_elem(mask.dim(), false);
        let items = vec![
            (volume.view(), mask.view()),
            (volume.view(), empty.view()),
            (volume.view(), mask.view()),
        ];
        let params = ExtractParams::batch();
        let out = extract_batch(&items, &params);

        assert_eq!(out.len(), 3);
        assert_eq!(out[1], Err(RadiomicsError::EmptyRoi));
        let single = extract_with(volume.view(), mask.view(), &params).unwrap();
        let first = out[0].as_ref().unwrap();
        assert_eq!(first.values().len(), single.values().len());
        assert!(first
            .values()
            .iter()
            .zip(single.values())
            .all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn test_feature_vector_unit() {
        let fv = FeatureVector::new(vec![0.0; FEATURE_COUNT]);
        assert_eq!(fv.unit_format(), crate::FEATURE_UNIT_FORMAT);
        assert_eq!(fv.unit_format().template(), "{unit}^2");
        assert_eq!(fv.unit("mm"), "mm^2");
        assert!(!fv.is_empty());
    }
}
