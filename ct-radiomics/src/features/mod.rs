//! 特征引擎与静态特征描述符注册表.
//!
//! 每个特征族 (直方图, GTSDM, NGTDM, GLZSM, 分形维数) 都通过
//! [`FeatureFamily`] 公开一组与计算入口无关的静态描述符.
//! 特征名称和单位由注册表直接给出, 不需要运行任何计算.

use once_cell::sync::Lazy;

use crate::{ConnectivityMap, DiscretizedGrid};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod fractal;
pub mod glzsm;
pub mod gtsdm;
pub mod histogram;
pub mod ngtdm;

pub use fractal::FractalDimensions;
pub use glzsm::Glzsm;
pub use gtsdm::Gtsdm;
pub use histogram::HistogramStats;
pub use ngtdm::Ngtdm;

/// 特征类别.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// 一阶直方图统计.
    Histogram,

    /// 灰度共生矩阵.
    Gtsdm,

    /// 邻域灰度差矩阵.
    Ngtdm,

    /// 灰度区域大小矩阵.
    Glzsm,

    /// 盒计数分形维数.
    Fractal,
}

impl Category {
    /// 特征名称中使用的类别名.
    pub const fn name(&self) -> &'static str {
        match self {
            Category::Histogram => "Histogram",
            Category::Gtsdm => "GTSDM",
            Category::Ngtdm => "NGTDM",
            Category::Glzsm => "GLZSM",
            Category::Fractal => "Fractal",
        }
    }
}

/// 单位格式模板. 与调用方提供的物理单位 (如 `"mm"`) 组合得到最终单位.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnitFormat {
    /// 无量纲.
    #[default]
    Dimensionless,

    /// 长度, 如 `mm`.
    Length,

    /// 面积, 如 `mm^2`.
    Area,

    /// 体积, 如 `mm^3`.
    Volume,
}

impl UnitFormat {
    /// 单位模板中物理单位的占位符.
    pub const PLACEHOLDER: &'static str = "{unit}";

    /// 模板字符串.
    pub const fn template(&self) -> &'static str {
        match self {
            UnitFormat::Dimensionless => "",
            UnitFormat::Length => "{unit}",
            UnitFormat::Area => "{unit}^2",
            UnitFormat::Volume => "{unit}^3",
        }
    }

    /// 用物理单位 `unit` 填充模板. 例如 `Area.render("mm") == "mm^2"`.
    pub fn render(&self, unit: &str) -> String {
        self.template().replace(Self::PLACEHOLDER, unit)
    }
}

/// 单个特征的静态描述符.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FeatureDescriptor {
    /// 类别.
    pub category: Category,

    /// 指标名.
    pub metric: &'static str,
}

impl FeatureDescriptor {
    /// 构建描述符.
    pub const fn new(category: Category, metric: &'static str) -> Self {
        Self { category, metric }
    }

    /// `"Category - Metric"` 形式的名称, 不含序号.
    pub fn label(&self) -> String {
        format!("{} - {}", self.category.name(), self.metric)
    }
}

/// 产出固定个数特征的特征族.
pub trait FeatureFamily {
    /// 该族所有特征的描述符, 与计算结果一一对应.
    const DESCRIPTORS: &'static [FeatureDescriptor];

    /// 该族特征个数.
    #[inline]
    fn len() -> usize {
        Self::DESCRIPTORS.len()
    }
}

/// 特征总个数.
pub const FEATURE_COUNT: usize = 45;

/// 特征向量整体的单位格式.
///
/// 各特征本身无量纲, 输出时整个向量统一标注为物理单位的平方.
pub const FEATURE_UNIT_FORMAT: UnitFormat = UnitFormat::Area;

/// 按输出顺序迭代全部特征描述符.
pub fn descriptors() -> impl Iterator<Item = &'static FeatureDescriptor> {
    HistogramStats::DESCRIPTORS
        .iter()
        .chain(Gtsdm::DESCRIPTORS)
        .chain(Ngtdm::DESCRIPTORS)
        .chain(Glzsm::DESCRIPTORS)
        .chain(FractalDimensions::DESCRIPTORS)
}

/// `"(k) Category - Metric"` 形式的全部特征名, `k` 从 1 开始.
pub static FEATURE_NAMES: Lazy<Vec<String>> = Lazy::new(|| {
    descriptors()
        .enumerate()
        .map(|(k, d)| format!("({}) {}", k + 1, d.label()))
        .collect()
});

/// 获取全部特征名.
#[inline]
pub fn feature_names() -> &'static [String] {
    &FEATURE_NAMES
}

/// 将每个 ROI 体素 (按 [`ConnectivityMap`] 编号) 映射为其离散灰度级.
pub(crate) fn roi_levels(grid: &DiscretizedGrid, conn: &ConnectivityMap) -> Vec<usize> {
    assert_eq!(grid.shape(), conn.shape(), "离散网格与连通性表形状不一致");
    conn.voxels()
        .iter()
        .map(|&pos| {
            let g = grid[pos] as usize;
            debug_assert!((1..=grid.levels()).contains(&g));
            g
        })
        .collect()
}

/// 1-based 灰度级 `i` 对应的浮点值.
#[inline]
pub(crate) fn level_f64(i: usize) -> f64 {
    (i + 1) as f64
}

/// `-x * ln(x + eps)`, 截断到非负.
///
/// `x = 1` 时 `ln(1 + eps) > 0`, 不截断会得到 `-eps`.
#[inline]
pub(crate) fn entropy_term(x: f64) -> f64 {
    (-x * (x + crate::consts::LOG_EPS).ln()).max(0.0)
}
