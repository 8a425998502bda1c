//! 特征提取参数.
//!
//! 流水线唯一的配置就是这里的 [`ExtractParams`], 必须由调用方显式传入.

use crate::consts::levels;
use crate::{RadiomicsError, RadiomicsResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ROI 内灰度恒定 (`max == min`) 时的离散化策略.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DegeneratePolicy {
    /// 所有 ROI 体素归入第 1 级灰度. 下游统计量都能处理单级直方图.
    #[default]
    Collapse,

    /// 直接返回 [`RadiomicsError::DegenerateIntensityRange`].
    Strict,
}

/// 分形估计所用的二维水平切片 (固定第三维 `S`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FractalSlice {
    /// ROI 体素最多的切片. 并列时取索引最小者.
    #[default]
    MostRoi,

    /// 指定切片索引.
    At(usize),
}

/// 特征提取参数. 只读值类型, 使用 `with_*` 系列方法构造新实例.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtractParams {
    levels: u16,
    degenerate: DegeneratePolicy,
    fractal_slice: FractalSlice,
}

impl ExtractParams {
    /// 以灰度级数 `levels` 构建参数, 其余参数取默认值.
    ///
    /// `levels` 必须位于 `1..=levels::MAX`, 否则返回 `Err`.
    pub fn new(levels: usize) -> RadiomicsResult<Self> {
        match u16::try_from(levels) {
            Ok(n) if (1..=crate::consts::levels::MAX).contains(&n) => Ok(Self {
                levels: n,
                ..Self::interactive()
            }),
            _ => Err(RadiomicsError::InvalidGrayLevels(levels)),
        }
    }

    /// 交互式单 ROI 评估的参数, 灰度级数为 255.
    #[inline]
    pub const fn interactive() -> Self {
        Self {
            levels: levels::INTERACTIVE,
            degenerate: DegeneratePolicy::Collapse,
            fractal_slice: FractalSlice::MostRoi,
        }
    }

    /// 整体积批处理的参数, 灰度级数为 64.
    #[inline]
    pub const fn batch() -> Self {
        Self {
            levels: levels::BATCH,
            ..Self::interactive()
        }
    }

    /// 替换灰度恒定时的离散化策略.
    #[inline]
    pub const fn with_degenerate(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate = policy;
        self
    }

    /// 替换分形切片的选取方式.
    #[inline]
    pub const fn with_fractal_slice(mut self, slice: FractalSlice) -> Self {
        self.fractal_slice = slice;
        self
    }

    /// 灰度级数 N.
    #[inline]
    pub const fn levels(&self) -> u16 {
        self.levels
    }

    /// 灰度恒定时的离散化策略.
    #[inline]
    pub const fn degenerate(&self) -> DegeneratePolicy {
        self.degenerate
    }

    /// 分形切片的选取方式.
    #[inline]
    pub const fn fractal_slice(&self) -> FractalSlice {
        self.fractal_slice
    }
}

impl Default for ExtractParams {
    #[inline]
    fn default() -> Self {
        Self::interactive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_invalid_levels() {
        assert_eq!(
            ExtractParams::new(0).unwrap_err(),
            RadiomicsError::InvalidGrayLevels(0)
        );
        assert_eq!(
            ExtractParams::new(70_000).unwrap_err(),
            RadiomicsError::InvalidGrayLevels(70_000)
        );
        assert_eq!(
            ExtractParams::new(65_535).unwrap_err(),
            RadiomicsError::InvalidGrayLevels(65_535)
        );
    }

    #[test]
    fn test_params_levels_upper_bound() {
        let max = crate::consts::levels::MAX as usize;
        assert_eq!(ExtractParams::new(max).unwrap().levels() as usize, max);
        assert_eq!(
            ExtractParams::new(max + 1).unwrap_err(),
            RadiomicsError::InvalidGrayLevels(max + 1)
        );
    }

    #[test]
    fn test_params_presets() {
        assert_eq!(ExtractParams::default().levels(), 255);
        assert_eq!(ExtractParams::batch().levels(), 64);

        let p = ExtractParams::new(8)
            .unwrap()
            .with_degenerate(DegeneratePolicy::Strict)
            .with_fractal_slice(FractalSlice::At(3));
        assert_eq!(p.levels(), 8);
        assert_eq!(p.degenerate(), DegeneratePolicy::Strict);
        assert_eq!(p.fractal_slice(), FractalSlice::At(3));
    }
}
