//! 运行时错误.

use crate::{Idx2d, Idx3d};

/// 特征提取的运行时错误.
///
/// 数值上的退化情况 (如粗糙度分母为 0) 不属于错误, 它们以 `+inf`
/// 等哨兵值直接写进特征向量.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RadiomicsError {
    /// 扫描与 ROI 掩码形状不一致.
    #[error("扫描形状 {volume:?} 与 ROI 掩码形状 {mask:?} 不一致")]
    ShapeMismatch {
        /// 扫描形状.
        volume: Idx3d,

        /// 掩码形状.
        mask: Idx3d,
    },

    /// ROI 中没有任何体素.
    #[error("ROI 为空")]
    EmptyRoi,

    /// ROI 内灰度恒定 (参数为该灰度), 严格模式下无法离散化.
    #[error("ROI 内灰度恒定为 {0}, 无法重新标度")]
    DegenerateIntensityRange(f64),

    /// 灰度级数不合法. 合法范围是 `1..=levels::MAX`.
    #[error("灰度级数 {0} 不在 1..={max} 范围内", max = crate::consts::levels::MAX)]
    InvalidGrayLevels(usize),

    /// 分形切片裁剪后超出 1024 边长上限. 参数为 `(行数, 列数)`.
    #[error("分形切片 {0:?} 超出 1024 边长上限")]
    FractalSliceTooLarge(Idx2d),

    /// 指定的分形切片索引越界.
    #[error("切片索引 {index} 越界 (共 {len} 层)")]
    SliceOutOfRange {
        /// 请求的索引.
        index: usize,

        /// 切片总层数.
        len: usize,
    },
}

/// 特征提取结果.
pub type RadiomicsResult<T> = Result<T, RadiomicsError>;
