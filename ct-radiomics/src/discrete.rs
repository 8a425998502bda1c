//! 灰度离散化.

use std::ops::Index;

use itertools::{Itertools, MinMaxResult};
use ndarray::{Array3, ArrayView3, Zip};

use crate::params::DegeneratePolicy;
use crate::{Idx3d, RadiomicsError, RadiomicsResult};

/// ROI 外体素在离散网格中的取值.
pub const OUTSIDE_ROI: u16 = 0;

/// 离散化后的灰度网格, 与裁剪后子体积同形状.
///
/// ROI 内体素的取值位于 `[1, N]`, ROI 外体素为 [`OUTSIDE_ROI`].
#[derive(Debug, Clone)]
pub struct DiscretizedGrid {
    levels: u16,
    data: Array3<u16>,
    roi_voxels: usize,
    range: (f64, f64),
}

impl DiscretizedGrid {
    /// 将子体积 `volume` 中位于 `mask` 的体素重新标度到 `1..=levels`.
    ///
    /// 最值只在 ROI 内统计: `floor(N * (v - min) / (max - min)) + 1`,
    /// 其中恰好等于 `N + 1` 的值 (即 `v == max`) 归入第 `N` 级.
    ///
    /// # 注意
    ///
    /// 1. 两个数组形状必须一致, 否则程序 panic.
    /// 2. `levels` 不在 `1..=levels::MAX` 内时返回 [`RadiomicsError::InvalidGrayLevels`].
    /// 3. 若 ROI 为空, 返回 [`RadiomicsError::EmptyRoi`].
    /// 4. 若 ROI 内灰度恒定, 按 `policy` 处理: 全部归入第 1 级,
    ///   或返回 [`RadiomicsError::DegenerateIntensityRange`].
    pub fn new<T>(
        volume: ArrayView3<T>,
        mask: ArrayView3<bool>,
        levels: u16,
        policy: DegeneratePolicy,
    ) -> RadiomicsResult<Self>
    where
        T: Copy + Into<f64>,
    {
        assert_eq!(volume.dim(), mask.dim(), "扫描和掩码形状不一致");
        if !(1..=crate::consts::levels::MAX).contains(&levels) {
            return Err(RadiomicsError::InvalidGrayLevels(levels as usize));
        }

        let roi = || {
            volume
                .iter()
                .zip(mask.iter())
                .filter(|(_, m)| **m)
                .map(|(v, _)| Into::<f64>::into(*v))
        };
        let (min, max) = match roi().minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => return Err(RadiomicsError::EmptyRoi),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
        let roi_voxels = roi().count();

        let n = levels as f64;
        let span = max - min;
        let data = if span > 0.0 {
            let mut data = Array3::from_elem(volume.dim(), OUTSIDE_ROI);
            Zip::from(&mut data)
                .and(&volume)
                .and(&mask)
                .for_each(|g, v, m| {
                    if *m {
                        let v: f64 = (*v).into();
                        let scaled = n * (v - min) / span;
                        // `scaled` 落在 [0, N] 内, 上界 N 对应 N + 1 级, 归入第 N 级.
                        *g = ((scaled.floor() as usize) + 1).min(levels as usize) as u16;
                    }
                });
            data
        } else {
            match policy {
                DegeneratePolicy::Strict => {
                    return Err(RadiomicsError::DegenerateIntensityRange(min));
                }
                DegeneratePolicy::Collapse => {
                    log::warn!("ROI 内灰度恒定为 {min}, 全部归入第 1 级");
                    mask.mapv(|m| if m { 1 } else { OUTSIDE_ROI })
                }
            }
        };
        log::debug!("离散化: [{min}, {max}] -> 1..={levels}, {roi_voxels} 个 ROI 体素");

        Ok(Self {
            levels,
            data,
            roi_voxels,
            range: (min, max),
        })
    }

    /// 灰度级数 N.
    #[inline]
    pub fn levels(&self) -> usize {
        self.levels as usize
    }

    /// 网格形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 网格数据.
    #[inline]
    pub fn data(&self) -> ArrayView3<u16> {
        self.data.view()
    }

    /// `pos` 处的灰度级. 越界或不在 ROI 中时返回 `None`.
    #[inline]
    pub fn level(&self, pos: Idx3d) -> Option<u16> {
        self.data.get(pos).copied().filter(|g| *g != OUTSIDE_ROI)
    }

    /// ROI 内原始灰度的 `(min, max)`.
    #[inline]
    pub fn intensity_range(&self) -> (f64, f64) {
        self.range
    }

    /// ROI 体素个数.
    #[inline]
    pub fn roi_voxel_count(&self) -> usize {
        self.roi_voxels
    }

    /// 长度为 N 的灰度直方图, 第 `g - 1` 项为第 `g` 级的体素个数.
    pub fn histogram(&self) -> Vec<usize> {
        let mut hist = vec![0usize; self.levels()];
        for g in self.data.iter().filter(|g| **g != OUTSIDE_ROI) {
            hist[*g as usize - 1] += 1;
        }
        hist
    }

    /// 长度为 N 的灰度概率分布. ROI 非空时总和为 1.
    pub fn probabilities(&self) -> Vec<f64> {
        let total = self.roi_voxels as f64;
        self.histogram()
            .into_iter()
            .map(|c| c as f64 / total)
            .collect()
    }
}

impl Index<Idx3d> for DiscretizedGrid {
    type Output = u16;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}
