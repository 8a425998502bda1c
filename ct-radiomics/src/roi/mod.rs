//! ROI 包围盒与连通性分析.

use std::ops::RangeInclusive;

use ndarray::{s, ArrayView2, ArrayView3, Axis};

use crate::{Idx3d, Offset, RadiomicsError, RadiomicsResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod connectivity;

pub use connectivity::{Adjacency, ConnectivityMap};

/// 将 `pos` 按 `off` 平移. 若结果越出 `shape` 则返回 `None`.
#[inline]
pub(crate) fn shift((r, c, s): Idx3d, (dr, dc, ds): Offset, shape: Idx3d) -> Option<Idx3d> {
    let r = r.checked_add_signed(dr).filter(|v| *v < shape.0)?;
    let c = c.checked_add_signed(dc).filter(|v| *v < shape.1)?;
    let s = s.checked_add_signed(ds).filter(|v| *v < shape.2)?;
    Some((r, c, s))
}

/// ROI 掩码真值体素的轴对齐包围盒. 上下界均为闭区间.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    min: Idx3d,
    max: Idx3d,
}

impl BoundingBox {
    /// 求 `mask` 中真值体素的包围盒. 若不存在真值体素, 返回 [`RadiomicsError::EmptyRoi`].
    pub fn of(mask: ArrayView3<bool>) -> RadiomicsResult<Self> {
        let mut ans: Option<Self> = None;
        for (pos, _) in mask.indexed_iter().filter(|(_, v)| **v) {
            match ans.as_mut() {
                None => ans = Some(Self { min: pos, max: pos }),
                Some(b) => b.expand_to_contain(pos),
            }
        }
        ans.ok_or(RadiomicsError::EmptyRoi)
    }

    #[inline]
    fn expand_to_contain(&mut self, (r, c, s): Idx3d) {
        self.min = (self.min.0.min(r), self.min.1.min(c), self.min.2.min(s));
        self.max = (self.max.0.max(r), self.max.1.max(c), self.max.2.max(s));
    }

    /// 各轴最小索引.
    #[inline]
    pub fn min(&self) -> Idx3d {
        self.min
    }

    /// 各轴最大索引 (含).
    #[inline]
    pub fn max(&self) -> Idx3d {
        self.max
    }

    /// 裁剪后子体积的形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        (
            self.max.0 - self.min.0 + 1,
            self.max.1 - self.min.1 + 1,
            self.max.2 - self.min.2 + 1,
        )
    }

    /// 包围盒内体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (r, c, s) = self.shape();
        r * c * s
    }

    /// 原体积中的索引 `pos` 是否位于包围盒内?
    #[inline]
    pub fn contains(&self, (r, c, s): Idx3d) -> bool {
        self.rows().contains(&r) && self.cols().contains(&c) && self.slices().contains(&s)
    }

    /// 行 (第一维) 范围.
    #[inline]
    pub fn rows(&self) -> RangeInclusive<usize> {
        self.min.0..=self.max.0
    }

    /// 列 (第二维) 范围.
    #[inline]
    pub fn cols(&self) -> RangeInclusive<usize> {
        self.min.1..=self.max.1
    }

    /// 切片 (第三维) 范围.
    #[inline]
    pub fn slices(&self) -> RangeInclusive<usize> {
        self.min.2..=self.max.2
    }

    /// 将与掩码同形状的数组裁剪到包围盒. 不复制数据.
    ///
    /// 当 `data` 形状不能容纳包围盒时 panic.
    #[inline]
    pub fn crop<'a, T>(&self, data: ArrayView3<'a, T>) -> ArrayView3<'a, T> {
        data.slice_move(s![self.rows(), self.cols(), self.slices()])
    }
}

/// 将 3D 掩码沿第三维投影为 2D 掩码 (逐像素求 "或").
pub(crate) fn project_mask(mask: ArrayView3<bool>) -> ndarray::Array2<bool> {
    mask.fold_axis(Axis(2), false, |acc, v| *acc || *v)
}

/// 2D 掩码中真值像素的行、列闭区间. 若不存在真值像素则返回 `None`.
pub(crate) fn plane_bounds(
    mask: ArrayView2<bool>,
) -> Option<(RangeInclusive<usize>, RangeInclusive<usize>)> {
    let mut it = mask.indexed_iter().filter(|(_, v)| **v).map(|(p, _)| p);
    let (r0, c0) = it.next()?;
    let (mut rmin, mut rmax, mut cmin, mut cmax) = (r0, r0, c0, c0);
    for (r, c) in it {
        rmin = rmin.min(r);
        rmax = rmax.max(r);
        cmin = cmin.min(c);
        cmax = cmax.max(c);
    }
    Some((rmin..=rmax, cmin..=cmax))
}
