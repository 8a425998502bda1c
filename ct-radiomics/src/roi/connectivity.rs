use ndarray::{Array3, ArrayView3};

use super::{shift, BoundingBox};
use crate::consts::{NEIGHBOURS_26, NEIGHBOURS_6};
use crate::{Idx3d, Offset, RadiomicsResult};

/// 单个 ROI 体素的 `3 x 3 x 3` 邻接掩码.
///
/// 偏移 `(dr, dc, ds)` 对应第 `(dr + 1) * 9 + (dc + 1) * 3 + (ds + 1)` 位.
/// 某位为真, 当且仅当该邻居既不越界, 又位于 ROI 内. 中心位恒为假.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Adjacency(u32);

impl Adjacency {
    const CENTER: u32 = 1 << 13;

    /// 26 个邻居全部存在时的掩码.
    const FULL: u32 = ((1 << 27) - 1) & !Self::CENTER;

    #[inline]
    const fn bit((dr, dc, ds): Offset) -> u32 {
        debug_assert!(dr.abs() <= 1 && dc.abs() <= 1 && ds.abs() <= 1);
        1 << ((dr + 1) * 9 + (dc + 1) * 3 + (ds + 1))
    }

    #[inline]
    fn insert(&mut self, off: Offset) {
        self.0 |= Self::bit(off) & !Self::CENTER;
    }

    /// 偏移为 `off` 的邻居是否存在?
    #[inline]
    pub fn contains(&self, off: Offset) -> bool {
        self.0 & Self::bit(off) != 0
    }

    /// 26 个邻居是否全部位于 ROI 内?
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.0 == Self::FULL
    }

    /// 存在的邻居个数.
    #[inline]
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// 展开为 `[dr + 1][dc + 1][ds + 1]` 形式的布尔立方体.
    pub fn as_cube(&self) -> [[[bool; 3]; 3]; 3] {
        let mut cube = [[[false; 3]; 3]; 3];
        for (i, plane) in cube.iter_mut().enumerate() {
            for (j, row) in plane.iter_mut().enumerate() {
                for (k, v) in row.iter_mut().enumerate() {
                    *v = self.0 & (1 << (i * 9 + j * 3 + k)) != 0;
                }
            }
        }
        cube
    }

    /// 按行优先序迭代存在的邻居偏移.
    #[inline]
    pub fn offsets(self) -> impl Iterator<Item = Offset> {
        NEIGHBOURS_26
            .into_iter()
            .filter(move |off| self.contains(*off))
    }
}

/// 不在 ROI 中的体素在索引表中的占位值.
const NO_VOXEL: u32 = u32::MAX;

/// ROI 连通性表.
///
/// 坐标均以裁剪后子体积为准. 每个 ROI 体素按行优先序获得一个从 0
/// 开始的编号, 并记录它的 [`Adjacency`]. 6-/26-邻居列表由邻接掩码导出.
///
/// 该结构每次评估构建一次, 之后只读.
#[derive(Debug, Clone)]
pub struct ConnectivityMap {
    bbox: BoundingBox,
    voxels: Vec<Idx3d>,
    adjacency: Vec<Adjacency>,
    index: Array3<u32>,
}

impl ConnectivityMap {
    /// 分析整个体积的 ROI 掩码: 求包围盒, 裁剪, 并为每个 ROI 体素建立邻接掩码.
    ///
    /// 若掩码中没有真值体素, 返回 [`crate::RadiomicsError::EmptyRoi`].
    pub fn analyze(mask: ArrayView3<bool>) -> RadiomicsResult<Self> {
        let bbox = BoundingBox::of(mask)?;
        let sub = bbox.crop(mask);
        let shape = sub.dim();
        log::debug!("ROI 包围盒 {:?} ~ {:?}, 子体积 {:?}", bbox.min(), bbox.max(), shape);

        let mut index = Array3::from_elem(shape, NO_VOXEL);
        let mut voxels = Vec::with_capacity(64);
        for (pos, _) in sub.indexed_iter().filter(|(_, v)| **v) {
            index[pos] = voxels.len() as u32;
            voxels.push(pos);
        }
        debug_assert!(!voxels.is_empty());

        let adjacency = voxels
            .iter()
            .map(|&pos| {
                let mut adj = Adjacency::default();
                for off in NEIGHBOURS_26 {
                    if shift(pos, off, shape).is_some_and(|p| sub[p]) {
                        adj.insert(off);
                    }
                }
                adj
            })
            .collect();

        Ok(Self {
            bbox,
            voxels,
            adjacency,
            index,
        })
    }

    /// ROI 在原体积中的包围盒.
    #[inline]
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// 裁剪后子体积的形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.index.dim()
    }

    /// ROI 体素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// 恒为 `false`, 构建时已排除空 ROI.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// 全部 ROI 体素在子体积中的坐标, 行优先序.
    #[inline]
    pub fn voxels(&self) -> &[Idx3d] {
        &self.voxels
    }

    /// 第 `i` 个 ROI 体素的坐标.
    #[inline]
    pub fn position(&self, i: usize) -> Idx3d {
        self.voxels[i]
    }

    /// 第 `i` 个 ROI 体素的邻接掩码.
    #[inline]
    pub fn adjacency(&self, i: usize) -> Adjacency {
        self.adjacency[i]
    }

    /// 子体积坐标 `pos` 处 ROI 体素的编号. 越界或不在 ROI 中时返回 `None`.
    #[inline]
    pub fn index_of(&self, pos: Idx3d) -> Option<usize> {
        self.index
            .get(pos)
            .filter(|v| **v != NO_VOXEL)
            .map(|v| *v as usize)
    }

    /// 子体积坐标 `pos` 是否位于 ROI 内?
    #[inline]
    pub fn contains(&self, pos: Idx3d) -> bool {
        self.index_of(pos).is_some()
    }

    /// 第 `i` 个体素沿 `off` 方向的 ROI 邻居编号.
    #[inline]
    pub fn neighbour(&self, i: usize, off: Offset) -> Option<usize> {
        if !self.adjacency[i].contains(off) {
            return None;
        }
        shift(self.voxels[i], off, self.shape()).and_then(|p| self.index_of(p))
    }

    /// 第 `i` 个体素的 6-连通 ROI 邻居编号.
    pub fn neighbours6(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        NEIGHBOURS_6
            .into_iter()
            .filter_map(move |off| self.neighbour(i, off))
    }

    /// 第 `i` 个体素的 26-连通 ROI 邻居编号.
    pub fn neighbours26(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[i]
            .offsets()
            .filter_map(move |off| self.neighbour(i, off))
    }

    /// 第 `i` 个体素的 26-邻域是否全部位于 ROI 内?
    #[inline]
    pub fn is_complete(&self, i: usize) -> bool {
        self.adjacency[i].is_complete()
    }

    /// 拥有完整 26-邻域的 ROI 体素个数.
    pub fn complete_count(&self) -> usize {
        self.adjacency.iter().filter(|a| a.is_complete()).count()
    }
}
