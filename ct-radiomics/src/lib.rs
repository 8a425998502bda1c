#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 对三维 CT 扫描中的 ROI 计算 45 维影像组学纹理特征.
//!
//! 输入为扫描 `volume`, 同形状的布尔掩码 `mask` 以及灰度级数 `N`,
//! 输出为固定顺序的特征向量及其名称. 三维数组的轴依次记为 `(R, C, S)`.
//!
//! 该 crate 只提供 `safe` 接口. 计算是纯函数式的, 不持有任何全局可变状态.
//!
//! # 注意
//!
//! 1. 本 crate 不负责文件读写, 也不安装日志后端. 需要日志时由调用方初始化
//!   任意 `log` 实现.
//! 2. 在非期望情况下 (如内部不变式被破坏), 程序会直接 panic, 而不会导致内存错误.
//! 3. 数值退化不是错误: 相关的特征以 `+inf`, `-1` 或 `NaN` 表示.
//!
//! # 开发计划
//!
//! ### ROI 包围盒与 26-邻域连通性 ✅
//!
//! 实现位于 `ct-radiomics/src/roi`.
//!
//! ### 灰度离散化 ✅
//!
//! `floor(N * (v - min) / (max - min)) + 1`, 上界归入第 `N` 级.
//! 灰度恒定时可选择归入第 1 级或直接报错.
//!
//! 实现位于 `ct-radiomics/src/discrete.rs`.
//!
//! ### 一阶直方图统计 ✅
//!
//! ### 灰度共生矩阵 (13 方向) 与 Haralick 统计量 ✅
//!
//! 参考论文: "Textural Features for Image Classification" (Haralick, 1973).
//! 另附自相关, 相异性, 聚类阴影, 聚类突出, 最大概率和逆差 (Clausi).
//!
//! ### 邻域灰度差矩阵 ✅
//!
//! 参考论文: "Textural features corresponding to textural properties"
//! (Amadasun & King, 1989).
//!
//! ### 灰度区域大小矩阵 ✅
//!
//! 对每个灰度级做 26-连通区域标记.
//!
//! ### 盒计数分形维数 ✅
//!
//! 基本盒计数, 差分盒计数, 三角棱柱表面积三种估计.
//!
//! 实现位于 `ct-radiomics/src/features`.
//!
//! ### 并行化 ✅
//!
//! 启用 `rayon` feature 后, GTSDM 的 13 个方向, GLZSM 的 N 次标记,
//! 以及批量提取中互相独立的 ROI 均并行计算.
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private
//! API 提供文档.

/// 二维索引.
pub type Idx2d = (usize, usize);

/// 三维索引 `(r, c, s)`.
pub type Idx3d = (usize, usize, usize);

/// 三维偏移 `(dr, dc, ds)`.
pub type Offset = (isize, isize, isize);

pub mod consts;
pub mod discrete;
pub mod error;
pub mod extract;
pub mod features;
pub mod fitting;
pub mod params;
pub mod prelude;
pub mod roi;

mod par;

pub use discrete::DiscretizedGrid;
pub use error::{RadiomicsError, RadiomicsResult};
pub use extract::{extract, extract_batch, extract_with, FeatureVector};
pub use features::{
    descriptors, feature_names, FeatureDescriptor, FeatureFamily, UnitFormat, FEATURE_COUNT,
    FEATURE_UNIT_FORMAT,
};
pub use params::{DegeneratePolicy, ExtractParams, FractalSlice};
pub use roi::{Adjacency, BoundingBox, ConnectivityMap};
