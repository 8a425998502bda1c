//! 通用常量.

use crate::Offset;

/// 灰度级数.
pub mod levels {
    /// 交互式单 ROI 评估时的默认灰度级数.
    pub const INTERACTIVE: u16 = 255;

    /// 整体积批处理时常用的灰度级数.
    pub const BATCH: u16 = 64;

    /// 允许的最大灰度级数.
    ///
    /// 共生矩阵按 `N x N x 13` 稠密存储, `N = 1024` 时约 110 MB.
    pub const MAX: u16 = 1 << 10;
}

/// 对数内部加上的小正数, 避免 `ln(0)`.
pub const LOG_EPS: f64 = f64::EPSILON;

/// 分形估计支持的最大切片边长 (`2^10`).
pub const FRACTAL_MAX_SIDE: usize = 1 << 10;

/// 共生矩阵方向数. 26-邻域中每对互为反向的偏移只保留一个.
pub const DIRECTION_COUNT: usize = 13;

/// 13 个规范方向偏移 `(dr, dc, ds)`. 每个偏移的第一个非零分量为正.
///
/// 依次为 3 个轴向, 6 个面对角线方向, 4 个体对角线方向.
pub const DIRECTIONS: [Offset; DIRECTION_COUNT] = [
    (1, 0, 0),
    (0, 1, 0),
    (0, 0, 1),
    (1, 1, 0),
    (1, -1, 0),
    (1, 0, 1),
    (1, 0, -1),
    (0, 1, 1),
    (0, 1, -1),
    (1, 1, 1),
    (1, 1, -1),
    (1, -1, 1),
    (1, -1, -1),
];

/// 6-邻居偏移.
pub const NEIGHBOURS_6: [Offset; 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

/// 26-邻居偏移, 按 `3 x 3 x 3` 立方体的行优先序排列 (跳过中心).
pub const NEIGHBOURS_26: [Offset; 26] = neighbours26();

const fn neighbours26() -> [Offset; 26] {
    let mut ans = [(0, 0, 0); 26];
    let (mut i, mut k) = (0usize, 0usize);
    while i < 27 {
        if i != 13 {
            ans[k] = (
                (i / 9) as isize - 1,
                ((i / 3) % 3) as isize - 1,
                (i % 3) as isize - 1,
            );
            k += 1;
        }
        i += 1;
    }
    ans
}
