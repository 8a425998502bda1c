//! 可选的 `rayon` 并行支持.

use std::ops::Range;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};

        /// 借助 `rayon`, 并行地对 `range` 中每个索引执行 `op`, 结果保持原顺序.
        pub(crate) fn map_range<R, F>(range: Range<usize>, op: F) -> Vec<R>
        where
            R: Send,
            F: Fn(usize) -> R + Sync + Send,
        {
            range.into_par_iter().map(op).collect()
        }
    } else {
        /// 顺序地对 `range` 中每个索引执行 `op`.
        pub(crate) fn map_range<R, F>(range: Range<usize>, op: F) -> Vec<R>
        where
            R: Send,
            F: Fn(usize) -> R + Sync + Send,
        {
            range.map(op).collect()
        }
    }
}
