//! 直线拟合.
//!
//! 给定一系列点 `(x, y)`, 用最小二乘法拟合 `y = slope * x + intercept`.
//! 分形估计在对数坐标下以此求斜率.

use ndarray::ArrayView1;

/// 拟合出的直线.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Line<T: num::Float> {
    /// 斜率.
    pub slope: T,

    /// 截距.
    pub intercept: T,
}

impl<T: num::Float> Line<T> {
    /// 求 `x` 处的函数值.
    #[inline]
    pub fn eval(&self, x: T) -> T {
        self.slope * x + self.intercept
    }
}

/// 基于最小二乘法拟合直线.
///
/// `x` 是自变量数组, `y` 是对应函数值. 点数少于 2,
/// 或 `x` 全部相同 (方差为 0) 时无法确定斜率, 返回 `None`.
///
/// 两个数组长度必须一致, 否则程序 panic.
pub fn fit_line<T: num::Float>(x: ArrayView1<T>, y: ArrayView1<T>) -> Option<Line<T>> {
    assert_eq!(x.len(), y.len(), "x 值和 y 值必须一一对应");
    if x.len() < 2 {
        return None;
    }

    let n = T::from(x.len())?;
    let x_mean = x.iter().fold(T::zero(), |acc, &v| acc + v) / n;
    let y_mean = y.iter().fold(T::zero(), |acc, &v| acc + v) / n;

    let (sxx, sxy) = x
        .iter()
        .zip(y.iter())
        .fold((T::zero(), T::zero()), |(sxx, sxy), (&a, &b)| {
            let dx = a - x_mean;
            (sxx + dx * dx, sxy + dx * (b - y_mean))
        });
    if sxx == T::zero() {
        return None;
    }

    let slope = sxy / sxx;
    Some(Line {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn test_fit_exact_line() {
        let x = array![0.0, 1.0, 2.0, 3.0];
        let y = x.mapv(|v| -2.0 * v + 0.5);
        let line = fit_line(x.view(), y.view()).unwrap();
        assert!(f64_eq(line.slope, -2.0));
        assert!(f64_eq(line.intercept, 0.5));
        assert!(f64_eq(line.eval(10.0), -19.5));
    }

    #[test]
    fn test_fit_noisy_line_f32() {
        let x = array![1.0f32, 2.0, 3.0];
        let y = array![1.0f32, 2.0, 4.0];
        let line = fit_line(x.view(), y.view()).unwrap();
        assert!((line.slope - 1.5).abs() < 1e-6);
        assert!((line.intercept + 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_fit_degenerate() {
        let one = array![1.0];
        assert_eq!(fit_line(one.view(), one.view()), None);

        let x = array![2.0, 2.0, 2.0];
        let y = array![1.0, 2.0, 3.0];
        assert_eq!(fit_line(x.view(), y.view()), None);
    }
}
