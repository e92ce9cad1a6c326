//! 直线拟合.
//!
//! 给定一系列点 `(x, y)`, 该模块以最小二乘准则拟合出一条直线,
//! 返回单位方向向量与质心.

use ndarray::ArrayView1;

mod line;

/// 最小二乘直线拟合结果: 单位方向向量 `(vx, vy)` 与质心 `(x0, y0)`.
#[derive(Copy, Clone, Debug)]
pub struct FittedLine<T> {
    /// 方向向量的 x 分量.
    pub vx: T,

    /// 方向向量的 y 分量.
    pub vy: T,

    /// 点集质心的 x 坐标.
    pub x0: T,

    /// 点集质心的 y 坐标.
    pub y0: T,
}

/// 基于最小二乘法 (L2, 垂直距离) 拟合直线.
///
/// `x` 是自变量数组, `y` 是对应函数值, 两者必须一一对应且至少有两个点.
pub fn line_f64(x: ArrayView1<f64>, y: ArrayView1<f64>) -> FittedLine<f64> {
    line::LineImp::<f64>::new(x.view(), y.view()).fit()
}

/// 基于最小二乘法 (L2, 垂直距离) 拟合直线.
///
/// `x` 是自变量数组, `y` 是对应函数值, 两者必须一一对应且至少有两个点.
pub fn line_f32(x: ArrayView1<f32>, y: ArrayView1<f32>) -> FittedLine<f32> {
    line::LineImp::<f32>::new(x.view(), y.view()).fit()
}
