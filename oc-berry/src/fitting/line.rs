//! 最小二乘直线.

use ndarray::ArrayView1;

use super::FittedLine;

pub(crate) struct LineImp<'a, T: num::Float> {
    x: ArrayView1<'a, T>,
    y: ArrayView1<'a, T>,
}

macro_rules! impl_line_imp {
    ($fp: ty) => {
        impl<'a> LineImp<'a, $fp> {
            pub fn new(x: ArrayView1<'a, $fp>, y: ArrayView1<'a, $fp>) -> Self {
                assert_eq!(x.len(), y.len(), "x 值和 y 值必须一一对应");
                assert!(x.len() >= 2, "至少需要拟合两个点");
                Self { x, y }
            }

            /// 取点集协方差矩阵的主方向作为直线方向 (垂直距离的 L2 最小化).
            pub fn fit(&self) -> FittedLine<$fp> {
                let n = self.x.len() as $fp;
                let x0 = self.x.sum() / n;
                let y0 = self.y.sum() / n;

                let mut sxx = 0.0;
                let mut syy = 0.0;
                let mut sxy = 0.0;
                for (&x, &y) in self.x.iter().zip(self.y.iter()) {
                    let dx = x - x0;
                    let dy = y - y0;
                    sxx += dx * dx;
                    syy += dy * dy;
                    sxy += dx * dy;
                }

                // 主方向角: phi = 0.5 * atan2(2*sxy, sxx - syy).
                let phi = 0.5 * (2.0 * sxy).atan2(sxx - syy);
                FittedLine {
                    vx: phi.cos(),
                    vy: phi.sin(),
                    x0,
                    y0,
                }
            }
        }
    };
}

impl_line_imp!(f32);
impl_line_imp!(f64);
