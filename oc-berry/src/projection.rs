//! 深度方向投影.
//!
//! 将分区 VOI 沿深度轴压缩为一对 2D 灰度统计图 (均值图与标准差图),
//! 作为纹理描述子的输入.

use ndarray::{Array2, ArrayViewMut1, Axis as NdAxis};

use crate::Volume;

#[cfg(feature = "rayon")]
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

/// 一个分区的深度投影结果.
#[derive(Debug, Clone)]
pub struct ProjectionPair {
    /// 逐列 (row, col) 的组织灰度均值.
    pub mean: Array2<f64>,

    /// 逐列的组织灰度样本标准差 (n - 1 归一).
    pub std: Array2<f64>,
}

/// 沿深度轴压缩 VOI.
///
/// 对每个 (row, col) 位置, 只统计灰度严格大于 `threshold` 的体素
/// (比较前先转为 `f64`). 累加按深度升序以 `f64` 进行. 标准差使用
/// 样本方差 (n - 1); 入选体素不足两个的列标准差为 0, 没有任何体素
/// 入选的列均值与标准差均为 0.
pub fn reduce(vol: &Volume, threshold: f64) -> ProjectionPair {
    let (rows, cols, depth) = vol.shape();
    let data = vol.data();

    let mut mean = Array2::<f64>::zeros((rows, cols));
    let mut std = Array2::<f64>::zeros((rows, cols));

    let fill_row = |r: usize,
                    mut mean_row: ArrayViewMut1<'_, f64>,
                    mut std_row: ArrayViewMut1<'_, f64>| {
        for c in 0..cols {
            let mut sum = 0.0f64;
            let mut n = 0usize;
            for k in 0..depth {
                let v = f64::from(data[(r, c, k)]);
                if v > threshold {
                    sum += v;
                    n += 1;
                }
            }
            if n == 0 {
                continue;
            }
            let m = sum / n as f64;
            mean_row[c] = m;

            if n >= 2 {
                let mut ssq = 0.0f64;
                for k in 0..depth {
                    let v = f64::from(data[(r, c, k)]);
                    if v > threshold {
                        ssq += (v - m) * (v - m);
                    }
                }
                std_row[c] = (ssq / (n - 1) as f64).sqrt();
            }
        }
    };

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            mean.axis_iter_mut(NdAxis(0))
                .into_par_iter()
                .zip(std.axis_iter_mut(NdAxis(0)).into_par_iter())
                .enumerate()
                .for_each(|(r, (m, s))| fill_row(r, m, s));
        } else {
            mean.axis_iter_mut(NdAxis(0))
                .zip(std.axis_iter_mut(NdAxis(0)))
                .enumerate()
                .for_each(|(r, (m, s))| fill_row(r, m, s));
        }
    }

    ProjectionPair { mean, std }
}

/// 从图像中逐列减去该列的均值, 返回零均值图.
///
/// 常用于在纹理描述前去除整体亮度偏移.
pub fn subtract_mean(image: &Array2<f64>) -> Array2<f64> {
    let mut out = image.clone();
    for mut col in out.axis_iter_mut(NdAxis(1)) {
        let m = col.sum() / col.len() as f64;
        col.mapv_inplace(|v| v - m);
    }
    out
}
