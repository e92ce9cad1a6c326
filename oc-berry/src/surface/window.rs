//! 以样本质心为中心的局部表面提取.

use ndarray::{s, Array2, Array3};

use crate::{Idx2d, Volume};

/// 计算灰度超过 `threshold` 的所有体素在 (row, col) 平面上的质心.
///
/// 坐标取均值后向零截断. 没有任何体素超过阈值时返回 `(0, 0)`.
pub fn center_of_mass(vol: &Volume, threshold: u8) -> Idx2d {
    let mut sum_r = 0usize;
    let mut sum_c = 0usize;
    let mut count = 0usize;

    for ((r, c, _), &v) in vol.data().indexed_iter() {
        if v > threshold {
            sum_r += r;
            sum_c += c;
            count += 1;
        }
    }

    if count == 0 {
        return (0, 0);
    }
    (sum_r / count, sum_c / count)
}

/// 在以 `center` 为中心、形状为 `size` 的窗口内逐列检测表面.
///
/// 每列从最深处向浅处扫描, 表面索引取灰度超过 `threshold` 的最深深度,
/// 纯背景列为 0. 返回窗口内的表面索引图和一个保持原值的表面 VOI:
/// 每列自表面索引起向深处复制, 深度为 `d - min(索引)`, 其余填 0.
///
/// 窗口超出体数据边界时 panic.
pub fn surface_window(
    vol: &Volume,
    center: Idx2d,
    size: Idx2d,
    threshold: u8,
) -> (Array2<usize>, Volume) {
    let (rows, cols, d) = vol.shape();
    let (h, w) = size;
    assert!(h > 0 && w > 0, "窗口的两个维度必须为正");

    let origin = center
        .0
        .checked_sub(h / 2)
        .zip(center.1.checked_sub(w / 2));
    let Some((r0, c0)) = origin.filter(|&(r0, c0)| r0 + h <= rows && c0 + w <= cols) else {
        panic!("窗口 ({h}, {w}) @ {center:?} 超出体数据边界");
    };

    let data = vol.data();
    let window = data.slice(s![r0..r0 + h, c0..c0 + w, ..]);

    let mut idx = Array2::<usize>::zeros((h, w));
    for ((i, j), out) in idx.indexed_iter_mut() {
        for k in (0..d).rev() {
            if window[(i, j, k)] > threshold {
                *out = k;
                break;
            }
        }
    }

    let min_idx = *idx.iter().min().expect("窗口非空");
    let voi_depth = d - min_idx;
    let mut voi = Array3::<u8>::zeros((h, w, voi_depth));
    for i in 0..h {
        for j in 0..w {
            let start = idx[(i, j)];
            for (offset, k) in (start..d).enumerate() {
                voi[(i, j, offset)] = window[(i, j, k)];
            }
        }
    }

    (idx, Volume::from_array(voi))
}
