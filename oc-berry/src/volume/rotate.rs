//! 体数据的平面内旋转重采样.

use ndarray::{Array3, ArrayView2, ArrayViewMut2};

use super::{Axis, Volume};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use ndarray::Zip;
    }
}

/// 旋转的重采样模式.
///
/// 两种模式对同一输入的结果在重采样插值误差范围内一致.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RotateMode {
    /// 内存数组表示旋转: 双线性插值, 用于后续数值处理.
    Resample,

    /// 显示方位旋转: 最近邻采样, 用于供渲染协作者摆正方位.
    Orient,
}

impl Volume {
    /// 绕 `axis` 将体数据旋转 `angle_deg` 度, 生成同形状的新数据.
    ///
    /// 旋转发生在垂直于 `axis` 的平面内, 以平面中心为旋转中心,
    /// 落在原数据之外的体素填充为 0. 符号约定为右手系: 绕 [`Axis::Row`]
    /// 的正角度将深于中心的内容转向列索引增大的方向.
    pub fn rotate(&self, angle_deg: f64, axis: Axis, mode: RotateMode) -> Volume {
        let theta = angle_deg.to_radians();
        let (sin, cos) = theta.sin_cos();
        // 右手系中绕轴 a 的旋转作用于平面 (a+1, a+2), 而 `index_axis`
        // 给出的剩余平面对 Col 轴是 (Row, Depth), 次序相反, 因此翻转符号.
        let sin = if axis == Axis::Col { -sin } else { sin };

        let mut out = Array3::<u8>::zeros(self.data.raw_dim());
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                Zip::from(out.axis_iter_mut(axis.nd()))
                    .and(self.data.axis_iter(axis.nd()))
                    .par_for_each(|dst, src| rotate_plane(src, dst, sin, cos, mode));
            } else {
                for (dst, src) in out
                    .axis_iter_mut(axis.nd())
                    .zip(self.data.axis_iter(axis.nd()))
                {
                    rotate_plane(src, dst, sin, cos, mode);
                }
            }
        }
        Volume { data: out }
    }
}

/// 对单个平面做逆映射旋转重采样.
///
/// 平面坐标记作 `(u, v)`. 正向旋转取 `R(θ) = [[cos, sin], [-sin, cos]]`,
/// 逆映射时对目标坐标施加 `R(-θ)`.
fn rotate_plane(
    src: ArrayView2<u8>,
    mut dst: ArrayViewMut2<u8>,
    sin: f64,
    cos: f64,
    mode: RotateMode,
) {
    let (h, w) = src.dim();
    let cu = (h - 1) as f64 / 2.0;
    let cv = (w - 1) as f64 / 2.0;

    for ((u, v), o) in dst.indexed_iter_mut() {
        let du = u as f64 - cu;
        let dv = v as f64 - cv;
        let su = cos * du - sin * dv + cu;
        let sv = sin * du + cos * dv + cv;

        *o = match mode {
            RotateMode::Orient => sample_nearest(&src, su, sv),
            RotateMode::Resample => sample_bilinear(&src, su, sv),
        };
    }
}

#[inline]
fn sample_nearest(src: &ArrayView2<u8>, su: f64, sv: f64) -> u8 {
    let (h, w) = src.dim();
    let ru = su.round();
    let rv = sv.round();
    if ru < 0.0 || rv < 0.0 || ru >= h as f64 || rv >= w as f64 {
        return 0;
    }
    src[(ru as usize, rv as usize)]
}

#[inline]
fn sample_bilinear(src: &ArrayView2<u8>, su: f64, sv: f64) -> u8 {
    let (h, w) = src.dim();
    // 完全落在外部的点直接为背景.
    if su <= -1.0 || sv <= -1.0 || su >= h as f64 || sv >= w as f64 {
        return 0;
    }
    let u0 = su.floor();
    let v0 = sv.floor();
    let fu = su - u0;
    let fv = sv - v0;

    let at = |u: f64, v: f64| -> f64 {
        if u < 0.0 || v < 0.0 || u >= h as f64 || v >= w as f64 {
            0.0
        } else {
            src[(u as usize, v as usize)] as f64
        }
    };

    let val = at(u0, v0) * (1.0 - fu) * (1.0 - fv)
        + at(u0, v0 + 1.0) * (1.0 - fu) * fv
        + at(u0 + 1.0, v0) * fu * (1.0 - fv)
        + at(u0 + 1.0, v0 + 1.0) * fu * fv;

    val.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    /// 平滑的合成体数据, 便于评估重采样误差.
    fn smooth_volume() -> Volume {
        let data = Array3::from_shape_fn((21, 21, 21), |(r, c, d)| {
            let dr = r as f64 - 10.0;
            let dc = c as f64 - 10.0;
            let dd = d as f64 - 10.0;
            let dist = (dr * dr + dc * dc + dd * dd).sqrt();
            (200.0 * (-dist / 10.0).exp()) as u8
        });
        Volume::from_array(data)
    }

    #[test]
    fn test_rotate_zero_angle_is_identity() {
        let vol = smooth_volume();
        for mode in [RotateMode::Resample, RotateMode::Orient] {
            let rot = vol.rotate(0.0, Axis::Row, mode);
            assert_eq!(rot.data(), vol.data());
        }
    }

    #[test]
    fn test_rotate_positive_angle_moves_toward_columns() {
        // 中心以深的单个亮点, 绕 Row 轴正向旋转后应向列增大方向移动.
        let mut data = Array3::<u8>::zeros((3, 21, 21));
        data[(1, 10, 16)] = 255;
        let vol = Volume::from_array(data);

        let rot = vol.rotate(30.0, Axis::Row, RotateMode::Orient);
        let plane = rot.slice_plane(Axis::Row, 1);
        let (pos, _) = plane
            .indexed_iter()
            .max_by_key(|&(_, &v)| v)
            .unwrap();
        assert!(pos.0 > 10, "亮点应移向列增大方向, 实际 {pos:?}");
    }

    #[test]
    fn test_rotate_round_trip() {
        let vol = smooth_volume();
        let theta = 7.5;
        let there = vol.rotate(theta, Axis::Col, RotateMode::Resample);
        let back = there.rotate(-theta, Axis::Col, RotateMode::Resample);

        // 只比较内部区域, 边缘在旋转中会被背景填充.
        let mut total = 0.0;
        let mut count = 0u64;
        for r in 5..16 {
            for c in 5..16 {
                for d in 5..16 {
                    let a = vol[(r, c, d)] as f64;
                    let b = back[(r, c, d)] as f64;
                    total += (a - b).abs();
                    count += 1;
                }
            }
        }
        let mean_err = total / count as f64;
        assert!(mean_err < 3.0, "往返旋转平均误差过大: {mean_err}");
    }

    #[test]
    fn test_rotate_modes_agree_on_smooth_data() {
        let vol = smooth_volume();
        let a = vol.rotate(10.0, Axis::Row, RotateMode::Resample);
        let b = vol.rotate(10.0, Axis::Row, RotateMode::Orient);

        let mut total = 0.0;
        let mut count = 0u64;
        for r in 5..16 {
            for c in 5..16 {
                for d in 5..16 {
                    total += (a[(r, c, d)] as f64 - b[(r, c, d)] as f64).abs();
                    count += 1;
                }
            }
        }
        let mean_err = total / count as f64;
        assert!(mean_err < 5.0, "两种模式的平均差异过大: {mean_err}");
    }
}
