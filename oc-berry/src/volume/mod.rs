use std::ops::{Index, IndexMut};

use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis as NdAxis};

use crate::{GradeError, GradeResult, Idx3d};

mod rotate;

pub use rotate::RotateMode;

/// 体数据的三个坐标轴.
///
/// `(Row, Col)` 构成成像平面, `Depth` 为扫描方向.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Axis {
    /// 行方向 (成像平面的垂直方向).
    Row,

    /// 列方向 (成像平面的水平方向).
    Col,

    /// 深度方向 (相邻切片的方向).
    Depth,
}

impl Axis {
    /// 从数值形式的轴编号构建. 仅用于与以 0/1/2 表示坐标轴的外部协作者交互,
    /// crate 内部一律使用本枚举.
    ///
    /// `n` 不在 0..=2 范围内时返回 [`GradeError::InvalidAxis`].
    pub fn from_index(n: usize) -> GradeResult<Self> {
        match n {
            0 => Ok(Self::Row),
            1 => Ok(Self::Col),
            2 => Ok(Self::Depth),
            _ => Err(GradeError::InvalidAxis(n)),
        }
    }

    /// 轴编号.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Row => 0,
            Self::Col => 1,
            Self::Depth => 2,
        }
    }

    #[inline]
    pub(crate) fn nd(self) -> NdAxis {
        NdAxis(self.index())
    }
}

/// 体数据的轴对齐子区域, 所有边界均为闭区间.
///
/// 该结构是只读的. 构造时保证每个轴上 min <= max.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VoiExtent {
    min_row: usize,
    max_row: usize,
    min_col: usize,
    max_col: usize,
    min_depth: usize,
    max_depth: usize,
}

impl VoiExtent {
    /// 从 `[min_row, max_row, min_col, max_col, min_depth, max_depth]`
    /// 六元组构建.
    ///
    /// 任一轴上 min > max 时返回 [`GradeError::InvalidExtent`].
    pub fn new(bounds: [usize; 6]) -> GradeResult<Self> {
        let [min_row, max_row, min_col, max_col, min_depth, max_depth] = bounds;
        if min_row > max_row || min_col > max_col || min_depth > max_depth {
            return Err(GradeError::InvalidExtent(bounds, None));
        }
        Ok(Self {
            min_row,
            max_row,
            min_col,
            max_col,
            min_depth,
            max_depth,
        })
    }

    /// 覆盖整个形状为 `shape` 的体数据的 extent.
    ///
    /// `shape` 的任一维为 0 时 panic.
    pub fn full(shape: Idx3d) -> Self {
        let (r, c, d) = shape;
        assert!(r > 0 && c > 0 && d > 0, "体数据的三个维度必须为正");
        Self {
            min_row: 0,
            max_row: r - 1,
            min_col: 0,
            max_col: c - 1,
            min_depth: 0,
            max_depth: d - 1,
        }
    }

    /// 该区域的形状, 即每个轴上 `max - min + 1`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        (
            self.max_row - self.min_row + 1,
            self.max_col - self.min_col + 1,
            self.max_depth - self.min_depth + 1,
        )
    }

    /// 深度方向的闭区间.
    #[inline]
    pub fn depth_range(&self) -> (usize, usize) {
        (self.min_depth, self.max_depth)
    }

    /// 转换回六元组形式.
    #[inline]
    pub fn bounds(&self) -> [usize; 6] {
        [
            self.min_row,
            self.max_row,
            self.min_col,
            self.max_col,
            self.min_depth,
            self.max_depth,
        ]
    }

    /// 该区域是否完全落在形状为 `shape` 的体数据内.
    #[inline]
    fn fits(&self, shape: Idx3d) -> bool {
        let (r, c, d) = shape;
        self.max_row < r && self.max_col < c && self.max_depth < d
    }
}

/// 以 `(row, col, depth)` 索引的稠密 3D 体数据, 体素为 8-bit 灰度值.
///
/// 所有操作相对输入都是只读的: 裁剪 / 切片 / 旋转均生成新数据, 各流水线
/// 阶段之间没有共享可变状态. 索引运算以 `usize` 进行, 体素个数超过
/// 2^31 的体数据亦可正确寻址.
#[derive(Debug, Clone)]
pub struct Volume {
    data: Array3<u8>,
}

impl Index<Idx3d> for Volume {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for Volume {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl Volume {
    /// 从裸数组直接构建. 三个维度必须均为正, 否则 panic.
    pub fn from_array(data: Array3<u8>) -> Self {
        let (r, c, d) = data.dim();
        assert!(r > 0 && c > 0 && d > 0, "体数据的三个维度必须为正");
        Self { data }
    }

    /// 从按深度升序排列的 2D 切片栈构建体数据. 每张切片的形状为
    /// `(row, col)`, 所有切片形状必须一致.
    ///
    /// 切片栈为空或形状不一致时返回 [`GradeError::InvalidExtent`].
    pub fn from_slices(slices: &[ArrayView2<u8>]) -> GradeResult<Self> {
        let Some(first) = slices.first() else {
            return Err(GradeError::InvalidExtent([0; 6], None));
        };
        let (r, c) = first.dim();
        let d = slices.len();
        if r == 0 || c == 0 {
            return Err(GradeError::InvalidExtent([0, r, 0, c, 0, d], None));
        }

        let mut data = Array3::<u8>::zeros((r, c, d));
        for (k, sli) in slices.iter().enumerate() {
            if sli.dim() != (r, c) {
                let (sr, sc) = sli.dim();
                return Err(GradeError::InvalidExtent([0, sr, 0, sc, 0, d], Some((r, c, d))));
            }
            data.slice_mut(s![.., .., k]).assign(sli);
        }
        Ok(Self { data })
    }

    /// 获取数据形状大小.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取数据体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (r, c, d) = self.shape();
        r * c * d
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    /// 取出内部数组, 消费自我.
    #[inline]
    pub fn into_array(self) -> Array3<u8> {
        self.data
    }

    /// 提取垂直于 `axis` 的第 `index` 个平面.
    ///
    /// 返回平面的形状为体数据形状去掉 `axis` 维后的二元组.
    /// 相同参数的重复调用返回相等结果. 当 `index` 越界时 panic.
    #[inline]
    pub fn slice_plane(&self, axis: Axis, index: usize) -> Array2<u8> {
        self.data.index_axis(axis.nd(), index).to_owned()
    }

    /// 裁剪出 `extent` 描述的子体数据 (闭区间边界), 生成新数据.
    ///
    /// `extent` 超出体数据边界时返回 [`GradeError::InvalidExtent`].
    /// 全范围 extent 的裁剪结果与原数据完全相等.
    pub fn crop(&self, extent: &VoiExtent) -> GradeResult<Volume> {
        if !extent.fits(self.shape()) {
            return Err(GradeError::InvalidExtent(extent.bounds(), Some(self.shape())));
        }
        let src = self.data.slice(s![
            extent.min_row..=extent.max_row,
            extent.min_col..=extent.max_col,
            extent.min_depth..=extent.max_depth
        ]);

        let mut out = Array3::<u8>::zeros(extent.shape());
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                ndarray::Zip::from(&mut out).and(&src).par_for_each(|o, &s| *o = s);
            } else {
                out.assign(&src);
            }
        }
        Ok(Volume { data: out })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn sample_volume() -> Volume {
        // 4x3x2, 体素值为线性编码, 保证互不相同.
        let data = Array3::from_shape_fn((4, 3, 2), |(r, c, d)| (r * 6 + c * 2 + d) as u8);
        Volume::from_array(data)
    }

    #[test]
    fn test_axis_from_index() {
        assert_eq!(Axis::from_index(0).unwrap(), Axis::Row);
        assert_eq!(Axis::from_index(1).unwrap(), Axis::Col);
        assert_eq!(Axis::from_index(2).unwrap(), Axis::Depth);
        assert!(matches!(
            Axis::from_index(3),
            Err(GradeError::InvalidAxis(3))
        ));
    }

    #[test]
    fn test_slice_plane_shapes() {
        let vol = sample_volume();
        assert_eq!(vol.slice_plane(Axis::Row, 0).dim(), (3, 2));
        assert_eq!(vol.slice_plane(Axis::Col, 0).dim(), (4, 2));
        assert_eq!(vol.slice_plane(Axis::Depth, 0).dim(), (4, 3));
    }

    #[test]
    fn test_slice_plane_idempotent() {
        let vol = sample_volume();
        for axis in [Axis::Row, Axis::Col, Axis::Depth] {
            let a = vol.slice_plane(axis, 1);
            let b = vol.slice_plane(axis, 1);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_slice_plane_values() {
        let vol = sample_volume();
        let plane = vol.slice_plane(Axis::Depth, 1);
        for ((r, c), &v) in plane.indexed_iter() {
            assert_eq!(v, vol[(r, c, 1)]);
        }
    }

    #[test]
    fn test_crop_full_extent_is_identity() {
        let vol = sample_volume();
        let full = VoiExtent::full(vol.shape());
        let cropped = vol.crop(&full).unwrap();
        assert_eq!(cropped.data(), vol.data());
    }

    #[test]
    fn test_crop_sub_extent() {
        let vol = sample_volume();
        let ext = VoiExtent::new([1, 2, 0, 1, 1, 1]).unwrap();
        let sub = vol.crop(&ext).unwrap();
        assert_eq!(sub.shape(), (2, 2, 1));
        assert_eq!(sub[(0, 0, 0)], vol[(1, 0, 1)]);
        assert_eq!(sub[(1, 1, 0)], vol[(2, 1, 1)]);
    }

    #[test]
    fn test_invalid_extent() {
        // min > max.
        assert!(matches!(
            VoiExtent::new([2, 1, 0, 0, 0, 0]),
            Err(GradeError::InvalidExtent(_, None))
        ));

        // 越界.
        let vol = sample_volume();
        let ext = VoiExtent::new([0, 3, 0, 2, 0, 5]).unwrap();
        assert!(matches!(
            vol.crop(&ext),
            Err(GradeError::InvalidExtent(_, Some(_)))
        ));
    }

    #[test]
    fn test_from_slices() {
        let s0 = Array2::from_elem((2, 3), 1u8);
        let s1 = Array2::from_elem((2, 3), 2u8);
        let vol = Volume::from_slices(&[s0.view(), s1.view()]).unwrap();
        assert_eq!(vol.shape(), (2, 3, 2));
        assert_eq!(vol[(0, 0, 0)], 1);
        assert_eq!(vol[(1, 2, 1)], 2);

        // 形状不一致.
        let bad = Array2::from_elem((3, 3), 0u8);
        assert!(Volume::from_slices(&[s0.view(), bad.view()]).is_err());

        // 空切片栈.
        assert!(Volume::from_slices(&[]).is_err());
    }
}
