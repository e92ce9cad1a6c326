//! 软骨分区 VOI 提取.
//!
//! 在旋转矫正后的体数据上, 以检测到的表面深度为基准, 按各分区的深度
//! 偏移与厚度裁剪出三个独立的 VOI.

use crate::{GradeError, GradeResult, Volume, VoiExtent};

/// 软骨分区.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Zone {
    /// 表层软骨.
    Surface,

    /// 深层软骨.
    Deep,

    /// 钙化软骨.
    Calcified,
}

impl Zone {
    /// 三个分区, 按深度从浅到深排列.
    pub const ALL: [Zone; 3] = [Zone::Surface, Zone::Deep, Zone::Calcified];

    /// 分区的英文名, 用于面向用户的输出.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::Deep => "deep",
            Self::Calcified => "calcified",
        }
    }

    #[inline]
    pub(crate) fn ordinal(self) -> usize {
        match self {
            Self::Surface => 0,
            Self::Deep => 1,
            Self::Calcified => 2,
        }
    }
}

/// 单个分区的提取参数.
///
/// 该结构是只读的. 若要修改参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug)]
pub struct ZoneSpec {
    /// 相对表面深度的起始偏移.
    pub offset: usize,

    /// 分区厚度 (深度方向的体素个数).
    pub thickness: usize,

    /// 投影统计时的组织阈值.
    pub tissue_threshold: f64,
}

/// 三个分区的提取参数.
#[derive(Copy, Clone, Debug)]
pub struct ZoneSpecs {
    /// 表层参数.
    pub surface: ZoneSpec,

    /// 深层参数.
    pub deep: ZoneSpec,

    /// 钙化层参数.
    pub calcified: ZoneSpec,
}

impl Default for ZoneSpecs {
    fn default() -> Self {
        Self {
            surface: ZoneSpec {
                offset: 0,
                thickness: 25,
                tissue_threshold: 50.0,
            },
            deep: ZoneSpec {
                offset: 60,
                thickness: 150,
                tissue_threshold: 50.0,
            },
            calcified: ZoneSpec {
                offset: 160,
                thickness: 50,
                tissue_threshold: 50.0,
            },
        }
    }
}

impl ZoneSpecs {
    /// 获取 `zone` 对应的参数.
    #[inline]
    pub fn get(&self, zone: Zone) -> &ZoneSpec {
        match zone {
            Zone::Surface => &self.surface,
            Zone::Deep => &self.deep,
            Zone::Calcified => &self.calcified,
        }
    }
}

/// 三个分区的 VOI. 彼此独立, 可分别消费.
#[derive(Debug, Clone)]
pub struct Zones {
    /// 表层 VOI.
    pub surface: Volume,

    /// 深层 VOI.
    pub deep: Volume,

    /// 钙化层 VOI.
    pub calcified: Volume,
}

impl Zones {
    /// 获取 `zone` 对应的 VOI.
    #[inline]
    pub fn get(&self, zone: Zone) -> &Volume {
        match zone {
            Zone::Surface => &self.surface,
            Zone::Deep => &self.deep,
            Zone::Calcified => &self.calcified,
        }
    }
}

/// 提取单个分区.
///
/// 深度范围为 `[surface + offset, surface + offset + thickness - 1]`,
/// 上界钳制到体数据边界. 起始深度已超出体数据 (钳制后分区厚度为零) 时
/// 返回 [`GradeError::ZoneOutOfBounds`].
pub fn extract(vol: &Volume, surface_depth: usize, spec: &ZoneSpec) -> GradeResult<Volume> {
    let (r, c, d) = vol.shape();
    let start = surface_depth + spec.offset;
    if start >= d || spec.thickness == 0 {
        return Err(GradeError::ZoneOutOfBounds(start, d));
    }
    let end = (start + spec.thickness - 1).min(d - 1);

    let ext = VoiExtent::new([0, r - 1, 0, c - 1, start, end])?;
    vol.crop(&ext)
}

/// 从同一矫正后体数据提取全部三个分区.
pub fn extract_all(vol: &Volume, surface_depth: usize, specs: &ZoneSpecs) -> GradeResult<Zones> {
    Ok(Zones {
        surface: extract(vol, surface_depth, &specs.surface)?,
        deep: extract(vol, surface_depth, &specs.deep)?,
        calcified: extract(vol, surface_depth, &specs.calcified)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    /// 每个深度切片的灰度等于深度值, 便于核对裁剪范围.
    fn depth_coded(depth: usize) -> Volume {
        Volume::from_array(Array3::from_shape_fn((4, 4, depth), |(_, _, d)| d as u8))
    }

    #[test]
    fn test_extract_basic() {
        let vol = depth_coded(100);
        let spec = ZoneSpec {
            offset: 10,
            thickness: 5,
            tissue_threshold: 0.0,
        };
        let voi = extract(&vol, 20, &spec).unwrap();
        assert_eq!(voi.shape(), (4, 4, 5));
        assert_eq!(voi[(0, 0, 0)], 30);
        assert_eq!(voi[(0, 0, 4)], 34);
    }

    #[test]
    fn test_extract_clamps_to_bounds() {
        let vol = depth_coded(40);
        let spec = ZoneSpec {
            offset: 5,
            thickness: 100,
            tissue_threshold: 0.0,
        };
        let voi = extract(&vol, 10, &spec).unwrap();
        // [15, 39] 共 25 层.
        assert_eq!(voi.shape(), (4, 4, 25));
        assert_eq!(voi[(0, 0, 24)], 39);
    }

    #[test]
    fn test_extract_out_of_bounds() {
        let vol = depth_coded(40);
        let spec = ZoneSpec {
            offset: 50,
            thickness: 10,
            tissue_threshold: 0.0,
        };
        assert!(matches!(
            extract(&vol, 10, &spec),
            Err(GradeError::ZoneOutOfBounds(60, 40))
        ));
    }

    #[test]
    fn test_extract_all_defaults() {
        let vol = depth_coded(250);
        let zones = extract_all(&vol, 10, &ZoneSpecs::default()).unwrap();
        assert_eq!(zones.surface.shape(), (4, 4, 25));
        assert_eq!(zones.deep.shape(), (4, 4, 150));
        assert_eq!(zones.calcified.shape(), (4, 4, 50));

        // 各分区起始深度互不相同.
        assert_eq!(zones.surface[(0, 0, 0)], 10);
        assert_eq!(zones.deep[(0, 0, 0)], 70);
        assert_eq!(zones.calcified[(0, 0, 0)], 170);
    }

    #[test]
    fn test_zone_labels() {
        assert_eq!(Zone::Surface.label(), "surface");
        assert_eq!(Zone::ALL.len(), 3);
    }
}
