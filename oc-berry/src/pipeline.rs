//! 显式流水线状态.
//!
//! 分级流程按阶段推进: 旋转矫正 -> 分区提取 -> 深度投影 -> 打分.
//! 每个阶段消费上一阶段的值并产出新值, 阶段之间没有共享可变状态,
//! 中间结果可随时取出单独检查.

use ndarray::{Array1, ArrayView2};

use crate::grading::{GradingModel, SampleGrade};
use crate::projection::{self, ProjectionPair};
use crate::surface::{self, BoneInterface, OrientationAngles, SurfaceConfig, SurfaceStats};
use crate::zones::{self, Zone, ZoneSpecs, Zones};
use crate::{GradeResult, Volume};

/// 纹理描述子.
///
/// 描述子算法 (例如 MRELBP) 由外部协作者实现, 本 crate 只约定接口:
/// 输入一个分区的均值图与标准差图, 输出定长特征向量. 归一化等预处理
/// 属于描述子自身的职责.
pub trait TextureDescriptor {
    /// 从一对投影图计算特征向量.
    ///
    /// 返回向量的长度必须与分级模型的特征维度一致.
    fn features(&self, mean: ArrayView2<'_, f64>, std: ArrayView2<'_, f64>) -> Array1<f64>;
}

/// 阶段一: 旋转矫正后的体数据.
#[derive(Debug, Clone)]
pub struct Oriented {
    /// 矫正后的表面 VOI.
    pub volume: Volume,

    /// 细扫描得到的表面深度统计.
    pub stats: SurfaceStats,

    /// 矫正所用的倾角.
    pub angles: OrientationAngles,
}

impl Oriented {
    /// 对原始体数据做表面检测与旋转矫正.
    pub fn from_volume(volume: Volume, cfg: &SurfaceConfig) -> GradeResult<Self> {
        let BoneInterface {
            voi,
            stats,
            angles,
            ..
        } = surface::bone_interface(&volume, cfg)?;
        Ok(Self {
            volume: voi,
            stats,
            angles,
        })
    }

    /// 阶段二: 以表面深度均值为基准提取三个分区 VOI.
    pub fn into_zoned(self, specs: &ZoneSpecs) -> GradeResult<Zoned> {
        let surface_depth = self.stats.mean.round() as usize;
        let zones = zones::extract_all(&self.volume, surface_depth, specs)?;
        Ok(Zoned {
            zones,
            thresholds: [
                specs.surface.tissue_threshold,
                specs.deep.tissue_threshold,
                specs.calcified.tissue_threshold,
            ],
        })
    }
}

/// 阶段二: 三个分区 VOI 与各自的组织阈值.
#[derive(Debug, Clone)]
pub struct Zoned {
    /// 分区 VOI.
    pub zones: Zones,

    thresholds: [f64; 3],
}

impl Zoned {
    /// 阶段三: 将每个分区沿深度轴投影为均值 / 标准差图.
    pub fn into_projected(self) -> Projected {
        let pair = |zone: Zone| {
            projection::reduce(self.zones.get(zone), self.thresholds[zone.ordinal()])
        };
        Projected {
            surface: pair(Zone::Surface),
            deep: pair(Zone::Deep),
            calcified: pair(Zone::Calcified),
        }
    }
}

/// 阶段三: 各分区的投影图.
#[derive(Debug, Clone)]
pub struct Projected {
    /// 表层投影.
    pub surface: ProjectionPair,

    /// 深层投影.
    pub deep: ProjectionPair,

    /// 钙化层投影.
    pub calcified: ProjectionPair,
}

impl Projected {
    /// 获取 `zone` 对应的投影图.
    #[inline]
    pub fn get(&self, zone: Zone) -> &ProjectionPair {
        match zone {
            Zone::Surface => &self.surface,
            Zone::Deep => &self.deep,
            Zone::Calcified => &self.calcified,
        }
    }

    /// 阶段四: 经描述子与分级模型得到最终等级.
    pub fn grade<D: TextureDescriptor>(
        &self,
        descriptor: &D,
        model: &GradingModel,
    ) -> GradeResult<SampleGrade> {
        let feats = |zone: Zone| {
            let pair = self.get(zone);
            descriptor.features(pair.mean.view(), pair.std.view())
        };
        let surface = feats(Zone::Surface);
        let deep = feats(Zone::Deep);
        let calcified = feats(Zone::Calcified);
        model.grade_sample(surface.view(), deep.view(), calcified.view())
    }
}

/// 端到端执行整条流水线.
pub fn run<D: TextureDescriptor>(
    volume: Volume,
    cfg: &SurfaceConfig,
    specs: &ZoneSpecs,
    descriptor: &D,
    model: &GradingModel,
) -> GradeResult<SampleGrade> {
    Oriented::from_volume(volume, cfg)?
        .into_zoned(specs)?
        .into_projected()
        .grade(descriptor, model)
}
