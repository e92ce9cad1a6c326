//! PCA + 线性回归分级.
//!
//! 模型在外部离线训练, 本模块只负责加载参数并应用:
//! 特征向量先经 PCA 投影 (可选白化), 再经分区各自的线性回归得到 OA 等级.

use std::path::Path;

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

use crate::zones::Zone;
use crate::{GradeError, GradeResult};

mod bundle;
mod csv;

pub use bundle::{read_bundle, write_bundle, ModelBundle};
pub use csv::{read_csv_table, DescriptorParams};

/// 已加载的模型参数. 加载后只读.
#[derive(Debug, Clone)]
struct LoadedModel {
    eigenvectors: Array2<f64>,
    singular_values: Array1<f64>,
    n_comp: usize,
    mean: Array1<f64>,
    whiten: bool,
    weights: [Array1<f64>; 3],
    intercepts: [f64; 3],
}

/// 分级模型. 初始为未加载状态, 加载后不再变化,
/// 可在线程间以共享引用安全使用.
#[derive(Debug, Clone, Default)]
pub struct GradingModel {
    inner: Option<LoadedModel>,
}

impl GradingModel {
    /// 创建未加载的模型.
    pub fn new() -> Self {
        Self { inner: None }
    }

    /// 模型是否已加载.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.inner.is_some()
    }

    /// 投影保留的主成分个数. 未加载时为 0.
    #[inline]
    pub fn n_components(&self) -> usize {
        self.inner.as_ref().map_or(0, |m| m.n_comp)
    }

    /// 模型期望的特征维度. 未加载时为 0.
    #[inline]
    pub fn feature_dim(&self) -> usize {
        self.inner.as_ref().map_or(0, |m| m.eigenvectors.nrows())
    }

    /// PCA 特征向量. 未加载时为 `None`.
    #[inline]
    pub fn eigenvectors(&self) -> Option<ArrayView2<'_, f64>> {
        self.inner.as_ref().map(|m| m.eigenvectors.view())
    }

    /// 从内存中的参数包装载, 替换已有参数.
    ///
    /// 参数包维度不一致时返回 [`GradeError::InconsistentBundle`],
    /// 模型保持原有状态不变.
    pub fn load_bundle(&mut self, bundle: ModelBundle) -> GradeResult<()> {
        bundle.validate()?;
        let ModelBundle {
            eigenvectors,
            singular_values,
            n_comp,
            mean,
            whiten,
            weights,
            intercepts,
        } = bundle;
        self.inner = Some(LoadedModel {
            eigenvectors,
            singular_values,
            n_comp,
            mean,
            whiten,
            weights,
            intercepts,
        });
        Ok(())
    }

    /// 从磁盘加载: `weights_path` 为 bincode 参数包,
    /// `parameters_path` 为描述子 csv 参数表.
    ///
    /// 任一文件缺失时返回 [`GradeError::ModelFileMissing`],
    /// 错误消息指明缺失的文件; 参数包维度不一致时返回
    /// [`GradeError::InconsistentBundle`].
    pub fn load(
        &mut self,
        weights_path: &Path,
        parameters_path: &Path,
    ) -> GradeResult<DescriptorParams> {
        let bundle = bundle::read_bundle(weights_path)?;
        let table = csv::read_csv_table(parameters_path)?;
        let params = DescriptorParams::from_table(&table)?;
        self.load_bundle(bundle)?;
        Ok(params)
    }

    /// 对单个分区的特征向量打分.
    ///
    /// 计算 `(features - mean) · eig[:, :n_comp]`, 白化时逐分量除以
    /// 奇异值, 再与该分区的回归权重点乘并加截距.
    ///
    /// 未加载时返回 [`GradeError::ModelNotLoaded`]; `features` 长度
    /// 与特征维度不一致时返回 [`GradeError::DimensionMismatch`].
    pub fn predict(&self, features: ArrayView1<'_, f64>, zone: Zone) -> GradeResult<f64> {
        let model = self.inner.as_ref().ok_or(GradeError::ModelNotLoaded)?;

        let dim = model.eigenvectors.nrows();
        if features.len() != dim {
            return Err(GradeError::DimensionMismatch(dim, features.len()));
        }

        let centered = &features - &model.mean;
        let mut projected = centered.dot(&model.eigenvectors.slice(s![.., ..model.n_comp]));
        if model.whiten {
            projected /= &model.singular_values.slice(s![..model.n_comp]);
        }

        let z = zone.ordinal();
        Ok(projected.dot(&model.weights[z]) + model.intercepts[z])
    }

    /// 对一个样本的三组分区特征打分.
    pub fn grade_sample(
        &self,
        surface: ArrayView1<'_, f64>,
        deep: ArrayView1<'_, f64>,
        calcified: ArrayView1<'_, f64>,
    ) -> GradeResult<SampleGrade> {
        Ok(SampleGrade {
            surface: self.predict(surface, Zone::Surface)?,
            deep: self.predict(deep, Zone::Deep)?,
            calcified: self.predict(calcified, Zone::Calcified)?,
        })
    }
}

/// 一个样本的分级结果.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleGrade {
    /// 表层等级.
    pub surface: f64,

    /// 深层等级.
    pub deep: f64,

    /// 钙化层等级.
    pub calcified: f64,
}

impl SampleGrade {
    /// 三个分区等级之和.
    #[inline]
    pub fn combined(&self) -> f64 {
        self.surface + self.deep + self.calcified
    }

    /// 面向用户的单行摘要.
    pub fn label(&self) -> String {
        format!(
            "surface: {:.2}, deep: {:.2}, calcified: {:.2} (combined {:.2})",
            self.surface,
            self.deep,
            self.calcified,
            self.combined()
        )
    }
}
