//! 预训练模型参数包的磁盘格式.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::{GradeError, GradeResult};

/// PCA + 线性回归模型的全部参数, 以 bincode 存盘.
///
/// 特征向量矩阵按行对应特征维度, 按列对应主成分;
/// 三组回归权重依次对应 surface / deep / calcified 分区.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    /// PCA 特征向量, 形状 (特征维度, 主成分个数).
    pub eigenvectors: Array2<f64>,

    /// 各主成分的奇异值.
    pub singular_values: Array1<f64>,

    /// 投影保留的主成分个数.
    pub n_comp: usize,

    /// 训练集特征均值.
    pub mean: Array1<f64>,

    /// 投影后是否做白化 (逐分量除以奇异值).
    pub whiten: bool,

    /// 三个分区的回归权重, 长度均为 `n_comp`.
    pub weights: [Array1<f64>; 3],

    /// 三个分区的回归截距.
    pub intercepts: [f64; 3],
}

impl ModelBundle {
    /// 校验参数包内部维度的一致性.
    ///
    /// 磁盘上的参数包是外部输入, 反序列化成功不代表各字段互相匹配;
    /// 不一致时返回 [`GradeError::InconsistentBundle`] 指明出错字段.
    pub fn validate(&self) -> GradeResult<()> {
        let dim = self.eigenvectors.nrows();
        let cols = self.eigenvectors.ncols();

        if self.n_comp > cols {
            return Err(GradeError::InconsistentBundle(format!(
                "n_comp ({}) exceeds eigenvector columns ({cols})",
                self.n_comp
            )));
        }
        if self.mean.len() != dim {
            return Err(GradeError::InconsistentBundle(format!(
                "mean length ({}) does not match feature dimension ({dim})",
                self.mean.len()
            )));
        }
        if self.singular_values.len() < self.n_comp {
            return Err(GradeError::InconsistentBundle(format!(
                "only {} singular values for n_comp = {}",
                self.singular_values.len(),
                self.n_comp
            )));
        }
        for (w, zone) in self.weights.iter().zip(["surface", "deep", "calcified"]) {
            if w.len() != self.n_comp {
                return Err(GradeError::InconsistentBundle(format!(
                    "{zone} weights length ({}) does not match n_comp ({})",
                    w.len(),
                    self.n_comp
                )));
            }
        }
        Ok(())
    }
}

/// 从磁盘读取参数包并校验其一致性.
///
/// 文件不存在时返回 [`GradeError::ModelFileMissing`], 错误消息指明路径;
/// 维度不一致时返回 [`GradeError::InconsistentBundle`].
pub fn read_bundle(path: &Path) -> GradeResult<ModelBundle> {
    if !path.is_file() {
        return Err(GradeError::ModelFileMissing(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    let bundle: ModelBundle = bincode::deserialize_from(reader)
        .map_err(|e| GradeError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    bundle.validate()?;
    Ok(bundle)
}

/// 将参数包写入磁盘, 覆盖已有文件.
pub fn write_bundle(path: &Path, bundle: &ModelBundle) -> GradeResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, bundle)
        .map_err(|e| GradeError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    pub(crate) fn sample_bundle() -> ModelBundle {
        ModelBundle {
            eigenvectors: arr2(&[[1.0, 0.0], [0.0, 1.0]]),
            singular_values: arr1(&[1.0, 2.0]),
            n_comp: 2,
            mean: arr1(&[1.0, 1.0]),
            whiten: true,
            weights: [
                arr1(&[1.0, 1.0]),
                arr1(&[0.5, -0.5]),
                arr1(&[2.0, 0.0]),
            ],
            intercepts: [0.5, 1.0, -1.0],
        }
    }

    #[test]
    fn test_bundle_round_trip() {
        let path = std::env::temp_dir().join("oc-berry-bundle-round-trip.bin");
        let bundle = sample_bundle();
        write_bundle(&path, &bundle).unwrap();
        let back = read_bundle(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(back.eigenvectors, bundle.eigenvectors);
        assert_eq!(back.singular_values, bundle.singular_values);
        assert_eq!(back.n_comp, 2);
        assert_eq!(back.mean, bundle.mean);
        assert!(back.whiten);
        assert_eq!(back.weights[1], bundle.weights[1]);
        assert_eq!(back.intercepts, bundle.intercepts);
    }

    #[test]
    fn test_validate_rejects_inconsistent_dims() {
        let mut bundle = sample_bundle();
        bundle.n_comp = 3;
        assert!(matches!(
            bundle.validate(),
            Err(GradeError::InconsistentBundle(_))
        ));

        let mut bundle = sample_bundle();
        bundle.mean = arr1(&[1.0, 1.0, 1.0]);
        assert!(bundle.validate().is_err());

        let mut bundle = sample_bundle();
        bundle.weights[1] = arr1(&[1.0]);
        let err = bundle.validate().unwrap_err();
        assert!(err.to_string().contains("deep weights"));
    }

    #[test]
    fn test_read_rejects_inconsistent_bundle() {
        // 磁盘上的参数包在反序列化后也要过一致性校验.
        let path = std::env::temp_dir().join("oc-berry-bundle-inconsistent.bin");
        let mut bundle = sample_bundle();
        bundle.n_comp = 5;
        let writer = std::io::BufWriter::new(File::create(&path).unwrap());
        bincode::serialize_into(writer, &bundle).unwrap();

        let err = read_bundle(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, GradeError::InconsistentBundle(_)));
    }

    #[test]
    fn test_missing_bundle_names_path() {
        let path = Path::new("/definitely/not/here/model.bin");
        let err = read_bundle(path).unwrap_err();
        assert!(matches!(err, GradeError::ModelFileMissing(_)));
        assert!(err.to_string().contains("/definitely/not/here/model.bin"));
    }
}
