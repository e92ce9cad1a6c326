//! 运行时错误.

use std::fmt;
use std::path::PathBuf;

/// 分级流水线的运行时错误.
///
/// 结构性契约违规 (非法 axis / extent, 特征维度不匹配) 代表编程或配置缺陷,
/// 调用方不应重试. [`GradeError::ModelFileMissing`] 面向用户, 其消息必须
/// 指明缺失的文件.
#[derive(Debug)]
pub enum GradeError {
    /// 数值形式的 axis 不在 0..=2 范围内.
    InvalidAxis(usize),

    /// extent 不满足 min <= max, 或超出体数据边界.
    ///
    /// 两个参数分别为请求的 extent 六元组和体数据形状
    /// (校验发生在裁剪之前时, 形状未知, 为 `None`).
    InvalidExtent([usize; 6], Option<crate::Idx3d>),

    /// 分区深度范围在裁剪钳制后完全落在体数据之外.
    ///
    /// 两个参数分别为计算出的分区起始深度和体数据深度.
    ZoneOutOfBounds(usize, usize),

    /// 特征向量长度与模型的特征维度不一致. 格式: (期望, 实际).
    DimensionMismatch(usize, usize),

    /// 模型参数文件缺失.
    ModelFileMissing(PathBuf),

    /// 模型参数包内部维度不一致 (例如保留主成分个数超过特征向量列数).
    ///
    /// 参数为指明不一致字段的描述.
    InconsistentBundle(String),

    /// 在模型加载前调用了 `predict`.
    ModelNotLoaded,

    /// csv 参数表中存在既不是逗号分隔、也不是分号分隔数值的行.
    ///
    /// 两个参数分别为行号 (从 1 开始) 和行内容.
    MalformedParameterRow(usize, String),

    /// 其它 IO 错误.
    Io(std::io::Error),
}

impl fmt::Display for GradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAxis(n) => {
                write!(f, "invalid axis {n}, give an axis between 0 and 2")
            }
            Self::InvalidExtent(ext, shape) => {
                write!(f, "invalid extent {ext:?}")?;
                if let Some(shape) = shape {
                    write!(f, " for volume of shape {shape:?}")?;
                }
                Ok(())
            }
            Self::ZoneOutOfBounds(start, depth) => {
                write!(
                    f,
                    "zone starting at depth {start} lies outside the volume (depth {depth})"
                )
            }
            Self::DimensionMismatch(expected, got) => {
                write!(
                    f,
                    "feature vector has {got} elements, model expects {expected}"
                )
            }
            Self::ModelFileMissing(path) => {
                write!(
                    f,
                    "could not find model file {}! Check that the model is on the correct folder.",
                    path.display()
                )
            }
            Self::InconsistentBundle(what) => {
                write!(f, "inconsistent model bundle: {what}")
            }
            Self::ModelNotLoaded => write!(f, "grading model has not been loaded"),
            Self::MalformedParameterRow(line, content) => {
                write!(f, "malformed parameter row {line}: {content:?}")
            }
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for GradeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GradeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// 本 crate 的通用结果类型.
pub type GradeResult<T> = Result<T, GradeError>;
