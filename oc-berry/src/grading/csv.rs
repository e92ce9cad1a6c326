//! 纹理描述子参数表的 csv 读取.
//!
//! 外部训练工具导出的表可能以逗号或分号分隔, 且可能带一行表头.
//! 数值解析不依赖系统 locale.

use std::fs;
use std::path::Path;

use crate::{GradeError, GradeResult};

/// 读取一张数值表.
///
/// 每行先按逗号切分并解析为 `f64`; 失败则改按分号重试. 第一行在两种
/// 分隔符下都解析失败时视作表头并跳过; 此后仍有解析失败的行则返回
/// [`GradeError::MalformedParameterRow`]. 文件不存在时返回
/// [`GradeError::ModelFileMissing`]. 空行被忽略.
pub fn read_csv_table(path: &Path) -> GradeResult<Vec<Vec<f64>>> {
    if !path.is_file() {
        return Err(GradeError::ModelFileMissing(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;

    let mut rows = Vec::new();
    let mut first_data_row = true;
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line) {
            Some(row) => {
                rows.push(row);
                first_data_row = false;
            }
            None if first_data_row => {
                // 表头只允许出现在最前面.
                first_data_row = false;
            }
            None => {
                return Err(GradeError::MalformedParameterRow(
                    lineno + 1,
                    line.to_string(),
                ));
            }
        }
    }
    Ok(rows)
}

/// 先按逗号、再按分号尝试解析一行.
fn parse_row(line: &str) -> Option<Vec<f64>> {
    split_parse(line, ',').or_else(|| split_parse(line, ';'))
}

fn split_parse(line: &str, sep: char) -> Option<Vec<f64>> {
    line.split(sep)
        .map(|field| field.trim().parse::<f64>().ok())
        .collect()
}

/// 纹理描述子的配置参数.
///
/// 本 crate 不实现描述子算法, 只负责把参数表传递给外部实现.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DescriptorParams {
    /// 小邻域半径.
    pub radius: usize,

    /// 大邻域半径.
    pub large_radius: usize,

    /// 邻域采样点个数.
    pub neighbours: usize,

    /// 局部窗口边长.
    pub window_size: usize,
}

impl DescriptorParams {
    /// 从参数表的第一行填充.
    ///
    /// 表为空或首行不足 4 列时返回 [`GradeError::MalformedParameterRow`].
    pub fn from_table(table: &[Vec<f64>]) -> GradeResult<Self> {
        let row = table
            .first()
            .filter(|row| row.len() >= 4)
            .ok_or_else(|| {
                GradeError::MalformedParameterRow(1, format!("{:?}", table.first()))
            })?;
        Ok(Self {
            radius: row[0] as usize,
            large_radius: row[1] as usize,
            neighbours: row[2] as usize,
            window_size: row[3] as usize,
        })
    }
}
