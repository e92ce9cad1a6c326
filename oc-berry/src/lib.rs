#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供骨软骨 (osteochondral) 样本 µCT 重建体数据的结构化表示
//! 和自动 OA (osteoarthritis) 分级流水线的基础算法.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 输入为外部协作者按照深度升序提供的 2D 切片栈, 所有切片形状必须一致.
//!    磁盘上的图像解码 (PNG/JPEG/BMP) 不属于本 crate 的职责.
//! 2. 索引越界等编程缺陷会直接 panic, 而不会导致内存错误; 结构性
//!    契约违规 (非法 extent, 特征维度不匹配等) 以 [`GradeError`] 返回.
//!
//! # 流水线
//!
//! ### 体数据抽象 ✅
//!
//! 切片提取, 裁剪与旋转重采样. 实现位于 `oc-berry/src/volume`.
//!
//! ### 表面检测 ✅
//!
//! tile 均值剖面 + 阈值扫描定位组织表面, 最小二乘直线拟合估计表面倾角,
//! 粗扫描 -> 旋转矫正 -> 细扫描. 实现位于 `oc-berry/src/surface`.
//!
//! ### 分区 VOI 提取 ✅
//!
//! 按相对表面的深度偏移提取 surface / deep / calcified 三个分区.
//! 实现位于 `oc-berry/src/zones.rs`.
//!
//! ### 均值 / 标准差投影 ✅
//!
//! 沿深度轴把 VOI 压缩为两张 2D 图像, 只统计组织阈值以上的体素.
//! 实现位于 `oc-berry/src/projection.rs`.
//!
//! ### PCA + 线性回归分级 ✅
//!
//! 预训练模型的加载 (bincode 参数包 + csv 参数表) 与应用.
//! 实现位于 `oc-berry/src/grading`.
//!
//! ### 显式流水线状态 ✅
//!
//! 各阶段以不可变值传递, 所有权随阶段边界转移.
//! 实现位于 `oc-berry/src/pipeline.rs`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

pub mod consts;

mod error;

pub use error::{GradeError, GradeResult};

/// 体数据基础结构.
mod volume;

pub use volume::{Axis, RotateMode, VoiExtent, Volume};

pub mod fitting;

pub mod surface;

pub mod zones;

pub mod projection;

pub mod grading;

pub mod pipeline;

pub mod prelude;
