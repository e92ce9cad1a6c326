//! 通用常量.

/// 粗表面扫描的基准阈值.
pub const COARSE_BASE_THRESHOLD: f64 = 70.0;

/// 粗表面扫描的阈值缩放系数.
pub const COARSE_THRESHOLD_MULT: f64 = 0.05;

/// 细表面扫描的组织阈值.
pub const FINE_THRESHOLD: f64 = 80.0;

/// 粗扫描时, (row, col) 平面每个方向上的 tile 个数.
pub const COARSE_TILES: usize = 16;

/// 细扫描时, 单个 tile 的边长 (以像素为单位).
pub const FINE_TILE_EDGE: usize = 25;

/// 表面检测后, 在深度方向向两侧扩展裁剪边界的体素个数.
pub const DEPTH_PADDING: usize = 50;

/// 直线拟合斜率分母上的保护项, 避免竖直方向拟合时除零.
pub const SLOPE_EPS: f64 = 1e-9;
