//! 组织表面检测.
//!
//! 将 (row, col) 成像平面划分为规则 tile 网格, 对每个 tile 沿深度方向
//! 求平均得到深度剖面, 再以阈值扫描确定表面深度; 对表面索引做最小二乘
//! 直线拟合, 得到样本的整体倾角, 用于旋转矫正与分区边界放置.

use itertools::Itertools;
use ndarray::{Array1, Array2, Array3};

use crate::consts::*;
use crate::fitting;
use crate::{Axis, GradeResult, Idx2d, RotateMode, VoiExtent, Volume};

mod window;

pub use window::{center_of_mass, surface_window};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use ndarray::Axis as NdAxis;
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 表面检测参数.
///
/// 该结构是只读的. 若要修改参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug)]
pub struct SurfaceConfig {
    /// 粗扫描时每个方向上的 tile 个数.
    pub n_tiles: usize,

    /// 粗扫描的基准阈值.
    pub base_threshold: f64,

    /// 粗扫描的阈值缩放系数. 实际阈值为 `base_threshold * threshold_mult`.
    pub threshold_mult: f64,

    /// 细扫描时单个 tile 的边长 (像素).
    pub fine_tile_edge: usize,

    /// 细扫描的组织阈值.
    pub fine_threshold: f64,

    /// 表面检测后深度方向裁剪边界的扩展量.
    pub depth_padding: usize,

    /// 倾角拟合时是否排除表面索引为 0 的纯背景 tile.
    ///
    /// 默认不排除: 原始行为对所有 tile 一视同仁. 若样本边缘存在大量
    /// 背景 tile, 可以打开该选项以免拟合被拉偏.
    pub exclude_empty_tiles: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            n_tiles: COARSE_TILES,
            base_threshold: COARSE_BASE_THRESHOLD,
            threshold_mult: COARSE_THRESHOLD_MULT,
            fine_tile_edge: FINE_TILE_EDGE,
            fine_threshold: FINE_THRESHOLD,
            depth_padding: DEPTH_PADDING,
            exclude_empty_tiles: false,
        }
    }
}

/// tile 均值剖面: 每个 tile 在每个深度上的平均灰度.
#[derive(Debug, Clone)]
pub struct TileProfile {
    /// 形状为 (tile 行数, tile 列数, 深度).
    tiles: Array3<f64>,

    /// 每个 tile 覆盖的 (行数, 列数).
    steps: Idx2d,
}

impl TileProfile {
    /// tile 网格的形状与深度.
    #[inline]
    pub fn shape(&self) -> crate::Idx3d {
        self.tiles.dim()
    }

    /// 每个 tile 覆盖的 (行数, 列数).
    #[inline]
    pub fn steps(&self) -> Idx2d {
        self.steps
    }

    /// 第 `(i, j)` 个 tile 在深度 `k` 上的平均灰度.
    #[inline]
    pub fn mean_at(&self, i: usize, j: usize, k: usize) -> f64 {
        self.tiles[(i, j, k)]
    }
}

/// 每个 tile 的表面深度索引.
///
/// 由阈值扫描产生, 供倾角拟合与分区边界放置消费.
#[derive(Debug, Clone)]
pub struct SurfaceMap {
    idx: Array2<usize>,
    steps: Idx2d,
}

impl SurfaceMap {
    /// tile 网格形状.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.idx.dim()
    }

    /// 第 `(i, j)` 个 tile 的表面深度.
    #[inline]
    pub fn index_at(&self, i: usize, j: usize) -> usize {
        self.idx[(i, j)]
    }

    /// 表面深度的最小值与最大值.
    pub fn minmax(&self) -> (usize, usize) {
        self.idx
            .iter()
            .copied()
            .minmax()
            .into_option()
            .expect("表面索引图非空")
    }

    /// 表面深度的均值与样本标准差.
    pub fn stats(&self) -> SurfaceStats {
        let n = self.idx.len() as f64;
        let mean = self.idx.iter().map(|&v| v as f64).sum::<f64>() / n;
        let std = if self.idx.len() > 1 {
            let ss = self
                .idx
                .iter()
                .map(|&v| {
                    let d = v as f64 - mean;
                    d * d
                })
                .sum::<f64>();
            (ss / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        SurfaceStats { mean, std }
    }
}

/// 表面深度的统计信息, 用于放置分区边界.
#[derive(Copy, Clone, Debug)]
pub struct SurfaceStats {
    /// 表面深度均值.
    pub mean: f64,

    /// 表面深度样本标准差.
    pub std: f64,
}

/// 样本表面的两个平面内倾角, 以度为单位.
#[derive(Copy, Clone, Debug)]
pub struct OrientationAngles {
    /// 沿行方向的倾角 (由 (行位置, 表面深度) 点列拟合).
    pub theta_row: f64,

    /// 沿列方向的倾角 (由 (列位置, 表面深度) 点列拟合).
    pub theta_col: f64,
}

/// 计算 tile 均值剖面.
///
/// 将 (row, col) 平面划分为 `n_tiles x n_tiles` 的网格 (维度不足时取
/// 维度本身), 对每个 tile 和每个深度求平均灰度. 各 tile 的输出互不相交,
/// 在 `rayon` feature 下按 tile 行并行.
pub fn average_tiles(vol: &Volume, n_tiles: usize) -> TileProfile {
    assert_ne!(n_tiles, 0, "tile 个数必须为正");
    let (r, c, d) = vol.shape();
    let n_r = n_tiles.min(r);
    let n_c = n_tiles.min(c);
    let step_r = r / n_r;
    let step_c = c / n_c;

    let mut tiles = Array3::<f64>::zeros((n_r, n_c, d));
    let data = vol.data();

    let fill_row = |i: usize, mut row: ndarray::ArrayViewMut2<f64>| {
        let npix = (step_r * step_c) as f64;
        for j in 0..n_c {
            let block = data.slice(ndarray::s![
                i * step_r..(i + 1) * step_r,
                j * step_c..(j + 1) * step_c,
                ..
            ]);
            let mut acc = Array1::<f64>::zeros(d);
            for ((_, _, k), &v) in block.indexed_iter() {
                acc[k] += v as f64;
            }
            for k in 0..d {
                row[(j, k)] = acc[k] / npix;
            }
        }
    };

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            tiles
                .axis_iter_mut(NdAxis(0))
                .into_par_iter()
                .enumerate()
                .for_each(|(i, row)| fill_row(i, row));
        } else {
            for (i, row) in tiles.axis_iter_mut(ndarray::Axis(0)).enumerate() {
                fill_row(i, row);
            }
        }
    }

    TileProfile {
        tiles,
        steps: (step_r, step_c),
    }
}

/// 从 tile 剖面中扫描表面深度.
///
/// 对每个 tile 从最深处向浅处扫描, 表面索引取平均灰度超过 `threshold`
/// 的最深深度; 整个剖面都不超过阈值的纯背景 tile 索引为 0 (非错误).
pub fn surface_from_tiles(profile: &TileProfile, threshold: f64) -> SurfaceMap {
    let (n_r, n_c, d) = profile.tiles.dim();
    let mut idx = Array2::<usize>::zeros((n_r, n_c));

    for ((i, j), out) in idx.indexed_iter_mut() {
        for k in (0..d).rev() {
            if profile.tiles[(i, j, k)] > threshold {
                *out = k;
                break;
            }
        }
    }

    SurfaceMap {
        idx,
        steps: profile.steps,
    }
}

/// 对表面索引图做两次独立的直线拟合, 得到两个方向上的倾角 (度).
///
/// 点列分别为 (列位置, 表面深度) 和 (行位置, 表面深度), 位置以 tile
/// 步长换算回像素坐标. 斜率分母加 [`SLOPE_EPS`] 保护竖直拟合.
/// `exclude_empty` 为真时跳过索引为 0 的 tile; 可用点不足两个时退化为 0 度.
pub fn tile_angles(map: &SurfaceMap, exclude_empty: bool) -> OrientationAngles {
    let (step_r, step_c) = map.steps;
    let mut xs_col = Vec::new();
    let mut xs_row = Vec::new();
    let mut ys = Vec::new();

    for ((i, j), &v) in map.idx.indexed_iter() {
        if exclude_empty && v == 0 {
            continue;
        }
        xs_col.push((j * step_c) as f64);
        xs_row.push((i * step_r) as f64);
        ys.push(v as f64);
    }

    if ys.len() < 2 {
        return OrientationAngles {
            theta_row: 0.0,
            theta_col: 0.0,
        };
    }

    let to_deg = |line: fitting::FittedLine<f64>| -> f64 {
        (line.vy / (line.vx + SLOPE_EPS)).atan().to_degrees()
    };

    let xs_col = Array1::from(xs_col);
    let xs_row = Array1::from(xs_row);
    let ys = Array1::from(ys);

    OrientationAngles {
        theta_col: to_deg(fitting::line_f64(xs_col.view(), ys.view())),
        theta_row: to_deg(fitting::line_f64(xs_row.view(), ys.view())),
    }
}

/// 表面检测的完整结果.
#[derive(Debug, Clone)]
pub struct BoneInterface {
    /// 旋转矫正后的表面 VOI, 分区提取在该数据上进行.
    pub voi: Volume,

    /// 细扫描得到的表面深度统计, 用于放置分区边界.
    pub stats: SurfaceStats,

    /// 矫正所用的倾角.
    pub angles: OrientationAngles,

    /// 细扫描的表面索引图.
    pub map: SurfaceMap,
}

impl BoneInterface {
    /// 将矫正后的 VOI 旋转回原始方位, 供渲染协作者使用.
    ///
    /// 逆变换按与正向相同的轴顺序施加相反角度.
    pub fn restore_orientation(&self) -> Volume {
        self.voi
            .rotate(-self.angles.theta_col, Axis::Row, RotateMode::Resample)
            .rotate(self.angles.theta_row, Axis::Col, RotateMode::Resample)
    }
}

/// 检测组织表面并做旋转矫正.
///
/// 步骤: 粗 tile 扫描定位表面 -> 深度方向按表面范围 (两侧各扩展
/// `depth_padding`, 钳制在原边界内) 裁剪 -> 按拟合倾角旋转矫正 ->
/// 细 tile 扫描得到精确的表面深度统计.
pub fn bone_interface(vol: &Volume, cfg: &SurfaceConfig) -> GradeResult<BoneInterface> {
    let (r, c, d) = vol.shape();

    // 粗扫描.
    let profile = average_tiles(vol, cfg.n_tiles);
    let coarse = surface_from_tiles(&profile, cfg.base_threshold * cfg.threshold_mult);
    let (min_idx, max_idx) = coarse.minmax();

    let ext = VoiExtent::new([
        0,
        r - 1,
        0,
        c - 1,
        min_idx.saturating_sub(cfg.depth_padding),
        (max_idx + cfg.depth_padding).min(d - 1),
    ])?;
    let cropped = vol.crop(&ext)?;

    // 旋转矫正. 符号不对称以保持与成像轴一致的右手系约定.
    let angles = tile_angles(&coarse, cfg.exclude_empty_tiles);
    let oriented = cropped
        .rotate(angles.theta_col, Axis::Row, RotateMode::Resample)
        .rotate(-angles.theta_row, Axis::Col, RotateMode::Resample);

    // 细扫描.
    let (or, oc, _) = oriented.shape();
    let n_fine = (or.min(oc) / cfg.fine_tile_edge).max(1);
    let fine_profile = average_tiles(&oriented, n_fine);
    let fine = surface_from_tiles(&fine_profile, cfg.fine_threshold);
    let stats = fine.stats();

    Ok(BoneInterface {
        voi: oriented,
        stats,
        angles,
        map: fine,
    })
}
