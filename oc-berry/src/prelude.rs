//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::{GradeError, GradeResult};

pub use crate::volume::{Axis, RotateMode, VoiExtent, Volume};

pub use crate::surface::{
    bone_interface, BoneInterface, OrientationAngles, SurfaceConfig, SurfaceMap, SurfaceStats,
};

pub use crate::zones::{Zone, ZoneSpec, ZoneSpecs, Zones};

pub use crate::projection::{reduce, subtract_mean, ProjectionPair};

pub use crate::grading::{DescriptorParams, GradingModel, ModelBundle, SampleGrade};

pub use crate::pipeline::{self, TextureDescriptor};

pub use crate::consts::{
    COARSE_BASE_THRESHOLD, COARSE_THRESHOLD_MULT, COARSE_TILES, DEPTH_PADDING, FINE_THRESHOLD,
    FINE_TILE_EDGE,
};
