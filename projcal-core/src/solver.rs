use crate::{CalibrationResult, CameraIntrinsics, Distortion, SolverError, Viewport};
use nalgebra::{Point2, Point3, Rotation3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Constraints on the parameters a solver may refine.
///
/// Intrinsics (fx, fy, cx, cy) are always free. These flags only control where they
/// start and how distortion is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CalibrationFlags {
    /// Tangential distortion (p1, p2) is fixed at zero.
    pub zero_tangential_distortion: bool,
    /// Start from the supplied intrinsic guess instead of one derived from the image size.
    pub use_intrinsic_guess: bool,
    /// Radial distortion coefficients are fixed at zero.
    pub fix_radial_distortion: bool,
}

impl CalibrationFlags {
    /// Zero distortion, refining intrinsics from the supplied guess.
    pub fn pinhole_from_guess() -> Self {
        Self {
            zero_tangential_distortion: true,
            use_intrinsic_guess: true,
            fix_radial_distortion: true,
        }
    }

    /// True when no distortion coefficient is free.
    pub fn distortion_fixed(&self) -> bool {
        self.zero_tangential_distortion && self.fix_radial_distortion
    }
}

/// Everything a solver needs for one calibration call.
///
/// `world_points` are already in the solver frame. `point_counts` holds the number of
/// points in each view and must describe exactly the supplied points.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationProblem<'a> {
    pub world_points: &'a [Point3<f64>],
    pub image_points: &'a [Point2<f64>],
    pub point_counts: &'a [usize],
    pub image_size: Viewport,
    pub intrinsic_guess: CameraIntrinsics,
    pub flags: CalibrationFlags,
}

/// A nonlinear single-view camera calibration backend.
///
/// Implementations are treated as blocking and non-reentrant.
pub trait CalibrationSolver {
    /// Refines intrinsics and pose so that the world points reproject onto the image points.
    fn calibrate(&self, problem: &CalibrationProblem<'_>) -> Result<CalibrationResult, SolverError>;

    /// Projects solver-frame world points into the image with the given parameters.
    fn project_points(
        &self,
        world_points: &[Point3<f64>],
        rotation: &Vector3<f64>,
        translation: &Vector3<f64>,
        intrinsics: &CameraIntrinsics,
        distortion: &Distortion,
    ) -> Vec<Point2<f64>>;

    /// Expands an axis-angle vector into a rotation matrix (Rodrigues).
    fn rotation_matrix(&self, rotation: &Vector3<f64>) -> Rotation3<f64> {
        Rotation3::new(*rotation)
    }
}
