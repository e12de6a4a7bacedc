//! A [`CalibrationSolver`] built on Levenberg-Marquardt.
//!
//! Calibration runs in two stages. A linear estimate seeds the pose: a plane homography
//! when the world points are coplanar, a direct linear transform otherwise. The focal
//! lengths, principal point, rotation vector and translation are then refined together
//! by minimising the pixel reprojection error.
//!
//! A single plane leaves some of the intrinsics unobservable: along those directions
//! other cameras reproject the points just as well. For coplanar points the refinement
//! therefore carries a weak prior that holds the intrinsics at their starting values
//! wherever the points do not say otherwise.

mod initial_pose;
mod projection;
mod reprojection_problem;

pub use initial_pose::*;
pub use projection::*;
pub use reprojection_problem::*;

use levenberg_marquardt::LevenbergMarquardt;
use nalgebra::{Point2, Point3, Vector3};
use projcal_core::{
    CalibrationProblem, CalibrationResult, CalibrationSolver, CameraIntrinsics, Distortion,
    SolverError,
};

/// Smallest focal length, in pixels, accepted from the refinement.
pub const MINIMUM_FOCAL_LENGTH: f64 = 1e-6;

/// Single-view calibration by Levenberg-Marquardt.
///
/// Only pinhole calibration is supported: requests that leave distortion free are rejected
/// and the reported distortion is always zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevenbergMarquardtSolver {
    patience: usize,
    tolerance: f64,
    planar_prior: f64,
}

impl LevenbergMarquardtSolver {
    pub fn new() -> Self {
        Default::default()
    }

    /// Bounds the number of residual evaluations to `patience * (parameters + 1)`.
    ///
    /// Default: `100`
    pub fn patience(self, patience: usize) -> Self {
        Self { patience, ..self }
    }

    /// Relative tolerance on the cost reduction and on the parameter step.
    ///
    /// Default: `1e-12`
    pub fn tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    /// Weight, per pixel of focal length or principal point, of the pull toward the
    /// starting intrinsics when the world points are coplanar.
    ///
    /// Default: `1e-2`
    pub fn planar_prior(self, planar_prior: f64) -> Self {
        Self {
            planar_prior,
            ..self
        }
    }

    /// Where the refinement starts when no intrinsic guess should be used.
    ///
    /// `fx = fy = max(width, height)` with the principal point in the image center.
    pub fn default_intrinsics(problem: &CalibrationProblem<'_>) -> CameraIntrinsics {
        let size = problem.image_size.size();
        let focal = size.x.max(size.y);
        CameraIntrinsics::new(focal, focal, 0.5 * size.x, 0.5 * size.y)
    }

    fn check_inputs(problem: &CalibrationProblem<'_>) -> Result<(), SolverError> {
        let supplied = problem.world_points.len();
        match *problem.point_counts {
            [counted] if counted != supplied => {
                return Err(SolverError::PointCountMismatch { counted, supplied })
            }
            [_] => {}
            ref views => return Err(SolverError::UnsupportedViewCount(views.len())),
        }
        if problem.image_points.len() != supplied {
            return Err(SolverError::PointCountMismatch {
                counted: supplied,
                supplied: problem.image_points.len(),
            });
        }
        if !problem.flags.distortion_fixed() {
            return Err(SolverError::UnsupportedFlags(
                "distortion coefficients must be fixed at zero",
            ));
        }
        Ok(())
    }
}

impl Default for LevenbergMarquardtSolver {
    fn default() -> Self {
        Self {
            patience: 100,
            tolerance: 1e-12,
            planar_prior: 1e-2,
        }
    }
}

impl CalibrationSolver for LevenbergMarquardtSolver {
    fn calibrate(&self, problem: &CalibrationProblem<'_>) -> Result<CalibrationResult, SolverError> {
        Self::check_inputs(problem)?;

        let start = if problem.flags.use_intrinsic_guess {
            problem.intrinsic_guess
        } else {
            Self::default_intrinsics(problem)
        };
        let normalized: Vec<Point2<f64>> = problem
            .image_points
            .iter()
            .map(|&pixel| start.calibrate(pixel))
            .collect();
        let pose = initial_pose(problem.world_points, &normalized)?;

        let mut reprojection = ReprojectionProblem::new(
            problem.world_points,
            problem.image_points,
            start,
            pose.rotation.scaled_axis(),
            pose.translation,
        );
        if pose.planar {
            log::debug!("coplanar points, holding intrinsics near {:?}", start);
            reprojection = reprojection.with_intrinsic_prior(start, self.planar_prior);
        }
        let (refined, report) = LevenbergMarquardt::new()
            .with_patience(self.patience)
            .with_ftol(self.tolerance)
            .with_xtol(self.tolerance)
            .minimize(reprojection);

        if !report.termination.was_successful() {
            log::warn!(
                "refinement stopped after {} evaluations: {:?}",
                report.number_of_evaluations,
                report.termination
            );
            return Err(SolverError::DidNotConverge(format!("{:?}", report.termination)));
        }
        log::debug!(
            "refinement converged after {} evaluations ({:?}), cost {}",
            report.number_of_evaluations,
            report.termination,
            report.objective_function
        );

        let intrinsics = refined.intrinsics();
        let focals = intrinsics.focals;
        if !focals.iter().all(|f| f.is_finite() && f.abs() > MINIMUM_FOCAL_LENGTH) {
            return Err(SolverError::DegenerateResult("focal length collapsed"));
        }
        if !intrinsics.principal_point.coords.iter().all(|c| c.is_finite()) {
            return Err(SolverError::DegenerateResult("principal point is not finite"));
        }

        Ok(CalibrationResult {
            intrinsics,
            distortion: Distortion::zero(),
            rotation: refined.rotation(),
            translation: refined.translation(),
        })
    }

    fn project_points(
        &self,
        world_points: &[Point3<f64>],
        rotation: &Vector3<f64>,
        translation: &Vector3<f64>,
        intrinsics: &CameraIntrinsics,
        distortion: &Distortion,
    ) -> Vec<Point2<f64>> {
        projection::project_points(
            world_points,
            &self.rotation_matrix(rotation),
            translation,
            intrinsics,
            distortion,
        )
    }
}
