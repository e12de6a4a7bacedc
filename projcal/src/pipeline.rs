use crate::{rms_error, CalibrationSettings};
use itertools::Itertools;
use nalgebra::{Point2, Point3};
use projcal_core::{
    world_to_solver, CalibrationError, CalibrationFlags, CalibrationProblem, CalibrationResult,
    CalibrationSolver, CameraIntrinsics, CameraTransform, Frustum, ProjectionMatrix,
};

/// Everything a renderer needs from one calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Where to place the virtual camera.
    pub transform: CameraTransform,
    /// The off-axis projection for the virtual camera.
    pub projection: ProjectionMatrix,
    /// RMS distance in pixels between the observed and reprojected image points.
    pub reprojection_error: f64,
    /// The raw solver output, in the solver frame.
    pub solution: CalibrationResult,
}

/// Runs single-view calibration and converts the result for the renderer.
///
/// The pipeline holds no state between calls besides its solver and settings.
#[derive(Debug, Clone)]
pub struct CalibrationPipeline<S> {
    solver: S,
    settings: CalibrationSettings,
}

impl<S> CalibrationPipeline<S>
where
    S: CalibrationSolver,
{
    pub fn new(solver: S, settings: CalibrationSettings) -> Self {
        Self { solver, settings }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }

    /// The starting intrinsics, derived from the configured field of view and viewport.
    pub fn intrinsic_guess(&self) -> CameraIntrinsics {
        CameraIntrinsics::from_field_of_view(self.settings.field_of_view, self.settings.viewport)
    }

    /// Pinhole calibration refined from the intrinsic guess, distortion fixed at zero.
    pub fn flags(&self) -> CalibrationFlags {
        CalibrationFlags::pinhole_from_guess()
    }

    /// Calibrates from paired image points (pixels, top-left origin) and engine-frame
    /// world points.
    ///
    /// The caller is expected to have enforced its minimum number of correspondences.
    pub fn calibrate(
        &self,
        image_points: &[Point2<f64>],
        world_points: &[Point3<f64>],
    ) -> Result<Calibration, CalibrationError> {
        if image_points.len() != world_points.len() {
            return Err(CalibrationError::InputLengthMismatch {
                image: image_points.len(),
                world: world_points.len(),
            });
        }

        let solver_points = world_points.iter().copied().map(world_to_solver).collect_vec();
        let point_counts = [solver_points.len()];
        let problem = CalibrationProblem {
            world_points: &solver_points,
            image_points,
            point_counts: &point_counts,
            image_size: self.settings.viewport,
            intrinsic_guess: self.intrinsic_guess(),
            flags: self.flags(),
        };
        let solution = self.solver.calibrate(&problem)?;

        let rotation = self.solver.rotation_matrix(&solution.rotation);
        let transform = CameraTransform::from_vision_pose_with(
            &rotation,
            &solution.translation,
            &self.settings.euler_convention,
        );
        let projection = Frustum::from_intrinsics(
            &solution.intrinsics,
            self.settings.viewport,
            self.settings.clip_planes,
        )
        .projection_matrix();
        let reprojection_error = rms_error(&self.solver, image_points, &solver_points, &solution);

        Ok(Calibration {
            transform,
            projection,
            reprojection_error,
            solution,
        })
    }
}
