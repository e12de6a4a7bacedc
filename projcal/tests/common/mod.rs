#![allow(dead_code)]

use projcal::nalgebra::{Point2, Point3, Rotation3, Vector3};
use projcal::optimize::project_points;
use projcal::{
    CalibrationFlags, CalibrationProblem, CalibrationResult, CalibrationSolver, CameraIntrinsics,
    Distortion, SolverError, Viewport,
};
use std::cell::{Cell, RefCell};

/// An owned copy of the last problem a [`ScriptedSolver`] was asked to solve.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedProblem {
    pub world_points: Vec<Point3<f64>>,
    pub image_points: Vec<Point2<f64>>,
    pub point_counts: Vec<usize>,
    pub image_size: Viewport,
    pub intrinsic_guess: CameraIntrinsics,
    pub flags: CalibrationFlags,
}

/// Returns a fixed outcome and records what it was asked.
pub struct ScriptedSolver {
    pub outcome: RefCell<Result<CalibrationResult, SolverError>>,
    pub calls: Cell<usize>,
    pub last_problem: RefCell<Option<CapturedProblem>>,
}

impl ScriptedSolver {
    pub fn new(outcome: Result<CalibrationResult, SolverError>) -> Self {
        Self {
            outcome: RefCell::new(outcome),
            calls: Cell::new(0),
            last_problem: RefCell::new(None),
        }
    }

    pub fn captured(&self) -> Option<CapturedProblem> {
        self.last_problem.borrow().clone()
    }
}

impl CalibrationSolver for ScriptedSolver {
    fn calibrate(&self, problem: &CalibrationProblem<'_>) -> Result<CalibrationResult, SolverError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_problem.borrow_mut() = Some(CapturedProblem {
            world_points: problem.world_points.to_vec(),
            image_points: problem.image_points.to_vec(),
            point_counts: problem.point_counts.to_vec(),
            image_size: problem.image_size,
            intrinsic_guess: problem.intrinsic_guess,
            flags: problem.flags,
        });
        self.outcome.borrow().clone()
    }

    fn project_points(
        &self,
        world_points: &[Point3<f64>],
        rotation: &Vector3<f64>,
        translation: &Vector3<f64>,
        intrinsics: &CameraIntrinsics,
        distortion: &Distortion,
    ) -> Vec<Point2<f64>> {
        project_points(
            world_points,
            &Rotation3::new(*rotation),
            translation,
            intrinsics,
            distortion,
        )
    }
}

/// A camera looking down the solver's +Z axis from `(0, 0, -distance)`.
pub fn facing_result(intrinsics: CameraIntrinsics, distance: f64) -> CalibrationResult {
    CalibrationResult {
        intrinsics,
        distortion: Distortion::zero(),
        rotation: Vector3::zeros(),
        translation: Vector3::new(0.0, 0.0, distance),
    }
}

/// Engine-frame points on a grid three wide with a spacing of 0.5, every other one raised to `z = 0.25`.
pub fn engine_points(count: usize) -> Vec<Point3<f64>> {
    (0..count)
        .map(|i| {
            let (row, column) = (i / 3, i % 3);
            Point3::new(
                column as f64 * 0.5 - 0.5,
                row as f64 * 0.5 - 0.5,
                0.25 * (i % 2) as f64,
            )
        })
        .collect()
}
