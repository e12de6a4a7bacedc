//! # `projcal`
//!
//! Aligns a virtual camera with a physical projector from a handful of manually paired
//! screen and world points.
//!
//! Given image points (pixels) and the world points they show, [`CalibrationPipeline`]
//! solves for the projector's intrinsics and pose and hands back what a renderer needs:
//! a [`CameraTransform`] (position and Euler angles), an off-axis [`ProjectionMatrix`],
//! and the RMS reprojection error in pixels. [`CorrespondenceSession`] wraps the pipeline
//! for interactive use, recording pairs one at a time and recalibrating as they change.
//!
//! All of the core types and frame conversions from `projcal-core` are re-exported at
//! the root of this crate. The solver lives in [`optimize`].
//!
//! ```no_run
//! use projcal::{CalibrationPipeline, CalibrationSettings, LevenbergMarquardtSolver};
//! use projcal::nalgebra::{Point2, Point3};
//!
//! # fn main() -> Result<(), projcal::CalibrationError> {
//! # let image_points: Vec<Point2<f64>> = vec![];
//! # let world_points: Vec<Point3<f64>> = vec![];
//! let pipeline = CalibrationPipeline::new(LevenbergMarquardtSolver::new(), CalibrationSettings::default());
//! let calibration = pipeline.calibrate(&image_points, &world_points)?;
//! println!("camera at {}", calibration.transform.position);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//! * [`optimize`] - the Levenberg-Marquardt calibration solver and its linear initialisation

mod pipeline;
mod reprojection;
mod session;
mod settings;

pub use pipeline::*;
pub use projcal_core::*;
pub use reprojection::*;
pub use session::*;
pub use settings::*;

pub use projcal_optimize::LevenbergMarquardtSolver;

/// Camera calibration solvers
pub mod optimize {
    pub use projcal_optimize::*;
}
