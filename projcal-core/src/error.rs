use thiserror::Error;

/// Failures reported by a [`CalibrationSolver`](crate::CalibrationSolver).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// Not enough correspondences to initialise the pose.
    #[error("need at least {required} point correspondences, got {found}")]
    NotEnoughPoints { found: usize, required: usize },
    /// The per-view point counts do not add up to the number of points supplied.
    #[error("point counts sum to {counted} but {supplied} points were supplied")]
    PointCountMismatch { counted: usize, supplied: usize },
    /// Only a single view can be calibrated.
    #[error("expected exactly one view, got {0}")]
    UnsupportedViewCount(usize),
    /// The requested flags ask for something the solver does not model.
    #[error("unsupported calibration flags: {0}")]
    UnsupportedFlags(&'static str),
    /// The correspondences do not constrain a pose (collinear points, singular systems).
    #[error("degenerate point configuration: {0}")]
    DegenerateConfiguration(&'static str),
    /// The nonlinear refinement terminated without converging.
    #[error("calibration did not converge: {0}")]
    DidNotConverge(String),
    /// The refinement converged to a result that cannot describe a camera.
    #[error("calibration produced a degenerate camera: {0}")]
    DegenerateResult(&'static str),
}

/// Failures surfaced by calibration as a whole.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// The image and world point sequences must pair up one to one.
    #[error("got {image} image points but {world} world points")]
    InputLengthMismatch { image: usize, world: usize },
    /// Fewer correspondences than the configured minimum.
    #[error("need at least {required} correspondences before calibrating, got {found}")]
    InsufficientCorrespondences { found: usize, required: usize },
    /// The solver failed. No partial result is available.
    #[error("calibration failed: {0}")]
    CalibrationFailed(#[from] SolverError),
    /// An angle wrap window whose span is not a full turn.
    #[error("angle wrap window [{lower}, {upper}) does not span a full turn")]
    AngleWrapWindow { lower: f64, upper: f64 },
}
