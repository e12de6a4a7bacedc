use itertools::Itertools;
use nalgebra::{Point2, Point3};
use projcal_core::{CalibrationResult, CalibrationSolver};

/// Root mean square of the pixel distances between paired points.
///
/// `sqrt((1/N) · Σ (Δx² + Δy²))`, every pair weighted equally. Empty input gives `0.0`.
pub fn rms_distance(observed: &[Point2<f64>], reprojected: &[Point2<f64>]) -> f64 {
    let (count, sum) = observed
        .iter()
        .zip(reprojected)
        .map(|(a, b)| (a - b).norm_squared())
        .fold((0usize, 0.0), |(count, sum), d2| (count + 1, sum + d2));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64).sqrt()
    }
}

/// Reprojects solver-frame world points with a calibration and measures the RMS error
/// against the observed image points.
pub fn rms_error<S: CalibrationSolver + ?Sized>(
    solver: &S,
    image_points: &[Point2<f64>],
    solver_world_points: &[Point3<f64>],
    result: &CalibrationResult,
) -> f64 {
    let reprojected = solver.project_points(
        solver_world_points,
        &result.rotation,
        &result.translation,
        &result.intrinsics,
        &result.distortion,
    );
    rms_distance(image_points, &reprojected)
}

/// The pixel distance of every pair, for spotting which correspondence is off.
pub fn residual_distances(observed: &[Point2<f64>], reprojected: &[Point2<f64>]) -> Vec<f64> {
    observed
        .iter()
        .zip(reprojected)
        .map(|(a, b)| (a - b).norm())
        .collect_vec()
}
