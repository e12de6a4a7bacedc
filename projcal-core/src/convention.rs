//! Single-owner conversions between the engine, solver and renderer frames.
//!
//! Each function here crosses exactly one convention boundary. Apply each once.

use crate::Viewport;
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3, Vector4};

/// Moves an engine (left-handed) world point into the solver's right-handed frame.
///
/// This negates Z. It must be applied exactly once to every world point handed to the solver.
pub fn world_to_solver(point: Point3<f64>) -> Point3<f64> {
    Point3::new(point.x, point.y, -point.z)
}

/// Moves a solver-frame world point back into the engine frame.
pub fn solver_to_world(point: Point3<f64>) -> Point3<f64> {
    Point3::new(point.x, point.y, -point.z)
}

/// The reflection `diag(1, 1, -1)` that undoes [`world_to_solver`] on a rotation.
pub fn left_handed_reflection() -> Matrix3<f64> {
    Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0))
}

/// Converts a solver rotation into the left-handed frame: `R · diag(1, 1, -1)`.
///
/// The result is orthonormal but no longer a proper rotation (its determinant is -1).
pub fn reflect_to_left_handed(rotation: &Matrix3<f64>) -> Matrix3<f64> {
    rotation * left_handed_reflection()
}

/// Inverts an orthonormal matrix by transposing it.
pub fn orthonormal_inverse(matrix: &Matrix3<f64>) -> Matrix3<f64> {
    matrix.transpose()
}

/// The camera position `-(R⁻¹ · t)` given the inverted world rotation and the solver translation.
pub fn camera_position(inverse_rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> Vector3<f64> {
    -(inverse_rotation * translation)
}

/// The fixed Y flip `diag(1, -1, 1, 1)` between the solver's image frame and the renderer's.
pub fn y_flip() -> Matrix4<f32> {
    Matrix4::from_diagonal(&Vector4::new(1.0, -1.0, 1.0, 1.0))
}

/// Left-multiplies a matrix by [`y_flip`].
pub fn flip_y(matrix: &Matrix4<f32>) -> Matrix4<f32> {
    y_flip() * matrix
}

/// Converts a bottom-left-origin screen position into a top-left-origin image point.
pub fn screen_to_image(screen: Point2<f64>, viewport: Viewport) -> Point2<f64> {
    Point2::new(screen.x, f64::from(viewport.height) - screen.y)
}
