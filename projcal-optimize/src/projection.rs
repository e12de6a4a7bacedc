use projcal_core::{CameraIntrinsics, Distortion};
use nalgebra::{Point2, Point3, Rotation3, Vector3};

/// Applies `(k1, k2, p1, p2)` distortion to a point on the normalized image plane.
pub fn distort(normalized: Point2<f64>, distortion: &Distortion) -> Point2<f64> {
    let [k1, k2, p1, p2] = distortion.0;
    let (x, y) = (normalized.x, normalized.y);
    let r2 = x * x + y * y;
    let radial = 1.0 + k1 * r2 + k2 * r2 * r2;
    Point2::new(
        x * radial + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x),
        y * radial + p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y,
    )
}

/// Projects a single camera-space point to pixels.
///
/// Points on the camera plane (`z == 0`) come back non-finite.
pub fn project_camera_point(
    camera: &Vector3<f64>,
    intrinsics: &CameraIntrinsics,
    distortion: &Distortion,
) -> Point2<f64> {
    let normalized = Point2::new(camera.x / camera.z, camera.y / camera.z);
    let normalized = if distortion.is_zero() {
        normalized
    } else {
        distort(normalized, distortion)
    };
    intrinsics.uncalibrate(normalized)
}

/// Projects world points through `X_c = R · X_w + t` and the camera model.
pub fn project_points(
    world_points: &[Point3<f64>],
    rotation: &Rotation3<f64>,
    translation: &Vector3<f64>,
    intrinsics: &CameraIntrinsics,
    distortion: &Distortion,
) -> Vec<Point2<f64>> {
    world_points
        .iter()
        .map(|world| {
            let camera = rotation * world.coords + translation;
            project_camera_point(&camera, intrinsics, distortion)
        })
        .collect()
}
