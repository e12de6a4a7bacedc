use approx::assert_relative_eq;
use projcal::nalgebra::{Point3, Rotation3, Vector3};
use projcal::optimize::project_points;
use projcal::{
    solver_to_world, CalibrationPipeline, CalibrationSettings, CameraIntrinsics, CameraTransform,
    Distortion, LevenbergMarquardtSolver, Viewport,
};
use rand::{rngs::SmallRng, Rng, SeedableRng};

#[test]
fn synthetic_camera_is_recovered() {
    let _ = pretty_env_logger::try_init();
    let settings = CalibrationSettings::default().viewport(Viewport::new(1280, 800));
    let truth = CameraIntrinsics::new(640.0, 700.0, 650.0, 390.0);
    let rotation = Rotation3::from_euler_angles(0.08, -0.15, 0.04);
    let translation = Vector3::new(0.3, -0.25, 1.5);

    // Sample points in front of the camera, then carry them into the engine frame.
    let mut rng = SmallRng::seed_from_u64(42);
    let solver_points: Vec<Point3<f64>> = (0..12)
        .map(|_| {
            let depth = rng.gen_range(4.0..6.0);
            let camera = Vector3::new(
                rng.gen_range(-0.8..0.8) * depth,
                rng.gen_range(-0.45..0.45) * depth,
                depth,
            );
            Point3::from(rotation.inverse() * (camera - translation))
        })
        .collect();
    let world_points: Vec<Point3<f64>> = solver_points.iter().copied().map(solver_to_world).collect();
    let image_points = project_points(
        &solver_points,
        &rotation,
        &translation,
        &truth,
        &Distortion::zero(),
    );

    let pipeline = CalibrationPipeline::new(LevenbergMarquardtSolver::new(), settings);
    let calibration = pipeline.calibrate(&image_points, &world_points).unwrap();
    let solution = calibration.solution;

    assert_relative_eq!(solution.intrinsics.focals, truth.focals, epsilon = 1e-2);
    assert_relative_eq!(
        solution.intrinsics.principal_point,
        truth.principal_point,
        epsilon = 1e-2
    );
    assert_relative_eq!(solution.rotation, rotation.scaled_axis(), epsilon = 1e-6);
    assert_relative_eq!(solution.translation, translation, epsilon = 1e-5);
    assert!(calibration.reprojection_error < 1e-3);

    let expected = CameraTransform::from_vision_pose(&rotation, &translation);
    assert_relative_eq!(calibration.transform.position, expected.position, epsilon = 1e-5);
    assert_relative_eq!(
        calibration.transform.orientation.x,
        expected.orientation.x,
        epsilon = 1e-4
    );
    assert_relative_eq!(
        calibration.transform.orientation.y,
        expected.orientation.y,
        epsilon = 1e-4
    );
    assert_relative_eq!(
        calibration.transform.orientation.z,
        expected.orientation.z,
        epsilon = 1e-4
    );
}
