use levenberg_marquardt::LeastSquaresProblem;
use nalgebra::{
    dimension::{Const, Dynamic, U10},
    storage::Owned,
    DVector, Matrix2x3, Matrix3, OMatrix, Point2, Point3, Rotation3, SVector, Vector3, Vector4,
};
use projcal_core::CameraIntrinsics;

/// Below this rotation angle the left Jacobian uses its series expansion.
const SMALL_ANGLE: f64 = 1e-4;

/// The left Jacobian of SO(3) at the axis-angle vector `omega`.
///
/// Relates a change in `omega` to the equivalent small rotation applied on the left:
/// `exp(omega + δ) ≈ exp(J_l(omega) · δ) · exp(omega)`.
pub fn so3_left_jacobian(omega: &Vector3<f64>) -> Matrix3<f64> {
    let theta = omega.norm();
    let skew = omega.cross_matrix();
    if theta < SMALL_ANGLE {
        return Matrix3::identity() + skew * 0.5 + skew * skew / 6.0;
    }
    let theta2 = theta * theta;
    Matrix3::identity()
        + skew * ((1.0 - theta.cos()) / theta2)
        + skew * skew * ((theta - theta.sin()) / (theta2 * theta))
}

/// Pixel reprojection residuals of one view, as a function of
/// `[fx, fy, cx, cy, ωx, ωy, ωz, tx, ty, tz]`.
///
/// Distortion is not modelled here, it stays at zero.
///
/// With [`with_intrinsic_prior`](Self::with_intrinsic_prior) four more residuals,
/// `weight * (f - f_guess)` for each of fx, fy, cx and cy, follow the pixel residuals.
#[derive(Debug, Clone)]
pub struct ReprojectionProblem<'a> {
    world_points: &'a [Point3<f64>],
    image_points: &'a [Point2<f64>],
    intrinsics: CameraIntrinsics,
    rotation: Vector3<f64>,
    translation: Vector3<f64>,
    prior: Option<(Vector4<f64>, f64)>,
}

fn intrinsic_params(intrinsics: &CameraIntrinsics) -> Vector4<f64> {
    Vector4::new(
        intrinsics.fx(),
        intrinsics.fy(),
        intrinsics.cx(),
        intrinsics.cy(),
    )
}

impl<'a> ReprojectionProblem<'a> {
    pub fn new(
        world_points: &'a [Point3<f64>],
        image_points: &'a [Point2<f64>],
        intrinsics: CameraIntrinsics,
        rotation: Vector3<f64>,
        translation: Vector3<f64>,
    ) -> Self {
        Self {
            world_points,
            image_points,
            intrinsics,
            rotation,
            translation,
            prior: None,
        }
    }

    /// Pulls the intrinsics toward `guess` with the given weight per pixel.
    ///
    /// A single plane leaves some intrinsics unobservable, this keeps them at the guess.
    pub fn with_intrinsic_prior(self, guess: CameraIntrinsics, weight: f64) -> Self {
        Self {
            prior: Some((intrinsic_params(&guess), weight)),
            ..self
        }
    }

    fn residual_count(&self) -> usize {
        2 * self.world_points.len() + if self.prior.is_some() { 4 } else { 0 }
    }

    pub fn intrinsics(&self) -> CameraIntrinsics {
        self.intrinsics
    }

    /// The axis-angle rotation vector.
    pub fn rotation(&self) -> Vector3<f64> {
        self.rotation
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.translation
    }

    fn camera_points(&self) -> impl Iterator<Item = (Vector3<f64>, Vector3<f64>)> + '_ {
        let rotation = Rotation3::new(self.rotation);
        let translation = self.translation;
        self.world_points.iter().map(move |world| {
            let rotated = rotation * world.coords;
            (rotated, rotated + translation)
        })
    }
}

impl<'a> LeastSquaresProblem<f64, Dynamic, U10> for ReprojectionProblem<'a> {
    type ResidualStorage = Owned<f64, Dynamic>;
    type JacobianStorage = Owned<f64, Dynamic, U10>;
    type ParameterStorage = Owned<f64, U10>;

    fn set_params(&mut self, x: &SVector<f64, 10>) {
        self.intrinsics = CameraIntrinsics::new(x[0], x[1], x[2], x[3]);
        self.rotation = Vector3::new(x[4], x[5], x[6]);
        self.translation = Vector3::new(x[7], x[8], x[9]);
    }

    fn params(&self) -> SVector<f64, 10> {
        let CameraIntrinsics {
            focals,
            principal_point,
        } = self.intrinsics;
        SVector::<f64, 10>::from_column_slice(&[
            focals.x,
            focals.y,
            principal_point.x,
            principal_point.y,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
            self.translation.x,
            self.translation.y,
            self.translation.z,
        ])
    }

    /// Projected minus observed pixel coordinates, `u` and `v` interleaved per point.
    fn residuals(&self) -> Option<DVector<f64>> {
        let mut residuals = DVector::zeros(self.residual_count());
        for (i, ((_, camera), observed)) in self.camera_points().zip(self.image_points).enumerate() {
            let normalized = Point2::new(camera.x / camera.z, camera.y / camera.z);
            let projected = self.intrinsics.uncalibrate(normalized);
            residuals[2 * i] = projected.x - observed.x;
            residuals[2 * i + 1] = projected.y - observed.y;
        }
        if let Some((guess, weight)) = self.prior {
            let offset = 2 * self.world_points.len();
            residuals
                .fixed_rows_mut::<4>(offset)
                .copy_from(&((intrinsic_params(&self.intrinsics) - guess) * weight));
        }
        residuals.iter().all(|r| r.is_finite()).then(|| residuals)
    }

    fn jacobian(&self) -> Option<OMatrix<f64, Dynamic, U10>> {
        let mut jacobian = OMatrix::<f64, Dynamic, U10>::zeros_generic(
            Dynamic::new(self.residual_count()),
            Const::<10>,
        );
        let (fx, fy) = (self.intrinsics.fx(), self.intrinsics.fy());
        let left_jacobian = so3_left_jacobian(&self.rotation);

        for (i, (rotated, camera)) in self.camera_points().enumerate() {
            let inv_z = camera.z.recip();
            let (x, y) = (camera.x * inv_z, camera.y * inv_z);

            // d(u, v) / d(camera point)
            #[rustfmt::skip]
            let d_pixel_d_camera = Matrix2x3::new(
                fx * inv_z, 0.0,        -fx * x * inv_z,
                0.0,        fy * inv_z, -fy * y * inv_z,
            );
            let d_camera_d_rotation = -rotated.cross_matrix() * left_jacobian;
            let d_pixel_d_rotation = d_pixel_d_camera * d_camera_d_rotation;

            let (u, v) = (2 * i, 2 * i + 1);
            jacobian[(u, 0)] = x;
            jacobian[(u, 2)] = 1.0;
            jacobian[(v, 1)] = y;
            jacobian[(v, 3)] = 1.0;
            jacobian
                .fixed_slice_mut::<2, 3>(u, 4)
                .copy_from(&d_pixel_d_rotation);
            jacobian
                .fixed_slice_mut::<2, 3>(u, 7)
                .copy_from(&d_pixel_d_camera);
        }
        if let Some((_, weight)) = self.prior {
            let offset = 2 * self.world_points.len();
            for k in 0..4 {
                jacobian[(offset + k, k)] = weight;
            }
        }

        jacobian.iter().all(|j| j.is_finite()).then(|| jacobian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use levenberg_marquardt::differentiate_numerically;

    fn world() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.1, 0.2, 0.3),
            Point3::new(-0.5, 0.4, -0.2),
            Point3::new(0.7, -0.3, 0.1),
            Point3::new(-0.2, -0.6, 0.5),
        ]
    }

    fn image() -> Vec<Point2<f64>> {
        vec![
            Point2::new(600.0, 350.0),
            Point2::new(500.0, 420.0),
            Point2::new(700.0, 300.0),
            Point2::new(580.0, 250.0),
        ]
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let world = world();
        let image = image();
        let mut problem = ReprojectionProblem::new(
            &world,
            &image,
            CameraIntrinsics::new(820.0, 790.0, 630.0, 370.0),
            Vector3::new(0.3, -0.4, 0.2),
            Vector3::new(0.1, -0.2, 4.0),
        );
        let numerical = differentiate_numerically(&mut problem).unwrap();
        let analytical = problem.jacobian().unwrap();
        assert_relative_eq!(analytical, numerical, epsilon = 1e-4, max_relative = 1e-5);
    }

    #[test]
    fn jacobian_matches_finite_differences_near_identity() {
        let world = world();
        let image = image();
        let mut problem = ReprojectionProblem::new(
            &world,
            &image,
            CameraIntrinsics::new(820.0, 790.0, 630.0, 370.0),
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, 3.0),
        );
        let numerical = differentiate_numerically(&mut problem).unwrap();
        let analytical = problem.jacobian().unwrap();
        assert_relative_eq!(analytical, numerical, epsilon = 1e-4, max_relative = 1e-5);
    }

    #[test]
    fn jacobian_with_prior_matches_finite_differences() {
        let world = world();
        let image = image();
        let mut problem = ReprojectionProblem::new(
            &world,
            &image,
            CameraIntrinsics::new(820.0, 790.0, 630.0, 370.0),
            Vector3::new(-0.1, 0.25, 0.05),
            Vector3::new(0.3, 0.1, 5.0),
        )
        .with_intrinsic_prior(CameraIntrinsics::new(800.0, 800.0, 640.0, 360.0), 0.5);
        let numerical = differentiate_numerically(&mut problem).unwrap();
        let analytical = problem.jacobian().unwrap();
        assert_eq!(analytical.nrows(), 2 * world.len() + 4);
        assert_relative_eq!(analytical, numerical, epsilon = 1e-4, max_relative = 1e-5);
    }

    #[test]
    fn prior_residuals_measure_distance_from_the_guess() {
        let world = world();
        let image = image();
        let guess = CameraIntrinsics::new(800.0, 800.0, 640.0, 360.0);
        let problem = ReprojectionProblem::new(
            &world,
            &image,
            CameraIntrinsics::new(810.0, 795.0, 640.0, 362.0),
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, 3.0),
        )
        .with_intrinsic_prior(guess, 0.1);
        let residuals = problem.residuals().unwrap();
        assert_relative_eq!(
            residuals.rows(2 * world.len(), 4).into_owned(),
            DVector::from_column_slice(&[1.0, -0.5, 0.0, 0.2]),
            epsilon = 1e-12
        );
    }

    #[test]
    fn params_round_trip_through_set_params() {
        let world = world();
        let image = image();
        let mut problem = ReprojectionProblem::new(
            &world,
            &image,
            CameraIntrinsics::new(1.0, 2.0, 3.0, 4.0),
            Vector3::new(5.0, 6.0, 7.0),
            Vector3::new(8.0, 9.0, 10.0),
        );
        let params = problem.params();
        assert_eq!(params[0], 1.0);
        assert_eq!(params[9], 10.0);
        problem.set_params(&(params * 2.0));
        assert_eq!(problem.intrinsics(), CameraIntrinsics::new(2.0, 4.0, 6.0, 8.0));
        assert_eq!(problem.rotation(), Vector3::new(10.0, 12.0, 14.0));
        assert_eq!(problem.translation(), Vector3::new(16.0, 18.0, 20.0));
    }

    #[test]
    fn points_on_the_camera_plane_have_no_residuals() {
        let world = vec![Point3::new(1.0, 1.0, 0.0)];
        let image = vec![Point2::origin()];
        let problem = ReprojectionProblem::new(
            &world,
            &image,
            CameraIntrinsics::new(800.0, 800.0, 400.0, 300.0),
            Vector3::zeros(),
            Vector3::zeros(),
        );
        assert!(problem.residuals().is_none());
    }

    #[test]
    fn left_jacobian_series_is_continuous() {
        let axis = Vector3::new(1.0, -2.0, 0.5).normalize();
        let below = axis * (SMALL_ANGLE * 0.999);
        let above = axis * (SMALL_ANGLE * 1.001);
        assert_relative_eq!(
            so3_left_jacobian(&below),
            so3_left_jacobian(&above),
            epsilon = 1e-6
        );
    }

    #[test]
    fn left_jacobian_of_zero_is_identity() {
        assert_eq!(so3_left_jacobian(&Vector3::zeros()), Matrix3::identity());
    }
}
