//! Linear pose estimates used to seed the nonlinear refinement.
//!
//! Both estimators work on normalized image coordinates, i.e. pixels already mapped
//! through the inverse of the intrinsic guess.

use float_ord::FloatOrd;
use itertools::Itertools;
use nalgebra::{DMatrix, DVector, Matrix3, Matrix3x4, Point2, Point3, Rotation3, Vector3};
use projcal_core::SolverError;

/// Ratio of the smallest to the largest principal spread below which points are treated as
/// lying on a plane (or, for the second axis, on a line).
pub const PLANARITY_TOLERANCE: f64 = 1e-6;

/// Enough points for the non-planar DLT, and enough residuals for 10 parameters.
pub const MINIMUM_POINTS: usize = 6;

const SVD_FAILED: SolverError = SolverError::DegenerateConfiguration("singular value decomposition failed");

/// A world-to-camera pose: `X_c = rotation · X_w + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialPose {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
    pub planar: bool,
}

/// Principal axes of a point cloud, strongest spread first.
struct PrincipalAxes {
    centroid: Point3<f64>,
    axes: [Vector3<f64>; 3],
    spreads: [f64; 3],
}

impl PrincipalAxes {
    fn new(points: &[Point3<f64>]) -> Self {
        let centroid = Point3::from(
            points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / points.len() as f64,
        );
        let scatter = points
            .iter()
            .map(|p| {
                let d = p - centroid;
                d * d.transpose()
            })
            .fold(Matrix3::zeros(), |acc, m| acc + m);
        let eigen = scatter.symmetric_eigen();
        let order = (0..3)
            .sorted_by_key(|&i| FloatOrd(-eigen.eigenvalues[i]))
            .collect_vec();
        let spread = |i: usize| eigen.eigenvalues[order[i]].max(0.0).sqrt();
        let axis = |i: usize| eigen.eigenvectors.column(order[i]).into_owned();
        Self {
            centroid,
            axes: [axis(0), axis(1), axis(2)],
            spreads: [spread(0), spread(1), spread(2)],
        }
    }

    fn is_collinear(&self) -> bool {
        self.spreads[1] <= PLANARITY_TOLERANCE * self.spreads[0]
    }

    fn is_planar(&self) -> bool {
        self.spreads[2] <= PLANARITY_TOLERANCE * self.spreads[0]
    }

    /// Rows `e1, e2, e1 × e2`, a proper rotation taking the plane onto `z = 0`.
    fn plane_basis(&self) -> Matrix3<f64> {
        let [e1, e2, _] = self.axes;
        Matrix3::from_rows(&[e1.transpose(), e2.transpose(), e1.cross(&e2).transpose()])
    }
}

/// Estimates a pose from world points and their normalized image projections.
///
/// Coplanar points go through a plane homography, anything else through a direct
/// linear transform on `[R|t]`.
pub fn initial_pose(
    world_points: &[Point3<f64>],
    normalized_image_points: &[Point2<f64>],
) -> Result<InitialPose, SolverError> {
    if world_points.len() < MINIMUM_POINTS {
        return Err(SolverError::NotEnoughPoints {
            found: world_points.len(),
            required: MINIMUM_POINTS,
        });
    }
    let axes = PrincipalAxes::new(world_points);
    if axes.spreads[0] <= f64::EPSILON {
        return Err(SolverError::DegenerateConfiguration("world points coincide"));
    }
    if axes.is_collinear() {
        return Err(SolverError::DegenerateConfiguration("world points are collinear"));
    }

    let planar = axes.is_planar();
    let (rotation, translation) = if planar {
        log::debug!("initialising pose from a plane homography");
        planar_pose(world_points, normalized_image_points, &axes)?
    } else {
        log::debug!("initialising pose from a direct linear transform");
        dlt_pose(world_points, normalized_image_points, axes.centroid)?
    };
    Ok(InitialPose {
        rotation,
        translation,
        planar,
    })
}

/// The right singular vector of the smallest singular value.
///
/// Rows are zero-padded up to the column count so the decomposition yields a full `V`.
fn null_vector(a: DMatrix<f64>) -> Option<DVector<f64>> {
    let columns = a.ncols();
    let a = if a.nrows() < columns {
        a.resize_vertically(columns, 0.0)
    } else {
        a
    };
    let svd = a.svd(false, true);
    let (smallest, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by_key(|&(_, &value)| FloatOrd(value))?;
    let v_t = svd.v_t?;
    Some(v_t.row(smallest).transpose())
}

/// Projects a near-rotation onto SO(3).
fn nearest_rotation(m: &Matrix3<f64>) -> Result<Rotation3<f64>, SolverError> {
    let svd = m.svd(true, true);
    let u = svd.u.ok_or(SVD_FAILED)?;
    let v_t = svd.v_t.ok_or(SVD_FAILED)?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u = u;
        u.column_mut(2).neg_mut();
        r = u * v_t;
    }
    Ok(Rotation3::from_matrix_unchecked(r))
}

/// Fits `H` with `image ~ H · plane` by the direct linear transform.
fn fit_homography(plane: &[Point2<f64>], image: &[Point2<f64>]) -> Result<Matrix3<f64>, SolverError> {
    let mut a = DMatrix::zeros(2 * plane.len(), 9);
    for (i, (p, m)) in plane.iter().zip(image).enumerate() {
        let (x, y, u, v) = (p.x, p.y, m.x, m.y);
        let r = 2 * i;
        a[(r, 0)] = -x;
        a[(r, 1)] = -y;
        a[(r, 2)] = -1.0;
        a[(r, 6)] = u * x;
        a[(r, 7)] = u * y;
        a[(r, 8)] = u;
        a[(r + 1, 3)] = -x;
        a[(r + 1, 4)] = -y;
        a[(r + 1, 5)] = -1.0;
        a[(r + 1, 6)] = v * x;
        a[(r + 1, 7)] = v * y;
        a[(r + 1, 8)] = v;
    }
    let h = null_vector(a).ok_or(SVD_FAILED)?;
    Ok(Matrix3::from_row_slice(h.as_slice()))
}

fn planar_pose(
    world_points: &[Point3<f64>],
    image_points: &[Point2<f64>],
    axes: &PrincipalAxes,
) -> Result<(Rotation3<f64>, Vector3<f64>), SolverError> {
    let basis = axes.plane_basis();
    let plane = world_points
        .iter()
        .map(|p| (basis * (p - axes.centroid)).xy())
        .collect_vec();

    // Conditioning: mean distance from the centroid becomes √2.
    let mean_distance = plane.iter().map(|p| p.norm()).sum::<f64>() / plane.len() as f64;
    let scale = core::f64::consts::SQRT_2 / mean_distance;
    let scaled = plane.iter().map(|p| Point2::from(p * scale)).collect_vec();

    let h = fit_homography(&scaled, image_points)?
        * Matrix3::from_diagonal(&Vector3::new(scale, scale, 1.0));
    let (h1, h2, h3) = (h.column(0), h.column(1), h.column(2));

    let column_norms = h1.norm() + h2.norm();
    if column_norms <= f64::EPSILON {
        return Err(SolverError::DegenerateConfiguration("homography has no rotation part"));
    }
    let mut lambda = 2.0 / column_norms;
    // The plane must lie in front of the camera.
    if h3[2] * lambda < 0.0 {
        lambda = -lambda;
    }
    let r1 = h1 * lambda;
    let r2 = h2 * lambda;
    let plane_rotation = nearest_rotation(&Matrix3::from_columns(&[r1, r2, r1.cross(&r2)]))?;
    let plane_translation = h3 * lambda;

    let rotation = plane_rotation * Rotation3::from_matrix_unchecked(basis);
    let translation = plane_translation - rotation * axes.centroid.coords;
    Ok((rotation, translation))
}

fn dlt_pose(
    world_points: &[Point3<f64>],
    image_points: &[Point2<f64>],
    centroid: Point3<f64>,
) -> Result<(Rotation3<f64>, Vector3<f64>), SolverError> {
    let mean_distance = world_points
        .iter()
        .map(|p| (p - centroid).norm())
        .sum::<f64>()
        / world_points.len() as f64;
    let scale = 3.0f64.sqrt() / mean_distance;

    let mut a = DMatrix::zeros(2 * world_points.len(), 12);
    for (i, (w, m)) in world_points.iter().zip(image_points).enumerate() {
        let p = (w - centroid) * scale;
        let (u, v) = (m.x, m.y);
        let r = 2 * i;
        for c in 0..3 {
            a[(r, c)] = p[c];
            a[(r, 8 + c)] = -u * p[c];
            a[(r + 1, 4 + c)] = p[c];
            a[(r + 1, 8 + c)] = -v * p[c];
        }
        a[(r, 3)] = 1.0;
        a[(r, 11)] = -u;
        a[(r + 1, 7)] = 1.0;
        a[(r + 1, 11)] = -v;
    }
    let p = null_vector(a).ok_or(SVD_FAILED)?;
    let conditioned = Matrix3x4::from_row_slice(p.as_slice());

    // Undo the conditioning: P = P' · [sI | -s·c].
    let m = conditioned.fixed_columns::<3>(0) * scale;
    let t = conditioned.column(3) - m * centroid.coords;

    let det = m.determinant();
    if !det.is_finite() || det.abs() <= f64::EPSILON {
        return Err(SolverError::DegenerateConfiguration("projection matrix is singular"));
    }
    // P = λ[R|t] with det(R) = 1, so the sign of λ is the sign of det(M).
    let lambda = det.signum() * (m.row(0).norm() + m.row(1).norm() + m.row(2).norm()) / 3.0;
    let rotation = nearest_rotation(&(m / lambda))?;
    Ok((rotation, t / lambda))
}
