use nalgebra::{Matrix3, Point2, Vector2};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The pixel dimensions of the rendered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The viewport size as `(width, height)`.
    pub fn size(self) -> Vector2<f64> {
        Vector2::new(f64::from(self.width), f64::from(self.height))
    }

    /// The center of the viewport in pixel coordinates.
    pub fn center(self) -> Point2<f64> {
        (self.size() * 0.5).into()
    }
}

/// Horizontal and vertical field of view of a projector, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct FieldOfView {
    pub horizontal: f64,
    pub vertical: f64,
}

impl FieldOfView {
    pub fn new(horizontal: f64, vertical: f64) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

/// Lens distortion coefficients `(k1, k2, p1, p2)`.
///
/// Calibration keeps these fixed at zero. They exist so the forward projection
/// has the same inputs the solver reports.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Distortion(pub [f64; 4]);

impl Distortion {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0.0)
    }
}

/// Intrinsic camera parameters: focal lengths and principal point in pixels.
///
/// Skew is always zero for this model.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraIntrinsics {
    pub focals: Vector2<f64>,
    pub principal_point: Point2<f64>,
}

impl CameraIntrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            focals: Vector2::new(fx, fy),
            principal_point: Point2::new(cx, cy),
        }
    }

    /// Derives intrinsics from a field of view, centering the principal point.
    ///
    /// `fx = width / (2 tan(hfov / 2))` and `fy = height / (2 tan(vfov / 2))`.
    pub fn from_field_of_view(fov: FieldOfView, viewport: Viewport) -> Self {
        let size = viewport.size();
        let fx = size.x / (2.0 * (0.5 * fov.horizontal.to_radians()).tan());
        let fy = size.y / (2.0 * (0.5 * fov.vertical.to_radians()).tan());
        Self {
            focals: Vector2::new(fx, fy),
            principal_point: viewport.center(),
        }
    }

    /// Reads fx, fy, cx and cy out of an intrinsic matrix.
    pub fn from_matrix(matrix: &Matrix3<f64>) -> Self {
        Self::new(matrix.m11, matrix.m22, matrix.m13, matrix.m23)
    }

    pub fn focals(self, focals: Vector2<f64>) -> Self {
        Self { focals, ..self }
    }

    pub fn principal_point(self, principal_point: Point2<f64>) -> Self {
        Self {
            principal_point,
            ..self
        }
    }

    pub fn fx(&self) -> f64 {
        self.focals.x
    }

    pub fn fy(&self) -> f64 {
        self.focals.y
    }

    pub fn cx(&self) -> f64 {
        self.principal_point.x
    }

    pub fn cy(&self) -> f64 {
        self.principal_point.y
    }

    #[rustfmt::skip]
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.focals.x,  0.0,            self.principal_point.x,
            0.0,            self.focals.y,  self.principal_point.y,
            0.0,            0.0,            1.0,
        )
    }

    /// Maps a normalized image coordinate (on the plane `z = 1`) to pixels.
    pub fn uncalibrate(&self, normalized: Point2<f64>) -> Point2<f64> {
        Point2::new(
            self.focals.x * normalized.x + self.principal_point.x,
            self.focals.y * normalized.y + self.principal_point.y,
        )
    }

    /// Maps a pixel coordinate to the normalized image plane.
    pub fn calibrate(&self, pixel: Point2<f64>) -> Point2<f64> {
        Point2::new(
            (pixel.x - self.principal_point.x) / self.focals.x,
            (pixel.y - self.principal_point.y) / self.focals.y,
        )
    }
}
