use crate::{flip_y, CameraIntrinsics, ProjectionMatrix, Viewport};
use nalgebra::Matrix4;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Near and far clip distances of the virtual camera.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ClipPlanes {
    pub near: f32,
    pub far: f32,
}

impl ClipPlanes {
    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }
}

/// An off-axis viewing frustum, with bounds measured on the near plane.
///
/// `bottom` and `top` follow the image convention where Y grows downwards, so for a
/// principal point inside the image `bottom > 0 > top`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Frustum {
    /// Builds the frustum seen by a pinhole camera with `intrinsics` over `viewport`.
    pub fn from_intrinsics(
        intrinsics: &CameraIntrinsics,
        viewport: Viewport,
        clip: ClipPlanes,
    ) -> Self {
        let fx = intrinsics.fx() as f32;
        let fy = intrinsics.fy() as f32;
        let cx = intrinsics.cx() as f32;
        let cy = intrinsics.cy() as f32;
        let w = viewport.width as f32;
        let h = viewport.height as f32;
        let near = clip.near;

        Self {
            left: near * -cx / fx,
            right: near * (w - cx) / fx,
            bottom: near * cy / fy,
            top: near * (cy - h) / fy,
            near,
            far: clip.far,
        }
    }

    /// The horizontal off-axis term `(right + left) / (right - left)`.
    pub fn horizontal_offset(&self) -> f32 {
        (self.right + self.left) / (self.right - self.left)
    }

    /// The vertical off-axis term `(top + bottom) / (top - bottom)`.
    pub fn vertical_offset(&self) -> f32 {
        (self.top + self.bottom) / (self.top - self.bottom)
    }

    /// The perspective matrix in row-vector layout (points multiply from the left).
    #[rustfmt::skip]
    pub fn perspective(&self) -> Matrix4<f32> {
        let Self { left, right, bottom, top, near, far } = *self;
        let a = self.horizontal_offset();
        let b = self.vertical_offset();
        let c = -(far + near) / (far - near);
        let d = -2.0 * far * near / (far - near);

        Matrix4::new(
            2.0 * near / (right - left), 0.0,                         0.0, 0.0,
            0.0,                         2.0 * near / (top - bottom), 0.0, 0.0,
            a,                           b,                           c,   -1.0,
            0.0,                         0.0,                         d,   0.0,
        )
    }

    /// The renderer projection: `flip_y · perspᵀ`.
    pub fn projection_matrix(&self) -> ProjectionMatrix {
        ProjectionMatrix(flip_y(&self.perspective().transpose()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    fn viewport() -> Viewport {
        Viewport::new(1280, 800)
    }

    fn clip() -> ClipPlanes {
        ClipPlanes::new(0.3, 1000.0)
    }

    #[test]
    fn centered_principal_point_is_symmetric() {
        let intrinsics = CameraIntrinsics::new(900.0, 880.0, 640.0, 400.0);
        let frustum = Frustum::from_intrinsics(&intrinsics, viewport(), clip());
        assert_relative_eq!(frustum.horizontal_offset(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.vertical_offset(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.left, -frustum.right, epsilon = 1e-6);
        assert_relative_eq!(frustum.bottom, -frustum.top, epsilon = 1e-6);

        // Reduces to the symmetric perspective matrix.
        let m = frustum.projection_matrix().0;
        assert_relative_eq!(m[(0, 0)], 2.0 * 900.0 / 1280.0, epsilon = 1e-5);
        assert_relative_eq!(m[(1, 1)], 2.0 * 880.0 / 800.0, epsilon = 1e-5);
        assert_relative_eq!(m[(0, 2)], 0.0, epsilon = 1e-6);
        assert_relative_eq!(m[(1, 2)], 0.0, epsilon = 1e-6);
        assert_eq!(m[(3, 2)], -1.0);
        assert_eq!(m[(3, 3)], 0.0);
    }

    #[test]
    fn bounds_follow_principal_point() {
        let intrinsics = CameraIntrinsics::new(1000.0, 1000.0, 320.0, 100.0);
        let frustum = Frustum::from_intrinsics(&intrinsics, viewport(), ClipPlanes::new(1.0, 10.0));
        assert_relative_eq!(frustum.left, -0.32);
        assert_relative_eq!(frustum.right, 0.96);
        assert_relative_eq!(frustum.bottom, 0.1);
        assert_relative_eq!(frustum.top, -0.7);
    }

    #[test]
    fn perspective_row_vector_layout() {
        let frustum = Frustum {
            left: -1.0,
            right: 3.0,
            bottom: 2.0,
            top: -2.0,
            near: 1.0,
            far: 3.0,
        };
        let p = frustum.perspective();
        assert_relative_eq!(p[(0, 0)], 0.5);
        assert_relative_eq!(p[(1, 1)], -0.5);
        assert_relative_eq!(p[(2, 0)], 0.5);
        assert_relative_eq!(p[(2, 1)], 0.0);
        assert_relative_eq!(p[(2, 2)], -2.0);
        assert_relative_eq!(p[(2, 3)], -1.0);
        assert_relative_eq!(p[(3, 2)], -3.0);
    }

    #[test]
    fn flip_is_applied_after_transpose() {
        let intrinsics = CameraIntrinsics::new(700.0, 650.0, 500.0, 300.0);
        let frustum = Frustum::from_intrinsics(&intrinsics, viewport(), clip());
        let persp = frustum.perspective();
        let m = frustum.projection_matrix().0;

        // Column-vector layout: the homogeneous row is the bottom row.
        assert_relative_eq!(m.row(3).into_owned(), persp.column(3).transpose());
        assert_relative_eq!(m.row(0).into_owned(), persp.column(0).transpose());
        assert_relative_eq!(m.row(1).into_owned(), -persp.column(1).transpose());
        // The other composition order would flip a column instead.
        assert!((m - (persp.transpose() * crate::y_flip())).abs().max() > 1e-3);
    }

    #[test]
    fn near_and_far_map_to_clip_range() {
        let intrinsics = CameraIntrinsics::new(700.0, 650.0, 640.0, 400.0);
        let clip = clip();
        let m = Frustum::from_intrinsics(&intrinsics, viewport(), clip).projection_matrix().0;

        // A renderer camera looks down -Z.
        let ndc_depth = |z: f32| {
            let clip_space = m * Vector4::new(0.0, 0.0, -z, 1.0);
            clip_space.z / clip_space.w
        };
        assert_relative_eq!(ndc_depth(clip.near), -1.0, epsilon = 1e-4);
        assert_relative_eq!(ndc_depth(clip.far), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn principal_point_projects_to_center_offset() {
        let intrinsics = CameraIntrinsics::new(800.0, 800.0, 840.0, 400.0);
        let m = Frustum::from_intrinsics(&intrinsics, viewport(), clip()).projection_matrix().0;
        let p = m * Vector4::new(0.0, 0.0, -5.0, 1.0);
        // cx sits 200 pixels right of center, a half width is 640 pixels.
        assert_relative_eq!(p.x / p.w, 200.0 / 640.0, epsilon = 1e-5);
        assert_relative_eq!(p.y / p.w, 0.0, epsilon = 1e-5);
    }
}
