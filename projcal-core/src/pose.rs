use crate::{
    camera_position, matrix_to_euler, orthonormal_inverse, reflect_to_left_handed,
    CameraIntrinsics, Distortion, EulerAngles, EulerConvention,
};
use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Matrix4, Rotation3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// What a solver reports for a single view, in the solver (vision) convention.
///
/// `rotation` is an axis-angle vector and, together with `translation`, maps solver-frame
/// world points into camera space: `X_c = R · X_w + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CalibrationResult {
    pub intrinsics: CameraIntrinsics,
    pub distortion: Distortion,
    pub rotation: Vector3<f64>,
    pub translation: Vector3<f64>,
}

/// Placement of the virtual camera in the renderer: position and Euler angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraTransform {
    pub position: Vector3<f64>,
    pub orientation: EulerAngles,
}

impl CameraTransform {
    /// Converts a solver world-to-camera pose into a renderer camera placement.
    ///
    /// The rotation is reflected back into the left-handed frame and inverted, since the
    /// solver reports the world relative to the camera and the renderer wants the camera
    /// relative to the world.
    pub fn from_vision_pose(rotation: &Rotation3<f64>, translation: &Vector3<f64>) -> Self {
        Self::from_vision_pose_with(rotation, translation, &EulerConvention::RENDERER_ZXY)
    }

    /// [`CameraTransform::from_vision_pose`] with an explicit Euler convention.
    pub fn from_vision_pose_with(
        rotation: &Rotation3<f64>,
        translation: &Vector3<f64>,
        convention: &EulerConvention,
    ) -> Self {
        let left_handed = reflect_to_left_handed(rotation.matrix());
        let inverse = orthonormal_inverse(&left_handed);
        Self {
            position: camera_position(&inverse, translation),
            orientation: matrix_to_euler(&inverse, convention),
        }
    }
}

/// A 4x4 projection matrix in the renderer's column-vector layout.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ProjectionMatrix(pub Matrix4<f32>);
