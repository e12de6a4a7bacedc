use projcal_core::{ClipPlanes, EulerConvention, FieldOfView, Viewport};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The settings for calibrating one projector.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CalibrationSettings {
    /// The projector's nominal field of view, used to build the intrinsic guess.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_field_of_view"))]
    pub field_of_view: FieldOfView,
    /// The size of the rendered view in pixels.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_viewport"))]
    pub viewport: Viewport,
    /// Near and far clip distances of the virtual camera.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_clip_planes"))]
    pub clip_planes: ClipPlanes,
    /// How many correspondences must be recorded before calibration runs.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_minimum_correspondences")
    )]
    pub minimum_correspondences: usize,
    /// The Euler convention the renderer expects for the camera orientation.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_euler_convention"))]
    pub euler_convention: EulerConvention,
}

impl CalibrationSettings {
    pub fn field_of_view(self, field_of_view: FieldOfView) -> Self {
        Self {
            field_of_view,
            ..self
        }
    }

    pub fn viewport(self, viewport: Viewport) -> Self {
        Self { viewport, ..self }
    }

    pub fn clip_planes(self, clip_planes: ClipPlanes) -> Self {
        Self {
            clip_planes,
            ..self
        }
    }

    pub fn minimum_correspondences(self, minimum_correspondences: usize) -> Self {
        Self {
            minimum_correspondences,
            ..self
        }
    }

    pub fn euler_convention(self, euler_convention: EulerConvention) -> Self {
        Self {
            euler_convention,
            ..self
        }
    }
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            field_of_view: default_field_of_view(),
            viewport: default_viewport(),
            clip_planes: default_clip_planes(),
            minimum_correspondences: default_minimum_correspondences(),
            euler_convention: default_euler_convention(),
        }
    }
}

fn default_field_of_view() -> FieldOfView {
    FieldOfView::new(91.2705674249382, 59.8076333281726)
}

fn default_viewport() -> Viewport {
    Viewport::new(1920, 1080)
}

fn default_clip_planes() -> ClipPlanes {
    ClipPlanes::new(0.3, 1000.0)
}

fn default_minimum_correspondences() -> usize {
    7
}

fn default_euler_convention() -> EulerConvention {
    EulerConvention::RENDERER_ZXY
}
