use crate::CalibrationError;
use core::f64::consts::TAU;
use nalgebra::Matrix3;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Below this `cos(beta)` the extraction takes the gimbal-lock branch.
pub const EULER_EPSILON: f64 = 5e-5;

/// How far a wrap window's span may differ from a full turn.
pub const WRAP_WINDOW_TOLERANCE: f64 = 1e-7;

/// A half-open window `[lower, lower + 2π)` that angles are wrapped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrapWindow {
    lower: f64,
}

impl WrapWindow {
    /// The window `[0, 2π)`.
    pub const FULL_TURN: Self = Self { lower: 0.0 };

    /// Creates the window `[lower, upper)`.
    ///
    /// Fails if `upper - lower` is not a full turn to within [`WRAP_WINDOW_TOLERANCE`].
    pub fn new(lower: f64, upper: f64) -> Result<Self, CalibrationError> {
        if !lower.is_finite() || ((upper - lower) - TAU).abs() > WRAP_WINDOW_TOLERANCE {
            return Err(CalibrationError::AngleWrapWindow { lower, upper });
        }
        Ok(Self { lower })
    }

    /// Inclusive lower bound of the window.
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Exclusive upper bound, one full turn above [`lower`](Self::lower).
    pub fn upper(&self) -> f64 {
        self.lower + TAU
    }

    /// Shifts `angle` by whole turns until it lies inside the window.
    ///
    /// Angles already inside the window are returned untouched, which makes this idempotent.
    pub fn wrap(&self, angle: f64) -> f64 {
        let upper = self.upper();
        if (self.lower..upper).contains(&angle) {
            return angle;
        }
        let wrapped = self.lower + (angle - self.lower).rem_euclid(TAU);
        // Rounding can land exactly on the excluded upper bound.
        if wrapped >= upper {
            self.lower
        } else {
            wrapped
        }
    }
}

/// Orientation in degrees about each renderer axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct EulerAngles {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl EulerAngles {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Axis bookkeeping for Euler extraction.
///
/// `axes` is the `(i, j, k)` index triple of the rotation order and `z_offset` the
/// angle in degrees that the Z output is mirrored around (`z = z_offset - alpha`).
/// Both are tied to one renderer's axis conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct EulerConvention {
    pub axes: [usize; 3],
    pub z_offset: f64,
}

impl EulerConvention {
    /// Z, then X, then Y, with the Z output mirrored around 180°.
    pub const RENDERER_ZXY: Self = Self {
        axes: [2, 0, 1],
        z_offset: 180.0,
    };
}

impl Default for EulerConvention {
    fn default() -> Self {
        Self::RENDERER_ZXY
    }
}

/// Raw extraction angles in radians, before wrapping.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RawAngles {
    alpha: f64,
    beta: f64,
    gamma: f64,
}

fn cos_beta(r: &Matrix3<f64>, [i, j, _]: [usize; 3]) -> f64 {
    (r[(i, i)].powi(2) + r[(j, i)].powi(2)).sqrt()
}

fn regular_angles(r: &Matrix3<f64>, [i, j, k]: [usize; 3], cos_beta: f64) -> RawAngles {
    RawAngles {
        alpha: r[(k, j)].atan2(r[(k, k)]),
        beta: (-r[(k, i)]).atan2(cos_beta),
        gamma: r[(j, i)].atan2(r[(i, i)]),
    }
}

fn gimbal_lock_angles(r: &Matrix3<f64>, [i, j, k]: [usize; 3], cos_beta: f64) -> RawAngles {
    RawAngles {
        alpha: (-r[(j, k)]).atan2(r[(j, j)]),
        beta: (-r[(k, i)]).atan2(cos_beta),
        gamma: 0.0,
    }
}

/// Extracts renderer Euler angles in degrees from an orthonormal matrix.
///
/// Near gimbal lock (`cos(beta) <= EULER_EPSILON`) the Y angle is pinned to zero and
/// the whole rotation about the locked axis is reported in Z.
pub fn matrix_to_euler(r: &Matrix3<f64>, convention: &EulerConvention) -> EulerAngles {
    let axes = convention.axes;
    let cos_beta = cos_beta(r, axes);
    let raw = if cos_beta > EULER_EPSILON {
        regular_angles(r, axes, cos_beta)
    } else {
        gimbal_lock_angles(r, axes, cos_beta)
    };

    let window = WrapWindow::FULL_TURN;
    let alpha = window.wrap(raw.alpha);
    let beta = window.wrap(raw.beta);
    let gamma = window.wrap(raw.gamma);

    EulerAngles {
        x: beta.to_degrees(),
        y: gamma.to_degrees(),
        z: convention.z_offset - alpha.to_degrees(),
    }
}

/// [`matrix_to_euler`] with [`EulerConvention::RENDERER_ZXY`].
pub fn matrix_to_euler_zxy(r: &Matrix3<f64>) -> EulerAngles {
    matrix_to_euler(r, &EulerConvention::RENDERER_ZXY)
}
