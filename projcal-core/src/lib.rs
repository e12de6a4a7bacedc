//! # projcal core
//!
//! This library provides the types and coordinate-frame conversions used to turn a
//! single-view camera calibration into something a renderer can consume directly.
//! The other `projcal` crates depend on it: the solver crate implements
//! [`CalibrationSolver`], and the pipeline crate strings the conversions together.
//!
//! ## Coordinate frames
//!
//! Three frames meet here, and almost every function in this crate exists to move a
//! value across exactly one boundary between them:
//!
//! * The *engine* world frame is left-handed (X right, Y up, Z forwards).
//! * The *solver* frame is the right-handed vision convention used by the
//!   calibration solver. World points enter it by negating Z ([`world_to_solver`]).
//!   Camera space in this frame has X right, Y down and Z forwards, and image
//!   coordinates have their origin at the top left.
//! * The *renderer* camera is described by a position, Euler angles applied in
//!   Z, X, Y order, and a column-vector projection matrix.
//!
//! ```text
//!   engine world (LH)                  solver world (RH)                camera (RH, y down)
//!        y                                   y                                  z
//!        |  z          world_to_solver       |                  [R|t]          /
//!        | /          ---------------->      |                ------->        /
//!        |/___ x                             |___ x                           o---- x
//!                                           /                                 |
//!                                          z                                  y
//! ```
//!
//! The solver reports the pose of the world relative to the camera. Turning that into a
//! camera placement takes a reflection back into the left-handed frame
//! ([`reflect_to_left_handed`]), an inverse ([`orthonormal_inverse`]), and a position
//! ([`camera_position`]), followed by Euler extraction ([`matrix_to_euler_zxy`]).
//! [`CameraTransform::from_vision_pose`] runs the whole chain.
//!
//! The projection side is handled by [`Frustum`], which builds an off-axis frustum from
//! calibrated intrinsics and converts it into the renderer's layout with [`flip_y`].

mod convention;
mod error;
mod euler;
mod frustum;
mod intrinsics;
mod pose;
mod solver;

pub use convention::*;
pub use error::*;
pub use euler::*;
pub use frustum::*;
pub use intrinsics::*;
pub use nalgebra;
pub use pose::*;
pub use solver::*;
