use crate::{Calibration, CalibrationPipeline};
use log::*;
use nalgebra::{Point2, Point3};
use projcal_core::{screen_to_image, CalibrationError, CalibrationSolver};
use thiserror::Error;

/// Misuse of a [`CorrespondenceSession`], or a failed recalibration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("a world point is already waiting for its image point")]
    WorldPointPending,
    #[error("no world point is waiting for an image point")]
    NoPendingWorldPoint,
    #[error("no correspondence {index} (have {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

/// Collects correspondences one pair at a time and recalibrates as they change.
///
/// A pair is recorded world point first, then image point. Every change to the
/// image points re-triggers calibration. The latest successful calibration is kept
/// until a later one succeeds or the session is cleared.
#[derive(Debug, Clone)]
pub struct CorrespondenceSession<S> {
    pipeline: CalibrationPipeline<S>,
    image_points: Vec<Point2<f64>>,
    world_points: Vec<Point3<f64>>,
    latest: Option<Calibration>,
}

impl<S> CorrespondenceSession<S>
where
    S: CalibrationSolver,
{
    pub fn new(pipeline: CalibrationPipeline<S>) -> Self {
        Self {
            pipeline,
            image_points: Vec::new(),
            world_points: Vec::new(),
            latest: None,
        }
    }

    pub fn pipeline(&self) -> &CalibrationPipeline<S> {
        &self.pipeline
    }

    /// Image points of the completed pairs.
    pub fn image_points(&self) -> &[Point2<f64>] {
        &self.image_points
    }

    /// World points, including one still waiting for its image point.
    pub fn world_points(&self) -> &[Point3<f64>] {
        &self.world_points
    }

    pub fn pending_world_point(&self) -> Option<&Point3<f64>> {
        self.world_points.get(self.image_points.len())
    }

    /// Number of completed pairs.
    pub fn len(&self) -> usize {
        self.image_points.len()
    }

    /// True when nothing is recorded, not even a pending world point.
    pub fn is_empty(&self) -> bool {
        self.world_points.is_empty()
    }

    pub fn latest(&self) -> Option<&Calibration> {
        self.latest.as_ref()
    }

    /// Converts a bottom-left-origin screen position into an image point for this viewport.
    pub fn screen_to_image(&self, screen: Point2<f64>) -> Point2<f64> {
        screen_to_image(screen, self.pipeline.settings().viewport)
    }

    /// Starts a new pair.
    pub fn add_world_point(&mut self, point: Point3<f64>) -> Result<(), SessionError> {
        if self.pending_world_point().is_some() {
            return Err(SessionError::WorldPointPending);
        }
        self.world_points.push(point);
        Ok(())
    }

    /// Completes the pending pair and recalibrates.
    ///
    /// The point is kept even if the recalibration fails.
    pub fn add_image_point(&mut self, point: Point2<f64>) -> Result<&Calibration, SessionError> {
        if self.pending_world_point().is_none() {
            return Err(SessionError::NoPendingWorldPoint);
        }
        self.image_points.push(point);
        self.trigger()
    }

    /// Moves the image point of an existing pair and recalibrates.
    pub fn set_image_point(
        &mut self,
        index: usize,
        point: Point2<f64>,
    ) -> Result<&Calibration, SessionError> {
        let len = self.image_points.len();
        let slot = self
            .image_points
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange { index, len })?;
        *slot = point;
        self.trigger()
    }

    /// Recalibrates from the recorded pairs.
    ///
    /// On failure the previous calibration stays in place.
    pub fn trigger(&mut self) -> Result<&Calibration, SessionError> {
        let found = self.image_points.len();
        let required = self.pipeline.settings().minimum_correspondences;
        if found < required {
            debug!("skipping calibration with {} of {} correspondences", found, required);
            return Err(CalibrationError::InsufficientCorrespondences { found, required }.into());
        }

        match self.pipeline.calibrate(&self.image_points, &self.world_points) {
            Ok(calibration) => {
                info!(
                    "calibrated from {} correspondences, reprojection error {:.3} px",
                    found, calibration.reprojection_error
                );
                Ok(&*self.latest.insert(calibration))
            }
            Err(e) => {
                warn!("calibration from {} correspondences failed: {}", found, e);
                Err(e.into())
            }
        }
    }

    /// Drops every point and the latest calibration.
    pub fn clear(&mut self) {
        self.image_points.clear();
        self.world_points.clear();
        self.latest = None;
    }
}
