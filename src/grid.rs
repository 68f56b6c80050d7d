//! Output-time bookkeeping.

use ndarray::prelude::*;
use thiserror::Error;

use crate::settings::{Settings, StepSize};

#[derive(Debug, Error, PartialEq)]
pub enum CreateIntegratorError {
    #[error("initial state is empty")]
    EmptyState,
    #[error("state of length {0} cannot be split into positions and momenta")]
    OddState(usize),
    #[error("at least two output times are required, got {0}")]
    TooFewTimes(usize),
    #[error("output times must be finite")]
    TimeNotFinite,
    #[error("output interval is zero")]
    ZeroInterval,
    #[error("step size {0} is zero or not finite")]
    InvalidStep(f64),
    #[error("step size {step} points against the output interval {interval}")]
    StepDirection { step: f64, interval: f64 },
    #[error("tolerances must be non-negative and finite")]
    InvalidTolerance,
    #[error("angular-momentum transform needs at least 3 components, got {0}")]
    TransformTooShort(usize),
    #[error("angular-momentum transform is not supported by this integrator")]
    TransformUnsupported,
}

/// Equally spaced output times.
///
/// Only the first two times are used to determine the output interval; the
/// rest are trusted to follow with the same spacing.
#[derive(Clone, Debug)]
pub(crate) struct TimeGrid {
    times: Array1<f64>,
    interval: f64,
}

impl TimeGrid {
    pub(crate) fn new(times: Array1<f64>) -> Result<TimeGrid, CreateIntegratorError> {
        if times.len() < 2 {
            return Err(CreateIntegratorError::TooFewTimes(times.len()));
        }
        if !times.iter().all(|t| t.is_finite()) {
            return Err(CreateIntegratorError::TimeNotFinite);
        }
        let interval = times[1] - times[0];
        if interval == 0. {
            return Err(CreateIntegratorError::ZeroInterval);
        }
        Ok(TimeGrid { times, interval })
    }

    pub(crate) fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    pub(crate) fn len(&self) -> usize {
        self.times.len()
    }

    pub(crate) fn start(&self) -> f64 {
        self.times[0]
    }

    /// Spacing between consecutive output times.
    pub(crate) fn interval(&self) -> f64 {
        self.interval
    }

    /// Number of sub-steps of size `dt` per output interval.
    ///
    /// Truncates; `dt` is not checked to divide the interval.
    pub(crate) fn substeps(&self, dt: f64) -> usize {
        (self.interval / dt) as usize
    }

    /// Checks a caller-supplied step against the grid.
    pub(crate) fn check_step(&self, dt: f64) -> Result<f64, CreateIntegratorError> {
        if dt == 0. || !dt.is_finite() {
            return Err(CreateIntegratorError::InvalidStep(dt));
        }
        if (dt > 0.) != (self.interval > 0.) {
            return Err(CreateIntegratorError::StepDirection {
                step: dt,
                interval: self.interval,
            });
        }
        Ok(dt)
    }
}

/// Validates the parts of `settings` that do not depend on the scheme.
pub(crate) fn check_settings(
    grid: &TimeGrid,
    settings: &Settings,
) -> Result<(), CreateIntegratorError> {
    match settings.step {
        StepSize::Fixed(dt) => {
            grid.check_step(dt)?;
        }
        StepSize::Auto => {
            if !settings.tolerances.is_valid() {
                return Err(CreateIntegratorError::InvalidTolerance);
            }
        }
    }
    Ok(())
}
