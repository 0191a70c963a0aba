use crate::reading::Reading;
use thiserror::Error;

/// Errors a device can report to its poller.
#[derive(Debug, Error, PartialEq)]
pub enum DeviceError {
    #[error("simulation has not been started")]
    NotStarted,
}

/// A polled telemetry source.
///
/// The poller only needs to take readings and to tear the device down at
/// the end of a run; construction, start and reconfiguration stay on the
/// concrete type. Implementations guard their own state, so a device can be
/// shared between the poller and a reconfiguring thread behind an `Arc`.
pub trait Device: Send + Sync {
    /// Take one set of readings. Never cached; each call computes fresh
    /// values from the current wall-clock time.
    fn poll(&self) -> Result<Vec<Reading>, DeviceError>;

    /// Release run state. Further polls fail with `NotStarted`.
    fn shutdown(&self);
}
