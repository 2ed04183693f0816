//! Errors raised at the collaborator boundaries. The engines themselves
//! never fail.

use thiserror::Error;

/// Why a notification could not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotifyError {
    #[error("connection failed")]
    Connect,
    #[error("request does not fit the buffer")]
    BufferTooSmall,
}

/// Why a probe could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    #[error("sensor bus error")]
    Bus,
    #[error("sensor has no new data")]
    NotReady,
}

/// The character LCD did not accept a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    #[error("display bus error")]
    Bus,
}
