//! Error types for the MMA8452Q accelerometer interface

use thiserror::Error;

#[cfg(feature = "ftdi")]
use crate::ffi::{status_to_string, FT_OK, FT_STATUS};
use crate::mma8452q::DriverState;

/// Error type for MMA8452Q operations
#[derive(Error, Debug)]
pub enum Mma8452qError {
    /// Bus enumeration returned no I2C controllers
    #[error("No I2C controllers were found on the system")]
    NoControllerFound,

    /// Another owner holds the slave address on the controller
    #[error(
        "Slave address 0x{address:02X} on I2C Controller {controller} is currently in use by \
         another application. Please ensure that no other applications are using I2C."
    )]
    AddressInUse { address: u8, controller: String },

    /// A bus transaction failed; carries the platform's diagnostic text
    #[error("I2C transaction failed: {0}")]
    Bus(String),

    /// FTDI driver error
    #[cfg(feature = "ftdi")]
    #[error("FTDI error: {status} ({description})")]
    FtdiError {
        status: FT_STATUS,
        description: String,
    },

    /// A read returned a different byte count than requested
    #[error("Malformed frame: expected {expected} bytes, received {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    /// One of the initialization writes failed
    #[error("Failed to communicate with device (register 0x{register:02X} <- 0x{value:02X}): {source}")]
    InitFailed {
        register: u8,
        value: u8,
        #[source]
        source: Box<Mma8452qError>,
    },

    /// A read was requested while the driver is not ready
    #[error("Device not ready: {0}")]
    NotReady(DriverState),

    /// A transaction was requested after the bus handle was released
    #[error("I2C bus handle is closed")]
    HandleClosed,
}

/// Failure classes an operator cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoControllerFound,
    AddressInUse,
    BusTransactionFailure,
    MalformedFrame,
    NotReady,
}

impl Mma8452qError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Mma8452qError::NoControllerFound => ErrorKind::NoControllerFound,
            Mma8452qError::AddressInUse { .. } => ErrorKind::AddressInUse,
            Mma8452qError::Bus(_) => ErrorKind::BusTransactionFailure,
            #[cfg(feature = "ftdi")]
            Mma8452qError::FtdiError { .. } => ErrorKind::BusTransactionFailure,
            Mma8452qError::MalformedFrame { .. } => ErrorKind::MalformedFrame,
            Mma8452qError::InitFailed { source, .. } => source.kind(),
            Mma8452qError::NotReady(_) | Mma8452qError::HandleClosed => ErrorKind::NotReady,
        }
    }

    /// Whether this error halts startup. Bus and frame errors only do so while
    /// initializing, which is expressed by `InitFailed`.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Mma8452qError::NoControllerFound
                | Mma8452qError::AddressInUse { .. }
                | Mma8452qError::InitFailed { .. }
        )
    }
}

#[cfg(feature = "ftdi")]
impl From<FT_STATUS> for Mma8452qError {
    fn from(status: FT_STATUS) -> Self {
        debug_assert_ne!(status, FT_OK, "FT_OK is not an error");
        Mma8452qError::FtdiError {
            status,
            description: status_to_string(status).to_string(),
        }
    }
}

impl From<std::io::Error> for Mma8452qError {
    fn from(err: std::io::Error) -> Self {
        Mma8452qError::Bus(err.to_string())
    }
}

/// Result type for MMA8452Q operations
pub type Result<T> = std::result::Result<T, Mma8452qError>;
