//! I2C platform interfaces
//!
//! The driver only ever talks to hardware through these two traits: an
//! [`I2cPlatform`] that lists controllers and hands out address-scoped handles,
//! and the [`I2cBus`] handle itself. Backends live under `platform`.

use std::fmt;

use crate::error::Result;

#[cfg(test)]
pub(crate) mod mock;

/// Identifies one I2C controller reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControllerId {
    /// Platform index (bus number or channel index)
    pub index: u32,
    /// Human-readable name, e.g. `/dev/i2c-1`
    pub name: String,
}

impl ControllerId {
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Bus clock hint passed when opening a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusSpeed {
    /// 100 kHz
    Standard,
    /// 400 kHz
    Fast,
}

impl BusSpeed {
    pub fn hz(self) -> u32 {
        match self {
            BusSpeed::Standard => 100_000,
            BusSpeed::Fast => 400_000,
        }
    }
}

/// Platform bus-enumeration and device-acquisition service
pub trait I2cPlatform {
    /// Handle type produced by [`I2cPlatform::open`]
    type Bus: I2cBus;

    /// List every I2C controller on the host, in platform order
    fn list_i2c_controllers(&self) -> Result<Vec<ControllerId>>;

    /// Claim exclusive ownership of `address` on `controller`
    ///
    /// # Errors
    ///
    /// Returns `Mma8452qError::AddressInUse` when another owner already holds
    /// the address, or a bus error for any other platform failure.
    fn open(&self, controller: &ControllerId, address: u8, speed: BusSpeed) -> Result<Self::Bus>;
}

/// An open connection to one slave address on one controller
///
/// Dropping the handle releases the address.
///
/// # Invariants
///
/// - Exactly one owner; transactions never interleave
/// - Each call either completes fully or fails; partial writes are failures
pub trait I2cBus {
    /// START - ADDR(W) - DATA - STOP
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// START - ADDR(W) - WRITE_DATA - REPEATED_START - ADDR(R) - READ_DATA - STOP
    ///
    /// Returns the number of bytes actually read into `read_buffer`.
    fn write_read(&mut self, write_bytes: &[u8], read_buffer: &mut [u8]) -> Result<usize>;
}

impl<B: I2cBus + ?Sized> I2cBus for Box<B> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn write_read(&mut self, write_bytes: &[u8], read_buffer: &mut [u8]) -> Result<usize> {
        (**self).write_read(write_bytes, read_buffer)
    }
}
