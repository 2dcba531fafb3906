//! Linux i2c-dev platform
//!
//! Controllers are the `/dev/i2c-N` character devices. Opening binds the slave
//! address with `I2C_SLAVE`, which the kernel refuses with `EBUSY` while a
//! driver owns the address; that is reported as `AddressInUse`.

use std::fs;
use std::io;
use std::path::PathBuf;

use i2cdev::core::{I2CDevice, I2CMessage, I2CTransfer};
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError, LinuxI2CMessage};
use log::debug;

use crate::bus::{BusSpeed, ControllerId, I2cBus, I2cPlatform};
use crate::error::{Mma8452qError, Result};

const EBUSY: i32 = 16;

/// Kernel i2c-dev bus enumeration
#[derive(Debug, Clone)]
pub struct LinuxPlatform {
    dev_dir: PathBuf,
}

impl LinuxPlatform {
    pub fn new() -> Self {
        Self::with_dev_dir("/dev")
    }

    /// Enumerate `i2c-N` nodes under a different directory
    pub fn with_dev_dir(dev_dir: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dev_dir.into(),
        }
    }
}

impl Default for LinuxPlatform {
    fn default() -> Self {
        Self::new()
    }
}

/// `i2c-1` -> 1
fn parse_bus_number(name: &str) -> Option<u32> {
    name.strip_prefix("i2c-")?.parse().ok()
}

fn bus_error(err: LinuxI2CError) -> Mma8452qError {
    io::Error::from(err).into()
}

impl I2cPlatform for LinuxPlatform {
    type Bus = LinuxBus;

    fn list_i2c_controllers(&self) -> Result<Vec<ControllerId>> {
        let mut controllers = Vec::new();

        for entry in fs::read_dir(&self.dev_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(index) = name.to_str().and_then(parse_bus_number) {
                controllers.push(ControllerId::new(index, entry.path().display().to_string()));
            }
        }

        controllers.sort_by_key(|c| c.index);
        Ok(controllers)
    }

    fn open(&self, controller: &ControllerId, address: u8, speed: BusSpeed) -> Result<LinuxBus> {
        // The adapter clock comes from the device tree / kernel module parameters
        debug!("{}: bus speed hint {} Hz not applied by i2c-dev", controller, speed.hz());

        let device = LinuxI2CDevice::new(&controller.name, u16::from(address)).map_err(|e| {
            let err = io::Error::from(e);
            if err.raw_os_error() == Some(EBUSY) {
                Mma8452qError::AddressInUse {
                    address,
                    controller: controller.to_string(),
                }
            } else {
                Mma8452qError::Bus(format!("{}: {}", controller, err))
            }
        })?;

        Ok(LinuxBus { device })
    }
}

/// Open `/dev/i2c-N` bound to one slave address; closed on drop
pub struct LinuxBus {
    device: LinuxI2CDevice,
}

impl I2cBus for LinuxBus {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.device.write(bytes).map_err(bus_error)
    }

    fn write_read(&mut self, write_bytes: &[u8], read_buffer: &mut [u8]) -> Result<usize> {
        let len = read_buffer.len();

        // One I2C_RDWR ioctl: repeated START between the two messages
        let mut messages = [
            LinuxI2CMessage::write(write_bytes),
            LinuxI2CMessage::read(read_buffer),
        ];
        let completed = self.device.transfer(&mut messages).map_err(bus_error)?;

        if completed == 2 {
            Ok(len)
        } else {
            Ok(0)
        }
    }
}
