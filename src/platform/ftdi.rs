//! FT232H USB-to-I2C bridge via libMPSSE
//!
//! Each MPSSE channel is one controller. libMPSSE only lets one process open a
//! channel, so a channel that fails to open with `FT_DEVICE_NOT_OPENED` is
//! reported as the address being in use.

use std::ptr;

use log::{debug, warn};

use crate::bus::{BusSpeed, ControllerId, I2cBus, I2cPlatform};
use crate::error::{Mma8452qError, Result};
use crate::ffi::*;

/// Enumerates and opens FT232H I2C channels
#[derive(Debug, Clone)]
pub struct FtdiPlatform {
    latency_timer: u8,
}

impl FtdiPlatform {
    pub fn new() -> Self {
        // 1ms is the lowest latency that stays stable on the FT232H
        Self { latency_timer: 1 }
    }
}

impl Default for FtdiPlatform {
    fn default() -> Self {
        Self::new()
    }
}

fn check(status: FT_STATUS) -> Result<()> {
    if status == FT_OK {
        Ok(())
    } else {
        Err(status.into())
    }
}

impl I2cPlatform for FtdiPlatform {
    type Bus = FtdiBus;

    fn list_i2c_controllers(&self) -> Result<Vec<ControllerId>> {
        let mut num_channels: DWORD = 0;
        check(unsafe { I2C_GetNumChannels(&mut num_channels) })?;

        let mut controllers = Vec::with_capacity(num_channels as usize);
        for index in 0..num_channels {
            let mut info = FT_DEVICE_LIST_INFO_NODE::default();
            check(unsafe { I2C_GetChannelInfo(index, &mut info) })?;

            let name = format!(
                "FT232H channel {} ({}, S/N {})",
                index,
                info.description(),
                info.serial_number()
            );
            controllers.push(ControllerId::new(index, name));
        }

        Ok(controllers)
    }

    fn open(&self, controller: &ControllerId, address: u8, speed: BusSpeed) -> Result<FtdiBus> {
        let mut handle: FT_HANDLE = ptr::null_mut();
        let status = unsafe { I2C_OpenChannel(controller.index, &mut handle) };
        match status {
            FT_OK => {}
            FT_DEVICE_NOT_OPENED => {
                return Err(Mma8452qError::AddressInUse {
                    address,
                    controller: controller.to_string(),
                })
            }
            other => return Err(other.into()),
        }

        let mut config = ChannelConfig {
            ClockRate: match speed {
                BusSpeed::Standard => I2C_CLOCK_STANDARD_MODE,
                BusSpeed::Fast => I2C_CLOCK_FAST_MODE,
            },
            LatencyTimer: self.latency_timer,
            Options: 0,
            Pin: 0,
            currentPinState: 0,
        };

        let status = unsafe { I2C_InitChannel(handle, &mut config) };
        if status != FT_OK {
            unsafe { I2C_CloseChannel(handle) };
            return Err(status.into());
        }

        debug!("Opened {} for 0x{:02X}", controller, address);
        Ok(FtdiBus { handle, address })
    }
}

/// Open MPSSE channel talking to one slave address; closed on drop
pub struct FtdiBus {
    handle: FT_HANDLE,
    address: u8,
}

// SAFETY: the handle is owned by exactly one FtdiBus and libMPSSE does not tie
// channel handles to the opening thread.
unsafe impl Send for FtdiBus {}

impl I2cBus for FtdiBus {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut transferred: DWORD = 0;
        let options = I2C_TRANSFER_OPTIONS_START_BIT
            | I2C_TRANSFER_OPTIONS_STOP_BIT
            | I2C_TRANSFER_OPTIONS_FAST_TRANSFER_BYTES;

        // With FAST_TRANSFER_BYTES the transferred count is in bits; status is authoritative
        check(unsafe {
            I2C_DeviceWrite(
                self.handle,
                self.address,
                bytes.len() as DWORD,
                bytes.as_ptr(),
                &mut transferred,
                options,
            )
        })
    }

    fn write_read(&mut self, write_bytes: &[u8], read_buffer: &mut [u8]) -> Result<usize> {
        let mut transferred: DWORD = 0;

        // Register address without STOP, keeping the bus for the repeated START
        let options = I2C_TRANSFER_OPTIONS_START_BIT
            | I2C_TRANSFER_OPTIONS_BREAK_ON_NACK
            | I2C_TRANSFER_OPTIONS_FAST_TRANSFER_BYTES;
        check(unsafe {
            I2C_DeviceWrite(
                self.handle,
                self.address,
                write_bytes.len() as DWORD,
                write_bytes.as_ptr(),
                &mut transferred,
                options,
            )
        })?;

        // Byte-mode read so `transferred` counts bytes
        transferred = 0;
        let options = I2C_TRANSFER_OPTIONS_START_BIT
            | I2C_TRANSFER_OPTIONS_STOP_BIT
            | I2C_TRANSFER_OPTIONS_NACK_LAST_BYTE;
        check(unsafe {
            I2C_DeviceRead(
                self.handle,
                self.address,
                read_buffer.len() as DWORD,
                read_buffer.as_mut_ptr(),
                &mut transferred,
                options,
            )
        })?;

        Ok(transferred as usize)
    }
}

impl Drop for FtdiBus {
    fn drop(&mut self) {
        let status = unsafe { I2C_CloseChannel(self.handle) };
        if status != FT_OK {
            warn!("I2C_CloseChannel failed: {}", status_to_string(status));
        }
    }
}
