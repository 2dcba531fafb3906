//! MMA8452Q 3-axis accelerometer driver

use std::fmt;

use log::{debug, error, info};

use crate::bus::{BusSpeed, ControllerId, I2cBus, I2cPlatform};
use crate::error::{Mma8452qError, Result};
use crate::frame::{decode, Acceleration, RawFrame, FRAME_LEN};
use crate::locator::find_controller;

// MMA8452Q I2C address (SA0 low)
pub const MMA8452Q_ADDRESS: u8 = 0x1C;

// MMA8452Q Register addresses
pub const REG_STATUS: u8 = 0x00;
pub const REG_OUT_X_MSB: u8 = 0x01;
pub const REG_OUT_Y_MSB: u8 = 0x03;
pub const REG_OUT_Z_MSB: u8 = 0x05;
pub const REG_XYZ_DATA_CFG: u8 = 0x0E;
pub const REG_CTRL_REG1: u8 = 0x2A;

// CTRL_REG1 values
const CTRL1_STANDBY: u8 = 0x00; // 800 Hz ODR, standby
const CTRL1_ACTIVE: u8 = 0x01; // 800 Hz ODR, active

// XYZ_DATA_CFG: high-pass output off, ±2g full scale
const DATA_CFG_2G: u8 = 0x00;

/// Bus clock requested when opening the device
pub const BUS_SPEED: BusSpeed = BusSpeed::Fast;

/// A single configuration write: register address, then value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub register: u8,
    pub value: u8,
}

impl RegisterWrite {
    pub const fn new(register: u8, value: u8) -> Self {
        Self { register, value }
    }

    pub fn bytes(&self) -> [u8; 2] {
        [self.register, self.value]
    }
}

/// Register writes issued by [`Mma8452q::initialize`], in order.
///
/// XYZ_DATA_CFG is only writable in standby, so the device is parked first.
pub const INIT_SEQUENCE: [RegisterWrite; 3] = [
    RegisterWrite::new(REG_CTRL_REG1, CTRL1_STANDBY),
    RegisterWrite::new(REG_XYZ_DATA_CFG, DATA_CFG_2G),
    RegisterWrite::new(REG_CTRL_REG1, CTRL1_ACTIVE),
];

/// Driver lifecycle. `Failed` is terminal for an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Ready,
    Failed(String),
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverState::Uninitialized => f.write_str("uninitialized"),
            DriverState::Ready => f.write_str("ready"),
            DriverState::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// MMA8452Q sensor interface
///
/// Owns the bus handle for the device address. The handle is released by
/// [`Mma8452q::close`] or on drop, whichever comes first.
pub struct Mma8452q<B: I2cBus> {
    bus: Option<B>,
    controller: ControllerId,
    state: DriverState,
}

impl<B: I2cBus> Mma8452q<B> {
    /// Claim the MMA8452Q address on `controller`
    ///
    /// # Returns
    /// * `Ok(Mma8452q)` - Uninitialized driver owning the handle
    /// * `Err(Mma8452qError::AddressInUse)` - Another owner holds the address
    pub fn open<P>(platform: &P, controller: &ControllerId) -> Result<Self>
    where
        P: I2cPlatform<Bus = B> + ?Sized,
    {
        let bus = platform.open(controller, MMA8452Q_ADDRESS, BUS_SPEED)?;
        info!(
            "Opened MMA8452Q at 0x{:02X} on {} ({} Hz)",
            MMA8452Q_ADDRESS,
            controller,
            BUS_SPEED.hz()
        );
        Ok(Self::from_bus(bus, controller.clone()))
    }

    /// Wrap an already-open handle
    pub fn from_bus(bus: B, controller: ControllerId) -> Self {
        Self {
            bus: Some(bus),
            controller,
            state: DriverState::Uninitialized,
        }
    }

    /// Find the first controller, open the device and initialize it
    ///
    /// On an initialization failure the handle is released before returning.
    pub fn connect<P>(platform: &P) -> Result<Self>
    where
        P: I2cPlatform<Bus = B> + ?Sized,
    {
        let controller = find_controller(platform)?;
        let mut sensor = Self::open(platform, &controller)?;
        sensor.initialize()?;
        Ok(sensor)
    }

    pub fn state(&self) -> &DriverState {
        &self.state
    }

    pub fn controller(&self) -> &ControllerId {
        &self.controller
    }

    pub fn is_open(&self) -> bool {
        self.bus.is_some()
    }

    /// Run the register initialization sequence
    ///
    /// Stops at the first failing write. The driver then moves to
    /// `DriverState::Failed` and releases the handle; no later write is issued.
    pub fn initialize(&mut self) -> Result<()> {
        if let DriverState::Failed(_) = self.state {
            return Err(Mma8452qError::NotReady(self.state.clone()));
        }

        for write in INIT_SEQUENCE {
            if let Err(e) = self.write_register(write) {
                let err = Mma8452qError::InitFailed {
                    register: write.register,
                    value: write.value,
                    source: Box::new(e),
                };
                error!("MMA8452Q initialization failed: {}", err);
                self.state = DriverState::Failed(err.to_string());
                self.close();
                return Err(err);
            }
        }

        self.state = DriverState::Ready;
        info!("MMA8452Q initialized (±2g, active)");
        Ok(())
    }

    /// Write a single byte to a register
    fn write_register(&mut self, write: RegisterWrite) -> Result<()> {
        debug!("Write register 0x{:02X} <- 0x{:02X}", write.register, write.value);
        let bus = self.bus.as_mut().ok_or(Mma8452qError::HandleClosed)?;
        bus.write(&write.bytes())
    }

    /// Read STATUS and the three axis registers in one transaction
    ///
    /// The register pointer auto-increments across the burst, so the address
    /// write and the 7-byte read must be a single write-read.
    pub fn read_frame(&mut self) -> Result<RawFrame> {
        if self.state != DriverState::Ready {
            return Err(Mma8452qError::NotReady(self.state.clone()));
        }
        let bus = self.bus.as_mut().ok_or(Mma8452qError::HandleClosed)?;

        let mut buffer = [0u8; FRAME_LEN];
        let received = bus.write_read(&[REG_STATUS], &mut buffer)?;
        let frame = RawFrame::from_bytes(&buffer[..received.min(FRAME_LEN)])?;

        debug!("Frame: {:02X?}", frame.as_bytes());
        Ok(frame)
    }

    /// Read and decode one acceleration sample
    pub fn read(&mut self) -> Result<Acceleration> {
        let frame = self.read_frame()?;
        Ok(decode(&frame))
    }

    /// Release the bus handle. Safe to call any number of times.
    pub fn close(&mut self) {
        if self.bus.take().is_some() {
            debug!("Released MMA8452Q handle on {}", self.controller);
        }
    }
}

impl<B: I2cBus> Drop for Mma8452q<B> {
    fn drop(&mut self) {
        self.close();
    }
}
