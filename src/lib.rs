//! Host-side interface library for the MMA8452Q 3-axis accelerometer
//!
//! The sensor sits on an I2C bus reached through a platform service: the Linux
//! i2c-dev nodes, or an FT232H USB-to-I2C bridge via libMPSSE (feature `ftdi`).
//! Samples are raw 12-bit counts at the ±2g range.
//!
//! # Quick Start
//!
//! ## Single Read
//! ```no_run
//! # #[cfg(target_os = "linux")]
//! # fn main() -> mma8452q_interface::Result<()> {
//! use mma8452q_interface::{platform::LinuxPlatform, Mma8452q};
//!
//! let mut sensor = Mma8452q::connect(&LinuxPlatform::new())?;
//! let accel = sensor.read()?;
//! println!("X: {} Y: {} Z: {}", accel.x, accel.y, accel.z);
//! # Ok(())
//! # }
//! # #[cfg(not(target_os = "linux"))]
//! # fn main() {}
//! ```
//!
//! ## Polling Thread
//! ```no_run
//! # #[cfg(target_os = "linux")]
//! # fn main() {
//! use mma8452q_interface::{platform::LinuxPlatform, PollingLoop, SensorEvent};
//! use std::sync::mpsc;
//!
//! let (tx, rx) = mpsc::channel();
//! let poller = PollingLoop::start(LinuxPlatform::new(), tx);
//!
//! for event in rx.iter().take(10) {
//!     match event {
//!         SensorEvent::Reading(a) => println!("{} {} {}", a.x, a.y, a.z),
//!         SensorEvent::Halted(text) => {
//!             eprintln!("{}", text);
//!             break;
//!         }
//!         SensorEvent::Status(text) | SensorEvent::Error(text) => println!("{}", text),
//!     }
//! }
//!
//! poller.shutdown();
//! # }
//! # #[cfg(not(target_os = "linux"))]
//! # fn main() {}
//! ```

pub mod bus;
pub mod common;
pub mod error;
#[cfg(feature = "ftdi")]
mod ffi;
pub mod frame;
pub mod locator;
pub mod mma8452q;
pub mod platform;
pub mod poller;

// Re-export public API
pub use bus::{BusSpeed, ControllerId, I2cBus, I2cPlatform};
pub use common::{axis_bar, axis_lines};
pub use error::{ErrorKind, Mma8452qError, Result};
pub use frame::{decode, Acceleration, RawFrame};
pub use locator::find_controller;
pub use mma8452q::{DriverState, Mma8452q, RegisterWrite, INIT_SEQUENCE, MMA8452Q_ADDRESS};
pub use poller::{PollStatus, PollingLoop, SensorEvent, DEVICE_LABEL, POLL_INTERVAL};
