//! Concrete I2C platforms
//!
//! - `linux`: kernel i2c-dev character devices (`/dev/i2c-N`)
//! - `ftdi`: FT232H USB-to-I2C bridge through libMPSSE (feature `ftdi`)

#[cfg(feature = "ftdi")]
pub mod ftdi;
#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(feature = "ftdi")]
pub use ftdi::FtdiPlatform;
#[cfg(target_os = "linux")]
pub use linux::LinuxPlatform;
