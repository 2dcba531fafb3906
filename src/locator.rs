//! I2C controller discovery

use log::{debug, error};

use crate::bus::{ControllerId, I2cPlatform};
use crate::error::{Mma8452qError, Result};

/// Return the first I2C controller the platform reports
///
/// Not retried: an empty enumeration is reported as
/// [`Mma8452qError::NoControllerFound`].
pub fn find_controller<P: I2cPlatform + ?Sized>(platform: &P) -> Result<ControllerId> {
    let controllers = platform.list_i2c_controllers()?;
    debug!("Found {} I2C controller(s): {:?}", controllers.len(), controllers);

    match controllers.into_iter().next() {
        Some(controller) => Ok(controller),
        None => {
            error!("No I2C controllers were found on the system");
            Err(Mma8452qError::NoControllerFound)
        }
    }
}
