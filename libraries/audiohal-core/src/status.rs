//! Raw driver status codes
//!
//! Drivers report results the way the legacy C ABI does: `0` for success and a
//! negated errno value otherwise. Sized transfers (`write`/`read`) return a
//! signed byte count where negative values are statuses.

use crate::error::{HalError, Result};

/// Raw status code as returned by a driver entry point
pub type Status = i32;

/// Success
pub const OK: Status = 0;
/// Stream or device not initialized (`-ENODEV`)
pub const NO_INIT: Status = -19;
/// Entry point not implemented (`-ENOSYS`)
pub const INVALID_OPERATION: Status = -38;
/// Operation not supported on this stream (`-EOPNOTSUPP`)
pub const NOT_SUPPORTED: Status = -95;
/// Malformed or out-of-range argument (`-EINVAL`)
pub const BAD_VALUE: Status = -22;
/// Transport or hardware failure (`-EIO`)
pub const IO_ERROR: Status = -5;
/// Peer went away mid-transfer (`-EPIPE`)
pub const DEAD_OBJECT: Status = -32;
/// Resource busy (`-EBUSY`)
pub const BUSY: Status = -16;
/// Requested transition already in effect (`-EALREADY`)
pub const ALREADY: Status = -114;
/// Catch-all for drivers that do not say what went wrong
pub const UNKNOWN_ERROR: Status = i32::MIN;

/// Convert a raw status into a `Result`.
pub fn check(status: Status) -> Result<()> {
    match HalError::from_status(status) {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

/// Convert a signed transfer count (`ssize_t` style) into a byte count.
pub fn check_size(transferred: isize) -> Result<usize> {
    if transferred >= 0 {
        return Ok(transferred as usize);
    }
    let status = Status::try_from(transferred).unwrap_or(UNKNOWN_ERROR);
    Err(HalError::from_status(status).unwrap_or(HalError::Unknown(status)))
}
