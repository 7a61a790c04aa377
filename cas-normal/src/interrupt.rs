//! Cooperative cancellation.
//!
//! Any thread may raise the flag. It is polled once at the entry of each top-level call, which
//! then fails with [`UserInterrupt`] and lowers the flag again. Work already under way is not
//! stopped.

use crate::error::UserInterrupt;
use cas_error::Error;
use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPT: AtomicBool = AtomicBool::new(false);

/// Asks the next top-level call to stop.
pub fn request_interrupt() {
    INTERRUPT.store(true, Ordering::SeqCst);
}

/// Lowers the flag without reporting it.
pub fn clear_interrupt() {
    INTERRUPT.store(false, Ordering::SeqCst);
}

/// Returns true if an interrupt is pending.
pub fn is_interrupted() -> bool {
    INTERRUPT.load(Ordering::SeqCst)
}

/// Fails with [`UserInterrupt`] if the flag is raised, lowering it.
pub(crate) fn poll() -> Result<(), Error> {
    if INTERRUPT.swap(false, Ordering::SeqCst) {
        return Err(Error::unspanned(UserInterrupt));
    }
    Ok(())
}
