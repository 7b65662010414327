//! USB transport and device lifecycle.

mod handle;
mod manager;
mod session;

#[cfg(test)]
pub(crate) mod mock;

pub use handle::{platform_requires_driver_reattach, UsbBus, UsbCandidate, UsbHandle};
pub use manager::{teardown_all, UsbManager};
pub use session::{Response, Session, ENDPOINT_IN, ENDPOINT_OUT, INTERFACE, TRANSFER_TIMEOUT};
