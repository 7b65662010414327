//! Device discovery, claiming and release.

use tracing::{debug, error, info, warn};

use super::handle::{platform_requires_driver_reattach, UsbBus, UsbCandidate, UsbHandle};
use super::session::{Session, INTERFACE};
use crate::matrix::{GlyphTable, LedMatrix};
use crate::{Result, MATRIX_PID, MATRIX_VID};

/// Configuration value selected before claiming.
const CONFIGURATION: u8 = 1;

/// Finds LED matrix modules on a bus and turns them into sessions.
///
/// The manager owns the bus (for libusb, the process-wide context). Session
/// ids are handed out in enumeration order starting at 1.
pub struct UsbManager<B: UsbBus = rusb::Context> {
    bus: B,
    next_id: u32,
    detach_drivers: bool,
}

impl UsbManager<rusb::Context> {
    /// Initializes libusb.
    ///
    /// A context that cannot be created is returned as an error so the
    /// caller can tell "no USB" apart from "no devices". Once a manager
    /// exists, [`enumerate`](Self::enumerate) never fails: listing errors
    /// and unusable devices yield a smaller, possibly empty, set.
    pub fn new() -> Result<Self> {
        debug!("[USB] Initializing libusb");
        let context = rusb::Context::new().map_err(|e| {
            error!("[USB] Failed to initialize libusb: {}", e);
            e
        })?;
        Ok(Self::with_bus(context))
    }
}

impl<B: UsbBus> UsbManager<B>
where
    <B::Candidate as UsbCandidate>::Handle: 'static,
{
    /// Wraps an existing bus. Kernel driver handling follows the platform.
    pub fn with_bus(bus: B) -> Self {
        Self {
            bus,
            next_id: 1,
            detach_drivers: platform_requires_driver_reattach(),
        }
    }

    /// Overrides whether kernel drivers are detached before claiming.
    pub fn detach_kernel_drivers(mut self, detach: bool) -> Self {
        self.detach_drivers = detach;
        self
    }

    /// Opens and claims every matching device, wrapped in the drawing API.
    pub fn enumerate(&mut self) -> Vec<LedMatrix> {
        let glyphs = GlyphTable::builtin();
        self.enumerate_sessions()
            .into_iter()
            .map(|session| LedMatrix::new(session, glyphs.clone()))
            .collect()
    }

    /// Opens and claims every matching device.
    ///
    /// A device that cannot be opened, configured or claimed is closed and
    /// skipped. A failure to list devices yields an empty set.
    pub fn enumerate_sessions(&mut self) -> Vec<Session> {
        debug!("[USB] Listing USB devices");
        let candidates = match self.bus.candidates() {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("[USB] Failed to get device list: {}", e);
                return Vec::new();
            }
        };

        let mut sessions = Vec::new();
        for (index, candidate) in candidates.iter().enumerate() {
            match candidate.ids() {
                Ok((vid, pid)) if vid == MATRIX_VID && pid == MATRIX_PID => {}
                Ok(_) => continue,
                Err(e) => {
                    error!(
                        "[USB] Failed to get device descriptor for device index {}: {}",
                        index, e
                    );
                    continue;
                }
            }

            debug!("[USB] Found LED matrix at device index {}", index);
            match self.claim(candidate) {
                Ok((handle, detached)) => {
                    let id = self.next_id;
                    self.next_id += 1;
                    info!(
                        "LED matrix {} claimed (VID:{:04X} PID:{:04X}, interface={})",
                        id, MATRIX_VID, MATRIX_PID, INTERFACE
                    );
                    sessions.push(Session::new(id, Box::new(handle), detached));
                }
                Err(e) => {
                    error!("[USB] Skipping device index {}: {}", index, e);
                }
            }
        }

        sessions
    }

    /// Open, configure, detach if needed, claim. The handle is closed by
    /// dropping it on any failure.
    fn claim(
        &self,
        candidate: &B::Candidate,
    ) -> rusb::Result<(<B::Candidate as UsbCandidate>::Handle, bool)> {
        let mut handle = candidate.open()?;
        debug!("[USB] Successfully opened device");

        match handle.set_active_configuration(CONFIGURATION) {
            Ok(()) => {}
            Err(rusb::Error::Busy) => debug!("[USB] Configuration busy, continuing"),
            Err(e) => {
                error!("[USB] Failed to set configuration: {}", e);
                return Err(e);
            }
        }

        let mut detached = false;
        if self.detach_drivers && handle.kernel_driver_active(INTERFACE).unwrap_or(false) {
            if let Err(e) = handle.detach_kernel_driver(INTERFACE) {
                error!("[USB] Could not detach kernel driver: {}", e);
                return Err(e);
            }
            detached = true;
        }

        if let Err(e) = handle.claim_interface(INTERFACE) {
            error!("[USB] Could not claim interface {}: {}", INTERFACE, e);
            if detached {
                if let Err(e) = handle.attach_kernel_driver(INTERFACE) {
                    warn!("[USB] Could not attach kernel driver: {}", e);
                }
            }
            return Err(e);
        }

        debug!("[USB] Successfully claimed interface {}", INTERFACE);
        Ok((handle, detached))
    }
}

/// Tears down every device, in order.
pub fn teardown_all(matrices: Vec<LedMatrix>) {
    debug!("[USB] Freeing resources");
    for matrix in matrices {
        matrix.teardown();
    }
}
