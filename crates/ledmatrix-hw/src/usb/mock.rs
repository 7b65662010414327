//! Recording stand-ins for libusb used by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::handle::{UsbBus, UsbCandidate, UsbHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    WriteBulk(u8, Vec<u8>),
    ReadBulk(u8, usize),
    SetConfiguration(u8),
    KernelDriverActive(u8),
    DetachKernelDriver(u8),
    AttachKernelDriver(u8),
    ClaimInterface(u8),
    ReleaseInterface(u8),
    Reset,
    Close,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    responses: VecDeque<Vec<u8>>,
    short_write: Option<usize>,
    kernel_driver_active: bool,
    write_error: Option<rusb::Error>,
    read_error: Option<rusb::Error>,
    config_error: Option<rusb::Error>,
    detach_error: Option<rusb::Error>,
    claim_error: Option<rusb::Error>,
    release_error: Option<rusb::Error>,
    attach_error: Option<rusb::Error>,
    reset_error: Option<rusb::Error>,
}

/// Shared call log plus scripted failures.
///
/// Clones share state. Only handles obtained through [`MockHandle::handle`]
/// record a `Close` when dropped, mirroring the one real device handle.
#[derive(Default)]
pub struct MockHandle {
    state: Arc<Mutex<State>>,
    owner: bool,
}

impl Clone for MockHandle {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            owner: false,
        }
    }
}

impl MockHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle a successful open would yield.
    pub fn handle(&self) -> MockHandle {
        Self {
            state: self.state.clone(),
            owner: true,
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    fn record(&self, call: Call) {
        self.with(|s| s.calls.push(call));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub fn count(&self, call: &Call) -> usize {
        self.with(|s| s.calls.iter().filter(|c| *c == call).count())
    }

    /// Payloads of every bulk OUT transfer, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.with(|s| {
            s.calls
                .iter()
                .filter_map(|c| match c {
                    Call::WriteBulk(_, data) => Some(data.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn push_response(&self, data: Vec<u8>) {
        self.with(|s| s.responses.push_back(data));
    }

    pub fn set_short_write(&self, written: usize) {
        self.with(|s| s.short_write = Some(written));
    }

    pub fn set_kernel_driver_active(&self, active: bool) {
        self.with(|s| s.kernel_driver_active = active);
    }

    pub fn fail_write(&self, e: rusb::Error) {
        self.with(|s| s.write_error = Some(e));
    }

    pub fn fail_read(&self, e: rusb::Error) {
        self.with(|s| s.read_error = Some(e));
    }

    pub fn fail_configuration(&self, e: rusb::Error) {
        self.with(|s| s.config_error = Some(e));
    }

    pub fn fail_detach(&self, e: rusb::Error) {
        self.with(|s| s.detach_error = Some(e));
    }

    pub fn fail_claim(&self, e: rusb::Error) {
        self.with(|s| s.claim_error = Some(e));
    }

    pub fn fail_release(&self, e: rusb::Error) {
        self.with(|s| s.release_error = Some(e));
    }

    pub fn fail_attach(&self, e: rusb::Error) {
        self.with(|s| s.attach_error = Some(e));
    }

    pub fn fail_reset(&self, e: rusb::Error) {
        self.with(|s| s.reset_error = Some(e));
    }
}

fn outcome(error: Option<rusb::Error>) -> rusb::Result<()> {
    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

impl UsbHandle for MockHandle {
    fn write_bulk(&self, endpoint: u8, buf: &[u8], _timeout: Duration) -> rusb::Result<usize> {
        self.record(Call::WriteBulk(endpoint, buf.to_vec()));
        self.with(|s| match s.write_error {
            Some(e) => Err(e),
            None => Ok(s.short_write.unwrap_or(buf.len())),
        })
    }

    fn read_bulk(&self, endpoint: u8, buf: &mut [u8], _timeout: Duration) -> rusb::Result<usize> {
        self.record(Call::ReadBulk(endpoint, buf.len()));
        self.with(|s| {
            if let Some(e) = s.read_error {
                return Err(e);
            }
            let data = s.responses.pop_front().ok_or(rusb::Error::Timeout)?;
            let len = data.len().min(buf.len());
            buf[..len].copy_from_slice(&data[..len]);
            Ok(len)
        })
    }

    fn set_active_configuration(&mut self, config: u8) -> rusb::Result<()> {
        self.record(Call::SetConfiguration(config));
        outcome(self.with(|s| s.config_error))
    }

    fn kernel_driver_active(&self, iface: u8) -> rusb::Result<bool> {
        self.record(Call::KernelDriverActive(iface));
        Ok(self.with(|s| s.kernel_driver_active))
    }

    fn detach_kernel_driver(&mut self, iface: u8) -> rusb::Result<()> {
        self.record(Call::DetachKernelDriver(iface));
        outcome(self.with(|s| s.detach_error))
    }

    fn attach_kernel_driver(&mut self, iface: u8) -> rusb::Result<()> {
        self.record(Call::AttachKernelDriver(iface));
        outcome(self.with(|s| s.attach_error))
    }

    fn claim_interface(&mut self, iface: u8) -> rusb::Result<()> {
        self.record(Call::ClaimInterface(iface));
        outcome(self.with(|s| s.claim_error))
    }

    fn release_interface(&mut self, iface: u8) -> rusb::Result<()> {
        self.record(Call::ReleaseInterface(iface));
        outcome(self.with(|s| s.release_error))
    }

    fn reset(&mut self) -> rusb::Result<()> {
        self.record(Call::Reset);
        outcome(self.with(|s| s.reset_error))
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        if self.owner {
            if let Ok(mut state) = self.state.lock() {
                state.calls.push(Call::Close);
            }
        }
    }
}

/// A device on the mock bus.
#[derive(Clone)]
pub struct MockCandidate {
    pub vendor_id: u16,
    pub product_id: u16,
    pub handle: MockHandle,
    pub open_error: Option<rusb::Error>,
}

impl MockCandidate {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            handle: MockHandle::new(),
            open_error: None,
        }
    }
}

impl UsbCandidate for MockCandidate {
    type Handle = MockHandle;

    fn ids(&self) -> rusb::Result<(u16, u16)> {
        Ok((self.vendor_id, self.product_id))
    }

    fn open(&self) -> rusb::Result<MockHandle> {
        match self.open_error {
            Some(e) => Err(e),
            None => Ok(self.handle.handle()),
        }
    }
}

#[derive(Default)]
pub struct MockBus {
    pub devices: Vec<MockCandidate>,
    pub list_error: Option<rusb::Error>,
}

impl UsbBus for MockBus {
    type Candidate = MockCandidate;

    fn candidates(&self) -> rusb::Result<Vec<MockCandidate>> {
        match self.list_error {
            Some(e) => Err(e),
            None => Ok(self.devices.clone()),
        }
    }
}
