//! Seams between the engine and libusb.
//!
//! [`UsbHandle`] covers everything done to one opened device, [`UsbBus`]
//! and [`UsbCandidate`] cover listing and opening. The rusb types implement
//! them; tests substitute recording mocks.

use std::time::Duration;

/// Operations on one opened USB device.
pub trait UsbHandle: Send {
    fn write_bulk(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize>;

    fn read_bulk(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> rusb::Result<usize>;

    fn set_active_configuration(&mut self, config: u8) -> rusb::Result<()>;

    fn kernel_driver_active(&self, iface: u8) -> rusb::Result<bool>;

    fn detach_kernel_driver(&mut self, iface: u8) -> rusb::Result<()>;

    fn attach_kernel_driver(&mut self, iface: u8) -> rusb::Result<()>;

    fn claim_interface(&mut self, iface: u8) -> rusb::Result<()>;

    fn release_interface(&mut self, iface: u8) -> rusb::Result<()>;

    fn reset(&mut self) -> rusb::Result<()>;
}

/// A device seen on the bus that has not been opened yet.
pub trait UsbCandidate {
    type Handle: UsbHandle;

    /// Returns `(vendor id, product id)` from the device descriptor.
    fn ids(&self) -> rusb::Result<(u16, u16)>;

    fn open(&self) -> rusb::Result<Self::Handle>;
}

/// Something that can list attached devices.
pub trait UsbBus {
    type Candidate: UsbCandidate;

    fn candidates(&self) -> rusb::Result<Vec<Self::Candidate>>;
}

/// Returns true where an interface may be bound to a kernel driver that has
/// to be detached before claiming and reattached after release.
pub fn platform_requires_driver_reattach() -> bool {
    cfg!(target_os = "linux") && rusb::supports_detach_kernel_driver()
}

impl<T: rusb::UsbContext> UsbHandle for rusb::DeviceHandle<T> {
    fn write_bulk(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize> {
        rusb::DeviceHandle::write_bulk(self, endpoint, buf, timeout)
    }

    fn read_bulk(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> rusb::Result<usize> {
        rusb::DeviceHandle::read_bulk(self, endpoint, buf, timeout)
    }

    fn set_active_configuration(&mut self, config: u8) -> rusb::Result<()> {
        rusb::DeviceHandle::set_active_configuration(self, config)
    }

    fn kernel_driver_active(&self, iface: u8) -> rusb::Result<bool> {
        rusb::DeviceHandle::kernel_driver_active(self, iface)
    }

    fn detach_kernel_driver(&mut self, iface: u8) -> rusb::Result<()> {
        rusb::DeviceHandle::detach_kernel_driver(self, iface)
    }

    fn attach_kernel_driver(&mut self, iface: u8) -> rusb::Result<()> {
        rusb::DeviceHandle::attach_kernel_driver(self, iface)
    }

    fn claim_interface(&mut self, iface: u8) -> rusb::Result<()> {
        rusb::DeviceHandle::claim_interface(self, iface)
    }

    fn release_interface(&mut self, iface: u8) -> rusb::Result<()> {
        rusb::DeviceHandle::release_interface(self, iface)
    }

    fn reset(&mut self) -> rusb::Result<()> {
        rusb::DeviceHandle::reset(self)
    }
}

impl<T: rusb::UsbContext + 'static> UsbCandidate for rusb::Device<T> {
    type Handle = rusb::DeviceHandle<T>;

    fn ids(&self) -> rusb::Result<(u16, u16)> {
        let descriptor = self.device_descriptor()?;
        Ok((descriptor.vendor_id(), descriptor.product_id()))
    }

    fn open(&self) -> rusb::Result<Self::Handle> {
        rusb::Device::open(self)
    }
}

impl UsbBus for rusb::Context {
    type Candidate = rusb::Device<rusb::Context>;

    fn candidates(&self) -> rusb::Result<Vec<Self::Candidate>> {
        Ok(rusb::UsbContext::devices(self)?.iter().collect())
    }
}
