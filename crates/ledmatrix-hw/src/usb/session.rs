//! One claimed LED matrix interface and its bulk transfers.

use std::time::Duration;
use tracing::{debug, error, trace, warn};

use super::handle::UsbHandle;
use crate::matrix::protocol::{frame, Command, RESPONSE_SIZE};
use crate::{Error, Result};

/// Interface carrying the command endpoints.
pub const INTERFACE: u8 = 1;

/// Bulk OUT endpoint for command frames.
pub const ENDPOINT_OUT: u8 = 0x01;

/// Bulk IN endpoint for responses.
pub const ENDPOINT_IN: u8 = 0x82;

/// Timeout applied to every bulk transfer.
pub const TRANSFER_TIMEOUT: Duration = Duration::from_millis(1000);

/// Outcome of a command that expects a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The device answered. May legitimately be empty.
    Received(Vec<u8>),
    /// The write or the read failed; no data is available.
    Unavailable,
}

impl Response {
    /// Returns the received bytes, if any transfer succeeded.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Response::Received(data) => Some(data),
            Response::Unavailable => None,
        }
    }

    /// Returns the first received byte. Empty and failed responses are `None`.
    pub fn first_byte(&self) -> Option<u8> {
        self.bytes().and_then(|data| data.first().copied())
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Response::Received(_))
    }
}

type TeardownStep = (&'static str, fn(&mut dyn UsbHandle) -> rusb::Result<()>);

fn reset(handle: &mut dyn UsbHandle) -> rusb::Result<()> {
    handle.reset()
}

fn release(handle: &mut dyn UsbHandle) -> rusb::Result<()> {
    handle.release_interface(INTERFACE)
}

fn reattach(handle: &mut dyn UsbHandle) -> rusb::Result<()> {
    handle.attach_kernel_driver(INTERFACE)
}

/// Teardown order. The last step only applies when a driver was detached.
const TEARDOWN_STEPS: [TeardownStep; 3] = [
    ("reset device", reset),
    ("release interface", release),
    ("attach kernel driver", reattach),
];

/// An open device with interface 1 claimed.
///
/// Commands take `&mut self`, so a session never has two transfers in
/// flight. [`Session::teardown`] consumes the session; dropping it without
/// an explicit teardown performs the same steps.
pub struct Session {
    id: u32,
    handle: Option<Box<dyn UsbHandle>>,
    reattach_driver: bool,
}

impl Session {
    /// Wraps an already configured and claimed handle.
    ///
    /// `reattach_driver` records that a kernel driver was detached from the
    /// interface and has to be given back on teardown.
    pub fn new(id: u32, handle: Box<dyn UsbHandle>, reattach_driver: bool) -> Self {
        Self {
            id,
            handle: Some(handle),
            reattach_driver,
        }
    }

    /// Small integer identity assigned at enumeration.
    pub fn id(&self) -> u32 {
        self.id
    }

    fn handle(&self) -> Result<&dyn UsbHandle> {
        self.handle
            .as_deref()
            .ok_or(Error::Usb(rusb::Error::NoDevice))
    }

    /// Frames and sends a command.
    pub fn send(&mut self, command: Command, parameters: &[u8]) -> Result<()> {
        trace!(
            "Sending command {:?} with {} parameters to device {}",
            command,
            parameters.len(),
            self.id
        );
        self.send_frame(&frame(command, parameters))
    }

    /// Writes a prebuilt frame with one bulk OUT transfer.
    ///
    /// Failures are logged here; a short write is reported but not retried.
    pub fn send_frame(&mut self, data: &[u8]) -> Result<()> {
        let written = self
            .handle()?
            .write_bulk(ENDPOINT_OUT, data, TRANSFER_TIMEOUT)
            .map_err(|e| {
                error!("Bulk OUT transfer failed on device {}: {}", self.id, e);
                Error::Usb(e)
            })?;

        if written != data.len() {
            error!(
                "Bulk OUT transfer size does not match on device {}. Expected {}; Got {}",
                self.id,
                data.len(),
                written
            );
            return Err(Error::ShortWrite {
                expected: data.len(),
                actual: written,
            });
        }

        Ok(())
    }

    /// Sends a command, then reads one response of up to 32 bytes.
    pub fn send_with_response(&mut self, command: Command, parameters: &[u8]) -> Response {
        if let Err(e) = self.send(command, parameters) {
            if !matches!(e, Error::ShortWrite { .. }) {
                return Response::Unavailable;
            }
        }

        let handle = match self.handle() {
            Ok(handle) => handle,
            Err(_) => return Response::Unavailable,
        };

        let mut buffer = vec![0u8; RESPONSE_SIZE];
        match handle.read_bulk(ENDPOINT_IN, &mut buffer, TRANSFER_TIMEOUT) {
            Ok(read) => {
                buffer.truncate(read);
                trace!("Device {} responded with {:02X?}", self.id, buffer);
                Response::Received(buffer)
            }
            Err(e) => {
                error!("Bulk IN transfer failed on device {}: {}", self.id, e);
                Response::Unavailable
            }
        }
    }

    /// Resets the device, releases the interface, gives the interface back
    /// to the kernel driver if one was detached, then closes the handle.
    ///
    /// Every step runs exactly once even when an earlier one fails.
    pub fn teardown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };

        debug!("Tearing down device {}", self.id);

        let steps = if self.reattach_driver {
            &TEARDOWN_STEPS[..]
        } else {
            &TEARDOWN_STEPS[..2]
        };
        for (name, step) in steps {
            if let Err(e) = step(&mut *handle) {
                warn!("Could not {} on device {}: {}", name, self.id, e);
            }
        }

        drop(handle);
        debug!("Device {} closed", self.id);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("open", &self.handle.is_some())
            .field("reattach_driver", &self.reattach_driver)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::mock::{Call, MockHandle};

    #[test]
    fn test_send_writes_frame() {
        let mock = MockHandle::new();
        let mut session = Session::new(1, Box::new(mock.handle()), false);

        session.send(Command::Brightness, &[42]).unwrap();

        assert_eq!(mock.writes(), vec![vec![0x32, 0xAC, 0x00, 42]]);
        assert!(mock
            .calls()
            .contains(&Call::WriteBulk(ENDPOINT_OUT, vec![0x32, 0xAC, 0x00, 42])));
    }

    #[test]
    fn test_send_reports_short_write() {
        let mock = MockHandle::new();
        mock.set_short_write(2);
        let mut session = Session::new(1, Box::new(mock.handle()), false);

        let err = session.send(Command::Animate, &[1]).unwrap_err();
        assert!(matches!(
            err,
            Error::ShortWrite {
                expected: 4,
                actual: 2
            }
        ));
        assert_eq!(mock.writes().len(), 1);
    }

    #[test]
    fn test_send_reports_transfer_error() {
        let mock = MockHandle::new();
        mock.fail_write(rusb::Error::Timeout);
        let mut session = Session::new(1, Box::new(mock.handle()), false);

        let err = session.send(Command::Draw, &[0; 39]).unwrap_err();
        assert!(matches!(err, Error::Usb(rusb::Error::Timeout)));
    }

    #[test]
    fn test_response_truncated_to_received() {
        let mock = MockHandle::new();
        mock.push_response(vec![0x7F]);
        let mut session = Session::new(1, Box::new(mock.handle()), false);

        let response = session.send_with_response(Command::Brightness, &[]);
        assert_eq!(response, Response::Received(vec![0x7F]));
        assert_eq!(response.first_byte(), Some(0x7F));
        assert!(mock.calls().contains(&Call::ReadBulk(ENDPOINT_IN, RESPONSE_SIZE)));
    }

    #[test]
    fn test_empty_reply_is_not_failure() {
        let mock = MockHandle::new();
        mock.push_response(vec![]);
        let mut session = Session::new(1, Box::new(mock), false);

        let response = session.send_with_response(Command::Version, &[]);
        assert_eq!(response, Response::Received(vec![]));
        assert!(response.is_available());
        assert_eq!(response.first_byte(), None);
    }

    #[test]
    fn test_short_write_still_reads() {
        let mock = MockHandle::new();
        mock.set_short_write(2);
        mock.push_response(vec![7]);
        let mut session = Session::new(1, Box::new(mock.handle()), false);

        let response = session.send_with_response(Command::Version, &[]);
        assert_eq!(response, Response::Received(vec![7]));
        assert_eq!(
            mock.calls(),
            vec![
                Call::WriteBulk(ENDPOINT_OUT, vec![0x32, 0xAC, 0x20]),
                Call::ReadBulk(ENDPOINT_IN, RESPONSE_SIZE),
            ]
        );
    }

    #[test]
    fn test_failed_write_skips_read() {
        let mock = MockHandle::new();
        mock.fail_write(rusb::Error::Pipe);
        mock.push_response(vec![1]);
        let mut session = Session::new(1, Box::new(mock.handle()), false);

        assert_eq!(
            session.send_with_response(Command::Animate, &[]),
            Response::Unavailable
        );
        assert!(!mock.calls().iter().any(|c| matches!(c, Call::ReadBulk(..))));
    }

    #[test]
    fn test_failed_read_is_unavailable() {
        let mock = MockHandle::new();
        mock.fail_read(rusb::Error::Timeout);
        let mut session = Session::new(1, Box::new(mock), false);

        let response = session.send_with_response(Command::PwmFreq, &[]);
        assert_eq!(response, Response::Unavailable);
        assert_eq!(response.bytes(), None);
    }

    #[test]
    fn test_teardown_runs_every_step_once() {
        let mock = MockHandle::new();
        mock.fail_reset(rusb::Error::NotFound);
        let session = Session::new(3, Box::new(mock.handle()), true);

        session.teardown();

        assert_eq!(
            mock.calls(),
            vec![
                Call::Reset,
                Call::ReleaseInterface(INTERFACE),
                Call::AttachKernelDriver(INTERFACE),
                Call::Close,
            ]
        );
    }

    #[test]
    fn test_teardown_skips_reattach_without_detach() {
        let mock = MockHandle::new();
        let session = Session::new(1, Box::new(mock.handle()), false);

        session.teardown();

        assert_eq!(
            mock.calls(),
            vec![
                Call::Reset,
                Call::ReleaseInterface(INTERFACE),
                Call::Close,
            ]
        );
    }

    #[test]
    fn test_teardown_continues_when_every_step_fails() {
        let mock = MockHandle::new();
        mock.fail_reset(rusb::Error::NoDevice);
        mock.fail_release(rusb::Error::NoDevice);
        mock.fail_attach(rusb::Error::NoDevice);
        let session = Session::new(2, Box::new(mock.handle()), true);

        session.teardown();

        assert_eq!(
            mock.calls(),
            vec![
                Call::Reset,
                Call::ReleaseInterface(INTERFACE),
                Call::AttachKernelDriver(INTERFACE),
                Call::Close,
            ]
        );
    }

    #[test]
    fn test_drop_tears_down_once() {
        let mock = MockHandle::new();
        {
            let _session = Session::new(1, Box::new(mock.handle()), false);
        }
        assert_eq!(mock.count(&Call::Reset), 1);
        assert_eq!(mock.count(&Call::Close), 1);
    }
}
