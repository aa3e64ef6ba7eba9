//! Typed command layer over the USB link.
//!
//! Every JTAG and SWD operation reduces to a single `0xCF` IO-transaction: a header,
//! bit-packed TMS/TDI buffers, and a trailing status byte.

use std::time::Duration;

use crate::bits::bytes_for_bits;
use crate::error::{Error, LinkError};
use crate::usb::{UsbLink, DEFAULT_TIMEOUT};

/// Maximum number of cycles a single IO-transaction may carry.
pub const MAX_CYCLES: u32 = 4096;

const CMD_IO_TRANSACT: u8 = 0xCF;

/// Anything that can perform the USB-level request/reply primitive.
///
/// Implemented by [`UsbLink`] for real hardware, and by an in-memory mock for tests.
pub trait Transport {
    fn transfer(
        &self,
        out: Option<&[u8]>,
        in_len: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>, LinkError>;
}

impl Transport for UsbLink {
    fn transfer(
        &self,
        out: Option<&[u8]>,
        in_len: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>, LinkError> {
        UsbLink::transfer(self, out, in_len, timeout)
    }
}

/// The J-Link wire-command layer.
pub struct PacketLayer<T> {
    transport: T,
    timeout: Duration,
}

impl<T: Transport> PacketLayer<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a single command byte and reads back `n` bytes.
    pub fn simple_query(&self, cmd: u8, n: usize) -> Result<Vec<u8>, Error> {
        Ok(self.transport.transfer(Some(&[cmd]), n, self.timeout)?)
    }

    /// Sends `cmd` followed by an 8-bit little-endian operand; reads back `n` bytes.
    pub fn simple_request_u8(&self, cmd: u8, arg: u8, n: usize) -> Result<Vec<u8>, Error> {
        Ok(self.transport.transfer(Some(&[cmd, arg]), n, self.timeout)?)
    }

    /// Sends `cmd` followed by a 16-bit little-endian operand; reads back `n` bytes.
    pub fn simple_request_u16(&self, cmd: u8, arg: u16, n: usize) -> Result<Vec<u8>, Error> {
        let mut buf = [0u8; 3];
        buf[0] = cmd;
        buf[1..3].copy_from_slice(&arg.to_le_bytes());
        Ok(self.transport.transfer(Some(&buf), n, self.timeout)?)
    }

    /// Sends `cmd` followed by a 32-bit little-endian operand; reads back `n` bytes.
    pub fn simple_request_u32(&self, cmd: u8, arg: u32, n: usize) -> Result<Vec<u8>, Error> {
        let mut buf = [0u8; 5];
        buf[0] = cmd;
        buf[1..5].copy_from_slice(&arg.to_le_bytes());
        Ok(self.transport.transfer(Some(&buf), n, self.timeout)?)
    }

    /// Performs one `0xCF` IO-transaction: `cycles` TMS/direction bits in `tms_or_dir`
    /// and `cycles` TDI/data-out bits in `tdi_or_out`, both byte-padded to
    /// `⌈cycles/8⌉` bytes. Returns the TDO/data-in bytes plus the trailing status
    /// byte (0 = OK). `cycles == 0` is a no-op that never touches the wire;
    /// `cycles > MAX_CYCLES` is rejected before any I/O.
    pub fn io_transact(
        &self,
        cycles: u32,
        tms_or_dir: &[u8],
        tdi_or_out: &[u8],
    ) -> Result<(Vec<u8>, u8), Error> {
        if cycles == 0 {
            return Ok((Vec::new(), 0));
        }
        if cycles > MAX_CYCLES {
            return Err(Error::InvalidArgument(format!(
                "cycle count {cycles} exceeds the {MAX_CYCLES}-cycle limit"
            )));
        }

        let n_bytes = bytes_for_bits(cycles as usize);
        assert_eq!(tms_or_dir.len(), n_bytes, "tms/dir buffer length mismatch");
        assert_eq!(tdi_or_out.len(), n_bytes, "tdi/data buffer length mismatch");

        let mut cmd = Vec::with_capacity(4 + 2 * n_bytes);
        cmd.push(CMD_IO_TRANSACT);
        cmd.push(0); // alignment
        cmd.extend_from_slice(&(cycles as u16).to_le_bytes());
        cmd.extend_from_slice(tms_or_dir);
        cmd.extend_from_slice(tdi_or_out);

        // One OUT-then-IN transfer for the TDO/data-in bytes...
        let data = self.transport.transfer(Some(&cmd), n_bytes, self.timeout)?;
        // ...then a second, zero-length-OUT transfer for the trailing status byte.
        // This must always happen, even if the caller discards the status, or the
        // adaptor desyncs.
        let status = self.transport.transfer(None, 1, self.timeout)?;

        Ok((data, status[0]))
    }
}
