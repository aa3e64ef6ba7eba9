//! JTAG engine: TMS-only sequences, TDI/TDO scans with "final TMS" semantics, and
//! one-bit step.
//!
//! Every operation reduces to a single IO-transaction, same as the SWD engine.

use crate::bits::{bytes_for_bits, get_bit, set_bit};
use crate::error::Error;
use crate::packet::{PacketLayer, Transport};

/// Nine bytes: TDI held high throughout except the `3C E7` pair in the last two
/// bytes, TMS held low throughout.
const SWITCH_TO_JTAG_SEQUENCE: [u8; 9] = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x3C, 0xE7];
const SWITCH_TO_JTAG_CYCLES: u32 = 72;

/// TMS pattern for a TAP soft-reset: five 1s then a 0, LSB-first.
const RESET_TMS_PATTERN: u32 = 0x1F;
const RESET_CYCLES: u32 = 6;

/// The JTAG engine: TAP primitives layered on the packet layer.
pub struct JtagEngine<'a, T> {
    packet: &'a PacketLayer<T>,
}

impl<'a, T: Transport> JtagEngine<'a, T> {
    /// Runs the fixed 72-cycle switch-to-JTAG sequence as one IO-transaction.
    /// Callers are expected to have already selected the JTAG interface on the
    /// session.
    pub fn init(packet: &'a PacketLayer<T>) -> Result<Self, Error> {
        let engine = Self { packet };
        let tms = vec![0u8; bytes_for_bits(SWITCH_TO_JTAG_CYCLES as usize)];
        let (_, status) = engine
            .packet
            .io_transact(SWITCH_TO_JTAG_CYCLES, &tms, &SWITCH_TO_JTAG_SEQUENCE)?;
        engine.check_status(status)?;
        Ok(engine)
    }

    fn check_status(&self, status: u8) -> Result<(), Error> {
        if status != 0 {
            return Err(Error::Protocol(format!(
                "adaptor-side IO-transaction error (status {status:#04x})"
            )));
        }
        Ok(())
    }

    /// A TAP soft-reset: five TMS=1 cycles then one TMS=0 cycle.
    pub fn reset(&self) -> Result<(), Error> {
        self.tms_seq(RESET_TMS_PATTERN, RESET_CYCLES)
    }

    /// `n <= 32` cycles; `states`'s bytes are sent LSB-first as both the TMS
    /// buffer and the (unused) TDI buffer of an `n`-cycle IO-transaction.
    pub fn tms_seq(&self, states: u32, n: u32) -> Result<(), Error> {
        assert!(n <= 32, "tms_seq supports at most 32 cycles");
        let n_bytes = bytes_for_bits(n as usize);
        let buf = states.to_le_bytes()[..n_bytes].to_vec();
        let (_, status) = self.packet.io_transact(n, &buf, &buf)?;
        self.check_status(status)
    }

    /// Generic-length TDI/TDO scan: the TMS buffer is all zero except bit `n-1`,
    /// which equals `final_tms` (ends the scan in Exit1 when set). Returns the
    /// full TDO response; only the first `n` bits are meaningful.
    pub fn tdi_tdo_seq(&self, final_tms: bool, data_in: &[u8], n: u32) -> Result<Vec<u8>, Error> {
        let n_bytes = bytes_for_bits(n as usize);
        assert_eq!(data_in.len(), n_bytes, "tdi buffer length mismatch");
        let mut tms = vec![0u8; n_bytes];
        if n > 0 {
            set_bit(&mut tms, (n - 1) as usize, final_tms);
        }
        let (data, status) = self.packet.io_transact(n, &tms, data_in)?;
        self.check_status(status)?;
        Ok(data)
    }

    /// As [`Self::tdi_tdo_seq`], discarding TDO.
    pub fn tdi_seq(&self, final_tms: bool, data_in: &[u8], n: u32) -> Result<(), Error> {
        self.tdi_tdo_seq(final_tms, data_in, n).map(|_| ())
    }

    /// One-cycle IO-transaction.
    pub fn next(&self, tms: bool, tdi: bool) -> Result<bool, Error> {
        let tms_buf = [tms as u8];
        let tdi_buf = [tdi as u8];
        let (data, status) = self.packet.io_transact(1, &tms_buf, &tdi_buf)?;
        self.check_status(status)?;
        Ok(get_bit(&data, 0))
    }
}
