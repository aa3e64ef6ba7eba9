//! SWD engine: per-access request framing, ACK handling, WAIT-retry, and the DP
//! fault-recovery state machine.
//!
//! Only a single low-access is ever in flight at a time; each request, data phase
//! and retry is its own IO-transaction rather than a batched multi-transfer buffer.

use crate::bits::{bytes_for_bits, get_bit, popcount_odd, set_bit};
use crate::clock::Clock;
use crate::error::Error;
use crate::packet::{PacketLayer, Transport};

const SWD_ACK_OK: u8 = 0b001;
const SWD_ACK_WAIT: u8 = 0b010;
const SWD_ACK_FAULT: u8 = 0b100;
const SWD_ACK_NO_RESPONSE: u8 = 0b111;

/// DP register addresses. Encoded the same way a request `addr` composite is:
/// bit 0 = AP/DP select, bits 2-3 = register bank.
pub const DP_DPIDR: u16 = 0x00;
pub const DP_ABORT: u16 = 0x00;
pub const DP_CTRLSTAT: u16 = 0x04;
pub const DP_TARGETSEL: u16 = 0x0C;
pub const DP_RDBUFF: u16 = 0x0C;

/// Bit 0 of a request `addr`: set for an AP access, clear for a DP access.
pub const APNDP: u16 = 0x01;

const ABORT_DAPABORT: u32 = 0x0000_0001;
/// `ORUNERRCLR | WDERRCLR | STKERRCLR | STKCMPCLR`.
const ABORT_STICKY_CLEAR: u32 = 0x0000_001E;

/// Direction bytes for the 8-bit-request + 3-bit-ACK phase. Read access uses
/// `cycles=11`, write access `cycles=13`; both fit these same two bytes.
const REQUEST_DIR: [u8; 2] = [0xFF, 0xF0];
/// 32 bits OUT + 1 parity OUT + 8 idle OUT (41 cycles).
const WRITE_DATA_DIR: [u8; 6] = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
/// 32 bits IN + 1 parity IN + 2 idle OUT (35 cycles).
const READ_DATA_DIR: [u8; 5] = [0x00, 0x00, 0x00, 0x00, 0xFE];
/// 64 cycles, 60 high then 4 low.
const LINE_RESET_DATA: [u8; 8] = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xF0];
const LINE_RESET_DIR: [u8; 8] = [0xFF; 8];

/// Tunable SWD parameters, passed into the facade at construction rather than
/// hardcoded.
#[derive(Debug, Clone, Copy)]
pub struct SwdSettings {
    /// WAIT-retry deadline in milliseconds.
    pub wait_retry_deadline_ms: u64,
    /// Cycle counts mirrored here for documentation; the line-reset wire buffer
    /// itself is the fixed 60-high/4-low vector.
    pub line_reset_high_cycles: u8,
    pub line_reset_low_cycles: u8,
}

impl Default for SwdSettings {
    fn default() -> Self {
        Self {
            wait_retry_deadline_ms: 250,
            line_reset_high_cycles: 60,
            line_reset_low_cycles: 4,
        }
    }
}

/// Transfer counters, purely additive instrumentation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SwdStatistics {
    pub transfers: u64,
    pub waits: u64,
    pub faults: u64,
    pub line_resets: u64,
}

/// A debug port's fault latch and DPv2 multi-drop selector.
#[derive(Debug, Clone, Copy)]
pub struct Dp {
    pub version: u8,
    pub targetsel: u32,
    fault: Option<u8>,
}

impl Dp {
    pub fn new(version: u8, targetsel: u32) -> Self {
        Self {
            version,
            targetsel,
            fault: None,
        }
    }

    /// `true` while the fault latch is set (FAULTED state).
    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    fn set_fault(&mut self, ack: u8) {
        self.fault = Some(ack);
    }

    fn clear_fault(&mut self) {
        self.fault = None;
    }
}

fn request_byte(rnw: bool, addr: u16) -> u8 {
    let apndp = addr & APNDP != 0;
    let a2 = (addr >> 2) & 1 != 0;
    let a3 = (addr >> 3) & 1 != 0;
    let ones = apndp as u32 + rnw as u32 + a2 as u32 + a3 as u32;

    let mut byte = 0u8;
    byte |= 1; // start
    if apndp {
        byte |= 1 << 1;
    }
    if rnw {
        byte |= 1 << 2;
    }
    if a2 {
        byte |= 1 << 3;
    }
    if a3 {
        byte |= 1 << 4;
    }
    if popcount_odd(ones) {
        byte |= 1 << 5;
    }
    // bit 6 (stop) is always 0.
    byte |= 1 << 7; // park
    byte
}

/// The SWD engine: builds per-transaction direction/data buffers and drives the
/// ADIv5 low-access state machine over a borrowed packet layer.
pub struct SwdEngine<'a, T, C> {
    packet: &'a PacketLayer<T>,
    clock: &'a C,
    settings: SwdSettings,
    stats: SwdStatistics,
}

impl<'a, T: Transport, C: Clock> SwdEngine<'a, T, C> {
    pub fn new(packet: &'a PacketLayer<T>, clock: &'a C, settings: SwdSettings) -> Self {
        Self {
            packet,
            clock,
            settings,
            stats: SwdStatistics::default(),
        }
    }

    pub fn statistics(&self) -> SwdStatistics {
        self.stats
    }

    /// `n <= 32` cycles, all OUT, LSB-first.
    pub fn seq_out(&mut self, bits: u32, n: u32) -> Result<(), Error> {
        assert!(n <= 32, "seq_out supports at most 32 cycles");
        let n_bytes = bytes_for_bits(n as usize);
        let mut dir = vec![0u8; n_bytes];
        for i in 0..n_bytes {
            dir[i] = 0xFF;
        }
        let tdi = bits.to_le_bytes()[..n_bytes].to_vec();
        self.stats.transfers += 1;
        let (_, status) = self.packet.io_transact(n, &dir, &tdi)?;
        self.check_status(status)
    }

    /// As [`Self::seq_out`] plus one trailing OUT parity bit, `popcount(bits) & 1`.
    pub fn seq_out_parity(&mut self, bits: u32, n: u32) -> Result<(), Error> {
        assert!(n <= 32, "seq_out_parity supports at most 32 cycles");
        let total = n + 1;
        let n_bytes = bytes_for_bits(total as usize);
        let mut dir = vec![0u8; n_bytes];
        for b in dir.iter_mut() {
            *b = 0xFF;
        }
        let mut tdi = vec![0u8; n_bytes];
        tdi[..bytes_for_bits(n as usize)].copy_from_slice(&bits.to_le_bytes()[..bytes_for_bits(n as usize)]);
        set_bit(&mut tdi, n as usize, popcount_odd(bits));
        self.stats.transfers += 1;
        let (_, status) = self.packet.io_transact(total, &dir, &tdi)?;
        self.check_status(status)
    }

    /// `n <= 32` cycles, all IN.
    pub fn seq_in(&mut self, n: u32) -> Result<u32, Error> {
        assert!(n <= 32, "seq_in supports at most 32 cycles");
        let n_bytes = bytes_for_bits(n as usize);
        let dir = vec![0u8; n_bytes];
        let tdi = vec![0u8; n_bytes];
        self.stats.transfers += 1;
        let (data, status) = self.packet.io_transact(n, &dir, &tdi)?;
        self.check_status(status)?;
        let mut padded = data;
        padded.resize(4, 0);
        Ok(u32::from_le_bytes(padded[..4].try_into().unwrap()) & mask_for(n))
    }

    /// As [`Self::seq_in`] plus a trailing IN parity bit; `ok` is whether the
    /// received parity matches `popcount(bits) & 1`.
    pub fn seq_in_parity(&mut self, n: u32) -> Result<(u32, bool), Error> {
        assert!(n <= 32, "seq_in_parity supports at most 32 cycles");
        let total = n + 1;
        let n_bytes = bytes_for_bits(total as usize);
        let dir = vec![0u8; n_bytes];
        let tdi = vec![0u8; n_bytes];
        self.stats.transfers += 1;
        let (data, status) = self.packet.io_transact(total, &dir, &tdi)?;
        self.check_status(status)?;
        let mut padded = data.clone();
        padded.resize(4, 0);
        let bits = u32::from_le_bytes(padded[..4].try_into().unwrap()) & mask_for(n);
        let parity_bit = get_bit(&data, n as usize);
        Ok((bits, parity_bit == popcount_odd(bits)))
    }

    /// Sends the combined request + ACK phase and returns the 3-bit ACK value
    /// from the low bits of the second reply byte.
    fn send_request(&mut self, rnw: bool, addr: u16) -> Result<u8, Error> {
        let cycles: u32 = if rnw { 11 } else { 13 };
        let tdi = vec![request_byte(rnw, addr), 0x00];
        self.stats.transfers += 1;
        let (data, status) = self.packet.io_transact(cycles, &REQUEST_DIR, &tdi)?;
        self.check_status(status)?;
        Ok(data[1] & 0x07)
    }

    fn write_data_phase(&mut self, value: u32) -> Result<(), Error> {
        let mut tdi = [0u8; 6];
        tdi[0..4].copy_from_slice(&value.to_le_bytes());
        set_bit(&mut tdi, 32, popcount_odd(value));
        self.stats.transfers += 1;
        let (_, status) = self.packet.io_transact(41, &WRITE_DATA_DIR, &tdi)?;
        self.check_status(status)
    }

    fn read_data_phase(&mut self) -> Result<(u32, bool), Error> {
        let tdi = [0u8; 5];
        self.stats.transfers += 1;
        let (data, status) = self.packet.io_transact(35, &READ_DATA_DIR, &tdi)?;
        self.check_status(status)?;
        let value = u32::from_le_bytes(data[0..4].try_into().unwrap());
        let parity_ok = get_bit(&data, 32) == popcount_odd(value);
        Ok((value, parity_ok))
    }

    /// 2 OUT cycles, used to keep the bus direction coherent between a failed
    /// read attempt and the next retry.
    fn turnaround_pad(&mut self) -> Result<(), Error> {
        self.stats.transfers += 1;
        let (_, status) = self.packet.io_transact(2, &[0x03], &[0x00])?;
        self.check_status(status)
    }

    fn check_status(&self, status: u8) -> Result<(), Error> {
        if status != 0 {
            return Err(Error::Protocol(format!(
                "adaptor-side IO-transaction error (status {status:#04x})"
            )));
        }
        Ok(())
    }

    fn abort_write(&mut self, mask: u32) -> Result<(), Error> {
        self.raw_write_no_check(DP_ABORT, mask)
    }

    /// Request (13 cycles) + write-data (41 cycles), no ACK check.
    pub fn raw_write_no_check(&mut self, addr: u16, data: u32) -> Result<(), Error> {
        self.send_request(false, addr)?;
        self.write_data_phase(data)
    }

    /// Request (11 cycles) + read-data (35 cycles); returns 0 on any ACK or
    /// parity failure rather than raising.
    pub fn raw_read_no_check(&mut self, addr: u16) -> Result<u32, Error> {
        let ack = self.send_request(true, addr)?;
        let (value, parity_ok) = self.read_data_phase()?;
        Ok(if ack == SWD_ACK_OK && parity_ok { value } else { 0 })
    }

    /// 64-cycle line reset: 60 high then 4 low.
    pub fn line_reset(&mut self) -> Result<(), Error> {
        self.stats.line_resets += 1;
        let (_, status) = self.packet.io_transact(64, &LINE_RESET_DIR, &LINE_RESET_DATA)?;
        self.check_status(status)
    }

    /// Clears the DP fault latch and, if `protocol_recovery` or a DPv2 fault is
    /// held, performs a full line-reset + TARGETSEL + DPIDR recovery sequence
    /// first. Returns the CTRLSTAT sticky-bit mask observed.
    pub fn clear_error(&mut self, dp: &mut Dp, protocol_recovery: bool) -> Result<u32, Error> {
        if protocol_recovery || (dp.version >= 2 && dp.is_faulted()) {
            self.line_reset()?;
            if dp.version >= 2 {
                self.raw_write_no_check(DP_TARGETSEL, dp.targetsel)?;
            }
            self.raw_read_no_check(DP_DPIDR)?;
        }

        let ctrlstat = self.raw_read_no_check(DP_CTRLSTAT)?;
        let sticky = ctrlstat & ABORT_STICKY_CLEAR;
        if sticky != 0 {
            self.abort_write(ABORT_STICKY_CLEAR)?;
        }
        dp.clear_fault();
        Ok(sticky)
    }

    /// The ADIv5 low-access state machine: WAIT-retry with a 250 ms deadline,
    /// single-retry FAULT recovery, and the DP fault latch.
    pub fn raw_access(
        &mut self,
        dp: &mut Dp,
        rnw: bool,
        addr: u16,
        value: u32,
    ) -> Result<u32, Error> {
        if addr & APNDP != 0 && dp.is_faulted() {
            return Ok(0);
        }

        let deadline = self.clock.now_ms() + self.settings.wait_retry_deadline_ms;
        let mut fault_retried = false;

        loop {
            let ack = self.send_request(rnw, addr)?;
            match ack {
                SWD_ACK_OK => break,
                SWD_ACK_WAIT => {
                    self.stats.waits += 1;
                    if self.clock.now_ms() >= deadline {
                        self.abort_write(ABORT_DAPABORT)?;
                        dp.set_fault(ack);
                        return Ok(0);
                    }
                    if rnw {
                        self.turnaround_pad()?;
                    }
                }
                SWD_ACK_FAULT => {
                    self.stats.faults += 1;
                    if !fault_retried {
                        fault_retried = true;
                        self.abort_write(ABORT_STICKY_CLEAR)?;
                        if rnw {
                            self.turnaround_pad()?;
                        }
                    } else {
                        self.abort_write(ABORT_STICKY_CLEAR)?;
                        dp.set_fault(ack);
                        return Ok(0);
                    }
                }
                SWD_ACK_NO_RESPONSE => {
                    dp.set_fault(ack);
                    return Ok(0);
                }
                other => {
                    return Err(Error::Protocol(format!("invalid SWD ACK {other:#05b}")));
                }
            }
        }

        if rnw {
            let (value, parity_ok) = self.read_data_phase()?;
            if !parity_ok {
                dp.set_fault(SWD_ACK_OK);
                return Err(Error::Parity);
            }
            Ok(value)
        } else {
            self.write_data_phase(value)?;
            Ok(0)
        }
    }
}

fn mask_for(n: u32) -> u32 {
    if n >= 32 {
        u32::MAX
    } else {
        (1u32 << n) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::mock::FakeClock;
    use crate::usb::mock::MockLink;
    use pretty_assertions::assert_eq;

    fn engine<'a>(
        packet: &'a PacketLayer<&'a MockLink>,
        clock: &'a FakeClock,
    ) -> SwdEngine<'a, &'a MockLink, FakeClock> {
        SwdEngine::new(packet, clock, SwdSettings::default())
    }

    #[test]
    fn swd_read_of_idr_at_ap_bank_0() {
        let link = MockLink::default();
        link.push(Some(vec![0xCF, 0x00, 0x0B, 0x00, 0xFF, 0xF0, 0x87, 0x00]), vec![0x00, 0x01]);
        link.push(None, vec![0x00]);
        link.push(
            Some(vec![
                0xCF, 0x00, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFE, 0x00, 0x00, 0x00, 0x00,
                0x00,
            ]),
            vec![0x77, 0x14, 0xA0, 0x2B, 0x00],
        );
        link.push(None, vec![0x00]);

        let packet = PacketLayer::new(&link);
        let clock = FakeClock::default();
        let mut eng = engine(&packet, &clock);
        let mut dp = Dp::new(1, 0);

        let value = eng.raw_access(&mut dp, true, APNDP, 0).unwrap();
        assert_eq!(value, 0x2BA0_1477);
        assert!(link.is_empty());
    }

    #[test]
    fn swd_wait_then_ok() {
        let link = MockLink::default();
        let request_cmd = vec![0xCF, 0x00, 0x0B, 0x00, 0xFF, 0xF0, 0x8D, 0x00];
        for _ in 0..3 {
            link.push(Some(request_cmd.clone()), vec![0x00, 0x02]);
            link.push(None, vec![0x00]);
            link.push(Some(vec![0xCF, 0x00, 0x02, 0x00, 0x03, 0x00]), vec![0x00]);
            link.push(None, vec![0x00]);
        }
        link.push(Some(request_cmd), vec![0x00, 0x01]);
        link.push(None, vec![0x00]);
        link.push(
            Some(vec![
                0xCF, 0x00, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFE, 0x00, 0x00, 0x00, 0x00,
                0x00,
            ]),
            vec![0xEF, 0xBE, 0xAD, 0xDE, 0x00],
        );
        link.push(None, vec![0x00]);

        let packet = PacketLayer::new(&link);
        let clock = FakeClock::default();
        let mut eng = engine(&packet, &clock);
        let mut dp = Dp::new(1, 0);

        let value = eng.raw_access(&mut dp, true, DP_CTRLSTAT, 0).unwrap();
        assert_eq!(value, 0xDEAD_BEEF);
        assert!(!dp.is_faulted());
        assert_eq!(eng.statistics().waits, 3);
        assert!(link.is_empty());
    }

    #[test]
    fn swd_fault_first_try_retry() {
        let link = MockLink::default();
        let request_cmd = vec![0xCF, 0x00, 0x0B, 0x00, 0xFF, 0xF0, 0x87, 0x00];

        link.push(Some(request_cmd.clone()), vec![0x00, 0x04]);
        link.push(None, vec![0x00]);

        // ABORT write (no-check): request phase (13 cycles) then write-data (41 cycles).
        link.push(Some(vec![0xCF, 0x00, 0x0D, 0x00, 0xFF, 0xF0, 0x81, 0x00]), vec![0x00, 0x01]);
        link.push(None, vec![0x00]);
        link.push(
            Some(vec![
                0xCF, 0x00, 0x29, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x1E, 0x00, 0x00,
                0x00, 0x00, 0x00,
            ]),
            vec![0; 6],
        );
        link.push(None, vec![0x00]);

        // read-direction turnaround pad before the retry.
        link.push(Some(vec![0xCF, 0x00, 0x02, 0x00, 0x03, 0x00]), vec![0x00]);
        link.push(None, vec![0x00]);

        link.push(Some(request_cmd), vec![0x00, 0x01]);
        link.push(None, vec![0x00]);
        link.push(
            Some(vec![
                0xCF, 0x00, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFE, 0x00, 0x00, 0x00, 0x00,
                0x00,
            ]),
            vec![0x01, 0x00, 0x00, 0x00, 0x01],
        );
        link.push(None, vec![0x00]);

        let packet = PacketLayer::new(&link);
        let clock = FakeClock::default();
        let mut eng = engine(&packet, &clock);
        let mut dp = Dp::new(1, 0);

        let value = eng.raw_access(&mut dp, true, APNDP, 0).unwrap();
        assert_eq!(value, 1);
        assert_eq!(eng.statistics().faults, 1);
        assert!(link.is_empty());
    }

    #[test]
    fn line_reset_then_targetsel_and_dpidr() {
        let link = MockLink::default();
        link.push(
            Some(vec![
                0xCF, 0x00, 0x40, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
                0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xF0,
            ]),
            vec![0; 8],
        );
        link.push(None, vec![0x00]);

        // TARGETSEL write (no-check, DPv2): request (13) + write-data (41).
        // request_byte(false, DP_TARGETSEL=0x0C): apndp=0,rnw=0,a2=1,a3=1 -> 0x99.
        link.push(Some(vec![0xCF, 0x00, 0x0D, 0x00, 0xFF, 0xF0, 0x99, 0x00]), vec![0x00, 0x01]);
        link.push(None, vec![0x00]);
        link.push(
            Some(vec![
                0xCF, 0x00, 0x29, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x27, 0x29, 0x00,
                0x01, 0x00, 0x00,
            ]),
            vec![0; 6],
        );
        link.push(None, vec![0x00]);

        // DPIDR read (no-check): request (11) + read-data (35).
        // request_byte(true, DP_DPIDR=0x00): apndp=0,rnw=1,a2=0,a3=0 -> 0xA5.
        link.push(Some(vec![0xCF, 0x00, 0x0B, 0x00, 0xFF, 0xF0, 0xA5, 0x00]), vec![0x00, 0x01]);
        link.push(None, vec![0x00]);
        link.push(
            Some(vec![
                0xCF, 0x00, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFE, 0x00, 0x00, 0x00, 0x00,
                0x00,
            ]),
            vec![0; 5],
        );
        link.push(None, vec![0x00]);

        // CTRLSTAT read for the sticky-bit mask, nothing set.
        link.push(Some(vec![0xCF, 0x00, 0x0B, 0x00, 0xFF, 0xF0, 0x8D, 0x00]), vec![0x00, 0x01]);
        link.push(None, vec![0x00]);
        link.push(
            Some(vec![
                0xCF, 0x00, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFE, 0x00, 0x00, 0x00, 0x00,
                0x00,
            ]),
            vec![0; 5],
        );
        link.push(None, vec![0x00]);

        let packet = PacketLayer::new(&link);
        let clock = FakeClock::default();
        let mut eng = engine(&packet, &clock);
        let mut dp = Dp::new(2, 0x0100_2927);
        dp.set_fault(SWD_ACK_NO_RESPONSE);

        let sticky = eng.clear_error(&mut dp, true).unwrap();
        assert_eq!(sticky, 0);
        assert!(!dp.is_faulted());
        assert_eq!(eng.statistics().line_resets, 1);
        assert!(link.is_empty());
    }

    #[test]
    fn ap_access_short_circuits_while_dp_is_faulted() {
        let link = MockLink::default();
        let packet = PacketLayer::new(&link);
        let clock = FakeClock::default();
        let mut eng = engine(&packet, &clock);
        let mut dp = Dp::new(1, 0);
        dp.set_fault(SWD_ACK_FAULT);

        let value = eng.raw_access(&mut dp, true, APNDP, 0).unwrap();
        assert_eq!(value, 0);
        assert!(link.is_empty(), "a faulted AP access must never touch the wire");
    }

    #[test]
    fn clear_error_is_idempotent_with_no_new_fault() {
        let link = MockLink::default();
        // First call: protocol_recovery, DPv1 (no TARGETSEL/line-reset path taken
        // since version < 2 and protocol_recovery is false here), just a CTRLSTAT read.
        link.push(Some(vec![0xCF, 0x00, 0x0B, 0x00, 0xFF, 0xF0, 0x8D, 0x00]), vec![0x00, 0x01]);
        link.push(None, vec![0x00]);
        link.push(
            Some(vec![
                0xCF, 0x00, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFE, 0x00, 0x00, 0x00, 0x00,
                0x00,
            ]),
            vec![0; 5],
        );
        link.push(None, vec![0x00]);
        // Second call: identical CTRLSTAT read, still clean.
        link.push(Some(vec![0xCF, 0x00, 0x0B, 0x00, 0xFF, 0xF0, 0x8D, 0x00]), vec![0x00, 0x01]);
        link.push(None, vec![0x00]);
        link.push(
            Some(vec![
                0xCF, 0x00, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFE, 0x00, 0x00, 0x00, 0x00,
                0x00,
            ]),
            vec![0; 5],
        );
        link.push(None, vec![0x00]);

        let packet = PacketLayer::new(&link);
        let clock = FakeClock::default();
        let mut eng = engine(&packet, &clock);
        let mut dp = Dp::new(1, 0);

        assert_eq!(eng.clear_error(&mut dp, false).unwrap(), 0);
        assert_eq!(eng.clear_error(&mut dp, false).unwrap(), 0);
        assert!(link.is_empty());
    }

    #[test]
    fn request_byte_for_ap_read_has_even_parity() {
        // read, AP bank 0, A=0 → apndp=1,rnw=1,a2=0,a3=0 → parity even → 0x87.
        assert_eq!(request_byte(true, APNDP), 0x87);
    }
}
