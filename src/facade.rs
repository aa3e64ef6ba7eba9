//! The probe-agnostic facade: init, voltage readback, reset control,
//! frequency/power, and SWD/JTAG dispatch.

use crate::capabilities::Capability;
use crate::clock::Clock;
use crate::error::Error;
use crate::interface::Interface;
use crate::jtag::JtagEngine;
use crate::packet::{PacketLayer, Transport};
use crate::session::Session;
use crate::swd::{Dp, SwdEngine, SwdSettings};

const CMD_GET_SIGNAL_STATE: u8 = 0x07;
const CMD_SET_KS_POWER: u8 = 0x08;
const CMD_GET_POWER_STATE: u8 = 0xC1;
const CMD_RESET_ASSERT: u8 = 0xDC;
const CMD_RESET_RELEASE: u8 = 0xDD;

const RESET_SETTLE_MS: u64 = 2;

/// Selects which bit of the `0xC1` power-state mask this crate queries: target
/// (kickstart) power, as opposed to the adaptor's own supply rails.
const POWER_STATE_TARGET_MASK: u32 = 0x1;

/// Indices into the 8-byte `0x07` signal-state reply: the first two bytes are a
/// little-endian target-voltage millivolt reading, followed by one byte each for
/// TCK, TDI, TDO, TMS, TRES (nRESET), TRST.
const SIGNAL_STATE_TRES_BYTE: usize = 6;

/// The probe-agnostic facade: the upper half talks to this type, never to
/// [`Session`]/[`SwdEngine`]/[`JtagEngine`] directly.
pub struct JLink<T, C> {
    session: Session<T, C>,
    swd_settings: SwdSettings,
}

impl<T: Transport, C: Clock> JLink<T, C> {
    /// Opens the adaptor session with default SWD tunables.
    pub fn init(transport: T, clock: C) -> Result<Self, Error> {
        Ok(Self {
            session: Session::init(transport, clock)?,
            swd_settings: SwdSettings::default(),
        })
    }

    pub fn with_swd_settings(mut self, settings: SwdSettings) -> Self {
        self.swd_settings = settings;
        self
    }

    pub fn session(&self) -> &Session<T, C> {
        &self.session
    }

    fn packet(&self) -> &PacketLayer<T> {
        self.session.packet()
    }

    fn signal_state(&self) -> Result<[u8; 8], Error> {
        let reply = self.packet().simple_query(CMD_GET_SIGNAL_STATE, 8)?;
        reply
            .try_into()
            .map_err(|_| Error::Protocol("short reply to GET_SIGNAL_STATE".into()))
    }

    /// `"NN.mmm"` ASCII, e.g. `" 3.300"`.
    pub fn target_voltage_string(&self) -> Result<String, Error> {
        let mv = self.target_voltage_millivolts()?;
        Ok(format!("{:2}.{:03}", mv / 1000, mv % 1000))
    }

    pub fn target_voltage_millivolts(&self) -> Result<u16, Error> {
        let state = self.signal_state()?;
        Ok(u16::from_le_bytes(state[0..2].try_into().unwrap()))
    }

    /// Drives nRESET. `release = true` lets the target run; `false` drives it
    /// low. Settles for 2 ms after the command.
    pub fn nrst_set(&mut self, release: bool) -> Result<(), Error> {
        let cmd = if release { CMD_RESET_RELEASE } else { CMD_RESET_ASSERT };
        self.packet().simple_query(cmd, 0)?;
        self.session.clock().delay_ms(RESET_SETTLE_MS);
        Ok(())
    }

    /// `true` when nRESET currently reads high (target not held in reset).
    pub fn nrst_get(&self) -> Result<bool, Error> {
        let state = self.signal_state()?;
        Ok(state[SIGNAL_STATE_TRES_BYTE] != 0)
    }

    /// Routes to the currently-selected interface's frequency negotiation. Gated by
    /// the `InterfaceFrequency` capability: `Ok(false)` (no wire traffic) when the
    /// adaptor does not advertise it.
    pub fn max_frequency_set(&mut self, hz: u32) -> Result<bool, Error> {
        let current = self.session.current_interface();
        self.session.set_interface_frequency(current, hz)
    }

    pub fn max_frequency_get(&self) -> u32 {
        self.session.get_interface_frequency(self.session.current_interface())
    }

    /// Gated by the `KICKSTART_POWER` capability: `Ok(false)` (no wire traffic)
    /// when the adaptor does not advertise it.
    pub fn target_power_set(&mut self, on: bool) -> Result<bool, Error> {
        if !self.session.capabilities.contains(Capability::KickstartPower) {
            return Ok(false);
        }
        self.packet().simple_request_u8(CMD_SET_KS_POWER, on as u8, 0)?;
        Ok(true)
    }

    /// Gated by the `POWER_STATE` capability: `Ok(None)` when unsupported.
    pub fn target_power_get(&self) -> Result<Option<bool>, Error> {
        if !self.session.capabilities.contains(Capability::PowerState) {
            return Ok(None);
        }
        let reply = self
            .packet()
            .simple_request_u32(CMD_GET_POWER_STATE, POWER_STATE_TARGET_MASK, 4)?;
        let state = u32::from_le_bytes(reply.try_into().unwrap());
        Ok(Some(state != 0))
    }

    /// Selects SWD and brings the DP to a known state via a protocol-recovery
    /// `clear_error` (line-reset, DPv2 target-select, sticky-bit clear).
    pub fn swd_dp_init(&mut self, dp: &mut Dp) -> Result<SwdEngine<'_, T, C>, Error> {
        self.session.select_interface(Interface::Swd)?;
        let mut engine = SwdEngine::new(self.session.packet(), self.session.clock(), self.swd_settings);
        engine.clear_error(dp, true)?;
        Ok(engine)
    }

    /// Selects JTAG and runs the 72-cycle switch-to-JTAG sequence.
    pub fn jtag_init(&mut self) -> Result<JtagEngine<'_, T>, Error> {
        self.session.select_interface(Interface::Jtag)?;
        JtagEngine::init(self.session.packet())
    }
}
