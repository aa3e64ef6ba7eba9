//! Adaptor session: the one process-wide record populated at `init`.

use std::collections::HashMap;
use std::fmt;

use crate::bits::bytes_for_bits;
use crate::capabilities::{Capabilities, Capability};
use crate::clock::Clock;
use crate::error::Error;
use crate::interface::{Interface, Interfaces};
use crate::packet::{PacketLayer, Transport};

const CMD_FIRMWARE_VERSION: u8 = 0x01;
const CMD_SET_SPEED: u8 = 0x05;
const CMD_GET_SPEEDS: u8 = 0xC0;
const CMD_SELECT_IF: u8 = 0xC7;
const CMD_GET_CAPS: u8 = 0xE8;
const CMD_GET_HW_VERSION: u8 = 0xF0;

const SELECT_IF_GET_CURRENT: u8 = 0xFE;
const SELECT_IF_GET_AVAILABLE: u8 = 0xFF;

const INTERFACE_SWITCH_SETTLE_MS: u64 = 10;

/// Decoded `TTMMmmrr` hardware version word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareVersion {
    pub kind: u8,
    pub major: u8,
    pub minor: u8,
    pub revision: u8,
}

impl HardwareVersion {
    pub(crate) fn from_packed_decimal(raw: u32) -> Self {
        Self {
            kind: (raw / 1_000_000 % 100) as u8,
            major: (raw / 10_000 % 100) as u8,
            minor: (raw / 100 % 100) as u8,
            revision: (raw % 100) as u8,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            0 => "J-Link",
            1 => "J-Trace",
            2 => "Flasher",
            3 => "J-Link Pro",
            18 => "LPC-Link2",
            _ => "unknown adaptor",
        }
    }
}

impl fmt::Display for HardwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} V{}.{}{}",
            self.kind_name(),
            self.major,
            self.minor,
            if self.revision > 0 {
                format!(" rev {}", self.revision)
            } else {
                String::new()
            }
        )
    }
}

/// Per-interface frequency state.
#[derive(Debug, Clone, Copy)]
pub struct FrequencyRecord {
    base_hz: u32,
    min_divisor: u16,
    current_divisor: u16,
}

impl FrequencyRecord {
    fn effective_hz(&self) -> u32 {
        self.base_hz / u32::from(self.current_divisor)
    }
}

/// Sentinel returned by `get_interface_frequency` when the adaptor has no
/// frequency-negotiation capability.
pub const FIXED_FREQUENCY: u32 = 0;

/// The adaptor session: one per opened probe.
pub struct Session<T, C> {
    packet: PacketLayer<T>,
    clock: C,
    pub firmware_version: String,
    pub hardware_version: Option<HardwareVersion>,
    pub capabilities: Capabilities,
    pub available_interfaces: Interfaces,
    selected_interface: Interface,
    frequencies: HashMap<u8, FrequencyRecord>,
}

impl<T: Transport, C: Clock> Session<T, C> {
    /// Opens the device session: capabilities, firmware version, hardware version
    /// (if advertised), and the available-interfaces bitfield (if advertised), in
    /// that order. `init` is all-or-nothing: any failure should cause the caller to
    /// release the interface and close the device.
    pub fn init(transport: T, clock: C) -> Result<Self, Error> {
        let packet = PacketLayer::new(transport);

        let caps_raw = packet.simple_query(CMD_GET_CAPS, 4)?;
        let capabilities = Capabilities::from_raw(u32::from_le_bytes(
            caps_raw.try_into().map_err(|_| {
                Error::Protocol("short reply to GET_CAPS".into())
            })?,
        ));

        let firmware_version = read_firmware_version(&packet)?;

        let hardware_version = if capabilities.contains(Capability::HardwareVersion) {
            let raw = packet.simple_query(CMD_GET_HW_VERSION, 4)?;
            let raw = u32::from_le_bytes(raw.try_into().map_err(|_| {
                Error::Protocol("short reply to GET_HW_VERSION".into())
            })?);
            Some(HardwareVersion::from_packed_decimal(raw))
        } else {
            None
        };

        let available_interfaces = if capabilities.contains(Capability::Interfaces) {
            let raw = packet.simple_request_u8(CMD_SELECT_IF, SELECT_IF_GET_AVAILABLE, 4)?;
            let raw = u32::from_le_bytes(raw.try_into().map_err(|_| {
                Error::Protocol("short reply to SELECT_IF(get-available)".into())
            })?);
            Interfaces::from_bits(raw)
        } else {
            Interfaces::single(Interface::Jtag)
        };

        Ok(Self {
            packet,
            clock,
            firmware_version,
            hardware_version,
            capabilities,
            available_interfaces,
            selected_interface: Interface::Jtag,
            frequencies: HashMap::new(),
        })
    }

    pub(crate) fn packet(&self) -> &PacketLayer<T> {
        &self.packet
    }

    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }

    pub fn current_interface(&self) -> Interface {
        self.selected_interface
    }

    /// Switches to `id`, failing if the adaptor does not advertise it. A no-op (no
    /// I/O) if `id` is already selected.
    pub fn select_interface(&mut self, id: Interface) -> Result<(), Error> {
        if !self.available_interfaces.contains(id) {
            return Err(Error::InterfaceNotSupported(id));
        }

        let current_raw = self
            .packet
            .simple_request_u8(CMD_SELECT_IF, SELECT_IF_GET_CURRENT, 4)?;
        let current_raw = u32::from_le_bytes(current_raw.try_into().map_err(|_| {
            Error::Protocol("short reply to SELECT_IF(get-current)".into())
        })?);
        if current_raw == u32::from(id.as_u8()) {
            self.selected_interface = id;
            return Ok(());
        }

        self.packet.simple_request_u8(CMD_SELECT_IF, id.as_u8(), 4)?;
        self.clock.delay_ms(INTERFACE_SWITCH_SETTLE_MS);
        self.selected_interface = id;
        Ok(())
    }

    fn load_frequency_record(&mut self, id: Interface) -> Result<FrequencyRecord, Error> {
        if let Some(record) = self.frequencies.get(&id.as_u8()) {
            return Ok(*record);
        }
        let raw = self.packet.simple_query(CMD_GET_SPEEDS, 6)?;
        let base_hz = u32::from_le_bytes(raw[0..4].try_into().unwrap());
        let min_divisor = u16::from_le_bytes(raw[4..6].try_into().unwrap());
        let record = FrequencyRecord {
            base_hz,
            min_divisor: min_divisor.max(1),
            current_divisor: min_divisor.max(1),
        };
        self.frequencies.insert(id.as_u8(), record);
        Ok(record)
    }

    /// Computes and sends the divisor that yields an effective frequency closest to
    /// (but not exceeding) `hz`, clamped to the interface's minimum divisor.
    ///
    /// Gated by the `InterfaceFrequency` capability: `Ok(false)` (no wire traffic)
    /// when the adaptor does not advertise it.
    pub fn set_interface_frequency(&mut self, id: Interface, hz: u32) -> Result<bool, Error> {
        if !self.capabilities.contains(Capability::InterfaceFrequency) {
            return Ok(false);
        }
        self.select_interface(id)?;
        let record = self.load_frequency_record(id)?;

        let divisor = record
            .min_divisor
            .max(div_ceil_u32(record.base_hz, hz).min(u32::from(u16::MAX)) as u16);

        let khz = (record.base_hz / u32::from(divisor)) / 1000;
        self.packet
            .simple_request_u16(CMD_SET_SPEED, khz as u16, 0)?;

        self.frequencies.insert(
            id.as_u8(),
            FrequencyRecord {
                current_divisor: divisor,
                ..record
            },
        );
        Ok(true)
    }

    /// Returns the currently effective frequency in Hz, or [`FIXED_FREQUENCY`] if the
    /// adaptor lacks frequency negotiation.
    pub fn get_interface_frequency(&self, id: Interface) -> u32 {
        if !self.capabilities.contains(Capability::InterfaceFrequency) {
            return FIXED_FREQUENCY;
        }
        self.frequencies
            .get(&id.as_u8())
            .map(FrequencyRecord::effective_hz)
            .unwrap_or(FIXED_FREQUENCY)
    }
}

fn div_ceil_u32(num: u32, den: u32) -> u32 {
    if den == 0 {
        return num;
    }
    num.div_ceil(den)
}

fn read_firmware_version<T: Transport>(packet: &PacketLayer<T>) -> Result<String, Error> {
    let len_bytes = packet.simple_query(CMD_FIRMWARE_VERSION, 2)?;
    let len = u16::from_le_bytes(len_bytes.try_into().map_err(|_| {
        Error::Protocol("short length prefix for firmware version string".into())
    })?);
    if len == 0 {
        return Ok(String::new());
    }
    // The version string is the *continuation* of the same reply stream; read it
    // with a follow-up zero-length-OUT transfer, same pattern as the status byte in
    // an IO-transaction.
    let bytes = packet
        .transport()
        .transfer(None, usize::from(len), std::time::Duration::from_secs(5))?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
}
