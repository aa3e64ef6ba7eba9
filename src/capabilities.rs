//! Adaptor capability bitfield.
//!
//! Capability bit *k* gates the command class described for it in the wire-command
//! table; if the bit is clear the corresponding command must never be sent.

#![allow(non_upper_case_globals)]

use std::fmt;

enum_and_set!(
    /// A single capability that may be advertised by an adaptor.
    #[non_exhaustive]
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub enum Capability {
        /// Reserved, always set.
        Reserved0 = 0,
        /// `0xF0 GET_HARDWARE_VERSION` is supported.
        HardwareVersion = 1,
        /// `0xC0 GET_SPEEDS` / `0x05 SET_SPEED` frequency negotiation is supported.
        InterfaceFrequency = 9,
        /// `0xC1 GET_HW_INFO` power-state query is supported.
        PowerState = 12,
        /// `0x08 SET_KS_POWER` kickstart-power control is supported.
        KickstartPower = 13,
        /// `0xC7 SELECT_IF` and the multi-interface bitfield are supported.
        Interfaces = 17,
    }

    flags CapabilityFlags: u32;
);

/// The set of capabilities advertised by an adaptor.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Capabilities(CapabilityFlags);

impl Capabilities {
    /// Builds a `Capabilities` set from the raw 32-bit reply to `0xE8 GET_CAPS`.
    pub(crate) fn from_raw(raw: u32) -> Self {
        let flags = CapabilityFlags::from_bits_truncate(raw);
        if flags.bits() != raw {
            tracing::debug!(
                "unknown capability bits: {raw:#010x} truncated to {:#010x} ({flags:?})",
                flags.bits(),
            );
        }
        Self(flags)
    }

    /// Returns whether `self` contains `cap`.
    pub fn contains(&self, cap: Capability) -> bool {
        self.0
            .contains(CapabilityFlags::from_bits_truncate(1 << cap as u32))
    }

    pub(crate) fn raw(&self) -> u32 {
        self.0.bits()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_decode_from_get_caps_reply() {
        let raw = u32::from_le_bytes([0xFF, 0x07, 0x00, 0x80]);
        let caps = Capabilities::from_raw(raw);
        assert_eq!(caps.raw(), 0x8000_07FF);
        assert!(caps.contains(Capability::HardwareVersion));
        assert!(!caps.contains(Capability::Interfaces));
        assert!(caps.contains(Capability::InterfaceFrequency));
    }

    #[test]
    fn unknown_bits_are_truncated_not_rejected() {
        let caps = Capabilities::from_raw(0xFFFF_FFFF);
        assert!(caps.contains(Capability::Reserved0));
    }
}
