//! Target transport interfaces advertised by the adaptor.

#![allow(non_upper_case_globals)]

use std::fmt;

enum_and_set!(
    /// A single target transport the adaptor can be switched into.
    ///
    /// Only JTAG and SWD are implemented by this crate; the remaining ids are kept so
    /// that `available_interfaces` can be decoded and logged faithfully even when the
    /// adaptor advertises a transport this crate does not drive.
    #[non_exhaustive]
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub enum Interface {
        /// JTAG (IEEE 1149.1).
        Jtag = 0,
        /// Serial Wire Debug.
        Swd = 1,
        /// Background Debug Mode 3 (unsupported, out of scope).
        Bdm3 = 2,
        /// FINE (unsupported, out of scope).
        Fine = 3,
        /// SPI (unsupported, out of scope).
        Spi = 5,
        /// Silicon Labs C2 (unsupported, out of scope).
        C2 = 6,
        /// Compact JTAG (unsupported, out of scope).
        CJtag = 7,
    }

    flags InterfaceFlags: u32;
);

impl Interface {
    /// The interface id as sent on the wire (`0xC7 SELECT_IF` operand).
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.as_u8() == id)
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Interface::Jtag => "JTAG",
            Interface::Swd => "SWD",
            Interface::Bdm3 => "BDM3",
            Interface::Fine => "FINE",
            Interface::Spi => "SPI",
            Interface::C2 => "C2",
            Interface::CJtag => "cJTAG",
        })
    }
}

/// The set of target interfaces the adaptor supports.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Interfaces(InterfaceFlags);

impl Interfaces {
    pub(crate) fn from_bits(raw: u32) -> Self {
        let flags = InterfaceFlags::from_bits_truncate(raw);
        if flags.bits() != raw {
            tracing::debug!(
                "unknown bits in interface mask: {raw:#010x} truncated to {:#010x} ({flags:?})",
                flags.bits(),
            );
        }
        Self(flags)
    }

    pub(crate) fn single(interface: Interface) -> Self {
        Self(InterfaceFlags::from_bits_truncate(1 << interface as u32))
    }

    /// Returns whether `interface` is contained in `self`.
    pub fn contains(&self, interface: Interface) -> bool {
        self.0
            .contains(InterfaceFlags::from_bits_truncate(1 << interface as u32))
    }
}

impl fmt::Debug for Interfaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_jtag_only_default() {
        let ifs = Interfaces::single(Interface::Jtag);
        assert!(ifs.contains(Interface::Jtag));
        assert!(!ifs.contains(Interface::Swd));
    }

    #[test]
    fn decodes_jtag_and_swd_mask() {
        let ifs = Interfaces::from_bits(0b11);
        assert!(ifs.contains(Interface::Jtag));
        assert!(ifs.contains(Interface::Swd));
        assert!(!ifs.contains(Interface::Spi));
    }

    #[test]
    fn interface_id_roundtrip() {
        assert_eq!(Interface::from_u8(0), Some(Interface::Jtag));
        assert_eq!(Interface::from_u8(1), Some(Interface::Swd));
        assert_eq!(Interface::Swd.as_u8(), 1);
    }
}
