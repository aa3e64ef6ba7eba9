//! Host-side driver for the SEGGER J-Link USB vendor protocol, with ARM JTAG
//! and Serial Wire Debug (SWD) transports layered on top of it.
//!
//! The crate is organized bottom-up:
//!
//! - [`bits`] — little-endian pack/unpack and LSB-first bit-buffer helpers.
//! - [`usb`] — the USB bulk-endpoint link ([`usb::UsbLink`]).
//! - [`packet`] — the typed command layer over that link ([`packet::PacketLayer`]).
//! - [`session`] — the adaptor session record ([`session::Session`]).
//! - [`swd`] — the SWD engine and ADIv5 low-access state machine ([`swd::SwdEngine`]).
//! - [`jtag`] — the JTAG TAP primitives ([`jtag::JtagEngine`]).
//! - [`facade`] — the probe-agnostic surface the upper half consumes ([`facade::JLink`]).
//!
//! Everything below [`facade::JLink`] is synchronous and blocking: the only
//! suspension points are a USB bulk transfer and the two `delay_ms` calls the
//! [`clock::Clock`] trait exposes.

#[macro_use]
mod macros;

mod bits;
pub mod capabilities;
pub mod clock;
pub mod error;
pub mod facade;
pub mod interface;
pub mod jtag;
pub mod packet;
pub mod session;
pub mod swd;
pub mod usb;

pub use capabilities::{Capabilities, Capability};
pub use clock::{Clock, SystemClock};
pub use error::{Error, LinkError};
pub use facade::JLink;
pub use interface::{Interface, Interfaces};
pub use jtag::JtagEngine;
pub use packet::{PacketLayer, Transport, MAX_CYCLES};
pub use session::{FrequencyRecord, HardwareVersion, Session, FIXED_FREQUENCY};
pub use swd::{Dp, SwdEngine, SwdSettings, SwdStatistics};
pub use usb::UsbLink;
