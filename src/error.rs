//! Crate-wide error type.
//!
//! A `displaydoc` + `thiserror` enum, rather than a hand-rolled `Display` impl.

use crate::capabilities::Capability;
use crate::interface::Interface;

/// Errors produced by this crate.
#[derive(Debug, displaydoc::Display, thiserror::Error)]
#[ignore_extra_doc_attributes]
pub enum Error {
    /// USB transport error: {0}
    ///
    /// Covers timeouts, short reads/writes and device-lost conditions. Fatal to the
    /// current operation; the caller typically aborts the session.
    Link(#[from] LinkError),

    /// protocol error: {0}
    ///
    /// A non-zero status byte from an IO-transaction, or an invalid (non-WAIT,
    /// non-FAULT, non-OK) ACK value from SWD.
    Protocol(String),

    /// SWD read parity mismatch
    Parity,

    /// device is missing capability {0:?} for this operation
    MissingCapability(Capability),

    /// adaptor does not support target interface {0:?}
    InterfaceNotSupported(Interface),

    /// invalid argument: {0}
    InvalidArgument(String),
}

/// USB bulk-transfer failures.
#[derive(Debug, displaydoc::Display, thiserror::Error)]
pub enum LinkError {
    /// USB transfer timed out
    Timeout,
    /// USB transfer failed: {0}
    TransferFailed(String),
    /// USB device was disconnected
    DeviceLost,
}
