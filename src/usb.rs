//! USB bulk link to the adaptor.
//!
//! Scans for the first vendor-specific interface with more than one bulk endpoint and
//! drives `nusb`'s async bulk-transfer API to completion synchronously, racing it
//! against a timer.

use std::time::Duration;

use async_io::Timer;
use futures_lite::FutureExt;
use nusb::transfer::{Bulk, Direction, EndpointType, In, Out};
use nusb::DeviceInfo;

use crate::error::LinkError;

const VID_SEGGER: u16 = 0x1366;
const PRODUCT_IDS: &[u16] = &[0x0101, 0x0105, 0x1015, 0x1020];

/// Default transfer timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A claimed vendor-specific bulk interface on a J-Link adaptor.
pub struct UsbLink {
    interface: nusb::Interface,
    read_ep: u8,
    write_ep: u8,
}

impl UsbLink {
    /// Lists every connected device matching SEGGER's vendor id and the J-Link
    /// product ids.
    pub fn list_devices() -> Result<Vec<DeviceInfo>, LinkError> {
        let devices = nusb::list_devices()
            .map_err(|e| LinkError::TransferFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == VID_SEGGER && PRODUCT_IDS.contains(&d.product_id()))
            .collect();
        Ok(devices)
    }

    /// Opens `device`, claims the first vendor-specific interface with more than one
    /// bulk endpoint, and records the lowest IN/OUT endpoint addresses.
    pub fn open(device: DeviceInfo) -> Result<Self, LinkError> {
        let handle = device
            .open()
            .map_err(|e| LinkError::TransferFailed(format!("opening USB device: {e}")))?;

        let mut found = None;
        'outer: for conf in handle.configurations() {
            for intf in conf.interfaces() {
                for descr in intf.alt_settings() {
                    if descr.class() != 0xFF || descr.subclass() != 0xFF {
                        continue;
                    }
                    let endpoints: Vec<_> = descr
                        .endpoints()
                        .filter(|ep| ep.transfer_type() == EndpointType::Bulk)
                        .collect();
                    if endpoints.len() <= 1 {
                        continue;
                    }
                    let mut read_ep = None;
                    let mut write_ep = None;
                    for ep in &endpoints {
                        match ep.direction() {
                            Direction::In => read_ep.get_or_insert(ep.address()),
                            Direction::Out => write_ep.get_or_insert(ep.address()),
                        };
                    }
                    if let (Some(read_ep), Some(write_ep)) = (read_ep, write_ep) {
                        found = Some((descr.interface_number(), read_ep, write_ep));
                        break 'outer;
                    }
                }
            }
        }

        let (intf_num, read_ep, write_ep) =
            found.ok_or(LinkError::TransferFailed("no vendor bulk interface found".into()))?;

        let interface = handle
            .claim_interface(intf_num)
            .map_err(|e| LinkError::TransferFailed(format!("claiming interface: {e}")))?;

        tracing::debug!("claimed J-Link interface #{intf_num}, IN={read_ep:#x} OUT={write_ep:#x}");

        Ok(Self {
            interface,
            read_ep,
            write_ep,
        })
    }

    /// Writes `out` (if present) to the bulk-OUT endpoint, then reads up to `in_len`
    /// bytes from bulk-IN. A zero-length `out` is a read-only transfer.
    pub fn transfer(
        &self,
        out: Option<&[u8]>,
        in_len: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>, LinkError> {
        if let Some(out) = out {
            if !out.is_empty() {
                self.write_bulk(out, timeout)?;
            }
        }

        if in_len == 0 {
            return Ok(Vec::new());
        }

        self.read_bulk(in_len, timeout)
    }

    fn write_bulk(&self, buf: &[u8], timeout: Duration) -> Result<(), LinkError> {
        tracing::trace!("write {} bytes: {:x?}", buf.len(), buf);

        let fut = async {
            let mut ep_out = self
                .interface
                .endpoint::<Bulk, Out>(self.write_ep)
                .map_err(|_| LinkError::DeviceLost)?;
            let mut transfer = ep_out.allocate(buf.len());
            transfer.extend_from_slice(buf);
            ep_out.submit(transfer);
            let Some(comp) = ep_out.wait_next_complete(timeout) else {
                return Err(LinkError::Timeout);
            };
            comp.status.map_err(|e| LinkError::TransferFailed(e.to_string()))?;
            if comp.actual_len != buf.len() {
                return Err(LinkError::TransferFailed(format!(
                    "incomplete write (expected {} bytes, wrote {})",
                    buf.len(),
                    comp.actual_len
                )));
            }
            Ok(())
        };

        async_io::block_on(fut.or(async {
            Timer::after(timeout).await;
            Err(LinkError::Timeout)
        }))
    }

    fn read_bulk(&self, len: usize, timeout: Duration) -> Result<Vec<u8>, LinkError> {
        let fut = async {
            let mut ep_in = self
                .interface
                .endpoint::<Bulk, In>(self.read_ep)
                .map_err(|_| LinkError::DeviceLost)?;
            let transfer = ep_in.allocate(len);
            ep_in.submit(transfer);
            let Some(comp) = ep_in.wait_next_complete(timeout) else {
                return Err(LinkError::Timeout);
            };
            comp.status.map_err(|e| LinkError::TransferFailed(e.to_string()))?;
            let n = comp.actual_len;
            let mut data = comp.buffer;
            data.truncate(n);
            Ok(data)
        };

        let data = async_io::block_on(fut.or(async {
            Timer::after(timeout).await;
            Err(LinkError::Timeout)
        }))?;

        tracing::trace!("read {} bytes: {:x?}", data.len(), data);
        Ok(data)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! An in-memory USB transport used by the packet/session/swd/jtag tests.
    //!
    //! A queue of expected writes paired with the reply to hand back.

    use std::cell::RefCell;
    use std::collections::VecDeque;

    use crate::error::LinkError;

    #[derive(Debug)]
    pub(crate) struct Exchange {
        pub(crate) expect_write: Option<Vec<u8>>,
        pub(crate) reply: Vec<u8>,
    }

    #[derive(Default)]
    pub(crate) struct MockLink {
        queue: RefCell<VecDeque<Exchange>>,
    }

    impl MockLink {
        pub(crate) fn push(&self, expect_write: Option<Vec<u8>>, reply: Vec<u8>) {
            self.queue.borrow_mut().push_back(Exchange { expect_write, reply });
        }

        pub(crate) fn transfer(&self, out: Option<&[u8]>, in_len: usize) -> Result<Vec<u8>, LinkError> {
            let exchange = self
                .queue
                .borrow_mut()
                .pop_front()
                .expect("mock transport queue exhausted");
            if let Some(expected) = &exchange.expect_write {
                assert_eq!(out, Some(expected.as_slice()), "unexpected write");
            }
            assert_eq!(
                exchange.reply.len(),
                in_len,
                "scripted reply length does not match requested in_len"
            );
            Ok(exchange.reply)
        }

        pub(crate) fn is_empty(&self) -> bool {
            self.queue.borrow().is_empty()
        }
    }

    // A single, crate-wide impl: every test module (packet/session/swd/jtag) shares
    // this `MockLink`, and Rust's trait coherence forbids implementing the same
    // trait for the same type more than once even across modules.
    impl crate::packet::Transport for MockLink {
        fn transfer(
            &self,
            out: Option<&[u8]>,
            in_len: usize,
            _timeout: std::time::Duration,
        ) -> Result<Vec<u8>, LinkError> {
            MockLink::transfer(self, out, in_len)
        }
    }
}
