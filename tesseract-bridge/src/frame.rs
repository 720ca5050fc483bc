//! Transfer frame: the send/receive buffer pair
//!
//! Both buffers come from the bus peripheral once, at initialization, and
//! are reused for every transaction. Capacity never changes afterwards.
//! Only the first `capacity` bytes of each buffer are used, even when the
//! peripheral hands out something larger.

use tesseract_hal::IngressSource;
use tesseract_protocol::{pack_commands, Command};

use crate::error::BridgeError;

/// Result of staging ingress into the send buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Staged {
    /// Nothing was pending; the send buffer was not touched
    Idle,
    /// This many bytes were copied in, the rest of the buffer is zero
    Bytes(usize),
}

/// Fixed-capacity send/receive buffer pair
#[derive(Debug)]
pub struct TransferFrame<B> {
    send: B,
    recv: B,
    capacity: usize,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> TransferFrame<B> {
    /// Wrap two peripheral buffers
    ///
    /// Fails with [`BridgeError::Bus`] if either buffer is smaller than
    /// `capacity`.
    pub fn new(send: B, recv: B, capacity: usize) -> Result<Self, BridgeError> {
        if send.as_ref().len() < capacity || recv.as_ref().len() < capacity {
            return Err(BridgeError::Bus(tesseract_hal::BusError::BufferAllocation));
        }
        Ok(Self {
            send,
            recv,
            capacity,
        })
    }

    /// Capacity of each buffer in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes that will go out on the next transaction
    pub fn send(&self) -> &[u8] {
        &self.send.as_ref()[..self.capacity]
    }

    /// Bytes clocked in by the last transaction
    pub fn recv(&self) -> &[u8] {
        &self.recv.as_ref()[..self.capacity]
    }

    /// Send buffer for the caller to fill directly
    pub fn send_mut(&mut self) -> &mut [u8] {
        &mut self.send.as_mut()[..self.capacity]
    }

    /// Both buffers as the bus peripheral wants them: (read, write)
    pub fn bus_buffers(&mut self) -> (&mut [u8], &[u8]) {
        let capacity = self.capacity;
        (
            &mut self.recv.as_mut()[..capacity],
            &self.send.as_ref()[..capacity],
        )
    }

    /// Copy all currently available ingress bytes into the send buffer
    ///
    /// If nothing can be read the send buffer keeps its previous content and
    /// [`Staged::Idle`] is returned. Otherwise every byte past the ingress
    /// length is zeroed, so the tail is always padding.
    ///
    /// If more bytes are pending than fit, the whole burst is discarded from
    /// the source, the send buffer is left alone and
    /// [`BridgeError::FrameOverflow`] is returned.
    pub fn stage<I: IngressSource>(&mut self, ingress: &mut I) -> Result<Staged, BridgeError> {
        let available = ingress.available();
        if available == 0 {
            return Ok(Staged::Idle);
        }
        if available > self.capacity {
            ingress.discard(available);
            return Err(BridgeError::FrameOverflow {
                available,
                capacity: self.capacity,
            });
        }

        let send = self.send_mut();
        let mut filled = 0;
        while filled < available {
            let n = ingress.read(&mut send[filled..available]);
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(Staged::Idle);
        }

        send[filled..].fill(0);
        Ok(Staged::Bytes(filled))
    }

    /// Encode commands into the send buffer, back to back from byte 0
    ///
    /// Fails with [`BridgeError::FrameOverflow`] without touching the
    /// buffer if the commands do not fit.
    pub fn stage_commands(&mut self, commands: &[Command]) -> Result<usize, BridgeError> {
        let needed: usize = commands.iter().map(Command::encoded_len).sum();
        if needed > self.capacity {
            return Err(BridgeError::FrameOverflow {
                available: needed,
                capacity: self.capacity,
            });
        }

        let send = self.send_mut();
        send.fill(0);
        Ok(pack_commands(commands, send)?)
    }
}
