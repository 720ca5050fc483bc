//! Ingress byte stream abstraction
//!
//! The network layer owns connection setup and teardown. All the bridge
//! needs from it is a push-style stream that can report how many bytes are
//! buffered right now and hand out up to N of them without blocking.

/// Push-style ingress byte source
pub trait IngressSource {
    /// Number of bytes that can be read right now without blocking
    fn available(&self) -> usize;

    /// Read up to `buf.len()` currently buffered bytes
    ///
    /// Returns the number of bytes copied into `buf`, which may be less
    /// than requested and is zero when nothing is buffered.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Drop up to `count` buffered bytes
    ///
    /// Returns the number of bytes actually discarded.
    fn discard(&mut self, count: usize) -> usize {
        let mut scratch = [0u8; 32];
        let mut dropped = 0;
        while dropped < count {
            let want = (count - dropped).min(scratch.len());
            let n = self.read(&mut scratch[..want]);
            if n == 0 {
                break;
            }
            dropped += n;
        }
        dropped
    }
}

/// Ingress source that never has data
///
/// Used by a Slave that only relays what the Master clocks in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIngress;

impl IngressSource for NoIngress {
    fn available(&self) -> usize {
        0
    }

    fn read(&mut self, _buf: &mut [u8]) -> usize {
        0
    }
}
