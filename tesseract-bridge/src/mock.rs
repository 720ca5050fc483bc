//! Host-side stand-ins for the bus, the select line and the ingress stream

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec;
use std::vec::Vec;

use embassy_time::Duration;
use heapless::String;
use tesseract_hal::{
    BusError, IngressSource, OutputPin, SpiMaster, SpiPeripheral, SpiSettings, SpiSlave,
};

use crate::config::{BridgeConfig, BusConfig, IngressBinding, MasterConfig};

pub fn master_config(capacity: usize) -> BridgeConfig {
    let mut address = String::new();
    let _ = address.push_str("127.0.0.1");
    BridgeConfig::master(
        BusConfig {
            capacity,
            ..BusConfig::default()
        },
        MasterConfig {
            frequency_hz: 1_000_000,
            select_pin: 5,
            ingress: IngressBinding {
                address,
                port: 7777,
            },
        },
    )
}

pub fn slave_config(capacity: usize) -> BridgeConfig {
    BridgeConfig::slave(BusConfig {
        capacity,
        ..BusConfig::default()
    })
}

/// Ingress stream backed by a byte queue
pub struct MockIngress {
    pending: VecDeque<u8>,
    read_limit: usize,
}

impl MockIngress {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            pending: bytes.iter().copied().collect(),
            read_limit: usize::MAX,
        }
    }

    /// Hand out at most `limit` bytes per read
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = limit;
        self
    }
}

impl IngressSource for MockIngress {
    fn available(&self) -> usize {
        self.pending.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.read_limit).min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        n
    }
}

/// Output pin that remembers every level it was driven to
pub struct MockPin {
    level: Rc<Cell<bool>>,
    history: Vec<bool>,
}

impl MockPin {
    pub fn new() -> Self {
        Self {
            level: Rc::new(Cell::new(false)),
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[bool] {
        &self.history
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        self.level.set(true);
        self.history.push(true);
    }

    fn set_low(&mut self) {
        self.level.set(false);
        self.history.push(false);
    }

    fn is_set_high(&self) -> bool {
        self.level.get()
    }
}

/// What the peer sends during one transaction
struct Exchange {
    reply: Vec<u8>,
    /// Bytes clocked before deselect; the whole buffer if `None`
    clocked: Option<usize>,
}

/// Bus peripheral usable as either side of the link
///
/// Records what was written and plays back queued replies, one per
/// transaction; the last one repeats once the queue runs dry. Only the
/// clocked bytes of the receive buffer are written, like a real DMA
/// peripheral. Can be told to time out or fault.
pub struct MockSpi {
    max_buffer: usize,
    queued: VecDeque<Exchange>,
    current: Exchange,
    fault: Option<BusError>,
    select: Option<Rc<Cell<bool>>>,
    settings: Option<SpiSettings>,
    allocations: usize,
    begins: usize,
    sent: Vec<Vec<u8>>,
    select_levels: Vec<bool>,
}

impl MockSpi {
    pub fn new() -> Self {
        Self {
            max_buffer: usize::MAX,
            queued: VecDeque::new(),
            current: Exchange {
                reply: Vec::new(),
                clocked: None,
            },
            fault: None,
            select: None,
            settings: None,
            allocations: 0,
            begins: 0,
            sent: Vec::new(),
            select_levels: Vec::new(),
        }
    }

    /// Refuse buffers longer than `len`
    pub fn with_max_buffer(mut self, len: usize) -> Self {
        self.max_buffer = len;
        self
    }

    /// Queue a full-length transaction; bytes past `reply` are clocked as zero
    pub fn with_reply(mut self, reply: &[u8]) -> Self {
        self.queued.push_back(Exchange {
            reply: reply.to_vec(),
            clocked: None,
        });
        self
    }

    /// Queue a transaction the peer cuts short after `len` bytes
    pub fn with_short_reply(mut self, reply: &[u8], len: usize) -> Self {
        self.queued.push_back(Exchange {
            reply: reply.to_vec(),
            clocked: Some(len),
        });
        self
    }

    /// Queue an all-zero transaction cut short after `len` bytes
    pub fn with_clocked(self, len: usize) -> Self {
        self.with_short_reply(&[], len)
    }

    /// Peer never clocks; every transfer times out
    pub fn unresponsive(self) -> Self {
        self.failing(BusError::Timeout)
    }

    pub fn failing(mut self, error: BusError) -> Self {
        self.fault = Some(error);
        self
    }

    /// Sample `pin` during every transfer
    pub fn watching(mut self, pin: &MockPin) -> Self {
        self.select = Some(pin.level.clone());
        self
    }

    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn begins(&self) -> usize {
        self.begins
    }

    pub fn settings(&self) -> Option<&SpiSettings> {
        self.settings.as_ref()
    }

    pub fn transfers(&self) -> usize {
        self.sent.len()
    }

    pub fn sent_frames(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn select_levels(&self) -> &[bool] {
        &self.select_levels
    }

    /// Run one transaction, returning the number of bytes clocked
    fn exchange(&mut self, read: &mut [u8], write: &[u8]) -> Result<usize, BusError> {
        self.sent.push(write.to_vec());
        if let Some(level) = &self.select {
            self.select_levels.push(level.get());
        }
        if let Some(error) = self.fault {
            return Err(error);
        }
        if let Some(next) = self.queued.pop_front() {
            self.current = next;
        }

        let clocked = self.current.clocked.unwrap_or(read.len()).min(read.len());
        let copied = clocked.min(self.current.reply.len());
        read[..copied].copy_from_slice(&self.current.reply[..copied]);
        read[copied..clocked].fill(0);
        Ok(clocked)
    }
}

impl SpiPeripheral for MockSpi {
    type Buffer = Vec<u8>;

    fn allocate_buffer(&mut self, len: usize) -> Result<Vec<u8>, BusError> {
        if len > self.max_buffer {
            return Err(BusError::BufferAllocation);
        }
        self.allocations += 1;
        Ok(vec![0; len])
    }

    fn configure(&mut self, settings: &SpiSettings) -> Result<(), BusError> {
        self.settings = Some(*settings);
        Ok(())
    }

    fn begin(&mut self) -> Result<(), BusError> {
        self.begins += 1;
        Ok(())
    }
}

impl SpiMaster for MockSpi {
    fn transfer(
        &mut self,
        read: &mut [u8],
        write: &[u8],
        _timeout: Duration,
    ) -> Result<(), BusError> {
        self.exchange(read, write).map(|_| ())
    }
}

impl SpiSlave for MockSpi {
    fn transfer_wait(&mut self, read: &mut [u8], write: &[u8]) -> Result<usize, BusError> {
        self.exchange(read, write)
    }
}
