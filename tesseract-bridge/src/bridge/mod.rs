//! Transport bridges
//!
//! One contract, two implementations chosen by the device's role:
//!
//! - [`MasterBridge`] drives the bus. It brackets every transaction with the
//!   select line and gives up after a caller-supplied timeout.
//! - [`SlaveBridge`] is driven by its peer. It queues its buffers and blocks
//!   until the Master has clocked the transaction through.
//!
//! Both own a single [`TransferFrame`]. Whatever is in the send buffer when
//! `transfer` is called is what goes out; the receive buffer is overwritten
//! in place, so it must be consumed before the next `transfer`.

mod master;
mod slave;

pub use master::MasterBridge;
pub use slave::SlaveBridge;

use tesseract_hal::{IngressSource, SpiPeripheral};
use tesseract_protocol::{Command, Commands};

use crate::config::{BridgeConfig, Role};
use crate::error::BridgeError;
use crate::frame::{Staged, TransferFrame};
use crate::state::{BridgeState, Lifecycle};

/// Operations shared by the Master and Slave bridges
pub trait TransportBridge {
    /// What `transfer` waits on: a deadline for the Master, nothing for the Slave
    type Timeout: Copy;

    /// Whether this side starts bus transactions
    ///
    /// A bridge that drives the bus skips the transaction when nothing was
    /// staged; one that is driven must always be ready for its peer.
    const DRIVES_BUS: bool;

    /// Role this bridge implements
    fn role(&self) -> Role;

    /// Current lifecycle state
    fn state(&self) -> BridgeState;

    /// Validate config, allocate both buffers and configure the peripheral
    fn initialize(&mut self) -> Result<(), BridgeError>;

    /// Start the peripheral
    fn begin(&mut self) -> Result<(), BridgeError>;

    /// Release the buffers and return to `Uninitialized`
    fn teardown(&mut self);

    /// Stage all pending ingress bytes into the send buffer
    fn stream_ingress_to_transfer<I: IngressSource>(
        &mut self,
        ingress: &mut I,
    ) -> Result<Staged, BridgeError>;

    /// Encode commands into the send buffer
    fn stage_commands(&mut self, commands: &[Command]) -> Result<usize, BridgeError>;

    /// Run one bus transaction, returning the number of bytes clocked
    fn transfer(&mut self, timeout: Self::Timeout) -> Result<usize, BridgeError>;

    /// Send buffer as it will go out on the next transaction
    fn sent(&self) -> Result<&[u8], BridgeError>;

    /// Receive buffer as left by the last transaction
    ///
    /// Bytes past what the peer actually clocked are zero.
    fn received(&self) -> Result<&[u8], BridgeError>;

    /// Commands in the receive buffer
    fn commands(&self) -> Result<Commands<'_>, BridgeError> {
        self.received().map(Commands::new)
    }
}

/// State and buffers common to both roles
#[derive(Debug)]
pub(crate) struct BridgeCore<B> {
    config: BridgeConfig,
    state: BridgeState,
    frame: Option<TransferFrame<B>>,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BridgeCore<B> {
    pub(crate) fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            state: BridgeState::Uninitialized,
            frame: None,
        }
    }

    pub(crate) fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub(crate) fn state(&self) -> BridgeState {
        self.state
    }

    /// Allocate and configure; nothing is changed on failure
    pub(crate) fn initialize<S>(&mut self, spi: &mut S, role: Role) -> Result<(), BridgeError>
    where
        S: SpiPeripheral<Buffer = B>,
    {
        let next = self.state.transition(Lifecycle::Initialize)?;
        self.config.validate()?;
        self.config.expect_role(role)?;

        let settings = self.config.spi_settings()?;
        let capacity = self.config.bus.capacity;
        let send = spi.allocate_buffer(capacity)?;
        let recv = spi.allocate_buffer(capacity)?;
        let frame = TransferFrame::new(send, recv, capacity)?;
        spi.configure(&settings)?;

        self.frame = Some(frame);
        self.state = next;
        info!(
            "Bridge initialized: capacity={} queue_depth={}",
            capacity, settings.queue_depth
        );
        Ok(())
    }

    pub(crate) fn begin<S: SpiPeripheral>(&mut self, spi: &mut S) -> Result<(), BridgeError> {
        let next = self.state.transition(Lifecycle::Begin)?;
        if next != self.state {
            spi.begin()?;
            info!("Bridge ready");
        }
        self.state = next;
        Ok(())
    }

    pub(crate) fn teardown(&mut self) {
        self.frame = None;
        self.state = BridgeState::Uninitialized;
        debug!("Bridge torn down");
    }

    /// Frame for reading, available from `Initialized` on
    pub(crate) fn frame(&self) -> Result<&TransferFrame<B>, BridgeError> {
        self.frame.as_ref().ok_or(BridgeError::NotReady)
    }

    /// Frame for staging or transfer, only once `Ready`
    pub(crate) fn ready_frame(&mut self) -> Result<&mut TransferFrame<B>, BridgeError> {
        self.state.require_ready()?;
        self.frame.as_mut().ok_or(BridgeError::NotReady)
    }

    pub(crate) fn stage<I: IngressSource>(&mut self, ingress: &mut I) -> Result<Staged, BridgeError> {
        let frame = self.ready_frame()?;
        match frame.stage(ingress) {
            Ok(Staged::Bytes(n)) => {
                trace!("Staged {} ingress bytes", n);
                Ok(Staged::Bytes(n))
            }
            Ok(Staged::Idle) => Ok(Staged::Idle),
            Err(e) => {
                warn!("Ingress burst dropped: {}", e);
                Err(e)
            }
        }
    }

    pub(crate) fn stage_commands(&mut self, commands: &[Command]) -> Result<usize, BridgeError> {
        let len = self.ready_frame()?.stage_commands(commands)?;
        trace!("Staged {} commands in {} bytes", commands.len(), len);
        Ok(len)
    }
}
