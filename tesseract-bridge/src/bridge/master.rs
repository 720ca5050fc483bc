//! Network-facing Master bridge

use embassy_time::Duration;
use tesseract_hal::{IngressSource, OutputPin, SpiMaster};
use tesseract_protocol::Command;

use super::{BridgeCore, TransportBridge};
use crate::config::{BridgeConfig, Role};
use crate::error::BridgeError;
use crate::frame::Staged;
use crate::state::BridgeState;

/// Bridge for the side that clocks the bus
///
/// The select line is active low. It is driven high (deasserted) on
/// construction, on initialization and after every transaction, whether
/// the transaction completed or not.
pub struct MasterBridge<S: SpiMaster, P: OutputPin> {
    spi: S,
    select: P,
    core: BridgeCore<S::Buffer>,
}

impl<S: SpiMaster, P: OutputPin> MasterBridge<S, P> {
    /// Create an uninitialized Master bridge
    pub fn new(spi: S, mut select: P, config: BridgeConfig) -> Self {
        select.set_high();
        Self {
            spi,
            select,
            core: BridgeCore::new(config),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &BridgeConfig {
        self.core.config()
    }

    /// Bus-select line
    pub fn select(&self) -> &P {
        &self.select
    }

    /// Bus peripheral
    pub fn spi(&self) -> &S {
        &self.spi
    }
}

impl<S: SpiMaster, P: OutputPin> TransportBridge for MasterBridge<S, P> {
    type Timeout = Duration;

    const DRIVES_BUS: bool = true;

    fn role(&self) -> Role {
        Role::Master
    }

    fn state(&self) -> BridgeState {
        self.core.state()
    }

    fn initialize(&mut self) -> Result<(), BridgeError> {
        self.core.initialize(&mut self.spi, Role::Master)?;
        self.select.set_high();
        Ok(())
    }

    fn begin(&mut self) -> Result<(), BridgeError> {
        self.core.begin(&mut self.spi)
    }

    fn teardown(&mut self) {
        self.core.teardown();
        self.select.set_high();
    }

    fn stream_ingress_to_transfer<I: IngressSource>(
        &mut self,
        ingress: &mut I,
    ) -> Result<Staged, BridgeError> {
        self.core.stage(ingress)
    }

    fn stage_commands(&mut self, commands: &[Command]) -> Result<usize, BridgeError> {
        self.core.stage_commands(commands)
    }

    /// Assert select, run the transaction, deassert select
    ///
    /// On timeout the transaction is abandoned and
    /// [`BridgeError::TransferTimeout`] is returned. Nothing about the
    /// receive buffer may be assumed in that case; retry next cycle.
    fn transfer(&mut self, timeout: Duration) -> Result<usize, BridgeError> {
        let frame = self.core.ready_frame()?;
        let (read, write) = frame.bus_buffers();
        let len = write.len();

        self.select.set_low();
        let result = self.spi.transfer(read, write, timeout);
        self.select.set_high();

        match result {
            Ok(()) => {
                trace!("Transferred {} bytes", len);
                Ok(len)
            }
            Err(e) => {
                let err = BridgeError::from(e);
                warn!("Transfer failed: {}", err);
                Err(err)
            }
        }
    }

    fn sent(&self) -> Result<&[u8], BridgeError> {
        Ok(self.core.frame()?.send())
    }

    fn received(&self) -> Result<&[u8], BridgeError> {
        Ok(self.core.frame()?.recv())
    }
}
