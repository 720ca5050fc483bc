//! Display-facing Slave bridge

use tesseract_hal::{IngressSource, SpiSlave};
use tesseract_protocol::Command;

use super::{BridgeCore, TransportBridge};
use crate::config::{BridgeConfig, Role};
use crate::error::BridgeError;
use crate::frame::Staged;
use crate::state::BridgeState;

/// Bridge for the side that is clocked by its peer
///
/// There is no select line and no frequency to set. `transfer` takes no
/// timeout: the Slave cannot abort a transaction it does not control, so it
/// blocks until the peripheral reports completion.
pub struct SlaveBridge<S: SpiSlave> {
    spi: S,
    core: BridgeCore<S::Buffer>,
}

impl<S: SpiSlave> SlaveBridge<S> {
    /// Create an uninitialized Slave bridge
    pub fn new(spi: S, config: BridgeConfig) -> Self {
        Self {
            spi,
            core: BridgeCore::new(config),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &BridgeConfig {
        self.core.config()
    }

    /// Bus peripheral
    pub fn spi(&self) -> &S {
        &self.spi
    }
}

impl<S: SpiSlave> TransportBridge for SlaveBridge<S> {
    type Timeout = ();

    const DRIVES_BUS: bool = false;

    fn role(&self) -> Role {
        Role::Slave
    }

    fn state(&self) -> BridgeState {
        self.core.state()
    }

    fn initialize(&mut self) -> Result<(), BridgeError> {
        self.core.initialize(&mut self.spi, Role::Slave)
    }

    fn begin(&mut self) -> Result<(), BridgeError> {
        self.core.begin(&mut self.spi)
    }

    fn teardown(&mut self) {
        self.core.teardown();
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

    /// Wait for the peer to clock one transaction
    ///
    /// If the peer deselects early, the receive buffer past the clocked
    /// bytes is zeroed so it never holds data from an earlier transaction.
    fn transfer(&mut self, _timeout: ()) -> Result<usize, BridgeError> {
        let frame = self.core.ready_frame()?;
        let (read, write) = frame.bus_buffers();
        match self.spi.transfer_wait(read, write) {
            Ok(n) => {
                let n = n.min(read.len());
                read[n..].fill(0);
                trace!("Peer clocked {} bytes", n);
                Ok(n)
            }
            Err(e) => {
                let err = BridgeError::from(e);
                warn!("Slave transfer failed: {}", err);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{slave_config, MockSpi};
    use tesseract_hal::BusError;
    use tesseract_protocol::SetStripZLevel;

    fn ready(spi: MockSpi) -> SlaveBridge<MockSpi> {
        let mut bridge = SlaveBridge::new(spi, slave_config(8));
        bridge.initialize().unwrap();
        bridge.begin().unwrap();
        bridge
    }

    #[test]
    fn test_slave_configures_without_frequency() {
        let bridge = ready(MockSpi::new());
        assert_eq!(bridge.spi().settings().unwrap().frequency, None);
        assert_eq!(bridge.role(), Role::Slave);
    }

    #[test]
    fn test_slave_receives_commands() {
        let cmd = Command::SetStripZLevel(SetStripZLevel { z_level: 200 });
        let wire = cmd.encode_to_vec().unwrap();
        let mut bridge = ready(MockSpi::new().with_reply(&wire));

        assert_eq!(bridge.transfer(()), Ok(8));
        let mut commands = bridge.commands().unwrap();
        assert_eq!(commands.next(), Some(Ok(cmd)));
        assert_eq!(commands.next(), None);
    }

    #[test]
    fn test_slave_reports_short_transaction() {
        let mut bridge = ready(MockSpi::new().with_clocked(3));
        assert_eq!(bridge.transfer(()), Ok(3));
    }

    #[test]
    fn test_short_transaction_clears_stale_tail() {
        let spi = MockSpi::new()
            .with_reply(&[1, 2, 3, 4, 5, 6, 7, 8])
            .with_short_reply(&[9, 9], 2);
        let mut bridge = ready(spi);

        assert_eq!(bridge.transfer(()), Ok(8));
        assert_eq!(bridge.received().unwrap(), &[1u8, 2, 3, 4, 5, 6, 7, 8]);

        assert_eq!(bridge.transfer(()), Ok(2));
        assert_eq!(bridge.received().unwrap(), &[9u8, 9, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_resend_keeps_send_buffer() {
        let mut bridge = ready(MockSpi::new());
        let status = [Command::SetStripZLevel(SetStripZLevel { z_level: 1 })];
        bridge.stage_commands(&status).unwrap();
        bridge.transfer(()).unwrap();
        bridge.transfer(()).unwrap();
        let frames = bridge.spi().sent_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], frames[1]);
    }

    #[test]
    fn test_transfer_after_teardown_rejected() {
        let mut bridge = ready(MockSpi::new());
        bridge.teardown();
        assert_eq!(bridge.state(), BridgeState::Uninitialized);
        assert_eq!(bridge.transfer(()), Err(BridgeError::NotReady));
        assert!(bridge.received().is_err());
        assert_eq!(bridge.spi().transfers(), 0);
    }

    #[test]
    fn test_bus_fault_reported() {
        let mut bridge = ready(MockSpi::new().failing(BusError::ModeFault));
        assert_eq!(
            bridge.transfer(()),
            Err(BridgeError::Bus(BusError::ModeFault))
        );
    }
}
