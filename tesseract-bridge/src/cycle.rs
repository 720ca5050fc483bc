//! One cooperative poll cycle
//!
//! ```text
//! ingress ──stage──▶ send ══transfer══▶ recv ──decode──▶ handler
//! ```
//!
//! Staging always completes before the transaction starts, and the receive
//! buffer is fully dispatched before `poll` returns, so the next cycle can
//! reuse both buffers.

use tesseract_hal::IngressSource;
use tesseract_protocol::{CodecError, Command, Commands};

use crate::bridge::TransportBridge;
use crate::error::BridgeError;
use crate::frame::Staged;

/// Consumer of decoded commands
pub trait CommandHandler {
    fn handle(&mut self, command: Command);
}

impl<F: FnMut(Command)> CommandHandler for F {
    fn handle(&mut self, command: Command) {
        self(command)
    }
}

/// What one cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Result of staging ingress into the send buffer
    pub staged: Staged,
    /// Bytes clocked, or `None` if no transaction ran
    pub transferred: Option<usize>,
    /// Commands handed to the handler
    pub dispatched: usize,
    /// Decode error that cut the received frame short
    pub discarded: Option<CodecError>,
}

impl CycleReport {
    fn skipped(staged: Staged) -> Self {
        Self {
            staged,
            transferred: None,
            dispatched: 0,
            discarded: None,
        }
    }
}

/// Run one cycle: stage, transfer, decode, dispatch
///
/// A bridge that drives the bus skips the transaction when nothing was
/// staged. A driven bridge always waits for its peer, resending whatever
/// its send buffer already holds.
///
/// Staging and bus errors are returned; the frame is not transmitted and
/// the caller retries on the next cycle. A decode error only discards the
/// rest of the received frame and is recorded in the report.
pub fn poll<T, I, H>(
    bridge: &mut T,
    ingress: &mut I,
    handler: &mut H,
    timeout: T::Timeout,
) -> Result<CycleReport, BridgeError>
where
    T: TransportBridge,
    I: IngressSource,
    H: CommandHandler,
{
    let staged = bridge.stream_ingress_to_transfer(ingress)?;
    if T::DRIVES_BUS && staged == Staged::Idle {
        return Ok(CycleReport::skipped(staged));
    }

    let transferred = bridge.transfer(timeout)?;
    let (dispatched, discarded) = dispatch(bridge.commands()?, handler);
    debug!(
        "Cycle: {} bytes clocked, {} commands dispatched",
        transferred, dispatched
    );

    Ok(CycleReport {
        staged,
        transferred: Some(transferred),
        dispatched,
        discarded,
    })
}

/// Hand every decodable command to `handler`
///
/// Returns the number dispatched and the error that ended the frame, if any.
pub fn dispatch<H: CommandHandler>(
    mut commands: Commands<'_>,
    handler: &mut H,
) -> (usize, Option<CodecError>) {
    let mut dispatched = 0;
    while let Some(result) = commands.next() {
        match result {
            Ok(command) => {
                handler.handle(command);
                dispatched += 1;
            }
            Err(e) => {
                warn!(
                    "Discarding frame after {} bytes: {}",
                    commands.consumed(),
                    e
                );
                return (dispatched, Some(e));
            }
        }
    }
    (dispatched, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{MasterBridge, SlaveBridge};
    use crate::mock::{master_config, slave_config, MockIngress, MockPin, MockSpi};
    use embassy_time::Duration;
    use std::vec;
    use std::vec::Vec;
    use tesseract_hal::{NoIngress, OutputPin};
    use tesseract_protocol::{SetPaletteColor, SetStripZLevel};

    fn master(spi: MockSpi, capacity: usize) -> MasterBridge<MockSpi, MockPin> {
        let mut bridge = MasterBridge::new(spi, MockPin::new(), master_config(capacity));
        bridge.initialize().unwrap();
        bridge.begin().unwrap();
        bridge
    }

    fn slave(spi: MockSpi, capacity: usize) -> SlaveBridge<MockSpi> {
        let mut bridge = SlaveBridge::new(spi, slave_config(capacity));
        bridge.initialize().unwrap();
        bridge.begin().unwrap();
        bridge
    }

    fn wire(commands: &[Command]) -> Vec<u8> {
        let mut out = Vec::new();
        for command in commands {
            out.extend_from_slice(&command.encode_to_vec().unwrap());
        }
        out
    }

    #[test]
    fn test_slave_dispatches_strip_z_level() {
        let cmd = Command::SetStripZLevel(SetStripZLevel { z_level: 200 });
        let mut bridge = slave(MockSpi::new().with_reply(&wire(&[cmd])), 16);
        let mut seen = Vec::new();
        let mut handler = |c: Command| seen.push(c);

        let report = poll(&mut bridge, &mut NoIngress, &mut handler, ()).unwrap();
        assert_eq!(report.staged, Staged::Idle);
        assert_eq!(report.transferred, Some(16));
        assert_eq!(report.dispatched, 1);
        assert_eq!(report.discarded, None);
        assert_eq!(seen, vec![cmd]);
    }

    #[test]
    fn test_palette_color_survives_link() {
        let cmd = Command::SetPaletteColor(SetPaletteColor {
            color_idx: 5,
            future_use: 0,
            red: 255,
            green: 0,
            blue: 128,
        });

        let mut master = master(MockSpi::new(), 16);
        let mut ingress = MockIngress::new(&wire(&[cmd]));
        let mut ignore = |_: Command| {};
        let report = poll(&mut master, &mut ingress, &mut ignore, Duration::from_millis(5)).unwrap();
        assert_eq!(report.staged, Staged::Bytes(6));

        let frame = master.spi().sent_frames()[0].clone();
        let mut slave = slave(MockSpi::new().with_reply(&frame), 16);
        let mut seen = Vec::new();
        let mut handler = |c: Command| seen.push(c);
        poll(&mut slave, &mut NoIngress, &mut handler, ()).unwrap();
        assert_eq!(seen, vec![cmd]);
    }

    #[test]
    fn test_overflow_transmits_nothing() {
        let mut bridge = master(MockSpi::new(), 1024);
        let burst = vec![0x01u8; 1030];
        let mut ingress = MockIngress::new(&burst);
        let mut ignore = |_: Command| {};

        assert_eq!(
            poll(&mut bridge, &mut ingress, &mut ignore, Duration::from_millis(5)),
            Err(BridgeError::FrameOverflow {
                available: 1030,
                capacity: 1024,
            })
        );
        assert_eq!(bridge.spi().transfers(), 0);

        // The burst was dropped, so the next cycle is simply idle
        let report = poll(&mut bridge, &mut ingress, &mut ignore, Duration::from_millis(5)).unwrap();
        assert_eq!(report.transferred, None);
    }

    #[test]
    fn test_timeout_leaves_select_deasserted() {
        let mut bridge = master(MockSpi::new().unresponsive(), 8);
        let mut ingress = MockIngress::new(&[0x01, 0x32]);
        let mut ignore = |_: Command| {};

        let result = poll(&mut bridge, &mut ingress, &mut ignore, Duration::from_millis(0));
        assert_eq!(result, Err(BridgeError::TransferTimeout));
        assert!(result.unwrap_err().is_retryable());
        assert!(bridge.select().is_set_high());
    }

    #[test]
    fn test_idle_master_skips_transfer() {
        let mut bridge = master(MockSpi::new(), 8);
        let mut ingress = MockIngress::new(&[7, 7]);
        let mut ignore = |_: Command| {};
        poll(&mut bridge, &mut ingress, &mut ignore, Duration::from_millis(5)).unwrap();
        let before = bridge.sent().unwrap().to_vec();

        let report = poll(&mut bridge, &mut ingress, &mut ignore, Duration::from_millis(5)).unwrap();
        assert_eq!(report.staged, Staged::Idle);
        assert_eq!(report.transferred, None);
        assert_eq!(bridge.spi().transfers(), 1);
        assert_eq!(bridge.sent().unwrap(), &before[..]);
    }

    #[test]
    fn test_idle_slave_still_serves_peer() {
        let mut bridge = slave(MockSpi::new(), 8);
        let mut ignore = |_: Command| {};
        let report = poll(&mut bridge, &mut NoIngress, &mut ignore, ()).unwrap();
        assert_eq!(report.transferred, Some(8));
        assert_eq!(report.dispatched, 0);
        assert_eq!(bridge.spi().transfers(), 1);
    }

    #[test]
    fn test_bad_opcode_discards_rest_of_frame() {
        let mut frame = wire(&[Command::SetStripZLevel(SetStripZLevel { z_level: 9 })]);
        frame.extend_from_slice(&[0x0A, 0x00]);
        frame.extend_from_slice(&wire(&[Command::SetStripZLevel(SetStripZLevel {
            z_level: 10,
        })]));
        let mut bridge = slave(MockSpi::new().with_reply(&frame), 16);
        let mut seen = Vec::new();
        let mut handler = |c: Command| seen.push(c);

        let report = poll(&mut bridge, &mut NoIngress, &mut handler, ()).unwrap();
        assert_eq!(report.dispatched, 1);
        assert_eq!(report.discarded, Some(CodecError::UnknownOpcode(0x0A)));

        // Next cycle starts from a fresh frame
        let report = poll(&mut bridge, &mut NoIngress, &mut handler, ()).unwrap();
        assert_eq!(report.dispatched, 1);
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_short_transaction_does_not_replay_commands() {
        let one = Command::SetStripZLevel(SetStripZLevel { z_level: 1 });
        let two = Command::SetStripZLevel(SetStripZLevel { z_level: 2 });
        let spi = MockSpi::new()
            .with_reply(&wire(&[one, two]))
            .with_short_reply(&wire(&[one]), 2);
        let mut bridge = slave(spi, 8);
        let mut seen = Vec::new();
        let mut handler = |c: Command| seen.push(c);

        let report = poll(&mut bridge, &mut NoIngress, &mut handler, ()).unwrap();
        assert_eq!(report.transferred, Some(8));
        assert_eq!(report.dispatched, 2);

        let report = poll(&mut bridge, &mut NoIngress, &mut handler, ()).unwrap();
        assert_eq!(report.transferred, Some(2));
        assert_eq!(report.dispatched, 1);
        assert_eq!(seen, vec![one, two, one]);
    }

    #[test]
    fn test_poll_requires_ready() {
        let mut bridge = SlaveBridge::new(MockSpi::new(), slave_config(8));
        let mut ignore = |_: Command| {};
        assert_eq!(
            poll(&mut bridge, &mut NoIngress, &mut ignore, ()),
            Err(BridgeError::NotReady)
        );
    }
}
