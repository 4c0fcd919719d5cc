// Licensed under the Apache-2.0 license

//! Slave role.
//!
//! The whole slave protocol runs in interrupt context: an addressed write
//! fills the inbound buffer, an addressed read drains the outbound buffer.
//! Foreground code only loads the response and picks up received frames.

use crate::common::Logger;
use crate::twi::common::{SlaveStatus, StatusCode};
use crate::twi::controller::TwiController;
use crate::twi::traits::TwiHardware;

/// Staged when the master reads past the end of the outbound buffer.
pub const FILLER_BYTE: u8 = 0xFF;

/// Status events the slave reacts to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveEvent {
    /// Own SLA+W (or general call) received, ACK returned
    AddressMatchedForWrite,
    /// Data byte received, ACK returned
    ByteReceived,
    /// Own SLA+R received, ACK returned
    AddressMatchedForRead,
    /// Data byte transmitted, ACK received
    ByteTransmitted,
    /// Stop or repeated start while addressed
    StopReceived,
}

impl SlaveEvent {
    #[must_use]
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::OwnSlaWriteAck | StatusCode::GeneralCallAck => {
                Some(Self::AddressMatchedForWrite)
            }
            StatusCode::SlaveDataReceivedAck | StatusCode::GeneralCallDataAck => {
                Some(Self::ByteReceived)
            }
            StatusCode::OwnSlaReadAck => Some(Self::AddressMatchedForRead),
            StatusCode::SlaveDataSentAck => Some(Self::ByteTransmitted),
            StatusCode::StopOrRepeatedStart => Some(Self::StopReceived),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SlaveState {
    receiving: bool,
    frame_ready: bool,
    overflow_count: u32,
}

impl<H: TwiHardware, L: Logger, const N: usize> TwiController<H, L, N> {
    /// Slave state machine, one call per interrupt. The caller releases the
    /// controller afterwards.
    pub(crate) fn on_slave_event(&mut self, event: SlaveEvent) {
        match event {
            SlaveEvent::AddressMatchedForWrite => {
                self.inbound.reset();
                self.slave.receiving = true;
                self.slave.frame_ready = false;
            }
            SlaveEvent::ByteReceived => {
                let byte = self.hardware.read_data();
                if self.inbound.push(byte).is_err() {
                    self.slave.overflow_count = self.slave.overflow_count.saturating_add(1);
                    self.logger.error("Too much data received!");
                }
            }
            SlaveEvent::AddressMatchedForRead => {
                self.outbound.reset();
                self.stage_outbound();
            }
            SlaveEvent::ByteTransmitted => {
                self.outbound.advance();
                self.stage_outbound();
            }
            SlaveEvent::StopReceived => {
                if self.slave.receiving {
                    self.slave.receiving = false;
                    self.slave.frame_ready = self.inbound.is_full();
                }
            }
        }
    }

    fn stage_outbound(&mut self) {
        let byte = match self.outbound.current() {
            Some(byte) => byte,
            None => {
                self.logger.error("No more data to send");
                FILLER_BYTE
            }
        };
        self.hardware.write_data(byte);
    }

    /// Load the block returned to the next master read.
    pub fn set_response(&mut self, data: &[u8; N]) {
        self.outbound.load(data);
    }

    /// Bytes received by the current or last master write.
    #[must_use]
    pub fn received(&self) -> &[u8] {
        self.inbound.filled()
    }

    /// Take a complete frame once the master has finished writing it.
    pub fn take_received(&mut self) -> Option<[u8; N]> {
        if !self.slave.frame_ready {
            return None;
        }
        self.slave.frame_ready = false;
        Some(*self.inbound.contents())
    }

    #[must_use]
    pub fn slave_status(&self) -> SlaveStatus {
        SlaveStatus {
            address: self.config.own_address,
            rx_count: self.inbound.cursor(),
            tx_cursor: self.outbound.cursor(),
            overflow_count: self.slave.overflow_count,
            frame_ready: self.slave.frame_ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twi::common::{TwiConfigBuilder, FRAME_SIZE};
    use crate::twi::mock::{MockTwi, RecordingLogger};
    use crate::twi::traits::{TWEA, TWEN, TWIE, TWINT};

    type TestController = TwiController<MockTwi, RecordingLogger>;

    fn slave() -> TestController {
        let config = TwiConfigBuilder::new().slave(3).build().unwrap();
        let mut twi = TwiController::new(MockTwi::new(), config, RecordingLogger::default());
        twi.init().unwrap();
        twi.hardware_mut().controls.clear();
        twi
    }

    fn fire(twi: &mut TestController, status: u8, data: u8) {
        twi.hardware_mut().raise(status, data);
        twi.on_interrupt();
    }

    #[test]
    fn test_receive_frame() {
        let mut twi = slave();

        fire(&mut twi, 0x60, 0);
        for byte in [1, 2, 3, 4, 5] {
            fire(&mut twi, 0x80, byte);
        }
        assert_eq!(twi.received(), &[1, 2, 3, 4, 5]);
        assert_eq!(twi.take_received(), None);

        fire(&mut twi, 0xA0, 0);
        assert_eq!(twi.take_received(), Some([1, 2, 3, 4, 5]));
        assert_eq!(twi.take_received(), None);
        assert!(twi.logger().errors.is_empty());
    }

    #[test]
    fn test_receive_overflow_drops_excess() {
        let mut twi = slave();

        fire(&mut twi, 0x60, 0);
        for byte in 1..=8 {
            fire(&mut twi, 0x80, byte);
        }

        assert_eq!(twi.received(), &[1, 2, 3, 4, 5]);
        assert_eq!(twi.logger().errors.len(), 3);
        assert_eq!(twi.slave_status().overflow_count, 3);
    }

    #[test]
    fn test_short_write_is_not_a_frame() {
        let mut twi = slave();

        fire(&mut twi, 0x60, 0);
        fire(&mut twi, 0x80, 7);
        fire(&mut twi, 0xA0, 0);

        assert_eq!(twi.received(), &[7]);
        assert_eq!(twi.take_received(), None);
    }

    #[test]
    fn test_transmit_stages_outbound_in_order() {
        let mut twi = slave();
        twi.set_response(&[0xA0, 0xA1, 0xA2, 0xA3, 0xA4]);

        fire(&mut twi, 0xA8, 0);
        for _ in 0..FRAME_SIZE - 1 {
            fire(&mut twi, 0xB8, 0);
        }
        assert_eq!(twi.hardware().staged, vec![0xA0, 0xA1, 0xA2, 0xA3, 0xA4]);
        assert!(twi.logger().errors.is_empty());

        // master keeps reading past the block
        fire(&mut twi, 0xB8, 0);
        assert_eq!(twi.hardware().staged[FRAME_SIZE], FILLER_BYTE);
        assert_eq!(twi.logger().errors.len(), 1);
        assert_eq!(twi.slave_status().tx_cursor, FRAME_SIZE);
    }

    #[test]
    fn test_release_once_per_interrupt() {
        let mut twi = slave();

        fire(&mut twi, 0x60, 0);
        fire(&mut twi, 0x80, 1);
        fire(&mut twi, 0xC0, 0);
        fire(&mut twi, 0x68, 0);

        assert_eq!(
            twi.hardware().controls,
            vec![TWINT | TWEN | TWIE | TWEA; 4]
        );
    }

    #[test]
    fn test_master_codes_ignored() {
        let mut twi = slave();

        fire(&mut twi, 0x50, 9);

        assert!(twi.received().is_empty());
        assert_eq!(twi.hardware().controls.len(), 1);
    }

    #[test]
    fn test_general_call_write() {
        let config = TwiConfigBuilder::new()
            .slave(3)
            .general_call(true)
            .build()
            .unwrap();
        let mut twi: TestController =
            TwiController::new(MockTwi::new(), config, RecordingLogger::default());
        twi.init().unwrap();

        fire(&mut twi, 0x70, 0);
        fire(&mut twi, 0x90, 0x11);

        assert_eq!(twi.received(), &[0x11]);
        assert_eq!(twi.hardware().own_address, Some(0x07));
    }

    #[test]
    fn test_slave_status() {
        let mut twi = slave();
        fire(&mut twi, 0x60, 0);
        fire(&mut twi, 0x80, 1);

        let status = twi.slave_status();
        assert_eq!(status.address, Some(3));
        assert_eq!(status.rx_count, 1);
        assert!(!status.frame_ready);
    }
}
