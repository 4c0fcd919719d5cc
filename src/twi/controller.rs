// Licensed under the Apache-2.0 license

//! Bus controller object.
//!
//! [`TwiController`] owns the hardware handle, the diagnostic logger, both
//! transfer buffers and the per-transaction state. Its
//! [`on_interrupt`](TwiController::on_interrupt) method is the only interrupt
//! entry point: the integrator calls it from the TWI vector and never touches
//! the buffers while a transaction is active.
//!
//! The master operations live in [`crate::twi::master`], the slave state
//! machine in [`crate::twi::slave`].

use crate::common::{Logger, NoOpLogger};
use crate::twi::buffer::TransferBuffer;
use crate::twi::common::{Role, StatusCode, TransactionKind, TwiConfig, FRAME_SIZE};
use crate::twi::error::Error;
use crate::twi::master::{MasterReceiveEvent, ReadState};
use crate::twi::status::StatusValidator;
use crate::twi::traits::{TwiHardware, TWEA, TWEN, TWIE};

#[cfg(feature = "twi_slave")]
use crate::twi::slave::{SlaveEvent, SlaveState};

pub struct TwiController<H: TwiHardware, L: Logger = NoOpLogger, const N: usize = FRAME_SIZE> {
    pub(crate) hardware: H,
    pub(crate) logger: L,
    pub(crate) config: TwiConfig,
    pub(crate) validator: StatusValidator,
    pub(crate) inbound: TransferBuffer<N>,
    pub(crate) outbound: TransferBuffer<N>,
    pub(crate) transaction: Option<TransactionKind>,
    pub(crate) read_state: ReadState,
    #[cfg(feature = "twi_slave")]
    pub(crate) slave: SlaveState,
}

impl<H: TwiHardware, L: Logger, const N: usize> TwiController<H, L, N> {
    const NON_EMPTY: () = assert!(N > 0, "transfer buffers need at least one byte");

    pub fn new(hardware: H, config: TwiConfig, logger: L) -> Self {
        let () = Self::NON_EMPTY;
        let validator = StatusValidator::new(config.mismatch_policy);
        Self {
            hardware,
            logger,
            config,
            validator,
            inbound: TransferBuffer::new(),
            outbound: TransferBuffer::new(),
            transaction: None,
            read_state: ReadState::Idle,
            #[cfg(feature = "twi_slave")]
            slave: SlaveState::default(),
        }
    }

    /// Program bit rate, own address and the control register.
    ///
    /// A slave starts out acknowledging its own address; a master only
    /// enables the engine and its interrupt. Any outstanding read is
    /// abandoned.
    ///
    /// # Errors
    ///
    /// Returns `Error::WrongRole` when a slave role is configured but slave
    /// support is compiled out.
    pub fn init(&mut self) -> Result<(), Error> {
        let bit_rate = self.config.bit_rate;
        self.hardware
            .set_bit_rate(bit_rate.divisor, bit_rate.prescaler.bits());
        self.read_state = ReadState::Idle;
        self.inbound.reset();

        match self.config.role {
            Role::Master => {
                self.hardware.write_control(TWEN | TWIE);
                self.transaction = None;
            }
            Role::Slave => {
                if !cfg!(feature = "twi_slave") {
                    return Err(Error::WrongRole);
                }
                if let Some(value) = self.config.own_address_register() {
                    self.hardware.set_own_address(value);
                }
                self.hardware.write_control(TWEN | TWIE | TWEA);
                self.transaction = Some(TransactionKind::SlaveServe);
            }
        }
        self.logger.debug("TWI initialized");
        Ok(())
    }

    /// Handle one firing of the TWI interrupt.
    ///
    /// The status code is interpreted for the configured role only.
    /// Unrecognised codes are ignored. In the slave role the controller is
    /// released exactly once per call, whatever the code was.
    pub fn on_interrupt(&mut self) {
        let status = StatusCode::from_raw(self.hardware.status());
        match self.config.role {
            Role::Master => {
                if self.transaction != Some(TransactionKind::MasterRead) {
                    return;
                }
                if let Some(event) = status.and_then(MasterReceiveEvent::from_status) {
                    self.on_master_receive(event);
                }
            }
            #[cfg(feature = "twi_slave")]
            Role::Slave => {
                if let Some(event) = status.and_then(SlaveEvent::from_status) {
                    self.on_slave_event(event);
                }
                crate::twi::signals::BusSignals::release(&mut self.hardware);
            }
            #[cfg(not(feature = "twi_slave"))]
            Role::Slave => {}
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.config.role
    }

    #[must_use]
    pub fn config(&self) -> &TwiConfig {
        &self.config
    }

    /// Transaction that currently owns the interrupt events.
    #[must_use]
    pub fn transaction(&self) -> Option<TransactionKind> {
        self.transaction
    }

    /// Status mismatches observed by the master since the last reset.
    #[must_use]
    pub fn mismatch_count(&self) -> u32 {
        self.validator.mismatch_count()
    }

    pub fn reset_mismatch_count(&mut self) {
        self.validator.reset_count();
    }

    #[must_use]
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    #[must_use]
    pub fn logger(&self) -> &L {
        &self.logger
    }

    /// Tear down the controller and hand back its parts.
    pub fn free(self) -> (H, L) {
        (self.hardware, self.logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twi::common::TwiConfigBuilder;
    use crate::twi::mock::{MockTwi, RecordingLogger};

    #[test]
    fn test_init_master() {
        let config = TwiConfigBuilder::new().build().unwrap();
        let mut twi: TwiController<_, _> =
            TwiController::new(MockTwi::new(), config, RecordingLogger::default());
        twi.init().unwrap();

        assert_eq!(twi.hardware().bit_rate, Some((72, 0)));
        assert_eq!(twi.hardware().own_address, None);
        assert_eq!(twi.hardware().control, TWEN | TWIE);
        assert_eq!(twi.transaction(), None);
    }

    #[cfg(feature = "twi_slave")]
    #[test]
    fn test_init_slave() {
        let config = TwiConfigBuilder::new().slave(3).build().unwrap();
        let mut twi: TwiController<_, _> =
            TwiController::new(MockTwi::new(), config, RecordingLogger::default());
        twi.init().unwrap();

        assert_eq!(twi.hardware().own_address, Some(0x06));
        assert_eq!(twi.hardware().control, TWEN | TWIE | TWEA);
        assert_eq!(twi.transaction(), Some(TransactionKind::SlaveServe));
        assert_eq!(twi.logger().debugs.len(), 1);
    }

    #[test]
    fn test_master_ignores_interrupts_outside_read() {
        let config = TwiConfigBuilder::new().build().unwrap();
        let mut twi: TwiController<_, _> =
            TwiController::new(MockTwi::new(), config, RecordingLogger::default());

        twi.hardware_mut().raise(0x50, 0xAA);
        twi.on_interrupt();

        assert!(twi.hardware().controls.is_empty());
        assert_eq!(twi.inbound.cursor(), 0);
    }

    #[test]
    fn test_init_abandons_stuck_read() {
        let config = TwiConfigBuilder::new().build().unwrap();
        let mut twi: TwiController<_, _> = TwiController::new(
            MockTwi::scripted(&[0x08, 0x00, 0x08, 0x18, 0x28, 0x28, 0x28, 0x28, 0x28]),
            config,
            RecordingLogger::default(),
        );
        twi.init().unwrap();
        twi.request_read(3).unwrap();

        // arbitration lost mid-read: the receiver never sees its codes again
        twi.hardware_mut().raise(0x38, 0);
        twi.on_interrupt();
        assert_eq!(twi.read_state(), ReadState::Pending);

        twi.init().unwrap();
        assert_eq!(twi.read_state(), ReadState::Idle);
        assert_eq!(twi.transaction(), None);
        assert_eq!(twi.write_block(3, &[1, 2, 3, 4, 5]), Ok(()));
    }

    #[cfg(feature = "twi_slave")]
    mod round_trip {
        use super::*;
        use crate::twi::mock::BusAction;

        type Node = TwiController<MockTwi, RecordingLogger>;

        fn fire(twi: &mut Node, status: u8, data: u8) {
            twi.hardware_mut().raise(status, data);
            twi.on_interrupt();
        }

        /// Replays the bytes one controller puts on the wire into the other,
        /// deriving each status code from the acknowledge bit the receiving
        /// side drives.
        #[test]
        fn test_master_slave_round_trip() {
            let config = TwiConfigBuilder::new().build().unwrap();
            let mut master: Node = TwiController::new(
                MockTwi::scripted(&[0x08, 0x18, 0x28, 0x28, 0x28, 0x28, 0x28]),
                config,
                RecordingLogger::default(),
            );
            let config = TwiConfigBuilder::new().slave(3).build().unwrap();
            let mut slave: Node =
                TwiController::new(MockTwi::new(), config, RecordingLogger::default());
            master.init().unwrap();
            slave.init().unwrap();

            // master -> slave
            master.write_block(3, &[1, 2, 3, 4, 5]).unwrap();
            let wire = master.hardware().staged.clone();
            assert_eq!(Some(wire[0]), slave.hardware().own_address);

            fire(&mut slave, 0x60, wire[0]);
            for byte in &wire[1..] {
                fire(&mut slave, 0x80, *byte);
            }
            fire(&mut slave, 0xA0, 0);
            assert_eq!(slave.take_received(), Some([1, 2, 3, 4, 5]));

            // slave -> master
            slave.set_response(&[9, 8, 7, 6, 5]);
            master.hardware_mut().script.push_back(0x08);
            master.request_read(3).unwrap();
            assert_eq!(master.hardware().staged.last(), Some(&0x07));

            fire(&mut slave, 0xA8, 0);
            fire(&mut master, 0x40, 0);
            for _ in 0..=FRAME_SIZE {
                if master.is_read_complete() {
                    break;
                }
                let byte = *slave.hardware().staged.last().unwrap();
                let acked = master.hardware().actions.last() == Some(&BusAction::Ack);
                fire(&mut master, if acked { 0x50 } else { 0x58 }, byte);
                fire(&mut slave, if acked { 0xB8 } else { 0xC0 }, 0);
            }

            assert!(matches!(master.poll_read(), Ok([9, 8, 7, 6, 5])));
            assert_eq!(slave.slave_status().tx_cursor, FRAME_SIZE - 1);
            assert!(master.logger().errors.is_empty());
            assert!(slave.logger().errors.is_empty());
        }
    }
}
