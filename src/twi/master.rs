// Licensed under the Apache-2.0 license

//! Master role: synchronous block write, asynchronous block read.
//!
//! A write runs entirely in the caller, blocking on the bus primitives
//! between phases. A read only issues the start condition and the address;
//! the bytes are collected by the receive state machine from
//! [`TwiController::on_interrupt`], and the caller learns about completion
//! through [`TwiController::poll_read`].

use embedded_hal::i2c::SevenBitAddress;

use crate::common::Logger;
use crate::twi::common::{address_byte, Direction, Role, StatusCode, TransactionKind};
use crate::twi::controller::TwiController;
use crate::twi::error::Error;
use crate::twi::signals::BusSignals;
use crate::twi::traits::TwiHardware;

/// Status events the master receiver reacts to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MasterReceiveEvent {
    /// SLA+R sent, ACK received
    AddressAckedForRead,
    /// SLA+R sent, NACK received
    AddressNackedForRead,
    /// Byte received, ACK returned
    ByteReceivedWithAck,
    /// Byte received, NACK returned
    ByteReceivedFinal,
}

impl MasterReceiveEvent {
    #[must_use]
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::SlaReadAck => Some(Self::AddressAckedForRead),
            StatusCode::SlaReadNack => Some(Self::AddressNackedForRead),
            StatusCode::DataReceivedAck => Some(Self::ByteReceivedWithAck),
            StatusCode::DataReceivedNack => Some(Self::ByteReceivedFinal),
            _ => None,
        }
    }
}

/// Bus control issued after a receive event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReceiveAction {
    Ack,
    Nack,
    Stop,
}

/// Transition table of the master receiver.
///
/// `cursor` is the number of bytes stored after the event was handled. The
/// switch to NACK happens one byte before the buffer is full so the peer
/// stops after exactly `capacity` bytes.
#[must_use]
pub fn receive_action(event: MasterReceiveEvent, cursor: usize, capacity: usize) -> ReceiveAction {
    let last = capacity.saturating_sub(1);
    match event {
        MasterReceiveEvent::AddressAckedForRead if last > 0 => ReceiveAction::Ack,
        MasterReceiveEvent::AddressAckedForRead => ReceiveAction::Nack,
        MasterReceiveEvent::ByteReceivedWithAck if cursor < last => ReceiveAction::Ack,
        MasterReceiveEvent::ByteReceivedWithAck => ReceiveAction::Nack,
        MasterReceiveEvent::ByteReceivedFinal | MasterReceiveEvent::AddressNackedForRead => {
            ReceiveAction::Stop
        }
    }
}

/// Progress of the asynchronous master read.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadState {
    Idle,
    Pending,
    Complete,
    Failed(Error),
}

impl<H: TwiHardware, L: Logger, const N: usize> TwiController<H, L, N> {
    /// Write one block of `N` bytes to `address`.
    ///
    /// Issues one start, the address byte, `N` data bytes and one stop,
    /// checking the status after each of the `N + 2` steps. Under
    /// `MismatchPolicy::LogAndContinue` a mismatch is only logged and the
    /// whole block is always attempted.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidAddress` for an address wider than seven bits
    /// * `Error::WrongRole` when configured as a slave
    /// * `Error::Busy` while a read is outstanding
    /// * `Error::ProtocolMismatch` under `MismatchPolicy::FailFast`; the bus
    ///   is stopped before returning
    pub fn write_block(&mut self, address: SevenBitAddress, data: &[u8; N]) -> Result<(), Error> {
        let address = self.prepare(address, Direction::Write)?;
        self.outbound.load(data);
        self.transaction = Some(TransactionKind::MasterWrite);

        let result = self.write_sequence(address);
        if result.is_err() {
            self.hardware.stop();
        }
        self.transaction = None;
        result
    }

    fn write_sequence(&mut self, address: u8) -> Result<(), Error> {
        self.hardware.start();
        self.check(StatusCode::Start)?;

        self.hardware.write_byte(address);
        self.check(StatusCode::SlaWriteAck)?;

        while let Some(byte) = self.outbound.current() {
            self.hardware.write_byte(byte);
            self.outbound.advance();
            self.check(StatusCode::DataSentAck)?;
        }

        self.hardware.stop();
        Ok(())
    }

    /// Start reading one block of `N` bytes from `address`.
    ///
    /// Returns as soon as the address byte is queued. The inbound buffer is
    /// filled from interrupt context; use [`poll_read`](Self::poll_read) to
    /// collect the result.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidAddress`, `Error::WrongRole`, `Error::Busy` as for
    ///   [`write_block`](Self::write_block)
    /// * `Error::Busy` while a completed frame has not been collected yet
    /// * `Error::ProtocolMismatch` under `MismatchPolicy::FailFast` when the
    ///   start condition was not confirmed
    pub fn request_read(&mut self, address: SevenBitAddress) -> Result<(), Error> {
        let address = self.prepare(address, Direction::Read)?;
        if self.read_state == ReadState::Complete {
            return Err(Error::Busy);
        }
        self.inbound.reset();
        self.read_state = ReadState::Pending;
        self.transaction = Some(TransactionKind::MasterRead);

        self.hardware.start();
        if let Err(err) = self.check(StatusCode::Start) {
            self.hardware.stop();
            self.read_state = ReadState::Idle;
            self.transaction = None;
            return Err(err);
        }

        self.hardware.queue_byte(address);
        Ok(())
    }

    /// Collect the result of the last [`request_read`](Self::request_read).
    ///
    /// Returns `WouldBlock` while the transfer is in progress. A completed or
    /// failed read is handed out once; the controller is idle afterwards.
    pub fn poll_read(&mut self) -> nb::Result<[u8; N], Error> {
        match self.read_state {
            ReadState::Idle => Err(nb::Error::Other(Error::NoReadPending)),
            ReadState::Pending => Err(nb::Error::WouldBlock),
            ReadState::Complete => {
                self.read_state = ReadState::Idle;
                Ok(*self.inbound.contents())
            }
            ReadState::Failed(err) => {
                self.read_state = ReadState::Idle;
                Err(nb::Error::Other(err))
            }
        }
    }

    /// Give up on an outstanding read.
    ///
    /// Issues a stop condition and returns the controller to idle. Needed
    /// when the bus reports a code the receiver does not handle, such as a
    /// lost arbitration or a bus error, which leaves the read pending.
    /// A read that is not pending is left alone.
    pub fn abort_read(&mut self) {
        if self.read_state != ReadState::Pending {
            return;
        }
        self.hardware.stop();
        self.inbound.reset();
        self.read_state = ReadState::Idle;
        self.transaction = None;
    }

    #[must_use]
    pub fn read_state(&self) -> ReadState {
        self.read_state
    }

    #[must_use]
    pub fn is_read_complete(&self) -> bool {
        self.read_state == ReadState::Complete
    }

    /// Master receive state machine, one call per interrupt.
    pub(crate) fn on_master_receive(&mut self, event: MasterReceiveEvent) {
        match event {
            MasterReceiveEvent::AddressAckedForRead => self.inbound.reset(),
            MasterReceiveEvent::ByteReceivedWithAck | MasterReceiveEvent::ByteReceivedFinal => {
                let byte = self.hardware.read_data();
                if self.inbound.push(byte).is_err() {
                    self.logger.error("Too much data received, byte dropped");
                }
            }
            MasterReceiveEvent::AddressNackedForRead => {}
        }

        match receive_action(event, self.inbound.cursor(), N) {
            ReceiveAction::Ack => self.hardware.continue_with_ack(),
            ReceiveAction::Nack => self.hardware.continue_without_ack(),
            ReceiveAction::Stop => self.hardware.stop(),
        }

        match event {
            MasterReceiveEvent::ByteReceivedFinal => {
                self.read_state = ReadState::Complete;
                self.transaction = None;
            }
            MasterReceiveEvent::AddressNackedForRead => {
                self.logger.error("Read request not acknowledged");
                self.read_state = ReadState::Failed(Error::AddressNack);
                self.transaction = None;
            }
            _ => {}
        }
    }

    fn prepare(&self, address: SevenBitAddress, direction: Direction) -> Result<u8, Error> {
        if self.config.role != Role::Master {
            return Err(Error::WrongRole);
        }
        if self.read_state == ReadState::Pending {
            return Err(Error::Busy);
        }
        address_byte(address, direction).ok_or(Error::InvalidAddress(address))
    }

    fn check(&mut self, expected: StatusCode) -> Result<(), Error> {
        let actual = self.hardware.status();
        self.validator
            .check_status(&mut self.logger, actual, expected)
    }
}
