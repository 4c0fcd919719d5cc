// Licensed under the Apache-2.0 license

//! Bus signal primitives.
//!
//! Every primitive keeps the engine enabled and interrupt-capable. Waiting is
//! a tight spin on the operation-complete flag: it is bounded only by bus
//! timing and cannot be cancelled. A peer that never answers keeps the caller
//! spinning.

use crate::twi::traits::{TwiHardware, TWEA, TWEN, TWIE, TWINT, TWSTA, TWSTO};

/// Control actions on top of a [`TwiHardware`] register block.
///
/// Blanket-implemented for every `TwiHardware`.
pub trait BusSignals: TwiHardware {
    /// Send a start condition and wait until it is on the wire.
    fn start(&mut self) {
        self.write_control(TWINT | TWEN | TWIE | TWSTA);
        self.wait_until_ready();
    }

    /// Send a stop condition. Returns without waiting; the controller does
    /// not raise the complete flag after a stop.
    fn stop(&mut self) {
        self.write_control(TWINT | TWEN | TWIE | TWSTO);
    }

    /// Continue with the acknowledge bit enabled.
    fn continue_with_ack(&mut self) {
        self.write_control(TWINT | TWEN | TWIE | TWEA);
    }

    /// Continue without acknowledge. Also starts shifting out a staged byte.
    fn continue_without_ack(&mut self) {
        self.write_control(TWINT | TWEN | TWIE);
    }

    /// Shift out one byte and wait for the operation to complete.
    ///
    /// The sender does not drive the acknowledge bit, so the byte is sent
    /// with `continue_without_ack`.
    fn write_byte(&mut self, byte: u8) {
        self.queue_byte(byte);
        self.wait_until_ready();
    }

    /// Stage one byte and start shifting it out without waiting. Completion
    /// is reported through the interrupt.
    fn queue_byte(&mut self, byte: u8) {
        self.write_data(byte);
        self.continue_without_ack();
    }

    fn wait_until_ready(&self) {
        while self.control() & TWINT == 0 {
            core::hint::spin_loop();
        }
    }

    /// Signal "operation complete" and let the engine proceed, keeping all
    /// other control bits as they are.
    fn release(&mut self) {
        let control = self.control();
        self.write_control(control | TWINT);
    }
}

impl<T: TwiHardware + ?Sized> BusSignals for T {}
