// Licensed under the Apache-2.0 license

//! # TWI Hardware Abstraction
//!
//! The engine talks to the bus controller through four registers, modelled on
//! the ATmega TWI block:
//!
//! ```text
//! control  (TWCR)  INT | EA | STA | STO | WC | EN | - | IE
//! status   (TWSR)  status code in bits 7..3, prescaler in bits 1..0
//! data     (TWDR)  byte to shift out / byte shifted in
//! bit rate (TWBR)  SCL divisor
//! ```
//!
//! [`TwiHardware`] is the only thing a port has to provide. The bus signal
//! primitives in [`crate::twi::signals`] are built on top of it for every
//! implementation.

/// Operation complete; writing one clears it and starts the next operation
pub const TWINT: u8 = 0x80;
/// Return ACK after the next received byte
pub const TWEA: u8 = 0x40;
/// Generate a start condition
pub const TWSTA: u8 = 0x20;
/// Generate a stop condition
pub const TWSTO: u8 = 0x10;
/// Bus engine enable
pub const TWEN: u8 = 0x04;
/// Interrupt enable
pub const TWIE: u8 = 0x01;

/// Register-level access to a two-wire bus controller.
///
/// Implementations are expected to be thin register wrappers. All protocol
/// decisions live in the engine.
pub trait TwiHardware {
    /// Raw status register. The engine masks off the prescaler bits.
    fn status(&self) -> u8;

    /// Current control register value.
    fn control(&self) -> u8;

    /// Write the control register.
    fn write_control(&mut self, value: u8);

    /// Byte most recently shifted in from the bus.
    fn read_data(&self) -> u8;

    /// Stage a byte to be shifted out by the next operation.
    fn write_data(&mut self, byte: u8);

    /// Program the bit-rate divisor and the prescaler bits.
    fn set_bit_rate(&mut self, divisor: u8, prescaler_bits: u8);

    /// Program the own-address register (address in bits 7..1, general call
    /// recognition in bit 0).
    fn set_own_address(&mut self, value: u8);
}
