// Licensed under the Apache-2.0 license

//! Interrupt-driven two-wire bus (TWI / I2C) transaction engine.
//!
//! Every byte on the bus is synchronised against the status code the
//! controller reports, and the ACK/NACK bit decides whether a transfer
//! continues. The payload is a fixed block of `N` bytes in both directions
//! (5 by default), with no length prefix.
//!
//! ```rust,ignore
//! use twi_engine::twi::{TwiConfigBuilder, TwiController};
//!
//! let config = TwiConfigBuilder::new().build()?;
//! let mut twi: TwiController<_> = TwiController::new(hw, config, NoOpLogger);
//! twi.init()?;
//! twi.write_block(3, &[1, 2, 3, 4, 5])?;
//!
//! twi.request_read(3)?;
//! // ... TWI vector calls twi.on_interrupt() ...
//! let frame = nb::block!(twi.poll_read())?;
//! ```

pub mod buffer;
pub mod common;
pub mod controller;
pub mod error;
pub mod master;
pub mod signals;
#[cfg(feature = "twi_slave")]
pub mod slave;
pub mod status;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use buffer::TransferBuffer;
pub use common::{
    address_byte, BitRate, ConfigurationError, Direction, MismatchPolicy, Prescaler, Role,
    SlaveStatus, StatusCode, TransactionKind, TwiConfig, TwiConfigBuilder, TwiSpeed, FRAME_SIZE,
};
pub use controller::TwiController;
pub use error::Error;
pub use master::{MasterReceiveEvent, ReadState};
pub use signals::BusSignals;
#[cfg(feature = "twi_slave")]
pub use slave::SlaveEvent;
pub use status::StatusValidator;
pub use traits::TwiHardware;
