// Licensed under the Apache-2.0 license

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

use crate::twi::common::StatusCode;

/// Errors surfaced by the TWI engine.
///
/// Errors raised inside interrupt context are never returned; they are
/// logged and recorded in controller state instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The status register did not hold the code expected for the current step
    ProtocolMismatch { expected: StatusCode, actual: u8 },
    /// A byte arrived after the buffer was full
    BufferOverflow { capacity: usize },
    /// Peer address wider than seven bits
    InvalidAddress(u8),
    /// The addressed peer did not acknowledge a read request
    AddressNack,
    /// A master read is still outstanding
    Busy,
    /// `poll_read` called without a preceding `request_read`
    NoReadPending,
    /// Operation not available in the configured role
    WrongRole,
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::ProtocolMismatch { actual, .. } => match StatusCode::from_raw(*actual) {
                Some(StatusCode::SlaWriteNack | StatusCode::SlaReadNack) => {
                    ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
                }
                Some(StatusCode::DataSentNack) => {
                    ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
                }
                Some(StatusCode::ArbitrationLost) => ErrorKind::ArbitrationLoss,
                Some(StatusCode::BusError) => ErrorKind::Bus,
                _ => ErrorKind::Other,
            },
            Self::AddressNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Self::BufferOverflow { .. } => ErrorKind::Overrun,
            Self::InvalidAddress(_) | Self::Busy | Self::NoReadPending | Self::WrongRole => {
                ErrorKind::Other
            }
        }
    }
}
