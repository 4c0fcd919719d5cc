// Licensed under the Apache-2.0 license

//! Common types and constants for the TWI engine.
//!
//! This module provides the status-code table, addressing helpers, bit-rate
//! derivation and the controller configuration.

use embedded_hal::i2c::SevenBitAddress;
use fugit::HertzU32;

/// Payload size shared by both roles. Peers agree on it out of band.
pub const FRAME_SIZE: usize = 5;

/// Mask selecting the status bits of the status register.
pub const STATUS_MASK: u8 = 0xF8;

/// Highest valid 7-bit peer address.
pub const MAX_ADDRESS: SevenBitAddress = 0x7F;

/// Hardware status codes reported by the bus controller.
///
/// Codes are role-specific: the master state machines only react to the
/// master codes and the slave state machine only to the slave codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StatusCode {
    BusError = 0x00,
    // Master
    Start = 0x08,
    RepeatedStart = 0x10,
    SlaWriteAck = 0x18,
    SlaWriteNack = 0x20,
    DataSentAck = 0x28,
    DataSentNack = 0x30,
    ArbitrationLost = 0x38,
    SlaReadAck = 0x40,
    SlaReadNack = 0x48,
    DataReceivedAck = 0x50,
    DataReceivedNack = 0x58,
    // Slave receiver
    OwnSlaWriteAck = 0x60,
    GeneralCallAck = 0x70,
    SlaveDataReceivedAck = 0x80,
    SlaveDataReceivedNack = 0x88,
    GeneralCallDataAck = 0x90,
    StopOrRepeatedStart = 0xA0,
    // Slave transmitter
    OwnSlaReadAck = 0xA8,
    SlaveDataSentAck = 0xB8,
    SlaveDataSentNack = 0xC0,
    SlaveLastDataSentAck = 0xC8,
    NoInfo = 0xF8,
}

impl StatusCode {
    /// Decode a raw status register value. Prescaler bits are ignored.
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        let code = match raw & STATUS_MASK {
            0x00 => Self::BusError,
            0x08 => Self::Start,
            0x10 => Self::RepeatedStart,
            0x18 => Self::SlaWriteAck,
            0x20 => Self::SlaWriteNack,
            0x28 => Self::DataSentAck,
            0x30 => Self::DataSentNack,
            0x38 => Self::ArbitrationLost,
            0x40 => Self::SlaReadAck,
            0x48 => Self::SlaReadNack,
            0x50 => Self::DataReceivedAck,
            0x58 => Self::DataReceivedNack,
            0x60 => Self::OwnSlaWriteAck,
            0x70 => Self::GeneralCallAck,
            0x80 => Self::SlaveDataReceivedAck,
            0x88 => Self::SlaveDataReceivedNack,
            0x90 => Self::GeneralCallDataAck,
            0xA0 => Self::StopOrRepeatedStart,
            0xA8 => Self::OwnSlaReadAck,
            0xB8 => Self::SlaveDataSentAck,
            0xC0 => Self::SlaveDataSentNack,
            0xC8 => Self::SlaveLastDataSentAck,
            0xF8 => Self::NoInfo,
            _ => return None,
        };
        Some(code)
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// Read/write bit appended to the peer address.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

/// Form the address byte placed on the bus, or `None` for an address wider
/// than seven bits.
#[must_use]
pub fn address_byte(address: SevenBitAddress, direction: Direction) -> Option<u8> {
    if address > MAX_ADDRESS {
        return None;
    }
    Some((address << 1) | direction as u8)
}

/// Which side of the bus a controller plays.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    Master,
    Slave,
}

/// Transaction currently owning the interrupt events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransactionKind {
    MasterWrite,
    MasterRead,
    SlaveServe,
}

/// What the master does after a status check fails.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MismatchPolicy {
    /// Log the mismatch and keep issuing the remaining steps.
    #[default]
    LogAndContinue,
    /// Log the mismatch, stop the bus and return the error.
    FailFast,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum TwiSpeed {
    Standard = 100_000,
    Fast = 400_000,
}

impl TwiSpeed {
    #[must_use]
    pub const fn rate(self) -> HertzU32 {
        HertzU32::from_raw(self as u32)
    }
}

/// Bit-rate prescaler selected by the two low bits of the status register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Prescaler {
    Div1 = 0,
    Div4 = 1,
    Div16 = 2,
    Div64 = 3,
}

impl Prescaler {
    const ALL: [Prescaler; 4] = [Self::Div1, Self::Div4, Self::Div16, Self::Div64];

    #[must_use]
    pub const fn factor(self) -> u32 {
        match self {
            Self::Div1 => 1,
            Self::Div4 => 4,
            Self::Div16 => 16,
            Self::Div64 => 64,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Bit-rate register value and prescaler producing a bus clock.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitRate {
    pub divisor: u8,
    pub prescaler: Prescaler,
}

impl BitRate {
    /// Derive the divisor for `scl` from the CPU clock:
    /// `SCL = F_CPU / (16 + 2 * divisor * prescaler)`.
    ///
    /// The smallest prescaler whose divisor fits the register is chosen.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::BitRateOutOfRange` when the requested rate
    /// is faster than `F_CPU / 16` or too slow for the largest prescaler.
    pub fn compute(cpu_clock: HertzU32, scl: HertzU32) -> Result<Self, ConfigurationError> {
        let cpu = cpu_clock.raw();
        let scl = scl.raw();
        if scl == 0 || cpu / scl < 16 {
            return Err(ConfigurationError::BitRateOutOfRange);
        }
        let cycles = cpu / scl - 16;
        for prescaler in Prescaler::ALL {
            let divisor = cycles / (2 * prescaler.factor());
            if let Ok(divisor) = u8::try_from(divisor) {
                return Ok(Self { divisor, prescaler });
            }
        }
        Err(ConfigurationError::BitRateOutOfRange)
    }

    /// Bus clock actually produced by this setting.
    #[must_use]
    pub fn scl_frequency(&self, cpu_clock: HertzU32) -> HertzU32 {
        let period = 16 + 2 * u32::from(self.divisor) * self.prescaler.factor();
        HertzU32::from_raw(cpu_clock.raw() / period)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigurationError {
    BitRateOutOfRange,
    InvalidAddress(u8),
}

/// Snapshot of the slave side, for foreground inspection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlaveStatus {
    /// Own address the controller answers to
    pub address: Option<SevenBitAddress>,
    /// Bytes stored in the inbound buffer by the current or last write
    pub rx_count: usize,
    /// Outbound cursor of the current or last read
    pub tx_cursor: usize,
    /// Bytes dropped because the inbound buffer was full
    pub overflow_count: u32,
    /// Whether a complete frame is waiting in `take_received`
    pub frame_ready: bool,
}

pub struct TwiConfig {
    pub cpu_clock: HertzU32,
    pub speed: TwiSpeed,
    pub role: Role,
    pub own_address: Option<SevenBitAddress>,
    pub general_call: bool,
    pub mismatch_policy: MismatchPolicy,
    pub bit_rate: BitRate,
}

impl TwiConfig {
    /// Value for the own-address register: address in the upper seven bits,
    /// general-call recognition in bit 0.
    #[must_use]
    pub fn own_address_register(&self) -> Option<u8> {
        self.own_address
            .map(|addr| (addr << 1) | u8::from(self.general_call))
    }
}

pub struct TwiConfigBuilder {
    cpu_clock: HertzU32,
    speed: TwiSpeed,
    role: Role,
    own_address: Option<SevenBitAddress>,
    general_call: bool,
    mismatch_policy: MismatchPolicy,
}

impl Default for TwiConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TwiConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cpu_clock: HertzU32::MHz(16),
            speed: TwiSpeed::Standard,
            role: Role::Master,
            own_address: None,
            general_call: false,
            mismatch_policy: MismatchPolicy::LogAndContinue,
        }
    }
    #[must_use]
    pub fn cpu_clock(mut self, clock: HertzU32) -> Self {
        self.cpu_clock = clock;
        self
    }
    #[must_use]
    pub fn speed(mut self, speed: TwiSpeed) -> Self {
        self.speed = speed;
        self
    }
    #[must_use]
    pub fn master(mut self) -> Self {
        self.role = Role::Master;
        self.own_address = None;
        self
    }
    /// Serve as a slave answering to `address`.
    #[must_use]
    pub fn slave(mut self, address: SevenBitAddress) -> Self {
        self.role = Role::Slave;
        self.own_address = Some(address);
        self
    }
    #[must_use]
    pub fn general_call(mut self, enabled: bool) -> Self {
        self.general_call = enabled;
        self
    }
    #[must_use]
    pub fn mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }

    /// Validate the settings and derive the bit rate.
    ///
    /// # Errors
    ///
    /// Fails when the bus rate cannot be produced from the CPU clock, or when
    /// the slave address is wider than seven bits.
    pub fn build(self) -> Result<TwiConfig, ConfigurationError> {
        if self.role == Role::Slave {
            if let Some(addr) = self.own_address.filter(|addr| *addr > MAX_ADDRESS) {
                return Err(ConfigurationError::InvalidAddress(addr));
            }
        }
        let bit_rate = BitRate::compute(self.cpu_clock, self.speed.rate())?;
        Ok(TwiConfig {
            cpu_clock: self.cpu_clock,
            speed: self.speed,
            role: self.role,
            own_address: self.own_address,
            general_call: self.general_call,
            mismatch_policy: self.mismatch_policy,
            bit_rate,
        })
    }
}
