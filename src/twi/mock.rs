// Licensed under the Apache-2.0 license

//! Test doubles for the TWI engine.

use std::cell::Cell;
use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use crate::common::Logger;
use crate::twi::traits::{TwiHardware, TWEA, TWINT, TWSTA, TWSTO};

/// Bus-level meaning of a control write that started an operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusAction {
    Start,
    Stop,
    Ack,
    Nack,
}

/// Register block that completes every operation instantly.
///
/// Each control write with `TWINT` set pops the next status from `script`
/// (if any) and raises the complete flag again, except after a stop.
#[derive(Default)]
pub struct MockTwi {
    pub status: u8,
    pub control: u8,
    pub data: u8,
    pub script: VecDeque<u8>,
    pub controls: Vec<u8>,
    pub actions: Vec<BusAction>,
    pub staged: Vec<u8>,
    pub bit_rate: Option<(u8, u8)>,
    pub own_address: Option<u8>,
    pub status_reads: Cell<usize>,
}

impl MockTwi {
    pub fn new() -> Self {
        Self {
            status: 0xF8,
            ..Self::default()
        }
    }

    pub fn scripted(statuses: &[u8]) -> Self {
        let mut hw = Self::new();
        hw.script = statuses.iter().copied().collect();
        hw
    }

    /// Put the hardware in the state it is in when the interrupt fires.
    pub fn raise(&mut self, status: u8, data: u8) {
        self.status = status;
        self.data = data;
        self.control |= TWINT;
    }

    pub fn count(&self, action: BusAction) -> usize {
        self.actions.iter().filter(|a| **a == action).count()
    }
}

impl TwiHardware for MockTwi {
    fn status(&self) -> u8 {
        self.status_reads.set(self.status_reads.get() + 1);
        self.status
    }

    fn control(&self) -> u8 {
        self.control
    }

    fn write_control(&mut self, value: u8) {
        self.controls.push(value);
        if value & TWINT == 0 {
            self.control = value;
            return;
        }

        let action = if value & TWSTA != 0 {
            BusAction::Start
        } else if value & TWSTO != 0 {
            BusAction::Stop
        } else if value & TWEA != 0 {
            BusAction::Ack
        } else {
            BusAction::Nack
        };
        self.actions.push(action);

        if action == BusAction::Stop {
            self.control = value & !(TWINT | TWSTO);
            return;
        }
        if let Some(next) = self.script.pop_front() {
            self.status = next;
        }
        self.control = value | TWINT;
    }

    fn read_data(&self) -> u8 {
        self.data
    }

    fn write_data(&mut self, byte: u8) {
        self.data = byte;
        self.staged.push(byte);
    }

    fn set_bit_rate(&mut self, divisor: u8, prescaler_bits: u8) {
        self.bit_rate = Some((divisor, prescaler_bits));
    }

    fn set_own_address(&mut self, value: u8) {
        self.own_address = Some(value);
    }
}

#[derive(Default)]
pub struct RecordingLogger {
    pub errors: Vec<String>,
    pub debugs: Vec<String>,
}

impl Logger for RecordingLogger {
    fn debug(&mut self, msg: &str) {
        self.debugs.push(msg.into());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.into());
    }
}
