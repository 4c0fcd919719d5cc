// Licensed under the Apache-2.0 license

//! Status validation for the master's synchronous steps.
//!
//! This is the single place where a mismatch between the expected and the
//! reported status turns into either "carry on" or "abort". The state machines
//! only ever see the `Result`.

use crate::common::Logger;
use crate::twi::common::{MismatchPolicy, StatusCode, STATUS_MASK};
use crate::twi::error::Error;

pub struct StatusValidator {
    policy: MismatchPolicy,
    mismatches: u32,
}

impl StatusValidator {
    #[must_use]
    pub const fn new(policy: MismatchPolicy) -> Self {
        Self {
            policy,
            mismatches: 0,
        }
    }

    /// Compare `actual` with `expected` and emit one diagnostic on mismatch.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProtocolMismatch` on mismatch only under
    /// `MismatchPolicy::FailFast`. Under `LogAndContinue` this never fails.
    pub fn check_status<L: Logger>(
        &mut self,
        logger: &mut L,
        actual: u8,
        expected: StatusCode,
    ) -> Result<(), Error> {
        let actual = actual & STATUS_MASK;
        if actual == expected.raw() {
            return Ok(());
        }

        self.mismatches = self.mismatches.saturating_add(1);
        logger.error_fmt(format_args!(
            "Wrong status! TWI status: 0x{:02x} Expected status: 0x{:02x}",
            actual,
            expected.raw()
        ));

        match self.policy {
            MismatchPolicy::LogAndContinue => Ok(()),
            MismatchPolicy::FailFast => Err(Error::ProtocolMismatch { expected, actual }),
        }
    }

    #[must_use]
    pub fn policy(&self) -> MismatchPolicy {
        self.policy
    }

    /// Mismatches seen since construction or the last `reset_count`.
    #[must_use]
    pub fn mismatch_count(&self) -> u32 {
        self.mismatches
    }

    pub fn reset_count(&mut self) {
        self.mismatches = 0;
    }
}
