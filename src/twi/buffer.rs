// Licensed under the Apache-2.0 license

use crate::twi::error::Error;

/// Fixed-capacity byte block with a fill/drain cursor.
///
/// The cursor never exceeds `N`. Writes past capacity are refused, never
/// wrapped.
#[derive(Clone, Debug)]
pub struct TransferBuffer<const N: usize> {
    bytes: [u8; N],
    cursor: usize,
}

impl<const N: usize> Default for TransferBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TransferBuffer<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: [0; N],
            cursor: 0,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cursor >= N
    }

    /// Start a new transfer. Contents are kept until overwritten.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Store `byte` at the cursor and advance.
    ///
    /// # Errors
    ///
    /// Returns `Error::BufferOverflow` when the buffer is already full; the
    /// byte is dropped and the contents are unchanged.
    pub fn push(&mut self, byte: u8) -> Result<(), Error> {
        let slot = self
            .bytes
            .get_mut(self.cursor)
            .ok_or(Error::BufferOverflow { capacity: N })?;
        *slot = byte;
        self.cursor += 1;
        Ok(())
    }

    /// Byte under the cursor, or `None` once the buffer is drained.
    #[must_use]
    pub fn current(&self) -> Option<u8> {
        self.bytes.get(self.cursor).copied()
    }

    /// Move the cursor one byte forward, saturating at capacity.
    pub fn advance(&mut self) {
        if self.cursor < N {
            self.cursor += 1;
        }
    }

    /// Replace the whole block and rewind.
    pub fn load(&mut self, bytes: &[u8; N]) {
        self.bytes = *bytes;
        self.cursor = 0;
    }

    /// Bytes written since the last reset.
    #[must_use]
    pub fn filled(&self) -> &[u8] {
        self.bytes.get(..self.cursor).unwrap_or(&self.bytes)
    }

    #[must_use]
    pub fn contents(&self) -> &[u8; N] {
        &self.bytes
    }
}
