// Licensed under the Apache-2.0 license

//! Diagnostic logging shared by the bus drivers.
//!
//! Diagnostics are plain text lines meant for a human watching a serial
//! console. Nothing parses them.

use core::fmt::Write as _;
use heapless::String;

/// Longest diagnostic line that can be formatted without truncation.
pub const LOG_LINE_CAPACITY: usize = 96;

/// Sink for diagnostic messages.
pub trait Logger {
    fn debug(&mut self, msg: &str);
    fn error(&mut self, msg: &str);

    /// Format a message into a fixed-size line and emit it as an error.
    ///
    /// Output longer than [`LOG_LINE_CAPACITY`] is cut at the last
    /// character that fits.
    fn error_fmt(&mut self, args: core::fmt::Arguments<'_>) {
        let mut line = LineBuffer(String::new());
        let _ = line.write_fmt(args);
        self.error(&line.0);
    }
}

/// Fixed-size line that keeps the leading part of an oversized fragment.
struct LineBuffer(String<LOG_LINE_CAPACITY>);

impl core::fmt::Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                return Err(core::fmt::Error);
            }
        }
        Ok(())
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&mut self, _msg: &str) {}
    fn error(&mut self, _msg: &str) {}
}

/// Writes diagnostics to a byte transport such as a UART transmitter.
///
/// Each message is emitted as its own line. Transport errors are dropped:
/// a broken diagnostic channel must never stall the bus state machines.
pub struct UartLogger<W: embedded_io::Write> {
    writer: W,
}

impl<W: embedded_io::Write> UartLogger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn line(&mut self, prefix: &str, msg: &str) {
        let _ = self.writer.write_all(b"\r\n");
        let _ = self.writer.write_all(prefix.as_bytes());
        let _ = self.writer.write_all(msg.as_bytes());
        let _ = self.writer.write_all(b"\r\n");
    }
}

impl<W: embedded_io::Write> Logger for UartLogger<W> {
    fn debug(&mut self, msg: &str) {
        self.line("", msg);
    }

    fn error(&mut self, msg: &str) {
        self.line("ERROR: ", msg);
    }
}

/// Routes diagnostics through `defmt`.
#[cfg(feature = "defmt")]
#[derive(Clone, Copy, Debug, Default)]
pub struct DefmtLogger;

#[cfg(feature = "defmt")]
impl Logger for DefmtLogger {
    fn debug(&mut self, msg: &str) {
        defmt::debug!("{=str}", msg);
    }

    fn error(&mut self, msg: &str) {
        defmt::error!("{=str}", msg);
    }
}
