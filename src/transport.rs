//! Byte-level transport abstraction.
//!
//! The crate never opens or configures a device; callers supply anything that
//! can yield raw bytes and accept command bytes. Serial, TCP, and UDP
//! implementations all fit behind this trait.
use std::io;
use std::time::Duration;

/// Outcome of a single bounded read attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One or more bytes were available.
    Data(Vec<u8>),
    /// No bytes arrived within the read budget.
    Timeout,
    /// The read was aborted by an external signal.
    Interrupted,
}

pub trait Transport: Send {
    /// Read whatever bytes are available, waiting at most `timeout`.
    ///
    /// Must return promptly with [`ReadOutcome::Timeout`] rather than blocking
    /// past the budget; this is the pipeline's only suspension point.
    ///
    /// # Errors
    /// Any `std::io::Error` is a transport fault; the caller tears the
    /// connection down and retries.
    fn read(&mut self, timeout: Duration) -> io::Result<ReadOutcome>;

    /// Write `dat` in full.
    ///
    /// # Errors
    /// Any `std::io::Error` writing.
    fn write(&mut self, dat: &[u8]) -> io::Result<()>;
}
