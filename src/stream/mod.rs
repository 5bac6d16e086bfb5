//! The backend-agnostic stream contract.
//!
//! A [`Stream`] is one open, bidirectional, blocking byte transport bound to
//! a concrete backend (a serial port here; other media implement the same
//! trait). The backend is chosen once when the handle is constructed and
//! never re-bound. Operations a backend cannot provide report
//! [`Error::Unsupported`] instead of being silently absent.

use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};

mod types;

pub use types::{Direction, FlowControl, LineSettings, LineState, Parity, StopBits, Timeout};

/// Capability set every transport backend binds to.
///
/// All operations block the calling thread until they complete or their
/// configured timeout elapses; this layer has no background tasks and no
/// cancellation beyond the timeout bound. Every method has a declining
/// default so a backend only implements what its medium supports.
pub trait Stream {
    /// Applies line settings to the transport.
    ///
    /// Fails with [`Error::InvalidArguments`] for data bits outside 5 to 8,
    /// leaving the previous settings in place. On success the backend
    /// records the baud rate and [`LineSettings::frame_bits`] for
    /// transmission-time accounting.
    fn configure(&mut self, _settings: &LineSettings) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// Selects the time-bound discipline for subsequent reads.
    fn set_timeout(&mut self, _timeout: Timeout) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// Latency hint in milliseconds. Backends without a notion of receive
    /// latency accept the value and do nothing.
    fn set_latency(&mut self, _milliseconds: u32) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// Toggles the software turnaround delay for shared half-duplex lines.
    /// When enabled, [`Stream::write`] does not return until the local
    /// transmission has physically drained from the wire.
    fn set_half_duplex(&mut self, _enabled: bool) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// Asserts or clears the break condition on the line.
    fn set_break(&mut self, _level: bool) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// Asserts or clears the data-terminal-ready line.
    fn set_dtr(&mut self, _level: bool) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// Asserts or clears the request-to-send line.
    fn set_rts(&mut self, _level: bool) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// Reports which modem control lines are currently asserted.
    fn get_lines(&mut self) -> Result<LineState> {
        Err(Error::Unsupported)
    }

    /// Number of bytes buffered and readable without blocking.
    fn get_available(&mut self) -> Result<usize> {
        Err(Error::Unsupported)
    }

    /// Reads up to `data.len()` bytes under the active timeout discipline.
    ///
    /// Returns the full count on success. When fewer bytes arrive before
    /// the bound elapses the read fails with [`Error::Timeout`] whose
    /// `actual` field holds the partial count already placed in `data`. An
    /// immediate-mode read with nothing buffered returns `Ok(0)`.
    fn read(&mut self, _data: &mut [u8]) -> Result<usize> {
        Err(Error::Unsupported)
    }

    /// Writes `data` to the transport, blocking until it is handed to the
    /// OS in full. Under half-duplex the call also enforces the turnaround
    /// delay before returning.
    fn write(&mut self, _data: &[u8]) -> Result<usize> {
        Err(Error::Unsupported)
    }

    /// Blocks until all OS-buffered output has been transmitted.
    fn flush(&mut self) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// Discards buffered data and aborts in-flight transfers on the given
    /// direction(s).
    fn purge(&mut self, _direction: Direction) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// Suspends the calling thread. Also used internally by backends that
    /// enforce half-duplex turnaround timing.
    fn sleep(&mut self, duration: Duration) -> Result<()> {
        thread::sleep(duration);
        Ok(())
    }

    /// Releases the session. Backends owning an OS resource restore any
    /// state captured at open and then release the resource, always
    /// attempting both steps.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
