//! Serial port backend for the [`Stream`] contract.
//!
//! Wraps a native serial port handle and realizes the full contract:
//! configuration mapping, total-deadline read timeouts, software half-duplex
//! turnaround timing, modem line control and buffer purging. The line
//! settings found at open time are captured once and restored when the
//! session closes.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use serialport::SerialPort;

use crate::error::{Error, Result};
use crate::stream::{Direction, LineSettings, LineState, Stream, Timeout};

mod config;
mod enumerate;

pub use enumerate::enumerate;

/// Port timeout armed while a blocking transfer waits for more data; the
/// transfer loop re-arms and retries until the requested size is reached.
const BLOCKING_QUANTUM: Duration = Duration::from_millis(500);

/// Shortest timeout the native interface reliably distinguishes from zero.
const MINIMAL_TIMEOUT: Duration = Duration::from_millis(1);

/// Extra wait added to the computed half-duplex transmission time. Tuned
/// against devices that drop bytes when addressed too soon after a reply.
const DEFAULT_TURNAROUND_MARGIN: Duration = Duration::from_millis(2);

/// Line settings and timeout captured when the port is opened; restored
/// when the session closes.
struct PortSnapshot {
    baud_rate: u32,
    data_bits: serialport::DataBits,
    parity: serialport::Parity,
    stop_bits: serialport::StopBits,
    flow_control: serialport::FlowControl,
    timeout: Duration,
}

/// One open serial session implementing [`Stream`].
///
/// The session exclusively owns its OS handle. Dropping the stream performs
/// the same restore-then-release teardown as [`Stream::close`]; after an
/// explicit close every other operation fails with
/// [`Error::InvalidArguments`].
pub struct SerialStream {
    port: Option<Box<dyn SerialPort>>,
    snapshot: PortSnapshot,
    timeout: Timeout,
    half_duplex: bool,
    turnaround_margin: Duration,
    baud_rate: u32,
    frame_bits: u32,
}

impl SerialStream {
    /// Opens the named serial port for reading and writing.
    ///
    /// The platform device-path prefix is applied automatically for bare
    /// names. The port's line settings are snapshotted immediately, before
    /// any modification; failure to query them means the opened resource is
    /// not actually a serial port and surfaces as [`Error::NoDevice`].
    pub fn open(name: &str) -> Result<Self> {
        info!("Opening serial port {}", name);

        let port = serialport::new(name, 9600)
            .timeout(BLOCKING_QUANTUM)
            .open()
            .map_err(|err| {
                error!("Failed to open {}: {}", name, err);
                Error::from(err)
            })?;

        let snapshot = match capture(port.as_ref()) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!("{} is not a serial port: {}", name, err);
                return Err(Error::NoDevice);
            }
        };

        Ok(Self {
            port: Some(port),
            snapshot,
            timeout: Timeout::Blocking,
            half_duplex: false,
            turnaround_margin: DEFAULT_TURNAROUND_MARGIN,
            baud_rate: 0,
            frame_bits: 0,
        })
    }

    /// Bit periods one transmitted byte occupies on the wire, as recorded
    /// by the last successful [`Stream::configure`]. Zero before the first
    /// configuration.
    pub fn frame_bits(&self) -> u32 {
        self.frame_bits
    }

    /// Whether the session still owns its OS handle.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Overrides the settling margin added to the computed half-duplex
    /// transmission time.
    pub fn set_turnaround_margin(&mut self, margin: Duration) {
        self.turnaround_margin = margin;
    }

    fn port(&mut self) -> Result<&mut dyn SerialPort> {
        match self.port.as_deref_mut() {
            Some(port) => Ok(port),
            None => Err(Error::InvalidArguments),
        }
    }
}

impl Stream for SerialStream {
    fn configure(&mut self, settings: &LineSettings) -> Result<()> {
        debug!(
            "Configuring: baudrate={}, databits={}, parity={:?}, stopbits={:?}, flowcontrol={:?}",
            settings.baud_rate,
            settings.data_bits,
            settings.parity,
            settings.stop_bits,
            settings.flow_control
        );

        // Translate everything up front so a rejected configuration leaves
        // the active settings untouched.
        let data_bits = config::data_bits(settings.data_bits)?;
        let parity = config::parity(settings.parity)?;
        let stop_bits = config::stop_bits(settings.stop_bits)?;
        let flow_control = config::flow_control(settings.flow_control);

        let port = self.port()?;
        port.set_baud_rate(settings.baud_rate)
            .map_err(|err| syserror("set baud rate", err))?;
        port.set_data_bits(data_bits)
            .map_err(|err| syserror("set data bits", err))?;
        port.set_parity(parity)
            .map_err(|err| syserror("set parity", err))?;
        port.set_stop_bits(stop_bits)
            .map_err(|err| syserror("set stop bits", err))?;
        port.set_flow_control(flow_control)
            .map_err(|err| syserror("set flow control", err))?;

        self.baud_rate = settings.baud_rate;
        self.frame_bits = settings.frame_bits();

        Ok(())
    }

    fn set_timeout(&mut self, timeout: Timeout) -> Result<()> {
        debug!("Timeout: {:?}", timeout);
        self.port()?;
        self.timeout = timeout;
        Ok(())
    }

    // Receive latency is not tunable on this backend; the value is accepted
    // for interface uniformity.
    fn set_latency(&mut self, _milliseconds: u32) -> Result<()> {
        self.port()?;
        Ok(())
    }

    fn set_half_duplex(&mut self, enabled: bool) -> Result<()> {
        self.port()?;
        self.half_duplex = enabled;
        Ok(())
    }

    fn set_break(&mut self, level: bool) -> Result<()> {
        debug!("Break: {}", level);
        let port = self.port()?;
        let result = if level {
            port.set_break()
        } else {
            port.clear_break()
        };
        result.map_err(|err| syserror("set break", err))
    }

    fn set_dtr(&mut self, level: bool) -> Result<()> {
        debug!("DTR: {}", level);
        self.port()?
            .write_data_terminal_ready(level)
            .map_err(|err| syserror("set DTR", err))
    }

    fn set_rts(&mut self, level: bool) -> Result<()> {
        debug!("RTS: {}", level);
        self.port()?
            .write_request_to_send(level)
            .map_err(|err| syserror("set RTS", err))
    }

    fn get_lines(&mut self) -> Result<LineState> {
        let port = self.port()?;
        let mut lines = LineState::empty();
        if port
            .read_carrier_detect()
            .map_err(|err| syserror("read carrier detect", err))?
        {
            lines |= LineState::CARRIER_DETECT;
        }
        if port
            .read_clear_to_send()
            .map_err(|err| syserror("read clear to send", err))?
        {
            lines |= LineState::CLEAR_TO_SEND;
        }
        if port
            .read_data_set_ready()
            .map_err(|err| syserror("read data set ready", err))?
        {
            lines |= LineState::DATA_SET_READY;
        }
        if port
            .read_ring_indicator()
            .map_err(|err| syserror("read ring indicator", err))?
        {
            lines |= LineState::RING_INDICATOR;
        }
        Ok(lines)
    }

    fn get_available(&mut self) -> Result<usize> {
        let count = self
            .port()?
            .bytes_to_read()
            .map_err(|err| syserror("query received bytes", err))?;
        Ok(count as usize)
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize> {
        let timeout = self.timeout;
        let port = self.port()?;
        match timeout {
            Timeout::Immediate => read_immediate(port, data),
            Timeout::Blocking => read_blocking(port, data),
            Timeout::Bounded(limit) => read_bounded(port, data, limit),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let half_duplex = self.half_duplex;
        let frame_bits = self.frame_bits;
        let baud_rate = self.baud_rate;
        let margin = self.turnaround_margin;

        let port = self.port()?;
        let started = Instant::now();
        let mut total = 0;
        while total < data.len() {
            match port.write(&data[total..]) {
                Ok(0) => {
                    error!("Serial port rejected write");
                    return Err(Error::NoDevice);
                }
                Ok(n) => total += n,
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
                    ) =>
                {
                    continue
                }
                Err(err) => {
                    error!("Write failed: {}", err);
                    return Err(err.into());
                }
            }
        }

        if half_duplex && baud_rate != 0 {
            // The far end cannot be read from until our transmission has
            // physically drained; hold the caller for the remainder of the
            // theoretical wire time.
            let elapsed = started.elapsed();
            let expected =
                config::transfer_duration(frame_bits, total, baud_rate) + margin;
            if let Some(remaining) = expected.checked_sub(elapsed) {
                self.sleep(remaining)?;
            }
        }

        Ok(total)
    }

    fn flush(&mut self) -> Result<()> {
        self.port()?.flush().map_err(|err| {
            error!("Flush failed: {}", err);
            Error::from(err)
        })
    }

    fn purge(&mut self, direction: Direction) -> Result<()> {
        debug!("Purge: {:?}", direction);
        let buffer = config::clear_buffer(direction);
        self.port()?
            .clear(buffer)
            .map_err(|err| syserror("purge buffers", err))
    }

    fn close(&mut self) -> Result<()> {
        let Some(mut port) = self.port.take() else {
            return Ok(());
        };
        info!("Closing serial port");

        // Restore the settings captured at open. A failed restore is
        // reported, but must never prevent the handle from being released.
        let mut result = Ok(());
        if let Err(err) = restore(port.as_mut(), &self.snapshot) {
            error!("Failed to restore port settings: {}", err);
            result = Err(err.into());
        }
        drop(port);

        result
    }
}

impl Drop for SerialStream {
    fn drop(&mut self) {
        if self.port.is_some() {
            if let Err(err) = self.close() {
                warn!("Serial close during drop failed: {}", err);
            }
        }
    }
}

fn capture(port: &dyn SerialPort) -> serialport::Result<PortSnapshot> {
    Ok(PortSnapshot {
        baud_rate: port.baud_rate()?,
        data_bits: port.data_bits()?,
        parity: port.parity()?,
        stop_bits: port.stop_bits()?,
        flow_control: port.flow_control()?,
        timeout: port.timeout(),
    })
}

fn restore(port: &mut dyn SerialPort, snapshot: &PortSnapshot) -> serialport::Result<()> {
    port.set_baud_rate(snapshot.baud_rate)?;
    port.set_data_bits(snapshot.data_bits)?;
    port.set_parity(snapshot.parity)?;
    port.set_stop_bits(snapshot.stop_bits)?;
    port.set_flow_control(snapshot.flow_control)?;
    port.set_timeout(snapshot.timeout)?;
    Ok(())
}

/// Reads whatever is already buffered, never waiting for more.
fn read_immediate(port: &mut dyn SerialPort, data: &mut [u8]) -> Result<usize> {
    let available = port
        .bytes_to_read()
        .map_err(|err| syserror("query received bytes", err))? as usize;
    let wanted = available.min(data.len());

    let mut total = 0;
    while total < wanted {
        match port.read(&mut data[total..wanted]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == io::ErrorKind::TimedOut => break,
            Err(err) => {
                error!("Read failed: {}", err);
                return Err(err.into());
            }
        }
    }
    Ok(total)
}

/// Waits indefinitely until the requested size has arrived.
fn read_blocking(port: &mut dyn SerialPort, data: &mut [u8]) -> Result<usize> {
    port.set_timeout(BLOCKING_QUANTUM)
        .map_err(|err| syserror("arm timeout", err))?;

    let mut total = 0;
    while total < data.len() {
        match port.read(&mut data[total..]) {
            Ok(0) => {
                error!("Serial port hung up");
                return Err(Error::NoDevice);
            }
            Ok(n) => total += n,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
                ) =>
            {
                continue
            }
            Err(err) => {
                error!("Read failed: {}", err);
                return Err(err.into());
            }
        }
    }
    Ok(total)
}

/// Completes the requested size within `limit`, or fails with the partial
/// count. The deadline covers the whole transfer, not the gap between bytes.
fn read_bounded(port: &mut dyn SerialPort, data: &mut [u8], limit: Duration) -> Result<usize> {
    let deadline = Instant::now() + limit;

    let mut total = 0;
    while total < data.len() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining < MINIMAL_TIMEOUT {
            return Err(Error::Timeout { actual: total });
        }
        port.set_timeout(remaining)
            .map_err(|err| syserror("arm timeout", err))?;

        match port.read(&mut data[total..]) {
            Ok(0) => {
                error!("Serial port hung up");
                return Err(Error::NoDevice);
            }
            Ok(n) => total += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == io::ErrorKind::TimedOut => {
                return Err(Error::Timeout { actual: total })
            }
            Err(err) => {
                error!("Read failed: {}", err);
                return Err(err.into());
            }
        }
    }
    Ok(total)
}

/// Reports a native failure to the diagnostic log and maps it into the
/// portable taxonomy.
fn syserror(operation: &str, err: serialport::Error) -> Error {
    error!("Failed to {}: {}", operation, err);
    err.into()
}
