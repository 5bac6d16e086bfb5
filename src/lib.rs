//! Device Transport Library
//!
//! This library provides the blocking byte-transport layer used to talk to
//! serial-connected hardware devices: a backend-agnostic stream contract,
//! a serial port backend implementing it, and port discovery.
//!
//! # Features
//! - Uniform [`Stream`] contract any transport medium can implement
//! - Serial backend with open-time settings capture and restore on close
//! - Blocking, immediate and total-deadline read timeout disciplines
//! - Software half-duplex turnaround timing derived from the line settings
//! - Break, DTR/RTS control and modem line status queries
//! - Port enumeration without opening devices
//!
//! # Examples
//!
//! ## Talking to a device
//! ```no_run
//! use devio::{LineSettings, Stream, Timeout};
//!
//! fn main() -> devio::Result<()> {
//!     let mut stream = devio::open_serial("/dev/ttyUSB0")?;
//!     stream.configure(&LineSettings {
//!         baud_rate: 115_200,
//!         ..LineSettings::default()
//!     })?;
//!     stream.set_timeout(Timeout::from_millis(3000))?;
//!
//!     stream.write(&[0x55, 0x00])?;
//!     let mut response = [0u8; 16];
//!     let received = stream.read(&mut response)?;
//!     println!("{:02x?}", &response[..received]);
//!
//!     stream.close()
//! }
//! ```
//!
//! ## Discovering ports
//! ```no_run
//! fn main() -> devio::Result<()> {
//!     devio::enumerate_serial_ports(|name| println!("{}", name))
//! }
//! ```

mod error;
mod serial;
mod stream;

pub use error::{Error, Result};
pub use serial::SerialStream;
pub use stream::{
    Direction, FlowControl, LineSettings, LineState, Parity, StopBits, Stream, Timeout,
};

/// Opens a serial port by name and returns it as a [`SerialStream`].
pub fn open_serial(name: &str) -> Result<SerialStream> {
    SerialStream::open(name)
}

/// Reports the names of all serial ports present on the system through
/// `callback`, one invocation per port.
pub fn enumerate_serial_ports<F>(callback: F) -> Result<()>
where
    F: FnMut(&str),
{
    serial::enumerate(callback)
}
