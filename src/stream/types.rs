use std::time::Duration;

use bitflags::bitflags;

/// Parity bit discipline for a serial character frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
    Mark,
    Space,
}

/// Number of stop bits terminating a serial character frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBits {
    #[default]
    One,
    OnePointFive,
    Two,
}

impl StopBits {
    /// Whole bit periods the stop phase occupies on the wire. One and a half
    /// stop bits are rounded up so transmission-time estimates never run short.
    pub fn bit_count(self) -> u32 {
        match self {
            StopBits::One => 1,
            StopBits::OnePointFive | StopBits::Two => 2,
        }
    }
}

/// Flow control discipline for a serial line.
///
/// `Software` uses in-band flow characters, `Hardware` gates output on
/// CTS/DSR with DTR/RTS driven for handshake, and `None` leaves DTR/RTS
/// asserted without gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowControl {
    #[default]
    None,
    Hardware,
    Software,
}

/// Transfer direction selector for [`Stream::purge`](super::Stream::purge).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
    All,
}

/// Time bound applied to [`Stream::read`](super::Stream::read).
///
/// `Bounded` is a total deadline for the whole transfer, not an inter-byte
/// gap: a read either delivers the requested size within the bound or fails
/// with [`Error::Timeout`](crate::Error::Timeout) carrying the partial count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeout {
    /// Wait indefinitely for the requested size.
    #[default]
    Blocking,
    /// Return immediately with whatever is buffered.
    Immediate,
    /// Complete within the given deadline.
    Bounded(Duration),
}

impl Timeout {
    /// Maps the signed-millisecond convention used by device protocol tables:
    /// negative blocks, zero polls, positive bounds the transfer.
    pub fn from_millis(milliseconds: i32) -> Self {
        if milliseconds < 0 {
            Timeout::Blocking
        } else if milliseconds == 0 {
            Timeout::Immediate
        } else {
            Timeout::Bounded(Duration::from_millis(milliseconds as u64))
        }
    }
}

/// Line settings applied by [`Stream::configure`](super::Stream::configure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: u32,
    /// Data bits per character, valid range 5 to 8 inclusive.
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
}

impl Default for LineSettings {
    /// 9600 baud, 8N1, no flow control.
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }
}

impl LineSettings {
    /// Bit periods one transmitted byte occupies on the wire: start bit,
    /// data bits, optional parity bit and stop bits.
    pub fn frame_bits(&self) -> u32 {
        let parity_bit = if self.parity == Parity::None { 0 } else { 1 };
        1 + self.data_bits as u32 + parity_bit + self.stop_bits.bit_count()
    }
}

bitflags! {
    /// Modem control lines currently asserted by the far end. The flags are
    /// independent; any subset may be raised at once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LineState: u32 {
        const CARRIER_DETECT = 0b0001;
        const CLEAR_TO_SEND  = 0b0010;
        const DATA_SET_READY = 0b0100;
        const RING_INDICATOR = 0b1000;
    }
}
