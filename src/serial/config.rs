//! Translation between the portable line-settings vocabulary and the
//! native serial interface, plus wire-timing arithmetic.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::stream::{Direction, FlowControl, Parity, StopBits};

pub(crate) fn data_bits(bits: u8) -> Result<serialport::DataBits> {
    match bits {
        5 => Ok(serialport::DataBits::Five),
        6 => Ok(serialport::DataBits::Six),
        7 => Ok(serialport::DataBits::Seven),
        8 => Ok(serialport::DataBits::Eight),
        _ => Err(Error::InvalidArguments),
    }
}

/// Mark and space parity cannot be expressed through the native interface
/// and are declined as a capability gap rather than an argument error.
pub(crate) fn parity(parity: Parity) -> Result<serialport::Parity> {
    match parity {
        Parity::None => Ok(serialport::Parity::None),
        Parity::Even => Ok(serialport::Parity::Even),
        Parity::Odd => Ok(serialport::Parity::Odd),
        Parity::Mark | Parity::Space => Err(Error::Unsupported),
    }
}

pub(crate) fn stop_bits(stop_bits: StopBits) -> Result<serialport::StopBits> {
    match stop_bits {
        StopBits::One => Ok(serialport::StopBits::One),
        StopBits::Two => Ok(serialport::StopBits::Two),
        StopBits::OnePointFive => Err(Error::Unsupported),
    }
}

pub(crate) fn flow_control(flow_control: FlowControl) -> serialport::FlowControl {
    match flow_control {
        FlowControl::None => serialport::FlowControl::None,
        FlowControl::Hardware => serialport::FlowControl::Hardware,
        FlowControl::Software => serialport::FlowControl::Software,
    }
}

pub(crate) fn clear_buffer(direction: Direction) -> serialport::ClearBuffer {
    match direction {
        Direction::Input => serialport::ClearBuffer::Input,
        Direction::Output => serialport::ClearBuffer::Output,
        Direction::All => serialport::ClearBuffer::All,
    }
}

/// Theoretical time `count` bytes of `frame_bits` bits each occupy on the
/// wire at `baud_rate`, rounded to the nearest microsecond. A port that has
/// never been configured reports zero rather than dividing by zero.
pub(crate) fn transfer_duration(frame_bits: u32, count: usize, baud_rate: u32) -> Duration {
    if baud_rate == 0 {
        return Duration::ZERO;
    }
    let bits = frame_bits as u64 * count as u64;
    let micros = (bits * 1_000_000 + baud_rate as u64 / 2) / baud_rate as u64;
    Duration::from_micros(micros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0)]
    #[test_case(4)]
    #[test_case(9)]
    #[test_case(255)]
    fn out_of_range_data_bits_are_rejected(bits: u8) {
        assert!(matches!(data_bits(bits), Err(Error::InvalidArguments)));
    }

    #[test_case(5, serialport::DataBits::Five)]
    #[test_case(6, serialport::DataBits::Six)]
    #[test_case(7, serialport::DataBits::Seven)]
    #[test_case(8, serialport::DataBits::Eight)]
    fn in_range_data_bits_map_through(bits: u8, expected: serialport::DataBits) {
        assert_eq!(data_bits(bits).unwrap(), expected);
    }

    #[test]
    fn inexpressible_settings_are_capability_gaps() {
        assert!(matches!(parity(Parity::Mark), Err(Error::Unsupported)));
        assert!(matches!(parity(Parity::Space), Err(Error::Unsupported)));
        assert!(matches!(
            stop_bits(StopBits::OnePointFive),
            Err(Error::Unsupported)
        ));
    }

    #[test]
    fn transfer_duration_matches_wire_math() {
        // 48 bytes of 10 bits each at 9600 baud spend 50 ms on the wire.
        assert_eq!(transfer_duration(10, 48, 9600), Duration::from_millis(50));
        // One 10-bit byte at 300 baud, truncated to whole microseconds.
        assert_eq!(transfer_duration(10, 1, 300), Duration::from_micros(33_333));
        // Unconfigured port: no delay instead of a division by zero.
        assert_eq!(transfer_duration(0, 16, 0), Duration::ZERO);
        assert_eq!(transfer_duration(10, 0, 9600), Duration::ZERO);
    }
}
