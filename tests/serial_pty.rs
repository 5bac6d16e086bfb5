//! Loopback tests for the serial backend against a pseudoterminal pair.
//!
//! The slave side of the pair is opened through the public API by name,
//! exactly like a physical port; the master side plays the device. Modem
//! control lines are not exercised here because pseudoterminals have none.

#![cfg(all(unix, not(feature = "skip-pty-tests")))]

use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use devio::{Direction, Error, LineSettings, Parity, SerialStream, StopBits, Stream, Timeout};
use serialport::{SerialPort, TTYPort};

fn open_pair() -> (TTYPort, SerialStream) {
    let (master, slave) = TTYPort::pair().expect("failed to allocate a pty pair");
    let name = slave.name().expect("pty slave has no name");
    drop(slave);
    let stream = devio::open_serial(&name).expect("failed to open the pty slave");
    (master, stream)
}

#[test]
fn immediate_read_returns_at_once_when_idle() {
    let (_master, mut stream) = open_pair();
    stream.set_timeout(Timeout::from_millis(0)).unwrap();

    let started = Instant::now();
    let mut buffer = [0u8; 16];
    assert_eq!(stream.read(&mut buffer).unwrap(), 0);
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[test]
fn bounded_read_reports_the_partial_transfer() {
    let (mut master, mut stream) = open_pair();
    master.write_all(&[0x10, 0x20, 0x30]).unwrap();
    stream.set_timeout(Timeout::from_millis(200)).unwrap();

    let started = Instant::now();
    let mut buffer = [0u8; 8];
    match stream.read(&mut buffer) {
        Err(Error::Timeout { actual }) => {
            assert_eq!(actual, 3);
            assert_eq!(&buffer[..3], &[0x10, 0x20, 0x30]);
        }
        other => panic!("expected a partial-read timeout, got {:?}", other),
    }
    // The deadline bounds the whole transfer, not the first byte.
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[test]
fn bounded_read_succeeds_when_the_request_arrives_in_time() {
    let (mut master, mut stream) = open_pair();
    stream.set_timeout(Timeout::from_millis(2000)).unwrap();

    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        master.write_all(b"hello").unwrap();
        master
    });

    let mut buffer = [0u8; 5];
    assert_eq!(stream.read(&mut buffer).unwrap(), 5);
    assert_eq!(&buffer, b"hello");
    writer.join().unwrap();
}

#[test]
fn blocking_read_waits_for_the_full_request() {
    let (mut master, mut stream) = open_pair();
    stream.set_timeout(Timeout::from_millis(-1)).unwrap();

    let writer = thread::spawn(move || {
        for chunk in [&b"ab"[..], &b"cd"[..], &b"ef"[..]] {
            thread::sleep(Duration::from_millis(20));
            master.write_all(chunk).unwrap();
        }
        master
    });

    let mut buffer = [0u8; 6];
    assert_eq!(stream.read(&mut buffer).unwrap(), 6);
    assert_eq!(&buffer, b"abcdef");
    writer.join().unwrap();
}

#[test]
fn available_and_purge_track_the_input_queue() {
    let (mut master, mut stream) = open_pair();
    master.write_all(&[1, 2, 3, 4]).unwrap();

    // Delivery through the pty is asynchronous; wait for the bytes to land.
    let deadline = Instant::now() + Duration::from_secs(1);
    while stream.get_available().unwrap() < 4 {
        assert!(
            Instant::now() < deadline,
            "bytes never reached the slave side"
        );
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(stream.get_available().unwrap(), 4);

    stream.purge(Direction::Input).unwrap();
    assert_eq!(stream.get_available().unwrap(), 0);
}

#[test]
fn writes_reach_the_far_end_after_flush() {
    let (mut master, mut stream) = open_pair();
    assert_eq!(stream.write(b"ping").unwrap(), 4);
    stream.flush().unwrap();

    master.set_timeout(Duration::from_millis(500)).unwrap();
    let mut buffer = [0u8; 4];
    master.read_exact(&mut buffer).unwrap();
    assert_eq!(&buffer, b"ping");
}

#[test]
fn configure_applies_and_tracks_frame_bits() {
    let (_master, mut stream) = open_pair();
    assert_eq!(stream.frame_bits(), 0);

    let settings = LineSettings {
        baud_rate: 19_200,
        data_bits: 7,
        parity: Parity::Even,
        stop_bits: StopBits::Two,
        ..LineSettings::default()
    };
    stream.configure(&settings).unwrap();
    assert_eq!(stream.frame_bits(), 11);

    // Rejected settings leave the previous configuration in place.
    let invalid = LineSettings {
        data_bits: 9,
        ..settings
    };
    assert!(matches!(
        stream.configure(&invalid),
        Err(Error::InvalidArguments)
    ));
    assert_eq!(stream.frame_bits(), 11);

    // Settings the native interface cannot express are a capability gap.
    let mark = LineSettings {
        parity: Parity::Mark,
        ..LineSettings::default()
    };
    assert!(matches!(stream.configure(&mark), Err(Error::Unsupported)));
    assert_eq!(stream.frame_bits(), 11);
}

#[test]
fn half_duplex_write_enforces_the_turnaround_time() {
    let (_master, mut stream) = open_pair();
    stream.configure(&LineSettings::default()).unwrap();

    // 48 bytes of 10 bits each at 9600 baud occupy 50 ms on the wire. The
    // pty swallows them instantly, so any delay comes from the turnaround.
    let payload = [0x55u8; 48];

    let started = Instant::now();
    assert_eq!(stream.write(&payload).unwrap(), payload.len());
    let full_duplex = started.elapsed();

    stream.set_half_duplex(true).unwrap();
    let started = Instant::now();
    assert_eq!(stream.write(&payload).unwrap(), payload.len());
    let half_duplex = started.elapsed();

    assert!(
        half_duplex >= Duration::from_millis(50),
        "turnaround not enforced: {:?}",
        half_duplex
    );
    assert!(full_duplex < half_duplex);
}

#[test]
fn latency_hint_is_accepted_for_uniformity() {
    let (_master, mut stream) = open_pair();
    stream.set_latency(32).unwrap();
}

#[test]
fn close_is_idempotent_and_fences_later_operations() {
    let (_master, mut stream) = open_pair();
    assert!(stream.is_open());

    stream.close().unwrap();
    assert!(!stream.is_open());
    stream.close().unwrap();

    let mut buffer = [0u8; 1];
    assert!(matches!(
        stream.read(&mut buffer),
        Err(Error::InvalidArguments)
    ));
    assert!(matches!(stream.write(&[0]), Err(Error::InvalidArguments)));
    assert!(matches!(
        stream.set_half_duplex(true),
        Err(Error::InvalidArguments)
    ));
}

#[test]
fn opening_a_missing_device_reports_no_device() {
    match devio::open_serial("/dev/tty-does-not-exist") {
        Err(Error::NoDevice) | Err(Error::Io(_)) => {}
        other => panic!("expected an open failure, got {:?}", other.map(|_| ())),
    }
}
