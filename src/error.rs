//! Error types for P-Touch printer operations.
//!
//! This module defines all possible errors that can occur while encoding
//! raster data, talking to the printer, and running a print job.

use thiserror::Error;

use crate::status::Status;

/// Main error type for P-Touch printer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport read/write failure, timeouts included.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// USB communication error.
    ///
    /// Wraps underlying rusb errors for device communication issues,
    /// timeouts, or permission problems.
    #[cfg(feature = "usb")]
    #[error(transparent)]
    UsbError(#[from] rusb::Error),

    /// Printer device is not connected or not responding.
    #[error("Device is offline")]
    DeviceOffline,

    #[error("Device is missing endpoint")]
    MissingEndpoint,

    #[error("Short write: {written} of {expected} bytes sent")]
    ShortWrite { written: usize, expected: usize },

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The status reply was not exactly 32 bytes long.
    #[error("Malformed status reply: expected 32 bytes, got {0}")]
    MalformedStatus(usize),

    /// A caller supplied value does not fit its wire field.
    ///
    /// Raised before anything is written to the transport.
    #[error("{field} = {value} does not fit its wire field (max {max})")]
    ProtocolViolation {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// The printer reported an error or a non-idle phase.
    ///
    /// No image data has been sent when this is returned.
    #[error("Printer is not ready: {0}")]
    DeviceNotReady(Box<Status>),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

/// Raster and run-length decoding failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Run at offset {offset} needs {needed} more byte(s) than available")]
    TruncatedRun { offset: usize, needed: usize },

    #[error("Frame at offset {offset} declares {declared} bytes but only {available} remain")]
    LengthMismatch {
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("Unknown frame tag {tag:#04x} at offset {offset}")]
    UnknownTag { offset: usize, tag: u8 },

    #[error("Raster line {line} decodes to {len} bytes")]
    LineLength { line: usize, len: usize },

    #[error("Frame payload of {len} bytes exceeds the 16 bit length field")]
    PayloadTooLong { len: usize },
}

/// Hardware-specific errors reported by the printer.
///
/// These are parsed from the two error information bytes of the status
/// reply and indicate physical problems that need user intervention.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterError {
    // Error information 1
    #[error("No media is installed")]
    NoMedia,

    #[error("End of media")]
    EndOfMedia,

    #[error("Cutter jam")]
    CutterJam,

    #[error("Weak batteries")]
    WeakBatteries,

    #[error("Printer is in use")]
    PrinterInUse,

    #[error("High-voltage adapter connected")]
    HighVoltageAdapter,

    // Error information 2
    #[error("Replace media")]
    ReplaceMedia,

    #[error("Expansion buffer is full")]
    BufferFull,

    #[error("Communication error")]
    CommunicationError,

    #[error("Communication buffer is full")]
    CommunicationBufferFull,

    #[error("Cover is open")]
    CoverOpen,

    #[error("Overheating")]
    Overheating,

    #[error("Black marking not detected")]
    BlackMarkingNotDetected,

    #[error("System error")]
    SystemError,
}

const ERROR_INFO_1: [(u8, PrinterError); 6] = [
    (0b0000_0001, PrinterError::NoMedia),
    (0b0000_0010, PrinterError::EndOfMedia),
    (0b0000_0100, PrinterError::CutterJam),
    (0b0000_1000, PrinterError::WeakBatteries),
    (0b0001_0000, PrinterError::PrinterInUse),
    (0b0100_0000, PrinterError::HighVoltageAdapter),
];

const ERROR_INFO_2: [(u8, PrinterError); 8] = [
    (0b0000_0001, PrinterError::ReplaceMedia),
    (0b0000_0010, PrinterError::BufferFull),
    (0b0000_0100, PrinterError::CommunicationError),
    (0b0000_1000, PrinterError::CommunicationBufferFull),
    (0b0001_0000, PrinterError::CoverOpen),
    (0b0010_0000, PrinterError::Overheating),
    (0b0100_0000, PrinterError::BlackMarkingNotDetected),
    (0b1000_0000, PrinterError::SystemError),
];

impl PrinterError {
    /// Every condition flagged by the two error information bytes.
    ///
    /// Bits without a known meaning are ignored; an empty list means the
    /// printer reports no hardware error it can name.
    pub fn from_codes(err_1: u8, err_2: u8) -> Vec<Self> {
        let first = ERROR_INFO_1
            .iter()
            .filter(move |(bit, _)| err_1 & bit != 0)
            .map(|(_, e)| *e);
        let second = ERROR_INFO_2
            .iter()
            .filter(move |(bit, _)| err_2 & bit != 0)
            .map(|(_, e)| *e);
        first.chain(second).collect()
    }
}
