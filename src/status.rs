//! Decoding of the 32 byte status reply.

use std::fmt;

use crate::{
    error::{Error, PrinterError},
    media::MediaType,
    STATUS_LEN,
};

///
/// Status received from the printer encoded to Rust friendly type.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub model_code: u8,
    pub battery: Battery,
    pub extended_error: u8,
    pub error_info_1: u8,
    pub error_info_2: u8,
    pub tape_width_mm: u8,
    pub tape_type: MediaType,
    pub mode: u8,
    pub tape_length_mm: u8,
    pub status_type: StatusType,
    pub phase_type: PhaseType,
    pub phase: u16,
    pub notification: Notification,
}

impl Status {
    /// Decode a status reply by fixed byte offsets.
    ///
    /// Anything but exactly 32 bytes is rejected before any field is read.
    /// Offsets not listed here are reserved and ignored.
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let buf: &[u8; STATUS_LEN] = buf
            .try_into()
            .map_err(|_| Error::MalformedStatus(buf.len()))?;

        Ok(Status {
            model_code: buf[4],
            battery: Battery::from_code(buf[6]),
            extended_error: buf[7],
            error_info_1: buf[8],
            error_info_2: buf[9],
            tape_width_mm: buf[10],
            tape_type: MediaType::from_code(buf[11]),
            mode: buf[15],
            tape_length_mm: buf[17],
            status_type: StatusType::from_code(buf[18]),
            phase_type: PhaseType::from_code(buf[19]),
            phase: u16::from_be_bytes([buf[20], buf[21]]),
            notification: Notification::from_code(buf[22]),
        })
    }

    /// Combined error information, byte 8 in the high half.
    pub fn error_code(&self) -> u16 {
        u16::from_be_bytes([self.error_info_1, self.error_info_2])
    }

    /// True when the printer accepts a new job: no error, idle phase.
    pub fn is_ready(&self) -> bool {
        self.error_code() == 0 && self.phase_type.code() == 0 && self.phase == 0
    }

    pub fn errors(&self) -> Vec<PrinterError> {
        PrinterError::from_codes(self.error_info_1, self.error_info_2)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}, phase {:?}/{:#06x}, tape {:?} {}mm x {}mm, battery {:?}",
            self.status_type,
            self.phase_type,
            self.phase,
            self.tape_type,
            self.tape_width_mm,
            self.tape_length_mm,
            self.battery,
        )?;
        if self.error_code() != 0 {
            write!(f, ", error {:#06x}", self.error_code())?;
            for err in self.errors() {
                write!(f, " [{}]", err)?;
            }
        }
        Ok(())
    }
}

// StatusType

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusType {
    ReplyToRequest,
    PrintingCompleted,
    ErrorOccurred,
    IfModeFinished,
    PowerOff,
    Notification,
    PhaseChange,
    Unknown(u8),
}

impl StatusType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::ReplyToRequest,
            0x01 => Self::PrintingCompleted,
            0x02 => Self::ErrorOccurred,
            0x03 => Self::IfModeFinished,
            0x04 => Self::PowerOff,
            0x05 => Self::Notification,
            0x06 => Self::PhaseChange,
            other => Self::Unknown(other),
        }
    }
}

// Battery

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Battery {
    Full,
    Half,
    Low,
    ChangeBatteries,
    AcInUse,
    Unknown(u8),
}

impl Battery {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Full,
            0x01 => Self::Half,
            0x02 => Self::Low,
            0x03 => Self::ChangeBatteries,
            0x04 => Self::AcInUse,
            other => Self::Unknown(other),
        }
    }
}

// Phase

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseType {
    Receiving,
    Printing,
    Unknown(u8),
}

impl PhaseType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Receiving,
            0x01 => Self::Printing,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Receiving => 0x00,
            Self::Printing => 0x01,
            Self::Unknown(code) => code,
        }
    }
}

// Notification

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    NotAvailable,
    CoolingStarted,
    CoolingFinished,
}

impl Notification {
    fn from_code(code: u8) -> Self {
        match code {
            0x03 => Self::CoolingStarted,
            0x04 => Self::CoolingFinished,
            _ => Self::NotAvailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> [u8; 32] {
        [
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x00, 0x00, 0x00, 0x00, 0, 0, 0,
            0, 0, 0, 0, 0, 0, 0,
        ]
    }

    #[test]
    fn idle_printer_is_ready() {
        let status = Status::decode(&idle()).unwrap();
        assert!(status.is_ready());
        assert_eq!(status.status_type, StatusType::ReplyToRequest);
        assert!(status.errors().is_empty());
    }

    #[test]
    fn any_error_or_phase_byte_blocks_readiness() {
        for offset in [8, 19, 20, 21] {
            let mut buf = idle();
            buf[offset] = 0x01;
            let status = Status::decode(&buf).unwrap();
            assert!(!status.is_ready(), "offset {}", offset);
        }
    }

    #[test]
    fn short_reply_is_malformed() {
        let err = Status::decode(&[0u8; 31]).unwrap_err();
        assert!(matches!(err, Error::MalformedStatus(31)));
    }

    #[test]
    fn long_reply_is_malformed() {
        let err = Status::decode(&[0u8; 33]).unwrap_err();
        assert!(matches!(err, Error::MalformedStatus(33)));
    }

    #[test]
    fn decodes_fields_by_offset() {
        let mut buf = idle();
        buf[0..4].copy_from_slice(&[0x80, 0x20, b'B', b'0']);
        buf[6] = 0x04;
        buf[7] = 0x21;
        buf[9] = 0x10;
        buf[10] = 12;
        buf[11] = 0x01;
        buf[17] = 0;
        buf[18] = 0x02;
        buf[19] = 0x01;
        buf[20] = 0x00;
        buf[21] = 0x14;
        buf[22] = 0x03;

        let status = Status::decode(&buf).unwrap();
        assert_eq!(status.battery, Battery::AcInUse);
        assert_eq!(status.extended_error, 0x21);
        assert_eq!(status.error_code(), 0x0010);
        assert_eq!(status.errors(), vec![PrinterError::CoverOpen]);
        assert_eq!(status.tape_width_mm, 12);
        assert_eq!(status.tape_type, MediaType::Laminated);
        assert_eq!(status.status_type, StatusType::ErrorOccurred);
        assert_eq!(status.phase_type, PhaseType::Printing);
        assert_eq!(status.phase, 0x0014);
        assert_eq!(status.notification, Notification::CoolingStarted);
        assert!(status.to_string().contains("Cover is open"));
    }

    #[test]
    fn unknown_codes_are_preserved() {
        let mut buf = idle();
        buf[6] = 0x09;
        buf[18] = 0x42;
        let status = Status::decode(&buf).unwrap();
        assert_eq!(status.battery, Battery::Unknown(0x09));
        assert_eq!(status.status_type, StatusType::Unknown(0x42));
    }
}
