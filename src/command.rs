//! Control commands of the P-Touch raster command set.
//!
//! Every command is an escape sequence followed by a fixed number of
//! argument bytes. Flag bytes are built from named fields; callers never see
//! raw bit values.

use bitflags::bitflags;
use log::debug;

use crate::{error::Error, media::MediaType, raster::CompressionType};

const ESC: u8 = 0x1B;

bitflags! {
    struct ActiveFieldBits: u8 {
        const KIND = 0b0000_0010;
        const WIDTH = 0b0000_0100;
        const LENGTH = 0b0000_1000;
        const QUALITY = 0b0100_0000;
        const RECOVERY = 0b1000_0000;
    }
}

bitflags! {
    struct PageModeBits: u8 {
        const AUTO_CUT = 0b0100_0000;
        const MIRROR = 0b1000_0000;
    }
}

bitflags! {
    struct PageModeAdvancedBits: u8 {
        const DRAFT = 0b0000_0001;
        const HALF_CUT = 0b0000_0100;
        const NO_PAGE_CHAINING = 0b0000_1000;
        const NO_CUT_SPECIAL_TAPE = 0b0001_0000;
        const HIGH_RESOLUTION = 0b0100_0000;
        const NO_BUFFER_CLEARING = 0b1000_0000;
    }
}

/// Command language the printer interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSet {
    EscP,
    Raster,
    Template,
}

impl CommandSet {
    pub fn code(self) -> u8 {
        match self {
            Self::EscP => 0x00,
            Self::Raster => 0x01,
            Self::Template => 0x03,
        }
    }
}

/// Which print parameters the printer should honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveFields {
    pub kind: bool,
    pub width: bool,
    pub length: bool,
    pub quality: bool,
    pub recovery: bool,
}

impl Default for ActiveFields {
    /// Width, quality and recovery, as the official apps send.
    fn default() -> Self {
        ActiveFields {
            kind: false,
            width: true,
            length: false,
            quality: true,
            recovery: true,
        }
    }
}

impl ActiveFields {
    pub fn bits(&self) -> u8 {
        let mut bits = ActiveFieldBits::empty();
        bits.set(ActiveFieldBits::KIND, self.kind);
        bits.set(ActiveFieldBits::WIDTH, self.width);
        bits.set(ActiveFieldBits::LENGTH, self.length);
        bits.set(ActiveFieldBits::QUALITY, self.quality);
        bits.set(ActiveFieldBits::RECOVERY, self.recovery);
        bits.bits()
    }
}

/// `ESC i M` various mode settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMode {
    pub auto_cut: bool,
    pub mirror: bool,
}

impl PageMode {
    pub fn bits(&self) -> u8 {
        let mut bits = PageModeBits::empty();
        bits.set(PageModeBits::AUTO_CUT, self.auto_cut);
        bits.set(PageModeBits::MIRROR, self.mirror);
        bits.bits()
    }
}

/// `ESC i K` advanced mode settings. Page chaining is on unless
/// `no_page_chaining` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageModeAdvanced {
    pub draft: bool,
    pub half_cut: bool,
    pub no_page_chaining: bool,
    pub no_cut_special_tape: bool,
    pub high_resolution: bool,
    pub no_buffer_clearing: bool,
}

impl PageModeAdvanced {
    pub fn bits(&self) -> u8 {
        let mut bits = PageModeAdvancedBits::empty();
        bits.set(PageModeAdvancedBits::DRAFT, self.draft);
        bits.set(PageModeAdvancedBits::HALF_CUT, self.half_cut);
        bits.set(PageModeAdvancedBits::NO_PAGE_CHAINING, self.no_page_chaining);
        bits.set(
            PageModeAdvancedBits::NO_CUT_SPECIAL_TAPE,
            self.no_cut_special_tape,
        );
        bits.set(PageModeAdvancedBits::HIGH_RESOLUTION, self.high_resolution);
        bits.set(
            PageModeAdvancedBits::NO_BUFFER_CLEARING,
            self.no_buffer_clearing,
        );
        bits.bits()
    }
}

/// `ESC i z` print information record.
///
/// Values are checked against their wire widths on construction, so a
/// record that exists can always be serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintParameters {
    pub active_fields: ActiveFields,
    pub media_type: MediaType,
    width_mm: u8,
    length_mm: u16,
    length_px: u16,
}

impl PrintParameters {
    /// `length_px` must be the exact number of raster lines that follow.
    pub fn new(
        active_fields: ActiveFields,
        media_type: MediaType,
        width_mm: u32,
        length_mm: u32,
        length_px: usize,
    ) -> Result<Self, Error> {
        Ok(PrintParameters {
            active_fields,
            media_type,
            width_mm: narrow("width_mm", width_mm.into(), u8::MAX.into())?,
            length_mm: narrow("length_mm", length_mm.into(), u16::MAX.into())?,
            length_px: narrow("length_px", length_px as u64, u16::MAX.into())?,
        })
    }

    pub fn width_mm(&self) -> u8 {
        self.width_mm
    }

    pub fn length_mm(&self) -> u16 {
        self.length_mm
    }

    pub fn length_px(&self) -> u16 {
        self.length_px
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![ESC, b'i', b'z'];
        buf.push(self.active_fields.bits());
        buf.push(self.media_type.code());
        buf.push(self.width_mm);
        buf.extend_from_slice(&self.length_mm.to_le_bytes());
        buf.extend_from_slice(&self.length_px.to_le_bytes());
        buf.extend_from_slice(&[0x00, 0x00]);
        buf
    }
}

fn narrow<T: TryFrom<u64>>(field: &'static str, value: u64, max: u64) -> Result<T, Error> {
    T::try_from(value).map_err(|_| Error::ProtocolViolation { field, value, max })
}

/// Control commands with a fixed encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// `ESC @`
    Reset,
    /// `ESC i a`
    SelectCommandSet(CommandSet),
    /// `ESC i S`
    GetStatus,
    /// `ESC i M`
    SetPageMode(PageMode),
    /// `ESC i K`
    SetPageModeAdvanced(PageModeAdvanced),
    /// `ESC i d`, feed margin in dots.
    SetMargin(u16),
    /// `M`
    SetCompression(CompressionType),
    /// Control-Z, print then feed.
    Print,
}

impl Control {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::SelectCommandSet(_) => "select-command-set",
            Self::GetStatus => "get-status",
            Self::SetPageMode(_) => "set-page-mode",
            Self::SetPageModeAdvanced(_) => "set-page-mode-advanced",
            Self::SetMargin(_) => "set-margin",
            Self::SetCompression(_) => "set-compression",
            Self::Print => "print",
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let buf = match self {
            Self::Reset => vec![ESC, b'@'],
            Self::SelectCommandSet(set) => vec![ESC, b'i', b'a', set.code()],
            Self::GetStatus => vec![ESC, b'i', b'S'],
            Self::SetPageMode(mode) => vec![ESC, b'i', b'M', mode.bits()],
            Self::SetPageModeAdvanced(mode) => vec![ESC, b'i', b'K', mode.bits()],
            Self::SetMargin(dots) => {
                let [lo, hi] = dots.to_le_bytes();
                vec![ESC, b'i', b'd', lo, hi]
            }
            Self::SetCompression(compression) => vec![b'M', compression.code()],
            Self::Print => vec![0x1A],
        };
        debug!("{}: {:02X?}", self.name(), buf);
        buf
    }
}
