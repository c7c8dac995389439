//! Raster graphics transfer frames.
//!
//! The image travels to the printer one 16 byte raster line at a time. Each
//! line becomes one frame on the wire:
//!
//! ```text
//! 'G' n1 n2 payload...   n1 + n2 * 256 payload bytes, packed or raw
//! 'Z'                    a line of zero bytes
//! ```

use std::slice::Chunks;

use crate::{error::CodecError, packbits, LINE_BYTES};

/// Tag of a raster graphics transfer frame.
pub const TRANSFER_TAG: u8 = b'G';

/// Tag of a zero raster graphics frame.
pub const ZERO_TAG: u8 = b'Z';

/// Compression mode announced to the printer and applied to raster lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Rle,
}

impl CompressionType {
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0x00,
            Self::Rle => 0x02, // TIFF packbits
        }
    }
}

impl From<bool> for CompressionType {
    fn from(compress: bool) -> Self {
        if compress {
            Self::Rle
        } else {
            Self::None
        }
    }
}

/// One raster line as it goes over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferFrame {
    RleLine(Vec<u8>),
    ZeroLine,
    RawLine([u8; LINE_BYTES]),
}

impl TransferFrame {
    /// Wire encoding of the frame.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::with_capacity(3 + LINE_BYTES + 1);
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Append the wire encoding to `buf`.
    ///
    /// Nothing is written when a packed payload does not fit the length field.
    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        match self {
            Self::ZeroLine => buf.push(ZERO_TAG),
            Self::RleLine(payload) => {
                let len = u16::try_from(payload.len())
                    .map_err(|_| CodecError::PayloadTooLong { len: payload.len() })?;
                buf.push(TRANSFER_TAG);
                buf.extend_from_slice(&len.to_le_bytes());
                buf.extend_from_slice(payload);
            }
            Self::RawLine(data) => {
                buf.push(TRANSFER_TAG);
                buf.extend_from_slice(&(LINE_BYTES as u16).to_le_bytes());
                buf.extend_from_slice(data);
            }
        }
        Ok(())
    }

    /// Single character used for progress output.
    pub fn tag(&self) -> char {
        match self {
            Self::ZeroLine => ZERO_TAG as char,
            _ => TRANSFER_TAG as char,
        }
    }
}

/// Lazy producer of transfer frames, one per raster line in scanline order.
///
/// Created by [`encode_raster_transfer`]. Single pass: encode again from the
/// bitmap to restart.
#[derive(Debug, Clone)]
pub struct RasterTransfer<'a> {
    lines: Chunks<'a, u8>,
    compression: CompressionType,
}

impl<'a> Iterator for RasterTransfer<'a> {
    type Item = TransferFrame;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.lines.next()?;
        let mut line = [0u8; LINE_BYTES];
        line[..chunk.len()].copy_from_slice(chunk);

        if line.iter().all(|b| *b == 0) {
            return Some(TransferFrame::ZeroLine);
        }

        Some(match self.compression {
            CompressionType::Rle => TransferFrame::RleLine(packbits::encode(&line)),
            CompressionType::None => TransferFrame::RawLine(line),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lines.size_hint()
    }
}

impl<'a> ExactSizeIterator for RasterTransfer<'a> {}

/// Split a 1bpp bitmap into raster lines and frame each one.
///
/// A short final line is padded with zero bytes.
pub fn encode_raster_transfer(bitmap: &[u8], compression: CompressionType) -> RasterTransfer<'_> {
    RasterTransfer {
        lines: bitmap.chunks(LINE_BYTES),
        compression,
    }
}

/// Parses a wire byte stream back into frames.
///
/// `G` payloads are interpreted according to `compression`; a raw line must
/// carry exactly one raster line.
#[derive(Debug, Clone)]
pub struct FrameReader<'a> {
    data: &'a [u8],
    pos: usize,
    line: usize,
    compression: CompressionType,
    failed: bool,
}

impl<'a> FrameReader<'a> {
    pub fn new(data: &'a [u8], compression: CompressionType) -> Self {
        FrameReader {
            data,
            pos: 0,
            line: 0,
            compression,
            failed: false,
        }
    }

    fn read_frame(&mut self) -> Result<TransferFrame, CodecError> {
        let offset = self.pos;
        let tag = self.data[offset];

        match tag {
            ZERO_TAG => {
                self.pos += 1;
                Ok(TransferFrame::ZeroLine)
            }
            TRANSFER_TAG => {
                let header = self.data.get(offset + 1..offset + 3).ok_or(
                    CodecError::LengthMismatch {
                        offset,
                        declared: 2,
                        available: self.data.len() - offset - 1,
                    },
                )?;
                let declared = u16::from_le_bytes([header[0], header[1]]) as usize;
                let start = offset + 3;
                let available = self.data.len() - start;
                if declared > available {
                    return Err(CodecError::LengthMismatch {
                        offset,
                        declared,
                        available,
                    });
                }
                let payload = &self.data[start..start + declared];
                self.pos = start + declared;

                match self.compression {
                    CompressionType::Rle => Ok(TransferFrame::RleLine(payload.to_vec())),
                    CompressionType::None => {
                        let line: [u8; LINE_BYTES] =
                            payload.try_into().map_err(|_| CodecError::LineLength {
                                line: self.line,
                                len: declared,
                            })?;
                        Ok(TransferFrame::RawLine(line))
                    }
                }
            }
            _ => Err(CodecError::UnknownTag { offset, tag }),
        }
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = Result<TransferFrame, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        let frame = self.read_frame();
        self.failed = frame.is_err();
        self.line += 1;
        Some(frame)
    }
}

/// Rebuild the padded bitmap from a stream of transfer frames.
pub fn decode_raster_transfer(
    data: &[u8],
    compression: CompressionType,
) -> Result<Vec<u8>, CodecError> {
    let mut bitmap = Vec::new();

    for (line, frame) in FrameReader::new(data, compression).enumerate() {
        match frame? {
            TransferFrame::ZeroLine => bitmap.extend_from_slice(&[0u8; LINE_BYTES]),
            TransferFrame::RawLine(raw) => bitmap.extend_from_slice(&raw),
            TransferFrame::RleLine(payload) => {
                let unpacked = packbits::decode(&payload)?;
                if unpacked.len() != LINE_BYTES {
                    return Err(CodecError::LineLength {
                        line,
                        len: unpacked.len(),
                    });
                }
                bitmap.extend_from_slice(&unpacked);
            }
        }
    }

    Ok(bitmap)
}
