//! P-Touch Printer Driver
//!
//! This crate drives Brother P-Touch label printers with a 128 pin print head
//! (PT-P300BT, PT-P710BT and friends) over any reliable byte stream:
//! a Bluetooth RFCOMM tty, TCP, or USB.
//!
//! # Example
//!
//! ```rust,no_run
//! use pt_label::{Bitmap, Config, Printer, StreamTransport};
//!
//! let transport = StreamTransport::open_device("/dev/rfcomm0").unwrap();
//! let config = Config::new().auto_cut(true);
//! let mut printer = Printer::new(transport, config);
//! let bitmap = Bitmap::open("label.png", false).unwrap();
//! printer.print_bitmap(bitmap).unwrap();
//! ```

mod bitmap;
mod command;
mod error;
mod media;
mod model;
pub mod packbits;
mod printer;
mod raster;
mod status;
mod transport;

pub use crate::{
    bitmap::{Bitmap, Polarity},
    command::{
        ActiveFields, CommandSet, Control, PageMode, PageModeAdvanced, PrintParameters,
    },
    error::{CodecError, Error, PrinterError},
    media::{MediaType, Tape},
    model::Model,
    printer::{Config, JobState, PrintJob, Printer},
    raster::{
        decode_raster_transfer, encode_raster_transfer, CompressionType, FrameReader,
        RasterTransfer, TransferFrame,
    },
    status::{Battery, Notification, PhaseType, Status, StatusType},
    transport::{StreamTransport, Transport},
};

#[cfg(feature = "usb")]
pub use crate::transport::UsbTransport;

/// Width in pixels of one raster line.
///
/// 128 pins across the print head, requiring 16 bytes per line when packed
/// into bitmap format (128 / 8 = 16).
pub const LINE_PIXELS: u32 = 128;

/// Bytes in one raster line.
pub const LINE_BYTES: usize = LINE_PIXELS as usize / 8;

/// Length of the status reply.
pub const STATUS_LEN: usize = 32;
