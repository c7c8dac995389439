use std::{io::Write, path::PathBuf, process::ExitCode, time::Duration};

//
// pt-label --device /dev/rfcomm0 -i label.png
//
use clap::Parser;
use clap_verbosity::Verbosity;
use log::{error, info, LevelFilter};
use pt_label::{
    Bitmap, Config, Error, MediaType, Model, Printer, StreamTransport, Tape, Transport,
};

/// Print a monochrome image on a Brother P-Touch label printer.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Character device of the printer, e.g. /dev/rfcomm0 after `rfcomm bind`.
    #[arg(short, long, env = "PT_LABEL_DEVICE")]
    device: Option<PathBuf>,

    /// host:port of a network attached printer.
    #[arg(long, env = "PT_LABEL_TCP")]
    tcp: Option<String>,

    /// Model of a USB attached printer, e.g. PT-P710BT.
    #[arg(long)]
    usb: Option<Model>,

    /// Serial number selecting one of several USB printers.
    #[arg(long, env = "PT_LABEL_USB_SERIAL")]
    serial: Option<String>,

    /// Image file to print.
    #[arg(short, long, required_unless_present = "status")]
    image: Option<PathBuf>,

    /// Only configure the printer and send the image, do not print.
    #[arg(short = 'n', long)]
    no_print: bool,

    /// Disable feeding at the end of the print (chaining).
    #[arg(short = 'F', long)]
    no_feed: bool,

    /// Enable auto-cutting (or label boundary marks on printers without cutter).
    #[arg(short, long)]
    auto_cut: bool,

    /// End margin in dots.
    #[arg(short = 'm', long, default_value_t = 0)]
    end_margin: u16,

    /// Send the image as-is without rotating it; it must be at most 128 px wide.
    #[arg(short, long)]
    raw: bool,

    /// Disable compression.
    #[arg(short = 'C', long)]
    nocomp: bool,

    /// Zero bytes sent to flush the printer's receive buffer.
    #[arg(long, default_value_t = 64)]
    flush: usize,

    /// Override the media type reported by the printer.
    #[arg(long, requires = "width")]
    media: Option<MediaType>,

    /// Tape width in mm, used with `--media`.
    #[arg(long, requires = "media")]
    width: Option<u32>,

    /// Label length in mm, 0 for continuous tape. Used with `--media`.
    #[arg(long, default_value_t = 0, requires = "media")]
    length: u32,

    /// Read/write timeout in seconds for network and USB transports.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Print the printer status and exit.
    #[arg(long)]
    status: bool,

    #[command(flatten)]
    verbose: Verbosity,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::new()
            .flush_len(self.flush)
            .compress(!self.nocomp)
            .chaining(self.no_feed)
            .auto_cut(self.auto_cut)
            .end_margin(self.end_margin)
            .print(!self.no_print);

        if let (Some(media), Some(width)) = (self.media, self.width) {
            config = config.tape(Tape::new(media, width, self.length));
        }
        config
    }

    fn open_transport(&self) -> Result<Box<dyn Transport>, Error> {
        let timeout = Duration::from_secs(self.timeout);

        if let Some(model) = self.usb {
            return open_usb(model, self.serial.as_deref(), timeout);
        }
        if let Some(addr) = &self.tcp {
            return Ok(Box::new(StreamTransport::connect_tcp(addr.as_str(), timeout)?));
        }
        match &self.device {
            Some(path) => Ok(Box::new(StreamTransport::open_device(path)?)),
            None => Err(Error::DeviceOffline),
        }
    }
}

#[cfg(feature = "usb")]
fn open_usb(
    model: Model,
    serial: Option<&str>,
    timeout: Duration,
) -> Result<Box<dyn Transport>, Error> {
    let pid = model.pid().ok_or(Error::DeviceOffline)?;
    let transport = pt_label::UsbTransport::open(pid, serial)?.timeout(timeout);
    Ok(Box::new(transport))
}

#[cfg(not(feature = "usb"))]
fn open_usb(
    model: Model,
    _serial: Option<&str>,
    _timeout: Duration,
) -> Result<Box<dyn Transport>, Error> {
    error!("{:?}: built without USB support", model);
    Err(Error::DeviceOffline)
}

fn init_logger(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}:{}] {} - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    let bitmap = match (&cli.image, cli.status) {
        (Some(path), false) => Some(Bitmap::open(path, cli.raw)?),
        _ => None,
    };

    info!("connecting to printer...");
    let transport = cli.open_transport()?;
    let mut printer = Printer::new(transport, cli.config());

    match bitmap {
        None => {
            let status = printer.check_status()?;
            println!("{}", status);
        }
        Some(bitmap) => {
            info!("printing {} raster lines", bitmap.raster_lines());
            if let Some(status) = printer.print_bitmap(bitmap)? {
                println!("{}", status);
            }
            info!("all done");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logger(cli.verbose.log_level_filter());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
