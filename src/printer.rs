use log::{debug, info, trace, warn};

use crate::{
    bitmap::Bitmap,
    command::{ActiveFields, CommandSet, Control, PageMode, PageModeAdvanced, PrintParameters},
    error::Error,
    media::Tape,
    raster::{encode_raster_transfer, CompressionType, TransferFrame},
    status::Status,
    transport::Transport,
    STATUS_LEN,
};

/// Where a print job is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Reset,
    QueryStatus,
    Ready,
    NotReady,
    Configure,
    Transfer,
    Print,
    Confirm,
    Done,
    Aborted,
}

/// Config
///
#[derive(Debug, Clone)]
pub struct Config {
    flush_len: usize,
    compress: bool,
    chaining: bool,
    auto_cut: bool,
    end_margin: u16,
    print: bool,
    tape: Option<Tape>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            flush_len: 64,
            compress: true,
            chaining: false,
            auto_cut: false,
            end_margin: 0,
            print: true,
            tape: None,
        }
    }
}

impl Config {
    /// Initialize configuration data with default values.
    ///
    /// Compressed transfer, no chaining, no auto cut, no margin, print at
    /// the end, tape geometry taken from the printer status.
    ///
    /// # Example
    ///
    /// ```
    /// use pt_label::Config;
    ///
    /// let config = Config::new().auto_cut(true).end_margin(14);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of zero bytes sent to flush the printer's receive buffer.
    pub fn flush_len(self, flush_len: usize) -> Self {
        Config { flush_len, ..self }
    }

    pub fn compress(self, flag: bool) -> Self {
        Config {
            compress: flag,
            ..self
        }
    }

    /// Keep the label in the printer so the next job continues it.
    pub fn chaining(self, flag: bool) -> Self {
        Config {
            chaining: flag,
            ..self
        }
    }

    pub fn auto_cut(self, flag: bool) -> Self {
        Config {
            auto_cut: flag,
            ..self
        }
    }

    /// Feed after the image, in dots.
    pub fn end_margin(self, dots: u16) -> Self {
        Config {
            end_margin: dots,
            ..self
        }
    }

    /// When false the job is configured and transferred but not printed.
    pub fn print(self, flag: bool) -> Self {
        Config {
            print: flag,
            ..self
        }
    }

    /// Use this tape geometry instead of the one the printer reports.
    pub fn tape(self, tape: Tape) -> Self {
        Config {
            tape: Some(tape),
            ..self
        }
    }
}

/// One bitmap on its way to the printer.
#[derive(Debug, Clone)]
pub struct PrintJob {
    bitmap: Bitmap,
    compression: CompressionType,
    page_mode: PageMode,
    page_mode_advanced: PageModeAdvanced,
    end_margin: u16,
    print: bool,
    tape: Option<Tape>,
    parameters: Option<PrintParameters>,
    state: JobState,
}

impl PrintJob {
    pub fn new(bitmap: Bitmap, config: &Config) -> Self {
        PrintJob {
            bitmap,
            compression: CompressionType::from(config.compress),
            page_mode: PageMode {
                auto_cut: config.auto_cut,
                ..Default::default()
            },
            page_mode_advanced: PageModeAdvanced {
                no_page_chaining: !config.chaining,
                ..Default::default()
            },
            end_margin: config.end_margin,
            print: config.print,
            tape: config.tape,
            parameters: None,
            state: JobState::Idle,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn raster_lines(&self) -> usize {
        self.bitmap.raster_lines()
    }

    pub fn compression(&self) -> CompressionType {
        self.compression
    }

    pub fn page_mode(&self) -> PageMode {
        self.page_mode
    }

    pub fn page_mode_advanced(&self) -> PageModeAdvanced {
        self.page_mode_advanced
    }

    /// Parameters sent to the printer, once known.
    pub fn parameters(&self) -> Option<&PrintParameters> {
        self.parameters.as_ref()
    }

    fn enter(&mut self, state: JobState) {
        debug!("job: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn parameters_for(&self, tape: Tape) -> Result<PrintParameters, Error> {
        PrintParameters::new(
            ActiveFields::default(),
            tape.media,
            tape.width_mm,
            tape.length_mm,
            self.raster_lines(),
        )
    }
}

pub struct Printer<T> {
    transport: T,
    config: Config,
}

impl<T: Transport> Printer<T> {
    pub fn new(transport: T, config: Config) -> Self {
        Printer { transport, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Read printer status.
    ///
    /// This method is convenient for inspection when a new tape is inserted.
    pub fn check_status(&mut self) -> Result<Status, Error> {
        let result = self.reset().and_then(|_| self.request_status());
        self.teardown(result)
    }

    /// Cancel printing
    ///
    pub fn cancel(&mut self) -> Result<(), Error> {
        self.reset()
    }

    /// Print a bitmap with the printer's configuration.
    pub fn print_bitmap(&mut self, bitmap: Bitmap) -> Result<Option<Status>, Error> {
        let mut job = PrintJob::new(bitmap, &self.config);
        self.print(&mut job)
    }

    /// Run a job to completion.
    ///
    /// Returns the status the printer sends after printing, or `None` when
    /// the job is not printed. The printer is reset afterwards whatever the
    /// outcome; a failure during that reset only surfaces when the job itself
    /// succeeded.
    pub fn print(&mut self, job: &mut PrintJob) -> Result<Option<Status>, Error> {
        // explicit geometry can be checked before the printer is touched
        if let Some(tape) = job.tape {
            match job.parameters_for(tape) {
                Ok(parameters) => job.parameters = Some(parameters),
                Err(err) => {
                    job.enter(JobState::Aborted);
                    return Err(err);
                }
            }
        }

        let result = self.run(job);
        if result.is_err() {
            job.enter(JobState::Aborted);
        }
        self.teardown(result)
    }

    fn run(&mut self, job: &mut PrintJob) -> Result<Option<Status>, Error> {
        job.enter(JobState::Reset);
        self.reset()?;

        job.enter(JobState::QueryStatus);
        let status = self.request_status()?;
        info!("printer status: {}", status);

        if !status.is_ready() {
            job.enter(JobState::NotReady);
            warn!("printer indicates that it is not ready, refusing to continue");
            return Err(Error::DeviceNotReady(Box::new(status)));
        }
        job.enter(JobState::Ready);

        let parameters = match job.parameters {
            Some(parameters) => parameters,
            None => {
                let tape = Tape::new(
                    status.tape_type,
                    status.tape_width_mm.into(),
                    status.tape_length_mm.into(),
                );
                job.parameters_for(tape)?
            }
        };
        job.parameters = Some(parameters);

        job.enter(JobState::Configure);
        self.configure(job, &parameters)?;

        job.enter(JobState::Transfer);
        self.transfer(job)?;

        if !job.print {
            job.enter(JobState::Done);
            return Ok(None);
        }

        job.enter(JobState::Print);
        self.send_control(Control::Print)?;

        job.enter(JobState::Confirm);
        let status = self.request_status()?;
        info!("printer status: {}", status);
        if status.error_code() != 0 {
            warn!("printer reported errors after printing: {:?}", status.errors());
        }

        job.enter(JobState::Done);
        Ok(Some(status))
    }

    /// Flush, initialize and enter raster mode.
    pub fn reset(&mut self) -> Result<(), Error> {
        if self.config.flush_len > 0 {
            self.transport.send(&vec![0x00; self.config.flush_len])?;
        }
        self.send_control(Control::Reset)?;
        self.send_control(Control::SelectCommandSet(CommandSet::Raster))
    }

    fn teardown<V>(&mut self, result: Result<V, Error>) -> Result<V, Error> {
        match (result, self.reset()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(teardown)) => {
                warn!("reset after failed job also failed: {}", teardown);
                Err(err)
            }
        }
    }

    // The printer is stateful; the order below is the one it is known to accept.
    fn configure(&mut self, job: &PrintJob, parameters: &PrintParameters) -> Result<(), Error> {
        self.reset()?;

        let buf = parameters.to_bytes();
        debug!("set-print-parameters: {:02X?}", buf);
        self.transport.send(&buf)?;

        self.send_control(Control::SetPageModeAdvanced(job.page_mode_advanced))?;
        self.send_control(Control::SetPageMode(job.page_mode))?;
        self.send_control(Control::SetMargin(job.end_margin))?;
        self.send_control(Control::SetCompression(job.compression))
    }

    fn transfer(&mut self, job: &PrintJob) -> Result<(), Error> {
        info!("sending image data ({} lines)", job.raster_lines());

        let mut zero_lines = 0;
        for frame in encode_raster_transfer(job.bitmap.as_bytes(), job.compression) {
            if frame == TransferFrame::ZeroLine {
                zero_lines += 1;
            }
            trace!("{}", frame.tag());
            self.transport.send(&frame.to_bytes()?)?;
        }

        debug!(
            "image data sent: {} lines, {} of them blank",
            job.raster_lines(),
            zero_lines
        );
        Ok(())
    }

    fn send_control(&mut self, control: Control) -> Result<(), Error> {
        self.transport.send(&control.to_bytes())
    }

    fn request_status(&mut self) -> Result<Status, Error> {
        self.send_control(Control::GetStatus)?;
        let buf = self.transport.recv(STATUS_LEN)?;
        debug!("Raw status code: {:02X?}", buf);
        let status = Status::decode(&buf)?;
        debug!("Parsed Status struct: {:?}", status);
        Ok(status)
    }
}
