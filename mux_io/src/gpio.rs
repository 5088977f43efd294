use std::io;

use gpiod::{Chip, LineId, Options};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the GPIO layer
#[derive(Debug, Error)]
pub enum GpioError {
    /// GPIO character device could not be opened
    #[error("error opening GPIO chip {chip}: {source}")]
    ChipOpen { chip: String, source: io::Error },

    /// Line info could not be read (bad line number, or the controller
    /// became unavailable)
    #[error("error reading GPIO line {line}: {source}")]
    LineInfo { line: LineId, source: io::Error },

    /// Line could not be claimed as an output
    #[error("error claiming GPIO line {line} as output: {source}")]
    Claim { line: LineId, source: io::Error },
}

/// Observation seam for the read loop's configuration-mode check.
///
/// Implementations report whether the watched line is currently claimed by
/// some owner. Abstracting this keeps the state machine testable without
/// GPIO hardware.
pub trait ClaimProbe {
    fn is_claimed(&mut self) -> Result<bool, GpioError>;
}

/// Observes a GPIO line's claim state without ever owning it.
///
/// The configuration tool requests the line as an output to signal the
/// multiplexer; the reader only watches for that request. Line bookkeeping
/// is not stable across external claim/release events, so the kernel's
/// line info is re-read on every poll instead of being cached.
pub struct PinMonitor {
    chip: Chip,
    line: LineId,
}

impl PinMonitor {
    /// Open the GPIO chip and validate the line number.
    ///
    /// Both failures are fatal at startup: without the controller there is
    /// no way to detect configuration mode.
    pub fn open(chip_name: &str, line: LineId) -> Result<Self, GpioError> {
        let chip = Chip::new(chip_name).map_err(|source| GpioError::ChipOpen {
            chip: chip_name.to_string(),
            source,
        })?;

        // probe once so a bad line number fails before any streaming starts
        chip.line_info(line)
            .map_err(|source| GpioError::LineInfo { line, source })?;

        debug!("Watching GPIO line {} on {}", line, chip_name);
        Ok(Self { chip, line })
    }

    pub fn line(&self) -> LineId {
        self.line
    }
}

impl ClaimProbe for PinMonitor {
    fn is_claimed(&mut self) -> Result<bool, GpioError> {
        let info = self
            .chip
            .line_info(self.line)
            .map_err(|source| GpioError::LineInfo {
                line: self.line,
                source,
            })?;
        Ok(info.used)
    }
}

/// Exclusive output claim on the configuration line, held low for the
/// lifetime of a configuration session.
///
/// Dropping the claim releases the request and then best-effort restores
/// the line to an input, leaving the multiplexer free to exit
/// configuration mode. The kernel releases the request on process death
/// as well, so abnormal exits cannot leave the line held.
pub struct PinClaim {
    chip: Chip,
    line: LineId,
    consumer: String,
    request: Option<gpiod::Lines<gpiod::Output>>,
}

impl PinClaim {
    pub fn acquire(chip_name: &str, line: LineId, consumer: &str) -> Result<Self, GpioError> {
        let chip = Chip::new(chip_name).map_err(|source| GpioError::ChipOpen {
            chip: chip_name.to_string(),
            source,
        })?;

        let opts = Options::output([line]).values([false]).consumer(consumer);
        let request = chip
            .request_lines(opts)
            .map_err(|source| GpioError::Claim { line, source })?;

        info!("Holding GPIO line {} low to request configuration mode", line);
        Ok(Self {
            chip,
            line,
            consumer: consumer.to_string(),
            request: Some(request),
        })
    }
}

impl Drop for PinClaim {
    fn drop(&mut self) {
        // release the output request first, then put the line back to an
        // input; the restore is best-effort
        self.request.take();

        let opts = Options::input([self.line]).consumer(self.consumer.as_str());
        match self.chip.request_lines(opts) {
            Ok(_input) => debug!("Released GPIO line {}", self.line),
            Err(e) => debug!("Could not restore GPIO line {} to input: {}", self.line, e),
        }
    }
}
