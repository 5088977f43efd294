use std::io::{self, BufReader, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use thiserror::Error;
use tracing::info;

use crate::line_reader::LineReader;

/// Finite read timeout on real devices. Blocking callers loop on `TimedOut`;
/// the configuration session's copy task uses it as a cancellation point.
const PORT_TIMEOUT: Duration = Duration::from_millis(500);

/// Errors from the serial port adapter
#[derive(Debug, Error)]
pub enum SerialError {
    /// Baud rate outside the multiplexer's supported set
    #[error("unsupported baud rate: {0} (supported: 4800, 38400, 115200)")]
    UnsupportedBaud(u32),

    /// Device could not be opened
    #[error("error opening serial device {device}: {source}")]
    Open {
        device: String,
        source: serialport::Error,
    },
}

/// The three baud rates the multiplexer hardware speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudRate {
    B4800,
    B38400,
    B115200,
}

impl BaudRate {
    /// Validate a raw baud rate value
    pub fn from_value(value: u32) -> Result<Self, SerialError> {
        match value {
            4800 => Ok(BaudRate::B4800),
            38400 => Ok(BaudRate::B38400),
            115200 => Ok(BaudRate::B115200),
            other => Err(SerialError::UnsupportedBaud(other)),
        }
    }

    pub fn value(self) -> u32 {
        match self {
            BaudRate::B4800 => 4800,
            BaudRate::B38400 => 38400,
            BaudRate::B115200 => 115200,
        }
    }
}

/// Where a role reads from or writes to.
///
/// `device: None` is the `-` sentinel: the process's own standard input
/// (read direction) or standard output (write direction). The sentinel
/// never fails to open and is never closed by this adapter.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub device: Option<String>,
    pub baud: BaudRate,
}

impl SerialConfig {
    /// Open the input side as a line source
    pub fn open_input(&self) -> Result<SerialInput, SerialError> {
        match &self.device {
            None => Ok(SerialInput::Stdin(LineReader::new(BufReader::new(
                io::stdin(),
            )))),
            Some(device) => {
                let port = self.open_port(device)?;
                Ok(SerialInput::Port(LineReader::new(BufReader::new(port))))
            }
        }
    }

    /// Open the output side as a line sink
    pub fn open_output(&self) -> Result<SerialOutput, SerialError> {
        match &self.device {
            None => Ok(SerialOutput::Stdout(io::stdout())),
            Some(device) => Ok(SerialOutput::Port(self.open_port(device)?)),
        }
    }

    fn open_port(&self, device: &str) -> Result<Box<dyn SerialPort>, SerialError> {
        let port = serialport::new(device, self.baud.value())
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(PORT_TIMEOUT)
            .open()
            .map_err(|source| SerialError::Open {
                device: device.to_string(),
                source,
            })?;

        info!("Opened serial device {} at {} baud", device, self.baud.value());
        Ok(port)
    }
}

/// Line-oriented input handle: a real tty or the stdin sentinel
pub enum SerialInput {
    Stdin(LineReader<BufReader<io::Stdin>>),
    Port(LineReader<BufReader<Box<dyn SerialPort>>>),
}

impl SerialInput {
    /// Read the next line; see [`LineReader::next_line`] for the contract.
    ///
    /// Real devices surface `TimedOut` periodically; stdin never does.
    pub fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        match self {
            SerialInput::Stdin(reader) => reader.next_line(),
            SerialInput::Port(reader) => reader.next_line(),
        }
    }
}

/// Line-oriented output handle: a real tty or the stdout sentinel
pub enum SerialOutput {
    Stdout(io::Stdout),
    Port(Box<dyn SerialPort>),
}

impl SerialOutput {
    /// Write one line (newline appended) and flush immediately
    pub fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        match self {
            SerialOutput::Stdout(out) => write_line_to(out, line),
            SerialOutput::Port(port) => write_line_to(port, line),
        }
    }
}

fn write_line_to<W: Write>(out: &mut W, line: &[u8]) -> io::Result<()> {
    out.write_all(line)?;
    if !line.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    out.flush()
}
