//! Hardware access layer for NMEA 0183 multiplexer tools
//!
//! This library provides the device-facing building blocks shared by the
//! reader, configuration and splitter programs:
//! - Serial port adapter with the three multiplexer baud rates and a
//!   stdin/stdout sentinel
//! - Bounded line framing over any buffered byte source
//! - GPIO line observation (is the configuration line claimed?) and the
//!   output claim used to request configuration mode
//!
//! # Example
//!
//! ```no_run
//! use mux_io::{BaudRate, SerialConfig};
//!
//! let config = SerialConfig {
//!     device: Some("/dev/ttyAMA0".to_string()),
//!     baud: BaudRate::from_value(4800).unwrap(),
//! };
//!
//! let mut input = config.open_input().unwrap();
//! while let Some(line) = input.next_line().unwrap() {
//!     print!("{}", String::from_utf8_lossy(&line));
//! }
//! ```

pub mod gpio;
pub mod line_reader;
pub mod serial;

// Re-export commonly used types
pub use gpio::{ClaimProbe, GpioError, PinClaim, PinMonitor};
pub use line_reader::{LineReader, MAX_LINE};
pub use serial::{BaudRate, SerialConfig, SerialError, SerialInput, SerialOutput};
