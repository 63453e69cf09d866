//! AEDAT decoder library for DVS128 and DAVIS240 event cameras.
//!
//! This crate decodes the AEDAT 2.0 recordings written by jAER-style
//! dynamic-vision-sensor tooling and reconstructs the event stream into
//! per-window summaries or full-resolution frames.
//!
//! # Example
//!
//! ```no_run
//! use aedat_core::{AedatDecoder, WindowMode, Windows, WindowingConfig};
//!
//! let result = AedatDecoder::new().decode_file("recording.aedat").unwrap();
//! println!("Decoded {} events from a {}", result.events.len(), result.geometry.name());
//!
//! let config = WindowingConfig::new(WindowMode::TimeBased { span: 10_000 });
//! for window in Windows::new(&result.events, &result.geometry, config).unwrap() {
//!     println!("{} ON / {} OFF", window.on_count, window.off_count);
//! }
//! ```
//!
//! # Features
//!
//! - Bit-exact record decoding for DVS128 and DAVIS240 layouts
//! - Sensor identification from header label lines
//! - Time-span and event-count windowing with downsampled occupancy grids
//! - RGB frame reconstruction with per-polarity filtering
//! - CSV, PGM-string and PNG output writers

pub mod decoder;
pub mod frame;
pub mod header;
pub mod output;
pub mod parser;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use decoder::{AedatDecoder, DecodeError, DecodeResult};
pub use frame::{Frame, FrameConfig, Frames, Rgb};
pub use header::{find_header_end, infer_geometry, scan_header, AedatHeader};
pub use output::{CoordMode, CsvOptions, OutputError, WindowCsvOptions};
pub use parser::{events, RawEvents};
pub use types::{DecodeRule, DvsEvent, Event, GeometryError, SensorGeometry};
pub use window::{Grid, Occupancy, Window, WindowError, WindowMode, Windows, WindowingConfig};
