//! AEDAT decoder.
//!
//! Locates the header, identifies the sensor and turns the record area into
//! validated [`DvsEvent`]s. Decoding is stateless: every record stands alone.

use crate::header::{self, AedatHeader};
use crate::parser;
use crate::types::{DvsEvent, GeometryError, SensorGeometry, EVENT_SIZE};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during AEDAT decoding.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("End of ASCII header marker not found")]
    HeaderNotFound,

    #[error("No sensor label line found in header")]
    SensorLabelNotFound,

    #[error("Unrecognized sensor in header line: {0}")]
    UnrecognizedSensor(String),

    #[error("Event {index}: {source}")]
    Geometry {
        index: usize,
        #[source]
        source: GeometryError,
    },
}

/// Result of decoding an AEDAT file.
#[derive(Debug)]
pub struct DecodeResult {
    /// Decoded events, in file order
    pub events: Vec<DvsEvent>,
    /// Sensor the events were decoded for
    pub geometry: SensorGeometry,
    /// Parsed header information
    pub header: AedatHeader,
    /// Size of the dropped trailing partial record (0-7 bytes)
    pub trailing_bytes: usize,
}

/// AEDAT decoder.
///
/// Holds no per-record state; the same decoder can be reused across files.
#[derive(Debug, Default, Clone, Copy)]
pub struct AedatDecoder;

impl AedatDecoder {
    /// Creates a new decoder.
    pub fn new() -> Self {
        Self
    }

    /// Decodes post-header record bytes for a known sensor, appending to `events`.
    ///
    /// Stops at the first record whose coordinates fall outside the sensor
    /// frame. A trailing partial record is ignored. Returns the number of
    /// dropped trailing bytes.
    pub fn decode_buffer(
        &self,
        data: &[u8],
        geometry: &SensorGeometry,
        events: &mut Vec<DvsEvent>,
    ) -> Result<usize, DecodeError> {
        let records = parser::events(data);
        let trailing = records.remainder().len();
        events.reserve(records.len());

        for (index, decoded) in records.decoded(*geometry).enumerate() {
            let event = decoded.map_err(|source| DecodeError::Geometry { index, source })?;
            events.push(event);
        }

        Ok(trailing)
    }

    /// Decodes a complete in-memory AEDAT file (header and records).
    pub fn decode_bytes(&self, buf: &[u8]) -> Result<DecodeResult, DecodeError> {
        let header = header::scan_header(buf)?;
        let geometry = header.geometry;

        let data = &buf[header.data_offset..];
        let mut events = Vec::with_capacity(data.len() / EVENT_SIZE);
        let trailing_bytes = self.decode_buffer(data, &geometry, &mut events)?;

        Ok(DecodeResult {
            events,
            geometry,
            header,
            trailing_bytes,
        })
    }

    /// Decodes an AEDAT file from disk.
    ///
    /// The whole file is read into memory before decoding.
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> Result<DecodeResult, DecodeError> {
        let buf = fs::read(path.as_ref())?;
        self.decode_bytes(&buf)
    }
}
