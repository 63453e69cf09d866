//! AEDAT ASCII header scanning.
//!
//! An AEDAT file starts with `#`-prefixed ASCII lines terminated by
//! `#End Of ASCII Header\r\n`, followed by the binary event records. The
//! sensor model is identified from a label line in that header; there is no
//! fallback to the file name.

use crate::decoder::DecodeError;
use crate::types::SensorGeometry;

/// Marker that terminates the ASCII header.
pub const END_OF_HEADER: &[u8] = b"#End Of ASCII Header\r\n";

/// Upper bound on how much of the file is searched for sensor labels (512 KiB).
pub const MAX_LABEL_SCAN: usize = 512 * 1024;

/// Header lines that may name the sensor, in priority order.
pub const SENSOR_LABELS: &[&str] = &[
    "# HardwareInterface:",
    "# Device Type:",
    "# Camera:",
    "# DVS Type:",
    "# Platform:",
    "# Sensor:",
];

const DVS128_NAMES: &[&str] = &["dvs128", "dvs-128"];
const DAVIS240_NAMES: &[&str] = &["davis240", "dvs240", "davis-240", "dvs-240"];

/// Prefix of the format-version line (e.g. `#!AER-DAT2.0`).
const VERSION_PREFIX: &str = "#!AER-DAT";

/// Everything learned from an AEDAT header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AedatHeader {
    /// Byte offset of the first event record
    pub data_offset: usize,
    /// Sensor identified from the label lines
    pub geometry: SensorGeometry,
    /// Format version from the `#!AER-DAT` line, e.g. "2.0"
    pub format_version: Option<String>,
}

/// Returns the offset just past the end-of-header marker.
pub fn find_header_end(buf: &[u8]) -> Result<usize, DecodeError> {
    buf.windows(END_OF_HEADER.len())
        .position(|window| window == END_OF_HEADER)
        .map(|index| index + END_OF_HEADER.len())
        .ok_or(DecodeError::HeaderNotFound)
}

/// Identifies the sensor from the label lines near the start of the buffer.
///
/// Candidate lines are tried in [`SENSOR_LABELS`] order and the first one that
/// names a known model wins. `SensorLabelNotFound` means no candidate line
/// exists; `UnrecognizedSensor` means candidates exist but none is known.
pub fn infer_geometry(buf: &[u8]) -> Result<SensorGeometry, DecodeError> {
    let prefix = &buf[..buf.len().min(MAX_LABEL_SCAN)];
    let contents = String::from_utf8_lossy(prefix);

    let mut first_candidate: Option<&str> = None;
    for label in SENSOR_LABELS {
        for line in contents.lines().filter(|line| line.contains(label)) {
            if let Some(geometry) = match_sensor_name(line) {
                return Ok(geometry);
            }
            first_candidate.get_or_insert(line);
        }
    }

    match first_candidate {
        Some(line) => Err(DecodeError::UnrecognizedSensor(line.trim().to_string())),
        None => Err(DecodeError::SensorLabelNotFound),
    }
}

/// Matches a label line against the known model names (case-insensitive).
fn match_sensor_name(line: &str) -> Option<SensorGeometry> {
    let line = line.to_lowercase();
    if DVS128_NAMES.iter().any(|name| line.contains(name)) {
        Some(SensorGeometry::DVS128)
    } else if DAVIS240_NAMES.iter().any(|name| line.contains(name)) {
        Some(SensorGeometry::DAVIS240)
    } else {
        None
    }
}

/// Reads the version from a leading `#!AER-DAT<version>` line, if present.
fn format_version(buf: &[u8]) -> Option<String> {
    let line_end = buf.iter().position(|&b| b == b'\n').unwrap_or(buf.len());
    let first_line = std::str::from_utf8(&buf[..line_end]).ok()?;
    first_line
        .trim_end()
        .strip_prefix(VERSION_PREFIX)
        .map(str::to_string)
}

/// Runs both header lookups.
pub fn scan_header(buf: &[u8]) -> Result<AedatHeader, DecodeError> {
    let data_offset = find_header_end(buf)?;
    let geometry = infer_geometry(buf)?;

    Ok(AedatHeader {
        data_offset,
        geometry,
        format_version: format_version(buf),
    })
}
