//! Core types for AEDAT event data.
//!
//! This module defines the sensor geometries, the raw 8-byte event record and
//! the decoded event produced once a record's coordinates have been checked
//! against the sensor frame.

use crate::parser;
use thiserror::Error;

/// Size in bytes of one raw AEDAT event record.
pub const EVENT_SIZE: usize = 8;

/// Bit-layout rule used to pull polarity and coordinates out of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeRule {
    /// DVS128 layout: 7-bit x/y fields in bytes 2-3, polarity in bit 0 of byte 3.
    Dvs128,
    /// DAVIS240 layout: 8-bit x/y fields spread over bytes 0-2, polarity in bit 3 of byte 2.
    Davis240,
}

/// Static description of a camera model.
///
/// Frame dimensions are fixed per model and never derived from the data stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorGeometry {
    /// Frame width in pixels
    pub width: u16,
    /// Frame height in pixels
    pub height: u16,
    /// Bit layout of the event records
    pub rule: DecodeRule,
}

impl SensorGeometry {
    /// iniVation DVS128 (128x128).
    pub const DVS128: Self = Self {
        width: 128,
        height: 128,
        rule: DecodeRule::Dvs128,
    };

    /// iniVation DAVIS240 (240x180).
    pub const DAVIS240: Self = Self {
        width: 240,
        height: 180,
        rule: DecodeRule::Davis240,
    };

    /// Short human-readable model name.
    pub fn name(&self) -> &'static str {
        match self.rule {
            DecodeRule::Dvs128 => "DVS128",
            DecodeRule::Davis240 => "DAVIS240",
        }
    }

    /// Number of pixels in a full frame.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::str::FromStr for SensorGeometry {
    type Err = String;

    /// Parses a model name such as "dvs128" or "davis240".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dvs128" | "dvs-128" => Ok(Self::DVS128),
            "davis240" | "dvs240" | "davis-240" | "dvs-240" => Ok(Self::DAVIS240),
            other => Err(format!("unknown sensor model: {}", other)),
        }
    }
}

/// A decoded coordinate fell outside the sensor frame.
///
/// This means the record was decoded with the wrong geometry (or is corrupt).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("decoded coordinate ({x}, {y}) lies outside the {width}x{height} frame")]
pub struct GeometryError {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

/// One raw 8-byte event record, exactly as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Event {
    pub raw: [u8; EVENT_SIZE],
}

impl Event {
    /// Wraps a raw record.
    #[inline]
    pub fn new(raw: [u8; EVENT_SIZE]) -> Self {
        Self { raw }
    }

    /// Timestamp in microseconds (bytes 4-7, big-endian).
    #[inline]
    pub fn timestamp(&self) -> u32 {
        parser::timestamp(&self.raw)
    }

    /// Polarity bit: `true` = ON (brightness increase), `false` = OFF.
    #[inline]
    pub fn polarity(&self, geometry: &SensorGeometry) -> bool {
        match geometry.rule {
            DecodeRule::Dvs128 => parser::dvs128_polarity(&self.raw),
            DecodeRule::Davis240 => parser::davis240_polarity(&self.raw),
        }
    }

    /// 1-based pixel coordinates.
    ///
    /// Each axis is `dimension - bitfield`; anything outside
    /// `[1, width] x [1, height]` is rejected rather than clamped.
    pub fn coords(&self, geometry: &SensorGeometry) -> Result<(u16, u16), GeometryError> {
        let (x_field, y_field) = match geometry.rule {
            DecodeRule::Dvs128 => (
                parser::dvs128_x_field(&self.raw),
                parser::dvs128_y_field(&self.raw),
            ),
            DecodeRule::Davis240 => (
                parser::davis240_x_field(&self.raw),
                parser::davis240_y_field(&self.raw),
            ),
        };

        let x = i32::from(geometry.width) - i32::from(x_field);
        let y = i32::from(geometry.height) - i32::from(y_field);

        let x_ok = (1..=i32::from(geometry.width)).contains(&x);
        let y_ok = (1..=i32::from(geometry.height)).contains(&y);
        if x_ok && y_ok {
            Ok((x as u16, y as u16))
        } else {
            Err(GeometryError {
                x,
                y,
                width: geometry.width,
                height: geometry.height,
            })
        }
    }

    /// Decodes every field at once, validating coordinates.
    pub fn decode(&self, geometry: &SensorGeometry) -> Result<DvsEvent, GeometryError> {
        let (x, y) = self.coords(geometry)?;
        Ok(DvsEvent::new(x, y, self.polarity(geometry), self.timestamp()))
    }
}

/// A decoded DVS event with validated 1-based coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DvsEvent {
    /// X coordinate of the pixel, 1-based
    pub x: u16,
    /// Y coordinate of the pixel, 1-based
    pub y: u16,
    /// `true` = ON (increase in brightness), `false` = OFF
    pub polarity: bool,
    /// Timestamp in microseconds
    pub timestamp: u32,
}

impl DvsEvent {
    /// Creates a new decoded event.
    #[inline]
    pub fn new(x: u16, y: u16, polarity: bool, timestamp: u32) -> Self {
        Self {
            x,
            y,
            polarity,
            timestamp,
        }
    }
}
