#![allow(clippy::unusual_byte_groupings)]
//! Low-level parsing of raw 8-byte AEDAT event records.
//!
//! Each function pulls one field out of a record using shifts and masks.
//! Coordinate functions return the raw bitfield; the 1-based pixel coordinate
//! is `frame_dimension - bitfield` (see [`crate::types::Event::coords`]).

use crate::types::{DvsEvent, Event, GeometryError, SensorGeometry, EVENT_SIZE};
use byteorder::{BigEndian, ByteOrder};

/// Extracts the 32-bit timestamp (bytes 4-7, big-endian) from a record.
#[inline]
pub fn timestamp(raw: &[u8; EVENT_SIZE]) -> u32 {
    BigEndian::read_u32(&raw[4..8])
}

// ============================================================================
// DVS128
// Byte 2: [7] unused | [6:0] y field
// Byte 3: [7:1] x field | [0] polarity
// ============================================================================

/// Extracts the polarity bit from a DVS128 record.
#[inline]
pub fn dvs128_polarity(raw: &[u8; EVENT_SIZE]) -> bool {
    raw[3] & 0x01 == 1
}

/// Extracts the 7-bit x field from a DVS128 record.
#[inline]
pub fn dvs128_x_field(raw: &[u8; EVENT_SIZE]) -> u16 {
    u16::from((raw[3] >> 1) & 0x7F)
}

/// Extracts the 7-bit y field from a DVS128 record.
#[inline]
pub fn dvs128_y_field(raw: &[u8; EVENT_SIZE]) -> u16 {
    u16::from(raw[2] & 0x7F)
}

// ============================================================================
// DAVIS240
// Byte 0: [5:0] y field bits 7:2
// Byte 1: [7:6] y field bits 1:0 | [3:0] x field bits 7:4
// Byte 2: [7:4] x field bits 3:0 | [3] polarity
// ============================================================================

/// Extracts the polarity bit from a DAVIS240 record.
#[inline]
pub fn davis240_polarity(raw: &[u8; EVENT_SIZE]) -> bool {
    (raw[2] >> 3) & 0x01 == 1
}

/// Extracts the 8-bit x field from a DAVIS240 record.
#[inline]
pub fn davis240_x_field(raw: &[u8; EVENT_SIZE]) -> u16 {
    ((u16::from(raw[1]) << 4) & 0xF0) | ((u16::from(raw[2]) >> 4) & 0x0F)
}

/// Extracts the 8-bit y field from a DAVIS240 record.
#[inline]
pub fn davis240_y_field(raw: &[u8; EVENT_SIZE]) -> u16 {
    ((u16::from(raw[0]) << 2) & 0xFC) | ((u16::from(raw[1]) >> 6) & 0x03)
}

/// Lazy iterator over the raw records of a post-header buffer.
///
/// Records are non-overlapping 8-byte chunks in file order; a trailing partial
/// chunk is never yielded (see [`RawEvents::remainder`]).
#[derive(Debug, Clone)]
pub struct RawEvents<'a> {
    chunks: std::slice::ChunksExact<'a, u8>,
}

impl<'a> RawEvents<'a> {
    /// Bytes of the trailing partial record, if any.
    pub fn remainder(&self) -> &'a [u8] {
        self.chunks.remainder()
    }

    /// Decodes the records lazily, in file order, without re-sorting.
    pub fn decoded(
        self,
        geometry: SensorGeometry,
    ) -> impl ExactSizeIterator<Item = Result<DvsEvent, GeometryError>> + 'a {
        self.map(move |event| event.decode(&geometry))
    }
}

impl Iterator for RawEvents<'_> {
    type Item = Event;

    #[inline]
    fn next(&mut self) -> Option<Event> {
        self.chunks.next().map(|chunk| {
            let mut raw = [0u8; EVENT_SIZE];
            raw.copy_from_slice(chunk);
            Event::new(raw)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for RawEvents<'_> {}

/// Splits a post-header buffer into raw event records.
#[inline]
pub fn events(data: &[u8]) -> RawEvents<'_> {
    RawEvents {
        chunks: data.chunks_exact(EVENT_SIZE),
    }
}
