//! Helpers for building synthetic AEDAT recordings.
#![allow(dead_code)]

use aedat_core::{DvsEvent, SensorGeometry};

/// Builds a header naming `label` as the hardware interface.
pub fn header(label: &str) -> Vec<u8> {
    format!(
        "#!AER-DAT2.0\r\n\
         # This is a raw AE data file created by a test\r\n\
         # HardwareInterface: {}\r\n\
         #End Of ASCII Header\r\n",
        label
    )
    .into_bytes()
}

/// Encodes a decoded event back into its raw record for `geometry`.
pub fn encode(event: &DvsEvent, geometry: &SensorGeometry) -> [u8; 8] {
    let ts = event.timestamp.to_be_bytes();
    let x_field = (geometry.width - event.x) as u8;
    let y_field = (geometry.height - event.y) as u8;
    let pol = event.polarity as u8;

    let (b0, b1, b2, b3) = match geometry.rule {
        aedat_core::DecodeRule::Dvs128 => (0, 0, y_field & 0x7F, ((x_field & 0x7F) << 1) | pol),
        aedat_core::DecodeRule::Davis240 => (
            y_field >> 2,
            ((y_field & 0x03) << 6) | (x_field >> 4),
            ((x_field & 0x0F) << 4) | (pol << 3),
            0,
        ),
    };
    [b0, b1, b2, b3, ts[0], ts[1], ts[2], ts[3]]
}

/// A complete in-memory recording.
pub fn recording(label: &str, geometry: &SensorGeometry, events: &[DvsEvent]) -> Vec<u8> {
    let mut buf = header(label);
    for event in events {
        buf.extend_from_slice(&encode(event, geometry));
    }
    buf
}

/// A small deterministic event stream covering the whole frame.
pub fn sweep(geometry: &SensorGeometry, count: u32, step: u32) -> Vec<DvsEvent> {
    (0..count)
        .map(|i| {
            let x = (i % u32::from(geometry.width)) as u16 + 1;
            let y = ((i * 7) % u32::from(geometry.height)) as u16 + 1;
            DvsEvent::new(x, y, i % 3 != 0, i * step)
        })
        .collect()
}
