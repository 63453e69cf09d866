//! Integration tests for the AEDAT decoder using synthetic recordings.
//!
//! Run with: cargo test --test integration_tests

mod common;

use aedat_core::output::{self, WindowCsvOptions};
use aedat_core::{
    AedatDecoder, CsvOptions, DecodeError, DvsEvent, FrameConfig, Frames, SensorGeometry,
    WindowError, WindowMode, Windows, WindowingConfig,
};
use std::fs;

/// Decoding a file written to disk returns the events that were encoded.
#[test]
fn test_decode_file_roundtrip_davis240() {
    let geometry = SensorGeometry::DAVIS240;
    let events = common::sweep(&geometry, 1_000, 3);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("davis.aedat");
    fs::write(&path, common::recording("DAVIS240C", &geometry, &events)).unwrap();

    let result = AedatDecoder::new()
        .decode_file(&path)
        .expect("Failed to decode file");

    assert_eq!(result.geometry, geometry);
    assert_eq!(result.header.format_version.as_deref(), Some("2.0"));
    assert_eq!(result.trailing_bytes, 0);
    assert_eq!(result.events, events);
}

/// All decoded coordinates fall inside the sensor frame.
#[test]
fn test_coordinates_in_bounds() {
    let geometry = SensorGeometry::DVS128;
    let buf = common::recording("DVS128", &geometry, &common::sweep(&geometry, 5_000, 1));
    let result = AedatDecoder::new().decode_bytes(&buf).unwrap();

    for (i, event) in result.events.iter().enumerate() {
        assert!(
            (1..=geometry.width).contains(&event.x),
            "Event {} x={} outside 1..={}",
            i,
            event.x,
            geometry.width
        );
        assert!(
            (1..=geometry.height).contains(&event.y),
            "Event {} y={} outside 1..={}",
            i,
            event.y,
            geometry.height
        );
    }
}

/// Out-of-frame coordinates fail instead of being clamped.
#[test]
fn test_geometry_mismatch_is_an_error() {
    // DVS128 fields are 7 bits wide, so any record is in range for DVS128.
    let mut buf = common::header("DVS128");
    buf.extend_from_slice(&[0xFF; 8]);
    let result = AedatDecoder::new().decode_bytes(&buf).unwrap();
    assert_eq!(result.events, vec![DvsEvent::new(1, 1, true, u32::MAX)]);

    let mut buf = common::header("DAVIS240");
    // y field 0xFF can never be valid on a 180-row sensor
    buf.extend_from_slice(&[0x3F, 0xC0, 0x00, 0x00, 0, 0, 0, 1]);
    match AedatDecoder::new().decode_bytes(&buf) {
        Err(DecodeError::Geometry { index, source }) => {
            assert_eq!(index, 0);
            assert_eq!(source.height, 180);
        }
        other => panic!("expected Geometry error, got {:?}", other),
    }
}

/// Missing or unknown sensor labels are reported distinctly.
#[test]
fn test_header_failures() {
    let decoder = AedatDecoder::new();

    let no_label = b"#!AER-DAT2.0\r\n#End Of ASCII Header\r\n\0\0\0\0\0\0\0\0";
    assert!(matches!(
        decoder.decode_bytes(no_label),
        Err(DecodeError::SensorLabelNotFound)
    ));

    let unknown = common::header("Prophesee EVK4");
    assert!(matches!(
        decoder.decode_bytes(&unknown),
        Err(DecodeError::UnrecognizedSensor(_))
    ));

    let no_end = b"# HardwareInterface: DVS128\r\n";
    assert!(matches!(
        decoder.decode_bytes(no_end),
        Err(DecodeError::HeaderNotFound)
    ));
}

/// Trailing bytes that do not form a whole record are dropped.
#[test]
fn test_trailing_partial_record() {
    let geometry = SensorGeometry::DVS128;
    let mut buf = common::recording("DVS128", &geometry, &common::sweep(&geometry, 4, 10));
    buf.extend_from_slice(&[1, 2, 3]);

    let result = AedatDecoder::new().decode_bytes(&buf).unwrap();
    assert_eq!(result.events.len(), 4);
    assert_eq!(result.trailing_bytes, 3);
}

/// Example: spans of 100us over [100, 150, 250, 260, 400].
#[test]
fn test_time_windows_end_to_end() {
    let geometry = SensorGeometry::DVS128;
    let events: Vec<DvsEvent> = [100, 150, 250, 260, 400]
        .iter()
        .map(|&t| DvsEvent::new(5, 5, true, t))
        .collect();
    let buf = common::recording("DVS128", &geometry, &events);
    let result = AedatDecoder::new().decode_bytes(&buf).unwrap();

    let config = WindowingConfig::new(WindowMode::TimeBased { span: 100 });
    let members: Vec<(u32, u32, u64)> = Windows::new(&result.events, &result.geometry, config)
        .unwrap()
        .map(|w| (w.first_timestamp, w.last_timestamp, w.on_count))
        .collect();

    assert_eq!(members, vec![(100, 150, 2), (250, 260, 2), (400, 400, 1)]);
}

/// Windowing an empty recording is an error.
#[test]
fn test_empty_recording_windowing() {
    let buf = common::header("DVS128");
    let result = AedatDecoder::new().decode_bytes(&buf).unwrap();
    assert!(result.events.is_empty());

    let config = WindowingConfig::default();
    assert_eq!(
        Windows::new(&result.events, &result.geometry, config).unwrap_err(),
        WindowError::EmptyInput
    );
    assert_eq!(
        Frames::new(&result.events, &result.geometry, FrameConfig::default()).unwrap_err(),
        WindowError::EmptyInput
    );
}

/// Full pipeline to event CSV, window CSV and PNG frames on disk.
#[test]
fn test_outputs_on_disk() {
    let geometry = SensorGeometry::DVS128;
    let events = common::sweep(&geometry, 300, 10);
    let dir = tempfile::tempdir().unwrap();

    let csv_path = dir.path().join("events.csv");
    output::write_csv(&csv_path, &events, &geometry, CsvOptions::default()).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 301);
    assert_eq!(csv.lines().next(), Some("Timestamp,Polarity,X,Y"));

    let window_path = dir.path().join("windows.csv");
    let config = WindowingConfig {
        mode: WindowMode::EventCount { count: 100 },
        max_windows: Some(2),
        track_occupancy: true,
        downsample_scale: 16,
        occupancy_threshold: 1,
    };
    let rows = output::write_window_csv(
        &window_path,
        Windows::new(&events, &geometry, config).unwrap(),
        WindowCsvOptions {
            include_both: true,
            include_pgm: true,
        },
    )
    .unwrap();
    assert_eq!(rows, 2);
    let windows_csv = fs::read_to_string(&window_path).unwrap();
    for line in windows_csv.lines().skip(1) {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[2], "100");
        assert!(fields[3].starts_with("P2-8 8-1-"));
    }

    let frames_dir = dir.path().join("frames");
    let frames = Frames::new(
        &events,
        &geometry,
        FrameConfig::new(WindowMode::TimeBased { span: 999 }),
    )
    .unwrap();
    let written = output::write_frame_sequence(&frames_dir, "sweep", frames).unwrap();
    // timestamps 0..2990 in steps of 10, windows of 1000us: [0,999] [1000,1999] [2000,2990]
    assert_eq!(written, 3);
    assert_eq!(fs::read_dir(&frames_dir).unwrap().count(), 3);
}
