//! Property tests for record decoding and windowing.

mod common;

use aedat_core::{
    DvsEvent, Event, FrameConfig, Frames, Grid, SensorGeometry, WindowMode, Windows,
    WindowingConfig,
};
use proptest::prelude::*;

fn sensor() -> impl Strategy<Value = SensorGeometry> {
    prop_oneof![Just(SensorGeometry::DVS128), Just(SensorGeometry::DAVIS240)]
}

/// Sorted event streams with valid DVS128 coordinates.
fn sorted_events(max_len: usize) -> impl Strategy<Value = Vec<DvsEvent>> {
    prop::collection::vec((1u16..=128, 1u16..=128, any::<bool>(), 0u32..1_000_000), 1..max_len)
        .prop_map(|mut raw| {
            raw.sort_by_key(|&(_, _, _, t)| t);
            raw.into_iter()
                .map(|(x, y, p, t)| DvsEvent::new(x, y, p, t))
                .collect()
        })
}

proptest! {
    #[test]
    fn timestamp_is_big_endian_bytes_4_to_7(raw in any::<[u8; 8]>()) {
        let event = Event::new(raw);
        let expected = u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]);
        prop_assert_eq!(event.timestamp(), expected);

        // Changing the address bytes never changes the timestamp.
        let mut other = raw;
        other[..4].copy_from_slice(&[!raw[0], !raw[1], !raw[2], !raw[3]]);
        prop_assert_eq!(Event::new(other).timestamp(), expected);
    }

    #[test]
    fn coords_are_in_frame_or_rejected(raw in any::<[u8; 8]>(), geometry in sensor()) {
        match Event::new(raw).coords(&geometry) {
            Ok((x, y)) => {
                prop_assert!((1..=geometry.width).contains(&x));
                prop_assert!((1..=geometry.height).contains(&y));
            }
            Err(err) => {
                let x_bad = !(1..=i32::from(geometry.width)).contains(&err.x);
                let y_bad = !(1..=i32::from(geometry.height)).contains(&err.y);
                prop_assert!(x_bad || y_bad);
            }
        }
    }

    #[test]
    fn encoded_events_decode_back(
        geometry in sensor(),
        fx in 0u16..240,
        fy in 0u16..180,
        polarity in any::<bool>(),
        timestamp in any::<u32>(),
    ) {
        let x = geometry.width - fx % geometry.width;
        let y = geometry.height - fy % geometry.height;
        let event = DvsEvent::new(x, y, polarity, timestamp);
        let raw = common::encode(&event, &geometry);
        prop_assert_eq!(Event::new(raw).decode(&geometry).unwrap(), event);
    }

    #[test]
    fn time_windows_are_contiguous_and_bounded(
        events in sorted_events(200),
        span in 0u32..50_000,
    ) {
        let config = WindowingConfig::new(WindowMode::TimeBased { span });
        let windows: Vec<_> = Windows::new(&events, &SensorGeometry::DVS128, config)
            .unwrap()
            .collect();

        let mut position = 0usize;
        for window in &windows {
            let count = window.event_count() as usize;
            let members = &events[position..position + count];
            prop_assert_eq!(members[0].timestamp, window.first_timestamp);
            for event in members {
                prop_assert!(event.timestamp >= window.first_timestamp);
                prop_assert!(
                    u64::from(event.timestamp) <= u64::from(window.first_timestamp) + u64::from(span)
                );
            }
            position += count;
            // The next window starts with the first event past the boundary.
            if let Some(next) = events.get(position) {
                prop_assert!(
                    u64::from(next.timestamp) > u64::from(window.first_timestamp) + u64::from(span)
                );
            }
        }
        prop_assert_eq!(position, events.len());
    }

    #[test]
    fn count_windows_are_full_except_last(events in sorted_events(300), count in 1u32..50) {
        let config = WindowingConfig::new(WindowMode::EventCount { count });
        let sizes: Vec<u64> = Windows::new(&events, &SensorGeometry::DVS128, config)
            .unwrap()
            .map(|w| w.event_count())
            .collect();

        let (last, rest) = sizes.split_last().unwrap();
        prop_assert!(rest.iter().all(|&n| n == u64::from(count)));
        prop_assert!(*last >= 1 && *last <= u64::from(count));
        prop_assert_eq!(sizes.iter().sum::<u64>(), events.len() as u64);
    }

    #[test]
    fn window_and_frame_caps_hold(
        events in sorted_events(100),
        count in 1u32..5,
        cap in 0u32..10,
    ) {
        let mode = WindowMode::EventCount { count };
        let mut config = WindowingConfig::new(mode);
        config.max_windows = Some(cap);
        let windows = Windows::new(&events, &SensorGeometry::DVS128, config).unwrap();
        prop_assert!(windows.count() <= cap as usize);

        let mut frame_config = FrameConfig::new(mode);
        frame_config.max_frames = Some(cap);
        let frames = Frames::new(&events, &SensorGeometry::DVS128, frame_config).unwrap();
        prop_assert!(frames.count() <= cap as usize);
    }

    #[test]
    fn occupancy_counts_every_event(
        events in sorted_events(200),
        scale in 1u32..40,
        threshold in 0u32..4,
    ) {
        let config = WindowingConfig {
            mode: WindowMode::EventCount { count: 50 },
            max_windows: None,
            track_occupancy: true,
            downsample_scale: scale,
            occupancy_threshold: threshold,
        };
        for window in Windows::new(&events, &SensorGeometry::DVS128, config).unwrap() {
            let members = window.event_count();
            let occupancy = window.occupancy.unwrap();
            prop_assert_eq!(occupancy.counts.total(), members);
            prop_assert_eq!(occupancy.mask.threshold(threshold), occupancy.mask.clone());
        }
    }

    #[test]
    fn thresholding_is_idempotent(
        cells in prop::collection::vec(0u32..10, 12),
        threshold in 0u32..12,
    ) {
        let mut grid: Grid<u32> = Grid::new(4, 3);
        for (i, &hits) in cells.iter().enumerate() {
            for _ in 0..hits {
                grid.increment(i / 4, i % 4);
            }
        }
        let once = grid.threshold(threshold);
        prop_assert_eq!(once.threshold(threshold), once);
    }
}
