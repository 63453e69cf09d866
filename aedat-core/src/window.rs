//! Event windowing.
//!
//! Partitions an ordered event sequence into windows, either by elapsed
//! timestamp span or by a fixed event count, and summarizes each window as
//! ON/OFF tallies plus an optional downsampled occupancy grid.
//!
//! Window boundary rules (shared with [`crate::frame`]):
//!
//! - Time-based: a window opened by an event with timestamp `t0` admits every
//!   following event with `timestamp <= t0 + span`.
//! - Count-based: a window admits events while it holds fewer than `count`.
//!
//! The first event that is not admitted seals the window and becomes the first
//! member of the next one. Events are assumed to be in timestamp order; on
//! out-of-order input windows are still contiguous but spans are best-effort.

use crate::types::{DvsEvent, SensorGeometry};
use thiserror::Error;

/// Errors raised when windowing cannot start.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("No events to window")]
    EmptyInput,

    #[error("Invalid windowing configuration: {0}")]
    InvalidConfig(String),
}

/// How window boundaries are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WindowMode {
    /// Windows cover `span` microseconds from their first event
    TimeBased { span: u32 },
    /// Windows hold exactly `count` events (the last may hold fewer)
    EventCount { count: u32 },
}

impl WindowMode {
    pub(crate) fn validate(&self) -> Result<(), WindowError> {
        match *self {
            WindowMode::EventCount { count: 0 } => Err(WindowError::InvalidConfig(
                "event count per window must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Configuration for [`Windows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WindowingConfig {
    pub mode: WindowMode,
    /// Stop after this many windows; `None` = unbounded
    pub max_windows: Option<u32>,
    /// Build a downsampled occupancy grid per window
    pub track_occupancy: bool,
    /// Side length, in pixels, of one occupancy cell
    pub downsample_scale: u32,
    /// Minimum hits for a cell to count as active
    pub occupancy_threshold: u32,
}

impl Default for WindowingConfig {
    fn default() -> Self {
        Self {
            mode: WindowMode::TimeBased { span: 10_000 },
            max_windows: None,
            track_occupancy: false,
            downsample_scale: 1,
            occupancy_threshold: 0,
        }
    }
}

impl WindowingConfig {
    /// Creates a configuration for the given mode with default options.
    pub fn new(mode: WindowMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Checks that the configuration can drive a windowing pass.
    pub fn validate(&self) -> Result<(), WindowError> {
        self.mode.validate()?;
        if self.downsample_scale == 0 {
            return Err(WindowError::InvalidConfig(
                "downsample scale must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cell values that can be reduced to an active/inactive flag.
pub trait Threshold: Copy {
    fn is_active(self, threshold: u32) -> bool;
}

impl Threshold for u32 {
    #[inline]
    fn is_active(self, threshold: u32) -> bool {
        self >= threshold
    }
}

impl Threshold for bool {
    /// An already-binarized cell keeps its state.
    #[inline]
    fn is_active(self, _threshold: u32) -> bool {
        self
    }
}

/// A dense 2D grid stored row-major in a flat buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> Grid<T> {
    /// Creates a grid filled with `T::default()`.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![T::default(); width * height],
        }
    }

    /// Creates a grid covering a sensor frame downsampled by `scale`.
    ///
    /// Partial cells at the right and bottom edges are kept, so the grid is
    /// `ceil(width / scale) x ceil(height / scale)`.
    pub fn downsampled(geometry: &SensorGeometry, scale: u32) -> Self {
        let scale = scale.max(1) as usize;
        Self::new(
            (geometry.width as usize).div_ceil(scale),
            (geometry.height as usize).div_ceil(scale),
        )
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Flat buffer index of `(row, col)`, or `None` if out of bounds.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.height && col < self.width).then(|| row * self.width + col)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.index(row, col).map(|i| self.cells[i])
    }

    #[inline]
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        let i = self.index(row, col)?;
        Some(&mut self.cells[i])
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Iterates over the rows of the grid.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks(0) panics; an empty grid simply has no rows
        self.cells.chunks(self.width.max(1)).take(self.height)
    }

    /// Sets every cell back to `T::default()` without reallocating.
    pub fn reset(&mut self) {
        self.cells.fill(T::default());
    }
}

impl<T: Threshold + Default> Grid<T> {
    /// Binarizes the grid: a cell is active if it meets `threshold`.
    ///
    /// Thresholding an already-binarized grid returns it unchanged.
    pub fn threshold(&self, threshold: u32) -> Grid<bool> {
        Grid {
            width: self.width,
            height: self.height,
            cells: self
                .cells
                .iter()
                .map(|&cell| cell.is_active(threshold))
                .collect(),
        }
    }
}

impl Grid<u32> {
    /// Adds one hit to `(row, col)`. Returns `false` if the cell does not exist.
    #[inline]
    pub fn increment(&mut self, row: usize, col: usize) -> bool {
        match self.get_mut(row, col) {
            Some(cell) => {
                *cell += 1;
                true
            }
            None => false,
        }
    }

    /// Total number of hits over all cells.
    pub fn total(&self) -> u64 {
        self.cells.iter().map(|&c| u64::from(c)).sum()
    }
}

/// Downsampled hit counts of one window plus their thresholded mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupancy {
    pub counts: Grid<u32>,
    pub mask: Grid<bool>,
    pub threshold: u32,
}

/// A sealed window summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Zero-based position of this window in the output sequence
    pub index: u32,
    /// Timestamp of the window's first event
    pub first_timestamp: u32,
    /// Timestamp of the window's last event
    pub last_timestamp: u32,
    pub on_count: u64,
    pub off_count: u64,
    pub occupancy: Option<Occupancy>,
}

impl Window {
    /// Total number of events in the window.
    #[inline]
    pub fn event_count(&self) -> u64 {
        self.on_count + self.off_count
    }
}

/// Tracks the boundary of the currently open window.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WindowBoundary {
    mode: WindowMode,
    /// Inclusive end timestamp (time-based windows)
    end_timestamp: u64,
    /// Events admitted so far
    tally: u32,
}

impl WindowBoundary {
    /// Opens a window whose first member is `first`.
    pub(crate) fn open(mode: WindowMode, first: &DvsEvent) -> Self {
        let end_timestamp = match mode {
            WindowMode::TimeBased { span } => u64::from(first.timestamp) + u64::from(span),
            WindowMode::EventCount { .. } => 0,
        };
        Self {
            mode,
            end_timestamp,
            tally: 1,
        }
    }

    /// Whether `event` belongs to the open window. Admitted events are tallied.
    pub(crate) fn admit(&mut self, event: &DvsEvent) -> bool {
        let admitted = match self.mode {
            WindowMode::TimeBased { .. } => u64::from(event.timestamp) <= self.end_timestamp,
            WindowMode::EventCount { count } => self.tally < count,
        };
        if admitted {
            self.tally += 1;
        }
        admitted
    }
}

/// Shared driver for the window iterators: walks the events, calls `add` for
/// every member and reports where each window ends.
#[derive(Debug, Clone)]
pub(crate) struct WindowCursor<'a> {
    events: &'a [DvsEvent],
    position: usize,
    mode: WindowMode,
    remaining: Option<u32>,
}

impl<'a> WindowCursor<'a> {
    pub(crate) fn new(
        events: &'a [DvsEvent],
        mode: WindowMode,
        max_windows: Option<u32>,
    ) -> Result<Self, WindowError> {
        if events.is_empty() {
            return Err(WindowError::EmptyInput);
        }
        mode.validate()?;
        Ok(Self {
            events,
            position: 0,
            mode,
            remaining: max_windows,
        })
    }

    /// Feeds the next window's members to `add`. Returns the member slice, or
    /// `None` once the input or the window budget is exhausted.
    pub(crate) fn next_window<F>(&mut self, mut add: F) -> Option<&'a [DvsEvent]>
    where
        F: FnMut(&DvsEvent),
    {
        if self.remaining == Some(0) {
            return None;
        }
        let start = self.position;
        let first = self.events.get(start)?;

        let mut boundary = WindowBoundary::open(self.mode, first);
        add(first);
        let mut end = start + 1;
        while let Some(event) = self.events.get(end) {
            if !boundary.admit(event) {
                break;
            }
            add(event);
            end += 1;
        }

        self.position = end;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        Some(&self.events[start..end])
    }
}

/// Lazy iterator of sealed [`Window`]s over a decoded event slice.
///
/// Finite and non-restartable. The occupancy accumulation buffer belongs to
/// the iterator and is reset each time a window is sealed.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    cursor: WindowCursor<'a>,
    config: WindowingConfig,
    counts: Option<Grid<u32>>,
    sealed: u32,
}

impl<'a> Windows<'a> {
    /// Starts a windowing pass.
    ///
    /// Fails with [`WindowError::EmptyInput`] if `events` is empty.
    pub fn new(
        events: &'a [DvsEvent],
        geometry: &SensorGeometry,
        config: WindowingConfig,
    ) -> Result<Self, WindowError> {
        config.validate()?;
        let cursor = WindowCursor::new(events, config.mode, config.max_windows)?;
        let counts = config
            .track_occupancy
            .then(|| Grid::downsampled(geometry, config.downsample_scale));

        Ok(Self {
            cursor,
            config,
            counts,
            sealed: 0,
        })
    }
}

impl Iterator for Windows<'_> {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        let scale = self.config.downsample_scale as usize;
        let mut on_count = 0u64;
        let mut off_count = 0u64;
        let counts = &mut self.counts;

        let members = self.cursor.next_window(|event| {
            if event.polarity {
                on_count += 1;
            } else {
                off_count += 1;
            }
            if let Some(grid) = counts.as_mut() {
                let row = usize::from(event.y.saturating_sub(1)) / scale;
                let col = usize::from(event.x.saturating_sub(1)) / scale;
                grid.increment(row, col);
            }
        })?;

        let occupancy = self.counts.as_mut().map(|grid| {
            let sealed = Occupancy {
                counts: grid.clone(),
                mask: grid.threshold(self.config.occupancy_threshold),
                threshold: self.config.occupancy_threshold,
            };
            grid.reset();
            sealed
        });

        let window = Window {
            index: self.sealed,
            first_timestamp: members[0].timestamp,
            last_timestamp: members[members.len() - 1].timestamp,
            on_count,
            off_count,
            occupancy,
        };
        self.sealed += 1;
        Some(window)
    }
}
