//! Full-resolution frame reconstruction.
//!
//! Uses the same window boundaries as [`crate::window`], but paints every
//! in-window event into an RGB frame instead of tallying it.

use crate::types::{DvsEvent, SensorGeometry};
use crate::window::{WindowCursor, WindowError, WindowMode};

/// An RGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BACKGROUND: Rgb = Rgb([0, 0, 0]);
    /// Colour of ON events.
    pub const ON: Rgb = Rgb([0, 255, 0]);
    /// Colour of OFF events.
    pub const OFF: Rgb = Rgb([255, 0, 0]);
}

/// Configuration for [`Frames`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FrameConfig {
    pub mode: WindowMode,
    /// Stop after this many frames; `None` = unbounded
    pub max_frames: Option<u32>,
    /// Do not paint ON events (they still count toward window boundaries)
    pub exclude_on: bool,
    /// Do not paint OFF events (they still count toward window boundaries)
    pub exclude_off: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            mode: WindowMode::TimeBased { span: 33_333 },
            max_frames: None,
            exclude_on: false,
            exclude_off: false,
        }
    }
}

impl FrameConfig {
    /// Creates a configuration for the given mode with default options.
    pub fn new(mode: WindowMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), WindowError> {
        self.mode.validate()
    }

    #[inline]
    fn paints(&self, event: &DvsEvent) -> bool {
        if event.polarity {
            !self.exclude_on
        } else {
            !self.exclude_off
        }
    }
}

/// One reconstructed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Zero-based position of this frame in the output sequence
    pub index: u32,
    pub width: u16,
    pub height: u16,
    /// Row-major pixels, `height * width` entries
    pub pixels: Vec<Rgb>,
    pub first_timestamp: u32,
    pub last_timestamp: u32,
    /// Events that fell in the window, painted or not
    pub event_count: usize,
}

impl Frame {
    /// Creates a frame filled with the background colour.
    pub fn blank(geometry: &SensorGeometry) -> Self {
        Self {
            index: 0,
            width: geometry.width,
            height: geometry.height,
            pixels: vec![Rgb::BACKGROUND; geometry.pixel_count()],
            first_timestamp: 0,
            last_timestamp: 0,
            event_count: 0,
        }
    }

    /// Pixel at 1-based `(x, y)`.
    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb> {
        self.pixel_index(x, y).map(|i| self.pixels[i])
    }

    /// Paints 1-based `(x, y)`. Returns `false` if the pixel is outside the frame.
    pub fn paint(&mut self, x: u16, y: u16, color: Rgb) -> bool {
        match self.pixel_index(x, y) {
            Some(i) => {
                self.pixels[i] = color;
                true
            }
            None => false,
        }
    }

    /// Resets every pixel to the background colour.
    pub fn reset(&mut self) {
        self.pixels.fill(Rgb::BACKGROUND);
        self.event_count = 0;
    }

    /// Pixels flattened to `[r, g, b, r, g, b, ...]`.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.0).collect()
    }

    fn pixel_index(&self, x: u16, y: u16) -> Option<usize> {
        if (1..=self.width).contains(&x) && (1..=self.height).contains(&y) {
            Some((y as usize - 1) * self.width as usize + (x as usize - 1))
        } else {
            None
        }
    }
}

/// Lazy iterator of reconstructed [`Frame`]s.
///
/// A single frame buffer is painted, emitted and reset for each window;
/// nothing carries over from one frame to the next.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    cursor: WindowCursor<'a>,
    config: FrameConfig,
    buffer: Frame,
    produced: u32,
}

impl<'a> Frames<'a> {
    /// Starts a reconstruction pass.
    ///
    /// Fails with [`WindowError::EmptyInput`] if `events` is empty.
    pub fn new(
        events: &'a [DvsEvent],
        geometry: &SensorGeometry,
        config: FrameConfig,
    ) -> Result<Self, WindowError> {
        let cursor = WindowCursor::new(events, config.mode, config.max_frames)?;
        Ok(Self {
            cursor,
            config,
            buffer: Frame::blank(geometry),
            produced: 0,
        })
    }
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let config = self.config;
        let buffer = &mut self.buffer;

        let members = self.cursor.next_window(|event| {
            if config.paints(event) {
                let color = if event.polarity { Rgb::ON } else { Rgb::OFF };
                buffer.paint(event.x, event.y, color);
            }
        })?;

        self.buffer.index = self.produced;
        self.buffer.first_timestamp = members[0].timestamp;
        self.buffer.last_timestamp = members[members.len() - 1].timestamp;
        self.buffer.event_count = members.len();

        let frame = self.buffer.clone();
        self.buffer.reset();
        self.produced += 1;
        Some(frame)
    }
}
