//! Output writers for decoded events, window summaries and frames.
//!
//! Supports per-event CSV, per-window CSV (with optional PGM occupancy
//! strings) and PNG frame sequences.

use crate::frame::Frame;
use crate::types::{DvsEvent, SensorGeometry};
use crate::window::{Grid, Window};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output writing.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Which spatial columns an event CSV carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordMode {
    /// No spatial columns
    None,
    /// Separate X and Y columns
    #[default]
    Xy,
    /// One `(y - 1) * width + (x - 1)` column
    PixelNumber,
}

impl std::str::FromStr for CoordMode {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "no-spatial" => Ok(Self::None),
            "xy" | "coords" => Ok(Self::Xy),
            "pixel" | "pixel-number" => Ok(Self::PixelNumber),
            other => Err(OutputError::InvalidFormat(format!(
                "Unknown coordinate mode: {}. Use xy, pixel or none",
                other
            ))),
        }
    }
}

/// Column selection for [`EventCsvWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub include_polarity: bool,
    pub coords: CoordMode,
    /// Subtract the first event's timestamp from every row
    pub offset_time: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            include_polarity: true,
            coords: CoordMode::Xy,
            offset_time: false,
        }
    }
}

/// CSV output writer for decoded events.
pub struct EventCsvWriter<W: Write> {
    writer: BufWriter<W>,
    options: CsvOptions,
    frame_width: u32,
}

impl<W: Write> EventCsvWriter<W> {
    /// Creates a new CSV writer.
    pub fn new(writer: W, geometry: &SensorGeometry, options: CsvOptions) -> Self {
        Self {
            writer: BufWriter::new(writer),
            options,
            frame_width: u32::from(geometry.width),
        }
    }

    /// Writes the column header line.
    pub fn write_header(&mut self) -> Result<(), OutputError> {
        let mut columns = vec!["Timestamp"];
        if self.options.include_polarity {
            columns.push("Polarity");
        }
        match self.options.coords {
            CoordMode::None => {}
            CoordMode::Xy => columns.extend(["X", "Y"]),
            CoordMode::PixelNumber => columns.push("PixelNumber"),
        }
        writeln!(self.writer, "{}", columns.join(","))?;
        Ok(())
    }

    /// Writes a batch of events.
    pub fn write_events(&mut self, events: &[DvsEvent]) -> Result<(), OutputError> {
        let origin = match (self.options.offset_time, events.first()) {
            (true, Some(first)) => first.timestamp,
            _ => 0,
        };
        for event in events {
            self.write_event(event, origin)?;
        }
        Ok(())
    }

    #[inline]
    fn write_event(&mut self, event: &DvsEvent, origin: u32) -> Result<(), OutputError> {
        write!(self.writer, "{}", event.timestamp.wrapping_sub(origin))?;
        if self.options.include_polarity {
            write!(self.writer, ",{}", u8::from(event.polarity))?;
        }
        match self.options.coords {
            CoordMode::None => {}
            CoordMode::Xy => write!(self.writer, ",{},{}", event.x, event.y)?,
            CoordMode::PixelNumber => {
                let row = u32::from(event.y.saturating_sub(1));
                let col = u32::from(event.x.saturating_sub(1));
                write!(self.writer, ",{}", row * self.frame_width + col)?;
            }
        }
        writeln!(self.writer)?;
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Renders a binary occupancy mask as plain-text PGM (P2, maxval 1).
pub fn pgm_string(mask: &Grid<bool>) -> String {
    let mut out = format!("P2\n{} {}\n1\n", mask.width(), mask.height());
    for row in mask.rows() {
        let line: Vec<&str> = row
            .iter()
            .map(|&active| if active { "1" } else { "0" })
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

/// Column selection for [`WindowCsvWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowCsvOptions {
    /// Add an `On + Off` column
    pub include_both: bool,
    /// Add the occupancy mask as a single-line PGM string
    pub include_pgm: bool,
}

/// CSV writer producing one row per window.
pub struct WindowCsvWriter<W: Write> {
    writer: BufWriter<W>,
    options: WindowCsvOptions,
}

impl<W: Write> WindowCsvWriter<W> {
    pub fn new(writer: W, options: WindowCsvOptions) -> Self {
        Self {
            writer: BufWriter::new(writer),
            options,
        }
    }

    /// Writes the column header line.
    pub fn write_header(&mut self) -> Result<(), OutputError> {
        let mut columns = vec!["On", "Off"];
        if self.options.include_both {
            columns.push("Both");
        }
        if self.options.include_pgm {
            columns.push("PGM_String");
        }
        writeln!(self.writer, "{}", columns.join(","))?;
        Ok(())
    }

    /// Writes one window row.
    ///
    /// The PGM string has its newlines replaced by `-` so it fits in one cell.
    pub fn write_window(&mut self, window: &Window) -> Result<(), OutputError> {
        write!(self.writer, "{},{}", window.on_count, window.off_count)?;
        if self.options.include_both {
            write!(self.writer, ",{}", window.event_count())?;
        }
        if self.options.include_pgm {
            let occupancy = window.occupancy.as_ref().ok_or_else(|| {
                OutputError::InvalidFormat(
                    "PGM column requested but window has no occupancy grid".to_string(),
                )
            })?;
            write!(self.writer, ",{}", pgm_string(&occupancy.mask).replace('\n', "-"))?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Encodes a frame as an RGB PNG.
pub fn write_frame_png<P: AsRef<Path>>(path: P, frame: &Frame) -> Result<(), OutputError> {
    let image = image::RgbImage::from_raw(
        u32::from(frame.width),
        u32::from(frame.height),
        frame.to_rgb_bytes(),
    )
    .ok_or_else(|| OutputError::InvalidFormat("frame buffer size mismatch".to_string()))?;
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// File name used for frame `index` of a sequence (1-based on disk).
pub fn frame_path(dir: &Path, stem: &str, index: u32) -> PathBuf {
    dir.join(format!("{}_frame{:06}.png", stem, index + 1))
}

/// Writes every frame as `{stem}_frameNNNNNN.png` into `dir`.
///
/// Creates `dir` if needed. Returns the number of frames written.
pub fn write_frame_sequence<I>(dir: &Path, stem: &str, frames: I) -> Result<u32, OutputError>
where
    I: IntoIterator<Item = Frame>,
{
    fs::create_dir_all(dir)?;
    let mut written = 0;
    for frame in frames {
        write_frame_png(frame_path(dir, stem, frame.index), &frame)?;
        written += 1;
    }
    Ok(written)
}

/// Writes events to a CSV file.
pub fn write_csv<P: AsRef<Path>>(
    path: P,
    events: &[DvsEvent],
    geometry: &SensorGeometry,
    options: CsvOptions,
) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = EventCsvWriter::new(file, geometry, options);
    writer.write_header()?;
    writer.write_events(events)?;
    writer.flush()?;
    Ok(())
}

/// Writes window summaries to a CSV file. Returns the number of rows written.
pub fn write_window_csv<P, I>(
    path: P,
    windows: I,
    options: WindowCsvOptions,
) -> Result<u32, OutputError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Window>,
{
    let file = File::create(path)?;
    let mut writer = WindowCsvWriter::new(file, options);
    writer.write_header()?;
    let mut rows = 0;
    for window in windows {
        writer.write_window(&window)?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}
