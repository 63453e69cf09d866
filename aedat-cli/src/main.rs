//! AEDAT converter CLI application.
//!
//! Decodes DVS128 / DAVIS240 AEDAT recordings to event CSV, per-window
//! summary CSV, or PNG frame sequences.

mod config;

use aedat_core::output::{self, WindowCsvOptions};
use aedat_core::{
    AedatDecoder, CoordMode, CsvOptions, DecodeResult, FrameConfig, Frames, WindowMode, Windows,
    WindowingConfig,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use config::ConverterConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// AEDAT recording converter for DVS128 and DAVIS240 event cameras.
#[derive(Parser, Debug)]
#[command(name = "aedat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TOML file with [windows] / [frames] settings
    ///
    /// Command-line flags override values from the file.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show sensor, header and timing information about a recording
    Info {
        /// Input .aedat file
        input: PathBuf,
    },

    /// Write one CSV row per event
    Csv {
        /// Input .aedat file
        input: PathBuf,

        /// Output .csv file
        output: PathBuf,

        /// Include a Polarity column
        #[arg(short, long)]
        polarity: bool,

        /// Spatial columns: xy, pixel (pixel number) or none
        #[arg(long, default_value = "xy")]
        coords: CoordMode,

        /// Offset timestamps so the first event is at zero
        #[arg(long)]
        offset_time: bool,
    },

    /// Write one CSV row of ON/OFF counts per window
    Windows {
        /// Input .aedat file
        input: PathBuf,

        /// Output .csv file
        output: PathBuf,

        #[command(flatten)]
        mode: ModeArgs,

        /// Maximum number of windows to write
        #[arg(long)]
        max_windows: Option<u32>,

        /// Include a Both (ON + OFF) column
        #[arg(long)]
        include_both: bool,

        /// Include the thresholded occupancy image as a PGM string
        #[arg(long)]
        include_pgm: bool,

        /// Downsampling factor of the occupancy image
        #[arg(long)]
        pgm_scale: Option<u32>,

        /// Minimum hits for an occupancy cell to be set
        #[arg(long)]
        pgm_threshold: Option<u32>,
    },

    /// Reconstruct one PNG frame per window
    Frames {
        /// Input .aedat file
        input: PathBuf,

        /// Directory the frames are written to
        output: PathBuf,

        #[command(flatten)]
        mode: ModeArgs,

        /// Maximum number of frames to write
        #[arg(long)]
        max_frames: Option<u32>,

        /// Do not paint ON events
        #[arg(long)]
        exclude_on: bool,

        /// Do not paint OFF events
        #[arg(long)]
        exclude_off: bool,
    },
}

/// Window boundary selection.
#[derive(Args, Debug)]
#[group(multiple = false)]
struct ModeArgs {
    /// Window length in microseconds
    #[arg(long, value_name = "MICROS")]
    span: Option<u32>,

    /// Events per window
    #[arg(long, value_name = "EVENTS")]
    count: Option<u32>,
}

impl ModeArgs {
    fn resolve(&self, from_file: Option<WindowMode>) -> Result<WindowMode> {
        match (self.span, self.count, from_file) {
            (Some(span), _, _) => Ok(WindowMode::TimeBased { span }),
            (None, Some(count), _) => Ok(WindowMode::EventCount { count }),
            (None, None, Some(mode)) => Ok(mode),
            (None, None, None) => bail!("one of --span or --count is required"),
        }
    }
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn spinner(quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    Ok(pb)
}

fn decode(input: &Path, progress: &ProgressBar) -> Result<DecodeResult> {
    progress.set_message(format!(
        "Decoding {:?}...",
        input.file_name().unwrap_or_default()
    ));

    let result = AedatDecoder::new()
        .decode_file(input)
        .with_context(|| format!("Failed to decode AEDAT file {:?}", input))?;

    debug!(
        sensor = result.geometry.name(),
        data_offset = result.header.data_offset,
        version = ?result.header.format_version,
        "parsed header"
    );
    if result.trailing_bytes > 0 {
        warn!(
            bytes = result.trailing_bytes,
            "ignoring trailing partial event record"
        );
    }
    Ok(result)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frames".to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let file_config = match &cli.config {
        Some(path) => ConverterConfig::load(path)?,
        None => ConverterConfig::default(),
    };

    let progress = spinner(cli.quiet)?;
    let start_time = Instant::now();

    let (input, output, result, written, unit) = match &cli.command {
        Command::Info { input } => {
            let result = decode(input, &progress)?;
            progress.finish_and_clear();
            print_info(input, &result);
            return Ok(());
        }

        Command::Csv {
            input,
            output,
            polarity,
            coords,
            offset_time,
        } => {
            let result = decode(input, &progress)?;
            let options = CsvOptions {
                include_polarity: *polarity,
                coords: *coords,
                offset_time: *offset_time,
            };
            progress.set_message(format!(
                "Writing to {:?}...",
                output.file_name().unwrap_or_default()
            ));
            output::write_csv(output, &result.events, &result.geometry, options)
                .context("Failed to write CSV output")?;
            let rows = result.events.len();
            (input, output, result, rows, "events")
        }

        Command::Windows {
            input,
            output,
            mode,
            max_windows,
            include_both,
            include_pgm,
            pgm_scale,
            pgm_threshold,
        } => {
            let base = file_config.windows.unwrap_or_default();
            let config = WindowingConfig {
                mode: mode.resolve(file_config.windows.map(|w| w.mode))?,
                max_windows: max_windows.or(base.max_windows),
                track_occupancy: *include_pgm || base.track_occupancy,
                downsample_scale: pgm_scale.unwrap_or(base.downsample_scale),
                occupancy_threshold: pgm_threshold.unwrap_or(base.occupancy_threshold),
            };
            config.validate().context("Invalid window settings")?;
            debug!(?config, "windowing");

            let result = decode(input, &progress)?;
            let windows = Windows::new(&result.events, &result.geometry, config)
                .context("Failed to window events")?;

            progress.set_message(format!(
                "Writing to {:?}...",
                output.file_name().unwrap_or_default()
            ));
            let options = WindowCsvOptions {
                include_both: *include_both,
                include_pgm: *include_pgm,
            };
            let rows = output::write_window_csv(output, windows, options)
                .context("Failed to write window CSV")?;
            (input, output, result, rows as usize, "windows")
        }

        Command::Frames {
            input,
            output,
            mode,
            max_frames,
            exclude_on,
            exclude_off,
        } => {
            let base = file_config.frames.unwrap_or_default();
            let config = FrameConfig {
                mode: mode.resolve(file_config.frames.map(|f| f.mode))?,
                max_frames: max_frames.or(base.max_frames),
                exclude_on: *exclude_on || base.exclude_on,
                exclude_off: *exclude_off || base.exclude_off,
            };
            config.validate().context("Invalid frame settings")?;
            debug!(?config, "frame reconstruction");

            let result = decode(input, &progress)?;
            let frames = Frames::new(&result.events, &result.geometry, config)
                .context("Failed to reconstruct frames")?;

            progress.set_message(format!("Writing frames to {:?}...", output));
            let count = output::write_frame_sequence(output, &file_stem(input), frames)
                .context("Failed to write frames")?;
            (input, output, result, count as usize, "frames")
        }
    };

    let total_duration = start_time.elapsed();
    progress.finish_with_message(format!(
        "Done! Wrote {} {} in {:.2}s (sensor: {})",
        written,
        unit,
        total_duration.as_secs_f64(),
        result.geometry.name()
    ));
    info!(count = written, unit, output = ?output, "conversion finished");

    if !cli.quiet {
        let events_per_sec = result.events.len() as f64 / total_duration.as_secs_f64();
        eprintln!();
        eprintln!("Summary:");
        eprintln!("  Input:        {:?}", input);
        eprintln!("  Output:       {:?}", output);
        eprintln!("  Events:       {}", result.events.len());
        eprintln!("  Written:      {} {}", written, unit);
        eprintln!(
            "  Sensor:       {} ({}x{})",
            result.geometry.name(),
            result.geometry.width,
            result.geometry.height
        );
        eprintln!("  Duration:     {:.3}s", total_duration.as_secs_f64());
        eprintln!("  Throughput:   {:.0} events/s", events_per_sec);
    }

    Ok(())
}

fn print_info(input: &Path, result: &DecodeResult) {
    println!("File:           {:?}", input);
    println!(
        "Format:         AER-DAT{}",
        result.header.format_version.as_deref().unwrap_or("?")
    );
    println!(
        "Sensor:         {} ({}x{})",
        result.geometry.name(),
        result.geometry.width,
        result.geometry.height
    );
    println!("Header bytes:   {}", result.header.data_offset);
    println!("Events:         {}", result.events.len());
    println!("Trailing bytes: {}", result.trailing_bytes);

    if let (Some(first), Some(last)) = (result.events.first(), result.events.last()) {
        let on = result.events.iter().filter(|e| e.polarity).count();
        println!(
            "Time range:     {} .. {} us ({} us)",
            first.timestamp,
            last.timestamp,
            i64::from(last.timestamp) - i64::from(first.timestamp)
        );
        println!(
            "Polarity:       {} ON / {} OFF",
            on,
            result.events.len() - on
        );
    }
}
