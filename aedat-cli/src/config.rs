//! Optional TOML configuration for the converter.
//!
//! ```toml
//! [windows]
//! mode = { time_based = { span = 10000 } }
//! max_windows = 500
//! track_occupancy = true
//! downsample_scale = 8
//! occupancy_threshold = 2
//!
//! [frames]
//! mode = { event_count = { count = 5000 } }
//! exclude_off = true
//! ```
//!
//! Missing keys fall back to the library defaults; command-line flags win over
//! anything set here.

use aedat_core::{FrameConfig, WindowingConfig};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    pub windows: Option<WindowingConfig>,
    pub frames: Option<FrameConfig>,
}

impl ConverterConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::parse(&text)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        Ok(config)
    }

    fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        if let Some(windows) = &config.windows {
            windows.validate()?;
        }
        if let Some(frames) = &config.frames {
            frames.validate()?;
        }
        Ok(config)
    }
}
