//! Python bindings for the AEDAT decoder with numpy support.
//!
//! Decoded events are handed to Python as columnar numpy arrays, and window
//! ON/OFF counts can be computed without materialising frames.

use aedat_core::{
    AedatDecoder, DecodeError, DvsEvent, SensorGeometry, WindowMode, Windows, WindowingConfig,
};
use numpy::{IntoPyArray, PyArray1};
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::PathBuf;

/// Container for decoded DVS events.
///
/// Columns are stored separately (x, y, polarity, timestamp) so each one maps
/// directly onto a numpy array.
#[pyclass]
pub struct Events {
    /// X coordinates, 1-based
    x: Vec<u16>,
    /// Y coordinates, 1-based
    y: Vec<u16>,
    /// Polarities (1 = ON, 0 = OFF)
    polarity: Vec<u8>,
    /// Timestamps in microseconds
    timestamp: Vec<u32>,
    sensor: SensorGeometry,
}

#[pymethods]
impl Events {
    fn __len__(&self) -> usize {
        self.x.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Events(count={}, sensor={} {}x{})",
            self.x.len(),
            self.sensor.name(),
            self.sensor.width,
            self.sensor.height
        )
    }

    /// Returns the X coordinates as a numpy array.
    #[getter]
    fn x<'py>(&self, py: Python<'py>) -> &'py PyArray1<u16> {
        self.x.clone().into_pyarray(py)
    }

    /// Returns the Y coordinates as a numpy array.
    #[getter]
    fn y<'py>(&self, py: Python<'py>) -> &'py PyArray1<u16> {
        self.y.clone().into_pyarray(py)
    }

    /// Returns the polarities as a numpy array.
    ///
    /// Values: 0 = OFF (decrease in brightness), 1 = ON (increase)
    #[getter]
    fn polarity<'py>(&self, py: Python<'py>) -> &'py PyArray1<u8> {
        self.polarity.clone().into_pyarray(py)
    }

    /// Returns the timestamps as a numpy array (in microseconds).
    #[getter]
    fn timestamp<'py>(&self, py: Python<'py>) -> &'py PyArray1<u32> {
        self.timestamp.clone().into_pyarray(py)
    }

    /// Returns the sensor model name.
    #[getter]
    fn sensor(&self) -> &'static str {
        self.sensor.name()
    }

    /// Returns a tuple of (width, height) for the sensor geometry.
    #[getter]
    fn sensor_size(&self) -> (u16, u16) {
        (self.sensor.width, self.sensor.height)
    }

    /// Returns all arrays as a dictionary.
    ///
    /// This is useful for creating a pandas DataFrame.
    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<PyObject> {
        let dict = PyDict::new(py);
        dict.set_item("x", self.x.clone().into_pyarray(py))?;
        dict.set_item("y", self.y.clone().into_pyarray(py))?;
        dict.set_item("polarity", self.polarity.clone().into_pyarray(py))?;
        dict.set_item("timestamp", self.timestamp.clone().into_pyarray(py))?;
        Ok(dict.into())
    }
}

impl Events {
    fn from_dvs_events(events: &[DvsEvent], sensor: SensorGeometry) -> Self {
        let len = events.len();
        let mut x = Vec::with_capacity(len);
        let mut y = Vec::with_capacity(len);
        let mut polarity = Vec::with_capacity(len);
        let mut timestamp = Vec::with_capacity(len);

        for event in events {
            x.push(event.x);
            y.push(event.y);
            polarity.push(u8::from(event.polarity));
            timestamp.push(event.timestamp);
        }

        Self {
            x,
            y,
            polarity,
            timestamp,
            sensor,
        }
    }
}

fn decode_err(err: DecodeError) -> PyErr {
    match err {
        DecodeError::Io(e) => PyIOError::new_err(format!("Failed to read file: {}", e)),
        other => PyValueError::new_err(format!("Failed to decode: {}", other)),
    }
}

/// Decodes an AEDAT file and returns the events.
///
/// Args:
///     path: Path to the .aedat file
///
/// Returns:
///     Events: Container with x, y, polarity, and timestamp arrays
///
/// Example:
///     >>> import aedat
///     >>> events = aedat.decode_file("recording.aedat")
///     >>> print(f"Decoded {len(events)} events from a {events.sensor}")
#[pyfunction]
fn decode_file(py: Python<'_>, path: &str) -> PyResult<Py<Events>> {
    let path = PathBuf::from(path);
    let result = AedatDecoder::new().decode_file(&path).map_err(decode_err)?;
    Py::new(py, Events::from_dvs_events(&result.events, result.geometry))
}

/// Decodes header-less AEDAT record bytes.
///
/// Args:
///     data: Raw 8-byte event records (no ASCII header)
///     sensor: Sensor model, "dvs128" or "davis240" (default: "dvs128")
///
/// Returns:
///     Events: Container with decoded events
#[pyfunction]
#[pyo3(signature = (data, sensor="dvs128"))]
fn decode_bytes(py: Python<'_>, data: &[u8], sensor: &str) -> PyResult<Py<Events>> {
    let geometry: SensorGeometry = sensor.parse().map_err(PyValueError::new_err)?;

    let mut events = Vec::new();
    AedatDecoder::new()
        .decode_buffer(data, &geometry, &mut events)
        .map_err(decode_err)?;

    Py::new(py, Events::from_dvs_events(&events, geometry))
}

/// Splits a recording into windows and returns per-window event counts.
///
/// Exactly one of `span` (microseconds) or `count` (events) must be given.
///
/// Returns:
///     tuple: (on, off) numpy uint64 arrays, one entry per window
#[pyfunction]
#[pyo3(signature = (path, span=None, count=None, max_windows=None))]
fn window_counts<'py>(
    py: Python<'py>,
    path: &str,
    span: Option<u32>,
    count: Option<u32>,
    max_windows: Option<u32>,
) -> PyResult<(&'py PyArray1<u64>, &'py PyArray1<u64>)> {
    let mode = match (span, count) {
        (Some(span), None) => WindowMode::TimeBased { span },
        (None, Some(count)) => WindowMode::EventCount { count },
        _ => {
            return Err(PyValueError::new_err(
                "exactly one of span or count is required",
            ))
        }
    };

    let result = AedatDecoder::new()
        .decode_file(PathBuf::from(path))
        .map_err(decode_err)?;

    let mut config = WindowingConfig::new(mode);
    config.max_windows = max_windows;
    let windows = Windows::new(&result.events, &result.geometry, config)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    let (on, off): (Vec<u64>, Vec<u64>) = windows.map(|w| (w.on_count, w.off_count)).unzip();
    Ok((on.into_pyarray(py), off.into_pyarray(py)))
}

/// AEDAT decoder module for Python.
#[pymodule]
fn _aedat(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(decode_file, m)?)?;
    m.add_function(wrap_pyfunction!(decode_bytes, m)?)?;
    m.add_function(wrap_pyfunction!(window_counts, m)?)?;
    m.add_class::<Events>()?;
    Ok(())
}
