//! Recorded activity logs overlaid on population glyphs
//!
//! A log holds one row of values per time step, one value per neuron. The
//! controller matches logs to visualised populations by file name and
//! recolours the glyphs from the row at the current time cursor.

use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, ResultExt, SpikeVizError};
use crate::types::Rgba;

/// Read access to a recorded log
pub trait LogData: Send + Sync {
    fn name(&self) -> &str;

    /// Values of all neurons at time step `index`, empty when out of range
    fn row(&self, index: usize) -> Vec<f64>;

    fn rows(&self) -> usize;

    fn min(&self) -> f64;

    fn max(&self) -> f64;
}

/// Name a log of `population`'s `port` is recorded under
pub fn log_file_name(population: &str, port: &str) -> String {
    format!("{}_{}_log.bin", population, port).replace(' ', "_")
}

/// Log held in memory as a row-major matrix
#[derive(Debug, Clone, PartialEq)]
pub struct VecLog {
    name: String,
    columns: usize,
    values: Vec<f64>,
    min: f64,
    max: f64,
}

impl VecLog {
    pub fn new(name: impl Into<String>, columns: usize, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if columns == 0 || values.len() % columns != 0 {
            return Err(SpikeVizError::Log(format!(
                "log {} has {} values, not a multiple of {} columns",
                name,
                values.len(),
                columns
            )));
        }
        let (min, max) = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let (min, max) = if min > max { (0.0, 0.0) } else { (min, max) };
        Ok(Self {
            name,
            columns,
            values,
            min,
            max,
        })
    }

    /// Parse little-endian `f64` rows of `columns` values each
    pub fn from_bytes(name: impl Into<String>, columns: usize, bytes: &[u8]) -> Result<Self> {
        let values = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect();
        Self::new(name, columns, values)
    }

    /// Load a binary log; its name is the file name
    pub fn load(path: &Path, columns: usize) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(SpikeVizError::from)
            .with_context(|| format!("Failed to read log {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(name, columns, &bytes)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }
}

impl LogData for VecLog {
    fn name(&self) -> &str {
        &self.name
    }

    fn row(&self, index: usize) -> Vec<f64> {
        let start = index.saturating_mul(self.columns);
        self.values
            .get(start..start.saturating_add(self.columns))
            .map(|r| r.to_vec())
            .unwrap_or_default()
    }

    fn rows(&self) -> usize {
        self.values.len() / self.columns
    }

    fn min(&self) -> f64 {
        self.min
    }

    fn max(&self) -> f64 {
        self.max
    }
}

/// Map one value onto a black-red-yellow-white ramp.
///
/// The normalised value is stretched to `[0, 765]` and spent on red
/// first, then green, then blue.
pub fn remap_value(value: f64, min: f64, max: f64) -> Option<Rgba> {
    let range = max - min;
    if !(value < f64::INFINITY) || range == 0.0 || !range.is_finite() {
        return None;
    }
    let val = (((value - min) * 255.0) / range) as i32 * 3;
    let val3 = if val > 511 { val - 512 } else { 0 };
    let val2 = if val3 > 0 { 511 } else { val };
    let val2 = if val2 > 255 { val2 - 256 } else { 0 };
    let val1 = val.min(255);
    let channel = |v: i32| v.clamp(0, 255) as u8;
    Some(Rgba::from_rgb8(channel(val1), channel(val2), channel(val3)))
}

/// Colours for a population of `neuron_count` neurons from one log row.
///
/// Returns `None` when the row is unusable (empty or wider than the
/// population). Values that cannot be remapped stay black.
pub fn remap_row(row: &[f64], min: f64, max: f64, neuron_count: usize) -> Option<Vec<Rgba>> {
    if row.is_empty() || row.len() > neuron_count {
        return None;
    }
    let mut colours = vec![Rgba::BLACK; neuron_count];
    for (colour, value) in colours.iter_mut().zip(row) {
        if let Some(c) = remap_value(*value, min, max) {
            *colour = c;
        }
    }
    Some(colours)
}

/// Find the log recorded for any of `ports` of `population`
pub fn find_log(logs: &[Arc<dyn LogData>], population: &str, ports: &[String]) -> Option<Arc<dyn LogData>> {
    ports.iter().find_map(|port| {
        let wanted = log_file_name(population, port);
        logs.iter().find(|log| log.name() == wanted).cloned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name() {
        assert_eq!(log_file_name("Pop A", "out v"), "Pop_A_out_v_log.bin");
    }

    #[test]
    fn test_remap_value_bands() {
        let c = |v| remap_value(v, 0.0, 255.0).expect("remappable").to_rgba8();
        assert_eq!(c(0.0), [0, 0, 0, 255]);
        // val = 300: red saturated, green 44
        assert_eq!(c(100.0), [255, 44, 0, 255]);
        // val = 765: all bands, blue 253
        assert_eq!(c(255.0), [255, 255, 253, 255]);
        assert!(remap_value(1.0, 2.0, 2.0).is_none());
        assert!(remap_value(f64::INFINITY, 0.0, 1.0).is_none());
    }

    #[test]
    fn test_remap_row_rejects_wide_rows() {
        assert!(remap_row(&[0.0, 1.0, 2.0], 0.0, 2.0, 2).is_none());
        assert!(remap_row(&[], 0.0, 2.0, 2).is_none());
        let colours = remap_row(&[0.0, f64::INFINITY], 0.0, 2.0, 3).expect("fits");
        assert_eq!(colours.len(), 3);
        assert!(colours.iter().all(|c| *c == Rgba::BLACK));
    }

    #[test]
    fn test_vec_log_rows() {
        let log = VecLog::new("a_v_log.bin", 2, vec![0.0, 1.0, 2.0, 4.0]).expect("valid");
        assert_eq!(log.rows(), 2);
        assert_eq!(log.row(1), vec![2.0, 4.0]);
        assert!(log.row(2).is_empty());
        assert_eq!((log.min(), log.max()), (0.0, 4.0));
        assert!(VecLog::new("bad", 3, vec![0.0; 4]).is_err());
    }

    #[test]
    fn test_load_binary_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("p_v_log.bin");
        let bytes: Vec<u8> = [1.0f64, 2.0, 3.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        std::fs::write(&path, bytes).expect("write");
        let log = VecLog::load(&path, 3).expect("load");
        assert_eq!(log.name(), "p_v_log.bin");
        assert_eq!(log.row(0), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_find_log_by_port() {
        let logs: Vec<Arc<dyn LogData>> = vec![Arc::new(VecLog::new("P_1_v_log.bin", 1, vec![0.0]).expect("valid"))];
        let ports = vec!["i".to_string(), "v".to_string()];
        assert!(find_log(&logs, "P 1", &ports).is_some());
        assert!(find_log(&logs, "P 2", &ports).is_none());
    }
}
