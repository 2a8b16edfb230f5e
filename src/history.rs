//! Bounded trend history for charting

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of samples kept for the trend chart
pub const HISTORY_CAPACITY: usize = 30;

/// Column order of [`History::to_matrix`]
pub const COLUMNS: [&str; 3] = ["temperature", "pressure", "power"];

/// Chart ranges per column as (min, max)
const CHART_RANGES: [(f64, f64); 3] = [(200.0, 600.0), (100.0, 200.0), (0.0, 1000.0)];

/// One trend sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub temperature: f64, // [°C]
    pub pressure: f64,    // [bar]
    pub power: f64,       // [MW]
}

/// FIFO buffer of the most recent samples, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    samples: VecDeque<HistorySample>,
}

impl History {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Append a sample, evicting the oldest once full
    pub fn push(&mut self, sample: HistorySample) {
        while self.samples.len() >= HISTORY_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistorySample> {
        self.samples.iter()
    }

    /// Drop the oldest samples beyond capacity (used when restoring state)
    pub(crate) fn truncate_to_capacity(&mut self) {
        while self.samples.len() > HISTORY_CAPACITY {
            self.samples.pop_front();
        }
    }

    /// Samples as a matrix: one row per sample, columns per [`COLUMNS`]
    pub fn to_matrix(&self) -> Array2<f64> {
        let mut matrix = Array2::zeros((self.samples.len(), COLUMNS.len()));
        for (mut row, sample) in matrix.axis_iter_mut(Axis(0)).zip(&self.samples) {
            row[0] = sample.temperature;
            row[1] = sample.pressure;
            row[2] = sample.power;
        }
        matrix
    }

    /// Samples scaled into [0, 1] against the fixed chart ranges
    pub fn chart_series(&self) -> Array2<f64> {
        let mins = Array1::from_iter(CHART_RANGES.iter().map(|(min, _)| *min));
        let spans = Array1::from_iter(CHART_RANGES.iter().map(|(min, max)| max - min));
        let scaled = (self.to_matrix() - &mins) / &spans;
        scaled.mapv(|v| v.clamp(0.0, 1.0))
    }
}
