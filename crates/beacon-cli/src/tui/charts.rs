//! Chart storage for the dashboard.
//!
//! [`TerminalCharts`] receives redraws from the session's presenter and keeps
//! the latest points of every series, ready to be drawn as sparklines.

use std::collections::HashMap;

use beacon_core::{ChartGroup, ChartSink, Series, SeriesKind};

/// One series as last handed to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub kind: SeriesKind,
    pub values: Vec<f64>,
}

impl Trace {
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// A [`ChartSink`] backed by plain vectors.
#[derive(Debug, Clone, Default)]
pub struct TerminalCharts {
    groups: HashMap<ChartGroup, Vec<Trace>>,
    redraws: u64,
}

impl TerminalCharts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Traces for `group`, in series order.
    pub fn traces(&self, group: ChartGroup) -> &[Trace] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of group redraws received.
    pub fn redraws(&self) -> u64 {
        self.redraws
    }
}

impl ChartSink for TerminalCharts {
    fn redraw(&mut self, group: ChartGroup, columns: &[&Series]) {
        self.redraws += 1;
        let traces = columns
            .iter()
            .map(|series| Trace {
                kind: series.kind(),
                values: series.values().to_vec(),
            })
            .collect();
        self.groups.insert(group, traces);
    }
}

/// Scale values onto `0..=100` for a sparkline.
///
/// A flat series maps to the middle of the range so it stays visible.
pub fn sparkline_data(values: &[f64]) -> Vec<u64> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;

    values
        .iter()
        .map(|&v| {
            if span <= f64::EPSILON {
                50
            } else {
                (((v - min) / span) * 100.0).round() as u64
            }
        })
        .collect()
}

/// Resample sparkline data to exactly `target_width` points.
///
/// Short series are stretched by repeating points; long series are averaged
/// into buckets.
pub fn resample(data: &[u64], target_width: usize) -> Vec<u64> {
    if data.is_empty() || target_width == 0 {
        return Vec::new();
    }
    if data.len() == target_width {
        return data.to_vec();
    }

    let mut result = Vec::with_capacity(target_width);
    if data.len() < target_width {
        for i in 0..target_width {
            let src_idx = i * (data.len() - 1) / (target_width - 1).max(1);
            result.push(data[src_idx.min(data.len() - 1)]);
        }
    } else {
        let bucket_size = data.len() as f64 / target_width as f64;
        for i in 0..target_width {
            let start = (i as f64 * bucket_size) as usize;
            let end = (((i + 1) as f64 * bucket_size) as usize).min(data.len());
            if start < end {
                let sum: u64 = data[start..end].iter().sum();
                result.push(sum / (end - start) as u64);
            } else if start < data.len() {
                result.push(data[start]);
            }
        }
    }
    result
}
