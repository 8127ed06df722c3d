use log::debug;

use super::error::{Result, WaterfallError};
use super::model::{ChromatogramTable, Chromatograms};

// ---------------------------------------------------------------------------
// Time window
// ---------------------------------------------------------------------------

/// Open interval on the time axis. Rows exactly at `min` or `max` are dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub min: f64,
    pub max: f64,
}

impl TimeWindow {
    pub fn new(min: f64, max: f64) -> Self {
        TimeWindow { min, max }
    }

    pub fn contains(&self, time: f64) -> bool {
        time > self.min && time < self.max
    }
}

// ---------------------------------------------------------------------------
// Selection: time filter + column reorder/subset
// ---------------------------------------------------------------------------

/// Cut `data` to `window` and reorder/subset its samples.
///
/// `column_order` holds 0-indexed positions into the current sample columns;
/// the time column is always kept first. An empty order keeps every sample.
/// An index past the last sample fails with [`WaterfallError::Index`].
pub fn select(data: Chromatograms, window: TimeWindow, column_order: &[usize]) -> Result<Chromatograms> {
    let Chromatograms { mut table, names } = data;

    let keep: Vec<bool> = table.time.iter().map(|&t| window.contains(t)).collect();
    table.retain_rows(&keep);
    debug!(
        "Time window ({}, {}) kept {} row(s)",
        window.min,
        window.max,
        table.n_rows()
    );

    if column_order.is_empty() {
        return Ok(Chromatograms { table, names });
    }

    let len = table.n_samples();
    if let Some(&index) = column_order.iter().find(|&&i| i >= len) {
        return Err(WaterfallError::Index { index, len });
    }

    let samples = column_order
        .iter()
        .map(|&i| table.samples[i].clone())
        .collect();
    let names = column_order.iter().map(|&i| names[i].clone()).collect();
    debug!("Sample columns reordered to {column_order:?}");

    Ok(Chromatograms {
        table: ChromatogramTable {
            time: table.time,
            samples,
        },
        names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SampleColumn;

    fn data() -> Chromatograms {
        let column = |name: &str, base: f64| SampleColumn {
            name: name.to_string(),
            intensity: (0..5).map(|i| Some(base + i as f64)).collect(),
        };
        Chromatograms::from_table(ChromatogramTable {
            time: vec![0.0, 1.0, 2.0, 3.0, 4.0],
            samples: vec![column("one", 10.0), column("two", 20.0), column("three", 30.0)],
        })
    }

    #[test]
    fn test_window_is_strict() {
        let out = select(data(), TimeWindow::new(1.0, 3.0), &[]).unwrap();
        assert_eq!(out.table.time, vec![2.0]);
        assert_eq!(out.table.samples[0].intensity, vec![Some(12.0)]);
        assert_eq!(out.names, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_reorder_moves_columns_and_names_together() {
        let out = select(data(), TimeWindow::new(-1.0, 10.0), &[2, 0, 1]).unwrap();
        let headers: Vec<&str> = out.table.samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(headers, vec!["three", "one", "two"]);
        assert_eq!(out.names, vec!["three", "one", "two"]);
        assert_eq!(out.table.samples[0].intensity[0], Some(30.0));
        assert_eq!(out.table.time.len(), 5);
    }

    #[test]
    fn test_subset_keeps_only_listed_samples() {
        let out = select(data(), TimeWindow::new(-1.0, 10.0), &[1]).unwrap();
        assert_eq!(out.table.n_samples(), 1);
        assert_eq!(out.names, vec!["two"]);
        assert!(out.is_single());
    }

    #[test]
    fn test_out_of_range_index_is_error() {
        let err = select(data(), TimeWindow::new(-1.0, 10.0), &[0, 5]).unwrap_err();
        assert!(matches!(err, WaterfallError::Index { index: 5, len: 3 }));
    }

    #[test]
    fn test_window_can_empty_the_table() {
        let out = select(data(), TimeWindow::new(10.0, 20.0), &[]).unwrap();
        assert_eq!(out.table.n_rows(), 0);
        assert_eq!(out.table.n_samples(), 3);
    }
}
