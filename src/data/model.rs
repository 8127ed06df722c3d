use std::fmt;
use std::ops::Range;

/// Canonical name of the time column in the reconstructed table.
pub const TIME_COLUMN: &str = "time";

/// Column names of the export body header, in file order.
pub const BODY_HEADER: [&str; 3] = ["#Point", "X(Minutes)", "Y(Counts)"];

// ---------------------------------------------------------------------------
// RawExport – the flat file as read from disk
// ---------------------------------------------------------------------------

/// One body row of the export, classified by its first cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRow {
    /// Textual first cell containing the boundary marker: starts a new sample.
    Marker(String),
    /// Anything else, kept as text until the span is sliced out.
    Cells(Vec<String>),
}

impl RawRow {
    /// Whether this row repeats the body header (`#Point,X(Minutes),Y(Counts)`).
    pub fn is_body_header(&self) -> bool {
        match self {
            RawRow::Marker(_) => false,
            RawRow::Cells(cells) => is_body_header(cells.as_slice()),
        }
    }
}

pub(crate) fn is_body_header<S: AsRef<str>>(cells: &[S]) -> bool {
    cells.len() >= BODY_HEADER.len()
        && cells
            .iter()
            .zip(BODY_HEADER)
            .all(|(cell, expected)| cell.as_ref().trim() == expected)
}

/// The export body with the first sample's name recovered from line one.
#[derive(Debug, Clone)]
pub struct RawExport {
    /// Lone cell of the first physical line.
    pub first_sample: String,
    /// Every row after the body header, blank lines removed.
    pub rows: Vec<RawRow>,
    /// Physical line number of each entry in `rows`, for error messages.
    pub lines: Vec<u64>,
}

impl RawExport {
    pub fn line_of(&self, row: usize) -> u64 {
        self.lines.get(row).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// SampleSpan – one sample's row range inside the export body
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSpan {
    pub name: String,
    /// Row of the marker (0 for the first sample, which has none).
    pub name_row: usize,
    /// Data rows, end exclusive. May be empty.
    pub rows: Range<usize>,
}

impl SampleSpan {
    pub fn first_data_row(&self) -> usize {
        self.rows.start
    }

    /// Last data row (inclusive), `None` for a sample without data.
    pub fn last_data_row(&self) -> Option<usize> {
        (!self.rows.is_empty()).then(|| self.rows.end - 1)
    }
}

// ---------------------------------------------------------------------------
// ChromatogramTable – the tidy, time-aligned result
// ---------------------------------------------------------------------------

/// Intensities of one sample, row-aligned with [`ChromatogramTable::time`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleColumn {
    /// Column header (the name discovered in the export).
    pub name: String,
    /// `None` where the sample has no point at that row's index.
    pub intensity: Vec<Option<f64>>,
}

impl SampleColumn {
    /// Smallest intensity present in the column.
    pub fn min(&self) -> Option<f64> {
        self.intensity.iter().flatten().copied().reduce(f64::min)
    }

    /// Largest intensity present in the column.
    pub fn max(&self) -> Option<f64> {
        self.intensity.iter().flatten().copied().reduce(f64::max)
    }
}

/// Wide table: one `time` column followed by one intensity column per sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChromatogramTable {
    pub time: Vec<f64>,
    pub samples: Vec<SampleColumn>,
}

impl ChromatogramTable {
    pub fn n_rows(&self) -> usize {
        self.time.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Column headers in table order, `time` first.
    pub fn column_names(&self) -> Vec<&str> {
        std::iter::once(TIME_COLUMN)
            .chain(self.samples.iter().map(|s| s.name.as_str()))
            .collect()
    }

    /// Global (min, max) over every sample column, ignoring gaps.
    pub fn intensity_bounds(&self) -> Option<(f64, f64)> {
        let min = self.samples.iter().filter_map(SampleColumn::min).reduce(f64::min)?;
        let max = self.samples.iter().filter_map(SampleColumn::max).reduce(f64::max)?;
        Some((min, max))
    }

    /// Keep only the rows whose index satisfies `keep`, in every column.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        fn retain<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut flags = keep.iter();
            values.retain(|_| flags.next().copied().unwrap_or(false));
        }
        retain(&mut self.time, keep);
        for sample in &mut self.samples {
            retain(&mut sample.intensity, keep);
        }
    }
}

impl fmt::Display for ChromatogramTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows × [{}]",
            self.n_rows(),
            self.column_names().join(", ")
        )
    }
}

// ---------------------------------------------------------------------------
// Chromatograms – table plus display names, passed between stages
// ---------------------------------------------------------------------------

/// A table together with its index-aligned display names.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromatograms {
    pub table: ChromatogramTable,
    pub names: Vec<String>,
}

impl Chromatograms {
    /// Pair a table with names taken from its own column headers.
    pub fn from_table(table: ChromatogramTable) -> Self {
        let names = table.samples.iter().map(|s| s.name.clone()).collect();
        Chromatograms { table, names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether a single-panel figure should be drawn instead of a waterfall.
    pub fn is_single(&self) -> bool {
        self.names.len() == 1
    }
}
