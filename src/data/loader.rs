use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::error::{Result, WaterfallError};
use super::model::{
    is_body_header, ChromatogramTable, Chromatograms, RawExport, RawRow, SampleColumn, SampleSpan,
    BODY_HEADER,
};

/// Substring that identifies a sample-boundary row in MassHunter exports.
pub const BOUNDARY_MARKER: &str = "ESI";

/// Suffix appended to the input stem for the side-effect export.
pub const PARSED_SUFFIX: &str = " parsed.csv";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Outcome of [`reconstruct`]: the in-memory table plus the result of writing
/// `<stem> parsed.csv` next to the input.
#[derive(Debug)]
pub struct Reconstruction {
    pub data: Chromatograms,
    /// Path written on success. A failed write keeps `data` usable.
    pub export: std::result::Result<PathBuf, WaterfallError>,
}

impl Reconstruction {
    /// Collapse into the table, failing if the side-effect export failed.
    pub fn into_data(self) -> Result<Chromatograms> {
        self.export?;
        Ok(self.data)
    }
}

/// Reconstruct a MassHunter export using the default `ESI` marker.
pub fn reconstruct(path: &Path) -> Result<Reconstruction> {
    reconstruct_with_marker(path, BOUNDARY_MARKER)
}

/// Read the export at `path`, rebuild the wide table and write the parsed copy.
pub fn reconstruct_with_marker(path: &Path, marker: &str) -> Result<Reconstruction> {
    let text = std::fs::read_to_string(path).map_err(|e| WaterfallError::io(path, e))?;
    let data = reconstruct_export(&text, marker)?;
    info!(
        "Reconstructed {} from {}",
        data.table,
        path.display()
    );

    let export_path = parsed_export_path(path);
    let export = match write_parsed_export(&data.table, &export_path) {
        Ok(()) => {
            info!("Parsed table written to {}", export_path.display());
            Ok(export_path)
        }
        Err(e) => {
            warn!("Could not write parsed table: {e}");
            Err(e)
        }
    };

    Ok(Reconstruction { data, export })
}

/// Pure reconstruction from the export's text, no file I/O.
pub fn reconstruct_export(text: &str, marker: &str) -> Result<Chromatograms> {
    let raw = read_export(text, marker)?;
    let spans = find_spans(&raw)?;
    let table = join_spans(&raw, &spans)?;
    Ok(Chromatograms::from_table(table))
}

/// `<dir>/<stem> parsed.csv` for an input at `<dir>/<stem>.<ext>`.
pub fn parsed_export_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{PARSED_SUFFIX}"))
}

// ---------------------------------------------------------------------------
// Tokenise and classify rows
// ---------------------------------------------------------------------------

/// Split the export into the first sample's name and classified body rows.
///
/// Layout:
/// ```text
/// ESI blank.d                  <- line 1: first sample name
/// #Point,X(Minutes),Y(Counts)  <- line 2: body header
/// 0,0.0083,1520                <- data rows of sample 1
/// ...
/// +ESI sample2.d               <- boundary marker
/// #Point,X(Minutes),Y(Counts)  <- header repeat
/// 0,0.0083,1710                <- data rows of sample 2
/// ```
pub fn read_export(text: &str, marker: &str) -> Result<RawExport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records().filter(|r| match r {
        Ok(rec) => !rec.iter().all(|c| c.trim().is_empty()),
        Err(_) => true,
    });

    let first = records
        .next()
        .transpose()?
        .ok_or_else(|| WaterfallError::format("export is empty"))?;
    let first_sample = first
        .get(0)
        .map(|c| c.trim_start_matches('\u{feff}').trim().to_string())
        .unwrap_or_default();
    if first_sample.is_empty() {
        return Err(WaterfallError::format(
            "line 1 must hold the first sample's name",
        ));
    }

    let header = records
        .next()
        .transpose()?
        .ok_or_else(|| WaterfallError::format("missing body header on line 2"))?;
    let header_cells: Vec<&str> = header.iter().collect();
    if !is_body_header(header_cells.as_slice()) {
        return Err(WaterfallError::format(format!(
            "expected body header [{}], found [{}]",
            BODY_HEADER.join(", "),
            header_cells.join(", ")
        )));
    }

    let mut rows = Vec::new();
    let mut lines = Vec::new();
    for record in records {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
        rows.push(classify(cells, marker));
        lines.push(line);
    }

    debug!(
        "Read {} body rows, first sample '{first_sample}'",
        rows.len()
    );
    Ok(RawExport {
        first_sample,
        rows,
        lines,
    })
}

fn classify(cells: Vec<String>, marker: &str) -> RawRow {
    match cells.first() {
        Some(first) if first.parse::<f64>().is_err() && first.contains(marker) => {
            RawRow::Marker(first.clone())
        }
        _ => RawRow::Cells(cells),
    }
}

// ---------------------------------------------------------------------------
// Sample spans
// ---------------------------------------------------------------------------

/// Fold the marker rows into contiguous [`SampleSpan`]s, in discovery order.
///
/// The first sample has no marker: it starts at row 0. Every later sample's
/// data starts two rows after its marker (marker, header repeat, data) and the
/// previous span ends right before that marker. The last span runs to the end.
pub fn find_spans(raw: &RawExport) -> Result<Vec<SampleSpan>> {
    let mut spans = vec![SampleSpan {
        name: raw.first_sample.clone(),
        name_row: 0,
        rows: 0..0,
    }];

    for (i, row) in raw.rows.iter().enumerate() {
        let RawRow::Marker(name) = row else {
            continue;
        };

        if !raw.rows.get(i + 1).is_some_and(RawRow::is_body_header) {
            return Err(WaterfallError::format(format!(
                "line {}: boundary marker '{name}' is not followed by a [{}] header",
                raw.line_of(i),
                BODY_HEADER.join(", ")
            )));
        }

        if let Some(current) = spans.last_mut() {
            current.rows.end = i;
        }
        spans.push(SampleSpan {
            name: name.clone(),
            name_row: i,
            rows: i + 2..i + 2,
        });
    }

    if let Some(last) = spans.last_mut() {
        last.rows.end = raw.rows.len();
    }

    for span in &spans {
        match span.last_data_row() {
            Some(last) => debug!(
                "Sample '{}': marker row {}, data rows {}..={last}",
                span.name,
                span.name_row,
                span.first_data_row()
            ),
            None => warn!("Sample '{}' has no data rows", span.name),
        }
    }

    Ok(spans)
}

// ---------------------------------------------------------------------------
// Outer join on point index
// ---------------------------------------------------------------------------

struct JoinedRow {
    time: f64,
    intensity: Vec<Option<f64>>,
}

/// Outer-join every span on `#Point` into one table ordered by point index.
///
/// Time comes from the first span that holds a given point; later spans never
/// overwrite it. Points missing from a sample leave a `None` gap.
pub fn join_spans(raw: &RawExport, spans: &[SampleSpan]) -> Result<ChromatogramTable> {
    let mut joined: BTreeMap<i64, JoinedRow> = BTreeMap::new();

    for (col, span) in spans.iter().enumerate() {
        let mut seen = BTreeSet::new();
        for i in span.rows.clone() {
            let (point, time, intensity) = parse_data_row(raw, i, &span.name)?;
            if !seen.insert(point) {
                return Err(WaterfallError::format(format!(
                    "line {}: point {point} appears twice in sample '{}'",
                    raw.line_of(i),
                    span.name
                )));
            }
            joined
                .entry(point)
                .or_insert_with(|| JoinedRow {
                    time,
                    intensity: vec![None; spans.len()],
                })
                .intensity[col] = Some(intensity);
        }
    }

    if joined.is_empty() {
        return Err(WaterfallError::format("export contains no data rows"));
    }

    let mut table = ChromatogramTable {
        time: Vec::with_capacity(joined.len()),
        samples: spans
            .iter()
            .map(|span| SampleColumn {
                name: span.name.clone(),
                intensity: Vec::with_capacity(joined.len()),
            })
            .collect(),
    };
    for row in joined.into_values() {
        table.time.push(row.time);
        for (column, value) in table.samples.iter_mut().zip(row.intensity) {
            column.intensity.push(value);
        }
    }

    Ok(table)
}

fn parse_data_row(raw: &RawExport, i: usize, sample: &str) -> Result<(i64, f64, f64)> {
    let line = raw.line_of(i);
    let cells = match &raw.rows[i] {
        RawRow::Cells(cells) => cells,
        RawRow::Marker(name) => {
            return Err(WaterfallError::format(format!(
                "line {line}: unexpected boundary marker '{name}' inside sample '{sample}'"
            )))
        }
    };

    if cells.len() < BODY_HEADER.len() {
        return Err(WaterfallError::format(format!(
            "line {line}: sample '{sample}' row has {} cell(s), expected {}",
            cells.len(),
            BODY_HEADER.len()
        )));
    }

    let number = |idx: usize| -> Result<f64> {
        cells[idx].parse::<f64>().map_err(|_| {
            WaterfallError::format(format!(
                "line {line}: '{}' in column {} of sample '{sample}' is not a number \
                 (an unrecognised sample boundary?)",
                cells[idx], BODY_HEADER[idx]
            ))
        })
    };

    let point = number(0)?;
    if !point.is_finite() || point.fract() != 0.0 {
        return Err(WaterfallError::format(format!(
            "line {line}: point index '{}' is not an integer",
            cells[0]
        )));
    }
    Ok((point as i64, number(1)?, number(2)?))
}

// ---------------------------------------------------------------------------
// Parsed export
// ---------------------------------------------------------------------------

/// Write the sample columns (time dropped) as CSV. Gaps become empty cells.
pub fn write_parsed_export(table: &ChromatogramTable, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| WaterfallError::io(path, e))?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(table.samples.iter().map(|s| s.name.as_str()))?;
    for row in 0..table.n_rows() {
        writer.write_record(table.samples.iter().map(|s| {
            s.intensity[row]
                .map(|v| v.to_string())
                .unwrap_or_default()
        }))?;
    }
    writer.flush().map_err(|e| WaterfallError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_SAMPLES: &str = "\
ESI blank.d
#Point,X(Minutes),Y(Counts)
0,0.1,10
1,0.2,11
2,0.3,12
+ESI second.d
#Point,X(Minutes),Y(Counts)
0,0.1,20
1,0.2,21
2,0.3,22
+ESI third.d
#Point,X(Minutes),Y(Counts)
1,0.2,31
2,0.3,32
3,0.4,33
";

    #[test]
    fn test_read_export_classifies_markers() {
        let raw = read_export(THREE_SAMPLES, BOUNDARY_MARKER).unwrap();
        assert_eq!(raw.first_sample, "ESI blank.d");
        assert_eq!(raw.rows.len(), 13);
        assert_eq!(raw.rows[3], RawRow::Marker("+ESI second.d".into()));
        assert!(raw.rows[4].is_body_header());
        assert_eq!(
            raw.rows[0],
            RawRow::Cells(vec!["0".into(), "0.1".into(), "10".into()])
        );
    }

    #[test]
    fn test_find_spans_boundaries() {
        let raw = read_export(THREE_SAMPLES, BOUNDARY_MARKER).unwrap();
        let spans = find_spans(&raw).unwrap();

        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].name, "ESI blank.d");
        assert_eq!((spans[0].name_row, spans[0].rows.clone()), (0, 0..3));
        assert_eq!(spans[1].name, "+ESI second.d");
        assert_eq!((spans[1].name_row, spans[1].rows.clone()), (3, 5..8));
        assert_eq!(spans[2].name, "+ESI third.d");
        assert_eq!((spans[2].name_row, spans[2].rows.clone()), (8, 10..13));
        assert_eq!(spans[2].last_data_row(), Some(12));
    }

    #[test]
    fn test_outer_join_leaves_gaps() {
        let data = reconstruct_export(THREE_SAMPLES, BOUNDARY_MARKER).unwrap();
        let table = &data.table;

        assert_eq!(table.time, vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(
            table.samples[0].intensity,
            vec![Some(10.0), Some(11.0), Some(12.0), None]
        );
        assert_eq!(
            table.samples[2].intensity,
            vec![None, Some(31.0), Some(32.0), Some(33.0)]
        );
        assert_eq!(data.names, vec!["ESI blank.d", "+ESI second.d", "+ESI third.d"]);
    }

    #[test]
    fn test_first_span_time_is_authoritative() {
        let text = "\
A
#Point,X(Minutes),Y(Counts)
0,1.0,5
+ESI B
#Point,X(Minutes),Y(Counts)
0,1.5,6
";
        let data = reconstruct_export(text, BOUNDARY_MARKER).unwrap();
        assert_eq!(data.table.time, vec![1.0]);
        assert_eq!(data.table.n_samples(), 2);
    }

    #[test]
    fn test_rows_sorted_by_numeric_point() {
        let text = "\
A
#Point,X(Minutes),Y(Counts)
10,1.0,5
2,0.2,6
";
        let data = reconstruct_export(text, BOUNDARY_MARKER).unwrap();
        assert_eq!(data.table.time, vec![0.2, 1.0]);
    }

    #[test]
    fn test_blank_lines_and_whitespace_are_ignored() {
        let text = "\u{feff}ESI_blank\n#Point, X(Minutes), Y(Counts)\n\n0, 0.5, 1\n\n1, 0.6, 2\n";
        let data = reconstruct_export(text, BOUNDARY_MARKER).unwrap();
        assert_eq!(data.names, vec!["ESI_blank"]);
        assert_eq!(data.table.n_rows(), 2);
    }

    #[test]
    fn test_custom_marker() {
        let text = "\
DAD1 blank
#Point,X(Minutes),Y(Counts)
0,0.1,1
DAD1 run2
#Point,X(Minutes),Y(Counts)
0,0.1,2
";
        let data = reconstruct_export(text, "DAD").unwrap();
        assert_eq!(data.names, vec!["DAD1 blank", "DAD1 run2"]);
    }

    #[test]
    fn test_wrong_header_is_format_error() {
        let text = "ESI_blank\nPoint,Time,Counts\n0,0.1,1\n";
        let err = reconstruct_export(text, BOUNDARY_MARKER).unwrap_err();
        assert!(matches!(err, WaterfallError::Format(_)));
    }

    #[test]
    fn test_unrecognised_boundary_is_format_error() {
        // A second segment whose name lacks the marker must not be merged.
        let text = "\
ESI_blank
#Point,X(Minutes),Y(Counts)
0,0.1,1
UV sample
#Point,X(Minutes),Y(Counts)
0,0.1,2
";
        let err = reconstruct_export(text, BOUNDARY_MARKER).unwrap_err();
        match err {
            WaterfallError::Format(msg) => assert!(msg.contains("line 4"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_marker_without_header_repeat_is_format_error() {
        let text = "\
ESI_blank
#Point,X(Minutes),Y(Counts)
0,0.1,1
+ESI next
0,0.1,2
";
        assert!(matches!(
            reconstruct_export(text, BOUNDARY_MARKER),
            Err(WaterfallError::Format(_))
        ));
    }

    #[test]
    fn test_duplicate_point_is_format_error() {
        let text = "ESI\n#Point,X(Minutes),Y(Counts)\n0,0.1,1\n0,0.2,2\n";
        assert!(matches!(
            reconstruct_export(text, BOUNDARY_MARKER),
            Err(WaterfallError::Format(_))
        ));
    }

    #[test]
    fn test_empty_body_is_format_error() {
        let text = "ESI_blank\n#Point,X(Minutes),Y(Counts)\n";
        assert!(matches!(
            reconstruct_export(text, BOUNDARY_MARKER),
            Err(WaterfallError::Format(_))
        ));
    }

    #[test]
    fn test_sample_without_data_is_all_gaps() {
        let text = "\
ESI a
#Point,X(Minutes),Y(Counts)
0,0.1,1
+ESI empty
#Point,X(Minutes),Y(Counts)
";
        let data = reconstruct_export(text, BOUNDARY_MARKER).unwrap();
        assert_eq!(data.table.samples[1].intensity, vec![None]);
    }

    #[test]
    fn test_parsed_export_path() {
        let path = Path::new("/data/run 7/UV_example.csv");
        assert_eq!(
            parsed_export_path(path),
            PathBuf::from("/data/run 7/UV_example parsed.csv")
        );
    }
}
