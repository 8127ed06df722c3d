use std::path::PathBuf;

/// Errors raised while reconstructing, selecting or rendering chromatograms.
#[derive(Debug, thiserror::Error)]
pub enum WaterfallError {
    /// The export does not have the expected two-header, marker-delimited shape.
    #[error("Format error: {0}")]
    Format(String),

    /// A reorder index points outside the sample columns.
    #[error("Index error: sample index {index} is out of range for {len} sample(s)")]
    Index { index: usize, len: usize },

    /// Input unreadable or output unwritable.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV tokenizer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Charting backend error
    #[error("Render error: {0}")]
    Render(String),

    /// No backend for the figure extension.
    #[error("Unsupported figure format: .{0} (use .svg, .png, .jpg or .bmp)")]
    UnsupportedFigure(String),
}

impl WaterfallError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        WaterfallError::Format(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WaterfallError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, WaterfallError>;
