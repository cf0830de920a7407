//! Tabular sample sources.
//!
//! A source yields an ordered, finite sequence of row records. Rows are
//! materialized in memory at load, so re-reading a source is cheap and
//! deterministic.

mod csv;

pub use self::csv::CsvSource;

use thiserror::Error;

/// One sample: identity, raw signal, optional class label.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    /// Sample identifier, unique within its source.
    pub id: i64,
    /// Raw vibration signal, in column order.
    pub signal: Vec<f64>,
    /// Class label; present only in labeled sources.
    pub label: Option<u32>,
}

/// The result of loading a source.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSource {
    /// Well-formed rows, in file order.
    pub rows: Vec<RowRecord>,
    /// Rows rejected during the load. Each rejection is also logged
    /// with its line number and reason.
    pub skipped: usize,
}

/// Why a single row was rejected.
///
/// Row rejections indicate an upstream contract violation; they are
/// surfaced per row (log + skip counter) and never abort the load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRow {
    /// The `id` cell is absent.
    #[error("missing id cell")]
    MissingId,

    /// The `id` cell is not an integer.
    #[error("unparseable id: {0:?}")]
    BadId(String),

    /// The `label` cell is not a non-negative integer.
    #[error("unparseable label: {0:?}")]
    BadLabel(String),

    /// A signal cell is absent (short row).
    #[error("missing signal cell in column {0:?}")]
    MissingSignal(String),

    /// A signal cell is not numeric.
    #[error("unparseable signal cell in column {0:?}")]
    BadSignal(String),
}
