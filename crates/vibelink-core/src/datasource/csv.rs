//! CSV sample source.
//!
//! Reads a headered CSV file where the signal occupies columns whose
//! headers are the integers `1..=signal_width`, identity lives in an
//! `id` column, and labeled sources add a `label` column. Any other
//! columns are metadata and ignored.

use csv::{ReaderBuilder, StringRecord};
use tracing::{info, warn};

use super::{LoadedSource, MalformedRow, RowRecord};
use crate::config::SourceConfig;
use crate::error::SourceError;

/// CSV-backed row source.
#[derive(Debug, Clone)]
pub struct CsvSource {
    config: SourceConfig,
}

/// Column layout discovered from the header row.
struct Layout {
    id: usize,
    label: Option<usize>,
    /// (record index, header text) per signal column, in header order.
    signal: Vec<(usize, String)>,
}

impl CsvSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    /// Load every row of the file.
    ///
    /// Malformed rows are skipped, logged with line number and reason,
    /// and counted in [`LoadedSource::skipped`]; they never abort the
    /// load. File-level problems (unreadable file, no `id` column, no
    /// signal columns at all) are [`SourceError`]s.
    pub fn load(&self) -> Result<LoadedSource, SourceError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.config.path)?;

        let headers = reader.headers()?.clone();
        let layout = self.layout(&headers)?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for (index, record) in reader.records().enumerate() {
            // header occupies line 1
            let line = index + 2;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!(line, error = %e, "skipping unreadable row");
                    skipped += 1;
                    continue;
                }
            };
            match Self::parse_row(&record, &layout) {
                Ok(row) => rows.push(row),
                Err(reason) => {
                    warn!(line, %reason, "skipping malformed row");
                    skipped += 1;
                }
            }
        }

        info!(
            path = %self.config.path.display(),
            rows = rows.len(),
            columns = headers.len(),
            signal_columns = layout.signal.len(),
            skipped,
            "loaded sample source"
        );
        Ok(LoadedSource { rows, skipped })
    }

    fn layout(&self, headers: &StringRecord) -> Result<Layout, SourceError> {
        let id = headers
            .iter()
            .position(|h| h == "id")
            .ok_or(SourceError::MissingColumn("id"))?;

        let label = if self.config.labeled {
            Some(
                headers
                    .iter()
                    .position(|h| h == "label")
                    .ok_or(SourceError::MissingColumn("label"))?,
            )
        } else {
            None
        };

        let width = self.config.signal_width;
        let signal: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| matches!(h.parse::<usize>(), Ok(n) if (1..=width).contains(&n)))
            .map(|(i, h)| (i, h.to_string()))
            .collect();
        if signal.is_empty() {
            return Err(SourceError::MissingColumn("signal"));
        }

        Ok(Layout { id, label, signal })
    }

    fn parse_row(record: &StringRecord, layout: &Layout) -> Result<RowRecord, MalformedRow> {
        let id_cell = record.get(layout.id).ok_or(MalformedRow::MissingId)?;
        let id: i64 = id_cell
            .trim()
            .parse()
            .map_err(|_| MalformedRow::BadId(id_cell.to_string()))?;

        let label = match layout.label {
            Some(index) => match record.get(index).map(str::trim) {
                Some("") | None => None,
                Some(cell) => Some(
                    cell.parse::<u32>()
                        .map_err(|_| MalformedRow::BadLabel(cell.to_string()))?,
                ),
            },
            None => None,
        };

        let mut signal = Vec::with_capacity(layout.signal.len());
        for (index, name) in &layout.signal {
            let cell = record
                .get(*index)
                .ok_or_else(|| MalformedRow::MissingSignal(name.clone()))?;
            let value: f64 = cell
                .trim()
                .parse()
                .map_err(|_| MalformedRow::BadSignal(name.clone()))?;
            signal.push(value);
        }

        Ok(RowRecord { id, signal, label })
    }
}
