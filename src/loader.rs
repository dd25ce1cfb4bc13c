//! Delimited-text decoding into labeled tables.
//!
//! The core decoder skips a header, splits each remaining line on the
//! configured delimiter (or any whitespace), retains the requested
//! column indices in order and coerces every retained field to `f64`.
//! Orchestration on top resolves the file kind, the connection group
//! and the column layout before delegating to the core decoder.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ProteusError, Result};
use crate::header;
use crate::models::{FileKind, UnitConfig};
use crate::schema::labels_for;
use crate::table::{LabeledTable, RawTable};

/// How a connection group is picked when decoding a connection file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSelector {
    /// 0-based position in the decoded name list.
    Ordinal(usize),
    /// Exact name from the header comment row.
    Name(String),
}

/// Options applied when decoding one results file.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Field delimiter; `None` splits on any whitespace run.
    pub delimiter: Option<char>,
    /// Rows skipped after the header, e.g. to drop transient startup data.
    pub extra_skip_rows: usize,
    /// Connection choice; required for connection file kinds.
    pub connection: Option<ConnectionSelector>,
    /// Units used for column labels.
    pub units: UnitConfig,
}

impl LoadOptions {
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_extra_skip_rows(mut self, rows: usize) -> Self {
        self.extra_skip_rows = rows;
        self
    }

    pub fn with_connection(mut self, selector: ConnectionSelector) -> Self {
        self.connection = Some(selector);
        self
    }

    pub fn with_units(mut self, units: UnitConfig) -> Self {
        self.units = units;
        self
    }
}

/// Split one data line into fields. Runs of the delimiter collapse, so
/// aligned columns padded with extra spaces decode cleanly.
fn split_fields<'a>(line: &'a str, delimiter: Option<char>) -> Vec<&'a str> {
    match delimiter {
        Some(d) => line.split(d).filter(|f| !f.is_empty()).collect(),
        None => line.split_whitespace().collect(),
    }
}

/// Decode delimited numeric text into a labeled table.
///
/// Parsing starts after `skip_rows` lines; only `column_indices` are
/// retained per row, in the order given. Labels are assigned from the
/// *resulting* column count so that dynamically-sized kinds label
/// correctly. Skipping past end-of-file yields an empty table.
pub fn load(
    file_name: &str,
    text: &str,
    delimiter: Option<char>,
    skip_rows: usize,
    column_indices: &[usize],
    kind: FileKind,
    units: &UnitConfig,
) -> Result<LabeledTable> {
    let max_index = column_indices.iter().copied().max().unwrap_or(0);
    let mut raw = RawTable::new(column_indices.len());

    for (line_index, line) in text.lines().enumerate() {
        if line_index < skip_rows {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_fields(line, delimiter);
        if fields.len() <= max_index {
            return Err(ProteusError::RowWidthMismatch {
                file: file_name.to_string(),
                line: line_index,
                expected: max_index + 1,
                found: fields.len(),
            });
        }

        let mut row = Vec::with_capacity(column_indices.len());
        for &index in column_indices {
            let token = fields[index];
            let value: f64 = token.parse().map_err(|_| ProteusError::InvalidNumber {
                file: file_name.to_string(),
                line: line_index,
                token: token.to_string(),
            })?;
            row.push(value);
        }
        raw.push_row(row);
    }

    let layout = labels_for(kind, column_indices.len(), units);
    if layout.len() != column_indices.len() {
        return Err(ProteusError::MalformedHeader {
            file: file_name.to_string(),
            reason: format!(
                "{} expects {} columns, found {}",
                kind,
                layout.len(),
                column_indices.len()
            ),
        });
    }

    debug!(
        "Decoded {}: {} rows x {} columns (skip {})",
        file_name,
        raw.n_rows(),
        raw.width(),
        skip_rows
    );

    Ok(LabeledTable::from_raw(raw, layout))
}

/// Resolve which absolute column indices to retain for a file.
fn resolve_indices(
    file_name: &str,
    text: &str,
    kind: FileKind,
    options: &LoadOptions,
) -> Result<Vec<usize>> {
    if kind.is_connection() {
        let groups = header::connection_groups(text, kind)?;
        let selector = options.connection.as_ref().ok_or_else(|| {
            ProteusError::configuration(format!(
                "{} is a connection file; pick one of: {}",
                file_name,
                groups
                    .iter()
                    .map(|g| g.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        let group = match selector {
            ConnectionSelector::Ordinal(ordinal) => groups.get(*ordinal).ok_or_else(|| {
                ProteusError::configuration(format!(
                    "connection index {} out of range: {} has {} connections",
                    ordinal,
                    file_name,
                    groups.len()
                ))
            })?,
            ConnectionSelector::Name(name) => {
                groups.iter().find(|g| &g.name == name).ok_or_else(|| {
                    ProteusError::configuration(format!(
                        "connection '{}' not found in {}; available: {}",
                        name,
                        file_name,
                        groups
                            .iter()
                            .map(|g| g.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                })?
            }
        };

        debug!(
            "Selected connection '{}' (ordinal {}) in {}",
            group.name, group.ordinal, file_name
        );
        Ok(group.column_indices())
    } else {
        // Plain kinds retain every column; the first data row fixes the width.
        let first_data_line = text
            .lines()
            .nth(kind.header_skip_rows())
            .filter(|line| !line.trim().is_empty())
            .ok_or_else(|| ProteusError::MalformedHeader {
                file: file_name.to_string(),
                reason: "no data row to determine the column layout".to_string(),
            })?;

        let width = split_fields(first_data_line, options.delimiter).len();
        Ok((0..width).collect())
    }
}

/// Decode one results file from text already in memory.
///
/// The file name decides the kind (closed set, exact match), the header
/// skip count and the column layout.
pub fn decode_str(file_name: &str, text: &str, options: &LoadOptions) -> Result<LabeledTable> {
    let kind =
        FileKind::from_file_name(file_name).ok_or_else(|| ProteusError::UnsupportedFileName {
            name: file_name.to_string(),
        })?;

    let column_indices = resolve_indices(file_name, text, kind, options)?;
    let skip_rows = kind.header_skip_rows() + options.extra_skip_rows;

    load(
        file_name,
        text,
        options.delimiter,
        skip_rows,
        &column_indices,
        kind,
        &options.units,
    )
}

/// Decode one results file from disk.
pub fn decode_file(path: &Path, options: &LoadOptions) -> Result<LabeledTable> {
    if !path.exists() {
        return Err(ProteusError::PathNotFound {
            path: path.to_path_buf(),
        });
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ProteusError::UnsupportedFileName {
            name: path.display().to_string(),
        })?;

    let text = fs::read_to_string(path)?;
    decode_str(file_name, &text, options)
}
