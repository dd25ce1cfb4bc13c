//! Decoded tabular data.
//!
//! `RawTable` holds rectangular numeric rows as decoded from text;
//! `LabeledTable` attaches a `ColumnLayout` and is the unit of work
//! passed to computed-column evaluation, aggregation and output.

use crate::schema::{ColumnLabel, ColumnLayout};

/// Rectangular numeric data in file row order, no header.
///
/// Invariant: every pushed row has exactly `width` fields. The loader
/// enforces this before construction; `push_row` only double-checks.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    width: usize,
    rows: Vec<Vec<f64>>,
}

impl RawTable {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            rows: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn push_row(&mut self, row: Vec<f64>) {
        debug_assert_eq!(row.len(), self.width);
        self.rows.push(row);
    }

    /// Transpose into column-major storage.
    pub fn into_columns(self) -> Vec<Vec<f64>> {
        let mut columns = vec![Vec::with_capacity(self.rows.len()); self.width];
        for row in self.rows {
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        columns
    }
}

/// Per-column summary statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation (n-1 denominator); 0.0 for fewer than
    /// two rows.
    pub std: f64,
}

impl ColumnStats {
    pub fn mean_plus_3_std(&self) -> f64 {
        self.mean + 3.0 * self.std
    }

    pub fn mean_minus_3_std(&self) -> f64 {
        self.mean - 3.0 * self.std
    }
}

/// A decoded table: column-major numeric data plus its column labels.
///
/// Labels act as the formal column identifiers. Instances are owned
/// end-to-end by one operation; nothing here is shared or mutated in
/// place across operations.
#[derive(Debug, Clone)]
pub struct LabeledTable {
    layout: ColumnLayout,
    columns: Vec<Vec<f64>>,
}

impl LabeledTable {
    /// Build from column-major data. The layout length must equal the
    /// column count and all columns must have equal length; callers
    /// (the loader, the evaluator) establish this before constructing.
    pub fn new(layout: ColumnLayout, columns: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(layout.len(), columns.len());
        debug_assert!(columns.windows(2).all(|w| w[0].len() == w[1].len()));
        Self { layout, columns }
    }

    /// Build from row-major raw data.
    pub fn from_raw(raw: RawTable, layout: ColumnLayout) -> Self {
        debug_assert_eq!(layout.len(), raw.width());
        let columns = raw.into_columns();
        Self { layout, columns }
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn labels(&self) -> Vec<String> {
        self.layout.labels()
    }

    /// Position of a column by its label.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.layout.iter().position(|c| c.label == label)
    }

    pub fn column(&self, label: &str) -> Option<&[f64]> {
        self.column_index(label)
            .map(|index| self.columns[index].as_slice())
    }

    pub fn column_at(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// A copy of this table with one column appended, or replaced in
    /// place when a column of the same label already exists.
    pub fn with_column(&self, label: impl Into<String>, values: Vec<f64>) -> Self {
        let label = label.into();
        let mut result = self.clone();
        match result.column_index(&label) {
            Some(index) => {
                result.columns[index] = values;
            }
            None => {
                result.layout.push(ColumnLabel::new(label, ""));
                result.columns.push(values);
            }
        }
        result
    }

    /// The first `n` rows, row-major, for preview output.
    pub fn head(&self, n: usize) -> Vec<Vec<f64>> {
        let rows = self.n_rows().min(n);
        (0..rows)
            .map(|r| self.columns.iter().map(|c| c[r]).collect())
            .collect()
    }

    /// Summary statistics of one column, `None` for an unknown label or
    /// an empty table.
    pub fn column_stats(&self, label: &str) -> Option<ColumnStats> {
        let values = self.column(label)?;
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        let mean = sum / n;

        let std = if values.len() < 2 {
            0.0
        } else {
            let ss: f64 = values.iter().map(|&v| (v - mean) * (v - mean)).sum();
            (ss / (n - 1.0)).sqrt()
        };

        Some(ColumnStats {
            min,
            max,
            mean,
            std,
        })
    }

    /// Render as delimited text with a header row.
    pub fn to_delimited(&self, delimiter: char) -> String {
        let sep = delimiter.to_string();
        let mut out = String::new();
        out.push_str(&self.labels().join(sep.as_str()));
        out.push('\n');
        for r in 0..self.n_rows() {
            let row: Vec<String> = self.columns.iter().map(|c| c[r].to_string()).collect();
            out.push_str(&row.join(sep.as_str()));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileKind, UnitConfig};
    use crate::schema::labels_for;

    fn sample_table() -> LabeledTable {
        let layout = labels_for(FileKind::Tensions, 3, &UnitConfig::default());
        LabeledTable::new(
            layout,
            vec![
                vec![0.0, 0.5, 1.0],
                vec![10.0, 12.0, 11.0],
                vec![20.0, 18.0, 19.0],
            ],
        )
    }

    #[test]
    fn test_raw_table_transpose() {
        let mut raw = RawTable::new(2);
        raw.push_row(vec![1.0, 2.0]);
        raw.push_row(vec![3.0, 4.0]);
        let columns = raw.into_columns();
        assert_eq!(columns, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }

    #[test]
    fn test_column_lookup() {
        let table = sample_table();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.n_cols(), 3);
        assert_eq!(table.column("t [s]").unwrap(), &[0.0, 0.5, 1.0]);
        assert_eq!(table.column("T_2 [N]").unwrap(), &[20.0, 18.0, 19.0]);
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_with_column_appends() {
        let table = sample_table();
        let extended = table.with_column("Computed", vec![1.0, 2.0, 3.0]);
        assert_eq!(extended.n_cols(), 4);
        assert_eq!(extended.column("Computed").unwrap(), &[1.0, 2.0, 3.0]);
        // Source table is untouched.
        assert_eq!(table.n_cols(), 3);
    }

    #[test]
    fn test_with_column_replaces_in_place() {
        let table = sample_table();
        let replaced = table.with_column("T_1 [N]", vec![0.0, 0.0, 0.0]);
        assert_eq!(replaced.n_cols(), 3);
        assert_eq!(replaced.column("T_1 [N]").unwrap(), &[0.0, 0.0, 0.0]);
        assert_eq!(replaced.labels(), table.labels());
    }

    #[test]
    fn test_column_stats() {
        let table = sample_table();
        let stats = table.column_stats("T_1 [N]").unwrap();
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 12.0);
        assert!((stats.mean - 11.0).abs() < 1e-12);
        assert!((stats.std - 1.0).abs() < 1e-12);
        assert!((stats.mean_plus_3_std() - 14.0).abs() < 1e-12);
        assert!((stats.mean_minus_3_std() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_head_preview() {
        let table = sample_table();
        let head = table.head(2);
        assert_eq!(head, vec![vec![0.0, 10.0, 20.0], vec![0.5, 12.0, 18.0]]);
        assert_eq!(table.head(10).len(), 3);
    }

    #[test]
    fn test_to_delimited() {
        let table = sample_table();
        let text = table.to_delimited('\t');
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "t [s]\tT_1 [N]\tT_2 [N]");
        assert_eq!(lines.next().unwrap(), "0\t10\t20");
    }
}
