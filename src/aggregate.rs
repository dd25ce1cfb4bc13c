//! Columnwise aggregation of decoded tables.
//!
//! Aggregators reduce one `LabeledTable` to a small table of labeled
//! statistic rows; `combine` then reduces many per-file results into a
//! single summary across all Cases and Realizations.

use serde::{Deserialize, Serialize};

use crate::constants::{STAT_ROW_MAX, STAT_ROW_MEAN, STAT_ROW_MIN};
use crate::error::{ProteusError, Result};
use crate::table::LabeledTable;

/// One labeled statistic row.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRow {
    /// Statistic label, e.g. `Max`.
    pub statistic: String,
    /// One value per source column.
    pub values: Vec<f64>,
}

/// A small table of statistic rows sharing the source table's column
/// labels.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    labels: Vec<String>,
    rows: Vec<AggregationRow>,
}

impl AggregationResult {
    fn new(labels: Vec<String>, rows: Vec<AggregationRow>) -> Self {
        debug_assert!(rows.iter().all(|r| r.values.len() == labels.len()));
        Self { labels, rows }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn rows(&self) -> &[AggregationRow] {
        &self.rows
    }

    /// Values of one statistic row by label.
    pub fn row(&self, statistic: &str) -> Option<&[f64]> {
        self.rows
            .iter()
            .find(|r| r.statistic == statistic)
            .map(|r| r.values.as_slice())
    }

    /// One cell by statistic and column label.
    pub fn value(&self, statistic: &str, column: &str) -> Option<f64> {
        let index = self.labels.iter().position(|l| l == column)?;
        self.row(statistic).map(|values| values[index])
    }

    /// Render as delimited text, statistic label first.
    pub fn to_delimited(&self, delimiter: char) -> String {
        let sep = delimiter.to_string();
        let mut out = String::new();
        out.push_str("statistic");
        out.push(delimiter);
        out.push_str(&self.labels.join(sep.as_str()));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.statistic);
            for value in &row.values {
                out.push(delimiter);
                out.push_str(&value.to_string());
            }
            out.push('\n');
        }
        out
    }
}

/// Reject tables an aggregator cannot reduce.
fn check_aggregable(table: &LabeledTable) -> Result<()> {
    if table.n_rows() == 0 {
        return Err(ProteusError::aggregation(
            "cannot aggregate a table with zero rows",
        ));
    }
    for label in table.labels() {
        let values = table.column(&label).unwrap_or_default();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ProteusError::aggregation(format!(
                "column '{}' contains non-finite values",
                label
            )));
        }
    }
    Ok(())
}

fn column_reduce(table: &LabeledTable, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    (0..table.n_cols())
        .map(|i| f(table.column_at(i).unwrap_or_default()))
        .collect()
}

/// Reduces one decoded table to labeled statistic rows.
pub trait Aggregator {
    /// Human-readable name for reports.
    fn name(&self) -> &'static str;

    fn aggregate(&self, table: &LabeledTable) -> Result<AggregationResult>;
}

/// Per-column maxima and minima, as two rows `Max` and `Min`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentWiseExtremaAggregator;

impl Aggregator for ComponentWiseExtremaAggregator {
    fn name(&self) -> &'static str {
        "component-wise extrema"
    }

    fn aggregate(&self, table: &LabeledTable) -> Result<AggregationResult> {
        check_aggregable(table)?;

        let max = column_reduce(table, |values| {
            values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        });
        let min = column_reduce(table, |values| {
            values.iter().copied().fold(f64::INFINITY, f64::min)
        });

        Ok(AggregationResult::new(
            table.labels(),
            vec![
                AggregationRow {
                    statistic: STAT_ROW_MAX.to_string(),
                    values: max,
                },
                AggregationRow {
                    statistic: STAT_ROW_MIN.to_string(),
                    values: min,
                },
            ],
        ))
    }
}

/// Per-column arithmetic mean, as one row `Mean`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeanAggregator;

impl Aggregator for MeanAggregator {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn aggregate(&self, table: &LabeledTable) -> Result<AggregationResult> {
        check_aggregable(table)?;

        let mean = column_reduce(table, |values| {
            values.iter().sum::<f64>() / values.len() as f64
        });

        Ok(AggregationResult::new(
            table.labels(),
            vec![AggregationRow {
                statistic: STAT_ROW_MEAN.to_string(),
                values: mean,
            }],
        ))
    }
}

/// Aggregation method selector for configuration and CLI use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationMethod {
    Extrema,
    Mean,
}

impl AggregationMethod {
    pub fn aggregator(&self) -> Box<dyn Aggregator> {
        match self {
            AggregationMethod::Extrema => Box::new(ComponentWiseExtremaAggregator),
            AggregationMethod::Mean => Box::new(MeanAggregator),
        }
    }
}

/// Combine per-file aggregation results into one summary.
///
/// `Max` rows reduce by elementwise maximum, `Min` rows by elementwise
/// minimum and `Mean` rows by the arithmetic mean of means (every file
/// weighted equally). All inputs must share the same column labels and
/// the same statistic rows.
pub fn combine(results: &[AggregationResult]) -> Result<AggregationResult> {
    let first = results
        .first()
        .ok_or_else(|| ProteusError::aggregation("nothing to combine: no per-file results"))?;

    for result in &results[1..] {
        if result.labels != first.labels {
            return Err(ProteusError::aggregation(format!(
                "column labels differ between files: [{}] vs [{}]",
                first.labels.join(", "),
                result.labels.join(", ")
            )));
        }
        let statistics =
            |r: &AggregationResult| r.rows.iter().map(|row| row.statistic.clone()).collect::<Vec<_>>();
        if statistics(result) != statistics(first) {
            return Err(ProteusError::aggregation(
                "statistic rows differ between files",
            ));
        }
    }

    let width = first.labels.len();
    let mut rows = Vec::with_capacity(first.rows.len());

    for (row_index, row) in first.rows.iter().enumerate() {
        let mut values = Vec::with_capacity(width);
        for col in 0..width {
            let cells = results.iter().map(|r| r.rows[row_index].values[col]);
            let combined = match row.statistic.as_str() {
                STAT_ROW_MAX => cells.fold(f64::NEG_INFINITY, f64::max),
                STAT_ROW_MIN => cells.fold(f64::INFINITY, f64::min),
                STAT_ROW_MEAN => cells.sum::<f64>() / results.len() as f64,
                other => {
                    return Err(ProteusError::aggregation(format!(
                        "no combination rule for statistic row '{}'",
                        other
                    )));
                }
            };
            values.push(combined);
        }
        rows.push(AggregationRow {
            statistic: row.statistic.clone(),
            values,
        });
    }

    Ok(AggregationResult::new(first.labels.clone(), rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnLabel, ColumnLayout};

    fn table_with(columns: &[(&str, Vec<f64>)]) -> LabeledTable {
        let layout: ColumnLayout = columns
            .iter()
            .map(|(label, _)| ColumnLabel::new(*label, ""))
            .collect();
        LabeledTable::new(layout, columns.iter().map(|(_, v)| v.clone()).collect())
    }

    #[test]
    fn test_extrema_aggregator() {
        let table = table_with(&[("a", vec![1.0, 5.0, 3.0]), ("b", vec![9.0, 2.0, 4.0])]);
        let result = ComponentWiseExtremaAggregator.aggregate(&table).unwrap();

        assert_eq!(result.row("Max").unwrap(), &[5.0, 9.0]);
        assert_eq!(result.row("Min").unwrap(), &[1.0, 2.0]);
        assert_eq!(result.value("Max", "b"), Some(9.0));
        assert_eq!(result.value("Min", "a"), Some(1.0));
    }

    #[test]
    fn test_mean_aggregator() {
        let table = table_with(&[("a", vec![1.0, 2.0, 3.0]), ("b", vec![4.0, 4.0, 4.0])]);
        let result = MeanAggregator.aggregate(&table).unwrap();
        assert_eq!(result.row("Mean").unwrap(), &[2.0, 4.0]);
    }

    #[test]
    fn test_empty_table_rejected() {
        let table = table_with(&[("a", vec![])]);
        for method in [AggregationMethod::Extrema, AggregationMethod::Mean] {
            let err = method.aggregator().aggregate(&table).unwrap_err();
            assert!(matches!(err, ProteusError::Aggregation { .. }));
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let table = table_with(&[("a", vec![1.0, f64::NAN])]);
        let err = MeanAggregator.aggregate(&table).unwrap_err();
        assert!(matches!(err, ProteusError::Aggregation { .. }));
    }

    #[test]
    fn test_combine_extrema() {
        let a = ComponentWiseExtremaAggregator
            .aggregate(&table_with(&[("x", vec![1.0, 7.0])]))
            .unwrap();
        let b = ComponentWiseExtremaAggregator
            .aggregate(&table_with(&[("x", vec![-3.0, 4.0])]))
            .unwrap();

        let combined = combine(&[a, b]).unwrap();
        assert_eq!(combined.row("Max").unwrap(), &[7.0]);
        assert_eq!(combined.row("Min").unwrap(), &[-3.0]);
    }

    #[test]
    fn test_combine_means() {
        let a = MeanAggregator
            .aggregate(&table_with(&[("x", vec![2.0, 4.0])]))
            .unwrap();
        let b = MeanAggregator
            .aggregate(&table_with(&[("x", vec![6.0, 8.0])]))
            .unwrap();

        let combined = combine(&[a, b]).unwrap();
        assert_eq!(combined.row("Mean").unwrap(), &[5.0]);
    }

    #[test]
    fn test_combine_rejects_mismatched_labels() {
        let a = MeanAggregator
            .aggregate(&table_with(&[("x", vec![1.0])]))
            .unwrap();
        let b = MeanAggregator
            .aggregate(&table_with(&[("y", vec![1.0])]))
            .unwrap();

        let err = combine(&[a, b]).unwrap_err();
        assert!(matches!(err, ProteusError::Aggregation { .. }));
    }

    #[test]
    fn test_combine_empty_input() {
        let err = combine(&[]).unwrap_err();
        assert!(matches!(err, ProteusError::Aggregation { .. }));
    }
}
