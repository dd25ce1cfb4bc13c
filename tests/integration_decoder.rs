//! Integration tests for decoding real results files from disk
//!
//! These tests write sample ProteusDS output files to a temporary
//! directory and verify end-to-end decoding, connection selection and
//! computed-column evaluation.

use std::fs;

use tempfile::TempDir;

use proteus_processor::formula::add_computed_column;
use proteus_processor::loader::{decode_file, ConnectionSelector, LoadOptions};
use proteus_processor::{ProteusError, UnitConfig};

/// Build a data line with `count` sequential values after the time field.
fn data_line(time: f64, first: f64, count: usize) -> String {
    let mut fields = vec![format!("{}", time)];
    for i in 0..count {
        fields.push(format!("{}", first + i as f64));
    }
    fields.join(" ")
}

/// Test decoding a tensions file written to disk
///
/// Purpose: Validate end-to-end decoding of the dynamically-sized kind
/// Benefit: Ensures skip rows, labels and values survive the round trip
#[test]
fn test_decode_tensions_from_disk() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tensions.dat");
    fs::write(
        &path,
        "# ProteusDS output\n\
         # cable node tensions\n\
         0.0 100.0 200.0 300.0 400.0\n\
         0.1 101.0 201.0 301.0 401.0\n\
         0.2 102.0 202.0 302.0 402.0\n",
    )
    .unwrap();

    let table = decode_file(&path, &LoadOptions::default()).unwrap();

    assert_eq!(table.n_rows(), 3);
    assert_eq!(table.n_cols(), 5);
    assert_eq!(
        table.labels(),
        vec!["t [s]", "T_1 [N]", "T_2 [N]", "T_3 [N]", "T_4 [N]"]
    );
    assert_eq!(table.column("t [s]").unwrap(), &[0.0, 0.1, 0.2]);
    assert_eq!(table.column("T_1 [N]").unwrap(), &[100.0, 101.0, 102.0]);
    assert_eq!(table.column("T_4 [N]").unwrap(), &[400.0, 401.0, 402.0]);
}

/// Test decoding one connection of a force connection file
///
/// Purpose: Validate connection-name extraction and column-group slicing
/// Benefit: Ensures the group offset arithmetic holds on real file text
#[test]
fn test_decode_force_connection_group() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rigidBodyForceConnection.dat");

    let mut content = String::new();
    content.push_str("# ProteusDS output\n");
    content.push_str("# rigid body force connections\n");
    content.push_str("# M1 M2 M3\n");
    content.push_str(&data_line(0.0, 1.0, 18));
    content.push('\n');
    content.push_str(&data_line(0.1, 101.0, 18));
    content.push('\n');
    fs::write(&path, content).unwrap();

    let options =
        LoadOptions::default().with_connection(ConnectionSelector::Name("M2".to_string()));
    let table = decode_file(&path, &options).unwrap();

    assert_eq!(table.n_rows(), 2);
    assert_eq!(table.n_cols(), 7);
    assert_eq!(
        table.labels(),
        vec!["t [s]", "dx m", "dy m", "dz m", "Fx N", "Fy N", "Fz N"]
    );
    // M2 is ordinal 1, so its block starts at column 7.
    assert_eq!(table.column("dx m").unwrap(), &[7.0, 107.0]);
    assert_eq!(table.column("Fz N").unwrap(), &[12.0, 112.0]);
}

/// Test decoding the wide ABA connection variant
///
/// Purpose: Validate the 12-column group width on a two-connection file
/// Benefit: Ensures the wide variant selects the correct block
#[test]
fn test_decode_aba_connection_wide_groups() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rigidBodyABAConnection.dat");

    let mut content = String::new();
    content.push_str("# ProteusDS output\n");
    content.push_str("# ABA connections\n");
    content.push_str("# A B\n");
    content.push_str(&data_line(0.0, 1.0, 24));
    content.push('\n');
    fs::write(&path, content).unwrap();

    let options = LoadOptions::default().with_connection(ConnectionSelector::Ordinal(1));
    let table = decode_file(&path, &options).unwrap();

    assert_eq!(table.n_cols(), 13);
    // Connection B occupies columns 13..=24.
    assert_eq!(table.column("FXu N").unwrap(), &[13.0]);
    assert_eq!(table.column("MZd N-m").unwrap(), &[24.0]);
}

/// Test a computed column over a decoded connection file
///
/// Purpose: Validate the formula path against real decoded labels
/// Benefit: Ensures short channel names resolve inside formulas
#[test]
fn test_computed_column_on_decoded_table() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rigidBodyForceConnection.dat");

    let mut content = String::new();
    content.push_str("# ProteusDS output\n");
    content.push_str("# rigid body force connections\n");
    content.push_str("# M1\n");
    content.push_str("0.0 3.0 4.0 0.0 1.0 2.0 2.0\n");
    content.push_str("0.1 6.0 8.0 0.0 1.0 2.0 2.0\n");
    fs::write(&path, content).unwrap();

    let options = LoadOptions::default().with_connection(ConnectionSelector::Ordinal(0));
    let table = decode_file(&path, &options).unwrap();

    let allowed = vec!["dx m".to_string(), "dy m".to_string()];
    let with_offset =
        add_computed_column(&table, &allowed, "np.sqrt(dx**2 + dy**2)", "offset").unwrap();

    assert_eq!(with_offset.column("offset").unwrap(), &[5.0, 10.0]);

    // A reference outside the whitelist fails and leaves the table alone.
    let err = add_computed_column(&table, &allowed, "dz * 2", "bad").unwrap_err();
    assert!(matches!(err, ProteusError::Formula { .. }));
    assert!(table.column("bad").is_none());
}

/// Test unit overrides flowing through to labels
///
/// Purpose: Validate the configurable-units variant end to end
/// Benefit: Ensures one immutable config drives every label
#[test]
fn test_unit_overrides() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("position.dat");
    fs::write(
        &path,
        "# ProteusDS output\n\
         # body position\n\
         0.0 1.0 2.0 3.0 4.0 5.0 6.0\n",
    )
    .unwrap();

    let units = UnitConfig::default().with_linear("ft").with_angular("rad");
    let options = LoadOptions::default().with_units(units);
    let table = decode_file(&path, &options).unwrap();

    assert_eq!(
        table.labels(),
        vec!["t [s]", "x ft", "y ft", "z ft", "phi rad", "theta rad", "psi rad"]
    );
}

/// Test rejection of file names outside the closed set
///
/// Purpose: Validate the supported-name gate ahead of parsing
/// Benefit: Ensures unsupported inputs fail fast with a clear error
#[test]
fn test_unsupported_file_name() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("velocity.dat");
    fs::write(&path, "# h\n# h\n0.0 1.0\n").unwrap();

    let err = decode_file(&path, &LoadOptions::default()).unwrap_err();
    match err {
        ProteusError::UnsupportedFileName { name } => assert_eq!(name, "velocity.dat"),
        other => panic!("expected UnsupportedFileName, got {other:?}"),
    }
}

/// Test extra skip rows and the empty-table edge
///
/// Purpose: Validate user-supplied skip offsets on disk files
/// Benefit: Ensures overskipping degrades to an empty labeled table
#[test]
fn test_extra_skip_rows_and_overskip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tensions.dat");
    fs::write(
        &path,
        "# h\n# h\n0.0 1.0 2.0\n0.1 1.1 2.1\n0.2 1.2 2.2\n",
    )
    .unwrap();

    let options = LoadOptions::default().with_extra_skip_rows(2);
    let table = decode_file(&path, &options).unwrap();
    assert_eq!(table.n_rows(), 1);
    assert_eq!(table.column("t [s]").unwrap(), &[0.2]);

    let options = LoadOptions::default().with_extra_skip_rows(50);
    let empty = decode_file(&path, &options).unwrap();
    assert_eq!(empty.n_rows(), 0);
    assert_eq!(empty.n_cols(), 3);
}
