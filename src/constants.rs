//! Application constants for the ProteusDS result processor
//!
//! This module contains the closed sets of supported file names, unit
//! defaults and choice lists, and the directory-name conventions used by
//! the batch aggregation walker.

// =============================================================================
// Supported File Names
// =============================================================================

/// The closed set of ProteusDS output files this tool can decode.
pub const SUPPORTED_FILE_NAMES: &[&str] = &[
    "tensions.dat",
    "position.dat",
    "forces.dat",
    "rigidBodyForceConnection.dat",
    "rigidBodyMomentConnection.dat",
    "rigidBodyABAConnection.dat",
    "reactionLoads.dat",
    "cablePointConnection.dat",
];

/// Files whose rows pack several named instrument groups side by side.
pub const CONNECTION_FILE_NAMES: &[&str] = &[
    "rigidBodyForceConnection.dat",
    "rigidBodyMomentConnection.dat",
    "rigidBodyABAConnection.dat",
    "cablePointConnection.dat",
];

/// Data columns occupied by one connection group.
pub const CONNECTION_GROUP_WIDTH: usize = 6;

/// The ABA connection file carries two stacked force/moment groups.
pub const ABA_GROUP_WIDTH: usize = 12;

// =============================================================================
// Directory Layout
// =============================================================================

/// Top-level scenario directory prefix under the base folder.
pub const CASE_DIR_PREFIX: &str = "Case";

/// Per-case repetition directory prefix.
pub const REALIZATION_DIR_PREFIX: &str = "Realization";

/// Results directory name within each realization.
pub const RESULTS_DIR_NAME: &str = "Results";

/// Directories under `Results/` that are not simulation features.
pub const RESERVED_RESULT_DIRS: &[&str] = &["TerminalIC", "SolverData", "Restart", "Initial"];

// =============================================================================
// Units
// =============================================================================

/// Default force unit.
pub const DEFAULT_FORCE_UNIT: &str = "N";

/// Default moment unit.
pub const DEFAULT_MOMENT_UNIT: &str = "N-m";

/// Default linear unit.
pub const DEFAULT_LINEAR_UNIT: &str = "m";

/// Default angular unit.
pub const DEFAULT_ANGULAR_UNIT: &str = "deg";

/// Selectable force units.
pub const FORCE_UNITS: &[&str] = &["N", "kN", "MN", "T", "kg", "lbf", "kip"];

/// Selectable moment units.
pub const MOMENT_UNITS: &[&str] = &["N-m", "kN-m", "MN-m", "lb-ft", "lb-in", "kip-ft"];

/// Selectable linear units.
pub const LINEAR_UNITS: &[&str] = &["m", "mm", "cm", "ft", "in"];

/// Selectable angular units.
pub const ANGULAR_UNITS: &[&str] = &["deg", "rad"];

// =============================================================================
// Statistic Row Labels
// =============================================================================

/// Row label for per-column maxima.
pub const STAT_ROW_MAX: &str = "Max";

/// Row label for per-column minima.
pub const STAT_ROW_MIN: &str = "Min";

/// Row label for per-column means.
pub const STAT_ROW_MEAN: &str = "Mean";

// =============================================================================
// Misc
// =============================================================================

/// Default name for a user-computed column.
pub const DEFAULT_COMPUTED_COLUMN_NAME: &str = "Computed";

/// Rows shown by the data preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

// =============================================================================
// Helper Functions
// =============================================================================

/// Check whether a file basename is in the supported closed set.
pub fn is_supported_file_name(name: &str) -> bool {
    SUPPORTED_FILE_NAMES.contains(&name)
}

/// Check whether a `Results/` child directory name is a real feature.
pub fn is_feature_dir_name(name: &str) -> bool {
    !RESERVED_RESULT_DIRS.contains(&name)
}

/// Check whether a unit string is a known choice for its category.
pub fn is_known_unit(choices: &[&str], unit: &str) -> bool {
    choices.contains(&unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_file_names() {
        assert!(is_supported_file_name("tensions.dat"));
        assert!(is_supported_file_name("cablePointConnection.dat"));
        assert!(!is_supported_file_name("Tensions.dat")); // Case sensitive
        assert!(!is_supported_file_name("tensions"));
        assert!(!is_supported_file_name("velocity.dat"));
    }

    #[test]
    fn test_connection_subset() {
        for name in CONNECTION_FILE_NAMES {
            assert!(SUPPORTED_FILE_NAMES.contains(name));
        }
    }

    #[test]
    fn test_feature_dir_names() {
        assert!(is_feature_dir_name("M1"));
        assert!(is_feature_dir_name("mooringCable"));
        assert!(!is_feature_dir_name("TerminalIC"));
        assert!(!is_feature_dir_name("SolverData"));
        assert!(!is_feature_dir_name("Restart"));
        assert!(!is_feature_dir_name("Initial"));
    }

    #[test]
    fn test_default_units_are_selectable() {
        assert!(is_known_unit(FORCE_UNITS, DEFAULT_FORCE_UNIT));
        assert!(is_known_unit(MOMENT_UNITS, DEFAULT_MOMENT_UNIT));
        assert!(is_known_unit(LINEAR_UNITS, DEFAULT_LINEAR_UNIT));
        assert!(is_known_unit(ANGULAR_UNITS, DEFAULT_ANGULAR_UNIT));
    }
}
