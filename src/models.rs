//! Core data structures and types for ProteusDS result processing.
//!
//! Defines the catalog of supported file kinds, unit configuration,
//! connection groups, and batch processing statistics.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    ABA_GROUP_WIDTH, CONNECTION_GROUP_WIDTH, DEFAULT_ANGULAR_UNIT, DEFAULT_FORCE_UNIT,
    DEFAULT_LINEAR_UNIT, DEFAULT_MOMENT_UNIT,
};

/// Output file kinds produced by the simulator.
///
/// The set is closed: file names are matched exactly and case-sensitively,
/// and anything else is rejected before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Tensions,
    Position,
    Forces,
    RigidBodyForceConnection,
    RigidBodyMomentConnection,
    RigidBodyAbaConnection,
    ReactionLoads,
    CablePointConnection,
}

impl FileKind {
    /// Match a file basename against the closed set of supported names.
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "tensions.dat" => Some(FileKind::Tensions),
            "position.dat" => Some(FileKind::Position),
            "forces.dat" => Some(FileKind::Forces),
            "rigidBodyForceConnection.dat" => Some(FileKind::RigidBodyForceConnection),
            "rigidBodyMomentConnection.dat" => Some(FileKind::RigidBodyMomentConnection),
            "rigidBodyABAConnection.dat" => Some(FileKind::RigidBodyAbaConnection),
            "reactionLoads.dat" => Some(FileKind::ReactionLoads),
            "cablePointConnection.dat" => Some(FileKind::CablePointConnection),
            _ => None,
        }
    }

    /// The exact basename this kind is written under.
    pub fn file_name(&self) -> &'static str {
        match self {
            FileKind::Tensions => "tensions.dat",
            FileKind::Position => "position.dat",
            FileKind::Forces => "forces.dat",
            FileKind::RigidBodyForceConnection => "rigidBodyForceConnection.dat",
            FileKind::RigidBodyMomentConnection => "rigidBodyMomentConnection.dat",
            FileKind::RigidBodyAbaConnection => "rigidBodyABAConnection.dat",
            FileKind::ReactionLoads => "reactionLoads.dat",
            FileKind::CablePointConnection => "cablePointConnection.dat",
        }
    }

    /// Whether rows pack several named connection groups side by side.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            FileKind::RigidBodyForceConnection
                | FileKind::RigidBodyMomentConnection
                | FileKind::RigidBodyAbaConnection
                | FileKind::CablePointConnection
        )
    }

    /// Header lines before the first data row.
    pub fn header_skip_rows(&self) -> usize {
        match self {
            FileKind::CablePointConnection => 4,
            FileKind::Tensions | FileKind::Position | FileKind::Forces => 2,
            _ => 3,
        }
    }

    /// Data columns occupied by one connection group.
    ///
    /// Only meaningful for connection kinds; the ABA file stacks two
    /// force/moment groups per connection.
    pub fn group_width(&self) -> usize {
        match self {
            FileKind::RigidBodyAbaConnection => ABA_GROUP_WIDTH,
            _ => CONNECTION_GROUP_WIDTH,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Units used when generating column labels.
///
/// Immutable once constructed; pass a reference into label generation
/// rather than mutating shared state between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConfig {
    pub force: String,
    pub moment: String,
    pub linear: String,
    pub angular: String,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            force: DEFAULT_FORCE_UNIT.to_string(),
            moment: DEFAULT_MOMENT_UNIT.to_string(),
            linear: DEFAULT_LINEAR_UNIT.to_string(),
            angular: DEFAULT_ANGULAR_UNIT.to_string(),
        }
    }
}

impl UnitConfig {
    /// Configuration with a custom force unit.
    pub fn with_force(mut self, force: impl Into<String>) -> Self {
        self.force = force.into();
        self
    }

    /// Configuration with a custom moment unit.
    pub fn with_moment(mut self, moment: impl Into<String>) -> Self {
        self.moment = moment.into();
        self
    }

    /// Configuration with a custom linear unit.
    pub fn with_linear(mut self, linear: impl Into<String>) -> Self {
        self.linear = linear.into();
        self
    }

    /// Configuration with a custom angular unit.
    pub fn with_angular(mut self, angular: impl Into<String>) -> Self {
        self.angular = angular.into();
        self
    }
}

/// One named sub-instrument within a connection file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionGroup {
    /// Name decoded from the header comment row.
    pub name: String,
    /// 0-based position in the header comment.
    pub ordinal: usize,
    /// Data columns this group occupies.
    pub group_width: usize,
}

impl ConnectionGroup {
    /// Absolute column indices for this group: time plus the group block.
    pub fn column_indices(&self) -> Vec<usize> {
        crate::header::resolve_column_indices(self.ordinal, self.group_width)
    }
}

/// Batch aggregation statistics.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BatchStats {
    pub cases_found: usize,
    pub realizations_found: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub files_missing: usize,
    pub processing_time_ms: u128,
}

impl BatchStats {
    /// Paths that produced a usable per-file result.
    pub fn files_succeeded(&self) -> usize {
        self.files_processed
    }

    /// Whether every enumerated path was decoded and aggregated.
    pub fn is_complete(&self) -> bool {
        self.files_failed == 0 && self.files_missing == 0
    }
}

/// Per-file outcome of a batch run, keyed by the path that produced it.
#[derive(Debug, Clone)]
pub struct PerFileResult<T> {
    pub path: PathBuf,
    pub result: T,
}
