//! Connection header decoding.
//!
//! Connection files list their instrument names in a header comment row;
//! this module extracts those names and computes which absolute column
//! indices belong to a chosen connection's group.

use tracing::debug;

use crate::error::{ProteusError, Result};
use crate::models::{ConnectionGroup, FileKind};

/// Minimum line count for a file to carry a usable header.
const MIN_HEADER_LINES: usize = 3;

/// Extract the connection names embedded in a file's header.
///
/// The name line sits at absolute line index `header_skip_rows - 1`; a
/// leading `#` and surrounding whitespace are stripped before splitting
/// on whitespace. Order is preserved: the first name is ordinal 0.
pub fn extract_connection_names(text: &str, kind: FileKind) -> Result<Vec<String>> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < MIN_HEADER_LINES {
        return Err(ProteusError::MalformedHeader {
            file: kind.file_name().to_string(),
            reason: format!(
                "file has {} lines, need at least {} to extract connection info",
                lines.len(),
                MIN_HEADER_LINES
            ),
        });
    }

    let name_line_index = kind.header_skip_rows() - 1;
    let name_line = lines
        .get(name_line_index)
        .ok_or_else(|| ProteusError::MalformedHeader {
            file: kind.file_name().to_string(),
            reason: format!("missing connection-name line at index {}", name_line_index),
        })?;

    let stripped = name_line.trim_start_matches('#').trim();
    let names: Vec<String> = stripped.split_whitespace().map(str::to_string).collect();

    if names.is_empty() {
        return Err(ProteusError::MalformedHeader {
            file: kind.file_name().to_string(),
            reason: format!("connection-name line at index {} has no tokens", name_line_index),
        });
    }

    debug!(
        "Decoded {} connection names from {} header",
        names.len(),
        kind.file_name()
    );

    Ok(names)
}

/// Absolute column indices for one connection group.
///
/// Column 0 (time) is always included, followed by the contiguous block
/// of `group_width` data columns offset past all earlier groups.
pub fn resolve_column_indices(ordinal: usize, group_width: usize) -> Vec<usize> {
    let start = 1 + ordinal * group_width;
    let mut indices = Vec::with_capacity(group_width + 1);
    indices.push(0);
    indices.extend(start..start + group_width);
    indices
}

/// Decode the named connection groups of a file, in header order.
pub fn connection_groups(text: &str, kind: FileKind) -> Result<Vec<ConnectionGroup>> {
    let names = extract_connection_names(text, kind)?;
    let group_width = kind.group_width();

    Ok(names
        .into_iter()
        .enumerate()
        .map(|(ordinal, name)| ConnectionGroup {
            name,
            ordinal,
            group_width,
        })
        .collect())
}
