//! Column label generation for decoded tables.
//!
//! Each file kind maps to a fixed ordered list of channel labels with
//! physical units; `tensions.dat` is the only kind whose label count is
//! driven by the observed column count.

use crate::models::{FileKind, UnitConfig};

/// One decoded column: the full header text and the unit it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLabel {
    /// Full rendered header text, e.g. `t [s]` or `Fx N`.
    pub label: String,
    /// Unit string alone, e.g. `s` or `N`.
    pub unit: String,
}

impl ColumnLabel {
    pub fn new(label: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            unit: unit.into(),
        }
    }
}

/// Ordered column labels for one decoded table.
///
/// The length must equal the retained column count of the table the
/// layout describes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<ColumnLabel>,
}

impl ColumnLayout {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnLabel> {
        self.columns.get(index)
    }

    /// The rendered header texts, in column order.
    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnLabel> {
        self.columns.iter()
    }

    pub fn push(&mut self, column: ColumnLabel) {
        self.columns.push(column);
    }
}

impl FromIterator<ColumnLabel> for ColumnLayout {
    fn from_iter<T: IntoIterator<Item = ColumnLabel>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// The time column every output file starts with.
fn time_label() -> ColumnLabel {
    ColumnLabel::new("t [s]", "s")
}

/// A channel label rendered as `<name> <unit>`.
fn channel(name: &str, unit: &str) -> ColumnLabel {
    ColumnLabel::new(format!("{} {}", name, unit), unit)
}

/// Generate the ordered column labels for a decoded table.
///
/// `column_count` matters only for `tensions.dat`, which carries one
/// tension channel per cable node; every other kind has a fixed width.
pub fn labels_for(kind: FileKind, column_count: usize, units: &UnitConfig) -> ColumnLayout {
    match kind {
        FileKind::Tensions => {
            let mut columns = vec![time_label()];
            for i in 1..column_count {
                columns.push(ColumnLabel::new(
                    format!("T_{} [{}]", i, units.force),
                    units.force.clone(),
                ));
            }
            columns.into_iter().collect()
        }

        FileKind::Position => {
            let lin = &units.linear;
            let ang = &units.angular;
            [
                time_label(),
                channel("x", lin),
                channel("y", lin),
                channel("z", lin),
                channel("phi", ang),
                channel("theta", ang),
                channel("psi", ang),
            ]
            .into_iter()
            .collect()
        }

        FileKind::Forces => {
            let f = &units.force;
            let m = &units.moment;
            [
                time_label(),
                channel("FXG", f),
                channel("FYG", f),
                channel("FZG", f),
                channel("MXG", m),
                channel("MYG", m),
                channel("MZG", m),
                channel("FX", f),
                channel("FY", f),
                channel("FZ", f),
                channel("MX", m),
                channel("MY", m),
                channel("MZ", m),
            ]
            .into_iter()
            .collect()
        }

        FileKind::RigidBodyForceConnection => {
            let lin = &units.linear;
            let f = &units.force;
            [
                time_label(),
                channel("dx", lin),
                channel("dy", lin),
                channel("dz", lin),
                channel("Fx", f),
                channel("Fy", f),
                channel("Fz", f),
            ]
            .into_iter()
            .collect()
        }

        FileKind::RigidBodyMomentConnection => {
            let ang = &units.angular;
            let m = &units.moment;
            [
                time_label(),
                channel("rx", ang),
                channel("ry", ang),
                channel("rz", ang),
                channel("Mx", m),
                channel("My", m),
                channel("Mz", m),
            ]
            .into_iter()
            .collect()
        }

        FileKind::ReactionLoads => {
            let f = &units.force;
            let m = &units.moment;
            // Two 6-channel groups: root (0) and tip (N).
            [
                time_label(),
                channel("FX0", f),
                channel("FY0", f),
                channel("FZ0", f),
                channel("MX0", m),
                channel("MY0", m),
                channel("MZ0", m),
                channel("FXN", f),
                channel("FYN", f),
                channel("FZN", f),
                channel("MXN", m),
                channel("MYN", m),
                channel("MZN", m),
            ]
            .into_iter()
            .collect()
        }

        FileKind::RigidBodyAbaConnection => {
            let f = &units.force;
            let m = &units.moment;
            // Two 6-channel groups: up (u) and down (d).
            [
                time_label(),
                channel("FXu", f),
                channel("FYu", f),
                channel("FZu", f),
                channel("MXu", m),
                channel("MYu", m),
                channel("MZu", m),
                channel("FXd", f),
                channel("FYd", f),
                channel("FZd", f),
                channel("MXd", m),
                channel("MYd", m),
                channel("MZd", m),
            ]
            .into_iter()
            .collect()
        }

        FileKind::CablePointConnection => {
            let f = &units.force;
            let m = &units.moment;
            [
                time_label(),
                channel("Fx", f),
                channel("Fy", f),
                channel("Fz", f),
                channel("Mx", m),
                channel("My", m),
                channel("Mz", m),
            ]
            .into_iter()
            .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensions_labels_track_column_count() {
        let layout = labels_for(FileKind::Tensions, 5, &UnitConfig::default());
        assert_eq!(
            layout.labels(),
            vec!["t [s]", "T_1 [N]", "T_2 [N]", "T_3 [N]", "T_4 [N]"]
        );
    }

    #[test]
    fn test_position_labels_with_custom_units() {
        let units = UnitConfig::default().with_linear("ft").with_angular("rad");
        let layout = labels_for(FileKind::Position, 7, &units);
        assert_eq!(
            layout.labels(),
            vec!["t [s]", "x ft", "y ft", "z ft", "phi rad", "theta rad", "psi rad"]
        );
    }

    #[test]
    fn test_fixed_width_kinds() {
        let units = UnitConfig::default();
        assert_eq!(labels_for(FileKind::Position, 7, &units).len(), 7);
        assert_eq!(labels_for(FileKind::Forces, 13, &units).len(), 13);
        assert_eq!(labels_for(FileKind::ReactionLoads, 13, &units).len(), 13);
        assert_eq!(
            labels_for(FileKind::RigidBodyAbaConnection, 13, &units).len(),
            13
        );
        assert_eq!(
            labels_for(FileKind::RigidBodyForceConnection, 7, &units).len(),
            7
        );
        assert_eq!(
            labels_for(FileKind::RigidBodyMomentConnection, 7, &units).len(),
            7
        );
        assert_eq!(
            labels_for(FileKind::CablePointConnection, 7, &units).len(),
            7
        );
    }

    #[test]
    fn test_forces_channel_units() {
        let units = UnitConfig::default().with_force("kN").with_moment("kN-m");
        let layout = labels_for(FileKind::Forces, 13, &units);
        assert_eq!(layout.get(1).unwrap().label, "FXG kN");
        assert_eq!(layout.get(4).unwrap().label, "MXG kN-m");
        assert_eq!(layout.get(7).unwrap().label, "FX kN");
        assert_eq!(layout.get(12).unwrap().label, "MZ kN-m");
    }

    #[test]
    fn test_label_generation_is_pure() {
        let units = UnitConfig::default().with_force("kip");
        let first = labels_for(FileKind::Tensions, 4, &units);
        let second = labels_for(FileKind::Tensions, 4, &units);
        assert_eq!(first, second);
    }
}
