//! Centralized axis naming
//!
//! Every selectable plot axis, with the label and unit shown on charts.
//! Aggregate axes index columns of the aggregate snapshot; continuous axes
//! index the per-trial series.

use std::fmt;
use std::str::FromStr;

/// Per-sample series of a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContinuousField {
    Position,
    Time,
    Force,
    Velocity,
}

pub const CONTINUOUS_FIELDS: [ContinuousField; 4] = [
    ContinuousField::Position,
    ContinuousField::Time,
    ContinuousField::Force,
    ContinuousField::Velocity,
];

impl ContinuousField {
    pub fn label(self) -> &'static str {
        match self {
            ContinuousField::Position => "Position",
            ContinuousField::Time => "Time",
            ContinuousField::Force => "Force",
            ContinuousField::Velocity => "Velocity",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            ContinuousField::Position => " (meters)",
            ContinuousField::Time => " (sec)",
            ContinuousField::Force => " (N)",
            ContinuousField::Velocity => " (m/s)",
        }
    }
}

/// Per-trial scalar column of the aggregate snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateField {
    NumericTag,
    FlagNumber,
    Location,
    Transect,
    AvgForce,
    AvgStiffness,
    AvgStickSlip,
    AvgYield,
    MaxDrop,
    DropSlope,
    Deformation,
    RegressionStiffness,
}

/// Aggregate axes offered for single-protocol plots, in menu order.
pub const AGGREGATE_FIELDS: [AggregateField; 12] = [
    AggregateField::NumericTag,
    AggregateField::FlagNumber,
    AggregateField::Location,
    AggregateField::Transect,
    AggregateField::AvgForce,
    AggregateField::AvgStiffness,
    AggregateField::AvgStickSlip,
    AggregateField::AvgYield,
    AggregateField::MaxDrop,
    AggregateField::DropSlope,
    AggregateField::Deformation,
    AggregateField::RegressionStiffness,
];

/// Aggregate axes offered for penetration vs shear comparison plots.
pub const COMPARISON_FIELDS: [AggregateField; 4] = [
    AggregateField::AvgForce,
    AggregateField::AvgStiffness,
    AggregateField::AvgStickSlip,
    AggregateField::AvgYield,
];

impl AggregateField {
    pub fn label(self) -> &'static str {
        match self {
            AggregateField::NumericTag => "Transect-Flag Number",
            AggregateField::FlagNumber => "Flag Number",
            AggregateField::Location => "Location",
            AggregateField::Transect => "Transect",
            AggregateField::AvgForce => "Average Force",
            AggregateField::AvgStiffness => "Average Stiffness",
            AggregateField::AvgStickSlip => "Average Stick-Slip Period",
            AggregateField::AvgYield => "Average Yield",
            AggregateField::MaxDrop => "Max Force Drop",
            AggregateField::DropSlope => "Force Drop Slope",
            AggregateField::Deformation => "Penetration Deformation",
            AggregateField::RegressionStiffness => "Regression Stiffness",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            AggregateField::NumericTag
            | AggregateField::FlagNumber
            | AggregateField::Location
            | AggregateField::Transect => "",
            AggregateField::AvgForce | AggregateField::AvgYield | AggregateField::MaxDrop => " (N)",
            AggregateField::AvgStiffness | AggregateField::DropSlope | AggregateField::RegressionStiffness => {
                " (N/m)"
            }
            AggregateField::AvgStickSlip | AggregateField::Deformation => " (m)",
        }
    }
}

/// An aggregate plot axis: a snapshot column or a numeric feature overlay.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AggregateAxis {
    Field(AggregateField),
    Feature(String),
}

impl AggregateAxis {
    pub fn label(&self) -> &str {
        match self {
            AggregateAxis::Field(field) => field.label(),
            AggregateAxis::Feature(name) => name,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            AggregateAxis::Field(field) => field.unit(),
            AggregateAxis::Feature(_) => " [unit]",
        }
    }
}

/// Any axis a plot session can select.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlotAxis {
    Continuous(ContinuousField),
    Aggregate(AggregateAxis),
}

impl PlotAxis {
    pub fn label(&self) -> &str {
        match self {
            PlotAxis::Continuous(field) => field.label(),
            PlotAxis::Aggregate(axis) => axis.label(),
        }
    }

    /// Label with unit suffix, as used for chart axis titles.
    pub fn title(&self) -> String {
        match self {
            PlotAxis::Continuous(field) => format!("{}{}", field.label(), field.unit()),
            PlotAxis::Aggregate(axis) => format!("{}{}", axis.label(), axis.unit()),
        }
    }
}

impl fmt::Display for PlotAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Labels compare ignoring case, spaces, hyphens and underscores so CLI input
// like "average_stiffness" or "Average-Yield" resolves.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for ContinuousField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        CONTINUOUS_FIELDS
            .iter()
            .copied()
            .find(|f| normalize(f.label()) == key)
            .ok_or_else(|| format!("unknown continuous axis '{s}'"))
    }
}

impl FromStr for AggregateField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        let aliases: [(&str, AggregateField); 7] = [
            ("tag", AggregateField::NumericTag),
            ("flag", AggregateField::FlagNumber),
            ("stiffness", AggregateField::AvgStiffness),
            ("stickslip", AggregateField::AvgStickSlip),
            ("yield", AggregateField::AvgYield),
            ("drop", AggregateField::MaxDrop),
            ("regression", AggregateField::RegressionStiffness),
        ];
        AGGREGATE_FIELDS
            .iter()
            .copied()
            .find(|f| normalize(f.label()) == key)
            .or_else(|| aliases.iter().find(|(a, _)| *a == key).map(|(_, f)| *f))
            .ok_or_else(|| format!("unknown aggregate axis '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_labels_and_units() {
        assert_eq!(AggregateField::AvgStiffness.label(), "Average Stiffness");
        assert_eq!(AggregateField::AvgStiffness.unit(), " (N/m)");
        assert_eq!(
            PlotAxis::Aggregate(AggregateAxis::Field(AggregateField::AvgStickSlip)).title(),
            "Average Stick-Slip Period (m)"
        );
    }

    #[test]
    fn parses_labels_loosely() {
        assert_eq!("average stiffness".parse(), Ok(AggregateField::AvgStiffness));
        assert_eq!("Average-Stick-Slip-Period".parse(), Ok(AggregateField::AvgStickSlip));
        assert_eq!("flag".parse(), Ok(AggregateField::FlagNumber));
        assert_eq!("transect".parse(), Ok(AggregateField::Transect));
        assert_eq!("regression_stiffness".parse(), Ok(AggregateField::RegressionStiffness));
        assert_eq!("VELOCITY".parse(), Ok(ContinuousField::Velocity));
        assert!("depth".parse::<ContinuousField>().is_err());
        assert!("nonsense".parse::<AggregateField>().is_err());
    }

    #[test]
    fn every_field_round_trips_through_its_label() {
        for f in AGGREGATE_FIELDS {
            assert_eq!(f.label().parse(), Ok(f));
        }
    }

    #[test]
    fn comparison_fields_are_a_subset_of_aggregate_fields() {
        for f in COMPARISON_FIELDS {
            assert!(AGGREGATE_FIELDS.contains(&f));
        }
    }

    #[test]
    fn feature_axes_use_their_name() {
        let axis = PlotAxis::Aggregate(AggregateAxis::Feature("moisture".to_string()));
        assert_eq!(axis.to_string(), "moisture");
        assert_eq!(axis.title(), "moisture [unit]");
    }
}
