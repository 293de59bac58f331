//! Pattern kinds, cells, and the rules steering a mining run.

use std::fmt;
use std::str::FromStr;

use lifegrid_core::{ErrorInfo, LifegridError, PatternSettings, PhaseId};
use serde::{Deserialize, Serialize};

/// The four mined pattern kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    /// More groups than the threshold born in one phase.
    MultipleBirths,
    /// More groups than the threshold dying in one phase.
    MultipleDeaths,
    /// More active-with-activity groups than the threshold in one phase.
    MultipleUpdates,
    /// A chain of birth phases whose phase and row positions stay close.
    Ladder,
}

impl PatternKind {
    /// Every kind, in declaration order.
    pub const ALL: [PatternKind; 4] = [
        PatternKind::MultipleBirths,
        PatternKind::MultipleDeaths,
        PatternKind::MultipleUpdates,
        PatternKind::Ladder,
    ];

    /// Upper-case tag used in reports, identical to the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            PatternKind::MultipleBirths => "MULTIPLE_BIRTHS",
            PatternKind::MultipleDeaths => "MULTIPLE_DEATHS",
            PatternKind::MultipleUpdates => "MULTIPLE_UPDATES",
            PatternKind::Ladder => "LADDER",
        }
    }

    fn name(self) -> &'static str {
        match self {
            PatternKind::MultipleBirths => "multiple-births",
            PatternKind::MultipleDeaths => "multiple-deaths",
            PatternKind::MultipleUpdates => "multiple-updates",
            PatternKind::Ladder => "ladder",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternKind {
    type Err = LifegridError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        PatternKind::ALL
            .into_iter()
            .find(|kind| kind.name() == text)
            .ok_or_else(|| {
                LifegridError::Parse(
                    ErrorInfo::new(
                        "unknown-pattern-kind",
                        format!("no pattern kind named {text:?}"),
                    )
                    .with_hint(
                        "expected one of: multiple-births, multiple-deaths, multiple-updates, ladder",
                    ),
                )
            })
    }
}

/// One participating cell: a row's first member name at a phase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternCell {
    /// Name of the first member of the participating group.
    pub entity_name: String,
    /// Phase in which the event happened.
    pub phase: PhaseId,
}

impl PatternCell {
    /// Creates a cell.
    pub fn new(entity_name: impl Into<String>, phase: PhaseId) -> Self {
        Self {
            entity_name: entity_name.into(),
            phase,
        }
    }
}

/// A mined pattern with its cells in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// Which kind of event the pattern captures.
    pub kind: PatternKind,
    /// Participating cells, in the order mining encountered them.
    pub cells: Vec<PatternCell>,
}

/// Chaining rules for the ladder pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderRules {
    /// Compare absolute gaps instead of signed ones. The signed default
    /// admits backward jumps (a negative gap always chains).
    #[serde(default)]
    pub absolute_gaps: bool,
    /// Largest phase gap that still chains two birth lists.
    pub max_phase_gap: i64,
    /// Largest row-position gap that still chains two birth lists.
    pub max_position_gap: i64,
}

impl Default for LadderRules {
    fn default() -> Self {
        Self {
            absolute_gaps: false,
            max_phase_gap: 3,
            max_position_gap: 3,
        }
    }
}

/// Threshold plus ladder rules for one mining run.
///
/// Multi-cell buckets must strictly exceed `threshold`; ladder run
/// lengths must reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningRules {
    /// Bucket/run size threshold.
    pub threshold: usize,
    /// Ladder chaining rules.
    pub ladder: LadderRules,
}

impl Default for MiningRules {
    fn default() -> Self {
        Self {
            threshold: 3,
            ladder: LadderRules::default(),
        }
    }
}

impl MiningRules {
    /// Builds the rules from the configuration section.
    pub fn from_settings(settings: &PatternSettings) -> Self {
        Self {
            threshold: settings.threshold,
            ladder: LadderRules {
                absolute_gaps: settings.absolute_gaps,
                max_phase_gap: settings.max_phase_gap,
                max_position_gap: settings.max_position_gap,
            },
        }
    }
}
