//! Pattern mining over assembled lifegrid views.
//!
//! Two passes run against a single-pair view and the frozen phases: a
//! per-phase bucket pass that catches synchronized births, updates, and
//! deaths, and a cross-phase chain pass that catches "ladders" of birth
//! lists whose phase and row positions stay close. A text report module
//! renders the result the way exported projects record it.

pub mod bdu;
pub mod report;

mod ladder;
mod mine;
mod model;

pub use mine::mine;
pub use model::{LadderRules, MiningRules, Pattern, PatternCell, PatternKind};
