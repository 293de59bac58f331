#![deny(missing_docs)]

//! Greedy agglomerative clustering: beats into contiguous phases, entities
//! into groups. Both merge loops rescan pairwise distances each iteration
//! and resolve ties to the first pair encountered, so identical inputs
//! always produce identical output.

pub mod distance;
mod groups;
mod phases;

pub use groups::{extract_groups, EntityGroup};
pub use phases::{extract_phases, Phase};
