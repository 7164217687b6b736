//! Analyses built on top of the index, references and dependency graph.
//!
//! - [`outline`]: per-file symbol listing
//! - [`impact`]: transitive referrers of a symbol, or importers of a file
//! - [`find_dead_code`]: exported symbols nothing references

mod deadcode;
mod impact;
mod outline;

pub use deadcode::{
    find_dead_code, is_test_entry, is_test_file, Candidate, DeadCodeOptions, DeadCodeReport, ENTRY_POINTS,
};
pub use impact::{
    file_impact, impact, symbol_impact, ImpactItem, ImpactLayer, ImpactMode, ImpactOptions, ImpactReport,
};
pub use outline::{outline, Outline};
