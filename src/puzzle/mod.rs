//! Puzzle sets
//!
//! Ordered, cohort-specific puzzle definitions. The cohort → set mapping is
//! loaded once at startup and never branched on beyond the lookup.

pub mod catalog;

pub use catalog::{PuzzleCatalog, PuzzleSet};
