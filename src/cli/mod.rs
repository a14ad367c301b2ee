//! Command Line Interface layer for rptbatch.
//!
//! Resolves the configuration from flags and properties files, then hands the
//! job list and report engine to the library's batch orchestrator. Flags are
//! scanned by `rptbatch::config` rather than a declarative parser because a
//! `-C` file is merged at the position it appears.
pub mod runner;

pub use runner::run;
