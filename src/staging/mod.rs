//! Everything needed around a resolved reference list before calibration runs.
//!
//! - [`locator`]: where each reference file would be staged from (input
//!   directory, a local CRDS root, or the CRDS server)
//! - [`executables`]: which calibration pipelines are installed
//! - [`fixes`]: keyword fix directives applied to raw headers
//!
//! Nothing here downloads files or runs a pipeline. The results are plans
//! and reports for the caller to act on.

pub mod executables;
pub mod fixes;
pub mod locator;
