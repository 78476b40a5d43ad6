//! Reference rule tables.
//!
//! Two tables drive resolution:
//!
//! - **Mandatory**: instrument/detector pair -> keywords always needed (e.g. `CCDTAB`)
//! - **Corrections**: `*CORR` step -> keywords needed while that step is enabled
//!
//! The built-in rules live in [`tables`] as ordered constants keyed by the
//! [`Instrument`](crate::core::types::Instrument) and
//! [`Detector`](crate::core::types::Detector) enums. Custom tables can be
//! exported, edited and loaded back as JSON:
//!
//! ```rust,no_run
//! use calref::RuleTable;
//! use std::path::Path;
//!
//! let json = RuleTable::builtin().to_json().unwrap();
//! let custom = RuleTable::load_from_file(Path::new("my_rules.json")).unwrap();
//! ```

pub mod store;
pub mod tables;
