//! Reference-file resolution.
//!
//! - [`ReferenceFileResolver`]: evaluates a [`RuleTable`] against a header
//! - [`StepGate`]: decides whether a `*CORR` step counts as enabled
//!
//! ## Algorithm
//!
//! 1. Identify the image from `INSTRUME` and `DETECTOR`
//! 2. Check every mandatory keyword for that pair, in table order
//! 3. For each correction step in table order that the gate enables, check its keywords
//! 4. Drop absent, blank and `N/A` values; keep the first occurrence of each identifier
//!
//! ## Example
//!
//! ```rust
//! use calref::{Header, ReferenceFileResolver, RuleTable};
//!
//! let header: Header = [
//!     ("INSTRUME", "ACS"),
//!     ("DETECTOR", "WFC"),
//!     ("CCDTAB", "jref$xa81715gj_ccd.fits"),
//!     ("DQICORR", "PERFORM"),
//!     ("BPIXTAB", "jref$t3n1116nj_bpx.fits"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let table = RuleTable::builtin();
//! let refs = ReferenceFileResolver::new(&table).resolve(&header).unwrap();
//! assert_eq!(refs, ["jref$xa81715gj_ccd.fits", "jref$t3n1116nj_bpx.fits"]);
//! ```
//!
//! [`RuleTable`]: crate::rules::store::RuleTable
//! [`ReferenceFileResolver`]: resolver::ReferenceFileResolver
//! [`StepGate`]: gate::StepGate

pub mod gate;
pub mod resolver;
