//! # calref
//!
//! A library for working out which calibration reference files an HST raw
//! image needs before its calibration pipeline runs.
//!
//! The pipelines for ACS, WFC3 and STIS open a reference file for every
//! `*TAB`/`*FILE` keyword they use. Which of those keywords matter depends on
//! the instrument, the detector and which `*CORR` correction steps the header
//! switches on. `calref` reads the primary header and returns the ordered,
//! de-duplicated list of reference identifiers, such as
//! `jref$t3n1116nj_bpx.fits`, so they can be staged ahead of time.
//!
//! ## Features
//!
//! - **Table-driven resolution**: mandatory keywords per instrument/detector,
//!   then keywords per enabled correction step, in a fixed order
//! - **Several header sources**: FITS headers through cfitsio (plain or gzip), card
//!   dumps, and flat JSON objects
//! - **Staging plans**: where each file would come from (input directory,
//!   local CRDS root, or the CRDS server)
//! - **Helpers**: calibration executable discovery, keyword fix directives and
//!   obsmode expansion
//!
//! ## Example
//!
//! ```rust
//! use calref::{Header, ReferenceFileResolver, RuleTable};
//!
//! let header: Header = [
//!     ("INSTRUME", "ACS"),
//!     ("DETECTOR", "SBC"),
//!     ("CCDTAB", "jref$xa81715gj_ccd.fits"),
//!     ("DQICORR", "PERFORM"),
//!     ("BPIXTAB", "jref$t3n1116nj_bpx.fits"),
//!     ("LFLGCORR", "PERFORM"),
//!     ("MLINTAB", "N/A"),
//!     ("FLATCORR", "OMIT"),
//!     ("PFLTFILE", "jref$pfl.fits"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let table = RuleTable::builtin();
//! let resolver = ReferenceFileResolver::new(&table);
//! let refs = resolver.resolve(&header).unwrap();
//! assert_eq!(refs, vec!["jref$xa81715gj_ccd.fits", "jref$t3n1116nj_bpx.fits"]);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Header, reference identifier, instrument and obsmode types
//! - [`rules`]: The mandatory and correction-step rule tables
//! - [`resolving`]: The resolver and its step gate
//! - [`parsing`]: Readers for FITS, card dump, JSON and parameter files
//! - [`staging`]: Reference locations, executables and keyword fixes
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod parsing;
pub mod resolving;
pub mod rules;
pub mod staging;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::header::{Header, HeaderLookup, HeaderValue};
pub use core::reference::ReferenceFileRef;
pub use core::types::*;
pub use resolving::gate::StepGate;
pub use resolving::resolver::{
    calref_from_header, ReferenceFileResolver, Resolution, ResolveError, ResolverConfig,
};
pub use rules::store::RuleTable;
