//! Core data types for reference-file resolution.
//!
//! - [`Instrument`], [`Detector`], [`InstrumentDetectorKey`]: image identity from `INSTRUME`/`DETECTOR`
//! - [`Header`], [`HeaderValue`]: a primary header as keyword/value pairs
//! - [`HeaderLookup`]: the read-only interface the resolver consumes
//! - [`ReferenceFileRef`]: a reference identifier, local or `ENV$name`
//!
//! ## Reference identifiers
//!
//! | Header value | Meaning |
//! |--------------|---------|
//! | `jref$t3n1116nj_bpx.fits` | file `t3n1116nj_bpx.fits` under the root named by `jref` |
//! | `dummy_file_1.fits` | file staged alongside the raw inputs |
//! | `N/A` | no reference file applies |
//!
//! [`Instrument`]: types::Instrument
//! [`Detector`]: types::Detector
//! [`InstrumentDetectorKey`]: types::InstrumentDetectorKey
//! [`Header`]: header::Header
//! [`HeaderValue`]: header::HeaderValue
//! [`HeaderLookup`]: header::HeaderLookup
//! [`ReferenceFileRef`]: reference::ReferenceFileRef

pub mod header;
pub mod obsmode;
pub mod reference;
pub mod types;
