use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use crate::core::header::HeaderLookup;
use crate::core::reference::{is_not_applicable, ReferenceFileRef};
use crate::core::types::InstrumentDetectorKey;
use crate::resolving::gate::StepGate;
use crate::rules::store::RuleTable;

/// Keyword naming the instrument
pub const INSTRUMENT_KEYWORD: &str = "INSTRUME";

/// Keyword naming the detector
pub const DETECTOR_KEYWORD: &str = "DETECTOR";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Malformed header: required keyword {0} is missing")]
    MalformedHeader(&'static str),

    #[error("Unsupported instrument/detector: INSTRUME='{instrument}', DETECTOR='{detector}'")]
    UnsupportedInstrument { instrument: String, detector: String },
}

/// Why a reference keyword was checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "step", rename_all = "snake_case")]
pub enum Origin {
    /// Always required for the instrument/detector
    Mandatory,
    /// Required by an enabled correction step
    Step(String),
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mandatory => write!(f, "mandatory"),
            Self::Step(step) => write!(f, "{step}"),
        }
    }
}

/// A reference file identifier included in the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedReference {
    /// Trimmed header value, e.g. `jref$t3n1116nj_bpx.fits`
    pub value: String,
    /// Keyword it was read from (first occurrence)
    pub keyword: String,
    pub origin: Origin,
}

impl ResolvedReference {
    #[must_use]
    pub fn reference(&self) -> ReferenceFileRef {
        ReferenceFileRef::parse(&self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Keyword not in the header
    Absent,
    /// Value is blank
    Empty,
    /// Value is `N/A`
    NotApplicable,
    /// Value already produced by an earlier keyword
    Duplicate,
}

/// A reference keyword that contributed nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedKeyword {
    pub keyword: String,
    pub origin: Origin,
    pub reason: SkipReason,
}

/// Full outcome of resolving one header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub key: InstrumentDetectorKey,
    /// Included identifiers in resolution order, without duplicates
    pub references: Vec<ResolvedReference>,
    /// Checked keywords that contributed nothing
    pub skipped: Vec<SkippedKeyword>,
    /// Steps present in the header but not enabled by the gate
    pub disabled_steps: Vec<String>,
}

impl Resolution {
    /// Identifiers exactly as stored in the header, in resolution order
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        self.references.iter().map(|r| r.value.clone()).collect()
    }

    /// Identifiers split into local and environment-prefixed forms
    #[must_use]
    pub fn references(&self) -> Vec<ReferenceFileRef> {
        self.references
            .iter()
            .map(ResolvedReference::reference)
            .collect()
    }
}

/// Configuration for the resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverConfig {
    /// Policy applied to `*CORR` step values
    pub gate: StepGate,
}

/// Resolves the reference files a header needs against a rule table.
///
/// The resolver is a pure function of the header snapshot and the table:
/// it performs no I/O and can be shared freely between threads.
pub struct ReferenceFileResolver<'a> {
    table: &'a RuleTable,
    config: ResolverConfig,
}

impl<'a> ReferenceFileResolver<'a> {
    /// Create a resolver with default configuration
    #[must_use]
    pub fn new(table: &'a RuleTable) -> Self {
        Self {
            table,
            config: ResolverConfig::default(),
        }
    }

    /// Create a resolver with custom configuration
    #[must_use]
    pub fn with_config(table: &'a RuleTable, config: ResolverConfig) -> Self {
        Self { table, config }
    }

    /// Ordered, de-duplicated reference identifiers needed to calibrate the image.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::MalformedHeader` if `INSTRUME` or `DETECTOR` is
    /// missing, or `ResolveError::UnsupportedInstrument` if the pair has no
    /// mandatory rule.
    pub fn resolve<H: HeaderLookup + ?Sized>(&self, header: &H) -> Result<Vec<String>, ResolveError> {
        self.resolve_detailed(header).map(|r| r.values())
    }

    /// Same as [`resolve`](Self::resolve), keeping where each identifier came from.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub fn resolve_detailed<H: HeaderLookup + ?Sized>(
        &self,
        header: &H,
    ) -> Result<Resolution, ResolveError> {
        let key = self.identify(header)?;
        let mandatory = self.table.mandatory_for(&key).ok_or_else(|| {
            ResolveError::UnsupportedInstrument {
                instrument: key.instrument.to_string(),
                detector: key.detector.to_string(),
            }
        })?;

        let mut acc = Accumulator::default();

        for keyword in mandatory {
            acc.check(header, keyword, &Origin::Mandatory);
        }

        let mut disabled_steps = Vec::new();
        for rule in self.table.corrections() {
            // Not all images have every step
            let Some(value) = header.get(&rule.step) else {
                continue;
            };
            if !self.config.gate.is_enabled(&value) {
                debug!(step = %rule.step, value = %value.trim(), "Step not enabled");
                disabled_steps.push(rule.step.clone());
                continue;
            }
            let origin = Origin::Step(rule.step.clone());
            for keyword in &rule.keywords {
                acc.check(header, keyword, &origin);
            }
        }

        Ok(Resolution {
            key,
            references: acc.references,
            skipped: acc.skipped,
            disabled_steps,
        })
    }

    fn identify<H: HeaderLookup + ?Sized>(&self, header: &H) -> Result<InstrumentDetectorKey, ResolveError> {
        let instrument = header
            .get(INSTRUMENT_KEYWORD)
            .ok_or(ResolveError::MalformedHeader(INSTRUMENT_KEYWORD))?;
        let detector = header
            .get(DETECTOR_KEYWORD)
            .ok_or(ResolveError::MalformedHeader(DETECTOR_KEYWORD))?;

        let key = InstrumentDetectorKey::parse(&instrument, &detector).map_err(|_| {
            ResolveError::UnsupportedInstrument {
                instrument: instrument.trim().to_string(),
                detector: detector.trim().to_string(),
            }
        })?;
        debug!(%key, "Identified image");
        Ok(key)
    }
}

/// Ordered set of identifiers plus the keywords that produced nothing
#[derive(Default)]
struct Accumulator {
    seen: HashSet<String>,
    references: Vec<ResolvedReference>,
    skipped: Vec<SkippedKeyword>,
}

impl Accumulator {
    fn check<H: HeaderLookup + ?Sized>(&mut self, header: &H, keyword: &str, origin: &Origin) {
        match extract_reference(header, keyword) {
            Ok(value) => {
                if self.seen.insert(value.clone()) {
                    debug!(%keyword, %value, %origin, "Reference required");
                    self.references.push(ResolvedReference {
                        value,
                        keyword: keyword.to_string(),
                        origin: origin.clone(),
                    });
                } else {
                    self.skip(keyword, origin, SkipReason::Duplicate);
                }
            }
            Err(reason) => self.skip(keyword, origin, reason),
        }
    }

    fn skip(&mut self, keyword: &str, origin: &Origin, reason: SkipReason) {
        debug!(%keyword, %origin, ?reason, "Reference keyword skipped");
        self.skipped.push(SkippedKeyword {
            keyword: keyword.to_string(),
            origin: origin.clone(),
            reason,
        });
    }
}

/// Header-value extraction rule: absent, blank or `N/A` values yield nothing,
/// anything else is returned trimmed.
fn extract_reference<H: HeaderLookup + ?Sized>(header: &H, keyword: &str) -> Result<String, SkipReason> {
    let value = header.get(keyword).ok_or(SkipReason::Absent)?;
    let value = value.trim();
    if value.is_empty() {
        Err(SkipReason::Empty)
    } else if is_not_applicable(value) {
        Err(SkipReason::NotApplicable)
    } else {
        Ok(value.to_string())
    }
}

/// Resolve with the built-in rules and the `PERFORM` gate.
///
/// # Errors
///
/// See [`ReferenceFileResolver::resolve`].
pub fn calref_from_header<H: HeaderLookup + ?Sized>(header: &H) -> Result<Vec<String>, ResolveError> {
    let table = RuleTable::builtin();
    ReferenceFileResolver::new(&table).resolve(header)
}
