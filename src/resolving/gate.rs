use serde::{Deserialize, Serialize};

/// Value that switches a correction step on
pub const PERFORM: &str = "PERFORM";

/// Policy deciding whether a correction step present in the header is enabled.
///
/// This is the one place the gating rule lives; the resolver never inspects
/// step values itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StepGate {
    /// Enabled only when the trimmed value equals `PERFORM`, ignoring case
    #[default]
    Perform,
    /// Enabled whenever the step keyword is present, whatever its value
    Present,
}

impl StepGate {
    /// Decide whether a step whose header value is `step_value` is enabled
    #[must_use]
    pub fn is_enabled(self, step_value: &str) -> bool {
        match self {
            Self::Perform => step_value.trim().eq_ignore_ascii_case(PERFORM),
            Self::Present => true,
        }
    }
}

impl std::fmt::Display for StepGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Perform => write!(f, "perform"),
            Self::Present => write!(f, "present"),
        }
    }
}
