use serde::{Deserialize, Serialize};

/// Separator between the CRDS environment variable and the file name
pub const ENV_SEPARATOR: char = '$';

/// Header value meaning "no reference file applies"
pub const NOT_APPLICABLE: &str = "N/A";

/// Whether a header value is the not-applicable sentinel (any case, surrounding blanks ignored)
#[must_use]
pub fn is_not_applicable(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case(NOT_APPLICABLE)
}

/// A reference file identifier as stored in a header value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceFileRef {
    /// Plain file name or path, staged next to the inputs
    Local { filename: String },

    /// `ENV$name`: resolved against the root named by `env`
    Crds { env: String, filename: String },
}

impl ReferenceFileRef {
    /// Split a header value into its local or environment-prefixed form.
    ///
    /// Only the first `$` separates; the value is trimmed first.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value.split_once(ENV_SEPARATOR) {
            Some((env, filename)) => Self::Crds {
                env: env.to_string(),
                filename: filename.to_string(),
            },
            None => Self::Local {
                filename: value.to_string(),
            },
        }
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        match self {
            Self::Local { filename } | Self::Crds { filename, .. } => filename,
        }
    }

    #[must_use]
    pub fn env(&self) -> Option<&str> {
        match self {
            Self::Local { .. } => None,
            Self::Crds { env, .. } => Some(env),
        }
    }

    #[must_use]
    pub fn is_crds(&self) -> bool {
        matches!(self, Self::Crds { .. })
    }
}

impl std::fmt::Display for ReferenceFileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { filename } => write!(f, "{filename}"),
            Self::Crds { env, filename } => write!(f, "{env}{ENV_SEPARATOR}{filename}"),
        }
    }
}
