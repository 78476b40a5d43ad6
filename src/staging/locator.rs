use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::reference::ReferenceFileRef;

/// Public CRDS server for HST reference files
pub const DEFAULT_CRDS_SERVER_URL: &str = "https://hst-crds.stsci.edu";

/// Environment variables naming CRDS reference roots
pub const CRDS_ENV_VARS: &[&str] = &["jref", "iref", "oref", "lref", "nref", "uref"];

/// Environment variable overriding [`DEFAULT_CRDS_SERVER_URL`]
pub const CRDS_SERVER_URL_VAR: &str = "CRDS_SERVER_URL";

/// Where reference files are staged from, collected once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingConfig {
    /// Directory holding the raw inputs and any local reference files
    pub input_dir: PathBuf,
    /// CRDS environment variable -> local root directory
    pub env_roots: BTreeMap<String, PathBuf>,
    /// Base URL of the CRDS server used when a root is not configured
    pub crds_server_url: String,
}

impl StagingConfig {
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            env_roots: BTreeMap::new(),
            crds_server_url: DEFAULT_CRDS_SERVER_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_env_root(mut self, env: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.env_roots.insert(env.into(), root.into());
        self
    }

    #[must_use]
    pub fn with_crds_server_url(mut self, url: impl Into<String>) -> Self {
        self.crds_server_url = url.into();
        self
    }

    /// Read the CRDS roots and server URL from the process environment
    #[must_use]
    pub fn from_env(input_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::new(input_dir);
        for var in CRDS_ENV_VARS {
            if let Some(root) = std::env::var_os(var).filter(|v| !v.is_empty()) {
                debug!(%var, root = %Path::new(&root).display(), "CRDS root configured");
                config.env_roots.insert((*var).to_string(), PathBuf::from(root));
            }
        }
        if let Ok(url) = std::env::var(CRDS_SERVER_URL_VAR) {
            if !url.trim().is_empty() {
                config.crds_server_url = url.trim().to_string();
            }
        }
        config
    }

    fn env_root(&self, env: &str) -> Option<&Path> {
        self.env_roots
            .get(env)
            .or_else(|| self.env_roots.get(&env.to_ascii_lowercase()))
            .map(PathBuf::as_path)
    }
}

/// Where a reference file would be staged from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum Location {
    /// Bare file name living next to the raw inputs
    Input(PathBuf),
    /// Explicit path written in the header
    Path(PathBuf),
    /// Under a locally configured CRDS root
    EnvRoot(PathBuf),
    /// To be fetched from the CRDS server
    Remote(String),
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(p) | Self::Path(p) | Self::EnvRoot(p) => write!(f, "{}", p.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

impl Location {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::Path(_) => "path",
            Self::EnvRoot(_) => "env_root",
            Self::Remote(_) => "remote",
        }
    }
}

/// Maps reference identifiers to locations. Pure: nothing is touched on disk.
pub struct ReferenceLocator<'a> {
    config: &'a StagingConfig,
}

impl<'a> ReferenceLocator<'a> {
    #[must_use]
    pub fn new(config: &'a StagingConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn locate(&self, reference: &ReferenceFileRef) -> Location {
        match reference {
            ReferenceFileRef::Local { filename } => {
                let path = Path::new(filename);
                if path.components().count() == 1 && !path.is_absolute() {
                    Location::Input(self.config.input_dir.join(filename))
                } else {
                    Location::Path(path.to_path_buf())
                }
            }
            ReferenceFileRef::Crds { env, filename } => match self.config.env_root(env) {
                Some(root) => Location::EnvRoot(root.join(filename)),
                None => Location::Remote(format!(
                    "{}/unchecked_get/references/hst/{filename}",
                    self.config.crds_server_url.trim_end_matches('/')
                )),
            },
        }
    }
}

/// One entry of a staging plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedReference {
    /// Identifier as stored in the header
    pub identifier: String,
    pub reference: ReferenceFileRef,
    pub location: Location,
}

/// Every reference needed by a run, each located exactly once
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StagingPlan {
    pub entries: Vec<StagedReference>,
}

impl StagingPlan {
    /// Locate `identifiers` in order, skipping any already planned
    pub fn build<I, S>(locator: &ReferenceLocator<'_>, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut plan = Self::default();
        plan.extend(locator, identifiers);
        plan
    }

    /// Add identifiers from another image of the same run
    pub fn extend<I, S>(&mut self, locator: &ReferenceLocator<'_>, identifiers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = self.entries.iter().map(|e| e.identifier.clone()).collect();
        for identifier in identifiers {
            let identifier = identifier.as_ref().trim();
            if !seen.insert(identifier.to_string()) {
                continue;
            }
            let reference = ReferenceFileRef::parse(identifier);
            let location = locator.locate(&reference);
            debug!(%identifier, %location, "Planned reference");
            self.entries.push(StagedReference {
                identifier: identifier.to_string(),
                reference,
                location,
            });
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
