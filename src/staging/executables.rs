use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::types::Instrument;

/// Which calibration pipelines are installed, probed once from `PATH`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CalibrationExecutables {
    found: BTreeMap<Instrument, PathBuf>,
}

impl CalibrationExecutables {
    /// Search every directory of a `PATH`-style list for each instrument's
    /// executable. The first match wins.
    #[must_use]
    pub fn probe(path_var: &OsStr) -> Self {
        let dirs: Vec<PathBuf> = std::env::split_paths(path_var).collect();
        let mut found = BTreeMap::new();

        for instrument in Instrument::ALL {
            let name = instrument.executable_name();
            match dirs.iter().map(|d| d.join(name)).find(|p| p.is_file()) {
                Some(path) => {
                    debug!(%instrument, path = %path.display(), "Found calibration executable");
                    found.insert(instrument, path);
                }
                None => debug!(%instrument, %name, "Calibration executable not on PATH"),
            }
        }

        Self { found }
    }

    /// Probe the current process `PATH`
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var_os("PATH")
            .map(|path| Self::probe(&path))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, instrument: Instrument) -> Option<&Path> {
        self.found.get(&instrument).map(PathBuf::as_path)
    }

    #[must_use]
    pub fn is_available(&self, instrument: Instrument) -> bool {
        self.found.contains_key(&instrument)
    }
}
