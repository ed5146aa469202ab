//! Purpose: Shim configuration document and slow-hook whitelist reading.
//! Exports: `ShimConfig`, `read_whitelist`.
//! Role: Read-only inputs for the resolver and negotiator; loaded once.
//! Invariants: Defaults match the historical behavior (autodetect on,
//! slow hooks on). Unknown hook names in a whitelist are reported, not fatal.
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::core::error::{Error, ErrorKind};
use crate::core::hooks::HookPoint;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ShimConfig {
    /// Explicit artifact override; absolute, or relative to the working
    /// directory. Wins over every other resolution source.
    #[serde(default, rename = "override")]
    pub override_artifact: Option<PathBuf>,
    #[serde(default = "default_on")]
    pub autodetect: bool,
    #[serde(default = "default_on")]
    pub slowhooks: bool,
    #[serde(default)]
    pub slowhooks_whitelist: Option<PathBuf>,
}

fn default_on() -> bool {
    true
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            override_artifact: None,
            autodetect: true,
            slowhooks: true,
            slowhooks_whitelist: None,
        }
    }
}

impl ShimConfig {
    /// Load a JSON config document. A missing file yields the defaults;
    /// a malformed one is a usage error.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(Error::new(ErrorKind::Io)
                    .with_message("failed to read config")
                    .with_path(path)
                    .with_source(err));
            }
        };
        serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("malformed config document")
                .with_path(path)
                .with_source(err)
        })
    }
}

/// Read a slow-hook whitelist file: one hook name per line, `#` comments.
///
/// Names that do not match a known hook point are reported and skipped so a
/// stale whitelist cannot abort startup.
pub fn read_whitelist(path: &Path) -> Result<HashSet<HookPoint>, Error> {
    let text = fs::read_to_string(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read slow-hook whitelist")
            .with_path(path)
            .with_source(err)
    })?;

    let mut names = HashSet::new();
    for line in text.lines() {
        let entry = line.split('#').next().unwrap_or("").trim();
        if entry.is_empty() {
            continue;
        }
        match HookPoint::from_name(entry) {
            Some(point) => {
                names.insert(point);
            }
            None => {
                warn!(entry, path = %path.display(), "whitelist names unknown hook point");
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::{ShimConfig, read_whitelist};
    use crate::core::hooks::HookPoint;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ShimConfig::load(&dir.path().join("gamelink.json")).expect("load");
        assert_eq!(config, ShimConfig::default());
        assert!(config.autodetect);
        assert!(config.slowhooks);
        assert!(config.override_artifact.is_none());
    }

    #[test]
    fn document_fields_override_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gamelink.json");
        fs::write(
            &path,
            r#"{"override": "artifacts/custom.so", "autodetect": false, "slowhooks": false}"#,
        )
        .expect("write");

        let config = ShimConfig::load(&path).expect("load");
        assert_eq!(
            config.override_artifact,
            Some(PathBuf::from("artifacts/custom.so"))
        );
        assert!(!config.autodetect);
        assert!(!config.slowhooks);
    }

    #[test]
    fn malformed_document_is_usage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gamelink.json");
        fs::write(&path, "{not json").expect("write");

        let err = ShimConfig::load(&path).expect_err("malformed");
        assert_eq!(err.kind(), crate::core::error::ErrorKind::Usage);
    }

    #[test]
    fn whitelist_parses_names_and_skips_unknown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("slowhooks.list");
        fs::write(
            &path,
            "# keep these intercepted even in fast mode\ntrace_line\nmodel_index # hot but audited\nno_such_hook\n",
        )
        .expect("write");

        let whitelist = read_whitelist(&path).expect("read");
        assert!(whitelist.contains(&HookPoint::TraceLine));
        assert!(whitelist.contains(&HookPoint::ModelIndex));
        assert_eq!(whitelist.len(), 2);
    }
}
