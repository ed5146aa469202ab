//! Purpose: Resolve a module identifier to a concrete on-disk artifact.
//! Exports: `Resolver`, `ResolutionRequest`, `ResolvedModule`, `ModuleSource`,
//! `AutoDetector` (+ `ArtifactScan`, `NoAutoDetect`).
//! Role: Applies strict precedence (override > registry > autodetect) with
//! platform name transforms and best-effort cache installation.
//! Invariants: On success `artifact_path` refers to an existing file.
//! Invariants: Installs only happen after a probe found the file absent.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::cache::{ContentCache, install};
use crate::core::error::{Error, ErrorKind};
use crate::core::platform::{Os, Platform, rewrite_arch_suffix};
use crate::core::registry::{ModuleDescriptor, ModuleRegistry};

/// Artifacts live under `<workdir>/artifacts/<name>`.
pub const ARTIFACTS_DIR: &str = "artifacts";

/// Which of the five mutually exclusive sources produced the resolution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModuleSource {
    /// Explicit override from configuration; wins unconditionally.
    Override,
    /// Registry entry matched but its artifact was missing; auto-detection
    /// supplied a replacement.
    AutodetectOverride,
    /// No registry match; auto-detection alone produced the artifact.
    Autodetect,
    /// Registry entry resolved under its declared artifact name.
    Registry,
    /// Registry entry resolved under a transformed name (arch rewrite or
    /// stripped legacy name).
    RegistryRenamed,
}

impl ModuleSource {
    pub fn tag(self) -> &'static str {
        match self {
            ModuleSource::Override => "override",
            ModuleSource::AutodetectOverride => "autodetect-override",
            ModuleSource::Autodetect => "autodetect",
            ModuleSource::Registry => "registry",
            ModuleSource::RegistryRenamed => "registry-renamed",
        }
    }
}

/// Constructed once per process lifetime from collaborator configuration.
#[derive(Clone, Debug)]
pub struct ResolutionRequest {
    pub identifier: String,
    pub working_directory: PathBuf,
    pub override_artifact: Option<PathBuf>,
    pub autodetect: bool,
}

#[derive(Clone, Debug)]
pub struct ResolvedModule {
    /// Existing, loadable artifact (success postcondition).
    pub artifact_path: PathBuf,
    /// The registry/auto-detect implied path absent an override; differs
    /// from `artifact_path` only for overrides and autodetect overrides.
    pub canonical_path: PathBuf,
    pub description: String,
    pub source: ModuleSource,
}

impl ResolvedModule {
    pub fn file_name(&self) -> String {
        self.artifact_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// External collaborator scanning for unrecognized artifacts. The core only
/// consumes its result as an opaque name.
pub trait AutoDetector {
    /// A candidate artifact name, or `None` when the known name already
    /// exists on disk or nothing plausible was found.
    fn detect(&self, artifacts_dir: &Path, known: Option<&str>) -> Option<String>;
}

/// Detector that never finds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAutoDetect;

impl AutoDetector for NoAutoDetect {
    fn detect(&self, _artifacts_dir: &Path, _known: Option<&str>) -> Option<String> {
        None
    }
}

/// Directory-scanning detector: picks the lexicographically first dynamic
/// library in the artifacts directory when the known name is absent.
#[derive(Clone, Copy, Debug)]
pub struct ArtifactScan {
    platform: Platform,
}

impl ArtifactScan {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

impl AutoDetector for ArtifactScan {
    fn detect(&self, artifacts_dir: &Path, known: Option<&str>) -> Option<String> {
        if let Some(name) = known
            && artifacts_dir.join(name).is_file()
        {
            return None;
        }
        let extension = self.platform.dylib_extension();
        let mut candidates: Vec<String> = fs::read_dir(artifacts_dir)
            .ok()?
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| {
                Path::new(name)
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .collect();
        candidates.sort();
        let found = candidates.into_iter().next();
        if let Some(name) = &found {
            debug!(name = %name, "autodetect candidate");
        }
        found
    }
}

pub struct Resolver<'a> {
    registry: &'a ModuleRegistry,
    platform: Platform,
    cache: &'a dyn ContentCache,
    detector: &'a dyn AutoDetector,
}

impl<'a> Resolver<'a> {
    pub fn new(
        registry: &'a ModuleRegistry,
        platform: Platform,
        cache: &'a dyn ContentCache,
        detector: &'a dyn AutoDetector,
    ) -> Self {
        Self {
            registry,
            platform,
            cache,
            detector,
        }
    }

    pub fn resolve(&self, request: &ResolutionRequest) -> Result<ResolvedModule, Error> {
        let artifacts_dir = request.working_directory.join(ARTIFACTS_DIR);

        // Registry lookup: first descriptor whose platform artifact exists.
        let mut known: Option<&ModuleDescriptor> = None;
        let mut known_name: Option<String> = None;
        for descriptor in self.registry.lookup(&request.identifier) {
            let Some(name) = descriptor.artifact_for(self.platform.os) else {
                continue;
            };
            if artifacts_dir.join(name).is_file() {
                known = Some(descriptor);
                known_name = Some(name.to_string());
                break;
            }
        }
        let declared_name = known_name.clone();

        // 32-bit era catalogue names get their arch suffix rewritten on
        // 64-bit POSIX hosts; the rewritten file may not exist yet.
        if self.platform.os == Os::Linux
            && self.platform.arch64
            && let Some(name) = known_name.take()
        {
            match rewrite_arch_suffix(&name) {
                Some(fixed) => {
                    debug!(from = %name, to = %fixed, "rewrote artifact arch suffix");
                    known_name = Some(fixed);
                }
                None => known_name = Some(name),
            }
        }

        // Stripped legacy name and declared-name install, skipped entirely
        // when an override is configured.
        if request.override_artifact.is_none()
            && let Some(name) = known_name.take()
        {
            known_name = Some(self.settle_known_name(&artifacts_dir, name));
        }

        // Auto-detection; a result while a registry entry matched means the
        // registry artifact is missing on disk and the detected one wins.
        let mut autodetected = None;
        if request.autodetect {
            autodetected = self.detector.detect(&artifacts_dir, known_name.as_deref());
        }
        let autodetect_override = known.is_some() && autodetected.is_some();
        let registry_name = known_name.clone();
        if autodetect_override {
            known_name = autodetected.clone();
        }

        if known.is_none() && request.override_artifact.is_none() && autodetected.is_none() {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message(format!("unrecognized module '{}'", request.identifier)));
        }

        // Choose the artifact path by strict precedence.
        let (artifact_path, source) = if let Some(overridden) = &request.override_artifact {
            let path = if overridden.is_absolute() {
                overridden.clone()
            } else {
                request.working_directory.join(overridden)
            };
            if !overridden.is_absolute()
                && !path.is_file()
                && let Some(key) = overridden.to_str()
            {
                install(self.cache, key, &path);
            }
            (path, ModuleSource::Override)
        } else if autodetect_override {
            let name = known_name.as_deref().unwrap_or_default();
            (artifacts_dir.join(name), ModuleSource::AutodetectOverride)
        } else if let Some(name) = known_name.as_deref() {
            let source = if declared_name.as_deref() == Some(name) {
                ModuleSource::Registry
            } else {
                ModuleSource::RegistryRenamed
            };
            (artifacts_dir.join(name), source)
        } else {
            let name = autodetected.as_deref().unwrap_or_default();
            (artifacts_dir.join(name), ModuleSource::Autodetect)
        };

        let canonical_path = match (&registry_name, source) {
            (Some(name), ModuleSource::Override | ModuleSource::AutodetectOverride) => {
                artifacts_dir.join(name)
            }
            _ => artifact_path.clone(),
        };

        if !artifact_path.is_file() {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message(format!(
                    "no loadable artifact for module '{}'",
                    request.identifier
                ))
                .with_path(artifact_path));
        }

        let file = artifact_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let description = match source {
            ModuleSource::Override => {
                info!(module = %request.identifier, artifact = %file, "overriding module artifact");
                format!("{file} (override)")
            }
            ModuleSource::AutodetectOverride => {
                info!(module = %request.identifier, artifact = %file, "registry artifact missing; autodetection override");
                format!("{file} (autodetect-override)")
            }
            ModuleSource::Autodetect => {
                info!(module = %request.identifier, artifact = %file, "autodetected module");
                format!("{file} (autodetect)")
            }
            ModuleSource::Registry => {
                info!(module = %request.identifier, artifact = %file, "recognized module");
                known.map(|entry| entry.description.to_string()).unwrap_or_default()
            }
            ModuleSource::RegistryRenamed => {
                info!(module = %request.identifier, artifact = %file, "recognized module under transformed name");
                let base = known.map(|entry| entry.description).unwrap_or_default();
                format!("{base} [{file}]")
            }
        };

        Ok(ResolvedModule {
            artifact_path,
            canonical_path,
            description,
            source,
        })
    }

    /// Prefer the stripped new-style name when it exists or can be
    /// installed; otherwise keep the declared name, installing it from the
    /// cache when absent. Both branches may attempt an install during one
    /// resolution; the second attempt implies nothing about the first.
    fn settle_known_name(&self, artifacts_dir: &Path, known_name: String) -> String {
        if self.platform.os == Os::Linux {
            if let Some(stripped) = strip_variant_suffix(&known_name) {
                debug!(name = %stripped, "checking for new-style module name");
                let dest = artifacts_dir.join(&stripped);
                if dest.is_file() || install(self.cache, &cache_key(&stripped), &dest) {
                    return stripped;
                }
            } else {
                debug!(name = %known_name, "name does not qualify for a stripped variant");
            }
        }

        debug!(name = %known_name, "checking for declared module name");
        let dest = artifacts_dir.join(&known_name);
        if !dest.is_file() {
            install(self.cache, &cache_key(&known_name), &dest);
        }
        known_name
    }
}

fn cache_key(name: &str) -> String {
    format!("{ARTIFACTS_DIR}/{name}")
}

/// Truncate at the last `_` and append `.so`, the host loader's newer naming
/// scheme (`cs_i386.so` became `cs.so`). Requires the original name to be
/// longer than three characters and already end in `.so`.
fn strip_variant_suffix(name: &str) -> Option<String> {
    let index = name.rfind('_')?;
    if name.len() <= 3 || !name.to_ascii_lowercase().ends_with(".so") {
        return None;
    }
    Some(format!("{}.so", &name[..index]))
}
