//! Purpose: Tie configuration, resolution, and negotiation into one startup
//! sequence for a host embedding the shim.
//! Exports: `Startup`, `StartupOptions`, `LoadedModule`.
//! Role: The orchestration layer; owns no policy of its own beyond wiring
//! the configured collaborators together in the documented order.
//! Invariants: Resolution completes before any library is loaded; the hook
//! table is finished before the exchange call hands it out.
use std::collections::HashSet;
use std::path::PathBuf;

use tracing::info;

use crate::core::cache::{ContentCache, DirCache, NoCache};
use crate::core::config::{ShimConfig, read_whitelist};
use crate::core::error::Error;
use crate::core::ffi::{HostApiTable, HostGlobals};
use crate::core::hooks::{HookPoint, HookTable, HookVariant};
use crate::core::negotiate::{DynModule, NegotiatedInterface, negotiate};
use crate::core::platform::Platform;
use crate::core::registry::ModuleRegistry;
use crate::core::resolve::{ArtifactScan, ResolutionRequest, ResolvedModule, Resolver};

/// Inputs the host supplies before anything is read from disk.
#[derive(Clone, Debug)]
pub struct StartupOptions {
    /// Module identifier, as the host names its game directory.
    pub identifier: String,
    pub working_directory: PathBuf,
    /// Config document path; a missing file means defaults.
    pub config_path: PathBuf,
    /// Root of a bundled content cache, when the host ships one.
    pub cache_root: Option<PathBuf>,
    /// Caller-supplied override, taking precedence over the config document.
    pub override_artifact: Option<PathBuf>,
    /// Caller-supplied autodetect setting, taking precedence over the config
    /// document.
    pub autodetect: Option<bool>,
}

/// Prepared startup state: config and whitelist are read exactly once, then
/// resolution and loading draw on them.
pub struct Startup {
    config: ShimConfig,
    whitelist: HashSet<HookPoint>,
    request: ResolutionRequest,
    cache_root: Option<PathBuf>,
}

impl Startup {
    pub fn prepare(options: StartupOptions) -> Result<Self, Error> {
        let mut config = ShimConfig::load(&options.config_path)?;
        if let Some(path) = options.override_artifact {
            config.override_artifact = Some(path);
        }
        if let Some(autodetect) = options.autodetect {
            config.autodetect = autodetect;
        }
        let whitelist = match &config.slowhooks_whitelist {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    options.working_directory.join(path)
                };
                read_whitelist(&path)?
            }
            None => HashSet::new(),
        };
        let request = ResolutionRequest {
            identifier: options.identifier,
            working_directory: options.working_directory,
            override_artifact: config.override_artifact.clone(),
            autodetect: config.autodetect,
        };
        Ok(Self {
            config,
            whitelist,
            request,
            cache_root: options.cache_root,
        })
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    pub fn hook_variant(&self) -> HookVariant {
        if self.config.slowhooks {
            HookVariant::Slow
        } else {
            HookVariant::Fast
        }
    }

    pub fn whitelist(&self) -> &HashSet<HookPoint> {
        &self.whitelist
    }

    /// Resolve the module artifact without loading it.
    pub fn resolve(&self) -> Result<ResolvedModule, Error> {
        let registry = ModuleRegistry::builtin();
        let platform = Platform::host();
        let cache: Box<dyn ContentCache> = match &self.cache_root {
            Some(root) => Box::new(DirCache::new(root)),
            None => Box::new(NoCache),
        };
        let detector = ArtifactScan::new(platform);
        let resolver = Resolver::new(&registry, platform, cache.as_ref(), &detector);
        resolver.resolve(&self.request)
    }

    pub fn build_hooks(&self, upstream: &HostApiTable, intercept: &HostApiTable) -> HookTable {
        HookTable::build(upstream, intercept, self.hook_variant(), &self.whitelist)
    }

    /// The full sequence: resolve, build the dispatch table, load the
    /// library, negotiate. The host keeps the returned value alive for as
    /// long as the module may call back through the table.
    pub fn load(
        &self,
        upstream: &HostApiTable,
        intercept: &HostApiTable,
        globals: &mut HostGlobals,
    ) -> Result<LoadedModule, Error> {
        let resolved = self.resolve()?;
        let hooks = self.build_hooks(upstream, intercept);
        let module = DynModule::open(&resolved.artifact_path)?;
        let interface = negotiate(&module, &hooks, globals)?;
        info!(
            module = %resolved.description,
            source = resolved.source.tag(),
            generation = ?interface.entity_generation,
            variant = ?hooks.variant(),
            "module attached",
        );
        Ok(LoadedModule {
            resolved,
            module,
            hooks,
            interface,
        })
    }
}

/// An attached module. Dropping this unloads the library, so the host must
/// outlive every callback it handed out through the hook table.
pub struct LoadedModule {
    pub resolved: ResolvedModule,
    pub module: DynModule,
    pub hooks: HookTable,
    pub interface: NegotiatedInterface,
}

#[cfg(test)]
mod tests {
    use super::{Startup, StartupOptions};
    use crate::core::hooks::{HookPoint, HookVariant};
    use std::fs;

    fn options(dir: &std::path::Path) -> StartupOptions {
        StartupOptions {
            identifier: "valve".to_string(),
            working_directory: dir.to_path_buf(),
            config_path: dir.join("gamelink.json"),
            cache_root: None,
            override_artifact: None,
            autodetect: None,
        }
    }

    #[test]
    fn default_config_selects_slow_hooks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let startup = Startup::prepare(options(dir.path())).expect("prepare");
        assert_eq!(startup.hook_variant(), HookVariant::Slow);
        assert!(startup.whitelist().is_empty());
    }

    #[test]
    fn fast_hooks_with_whitelist_read_relative_to_workdir() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("gamelink.json"),
            r#"{"slowhooks": false, "slowhooks_whitelist": "slowhooks.list"}"#,
        )
        .expect("config");
        fs::write(dir.path().join("slowhooks.list"), "trace_line\n").expect("whitelist");

        let startup = Startup::prepare(options(dir.path())).expect("prepare");
        assert_eq!(startup.hook_variant(), HookVariant::Fast);
        assert!(startup.whitelist().contains(&HookPoint::TraceLine));
    }

    #[test]
    fn caller_settings_beat_the_config_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("gamelink.json"),
            r#"{"override": "artifacts/from-config.so", "autodetect": true}"#,
        )
        .expect("config");

        let mut opts = options(dir.path());
        opts.override_artifact = Some("artifacts/from-flag.so".into());
        opts.autodetect = Some(false);
        let startup = Startup::prepare(opts).expect("prepare");
        assert_eq!(
            startup.config().override_artifact.as_deref(),
            Some(std::path::Path::new("artifacts/from-flag.so"))
        );
        assert!(!startup.config().autodetect);
    }

    #[test]
    fn resolution_request_carries_config_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("gamelink.json"),
            r#"{"override": "artifacts/custom.so"}"#,
        )
        .expect("config");
        fs::create_dir(dir.path().join("artifacts")).expect("mkdir");
        fs::write(dir.path().join("artifacts/custom.so"), b"lib").expect("artifact");

        let startup = Startup::prepare(options(dir.path())).expect("prepare");
        let resolved = startup.resolve().expect("resolve");
        assert_eq!(resolved.artifact_path, dir.path().join("artifacts/custom.so"));
    }
}
