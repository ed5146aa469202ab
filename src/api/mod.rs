//! Purpose: Define the stable public Rust API boundary for Gamelink.
//! Exports: Core types and operations needed by hosts and the CLI.
//! Role: Public, additive-only surface; hides internal module layout.
//! Invariants: This module is the only public path to resolution and
//! negotiation primitives.

mod startup;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::cache::{ContentCache, DirCache, NoCache};
pub use crate::core::config::{ShimConfig, read_whitelist};
pub use crate::core::ffi::{
    EntityApiTable, ExtendedApiTable, HostApiTable, HostGlobals, RawFn,
};
pub use crate::core::hooks::{FAST_PATH, HookPoint, HookTable, HookVariant};
pub use crate::core::negotiate::{
    DynModule, EntityGeneration, ModuleBinary, NegotiatedInterface, SymbolReport, negotiate,
    probe,
};
pub use crate::core::platform::{Os, Platform};
pub use crate::core::registry::{ModuleDescriptor, ModuleRegistry, NO_ARTIFACT};
pub use crate::core::resolve::{
    ArtifactScan, AutoDetector, ModuleSource, NoAutoDetect, ResolutionRequest, ResolvedModule,
    Resolver,
};
pub use startup::{LoadedModule, Startup, StartupOptions};
