//! Purpose: Interface negotiation with a loaded module across generations.
//! Exports: `ModuleBinary`, `DynModule`, `negotiate`, `NegotiatedInterface`,
//! `EntityGeneration`, `probe`, `SymbolReport`.
//! Role: Performs the mandatory pointer exchange, then walks the interface
//! generations newest-first until one is obtained.
//! Invariants: The exchange happens exactly once, before any interface probe.
//! Invariants: A version mismatch is only reported when the module wrote a
//! version back; the legacy interface cannot produce one.
use std::mem;
use std::os::raw::c_int;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::error::{Error, ErrorKind};
use crate::core::ffi::{
    ENTITY_API2_SYMBOL, ENTITY_API_SYMBOL, ENTITY_API_VERSION, EXCHANGE_SYMBOL, ExchangeFn,
    EXTENDED_API_SYMBOL, EXTENDED_API_VERSION, EntityApi2Fn, EntityApiFn, EntityApiTable,
    ExtendedApiFn, ExtendedApiTable, HostGlobals, RawFn,
};
use crate::core::hooks::HookTable;

/// Collaborator seam over a loaded binary: symbol lookup by name. Lets the
/// negotiation logic run against in-process fakes.
pub trait ModuleBinary {
    fn symbol(&self, name: &str) -> Option<RawFn>;
}

/// A module loaded from a dynamic library on disk.
pub struct DynModule {
    library: libloading::Library,
    path: PathBuf,
}

impl DynModule {
    pub fn open(path: &Path) -> Result<Self, Error> {
        // Safety: loading runs the library's initializers; the artifact was
        // resolved as this process's module and is trusted like the host.
        let library = unsafe { libloading::Library::new(path) }.map_err(|err| {
            Error::new(ErrorKind::Load)
                .with_message("failed to load module artifact")
                .with_path(path)
                .with_source(err)
        })?;
        Ok(Self {
            library,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModuleBinary for DynModule {
    fn symbol(&self, name: &str) -> Option<RawFn> {
        // Safety: the symbol is only ever called through a typed entry-point
        // alias below; here it is carried as an opaque address.
        unsafe {
            self.library
                .get::<RawFn>(name.as_bytes())
                .ok()
                .map(|symbol| *symbol)
        }
    }
}

/// Which entity-interface generation the module spoke.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityGeneration {
    V2,
    Legacy,
}

/// Everything negotiation produced: the entity table the module filled, the
/// generation it spoke, and the optional extended table.
#[derive(Debug)]
pub struct NegotiatedInterface {
    pub entity_generation: EntityGeneration,
    pub entity: EntityApiTable,
    pub extended: Option<ExtendedApiTable>,
}

/// Outcome of probing one in-out interface generation.
enum Probe {
    /// Symbol not exported; try the next generation.
    Missing,
    /// Symbol exported but the call failed with the version unchanged.
    Refused,
    /// The module wrote back a different version.
    Mismatch { wanted: c_int, got: c_int },
    Obtained,
}

/// Call an in-out getter: the wanted version goes in, the module may write
/// its own back on failure. Shared by the extended and V2 generations.
fn probe_in_out<T>(
    binary: &dyn ModuleBinary,
    symbol: &str,
    wanted: c_int,
    table: &mut T,
    call: impl FnOnce(RawFn, *mut T, *mut c_int) -> c_int,
) -> Probe {
    let Some(raw) = binary.symbol(symbol) else {
        debug!(symbol, "entry point not exported");
        return Probe::Missing;
    };
    let mut version = wanted;
    if call(raw, table, &mut version) != 0 {
        debug!(symbol, version = wanted, "interface obtained");
        Probe::Obtained
    } else if version != wanted {
        Probe::Mismatch {
            wanted,
            got: version,
        }
    } else {
        Probe::Refused
    }
}

/// Negotiate with a loaded module: mandatory pointer exchange, optional
/// extended interface, then the entity interface newest generation first.
pub fn negotiate(
    binary: &dyn ModuleBinary,
    hooks: &HookTable,
    globals: &mut HostGlobals,
) -> Result<NegotiatedInterface, Error> {
    // Mandatory exchange: without it the module can never call back in.
    let Some(raw) = binary.symbol(EXCHANGE_SYMBOL) else {
        return Err(Error::new(ErrorKind::EntryPointMissing)
            .with_message("module exports no pointer-exchange entry point")
            .with_symbol(EXCHANGE_SYMBOL));
    };
    // Safety: the symbol contract fixes this signature; the hook table and
    // globals outlive the module.
    unsafe {
        let exchange: ExchangeFn = mem::transmute::<RawFn, ExchangeFn>(raw);
        exchange(hooks.as_ptr(), globals);
    }

    // Optional extended interface; a mismatch or refusal costs the module
    // the extension, never the load.
    let mut extended_table = ExtendedApiTable::zeroed();
    let extended = match probe_in_out(
        binary,
        EXTENDED_API_SYMBOL,
        EXTENDED_API_VERSION,
        &mut extended_table,
        |raw, table, version| unsafe {
            let getter = mem::transmute::<RawFn, ExtendedApiFn>(raw);
            getter(table, version)
        },
    ) {
        Probe::Obtained => Some(extended_table),
        Probe::Mismatch { wanted, got } => {
            warn!(
                symbol = EXTENDED_API_SYMBOL,
                wanted, got, "extended interface version mismatch; continuing without it",
            );
            None
        }
        Probe::Refused => {
            warn!(
                symbol = EXTENDED_API_SYMBOL,
                "module refused the extended interface; continuing without it",
            );
            None
        }
        Probe::Missing => None,
    };

    // Entity interface, newest generation first. Any V2 outcome short of
    // obtained falls through to the legacy entry point; fatality is decided
    // only once both generations have had their chance.
    let mut entity = EntityApiTable::zeroed();
    let mut v2_mismatch = None;
    let v2 = probe_in_out(
        binary,
        ENTITY_API2_SYMBOL,
        ENTITY_API_VERSION,
        &mut entity,
        |raw, table, version| unsafe {
            let getter = mem::transmute::<RawFn, EntityApi2Fn>(raw);
            getter(table, version)
        },
    );
    let entity_generation = match v2 {
        Probe::Obtained => EntityGeneration::V2,
        outcome => {
            match outcome {
                Probe::Mismatch { wanted, got } => {
                    warn!(
                        symbol = ENTITY_API2_SYMBOL,
                        wanted, got, "entity interface version mismatch; trying the legacy entry point",
                    );
                    v2_mismatch = Some((wanted, got));
                }
                Probe::Refused => {
                    warn!(
                        symbol = ENTITY_API2_SYMBOL,
                        "module refused the entity interface; trying the legacy entry point",
                    );
                }
                _ => {}
            }
            // A failed V2 call may have written into the table.
            entity = EntityApiTable::zeroed();
            match probe_legacy(binary, &mut entity) {
                Probe::Obtained => EntityGeneration::Legacy,
                _ => {
                    return Err(match v2_mismatch {
                        Some((wanted, got)) => Error::new(ErrorKind::VersionMismatch)
                            .with_message("entity interface version mismatch")
                            .with_symbol(ENTITY_API2_SYMBOL)
                            .with_versions(wanted, got),
                        None => Error::new(ErrorKind::NoEntityInterface)
                            .with_message("module offers no usable entity interface")
                            .with_symbol(ENTITY_API_SYMBOL),
                    });
                }
            }
        }
    };

    Ok(NegotiatedInterface {
        entity_generation,
        entity,
        extended,
    })
}

/// Legacy generation: version passed by value, nothing written back, so a
/// failure is indistinguishable from refusal and never a version mismatch.
fn probe_legacy(binary: &dyn ModuleBinary, entity: &mut EntityApiTable) -> Probe {
    let Some(raw) = binary.symbol(ENTITY_API_SYMBOL) else {
        debug!(symbol = ENTITY_API_SYMBOL, "entry point not exported");
        return Probe::Missing;
    };
    // Safety: symbol contract fixes this signature.
    let obtained = unsafe {
        let getter = mem::transmute::<RawFn, EntityApiFn>(raw);
        getter(entity, ENTITY_API_VERSION)
    };
    if obtained == 0 {
        return Probe::Refused;
    }
    debug!(symbol = ENTITY_API_SYMBOL, "legacy entity interface obtained");
    Probe::Obtained
}

/// Which negotiation entry points a binary exports, without calling any.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SymbolReport {
    pub exchange: bool,
    pub extended: bool,
    pub entity_v2: bool,
    pub entity_legacy: bool,
}

pub fn probe(binary: &dyn ModuleBinary) -> SymbolReport {
    SymbolReport {
        exchange: binary.symbol(EXCHANGE_SYMBOL).is_some(),
        extended: binary.symbol(EXTENDED_API_SYMBOL).is_some(),
        entity_v2: binary.symbol(ENTITY_API2_SYMBOL).is_some(),
        entity_legacy: binary.symbol(ENTITY_API_SYMBOL).is_some(),
    }
}
