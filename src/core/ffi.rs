//! Purpose: Binary-interface surface shared with loaded game modules.
//! Exports: table layouts, entry-point types, symbol names, version constants.
//! Role: Declares the C ABI the negotiator exchanges with a module; the shim
//! never interprets entity-table contents, it only carries them.
//! Invariants: Layouts are `repr(C)` and fixed; versions never change at runtime.
//! Invariants: `Option<RawFn>` has the same layout as `RawFn` (niche guarantee),
//! so zeroed slots read as `None` on the Rust side.
use std::os::raw::{c_char, c_int};

/// Opaque entry point. Concrete signatures are a contract between the host
/// provider and the module; the shim treats entries as addresses.
pub type RawFn = unsafe extern "C" fn();

/// Number of host-side entry points routed through the hook table.
pub const HOST_API_SLOTS: usize = 28;
/// Slots in the entity-interface table a module fills during negotiation.
pub const ENTITY_API_SLOTS: usize = 48;
/// Slots in the optional extended-interface table.
pub const EXTENDED_API_SLOTS: usize = 8;

/// Expected version of the entity interface, both legacy and V2 flavors.
pub const ENTITY_API_VERSION: c_int = 140;
/// Expected version of the optional extended interface.
pub const EXTENDED_API_VERSION: c_int = 1;

/// Mandatory entry point: the module receives the host's hook table.
pub const EXCHANGE_SYMBOL: &str = "GiveHostFnptrs";
/// Optional extended interface, tried first.
pub const EXTENDED_API_SYMBOL: &str = "GetExtendedApi";
/// V2 entity interface: version negotiated in-out.
pub const ENTITY_API2_SYMBOL: &str = "GetEntityApi2";
/// Legacy entity interface: version passed by value.
pub const ENTITY_API_SYMBOL: &str = "GetEntityApi";

#[repr(C)]
#[derive(Clone, Copy)]
pub struct HostApiTable {
    pub entries: [RawFn; HOST_API_SLOTS],
}

impl HostApiTable {
    /// Table with every slot pointing at the same entry; the hook-table
    /// builder and tests start from uniform tables.
    pub fn filled(entry: RawFn) -> Self {
        Self {
            entries: [entry; HOST_API_SLOTS],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct EntityApiTable {
    pub entries: [Option<RawFn>; ENTITY_API_SLOTS],
}

impl EntityApiTable {
    pub fn zeroed() -> Self {
        Self {
            entries: [None; ENTITY_API_SLOTS],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|entry| entry.is_none())
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ExtendedApiTable {
    pub entries: [Option<RawFn>; EXTENDED_API_SLOTS],
}

impl ExtendedApiTable {
    pub fn zeroed() -> Self {
        Self {
            entries: [None; EXTENDED_API_SLOTS],
        }
    }
}

/// Host globals handed to the module alongside the hook table.
#[repr(C)]
pub struct HostGlobals {
    pub time: f32,
    pub max_clients: c_int,
    pub max_entities: c_int,
    pub string_base: *const c_char,
}

impl HostGlobals {
    pub fn new(max_clients: c_int, max_entities: c_int) -> Self {
        Self {
            time: 0.0,
            max_clients,
            max_entities,
            string_base: std::ptr::null(),
        }
    }
}

/// `GiveHostFnptrs(table, globals)`.
pub type ExchangeFn = unsafe extern "C" fn(*const HostApiTable, *mut HostGlobals);
/// `GetEntityApi(table, version)` — legacy, version by value, nonzero on success.
pub type EntityApiFn = unsafe extern "C" fn(*mut EntityApiTable, c_int) -> c_int;
/// `GetEntityApi2(table, version)` — V2, version in-out, nonzero on success.
pub type EntityApi2Fn = unsafe extern "C" fn(*mut EntityApiTable, *mut c_int) -> c_int;
/// `GetExtendedApi(table, version)` — optional, version in-out.
pub type ExtendedApiFn = unsafe extern "C" fn(*mut ExtendedApiTable, *mut c_int) -> c_int;

#[cfg(test)]
mod tests {
    use super::{EntityApiTable, ExtendedApiTable, HostApiTable, RawFn};
    use std::mem::size_of;

    unsafe extern "C" fn marker() {}

    #[test]
    fn option_raw_fn_keeps_pointer_layout() {
        // Zeroed table memory must decode as empty slots.
        assert_eq!(size_of::<Option<RawFn>>(), size_of::<RawFn>());
    }

    #[test]
    fn zeroed_tables_have_no_entries() {
        assert!(EntityApiTable::zeroed().is_empty());
        assert!(
            ExtendedApiTable::zeroed()
                .entries
                .iter()
                .all(|entry| entry.is_none())
        );
    }

    #[test]
    fn filled_table_repeats_the_entry() {
        let table = HostApiTable::filled(marker);
        for entry in table.entries {
            assert_eq!(entry as usize, marker as usize);
        }
    }
}
