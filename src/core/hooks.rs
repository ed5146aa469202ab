//! Purpose: Hook dispatch-table construction with fast/slow variants.
//! Exports: `HookPoint`, `HookVariant`, `HookTable`, `FAST_PATH`.
//! Role: Built exactly once before the exchange call; immutable afterward.
//! Invariants: `FAST_PATH` is data — changing the enumeration changes
//! behavior, not performance, so it is never inferred from signatures.
//! Invariants: The table is boxed so its address is stable for the process
//! lifetime, and it is fully populated before anyone sees a pointer to it.
use std::collections::HashSet;

use crate::core::ffi::{HOST_API_SLOTS, HostApiTable, RawFn};

macro_rules! hook_points {
    ($(($variant:ident, $name:literal)),+ $(,)?) => {
        /// A named host entry point routed through the hook table.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[repr(usize)]
        pub enum HookPoint {
            $($variant),+
        }

        impl HookPoint {
            pub const ALL: [HookPoint; HOST_API_SLOTS] = [$(HookPoint::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(HookPoint::$variant => $name),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(HookPoint::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

hook_points! {
    // Hot, side-effect-free entries; candidates for the fast path.
    (ModelIndex, "model_index"),
    (ModelFrames, "model_frames"),
    (SetSize, "set_size"),
    (VecToYaw, "vec_to_yaw"),
    (VecToAngles, "vec_to_angles"),
    (ChangeYaw, "change_yaw"),
    (FindEntityByString, "find_entity_by_string"),
    (GetEntityIllum, "get_entity_illum"),
    (FindEntityInSphere, "find_entity_in_sphere"),
    (TraceLine, "trace_line"),
    (TraceHull, "trace_hull"),
    (PointContents, "point_contents"),
    (RandomLong, "random_long"),
    (RandomFloat, "random_float"),
    (Time, "time"),
    (IndexOfEdict, "index_of_edict"),
    (EntityOfEntIndex, "entity_of_ent_index"),
    (CheckVisibility, "check_visibility"),
    // Behaviorally significant entries; always intercepted.
    (AddServerCommand, "add_server_command"),
    (RegisterCvar, "register_cvar"),
    (RegisterUserMessage, "register_user_message"),
    (MessageBegin, "message_begin"),
    (MessageEnd, "message_end"),
    (ServerCommand, "server_command"),
    (ServerExecute, "server_execute"),
    (ChangeLevel, "change_level"),
    (QueryClientCvarValue, "query_client_cvar_value"),
    (ServerPrint, "server_print"),
}

/// Entries copied straight from the upstream provider in fast mode,
/// bypassing interception. Everything not listed here stays intercepted in
/// both variants. List membership is behavior, not tuning.
pub const FAST_PATH: &[HookPoint] = &[
    HookPoint::ModelIndex,
    HookPoint::ModelFrames,
    HookPoint::SetSize,
    HookPoint::VecToYaw,
    HookPoint::VecToAngles,
    HookPoint::ChangeYaw,
    HookPoint::FindEntityByString,
    HookPoint::GetEntityIllum,
    HookPoint::FindEntityInSphere,
    HookPoint::TraceLine,
    HookPoint::TraceHull,
    HookPoint::PointContents,
    HookPoint::RandomLong,
    HookPoint::RandomFloat,
    HookPoint::Time,
    HookPoint::IndexOfEdict,
    HookPoint::EntityOfEntIndex,
    HookPoint::CheckVisibility,
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HookVariant {
    Fast,
    Slow,
}

/// The active dispatch table. Exactly one is built per process; entries are
/// patched once at construction and never again.
pub struct HookTable {
    variant: HookVariant,
    table: Box<HostApiTable>,
}

impl HookTable {
    /// Build the active table. Slow mode routes every entry through the
    /// interception layer. Fast mode starts from interception and patches
    /// the `FAST_PATH` enumeration to the upstream provider, except entries
    /// the whitelist pins back onto interception.
    pub fn build(
        upstream: &HostApiTable,
        intercept: &HostApiTable,
        variant: HookVariant,
        whitelist: &HashSet<HookPoint>,
    ) -> Self {
        let mut table = Box::new(*intercept);
        if variant == HookVariant::Fast {
            for &point in FAST_PATH {
                if whitelist.contains(&point) {
                    continue;
                }
                table.entries[point as usize] = upstream.entries[point as usize];
            }
        }
        Self { variant, table }
    }

    pub fn variant(&self) -> HookVariant {
        self.variant
    }

    pub fn entry(&self, point: HookPoint) -> RawFn {
        self.table.entries[point as usize]
    }

    /// Stable address of the finished table, for the exchange entry point.
    pub fn as_ptr(&self) -> *const HostApiTable {
        &*self.table
    }
}
