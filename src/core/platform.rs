//! Purpose: Platform selection for artifact naming, chosen once at startup.
//! Exports: `Os`, `Platform`, `rewrite_arch_suffix`.
//! Role: Replaces per-OS conditional compilation in the resolution pipeline;
//! the resolver receives a `Platform` value and never consults `cfg!` itself.
//! Invariants: The arch rewrite only fires on an exact filename tail match.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Os {
    Linux,
    Windows,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Platform {
    pub os: Os,
    pub arch64: bool,
}

impl Platform {
    /// The platform the process is actually running on.
    pub fn host() -> Self {
        let os = if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            Os::Linux
        };
        Self {
            os,
            arch64: cfg!(target_pointer_width = "64"),
        }
    }

    pub fn dylib_extension(&self) -> &'static str {
        match self.os {
            Os::Linux => "so",
            Os::Windows => "dll",
        }
    }
}

const ARCH_TAILS: [&str; 4] = ["_i386.so", "_i486.so", "_i586.so", "_i686.so"];

/// Rewrite a 32-bit x86 artifact suffix to its 64-bit counterpart.
///
/// Historical catalogue entries carry `_i386.so`-era names; on a 64-bit
/// POSIX host the shipped binaries use `_amd64.so` instead. Returns `None`
/// when the name does not end in one of the known 32-bit tails (a mid-name
/// occurrence does not count).
pub fn rewrite_arch_suffix(name: &str) -> Option<String> {
    for tail in ARCH_TAILS {
        if let Some(base) = name.strip_suffix(tail) {
            return Some(format!("{base}_amd64.so"));
        }
    }
    None
}
