//! Endpoint resolution.
//!
//! - Windows: `\\.\pipe\discord-ipc-{index}` (a pipe name, not a file)
//! - Unix: `{base}/discord-ipc-{index}`, where `base` is the first non-empty
//!   of `XDG_RUNTIME_DIR`, `TMPDIR`, `TMP`, `TEMP`, else the OS temp dir
//!
//! Resolution takes an environment lookup so both branches can be exercised
//! on any host.

use std::ffi::OsString;
use std::path::PathBuf;

/// File / pipe name prefix; the endpoint index is appended.
pub const ENDPOINT_PREFIX: &str = "discord-ipc-";

/// The only endpoint index this client connects to.
pub const DEFAULT_ENDPOINT_INDEX: u32 = 0;

/// Variables consulted for the unix base directory, in priority order.
pub const BASE_DIR_VARS: [&str; 4] = ["XDG_RUNTIME_DIR", "TMPDIR", "TMP", "TEMP"];

/// Which endpoint naming scheme applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Resolve the endpoint from the process environment.
    pub fn endpoint(self, index: u32) -> PathBuf {
        self.endpoint_with(index, |key| std::env::var_os(key))
    }

    /// Resolve the endpoint using `env` to read variables.
    pub fn endpoint_with<F>(self, index: u32, env: F) -> PathBuf
    where
        F: Fn(&str) -> Option<OsString>,
    {
        match self {
            Platform::Windows => PathBuf::from(format!(r"\\.\pipe\{}{}", ENDPOINT_PREFIX, index)),
            Platform::Unix => base_dir_with(env).join(format!("{}{}", ENDPOINT_PREFIX, index)),
        }
    }
}

/// Unix base directory for the socket file.
pub fn base_dir_with<F>(env: F) -> PathBuf
where
    F: Fn(&str) -> Option<OsString>,
{
    BASE_DIR_VARS
        .iter()
        .filter_map(|key| env(key))
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

/// Endpoint for `index` on the current platform.
pub fn ipc_endpoint(index: u32) -> PathBuf {
    Platform::current().endpoint(index)
}
