//! Transport module - platform-specific pipe/socket handling.
//!
//! Provides abstraction over:
//! - Unix Domain Sockets (Linux/macOS)
//! - Named Pipes (Windows)

mod endpoint;
mod pipe;

pub use endpoint::{
    base_dir_with, ipc_endpoint, Platform, BASE_DIR_VARS, DEFAULT_ENDPOINT_INDEX, ENDPOINT_PREFIX,
};
pub use pipe::{BoxedReader, BoxedWriter, PipeStream};
