//! Platform-specific socket/pipe client.
//!
//! - Unix: Unix Domain Socket
//! - Windows: Named Pipe
//!
//! Both bodies expose the same [`PipeStream`] contract: connect to an
//! endpoint, then split into boxed read and write halves.
//!
//! # Example
//!
//! ```ignore
//! use presence_ipc::transport::{ipc_endpoint, PipeStream};
//!
//! let stream = PipeStream::connect(&ipc_endpoint(0)).await?;
//! let (reader, writer) = stream.into_split();
//! ```

use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{IpcError, Result};

/// Read half handed to the background reader.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Write half guarded by the connection.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

fn connection_error(endpoint: &Path, source: std::io::Error) -> IpcError {
    IpcError::Connection {
        endpoint: endpoint.to_path_buf(),
        source,
    }
}

// ============================================================================
// Unix Implementation
// ============================================================================

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use tokio::net::UnixStream;

    /// Connected Unix Domain Socket.
    pub struct PipeStream {
        stream: UnixStream,
    }

    impl PipeStream {
        /// Connect to the socket file at `endpoint`.
        pub async fn connect(endpoint: &Path) -> Result<Self> {
            let stream = UnixStream::connect(endpoint)
                .await
                .map_err(|e| connection_error(endpoint, e))?;
            Ok(Self { stream })
        }

        /// Split into read and write halves.
        pub fn into_split(self) -> (BoxedReader, BoxedWriter) {
            let (reader, writer) = self.stream.into_split();
            (Box::new(reader), Box::new(writer))
        }
    }
}

// ============================================================================
// Windows Implementation
// ============================================================================

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeClient};

    /// Connected Windows Named Pipe client.
    pub struct PipeStream {
        pipe: NamedPipeClient,
    }

    impl PipeStream {
        /// Open the named pipe `endpoint`.
        pub async fn connect(endpoint: &Path) -> Result<Self> {
            let pipe = ClientOptions::new()
                .open(endpoint)
                .map_err(|e| connection_error(endpoint, e))?;
            Ok(Self { pipe })
        }

        /// Split into read and write halves.
        pub fn into_split(self) -> (BoxedReader, BoxedWriter) {
            let (reader, writer) = tokio::io::split(self.pipe);
            (Box::new(reader), Box::new(writer))
        }
    }
}

// ============================================================================
// Platform-independent re-exports
// ============================================================================

#[cfg(unix)]
pub use unix_impl::PipeStream;

#[cfg(windows)]
pub use windows_impl::PipeStream;
