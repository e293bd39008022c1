//! IPC (Inter-Process Communication) via Unix sockets
//!
//! Launch requests reach the clock daemon as length-prefixed JSON over a Unix domain socket.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

mod listener;
mod messages;
pub use listener::spawn_ipc_listener;
pub use messages::{ClockRequest, ClockResponse};

use crate::constants::{package, paths};

/// Maximum message size (10 MB) to prevent DoS via memory exhaustion
const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Get default socket path (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_socket_path() -> Result<PathBuf> {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir).join(package::APP_DIR).join(paths::SOCKET_FILENAME));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(package::APP_DIR).join(paths::SOCKET_FILENAME))
}

/// One-shot channel carrying the daemon's answer back to the connection thread
#[derive(Debug, Clone)]
pub struct ReplyChannel(mpsc::Sender<ClockResponse>);

impl ReplyChannel {
    pub fn new() -> (Self, mpsc::Receiver<ClockResponse>) {
        let (tx, rx) = mpsc::channel();
        (Self(tx), rx)
    }

    pub fn send(&self, response: ClockResponse) -> Result<()> {
        self.0
            .send(response)
            .map_err(|_| anyhow!("Requester is no longer waiting for a reply"))
    }
}

/// Client connection to the clock daemon
pub struct ClockClient {
    pub(crate) stream: UnixStream,
}

impl ClockClient {
    /// Connect to specific socket path
    pub fn connect_to(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .context(format!("Failed to connect to clock daemon at {}", path.display()))?;
        Ok(Self { stream })
    }

    /// Bound how long a request may wait for its response
    pub fn set_timeout(&self, timeout: Duration) -> Result<()> {
        self.stream
            .set_read_timeout(Some(timeout))
            .context("Failed to set socket read timeout")
    }

    pub fn send_request(&mut self, req: &ClockRequest) -> Result<()> {
        write_message(&mut self.stream, req)
    }

    /// Receive response from the daemon (blocking)
    pub fn recv_response(&mut self) -> Result<ClockResponse> {
        read_message(&mut self.stream)
    }

    /// Send request and wait for response (convenience method)
    pub fn request(&mut self, req: ClockRequest) -> Result<ClockResponse> {
        self.send_request(&req)?;
        self.recv_response()
    }
}

/// Server listener of the clock daemon
pub struct ClockServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl ClockServer {
    /// Create server and bind to specific socket path
    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create socket directory: {}", parent.display()))?;
        }

        // Remove stale socket if exists
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .context(format!("Failed to remove stale socket: {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .context(format!("Failed to bind socket at {}", socket_path.display()))?;

        // Owner only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Accept incoming connection (blocking)
    pub fn accept(&self) -> Result<ClockClient> {
        let (stream, _addr) = self.listener.accept().context("Failed to accept IPC connection")?;
        Ok(ClockClient { stream })
    }

    pub fn path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for ClockServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Write length-prefixed message to stream
pub(crate) fn write_message<T: Serialize, W: Write>(stream: &mut W, msg: &T) -> Result<()> {
    let json = serde_json::to_vec(msg).context("Failed to serialize message to JSON")?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", json.len(), MAX_MESSAGE_SIZE));
    }

    // Length prefix (u32 little-endian)
    let len = json.len() as u32;
    stream
        .write_all(&len.to_le_bytes())
        .context("Failed to write message length")?;

    stream
        .write_all(&json)
        .context("Failed to write message payload")?;

    stream.flush().context("Failed to flush stream")?;

    Ok(())
}

/// Read length-prefixed message from stream
pub(crate) fn read_message<T: for<'de> Deserialize<'de>, R: Read>(stream: &mut R) -> Result<T> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .context("Failed to read message length")?;
    let len = u32::from_le_bytes(len_buf) as usize;

    // Sanity check (prevent DoS via huge allocation)
    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", len, MAX_MESSAGE_SIZE));
    }

    let mut json_buf = vec![0u8; len];
    stream
        .read_exact(&mut json_buf)
        .context("Failed to read message payload")?;

    serde_json::from_slice(&json_buf).context("Failed to deserialize message from JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;

    #[test]
    fn test_frame_layout() {
        let mut buf = Vec::new();
        write_message(&mut buf, &ClockRequest::Ping).unwrap();

        let payload = br#""Ping""#;
        assert_eq!(&buf[..4], &(payload.len() as u32).to_le_bytes());
        assert_eq!(&buf[4..], payload);
    }

    #[test]
    fn test_app_control_survives_framing() {
        let mut extra = HashMap::new();
        extra.insert("target".to_string(), "minicontrol".to_string());
        let req = ClockRequest::AppControl {
            operation: crate::constants::operation::CAPTURE.to_string(),
            extra,
        };

        let mut buf = Vec::new();
        write_message(&mut buf, &req).unwrap();
        let back: ClockRequest = read_message(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn test_oversized_length_is_rejected() {
        let mut buf = ((MAX_MESSAGE_SIZE + 1) as u32).to_le_bytes().to_vec();
        buf.extend_from_slice(b"{}");
        let result: Result<ClockResponse> = read_message(&mut Cursor::new(buf));
        assert!(result.is_err());
    }

    #[test]
    fn test_truncated_payload_is_an_error() {
        let mut buf = 10u32.to_le_bytes().to_vec();
        buf.extend_from_slice(b"\"Po");
        let result: Result<ClockRequest> = read_message(&mut Cursor::new(buf));
        assert!(result.is_err());
    }

    #[test]
    fn test_socket_request_response() {
        let dir = tempfile::tempdir().unwrap();
        let server = ClockServer::bind_to(dir.path().join("clock.sock")).unwrap();
        let path = server.path().to_path_buf();

        let handle = std::thread::spawn(move || {
            let mut conn = server.accept().unwrap();
            let req: ClockRequest = read_message(&mut conn.stream).unwrap();
            assert_eq!(req, ClockRequest::Ping);
            write_message(&mut conn.stream, &ClockResponse::Pong).unwrap();
        });

        let mut client = ClockClient::connect_to(&path).unwrap();
        assert_eq!(client.request(ClockRequest::Ping).unwrap(), ClockResponse::Pong);
        handle.join().unwrap();
    }
}
