//! [`DaemonClient`] over the newline-delimited JSON control socket.
//!
//! One request per connection: `{"op": "...", ...}` out, one
//! `{"ok": bool, "data"?, "error"?}` line back.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::client::{DaemonClient, PluginHandle, PluginInfo, VersionInfo};
use crate::error::{io_err, DaemonError};

/// Read timeout for every call except `enable`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// JSON newline-delimited request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonRequest {
    pub op: String,
    #[serde(flatten)]
    pub args: Map<String, Value>,
}

impl DaemonRequest {
    pub fn new(op: impl Into<String>, args: Value) -> Self {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            op: op.into(),
            args,
        }
    }
}

/// JSON newline-delimited response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DaemonResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Client for the daemon listening on a Unix socket.
#[derive(Debug, Clone)]
pub struct SocketClient {
    socket: PathBuf,
    timeout: Duration,
}

impl SocketClient {
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        Self {
            socket: socket.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Send one request and return one response.
    pub fn send_request(
        &self,
        request: &DaemonRequest,
        timeout: Duration,
    ) -> Result<DaemonResponse, DaemonError> {
        let socket = &self.socket;
        if !socket.exists() {
            return Err(DaemonError::Unavailable {
                reason: format!("socket {} does not exist", socket.display()),
            });
        }

        let mut stream = UnixStream::connect(socket).map_err(|err| {
            if matches!(
                err.kind(),
                std::io::ErrorKind::NotFound
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
            ) {
                DaemonError::Unavailable {
                    reason: format!("{}: {err}", socket.display()),
                }
            } else {
                io_err(socket, err)
            }
        })?;
        stream
            .set_read_timeout(Some(timeout))
            .map_err(|e| io_err(socket, e))?;

        let payload = serde_json::to_string(request)?;
        tracing::debug!(op = %request.op, "daemon request");
        stream
            .write_all(payload.as_bytes())
            .map_err(|e| io_err(socket, e))?;
        stream.write_all(b"\n").map_err(|e| io_err(socket, e))?;
        stream.flush().map_err(|e| io_err(socket, e))?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| io_err(socket, e))?;
        if read == 0 {
            return Err(DaemonError::Protocol(
                "daemon closed connection before responding".to_string(),
            ));
        }

        let response: DaemonResponse = serde_json::from_str(line.trim_end())?;
        Ok(response)
    }

    fn call(&self, op: &str, args: Value, timeout: Duration) -> Result<Value, DaemonError> {
        let response = self.send_request(&DaemonRequest::new(op, args), timeout)?;
        response_into_data(op, response)
    }

    fn call_as<T: DeserializeOwned>(&self, op: &str, args: Value) -> Result<T, DaemonError> {
        let data = self.call(op, args, self.timeout)?;
        Ok(serde_json::from_value(data)?)
    }
}

fn response_into_data(op: &str, response: DaemonResponse) -> Result<Value, DaemonError> {
    if response.ok {
        Ok(response.data.unwrap_or(Value::Null))
    } else {
        Err(DaemonError::Call {
            op: op.to_string(),
            msg: response
                .error
                .unwrap_or_else(|| "unknown daemon error".to_string()),
        })
    }
}

impl DaemonClient for SocketClient {
    fn ping(&self) -> Result<(), DaemonError> {
        self.call("ping", Value::Null, self.timeout).map(|_| ())
    }

    fn list_plugins(&self) -> Result<Vec<PluginInfo>, DaemonError> {
        self.call_as("plugins.list", Value::Null)
    }

    fn get_plugin(&self, name: &str) -> Result<PluginHandle, DaemonError> {
        self.call_as("plugins.get", json!({ "name": name }))
    }

    fn install_plugin(&self, remote: &str, local: &str) -> Result<PluginHandle, DaemonError> {
        self.call_as(
            "plugins.install",
            json!({ "remote": remote, "local": local, "grant_all_permissions": true }),
        )
    }

    fn enable(&self, handle: &PluginHandle, timeout: Duration) -> Result<(), DaemonError> {
        self.call(
            "plugins.enable",
            json!({ "id": handle.id, "timeout": timeout.as_secs() }),
            timeout.max(self.timeout),
        )
        .map(|_| ())
    }

    fn disable(&self, handle: &PluginHandle, force: bool) -> Result<(), DaemonError> {
        self.call(
            "plugins.disable",
            json!({ "id": handle.id, "force": force }),
            self.timeout,
        )
        .map(|_| ())
    }

    fn remove_plugin(&self, handle: &PluginHandle, force: bool) -> Result<(), DaemonError> {
        self.call(
            "plugins.remove",
            json!({ "id": handle.id, "force": force }),
            self.timeout,
        )
        .map(|_| ())
    }

    fn reload(&self, handle: &PluginHandle) -> Result<PluginInfo, DaemonError> {
        self.call_as("plugins.reload", json!({ "id": handle.id }))
    }

    fn version(&self) -> Result<VersionInfo, DaemonError> {
        self.call_as("version", Value::Null)
    }
}
