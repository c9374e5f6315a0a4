//! Client side of a tool-server connection.
//!
//! Requests are multiplexed over one stream and matched to responses by id.
//! A response that arrives after its caller gave up is dropped.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use cdtooling::{InvocationRequest, InvocationResponse, ToolServer};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

use crate::{
    InitializeResult, ListToolsResult, RpcRequest, RpcResponse, ToolDescriptor, WireError,
    method, serve_connection,
};

const IN_PROCESS_BUFFER: usize = 64 * 1024;

type PendingMap = HashMap<u64, oneshot::Sender<RpcResponse>>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

pub struct Connection {
    name: String,
    writer: Mutex<BoxedWriter>,
    pending: Arc<StdMutex<PendingMap>>,
    closed: Arc<AtomicBool>,
    next_id: AtomicU64,
    reader_task: JoinHandle<()>,
    child: Option<Child>,
}

impl Connection {
    /// Wraps an already-open byte stream. Must be called inside a tokio runtime.
    pub fn new<R, W>(name: impl Into<String>, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let name = name.into();
        let pending = Arc::new(StdMutex::new(PendingMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let reader_task = tokio::spawn(read_responses(
            name.clone(),
            reader,
            Arc::clone(&pending),
            Arc::clone(&closed),
        ));

        Self {
            name,
            writer: Mutex::new(Box::new(writer)),
            pending,
            closed,
            next_id: AtomicU64::new(1),
            reader_task,
            child: None,
        }
    }

    /// Spawns `command` and talks to it over its stdin/stdout.
    pub fn spawn_stdio(
        name: impl Into<String>,
        command: &str,
        args: &[String],
    ) -> Result<Self, WireError> {
        let name = name.into();
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| WireError::spawn(format!("cannot start '{command}' for {name}: {err}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| WireError::spawn(format!("no stdin for {name}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WireError::spawn(format!("no stdout for {name}")))?;

        let mut connection = Self::new(name, stdout, stdin);
        connection.child = Some(child);
        Ok(connection)
    }

    /// Serves `server` on a background task over an in-memory duplex pipe.
    pub fn in_process(name: impl Into<String>, server: Arc<ToolServer>) -> Self {
        let name = name.into();
        let (client_side, server_side) = tokio::io::duplex(IN_PROCESS_BUFFER);
        let (server_reader, server_writer) = tokio::io::split(server_side);

        let server_name = name.clone();
        tokio::spawn(async move {
            if let Err(error) = serve_connection(server, server_reader, server_writer).await {
                tracing::warn!(server = server_name, event = "serve_failed", error = %error);
            }
        });

        let (reader, writer) = tokio::io::split(client_side);
        Self::new(name, reader, writer)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub async fn request(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, WireError> {
        if self.is_closed() {
            return Err(WireError::closed(format!("connection to {} is closed", self.name)));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        self.lock_pending()?.insert(id, sender);

        if let Err(error) = self.send(&RpcRequest::new(id, method, params)).await {
            self.forget(id);
            return Err(error);
        }

        let response = match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(WireError::closed(format!(
                    "connection to {} closed while waiting for '{method}'",
                    self.name
                )));
            }
            Err(_) => {
                self.forget(id);
                return Err(WireError::timeout(format!(
                    "{} did not answer '{method}' within {}ms",
                    self.name,
                    timeout.as_millis()
                )));
            }
        };

        if let Some(error) = response.error {
            return Err(WireError::rpc(error.code, error.message));
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    pub async fn initialize(&self, timeout: Duration) -> Result<InitializeResult, WireError> {
        let value = self.request(method::INITIALIZE, json!({}), timeout).await?;
        decode(method::INITIALIZE, value)
    }

    pub async fn list_tools(&self, timeout: Duration) -> Result<Vec<ToolDescriptor>, WireError> {
        let value = self.request(method::LIST_TOOLS, json!({}), timeout).await?;
        let result: ListToolsResult = decode(method::LIST_TOOLS, value)?;
        Ok(result.tools)
    }

    pub async fn call_tool(
        &self,
        request: &InvocationRequest,
        timeout: Duration,
    ) -> Result<InvocationResponse, WireError> {
        let params = json!({
            "name": request.operation_name,
            "arguments": request.arguments,
        });
        let value = self.request(method::CALL_TOOL, params, timeout).await?;
        decode(method::CALL_TOOL, value)
    }

    async fn send(&self, request: &RpcRequest) -> Result<(), WireError> {
        let mut bytes = serde_json::to_vec(request)
            .map_err(|err| WireError::protocol(format!("cannot encode request: {err}")))?;
        bytes.push(b'\n');

        let mut writer = self.writer.lock().await;
        let written = match writer.write_all(&bytes).await {
            Ok(()) => writer.flush().await,
            Err(err) => Err(err),
        };

        written.map_err(|err| {
            self.closed.store(true, Ordering::Release);
            WireError::closed(format!("cannot write to {}: {err}", self.name))
        })
    }

    fn forget(&self, id: u64) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&id);
        }
    }

    fn lock_pending(&self) -> Result<std::sync::MutexGuard<'_, PendingMap>, WireError> {
        self.pending
            .lock()
            .map_err(|_| WireError::protocol("pending request map lock poisoned"))
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .field("child", &self.child.as_ref().and_then(Child::id))
            .finish()
    }
}

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, WireError> {
    serde_json::from_value(value)
        .map_err(|err| WireError::protocol(format!("malformed '{method}' result: {err}")))
}

async fn read_responses<R>(
    name: String,
    reader: R,
    pending: Arc<StdMutex<PendingMap>>,
    closed: Arc<AtomicBool>,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                tracing::warn!(server = name, event = "read_failed", error = %error);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response: RpcResponse = match serde_json::from_str(&line) {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(server = name, event = "malformed_response", error = %error);
                continue;
            }
        };

        let Some(id) = response.id.as_u64() else {
            tracing::warn!(server = name, event = "response_without_id");
            continue;
        };

        let sender = match pending.lock() {
            Ok(mut pending) => pending.remove(&id),
            Err(_) => break,
        };

        match sender {
            Some(sender) => {
                let _ = sender.send(response);
            }
            None => tracing::debug!(server = name, event = "late_response_discarded", id),
        }
    }

    closed.store(true, Ordering::Release);
    // Dropping the senders wakes every waiter with a closed-connection error.
    if let Ok(mut pending) = pending.lock() {
        pending.clear();
    }
    tracing::debug!(server = name, event = "connection_lost");
}

#[cfg(test)]
mod tests {
    use cdtooling::InMemoryRecordStore;

    use super::*;

    fn server() -> Arc<ToolServer> {
        let store = InMemoryRecordStore::from_json_value(json!({
            "grievance": {"GRV-2024-001": {"status": "resolved"}}
        }))
        .expect("records");
        Arc::new(ToolServer::with_builtin_operations("gov", Arc::new(store)).expect("server"))
    }

    #[tokio::test]
    async fn in_process_connection_round_trips_requests() {
        let connection = Connection::in_process("gov", server());
        let timeout = Duration::from_secs(5);

        let info = connection.initialize(timeout).await.expect("initialize");
        assert_eq!(info.tool_count, 4);

        let tools = connection.list_tools(timeout).await.expect("list");
        assert_eq!(tools.len(), 4);

        let response = connection
            .call_tool(
                &InvocationRequest::new("grievance-status").with_argument("grievance_id", "GRV-2024-001"),
                timeout,
            )
            .await
            .expect("call");
        assert_eq!(response.status(), "ok");
    }

    #[tokio::test]
    async fn rpc_errors_surface_with_their_code() {
        let connection = Connection::in_process("gov", server());
        let error = connection
            .request("resources/list", json!({}), Duration::from_secs(5))
            .await
            .expect_err("unknown method");
        assert_eq!(error.kind, crate::WireErrorKind::Rpc);
        assert_eq!(error.code, Some(crate::METHOD_NOT_FOUND));
    }

    #[tokio::test]
    async fn silent_peer_times_out_and_late_reply_is_ignored() {
        let (client_side, peer_side) = tokio::io::duplex(1024);
        let (reader, writer) = tokio::io::split(client_side);
        let connection = Connection::new("silent", reader, writer);

        let error = connection
            .request(method::LIST_TOOLS, json!({}), Duration::from_millis(50))
            .await
            .expect_err("should time out");
        assert_eq!(error.kind, crate::WireErrorKind::Timeout);
        assert!(error.is_transport_failure());

        let (peer_reader, mut peer_writer) = tokio::io::split(peer_side);
        let mut peer_lines = BufReader::new(peer_reader).lines();
        let sent = peer_lines
            .next_line()
            .await
            .expect("read")
            .expect("request line");
        let sent: RpcRequest = serde_json::from_str(&sent).expect("request json");

        let late = RpcResponse::success(json!(sent.id), json!({"tools": []}));
        let mut line = serde_json::to_vec(&late).expect("encode");
        line.push(b'\n');
        peer_writer.write_all(&line).await.expect("write late reply");
        peer_writer.flush().await.expect("flush");

        assert!(connection.lock_pending().expect("pending").is_empty());
        assert!(!connection.is_closed());
    }

    #[tokio::test]
    async fn dropped_peer_closes_the_connection() {
        let (client_side, peer_side) = tokio::io::duplex(1024);
        let (reader, writer) = tokio::io::split(client_side);
        let connection = Connection::new("gone", reader, writer);
        drop(peer_side);

        let error = connection
            .request(method::LIST_TOOLS, json!({}), Duration::from_secs(5))
            .await
            .expect_err("peer is gone");
        assert!(error.is_transport_failure());
    }
}
