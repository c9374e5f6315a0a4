//! Serving a [`ToolServer`] over one line-delimited byte stream.
//!
//! Each connection is served independently; the server is shared read-only.

use std::sync::Arc;

use cdtooling::{InvocationRequest, InvocationResponse, ToolServer, parse_arguments};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{
    CallToolParams, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InitializeResult, JSONRPC_VERSION,
    ListToolsResult, METHOD_NOT_FOUND, PARSE_ERROR, RpcRequest, RpcResponse, ServerInfo,
    ToolDescriptor, WireError, method,
};

/// Reads requests until EOF, answering each on `writer`.
///
/// A line that is not UTF-8 is answered with a parse error like any other
/// malformed request; only I/O failures end the connection.
pub async fn serve_connection<R, W>(
    server: Arc<ToolServer>,
    reader: R,
    mut writer: W,
) -> Result<(), WireError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    tracing::debug!(server = server.name(), event = "connection_open");

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buffer) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                handle_line(&server, line)
            }
            Err(err) => {
                tracing::error!(server = server.name(), event = "parse_error", error = %err);
                Some(RpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: request is not valid UTF-8 ({err})"),
                ))
            }
        };

        if let Some(response) = response {
            write_response(&mut writer, &response).await?;
        }
    }

    tracing::debug!(server = server.name(), event = "connection_closed");
    Ok(())
}

async fn write_response<W>(writer: &mut W, response: &RpcResponse) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = serde_json::to_vec(response)
        .map_err(|err| WireError::protocol(format!("cannot encode response: {err}")))?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Answers one request line; notifications yield `None`.
pub fn handle_line(server: &ToolServer, line: &str) -> Option<RpcResponse> {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(server = server.name(), event = "parse_error", error = %err);
            return Some(RpcResponse::failure(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {err}"),
            ));
        }
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => {
            return Some(RpcResponse::failure(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {err}"),
            ));
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return Some(RpcResponse::failure(
            id,
            INVALID_REQUEST,
            format!("unsupported jsonrpc version '{}'", request.jsonrpc),
        ));
    }

    // Notifications carry no id and get no reply.
    request.id?;

    let response = match request.method.as_str() {
        method::INITIALIZE => initialize(server, id),
        method::LIST_TOOLS => list_tools(server, id),
        method::CALL_TOOL => call_tool(server, id, request.params),
        other => RpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
    };

    Some(response)
}

fn initialize(server: &ToolServer, id: Value) -> RpcResponse {
    let result = InitializeResult {
        server_info: ServerInfo {
            name: server.name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        tool_count: server.registry().len(),
    };

    encode_result(id, &result)
}

fn list_tools(server: &ToolServer, id: Value) -> RpcResponse {
    let result = ListToolsResult {
        tools: server.operations().iter().map(ToolDescriptor::from).collect(),
    };

    encode_result(id, &result)
}

fn call_tool(server: &ToolServer, id: Value, params: Value) -> RpcResponse {
    let params: CallToolParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(err) => {
            return RpcResponse::failure(id, INVALID_PARAMS, format!("Invalid params: {err}"));
        }
    };

    let response = match parse_arguments(&params.arguments) {
        Ok(arguments) => server.handle(&InvocationRequest {
            operation_name: params.name.clone(),
            arguments,
        }),
        Err(error) => InvocationResponse::BadRequest {
            message: error.message,
        },
    };

    match &response {
        InvocationResponse::BadRequest { message } => tracing::error!(
            server = server.name(),
            event = "bad_request",
            operation = params.name.as_str(),
            message = message.as_str()
        ),
        InvocationResponse::UnknownOperation { name } => tracing::error!(
            server = server.name(),
            event = "unknown_operation",
            operation = name.as_str()
        ),
        _ => tracing::debug!(
            server = server.name(),
            event = "call_tool",
            operation = params.name.as_str(),
            status = response.status()
        ),
    }

    encode_result(id, &response)
}

fn encode_result<T: Serialize>(id: Value, result: &T) -> RpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::failure(id, INTERNAL_ERROR, format!("Internal error: {err}")),
    }
}
