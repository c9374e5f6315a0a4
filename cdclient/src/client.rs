//! The aggregating client: one frozen operation set, many servers.
//!
//! Discovery runs once at startup. After that every invocation is routed to
//! the server that advertised the operation; a name outside the set is
//! answered locally without touching any transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use cdprovider::{ToolCall, ToolDefinition, ToolOutcome, ToolResult};
use cdtooling::{
    Arguments, InvocationRequest, NoopToolRuntimeHooks, Operation, ToolError,
    ToolExecutionContext, ToolFuture, ToolRuntime, ToolRuntimeHooks,
};
use cdwire::{Connection, ToolDescriptor, WireError};
use futures_util::future::join_all;

use crate::{ClientError, OperationSet, RetryPolicy, ServerEndpoint, execute_with_retry};

#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub invoke_timeout: Duration,
    pub discovery_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            invoke_timeout: Duration::from_secs(5),
            discovery_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

pub struct ToolClient {
    connections: Vec<Connection>,
    operations: OperationSet,
    options: ClientOptions,
    hooks: Arc<dyn ToolRuntimeHooks>,
    next_call_id: AtomicU64,
}

impl ToolClient {
    /// Opens every endpoint, then discovers their operations.
    pub async fn connect(
        endpoints: &[ServerEndpoint],
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        if endpoints.is_empty() {
            return Err(ClientError::no_endpoints());
        }

        let mut connections = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let connection = endpoint.connect().map_err(|error| {
                ClientError::connect(format!("cannot reach '{}': {error}", endpoint.name))
            })?;
            connections.push(connection);
        }

        Self::discover(connections, options).await
    }

    /// Lists operations on already-open connections and freezes the union.
    pub async fn discover(
        connections: Vec<Connection>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        if connections.is_empty() {
            return Err(ClientError::no_endpoints());
        }

        let timeout = options.discovery_timeout;
        let listings = join_all(
            connections
                .iter()
                .map(|connection| list_operations(connection, timeout)),
        )
        .await;

        let mut operations = OperationSet::new();
        for (index, (connection, listing)) in connections.iter().zip(listings).enumerate() {
            let descriptors = listing.map_err(|error| {
                ClientError::discovery(format!(
                    "discovery on '{}' failed: {error}",
                    connection.name()
                ))
            })?;

            tracing::info!(
                phase = "startup",
                event = "operations_discovered",
                server = connection.name(),
                count = descriptors.len()
            );

            for descriptor in descriptors {
                operations.insert(Operation::from(descriptor), index, connection.name())?;
            }
        }

        Ok(Self {
            connections,
            operations,
            options,
            hooks: Arc::new(NoopToolRuntimeHooks),
            next_call_id: AtomicU64::new(1),
        })
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn operations(&self) -> &OperationSet {
        &self.operations
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn server_names(&self) -> Vec<&str> {
        self.connections
            .iter()
            .map(|connection| connection.name())
            .collect()
    }

    /// Invokes `name` outside a conversation, e.g. from diagnostics.
    pub async fn call_operation(&self, name: &str, arguments: Arguments) -> ToolOutcome {
        let id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
        let tool_call = ToolCall {
            id: format!("direct_{id}"),
            name: name.to_string(),
            arguments,
        };
        let context = ToolExecutionContext::new("direct");
        self.invoke(tool_call, context).await.outcome
    }

    async fn route(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
    ) -> (ToolOutcome, u32) {
        let Some(routed) = self.operations.get(&tool_call.name) else {
            return (
                ToolOutcome::UnknownOperation {
                    name: tool_call.name.clone(),
                },
                0,
            );
        };

        let Some(connection) = self.connections.get(routed.server) else {
            return (
                ToolOutcome::Unavailable {
                    message: format!("no connection for server '{}'", routed.server_name),
                },
                0,
            );
        };

        let request = InvocationRequest {
            operation_name: tool_call.name.clone(),
            arguments: tool_call.arguments.clone(),
        };
        let request = &request;
        let timeout = self.options.invoke_timeout;

        let (result, attempts) = execute_with_retry(
            tool_call,
            context,
            &self.options.retry,
            self.hooks.as_ref(),
            move |_| async move {
                connection
                    .call_tool(request, timeout)
                    .await
                    .map_err(|error| ToolError::from(error).with_operation(&tool_call.name))
            },
            tokio::time::sleep,
        )
        .await;

        match result {
            Ok(response) => (response.into(), attempts),
            Err(error) => {
                tracing::warn!(
                    phase = "invoke",
                    event = "server_unavailable",
                    server = connection.name(),
                    operation = tool_call.name.as_str(),
                    attempts,
                    error = %error
                );
                (
                    ToolOutcome::Unavailable {
                        message: format!(
                            "{} did not answer: {}",
                            routed.server_name, error.message
                        ),
                    },
                    attempts,
                )
            }
        }
    }
}

impl ToolRuntime for ToolClient {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.operations.definitions()
    }

    fn invoke<'a>(
        &'a self,
        tool_call: ToolCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, ToolResult> {
        Box::pin(async move {
            let started = Instant::now();
            self.hooks.on_invocation_start(&tool_call, &context);

            let (outcome, attempts) = self.route(&tool_call, &context).await;

            self.hooks
                .on_invocation_outcome(&tool_call, &context, &outcome, attempts, started.elapsed());
            ToolResult::from_call(&tool_call, outcome)
        })
    }
}

impl std::fmt::Debug for ToolClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolClient")
            .field("servers", &self.server_names())
            .field("operations", &self.operations.len())
            .field("options", &self.options)
            .finish()
    }
}

async fn list_operations(
    connection: &Connection,
    timeout: Duration,
) -> Result<Vec<ToolDescriptor>, WireError> {
    connection.initialize(timeout).await?;
    connection.list_tools(timeout).await
}
