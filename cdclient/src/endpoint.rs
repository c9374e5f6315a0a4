//! Where a tool server lives and how to reach it.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use cdtooling::ToolServer;
use cdwire::{Connection, WireError};

#[derive(Clone)]
pub enum EndpointTransport {
    /// A child process speaking line-delimited JSON-RPC on stdin/stdout.
    Stdio { command: String, args: Vec<String> },
    /// A server hosted in this process behind an in-memory pipe.
    InProcess(Arc<ToolServer>),
}

#[derive(Clone)]
pub struct ServerEndpoint {
    pub name: String,
    pub transport: EndpointTransport,
}

impl ServerEndpoint {
    pub fn stdio(
        name: impl Into<String>,
        command: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            transport: EndpointTransport::Stdio {
                command: command.into(),
                args: args.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn in_process(name: impl Into<String>, server: Arc<ToolServer>) -> Self {
        Self {
            name: name.into(),
            transport: EndpointTransport::InProcess(server),
        }
    }

    pub fn connect(&self) -> Result<Connection, WireError> {
        match &self.transport {
            EndpointTransport::Stdio { command, args } => {
                Connection::spawn_stdio(self.name.clone(), command, args)
            }
            EndpointTransport::InProcess(server) => {
                Ok(Connection::in_process(self.name.clone(), Arc::clone(server)))
            }
        }
    }
}

impl Debug for ServerEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let transport = match &self.transport {
            EndpointTransport::Stdio { command, .. } => format!("stdio:{command}"),
            EndpointTransport::InProcess(server) => format!("in_process:{}", server.name()),
        };
        f.debug_struct("ServerEndpoint")
            .field("name", &self.name)
            .field("transport", &transport)
            .finish()
    }
}
