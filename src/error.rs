//! Error types shared across the editor core

use crate::graph::node::NodeKind;
use crate::graph::socket::SocketId;
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the editor core and its persistence boundary.
#[derive(Error, Debug)]
pub enum FlowError {
    /// A connection gesture tried to link a node to itself.
    #[error("cannot connect a node to itself")]
    SelfLoop,
    /// No connection type matches the given socket pairing.
    #[error("no connection type for socket pair {from_socket:?} -> {target:?}")]
    UnresolvedSockets { from_socket: SocketId, target: SocketId },
    /// The referenced node is not registered in the session.
    #[error("node {0} is not registered")]
    NodeNotFound(Uuid),
    /// The node type cannot act as the entry point of a flow.
    #[error("{0:?} is not a viable start node type")]
    NotViableStartNode(NodeKind),
    /// The operation is not allowed in the session's current state.
    #[error("operation not allowed while session is {0}")]
    InvalidState(&'static str),
    /// The persistence gateway rejected or failed a request.
    #[error("persistence error: {0}")]
    Gateway(String),
}

/// Result alias used by the editor core.
pub type Result<T> = std::result::Result<T, FlowError>;
