//! Graph data model - node types, sockets, and typed connections

pub mod connection;
pub mod node;
pub mod socket;

pub use connection::{
    ConnectionDescriptor, ConnectionTypeRegistry, RelationshipKind, RelationshipRecord,
};
pub use node::{NodeKind, NodeRecord};
pub use socket::{SocketDirection, SocketId};
