//! flowgraph - graph editor core for flow-based visual programming
//!
//! Keeps an in-memory visual graph consistent with a remote persisted
//! graph: typed nodes and connections, geometric multi-selection under
//! pan/zoom, layout snapshots, and flow execution round-trips. Rendering
//! and wire-level persistence live behind the `RenderSurface` and
//! `PersistenceGateway` boundaries.

pub mod editor;
pub mod error;
pub mod graph;
pub mod persistence;

// Re-export the editor surface most callers need
pub use editor::{
    Command, CommandOutcome, GraphSession, InputState, Key, KeyEvent, LayoutManager, LayoutRecord,
    RenderSurface, Scope, SessionState, SocketRef, StubSurface, ViewTransform, VisualEdge,
    WidgetSocket, WidgetSpec,
};
pub use error::{FlowError, Result};
pub use graph::{
    ConnectionDescriptor, ConnectionTypeRegistry, NodeKind, NodeRecord, RelationshipKind,
    RelationshipRecord, SocketDirection, SocketId,
};
pub use persistence::{
    Entity, EntityKind, ExecutionResult, InMemoryGateway, PersistenceGateway, QueryFilter,
};
