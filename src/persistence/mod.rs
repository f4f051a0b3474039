//! Persistence boundary - gateway contract and in-memory stub

pub mod gateway;
pub mod memory;

pub use gateway::{Entity, EntityKind, ExecutionResult, PersistenceGateway, QueryFilter};
pub use memory::{GatewayOp, InMemoryGateway};
