//! Persistence gateway contract for remote typed entities

use crate::editor::layout::LayoutRecord;
use crate::error::Result;
use crate::graph::{NodeRecord, RelationshipKind, RelationshipRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A typed entity as stored by the persistence service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Node(NodeRecord),
    Relationship(RelationshipRecord),
    Layout(LayoutRecord),
}

impl Entity {
    /// Server-side id of the wrapped record.
    pub fn id(&self) -> Uuid {
        match self {
            Entity::Node(record) => record.id,
            Entity::Relationship(record) => record.id,
            Entity::Layout(record) => record.id,
        }
    }

    /// Unwraps a node record, if this is one.
    pub fn into_node(self) -> Option<NodeRecord> {
        match self {
            Entity::Node(record) => Some(record),
            _ => None,
        }
    }

    /// Unwraps a relationship record, if this is one.
    pub fn into_relationship(self) -> Option<RelationshipRecord> {
        match self {
            Entity::Relationship(record) => Some(record),
            _ => None,
        }
    }

    /// Unwraps a layout record, if this is one.
    pub fn into_layout(self) -> Option<LayoutRecord> {
        match self {
            Entity::Layout(record) => Some(record),
            _ => None,
        }
    }
}

/// Entity family selector for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    /// Relationships, optionally narrowed to one kind.
    Relationship(Option<RelationshipKind>),
    Layout,
}

/// Narrowing filter for `query`. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    pub container: Option<Uuid>,
    pub source: Option<Uuid>,
    pub target: Option<Uuid>,
    pub owner: Option<String>,
    pub public: Option<bool>,
}

impl QueryFilter {
    /// Matches entities owned by the given flow container.
    pub fn container(id: Uuid) -> Self {
        Self {
            container: Some(id),
            ..Default::default()
        }
    }

    /// Matches relationships between the given endpoints.
    pub fn between(source: Uuid, target: Uuid) -> Self {
        Self {
            source: Some(source),
            target: Some(target),
            ..Default::default()
        }
    }

    /// Narrows to records owned by `owner`.
    pub fn owned_by(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    /// Narrows to records with the given visibility.
    pub fn public(mut self, public: bool) -> Self {
        self.public = Some(public);
        self
    }
}

/// Outcome of evaluating a flow container on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub container: Uuid,
    pub payload: JsonValue,
    pub error: bool,
}

/// Contract for the remote object persistence service.
///
/// All operations are asynchronous; the editor suspends only at this
/// boundary and makes no assumption of success until a call resolves.
/// Timeouts and retries are the implementation's responsibility.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Creates a new entity and returns the stored record.
    async fn create(&self, entity: Entity) -> Result<Entity>;

    /// Fetches an entity by id, or `None` if it does not exist.
    async fn get(&self, id: Uuid) -> Result<Option<Entity>>;

    /// Queries entities of one family, narrowed by `filter`.
    async fn query(&self, kind: EntityKind, filter: QueryFilter) -> Result<Vec<Entity>>;

    /// Writes a full record back. Last write wins.
    async fn update(&self, entity: Entity) -> Result<Entity>;

    /// Deletes an entity by id. Deleting a missing id succeeds. Deleting
    /// a node cascades to the relationships touching it.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Evaluates the flow container and returns the execution outcome.
    async fn evaluate(&self, container: Uuid) -> Result<ExecutionResult>;
}
