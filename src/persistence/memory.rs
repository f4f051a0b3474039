//! In-memory persistence gateway for tests and headless wiring

use super::gateway::{Entity, EntityKind, ExecutionResult, PersistenceGateway, QueryFilter};
use crate::error::{FlowError, Result};
use async_trait::async_trait;
use log::debug;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// One recorded gateway call, kept for call-count assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOp {
    Create(Uuid),
    Get(Uuid),
    Query(EntityKind),
    Update(Uuid),
    Delete(Uuid),
    Evaluate(Uuid),
}

/// HashMap-backed gateway. Not durable; mirrors the server contract closely
/// enough for the editor: relationship triples are unique and deleting a
/// node cascades to the relationships touching it.
pub struct InMemoryGateway {
    entities: Mutex<HashMap<Uuid, Entity>>,
    ops: Mutex<Vec<GatewayOp>>,
    evaluation_payload: Mutex<JsonValue>,
    fail_next: Mutex<Option<String>>,
}

impl InMemoryGateway {
    /// Creates an empty gateway.
    pub fn new() -> Self {
        Self {
            entities: Mutex::new(HashMap::new()),
            ops: Mutex::new(Vec::new()),
            evaluation_payload: Mutex::new(JsonValue::Null),
            fail_next: Mutex::new(None),
        }
    }

    /// Maps `Mutex::lock()` into the gateway error domain.
    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> Result<MutexGuard<'a, T>> {
        m.lock()
            .map_err(|e| FlowError::Gateway(format!("mutex poisoned: {:?}", e)))
    }

    /// Seeds an entity directly, bypassing the op log.
    pub fn seed(&self, entity: Entity) {
        self.entities
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(entity.id(), entity);
    }

    /// Snapshot of every call made so far.
    pub fn ops(&self) -> Vec<GatewayOp> {
        self.ops.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of delete calls issued for `id`.
    pub fn delete_count(&self, id: Uuid) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, GatewayOp::Delete(deleted) if *deleted == id))
            .count()
    }

    /// Whether an entity with `id` is currently stored.
    pub fn contains(&self, id: Uuid) -> bool {
        self.entities
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&id)
    }

    /// Sets the payload returned by subsequent `evaluate` calls.
    pub fn set_evaluation_payload(&self, payload: JsonValue) {
        *self
            .evaluation_payload
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = payload;
    }

    /// Makes the next gateway call fail with the given message.
    pub fn fail_next_call(&self, message: &str) {
        *self.fail_next.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.to_string());
    }

    fn take_failure(&self) -> Result<()> {
        let injected = self
            .fail_next
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match injected {
            Some(message) => Err(FlowError::Gateway(message)),
            None => Ok(()),
        }
    }

    fn record_op(&self, op: GatewayOp) {
        self.ops.lock().unwrap_or_else(|e| e.into_inner()).push(op);
    }

    fn matches(entity: &Entity, kind: EntityKind, filter: &QueryFilter) -> bool {
        match (entity, kind) {
            (Entity::Node(record), EntityKind::Node) => {
                filter.container.is_none_or(|id| record.container == id)
            }
            (Entity::Relationship(record), EntityKind::Relationship(narrowed)) => {
                narrowed.is_none_or(|k| record.kind == k)
                    && filter.source.is_none_or(|id| record.source == id)
                    && filter.target.is_none_or(|id| record.target == id)
            }
            (Entity::Layout(record), EntityKind::Layout) => {
                filter.container.is_none_or(|id| record.container == id)
                    && filter
                        .owner
                        .as_ref()
                        .is_none_or(|owner| record.owner.as_deref() == Some(owner))
                    && filter.public.is_none_or(|public| record.public == public)
            }
            _ => false,
        }
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn create(&self, entity: Entity) -> Result<Entity> {
        self.record_op(GatewayOp::Create(entity.id()));
        self.take_failure()?;
        let mut entities = self.lock(&self.entities)?;
        if let Entity::Relationship(record) = &entity {
            // Duplicate (source, target, kind) triples collapse onto the
            // existing record instead of erroring.
            let existing = entities.values().find(|stored| {
                matches!(stored, Entity::Relationship(other)
                    if other.kind == record.kind
                        && other.source == record.source
                        && other.target == record.target)
            });
            if let Some(stored) = existing {
                debug!(
                    "relationship {:?} {} -> {} already exists",
                    record.kind, record.source, record.target
                );
                return Ok(stored.clone());
            }
        }
        entities.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Entity>> {
        self.record_op(GatewayOp::Get(id));
        self.take_failure()?;
        Ok(self.lock(&self.entities)?.get(&id).cloned())
    }

    async fn query(&self, kind: EntityKind, filter: QueryFilter) -> Result<Vec<Entity>> {
        self.record_op(GatewayOp::Query(kind));
        self.take_failure()?;
        Ok(self
            .lock(&self.entities)?
            .values()
            .filter(|entity| Self::matches(entity, kind, &filter))
            .cloned()
            .collect())
    }

    async fn update(&self, entity: Entity) -> Result<Entity> {
        self.record_op(GatewayOp::Update(entity.id()));
        self.take_failure()?;
        self.lock(&self.entities)?.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.record_op(GatewayOp::Delete(id));
        self.take_failure()?;
        let mut entities = self.lock(&self.entities)?;
        let removed = entities.remove(&id);
        if let Some(Entity::Node(_)) = removed {
            // Server-side cascade: relationships touching a deleted node
            // disappear with it.
            let before = entities.len();
            entities.retain(|_, entity| {
                !matches!(entity, Entity::Relationship(record)
                    if record.source == id || record.target == id)
            });
            let cascaded = before - entities.len();
            if cascaded > 0 {
                debug!("cascaded {} relationship(s) of node {}", cascaded, id);
            }
        }
        Ok(())
    }

    async fn evaluate(&self, container: Uuid) -> Result<ExecutionResult> {
        self.record_op(GatewayOp::Evaluate(container));
        self.take_failure()?;
        let payload = self
            .evaluation_payload
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        Ok(ExecutionResult {
            container,
            payload,
            error: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, NodeRecord, RelationshipKind, RelationshipRecord};

    fn node(container: Uuid) -> NodeRecord {
        NodeRecord::new(NodeKind::Action, container)
    }

    #[tokio::test]
    async fn test_duplicate_relationship_is_collapsed() {
        let gateway = InMemoryGateway::new();
        let container = Uuid::new_v4();
        let a = node(container);
        let b = node(container);
        gateway.seed(Entity::Node(a.clone()));
        gateway.seed(Entity::Node(b.clone()));

        let first = gateway
            .create(Entity::Relationship(RelationshipRecord::new(
                RelationshipKind::Next,
                a.id,
                b.id,
            )))
            .await
            .unwrap();
        let second = gateway
            .create(Entity::Relationship(RelationshipRecord::new(
                RelationshipKind::Next,
                a.id,
                b.id,
            )))
            .await
            .unwrap();
        assert_eq!(first.id(), second.id());

        let stored = gateway
            .query(
                EntityKind::Relationship(Some(RelationshipKind::Next)),
                QueryFilter::between(a.id, b.id),
            )
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_node_delete_cascades_to_relationships() {
        let gateway = InMemoryGateway::new();
        let container = Uuid::new_v4();
        let a = node(container);
        let b = node(container);
        gateway.seed(Entity::Node(a.clone()));
        gateway.seed(Entity::Node(b.clone()));
        let rel = RelationshipRecord::new(RelationshipKind::Next, a.id, b.id);
        gateway.seed(Entity::Relationship(rel.clone()));

        gateway.delete(b.id).await.unwrap();
        assert!(!gateway.contains(b.id));
        assert!(!gateway.contains(rel.id));
        assert!(gateway.contains(a.id));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let gateway = InMemoryGateway::new();
        let id = Uuid::new_v4();
        gateway.delete(id).await.unwrap();
        gateway.delete(id).await.unwrap();
        assert_eq!(gateway.delete_count(id), 2);
    }

    #[tokio::test]
    async fn test_query_filters_by_container() {
        let gateway = InMemoryGateway::new();
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();
        gateway.seed(Entity::Node(node(mine)));
        gateway.seed(Entity::Node(node(mine)));
        gateway.seed(Entity::Node(node(other)));

        let found = gateway
            .query(EntityKind::Node, QueryFilter::container(mine))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let gateway = InMemoryGateway::new();
        gateway.fail_next_call("boom");
        let container = Uuid::new_v4();
        let result = gateway.create(Entity::Node(node(container))).await;
        assert!(matches!(result, Err(FlowError::Gateway(_))));
        assert!(gateway.create(Entity::Node(node(container))).await.is_ok());
    }
}
