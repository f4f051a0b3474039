//! Node wrapper tying a persisted record to its on-screen widget

use super::selection::{node_screen_box, Rect};
use super::surface::{RenderSurface, WidgetId, WidgetSpec};
use super::viewport::ViewTransform;
use crate::error::{FlowError, Result};
use crate::graph::{NodeKind, NodeRecord};
use crate::persistence::{Entity, PersistenceGateway};
use glam::Vec2;
use std::sync::Mutex;
use uuid::Uuid;

/// Widget footprint used until the surface measures actual content.
pub const DEFAULT_NODE_SIZE: Vec2 = Vec2::new(180.0, 100.0);

/// Local projection of one persisted node plus its widget and position.
///
/// The wrapper exclusively owns the widget handle; the record stays the
/// source of truth for node identity and type.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeWrapper {
    record: NodeRecord,
    widget: WidgetId,
    position: Vec2,
    size: Vec2,
}

impl NodeWrapper {
    /// Requests a new persisted record, then instantiates the widget at
    /// `position`. No wrapper is produced when the gateway call fails.
    ///
    /// `make_start_node` marks the record as its container's entry point;
    /// it only takes effect for viable start node types.
    pub async fn create(
        gateway: &dyn PersistenceGateway,
        surface: &Mutex<Box<dyn RenderSurface>>,
        kind: NodeKind,
        container: Uuid,
        position: Vec2,
        make_start_node: bool,
    ) -> Result<NodeWrapper> {
        let mut record = NodeRecord::new(kind, container);
        if make_start_node && kind.is_viable_start_node() {
            record.start_node_of = Some(container);
        }
        let stored = gateway.create(Entity::Node(record)).await?;
        let record = stored
            .into_node()
            .ok_or_else(|| FlowError::Gateway("gateway returned a non-node entity".into()))?;
        let mut surface = surface.lock().unwrap_or_else(|e| e.into_inner());
        Ok(Self::render_from_record(surface.as_mut(), record, position))
    }

    /// Builds a wrapper and widget for an already-persisted record.
    pub fn render_from_record(
        surface: &mut dyn RenderSurface,
        record: NodeRecord,
        position: Vec2,
    ) -> NodeWrapper {
        let widget = surface.add_node(WidgetSpec {
            node: record.id,
            kind: record.kind,
            title: record.kind.name().to_string(),
            position,
            inputs: record.kind.inputs().to_vec(),
            outputs: record.kind.outputs().to_vec(),
            start_node: record.is_start_node(),
        });
        NodeWrapper {
            record,
            widget,
            position,
            size: DEFAULT_NODE_SIZE,
        }
    }

    /// Requests deletion of the backing record, then removes the widget.
    /// An already-deleted record is tolerated (delete is idempotent).
    pub async fn remove(
        self,
        gateway: &dyn PersistenceGateway,
        surface: &Mutex<Box<dyn RenderSurface>>,
    ) -> Result<()> {
        gateway.delete(self.record.id).await?;
        let mut surface = surface.lock().unwrap_or_else(|e| e.into_inner());
        surface.remove_node(self.widget);
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.record.id
    }

    pub fn kind(&self) -> NodeKind {
        self.record.kind
    }

    pub fn record(&self) -> &NodeRecord {
        &self.record
    }

    pub fn widget(&self) -> WidgetId {
        self.widget
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Pure local move. Positions are persisted only through layout
    /// snapshots, never as part of node creation.
    pub fn set_position(&mut self, surface: &mut dyn RenderSurface, position: Vec2) {
        self.position = position;
        surface.move_node(self.widget, position);
    }

    /// Screen-space bounding box under the surface transform.
    pub fn screen_box(&self, transform: ViewTransform) -> Rect {
        node_screen_box(self.position, self.size, transform)
    }

    pub(crate) fn set_start_node_of(&mut self, container: Option<Uuid>) {
        self.record.start_node_of = container;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::surface::StubSurface;
    use crate::persistence::InMemoryGateway;

    fn boxed(surface: &StubSurface) -> Mutex<Box<dyn RenderSurface>> {
        Mutex::new(Box::new(surface.clone()))
    }

    #[tokio::test]
    async fn test_create_persists_before_widget() {
        let gateway = InMemoryGateway::new();
        let surface = StubSurface::new();
        let container = Uuid::new_v4();

        let wrapper = NodeWrapper::create(
            &gateway,
            &boxed(&surface),
            NodeKind::Action,
            container,
            Vec2::new(10.0, 20.0),
            true,
        )
        .await
        .unwrap();

        assert!(gateway.contains(wrapper.id()));
        assert!(wrapper.record().is_start_node());
        assert_eq!(surface.widget_count(), 1);
        assert_eq!(wrapper.position(), Vec2::new(10.0, 20.0));
    }

    #[tokio::test]
    async fn test_failed_create_leaves_no_widget() {
        let gateway = InMemoryGateway::new();
        let surface = StubSurface::new();
        gateway.fail_next_call("offline");

        let result = NodeWrapper::create(
            &gateway,
            &boxed(&surface),
            NodeKind::Action,
            Uuid::new_v4(),
            Vec2::ZERO,
            false,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(surface.widget_count(), 0);
    }

    #[tokio::test]
    async fn test_start_flag_needs_viable_kind() {
        let gateway = InMemoryGateway::new();
        let surface = StubSurface::new();

        let wrapper = NodeWrapper::create(
            &gateway,
            &boxed(&surface),
            NodeKind::Constant,
            Uuid::new_v4(),
            Vec2::ZERO,
            true,
        )
        .await
        .unwrap();

        assert!(!wrapper.record().is_start_node());
    }

    #[tokio::test]
    async fn test_remove_tolerates_missing_record() {
        let gateway = InMemoryGateway::new();
        let surface = StubSurface::new();
        let container = Uuid::new_v4();
        let surface_box = boxed(&surface);

        let wrapper = NodeWrapper::create(
            &gateway,
            &surface_box,
            NodeKind::Return,
            container,
            Vec2::ZERO,
            false,
        )
        .await
        .unwrap();

        // Record vanishes server-side before the local removal runs.
        gateway.delete(wrapper.id()).await.unwrap();
        wrapper.remove(&gateway, &surface_box).await.unwrap();
        assert_eq!(surface.widget_count(), 0);
    }
}
