//! Rendering surface boundary - widgets, socket connectors, and edges

use super::viewport::ViewTransform;
use crate::graph::{NodeKind, SocketId};
use glam::Vec2;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Handle to a node widget owned by the rendering surface.
pub type WidgetId = u64;
/// Handle to a visual edge between two sockets.
pub type EdgeId = u64;

/// A socket on a specific widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetSocket {
    pub widget: WidgetId,
    pub socket: SocketId,
}

/// Everything the surface needs to build a node widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSpec {
    pub node: Uuid,
    pub kind: NodeKind,
    pub title: String,
    pub position: Vec2,
    pub inputs: Vec<SocketId>,
    pub outputs: Vec<SocketId>,
    pub start_node: bool,
}

/// Contract the editor core expects from the rendering surface.
///
/// The surface owns drawing, hit-testing, and the pan/zoom camera. The
/// core drives it through this trait and treats it as purely visual:
/// nothing here implies persisted state.
pub trait RenderSurface: Send {
    /// Builds a widget for a node and returns its handle.
    fn add_node(&mut self, spec: WidgetSpec) -> WidgetId;

    /// Removes a node widget.
    fn remove_node(&mut self, widget: WidgetId);

    /// Moves a node widget to a new world position.
    fn move_node(&mut self, widget: WidgetId, position: Vec2);

    /// Draws an edge between an output and an input socket.
    fn connect(&mut self, output: WidgetSocket, input: WidgetSocket, label: &str) -> EdgeId;

    /// Removes a visual edge.
    fn disconnect(&mut self, edge: EdgeId);

    /// Drops the half-finished connection gesture, if any.
    fn cancel_connection_gesture(&mut self);

    /// Current pan/zoom transform.
    fn transform(&self) -> ViewTransform;

    /// Current pointer location in world coordinates.
    fn pointer(&self) -> Vec2;

    /// Replaces the highlighted node set.
    fn set_selection(&mut self, nodes: &[Uuid]);

    /// Moves the start-node badge to one widget, clearing any previous one.
    fn set_start_badge(&mut self, widget: Option<WidgetId>);

    /// Zooms the view to fit the given widgets.
    fn fit_view(&mut self, widgets: &[WidgetId]);

    /// Whether the surface currently rejects mutating gestures.
    fn read_only(&self) -> bool;
}

#[derive(Debug, Default)]
struct StubState {
    next_id: u64,
    widgets: Vec<(WidgetId, WidgetSpec)>,
    edges: Vec<(EdgeId, WidgetSocket, WidgetSocket, String)>,
    selection: Vec<Uuid>,
    start_badge: Option<WidgetId>,
    cancelled_gestures: usize,
    transform: Option<ViewTransform>,
    pointer: Vec2,
    read_only: bool,
}

/// Recording surface for tests and headless wiring.
///
/// Clones share state, so a test can keep a handle while the session owns
/// the boxed trait object.
#[derive(Debug, Clone, Default)]
pub struct StubSurface {
    state: Arc<Mutex<StubState>>,
}

impl StubSurface {
    /// Creates an empty surface with the identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sets the transform reported to the core.
    pub fn set_transform(&self, transform: ViewTransform) {
        self.state().transform = Some(transform);
    }

    /// Sets the pointer location reported to the core.
    pub fn set_pointer(&self, pointer: Vec2) {
        self.state().pointer = pointer;
    }

    /// Toggles read-only mode.
    pub fn set_read_only(&self, read_only: bool) {
        self.state().read_only = read_only;
    }

    /// Number of live widgets.
    pub fn widget_count(&self) -> usize {
        self.state().widgets.len()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.state().edges.len()
    }

    /// Labels of the live edges, in creation order.
    pub fn edge_labels(&self) -> Vec<String> {
        self.state()
            .edges
            .iter()
            .map(|(_, _, _, label)| label.clone())
            .collect()
    }

    /// Current highlighted node set.
    pub fn selection(&self) -> Vec<Uuid> {
        self.state().selection.clone()
    }

    /// Widget carrying the start-node badge.
    pub fn start_badge(&self) -> Option<WidgetId> {
        self.state().start_badge
    }

    /// Number of cancelled connection gestures.
    pub fn cancelled_gestures(&self) -> usize {
        self.state().cancelled_gestures
    }
}

impl RenderSurface for StubSurface {
    fn add_node(&mut self, spec: WidgetSpec) -> WidgetId {
        let mut state = self.state();
        state.next_id += 1;
        let widget = state.next_id;
        if spec.start_node {
            state.start_badge = Some(widget);
        }
        state.widgets.push((widget, spec));
        widget
    }

    fn remove_node(&mut self, widget: WidgetId) {
        let mut state = self.state();
        state.widgets.retain(|(id, _)| *id != widget);
        if state.start_badge == Some(widget) {
            state.start_badge = None;
        }
    }

    fn move_node(&mut self, widget: WidgetId, position: Vec2) {
        let mut state = self.state();
        if let Some((_, spec)) = state.widgets.iter_mut().find(|(id, _)| *id == widget) {
            spec.position = position;
        }
    }

    fn connect(&mut self, output: WidgetSocket, input: WidgetSocket, label: &str) -> EdgeId {
        let mut state = self.state();
        state.next_id += 1;
        let edge = state.next_id;
        state.edges.push((edge, output, input, label.to_string()));
        edge
    }

    fn disconnect(&mut self, edge: EdgeId) {
        self.state().edges.retain(|(id, _, _, _)| *id != edge);
    }

    fn cancel_connection_gesture(&mut self) {
        self.state().cancelled_gestures += 1;
    }

    fn transform(&self) -> ViewTransform {
        self.state().transform.unwrap_or_default()
    }

    fn pointer(&self) -> Vec2 {
        self.state().pointer
    }

    fn set_selection(&mut self, nodes: &[Uuid]) {
        self.state().selection = nodes.to_vec();
    }

    fn set_start_badge(&mut self, widget: Option<WidgetId>) {
        self.state().start_badge = widget;
    }

    fn fit_view(&mut self, _widgets: &[WidgetId]) {}

    fn read_only(&self) -> bool {
        self.state().read_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: NodeKind) -> WidgetSpec {
        WidgetSpec {
            node: Uuid::new_v4(),
            kind,
            title: kind.name().to_string(),
            position: Vec2::ZERO,
            inputs: kind.inputs().to_vec(),
            outputs: kind.outputs().to_vec(),
            start_node: false,
        }
    }

    #[test]
    fn test_widget_bookkeeping() {
        let mut surface = StubSurface::new();
        let a = surface.add_node(spec(NodeKind::Action));
        let b = surface.add_node(spec(NodeKind::Return));
        assert_eq!(surface.widget_count(), 2);

        let edge = surface.connect(
            WidgetSocket {
                widget: a,
                socket: SocketId::Next,
            },
            WidgetSocket {
                widget: b,
                socket: SocketId::Prev,
            },
            "next",
        );
        assert_eq!(surface.edge_labels(), vec!["next".to_string()]);

        surface.disconnect(edge);
        surface.remove_node(a);
        assert_eq!(surface.widget_count(), 1);
        assert_eq!(surface.edge_count(), 0);
    }
}
