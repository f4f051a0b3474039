//! Flow graph editor session - registries, gestures, and persistence sync

pub mod commands;
pub mod layout;
pub mod menus;
pub mod selection;
pub mod surface;
pub mod viewport;
pub mod wrapper;

pub use commands::{Command, InputState, Key, KeyEvent, Scope};
pub use layout::{LayoutManager, LayoutRecord};
pub use selection::{AreaSelector, Rect};
pub use surface::{EdgeId, RenderSurface, StubSurface, WidgetId, WidgetSocket, WidgetSpec};
pub use viewport::ViewTransform;
pub use wrapper::NodeWrapper;

use crate::error::{FlowError, Result};
use crate::graph::{
    ConnectionTypeRegistry, NodeKind, NodeRecord, RelationshipKind, RelationshipRecord, SocketId,
};
use crate::persistence::{Entity, EntityKind, ExecutionResult, PersistenceGateway, QueryFilter};
use glam::Vec2;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Recovers the guard from a poisoned lock. Session state is only touched
/// between awaits, never across them.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Lifecycle of one open flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Interactive,
    Executing,
    SavingLayout,
    Closed,
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Loading => "loading",
            SessionState::Interactive => "interactive",
            SessionState::Executing => "executing",
            SessionState::SavingLayout => "saving layout",
            SessionState::Closed => "closed",
        }
    }
}

/// A socket on a registered node, as addressed by gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketRef {
    pub node: Uuid,
    pub socket: SocketId,
}

impl SocketRef {
    pub fn new(node: Uuid, socket: SocketId) -> Self {
        Self { node, socket }
    }
}

/// A visual edge mirroring one persisted relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualEdge {
    pub relationship: Uuid,
    pub kind: RelationshipKind,
    pub label: &'static str,
    pub source: Uuid,
    pub target: Uuid,
}

/// Outcome of dispatching a keyboard command.
///
/// Commands that need host-side input (prompts, dialogs) report what is
/// missing instead of blocking.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Done,
    Executed(ExecutionResult),
    NeedsNodeId,
    NeedsLayoutChoice,
    NeedsSaveConfirmation,
}

/// Top-level owner of one open flow.
///
/// Holds the node registry, the visual edge registry, and the selection,
/// and keeps them in sync with the persistence gateway. Methods take
/// `&self`; independent operations may interleave at gateway await points,
/// so every post-await effect re-checks the registry and silently drops
/// stale work.
pub struct GraphSession<G: PersistenceGateway> {
    container: Uuid,
    principal: String,
    gateway: Arc<G>,
    surface: Mutex<Box<dyn RenderSurface>>,
    nodes: Mutex<HashMap<Uuid, NodeWrapper>>,
    edges: Mutex<HashMap<EdgeId, VisualEdge>>,
    selection: Mutex<HashSet<Uuid>>,
    area: Mutex<AreaSelector>,
    state: Mutex<SessionState>,
}

impl<G: PersistenceGateway> GraphSession<G> {
    /// Creates a session for `container` on behalf of `principal`.
    /// The session starts uninitialized; call [`load`](Self::load) next.
    pub fn new(
        container: Uuid,
        principal: impl Into<String>,
        gateway: Arc<G>,
        surface: Box<dyn RenderSurface>,
    ) -> Self {
        Self {
            container,
            principal: principal.into(),
            gateway,
            surface: Mutex::new(surface),
            nodes: Mutex::new(HashMap::new()),
            edges: Mutex::new(HashMap::new()),
            selection: Mutex::new(HashSet::new()),
            area: Mutex::new(AreaSelector::new()),
            state: Mutex::new(SessionState::Uninitialized),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// Whether the session has been torn down.
    pub fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }

    /// Closes the session. In-flight gateway responses arriving afterwards
    /// are discarded by the stale checks.
    pub fn close(&self) {
        *lock(&self.state) = SessionState::Closed;
    }

    pub fn container(&self) -> Uuid {
        self.container
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub(crate) fn gateway(&self) -> &G {
        &self.gateway
    }

    fn transition(&self, from: SessionState, to: SessionState) -> Result<()> {
        let mut state = lock(&self.state);
        if *state == from {
            *state = to;
            Ok(())
        } else {
            Err(FlowError::InvalidState(state.name()))
        }
    }

    /// Reverts a transient sub-state, unless the session was closed while
    /// the operation was in flight.
    fn settle(&self, from: SessionState) {
        let mut state = lock(&self.state);
        if *state == from {
            *state = SessionState::Interactive;
        }
    }

    fn require_interactive(&self) -> Result<()> {
        let state = lock(&self.state);
        if *state == SessionState::Interactive {
            Ok(())
        } else {
            Err(FlowError::InvalidState(state.name()))
        }
    }

    // ------------------------------------------------------------------
    // Loading

    /// Fetches all node and relationship records of the container and
    /// reconstructs wrappers and visual edges, then replays the best
    /// saved layout.
    pub async fn load(&self) -> Result<()> {
        self.transition(SessionState::Uninitialized, SessionState::Loading)?;
        match self.load_inner().await {
            Ok(()) => {
                self.settle(SessionState::Loading);
                Ok(())
            }
            Err(error) => {
                warn!("loading flow {} failed: {}", self.container, error);
                // Allow a retry from scratch.
                self.transition(SessionState::Loading, SessionState::Uninitialized)
                    .ok();
                Err(error)
            }
        }
    }

    async fn load_inner(&self) -> Result<()> {
        let records = self
            .gateway
            .query(EntityKind::Node, QueryFilter::container(self.container))
            .await?;
        for entity in records {
            let Some(record) = entity.into_node() else {
                continue;
            };
            let start_node = record.is_start_node();
            let mut surface = lock(&self.surface);
            let wrapper = NodeWrapper::render_from_record(surface.as_mut(), record, Vec2::ZERO);
            if start_node {
                let widget = wrapper.widget();
                surface.set_start_badge(Some(widget));
            }
            drop(surface);
            lock(&self.nodes).insert(wrapper.id(), wrapper);
        }
        debug!(
            "loaded {} node(s) for flow {}",
            lock(&self.nodes).len(),
            self.container
        );

        let relationships = self
            .gateway
            .query(EntityKind::Relationship(None), QueryFilter::default())
            .await?;
        for entity in relationships {
            if let Some(record) = entity.into_relationship() {
                self.mirror_relationship(&record);
            }
        }

        if let Some(saved) = self.resolve_layout().await? {
            self.apply_layout_positions(&saved);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Node lifecycle

    /// Creates a node of `kind` at the current pointer location.
    ///
    /// The first viable node created into a flow without a start node is
    /// automatically flagged as the entry point.
    pub async fn create_node(&self, kind: NodeKind) -> Result<NodeRecord> {
        self.require_interactive()?;
        let make_start_node = !lock(&self.nodes)
            .values()
            .any(|wrapper| wrapper.record().is_start_node());
        let position = lock(&self.surface).pointer();

        let wrapper = NodeWrapper::create(
            self.gateway.as_ref(),
            &self.surface,
            kind,
            self.container,
            position,
            make_start_node,
        )
        .await?;
        let record = wrapper.record().clone();

        if self.is_closed() {
            debug!("discarding node {} created after session close", record.id);
            lock(&self.surface).remove_node(wrapper.widget());
            return Ok(record);
        }
        if record.is_start_node() {
            lock(&self.surface).set_start_badge(Some(wrapper.widget()));
        }
        lock(&self.nodes).insert(record.id, wrapper);
        Ok(record)
    }

    /// Deletes the backing record and removes the node locally. Touching
    /// relationships vanish server-side through the cascade; only their
    /// visual mirrors are dropped here.
    pub async fn remove_node(&self, id: Uuid) -> Result<()> {
        self.require_interactive()?;
        let wrapper = lock(&self.nodes)
            .get(&id)
            .cloned()
            .ok_or(FlowError::NodeNotFound(id))?;

        wrapper
            .remove(self.gateway.as_ref(), &self.surface)
            .await
            .inspect_err(|error| warn!("failed to delete node {}: {}", id, error))?;

        lock(&self.nodes).remove(&id);
        let touching: Vec<EdgeId> = {
            let mut edges = lock(&self.edges);
            let ids: Vec<EdgeId> = edges
                .iter()
                .filter(|(_, edge)| edge.source == id || edge.target == id)
                .map(|(edge_id, _)| *edge_id)
                .collect();
            for edge_id in &ids {
                edges.remove(edge_id);
            }
            ids
        };
        {
            let mut surface = lock(&self.surface);
            for edge_id in &touching {
                surface.disconnect(*edge_id);
            }
        }
        self.drop_from_selection(id);
        Ok(())
    }

    /// Moves a node locally (drag gesture). Positions reach the server
    /// only through layout snapshots.
    pub fn set_node_position(&self, id: Uuid, position: Vec2) -> Result<()> {
        let mut nodes = lock(&self.nodes);
        let wrapper = nodes.get_mut(&id).ok_or(FlowError::NodeNotFound(id))?;
        let mut surface = lock(&self.surface);
        wrapper.set_position(surface.as_mut(), position);
        Ok(())
    }

    /// Designates `id` as the flow's entry point, moving the flag off
    /// whichever node previously held it. Both records are persisted.
    pub async fn set_start_node(&self, id: Uuid) -> Result<()> {
        self.require_interactive()?;
        let (target, previous) = {
            let nodes = lock(&self.nodes);
            let wrapper = nodes.get(&id).ok_or(FlowError::NodeNotFound(id))?;
            if !wrapper.kind().is_viable_start_node() {
                return Err(FlowError::NotViableStartNode(wrapper.kind()));
            }
            let previous = nodes
                .values()
                .find(|other| other.id() != id && other.record().is_start_node())
                .map(|other| other.record().clone());
            (wrapper.record().clone(), previous)
        };
        if target.is_start_node() {
            return Ok(());
        }

        // Clear the old holder first so the flag is never duplicated.
        if let Some(mut cleared) = previous {
            cleared.start_node_of = None;
            self.gateway.update(Entity::Node(cleared.clone())).await?;
            if let Some(wrapper) = lock(&self.nodes).get_mut(&cleared.id) {
                wrapper.set_start_node_of(None);
            }
        }

        let mut flagged = target;
        flagged.start_node_of = Some(self.container);
        self.gateway.update(Entity::Node(flagged)).await?;

        let widget = {
            let mut nodes = lock(&self.nodes);
            match nodes.get_mut(&id) {
                Some(wrapper) => {
                    wrapper.set_start_node_of(Some(self.container));
                    Some(wrapper.widget())
                }
                None => {
                    debug!("start node {} vanished before the flag applied", id);
                    None
                }
            }
        };
        if let Some(widget) = widget {
            lock(&self.surface).set_start_badge(Some(widget));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Connections

    /// Connects an output socket to an input socket, creating the typed
    /// relationship behind it.
    ///
    /// Returns `Ok(None)` when the relationship already exists or the
    /// response arrived after one of the endpoints went away.
    pub async fn connect(&self, output: SocketRef, input: SocketRef) -> Result<Option<EdgeId>> {
        self.require_interactive()?;
        if output.node == input.node {
            lock(&self.surface).cancel_connection_gesture();
            return Err(FlowError::SelfLoop);
        }

        let descriptor = {
            let nodes = lock(&self.nodes);
            let source = nodes
                .get(&output.node)
                .ok_or(FlowError::NodeNotFound(output.node))?;
            let target = nodes
                .get(&input.node)
                .ok_or(FlowError::NodeNotFound(input.node))?;
            let plausible = source.kind().outputs().contains(&output.socket)
                && target.kind().inputs().contains(&input.socket);
            plausible
                .then(|| ConnectionTypeRegistry::resolve(output.socket, input.socket))
                .flatten()
        };
        let Some(descriptor) = descriptor else {
            lock(&self.surface).cancel_connection_gesture();
            return Err(FlowError::UnresolvedSockets {
                from_socket: output.socket,
                target: input.socket,
            });
        };

        let existing = self
            .gateway
            .query(
                EntityKind::Relationship(Some(descriptor.kind)),
                QueryFilter::between(output.node, input.node),
            )
            .await
            .inspect_err(|error| warn!("connection lookup failed: {}", error))?;
        let duplicate = existing.iter().any(|entity| {
            matches!(entity, Entity::Relationship(record)
                if record.source == output.node && record.target == input.node)
        });
        if duplicate {
            debug!(
                "relationship {:?} {} -> {} already exists",
                descriptor.kind, output.node, input.node
            );
            return Ok(None);
        }

        let created = self
            .gateway
            .create(Entity::Relationship(RelationshipRecord::new(
                descriptor.kind,
                output.node,
                input.node,
            )))
            .await
            .inspect_err(|error| warn!("connection creation failed: {}", error))?;
        let record = created
            .into_relationship()
            .ok_or_else(|| FlowError::Gateway("gateway returned a non-relationship entity".into()))?;
        Ok(self.mirror_relationship(&record))
    }

    /// Mirrors one persisted relationship as a visual edge. Stale or
    /// unresolvable relationships are skipped, never fatal.
    fn mirror_relationship(&self, record: &RelationshipRecord) -> Option<EdgeId> {
        if self.is_closed() {
            debug!("dropping edge {}: session closed", record.id);
            return None;
        }
        let Some(descriptor) = ConnectionTypeRegistry::resolve_by_kind(record.kind) else {
            warn!(
                "no connection type for relationship kind {:?}, skipping edge {}",
                record.kind, record.id
            );
            return None;
        };
        if lock(&self.edges)
            .values()
            .any(|edge| edge.relationship == record.id)
        {
            debug!("edge for relationship {} already mirrored", record.id);
            return None;
        }

        let sockets = {
            let nodes = lock(&self.nodes);
            match (nodes.get(&record.source), nodes.get(&record.target)) {
                (Some(source), Some(target)) => Some((
                    WidgetSocket {
                        widget: source.widget(),
                        socket: descriptor.source,
                    },
                    WidgetSocket {
                        widget: target.widget(),
                        socket: descriptor.target,
                    },
                )),
                _ => None,
            }
        };
        let Some((output, input)) = sockets else {
            debug!(
                "dropping edge {}: endpoint no longer registered",
                record.id
            );
            return None;
        };

        let edge = lock(&self.surface).connect(output, input, descriptor.name);
        lock(&self.edges).insert(
            edge,
            VisualEdge {
                relationship: record.id,
                kind: record.kind,
                label: descriptor.name,
                source: record.source,
                target: record.target,
            },
        );
        Some(edge)
    }

    /// Removes a visual edge and requests deletion of its relationship.
    ///
    /// The visual edge goes away immediately; a failed delete leaves the
    /// persisted record ahead of the view until the next reload.
    pub async fn disconnect(&self, edge: EdgeId) -> Result<()> {
        self.require_interactive()?;
        let Some(info) = lock(&self.edges).remove(&edge) else {
            return Ok(());
        };
        lock(&self.surface).disconnect(edge);
        if let Err(error) = self.gateway.delete(info.relationship).await {
            warn!(
                "failed to delete relationship {}: {}",
                info.relationship, error
            );
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Selection

    /// Selects every registered node.
    pub fn select_all(&self) {
        let ids: HashSet<Uuid> = lock(&self.nodes).keys().copied().collect();
        self.replace_selection(ids);
    }

    /// Selects the node with `id`, or nothing if it is not registered.
    pub fn select_by_id(&self, id: Uuid) {
        let ids: HashSet<Uuid> = lock(&self.nodes)
            .keys()
            .copied()
            .filter(|registered| *registered == id)
            .collect();
        self.replace_selection(ids);
    }

    /// Selects every node whose screen box lies entirely inside the
    /// marquee spanned by `p1` and `p2` (screen coordinates). Partially
    /// covered nodes stay unselected.
    pub fn select_in_rectangle(&self, p1: Vec2, p2: Vec2) {
        let marquee = Rect::from_points(p1, p2);
        let transform = lock(&self.surface).transform();
        let ids: HashSet<Uuid> = lock(&self.nodes)
            .values()
            .filter(|wrapper| marquee.contains_rect(&wrapper.screen_box(transform)))
            .map(|wrapper| wrapper.id())
            .collect();
        self.replace_selection(ids);
    }

    /// Clears the selection.
    pub fn clear_selection(&self) {
        self.replace_selection(HashSet::new());
    }

    /// Currently selected node ids, sorted for stable output.
    pub fn selection(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = lock(&self.selection).iter().copied().collect();
        ids.sort();
        ids
    }

    fn replace_selection(&self, ids: HashSet<Uuid>) {
        let mut sorted: Vec<Uuid> = ids.iter().copied().collect();
        sorted.sort();
        *lock(&self.selection) = ids;
        lock(&self.surface).set_selection(&sorted);
    }

    fn drop_from_selection(&self, id: Uuid) {
        let mut selection = lock(&self.selection);
        if selection.remove(&id) {
            let mut sorted: Vec<Uuid> = selection.iter().copied().collect();
            drop(selection);
            sorted.sort();
            lock(&self.surface).set_selection(&sorted);
        }
    }

    // ------------------------------------------------------------------
    // Marquee gesture

    /// Pointer press. Returns true when the press starts a marquee drag
    /// and ordinary click selection must be suppressed.
    pub fn pointer_pressed(&self, point: Vec2) -> bool {
        let mut area = lock(&self.area);
        if area.is_armed() {
            area.begin_drag(point);
            true
        } else {
            false
        }
    }

    /// Pointer move during a marquee drag.
    pub fn pointer_moved(&self, point: Vec2) {
        lock(&self.area).update_drag(point);
    }

    /// Pointer release; completes a pending marquee drag into a selection.
    pub fn pointer_released(&self) {
        let corners = lock(&self.area).complete_drag();
        if let Some((p1, p2)) = corners {
            self.select_in_rectangle(p1, p2);
        }
    }

    /// Zooms the view to fit every node widget.
    pub fn reset_view(&self) {
        let widgets: Vec<WidgetId> = lock(&self.nodes)
            .values()
            .map(|wrapper| wrapper.widget())
            .collect();
        lock(&self.surface).fit_view(&widgets);
    }

    /// Fetches both endpoint records of a relationship for detail display.
    /// The source resolves before the target.
    pub async fn relationship_endpoints(
        &self,
        record: &RelationshipRecord,
    ) -> Result<(NodeRecord, NodeRecord)> {
        let source = self
            .gateway
            .get(record.source)
            .await?
            .and_then(Entity::into_node)
            .ok_or(FlowError::NodeNotFound(record.source))?;
        let target = self
            .gateway
            .get(record.target)
            .await?
            .and_then(Entity::into_node)
            .ok_or(FlowError::NodeNotFound(record.target))?;
        Ok((source, target))
    }

    // ------------------------------------------------------------------
    // Execution and layouts

    /// Evaluates the flow container on the server. Graph state is not
    /// touched; the session returns to interactive afterwards.
    pub async fn execute_flow(&self) -> Result<ExecutionResult> {
        self.transition(SessionState::Interactive, SessionState::Executing)?;
        let result = self
            .gateway
            .evaluate(self.container)
            .await
            .inspect_err(|error| warn!("flow evaluation failed: {}", error));
        self.settle(SessionState::Executing);
        result
    }

    /// Persists a snapshot of the current node positions.
    pub async fn save_layout(&self, public: bool) -> Result<Option<LayoutRecord>> {
        self.transition(SessionState::Interactive, SessionState::SavingLayout)?;
        let result = LayoutManager::new(self).save_layout(public).await;
        self.settle(SessionState::SavingLayout);
        result
    }

    /// Replays the best saved layout: the principal's own if present,
    /// otherwise the newest shared one, otherwise nothing.
    pub async fn apply_saved_layout(&self) -> Result<()> {
        self.require_interactive()?;
        if let Some(saved) = self.resolve_layout().await? {
            LayoutManager::new(self).apply_saved_layout(&saved);
        }
        Ok(())
    }

    async fn resolve_layout(&self) -> Result<Option<LayoutRecord>> {
        let manager = LayoutManager::new(self);
        if let Some(own) = manager.get_own_saved_layout().await? {
            return Ok(Some(own));
        }
        Ok(manager.get_saved_layouts().await?.into_iter().next())
    }

    pub(crate) fn positions_by_kind(&self) -> BTreeMap<String, Vec2> {
        lock(&self.nodes)
            .values()
            .map(|wrapper| (wrapper.kind().name().to_string(), wrapper.position()))
            .collect()
    }

    pub(crate) fn apply_layout_positions(&self, saved: &LayoutRecord) {
        let mut nodes = lock(&self.nodes);
        let mut surface = lock(&self.surface);
        for wrapper in nodes.values_mut() {
            if let Some(position) = saved.position_of(wrapper.kind().name()) {
                wrapper.set_position(surface.as_mut(), position);
            }
        }
    }

    // ------------------------------------------------------------------
    // Command dispatch

    /// Feeds one keyboard event through the binding table and runs the
    /// bound command, if any.
    pub async fn handle_key(
        &self,
        event: KeyEvent,
        scope: Scope,
    ) -> Result<Option<CommandOutcome>> {
        let read_only = lock(&self.surface).read_only();
        match commands::resolve(event, scope, read_only) {
            Some(command) => self.dispatch(command).await.map(Some),
            None => Ok(None),
        }
    }

    /// Runs one editor command.
    pub async fn dispatch(&self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::BeginAreaSelection => {
                lock(&self.area).arm();
                Ok(CommandOutcome::Done)
            }
            Command::EndAreaSelection => {
                lock(&self.area).disarm();
                Ok(CommandOutcome::Done)
            }
            Command::SelectAll => {
                self.select_all();
                Ok(CommandOutcome::Done)
            }
            Command::ExecuteFlow => Ok(CommandOutcome::Executed(self.execute_flow().await?)),
            Command::ChooseLayout => Ok(CommandOutcome::NeedsLayoutChoice),
            Command::SaveLayout => Ok(CommandOutcome::NeedsSaveConfirmation),
            Command::DismissAndClear => {
                self.clear_selection();
                Ok(CommandOutcome::Done)
            }
            Command::SelectNodeById => Ok(CommandOutcome::NeedsNodeId),
            Command::LogSelection => {
                let nodes = lock(&self.nodes);
                for id in self.selection() {
                    if let Some(wrapper) = nodes.get(&id) {
                        info!("{}[{}]", wrapper.kind().name(), id);
                    }
                }
                Ok(CommandOutcome::Done)
            }
        }
    }

    // ------------------------------------------------------------------
    // Introspection

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        lock(&self.nodes).len()
    }

    /// Registered node ids, sorted.
    pub fn node_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = lock(&self.nodes).keys().copied().collect();
        ids.sort();
        ids
    }

    /// Current position of a registered node.
    pub fn node_position(&self, id: Uuid) -> Option<Vec2> {
        lock(&self.nodes).get(&id).map(|wrapper| wrapper.position())
    }

    /// Number of visual edges.
    pub fn edge_count(&self) -> usize {
        lock(&self.edges).len()
    }

    /// Snapshot of the visual edges.
    pub fn visual_edges(&self) -> Vec<VisualEdge> {
        lock(&self.edges).values().cloned().collect()
    }
}
