//! Type-keyed layout snapshots and their persistence round-trip

use super::GraphSession;
use crate::error::Result;
use crate::persistence::{Entity, EntityKind, PersistenceGateway, QueryFilter};
use chrono::{DateTime, Utc};
use glam::Vec2;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Saved snapshot of node positions keyed by node type name.
///
/// Layouts are type-positional: the same layout can be replayed onto a
/// structurally similar flow with different node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRecord {
    pub id: Uuid,
    pub container: Uuid,
    /// Owning principal for private layouts; `None` for shared ones.
    pub owner: Option<String>,
    pub public: bool,
    positions: BTreeMap<String, Vec2>,
    hidden: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl LayoutRecord {
    /// Creates an empty layout for `container`.
    pub fn new(container: Uuid, owner: Option<String>, public: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            container,
            owner,
            public,
            positions: BTreeMap::new(),
            hidden: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// The stored position map.
    pub fn positions(&self) -> &BTreeMap<String, Vec2> {
        &self.positions
    }

    /// Node type names hidden in this layout.
    pub fn hidden(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    /// Stored position for one node type name.
    pub fn position_of(&self, kind_name: &str) -> Option<Vec2> {
        self.positions.get(kind_name).copied()
    }

    /// Places a node type at a position. A previously hidden type becomes
    /// visible; the position map and the hidden set stay disjoint.
    pub fn place(&mut self, kind_name: &str, position: Vec2) {
        self.hidden.remove(kind_name);
        self.positions.insert(kind_name.to_string(), position);
    }

    /// Hides a node type, dropping any stored position for it.
    pub fn hide(&mut self, kind_name: &str) {
        self.positions.remove(kind_name);
        self.hidden.insert(kind_name.to_string());
    }
}

/// Serializes and replays node position snapshots for one session.
pub struct LayoutManager<'a, G: PersistenceGateway> {
    session: &'a GraphSession<G>,
}

impl<'a, G: PersistenceGateway> LayoutManager<'a, G> {
    /// Binds a manager to an open session.
    pub fn new(session: &'a GraphSession<G>) -> Self {
        Self { session }
    }

    /// Snapshots every registered node's position into a new layout record
    /// and persists it. Returns `None` when the session was torn down while
    /// the save was pending.
    pub async fn save_layout(&self, public: bool) -> Result<Option<LayoutRecord>> {
        if self.session.is_closed() {
            warn!("layout save skipped, session is closed");
            return Ok(None);
        }

        let owner = (!public).then(|| self.session.principal().to_string());
        let mut record = LayoutRecord::new(self.session.container(), owner, public);
        for (kind_name, position) in self.session.positions_by_kind() {
            record.place(&kind_name, position);
        }

        let stored = self
            .session
            .gateway()
            .create(Entity::Layout(record))
            .await?;
        debug!("saved layout {} (public: {})", stored.id(), public);
        Ok(stored.into_layout())
    }

    /// The current principal's private layout for this container, if any.
    /// The most recently saved one wins.
    pub async fn get_own_saved_layout(&self) -> Result<Option<LayoutRecord>> {
        let filter = QueryFilter::container(self.session.container())
            .owned_by(self.session.principal())
            .public(false);
        let mut layouts: Vec<LayoutRecord> = self
            .session
            .gateway()
            .query(EntityKind::Layout, filter)
            .await?
            .into_iter()
            .filter_map(Entity::into_layout)
            .collect();
        layouts.sort_by_key(|layout| layout.created_at);
        Ok(layouts.pop())
    }

    /// All shared layouts for this container, newest first.
    pub async fn get_saved_layouts(&self) -> Result<Vec<LayoutRecord>> {
        let filter = QueryFilter::container(self.session.container()).public(true);
        let mut layouts: Vec<LayoutRecord> = self
            .session
            .gateway()
            .query(EntityKind::Layout, filter)
            .await?
            .into_iter()
            .filter_map(Entity::into_layout)
            .collect();
        layouts.sort_by_key(|layout| std::cmp::Reverse(layout.created_at));
        Ok(layouts)
    }

    /// Replays a layout onto the session's nodes. Node types absent from
    /// the layout keep their current position.
    pub fn apply_saved_layout(&self, layout: &LayoutRecord) {
        if self.session.is_closed() {
            warn!("layout apply skipped, session is closed");
            return;
        }
        self.session.apply_layout_positions(layout);
    }
}
