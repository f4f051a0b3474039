//! Connection types, descriptors, and persisted relationship records

use super::socket::SocketId;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Closed catalogue of typed relationships between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    Next,
    DataInput,
    DataInputs,
    Condition,
    Conditions,
    DecisionTrue,
    DecisionFalse,
    LoopBody,
    ExceptionNodes,
    KeyValueSources,
    CallParameters,
    StartValue,
    ScriptSource,
    PropertyKey,
}

/// Immutable mapping from a socket pairing to a relationship kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub kind: RelationshipKind,
    /// Label shown on the visual edge.
    pub name: &'static str,
    pub source: SocketId,
    pub target: SocketId,
}

/// The full connection type catalogue, fixed at session start.
static CATALOGUE: [ConnectionDescriptor; 14] = [
    ConnectionDescriptor {
        kind: RelationshipKind::Next,
        name: "next",
        source: SocketId::Next,
        target: SocketId::Prev,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::DataInput,
        name: "dataSource",
        source: SocketId::DataOut,
        target: SocketId::DataIn,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::DataInputs,
        name: "dataSources",
        source: SocketId::DataOut,
        target: SocketId::DataIns,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::Condition,
        name: "condition",
        source: SocketId::CondOut,
        target: SocketId::CondIn,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::Conditions,
        name: "conditions",
        source: SocketId::CondOut,
        target: SocketId::CondIns,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::DecisionTrue,
        name: "true",
        source: SocketId::TrueOut,
        target: SocketId::Prev,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::DecisionFalse,
        name: "false",
        source: SocketId::FalseOut,
        target: SocketId::Prev,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::LoopBody,
        name: "loopBody",
        source: SocketId::LoopBody,
        target: SocketId::Prev,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::ExceptionNodes,
        name: "exceptionHandler",
        source: SocketId::ExceptionOut,
        target: SocketId::Prev,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::KeyValueSources,
        name: "keyValueSources",
        source: SocketId::KeyValueOut,
        target: SocketId::KeyValueIns,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::CallParameters,
        name: "parameters",
        source: SocketId::ParamOut,
        target: SocketId::ParamIns,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::StartValue,
        name: "startValue",
        source: SocketId::DataOut,
        target: SocketId::StartValue,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::ScriptSource,
        name: "scriptSource",
        source: SocketId::DataOut,
        target: SocketId::ScriptSource,
    },
    ConnectionDescriptor {
        kind: RelationshipKind::PropertyKey,
        name: "key",
        source: SocketId::DataOut,
        target: SocketId::Key,
    },
];

static BY_SOCKETS: Lazy<HashMap<(SocketId, SocketId), &'static ConnectionDescriptor>> =
    Lazy::new(|| {
        CATALOGUE
            .iter()
            .map(|descriptor| ((descriptor.source, descriptor.target), descriptor))
            .collect()
    });

static BY_KIND: Lazy<HashMap<RelationshipKind, &'static ConnectionDescriptor>> = Lazy::new(|| {
    CATALOGUE
        .iter()
        .map(|descriptor| (descriptor.kind, descriptor))
        .collect()
});

/// Static catalogue resolving socket pairings to typed relationships.
///
/// Lookups are pure; the catalogue never changes at runtime.
pub struct ConnectionTypeRegistry;

impl ConnectionTypeRegistry {
    /// Resolves a (source, target) socket pairing to its descriptor.
    pub fn resolve(source: SocketId, target: SocketId) -> Option<&'static ConnectionDescriptor> {
        BY_SOCKETS.get(&(source, target)).copied()
    }

    /// Re-derives the socket pairing for a known relationship kind.
    ///
    /// Used when reconstructing edges from persisted relationships after
    /// node widgets already exist.
    pub fn resolve_by_kind(kind: RelationshipKind) -> Option<&'static ConnectionDescriptor> {
        BY_KIND.get(&kind).copied()
    }

    /// The complete descriptor catalogue.
    pub fn all() -> &'static [ConnectionDescriptor] {
        &CATALOGUE
    }
}

/// Persisted record of a directed, typed edge between two node records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub id: Uuid,
    pub kind: RelationshipKind,
    pub source: Uuid,
    pub target: Uuid,
    pub created_at: DateTime<Utc>,
}

impl RelationshipRecord {
    /// Creates a fresh relationship record of `kind` from `source` to `target`.
    pub fn new(kind: RelationshipKind, source: Uuid, target: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            source,
            target,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_pair() {
        let descriptor = ConnectionTypeRegistry::resolve(SocketId::Next, SocketId::Prev)
            .expect("next -> prev must resolve");
        assert_eq!(descriptor.kind, RelationshipKind::Next);
        assert_eq!(descriptor.name, "next");
    }

    #[test]
    fn test_resolve_unknown_pair() {
        assert!(ConnectionTypeRegistry::resolve(SocketId::Next, SocketId::DataIn).is_none());
        assert!(ConnectionTypeRegistry::resolve(SocketId::DataOut, SocketId::Prev).is_none());
    }

    #[test]
    fn test_every_kind_resolves() {
        for descriptor in ConnectionTypeRegistry::all() {
            let found = ConnectionTypeRegistry::resolve_by_kind(descriptor.kind)
                .expect("catalogue kind must resolve");
            assert_eq!(found, descriptor);
        }
    }

    #[test]
    fn test_descriptor_sides() {
        for descriptor in ConnectionTypeRegistry::all() {
            assert!(descriptor.source.is_output(), "{:?}", descriptor.kind);
            assert!(descriptor.target.is_input(), "{:?}", descriptor.kind);
        }
    }

    #[test]
    fn test_socket_pairs_are_unambiguous() {
        let mut seen = std::collections::HashSet::new();
        for descriptor in ConnectionTypeRegistry::all() {
            assert!(
                seen.insert((descriptor.source, descriptor.target)),
                "duplicate pairing {:?} -> {:?}",
                descriptor.source,
                descriptor.target
            );
        }
    }
}
