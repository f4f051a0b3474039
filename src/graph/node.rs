//! Node type catalogue and persisted node records

use super::socket::SocketId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed catalogue of node types understood by the editor.
///
/// The catalogue is fixed at session start; behavior (sockets, menu
/// placement, start-node viability) is derived per variant below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Action,
    Call,
    DataSource,
    ParameterInput,
    ParameterDataSource,
    Return,
    NotNull,
    Decision,
    KeyValue,
    ObjectDataSource,
    Store,
    ScriptCondition,
    Not,
    Or,
    And,
    ForEach,
    Aggregate,
    Constant,
    GetProperty,
    CollectionDataSource,
    ExceptionHandler,
    TypeQuery,
}

impl NodeKind {
    /// Every member of the catalogue.
    pub const ALL: &'static [NodeKind] = &[
        NodeKind::Action,
        NodeKind::Call,
        NodeKind::DataSource,
        NodeKind::ParameterInput,
        NodeKind::ParameterDataSource,
        NodeKind::Return,
        NodeKind::NotNull,
        NodeKind::Decision,
        NodeKind::KeyValue,
        NodeKind::ObjectDataSource,
        NodeKind::Store,
        NodeKind::ScriptCondition,
        NodeKind::Not,
        NodeKind::Or,
        NodeKind::And,
        NodeKind::ForEach,
        NodeKind::Aggregate,
        NodeKind::Constant,
        NodeKind::GetProperty,
        NodeKind::CollectionDataSource,
        NodeKind::ExceptionHandler,
        NodeKind::TypeQuery,
    ];

    /// The persisted type tag.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeKind::Action => "Action",
            NodeKind::Call => "Call",
            NodeKind::DataSource => "DataSource",
            NodeKind::ParameterInput => "ParameterInput",
            NodeKind::ParameterDataSource => "ParameterDataSource",
            NodeKind::Return => "Return",
            NodeKind::NotNull => "NotNull",
            NodeKind::Decision => "Decision",
            NodeKind::KeyValue => "KeyValue",
            NodeKind::ObjectDataSource => "ObjectDataSource",
            NodeKind::Store => "Store",
            NodeKind::ScriptCondition => "ScriptCondition",
            NodeKind::Not => "Not",
            NodeKind::Or => "Or",
            NodeKind::And => "And",
            NodeKind::ForEach => "ForEach",
            NodeKind::Aggregate => "Aggregate",
            NodeKind::Constant => "Constant",
            NodeKind::GetProperty => "GetProperty",
            NodeKind::CollectionDataSource => "CollectionDataSource",
            NodeKind::ExceptionHandler => "ExceptionHandler",
            NodeKind::TypeQuery => "TypeQuery",
        }
    }

    /// Looks up a catalogue member by its persisted type tag.
    pub fn parse(tag: &str) -> Option<NodeKind> {
        NodeKind::ALL.iter().copied().find(|kind| kind.name() == tag)
    }

    /// Input sockets of this node type.
    pub fn inputs(&self) -> &'static [SocketId] {
        match self {
            NodeKind::Action => &[SocketId::Prev, SocketId::DataIn],
            NodeKind::Call => &[SocketId::Prev, SocketId::DataIn, SocketId::ParamIns],
            NodeKind::DataSource => &[],
            NodeKind::ParameterInput => &[],
            NodeKind::ParameterDataSource => &[],
            NodeKind::Return => &[SocketId::Prev, SocketId::DataIn],
            NodeKind::NotNull => &[SocketId::DataIn],
            NodeKind::Decision => &[SocketId::Prev, SocketId::CondIn],
            NodeKind::KeyValue => &[SocketId::DataIn],
            NodeKind::ObjectDataSource => &[SocketId::KeyValueIns],
            NodeKind::Store => &[SocketId::Prev, SocketId::DataIn],
            NodeKind::ScriptCondition => &[SocketId::ScriptSource],
            NodeKind::Not => &[SocketId::CondIns],
            NodeKind::Or => &[SocketId::CondIns],
            NodeKind::And => &[SocketId::CondIns],
            NodeKind::ForEach => &[SocketId::Prev, SocketId::DataIn],
            NodeKind::Aggregate => &[SocketId::Prev, SocketId::DataIns, SocketId::StartValue],
            NodeKind::Constant => &[],
            NodeKind::GetProperty => &[SocketId::DataIn, SocketId::Key],
            NodeKind::CollectionDataSource => &[SocketId::DataIns],
            NodeKind::ExceptionHandler => &[SocketId::Prev],
            NodeKind::TypeQuery => &[],
        }
    }

    /// Output sockets of this node type.
    pub fn outputs(&self) -> &'static [SocketId] {
        match self {
            NodeKind::Action => &[SocketId::Next, SocketId::DataOut, SocketId::ExceptionOut],
            NodeKind::Call => &[SocketId::Next, SocketId::DataOut, SocketId::ExceptionOut],
            NodeKind::DataSource => &[SocketId::DataOut],
            NodeKind::ParameterInput => &[SocketId::ParamOut],
            NodeKind::ParameterDataSource => &[SocketId::DataOut],
            NodeKind::Return => &[],
            NodeKind::NotNull => &[SocketId::CondOut],
            NodeKind::Decision => &[SocketId::TrueOut, SocketId::FalseOut],
            NodeKind::KeyValue => &[SocketId::KeyValueOut],
            NodeKind::ObjectDataSource => &[SocketId::DataOut],
            NodeKind::Store => &[SocketId::Next, SocketId::DataOut],
            NodeKind::ScriptCondition => &[SocketId::CondOut],
            NodeKind::Not => &[SocketId::CondOut],
            NodeKind::Or => &[SocketId::CondOut],
            NodeKind::And => &[SocketId::CondOut],
            NodeKind::ForEach => &[SocketId::Next, SocketId::LoopBody, SocketId::DataOut],
            NodeKind::Aggregate => &[SocketId::Next, SocketId::DataOut],
            NodeKind::Constant => &[SocketId::DataOut],
            NodeKind::GetProperty => &[SocketId::DataOut],
            NodeKind::CollectionDataSource => &[SocketId::DataOut],
            NodeKind::ExceptionHandler => &[SocketId::Next, SocketId::DataOut],
            NodeKind::TypeQuery => &[SocketId::DataOut],
        }
    }

    /// Whether this node type may be designated as a flow's entry point.
    pub fn is_viable_start_node(&self) -> bool {
        matches!(
            self,
            NodeKind::Action
                | NodeKind::Call
                | NodeKind::Decision
                | NodeKind::ForEach
                | NodeKind::Return
                | NodeKind::Store
                | NodeKind::Aggregate
        )
    }
}

/// Persisted record identifying one node of a flow graph on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: Uuid,
    pub kind: NodeKind,
    /// Owning flow container.
    pub container: Uuid,
    /// Container id when this node is the entry point of its flow.
    /// At most one node per container carries the flag.
    pub start_node_of: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl NodeRecord {
    /// Creates a fresh record for a node of `kind` owned by `container`.
    pub fn new(kind: NodeKind, container: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            container,
            start_node_of: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this node is flagged as its container's entry point.
    pub fn is_start_node(&self) -> bool {
        self.start_node_of.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::socket::SocketDirection;

    #[test]
    fn test_tag_roundtrip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::parse(kind.name()), Some(*kind));
        }
        assert_eq!(NodeKind::parse("Bogus"), None);
    }

    #[test]
    fn test_socket_directions_match_sides() {
        for kind in NodeKind::ALL {
            for socket in kind.inputs() {
                assert_eq!(socket.direction(), SocketDirection::Input, "{:?}", kind);
            }
            for socket in kind.outputs() {
                assert_eq!(socket.direction(), SocketDirection::Output, "{:?}", kind);
            }
        }
    }

    #[test]
    fn test_viable_start_nodes() {
        let viable: Vec<NodeKind> = NodeKind::ALL
            .iter()
            .copied()
            .filter(NodeKind::is_viable_start_node)
            .collect();
        assert_eq!(
            viable,
            vec![
                NodeKind::Action,
                NodeKind::Call,
                NodeKind::Return,
                NodeKind::Decision,
                NodeKind::Store,
                NodeKind::ForEach,
                NodeKind::Aggregate,
            ]
        );
    }

    #[test]
    fn test_new_record_is_not_start_node() {
        let container = Uuid::new_v4();
        let record = NodeRecord::new(NodeKind::Action, container);
        assert_eq!(record.container, container);
        assert!(!record.is_start_node());
    }
}
