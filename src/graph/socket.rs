//! Socket roles and directions for node connection points

use serde::{Deserialize, Serialize};

/// Whether a socket accepts or emits connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketDirection {
    Input,
    Output,
}

/// Identifies the role of a connection point on a node widget.
///
/// Socket ids are stable: an existing persisted relationship is re-derived
/// from the (source, target) socket pairing of its connection type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketId {
    /// Control-flow input.
    Prev,
    /// Control-flow output.
    Next,
    /// Single data input.
    DataIn,
    /// Data output.
    DataOut,
    /// Collection data input accepting multiple sources.
    DataIns,
    /// Single condition input.
    CondIn,
    /// Collection condition input on logic combinators.
    CondIns,
    /// Condition result output.
    CondOut,
    /// Decision branch taken when the condition holds.
    TrueOut,
    /// Decision branch taken when the condition fails.
    FalseOut,
    /// Loop body output of an iteration node.
    LoopBody,
    /// Output linking a node to its exception handler.
    ExceptionOut,
    /// Key/value pair output.
    KeyValueOut,
    /// Key/value collection input on object builders.
    KeyValueIns,
    /// Parameter output.
    ParamOut,
    /// Parameter collection input on call nodes.
    ParamIns,
    /// Aggregation start value input.
    StartValue,
    /// Script source input of a script condition.
    ScriptSource,
    /// Property key input.
    Key,
}

impl SocketId {
    /// Stable string id used by the rendering surface.
    pub fn id(&self) -> &'static str {
        match self {
            SocketId::Prev => "prev",
            SocketId::Next => "next",
            SocketId::DataIn => "dataTarget",
            SocketId::DataOut => "dataSource",
            SocketId::DataIns => "dataSources",
            SocketId::CondIn => "condition",
            SocketId::CondIns => "conditions",
            SocketId::CondOut => "result",
            SocketId::TrueOut => "true",
            SocketId::FalseOut => "false",
            SocketId::LoopBody => "loopBody",
            SocketId::ExceptionOut => "exceptionHandler",
            SocketId::KeyValueOut => "keyValue",
            SocketId::KeyValueIns => "keyValueSources",
            SocketId::ParamOut => "parameter",
            SocketId::ParamIns => "parameters",
            SocketId::StartValue => "startValue",
            SocketId::ScriptSource => "scriptSource",
            SocketId::Key => "key",
        }
    }

    /// Direction of this socket role.
    pub fn direction(&self) -> SocketDirection {
        match self {
            SocketId::Prev
            | SocketId::DataIn
            | SocketId::DataIns
            | SocketId::CondIn
            | SocketId::CondIns
            | SocketId::KeyValueIns
            | SocketId::ParamIns
            | SocketId::StartValue
            | SocketId::ScriptSource
            | SocketId::Key => SocketDirection::Input,
            SocketId::Next
            | SocketId::DataOut
            | SocketId::CondOut
            | SocketId::TrueOut
            | SocketId::FalseOut
            | SocketId::LoopBody
            | SocketId::ExceptionOut
            | SocketId::KeyValueOut
            | SocketId::ParamOut => SocketDirection::Output,
        }
    }

    /// Checks if this socket accepts connections.
    pub fn is_input(&self) -> bool {
        matches!(self.direction(), SocketDirection::Input)
    }

    /// Checks if this socket emits connections.
    pub fn is_output(&self) -> bool {
        matches!(self.direction(), SocketDirection::Output)
    }
}
