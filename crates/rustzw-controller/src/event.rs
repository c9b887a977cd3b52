use crate::handler::Effect;
use crate::node::NodeStage;
use crate::queue::{AttemptFailure, Ticket};
use crate::ControllerError;
use rustzw_core::{CommandClass, EncodeError, NodeId};

/// Something the binding layer should know about.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ControllerEvent {
    StageChanged {
        node_id: NodeId,
        stage: NodeStage,
    },
    CommandClassReport {
        node_id: NodeId,
        command_class: CommandClass,
        effect: Effect,
    },
    RequestCompleted {
        ticket: Ticket,
        node_id: NodeId,
    },
    RequestFailed {
        ticket: Ticket,
        node_id: NodeId,
        reason: FailureReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FailureReason {
    /// A version query ran out of retries.
    NegotiationTimeout { command_class: u8 },
    RetriesExhausted { last: AttemptFailure },
    /// The queued command could not be framed.
    Encode(EncodeError),
    Cancelled,
    NodeRemoved,
    /// The node failed while this negotiation request was pending.
    NodeFailed,
}

impl FailureReason {
    pub fn into_error(self, node_id: NodeId) -> ControllerError {
        match self {
            Self::NegotiationTimeout { command_class } => ControllerError::NegotiationTimeout {
                node_id,
                command_class,
            },
            Self::RetriesExhausted { last } => ControllerError::RetriesExhausted { node_id, last },
            Self::Encode(err) => ControllerError::Encode(err),
            Self::Cancelled => ControllerError::Cancelled,
            Self::NodeRemoved => ControllerError::NodeRemoved(node_id),
            Self::NodeFailed => ControllerError::NodeFailed(node_id),
        }
    }
}
