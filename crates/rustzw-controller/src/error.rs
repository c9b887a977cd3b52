use crate::queue::AttemptFailure;
use rustzw_core::NodeId;
use rustzw_serial::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("encode error: {0}")]
    Encode(#[from] rustzw_core::EncodeError),
    #[error("decode error: {0}")]
    Decode(#[from] rustzw_core::DecodeError),
    #[error("unknown command class 0x{0:02x}")]
    UnknownCommandClass(u8),
    #[error("command class 0x{0:02x} is not supported")]
    UnsupportedCommandClass(u8),
    #[error("node {node_id} has no handler for command class 0x{command_class:02x}")]
    HandlerNotPresent { node_id: NodeId, command_class: u8 },
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("node {0} already exists")]
    NodeExists(NodeId),
    #[error("command classes of node {0} are already known")]
    CommandClassesAlreadySet(NodeId),
    #[error("request not supported by the handler for command class 0x{command_class:02x}")]
    RequestNotSupported { command_class: u8 },
    #[error("version negotiation timed out for node {node_id} command class 0x{command_class:02x}")]
    NegotiationTimeout { node_id: NodeId, command_class: u8 },
    #[error("request to node {node_id} failed after retries: {last}")]
    RetriesExhausted { node_id: NodeId, last: AttemptFailure },
    #[error("request was cancelled")]
    Cancelled,
    #[error("node {0} was removed")]
    NodeRemoved(NodeId),
    #[error("node {0} failed")]
    NodeFailed(NodeId),
    #[error("controller closed")]
    Closed,
}
