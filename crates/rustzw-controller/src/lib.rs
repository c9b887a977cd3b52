//! Z-Wave node lifecycle over a serial controller stick.
//!
//! The [`Controller`] is a sans-IO state machine owning every node, its
//! command class handlers, and the transmit queue. [`create_controller`]
//! wraps it in an async driver over any [`rustzw_serial::Transport`].

pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod event;
pub mod handler;
pub mod node;
pub mod queue;
pub mod request;

pub use config::{ControllerConfig, VersionFallback};
pub use controller::{CancelOutcome, Controller};
pub use driver::{create_controller, ControllerHandle, EventStream, PendingRequest};
pub use error::ControllerError;
pub use event::{ControllerEvent, FailureReason};
pub use handler::{CommandClassHandler, Effect, HandlerState};
pub use node::{Node, NodeStage};
pub use queue::{AttemptFailure, Priority, QueueEntry, Ticket, TransmitQueue};
pub use request::{Correlation, ReportKey, Request};
pub use rustzw_core::{CommandClass, NodeId, Registry};
