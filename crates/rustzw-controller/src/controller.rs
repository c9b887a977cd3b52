//! Sans-IO controller.
//!
//! [`Controller`] owns every [`Node`] and the [`TransmitQueue`]. It never
//! touches the transport: callers feed it received bytes and the current time,
//! write whatever [`Controller::poll_transmit`] hands back, and wake it up at
//! [`Controller::next_deadline`]. At most one SendData request is in flight.

use crate::event::{ControllerEvent, FailureReason};
use crate::handler::Effect;
use crate::node::{Node, NodeStage};
use crate::queue::{AttemptFailure, Priority, QueueEntry, Ticket, TransmitQueue};
use crate::request::{Correlation, Request};
use crate::{ControllerConfig, ControllerError};
use rustzw_core::frame::{MessageClass, MessageType, OwnedFrame, ACK, NAK};
use rustzw_core::serial_api::{
    ApplicationCommand, SendDataCallback, SendDataRequest, SendDataResponse, TransmitStatus,
};
use rustzw_core::{CommandClass, DecodeError, FrameBuffer, Inbound, NodeId, Registry};
use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

/// Result of [`Controller::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The entry had not been sent and is gone.
    Removed,
    /// Already on the wire; its reply will be ignored.
    InFlight,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingAck,
    AwaitingResponse,
    AwaitingCallback,
    AwaitingReport,
}

#[derive(Debug)]
struct InFlight {
    entry: QueueEntry,
    callback_id: u8,
    deadline: Instant,
    phase: Phase,
    abandoned: bool,
}

#[derive(Debug)]
pub struct Controller {
    config: ControllerConfig,
    registry: Registry,
    nodes: BTreeMap<NodeId, Node>,
    queue: TransmitQueue,
    in_flight: Option<InFlight>,
    frames: FrameBuffer,
    /// Last time bytes arrived while a frame was still incomplete.
    partial_since: Option<Instant>,
    outbox: VecDeque<Vec<u8>>,
    events: VecDeque<ControllerEvent>,
    next_ticket: u64,
    callback_id: u8,
}

impl Controller {
    pub fn new(config: ControllerConfig, registry: Registry) -> Self {
        Self {
            config,
            registry,
            nodes: BTreeMap::new(),
            queue: TransmitQueue::new(),
            in_flight: None,
            frames: FrameBuffer::new(),
            partial_since: None,
            outbox: VecDeque::new(),
            events: VecDeque::new(),
            next_ticket: 1,
            callback_id: 0,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn queue(&self) -> &TransmitQueue {
        &self.queue
    }

    /// Nothing queued, nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.queue.is_empty()
    }

    pub fn add_node(&mut self, node_id: NodeId) -> Result<(), ControllerError> {
        if self.nodes.contains_key(&node_id) {
            return Err(ControllerError::NodeExists(node_id));
        }
        self.nodes.insert(node_id, Node::new(node_id));
        log::debug!("node {node_id} added");
        Ok(())
    }

    /// Drops the node together with its queued requests, which fail with
    /// [`FailureReason::NodeRemoved`].
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<(), ControllerError> {
        self.nodes
            .remove(&node_id)
            .ok_or(ControllerError::NodeNotFound(node_id))?;
        for entry in self.queue.remove_node(node_id) {
            self.finish_failed(&entry, FailureReason::NodeRemoved);
        }
        if let Some(flight) = self
            .in_flight
            .as_mut()
            .filter(|f| f.entry.node_id == node_id && !f.abandoned)
        {
            flight.abandoned = true;
            let entry = flight.entry.clone();
            self.finish_failed(&entry, FailureReason::NodeRemoved);
        }
        log::debug!("node {node_id} removed");
        Ok(())
    }

    /// Declares the node's command classes and queues one mandatory version
    /// query per class that needs negotiating.
    pub fn set_command_classes(
        &mut self,
        node_id: NodeId,
        classes: &[CommandClass],
    ) -> Result<(), ControllerError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(ControllerError::NodeNotFound(node_id))?;
        let pending =
            node.set_command_classes(&self.registry, classes, self.config.version_fallback)?;
        self.collect_transitions(node_id);
        for class in pending {
            self.enqueue(node_id, Request::CommandClassVersionGet(class), None, true)?;
        }
        Ok(())
    }

    /// Queues `request` for `node_id`.
    ///
    /// A version query for a class that already has one outstanding returns
    /// the existing ticket.
    pub fn submit(&mut self, node_id: NodeId, request: Request) -> Result<Ticket, ControllerError> {
        self.enqueue(node_id, request, None, false)
    }

    pub fn submit_with_priority(
        &mut self,
        node_id: NodeId,
        request: Request,
        priority: Priority,
    ) -> Result<Ticket, ControllerError> {
        self.enqueue(node_id, request, Some(priority), false)
    }

    /// Abandons a request. A queued one is removed; one already sent keeps
    /// its slot until answered or timed out, but nothing more is reported.
    pub fn cancel(&mut self, ticket: Ticket) -> CancelOutcome {
        if let Some(entry) = self.queue.remove(ticket) {
            self.finish_failed(&entry, FailureReason::Cancelled);
            return CancelOutcome::Removed;
        }
        let Some(flight) = self
            .in_flight
            .as_mut()
            .filter(|f| f.entry.ticket == ticket && !f.abandoned)
        else {
            return CancelOutcome::NotFound;
        };
        flight.abandoned = true;
        let entry = flight.entry.clone();
        self.finish_failed(&entry, FailureReason::Cancelled);
        CancelOutcome::InFlight
    }

    /// Next bytes to write: pending ACK/NAK replies first, then the next
    /// eligible request if nothing is in flight.
    pub fn poll_transmit(&mut self, now: Instant) -> Option<Vec<u8>> {
        if let Some(bytes) = self.outbox.pop_front() {
            return Some(bytes);
        }
        if self.in_flight.is_some() {
            return None;
        }
        loop {
            let mut entry = self.queue.pop_ready(now)?;
            let callback_id = self.allocate_callback_id();
            let frame = SendDataRequest {
                node_id: entry.node_id,
                command: &entry.command,
                transmit_options: self.config.transmit_options,
                callback_id,
            }
            .to_frame_vec();
            match frame {
                Ok(bytes) => {
                    entry.attempts += 1;
                    log::trace!(
                        "sending {} to node {} (attempt {}, callback {callback_id}): {bytes:02x?}",
                        entry.ticket,
                        entry.node_id,
                        entry.attempts
                    );
                    self.in_flight = Some(InFlight {
                        entry,
                        callback_id,
                        deadline: now + self.config.response_timeout,
                        phase: Phase::AwaitingAck,
                        abandoned: false,
                    });
                    return Some(bytes);
                }
                Err(err) => {
                    log::warn!("dropping {}: {err}", entry.ticket);
                    self.finish_failed(&entry, FailureReason::Encode(err));
                }
            }
        }
    }

    /// When [`handle_timeout`](Self::handle_timeout) or
    /// [`poll_transmit`](Self::poll_transmit) next has work to do.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        let work = match &self.in_flight {
            Some(flight) => Some(flight.deadline),
            None => self.queue.next_eligible(now),
        };
        let stall = self
            .partial_since
            .map(|since| since + self.config.response_timeout);
        match (work, stall) {
            (Some(work), Some(stall)) => Some(work.min(stall)),
            (work, stall) => work.or(stall),
        }
    }

    /// Feeds raw bytes read from the transport.
    pub fn handle_bytes(&mut self, bytes: &[u8], now: Instant) {
        self.frames.push(bytes);
        self.drain_frames(now);
    }

    fn drain_frames(&mut self, now: Instant) {
        while let Some(next) = self.frames.next_inbound() {
            match next {
                Ok(inbound) => self.handle_inbound(inbound, now),
                Err(err) => {
                    log::warn!("dropped inbound bytes: {err}");
                    if matches!(err, DecodeError::ChecksumMismatch { .. }) {
                        self.outbox.push_back(vec![NAK]);
                    }
                }
            }
        }
        self.partial_since = (!self.frames.is_empty()).then_some(now);
    }

    pub fn handle_inbound(&mut self, inbound: Inbound, now: Instant) {
        match inbound {
            Inbound::Ack => {
                if let Some(flight) = self.in_flight.as_mut() {
                    if flight.phase == Phase::AwaitingAck {
                        flight.phase = Phase::AwaitingResponse;
                    }
                }
            }
            Inbound::Nak => self.on_refused(AttemptFailure::Nak, now),
            Inbound::Can => self.on_refused(AttemptFailure::Can, now),
            Inbound::Frame(frame) => {
                self.outbox.push_back(vec![ACK]);
                self.on_frame(&frame, now);
            }
        }
    }

    /// Expires the in-flight request once its deadline has passed, and gives
    /// up on a partial frame that has seen no new bytes for a response timeout.
    pub fn handle_timeout(&mut self, now: Instant) {
        let expired = self
            .in_flight
            .as_ref()
            .map_or(false, |flight| flight.deadline <= now);
        if expired {
            self.fail_attempt(AttemptFailure::Timeout, now);
        }
        let stalled = self
            .partial_since
            .map_or(false, |since| since + self.config.response_timeout <= now);
        if expired || stalled {
            self.discard_partial(now);
        }
    }

    /// Delivers an application command from `node_id` to its handler.
    ///
    /// Errors are per-frame: the command is dropped and the controller
    /// carries on.
    pub fn dispatch(&mut self, node_id: NodeId, command: &[u8]) -> Result<Effect, ControllerError> {
        let answers_in_flight = self.in_flight.as_ref().map_or(false, |flight| {
            flight.entry.node_id == node_id
                && matches!(flight.phase, Phase::AwaitingCallback | Phase::AwaitingReport)
                && matches!(
                    flight.entry.correlation,
                    Correlation::Report(key) if key.matches(command)
                )
        });

        let result = match self.nodes.get_mut(&node_id) {
            Some(node) => node.handle_application_command(&self.registry, command),
            None => Err(ControllerError::NodeNotFound(node_id)),
        };
        if let Ok((command_class, effect)) = &result {
            if !matches!(effect, Effect::Ignored { .. }) {
                self.events.push_back(ControllerEvent::CommandClassReport {
                    node_id,
                    command_class: *command_class,
                    effect: *effect,
                });
            }
        }
        self.collect_transitions(node_id);
        // An undecodable reply leaves the request to time out and retry.
        if answers_in_flight && result.is_ok() {
            self.complete_in_flight();
        }
        result.map(|(_, effect)| effect)
    }

    fn discard_partial(&mut self, now: Instant) {
        let dropped = self.frames.discard_partial();
        if dropped > 0 {
            log::warn!("discarded {dropped} bytes of a stalled frame");
        }
        self.drain_frames(now);
    }

    pub fn take_events(&mut self) -> Vec<ControllerEvent> {
        self.events.drain(..).collect()
    }

    fn enqueue(
        &mut self,
        node_id: NodeId,
        request: Request,
        priority: Option<Priority>,
        mandatory: bool,
    ) -> Result<Ticket, ControllerError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(ControllerError::NodeNotFound(node_id))?;
        let version_target = match request {
            Request::CommandClassVersionGet(target) => Some(target.to_u8()),
            _ => None,
        };
        if let Some(ticket) = version_target.and_then(|t| node.version_query(t)) {
            return Ok(ticket);
        }
        // A cancelled query still on the wire is taken over by the new ticket
        // rather than queued a second time.
        let abandoned = self.in_flight.as_mut().filter(|f| {
            f.abandoned && f.entry.node_id == node_id && f.entry.request == request
        });
        if let (Some(target), Some(flight)) = (version_target, abandoned) {
            let ticket = Ticket(self.next_ticket);
            self.next_ticket += 1;
            log::debug!("{ticket} takes over {} to node {node_id}", flight.entry.ticket);
            flight.entry.ticket = ticket;
            flight.abandoned = false;
            node.begin_version_query(target, ticket);
            return Ok(ticket);
        }

        let class = request.command_class().to_u8();
        let command = node
            .handler(class)
            .ok_or(ControllerError::HandlerNotPresent {
                node_id,
                command_class: class,
            })?
            .build_request(&request)?;

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        if let Some(target) = version_target {
            node.begin_version_query(target, ticket);
        }

        let mut entry =
            QueueEntry::new(ticket, node_id, request, command, self.config.retry_budget);
        if let Some(priority) = priority {
            entry = entry.with_priority(priority);
        }
        if mandatory {
            entry = entry.mandatory();
        }
        log::debug!("queued {ticket} for node {node_id}: {request:?}");
        self.queue.push(entry);
        Ok(ticket)
    }

    fn on_refused(&mut self, failure: AttemptFailure, now: Instant) {
        let awaiting_ack = self
            .in_flight
            .as_ref()
            .map_or(false, |flight| flight.phase == Phase::AwaitingAck);
        if awaiting_ack {
            self.fail_attempt(failure, now);
        } else {
            log::debug!("unexpected control token: {failure}");
        }
    }

    fn on_frame(&mut self, frame: &OwnedFrame, now: Instant) {
        match (frame.message_type, frame.message_class) {
            (MessageType::Response, MessageClass::SendData) => {
                self.on_send_data_response(&frame.payload, now)
            }
            (MessageType::Request, MessageClass::SendData) => {
                self.on_send_data_callback(&frame.payload, now)
            }
            (MessageType::Request, MessageClass::ApplicationCommandHandler) => {
                match ApplicationCommand::decode_payload(&frame.payload) {
                    Ok(app) => {
                        if let Err(err) = self.dispatch(app.node_id, app.command) {
                            log::warn!("node {}: dropped command: {err}", app.node_id);
                        }
                    }
                    Err(err) => log::warn!("malformed application command: {err}"),
                }
            }
            (message_type, message_class) => {
                log::debug!("ignoring {message_type:?} {message_class:?}")
            }
        }
    }

    fn on_send_data_response(&mut self, payload: &[u8], now: Instant) {
        let response = match SendDataResponse::decode_payload(payload) {
            Ok(response) => response,
            Err(err) => {
                log::warn!("malformed send data response: {err}");
                return;
            }
        };
        let Some(flight) = self.in_flight.as_mut() else {
            log::debug!("send data response with nothing in flight");
            return;
        };
        if !matches!(flight.phase, Phase::AwaitingAck | Phase::AwaitingResponse) {
            return;
        }
        if response.accepted {
            flight.phase = Phase::AwaitingCallback;
        } else {
            self.fail_attempt(AttemptFailure::Rejected, now);
        }
    }

    fn on_send_data_callback(&mut self, payload: &[u8], now: Instant) {
        let callback = match SendDataCallback::decode_payload(payload) {
            Ok(callback) => callback,
            Err(err) => {
                log::warn!("malformed send data callback: {err}");
                return;
            }
        };
        let Some(flight) = self
            .in_flight
            .as_mut()
            .filter(|f| f.callback_id == callback.callback_id && f.phase != Phase::AwaitingReport)
        else {
            log::debug!("stale callback {}", callback.callback_id);
            return;
        };
        if callback.status != TransmitStatus::Ok {
            self.fail_attempt(AttemptFailure::Transmit(callback.status), now);
            return;
        }
        if flight.entry.correlation == Correlation::Transmitted {
            self.complete_in_flight();
        } else {
            flight.phase = Phase::AwaitingReport;
        }
    }

    fn complete_in_flight(&mut self) {
        let Some(flight) = self.in_flight.take() else {
            return;
        };
        let entry = flight.entry;
        if flight.abandoned {
            log::debug!("reply for abandoned {} ignored", entry.ticket);
            return;
        }
        log::debug!(
            "{} to node {} completed after {} attempt(s)",
            entry.ticket,
            entry.node_id,
            entry.attempts
        );
        if let Some(node) = self.nodes.get_mut(&entry.node_id) {
            node.end_version_query(entry.ticket);
        }
        self.events.push_back(ControllerEvent::RequestCompleted {
            ticket: entry.ticket,
            node_id: entry.node_id,
        });
    }

    fn fail_attempt(&mut self, failure: AttemptFailure, now: Instant) {
        let Some(flight) = self.in_flight.take() else {
            return;
        };
        let mut entry = flight.entry;
        if flight.abandoned {
            log::debug!("abandoned {} {failure}", entry.ticket);
            return;
        }
        if entry.retries_remaining > 0 {
            entry.retries_remaining -= 1;
            entry.not_before = Some(now + self.config.retry_backoff * u32::from(entry.attempts));
            log::debug!(
                "{} to node {} {failure}, retrying ({} left)",
                entry.ticket,
                entry.node_id,
                entry.retries_remaining
            );
            self.queue.push(entry);
            return;
        }

        log::warn!(
            "{} to node {} {failure}, giving up after {} attempt(s)",
            entry.ticket,
            entry.node_id,
            entry.attempts
        );
        let reason = match entry.request {
            Request::CommandClassVersionGet(class) => FailureReason::NegotiationTimeout {
                command_class: class.to_u8(),
            },
            _ => FailureReason::RetriesExhausted { last: failure },
        };
        self.finish_failed(&entry, reason);
        if entry.mandatory {
            if let Some(node) = self.nodes.get_mut(&entry.node_id) {
                node.fail();
            }
            self.collect_transitions(entry.node_id);
        }
    }

    fn finish_failed(&mut self, entry: &QueueEntry, reason: FailureReason) {
        if let Some(node) = self.nodes.get_mut(&entry.node_id) {
            node.end_version_query(entry.ticket);
        }
        self.events.push_back(ControllerEvent::RequestFailed {
            ticket: entry.ticket,
            node_id: entry.node_id,
            reason,
        });
    }

    fn collect_transitions(&mut self, node_id: NodeId) {
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return;
        };
        let mut failed = false;
        for stage in node.take_transitions() {
            failed |= stage == NodeStage::Failed;
            self.events
                .push_back(ControllerEvent::StageChanged { node_id, stage });
        }
        if failed {
            self.drop_negotiation(node_id);
        }
    }

    /// A failed node stops negotiating: its pending version queries fail
    /// with [`FailureReason::NodeFailed`] instead of holding the transport.
    fn drop_negotiation(&mut self, node_id: NodeId) {
        for entry in self.queue.remove_mandatory(node_id) {
            self.finish_failed(&entry, FailureReason::NodeFailed);
        }
        if let Some(flight) = self
            .in_flight
            .as_mut()
            .filter(|f| f.entry.node_id == node_id && f.entry.mandatory && !f.abandoned)
        {
            flight.abandoned = true;
            let entry = flight.entry.clone();
            self.finish_failed(&entry, FailureReason::NodeFailed);
        }
    }

    /// Callback ids wrap and skip 0, which asks the controller for no callback.
    fn allocate_callback_id(&mut self) -> u8 {
        self.callback_id = self.callback_id.wrapping_add(1);
        if self.callback_id == 0 {
            self.callback_id = 1;
        }
        self.callback_id
    }
}
