use crate::request::{Correlation, Request};
use rustzw_core::serial_api::TransmitStatus;
use rustzw_core::NodeId;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

/// Transmit ordering. Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Priority {
    High,
    /// Get and negotiation traffic.
    Get,
    /// Ordinary Set traffic.
    Set,
    Low,
}

/// Handle for one submitted request. Tickets increase with submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticket(pub(crate) u64);

impl Ticket {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a single transmit attempt did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttemptFailure {
    Timeout,
    Nak,
    Can,
    /// The controller refused the SendData request.
    Rejected,
    Transmit(TransmitStatus),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timed out"),
            Self::Nak => f.write_str("frame rejected with NAK"),
            Self::Can => f.write_str("frame cancelled with CAN"),
            Self::Rejected => f.write_str("request rejected by controller"),
            Self::Transmit(status) => write!(f, "transmit failed with status {status:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub ticket: Ticket,
    pub node_id: NodeId,
    pub request: Request,
    /// Application command; wrapped in SendData with a fresh callback id per attempt.
    pub command: Vec<u8>,
    pub priority: Priority,
    pub correlation: Correlation,
    pub retries_remaining: u8,
    pub attempts: u8,
    /// Exhausting this entry fails the node.
    pub mandatory: bool,
    pub not_before: Option<Instant>,
}

impl QueueEntry {
    pub fn new(
        ticket: Ticket,
        node_id: NodeId,
        request: Request,
        command: Vec<u8>,
        retry_budget: u8,
    ) -> Self {
        Self {
            ticket,
            node_id,
            request,
            command,
            priority: request.priority(),
            correlation: request.correlation(),
            retries_remaining: retry_budget,
            attempts: 0,
            mandatory: false,
            not_before: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    fn eligible_at(&self, now: Instant) -> Instant {
        self.not_before.map_or(now, |t| t.max(now))
    }
}

/// Pending requests ordered by priority, then submission.
///
/// A re-queued entry keeps its ticket and so its place among equals; its
/// backoff only delays it, and entries behind it may go first meanwhile.
#[derive(Debug, Default)]
pub struct TransmitQueue {
    entries: BTreeMap<(Priority, Ticket), QueueEntry>,
}

impl TransmitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: QueueEntry) {
        self.entries.insert((entry.priority, entry.ticket), entry);
    }

    /// Removes the first entry whose backoff has elapsed.
    pub fn pop_ready(&mut self, now: Instant) -> Option<QueueEntry> {
        let key = self
            .entries
            .iter()
            .find(|(_, entry)| entry.not_before.map_or(true, |t| t <= now))
            .map(|(key, _)| *key)?;
        self.entries.remove(&key)
    }

    pub fn remove(&mut self, ticket: Ticket) -> Option<QueueEntry> {
        let key = *self.entries.keys().find(|(_, t)| *t == ticket)?;
        self.entries.remove(&key)
    }

    pub fn remove_node(&mut self, node_id: NodeId) -> Vec<QueueEntry> {
        self.remove_where(|entry| entry.node_id == node_id)
    }

    /// Removes the node's mandatory entries, leaving its other traffic queued.
    pub fn remove_mandatory(&mut self, node_id: NodeId) -> Vec<QueueEntry> {
        self.remove_where(|entry| entry.node_id == node_id && entry.mandatory)
    }

    fn remove_where(&mut self, pred: impl Fn(&QueueEntry) -> bool) -> Vec<QueueEntry> {
        let keys: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, entry)| pred(entry))
            .map(|(key, _)| *key)
            .collect();
        keys.iter()
            .filter_map(|key| self.entries.remove(key))
            .collect()
    }

    /// When the earliest entry becomes eligible; `now` if one already is.
    pub fn next_eligible(&self, now: Instant) -> Option<Instant> {
        self.entries.values().map(|e| e.eligible_at(now)).min()
    }

    pub fn contains(&self, ticket: Ticket) -> bool {
        self.entries.keys().any(|(_, t)| *t == ticket)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
