use crate::config::VersionFallback;
use crate::handler::{CommandClassHandler, Effect};
use crate::queue::Ticket;
use crate::ControllerError;
use rustzw_core::command_class::version::CommandClassVersionReport;
use rustzw_core::{CommandClass, DecodeError, HandlerKind, NodeId, Registry};
use std::collections::BTreeMap;

/// Lifecycle of a node. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeStage {
    Created,
    ProbingCapabilities,
    NegotiatingVersions,
    Operational,
    Failed,
}

impl NodeStage {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Operational | Self::Failed)
    }
}

/// A remote node and the handlers for the command classes it implements.
///
/// The `NegotiatingVersions -> Operational` step is a countdown: every
/// handler starts unnegotiated except Version itself, and the report that
/// negotiates the last one advances the node.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    stage: NodeStage,
    handlers: BTreeMap<u8, CommandClassHandler>,
    unnegotiated: usize,
    version_queries: BTreeMap<u8, Ticket>,
    transitions: Vec<NodeStage>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            stage: NodeStage::Created,
            handlers: BTreeMap::new(),
            unnegotiated: 0,
            version_queries: BTreeMap::new(),
            transitions: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn stage(&self) -> NodeStage {
        self.stage
    }

    pub fn handler(&self, command_class: u8) -> Option<&CommandClassHandler> {
        self.handlers.get(&command_class)
    }

    pub fn handlers(&self) -> impl Iterator<Item = &CommandClassHandler> {
        self.handlers.values()
    }

    pub fn negotiated_version(&self, command_class: u8) -> Option<u8> {
        self.handler(command_class)
            .map(CommandClassHandler::version)
            .filter(|v| *v != 0)
    }

    /// Handlers still waiting for a version report.
    pub fn unnegotiated(&self) -> usize {
        self.unnegotiated
    }

    /// Instantiates a handler for every registered class and enters
    /// negotiation. Returns the classes whose version must be queried.
    ///
    /// Classes missing from the registry are skipped. Without a Version
    /// handler nothing can be queried and `fallback` decides the outcome.
    pub fn set_command_classes(
        &mut self,
        registry: &Registry,
        classes: &[CommandClass],
        fallback: VersionFallback,
    ) -> Result<Vec<CommandClass>, ControllerError> {
        if self.stage != NodeStage::Created {
            return Err(ControllerError::CommandClassesAlreadySet(self.id));
        }
        self.advance(NodeStage::ProbingCapabilities);

        for class in classes {
            match registry.get(*class) {
                Some(descriptor) => {
                    self.handlers
                        .entry(class.to_u8())
                        .or_insert_with(|| CommandClassHandler::new(*descriptor));
                }
                None => log::warn!(
                    "node {}: command class 0x{:02x} is not supported, skipping",
                    self.id,
                    class.to_u8()
                ),
            }
        }
        self.advance(NodeStage::NegotiatingVersions);

        match self.handlers.get_mut(&CommandClass::Version.to_u8()) {
            Some(version) => {
                version.on_version_negotiated(1);
            }
            None => match fallback {
                VersionFallback::AssumeVersionOne => {
                    log::debug!(
                        "node {}: no version command class, assuming version 1",
                        self.id
                    );
                    for handler in self.handlers.values_mut() {
                        handler.on_version_negotiated(1);
                    }
                }
                VersionFallback::Fail => {
                    log::warn!("node {}: no version command class", self.id);
                    self.fail();
                    return Ok(Vec::new());
                }
            },
        }

        let pending: Vec<CommandClass> = self
            .handlers
            .values()
            .filter(|h| !h.is_negotiated())
            .map(CommandClassHandler::command_class)
            .collect();
        self.unnegotiated = pending.len();
        if self.unnegotiated == 0 {
            self.advance(NodeStage::Operational);
        }
        Ok(pending)
    }

    /// Applies a version report for `report.command_class` and returns the
    /// version now in effect.
    pub fn apply_command_class_version(
        &mut self,
        registry: &Registry,
        report: CommandClassVersionReport,
    ) -> Result<u8, ControllerError> {
        if registry.lookup(report.command_class).is_err() {
            return Err(ControllerError::UnsupportedCommandClass(
                report.command_class,
            ));
        }
        let handler = self.handlers.get_mut(&report.command_class).ok_or(
            ControllerError::HandlerNotPresent {
                node_id: self.id,
                command_class: report.command_class,
            },
        )?;

        let first = !handler.is_negotiated();
        let version = handler.on_version_negotiated(report.version);
        log::debug!(
            "node {}: {} negotiated at version {version}",
            self.id,
            handler.descriptor().label
        );
        if first {
            self.unnegotiated = self.unnegotiated.saturating_sub(1);
            if self.unnegotiated == 0 && self.stage == NodeStage::NegotiatingVersions {
                self.advance(NodeStage::Operational);
            }
        }
        Ok(version)
    }

    /// Routes an application command, class identifier first, to its handler.
    pub fn handle_application_command(
        &mut self,
        registry: &Registry,
        command: &[u8],
    ) -> Result<(CommandClass, Effect), ControllerError> {
        let (&class_id, payload) = command
            .split_first()
            .ok_or(ControllerError::Decode(DecodeError::UnexpectedEof))?;
        let descriptor = *registry
            .lookup(class_id)
            .map_err(|_| ControllerError::UnknownCommandClass(class_id))?;
        let handler =
            self.handlers
                .get_mut(&class_id)
                .ok_or(ControllerError::HandlerNotPresent {
                    node_id: self.id,
                    command_class: class_id,
                })?;

        let effect = match handler.decode_application_payload(payload) {
            Ok(effect) => effect,
            Err(err) => {
                if descriptor.handler == HandlerKind::Version
                    && self.stage == NodeStage::NegotiatingVersions
                {
                    log::warn!("node {}: undecodable version command: {err}", self.id);
                    self.fail();
                }
                return Err(err.into());
            }
        };

        match effect {
            Effect::CommandClassVersion(report) => {
                self.apply_command_class_version(registry, report)?;
            }
            Effect::Ignored { command } => log::warn!(
                "node {}: ignoring {} command 0x{command:02x}",
                self.id,
                descriptor.label
            ),
            _ => {}
        }
        Ok((descriptor.class, effect))
    }

    /// Moves to `Failed` unless already terminal.
    pub fn fail(&mut self) -> bool {
        self.advance(NodeStage::Failed)
    }

    /// Stage changes since the last call, oldest first.
    pub fn take_transitions(&mut self) -> Vec<NodeStage> {
        std::mem::take(&mut self.transitions)
    }

    pub(crate) fn version_query(&self, command_class: u8) -> Option<Ticket> {
        self.version_queries.get(&command_class).copied()
    }

    pub(crate) fn begin_version_query(&mut self, command_class: u8, ticket: Ticket) {
        self.version_queries.insert(command_class, ticket);
    }

    pub(crate) fn end_version_query(&mut self, ticket: Ticket) {
        self.version_queries.retain(|_, t| *t != ticket);
    }

    fn advance(&mut self, to: NodeStage) -> bool {
        if self.stage.is_terminal() || to <= self.stage {
            return false;
        }
        log::debug!("node {}: {:?} -> {to:?}", self.id, self.stage);
        self.stage = to;
        self.transitions.push(to);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{Node, NodeStage};
    use crate::config::VersionFallback;
    use crate::handler::Effect;
    use crate::ControllerError;
    use rustzw_core::command_class::version::CommandClassVersionReport;
    use rustzw_core::{CommandClass, Registry};

    const A: CommandClass = CommandClass::SwitchBinary;
    const B: CommandClass = CommandClass::SwitchMultilevel;

    fn negotiating_node(registry: &Registry) -> Node {
        let mut node = Node::new(5);
        let pending = node
            .set_command_classes(
                registry,
                &[A, B, CommandClass::Version],
                VersionFallback::AssumeVersionOne,
            )
            .unwrap();
        assert_eq!(pending, vec![A, B]);
        assert_eq!(node.stage(), NodeStage::NegotiatingVersions);
        node
    }

    fn report(class: CommandClass, version: u8) -> [u8; 4] {
        [0x86, 0x14, class.to_u8(), version]
    }

    #[test]
    fn reports_in_either_order_make_node_operational() {
        let registry = Registry::standard();
        for order in [[A, B], [B, A]] {
            let mut node = negotiating_node(&registry);
            node.handle_application_command(&registry, &report(order[0], 1))
                .unwrap();
            assert_eq!(node.stage(), NodeStage::NegotiatingVersions);
            node.handle_application_command(&registry, &report(order[1], 1))
                .unwrap();
            assert_eq!(node.stage(), NodeStage::Operational);
        }
    }

    #[test]
    fn one_report_out_of_two_keeps_negotiating() {
        let registry = Registry::standard();
        let mut node = negotiating_node(&registry);
        node.handle_application_command(&registry, &report(A, 1))
            .unwrap();
        // A second report for the same class does not count twice.
        node.handle_application_command(&registry, &report(A, 1))
            .unwrap();
        assert_eq!(node.stage(), NodeStage::NegotiatingVersions);
        assert_eq!(node.unnegotiated(), 1);
        assert_eq!(node.negotiated_version(B.to_u8()), None);
    }

    #[test]
    fn reported_version_above_maximum_is_clamped() {
        let registry = Registry::standard();
        let mut node = negotiating_node(&registry);
        let (class, effect) = node
            .handle_application_command(&registry, &report(B, 9))
            .unwrap();
        assert_eq!(class, CommandClass::Version);
        assert_eq!(
            effect,
            Effect::CommandClassVersion(CommandClassVersionReport {
                command_class: B.to_u8(),
                version: 9,
            })
        );
        assert_eq!(node.negotiated_version(B.to_u8()), Some(2));
    }

    #[test]
    fn report_for_absent_handler_leaves_stage_alone() {
        let registry = Registry::standard();
        let mut node = negotiating_node(&registry);
        let err = node
            .handle_application_command(&registry, &report(CommandClass::Battery, 1))
            .unwrap_err();
        assert!(matches!(
            err,
            ControllerError::HandlerNotPresent {
                node_id: 5,
                command_class: 0x80
            }
        ));
        assert_eq!(node.stage(), NodeStage::NegotiatingVersions);

        let err = node
            .handle_application_command(&registry, &[0x86, 0x14, 0xEE, 0x01])
            .unwrap_err();
        assert!(matches!(err, ControllerError::UnsupportedCommandClass(0xEE)));
    }

    #[test]
    fn unknown_class_in_command_is_rejected() {
        let registry = Registry::standard();
        let mut node = negotiating_node(&registry);
        let err = node
            .handle_application_command(&registry, &[0xEE, 0x01])
            .unwrap_err();
        assert!(matches!(err, ControllerError::UnknownCommandClass(0xEE)));
        assert_eq!(node.stage(), NodeStage::NegotiatingVersions);
    }

    #[test]
    fn truncated_version_command_fails_negotiating_node() {
        let registry = Registry::standard();
        let mut node = negotiating_node(&registry);
        assert!(node
            .handle_application_command(&registry, &[0x86, 0x14, 0x25])
            .is_err());
        assert_eq!(node.stage(), NodeStage::Failed);
        assert_eq!(
            node.take_transitions().last(),
            Some(&NodeStage::Failed)
        );
    }

    #[test]
    fn truncated_report_of_other_class_is_recoverable() {
        let registry = Registry::standard();
        let mut node = negotiating_node(&registry);
        assert!(node.handle_application_command(&registry, &[0x25, 0x03]).is_err());
        assert_eq!(node.stage(), NodeStage::NegotiatingVersions);
    }

    #[test]
    fn without_version_class_fallback_decides() {
        let registry = Registry::standard();

        let mut node = Node::new(3);
        let pending = node
            .set_command_classes(&registry, &[A, B], VersionFallback::AssumeVersionOne)
            .unwrap();
        assert!(pending.is_empty());
        assert_eq!(node.stage(), NodeStage::Operational);
        assert_eq!(node.negotiated_version(B.to_u8()), Some(1));
        assert_eq!(
            node.take_transitions(),
            vec![
                NodeStage::ProbingCapabilities,
                NodeStage::NegotiatingVersions,
                NodeStage::Operational
            ]
        );

        let mut node = Node::new(4);
        node.set_command_classes(&registry, &[A], VersionFallback::Fail)
            .unwrap();
        assert_eq!(node.stage(), NodeStage::Failed);
    }

    #[test]
    fn version_only_node_is_operational_immediately() {
        let registry = Registry::standard();
        let mut node = Node::new(6);
        let pending = node
            .set_command_classes(
                &registry,
                &[CommandClass::Version, CommandClass::Other(0xEE)],
                VersionFallback::Fail,
            )
            .unwrap();
        assert!(pending.is_empty());
        assert_eq!(node.stage(), NodeStage::Operational);
        assert!(node.handler(0xEE).is_none());
    }

    #[test]
    fn stages_never_move_backwards() {
        let registry = Registry::standard();
        let mut node = negotiating_node(&registry);
        assert!(matches!(
            node.set_command_classes(&registry, &[A], VersionFallback::AssumeVersionOne),
            Err(ControllerError::CommandClassesAlreadySet(5))
        ));
        assert!(node.fail());
        assert!(!node.fail());
        node.handle_application_command(&registry, &report(A, 1))
            .unwrap();
        node.handle_application_command(&registry, &report(B, 1))
            .unwrap();
        assert_eq!(node.stage(), NodeStage::Failed);
    }
}
