//! Async driver running a [`Controller`] against a [`Transport`].

use crate::controller::{CancelOutcome, Controller};
use crate::event::ControllerEvent;
use crate::queue::Ticket;
use crate::{ControllerError, Request};
use rustzw_core::{CommandClass, NodeId};
use rustzw_serial::{Transport, TransportError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

const READ_BUFFER_LEN: usize = 256;

type Reply<T> = oneshot::Sender<Result<T, ControllerError>>;
type Completion = oneshot::Receiver<Result<(), ControllerError>>;

enum Command {
    AddNode {
        node_id: NodeId,
        reply: Reply<()>,
    },
    RemoveNode {
        node_id: NodeId,
        reply: Reply<()>,
    },
    SetCommandClasses {
        node_id: NodeId,
        classes: Vec<CommandClass>,
        reply: Reply<()>,
    },
    Submit {
        node_id: NodeId,
        request: Request,
        reply: Reply<(Ticket, Completion)>,
    },
    Cancel {
        ticket: Ticket,
        reply: oneshot::Sender<CancelOutcome>,
    },
    Shutdown,
}

/// Cloneable front end to a running driver.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl ControllerHandle {
    pub async fn add_node(&self, node_id: NodeId) -> Result<(), ControllerError> {
        self.call(|reply| Command::AddNode { node_id, reply }).await
    }

    pub async fn remove_node(&self, node_id: NodeId) -> Result<(), ControllerError> {
        self.call(|reply| Command::RemoveNode { node_id, reply })
            .await
    }

    /// Declares the node's command classes; negotiation starts right away.
    pub async fn set_command_classes(
        &self,
        node_id: NodeId,
        classes: Vec<CommandClass>,
    ) -> Result<(), ControllerError> {
        self.call(|reply| Command::SetCommandClasses {
            node_id,
            classes,
            reply,
        })
        .await
    }

    /// Queues a request. Returns once it is queued, not once it is answered.
    pub async fn submit(
        &self,
        node_id: NodeId,
        request: Request,
    ) -> Result<PendingRequest, ControllerError> {
        let (ticket, completion) = self
            .call(|reply| Command::Submit {
                node_id,
                request,
                reply,
            })
            .await?;
        Ok(PendingRequest { ticket, completion })
    }

    pub async fn cancel(&self, ticket: Ticket) -> Result<CancelOutcome, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Cancel { ticket, reply })
            .map_err(|_| ControllerError::Closed)?;
        rx.await.map_err(|_| ControllerError::Closed)
    }

    /// Stops the driver. Outstanding requests resolve with [`ControllerError::Closed`].
    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }

    async fn call<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .map_err(|_| ControllerError::Closed)?;
        rx.await.map_err(|_| ControllerError::Closed)?
    }
}

/// A submitted request.
#[derive(Debug)]
pub struct PendingRequest {
    ticket: Ticket,
    completion: Completion,
}

impl PendingRequest {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Waits for the matched reply, or for the failure once retries run out.
    pub async fn wait(self) -> Result<(), ControllerError> {
        self.completion
            .await
            .map_err(|_| ControllerError::Closed)?
    }
}

/// Events emitted by the driver, in order.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl EventStream {
    pub async fn recv(&mut self) -> Option<ControllerEvent> {
        self.rx.recv().await
    }
}

/// Create a controller handle, its event stream, and the async driver loop.
///
/// `driver` must be polled (e.g. via `tokio::spawn`) for anything to happen.
/// It resolves with `Ok(())` after [`ControllerHandle::shutdown`] or once
/// every handle is dropped, and with an error when the transport fails.
///
/// # Example
///
/// ```ignore
/// let (handle, mut events, driver) = create_controller(transport, controller);
/// tokio::spawn(driver);
/// handle.add_node(5).await?;
/// handle.set_command_classes(5, classes).await?;
/// while let Some(event) = events.recv().await {
///     // react to stage changes and reports
/// }
/// ```
pub fn create_controller<T: Transport + 'static>(
    transport: Arc<T>,
    controller: Controller,
) -> (
    ControllerHandle,
    EventStream,
    impl Future<Output = Result<(), ControllerError>>,
) {
    let (tx, commands) = mpsc::unbounded_channel();
    let (events, rx) = mpsc::unbounded_channel();
    let driver = run(transport, controller, commands, events);
    (ControllerHandle { tx }, EventStream { rx }, driver)
}

async fn run<T: Transport>(
    transport: Arc<T>,
    mut controller: Controller,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<ControllerEvent>,
) -> Result<(), ControllerError> {
    let mut waiters: HashMap<Ticket, Vec<Reply<()>>> = HashMap::new();
    let mut buf = [0u8; READ_BUFFER_LEN];
    loop {
        while let Some(bytes) = controller.poll_transmit(Instant::now()) {
            transport.write(&bytes).await?;
        }
        for event in controller.take_events() {
            resolve(&mut waiters, &event);
            // The binding may not be listening.
            let _ = events.send(event);
        }

        let deadline = controller.next_deadline(Instant::now());
        tokio::select! {
            read = transport.read(&mut buf) => {
                let n = read?;
                if n == 0 {
                    return Err(TransportError::Closed.into());
                }
                controller.handle_bytes(&buf[..n], Instant::now());
            }
            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => {
                    log::debug!("controller driver stopping");
                    return Ok(());
                }
                Some(command) => apply(&mut controller, &mut waiters, command),
            },
            _ = sleep_until(deadline) => controller.handle_timeout(Instant::now()),
        }
    }
}

fn apply(
    controller: &mut Controller,
    waiters: &mut HashMap<Ticket, Vec<Reply<()>>>,
    command: Command,
) {
    match command {
        Command::AddNode { node_id, reply } => {
            let _ = reply.send(controller.add_node(node_id));
        }
        Command::RemoveNode { node_id, reply } => {
            let _ = reply.send(controller.remove_node(node_id));
        }
        Command::SetCommandClasses {
            node_id,
            classes,
            reply,
        } => {
            let _ = reply.send(controller.set_command_classes(node_id, &classes));
        }
        Command::Submit {
            node_id,
            request,
            reply,
        } => match controller.submit(node_id, request) {
            Ok(ticket) => {
                let (tx, rx) = oneshot::channel();
                waiters.entry(ticket).or_default().push(tx);
                let _ = reply.send(Ok((ticket, rx)));
            }
            Err(err) => {
                let _ = reply.send(Err(err));
            }
        },
        Command::Cancel { ticket, reply } => {
            let _ = reply.send(controller.cancel(ticket));
        }
        Command::Shutdown => {}
    }
}

fn resolve(waiters: &mut HashMap<Ticket, Vec<Reply<()>>>, event: &ControllerEvent) {
    let (ticket, failure) = match *event {
        ControllerEvent::RequestCompleted { ticket, .. } => (ticket, None),
        ControllerEvent::RequestFailed {
            ticket,
            node_id,
            reason,
        } => (ticket, Some((node_id, reason))),
        _ => return,
    };
    for reply in waiters.remove(&ticket).unwrap_or_default() {
        let result = match failure {
            None => Ok(()),
            Some((node_id, reason)) => Err(reason.into_error(node_id)),
        };
        let _ = reply.send(result);
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
