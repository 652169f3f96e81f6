//! The attachment coordinator.
//!
//! Owns the machine and everything its effects touch. Hardware
//! occurrences and API calls are marshalled onto one unbounded command
//! queue drained by a single worker task - that queue is the sole
//! concurrency boundary; the machine itself never sees two events at
//! once.

use crate::attach::state::{AttachEvent, AttachState};
use crate::attach::{tables, Status};
use crate::builder::BuildError;
use crate::engine::Machine;
use crate::radio::{DeviceId, Occurrence, Peripheral, RadioManager, RadioPower, ServiceId};
use crate::store::{AttachedStore, MemoryStore};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Peripheral count a scan/connect phase waits for before it is
/// considered complete.
const DEFAULT_EXPECTED_PERIPHERALS: usize = 5;

const STATUS_CHANNEL_CAPACITY: usize = 16;

/// Commands processed by the worker, in arrival order.
#[derive(Debug)]
pub(crate) enum Command {
    Attach {
        service: ServiceId,
        force_scan: bool,
    },
    Deliver(Occurrence),
    Fire(AttachEvent),
    Shutdown,
}

#[cfg(test)]
impl Command {
    pub(crate) fn into_fired_event(self) -> Option<AttachEvent> {
        match self {
            Command::Fire(event) => Some(event),
            _ => None,
        }
    }
}

/// The service currently being sought, plus attachment status. Reset at
/// the start of each attach request.
#[derive(Clone, Debug, Default)]
pub(crate) struct AttachmentTarget {
    pub(crate) service: Option<ServiceId>,
    pub(crate) attached: bool,
}

/// Mutable context the machine's effects operate on. Lives inside the
/// worker; nothing else writes to it.
pub(crate) struct Context {
    pub(crate) radio: Option<Arc<dyn RadioManager>>,
    pub(crate) store: Arc<dyn AttachedStore>,
    pub(crate) target: AttachmentTarget,
    /// Peripherals discovered by the current scan or loaded by the
    /// current retrieve.
    pub(crate) roster: Vec<Peripheral>,
    pub(crate) connected: Vec<DeviceId>,
    pub(crate) expected: usize,
    pub(crate) status: broadcast::Sender<Status>,
    pub(crate) commands: mpsc::UnboundedSender<Command>,
}

impl Context {
    fn begin_attach(&mut self, service: ServiceId) {
        self.target = AttachmentTarget {
            service: Some(service),
            attached: false,
        };
        self.roster.clear();
        self.connected.clear();
    }

    /// Route an event back through the command queue, behind anything
    /// already enqueued.
    pub(crate) fn requeue(&self, event: AttachEvent) {
        if self.commands.send(Command::Fire(event)).is_err() {
            tracing::warn!("command queue closed, dropping requeued event");
        }
    }

    pub(crate) fn publish(&self, status: Status) {
        tracing::debug!(?status, "publishing status");
        // Best-effort fan-out; an Err only means nobody is subscribed.
        let _ = self.status.send(status);
    }

    /// Map a hardware occurrence to a machine event, updating roster and
    /// counters. Partial discovery/connect counts below the expected
    /// threshold produce no event.
    fn absorb(&mut self, occurrence: Occurrence) -> Option<AttachEvent> {
        match occurrence {
            Occurrence::PowerChanged(power) => {
                let (status, event) = match power {
                    RadioPower::On => (Status::Online, AttachEvent::RadioOnline),
                    RadioPower::Off
                    | RadioPower::Resetting
                    | RadioPower::Unauthorized
                    | RadioPower::Unsupported => (Status::Offline, AttachEvent::RadioOffline),
                };
                self.publish(status);
                Some(event)
            }
            Occurrence::Discovered(peripheral) => {
                tracing::debug!(device = %peripheral.id, "peripheral discovered");
                self.roster.push(peripheral);
                if self.roster.len() == self.expected {
                    if let Some(radio) = self.radio.as_ref() {
                        if let Err(error) = radio.stop_scan() {
                            tracing::warn!(%error, "failed to stop scan");
                        }
                    }
                    Some(AttachEvent::ScanSucceeded)
                } else {
                    None
                }
            }
            Occurrence::Connected(device) => {
                tracing::debug!(device = %device, "peripheral connected");
                self.connected.push(device);
                if self.connected.len() == self.expected {
                    Some(AttachEvent::ConnectSucceeded)
                } else {
                    None
                }
            }
            Occurrence::ConnectAttemptFailed { device, error } => {
                tracing::warn!(device = %device, %error, "connect attempt failed");
                Some(AttachEvent::ConnectFailed)
            }
            Occurrence::Disconnected {
                device,
                error: None,
            } => {
                tracing::info!(device = %device, "peripheral disconnected");
                Some(AttachEvent::Disconnected)
            }
            Occurrence::Disconnected {
                device,
                error: Some(error),
            } => {
                tracing::warn!(device = %device, %error, "peripheral disconnected with error");
                Some(AttachEvent::DisconnectedWithError)
            }
        }
    }
}

/// Builder for a [`Coordinator`].
///
/// The radio manager is optional by design: effects that need it fail
/// with a missing-dependency error and the machine falls back, rather
/// than construction being refused.
pub struct CoordinatorBuilder {
    radio: Option<Arc<dyn RadioManager>>,
    store: Option<Arc<dyn AttachedStore>>,
    expected_peripherals: usize,
}

impl CoordinatorBuilder {
    fn new() -> Self {
        Self {
            radio: None,
            store: None,
            expected_peripherals: DEFAULT_EXPECTED_PERIPHERALS,
        }
    }

    /// Inject the radio manager collaborator.
    pub fn radio(mut self, radio: Arc<dyn RadioManager>) -> Self {
        self.radio = Some(radio);
        self
    }

    /// Inject the persistence collaborator. Defaults to an in-memory
    /// store.
    pub fn store(mut self, store: Arc<dyn AttachedStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the peripheral count that completes a scan or connect phase.
    pub fn expected_peripherals(mut self, count: usize) -> Self {
        self.expected_peripherals = count;
        self
    }

    /// Build the tables and spawn the worker task. Must be called within
    /// a tokio runtime.
    pub fn spawn(self) -> Result<Coordinator, BuildError> {
        let machine = tables::attach_machine()?;
        let (commands, queue) = mpsc::unbounded_channel();
        let (status, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        let ctx = Context {
            radio: self.radio,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryStore::new())),
            target: AttachmentTarget::default(),
            roster: Vec::new(),
            connected: Vec::new(),
            expected: self.expected_peripherals,
            status: status.clone(),
            commands: commands.clone(),
        };
        let worker = tokio::spawn(run_worker(queue, machine, ctx));
        Ok(Coordinator {
            commands,
            status,
            worker,
        })
    }
}

/// Handle radio managers use to deliver occurrences. Cloneable and safe
/// to call from any thread; delivery is fire-and-forget.
#[derive(Clone)]
pub struct OccurrenceSink {
    commands: mpsc::UnboundedSender<Command>,
}

impl OccurrenceSink {
    pub fn deliver(&self, occurrence: Occurrence) {
        if self.commands.send(Command::Deliver(occurrence)).is_err() {
            tracing::warn!("command queue closed, dropping occurrence");
        }
    }
}

/// Owner of the attachment machine.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tether::{Coordinator, MemoryStore, ServiceId};
///
/// # async fn demo() -> Result<(), tether::BuildError> {
/// let coordinator = Coordinator::builder()
///     .store(Arc::new(MemoryStore::new()))
///     .expected_peripherals(2)
///     .spawn()?;
///
/// let _status = coordinator.subscribe();
/// coordinator.attach(ServiceId::random(), false);
/// # Ok(())
/// # }
/// ```
pub struct Coordinator {
    commands: mpsc::UnboundedSender<Command>,
    status: broadcast::Sender<Status>,
    worker: JoinHandle<()>,
}

impl Coordinator {
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    /// Request attachment to `service`. Fire-and-forget: the target is
    /// reset and a `Scan` or `Retrieve` event is queued; the outcome is
    /// observable only through the status stream.
    pub fn attach(&self, service: ServiceId, force_scan: bool) {
        tracing::info!(service = %service, force_scan, "attach requested");
        let _ = self.commands.send(Command::Attach {
            service,
            force_scan,
        });
    }

    /// Register a status observer.
    pub fn subscribe(&self) -> broadcast::Receiver<Status> {
        self.status.subscribe()
    }

    /// Handle for radio managers to deliver occurrences through.
    pub fn sink(&self) -> OccurrenceSink {
        OccurrenceSink {
            commands: self.commands.clone(),
        }
    }

    /// Process everything already queued, then stop the worker.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        let _ = self.worker.await;
    }
}

async fn run_worker(
    mut queue: mpsc::UnboundedReceiver<Command>,
    machine: Machine<AttachState, AttachEvent, Context>,
    mut ctx: Context,
) {
    while let Some(command) = queue.recv().await {
        match command {
            Command::Attach {
                service,
                force_scan,
            } => {
                ctx.begin_attach(service);
                let event = if force_scan {
                    AttachEvent::Scan
                } else {
                    AttachEvent::Retrieve
                };
                machine.handle_event(event, &mut ctx);
            }
            Command::Deliver(occurrence) => {
                if let Some(event) = ctx.absorb(occurrence) {
                    machine.handle_event(event, &mut ctx);
                }
            }
            Command::Fire(event) => {
                machine.handle_event(event, &mut ctx);
            }
            Command::Shutdown => break,
        }
    }
    tracing::debug!("coordinator worker stopped");
}
