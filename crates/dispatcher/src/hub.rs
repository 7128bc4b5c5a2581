//! Dispatch hub - single-writer client registry and broadcast loop
//!
//! The hub task is the only owner of the registry. Connection handlers talk
//! to it through a [`HubHandle`]: registration goes over a rendezvous-style
//! queue and is acknowledged once the client is in the registry, removal
//! goes over a large queue so it never blocks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use contracts::{Command, DeliveryPolicy, HubConfig, Item};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::DispatcherError;
use crate::handle::StoreSender;
use crate::metrics::HubMetrics;

/// Client identity inside the hub
pub type ClientId = u64;

/// Registration request: the hub-side end of a client queue
struct ClientEntry {
    id: ClientId,
    tx: mpsc::Sender<Item>,
}

struct Registration {
    client: ClientEntry,
    ack: oneshot::Sender<()>,
}

/// Why a client left the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoveReason {
    /// Handler asked for removal
    Requested,
    /// Client queue receiver dropped
    Closed,
    /// Queue full under `DisconnectOnFull`
    QueueFull,
}

impl RemoveReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Closed => "closed",
            Self::QueueFull => "queue_full",
        }
    }
}

/// The receiving side of a registered client
///
/// Yields every item the hub broadcasts after registration, in hub order.
/// `recv` returns `None` once the hub drops the client (shutdown or
/// disconnect-on-full).
#[derive(Debug)]
pub struct Subscription {
    id: ClientId,
    rx: mpsc::Receiver<Item>,
}

impl Subscription {
    /// Client id
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Wait for the next item
    pub async fn recv(&mut self) -> Option<Item> {
        self.rx.recv().await
    }
}

/// Cloneable handle for registering and removing clients
#[derive(Clone)]
pub struct HubHandle {
    register_tx: mpsc::Sender<Registration>,
    unregister_tx: mpsc::Sender<ClientId>,
    next_id: Arc<AtomicU64>,
    client_queue_capacity: usize,
    register_timeout: Option<Duration>,
    metrics: Arc<HubMetrics>,
}

impl HubHandle {
    /// Register a new client
    ///
    /// Returns once the client is in the registry: every item the hub
    /// processes afterwards is delivered to it, nothing before.
    ///
    /// # Errors
    /// - [`DispatcherError::RegistrationClosed`] if the hub has stopped
    /// - [`DispatcherError::RegistrationTimeout`] if `register_timeout_ms`
    ///   elapsed first; the hub then discards the request
    pub async fn register(&self) -> Result<Subscription, DispatcherError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.client_queue_capacity);
        let (ack_tx, ack_rx) = oneshot::channel();

        let request = Registration {
            client: ClientEntry { id, tx },
            ack: ack_tx,
        };

        let handshake = async {
            self.register_tx
                .send(request)
                .await
                .map_err(|_| DispatcherError::RegistrationClosed)?;
            ack_rx.await.map_err(|_| DispatcherError::RegistrationClosed)
        };

        match self.register_timeout {
            Some(limit) => tokio::time::timeout(limit, handshake).await.map_err(|_| {
                DispatcherError::RegistrationTimeout {
                    timeout_ms: limit.as_millis() as u64,
                }
            })??,
            None => handshake.await?,
        }

        Ok(Subscription { id, rx })
    }

    /// Ask the hub to remove a client
    ///
    /// Idempotent: removing an absent client is a no-op.
    pub async fn unregister(&self, id: ClientId) {
        if self.unregister_tx.send(id).await.is_err() {
            debug!(client_id = id, "hub stopped, unregister ignored");
        }
    }

    /// Clients currently in the registry
    pub fn client_count(&self) -> usize {
        self.metrics.client_count()
    }

    /// Hub metrics
    pub fn metrics(&self) -> Arc<HubMetrics> {
        Arc::clone(&self.metrics)
    }
}

/// Dispatch hub
pub struct Hub {
    policy: DeliveryPolicy,
    clients: Vec<ClientEntry>,
    input: Receiver<Item>,
    register_rx: mpsc::Receiver<Registration>,
    unregister_rx: mpsc::Receiver<ClientId>,
    store: StoreSender,
    metrics: Arc<HubMetrics>,
}

impl Hub {
    /// Create a hub consuming `input` and forwarding to `store`
    pub fn new(config: &HubConfig, input: Receiver<Item>, store: StoreSender) -> (Self, HubHandle) {
        // Registration queue of one: registering backpressures the caller
        let (register_tx, register_rx) = mpsc::channel(1);
        let (unregister_tx, unregister_rx) = mpsc::channel(config.unregister_capacity.max(1));
        let metrics = Arc::new(HubMetrics::new());

        let register_timeout = match config.register_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        let handle = HubHandle {
            register_tx,
            unregister_tx,
            next_id: Arc::new(AtomicU64::new(1)),
            client_queue_capacity: config.client_queue_capacity.max(1),
            register_timeout,
            metrics: Arc::clone(&metrics),
        };

        let hub = Self {
            policy: config.delivery_policy,
            clients: Vec::new(),
            input,
            register_rx,
            unregister_rx,
            store,
            metrics,
        };

        (hub, handle)
    }

    /// Spawn the hub loop
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Run until cancelled or the input stream closes
    ///
    /// On exit every client queue is dropped (their subscriptions end) and
    /// the store sender is released so the store worker can drain.
    #[instrument(name = "hub_loop", skip_all, fields(policy = ?self.policy))]
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("hub started");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                Some(id) = self.unregister_rx.recv() => {
                    self.remove(id, RemoveReason::Requested);
                }

                Some(registration) = self.register_rx.recv() => {
                    self.register(registration);
                }

                item = self.input.recv() => match item {
                    Ok(item) => {
                        if !self.dispatch(item, &cancel).await {
                            break;
                        }
                    }
                    Err(_) => {
                        info!("input stream closed");
                        break;
                    }
                },
            }
        }

        let remaining = self.clients.len();
        self.clients.clear();
        self.metrics.set_client_count(0);
        info!(clients = remaining, stats = ?self.metrics.snapshot(), "hub stopped");
    }

    fn register(&mut self, registration: Registration) {
        let Registration { client, ack } = registration;

        // Caller gave up (timeout): do not add a client nobody reads
        if ack.send(()).is_err() {
            debug!(client_id = client.id, "registration abandoned");
            return;
        }

        self.clients.push(client);
        self.metrics.inc_registered();
        self.metrics.set_client_count(self.clients.len());
        observability::record_client_registered();
        info!(clients = self.clients.len(), "client registered");
    }

    fn remove(&mut self, id: ClientId, reason: RemoveReason) {
        let before = self.clients.len();
        self.clients.retain(|c| c.id != id);
        if self.clients.len() == before {
            trace!(client_id = id, "client already removed");
            return;
        }

        self.metrics.inc_unregistered();
        self.metrics.set_client_count(self.clients.len());
        observability::record_client_unregistered(reason.as_str());
        info!(
            client_id = id,
            reason = reason.as_str(),
            clients = self.clients.len(),
            "client removed"
        );
    }

    /// Broadcast to every client in registry order, then forward to the store
    ///
    /// Returns false when the hub should stop.
    async fn dispatch(&mut self, item: Item, cancel: &CancellationToken) -> bool {
        let mut gone = Vec::new();

        for client in &self.clients {
            match self.policy {
                DeliveryPolicy::Block => {
                    tokio::select! {
                        sent = client.tx.send(item.clone()) => match sent {
                            Ok(()) => self.metrics.inc_deliveries(),
                            Err(_) => gone.push((client.id, RemoveReason::Closed)),
                        },
                        _ = cancel.cancelled() => return false,
                    }
                }
                DeliveryPolicy::DropNewest | DeliveryPolicy::DisconnectOnFull => {
                    match client.tx.try_send(item.clone()) {
                        Ok(()) => self.metrics.inc_deliveries(),
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            if self.policy == DeliveryPolicy::DropNewest {
                                self.metrics.inc_deliveries_dropped();
                                observability::record_delivery_dropped("drop_newest");
                                trace!(client_id = client.id, "client queue full, item dropped");
                            } else {
                                observability::record_delivery_dropped("disconnect_on_full");
                                warn!(client_id = client.id, "client queue full, disconnecting");
                                gone.push((client.id, RemoveReason::QueueFull));
                            }
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            gone.push((client.id, RemoveReason::Closed));
                        }
                    }
                }
            }
        }

        self.metrics.inc_items_broadcast();
        observability::record_item_broadcast(self.clients.len(), item.is_command());

        for (id, reason) in gone {
            self.remove(id, reason);
        }

        let rollover = item.as_command() == Some(Command::flush());

        tokio::select! {
            biased;

            forwarded = self.store.append(item) => {
                if let Err(e) = forwarded {
                    warn!(error = %e, "store unavailable, item not persisted");
                }
            }
            _ = cancel.cancelled() => return false,
        }

        // The reset follows the flush on the same queue, after every earlier event
        if rollover {
            tokio::select! {
                biased;

                reset = self.store.reset() => {
                    if let Err(e) = reset {
                        warn!(error = %e, "store unavailable, reset skipped");
                    }
                }
                _ = cancel.cancelled() => return false,
            }
        }

        true
    }
}
