// The message channel: one background task owning the duplex transport,
// with a thin cloneable-state handle on the caller's side.
//
// The task parses inbound frames into typed events and fans each one out
// to the handlers registered for its exact kind and then to the wildcard
// handlers. A malformed frame is logged and dropped; it never tears down
// the channel. On transport loss the task walks the reconnection state
// machine: idle -> connecting -> connected -> backoff -> connecting ...
// -> exhausted, with a linear backoff (attempt x base delay) and a hard
// attempt cap. Past the cap the channel parks in `Exhausted` and schedules
// nothing further; the owner must build a fresh channel to recover.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::events::{ChannelEvent, EventKind, OutboundEvent};
use crate::transport::{Dial, Transport};

/// Default base delay between reconnection attempts.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default cap on reconnection attempts.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Backoff grows linearly: attempt number x this delay.
    pub base_delay: Duration,
    /// Failed attempts tolerated before the channel gives up.
    pub max_attempts: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { base_delay: DEFAULT_BASE_DELAY, max_attempts: DEFAULT_MAX_ATTEMPTS }
    }
}

/// Observable state of the connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Connecting,
    Connected,
    /// Waiting out the backoff before retry number `.0`.
    Backoff(u32),
    /// Retry cap hit; no further attempt will be scheduled.
    Exhausted,
}

/// Token returned by [`MessageChannel::on`], used to deregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Box<dyn Fn(&ChannelEvent) + Send>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<(HandlerId, Handler)>>,
}

impl Registry {
    fn register(&mut self, kind: EventKind, handler: Handler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.entry(kind).or_default().push((id, handler));
        id
    }

    fn deregister(&mut self, kind: EventKind, id: HandlerId) -> bool {
        let Some(list) = self.handlers.get_mut(&kind) else { return false };
        let before = list.len();
        list.retain(|(hid, _)| *hid != id);
        before != list.len()
    }

    fn clear(&mut self) {
        self.handlers.clear();
    }
}

/// Handle to one duplex channel. Owns nothing global: build one per
/// session and tear it down on session exit. Opening a replacement while
/// one is live requires disconnecting the old handle first, otherwise
/// events are delivered twice.
pub struct MessageChannel {
    outbound: mpsc::UnboundedSender<OutboundEvent>,
    registry: Arc<Mutex<Registry>>,
    state: watch::Receiver<LinkState>,
    shutdown: watch::Sender<bool>,
}

impl MessageChannel {
    /// Open the channel. Spawns the transport task; if `session` is given,
    /// a `join_game` event is emitted as soon as the transport opens (and
    /// again after every reconnect).
    pub fn connect<D: Dial>(dialer: D, config: ChannelConfig, session: Option<Uuid>) -> Self {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(LinkState::Idle);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let registry = Arc::new(Mutex::new(Registry::default()));

        tokio::spawn(run_link(
            dialer,
            config,
            session,
            out_rx,
            state_tx,
            shutdown_rx,
            Arc::clone(&registry),
        ));

        Self { outbound: out_tx, registry, state: state_rx, shutdown: shutdown_tx }
    }

    /// Queue an event for transmission. Events queued while the link is
    /// down are flushed in order once it is re-established.
    pub fn send(&self, event: OutboundEvent) {
        if self.outbound.send(event).is_err() {
            debug!("send after channel task ended; event dropped");
        }
    }

    /// Register a handler for `kind`. Use [`EventKind::Any`] to receive
    /// every inbound event.
    pub fn on(&self, kind: EventKind, handler: impl Fn(&ChannelEvent) + Send + 'static) -> HandlerId {
        lock_registry(&self.registry).register(kind, Box::new(handler))
    }

    /// Register a wildcard handler receiving every inbound event.
    pub fn on_any(&self, handler: impl Fn(&ChannelEvent) + Send + 'static) -> HandlerId {
        self.on(EventKind::Any, handler)
    }

    /// Remove a handler previously registered under `kind`. Returns false
    /// if it was already gone.
    pub fn off(&self, kind: EventKind, id: HandlerId) -> bool {
        lock_registry(&self.registry).deregister(kind, id)
    }

    /// Close the transport and clear every handler registration. Safe to
    /// call repeatedly.
    pub fn disconnect(&self) {
        let _ = self.shutdown.send(true);
        lock_registry(&self.registry).clear();
    }

    pub fn is_connected(&self) -> bool {
        *self.state.borrow() == LinkState::Connected
    }

    /// Watch the connection state machine, e.g. to surface exhaustion.
    pub fn link_state(&self) -> watch::Receiver<LinkState> {
        self.state.clone()
    }
}

impl Drop for MessageChannel {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

// A poisoned registry lock only means a handler panicked mid-dispatch;
// the registration table itself is still usable.
fn lock_registry(registry: &Mutex<Registry>) -> std::sync::MutexGuard<'_, Registry> {
    match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

enum LinkLoss {
    Shutdown,
    Lost,
}

async fn run_link<D: Dial>(
    mut dialer: D,
    config: ChannelConfig,
    session: Option<Uuid>,
    mut outbound: mpsc::UnboundedReceiver<OutboundEvent>,
    state: watch::Sender<LinkState>,
    mut shutdown: watch::Receiver<bool>,
    registry: Arc<Mutex<Registry>>,
) {
    let mut attempt: u32 = 0;
    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        let _ = state.send(LinkState::Connecting);

        let dialed = tokio::select! {
            conn = dialer.dial() => conn,
            _ = shutdown.changed() => break,
        };

        match dialed {
            Ok(mut conn) => {
                attempt = 0;
                let _ = state.send(LinkState::Connected);
                info!("channel connected");

                let loss = serve(
                    &mut conn,
                    session,
                    &mut outbound,
                    &mut shutdown,
                    &registry,
                )
                .await;
                match loss {
                    LinkLoss::Shutdown => break,
                    LinkLoss::Lost => {}
                }
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "dial failed");
            }
        }

        attempt += 1;
        if attempt > config.max_attempts {
            error!(attempts = config.max_attempts, "reconnection attempts exhausted");
            let _ = state.send(LinkState::Exhausted);
            return;
        }
        let delay = config.base_delay * attempt;
        debug!(attempt, ?delay, "reconnecting after backoff");
        let _ = state.send(LinkState::Backoff(attempt));
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
    }
    let _ = state.send(LinkState::Idle);
}

/// Drive one live connection until shutdown or transport loss.
async fn serve<T: Transport>(
    conn: &mut T,
    session: Option<Uuid>,
    outbound: &mut mpsc::UnboundedReceiver<OutboundEvent>,
    shutdown: &mut watch::Receiver<bool>,
    registry: &Mutex<Registry>,
) -> LinkLoss {
    if let Some(session_id) = session {
        let join = OutboundEvent::JoinGame { session_id };
        if let Err(err) = send_event(conn, &join).await {
            warn!(error = %format!("{err:#}"), "failed to announce session join");
            return LinkLoss::Lost;
        }
    }

    loop {
        if *shutdown.borrow_and_update() {
            return LinkLoss::Shutdown;
        }
        tokio::select! {
            biased;
            _ = shutdown.changed() => return LinkLoss::Shutdown,
            event = outbound.recv() => match event {
                Some(event) => {
                    if let Err(err) = send_event(conn, &event).await {
                        warn!(error = %format!("{err:#}"), "send failed; reconnecting");
                        return LinkLoss::Lost;
                    }
                }
                // every handle dropped; nothing left to serve
                None => return LinkLoss::Shutdown,
            },
            frame = conn.recv() => match frame {
                Ok(Some(line)) => dispatch(registry, &line),
                Ok(None) => {
                    info!("peer closed the channel");
                    return LinkLoss::Lost;
                }
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "transport error");
                    return LinkLoss::Lost;
                }
            },
        }
    }
}

async fn send_event<T: Transport>(conn: &mut T, event: &OutboundEvent) -> anyhow::Result<()> {
    let frame = serde_json::to_string(event)?;
    conn.send(&frame).await
}

/// Parse one frame and fan it out. Handler panics are isolated so one
/// failing handler cannot block delivery to the rest.
fn dispatch(registry: &Mutex<Registry>, line: &str) {
    let event: ChannelEvent = match serde_json::from_str(line) {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "dropping malformed frame");
            return;
        }
    };

    let guard = lock_registry(registry);
    for kind in [event.kind(), EventKind::Any] {
        let Some(handlers) = guard.handlers.get(&kind) else { continue };
        for (id, handler) in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                error!(?id, ?kind, "event handler panicked");
            }
        }
    }
}
