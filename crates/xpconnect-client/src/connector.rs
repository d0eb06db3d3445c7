//! X-Plane connector
//!
//! Owns the UDP socket and the subscription registry and runs two loops
//! while started:
//! - the receive loop decodes inbound RREF packets and dispatches values
//! - the request loop periodically re-requests every stale subscription
//!
//! The protocol has no acknowledgements, so liveness is entirely driven by
//! re-requesting datarefs that have not been updated within `max_age`.

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use xpconnect_core::{
    codec, Clock, DataRefElement, DataRefValue, Message, Registry, StringDataRefElement,
    SystemClock,
};

use crate::builder::XPlaneConnectorBuilder;
use crate::command::{self, Command, CommandHandle};
use crate::config::ConnectorConfig;
use crate::error::{ClientError, Result};
use crate::transport::{DatagramSink, UdpTransport};

/// Raw datagram observer
pub type RawListener = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Called with each element after a decoded value has been applied
pub type ReceiveListener = Arc<dyn Fn(&DataRefElement) + Send + Sync>;

/// Called with errors the receive loop reports without stopping
pub type ErrorListener = Arc<dyn Fn(&ClientError) + Send + Sync>;

/// Connector lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorState {
    Idle,
    Running,
    Stopping,
}

#[derive(Default)]
struct Hooks {
    raw: RwLock<Vec<RawListener>>,
    received: RwLock<Vec<ReceiveListener>>,
    errors: RwLock<Vec<ErrorListener>>,
}

/// State shared with the background loops
struct Shared {
    registry: Registry,
    clock: Arc<dyn Clock>,
    hooks: Hooks,
    last_receive: Mutex<Option<(Instant, Bytes)>>,
    max_age: Duration,
    strict_decode: bool,
}

impl Shared {
    /// Decode one inbound datagram and dispatch its values
    ///
    /// Returns how many values were applied (0 for ignored packets).
    fn handle_datagram(&self, data: &[u8]) -> Result<usize> {
        let now = self.clock.now();
        *self.last_receive.lock() = Some((now, Bytes::copy_from_slice(data)));

        let raw: Vec<RawListener> = self.hooks.raw.read().clone();
        for hook in raw {
            hook(data);
        }

        let Some(values) = codec::decode_values(data) else {
            return Ok(0);
        };

        let received: Vec<ReceiveListener> = self.hooks.received.read().clone();
        let applied = self.registry.apply(&values.updates, now, |element| {
            for hook in &received {
                hook(element);
            }
        })?;

        // Complete pairs stay applied even when the tail is cut short
        values.check_complete()?;
        Ok(applied)
    }

    fn report(&self, err: &ClientError) {
        let hooks: Vec<ErrorListener> = self.hooks.errors.read().clone();
        for hook in hooks {
            hook(err);
        }
    }

    /// Send a fresh request for every stale element
    async fn request_stale(&self, sink: &dyn DatagramSink) -> Result<usize> {
        let stale = self.registry.stale(self.clock.now(), self.max_age);
        for element in &stale {
            debug!(
                "requesting {} (id: {}, {} Hz)",
                element.path(),
                element.id(),
                element.frequency()
            );
            let datagram = codec::encode(&Message::Request {
                frequency: element.frequency(),
                id: element.id(),
                path: element.path().to_string(),
            })?;
            sink.send(datagram).await?;
        }
        Ok(stale.len())
    }
}

/// Signals for one started session
struct Session {
    shutdown: Arc<watch::Sender<bool>>,
    finished: watch::Receiver<bool>,
}

/// Client for the X-Plane UDP dataref protocol
pub struct XPlaneConnector {
    config: ConnectorConfig,
    remote: SocketAddr,
    shared: Arc<Shared>,
    state: RwLock<ConnectorState>,
    sink: RwLock<Option<Arc<dyn DatagramSink>>>,
    local_addr: RwLock<Option<SocketAddr>>,
    session: Mutex<Option<Session>>,
}

impl XPlaneConnector {
    /// Create a connector with the wall clock
    pub fn new(config: ConnectorConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a connector measuring staleness against `clock`
    pub fn with_clock(config: ConnectorConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let remote = config.remote_addr()?;

        Ok(Self {
            shared: Arc::new(Shared {
                registry: Registry::new(),
                clock,
                hooks: Hooks::default(),
                last_receive: Mutex::new(None),
                max_age: config.max_age,
                strict_decode: config.strict_decode,
            }),
            config,
            remote,
            state: RwLock::new(ConnectorState::Idle),
            sink: RwLock::new(None),
            local_addr: RwLock::new(None),
            session: Mutex::new(None),
        })
    }

    /// Create a builder
    pub fn builder() -> XPlaneConnectorBuilder {
        XPlaneConnectorBuilder::new()
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Simulator endpoint
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    /// Local socket address while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read()
    }

    pub fn state(&self) -> ConnectorState {
        *self.state.read()
    }

    pub fn is_running(&self) -> bool {
        self.state() == ConnectorState::Running
    }

    /// Live subscriptions
    pub fn registry(&self) -> &Registry {
        &self.shared.registry
    }

    /// When the last datagram arrived
    pub fn last_receive(&self) -> Option<Instant> {
        self.shared.last_receive.lock().as_ref().map(|(at, _)| *at)
    }

    /// Bytes of the last datagram received
    pub fn last_buffer(&self) -> Option<Bytes> {
        self.shared
            .last_receive
            .lock()
            .as_ref()
            .map(|(_, buf)| buf.clone())
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Open the socket and run both loops until stopped
    ///
    /// Resolves once both loops have finished: `Ok` after [`stop`](Self::stop),
    /// or the first fatal error (socket failure, or an unknown id with
    /// `strict_decode`).
    pub async fn start(&self) -> Result<()> {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let shutdown = Arc::new(shutdown);
        let (finished_tx, finished) = watch::channel(false);

        // A Running state always has a session, including while binding
        {
            let mut state = self.state.write();
            if *state != ConnectorState::Idle {
                return Err(ClientError::AlreadyRunning);
            }
            *state = ConnectorState::Running;
            *self.session.lock() = Some(Session {
                shutdown: shutdown.clone(),
                finished,
            });
        }

        let transport = match UdpTransport::bind(&self.config.bind_addr).await {
            Ok(transport) => transport,
            Err(e) => {
                error!("failed to bind {}: {}", self.config.bind_addr, e);
                self.session.lock().take();
                *self.state.write() = ConnectorState::Idle;
                finished_tx.send_replace(true);
                return Err(e);
            }
        };

        let sink: Arc<dyn DatagramSink> = Arc::new(transport.sender_to(self.remote));
        *self.sink.write() = Some(sink.clone());
        *self.local_addr.write() = transport.local_addr().ok();

        info!("Connector started, simulator at {}", self.remote);

        let receiver = tokio::spawn(receive_loop(
            transport.socket(),
            self.shared.clone(),
            shutdown_rx.clone(),
            self.config.recv_buffer_size,
        ));
        let requester = tokio::spawn(request_loop(
            self.shared.clone(),
            sink,
            shutdown_rx,
            self.config.check_interval,
        ));

        let result = join_loops(receiver, requester, &shutdown).await;

        // Release the socket
        *self.sink.write() = None;
        *self.local_addr.write() = None;
        self.session.lock().take();
        *self.state.write() = ConnectorState::Idle;
        finished_tx.send_replace(true);

        match &result {
            Ok(()) => info!("Connector stopped"),
            Err(e) => error!("Connector terminated: {}", e),
        }
        result
    }

    /// Unsubscribe everything, cancel both loops and wait up to `timeout`
    ///
    /// Fails with [`ClientError::ShutdownTimeout`] if the loops are still
    /// running when the timeout elapses; they are not forcibly aborted and a
    /// later `stop` can wait again.
    pub async fn stop(&self, timeout: Duration) -> Result<()> {
        let (shutdown, mut finished) = match self.session.lock().as_ref() {
            Some(session) => (session.shutdown.clone(), session.finished.clone()),
            None => return Err(ClientError::NotReady("stop")),
        };

        {
            let mut state = self.state.write();
            if *state == ConnectorState::Running {
                *state = ConnectorState::Stopping;
            }
        }

        // Best effort: the simulator keeps streaming otherwise
        for element in self.shared.registry.elements() {
            if let Err(e) = self.unsubscribe(element.path()).await {
                warn!("failed to unsubscribe {}: {}", element.path(), e);
            }
        }

        shutdown.send_replace(true);

        // A closed channel also means start() has returned
        let waited = tokio::time::timeout(timeout, finished.wait_for(|done| *done))
            .await
            .map(|_| ());

        match waited {
            Ok(()) => Ok(()),
            Err(_) => {
                error!("loops did not stop within {:?}", timeout);
                Err(ClientError::ShutdownTimeout { timeout })
            }
        }
    }

    // ------------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------------

    /// Subscribe a caller-built element
    ///
    /// A positive `frequency` overrides the element's own. The request goes
    /// out on the next staleness scan.
    pub fn subscribe<F>(&self, element: Arc<DataRefElement>, frequency: i32, on_change: F) -> Result<()>
    where
        F: Fn(&DataRefElement, f32) + Send + Sync + 'static,
    {
        self.shared
            .registry
            .subscribe(element, frequency, Some(on_change))?;
        Ok(())
    }

    /// Subscribe by dataref path; a fresh id is allocated
    pub fn subscribe_path<F>(&self, path: &str, frequency: i32, on_change: F) -> Result<Arc<DataRefElement>>
    where
        F: Fn(&DataRefElement, f32) + Send + Sync + 'static,
    {
        if path.is_empty() {
            return Err(ClientError::InvalidArgument(
                "subscribe: dataref path is empty".to_string(),
            ));
        }
        let element = Arc::new(DataRefElement::new(
            self.shared.registry.allocate_id(),
            path,
        ));
        self.subscribe(element.clone(), frequency, on_change)?;
        Ok(element)
    }

    /// Subscribe a string dataref, one scalar subscription per character
    ///
    /// `on_change` fires on every character update with the current text.
    pub fn subscribe_string<F>(
        &self,
        element: Arc<StringDataRefElement>,
        frequency: i32,
        on_change: F,
    ) -> Result<()>
    where
        F: Fn(&StringDataRefElement, &str) + Send + Sync + 'static,
    {
        let children = self.shared.registry.subscribe_string(element.clone(), frequency)?;
        element.on_change(on_change);
        debug!("subscribed string {} as {} elements", element.path(), children.len());
        Ok(())
    }

    /// Subscribe a string dataref of `buffer_size` characters by path
    pub fn subscribe_string_path<F>(
        &self,
        path: &str,
        frequency: i32,
        buffer_size: usize,
        on_change: F,
    ) -> Result<Arc<StringDataRefElement>>
    where
        F: Fn(&StringDataRefElement, &str) + Send + Sync + 'static,
    {
        if path.is_empty() {
            return Err(ClientError::InvalidArgument(
                "subscribe: dataref path is empty".to_string(),
            ));
        }
        let element = Arc::new(StringDataRefElement::new(path, buffer_size));
        self.subscribe_string(element.clone(), frequency, on_change)?;
        Ok(element)
    }

    /// Stop streaming the element subscribed under `path` and forget it
    ///
    /// Without an open socket only the registration is removed.
    pub async fn unsubscribe(&self, path: &str) -> Result<()> {
        let element = self.shared.registry.unsubscribe(path)?;

        let sink = self.sink.read().clone();
        match sink {
            Some(sink) => {
                let datagram = codec::encode(&Message::stop_request(element.id(), path))?;
                sink.send(datagram).await?;
                debug!("stop request sent for {} (id: {})", path, element.id());
            }
            None => debug!("no socket open, {} removed locally only", path),
        }
        Ok(())
    }

    /// Unsubscribe every character element of a string dataref
    pub async fn unsubscribe_string(&self, element: &StringDataRefElement) -> Result<()> {
        for offset in 0..element.len() {
            self.unsubscribe(&element.char_path(offset)).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Hooks
    // ------------------------------------------------------------------------

    /// Observe every inbound datagram before it is decoded
    pub fn on_raw_receive<F>(&self, listener: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.shared.hooks.raw.write().push(Arc::new(listener));
    }

    /// Observe every element right after a value was applied to it
    pub fn on_dataref_received<F>(&self, listener: F)
    where
        F: Fn(&DataRefElement) + Send + Sync + 'static,
    {
        self.shared.hooks.received.write().push(Arc::new(listener));
    }

    /// Observe errors the receive loop reports without stopping
    pub fn on_protocol_error<F>(&self, listener: F)
    where
        F: Fn(&ClientError) + Send + Sync + 'static,
    {
        self.shared.hooks.errors.write().push(Arc::new(listener));
    }

    // ------------------------------------------------------------------------
    // One-shot sends
    // ------------------------------------------------------------------------

    async fn send_message(&self, operation: &'static str, message: &Message) -> Result<()> {
        let sink = self
            .sink
            .read()
            .clone()
            .ok_or(ClientError::NotReady(operation))?;
        let datagram = codec::encode(message)?;
        sink.send(datagram).await
    }

    /// Set a dataref to a numeric or string value
    pub async fn set_dataref_value(&self, path: &str, value: impl Into<DataRefValue>) -> Result<()> {
        if path.is_empty() {
            return Err(ClientError::InvalidArgument(
                "set value: dataref path is empty".to_string(),
            ));
        }
        let value = value.into();
        debug!("setting {} = {:?}", path, value);
        self.send_message(
            "set_dataref_value",
            &Message::SetValue {
                path: path.to_string(),
                value,
            },
        )
        .await
    }

    /// Set the dataref an element refers to
    pub async fn set_element_value(&self, element: &DataRefElement, value: f32) -> Result<()> {
        self.set_dataref_value(element.path(), value).await
    }

    /// Issue a command once
    pub async fn send_command(&self, command: &Command) -> Result<()> {
        command.validate()?;
        debug!("sending command {}", command.name());
        self.send_message(
            "send_command",
            &Message::Command {
                command: command.name().to_string(),
            },
        )
        .await
    }

    /// Issue a command repeatedly until the returned handle is stopped
    ///
    /// Sends are paced by `command_interval`; a zero interval sends
    /// back-to-back, only yielding to the runtime between sends. The loop
    /// also ends when the connector stops, so it never outlives the socket.
    pub fn start_command(&self, command: &Command) -> Result<CommandHandle> {
        command.validate()?;
        let engine = self
            .session
            .lock()
            .as_ref()
            .map(|session| session.shutdown.subscribe())
            .ok_or(ClientError::NotReady("start_command"))?;
        let sink = self
            .sink
            .read()
            .clone()
            .ok_or(ClientError::NotReady("start_command"))?;
        let datagram = codec::encode(&Message::Command {
            command: command.name().to_string(),
        })?;

        debug!("repeating command {} every {:?}", command.name(), self.config.command_interval);
        Ok(command::spawn_repeat(
            command.clone(),
            datagram,
            sink,
            self.config.command_interval,
            engine,
        ))
    }

    /// Stop a repeating command; returns how many times it was sent
    pub async fn stop_command(&self, handle: CommandHandle) -> Result<u64> {
        handle.stop().await
    }

    /// Ask the simulator to quit
    pub async fn quit_simulator(&self) -> Result<()> {
        self.send_message("quit_simulator", &Message::Quit).await
    }

    /// Fail a simulated system
    pub async fn fail(&self, system: i32) -> Result<()> {
        self.send_message("fail", &Message::Fail { system }).await
    }

    /// Recover a simulated system
    pub async fn recover(&self, system: i32) -> Result<()> {
        self.send_message("recover", &Message::Recover { system }).await
    }
}

// ============================================================================
// LOOPS
// ============================================================================

async fn receive_loop(
    socket: Arc<UdpSocket>,
    shared: Arc<Shared>,
    mut shutdown: watch::Receiver<bool>,
    buffer_size: usize,
) -> Result<()> {
    let mut buf = vec![0u8; buffer_size];

    while !*shutdown.borrow() {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            received = socket.recv_from(&mut buf) => {
                let (len, from) = received.map_err(|e| {
                    error!("UDP receive error: {}", e);
                    ClientError::Io(e)
                })?;
                debug!("UDP received {} bytes from {}", len, from);

                if let Err(e) = shared.handle_datagram(&buf[..len]) {
                    if shared.strict_decode {
                        return Err(e);
                    }
                    warn!("dropped datagram from {}: {}", from, e);
                    shared.report(&e);
                }
            }
        }
    }

    debug!("receive loop stopped");
    Ok(())
}

async fn request_loop(
    shared: Arc<Shared>,
    sink: Arc<dyn DatagramSink>,
    mut shutdown: watch::Receiver<bool>,
    interval: Duration,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !*shutdown.borrow() {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let requested = shared.request_stale(sink.as_ref()).await?;
                if requested > 0 {
                    debug!("re-requested {} stale datarefs", requested);
                }
            }
        }
    }

    debug!("request loop stopped");
    Ok(())
}

/// Wait for both loops; the first failure cancels the other
async fn join_loops(
    receiver: JoinHandle<Result<()>>,
    requester: JoinHandle<Result<()>>,
    shutdown: &watch::Sender<bool>,
) -> Result<()> {
    let settle = |joined: std::result::Result<Result<()>, tokio::task::JoinError>| {
        let result = joined.map_err(|e| ClientError::Task(e.to_string())).and_then(|r| r);
        if result.is_err() {
            shutdown.send_replace(true);
        }
        result
    };

    let (received, requested) = tokio::join!(
        async { settle(receiver.await) },
        async { settle(requester.await) },
    );
    received.and(requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use xpconnect_core::ManualClock;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Bytes>>,
    }

    impl RecordingSink {
        fn take(&self) -> Vec<Bytes> {
            std::mem::take(&mut *self.sent.lock())
        }
    }

    #[async_trait]
    impl DatagramSink for RecordingSink {
        async fn send(&self, datagram: Bytes) -> Result<()> {
            self.sent.lock().push(datagram);
            Ok(())
        }
    }

    fn connector_with(clock: Arc<ManualClock>) -> (XPlaneConnector, Arc<RecordingSink>) {
        let connector = XPlaneConnector::with_clock(ConnectorConfig::default(), clock).unwrap();
        let sink = Arc::new(RecordingSink::default());
        *connector.sink.write() = Some(sink.clone());
        (connector, sink)
    }

    fn frame_id(datagram: &[u8]) -> (i32, i32) {
        let frequency = i32::from_le_bytes(datagram[4..8].try_into().unwrap());
        let id = i32::from_le_bytes(datagram[8..12].try_into().unwrap());
        (frequency, id)
    }

    #[tokio::test]
    async fn test_subscribe_then_unsubscribe_sends_one_stop() {
        let (connector, sink) = connector_with(Arc::new(ManualClock::new()));

        let element = connector
            .subscribe_path("sim/cockpit2/gauges/indicators/compass_heading_deg_mag", 5, |_, _| {})
            .unwrap();
        assert!(sink.take().is_empty(), "subscribe must not send");

        connector
            .unsubscribe("sim/cockpit2/gauges/indicators/compass_heading_deg_mag")
            .await
            .unwrap();

        assert!(connector.registry().is_empty());
        let sent = sink.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(&sent[0][..4], b"RREF");
        assert_eq!(sent[0].len(), codec::RREF_REQUEST_LEN);
        assert_eq!(frame_id(&sent[0]), (0, element.id()));
    }

    #[tokio::test]
    async fn test_stale_element_requested_once_per_scan() {
        let clock = Arc::new(ManualClock::new());
        let (connector, sink) = connector_with(clock.clone());
        let element = connector.subscribe_path("sim/a", 4, |_, _| {}).unwrap();

        // Never received: requested on every scan
        assert_eq!(connector.shared.request_stale(sink.as_ref()).await.unwrap(), 1);
        assert_eq!(connector.shared.request_stale(sink.as_ref()).await.unwrap(), 1);
        let sent = sink.take();
        assert_eq!(sent.len(), 2);
        assert_eq!(frame_id(&sent[0]), (4, element.id()));

        // Fresh value inside the window: nothing to do
        element.update(1.0, clock.now());
        clock.advance(Duration::from_secs(4));
        assert_eq!(connector.shared.request_stale(sink.as_ref()).await.unwrap(), 0);

        // Past the window: exactly one request per scan
        clock.advance(Duration::from_secs(2));
        assert_eq!(connector.shared.request_stale(sink.as_ref()).await.unwrap(), 1);
        assert_eq!(sink.take().len(), 1);

        // Refreshed again
        element.update(2.0, clock.now());
        assert_eq!(connector.shared.request_stale(sink.as_ref()).await.unwrap(), 0);
        assert!(sink.take().is_empty());
    }

    #[tokio::test]
    async fn test_handle_datagram_dispatches_and_records() {
        let (connector, _sink) = connector_with(Arc::new(ManualClock::new()));
        let element = Arc::new(DataRefElement::new(7, "sim/b"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        connector.subscribe(element.clone(), 1, |_, _| {}).unwrap();
        connector.on_dataref_received(move |e| s.lock().push(e.id()));

        let mut packet = b"RREF,".to_vec();
        packet.extend_from_slice(&7i32.to_le_bytes());
        packet.extend_from_slice(&42.5f32.to_le_bytes());

        assert_eq!(connector.shared.handle_datagram(&packet).unwrap(), 1);
        assert_eq!(element.value(), 42.5);
        assert_eq!(*seen.lock(), vec![7]);
        assert_eq!(connector.last_buffer().as_deref(), Some(&packet[..]));
        assert!(connector.last_receive().is_some());
    }

    #[tokio::test]
    async fn test_truncated_tail_still_applies_complete_pairs() {
        let (connector, _sink) = connector_with(Arc::new(ManualClock::new()));
        let element = Arc::new(DataRefElement::new(4, "sim/c"));
        connector.subscribe(element.clone(), 1, |_, _| {}).unwrap();

        let mut packet = b"RREF,".to_vec();
        packet.extend_from_slice(&4i32.to_le_bytes());
        packet.extend_from_slice(&7.5f32.to_le_bytes());
        packet.extend_from_slice(&[4, 0, 0, 0, 1]);

        let err = connector.shared.handle_datagram(&packet).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(xpconnect_core::Error::Decode(_))));
        assert_eq!(element.value(), 7.5);
        assert!(element.is_initialized());
    }

    #[tokio::test]
    async fn test_sends_require_socket() {
        let connector = XPlaneConnector::new(ConnectorConfig::default()).unwrap();

        assert!(matches!(
            connector.send_command(&Command::new("sim/operation/pause_toggle")).await,
            Err(ClientError::NotReady(_))
        ));
        assert!(matches!(
            connector.set_dataref_value("sim/a", 1.0f32).await,
            Err(ClientError::NotReady(_))
        ));
        assert!(matches!(connector.quit_simulator().await, Err(ClientError::NotReady(_))));
        assert!(matches!(connector.fail(3).await, Err(ClientError::NotReady(_))));
        assert!(matches!(connector.recover(3).await, Err(ClientError::NotReady(_))));
        assert!(matches!(
            connector.start_command(&Command::new("sim/a")),
            Err(ClientError::NotReady(_))
        ));
        assert!(matches!(
            connector.stop(Duration::from_millis(10)).await,
            Err(ClientError::NotReady(_))
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_without_socket_is_local() {
        let connector = XPlaneConnector::new(ConnectorConfig::default()).unwrap();
        connector.subscribe_path("sim/a", 1, |_, _| {}).unwrap();
        connector.unsubscribe("sim/a").await.unwrap();
        assert!(connector.registry().is_empty());
    }

    #[tokio::test]
    async fn test_one_shot_layouts() {
        let (connector, sink) = connector_with(Arc::new(ManualClock::new()));

        connector.set_dataref_value("sim/c", 2.5f32).await.unwrap();
        connector.set_dataref_value("sim/d", "N12345").await.unwrap();
        connector.send_command(&Command::new("sim/lights/landing_lights_on")).await.unwrap();
        connector.quit_simulator().await.unwrap();
        connector.fail(12).await.unwrap();
        connector.recover(12).await.unwrap();

        let sent = sink.take();
        let headers: Vec<&[u8]> = sent.iter().map(|d| &d[..4]).collect();
        let expected: [&[u8]; 6] = [b"DREF", b"DREF", b"CMND", b"QUIT", b"FAIL", b"RECO"];
        assert_eq!(headers, expected);
        assert_eq!(sent[0].len(), codec::DREF_LEN);
        assert_eq!(sent[1].len(), codec::DREF_LEN);
        assert_eq!(&sent[4][..], b"FAIL12\0");
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let (connector, _sink) = connector_with(Arc::new(ManualClock::new()));

        assert!(matches!(
            connector.subscribe_path("", 1, |_, _| {}),
            Err(ClientError::InvalidArgument(_))
        ));
        assert!(matches!(
            connector.set_dataref_value("", 1.0f32).await,
            Err(ClientError::InvalidArgument(_))
        ));
        assert!(matches!(
            connector.send_command(&Command::new("")).await,
            Err(ClientError::InvalidArgument(_))
        ));
        assert!(matches!(
            connector.unsubscribe("sim/never").await,
            Err(ClientError::InvalidArgument(_))
        ));
    }
}
