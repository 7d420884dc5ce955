//! HTTP long-polling transport
//!
//! Runs a [`Connection`] over Engine.IO polling with reqwest: a GET that
//! the server holds open until it has packets, and a POST per batch of
//! outbound packets. Inbound messages are forwarded to an mpsc channel.

use reqwest::Client;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::backoff::ReconnectPolicy;
use super::connection::{Connection, Effect};
use super::event::{ClientEvent, Inbound};
use super::frame::{decode_payload, encode_payload, EnginePacket};
use super::{socket_url, ChannelError, ChannelResult};

/// Push channel settings
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Server root, e.g. `http://localhost:5001`
    pub url: String,
    pub reconnect: ReconnectPolicy,
    /// Timeout for the handshake and outbound POSTs
    pub request_timeout: Duration,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5001".to_string(),
            reconnect: ReconnectPolicy::default(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

enum Control {
    Emit(ClientEvent),
    Close,
}

/// Handle to a running push channel
pub struct PushChannel {
    control: mpsc::UnboundedSender<Control>,
    task: JoinHandle<()>,
}

impl PushChannel {
    /// Start the channel; inbound messages arrive on `inbound`
    pub fn spawn(
        config: PushConfig,
        token: impl Into<String>,
        inbound: mpsc::UnboundedSender<Inbound>,
    ) -> ChannelResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        let (control, control_rx) = mpsc::unbounded_channel();
        let connection = Connection::new(token, config.reconnect);
        let transport = PollingTransport {
            http,
            endpoint: socket_url(&config.url, "polling"),
            request_timeout: config.request_timeout,
            connection,
            inbound,
        };

        let task = tokio::spawn(transport.run(control_rx));
        Ok(Self { control, task })
    }

    /// Send an event to the server; queued until connected
    pub fn emit(&self, event: ClientEvent) -> ChannelResult<()> {
        self.control
            .send(Control::Emit(event))
            .map_err(|_| ChannelError::Closed)
    }

    /// Close the channel and wait for the transport to stop
    pub async fn close(self) {
        let _ = self.control.send(Control::Close);
        if let Err(e) = self.task.await {
            tracing::warn!("Push channel task failed: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

enum Flow {
    Continue,
    Reconnect(Duration),
    Stop,
}

struct PollingTransport {
    http: Client,
    endpoint: String,
    request_timeout: Duration,
    connection: Connection,
    inbound: mpsc::UnboundedSender<Inbound>,
}

impl PollingTransport {
    async fn run(mut self, mut control: mpsc::UnboundedReceiver<Control>) {
        loop {
            let flow = match self.session(&mut control).await {
                Flow::Reconnect(delay) => self.wait(delay, &mut control).await,
                other => other,
            };
            match flow {
                Flow::Stop => break,
                Flow::Continue | Flow::Reconnect(_) => continue,
            }
        }
        tracing::debug!("Polling transport stopped");
    }

    /// Sleep before a reconnect, still honouring `close`
    async fn wait(&mut self, delay: Duration, control: &mut mpsc::UnboundedReceiver<Control>) -> Flow {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return Flow::Continue,
                msg = control.recv() => {
                    let effects = match msg {
                        Some(Control::Emit(event)) => self.connection.emit(event),
                        Some(Control::Close) | None => self.connection.close(),
                    };
                    if let Flow::Stop = self.apply(effects, None).await {
                        return Flow::Stop;
                    }
                }
            }
        }
    }

    /// One Engine.IO session: handshake, then poll until it ends
    async fn session(&mut self, control: &mut mpsc::UnboundedReceiver<Control>) -> Flow {
        let handshake = fetch(self.http.clone(), self.endpoint.clone(), None, self.request_timeout);
        let payload = match handshake.await {
            Ok(payload) => payload,
            Err(e) => return self.lost(&e.to_string()).await,
        };
        let flow = self.receive(&payload, None).await;
        if !matches!(flow, Flow::Continue) {
            return flow;
        }

        let Some(sid) = self.connection.sid().map(str::to_string) else {
            return self.lost("handshake without open packet").await;
        };

        // The server pings every ping_interval; a poll outliving both
        // interval and timeout means the transport is gone.
        let poll_timeout = self
            .connection
            .handshake()
            .map(|h| Duration::from_millis(h.ping_interval + h.ping_timeout))
            .unwrap_or(self.request_timeout);

        loop {
            let poll = fetch(
                self.http.clone(),
                self.endpoint.clone(),
                Some(sid.clone()),
                poll_timeout,
            );
            tokio::pin!(poll);

            let payload = loop {
                tokio::select! {
                    result = &mut poll => break result,
                    msg = control.recv() => {
                        let effects = match msg {
                            Some(Control::Emit(event)) => self.connection.emit(event),
                            Some(Control::Close) | None => self.connection.close(),
                        };
                        match self.apply(effects, Some(&sid)).await {
                            Flow::Continue => {}
                            other => return other,
                        }
                    }
                }
            };

            let flow = match payload {
                Ok(payload) => self.receive(&payload, Some(&sid)).await,
                Err(e) => self.lost(&e.to_string()).await,
            };
            if !matches!(flow, Flow::Continue) {
                return flow;
            }
        }
    }

    async fn receive(&mut self, payload: &str, sid: Option<&str>) -> Flow {
        let packets = match decode_payload(payload) {
            Ok(packets) => packets,
            Err(e) => {
                tracing::warn!("Undecodable polling payload: {}", e);
                return self.lost("parse error").await;
            }
        };

        let effects: Vec<Effect> = packets
            .into_iter()
            .flat_map(|p| self.connection.on_packet(p))
            .collect();

        // The handshake response carries the sid the CONNECT must go to
        let sid = sid
            .map(str::to_string)
            .or_else(|| self.connection.sid().map(str::to_string));
        self.apply(effects, sid.as_deref()).await
    }

    async fn lost(&mut self, reason: &str) -> Flow {
        let effects = self.connection.on_transport_lost(reason);
        self.apply(effects, None).await
    }

    /// Carry out effects in order; outbound packets are batched per POST
    async fn apply(&mut self, effects: Vec<Effect>, sid: Option<&str>) -> Flow {
        let mut queue: VecDeque<Effect> = effects.into();
        let mut outbound = Vec::new();
        let mut flow = Flow::Continue;

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Send(packet) => outbound.push(packet),
                Effect::Emit(message) => {
                    if self.inbound.send(message).is_err() {
                        tracing::debug!("Inbound receiver dropped");
                    }
                }
                Effect::Reconnect { delay, .. } => flow = Flow::Reconnect(delay),
                Effect::Close => flow = Flow::Stop,
            }

            if queue.is_empty() && !outbound.is_empty() {
                let packets = std::mem::take(&mut outbound);
                let Some(sid) = sid else {
                    tracing::debug!("No session for {} outbound packets", packets.len());
                    continue;
                };
                if let Err(e) = self.post(sid, &packets).await {
                    if matches!(flow, Flow::Stop) {
                        continue;
                    }
                    queue.extend(self.connection.on_transport_lost(&e.to_string()));
                }
            }
        }

        flow
    }

    async fn post(&self, sid: &str, packets: &[EnginePacket]) -> ChannelResult<()> {
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("sid", sid)])
            .timeout(self.request_timeout)
            .header("Content-Type", "text/plain;charset=UTF-8")
            .body(encode_payload(packets))
            .send()
            .await
            .map_err(|e| ChannelError::Transport(format!("xhr post error: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::Transport(format!(
                "xhr post error: HTTP {}",
                response.status()
            )))
        }
    }
}

/// One polling GET; owns its inputs so it can be held across `select!`
async fn fetch(
    http: Client,
    endpoint: String,
    sid: Option<String>,
    timeout: Duration,
) -> ChannelResult<String> {
    let mut request = http.get(&endpoint).timeout(timeout);
    if let Some(sid) = &sid {
        request = request.query(&[("sid", sid.as_str())]);
    }

    let response = request
        .send()
        .await
        .map_err(|e| ChannelError::Transport(format!("xhr poll error: {}", e)))?;
    if !response.status().is_success() {
        return Err(ChannelError::Transport(format!(
            "xhr poll error: HTTP {}",
            response.status()
        )));
    }
    response
        .text()
        .await
        .map_err(|e| ChannelError::Transport(format!("xhr poll error: {}", e)))
}
